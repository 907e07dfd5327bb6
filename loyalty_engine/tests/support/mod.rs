#![allow(dead_code)]
pub mod mock_oracle;
pub mod prepare_env;

/// Order numbers that pass the Luhn check.
pub const VALID_NUMBERS: [&str; 8] = [
    "79927398713",
    "12345678903",
    "4561261212345467",
    "374245455400126",
    "10000000009",
    "20000000008",
    "30000000007",
    "92789234702",
];
