//! # Order number validation
//!
//! Order numbers are strings of ASCII digits whose last digit is a Luhn check digit. The same check gates order
//! uploads and withdrawals. Nothing else is inferred from the number; in particular, its length is not constrained.

/// Returns true if `number` is a non-empty string of ASCII digits that passes the Luhn checksum.
///
/// Digits are visited from the least significant (the check digit) to the most significant. Every second digit,
/// starting with the one immediately to the left of the check digit, is doubled, and 9 is subtracted from doubled
/// values of 10 or more. The number is valid when the total is divisible by 10.
pub fn is_valid_order_number(number: &str) -> bool {
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let sum = number
        .bytes()
        .rev()
        .map(|b| u32::from(b - b'0'))
        .enumerate()
        .map(|(i, d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .fold(0u32, |acc, d| (acc + d) % 10);
    sum == 0
}
