use std::env::{self, VarError};

/// Settings that are safe to echo back. `LPS_JWT_SECRET` is never listed.
const PUBLIC_SETTINGS: [&str; 10] = [
    "RUST_LOG",
    "LPS_HOST",
    "LPS_PORT",
    "LPS_DATABASE_URL",
    "LPS_DB_MAX_CONNECTIONS",
    "LPS_ACCRUAL_SYSTEM_ADDRESS",
    "LPS_ORACLE_TIMEOUT",
    "LPS_RECONCILE_INTERVAL",
    "LPS_MAX_RETRIES",
    "LPS_TOKEN_VALIDITY",
];

/// The server is configured entirely through the environment. Any argument at all prints the help text and the
/// current settings, and returns true so that `main` exits without starting the server.
pub fn handle_command_line_args() -> bool {
    if env::args().count() <= 1 {
        return false;
    }
    println!("\n{}\n", include_str!("./cli-help.txt"));
    println!("Current settings (secrets are not shown):");
    for (name, value) in settings_report(|name| env::var(name)) {
        println!("  {name:<35} {value}");
    }
    true
}

fn settings_report<F>(lookup: F) -> Vec<(&'static str, String)>
where F: Fn(&str) -> Result<String, VarError> {
    PUBLIC_SETTINGS
        .iter()
        .map(|&name| {
            let value = match lookup(name) {
                Ok(s) => s,
                Err(VarError::NotPresent) => "(not set)".into(),
                Err(VarError::NotUnicode(s)) => format!("(invalid: {})", s.to_string_lossy()),
            };
            (name, value)
        })
        .collect()
}
