use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets (MCS_RAZORPAY_KEY_SECRET, MCS_IDENTITY_SECRET) are deliberately left off this list
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "MCS_HOST",
        "MCS_PORT",
        "MCS_DATABASE_URL",
        "MCS_MAX_DB_CONNECTIONS",
        "MCS_RAZORPAY_KEY_ID",
        "MCS_RAZORPAY_BASE_URL",
        "MCS_COMMISSION_RATE",
        "MCS_CURRENCY",
        "MCS_OPERATOR_EMAIL",
        "MCS_IDENTITY_CHECKS",
        "MCS_CREDIT_RETRY_INTERVAL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
