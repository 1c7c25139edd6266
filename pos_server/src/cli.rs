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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 15] = [
        "RUST_LOG",
        "POS_HOST",
        "POS_PORT",
        "POS_DATABASE_URL",
        "POS_DB_MAX_CONNECTIONS",
        "POS_USE_X_FORWARDED_FOR",
        "POS_USE_FORWARDED",
        "POS_WALLET_APP_ID",
        "POS_WALLET_ENDPOINT",
        "POS_WALLET_CALLBACK_URL",
        "POS_WALLET_APP_USER",
        "POS_BANK_MATCH_TOLERANCE",
        "POS_BANK_WEBHOOK_HMAC_CHECKS",
        "POS_POLL_INTERVAL_MS",
        "POS_POLL_MAX_ATTEMPTS",
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
