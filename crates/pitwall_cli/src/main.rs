use std::env;
use std::io;
use std::process::ExitCode;

use pitwall_cli::{run, CommandKind};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> Result<(), String> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.is_empty() {
        return Err(usage_text());
    }
    if args[0] == "-h" || args[0] == "--help" {
        print_usage();
        return Ok(());
    }

    let command = args[0].as_str();
    let command_args = &args[1..];

    let kind = match command {
        "check" => {
            let [config_path] = command_args else {
                return Err("check requires exactly one config path".to_string());
            };
            CommandKind::Check {
                config_path: config_path.clone(),
            }
        }
        "replay" => {
            let [config_path, feed_path] = command_args else {
                return Err("replay requires a config path and a feed path".to_string());
            };
            CommandKind::Replay {
                config_path: config_path.clone(),
                feed_path: feed_path.clone(),
            }
        }
        other => return Err(format!("unknown subcommand '{other}'")),
    };

    run(kind, &mut io::stdout())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn print_usage() {
    println!("{}", usage_text());
}

fn usage_text() -> String {
    [
        "pitwall_cli - room automation config tool",
        "",
        "Usage:",
        "  pitwall_cli check <config.json>",
        "  pitwall_cli replay <config.json> <feed.json>",
        "",
        "check validates every binding of a config and exits nonzero if any",
        "command is invalid. replay runs a recorded session feed through the",
        "engine and prints each outbound host call in order.",
        "",
        "Feed entries look like:",
        "  { \"kind\": \"room_state\", \"level\": { \"uid\": \"lvl1\", \"name\": \"Canyon\" },",
        "    \"players\": [{ \"steam_id\": 42, \"name\": \"Speedy\", \"time_seconds\": 42.0 }] }",
        "  { \"kind\": \"player_joined\", \"player\": { \"steam_id\": 42, \"name\": \"Speedy\" } }",
        "  { \"kind\": \"player_left\", \"steam_id\": 42 }",
        "  { \"kind\": \"round_started\" } | { \"kind\": \"round_ended\" } | { \"kind\": \"room_left\" }",
    ]
    .join("\n")
}
