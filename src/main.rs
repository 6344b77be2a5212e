//! Command-line batch runner.
//!
//! Runs a newline-separated block of commands against one device and
//! prints the batch report to stdout as JSON. Logs go to stderr; set
//! `RUST_LOG=debug` to watch the exchange.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use sshbatch::Session;

/// Run a batch of CLI commands on a network device over SSH.
#[derive(Parser, Debug)]
#[command(name = "sshbatch", version, about)]
struct Cli {
    /// Newline-separated commands to run
    commands: String,

    /// Device hostname or IP address
    host: String,

    /// SSH username
    username: String,

    /// SSH password
    password: String,

    /// SSH port
    #[arg(short, long, default_value_t = 22)]
    port: u16,

    /// Connection timeout in seconds
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut session = Session::builder(&cli.host, &cli.username, &cli.password)
        .port(cli.port)
        .timeout(Duration::from_secs(cli.timeout))
        .build();

    let report = session.run(&cli.commands).await;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("failed to encode report: {e}");
            return ExitCode::FAILURE;
        }
    }

    if report.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
