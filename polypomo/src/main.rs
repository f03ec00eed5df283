use anyhow::Result;
use clap::{Parser, Subcommand};
use polypomo::config::load_config;
use polypomo::daemon::Daemon;
use polypomo::ipc::{displace_running, Takeover, TakeoverPolicy};
use polypomo_ipc::{socket_path, Command, TimeOp};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polypomo")]
#[command(about = "Pomodoro timer to be used with polybar", long_about = None)]
struct Cli {
    /// Work timer length in seconds
    #[arg(long)]
    worktime: Option<u64>,
    /// Break timer length in seconds
    #[arg(long)]
    breaktime: Option<u64>,
    /// Config file (defaults to polypomo.toml in the user config dir)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Without a subcommand, start the daemon
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Switch to the other phase and start it
    Switch,
    /// Get full info
    Show,
    /// Get the current time formatted
    Gtime,
    /// Print the current phase on the daemon's output
    Gstatus,
    /// Start/stop the timer
    Toggle,
    /// End the current timer
    End,
    /// Lock time actions - prevent changing time
    Lock,
    /// Exit any listening polypomo instance gracefully
    Exit,
    /// Add or remove time from the current timer
    Time {
        /// +SECONDS or -SECONDS
        #[arg(allow_hyphen_values = true, value_parser = parse_delta)]
        delta: TimeDelta,
    },
}

#[derive(Debug, Clone, Copy)]
struct TimeDelta {
    op: TimeOp,
    seconds: i64,
}

fn parse_delta(raw: &str) -> Result<TimeDelta, String> {
    let (op, digits) = if let Some(digits) = raw.strip_prefix('+') {
        (TimeOp::Add, digits)
    } else if let Some(digits) = raw.strip_prefix('-') {
        (TimeOp::Sub, digits)
    } else {
        return Err("time format should be +num or -num to add or remove time".into());
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected number after +/- but saw '{digits}'"));
    }
    let seconds = digits.parse().map_err(|e| format!("{e}"))?;
    Ok(TimeDelta { op, seconds })
}

fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = socket_path();
    init_logging(if cli.command.is_none() { "info" } else { "warn" });

    let command = match cli.command {
        None => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(worktime) = cli.worktime {
                config.work_time = worktime;
            }
            if let Some(breaktime) = cli.breaktime {
                config.break_time = breaktime;
            }
            Daemon::start(&config, &path).await?.run().await;
            return Ok(());
        }
        Some(Commands::Exit) => {
            match displace_running(&path, TakeoverPolicy::default()).await {
                Takeover::NoDaemon => println!("No instance is listening"),
                Takeover::Displaced => {}
                Takeover::Stale => println!("Socket was not released, assuming it's stale"),
                Takeover::Unreachable => {
                    anyhow::bail!("Could not reach the instance at {}", path.display())
                }
            }
            return Ok(());
        }
        Some(Commands::Switch) => Command::Switch,
        Some(Commands::Show | Commands::Gtime) => Command::GetTime,
        Some(Commands::Gstatus) => Command::GetStatus,
        Some(Commands::Toggle) => Command::Toggle,
        Some(Commands::End) => Command::End,
        Some(Commands::Lock) => Command::Lock,
        Some(Commands::Time { delta }) => Command::Time {
            op: delta.op,
            seconds: delta.seconds,
        },
    };

    if let Some(reply) = polypomo_ipc::send(&path, &command).await? {
        if !reply.is_empty() {
            println!("{}", reply);
        }
    }

    Ok(())
}
