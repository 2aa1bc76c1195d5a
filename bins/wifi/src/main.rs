//! wifi - inspect and configure WiFi radios via nl80211.

mod commands;

use std::time::Duration;

use clap::{Parser, Subcommand};
use wlink::SocketManager;

use commands::Output;

#[derive(Parser)]
#[command(name = "wifi", version, about = "WiFi radio utility")]
struct Cli {
    /// Output JSON.
    #[arg(short = 'j', long, global = true)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long, global = true)]
    pretty: bool,

    /// Per-request timeout in milliseconds.
    #[arg(short = 't', long, default_value_t = 1000, global = true)]
    timeout: u64,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show and configure wireless physical devices.
    Phy(commands::phy::PhyCmd),

    /// Show and configure wireless interfaces.
    #[command(visible_alias = "d")]
    Dev(commands::dev::DevCmd),

    /// Show associated stations.
    #[command(visible_alias = "sta")]
    Station(commands::station::StationCmd),

    /// Show the channel survey of an interface.
    Survey(commands::survey::SurveyCmd),

    /// Trigger a scan or show the scan cache.
    Scan(commands::scan::ScanCmd),

    /// Set the regulatory domain.
    Reg(commands::reg::RegCmd),

    /// Print nl80211 events.
    #[command(visible_alias = "m", visible_alias = "mon")]
    Monitor(commands::monitor::MonitorCmd),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    // RUST_LOG wins; the -v level only fills in when it is unset
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let out = Output {
        json: cli.json,
        pretty: cli.pretty,
    };

    // one-shot commands do not need the multicast groups
    let builder = SocketManager::builder().sync_timeout(Duration::from_millis(cli.timeout));
    let builder = match cli.command {
        Command::Monitor(_) | Command::Scan(_) => builder,
        _ => builder.no_events(),
    };
    let mgr = builder.build().await?;

    let result = match cli.command {
        Command::Phy(cmd) => cmd.run(&mgr, out).await,
        Command::Dev(cmd) => cmd.run(&mgr, out).await,
        Command::Station(cmd) => cmd.run(&mgr, out).await,
        Command::Survey(cmd) => cmd.run(&mgr, out).await,
        Command::Scan(cmd) => cmd.run(&mgr, out).await,
        Command::Reg(cmd) => cmd.run(&mgr).await,
        Command::Monitor(cmd) => cmd.run(&mgr, out).await,
    };

    tracing::debug!(stats = ?mgr.stats(), "done");
    mgr.destroy();
    result
}
