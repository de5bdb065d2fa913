mod commands;

use attachflow_cloud::{AttachmentLifecycle, CancellationToken};
use attachflow_cloud_aws::NetworkManagerClient;
use clap::{Parser, Subcommand};
use commands::Output;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "attach")]
#[command(
    about = "Create and delete Cloud WAN VPN attachments, waiting until they settle",
    long_about = None
)]
struct Cli {
    /// Region for the Network Manager API (defaults to the config file, then us-west-2)
    #[arg(long, global = true, env = "AWS_REGION")]
    region: Option<String>,

    /// Print records as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a VPN attachment and wait until it is available or awaiting acceptance
    Create {
        /// Core network to attach to
        #[arg(long)]
        core_network_id: String,
        /// ARN of the site-to-site VPN connection
        #[arg(long)]
        vpn_arn: String,
        /// Tag as key=value (repeatable)
        #[arg(short, long = "tag", value_parser = parse_key_val)]
        tags: Vec<(String, String)>,
        /// Wait timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },
    /// Delete a VPN attachment and wait until it is gone
    Delete {
        /// Attachment ID
        id: String,
        /// Wait timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },
    /// Wait for an attachment to become available
    Await {
        /// Attachment ID
        id: String,
        /// Wait timeout in seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        timeout: Option<u64>,
    },
    /// Show the current attachment attributes
    Show {
        /// Attachment ID
        id: String,
    },
    /// Add, overwrite or remove attachment tags
    Tag {
        /// Attachment ID
        id: String,
        /// Tag to set as key=value (repeatable)
        #[arg(long = "set", value_parser = parse_key_val)]
        set: Vec<(String, String)>,
        /// Tag key to remove (repeatable)
        #[arg(long = "remove")]
        remove: Vec<String>,
    },
    /// Show version information
    Version,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    attachflow_cloud::tags::parse_tag(s).ok_or_else(|| format!("expected key=value, got '{}'", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout is reserved for records
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if matches!(cli.command, Commands::Version) {
        println!("attachflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut settings = attachflow_config::load_settings()?;
    if let Some(region) = cli.region {
        settings.region = region;
    }

    let mut timeouts = settings.timeouts();
    match &cli.command {
        Commands::Create {
            timeout: Some(secs),
            ..
        }
        | Commands::Await {
            timeout: Some(secs),
            ..
        } => timeouts.create = std::time::Duration::from_secs(*secs),
        Commands::Delete {
            timeout: Some(secs),
            ..
        } => timeouts.delete = std::time::Duration::from_secs(*secs),
        _ => {}
    }

    let client = NetworkManagerClient::from_env(Some(&settings.region)).await;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping wait");
            interrupt.cancel();
        }
    });

    let lifecycle = AttachmentLifecycle::new(&client)
        .with_timeouts(timeouts)
        .with_poll_config(settings.poll_config())
        .with_delete_not_found_checks(settings.not_found_checks)
        .with_default_tags(settings.default_tags.clone())
        .with_cancellation(cancel);

    let output = Output::new(cli.json, &lifecycle);

    match cli.command {
        Commands::Create {
            core_network_id,
            vpn_arn,
            tags,
            ..
        } => commands::create(&lifecycle, &output, core_network_id, vpn_arn, tags).await,
        Commands::Delete { id, .. } => commands::delete(&lifecycle, &output, &id).await,
        Commands::Await { id, .. } => {
            commands::await_available(&lifecycle, &output, &id, timeouts.create).await
        }
        Commands::Show { id } => commands::show(&lifecycle, &output, &id).await,
        Commands::Tag { id, set, remove } => {
            commands::tag(&lifecycle, &output, &id, set, remove).await
        }
        Commands::Version => Ok(()),
    }
}
