use clap::{Parser, Subcommand};
use ipintel::server::{self, envelope};
use ipintel::{Config, IntelResolver};
use serde_json::json;
use tracing_subscriber::EnvFilter;

/// ipintel — multi-source IP intelligence
///
/// Asks several independent providers about an address and reconciles the
/// answers into one record with a confidence tally.
///
/// Examples:
///   ipintel lookup 8.8.8.8
///   ipintel full 1.1.1.1
///   ipintel batch 8.8.8.8 1.1.1.1 9.9.9.9
///   ipintel threat 185.220.101.1
///   ipintel distance 8.8.8.8 1.1.1.1
///   ipintel serve --port 3000
#[derive(Parser)]
#[command(name = "ipintel", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    config: Config,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(short = 'L', long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Single-source lookup (primary provider).
    Lookup { ip: String },
    /// Query every provider and reconcile the answers.
    Full { ip: String },
    /// Look up up to 10 addresses at once.
    Batch {
        #[arg(required = true, num_args = 1..)]
        ips: Vec<String>,
    },
    /// Risk score and level.
    Threat { ip: String },
    /// Great-circle distance between two addresses.
    Distance { from: String, to: String },
    /// Run the HTTP API.
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, short = 'p', default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let resolver = IntelResolver::new(cli.config);

    let output = match cli.command {
        Command::Lookup { ip } => envelope(resolver.lookup(&ip).await, json!({ "ip": ip })),
        Command::Full { ip } => envelope(resolver.full(&ip).await, json!({ "ip": ip })),
        Command::Batch { ips } => envelope(resolver.batch(&ips).await, json!({ "ips": ips })),
        Command::Threat { ip } => envelope(resolver.threat(&ip).await, json!({ "ip": ip })),
        Command::Distance { from, to } => {
            envelope(resolver.distance(&from, &to).await, json!({ "from": from, "to": to }))
        }
        Command::Serve { host, port } => {
            server::start(&host, port, resolver).await;
            return;
        }
    };

    // JSON to stdout
    match serde_json::to_string_pretty(&output.0) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
