#![forbid(unsafe_code)]
#![deny(clippy::float_arithmetic)]
#![deny(clippy::float_cmp)]

mod api;
mod config;
mod http_server;
mod metrics;

use api::RegistryApi;
use badge_catalog::{BadgeCatalog, BadgeV1};
use clap::{Parser, Subcommand};
use review_ledger::{AdminBootstrap, ReviewLedger};
use score_core::{AccountId, ChainId};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Badge, grant and review-score registry node")]
struct Args {
    /// Path to a TOML config file. If omitted, uses `SCORE_NODE_CONFIG`.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start score-node as a long-running service (health/metrics/registries).
    Run,

    /// Compute the content id a badge definition would get, without storing it.
    BadgeId {
        /// Read a `BadgeV1` JSON from this file.
        #[arg(long)]
        file: PathBuf,
    },

    /// Look up the running average and review counts for a program key.
    ProgramScore {
        /// Program key string (e.g. "grant-program/quarter-1").
        #[arg(long)]
        key: String,
    },
}

fn main() {
    let args = Args::parse();

    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = cfg_path
        .as_deref()
        .map(config::load_config)
        .transpose()
        .unwrap_or_else(|e| exit_err(&e.to_string()));

    init_logging(cfg.as_ref());

    let node_label = cfg
        .as_ref()
        .map(|c| c.node.label.as_str())
        .unwrap_or("score-node");
    info!(node = node_label, "starting score-node");

    let data_dir = cfg
        .as_ref()
        .map(|c| c.storage.data_dir.as_str())
        .unwrap_or("data")
        .to_string();
    let chain_id = ChainId(cfg.as_ref().map(|c| c.chain.chain_id).unwrap_or(1));
    let bootstrap = AdminBootstrap {
        owner: AccountId::new(
            cfg.as_ref()
                .map(|c| c.ledger.owner.as_str())
                .unwrap_or("acc-operator"),
        ),
        authorized_submitter: AccountId::new(
            cfg.as_ref()
                .map(|c| c.ledger.authorized_submitter.as_str())
                .unwrap_or("acc-operator"),
        ),
    };

    let command = args.command.unwrap_or(Command::Run);
    match command {
        Command::Run => {
            let bind = cfg
                .as_ref()
                .map(|c| c.server.bind_address.as_str())
                .unwrap_or("0.0.0.0:3000");
            let metrics_enabled = cfg
                .as_ref()
                .map(|c| c.server.metrics_enabled)
                .unwrap_or(true);

            // Touch the statics so the registry exports them from the start.
            let _ = &*metrics::PROCESS_UPTIME_SECONDS;

            let api = RegistryApi::open(&data_dir, chain_id, bootstrap)
                .unwrap_or_else(|e| exit_err(&e.to_string()));

            if let Err(e) = http_server::serve(bind, metrics_enabled, api) {
                exit_err(&e);
            }
        }
        Command::BadgeId { file } => {
            let raw = std::fs::read_to_string(&file)
                .unwrap_or_else(|e| exit_err(&format!("failed to read {}: {e}", file.display())));
            let badge: BadgeV1 = serde_json::from_str(&raw)
                .unwrap_or_else(|e| exit_err(&format!("invalid BadgeV1 JSON: {e}")));
            let badge_id =
                BadgeCatalog::generate_id(&badge).unwrap_or_else(|e| exit_err(&e.to_string()));
            println!("{badge_id}");
        }
        Command::ProgramScore { key } => {
            let ledger_path = Path::new(&data_dir);
            let ledger = ReviewLedger::open(ledger_path, bootstrap)
                .unwrap_or_else(|e| exit_err(&e.to_string()));
            let (success, score) = ledger.score_of(key.as_bytes());
            let program = review_ledger::ProgramKey::new(key);
            let (total, valid) = ledger
                .get_review_counts(&program)
                .unwrap_or_else(|e| exit_err(&e.to_string()));
            let out = serde_json::json!({
                "schema_version": 1,
                "program_key": program,
                "reviewed": success,
                "running_average": score.to_string(),
                "total_review_count": total,
                "valid_review_count": valid,
            });
            println!("{}", serde_json::to_string_pretty(&out).unwrap());
        }
    }
}

fn resolve_config_path(cli: Option<&Path>) -> Option<String> {
    if let Some(p) = cli {
        return Some(p.to_string_lossy().to_string());
    }
    std::env::var("SCORE_NODE_CONFIG").ok()
}

fn init_logging(cfg: Option<&config::NodeConfig>) {
    // Prefer explicit config logging.level unless user set RUST_LOG.
    let default_level = cfg
        .map(|c| c.logging.level.as_str())
        .unwrap_or("info")
        .to_string();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let json = cfg
        .map(|c| c.logging.format.as_str())
        .unwrap_or("json")
        .eq_ignore_ascii_case("json");

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn exit_err(msg: &str) -> ! {
    eprintln!("{msg}");
    std::process::exit(2);
}
