use std::path::PathBuf;
use std::process::exit;

use clap::Parser;
use sqltalk::cli::SqltalkCli;
use sqltalk::config::context::build_handler;
use sqltalk::config::schema::{load_config, DEFAULT_CONFIG_PATH};
use tracing::{error, info, subscriber};
use tracing_log::LogTracer;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Debug, Parser)]
#[clap(name = "sqltalk", about = "Ask questions of your databases in plain language")]
struct Args {
    #[clap(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,

    #[clap(long, help = "Run commands separated by semicolons and exit")]
    one_off: Option<String>,

    #[clap(long, help = "Emit logs as JSON")]
    json_logs: bool,
}

fn prepare_tracing(json_logs: bool) {
    // Redirect all `log`'s events to our subscriber, to collect the ones from sqlx
    LogTracer::init().expect("Failed to set logger");

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let sub = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter);

    let result = if json_logs {
        subscriber::set_global_default(sub.json().finish())
    } else {
        subscriber::set_global_default(sub.compact().finish())
    };
    result.expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    prepare_tracing(args.json_logs);

    info!("Starting sqltalk {}", env!("CARGO_PKG_VERSION"));
    let config = load_config(&args.config_path).expect("Error loading config");
    info!("Loaded config from {}", args.config_path.display());

    let handler = match build_handler(&config) {
        Ok(handler) => handler,
        Err(e) => {
            error!("Error setting up sources: {e}");
            exit(1);
        }
    };
    let mut cli = SqltalkCli::new(handler);

    if let Some(commands) = args.one_off {
        if let Err(e) = cli.run_one_off(&commands, std::io::stdout()).await {
            eprintln!("{e}");
            exit(1);
        }
        return;
    }

    if let Err(e) = cli.repl_loop().await {
        error!("{e}");
        exit(1);
    }
}
