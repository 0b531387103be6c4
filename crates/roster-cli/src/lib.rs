mod bulk;
mod cli;
mod config;
mod migrate_cmd;
mod output;
mod search;
mod seed;
mod session;

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,roster=info";

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    // A missing .env is fine; the config may reference real environment variables.
    let _ = dotenvy::dotenv();
    init_tracing()?;

    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Migrate(args) => migrate_cmd::run(args).await,
        cli::Command::Seed(args) => seed::run(args).await,
        cli::Command::Search(args) => search::run_search(args).await,
        cli::Command::Page(args) => search::run_page(args).await,
        cli::Command::Bulk(args) => bulk::run(args).await,
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logger: {e}"))
}
