use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use codereview_service::{
    api::{self, ApiKeyAuth, AppState},
    logging, CandidateLevel, Config, MemoryCache, RedisCache, ReviewCache, ReviewRequest,
    ReviewService,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Settings file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Review a single repository and print the result as JSON
    Review(ReviewArgs),
}

#[derive(Args)]
struct ReviewArgs {
    /// Repository URL, e.g. https://github.com/owner/name
    #[arg(short, long)]
    url: String,

    /// Candidate level: Junior, Middle or Senior
    #[arg(short, long, default_value = "Junior")]
    level: CandidateLevel,

    /// Assignment the repository was written for
    #[arg(short, long, default_value = "")]
    description: String,

    /// Skip Redis and keep the result in memory only
    #[arg(long)]
    no_cache: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Review(args) => review_once(config, args).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let cache = RedisCache::connect(&config.settings.redis_url)
        .await
        .with_context(|| format!("Failed to connect to Redis at {}", config.settings.redis_url))?;
    let service = ReviewService::from_config(&config, Arc::new(cache))?;
    let auth = ApiKeyAuth::new(
        &config.credentials.api_key_header,
        config.credentials.api_key.clone(),
    )?;
    let app = api::router(AppState::new(service, auth));

    let listener = TcpListener::bind(&config.settings.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.settings.bind_addr))?;
    info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn review_once(config: Config, args: ReviewArgs) -> anyhow::Result<()> {
    let cache: Arc<dyn ReviewCache> = if args.no_cache {
        Arc::new(MemoryCache::new())
    } else {
        Arc::new(RedisCache::connect(&config.settings.redis_url).await?)
    };
    let service = ReviewService::from_config(&config, cache)?;

    let request = ReviewRequest {
        assignment_description: args.description,
        github_repo_url: args.url,
        candidate_level: args.level,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Reviewing {}", request.github_repo_url));
    spinner.enable_steady_tick(Duration::from_millis(120));

    let result = service.review(&request).await;
    spinner.finish_and_clear();

    let result = result?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
