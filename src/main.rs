#![allow(missing_docs)]

//! Redpersona CLI: builds a persona report for one Reddit user.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use redpersona::config::Config;
use redpersona::persona::retry::RetryPolicy;
use redpersona::persona::PersonaSynthesizer;
use redpersona::profile_url::extract_username;
use redpersona::providers::openai::OpenAiCompatibleClient;
use redpersona::reddit::{ActivitySource, RedditClient};
use redpersona::report::save_persona;

/// Generate a behavioural persona report from a Reddit user's public activity.
#[derive(Debug, Parser)]
#[command(name = "redpersona", version, about, long_about = None)]
struct Cli {
    /// Reddit profile URL (https://www.reddit.com/user/<name>) or username.
    profile: String,

    /// Path to config file (overrides REDPERSONA_CONFIG).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory the `<username>_persona.txt` report is written to.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Maximum posts and maximum comments to fetch (overrides reddit.fetch_limit).
    #[arg(long)]
    limit: Option<u32>,

    /// Print the persona without writing a report file.
    #[arg(long)]
    no_save: bool,

    /// Also write JSON logs to this directory.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, load_warnings) =
        Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let _log_guard = match &cli.log_dir {
        Some(dir) => Some(redpersona::logging::init_with_file(dir, &config.log_level)?),
        None => {
            redpersona::logging::init_cli(&config.log_level);
            None
        }
    };

    for warning in &load_warnings {
        warn!("{warning}");
    }

    let username = extract_username(&cli.profile)
        .with_context(|| format!("invalid Reddit profile URL: {}", cli.profile))?;

    config.validate()?;
    let api_key = config.llm.require_api_key()?;

    let reddit = RedditClient::new(&config.reddit)?;
    let limit = cli.limit.unwrap_or(config.reddit.fetch_limit);
    info!(username = %username, limit, "fetching reddit activity");
    let activity = reddit.fetch(&username, limit).await;
    if activity.is_empty() {
        anyhow::bail!("no Reddit posts or comments found for u/{username}");
    }

    let provider = Arc::new(OpenAiCompatibleClient::new(api_key, &config.llm)?);
    let synthesizer = PersonaSynthesizer::new(
        provider,
        config.synthesis.clone(),
        RetryPolicy::from_config(&config.retry),
    );

    info!(model = %config.llm.model, "generating persona, this can take a few minutes");
    let persona = synthesizer
        .synthesize(&activity.posts, &activity.comments, &username)
        .await?;
    info!(
        chunks = persona.chunks_processed,
        failed = persona.chunks_failed,
        "persona generated"
    );

    println!("{}", persona.text);

    if !cli.no_save {
        let path = save_persona(&cli.output_dir, &persona)?;
        eprintln!("Persona saved to: {}", path.display());
    }

    Ok(())
}
