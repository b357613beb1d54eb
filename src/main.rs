use clap::Parser;
use eyre::Context;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_digest::cli::Cli;
use youtube_digest::config::{self, Config};
use youtube_digest::{digest, oauth};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stdout().is_terminal())
        .init();

    let cli = Cli::parse();

    // Everything that can fail before any network I/O fails here, with a
    // non-zero exit: config, category lookup, date parsing.
    let config = Config::load(&cli.config)?;
    let category_name = cli.category.as_deref().unwrap_or(&config.default_category);
    let category = config.category(category_name)?;
    let date = match cli.date.as_deref() {
        Some(raw) => config::parse_date(raw)?,
        None => config::today_utc(),
    };
    let window = category.upload_window(date, jiff::Timestamp::now());

    tracing::info!(
        category = %category.name,
        %date,
        channels = category.channels.len(),
        published_after = %window.published_after,
        published_before = %window.published_before,
        "starting digest run"
    );

    let client = oauth::authenticated_client(&config.credentials_file, &config.token_file)
        .await
        .context("authenticate with YouTube")?;

    let report = digest::run(&client, &category, date, &window, &config.playlist).await;
    report.print();

    if cli.open {
        if let Some(playlist) = &report.playlist {
            if let Err(e) = webbrowser::open(&playlist.url()) {
                tracing::debug!("could not open browser: {e}");
            }
        }
    }

    // Per-channel and per-video failures were reported in the summary; the
    // run itself still completed, so the exit code stays zero.
    Ok(())
}
