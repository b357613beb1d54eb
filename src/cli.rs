use clap::Parser;
use std::path::PathBuf;

/// Collects a day's uploads from configured YouTube channels into a dated
/// playlist.
#[derive(Debug, Parser)]
#[command(name = "youtube-digest", version, about)]
pub struct Cli {
    /// Category of channels to collect (defaults to the configured default
    /// category).
    #[arg(short, long)]
    pub category: Option<String>,

    /// Target date as YYYY-MM-DD (defaults to today, UTC).
    #[arg(short, long)]
    pub date: Option<String>,

    /// Path to the configuration file.
    #[arg(long, default_value = "youtube-digest.toml")]
    pub config: PathBuf,

    /// Open the playlist in the default browser after the run.
    #[arg(long)]
    pub open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_and_long_flags() {
        let cli = Cli::parse_from(["youtube-digest", "-c", "dev", "--date", "2025-09-16"]);

        assert_eq!(cli.category.as_deref(), Some("dev"));
        assert_eq!(cli.date.as_deref(), Some("2025-09-16"));
        assert_eq!(cli.config, PathBuf::from("youtube-digest.toml"));
        assert!(!cli.open);
    }

    #[test]
    fn everything_is_optional() {
        let cli = Cli::parse_from(["youtube-digest"]);

        assert!(cli.category.is_none());
        assert!(cli.date.is_none());
    }
}
