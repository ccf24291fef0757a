//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use clipfetch_core::DEFAULT_WORKERS;

/// Retrieve media artifacts from third-party platforms.
///
/// Clipfetch canonicalizes each link, walks the platform's extraction
/// strategies with bounded retries and fallbacks, and reports either the
/// retrieved file or a classified failure.
#[derive(Parser, Debug)]
#[command(name = "clipfetch")]
#[command(author, version, about)]
pub struct Args {
    /// Media links to retrieve (reads stdin when omitted)
    pub urls: Vec<String>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Maximum concurrent retrievals (1-16)
    #[arg(short = 'c', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=16))]
    pub concurrency: u8,

    /// Wall-clock budget per retrieval in seconds (1-3600)
    #[arg(short = 'w', long, default_value_t = 300, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub max_wall_time: u64,

    /// Output directory for retrieved artifacts (default: OUTPUT_DIR env or "downloads")
    #[arg(short = 'o', long)]
    pub output_dir: Option<PathBuf>,

    /// Attachment size ceiling in megabytes (default: SIZE_CEILING_BYTES env or 50 MB)
    #[arg(short = 's', long, value_parser = clap::value_parser!(u64).range(1..=2000))]
    pub size_ceiling_mb: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["clipfetch"]).unwrap();
        assert!(args.urls.is_empty());
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.concurrency, 4); // DEFAULT_WORKERS
        assert_eq!(args.max_wall_time, 300);
        assert!(args.output_dir.is_none());
        assert!(args.size_ceiling_mb.is_none());
    }

    #[test]
    fn test_cli_positional_urls() {
        let args = Args::try_parse_from([
            "clipfetch",
            "https://youtu.be/abc",
            "https://example.com/clip.mp4",
        ])
        .unwrap();
        assert_eq!(args.urls.len(), 2);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["clipfetch", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_concurrency_range_enforced() {
        assert!(Args::try_parse_from(["clipfetch", "-c", "0"]).is_err());
        assert!(Args::try_parse_from(["clipfetch", "-c", "17"]).is_err());
        let args = Args::try_parse_from(["clipfetch", "-c", "8"]).unwrap();
        assert_eq!(args.concurrency, 8);
    }

    #[test]
    fn test_cli_wall_time_range_enforced() {
        assert!(Args::try_parse_from(["clipfetch", "-w", "0"]).is_err());
        let args = Args::try_parse_from(["clipfetch", "-w", "60"]).unwrap();
        assert_eq!(args.max_wall_time, 60);
    }

    #[test]
    fn test_cli_output_dir_and_ceiling() {
        let args =
            Args::try_parse_from(["clipfetch", "-o", "/tmp/media", "-s", "25"]).unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("/tmp/media")));
        assert_eq!(args.size_ceiling_mb, Some(25));
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["clipfetch", "--help"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let result = Args::try_parse_from(["clipfetch", "--version"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayVersion
        );
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["clipfetch", "--invalid-flag"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::UnknownArgument
        );
    }
}
