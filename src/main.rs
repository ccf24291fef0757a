//! CLI entry point for the clipfetch tool.

use std::io::{self, IsTerminal, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use clipfetch_core::{
    Config, Database, Dispatcher, ErrorKind, Orchestrator, PreferenceStore, RetrievalFailure,
    RetrievalOutcome, RetrievalRequest, YtDlpExtractor, enforce_ceiling, health,
};

mod cli;

use cli::Args;

/// One line of the machine-readable outcome report.
#[derive(Debug, Serialize)]
struct OutcomeReport<'a> {
    url: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
}

impl<'a> OutcomeReport<'a> {
    fn from_outcome(url: &'a str, outcome: &'a RetrievalOutcome) -> Self {
        match outcome {
            Ok(retrieved) => Self {
                url,
                status: "success",
                kind: None,
                detail: None,
                file: Some(retrieved.file_path.display().to_string()),
                title: Some(&retrieved.title),
            },
            Err(failure) => Self {
                url,
                status: "failure",
                kind: Some(failure.kind),
                detail: Some(&failure.detail),
                file: None,
                title: None,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Determine log level based on verbose/quiet flags
    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");
    info!("Clipfetch starting");

    let config = Config::from_env();
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    let size_ceiling = args
        .size_ceiling_mb
        .map_or(config.size_ceiling, |mb| mb * 1024 * 1024);

    // Read input: from positional args or stdin
    let raw_urls: Vec<String> = if args.urls.is_empty() {
        if io::stdin().is_terminal() {
            info!("No input provided. Pipe links via stdin or pass as arguments.");
            info!("Example: echo 'https://youtu.be/dQw4w9WgXcQ' | clipfetch");
            return Ok(());
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    } else {
        args.urls.clone()
    };

    if raw_urls.is_empty() {
        info!("No links found in input");
        return Ok(());
    }

    std::fs::create_dir_all(&output_dir)?;

    // Preference store backing the caller-facing layer.
    // In-memory is sufficient for one-shot runs; set CLIPFETCH_DB for a
    // durable store in service deployments.
    let db = match std::env::var("CLIPFETCH_DB") {
        Ok(path) => Database::new(Path::new(&path)).await?,
        Err(_) => Database::new_in_memory().await?,
    };
    let prefs = PreferenceStore::new(db.clone());
    if let Some(admin_id) = config.admin_id {
        match prefs.get(admin_id).await {
            Ok(language) => debug!(admin_id, language = %language, "administrator language"),
            Err(error) => warn!(error = %error, "could not read administrator preference"),
        }
    }

    // Liveness endpoint for deployment probes; advisory, never fatal.
    let port = config.port;
    tokio::spawn(async move {
        if let Err(error) = health::serve(port).await {
            warn!(error = %error, port, "liveness endpoint unavailable");
        }
    });

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(YtDlpExtractor::new()),
        &output_dir,
    ));
    let dispatcher = Dispatcher::new(usize::from(args.concurrency));
    let max_wall_time = Duration::from_secs(args.max_wall_time);

    info!(
        links = raw_urls.len(),
        concurrency = args.concurrency,
        output_dir = %output_dir.display(),
        "dispatching retrievals"
    );

    let handles: Vec<(String, JoinHandle<RetrievalOutcome>)> = raw_urls
        .into_iter()
        .map(|raw_url| {
            let request = RetrievalRequest::new(raw_url.clone());
            let handle = dispatcher.dispatch(Arc::clone(&orchestrator), request, max_wall_time);
            (raw_url, handle)
        })
        .collect();

    let total = handles.len();
    let mut failed = 0usize;
    for (url, handle) in handles {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(error) => Err(RetrievalFailure::new(
                ErrorKind::Unknown,
                format!("retrieval worker panicked: {error}"),
            )),
        };
        // The transport's attachment ceiling applies to every success.
        let outcome = outcome.and_then(|retrieved| enforce_ceiling(retrieved, size_ceiling));

        if outcome.is_err() {
            failed += 1;
        }
        println!(
            "{}",
            serde_json::to_string(&OutcomeReport::from_outcome(&url, &outcome))?
        );
    }

    db.close().await;

    if failed > 0 {
        anyhow::bail!("{failed} of {total} retrievals failed");
    }
    info!(total, "all retrievals succeeded");
    Ok(())
}
