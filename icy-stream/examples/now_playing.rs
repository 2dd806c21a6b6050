//! Print every track title announced by an ICY stream until Ctrl-C.
//!
//! ```text
//! cargo run -p icy-stream --example now_playing -- http://radio.example:8000/stream
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use icy_stream::logging::{init_logging, LoggingMode};
use icy_stream::{IcySession, SessionConfig};

/// ICY now-playing monitor
#[derive(Parser, Debug)]
#[command(name = "now_playing")]
#[command(about = "Print track titles from an ICY/SHOUTcast stream")]
struct Args {
    /// Stream URL, e.g. http://radio.example:8000/;stream.mp3
    url: String,

    /// Connect timeout in seconds
    #[arg(long, default_value = "10")]
    connect_timeout: u64,

    /// Print the station headers before the first title
    #[arg(long)]
    show_headers: bool,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mode = if args.verbose {
        LoggingMode::Debug
    } else {
        LoggingMode::Development
    };
    init_logging(mode).context("Failed to initialize logging")?;

    let config = SessionConfig {
        connect_timeout: Duration::from_secs(args.connect_timeout),
        ..SessionConfig::metadata_only()
    };
    let mut session = IcySession::new(&args.url, config).context("Invalid stream settings")?;
    let mut headers = session.take_headers().context("Header queue not configured")?;
    let mut metadata = session.take_metadata().context("Metadata queue not configured")?;
    let mut errors = session.take_errors().context("Error queue not configured")?;

    session
        .open()
        .await
        .with_context(|| format!("Failed to open {}", args.url))?;

    if let Some(header_set) = headers.recv().await {
        if args.show_headers {
            for header in &header_set {
                println!("{}: {}", header.key, header.value);
            }
        }
        if let Some(name) = header_set.station_name() {
            println!("Listening to {name}");
        }
    }

    loop {
        // The error is sent before the queues close, so check it first
        tokio::select! {
            biased;
            error = &mut errors => {
                if let Ok(error) = error {
                    session.close().await.ok();
                    return Err(anyhow::Error::new(error).context("Stream failed"));
                }
                break;
            },
            update = metadata.recv() => match update {
                Some(update) => {
                    let title = update.stream_title().unwrap_or_default().trim();
                    if !title.is_empty() {
                        println!("{title}");
                    }
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    session.close().await.context("Stream failed")
}
