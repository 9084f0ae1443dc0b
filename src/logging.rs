use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::{MakeWriter, MakeWriterExt};
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. Output goes to stderr and, when `log_file`
/// is set, is appended to that file too. `RUST_LOG` filters (default `info`),
/// `FEEBUMP_LOG_JSON=1` switches to JSON lines.
pub fn init_logging(log_file: Option<&Path>) -> io::Result<()> {
    let use_json = std::env::var("FEEBUMP_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);

    match log_file {
        Some(path) => {
            let file = Arc::new(open_append(path)?);
            install(io::stderr.and(file), use_json, false);
        }
        None => install(io::stderr, use_json, true),
    }
    Ok(())
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn install<W>(writer: W, use_json: bool, ansi: bool)
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if use_json {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .json()
            .with_writer(writer)
            .try_init();
    } else {
        let _ = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .pretty()
            .with_ansi(ansi)
            .with_writer(writer)
            .try_init();
    }
}
