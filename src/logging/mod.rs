//! Diagnostics setup and the optional chat transcript.
//!
//! Diagnostics go through `tracing`. When enabled, the transcript writes
//! PRIVMSG and NOTICE traffic to daily files named `<target>_<date>.log` in
//! the configured directory (default: `~/.local/share/tickirc/logs/`).

use crate::config::LoggingConfig;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Install the global `tracing` subscriber. `RUST_LOG` wins over `level`.
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// What kind of line a transcript entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Privmsg,
    Notice,
}

/// Appends chat lines to per-target daily log files.
///
/// File handles are cached for the lifetime of the transcript.
pub struct Transcript {
    enabled: bool,
    log_dir: PathBuf,
    file_handles: HashMap<String, fs::File>,
}

impl Transcript {
    pub fn new(config: &LoggingConfig) -> Self {
        Self::with_dir(config.transcript, expand_home(&config.log_dir))
    }

    pub fn with_dir(enabled: bool, log_dir: PathBuf) -> Self {
        Self {
            enabled,
            log_dir,
            file_handles: HashMap::new(),
        }
    }

    /// Record one line. Write failures are logged, never returned, so a
    /// full disk cannot take the connection down.
    pub fn record(&mut self, kind: EntryKind, target: &str, sender: &str, text: &str) {
        if !self.enabled {
            return;
        }
        let now = chrono::Local::now();
        let line = match kind {
            EntryKind::Privmsg => format!("[{}] <{}> {}", now.format("%H:%M:%S"), sender, text),
            EntryKind::Notice => format!("[{}] -{}- {}", now.format("%H:%M:%S"), sender, text),
        };
        let filename = format!("{}_{}.log", safe_name(target), now.format("%Y-%m-%d"));

        if let Err(e) = self.append(&filename, &line) {
            warn!(file = %filename, error = %e, "failed to write transcript");
        }
    }

    fn append(&mut self, filename: &str, line: &str) -> io::Result<()> {
        let handle = match self.file_handles.entry(filename.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                fs::create_dir_all(&self.log_dir)?;
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(self.log_dir.join(filename))?;
                entry.insert(file)
            }
        };
        writeln!(handle, "{}", line)
    }
}

fn safe_name(target: &str) -> String {
    target
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => PathBuf::from(dir),
        },
        None => PathBuf::from(dir),
    }
}
