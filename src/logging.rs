// SPDX-License-Identifier: MIT
//
// Logging setup.
//
// The terminal belongs to the editor while it runs, so logs never go to
// stdout or stderr. They go to a file, and only when asked for:
//
//   --log-file PATH / TILDE_LOG_FILE   log to PATH
//   TILDE_LOG or RUST_LOG set          log to <tmp>/tilde-<pid>.log
//
// Filter priority: TILDE_LOG > RUST_LOG > `warn,tilde=info`. A bare level
// in TILDE_LOG (`TILDE_LOG=debug`) applies to the tilde crates only.

use std::env;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

const CRATES: [&str; 3] = ["tilde", "tilde_term", "tilde_editor"];

/// Keeps the background writer alive; dropping it flushes the log file.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

/// Install the file subscriber if logging was requested.
///
/// Returns `Ok(None)` when logging is off.
///
/// # Errors
///
/// Fails if a filter directive is malformed or a global subscriber is
/// already installed.
pub fn init(
    log_file: Option<&Path>,
) -> Result<Option<LogGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let tilde_log = env::var("TILDE_LOG").ok();
    let rust_log = env::var("RUST_LOG").ok();

    let Some(path) = resolve_log_path(log_file, tilde_log.is_some() || rust_log.is_some()) else {
        return Ok(None);
    };

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let name = path
        .file_name()
        .map_or_else(default_file_name, |n| n.to_string_lossy().into_owned());
    std::fs::create_dir_all(&dir)?;

    let appender = tracing_appender::rolling::never(&dir, &name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_new(filter_directives(tilde_log.as_deref(), rust_log.as_deref()))?;
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter);

    Registry::default().with(layer).try_init()?;

    Ok(Some(LogGuard {
        _file_guard: guard,
        log_file: dir.join(name),
    }))
}

fn default_file_name() -> String {
    format!("tilde-{}.log", std::process::id())
}

/// Where to log, if anywhere.
fn resolve_log_path(explicit: Option<&Path>, env_requested: bool) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None if env_requested => Some(env::temp_dir().join(default_file_name())),
        None => None,
    }
}

/// The filter string for the given `TILDE_LOG` / `RUST_LOG` values.
fn filter_directives(tilde_log: Option<&str>, rust_log: Option<&str>) -> String {
    if let Some(directives) = tilde_log {
        if directives.contains(['=', ',', ':']) {
            return directives.to_owned();
        }
        let crates: Vec<String> = CRATES.iter().map(|c| format!("{c}={directives}")).collect();
        return format!("warn,{}", crates.join(","));
    }
    if let Some(directives) = rust_log {
        return directives.to_owned();
    }
    let crates: Vec<String> = CRATES.iter().map(|c| format!("{c}=info")).collect();
    format!("warn,{}", crates.join(","))
}
