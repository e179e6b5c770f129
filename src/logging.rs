//! Tracing setup.
//!
//! Logs go to stderr (stdout is reserved for the MCP transport) without
//! ANSI colors, filtered by `RUST_LOG` plus a default directive derived
//! from the configured `logLevel`. When `logPath` is configured, the same
//! output is appended to `mcp_server.log` under that directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoadedConfig;

/// Log file name inside the configured log directory.
pub const LOG_FILE_NAME: &str = "mcp_server.log";

/// Map a configured level (error < warn < info < verbose < debug < silly)
/// onto a tracing level. Unknown levels fall back to `info`.
fn level_filter(config_level: Option<&str>) -> &'static str {
    match config_level.map(str::to_ascii_lowercase).as_deref() {
        Some("error") => "error",
        Some("warn") => "warn",
        Some("verbose") | Some("debug") => "debug",
        Some("silly") => "trace",
        _ => "info",
    }
}

/// Append a `logs` component unless the path already ends in `log`/`logs`.
fn normalize_log_dir(path: &str) -> PathBuf {
    let trimmed = path.trim_end_matches(['/', '\\']);
    if trimmed.ends_with("logs") || trimmed.ends_with("log") {
        PathBuf::from(trimmed)
    } else {
        Path::new(trimmed).join("logs")
    }
}

/// Initialize tracing from the loaded configuration.
///
/// Must be called once per process, before the server starts serving.
pub fn init_tracing(config: Option<&LoadedConfig>) -> anyhow::Result<()> {
    let level = level_filter(config.and_then(|c| c.log_level.as_deref()));
    let directive = format!("mysql_mcp={level}");
    let filter = EnvFilter::from_default_env().add_directive(directive.parse()?);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);
    let registry = tracing_subscriber::registry().with(filter).with(stderr_layer);

    let log_dir = config
        .and_then(|c| c.log_path.as_deref())
        .filter(|p| !p.trim().is_empty())
        .map(normalize_log_dir);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)?;
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE_NAME))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(Arc::new(file))
                        .with_ansi(false),
                )
                .init();
        }
        None => registry.init(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_levels_map_onto_tracing_levels() {
        assert_eq!(level_filter(Some("error")), "error");
        assert_eq!(level_filter(Some("warn")), "warn");
        assert_eq!(level_filter(Some("info")), "info");
        assert_eq!(level_filter(Some("verbose")), "debug");
        assert_eq!(level_filter(Some("debug")), "debug");
        assert_eq!(level_filter(Some("SILLY")), "trace");
        assert_eq!(level_filter(Some("bogus")), "info");
        assert_eq!(level_filter(None), "info");
    }

    #[test]
    fn log_dir_gets_a_logs_suffix_unless_present() {
        assert_eq!(normalize_log_dir("/var/tmp"), PathBuf::from("/var/tmp/logs"));
        assert_eq!(normalize_log_dir("/var/tmp/logs"), PathBuf::from("/var/tmp/logs"));
        assert_eq!(normalize_log_dir("/var/tmp/log/"), PathBuf::from("/var/tmp/log"));
    }
}
