use crate::config::{LogSection, LoggingConfig};
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{filter::Targets, fmt};

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};

// -------- level helpers --------

/// Unknown strings fall back to INFO; "off"/"none" disable the sink.
fn parse_level_filter(s: &str) -> LevelFilter {
    match s.trim().to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" | "" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" | "none" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

// -------- rotating writer for files --------

#[derive(Clone)]
struct RotWriter(Arc<Mutex<FileRotate<AppendCount>>>);

impl<'a> fmt::MakeWriter<'a> for RotWriter {
    type Writer = RotWriterHandle;
    fn make_writer(&'a self) -> Self::Writer {
        RotWriterHandle(self.0.clone())
    }
}

struct RotWriterHandle(Arc<Mutex<FileRotate<AppendCount>>>);

impl Write for RotWriterHandle {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer poisoned"))?
            .write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0
            .lock()
            .map_err(|_| std::io::Error::other("log writer poisoned"))?
            .flush()
    }
}

/// Resolve a log file path against `base_dir` (home_dir).
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn create_rotating_writer(section: &LogSection, base_dir: &Path) -> std::io::Result<RotWriter> {
    let log_path = resolve_log_path(&section.file, base_dir);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let max_bytes = section.max_size_mb.unwrap_or(100) * 1024 * 1024;

    let rot = FileRotate::new(
        log_path,
        AppendCount::new(section.max_backups.unwrap_or(3)),
        ContentLimit::BytesSurpassed(max_bytes as usize),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(RotWriter(Arc::new(Mutex::new(rot))))
}

// -------- filters --------

/// Console filter: "default" section sets the fallback level; every other key is a
/// target prefix (e.g. "access_requests", "sqlx") with its own level.
fn console_targets(cfg: &LoggingConfig) -> Targets {
    build_targets(cfg, |s| &s.console_level)
}

/// File filter: same shape, using `file_level`.
fn file_targets(cfg: &LoggingConfig) -> Targets {
    build_targets(cfg, |s| &s.file_level)
}

fn build_targets(cfg: &LoggingConfig, level_of: impl Fn(&LogSection) -> &String) -> Targets {
    let default = cfg
        .get("default")
        .map(|s| parse_level_filter(level_of(s)))
        .unwrap_or(LevelFilter::INFO);

    cfg.iter()
        .filter(|(name, _)| name.as_str() != "default")
        .fold(Targets::new().with_default(default), |targets, (name, s)| {
            targets.with_target(name.clone(), parse_level_filter(level_of(s)))
        })
}

// -------- public init --------

/// Initialize logging from a configuration.
/// - `cfg`: subsystem → section map; an empty map yields plain console logging at INFO
/// - `base_dir`: base directory used to resolve relative log file paths (server.home_dir)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer, Registry};

    // Bridge `log` → `tracing` before installing the subscriber.
    let _ = tracing_log::LogTracer::init();

    let ansi = std::io::stdout().is_terminal();
    let console_layer = fmt::layer()
        .with_ansi(ansi)
        .with_target(true)
        .with_level(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(console_targets(cfg));

    let file_layer = cfg
        .get("default")
        .filter(|s| !s.file.trim().is_empty())
        .and_then(|section| match create_rotating_writer(section, base_dir) {
            Ok(writer) => Some(writer),
            Err(e) => {
                eprintln!(
                    "Failed to initialize log file '{}': {e}",
                    resolve_log_path(&section.file, base_dir).display()
                );
                None
            }
        })
        .map(|writer| {
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_target(true)
                .with_level(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(writer)
                .with_filter(file_targets(cfg))
        });

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}

// =================== tests ===================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_logging;
    use tempfile::tempdir;

    fn section(console: &str, file: &str, file_level: &str) -> LogSection {
        LogSection {
            console_level: console.into(),
            file: file.into(),
            file_level: file_level.into(),
            max_backups: Some(2),
            max_size_mb: Some(1),
        }
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(parse_level_filter("trace"), LevelFilter::TRACE);
        assert_eq!(parse_level_filter("DEBUG"), LevelFilter::DEBUG);
        assert_eq!(parse_level_filter("Info"), LevelFilter::INFO);
        assert_eq!(parse_level_filter("warn"), LevelFilter::WARN);
        assert_eq!(parse_level_filter("ERROR"), LevelFilter::ERROR);
        assert_eq!(parse_level_filter("off"), LevelFilter::OFF);
        assert_eq!(parse_level_filter("none"), LevelFilter::OFF);
        assert_eq!(parse_level_filter("bogus"), LevelFilter::INFO);
    }

    #[test]
    fn test_targets_respect_subsystem_sections() {
        let mut cfg = default_logging();
        cfg.insert("sqlx".into(), section("warn", "", "off"));
        cfg.insert("access_requests".into(), section("trace", "", "debug"));

        let console = console_targets(&cfg);
        assert!(console.would_enable("access_requests::domain::service", &tracing::Level::TRACE));
        assert!(!console.would_enable("sqlx::query", &tracing::Level::INFO));
        assert!(console.would_enable("gatekeeper_server", &tracing::Level::INFO));
        assert!(!console.would_enable("gatekeeper_server", &tracing::Level::DEBUG));

        let file = file_targets(&cfg);
        assert!(!file.would_enable("sqlx::query", &tracing::Level::ERROR));
        assert!(file.would_enable("gatekeeper_server", &tracing::Level::DEBUG));
    }

    #[test]
    fn test_file_paths_resolved_against_home_dir() {
        let tmp = tempdir().unwrap();
        let resolved = resolve_log_path("logs/test.log", tmp.path());
        assert!(resolved.starts_with(tmp.path()));
        assert!(resolved.ends_with("logs/test.log"));

        let abs = tmp.path().join("abs.log");
        assert_eq!(resolve_log_path(&abs.to_string_lossy(), Path::new("/ignored")), abs);
    }

    #[test]
    fn test_rotating_writer_creates_parent() {
        let tmp = tempdir().unwrap();
        let s = section("info", "nested/dir/app.log", "debug");

        let writer = create_rotating_writer(&s, tmp.path());
        assert!(writer.is_ok(), "writer should be created");
        assert!(tmp.path().join("nested/dir").is_dir());
    }
}
