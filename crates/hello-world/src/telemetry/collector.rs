//! Startup diagnostic for the collector configuration shipped with the function.

use std::path::PathBuf;

use tracing::{debug, info, warn};

/// Outcome of looking up `OPENTELEMETRY_COLLECTOR_CONFIG_FILE`.
#[derive(Debug, PartialEq, Eq)]
pub enum CollectorConfig {
    /// The variable is not set.
    Unset,
    /// The variable points at a file that cannot be read.
    Missing(PathBuf),
    /// The file exists and was read.
    Found { path: PathBuf, bytes: usize },
}

/// Report whether the collector configuration file is in place.
///
/// Never fails: a missing collector only means telemetry will be dropped,
/// which the exporters already tolerate.
#[tracing::instrument(name = "check_collector_config", skip_all)]
pub fn check_config(path: Option<&str>) -> CollectorConfig {
    let Some(path) = path.map(str::trim).filter(|p| !p.is_empty()) else {
        info!("OPENTELEMETRY_COLLECTOR_CONFIG_FILE is not set");
        return CollectorConfig::Unset;
    };

    match std::fs::read_to_string(path) {
        Ok(contents) => {
            info!(path, bytes = contents.len(), "collector config file found");
            debug!(path, %contents, "collector config contents");
            CollectorConfig::Found {
                path: PathBuf::from(path),
                bytes: contents.len(),
            }
        }
        Err(e) => {
            warn!(path, error = %e, "collector config file not readable");
            CollectorConfig::Missing(PathBuf::from(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn unset_and_blank_paths() {
        assert_eq!(check_config(None), CollectorConfig::Unset);
        assert_eq!(check_config(Some("  ")), CollectorConfig::Unset);
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("collector.yaml");
        let path = path.to_str().unwrap();
        assert_eq!(
            check_config(Some(path)),
            CollectorConfig::Missing(PathBuf::from(path))
        );
    }

    #[test]
    fn found_file_reports_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let yaml = "receivers:\n  otlp:\n    protocols:\n      grpc:\n";
        file.write_all(yaml.as_bytes()).unwrap();
        let path = file.path().to_str().unwrap();
        assert_eq!(
            check_config(Some(path)),
            CollectorConfig::Found {
                path: PathBuf::from(path),
                bytes: yaml.len(),
            }
        );
    }
}
