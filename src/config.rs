//! `config.toml` loading.
//!
//! ```toml
//! [sheet]
//! columns = 8
//! rows = 10
//!
//! [log]
//! level = "warn"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use gridlock_engine::engine::{MAX_COLUMNS, MAX_ROWS};
use serde::Deserialize;
use tracing::level_filters::LevelFilter;

const MAX_CONFIG_FILE_BYTES: u64 = 1_048_576; // 1 MiB

pub const DEFAULT_COLUMNS: usize = 8;
pub const DEFAULT_ROWS: usize = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    sheet: Option<SheetSection>,
    log: Option<LogSection>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SheetSection {
    columns: Option<usize>,
    rows: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LogSection {
    level: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub columns: usize,
    pub rows: usize,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            log_level: LevelFilter::WARN,
        }
    }
}

/// Load the config from `config_file`, or from the user config dir when no
/// path is given. Problems never fail the load: they fall back to defaults
/// and are returned as warnings.
pub fn load_config(config_file: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(path) = config_file.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if config_file.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let content = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            return (Config::default(), warnings);
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                return (Config::default(), warnings);
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            return (Config::default(), warnings);
        }
    };

    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => (build_config(file, &mut warnings), warnings),
        Err(err) => {
            warnings.push(format!("Failed to parse {}: {}", path.display(), err));
            (Config::default(), warnings)
        }
    }
}

fn build_config(file: ConfigFile, warnings: &mut Vec<String>) -> Config {
    let mut config = Config::default();

    if let Some(sheet) = file.sheet {
        match sheet.columns {
            Some(columns) if (1..=MAX_COLUMNS).contains(&columns) => config.columns = columns,
            Some(columns) => warnings.push(format!(
                "sheet.columns must be between 1 and {}, got {}; using {}",
                MAX_COLUMNS, columns, DEFAULT_COLUMNS
            )),
            None => {}
        }
        match sheet.rows {
            Some(rows) if (1..=MAX_ROWS).contains(&rows) => config.rows = rows,
            Some(rows) => warnings.push(format!(
                "sheet.rows must be between 1 and {}, got {}; using {}",
                MAX_ROWS, rows, DEFAULT_ROWS
            )),
            None => {}
        }
    }

    if let Some(level) = file.log.and_then(|log| log.level) {
        match level.trim().parse::<LevelFilter>() {
            Ok(filter) => config.log_level = filter,
            Err(_) => warnings.push(format!("Unknown log.level '{}'; using warn", level)),
        }
    }

    config
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "gridlock")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("config.toml");
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> (Config, Vec<String>) {
        let mut warnings = Vec::new();
        let file: ConfigFile = toml::from_str(content).unwrap();
        (build_config(file, &mut warnings), warnings)
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "gridlock_{}_{}_{}_{:?}.toml",
            tag,
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos(),
            std::thread::current().id(),
        ))
    }

    struct Cleanup(PathBuf);
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn test_full_config() {
        let (config, warnings) = parse("[sheet]\ncolumns = 26\nrows = 100\n[log]\nlevel = \"debug\"\n");
        assert!(warnings.is_empty());
        assert_eq!(
            config,
            Config {
                columns: 26,
                rows: 100,
                log_level: LevelFilter::DEBUG
            }
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let (config, warnings) = parse("");
        assert!(warnings.is_empty());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_out_of_range_values_warn() {
        let (config, warnings) = parse("[sheet]\ncolumns = 27\nrows = 0\n[log]\nlevel = \"loud\"\n");
        assert_eq!(config, Config::default());
        assert_eq!(warnings.len(), 3);
        assert!(warnings[0].contains("sheet.columns"));

        let (config, warnings) = parse("[sheet]\nrows = 10001\n");
        assert_eq!(config.rows, DEFAULT_ROWS);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("sheet.rows"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(toml::from_str::<ConfigFile>("[sheet]\ncols = 3\n").is_err());
        assert!(toml::from_str::<ConfigFile>("[theme]\nname = \"dark\"\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = temp_path("config");
        let _cleanup = Cleanup(path.clone());
        std::fs::write(&path, "[sheet]\ncolumns = 3\n").unwrap();

        let (config, warnings) = load_config(Some(path.as_path()));
        assert!(warnings.is_empty(), "{warnings:?}");
        assert_eq!(config.columns, 3);
        assert_eq!(config.rows, DEFAULT_ROWS);
    }

    #[test]
    fn test_bad_files_fall_back_to_defaults() {
        let missing = temp_path("missing");
        let (config, warnings) = load_config(Some(missing.as_path()));
        assert_eq!(config, Config::default());
        assert!(warnings[0].contains("not found"));

        let invalid = temp_path("invalid");
        let _cleanup = Cleanup(invalid.clone());
        std::fs::write(&invalid, "[sheet\n").unwrap();
        let (config, warnings) = load_config(Some(invalid.as_path()));
        assert_eq!(config, Config::default());
        assert!(warnings[0].contains("Failed to parse"));

        let oversized = temp_path("oversized");
        let _cleanup = Cleanup(oversized.clone());
        std::fs::write(&oversized, "#".repeat(MAX_CONFIG_FILE_BYTES as usize + 1)).unwrap();
        let (_, warnings) = load_config(Some(oversized.as_path()));
        assert!(warnings[0].contains("too large"));
    }
}
