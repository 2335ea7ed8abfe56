use crate::database::ProvisionOptions;
use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Application configuration, built once at process entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClibleConfig {
    /// Directory holding clible's data files
    pub data_dir: PathBuf,

    /// SQLite database file (default: `<data_dir>/clible.db`)
    pub db_path: PathBuf,

    /// Directory of `*.sql` migration units (default: `<data_dir>/migrations`)
    pub migrations_dir: PathBuf,

    /// Book reference dataset (default: `<data_dir>/bible_structure.json`)
    pub books_path: PathBuf,

    /// Base URL of the remote translation API
    pub api_base_url: String,

    /// Translation codes to support, e.g. `["KJV", "ESV"]`
    pub translations: Vec<String>,

    /// HTTP request timeout in seconds (default: 10)
    pub request_timeout_secs: u64,

    /// Delay between API calls in seconds (default: 1)
    pub request_delay_secs: u64,
}

pub const DEFAULT_API_BASE_URL: &str = "https://api.bible-api.com";
pub const DEFAULT_TRANSLATIONS: &str = "KJV,ESV,NIV";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_REQUEST_DELAY_SECS: u64 = 1;

const EMPTY_CONFIG: &str = r#"### clible configuration file
### every key can also be set through a CLIBLE_<KEY> environment variable

### directory for data used by clible
# data_dir = "~/.clible"

### database and bootstrap files (default to locations inside data_dir)
# db_path = "~/.clible/clible.db"
# migrations_dir = "~/.clible/migrations"
# books_path = "~/.clible/bible_structure.json"

### translation API settings
# api_base_url = "https://api.bible-api.com"
# translations = "KJV,ESV,NIV"
# request_timeout = 10   # seconds
# request_delay = 1      # seconds
"#;

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".clible")
}

impl Default for ClibleConfig {
    fn default() -> Self {
        Self::with_data_dir(default_data_dir())
    }
}

impl ClibleConfig {
    /// Defaults rooted at the given data directory
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let options = ProvisionOptions::in_dir(&data_dir);
        Self {
            data_dir,
            db_path: options.db_path,
            migrations_dir: options.migrations_dir,
            books_path: options.books_path,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            translations: parse_translations(DEFAULT_TRANSLATIONS),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            request_delay_secs: DEFAULT_REQUEST_DELAY_SECS,
        }
    }

    /// Function to create and initialize a new configuration
    ///
    /// Reads the TOML file at `path` (default `$HOME/.clible/clible.toml`,
    /// created from a commented template when missing), then overrides it
    /// with `CLIBLE_*` environment variables.
    pub fn new(path: &Option<String>) -> Result<ClibleConfig> {
        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    builder = builder.add_source(config::File::from(path));
                } else {
                    std::fs::write(path, EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                let clible_dir = default_data_dir();
                std::fs::create_dir_all(&clible_dir)
                    .map_err(|e| anyhow!("Unable to create clible directory: {}", e))?;
                let p = clible_dir.join("clible.toml");
                if p.exists() {
                    builder = builder.add_source(config::File::from(p.as_path()));
                } else {
                    std::fs::write(&p, EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.display(), e)
                    })?;
                }
            }
        }

        // Add in settings from the environment (with a prefix of CLIBLE)
        // E.g., `CLIBLE_DB_PATH=/tmp/test.db clible books` would use a scratch database
        builder = builder.add_source(config::Environment::with_prefix("CLIBLE"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let config = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        Ok(Self::from_settings(&config, default_data_dir()))
    }

    /// Resolve a configuration from flat key/value settings
    ///
    /// Paths not given explicitly are derived from `data_dir`. Unparsable
    /// numbers fall back to their defaults with a warning.
    pub fn from_settings(settings: &HashMap<String, String>, default_data_dir: PathBuf) -> Self {
        let data_dir = settings
            .get("data_dir")
            .map(|p| expand_home(p))
            .unwrap_or(default_data_dir);
        let mut config = Self::with_data_dir(data_dir);

        if let Some(p) = settings.get("db_path") {
            config.db_path = expand_home(p);
        }
        if let Some(p) = settings.get("migrations_dir") {
            config.migrations_dir = expand_home(p);
        }
        if let Some(p) = settings.get("books_path") {
            config.books_path = expand_home(p);
        }
        if let Some(url) = settings.get("api_base_url") {
            config.api_base_url = url.clone();
        }
        if let Some(raw) = settings.get("translations") {
            config.translations = parse_translations(raw);
        }
        config.request_timeout_secs =
            parse_secs(settings, "request_timeout", DEFAULT_REQUEST_TIMEOUT_SECS);
        config.request_delay_secs = parse_secs(settings, "request_delay", DEFAULT_REQUEST_DELAY_SECS);

        config
    }

    /// Paths handed to the database provisioner
    pub fn provision_options(&self) -> ProvisionOptions {
        ProvisionOptions {
            db_path: self.db_path.clone(),
            migrations_dir: self.migrations_dir.clone(),
            books_path: self.books_path.clone(),
        }
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Get request delay as Duration
    pub fn request_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_delay_secs)
    }

    /// Get the config file path
    pub fn config_file_path() -> PathBuf {
        default_data_dir().join("clible.toml")
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!("Data Directory:     {}", self.data_dir.display()),
            format!("SQLite Path:        {}", self.db_path.display()),
            format!("Migrations:         {}", self.migrations_dir.display()),
            format!("Books Dataset:      {}", self.books_path.display()),
            format!("API Base URL:       {}", self.api_base_url),
            format!("Translations:       {}", self.translations.join(", ")),
            format!("Request Timeout:    {} seconds", self.request_timeout_secs),
            format!("Request Delay:      {} seconds", self.request_delay_secs),
        ]
        .join("\n")
    }
}

fn parse_translations(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_secs(settings: &HashMap<String, String>, key: &str, default: u64) -> u64 {
    match settings.get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("ignoring invalid {} '{}', using {}", key, raw, default);
            default
        }),
        None => default,
    }
}

fn expand_home(p: &str) -> PathBuf {
    let rest = if p == "~" {
        Some("")
    } else {
        p.strip_prefix("~/")
    };
    match rest {
        Some(rest) => dirs::home_dir()
            .map(|h| if rest.is_empty() { h } else { h.join(rest) })
            .unwrap_or_else(|| PathBuf::from(p)),
        None => PathBuf::from(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = ClibleConfig::from_settings(&HashMap::new(), PathBuf::from("/test/dir"));
        assert_eq!(config.api_base_url, "https://api.bible-api.com");
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.request_delay_secs, 1);
        assert_eq!(config.translations, vec!["KJV", "ESV", "NIV"]);
        assert_eq!(config.db_path, PathBuf::from("/test/dir/clible.db"));
        assert_eq!(config.db_path.parent(), Some(config.data_dir.as_path()));
        assert_eq!(config.migrations_dir, PathBuf::from("/test/dir/migrations"));
    }

    #[test]
    fn test_paths_follow_data_dir() {
        let config =
            ClibleConfig::from_settings(&settings(&[("data_dir", "/srv/clible")]), PathBuf::new());
        assert_eq!(config.db_path, PathBuf::from("/srv/clible/clible.db"));
        assert_eq!(
            config.books_path,
            PathBuf::from("/srv/clible/bible_structure.json")
        );
    }

    #[test]
    fn test_explicit_db_path_wins() {
        let config = ClibleConfig::from_settings(
            &settings(&[("data_dir", "/srv/clible"), ("db_path", "/tmp/test.db")]),
            PathBuf::new(),
        );
        assert_eq!(config.db_path, PathBuf::from("/tmp/test.db"));
        assert_eq!(
            config.provision_options().migrations_dir,
            PathBuf::from("/srv/clible/migrations")
        );
    }

    #[test]
    fn test_translations_and_numbers() {
        let config = ClibleConfig::from_settings(
            &settings(&[
                ("translations", " KJV , ,WEB "),
                ("request_timeout", "30"),
                ("request_delay", "soon"),
            ]),
            PathBuf::from("/test"),
        );
        assert_eq!(config.translations, vec!["KJV", "WEB"]);
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(30));
        assert_eq!(config.request_delay(), std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_expand_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~/.clible"), home.join(".clible"));
        assert_eq!(expand_home("/srv/~"), PathBuf::from("/srv/~"));
        assert_eq!(expand_home("~other"), PathBuf::from("~other"));

        let config = ClibleConfig::from_settings(&settings(&[("data_dir", "~")]), PathBuf::new());
        assert_eq!(config.db_path, home.join("clible.db"));
    }

    #[test]
    fn test_new_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clible.toml");
        std::fs::write(
            &path,
            format!(
                "data_dir = \"{}\"\nrequest_delay = 5\n",
                dir.path().display()
            ),
        )
        .unwrap();

        let config = ClibleConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.request_delay_secs, 5);
    }

    #[test]
    fn test_new_writes_template_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clible.toml");

        ClibleConfig::new(&Some(path.to_string_lossy().to_string())).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("### clible configuration file"));
    }
}
