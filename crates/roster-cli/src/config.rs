use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_path: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    /// Read, expand and validate `config_path`. `database_override` replaces
    /// `database.url` before validation.
    pub fn load(config_path: PathBuf, database_override: Option<&str>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let mut file = ConfigFile::parse(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e}",
                config_path.display()
            )
        })?;

        if let Some(url) = database_override {
            file.database.url = url.to_string();
        }

        file.expand_env(|key| std::env::var(key).ok())?;
        file.validate()?;

        Ok(Self { config_path, file })
    }

    pub fn database_url(&self) -> &str {
        &self.file.database.url
    }

    pub fn pool_settings(&self) -> roster::PoolSettings {
        let mut settings = roster::PoolSettings::new();
        if let Some(size) = self.file.database.pool_size {
            settings = settings.max_size(size);
        }
        settings
    }

    pub fn monitor_config(&self) -> roster::MonitorConfig {
        let mut config = roster::MonitorConfig::new();
        if let Some(ms) = self.file.logging.slow_query_ms {
            config = config.with_slow_query_threshold(Duration::from_millis(ms));
        }
        if let Some(ms) = self.file.logging.query_timeout_ms {
            config = config.with_query_timeout(Duration::from_millis(ms));
        }
        config
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub paging: PagingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Statements slower than this log at WARN.
    pub slow_query_ms: Option<u64>,
    pub query_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub default_size: u64,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_size: default_page_size(),
        }
    }
}

fn default_page_size() -> u64 {
    10
}

impl ConfigFile {
    pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    fn expand_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        self.version = expand_env_vars(&self.version, &lookup)?;
        self.database.url = expand_env_vars(&self.database.url, &lookup)?;
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if self.database.url.trim().is_empty() {
            anyhow::bail!("database.url must not be empty");
        }
        if self.database.pool_size == Some(0) {
            anyhow::bail!("database.pool_size must be at least 1");
        }
        if self.paging.default_size == 0 {
            anyhow::bail!("paging.default_size must be at least 1");
        }
        Ok(())
    }
}

fn expand_env_vars(input: &str, lookup: &impl Fn(&str) -> Option<String>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            for ch in chars.by_ref() {
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = lookup(&key)
                .ok_or_else(|| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(key: &str) -> Option<String> {
        match key {
            "DATABASE_URL" => Some("postgres://app@localhost/roster".to_string()),
            "PGPORT" => Some("5433".to_string()),
            _ => None,
        }
    }

    #[test]
    fn expands_references() {
        assert_eq!(
            expand_env_vars("${DATABASE_URL}", &lookup).unwrap(),
            "postgres://app@localhost/roster"
        );
        assert_eq!(
            expand_env_vars("postgres://localhost:${PGPORT}/db", &lookup).unwrap(),
            "postgres://localhost:5433/db"
        );
        assert_eq!(expand_env_vars("$plain", &lookup).unwrap(), "$plain");
    }

    #[test]
    fn bad_references_fail() {
        assert!(expand_env_vars("${MISSING}", &lookup).is_err());
        assert!(expand_env_vars("${DATABASE_URL", &lookup).is_err());
        assert!(expand_env_vars("${}", &lookup).is_err());
    }

    #[test]
    fn sections_default_when_missing() {
        let file = ConfigFile::parse(
            r#"
version = "1"
[database]
url = "postgres://localhost/roster"
"#,
        )
        .unwrap();

        assert_eq!(file.paging.default_size, 10);
        assert_eq!(file.logging.slow_query_ms, None);
        assert_eq!(file.database.pool_size, None);
        file.validate().unwrap();
    }

    #[test]
    fn full_file_round_trips_through_expansion() {
        let mut file = ConfigFile::parse(
            r#"
version = "1"

[database]
url = "${DATABASE_URL}"
pool_size = 8

[logging]
slow_query_ms = 200

[paging]
default_size = 25
"#,
        )
        .unwrap();
        file.expand_env(lookup).unwrap();
        file.validate().unwrap();

        assert_eq!(file.database.url, "postgres://app@localhost/roster");
        assert_eq!(file.database.pool_size, Some(8));
        assert_eq!(file.logging.slow_query_ms, Some(200));
        assert_eq!(file.paging.default_size, 25);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let base = r#"
version = "2"
[database]
url = "postgres://localhost/roster"
"#;
        let err = ConfigFile::parse(base).unwrap().validate().unwrap_err();
        assert!(err.to_string().contains("version"));

        let zero_page = r#"
version = "1"
[database]
url = "postgres://localhost/roster"
[paging]
default_size = 0
"#;
        assert!(ConfigFile::parse(zero_page).unwrap().validate().is_err());
    }

    #[test]
    fn monitor_config_carries_threshold() {
        let file = ConfigFile::parse(
            r#"
version = "1"
[database]
url = "postgres://localhost/roster"
[logging]
slow_query_ms = 150
"#,
        )
        .unwrap();
        let project = ProjectConfig {
            config_path: PathBuf::from("roster.toml"),
            file,
        };
        assert_eq!(
            project.monitor_config().slow_query_threshold,
            Some(Duration::from_millis(150))
        );
    }
}
