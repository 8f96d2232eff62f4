use crate::adapters::http::{HttpTableFetcher, DEFAULT_USER_AGENT};
use crate::adapters::mail::{SmtpSettings, DEFAULT_SMTP_PORT};
use crate::adapters::storage::LocalStorage;
use crate::core::provider::{CacheSettings, TableProvider, SECONDS_PER_HOUR};
use crate::core::table_select::TableMatcher;
use crate::domain::model::{DestinationLookup, TableLayout};
use crate::utils::error::{NotifyError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_SOURCE_URL: &str = "https://www.post.japanpost.jp/int/information/overview.html";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub cache: CacheConfig,
    pub table: TableConfig,
    /// Source name to display name. Absent means the built-in watch-list.
    pub destinations: Option<HashMap<String, String>>,
    pub mail: MailConfig,
    pub recipients: RecipientsConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SourceMode {
    /// The table compiled into the binary.
    Snapshot,
    /// Fetch the status page, with the cache in front of it.
    #[default]
    Live,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub mode: SourceMode,
    pub url: String,
    pub timeout_seconds: u64,
    pub user_agent: Option<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Live,
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout_seconds: 30,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: String,
    pub file: String,
    pub expiry_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "./cache".to_string(),
            file: CacheSettings::default().file_name,
            expiry_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub destination_column: usize,
    pub status_column: usize,
    /// Absent means the default rules for the configured watch-list.
    pub matchers: Option<Vec<TableMatcher>>,
}

impl Default for TableConfig {
    fn default() -> Self {
        let layout = TableLayout::default();
        Self {
            destination_column: layout.destination_column,
            status_column: layout.status_column,
            matchers: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipientsConfig {
    pub path: String,
}

impl Default for RecipientsConfig {
    fn default() -> Self {
        Self {
            path: "emails.csv".to_string(),
        }
    }
}

/// `${VAR}` left in place when the variable was not set.
fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("${") && value.ends_with('}')
}

fn resolved(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !is_placeholder(v))
        .map(str::to_string)
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NotifyError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| NotifyError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SMTP_PASS})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            NotifyError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: e.to_string(),
            }
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn lookup(&self) -> DestinationLookup {
        match &self.destinations {
            Some(names) => DestinationLookup::new(names.clone()),
            None => DestinationLookup::japan_post_default(),
        }
    }

    pub fn layout(&self) -> TableLayout {
        TableLayout {
            destination_column: self.table.destination_column,
            status_column: self.table.status_column,
        }
    }

    pub fn matchers(&self) -> Vec<TableMatcher> {
        match &self.table.matchers {
            Some(matchers) => matchers.clone(),
            None => TableMatcher::default_rules(&self.lookup(), self.layout()),
        }
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            file_name: self.cache.file.clone(),
            expiry_seconds: self.cache.expiry_hours as i64 * SECONDS_PER_HOUR,
        }
    }

    pub fn smtp_settings(&self) -> SmtpSettings {
        SmtpSettings {
            host: resolved(&self.mail.host),
            port: self.mail.port.unwrap_or(DEFAULT_SMTP_PORT),
            username: resolved(&self.mail.username),
            password: resolved(&self.mail.password),
            from: resolved(&self.mail.from),
        }
    }

    pub fn table_provider(&self) -> Result<TableProvider<LocalStorage, HttpTableFetcher>> {
        if self.source.mode == SourceMode::Snapshot {
            return Ok(TableProvider::snapshot());
        }

        let fetcher = HttpTableFetcher::new(
            self.source.url.clone(),
            Duration::from_secs(self.source.timeout_seconds),
            self.source.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT),
            self.matchers(),
        )?;

        if self.cache.enabled {
            Ok(TableProvider::live(
                fetcher,
                LocalStorage::new(&self.cache.dir),
                self.cache_settings(),
            ))
        } else {
            Ok(TableProvider::live_uncached(fetcher))
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        if self.source.mode == SourceMode::Live {
            validation::validate_url("source.url", &self.source.url)?;
            validation::validate_positive_number("source.timeout_seconds", self.source.timeout_seconds, 1)?;
        }

        if self.cache.enabled {
            validation::validate_path("cache.dir", &self.cache.dir)?;
            validation::validate_path("cache.file", &self.cache.file)?;
            validation::validate_positive_number("cache.expiry_hours", self.cache.expiry_hours, 1)?;
        }

        validation::validate_path("recipients.path", &self.recipients.path)?;
        validation::validate_distinct_columns(self.table.destination_column, self.table.status_column)?;

        if let Some(port) = self.mail.port {
            validation::validate_positive_number("mail.port", u64::from(port), 1)?;
        }

        if let Some(names) = &self.destinations {
            if names.is_empty() {
                return Err(NotifyError::ConfigValidationError {
                    field: "destinations".to_string(),
                    message: "the watch-list cannot be empty".to_string(),
                });
            }
            for display in names.values() {
                validation::validate_non_empty_string("destinations", display)?;
            }
        }

        if let Some(matchers) = &self.table.matchers {
            if matchers.is_empty() {
                return Err(NotifyError::ConfigValidationError {
                    field: "table.matchers".to_string(),
                    message: "at least one matcher is required".to_string(),
                });
            }
        }

        Ok(())
    }
}
