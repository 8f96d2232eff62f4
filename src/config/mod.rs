pub mod toml_config;

pub use toml_config::{AppConfig, SourceMode};

#[cfg(feature = "cli")]
use clap::Parser;

/// Command line flags. SMTP settings fall back to the environment, and every
/// flag given here overrides the config file.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "ems-notify")]
#[command(about = "Mail a grouped EMS acceptance report built from the Japan Post status table")]
pub struct CliConfig {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "EMS_CONFIG")]
    pub config: Option<String>,

    /// Where the status table comes from
    #[arg(long, value_enum)]
    pub mode: Option<SourceMode>,

    /// Status page URL (live mode)
    #[arg(long)]
    pub url: Option<String>,

    /// CSV file with one recipient address per row
    #[arg(long)]
    pub recipients: Option<String>,

    /// Always fetch, never read or write the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Print the email instead of sending it
    #[arg(long, env = "DRY_RUN", value_parser = clap::builder::FalseyValueParser::new())]
    pub dry_run: bool,

    #[arg(long, env = "SMTP_HOST")]
    pub smtp_host: Option<String>,

    #[arg(long, env = "SMTP_PORT")]
    pub smtp_port: Option<u16>,

    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    #[arg(long, env = "SMTP_PASS", hide_env_values = true)]
    pub smtp_pass: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.source.mode = mode;
        }
        if let Some(url) = &self.url {
            config.source.url = url.clone();
        }
        if let Some(path) = &self.recipients {
            config.recipients.path = path.clone();
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
        if self.dry_run {
            config.mail.dry_run = true;
        }
        if self.smtp_host.is_some() {
            config.mail.host = self.smtp_host.clone();
        }
        if self.smtp_port.is_some() {
            config.mail.port = self.smtp_port;
        }
        if self.smtp_user.is_some() {
            config.mail.username = self.smtp_user.clone();
        }
        if self.smtp_pass.is_some() {
            config.mail.password = self.smtp_pass.clone();
        }
    }
}
