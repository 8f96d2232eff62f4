pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{http::HttpTableFetcher, mail::SmtpNotifier, storage::LocalStorage};
pub use config::AppConfig;
pub use core::{engine::ReportEngine, provider::TableProvider};
pub use utils::error::{NotifyError, Result};
