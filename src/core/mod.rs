pub mod engine;
pub mod parser;
pub mod provider;
pub mod report;
pub mod table_select;

pub use crate::domain::model::{DestinationLookup, StatusReport, StatusTable, TableLayout};
pub use crate::domain::ports::{Notifier, Storage, TableFetcher};
pub use crate::utils::error::Result;
