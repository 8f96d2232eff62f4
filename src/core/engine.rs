use crate::adapters::recipients::load_recipients;
use crate::core::parser::parse_status_text;
use crate::core::provider::TableProvider;
use crate::core::report::{self, REPORT_SUBJECT};
use crate::domain::model::{Delivery, DestinationLookup, TableLayout};
use crate::domain::ports::{Notifier, Storage, TableFetcher};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No table could be obtained; nothing was sent.
    NoData,
    Delivered(Delivery),
    DeliveryFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub destinations: usize,
    pub report: Option<String>,
    pub outcome: RunOutcome,
}

pub struct ReportEngine<S: Storage, F: TableFetcher, N: Notifier> {
    provider: TableProvider<S, F>,
    notifier: N,
    lookup: DestinationLookup,
    layout: TableLayout,
    recipients_path: PathBuf,
}

impl<S: Storage, F: TableFetcher, N: Notifier> ReportEngine<S, F, N> {
    pub fn new(
        provider: TableProvider<S, F>,
        notifier: N,
        lookup: DestinationLookup,
        layout: TableLayout,
        recipients_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            notifier,
            lookup,
            layout,
            recipients_path: recipients_path.into(),
        }
    }

    /// Fetch, parse, render and send. Failures are logged, never returned.
    pub async fn run(&self) -> RunSummary {
        tracing::info!("Starting EMS status report");

        let recipients = load_recipients(&self.recipients_path).unwrap_or_else(|e| {
            tracing::warn!(
                "Could not read recipients from {}: {}",
                self.recipients_path.display(),
                e
            );
            Vec::new()
        });
        tracing::info!("Loaded {} recipients", recipients.len());

        let Some(table) = self.provider.get_latest_table().await else {
            tracing::error!("No status data available (fetch failed and no cache)");
            return RunSummary {
                destinations: 0,
                report: None,
                outcome: RunOutcome::NoData,
            };
        };

        let status = parse_status_text(&table, &self.lookup, self.layout);
        tracing::info!("Parsed status for {} watched destinations", status.len());
        for (category, names) in report::group(&status) {
            tracing::debug!("{:?}: {}", category, names.join(", "));
        }

        let body = report::render(&status);
        println!("--- 生成的报告 ---");
        println!("{}", body);
        println!("--------------------");

        let outcome = match self.notifier.send(&recipients, REPORT_SUBJECT, &body).await {
            Ok(delivery) => RunOutcome::Delivered(delivery),
            Err(e) => {
                tracing::error!(
                    "Email delivery failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                tracing::error!("Suggestion: {}", e.recovery_suggestion());
                RunOutcome::DeliveryFailed(e.to_string())
            }
        };

        RunSummary {
            destinations: status.len(),
            report: Some(body),
            outcome,
        }
    }
}
