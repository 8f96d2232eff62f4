use crate::core::table_select::{select_from_html, TableMatcher, TableSelection};
use crate::domain::ports::TableFetcher;
use crate::utils::error::{NotifyError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("ems-notify/", env!("CARGO_PKG_VERSION"));

pub struct HttpTableFetcher {
    client: Client,
    url: String,
    matchers: Vec<TableMatcher>,
}

impl HttpTableFetcher {
    pub fn new(
        url: String,
        timeout: Duration,
        user_agent: &str,
        matchers: Vec<TableMatcher>,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            url,
            matchers,
        })
    }
}

#[async_trait]
impl TableFetcher for HttpTableFetcher {
    async fn fetch_table(&self) -> Result<String> {
        tracing::debug!("Requesting status page: {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        tracing::debug!("Status page response: {}", response.status());
        if !response.status().is_success() {
            return Err(NotifyError::HttpStatusError {
                status: response.status().as_u16(),
                url: self.url.clone(),
            });
        }

        let html = response.text().await?;
        match select_from_html(&html, &self.matchers) {
            TableSelection::Matched {
                rule,
                table_index,
                table,
            } => {
                tracing::info!(
                    "Selected table #{} ({} rows) using rule #{}",
                    table_index,
                    table.rows.len(),
                    rule
                );
                Ok(table.to_pipe_text())
            }
            TableSelection::NoMatch => Err(NotifyError::TableNotFound {
                url: self.url.clone(),
            }),
        }
    }
}
