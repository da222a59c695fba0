//! Error tracking: events are posted as JSON to `NEBE_REPORT_URL`. Without
//! that variable they are only logged.

use async_trait::async_trait;
use nebe_core::contract::{BoxError, ErrorReporter};
use nebe_core::report::ReportEvent;
use std::time::Duration;

pub const REPORT_URL_ENV: &str = "NEBE_REPORT_URL";

pub struct HttpReporter {
    http: reqwest::Client,
    url: Option<String>,
}

impl HttpReporter {
    pub fn new(url: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.filter(|u| !u.trim().is_empty()),
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var(REPORT_URL_ENV).ok())
    }

    pub fn is_remote(&self) -> bool {
        self.url.is_some()
    }
}

#[async_trait]
impl ErrorReporter for HttpReporter {
    async fn capture(&self, event: ReportEvent) -> Result<(), BoxError> {
        let Some(url) = &self.url else {
            tracing::info!(
                event_id = %event.event_id,
                level = ?event.level,
                message = %event.message,
                "Report event (no {} configured)",
                REPORT_URL_ENV
            );
            return Ok(());
        };

        self.http
            .post(url)
            .timeout(Duration::from_secs(5))
            .json(&event)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(event_id = %event.event_id, "Report event sent");
        Ok(())
    }
}
