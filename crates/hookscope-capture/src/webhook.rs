//! Legacy per-event webhook.

use hookscope_common_http::{HttpClient, HttpConfig, HttpError};
use hookscope_event_types::Event;

use crate::background::BackgroundTasks;

/// Posts each event, as written to the log, to a configured URL.
#[derive(Debug, Clone)]
pub struct Webhook {
    url: String,
    client: HttpClient,
}

impl Webhook {
    /// Webhook with the short best-effort timeout.
    pub fn new(url: impl Into<String>) -> Result<Self, HttpError> {
        Ok(Self {
            url: url.into(),
            client: HttpClient::with_config(HttpConfig::webhook())?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn post(&self, event: &Event) -> Result<(), HttpError> {
        self.client.post_json(&self.url, event).await?;
        Ok(())
    }

    /// POST `event` in the background; failures are logged and dropped.
    pub fn fire(&self, tasks: &BackgroundTasks, event: &Event) {
        let webhook = self.clone();
        let event = event.clone();
        tasks.spawn("webhook", async move { webhook.post(&event).await });
    }
}
