//! Google Drive v3 implementation of [`SharingGateway`].

use async_trait::async_trait;
use deckhand_config::AppConfig;
use deckhand_core::error::{GatewayError, RemoteService};
use deckhand_core::gateway::SharingGateway;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::client::ApiClient;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub struct GoogleDriveGateway {
    client: ApiClient,
}

impl GoogleDriveGateway {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            client: ApiClient::new(
                RemoteService::Drive,
                DEFAULT_BASE_URL,
                access_token,
                Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            ),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        let token = config.google.access_token.clone().ok_or_else(|| {
            GatewayError::NotConfigured("GOOGLE_ACCESS_TOKEN environment variable is required".into())
        })?;
        Ok(Self {
            client: ApiClient::new(
                RemoteService::Drive,
                &config.google.drive_base_url,
                token,
                Duration::from_secs(config.google.timeout_secs),
            ),
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.client = self.client.with_base_url(base_url);
        self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileLink {
    #[serde(default)]
    web_view_link: Option<String>,
}

#[async_trait]
impl SharingGateway for GoogleDriveGateway {
    async fn grant_public_read(&self, document_id: &str) -> Result<(), GatewayError> {
        let _: serde_json::Value = self
            .client
            .post(
                &format!("drive/v3/files/{document_id}/permissions"),
                &json!({ "type": "anyone", "role": "reader" }),
            )
            .await?;
        info!(document_id, "Granted public read access");
        Ok(())
    }

    async fn get_link(&self, document_id: &str) -> Result<String, GatewayError> {
        let file: FileLink = self
            .client
            .get(
                &format!("drive/v3/files/{document_id}"),
                &[("fields", "webViewLink")],
            )
            .await?;
        file.web_view_link
            .filter(|link| !link.is_empty())
            .ok_or_else(|| GatewayError::Decode {
                service: RemoteService::Drive,
                reason: format!("{} returned no webViewLink", self.client.base_url()),
            })
    }
}
