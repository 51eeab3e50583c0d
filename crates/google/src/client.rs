//! Bearer-authenticated JSON client shared by the Slides and Drive gateways.

use deckhand_core::error::{GatewayError, RemoteService, truncate_detail};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

pub(crate) struct ApiClient {
    service: RemoteService,
    base_url: String,
    access_token: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub(crate) fn new(
        service: RemoteService,
        base_url: &str,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            service,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            http,
        }
    }

    pub(crate) fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, GatewayError> {
        let request = self.http.get(self.url(path)).query(query);
        self.send(request).await
    }

    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, GatewayError> {
        let request = self.http.post(self.url(path)).json(body);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = request
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| GatewayError::Network {
                service: self.service,
                reason: if e.is_timeout() {
                    "request timed out".into()
                } else {
                    truncate_detail(&e.to_string())
                },
            })?;

        let status = response.status().as_u16();
        debug!(service = %self.service, status, url = %response.url(), "Google API response");

        if status == 401 {
            return Err(GatewayError::Unauthorized {
                service: self.service,
                status,
            });
        }
        if !response.status().is_success() {
            let detail = truncate_detail(&response.text().await.unwrap_or_default());
            warn!(service = %self.service, status, detail = %detail, "Google API error");
            return Err(GatewayError::Api {
                service: self.service,
                status,
                detail,
            });
        }

        response.json::<T>().await.map_err(|e| GatewayError::Decode {
            service: self.service,
            reason: truncate_detail(&e.to_string()),
        })
    }
}
