//! Shared reqwest client and request helpers.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::errors::{decode, map_status_error, map_transport_error};
use crate::domain::ports::ApiError;

/// REST adapter for one API base URL.
///
/// The client applies the configured timeout to every request; timeouts
/// surface as [`ApiError::Timeout`].
#[derive(Debug, Clone)]
pub struct HttpConsoleApi {
    client: Client,
    base_url: Url,
}

impl HttpConsoleApi {
    /// Build an adapter with an explicit request timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Base URL every endpoint is resolved against.
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `segments` below the base URL, percent-encoding each one.
    pub(super) fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::transport(format!("base URL {} cannot hold a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// [`Self::endpoint`] with an `obra` query parameter.
    pub(super) fn site_endpoint(&self, segments: &[&str], id_obra: i64) -> Result<Url, ApiError> {
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut().append_pair("obra", &id_obra.to_string());
        Ok(url)
    }

    pub(super) async fn get_json<T>(&self, url: Url, what: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let body = self.execute(self.client.get(url)).await?;
        decode(&body, what)
    }

    pub(super) async fn send_json<B, T>(
        &self,
        method: Method,
        url: Url,
        payload: &B,
        what: &str,
    ) -> Result<T, ApiError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let body = self
            .execute(self.client.request(method, url).json(payload))
            .await?;
        decode(&body, what)
    }

    pub(super) async fn send_empty(&self, method: Method, url: Url) -> Result<(), ApiError> {
        self.execute(self.client.request(method, url)).await?;
        Ok(())
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, ApiError> {
        let response = request
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(%url, status = status.as_u16(), bytes = body.len(), "api response");
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        Ok(body.to_vec())
    }
}
