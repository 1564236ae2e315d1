use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, Response, Url};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;
use stockyard_core::{CoreError, CoreResult, DistanceService, RequestStore, StoreError};
use stockyard_shared::{DistancesResponse, ItemRequest, OfferDistance, OfferId, OfferStatus, RequestId};
use tracing::{debug, warn};

use crate::app_config::StoreConfig;

/// Error payload the store sends alongside non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: OfferStatus,
}

/// Request Store and Distance Service over the warehouse HTTP API.
#[derive(Clone)]
pub struct HttpRequestStore {
    client: Client,
    base_url: Url,
}

impl HttpRequestStore {
    pub fn new(base_url: &str, timeout: Duration) -> CoreResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| CoreError::ValidationError(format!("invalid store url {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(CoreError::ValidationError(format!("store url must be http(s): {base_url}")));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::InternalError(format!("http client: {e}")))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &StoreConfig) -> CoreResult<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::Transport(format!("cannot extend {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: reqwest::RequestBuilder, token: Option<&str>) -> Result<Response, StoreError> {
        let response = request
            .header(AUTHORIZATION, bearer(token))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(rejection(response).await)
        }
    }
}

/// `Bearer <token>`, or an empty value when there is no token.
pub(crate) fn bearer(token: Option<&str>) -> String {
    token.map(|t| format!("Bearer {t}")).unwrap_or_default()
}

async fn rejection(response: Response) -> StoreError {
    let status = response.status();
    let message = response.json::<ErrorBody>().await.ok().and_then(|body| body.error);
    warn!(status = %status, message = message.as_deref().unwrap_or("-"), "Store returned an error");
    StoreError::Rejected { status: status.as_u16(), message }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    response.json::<T>().await.map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl RequestStore for HttpRequestStore {
    async fn list_requests(&self, token: Option<&str>) -> Result<Vec<ItemRequest>, StoreError> {
        let url = self.endpoint(&["api", "warehouse", "item-requests"])?;
        debug!(url = %url, "Fetching item requests");
        let response = self.send(self.client.get(url), token).await?;
        decode(response).await
    }

    async fn update_offer_status(
        &self,
        token: Option<&str>,
        offer_id: &OfferId,
        status: OfferStatus,
    ) -> Result<(), StoreError> {
        let url = self.endpoint(&["api", "warehouse", "offers", &offer_id.0, "status"])?;
        debug!(url = %url, status = %status, "Updating offer status");
        self.send(self.client.patch(url).json(&StatusUpdate { status }), token).await?;
        Ok(())
    }
}

#[async_trait]
impl DistanceService for HttpRequestStore {
    async fn offer_distances(
        &self,
        token: Option<&str>,
        request_id: &RequestId,
    ) -> Result<Vec<OfferDistance>, StoreError> {
        let url = self.endpoint(&["api", "warehouse", "offer-distances", &request_id.0])?;
        debug!(url = %url, "Fetching offer distances");
        let response = self.send(self.client.get(url), token).await?;
        let body: DistancesResponse = decode(response).await?;
        Ok(body.distances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_is_empty_without_token() {
        assert_eq!(bearer(Some("abc")), "Bearer abc");
        assert_eq!(bearer(None), "");
    }

    #[test]
    fn endpoints_are_joined_and_escaped() {
        let store = HttpRequestStore::new("http://localhost:4000/", Duration::from_secs(1)).unwrap();
        let url = store.endpoint(&["api", "warehouse", "offers", "a/b", "status"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/api/warehouse/offers/a%2Fb/status");
    }

    #[test]
    fn rejects_non_http_urls() {
        assert!(HttpRequestStore::new("ftp://store", Duration::from_secs(1)).is_err());
        assert!(HttpRequestStore::new("not a url", Duration::from_secs(1)).is_err());
    }
}
