use async_trait::async_trait;
use stockyard_shared::{ItemRequest, OfferDistance, OfferId, OfferStatus, RequestId};

use crate::error::StoreError;

/// Contract of the remote service that owns item requests and their offers.
///
/// `token` is the caller's bearer token; `None` is still sent, as an empty
/// credential, and the store treats it as unauthenticated.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Every item request visible to the caller. There is no lookup by id.
    async fn list_requests(&self, token: Option<&str>) -> Result<Vec<ItemRequest>, StoreError>;

    /// Move an offer to `status`. The store decides whether the transition is legal.
    async fn update_offer_status(
        &self,
        token: Option<&str>,
        offer_id: &OfferId,
        status: OfferStatus,
    ) -> Result<(), StoreError>;
}

/// Precomputed vendor-to-warehouse distances.
#[async_trait]
pub trait DistanceService: Send + Sync {
    async fn offer_distances(
        &self,
        token: Option<&str>,
        request_id: &RequestId,
    ) -> Result<Vec<OfferDistance>, StoreError>;
}
