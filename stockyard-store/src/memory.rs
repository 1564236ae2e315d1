use async_trait::async_trait;
use std::collections::HashMap;
use stockyard_core::{DistanceService, RequestStore, StoreError};
use stockyard_shared::{ItemRequest, OfferDistance, OfferId, OfferStatus, RequestId};
use tokio::sync::RwLock;
use tracing::info;

#[derive(Default)]
struct Failures {
    reads: Option<StoreError>,
    writes: Option<StoreError>,
    distances: Option<StoreError>,
}

#[derive(Default)]
struct Counters {
    writes: usize,
    distance_reads: usize,
}

/// Request Store kept in process memory, for local runs and tests.
///
/// Behaves like the remote store where it matters: only pending offers can
/// change status, and anything else is refused with the store's wording.
pub struct InMemoryRequestStore {
    requests: RwLock<Vec<ItemRequest>>,
    distances: HashMap<OfferId, Option<f64>>,
    failures: RwLock<Failures>,
    counters: RwLock<Counters>,
}

impl InMemoryRequestStore {
    pub fn new(requests: Vec<ItemRequest>) -> Self {
        Self {
            requests: RwLock::new(requests),
            distances: HashMap::new(),
            failures: RwLock::new(Failures::default()),
            counters: RwLock::new(Counters::default()),
        }
    }

    /// Distance reported for `offer_id`; `None` is reported as an empty reading.
    pub fn with_distance(mut self, offer_id: &OfferId, meters: Option<f64>) -> Self {
        self.distances.insert(offer_id.clone(), meters);
        self
    }

    pub async fn fail_reads(&self, error: StoreError) {
        self.failures.write().await.reads = Some(error);
    }

    pub async fn fail_writes(&self, error: StoreError) {
        self.failures.write().await.writes = Some(error);
    }

    pub async fn fail_distances(&self, error: StoreError) {
        self.failures.write().await.distances = Some(error);
    }

    pub async fn clear_failures(&self) {
        *self.failures.write().await = Failures::default();
    }

    pub async fn status_of(&self, offer_id: &OfferId) -> Option<OfferStatus> {
        self.requests
            .read()
            .await
            .iter()
            .find_map(|r| r.offer(offer_id))
            .map(|o| o.status)
    }

    /// Status updates that reached the store, successful or not.
    pub async fn write_calls(&self) -> usize {
        self.counters.read().await.writes
    }

    pub async fn distance_calls(&self) -> usize {
        self.counters.read().await.distance_reads
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn list_requests(&self, _token: Option<&str>) -> Result<Vec<ItemRequest>, StoreError> {
        if let Some(e) = self.failures.read().await.reads.clone() {
            return Err(e);
        }
        Ok(self.requests.read().await.clone())
    }

    async fn update_offer_status(
        &self,
        _token: Option<&str>,
        offer_id: &OfferId,
        status: OfferStatus,
    ) -> Result<(), StoreError> {
        self.counters.write().await.writes += 1;
        if let Some(e) = self.failures.read().await.writes.clone() {
            return Err(e);
        }

        let mut requests = self.requests.write().await;
        let offer = requests
            .iter_mut()
            .find_map(|r| r.offer_mut(offer_id))
            .ok_or_else(|| StoreError::rejected(404, "Offer not found"))?;

        if offer.status.is_terminal() {
            return Err(StoreError::rejected(409, "Offer already decided"));
        }
        if status == OfferStatus::Pending {
            return Err(StoreError::rejected(400, "Invalid status"));
        }

        offer.status = status;
        info!("Offer {} set to {}", offer_id, status);
        Ok(())
    }
}

#[async_trait]
impl DistanceService for InMemoryRequestStore {
    async fn offer_distances(
        &self,
        _token: Option<&str>,
        request_id: &RequestId,
    ) -> Result<Vec<OfferDistance>, StoreError> {
        self.counters.write().await.distance_reads += 1;
        if let Some(e) = self.failures.read().await.distances.clone() {
            return Err(e);
        }

        let requests = self.requests.read().await;
        let request = requests
            .iter()
            .find(|r| &r.id == request_id)
            .ok_or_else(|| StoreError::rejected(404, "Request not found"))?;

        Ok(request
            .offers
            .iter()
            .filter_map(|offer| {
                self.distances.get(&offer.id).map(|meters| OfferDistance {
                    offer_id: offer.id.clone(),
                    distance: *meters,
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockyard_shared::Offer;

    fn store() -> InMemoryRequestStore {
        let mut request = ItemRequest::new("r1", "Tape", 10, "wh-1");
        request.add_offer(Offer::new("o1", "Acme", 10));
        InMemoryRequestStore::new(vec![request])
    }

    #[tokio::test]
    async fn second_decision_is_refused() {
        let store = store();
        let offer_id = OfferId::from("o1");

        store.update_offer_status(None, &offer_id, OfferStatus::Rejected).await.unwrap();
        let again = store.update_offer_status(None, &offer_id, OfferStatus::Accepted).await;

        assert_eq!(again, Err(StoreError::rejected(409, "Offer already decided")));
        assert_eq!(store.status_of(&offer_id).await, Some(OfferStatus::Rejected));
        assert_eq!(store.write_calls().await, 2);
    }

    #[tokio::test]
    async fn unknown_request_has_no_distances() {
        let store = store();
        let result = store.offer_distances(None, &RequestId::from("r9")).await;
        assert!(matches!(result, Err(StoreError::Rejected { status: 404, .. })));
    }
}
