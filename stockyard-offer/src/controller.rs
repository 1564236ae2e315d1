use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stockyard_core::{DistanceService, Navigator, RequestStore, TRANSIT_ROUTE};
use stockyard_shared::{DistanceState, ItemRequest, OfferId, OfferStatus, RequestId, Session};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::eligibility::{can_decide, Ineligible};

/// Shown when the store refused a decision without saying why, or could not be reached.
pub const DECISION_FAILED: &str = "Failed to update offer";
/// Shown when the request list could not be fetched.
pub const LOAD_FAILED: &str = "Failed to fetch item requests";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    pub fn target_status(self) -> OfferStatus {
        match self {
            Decision::Accept => OfferStatus::Accepted,
            Decision::Reject => OfferStatus::Rejected,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accept => f.write_str("accept"),
            Decision::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(Decision::Accept),
            "reject" => Ok(Decision::Reject),
            other => Err(format!("unknown decision: {other}")),
        }
    }
}

/// Where the page view stands.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded(ItemRequest),
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Found(ItemRequest),
    /// A normal terminal state, not an error.
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Accepted; the page has been sent to this route.
    Navigated(String),
    /// Rejected; the local copy of the offer now reads REJECTED.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    #[error("No request is loaded")]
    NotLoaded,

    #[error("Offer not found: {0}")]
    OfferNotFound(OfferId),

    #[error(transparent)]
    Ineligible(#[from] Ineligible),

    #[error("A decision on this offer is already in progress")]
    InProgress,

    #[error("{message}")]
    Store { message: String },

    #[error("The view changed before the decision completed")]
    Stale,
}

/// Copy of the view state, for rendering.
#[derive(Debug, Clone)]
pub struct ViewSnapshot {
    pub request_id: Option<RequestId>,
    pub phase: Phase,
    pub distances: HashMap<OfferId, DistanceState>,
    pub in_flight: HashSet<(OfferId, Decision)>,
    pub notice: Option<String>,
}

impl ViewSnapshot {
    pub fn distance(&self, offer_id: &OfferId) -> DistanceState {
        self.distances.get(offer_id).copied().unwrap_or_default()
    }

    pub fn is_in_progress(&self, offer_id: &OfferId, decision: Decision) -> bool {
        self.in_flight.contains(&(offer_id.clone(), decision))
    }
}

struct ViewState {
    /// Bumped on every load and on leave; results carrying an older value are dropped.
    generation: u64,
    request_id: Option<RequestId>,
    phase: Phase,
    distances: HashMap<OfferId, DistanceState>,
    in_flight: HashSet<(OfferId, Decision)>,
    notice: Option<String>,
}

impl ViewState {
    fn reset(&mut self, request_id: Option<RequestId>, phase: Phase) -> u64 {
        self.generation += 1;
        self.request_id = request_id;
        self.phase = phase;
        self.distances.clear();
        self.in_flight.clear();
        self.notice = None;
        self.generation
    }
}

struct Shared {
    session: Session,
    store: Arc<dyn RequestStore>,
    distance_service: Arc<dyn DistanceService>,
    navigator: Arc<dyn Navigator>,
    transit_route: String,
    state: RwLock<ViewState>,
    distance_task: Mutex<Option<JoinHandle<()>>>,
}

/// Holds one request view and resolves vendor offers against it.
///
/// Cheap to clone; clones share the same view.
#[derive(Clone)]
pub struct OfferController {
    inner: Arc<Shared>,
}

impl OfferController {
    pub fn new(
        session: Session,
        store: Arc<dyn RequestStore>,
        distance_service: Arc<dyn DistanceService>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self::with_transit_route(session, store, distance_service, navigator, TRANSIT_ROUTE)
    }

    pub fn with_transit_route(
        session: Session,
        store: Arc<dyn RequestStore>,
        distance_service: Arc<dyn DistanceService>,
        navigator: Arc<dyn Navigator>,
        transit_route: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                session,
                store,
                distance_service,
                navigator,
                transit_route: transit_route.into(),
                state: RwLock::new(ViewState {
                    generation: 0,
                    request_id: None,
                    phase: Phase::Idle,
                    distances: HashMap::new(),
                    in_flight: HashSet::new(),
                    notice: None,
                }),
                distance_task: Mutex::new(None),
            }),
        }
    }

    /// Fetch every request from the store and keep the one matching `request_id`.
    ///
    /// Employees additionally get a background distance fetch for the offers;
    /// it starts after the request list has resolved and never delays this call.
    pub async fn load(&self, request_id: RequestId) -> LoadOutcome {
        let generation = self
            .inner
            .state
            .write()
            .await
            .reset(Some(request_id.clone()), Phase::Loading);
        self.abort_distance_task().await;

        info!(request_id = %request_id, "Loading item request");

        let outcome = match self.inner.store.list_requests(self.inner.session.token()).await {
            Ok(requests) => match requests.into_iter().find(|r| r.id == request_id) {
                Some(request) => LoadOutcome::Found(request),
                None => LoadOutcome::NotFound,
            },
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Failed to load item requests");
                LoadOutcome::Failed(e.user_message(LOAD_FAILED))
            }
        };

        {
            let mut state = self.inner.state.write().await;
            if state.generation != generation {
                debug!(request_id = %request_id, "Discarding load result for a view that moved on");
                return outcome;
            }
            state.phase = match &outcome {
                LoadOutcome::Found(request) => Phase::Loaded(request.clone()),
                LoadOutcome::NotFound => Phase::NotFound,
                LoadOutcome::Failed(message) => Phase::Failed(message.clone()),
            };
        }

        if let LoadOutcome::Found(request) = &outcome {
            if self.inner.session.is_employee() {
                self.spawn_distance_fetch(generation, request).await;
            }
        }

        outcome
    }

    async fn spawn_distance_fetch(&self, generation: u64, request: &ItemRequest) {
        let controller = self.clone();
        let request_id = request.id.clone();
        let offer_ids: Vec<OfferId> = request.offers.iter().map(|o| o.id.clone()).collect();

        let handle = tokio::spawn(async move {
            controller.fetch_distances(generation, request_id, offer_ids).await;
        });
        // Lock the slot before checking the generation so a concurrent reset
        // either sees this handle and aborts it, or makes it stale here.
        let mut slot = self.inner.distance_task.lock().await;
        if self.inner.state.read().await.generation == generation {
            *slot = Some(handle);
        } else {
            handle.abort();
        }
    }

    async fn fetch_distances(&self, generation: u64, request_id: RequestId, offer_ids: Vec<OfferId>) {
        let fetched = self
            .inner
            .distance_service
            .offer_distances(self.inner.session.token(), &request_id)
            .await;

        let mut state = self.inner.state.write().await;
        if state.generation != generation {
            debug!(request_id = %request_id, "Discarding distances for a view that moved on");
            return;
        }

        match fetched {
            Ok(rows) => {
                let by_offer: HashMap<OfferId, Option<f64>> =
                    rows.into_iter().map(|row| (row.offer_id, row.distance)).collect();
                for offer_id in offer_ids {
                    let meters = by_offer.get(&offer_id).copied().flatten();
                    state.distances.insert(offer_id, DistanceState::Fetched(meters));
                }
            }
            Err(e) => {
                // Degrade to "unavailable"; the page itself stays up.
                warn!(request_id = %request_id, error = %e, "Failed to fetch offer distances");
                for offer_id in offer_ids {
                    state.distances.insert(offer_id, DistanceState::Fetched(None));
                }
            }
        }
    }

    /// Wait for the outstanding distance fetch, if any.
    pub async fn distances_settled(&self) {
        let handle = self.inner.distance_task.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "Distance fetch task failed");
                }
            }
        }
    }

    async fn abort_distance_task(&self) {
        if let Some(handle) = self.inner.distance_task.lock().await.take() {
            handle.abort();
        }
    }

    /// Accept or reject a pending offer of the loaded request.
    ///
    /// Only one call per `(offer_id, decision)` may be outstanding; a second one
    /// returns [`DecisionError::InProgress`] without touching the store.
    pub async fn decide(&self, offer_id: &OfferId, decision: Decision) -> Result<DecisionOutcome, DecisionError> {
        let key = (offer_id.clone(), decision);

        let generation = {
            let mut state = self.inner.state.write().await;
            let request = match &state.phase {
                Phase::Loaded(request) => request,
                _ => return Err(DecisionError::NotLoaded),
            };
            let offer = request
                .offer(offer_id)
                .ok_or_else(|| DecisionError::OfferNotFound(offer_id.clone()))?;
            can_decide(&self.inner.session, request, offer)?;

            if !state.in_flight.insert(key.clone()) {
                return Err(DecisionError::InProgress);
            }
            state.notice = None;
            state.generation
        };

        let target = decision.target_status();
        info!(offer_id = %offer_id, status = %target, "Submitting offer decision");

        let result = self
            .inner
            .store
            .update_offer_status(self.inner.session.token(), offer_id, target)
            .await;

        let mut state = self.inner.state.write().await;
        let current = state.generation == generation;
        if current {
            state.in_flight.remove(&key);
        }

        if let Err(e) = result {
            let message = e.user_message(DECISION_FAILED);
            warn!(offer_id = %offer_id, status = %target, error = %e, "Offer decision failed");
            if current {
                state.notice = Some(message.clone());
            }
            return Err(DecisionError::Store { message });
        }

        if !current {
            debug!(offer_id = %offer_id, "Decision landed after the view moved on");
            return Err(DecisionError::Stale);
        }

        match decision {
            Decision::Accept => {
                drop(state);
                let route = self.inner.transit_route.clone();
                info!(offer_id = %offer_id, route = %route, "Offer accepted, moving to transit");
                self.inner.navigator.navigate(&route);
                Ok(DecisionOutcome::Navigated(route))
            }
            Decision::Reject => {
                if let Phase::Loaded(request) = &mut state.phase {
                    if let Some(offer) = request.offer_mut(offer_id) {
                        offer.status = OfferStatus::Rejected;
                    }
                }
                info!(offer_id = %offer_id, "Offer rejected");
                Ok(DecisionOutcome::Rejected)
            }
        }
    }

    pub async fn is_in_progress(&self, offer_id: &OfferId, decision: Decision) -> bool {
        self.inner.state.read().await.in_flight.contains(&(offer_id.clone(), decision))
    }

    pub async fn distance_for(&self, offer_id: &OfferId) -> DistanceState {
        self.inner.state.read().await.distances.get(offer_id).copied().unwrap_or_default()
    }

    /// Message from the last failed decision, if it has not been dismissed.
    pub async fn notice(&self) -> Option<String> {
        self.inner.state.read().await.notice.clone()
    }

    pub async fn dismiss_notice(&self) {
        self.inner.state.write().await.notice = None;
    }

    pub async fn snapshot(&self) -> ViewSnapshot {
        let state = self.inner.state.read().await;
        ViewSnapshot {
            request_id: state.request_id.clone(),
            phase: state.phase.clone(),
            distances: state.distances.clone(),
            in_flight: state.in_flight.clone(),
            notice: state.notice.clone(),
        }
    }

    /// Navigate away: anything still in flight resolves into the void.
    pub async fn leave(&self) {
        self.inner.state.write().await.reset(None, Phase::Idle);
        self.abort_distance_task().await;
    }
}
