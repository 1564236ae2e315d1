use chrono::{DateTime, Utc};
use serde::Serialize;
use stockyard_shared::{DistanceState, ItemRequest, Offer, OfferId, OfferStatus, RequestId, Session};

use crate::controller::{Decision, Phase, ViewSnapshot};
use crate::eligibility::{can_decide, can_manage};
use crate::proximity::{classify, ProximityCategory, LOADING_LABEL, UNAVAILABLE_LABEL};

/// What the request page renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    pub request_id: Option<RequestId>,
    pub phase: PhaseView,
    /// Toast from the last failed decision.
    pub notice: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PhaseView {
    Idle,
    Loading,
    NotFound,
    Failed {
        message: String,
    },
    Loaded {
        request: RequestSummary,
        offers: Vec<OfferView>,
        #[serde(rename = "noOffers")]
        no_offers: bool,
        #[serde(rename = "canManage")]
        can_manage: bool,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub id: RequestId,
    pub item_name: String,
    pub quantity: u32,
    pub warehouse_id: String,
    pub warehouse_name: Option<String>,
    pub requested_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferView {
    pub id: OfferId,
    pub vendor_name: String,
    pub quantity: u32,
    pub status: OfferStatus,
    /// Employees only.
    pub distance: Option<DistanceView>,
    /// Present only when the viewer may decide on this offer.
    pub actions: Option<OfferActions>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DistanceView {
    Loading {
        label: &'static str,
    },
    Unavailable {
        label: &'static str,
    },
    Known {
        km: u64,
        category: ProximityCategory,
        label: &'static str,
        display: String,
    },
}

impl From<DistanceState> for DistanceView {
    fn from(state: DistanceState) -> Self {
        match state {
            DistanceState::NotFetched => DistanceView::Loading { label: LOADING_LABEL },
            DistanceState::Fetched(None) => DistanceView::Unavailable { label: UNAVAILABLE_LABEL },
            DistanceState::Fetched(Some(meters)) => {
                let proximity = classify(meters);
                DistanceView::Known {
                    km: proximity.km,
                    category: proximity.category,
                    label: proximity.label(),
                    display: proximity.display(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferActions {
    pub accept_in_progress: bool,
    pub reject_in_progress: bool,
    pub accept_label: &'static str,
    pub reject_label: &'static str,
}

impl OfferActions {
    fn new(accept_in_progress: bool, reject_in_progress: bool) -> Self {
        Self {
            accept_in_progress,
            reject_in_progress,
            accept_label: if accept_in_progress { "Accepting..." } else { "Accept" },
            reject_label: if reject_in_progress { "Rejecting..." } else { "Reject" },
        }
    }
}

impl RequestView {
    pub fn build(snapshot: &ViewSnapshot, session: &Session) -> Self {
        let phase = match &snapshot.phase {
            Phase::Idle => PhaseView::Idle,
            Phase::Loading => PhaseView::Loading,
            Phase::NotFound => PhaseView::NotFound,
            Phase::Failed(message) => PhaseView::Failed { message: message.clone() },
            Phase::Loaded(request) => loaded(request, snapshot, session),
        };

        Self {
            request_id: snapshot.request_id.clone(),
            phase,
            notice: snapshot.notice.clone(),
        }
    }

    pub fn offer(&self, offer_id: &OfferId) -> Option<&OfferView> {
        match &self.phase {
            PhaseView::Loaded { offers, .. } => offers.iter().find(|o| &o.id == offer_id),
            _ => None,
        }
    }
}

fn loaded(request: &ItemRequest, snapshot: &ViewSnapshot, session: &Session) -> PhaseView {
    let offers: Vec<OfferView> = request
        .offers
        .iter()
        .map(|offer| offer_view(request, offer, snapshot, session))
        .collect();

    PhaseView::Loaded {
        request: RequestSummary {
            id: request.id.clone(),
            item_name: request.item_name.clone(),
            quantity: request.quantity,
            warehouse_id: request.warehouse_id.clone(),
            warehouse_name: request.warehouse.as_ref().map(|w| w.name.clone()),
            requested_by: request.employee.as_ref().map(|e| e.name.clone()),
            created_at: request.created_at,
        },
        no_offers: offers.is_empty(),
        offers,
        can_manage: can_manage(session, request).is_ok(),
    }
}

fn offer_view(request: &ItemRequest, offer: &Offer, snapshot: &ViewSnapshot, session: &Session) -> OfferView {
    let distance = session
        .is_employee()
        .then(|| DistanceView::from(snapshot.distance(&offer.id)));

    let actions = can_decide(session, request, offer).is_ok().then(|| {
        OfferActions::new(
            snapshot.is_in_progress(&offer.id, Decision::Accept),
            snapshot.is_in_progress(&offer.id, Decision::Reject),
        )
    });

    OfferView {
        id: offer.id.clone(),
        vendor_name: offer.vendor_name().to_string(),
        quantity: offer.quantity,
        status: offer.status,
        distance,
        actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use stockyard_shared::ActingUser;

    fn snapshot(phase: Phase) -> ViewSnapshot {
        ViewSnapshot {
            request_id: Some(RequestId::from("r1")),
            phase,
            distances: HashMap::new(),
            in_flight: HashSet::new(),
            notice: None,
        }
    }

    fn request() -> ItemRequest {
        let mut request = ItemRequest::new("r1", "Cable ties", 500, "wh-1");
        request.add_offer(Offer::new("o1", "Acme", 500));
        request.add_offer(Offer::new("o2", "Globex", 250));
        request.add_offer(Offer::new("o3", "Initech", 100));
        let mut rejected = Offer::new("o4", "Hooli", 50);
        rejected.status = OfferStatus::Rejected;
        request.add_offer(rejected);
        request
    }

    #[test]
    fn distance_states_render_distinctly() {
        let mut snap = snapshot(Phase::Loaded(request()));
        snap.distances.insert(OfferId::from("o1"), DistanceState::Fetched(Some(45_000.0)));
        snap.distances.insert(OfferId::from("o2"), DistanceState::Fetched(None));
        let session = Session::new(Some(ActingUser::employee("u1", "wh-1")), None);

        let view = RequestView::build(&snap, &session);

        assert_eq!(
            view.offer(&OfferId::from("o1")).unwrap().distance,
            Some(DistanceView::Known {
                km: 45,
                category: ProximityCategory::Nearby,
                label: "Nearby",
                display: "45km Nearby".to_string(),
            })
        );
        assert_eq!(
            view.offer(&OfferId::from("o2")).unwrap().distance,
            Some(DistanceView::Unavailable { label: "Distance unavailable" })
        );
        assert_eq!(
            view.offer(&OfferId::from("o3")).unwrap().distance,
            Some(DistanceView::Loading { label: "Loading distance..." })
        );
    }

    #[test]
    fn actions_only_for_eligible_offers() {
        let mut snap = snapshot(Phase::Loaded(request()));
        snap.in_flight.insert((OfferId::from("o2"), Decision::Reject));
        let session = Session::new(Some(ActingUser::employee("u1", "wh-1")), None);

        let view = RequestView::build(&snap, &session);

        let o1 = view.offer(&OfferId::from("o1")).unwrap().actions.clone().unwrap();
        assert!(!o1.accept_in_progress && !o1.reject_in_progress);
        assert_eq!(o1.accept_label, "Accept");

        let o2 = view.offer(&OfferId::from("o2")).unwrap().actions.clone().unwrap();
        assert!(o2.reject_in_progress);
        assert_eq!(o2.reject_label, "Rejecting...");
        assert!(!o2.accept_in_progress);

        assert!(view.offer(&OfferId::from("o4")).unwrap().actions.is_none());
    }

    #[test]
    fn vendors_see_neither_distances_nor_actions() {
        let snap = snapshot(Phase::Loaded(request()));
        let session = Session::new(Some(ActingUser::vendor("v1")), None);

        let view = RequestView::build(&snap, &session);
        let o1 = view.offer(&OfferId::from("o1")).unwrap();

        assert!(o1.distance.is_none());
        assert!(o1.actions.is_none());
    }

    #[test]
    fn serializes_phase_tag() {
        let view = RequestView::build(&snapshot(Phase::NotFound), &Session::anonymous());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["phase"]["state"], "not_found");

        let empty = ItemRequest::new("r1", "Labels", 1, "wh-1");
        let view = RequestView::build(&snapshot(Phase::Loaded(empty)), &Session::anonymous());
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["phase"]["state"], "loaded");
        assert_eq!(json["phase"]["noOffers"], true);
        assert_eq!(json["requestId"], "r1");
    }
}
