use serde::{Deserialize, Serialize};

use super::request::OfferId;

/// One row of the distance service's response, in meters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfferDistance {
    pub offer_id: OfferId,
    #[serde(default)]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DistancesResponse {
    #[serde(default)]
    pub distances: Vec<OfferDistance>,
}

/// Per-offer distance annotation.
///
/// `NotFetched` renders as loading, `Fetched(None)` as unavailable.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum DistanceState {
    #[default]
    NotFetched,
    Fetched(Option<f64>),
}
