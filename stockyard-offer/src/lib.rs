pub mod controller;
pub mod eligibility;
pub mod proximity;
pub mod view;

pub use controller::{Decision, DecisionError, DecisionOutcome, LoadOutcome, OfferController, Phase, ViewSnapshot};
pub use eligibility::{can_decide, can_manage, Ineligible};
pub use proximity::{classify, Proximity, ProximityCategory};
pub use view::{DistanceView, OfferView, PhaseView, RequestView};
