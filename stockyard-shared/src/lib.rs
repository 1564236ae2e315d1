pub mod models;
pub mod pii;

pub use models::distance::{DistanceState, DistancesResponse, OfferDistance};
pub use models::identity::{ActingUser, EmployeeProfile, Role, Session};
pub use models::request::{ItemRequest, NamedRef, Offer, OfferId, OfferStatus, RequestId};
pub use pii::Masked;
