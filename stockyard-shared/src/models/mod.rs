pub mod distance;
pub mod identity;
pub mod request;
