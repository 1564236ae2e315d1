pub mod app_config;
pub mod http;
pub mod memory;

pub use http::HttpRequestStore;
pub use memory::InMemoryRequestStore;
