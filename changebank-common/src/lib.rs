#![doc = "Storage and HTTP client abstractions shared by the changebank crates."]
pub mod http_client;
pub mod store;
pub mod types;

pub use http_client::HttpClient;
