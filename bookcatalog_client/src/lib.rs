pub mod api;
pub mod blocking;
pub mod client;
pub mod client_config;
pub mod error;
pub mod telemetry;

pub use api::{Book, BookId};
pub use client::BookCatalogClient;
pub use client_config::ClientConfig;
pub use error::BookCatalogError;
