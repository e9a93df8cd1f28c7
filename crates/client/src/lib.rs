//! Logibooks REST client.
//!
//! Provides the configuration layer, the bearer-token session, the generic
//! fetch wrapper that normalizes HTTP failures, and typed wrappers for the
//! register job endpoints.

pub mod config;
pub mod error;
pub mod http;
pub mod registers;
pub mod session;

pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use http::{ApiClient, Reply};
pub use registers::{RegisterSummary, RegistersApi};
pub use session::SessionStore;
