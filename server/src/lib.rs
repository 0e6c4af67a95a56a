//! driftbook-server: HTTP front end for trend analysis and Recall trades.
//!
//! The router is built from an [`ApiState`] holding trait objects, so tests
//! drive it with the broker's mock exchange and canned price history.

pub mod api;
pub mod error;
pub mod state;
pub mod trend;

pub use api::create_router;
pub use error::ApiError;
pub use state::ApiState;
