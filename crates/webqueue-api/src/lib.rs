//! HTTP gateway for the webqueue job server.
//!
//! Maps the REST surface onto scheduler operations.

pub mod error;
pub mod routes;
pub mod state;

pub use state::AppState;
