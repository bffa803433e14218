pub mod rest;
pub mod state;

// Re-export the router builder so the binary and the tests assemble the same app.
pub use rest::{api_router, ApiDoc};
pub use state::AppState;
