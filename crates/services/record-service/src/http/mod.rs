//! HTTP boundary - JSON routes over the federated store.

mod handlers;
mod routes;
mod state;

pub use handlers::{BackendHealth, DeleteForm, HealthResponse, SaveForm};
pub use routes::create_router;
pub use state::AppState;
