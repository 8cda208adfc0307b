//! Client side of the service: the logic behind the single-page form

pub mod api;
pub mod app;
pub mod endpoints;
pub mod state;

pub use api::{ApiClient, ClientError};
pub use app::App;
pub use endpoints::{resolve_api_base, Endpoints};
pub use state::{Action, ClientState, EnrichedLink, View};
