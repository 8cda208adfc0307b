//! Client driver: every mutation is sent, then the list is reloaded

use super::api::ApiClient;
use super::endpoints::Endpoints;
use super::state::{Action, ClientState};

const LOAD_FAILED: &str = "Failed to load links";
const CREATE_FAILED: &str = "Failed to create link";
const DELETE_FAILED: &str = "Failed to delete link";

pub struct App {
    api: ApiClient,
    state: ClientState,
}

impl App {
    /// Build the app and perform the initial list fetch
    pub async fn start(endpoints: Endpoints) -> Self {
        let mut app = Self {
            api: ApiClient::new(&endpoints),
            state: ClientState::new(endpoints),
        };
        app.load_links().await;
        app
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Replace the local list with the server's
    pub async fn load_links(&mut self) {
        match self.api.list_links().await {
            Ok(links) => self.state.apply(Action::LinksLoaded(links)),
            Err(e) => {
                tracing::debug!(error = %e, "list request failed");
                self.state
                    .apply(Action::RequestFailed(e.user_message(LOAD_FAILED)));
            }
        }
    }

    /// Create a link; on success reload, then switch to the QR view
    pub async fn submit(&mut self, url: &str, custom_slug: Option<&str>) {
        if url.is_empty() {
            return;
        }

        self.state.apply(Action::CreateStarted);
        match self.api.create_link(url, custom_slug).await {
            Ok(link) => {
                self.load_links().await;
                self.state.apply(Action::LinkCreated(link));
            }
            Err(e) => {
                tracing::debug!(error = %e, "create request failed");
                self.state
                    .apply(Action::RequestFailed(e.user_message(CREATE_FAILED)));
            }
        }
        self.state.apply(Action::CreateFinished);
    }

    /// Delete a link; on success reload. Returns whether the server deleted it.
    pub async fn delete(&mut self, id: i64) -> bool {
        match self.api.delete_link(id).await {
            Ok(()) => {
                self.load_links().await;
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, id, "delete request failed");
                self.state
                    .apply(Action::RequestFailed(e.user_message(DELETE_FAILED)));
                false
            }
        }
    }

    pub fn back(&mut self) {
        self.state.apply(Action::Back);
    }

    /// Point the app at other endpoints; derived URLs change with them
    pub fn set_endpoints(&mut self, endpoints: Endpoints) {
        self.api = ApiClient::new(&endpoints);
        self.state.apply(Action::EndpointsChanged(endpoints));
    }
}
