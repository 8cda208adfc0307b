//! Client state and its single update function
//!
//! Everything the front end displays lives in [`ClientState`] and changes only
//! through [`ClientState::apply`], so view transitions can be tested without
//! any rendering or network.

use super::endpoints::Endpoints;
use crate::models::Link;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    /// List of links plus the create form
    #[default]
    Form,
    /// Full-screen QR code of the most recently created link
    Qr,
}

#[derive(Debug, Clone)]
pub enum Action {
    /// Authoritative list from the server replaces the local one
    LinksLoaded(Vec<Link>),
    /// Inline error message from a failed call
    RequestFailed(String),
    CreateStarted,
    CreateFinished,
    LinkCreated(Link),
    Back,
    EndpointsChanged(Endpoints),
}

/// A link together with the URLs derived for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedLink {
    pub link: Link,
    pub short_url: String,
    pub qr_code_url: String,
}

impl EnrichedLink {
    fn new(link: &Link, endpoints: &Endpoints) -> Self {
        Self {
            short_url: endpoints.short_url(&link.slug),
            qr_code_url: endpoints.qr_code_url(&link.slug),
            link: link.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientState {
    endpoints: Endpoints,
    links: Vec<Link>,
    active: Option<Link>,
    view: View,
    loading: bool,
    error: Option<String>,
}

impl ClientState {
    pub fn new(endpoints: Endpoints) -> Self {
        Self {
            endpoints,
            links: Vec::new(),
            active: None,
            view: View::Form,
            loading: false,
            error: None,
        }
    }

    pub fn apply(&mut self, action: Action) {
        match action {
            Action::LinksLoaded(links) => {
                self.links = links;
                self.error = None;
            }
            Action::RequestFailed(message) => self.error = Some(message),
            Action::CreateStarted => {
                self.loading = true;
                self.error = None;
            }
            Action::CreateFinished => self.loading = false,
            Action::LinkCreated(link) => {
                self.active = Some(link);
                self.view = View::Qr;
            }
            Action::Back => self.view = View::Form,
            Action::EndpointsChanged(endpoints) => self.endpoints = endpoints,
        }
    }

    /// The QR view is only shown while there is a link to show
    pub fn view(&self) -> View {
        match (self.view, &self.active) {
            (View::Qr, Some(_)) => View::Qr,
            _ => View::Form,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Links with derived URLs, computed from the current endpoints
    pub fn links(&self) -> Vec<EnrichedLink> {
        self.links
            .iter()
            .map(|link| EnrichedLink::new(link, &self.endpoints))
            .collect()
    }

    pub fn active_link(&self) -> Option<EnrichedLink> {
        self.active
            .as_ref()
            .map(|link| EnrichedLink::new(link, &self.endpoints))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && !self.loading
    }
}
