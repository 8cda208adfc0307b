//! Typed HTTP client for the management API

use reqwest::{Response, StatusCode};
use thiserror::Error;

use super::endpoints::Endpoints;
use crate::api::ErrorResponse;
use crate::models::{CreateLinkRequest, Link, LinkList};

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the input (400/422)
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// Network failure, unreachable server or undecodable body
    #[error("{0}")]
    Transport(String),
}

impl ClientError {
    /// Message shown to the user; `fallback` when nothing better is known
    pub fn user_message(&self, fallback: &str) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    pub fn new(endpoints: &Endpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: endpoints.request_base().to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn list_links(&self) -> Result<Vec<Link>, ClientError> {
        let response = self.http.get(self.url("/api/links")).send().await?;
        let list: LinkList = check(response).await?.json().await?;
        Ok(list.items)
    }

    pub async fn create_link(
        &self,
        url: &str,
        custom_slug: Option<&str>,
    ) -> Result<Link, ClientError> {
        let body = CreateLinkRequest {
            url: url.to_string(),
            custom_slug: custom_slug.map(str::to_string),
        };
        let response = self
            .http
            .post(self.url("/api/links"))
            .json(&body)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn delete_link(&self, id: i64) -> Result<(), ClientError> {
        let response = self
            .http
            .delete(self.url(&format!("/api/links/{id}")))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    /// Fetch the PNG behind a link's QR code URL
    pub async fn qr_png(&self, qr_code_url: &str) -> Result<Vec<u8>, ClientError> {
        let response = self.http.get(qr_code_url).send().await?;
        Ok(check(response).await?.bytes().await?.to_vec())
    }
}

/// Turn non-2xx responses into errors carrying the server's `detail`
async fn check(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response
        .json::<ErrorResponse>()
        .await
        .ok()
        .map(|body| body.detail)
        .filter(|detail| !detail.is_empty());
    let message =
        detail.unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

    Err(match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            ClientError::Validation(message)
        }
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Rejected {
            status: status.as_u16(),
            message,
        },
    })
}
