use std::env;

use reqwest::{Client, Response};
use thiserror::Error;

pub mod github;
pub mod search_index;

/// Failure talking to a third-party service. Callers degrade the region of
/// the page that depends on it; calls are attempted once.
#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} answered with status {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    #[error("missing credentials: environment variable {variable} is not set")]
    MissingCredentials { variable: String },

    #[error("{service} is not configured")]
    NotConfigured { service: &'static str },
}

pub fn user_agent() -> &'static str {
    concat!("folio/", env!("CARGO_PKG_VERSION"))
}

pub(crate) fn http_client() -> Result<Client, ExternalError> {
    Ok(Client::builder().user_agent(user_agent()).build()?)
}

/// Reads a secret from the environment variable named in the configuration.
pub fn credential(variable: &str) -> Result<String, ExternalError> {
    match env::var(variable) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ExternalError::MissingCredentials { variable: variable.to_string() }),
    }
}

/// Body of a successful response, or `Status` with whatever the service said.
pub(crate) async fn response_text(service: &'static str, resp: Response) -> Result<String, ExternalError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(ExternalError::Status {
            service,
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(text)
}
