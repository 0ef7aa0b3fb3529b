use crate::config::AccountConfig;
use anyhow;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("cannot build http client: {0:?}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} failed")]
    Request {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("cannot read response body from {url}")]
    Body {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
    #[error("transport failure: {0:?}")]
    InternalError(#[from] anyhow::Error),
}

/// A fetched document. `location` is where it was finally served from, after redirects.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub location: Option<Url>,
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn new(location: Url, body: impl Into<String>) -> Self {
        Page {
            location: Some(location),
            status: 200,
            body: body.into(),
        }
    }

    pub fn detached(body: impl Into<String>) -> Self {
        Page {
            location: None,
            status: 200,
            body: body.into(),
        }
    }
}

/// An url-encoded form POST.
#[derive(Debug, Clone, PartialEq)]
pub struct FormRequest {
    pub url: Url,
    pub fields: Vec<(String, String)>,
}

impl FormRequest {
    pub fn new(url: Url) -> Self {
        FormRequest { url, fields: vec![] }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find_map(|(k, v)| (k == name).then_some(v.as_str()))
    }
}

/// HTTP session a single handshake runs on. Implementations keep cookies between calls.
pub trait Transport {
    fn get(&self, url: Url) -> impl Future<Output = Result<Page, TransportError>>;
    fn send(&self, request: FormRequest) -> impl Future<Output = Result<Page, TransportError>>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(skip_verify: bool) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(skip_verify)
            .build()
            .map_err(TransportError::Client)?;
        Ok(Self { client })
    }

    pub fn from_config(config: &AccountConfig) -> Result<Self, TransportError> {
        if config.skip_verify {
            warn!("TLS certificate verification is disabled");
        }
        Self::new(config.skip_verify)
    }

    async fn read(response: reqwest::Response) -> Result<Page, TransportError> {
        let location = response.url().clone();
        let status = response.status();
        if !status.is_success() {
            warn!(%location, %status, "gateway answered with a non-success status");
        }

        let body = response.text().await.map_err(|source| TransportError::Body {
            url: location.clone(),
            source,
        })?;

        Ok(Page {
            location: Some(location),
            status: status.as_u16(),
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: Url) -> Result<Page, TransportError> {
        debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| TransportError::Request { url, source })?;
        Self::read(response).await
    }

    async fn send(&self, request: FormRequest) -> Result<Page, TransportError> {
        let FormRequest { url, fields } = request;
        debug!(url = %url.path(), fields = fields.len(), "POST form");
        let response = self
            .client
            .post(url.clone())
            .form(&fields)
            .send()
            .await
            .map_err(|source| TransportError::Request { url, source })?;
        Self::read(response).await
    }
}
