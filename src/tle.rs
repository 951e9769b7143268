use std::{io, sync::Arc};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::FetcherConfig;

/// Two-line element set as returned by the TLE API.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ElementSet {
    /// NORAD catalog number
    #[serde(rename = "satelliteId", default)]
    pub identifier: u64,
    pub name: String,
    pub line1: String,
    pub line2: String,

    /// Response object exactly as decoded, in server key order.
    #[serde(skip)]
    pub raw: serde_json::Map<String, serde_json::Value>,
}

impl ElementSet {
    /// Decodes a response body, keeping the whole object alongside the typed fields.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(body)?;
        let mut elements: ElementSet = serde_json::from_value(raw.clone().into())?;
        elements.raw = raw;
        Ok(elements)
    }

    /// Pretty JSON of the response this element set was decoded from.
    pub fn to_json_pretty(&self) -> String {
        let printed = if self.raw.is_empty() {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string_pretty(&self.raw)
        };
        printed.unwrap_or_else(|_| format!("{:?}", self))
    }
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out")]
    Timeout,

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("TLS setup error: {0}")]
    Tls(#[from] native_tls::Error),
}

/// Anything that can look up an element set by NORAD ID.
pub trait TleSource {
    fn fetch(&self, satellite_id: u64) -> Result<ElementSet, FetchError>;
}

pub struct TleClient {
    agent: ureq::Agent,
    base_url: String,
    user_agent: String,
}

impl TleClient {
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let mut builder = ureq::AgentBuilder::new().timeout(config.timeout);

        if config.skip_certificate_verification {
            warn!("TLS certificate verification is disabled for {}", config.base_url);
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .build()?;
            builder = builder.tls_connector(Arc::new(connector));
        }

        Ok(Self {
            agent: builder.build(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        })
    }

    pub fn url(&self, satellite_id: u64) -> String {
        format!("{}/api/tle/{}", self.base_url, satellite_id)
    }

    fn request(&self, satellite_id: u64) -> Result<ElementSet, FetchError> {
        let url = self.url(satellite_id);
        debug!(
            %url,
            user_agent = %self.user_agent,
            accept = "application/json",
            "sending GET request"
        );

        let response = self
            .agent
            .get(&url)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/json")
            .call()
            .map_err(classify)?;
        debug!(status = response.status(), "received response");

        let body = response.into_string().map_err(classify_io)?;
        let mut elements = ElementSet::from_json(&body)?;
        if elements.identifier == 0 {
            elements.identifier = satellite_id;
        }
        debug!(json = %body, "response JSON");

        Ok(elements)
    }
}

impl TleSource for TleClient {
    fn fetch(&self, satellite_id: u64) -> Result<ElementSet, FetchError> {
        self.request(satellite_id).inspect_err(|err| match err {
            FetchError::Status(_) => error!("HTTP error occurred: {err}"),
            FetchError::Connection(_) => error!("Connection error occurred: {err}"),
            FetchError::Timeout => error!("Timeout error occurred: {err}"),
            FetchError::Decode(_) => error!("JSON decode error: {err}"),
            FetchError::Tls(_) => error!("An error occurred: {err}"),
        })
    }
}

fn classify(err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::Status(code, _) => FetchError::Status(code),
        ureq::Error::Transport(transport) => {
            let timed_out = std::error::Error::source(&transport)
                .and_then(|source| source.downcast_ref::<io::Error>())
                .is_some_and(is_timeout);
            if timed_out {
                FetchError::Timeout
            } else {
                FetchError::Connection(transport.to_string())
            }
        }
    }
}

fn classify_io(err: io::Error) -> FetchError {
    if is_timeout(&err) {
        FetchError::Timeout
    } else {
        FetchError::Connection(err.to_string())
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(err.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
}
