use std::fmt;

use thiserror::Error;

pub type CarrierResult<T> = Result<T, CarrierError>;

/// Category of a failed lookup. The outer boundary maps these to status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Transport,
    UpstreamProtocol,
}

/// Why a successful-looking upstream exchange was still unusable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtocolFailure {
    /// The service could not be reached at all (bad endpoint, service offline).
    ServiceUnreachable,
    /// The body could not be decoded as the expected document type.
    MalformedBody,
    /// The body decoded but lacks the part holding tracking data.
    MissingField,
}

impl fmt::Display for ProtocolFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServiceUnreachable => write!(f, "service unreachable"),
            Self::MalformedBody => write!(f, "malformed body"),
            Self::MissingField => write!(f, "missing field"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Cause {
    #[error("http client error")]
    Http(#[from] reqwest::Error),
    #[error("json decoding failed")]
    Json(#[from] serde_json::Error),
    #[error("xml decoding failed")]
    Xml(#[from] quick_xml::Error),
    #[error("upstream responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("soap fault: {0}")]
    SoapFault(String),
    #[error("upstream reported severity {0}")]
    Severity(String),
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    #[error("credential refresh failed for a concurrent caller: {0}")]
    SharedRefresh(String),
}

#[derive(Debug, Error)]
pub enum CarrierError {
    #[error("carrier authentication failed: {message}")]
    Auth {
        message: String,
        #[source]
        cause: Cause,
    },
    #[error("carrier request failed: {message}")]
    Transport {
        message: String,
        #[source]
        cause: Cause,
    },
    #[error("invalid response from carrier ({kind}): {message}")]
    UpstreamProtocol {
        kind: ProtocolFailure,
        message: String,
        #[source]
        cause: Cause,
    },
}

impl CarrierError {
    pub fn auth(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::Auth {
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn transport(message: impl Into<String>, cause: impl Into<Cause>) -> Self {
        Self::Transport {
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn upstream(
        kind: ProtocolFailure,
        message: impl Into<String>,
        cause: impl Into<Cause>,
    ) -> Self {
        Self::UpstreamProtocol {
            kind,
            message: message.into(),
            cause: cause.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth { .. } => ErrorKind::Auth,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::UpstreamProtocol { .. } => ErrorKind::UpstreamProtocol,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Auth { message, .. }
            | Self::Transport { message, .. }
            | Self::UpstreamProtocol { message, .. } => message,
        }
    }

    pub fn cause(&self) -> &Cause {
        match self {
            Self::Auth { cause, .. }
            | Self::Transport { cause, .. }
            | Self::UpstreamProtocol { cause, .. } => cause,
        }
    }

    /// Re-tags any error as an authentication failure, keeping message and cause.
    pub fn into_auth(self) -> Self {
        match self {
            Self::Auth { .. } => self,
            Self::Transport { message, cause } | Self::UpstreamProtocol { message, cause, .. } => {
                Self::Auth { message, cause }
            }
        }
    }

    pub fn display_chain(&self) -> DisplayChainedError<'_> {
        DisplayChainedError { inner: self }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config: {0}")]
    Invalid(&'static str),
    #[error("failed to build http client")]
    HttpClient(#[from] reqwest::Error),
}

pub struct DisplayChainedError<'a> {
    inner: &'a (dyn std::error::Error + 'static),
}

impl fmt::Debug for DisplayChainedError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self.inner);

        while let Some(err) = current {
            if first {
                first = false;
            } else {
                write!(f, " -> ")?;
            }

            write!(f, "{err}")?;
            current = err.source();
        }

        Ok(())
    }
}

impl fmt::Display for DisplayChainedError<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
