use std::fmt;

use thiserror::Error;

/// Failure talking to the indexing RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The endpoint answered with a non-success HTTP status.
    #[error("Helius API error: {status} {reason}")]
    Transport { status: u16, reason: String },

    /// The JSON-RPC response carried an `error` member.
    #[error("Helius API error: {message}")]
    Protocol { message: String },

    /// Connection, timeout or body decoding failure below the RPC layer.
    #[error("Helius API request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Pipeline stage an error escaped from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    MintResolution,
    HolderAggregation,
    WalletLookup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::MintResolution => write!(f, "mint resolution"),
            Stage::HolderAggregation => write!(f, "holder aggregation"),
            Stage::WalletLookup => write!(f, "wallet lookup"),
        }
    }
}

#[derive(Debug, Error)]
pub enum HolderError {
    #[error("{stage}: upstream request failed: {source}")]
    Rpc {
        stage: Stage,
        #[source]
        source: RpcError,
    },

    #[error("mint resolution: no account info found for mint: {mint}")]
    NotFound { mint: String },

    #[error("mint resolution: account is not a valid SPL mint: {mint} ({reason})")]
    InvalidMint { mint: String, reason: String },

    #[error("holder aggregation: page budget of {max_pages} pages exhausted for mint {mint}")]
    PageBudgetExceeded { mint: String, max_pages: u32 },

    #[error("{stage}: malformed response: {detail}")]
    MalformedResponse { stage: Stage, detail: String },
}

/// Coarse category callers branch on (HTTP status, exit code, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidMint,
    Upstream,
    Budget,
    Malformed,
}

impl HolderError {
    pub fn rpc(stage: Stage) -> impl FnOnce(RpcError) -> HolderError {
        move |source| HolderError::Rpc { stage, source }
    }

    pub fn malformed(stage: Stage, detail: impl Into<String>) -> Self {
        HolderError::MalformedResponse {
            stage,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            HolderError::Rpc { .. } => ErrorKind::Upstream,
            HolderError::NotFound { .. } => ErrorKind::NotFound,
            HolderError::InvalidMint { .. } => ErrorKind::InvalidMint,
            HolderError::PageBudgetExceeded { .. } => ErrorKind::Budget,
            HolderError::MalformedResponse { .. } => ErrorKind::Malformed,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("RPC_URL or HELIUS_API_KEY must be set")]
    MissingEndpoint,

    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}
