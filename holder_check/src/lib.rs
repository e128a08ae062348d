//! Top-holder classification for Solana SPL tokens over the Helius RPC API.

pub mod classify;
pub mod config;
pub mod error;
pub mod holders;
pub mod mint;
pub mod pipeline;
pub mod registry;
pub mod rpc;
pub mod server;
pub mod wallet;

pub use config::Config;
pub use error::{ConfigError, ErrorKind, HolderError, RpcError};
pub use pipeline::{get_holders_classification, DEFAULT_LIMIT};
pub use registry::KnownAddressRegistry;
pub use rpc::{HeliusClient, HeliusRpc, RpcMethod};
