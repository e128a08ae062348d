use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::pipeline::{DEFAULT_LIMIT, MAX_LIMIT};

const DEFAULT_MAX_PAGES: u32 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub rpc_url: String,
    pub listen_address: IpAddr,
    pub listen_port: u16,
    pub holder_limit: usize,
    /// `None` leaves holder pagination unbounded.
    pub max_pages: Option<u32>,
    pub request_timeout: Duration,
}

impl Config {
    /// Reads the process environment. Call `dotenv::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = match lookup("RPC_URL").filter(|v| !v.trim().is_empty()) {
            Some(url) => url,
            None => {
                let api_key = lookup("HELIUS_API_KEY")
                    .filter(|v| !v.trim().is_empty())
                    .ok_or(ConfigError::MissingEndpoint)?;
                format!("https://mainnet.helius-rpc.com/?api-key={}", api_key.trim())
            }
        };

        let max_pages = match parse(&lookup, "MAX_PAGES", DEFAULT_MAX_PAGES)? {
            0 => None,
            n => Some(n),
        };

        let holder_limit = parse(&lookup, "HOLDER_LIMIT", DEFAULT_LIMIT)?;
        if !(1..=MAX_LIMIT).contains(&holder_limit) {
            return Err(ConfigError::Invalid {
                key: "HOLDER_LIMIT",
                value: holder_limit.to_string(),
            });
        }

        Ok(Config {
            rpc_url,
            listen_address: parse(&lookup, "LISTEN_ADDRESS", IpAddr::from([127, 0, 0, 1]))?,
            listen_port: parse(&lookup, "LISTEN_PORT", 3030)?,
            holder_limit,
            max_pages,
            request_timeout: Duration::from_secs(parse(
                &lookup,
                "REQUEST_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
        })
    }
}

fn parse<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
