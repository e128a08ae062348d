use std::collections::HashMap;

use log::{info, warn};

const BUNDLED: &str = include_str!("../data/known_addresses.json");

lazy_static::lazy_static! {
    static ref GLOBAL: KnownAddressRegistry = KnownAddressRegistry::bundled();
}

/// Labels for well-known wallets and program ids (exchanges, AMMs, loaders...).
#[derive(Debug, Default, Clone)]
pub struct KnownAddressRegistry {
    labels: HashMap<String, String>,
}

impl KnownAddressRegistry {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        let labels: HashMap<String, String> = serde_json::from_str(raw)?;
        Ok(Self { labels })
    }

    /// The registry shipped with the crate, loaded once per process.
    pub fn global() -> &'static KnownAddressRegistry {
        &GLOBAL
    }

    fn bundled() -> Self {
        Self::load_or_empty(BUNDLED)
    }

    fn load_or_empty(raw: &str) -> Self {
        match Self::from_json(raw) {
            Ok(registry) => {
                info!("loaded {} known addresses", registry.len());
                registry
            }
            Err(e) => {
                warn!("known address file is unreadable, classifying without it: {}", e);
                Self::default()
            }
        }
    }

    pub fn label(&self, address: &str) -> Option<&str> {
        self.labels.get(address).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(String, String)> for KnownAddressRegistry {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}
