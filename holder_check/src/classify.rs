use log::{debug, warn};
use serde_json::{json, Value};

use crate::holders::HolderMap;
use crate::registry::KnownAddressRegistry;
use crate::rpc::{HeliusRpc, RpcMethod};

pub const UNRECOGNIZED_PROGRAM: &str = "Unrecognized Program";
pub const UNKNOWN_ACCOUNT: &str = "Unknown or Doesn't Exist";

/// Labels holders by known address, falling back to the owning program.
pub struct Classifier<'a> {
    registry: &'a KnownAddressRegistry,
}

impl<'a> Classifier<'a> {
    pub fn new(registry: &'a KnownAddressRegistry) -> Self {
        Self { registry }
    }

    /// Label for one address given its (possibly missing) parsed account info.
    pub fn label_for(&self, address: &str, account: Option<&Value>) -> String {
        if let Some(label) = self.registry.label(address) {
            return label.to_string();
        }
        match account.and_then(|a| a.get("owner")).and_then(Value::as_str) {
            Some(program) => self
                .registry
                .label(program)
                .unwrap_or(UNRECOGNIZED_PROGRAM)
                .to_string(),
            None => UNKNOWN_ACCOUNT.to_string(),
        }
    }

    /// Classifies `addresses` in batches of `batch_size`, writing labels into `holders`.
    ///
    /// A batch whose lookup fails or comes back without an account array is
    /// skipped; its holders stay unclassified.
    pub async fn classify<R>(
        &self,
        rpc: &R,
        holders: &mut HolderMap,
        addresses: &[String],
        batch_size: usize,
    ) where
        R: HeliusRpc + ?Sized,
    {
        for batch in addresses.chunks(batch_size.max(1)) {
            let response = rpc
                .call(
                    RpcMethod::GetMultipleAccounts,
                    json!([batch, { "encoding": "jsonParsed" }]),
                )
                .await;

            let result = match response {
                Ok(result) => result,
                Err(e) => {
                    warn!("skipping classification batch of {}: {}", batch.len(), e);
                    continue;
                }
            };
            let Some(accounts) = result.get("value").and_then(Value::as_array) else {
                warn!(
                    "skipping classification batch of {}: response has no account array",
                    batch.len()
                );
                continue;
            };

            for (i, address) in batch.iter().enumerate() {
                let Some(holder) = holders.get_mut(address) else {
                    continue;
                };
                let account = accounts.get(i).filter(|a| !a.is_null());
                let label = self.label_for(address, account);
                debug!("classified {} as {}", address, label);
                holder.classification = Some(label);
            }
        }
    }
}
