use abi::ClassificationResult;
use log::info;

use crate::classify::Classifier;
use crate::error::{HolderError, Stage};
use crate::holders::aggregate_holders;
use crate::mint::resolve_mint;
use crate::registry::KnownAddressRegistry;
use crate::rpc::HeliusRpc;

pub const DEFAULT_LIMIT: usize = 10;
/// `getMultipleAccounts` accepts at most 100 addresses per request.
pub const MAX_LIMIT: usize = 100;

/// Resolves the mint, aggregates every holder, then classifies the top `limit`.
///
/// Mint and aggregation failures abort the run. Classification problems only
/// leave the affected holders unlabelled.
pub async fn get_holders_classification<R>(
    rpc: &R,
    registry: &KnownAddressRegistry,
    mint: &str,
    limit: usize,
    max_pages: Option<u32>,
) -> Result<ClassificationResult, HolderError>
where
    R: HeliusRpc + ?Sized,
{
    let mint_info = resolve_mint(rpc, mint).await?;
    let total_supply = mint_info.total_supply().ok_or_else(|| {
        HolderError::malformed(
            Stage::MintResolution,
            format!("supply {} does not fit an exact decimal", mint_info.supply),
        )
    })?;

    let mut holders = aggregate_holders(rpc, &mint_info, max_pages).await?;

    let top: Vec<String> = holders.ranked().into_iter().take(limit).collect();
    Classifier::new(registry)
        .classify(rpc, &mut holders, &top, limit)
        .await;

    let top_holders = top
        .iter()
        .filter_map(|owner| holders.get(owner).cloned())
        .collect();

    info!(
        "classified top {} of {} holders for mint {}",
        top.len(),
        holders.len(),
        mint
    );
    Ok(ClassificationResult {
        top_holders,
        total_holders: holders.len(),
        total_supply,
    })
}
