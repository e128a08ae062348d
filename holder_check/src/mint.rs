use std::str::FromStr;

use abi::{MintInfo, MAX_DECIMALS};
use log::debug;
use serde_json::{json, Value};
use solana_sdk::pubkey::Pubkey;

use crate::error::{HolderError, Stage};
use crate::rpc::{HeliusRpc, RpcMethod};

/// Fetches the mint account with parsed encoding and decodes its metadata.
pub async fn resolve_mint<R>(rpc: &R, mint: &str) -> Result<MintInfo, HolderError>
where
    R: HeliusRpc + ?Sized,
{
    let result = rpc
        .call(RpcMethod::GetAccountInfo, json!([mint, { "encoding": "jsonParsed" }]))
        .await
        .map_err(HolderError::rpc(Stage::MintResolution))?;

    let value = match result.get("value") {
        Some(value) if !value.is_null() => value,
        _ => {
            return Err(HolderError::NotFound {
                mint: mint.to_string(),
            })
        }
    };

    let invalid = |reason: String| HolderError::InvalidMint {
        mint: mint.to_string(),
        reason,
    };

    let parsed = value
        .pointer("/data/parsed")
        .ok_or_else(|| invalid("account data is not parsed".to_string()))?;
    match parsed.get("type").and_then(Value::as_str) {
        Some("mint") => {}
        Some(other) => return Err(invalid(format!("account type is {}", other))),
        None => return Err(invalid("account type is missing".to_string())),
    }

    let info = parsed
        .get("info")
        .ok_or_else(|| invalid("mint info is missing".to_string()))?;

    let decimals = info
        .get("decimals")
        .and_then(Value::as_u64)
        .and_then(|d| u8::try_from(d).ok())
        .ok_or_else(|| invalid("decimals missing or out of range".to_string()))?;
    if decimals > MAX_DECIMALS {
        return Err(invalid(format!("{} decimals is not supported", decimals)));
    }

    let supply = match info.get("supply") {
        Some(Value::String(s)) => s.parse::<u128>().ok(),
        Some(Value::Number(n)) => n.as_u64().map(u128::from),
        _ => None,
    }
    .ok_or_else(|| invalid("supply missing or not an integer".to_string()))?;

    let mint_key = Pubkey::from_str(mint).map_err(|e| invalid(e.to_string()))?;

    let mint_info = MintInfo {
        mint: mint_key,
        decimals,
        supply,
        is_initialized: info
            .get("isInitialized")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        freeze_authority: authority(info, "freezeAuthority").map_err(invalid)?,
        mint_authority: authority(info, "mintAuthority").map_err(invalid)?,
    };
    debug!(
        "resolved mint {}: decimals={} supply={}",
        mint, mint_info.decimals, mint_info.supply
    );
    Ok(mint_info)
}

fn authority(info: &Value, field: &str) -> Result<Option<Pubkey>, String> {
    match info.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Pubkey::from_str(s)
            .map(Some)
            .map_err(|e| format!("{}: {}", field, e)),
        Some(other) => Err(format!("{}: unexpected value {}", field, other)),
    }
}
