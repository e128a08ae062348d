//! Native balance and asset lookups for a single wallet.

use abi::{
    Asset, AssetContent, AssetLinks, AssetMetadata, AssetTokenInfo, PortfolioToken, PriceInfo,
    WalletAssets, WalletPortfolio,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use solana_sdk::native_token::LAMPORTS_PER_SOL;

use crate::error::{HolderError, Stage};
use crate::rpc::{HeliusRpc, RpcMethod};

pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";
const SOL_DECIMALS: u8 = 9;
const SOL_LOGO: &str = "https://raw.githubusercontent.com/solana-labs/token-list/main/assets/mainnet/So11111111111111111111111111111111111111112/logo.png";

/// Tokens worth less than this (USD) are left out of the portfolio view.
const MIN_PORTFOLIO_VALUE: f64 = 10.0;
/// Non-SOL slots in the portfolio view.
const MAX_PORTFOLIO_TOKENS: usize = 9;

/// SOL balance of `wallet`.
pub async fn get_balance<R>(rpc: &R, wallet: &str) -> Result<Decimal, HolderError>
where
    R: HeliusRpc + ?Sized,
{
    let result = rpc
        .call(RpcMethod::GetBalance, json!([wallet]))
        .await
        .map_err(HolderError::rpc(Stage::WalletLookup))?;

    let lamports = result
        .get("value")
        .or_else(|| result.get("balance"))
        .and_then(Value::as_u64)
        .ok_or_else(|| HolderError::malformed(Stage::WalletLookup, "getBalance returned no lamports"))?;

    Ok(Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL))
}

/// All assets of `owner`, split into fungible and non-fungible, with native SOL appended.
pub async fn search_wallet_assets<R>(rpc: &R, owner: &str) -> Result<WalletAssets, HolderError>
where
    R: HeliusRpc + ?Sized,
{
    let result = rpc
        .call(
            RpcMethod::SearchAssets,
            json!({
                "ownerAddress": owner,
                "tokenType": "all",
                "displayOptions": {
                    "showNativeBalance": true,
                    "showInscription": false,
                    "showCollectionMetadata": false,
                },
            }),
        )
        .await
        .map_err(HolderError::rpc(Stage::WalletLookup))?;

    let items = result
        .get("items")
        .filter(|items| items.is_array())
        .cloned()
        .ok_or_else(|| HolderError::malformed(Stage::WalletLookup, "searchAssets returned no items"))?;
    let items: Vec<Asset> = serde_json::from_value(items)
        .map_err(|e| HolderError::malformed(Stage::WalletLookup, e.to_string()))?;

    let (mut fungible_tokens, non_fungible_tokens): (Vec<Asset>, Vec<Asset>) =
        items.into_iter().partition(Asset::is_fungible);

    let native = result.get("nativeBalance").cloned().unwrap_or(Value::Null);
    fungible_tokens.push(native_sol_asset(&native));

    Ok(WalletAssets {
        fungible_tokens,
        non_fungible_tokens,
    })
}

fn native_sol_asset(native: &Value) -> Asset {
    Asset {
        interface: "FungibleAsset".to_string(),
        id: WRAPPED_SOL_MINT.to_string(),
        content: Some(AssetContent {
            metadata: Some(AssetMetadata {
                name: Some("Wrapped SOL".to_string()),
                symbol: Some("SOL".to_string()),
                description: Some("Solana Token".to_string()),
                token_standard: Some("Native Token".to_string()),
            }),
            links: Some(AssetLinks {
                image: Some(SOL_LOGO.to_string()),
            }),
            extra: Map::new(),
        }),
        token_info: Some(AssetTokenInfo {
            symbol: Some("SOL".to_string()),
            balance: Some(native.get("lamports").and_then(Value::as_u64).unwrap_or(0)),
            decimals: Some(SOL_DECIMALS),
            price_info: Some(PriceInfo {
                price_per_token: native.get("price_per_sol").and_then(Value::as_f64),
                total_price: native.get("total_price").and_then(Value::as_f64),
                currency: None,
            }),
        }),
        extra: Map::new(),
    }
}

fn portfolio_token(asset: &Asset) -> PortfolioToken {
    let info = asset.token_info.clone().unwrap_or_default();
    let metadata = asset
        .content
        .as_ref()
        .and_then(|c| c.metadata.clone())
        .unwrap_or_default();
    let decimals = info.decimals.unwrap_or(0);
    let balance = Decimal::try_from_i128_with_scale(
        i128::from(info.balance.unwrap_or(0)),
        u32::from(decimals.min(abi::MAX_DECIMALS)),
    )
    .ok()
    .and_then(|d| d.to_f64())
    .unwrap_or(0.0);
    let price_per_token = info
        .price_info
        .as_ref()
        .and_then(|p| p.price_per_token)
        .unwrap_or(0.0);

    PortfolioToken {
        mint: asset.id.clone(),
        symbol: info.symbol.or(metadata.symbol).unwrap_or_default(),
        name: metadata.name.unwrap_or_default(),
        balance,
        decimals,
        price_per_token,
        value: balance * price_per_token,
        image: asset
            .content
            .as_ref()
            .and_then(|c| c.links.as_ref())
            .and_then(|l| l.image.clone()),
    }
}

/// Portfolio summary: SOL first, then the most valuable other tokens.
pub async fn get_wallet_portfolio<R>(rpc: &R, owner: &str) -> Result<WalletPortfolio, HolderError>
where
    R: HeliusRpc + ?Sized,
{
    let assets = search_wallet_assets(rpc, owner).await?;
    let tokens: Vec<PortfolioToken> = assets.fungible_tokens.iter().map(portfolio_token).collect();

    let sol = tokens.iter().find(|t| t.symbol == "SOL").cloned();
    let mut others: Vec<PortfolioToken> = tokens
        .into_iter()
        .filter(|t| t.symbol != "SOL")
        .filter(|t| t.value > MIN_PORTFOLIO_VALUE)
        .collect();
    others.sort_by(|a, b| b.value.total_cmp(&a.value));
    others.truncate(MAX_PORTFOLIO_TOKENS);

    let tokens: Vec<PortfolioToken> = sol.into_iter().chain(others).collect();
    Ok(WalletPortfolio {
        address: owner.to_string(),
        total_value: tokens.iter().map(|t| t.value).sum(),
        tokens,
    })
}
