use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use solana_sdk::pubkey::Pubkey;

pub mod format;

/// Largest number of decimals an exact `Decimal` balance can carry.
pub const MAX_DECIMALS: u8 = 28;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MintInfo {
    pub mint: Pubkey,
    pub decimals: u8,
    pub supply: u128,
    pub is_initialized: bool,
    pub freeze_authority: Option<Pubkey>,
    pub mint_authority: Option<Pubkey>,
}

impl MintInfo {
    /// Converts a raw on-chain amount into human units (`raw / 10^decimals`).
    /// Returns `None` when the amount does not fit an exact decimal.
    pub fn scale(&self, raw: u128) -> Option<Decimal> {
        let raw = i128::try_from(raw).ok()?;
        Decimal::try_from_i128_with_scale(raw, u32::from(self.decimals)).ok()
    }

    pub fn total_supply(&self) -> Option<Decimal> {
        self.scale(self.supply)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub owner: String,
    pub balance: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

impl Holder {
    pub fn new(owner: impl Into<String>, balance: Decimal) -> Self {
        Self {
            owner: owner.into(),
            balance,
            classification: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub top_holders: Vec<Holder>,
    pub total_holders: usize,
    pub total_supply: Decimal,
}

impl ClassificationResult {
    /// Share of the total supply held by `holder`, in percent.
    pub fn owned_percentage(&self, holder: &Holder) -> f64 {
        if self.total_supply.is_zero() {
            return 0.0;
        }
        let share = holder.balance / self.total_supply * Decimal::ONE_HUNDRED;
        share.to_f64().unwrap_or(0.0)
    }
}

// searchAssets payloads. Only the fields the portfolio view reads are typed,
// everything else is carried through untouched.

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Asset {
    pub interface: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<AssetContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_info: Option<AssetTokenInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Asset {
    pub fn is_fungible(&self) -> bool {
        matches!(self.interface.as_str(), "FungibleToken" | "FungibleAsset")
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AssetContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AssetMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<AssetLinks>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AssetMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub token_standard: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AssetLinks {
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AssetTokenInfo {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub balance: Option<u64>,
    #[serde(default)]
    pub decimals: Option<u8>,
    #[serde(default)]
    pub price_info: Option<PriceInfo>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct PriceInfo {
    #[serde(default)]
    pub price_per_token: Option<f64>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct WalletAssets {
    pub fungible_tokens: Vec<Asset>,
    pub non_fungible_tokens: Vec<Asset>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioToken {
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub balance: f64,
    pub decimals: u8,
    pub price_per_token: f64,
    pub value: f64,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WalletPortfolio {
    pub address: String,
    pub total_value: f64,
    pub tokens: Vec<PortfolioToken>,
}
