use std::collections::HashMap;

use abi::{Holder, MintInfo};
use log::{debug, info};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use crate::error::{HolderError, Stage};
use crate::rpc::{HeliusRpc, RpcMethod};

pub const PAGE_SIZE: u32 = 1000;

/// Owner-keyed holder collection that remembers first-insertion order.
///
/// Holders live in a vector and are addressed through an owner index, so
/// callers mutate entries through `get_mut` instead of sharing references.
#[derive(Debug, Default, Clone)]
pub struct HolderMap {
    holders: Vec<Holder>,
    index: HashMap<String, usize>,
}

impl HolderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `balance` to `owner`, inserting a fresh unclassified holder if needed.
    pub fn credit(&mut self, owner: &str, balance: Decimal) -> Result<(), HolderError> {
        match self.index.get(owner) {
            Some(&i) => {
                let holder = &mut self.holders[i];
                holder.balance = holder.balance.checked_add(balance).ok_or_else(|| {
                    HolderError::malformed(
                        Stage::HolderAggregation,
                        format!("balance overflow for owner {}", owner),
                    )
                })?;
            }
            None => {
                self.index.insert(owner.to_string(), self.holders.len());
                self.holders.push(Holder::new(owner, balance));
            }
        }
        Ok(())
    }

    pub fn get(&self, owner: &str) -> Option<&Holder> {
        self.index.get(owner).map(|&i| &self.holders[i])
    }

    pub fn get_mut(&mut self, owner: &str) -> Option<&mut Holder> {
        match self.index.get(owner) {
            Some(&i) => Some(&mut self.holders[i]),
            None => None,
        }
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Holder> {
        self.holders.iter()
    }

    /// Owners sorted by balance, largest first. Ties keep insertion order.
    pub fn ranked(&self) -> Vec<String> {
        let mut order: Vec<&Holder> = self.holders.iter().collect();
        order.sort_by(|a, b| b.balance.cmp(&a.balance));
        order.into_iter().map(|h| h.owner.clone()).collect()
    }
}

/// Walks every `getTokenAccounts` page for the mint and folds balances per owner.
///
/// Pages are requested one after another starting at 1; the first empty page
/// ends the walk, and so does a short page at the `max_pages` limit. A full page
/// at the limit means more data remains and is an error.
pub async fn aggregate_holders<R>(
    rpc: &R,
    mint_info: &MintInfo,
    max_pages: Option<u32>,
) -> Result<HolderMap, HolderError>
where
    R: HeliusRpc + ?Sized,
{
    let mint = mint_info.mint.to_string();
    let mut holders = HolderMap::new();
    let mut page: u32 = 1;
    let mut accounts_seen: usize = 0;

    loop {
        let result = rpc
            .call(
                RpcMethod::GetTokenAccounts,
                json!({
                    "page": page,
                    "limit": PAGE_SIZE,
                    "displayOptions": {},
                    "mint": mint,
                }),
            )
            .await
            .map_err(HolderError::rpc(Stage::HolderAggregation))?;

        if result.is_null() {
            break;
        }
        let accounts = result
            .get("token_accounts")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                HolderError::malformed(
                    Stage::HolderAggregation,
                    format!("page {} has no token_accounts array", page),
                )
            })?;
        if accounts.is_empty() {
            break;
        }

        for account in accounts {
            let owner = account.get("owner").and_then(Value::as_str).ok_or_else(|| {
                HolderError::malformed(Stage::HolderAggregation, "token account without owner")
            })?;
            let raw = raw_amount(account.get("amount")).ok_or_else(|| {
                HolderError::malformed(
                    Stage::HolderAggregation,
                    format!("unreadable amount for owner {}", owner),
                )
            })?;
            let balance = mint_info.scale(raw).ok_or_else(|| {
                HolderError::malformed(
                    Stage::HolderAggregation,
                    format!("amount {} out of range for owner {}", raw, owner),
                )
            })?;
            holders.credit(owner, balance)?;
        }
        accounts_seen += accounts.len();
        debug!("mint {} page {}: {} accounts", mint, page, accounts.len());

        if max_pages.is_some_and(|max| page >= max) {
            if accounts.len() < PAGE_SIZE as usize {
                break;
            }
            return Err(HolderError::PageBudgetExceeded {
                mint,
                max_pages: page,
            });
        }
        page += 1;
    }

    info!(
        "mint {}: {} token accounts across {} owners",
        mint,
        accounts_seen,
        holders.len()
    );
    Ok(holders)
}

/// Raw token amount as a big integer. Absent amounts count as zero.
fn raw_amount(amount: Option<&Value>) -> Option<u128> {
    match amount {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_u64().map(u128::from),
        Some(Value::String(s)) if s.is_empty() => Some(0),
        Some(Value::String(s)) => s.parse().ok(),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::rpc::MockHeliusRpc;
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    fn mint_info(decimals: u8) -> MintInfo {
        MintInfo {
            mint: Pubkey::new_unique(),
            decimals,
            supply: 0,
            is_initialized: true,
            freeze_authority: None,
            mint_authority: None,
        }
    }

    fn account(owner: &str, amount: Value) -> Value {
        json!({ "address": Pubkey::new_unique().to_string(), "owner": owner, "amount": amount })
    }

    /// Serves `pages[n - 1]` for page `n` and an empty page afterwards.
    fn paged_rpc(pages: Vec<Vec<Value>>) -> MockHeliusRpc {
        let mut rpc = MockHeliusRpc::new();
        let served = pages.len() + 1;
        rpc.expect_call()
            .withf(|method, params| {
                *method == RpcMethod::GetTokenAccounts && params["limit"] == 1000
            })
            .times(served)
            .returning(move |_, params| {
                let page = params["page"].as_u64().unwrap() as usize;
                let accounts = pages.get(page - 1).cloned().unwrap_or_default();
                Ok(json!({ "total": accounts.len(), "limit": 1000, "page": page, "token_accounts": accounts }))
            });
        rpc
    }

    #[tokio::test]
    async fn folds_same_owner_across_pages() {
        let rpc = paged_rpc(vec![
            vec![account("A", json!(500000)), account("B", json!(300000))],
            vec![account("A", json!("200000"))],
        ]);

        let holders = aggregate_holders(&rpc, &mint_info(6), None).await.unwrap();
        assert_eq!(holders.len(), 2);
        assert_eq!(holders.get("A").unwrap().balance, Decimal::from_str("0.7").unwrap());
        assert_eq!(holders.get("B").unwrap().balance, Decimal::from_str("0.3").unwrap());
        assert!(holders.iter().all(|h| h.classification.is_none()));
    }

    #[tokio::test]
    async fn holder_count_is_distinct_owners() {
        let page: Vec<Value> = (0..10).map(|i| account(["A", "B", "C"][i % 3], json!(1))).collect();
        let rpc = paged_rpc(vec![page.clone(), page]);
        let holders = aggregate_holders(&rpc, &mint_info(0), None).await.unwrap();
        assert_eq!(holders.len(), 3);
        let total: Decimal = holders.iter().map(|h| h.balance).sum();
        assert_eq!(total, Decimal::from(20));
        assert_eq!(holders.get("A").unwrap().balance, Decimal::from(8));
    }

    #[tokio::test]
    async fn empty_first_page_yields_no_holders() {
        let rpc = paged_rpc(vec![]);
        let holders = aggregate_holders(&rpc, &mint_info(9), None).await.unwrap();
        assert!(holders.is_empty());
    }

    #[tokio::test]
    async fn null_result_ends_pagination() {
        let mut rpc = MockHeliusRpc::new();
        rpc.expect_call().times(1).returning(|_, _| Ok(Value::Null));
        let holders = aggregate_holders(&rpc, &mint_info(9), None).await.unwrap();
        assert!(holders.is_empty());
    }

    #[tokio::test]
    async fn large_raw_amounts_stay_exact() {
        let rpc = paged_rpc(vec![vec![
            account("A", json!(u64::MAX)),
            account("A", json!("1")),
        ]]);
        let holders = aggregate_holders(&rpc, &mint_info(9), None).await.unwrap();
        assert_eq!(
            holders.get("A").unwrap().balance,
            Decimal::from_str("18446744073.709551616").unwrap()
        );
    }

    #[tokio::test]
    async fn missing_amount_counts_as_zero() {
        let rpc = paged_rpc(vec![vec![json!({ "owner": "A" })]]);
        let holders = aggregate_holders(&rpc, &mint_info(2), None).await.unwrap();
        assert_eq!(holders.get("A").unwrap().balance, Decimal::ZERO);
    }

    fn full_page() -> Vec<Value> {
        (0..PAGE_SIZE as usize)
            .map(|i| account(["A", "B", "C"][i % 3], json!(1)))
            .collect()
    }

    #[tokio::test]
    async fn page_budget_stops_runaway_pagination() {
        let mut rpc = MockHeliusRpc::new();
        rpc.expect_call()
            .times(3)
            .returning(|_, _| Ok(json!({ "token_accounts": full_page() })));
        let err = aggregate_holders(&rpc, &mint_info(0), Some(3)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Budget);
    }

    #[tokio::test]
    async fn short_page_at_the_limit_completes() {
        let mut rpc = MockHeliusRpc::new();
        rpc.expect_call()
            .times(1)
            .returning(|_, _| Ok(json!({ "token_accounts": [account("A", json!(5))] })));
        let holders = aggregate_holders(&rpc, &mint_info(0), Some(1)).await.unwrap();
        assert_eq!(holders.len(), 1);
        assert_eq!(holders.get("A").unwrap().balance, Decimal::from(5));
    }

    #[tokio::test]
    async fn full_pages_within_budget_reach_the_empty_page() {
        let rpc = paged_rpc(vec![full_page(), full_page()]);
        let holders = aggregate_holders(&rpc, &mint_info(0), Some(3)).await.unwrap();
        assert_eq!(holders.len(), 3);
        let total: Decimal = holders.iter().map(|h| h.balance).sum();
        assert_eq!(total, Decimal::from(2 * PAGE_SIZE));
    }

    #[tokio::test]
    async fn upstream_failure_propagates() {
        let mut rpc = MockHeliusRpc::new();
        rpc.expect_call().returning(|_, _| {
            Err(crate::error::RpcError::Transport {
                status: 500,
                reason: "Internal Server Error".into(),
            })
        });
        let err = aggregate_holders(&rpc, &mint_info(0), None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().starts_with("holder aggregation:"));
    }

    #[test]
    fn ranking_is_stable_and_descending() {
        let mut holders = HolderMap::new();
        for (owner, balance) in [("w", 5), ("x", 5), ("y", 3), ("z", 8)] {
            holders.credit(owner, Decimal::from(balance)).unwrap();
        }
        assert_eq!(holders.ranked(), vec!["z", "w", "x", "y"]);
    }

    #[test]
    fn raw_amount_accepts_numbers_and_strings() {
        assert_eq!(raw_amount(Some(&json!(42))), Some(42));
        assert_eq!(raw_amount(Some(&json!("42"))), Some(42));
        assert_eq!(raw_amount(None), Some(0));
        assert_eq!(raw_amount(Some(&json!(-1))), None);
        assert_eq!(raw_amount(Some(&json!("1.5"))), None);
    }
}
