//! Ledger operation records as returned by a record source

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::OpTableError;

/// Opaque paging token marking a position in an ordered record stream.
///
/// `"0"` (or an empty token) is the start of the stream. Tokens that parse as
/// integers are ordered numerically, anything else falls back to string order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(token: impl Into<String>) -> Self {
        Cursor(token.into())
    }

    pub fn start() -> Self {
        Cursor("0".to_string())
    }

    pub fn is_start(&self) -> bool {
        self.0.is_empty() || self.0 == "0"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::start()
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Cursor::new(s)
    }
}

impl From<u64> for Cursor {
    fn from(n: u64) -> Self {
        Cursor(n.to_string())
    }
}

impl Ord for Cursor {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u128>(), other.0.parse::<u128>()) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Cursor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single ledger operation.
///
/// Only `paging_token` and `type` drive pagination and filtering; every other
/// attribute the source sends is carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub paging_token: Cursor,
    #[serde(rename = "type")]
    pub op_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>, paging_token: impl Into<Cursor>, op_type: &str) -> Self {
        Record {
            id: id.into(),
            paging_token: paging_token.into(),
            op_type: op_type.to_string(),
            source_account: None,
            transaction_hash: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_source_account(mut self, account: impl Into<String>) -> Self {
        self.source_account = Some(account.into());
        self
    }

    pub fn with_transaction_hash(mut self, hash: impl Into<String>) -> Self {
        self.transaction_hash = Some(hash.into());
        self
    }

    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.created_at = Some(created_at.into());
        self
    }

    pub fn is_type(&self, op_type: &str) -> bool {
        self.op_type == op_type
    }

    /// Display form of the record: `time` mirrors `created_at` and every
    /// top-level key is camelCased.
    pub fn to_display_json(&self) -> Value {
        let mut fields = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if let Some(created_at) = &self.created_at {
            fields.insert("time".to_string(), Value::String(created_at.clone()));
        }
        Value::Object(
            fields
                .into_iter()
                .map(|(k, v)| (camel_case(&k), v))
                .collect(),
        )
    }
}

/// `source_account` -> `sourceAccount`, `_links` -> `links`.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for (i, part) in key.split('_').filter(|p| !p.is_empty()).enumerate() {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

/// Known operation types, in the order the filter selector lists them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationType {
    CreateAccount,
    Payment,
    PathPaymentStrictReceive,
    ManageSellOffer,
    CreatePassiveSellOffer,
    SetOptions,
    ChangeTrust,
    AllowTrust,
    AccountMerge,
    Inflation,
    ManageData,
    BumpSequence,
    ManageBuyOffer,
    PathPaymentStrictSend,
    CreateClaimableBalance,
    ClaimClaimableBalance,
    BeginSponsoringFutureReserves,
    EndSponsoringFutureReserves,
    RevokeSponsorship,
    Clawback,
    ClawbackClaimableBalance,
    SetTrustLineFlags,
    LiquidityPoolDeposit,
    LiquidityPoolWithdraw,
    InvokeHostFunction,
    ExtendFootprintTtl,
    RestoreFootprint,
}

impl OperationType {
    pub const ALL: [OperationType; 27] = [
        OperationType::CreateAccount,
        OperationType::Payment,
        OperationType::PathPaymentStrictReceive,
        OperationType::ManageSellOffer,
        OperationType::CreatePassiveSellOffer,
        OperationType::SetOptions,
        OperationType::ChangeTrust,
        OperationType::AllowTrust,
        OperationType::AccountMerge,
        OperationType::Inflation,
        OperationType::ManageData,
        OperationType::BumpSequence,
        OperationType::ManageBuyOffer,
        OperationType::PathPaymentStrictSend,
        OperationType::CreateClaimableBalance,
        OperationType::ClaimClaimableBalance,
        OperationType::BeginSponsoringFutureReserves,
        OperationType::EndSponsoringFutureReserves,
        OperationType::RevokeSponsorship,
        OperationType::Clawback,
        OperationType::ClawbackClaimableBalance,
        OperationType::SetTrustLineFlags,
        OperationType::LiquidityPoolDeposit,
        OperationType::LiquidityPoolWithdraw,
        OperationType::InvokeHostFunction,
        OperationType::ExtendFootprintTtl,
        OperationType::RestoreFootprint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::CreateAccount => "create_account",
            OperationType::Payment => "payment",
            OperationType::PathPaymentStrictReceive => "path_payment_strict_receive",
            OperationType::ManageSellOffer => "manage_sell_offer",
            OperationType::CreatePassiveSellOffer => "create_passive_sell_offer",
            OperationType::SetOptions => "set_options",
            OperationType::ChangeTrust => "change_trust",
            OperationType::AllowTrust => "allow_trust",
            OperationType::AccountMerge => "account_merge",
            OperationType::Inflation => "inflation",
            OperationType::ManageData => "manage_data",
            OperationType::BumpSequence => "bump_sequence",
            OperationType::ManageBuyOffer => "manage_buy_offer",
            OperationType::PathPaymentStrictSend => "path_payment_strict_send",
            OperationType::CreateClaimableBalance => "create_claimable_balance",
            OperationType::ClaimClaimableBalance => "claim_claimable_balance",
            OperationType::BeginSponsoringFutureReserves => "begin_sponsoring_future_reserves",
            OperationType::EndSponsoringFutureReserves => "end_sponsoring_future_reserves",
            OperationType::RevokeSponsorship => "revoke_sponsorship",
            OperationType::Clawback => "clawback",
            OperationType::ClawbackClaimableBalance => "clawback_claimable_balance",
            OperationType::SetTrustLineFlags => "set_trust_line_flags",
            OperationType::LiquidityPoolDeposit => "liquidity_pool_deposit",
            OperationType::LiquidityPoolWithdraw => "liquidity_pool_withdraw",
            OperationType::InvokeHostFunction => "invoke_host_function",
            OperationType::ExtendFootprintTtl => "extend_footprint_ttl",
            OperationType::RestoreFootprint => "restore_footprint",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationType {
    type Err = OpTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| OpTableError::InvalidInput(format!("Unknown operation type: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_numeric_order() {
        assert!(Cursor::new("9") < Cursor::new("10"));
        assert!(Cursor::new("120259084289") > Cursor::new("120259084288"));
        assert!(Cursor::start().is_start());
        assert!(Cursor::new("").is_start());
        assert!(!Cursor::new("1").is_start());
    }

    #[test]
    fn test_record_passthrough_fields() {
        let json = r#"{
            "id": "12884905985",
            "paging_token": "12884905985",
            "type": "payment",
            "source_account": "GABC",
            "created_at": "2024-01-01T00:00:00Z",
            "amount": "10.0000000",
            "_links": {"self": {"href": "/operations/12884905985"}}
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.op_type, "payment");
        assert_eq!(record.paging_token, Cursor::new("12884905985"));
        assert_eq!(record.extra["amount"], "10.0000000");
        assert!(record.extra.contains_key("_links"));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["amount"], "10.0000000");
        assert_eq!(back["type"], "payment");
    }

    #[test]
    fn test_display_json_camel_cases_keys_and_sets_time() {
        let mut record = Record::new("1", "1", "create_account")
            .with_source_account("GABC")
            .with_created_at("2024-01-01T00:00:00Z");
        record
            .extra
            .insert("starting_balance".to_string(), Value::from("1.0"));

        let display = record.to_display_json();
        assert_eq!(display["sourceAccount"], "GABC");
        assert_eq!(display["startingBalance"], "1.0");
        assert_eq!(display["time"], "2024-01-01T00:00:00Z");
        assert_eq!(display["pagingToken"], "1");
        assert!(display.get("source_account").is_none());
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("source_account"), "sourceAccount");
        assert_eq!(camel_case("_links"), "links");
        assert_eq!(camel_case("type"), "type");
    }

    #[test]
    fn test_operation_type_round_trip_names() {
        for t in OperationType::ALL {
            assert_eq!(t.as_str().parse::<OperationType>().unwrap(), t);
        }
        assert!("not_a_type".parse::<OperationType>().is_err());
    }
}
