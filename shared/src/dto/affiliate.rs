use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Referral counters for the affiliate dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateStats {
    pub referral_code: String,
    pub total_referrals: u32,
    pub active_referrals: u32,
    /// Percentage as a decimal string, e.g. `"0.25"`
    pub commission_rate: String,
}

/// Commission totals for the affiliate dashboard
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateEarnings {
    pub total_earned: String,
    pub pending_payout: String,
    pub currency: String,
}

/// Combined dashboard, assembled client-side from two parallel calls
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AffiliateDashboard {
    pub stats: AffiliateStats,
    pub earnings: AffiliateEarnings,
}

/// A user brought in by the current affiliate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Referral {
    pub username: String,
    pub joined_at: DateTime<Utc>,
    pub total_wagered: String,
    pub commission_earned: String,
}

/// USD exchange rates keyed by token symbol
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    pub base: String,
    pub rates: BTreeMap<String, String>,
}

impl RateTable {
    pub fn rate(&self, symbol: &str) -> Option<&str> {
        self.rates.get(symbol).map(String::as_str)
    }
}
