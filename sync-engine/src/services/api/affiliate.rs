//! # Affiliate & Rates Endpoints

use shared::{AffiliateEarnings, AffiliateStats, RateTable, Referral};

use super::client::{read_json, ApiClient};
use crate::core::error::Result;

pub async fn get_affiliate_stats(client: &ApiClient, auth_token: &str) -> Result<AffiliateStats> {
    let request = client.client.get(client.url("/api/affiliate/stats"));
    read_json(client.authed(request, auth_token).send().await?).await
}

pub async fn get_affiliate_earnings(client: &ApiClient, auth_token: &str) -> Result<AffiliateEarnings> {
    let request = client.client.get(client.url("/api/affiliate/earnings"));
    read_json(client.authed(request, auth_token).send().await?).await
}

pub async fn get_referrals(client: &ApiClient, auth_token: &str) -> Result<Vec<Referral>> {
    let request = client.client.get(client.url("/api/affiliate/referrals"));
    read_json(client.authed(request, auth_token).send().await?).await
}

/// Public; no auth header.
pub async fn get_rates(client: &ApiClient) -> Result<RateTable> {
    let response = client.client.get(client.url("/api/rates")).send().await?;
    read_json(response).await
}
