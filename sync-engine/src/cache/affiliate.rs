//! Affiliate dashboard and referral list, both scoped to the logged-in user.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use shared::{AffiliateDashboard, Referral};

use super::staleness::{FetchFn, StalenessCache};
use crate::core::error::{Result, SyncError};
use crate::core::service::ApiService;
use crate::storage::{keys, DurableStore};

pub type AffiliateCache = StalenessCache<AffiliateDashboard>;
pub type ReferralCache = StalenessCache<Vec<Referral>>;

/// Current auth token, `None` when logged out.
pub type AuthSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

fn require_auth(auth: &AuthSource) -> Result<String> {
    auth().ok_or_else(|| SyncError::Validation("Not logged in".to_string()))
}

/// Stats and earnings are fetched in parallel and stored together.
pub fn affiliate_cache(
    api: Arc<dyn ApiService>,
    store: Arc<dyn DurableStore>,
    ttl: Duration,
    auth: AuthSource,
) -> AffiliateCache {
    let fetch: FetchFn<AffiliateDashboard> = Arc::new(move || {
        let api = Arc::clone(&api);
        let token = require_auth(&auth);
        async move {
            let token = token?;
            let (stats, earnings) = futures::try_join!(
                api.get_affiliate_stats(&token),
                api.get_affiliate_earnings(&token)
            )?;
            Ok(AffiliateDashboard { stats, earnings })
        }
        .boxed()
    });

    StalenessCache::new(keys::AFFILIATE_DASHBOARD_CACHE, ttl, store, fetch)
}

pub fn referral_cache(
    api: Arc<dyn ApiService>,
    store: Arc<dyn DurableStore>,
    ttl: Duration,
    auth: AuthSource,
) -> ReferralCache {
    let fetch: FetchFn<Vec<Referral>> = Arc::new(move || {
        let api = Arc::clone(&api);
        let token = require_auth(&auth);
        async move { api.get_referrals(&token?).await }.boxed()
    });

    StalenessCache::new(keys::REFERRALS_CACHE, ttl, store, fetch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStatus;
    use crate::storage::MemoryStore;
    use crate::test_support::MockApi;
    use shared::{AffiliateEarnings, AffiliateStats};

    fn logged_in() -> AuthSource {
        Arc::new(|| Some("token-123".to_string()))
    }

    #[tokio::test]
    async fn test_dashboard_combines_both_calls() {
        let api = MockApi::new();
        *api.stats.lock() = AffiliateStats {
            referral_code: "ALICE10".to_string(),
            total_referrals: 4,
            active_referrals: 2,
            commission_rate: "0.25".to_string(),
        };
        *api.earnings.lock() = AffiliateEarnings {
            total_earned: "120.5".to_string(),
            pending_payout: "20".to_string(),
            currency: "USD".to_string(),
        };
        let cache = affiliate_cache(api.clone(), Arc::new(MemoryStore::new()), Duration::from_secs(300), logged_in());

        cache.initialize(false).await;

        let dashboard = cache.data();
        assert_eq!(dashboard.stats.referral_code, "ALICE10");
        assert_eq!(dashboard.earnings.total_earned, "120.5");
        assert_eq!(api.calls_to("get_affiliate_stats"), 1);
        assert_eq!(api.calls_to("get_affiliate_earnings"), 1);
    }

    #[tokio::test]
    async fn test_dashboard_fails_when_either_call_fails() {
        let api = MockApi::new();
        api.fail_next(SyncError::Api("HTTP 500".to_string()));
        let cache = affiliate_cache(api.clone(), Arc::new(MemoryStore::new()), Duration::from_secs(300), logged_in());

        cache.fetch_data(false).await;

        assert_eq!(cache.status(), CacheStatus::Error);
        assert_eq!(cache.data(), AffiliateDashboard::default());
    }

    #[tokio::test]
    async fn test_referrals_require_login() {
        let api = MockApi::new();
        let cache = referral_cache(api.clone(), Arc::new(MemoryStore::new()), Duration::from_secs(300), Arc::new(|| None));

        cache.fetch_data(false).await;

        assert_eq!(cache.status(), CacheStatus::Error);
        assert_eq!(api.calls_to("get_referrals"), 0);
    }
}
