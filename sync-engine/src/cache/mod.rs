//! # Data Caches
//!
//! [`StalenessCache`] and the four datasets built on it:
//!
//! | Cache | Storage key | Scope |
//! |---|---|---|
//! | [`TokenCache`] | `tokens_cache` | wallet + chain + user |
//! | [`AffiliateCache`] | `affiliate_dashboard_cache` | user |
//! | [`ReferralCache`] | `referrals_cache` | user |
//! | [`RatesCache`] | `rates_cache` | public |

pub mod affiliate;
pub mod rates;
pub mod staleness;
pub mod tokens;

pub use affiliate::{affiliate_cache, referral_cache, AffiliateCache, AuthSource, ReferralCache};
pub use rates::{rates_cache, RatesCache};
pub use staleness::{CacheData, CacheEntry, CacheStatus, FetchFn, StalenessCache};
pub use tokens::{token_cache, TokenCache, TokenQuerySource};
