//! # Shared Utility Functions
//!
//! Display helpers used by the engine's log fields and by UI consumers.
//!
//! ```rust
//! use shared::utils::{format_address, short_hash};
//!
//! let address = "0x52908400098527886E0F7030069857D2E4169EE7";
//! assert_eq!(format_address(address, 6, 4), "0x5290...9EE7");
//! assert_eq!(short_hash("0xabcdef0123456789"), "0xabcd...6789");
//! ```

/// Show the first `prefix_len` and last `suffix_len` characters of an address.
///
/// Returned unchanged when it is too short to shorten. Works on characters,
/// not bytes, so a malformed non-ASCII value never panics.
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    let len = chars.len();

    if len <= prefix_len + suffix_len {
        return address.to_string();
    }

    let prefix: String = chars[..prefix_len].iter().collect();
    let suffix: String = chars[len - suffix_len..].iter().collect();

    format!("{}...{}", prefix, suffix)
}

/// Wallet address with the `0x` prefix plus 4 characters on each side.
pub fn truncate_address(address: &str) -> String {
    format_address(address, 6, 4)
}

/// Transaction hash shortened for log lines and toasts.
pub fn short_hash(hash: &str) -> String {
    format_address(hash, 6, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_address() {
        let addr = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert_eq!(format_address(addr, 6, 4), "0x5290...9EE7");
        assert_eq!(format_address(addr, 2, 2), "0x...E7");
    }

    #[test]
    fn test_format_address_short() {
        assert_eq!(format_address("short", 4, 4), "short");
        assert_eq!(format_address("0xab", 6, 4), "0xab");
    }

    #[test]
    fn test_format_address_non_ascii_does_not_panic() {
        assert_eq!(format_address("ääääääääää", 2, 2), "ää...ää");
    }

    #[test]
    fn test_truncate_address() {
        let addr = "0x52908400098527886E0F7030069857D2E4169EE7";
        assert_eq!(truncate_address(addr), "0x5290...9EE7");
    }
}
