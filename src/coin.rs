// 🪙 Coin model - business fields + derived display state
//
// Business fields (name, symbol, is_new, is_active, type) come off the wire
// and never change. Display fields are recomputed on every reconciliation
// pass and never persisted.

use serde::{Deserialize, Serialize};

// ============================================================================
// DISPLAY STATE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    #[default]
    None,
    Gray,
}

/// Icon keys understood by the presentation layer
pub const ICON_ACTIVE_COIN: &str = "activeCoin";
pub const ICON_ACTIVE_TOKEN: &str = "activeToken";
pub const ICON_INACTIVE_COIN: &str = "inActiveCoin";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DisplayState {
    /// None until a derivation branch matched
    pub image_key: Option<String>,
    pub badge_color: BadgeColor,
    pub show_badge: bool,
}

// ============================================================================
// COIN
// ============================================================================

/// A tradable asset entry (coin or token).
///
/// `PartialEq` is identity equality: `name`, `symbol` and `type` only.
/// Use [`Coin::same_state`] when every field matters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub is_new: bool,
    pub is_active: bool,
    #[serde(rename = "type")]
    pub coin_type: Option<String>,

    #[serde(skip)]
    pub display: DisplayState,
}

impl Coin {
    pub fn new(
        name: Option<&str>,
        symbol: Option<&str>,
        is_new: bool,
        is_active: bool,
        coin_type: Option<&str>,
    ) -> Self {
        Coin {
            name: name.map(str::to_string),
            symbol: symbol.map(str::to_string),
            is_new,
            is_active,
            coin_type: coin_type.map(str::to_string),
            display: DisplayState::default(),
        }
    }

    /// Same coin: business identity only (name, symbol, type).
    pub fn same_identity(&self, other: &Coin) -> bool {
        self.name == other.name && self.symbol == other.symbol && self.coin_type == other.coin_type
    }

    /// Same coin state: every field, display state included.
    pub fn same_state(&self, other: &Coin) -> bool {
        self.same_identity(other)
            && self.is_new == other.is_new
            && self.is_active == other.is_active
            && self.display == other.display
    }

    /// Case-insensitive type check, `None` never matches.
    pub fn is_type(&self, expected: &str) -> bool {
        self.coin_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case(expected))
            .unwrap_or(false)
    }

    pub fn is_coin(&self) -> bool {
        self.is_type("coin")
    }

    pub fn is_token(&self) -> bool {
        self.is_type("token")
    }

    /// Recompute the display fields from the business fields.
    ///
    /// First matching branch wins:
    ///   active coin  → activeCoin, no badge
    ///   active token → activeToken, no badge
    ///   inactive     → inActiveCoin, gray badge
    ///   new          → activeToken, badge shown
    /// When nothing matches the previous display state is left untouched.
    pub fn derive_display_state(&mut self) {
        if self.is_coin() && self.is_active {
            self.set_display(ICON_ACTIVE_COIN, BadgeColor::None, false);
        } else if self.is_token() && self.is_active {
            self.set_display(ICON_ACTIVE_TOKEN, BadgeColor::None, false);
        } else if !self.is_active {
            self.set_display(ICON_INACTIVE_COIN, BadgeColor::Gray, true);
        } else if self.is_new {
            self.set_display(ICON_ACTIVE_TOKEN, BadgeColor::None, true);
        }
    }

    fn set_display(&mut self, image_key: &str, badge_color: BadgeColor, show_badge: bool) {
        self.display = DisplayState {
            image_key: Some(image_key.to_string()),
            badge_color,
            show_badge,
        };
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn display_symbol(&self) -> &str {
        self.symbol.as_deref().unwrap_or("")
    }

    /// Case-insensitive substring match on name or symbol.
    /// `query_lower` must already be lowercased.
    pub fn matches_query(&self, query_lower: &str) -> bool {
        self.display_name().to_lowercase().contains(query_lower)
            || self.display_symbol().to_lowercase().contains(query_lower)
    }
}

impl PartialEq for Coin {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

/// Derive display state for every coin, in list order.
pub fn derive_display_states(coins: &mut [Coin]) {
    for coin in coins.iter_mut() {
        coin.derive_display_state();
    }
}

/// Order-sensitive, element-wise comparison using every field.
/// This is the change-detection comparison; dedup uses identity.
pub fn lists_same_state(a: &[Coin], b: &[Coin]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_state(y))
}

/// Decode the remote wire payload (`name`, `symbol`, `is_new`, `is_active`, `type`).
pub fn decode_coins(payload: &[u8]) -> serde_json::Result<Vec<Coin>> {
    serde_json::from_slice(payload)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn create_test_coin(
        name: &str,
        symbol: &str,
        is_new: bool,
        is_active: bool,
        coin_type: &str,
    ) -> Coin {
        Coin::new(Some(name), Some(symbol), is_new, is_active, Some(coin_type))
    }

    pub(crate) fn sample_coins() -> Vec<Coin> {
        vec![
            create_test_coin("Bitcoin", "BTC", false, true, "coin"),
            create_test_coin("Ethereum", "ETH", true, true, "coin"),
            create_test_coin("Tether", "USDT", false, false, "token"),
        ]
    }

    #[test]
    fn test_identity_equality_ignores_flags_and_display() {
        let mut a = create_test_coin("Bitcoin", "BTC", false, true, "coin");
        let b = create_test_coin("Bitcoin", "BTC", true, false, "coin");
        a.derive_display_state();

        assert_eq!(a, b);
        assert!(a.same_identity(&b));
        assert!(!a.same_state(&b));
    }

    #[test]
    fn test_identity_differs_on_type() {
        let a = create_test_coin("Polygon", "MATIC", false, true, "coin");
        let b = create_test_coin("Polygon", "MATIC", false, true, "token");
        assert_ne!(a, b);
    }

    #[test]
    fn test_derive_active_coin_and_token() {
        let mut coin = create_test_coin("Bitcoin", "BTC", false, true, "COIN");
        coin.derive_display_state();
        assert_eq!(coin.display.image_key.as_deref(), Some(ICON_ACTIVE_COIN));
        assert_eq!(coin.display.badge_color, BadgeColor::None);
        assert!(!coin.display.show_badge);

        let mut token = create_test_coin("Chainlink", "LINK", true, true, "Token");
        token.derive_display_state();
        assert_eq!(token.display.image_key.as_deref(), Some(ICON_ACTIVE_TOKEN));
        assert!(!token.display.show_badge);
    }

    #[test]
    fn test_derive_inactive_wins_over_new() {
        let mut coin = create_test_coin("Ghost", "GST", true, false, "coin");
        coin.derive_display_state();

        assert_eq!(coin.display.image_key.as_deref(), Some(ICON_INACTIVE_COIN));
        assert_eq!(coin.display.badge_color, BadgeColor::Gray);
        assert!(coin.display.show_badge);
    }

    #[test]
    fn test_derive_new_with_unknown_type() {
        let mut coin = create_test_coin("Mystery", "MYS", true, true, "nft");
        coin.derive_display_state();

        assert_eq!(coin.display.image_key.as_deref(), Some(ICON_ACTIVE_TOKEN));
        assert_eq!(coin.display.badge_color, BadgeColor::None);
        assert!(coin.display.show_badge);
    }

    #[test]
    fn test_derive_no_branch_leaves_display_unset() {
        let mut coin = Coin::new(Some("Plain"), Some("PLN"), false, true, None);
        coin.derive_display_state();

        assert_eq!(coin.display, DisplayState::default());
    }

    #[test]
    fn test_lists_same_state_is_order_sensitive() {
        let coins = sample_coins();
        let mut reversed = coins.clone();
        reversed.reverse();

        assert!(lists_same_state(&coins, &coins.clone()));
        assert!(!lists_same_state(&coins, &reversed));
        assert!(!lists_same_state(&coins, &coins[..2]));
    }

    #[test]
    fn test_lists_same_state_detects_flag_change() {
        let coins = sample_coins();
        let mut changed = coins.clone();
        changed[2].is_active = true;

        assert!(!lists_same_state(&coins, &changed));
    }

    #[test]
    fn test_decode_wire_payload() {
        let payload = br#"[
            {"name": "Bitcoin", "symbol": "BTC", "is_new": false, "is_active": true, "type": "coin"},
            {"name": null, "symbol": "XYZ", "is_new": true, "is_active": false, "type": "token"}
        ]"#;

        let coins = decode_coins(payload).unwrap();

        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0].name.as_deref(), Some("Bitcoin"));
        assert!(coins[0].is_active);
        assert_eq!(coins[1].name, None);
        assert!(coins[1].is_token());
        assert_eq!(coins[1].display, DisplayState::default());
    }

    #[test]
    fn test_serialize_skips_display_state() {
        let mut coin = create_test_coin("Bitcoin", "BTC", false, true, "coin");
        coin.derive_display_state();

        let json = serde_json::to_value(&coin).unwrap();

        assert_eq!(json["type"], "coin");
        assert_eq!(json["is_active"], true);
        assert!(json.get("display").is_none());
    }

    #[test]
    fn test_matches_query_name_or_symbol() {
        let coin = create_test_coin("Tether", "USDT", false, false, "token");
        assert!(coin.matches_query("teth"));
        assert!(coin.matches_query("usd"));
        assert!(!coin.matches_query("btc"));
    }
}
