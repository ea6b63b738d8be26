// 🔎 Filter & Search Engine
//
// Filter options live in mutually exclusive groups (radio buttons per group).
// Selected options combine as a UNION across groups: every selected option
// contributes its matches in selection order, then the result is deduplicated
// by coin identity keeping the first occurrence.

use crate::coin::Coin;
use serde::{Deserialize, Serialize};

pub const ACTIVE_COINS: &str = "Active Coins";
pub const INACTIVE_COINS: &str = "Inactive Coins";
pub const ONLY_TOKENS: &str = "Only Tokens";
pub const ONLY_COINS: &str = "Only Coins";
pub const NEW_COINS: &str = "New Coins";

// ============================================================================
// FILTER KIND (predicate)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Active,
    Inactive,
    OnlyTokens,
    OnlyCoins,
    NewCoins,
}

impl FilterKind {
    pub fn matches(&self, coin: &Coin) -> bool {
        match self {
            FilterKind::Active => coin.is_active,
            FilterKind::Inactive => !coin.is_active,
            FilterKind::OnlyTokens => coin.is_token(),
            FilterKind::OnlyCoins => coin.is_coin(),
            FilterKind::NewCoins => coin.is_new,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            FilterKind::Active => ACTIVE_COINS,
            FilterKind::Inactive => INACTIVE_COINS,
            FilterKind::OnlyTokens => ONLY_TOKENS,
            FilterKind::OnlyCoins => ONLY_COINS,
            FilterKind::NewCoins => NEW_COINS,
        }
    }

    /// Parse a title ("Active Coins") or a short name ("active", "only-tokens").
    pub fn parse(s: &str) -> Option<FilterKind> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "active" | "active_coins" => Some(FilterKind::Active),
            "inactive" | "inactive_coins" => Some(FilterKind::Inactive),
            "tokens" | "only_tokens" => Some(FilterKind::OnlyTokens),
            "coins" | "only_coins" => Some(FilterKind::OnlyCoins),
            "new" | "new_coins" => Some(FilterKind::NewCoins),
            _ => None,
        }
    }
}

// ============================================================================
// FILTER OPTION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    pub title: String,
    pub group_id: u32,
    pub selected: bool,
    pub kind: FilterKind,
}

impl FilterOption {
    pub fn new(kind: FilterKind, group_id: u32) -> Self {
        FilterOption {
            title: kind.title().to_string(),
            group_id,
            selected: false,
            kind,
        }
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

// ============================================================================
// FILTER PANEL (selection state machine)
// ============================================================================

/// The fixed set of filter options shown to the user.
#[derive(Debug, Clone, Serialize)]
pub struct FilterPanel {
    options: Vec<FilterOption>,
}

impl FilterPanel {
    pub fn new(options: Vec<FilterOption>) -> Self {
        FilterPanel { options }
    }

    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    /// Tap on an option.
    ///
    /// selected   → unselected
    /// unselected → selected, every other option of the same group unselected
    ///
    /// Returns the selected options in panel order. Out-of-range index is a no-op.
    pub fn toggle(&mut self, index: usize) -> Vec<FilterOption> {
        let Some(option) = self.options.get(index) else {
            return self.selected();
        };

        if option.selected {
            self.options[index].selected = false;
        } else {
            let group_id = option.group_id;
            for opt in self.options.iter_mut().filter(|o| o.group_id == group_id) {
                opt.selected = false;
            }
            self.options[index].selected = true;
        }

        self.selected()
    }

    /// Toggle the first option with the given kind.
    pub fn toggle_kind(&mut self, kind: FilterKind) -> Vec<FilterOption> {
        match self.options.iter().position(|o| o.kind == kind) {
            Some(index) => self.toggle(index),
            None => self.selected(),
        }
    }

    pub fn selected(&self) -> Vec<FilterOption> {
        self.options.iter().filter(|o| o.selected).cloned().collect()
    }

    pub fn has_selection(&self) -> bool {
        self.options.iter().any(|o| o.selected)
    }

    pub fn reset(&mut self) {
        for opt in self.options.iter_mut() {
            opt.selected = false;
        }
    }
}

impl Default for FilterPanel {
    /// Active/Inactive share group 1, Tokens/Coins share group 2, New stands alone.
    fn default() -> Self {
        FilterPanel::new(vec![
            FilterOption::new(FilterKind::Active, 1),
            FilterOption::new(FilterKind::Inactive, 1),
            FilterOption::new(FilterKind::OnlyTokens, 2),
            FilterOption::new(FilterKind::OnlyCoins, 2),
            FilterOption::new(FilterKind::NewCoins, 3),
        ])
    }
}

// ============================================================================
// FILTERING
// ============================================================================

/// Union of each selected option's matches in selection order, deduplicated.
/// No selection returns `all` unchanged.
pub fn apply_filters(all: &[Coin], selected: &[FilterOption]) -> Vec<Coin> {
    if selected.is_empty() {
        return all.to_vec();
    }

    let mut output = Vec::new();
    for option in selected {
        output.extend(all.iter().filter(|c| option.kind.matches(c)).cloned());
    }

    remove_duplicates(output)
}

/// Stable dedup by identity equality; first occurrence wins.
pub fn remove_duplicates(coins: Vec<Coin>) -> Vec<Coin> {
    let mut unique: Vec<Coin> = Vec::with_capacity(coins.len());

    for coin in coins {
        if !unique.iter().any(|u| u.same_identity(&coin)) {
            unique.push(coin);
        }
    }

    unique
}

/// Narrow `displayed` by a case-insensitive substring on name or symbol.
/// An empty query resets to `all`, not to `displayed`.
pub fn search(all: &[Coin], displayed: &[Coin], query: &str) -> Vec<Coin> {
    if query.is_empty() {
        return all.to_vec();
    }

    let query_lower = query.to_lowercase();
    displayed
        .iter()
        .filter(|c| c.matches_query(&query_lower))
        .cloned()
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coin::tests::{create_test_coin, sample_coins};

    fn names(coins: &[Coin]) -> Vec<&str> {
        coins.iter().map(|c| c.display_name()).collect()
    }

    #[test]
    fn test_no_selection_is_identity() {
        let all = sample_coins();
        let result = apply_filters(&all, &[]);
        assert_eq!(names(&result), vec!["Bitcoin", "Ethereum", "Tether"]);
    }

    #[test]
    fn test_filter_by_active() {
        let all = sample_coins();
        let selected = vec![FilterOption::new(FilterKind::Active, 1).selected()];

        let result = apply_filters(&all, &selected);

        assert_eq!(names(&result), vec!["Bitcoin", "Ethereum"]);
    }

    #[test]
    fn test_only_coins_and_active_dedups() {
        let all = sample_coins();
        let selected = vec![
            FilterOption::new(FilterKind::OnlyCoins, 2).selected(),
            FilterOption::new(FilterKind::Active, 1).selected(),
        ];

        let result = apply_filters(&all, &selected);

        assert_eq!(names(&result), vec!["Bitcoin", "Ethereum"]);
    }

    #[test]
    fn test_filters_union_across_groups() {
        // Active ∪ Only Tokens, not Active ∩ Only Tokens
        let all = sample_coins();
        let selected = vec![
            FilterOption::new(FilterKind::Active, 1).selected(),
            FilterOption::new(FilterKind::OnlyTokens, 2).selected(),
        ];

        let result = apply_filters(&all, &selected);

        assert_eq!(names(&result), vec!["Bitcoin", "Ethereum", "Tether"]);
    }

    #[test]
    fn test_union_keeps_selection_order() {
        let all = sample_coins();
        let selected = vec![
            FilterOption::new(FilterKind::Inactive, 1).selected(),
            FilterOption::new(FilterKind::NewCoins, 3).selected(),
        ];

        let result = apply_filters(&all, &selected);

        assert_eq!(names(&result), vec!["Tether", "Ethereum"]);
    }

    #[test]
    fn test_type_predicates_case_insensitive() {
        let all = vec![
            create_test_coin("Bitcoin", "BTC", false, true, "COIN"),
            create_test_coin("Uni", "UNI", false, true, "Token"),
            Coin::new(Some("Nameless"), None, false, true, None),
        ];

        let tokens = apply_filters(&all, &[FilterOption::new(FilterKind::OnlyTokens, 2).selected()]);
        let coins = apply_filters(&all, &[FilterOption::new(FilterKind::OnlyCoins, 2).selected()]);

        assert_eq!(names(&tokens), vec!["Uni"]);
        assert_eq!(names(&coins), vec!["Bitcoin"]);
    }

    #[test]
    fn test_remove_duplicates_first_occurrence_wins() {
        let first = create_test_coin("Bitcoin", "BTC", false, true, "coin");
        let mut later = create_test_coin("Bitcoin", "BTC", true, false, "coin");
        later.derive_display_state();
        let other = create_test_coin("Ethereum", "ETH", false, true, "coin");

        let result = remove_duplicates(vec![first, other, later]);

        assert_eq!(result.len(), 2);
        assert_eq!(names(&result), vec!["Bitcoin", "Ethereum"]);
        assert!(result[0].is_active);
        for (i, a) in result.iter().enumerate() {
            for b in &result[i + 1..] {
                assert!(!a.same_identity(b));
            }
        }
    }

    #[test]
    fn test_search_by_name() {
        let all = sample_coins();
        let result = search(&all, &all, "Tether");
        assert_eq!(names(&result), vec!["Tether"]);
    }

    #[test]
    fn test_search_by_symbol_case_insensitive() {
        let all = sample_coins();
        let result = search(&all, &all, "btc");
        assert_eq!(names(&result), vec!["Bitcoin"]);
    }

    #[test]
    fn test_search_narrows_displayed_list() {
        let all = sample_coins();
        let displayed = apply_filters(&all, &[FilterOption::new(FilterKind::Active, 1).selected()]);

        // Tether exists in all but not in displayed
        assert!(search(&all, &displayed, "usdt").is_empty());
        assert_eq!(names(&search(&all, &displayed, "eth")), vec!["Ethereum"]);
    }

    #[test]
    fn test_empty_search_resets_to_all() {
        let all = sample_coins();
        let displayed = apply_filters(&all, &[FilterOption::new(FilterKind::Inactive, 1).selected()]);

        let result = search(&all, &displayed, "");

        assert_eq!(names(&result), vec!["Bitcoin", "Ethereum", "Tether"]);
    }

    #[test]
    fn test_toggle_same_group_is_exclusive() {
        let mut panel = FilterPanel::default();

        panel.toggle(0); // Active
        let selected = panel.toggle(1); // Inactive, same group

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].kind, FilterKind::Inactive);
        assert_eq!(panel.options().iter().filter(|o| o.group_id == 1 && o.selected).count(), 1);
    }

    #[test]
    fn test_toggle_selected_deselects() {
        let mut panel = FilterPanel::default();

        panel.toggle(2);
        let selected = panel.toggle(2);

        assert!(selected.is_empty());
        assert!(!panel.has_selection());
    }

    #[test]
    fn test_toggle_across_groups_keeps_both() {
        let mut panel = FilterPanel::default();

        panel.toggle_kind(FilterKind::NewCoins);
        let selected = panel.toggle_kind(FilterKind::Active);

        // Returned in panel order, not tap order
        let kinds: Vec<FilterKind> = selected.iter().map(|o| o.kind).collect();
        assert_eq!(kinds, vec![FilterKind::Active, FilterKind::NewCoins]);
    }

    #[test]
    fn test_toggle_out_of_range_is_noop() {
        let mut panel = FilterPanel::default();
        panel.toggle(4);

        let selected = panel.toggle(99);

        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].kind, FilterKind::NewCoins);
    }

    #[test]
    fn test_reset_clears_all() {
        let mut panel = FilterPanel::default();
        panel.toggle(0);
        panel.toggle(3);
        panel.toggle(4);

        panel.reset();

        assert!(panel.selected().is_empty());
    }

    #[test]
    fn test_parse_filter_names() {
        assert_eq!(FilterKind::parse("Active Coins"), Some(FilterKind::Active));
        assert_eq!(FilterKind::parse("only-tokens"), Some(FilterKind::OnlyTokens));
        assert_eq!(FilterKind::parse("NEW"), Some(FilterKind::NewCoins));
        assert_eq!(FilterKind::parse("bogus"), None);
    }
}
