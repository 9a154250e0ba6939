use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::normalize_key;

/// Currency constraint on a rule row. `Any` is the `ALL` wildcard in the
/// seeded rule table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RuleCurrency {
    Any,
    Code(String),
}

impl RuleCurrency {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") || trimmed == "*" {
            Self::Any
        } else {
            Self::Code(trimmed.to_ascii_uppercase())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Any => "ALL",
            Self::Code(code) => code,
        }
    }

    pub fn matches(&self, currency: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Code(code) => code.eq_ignore_ascii_case(currency.trim()),
        }
    }
}

/// One row of the approval rule table. Immutable reference data, consulted
/// only at submission time; the resolved workflow is frozen into approval
/// records afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRule {
    pub department: String,
    pub amount_min: Decimal,
    pub amount_max: Decimal,
    pub currency: RuleCurrency,
    pub level: u32,
    pub recipient: String,
}

impl ApprovalRule {
    /// Range match on amount is inclusive on both ends.
    pub fn matches(&self, department: &str, amount: Decimal, currency: &str) -> bool {
        normalize_key(&self.department) == normalize_key(department)
            && self.amount_min <= amount
            && amount <= self.amount_max
            && self.currency.matches(currency)
    }
}

/// A resolved (level, recipient) pair. Ordering is (level, recipient) so the
/// resolver output is deterministic.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResolvedWorkflowStep {
    pub level: u32,
    pub recipient: String,
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{ApprovalRule, RuleCurrency};

    fn rule(currency: RuleCurrency) -> ApprovalRule {
        ApprovalRule {
            department: "Logistics".to_string(),
            amount_min: Decimal::new(100_000, 2),
            amount_max: Decimal::new(500_000, 2),
            currency,
            level: 2,
            recipient: "controller@example.com".to_string(),
        }
    }

    #[test]
    fn amount_range_is_inclusive_on_both_ends() {
        let rule = rule(RuleCurrency::Any);
        assert!(rule.matches("Logistics", Decimal::new(100_000, 2), "USD"));
        assert!(rule.matches("Logistics", Decimal::new(500_000, 2), "USD"));
        assert!(!rule.matches("Logistics", Decimal::new(99_999, 2), "USD"));
        assert!(!rule.matches("Logistics", Decimal::new(500_001, 2), "USD"));
    }

    #[test]
    fn department_match_ignores_case_and_whitespace() {
        let rule = rule(RuleCurrency::Any);
        assert!(rule.matches(" logistics ", Decimal::new(200_000, 2), "EUR"));
        assert!(!rule.matches("HR", Decimal::new(200_000, 2), "EUR"));
    }

    #[test]
    fn wildcard_currency_matches_everything() {
        assert!(rule(RuleCurrency::Any).matches("Logistics", Decimal::new(200_000, 2), "JPY"));
        assert!(rule(RuleCurrency::Code("USD".to_string())).matches(
            "Logistics",
            Decimal::new(200_000, 2),
            "usd"
        ));
        assert!(!rule(RuleCurrency::Code("USD".to_string())).matches(
            "Logistics",
            Decimal::new(200_000, 2),
            "EUR"
        ));
    }

    #[test]
    fn parse_recognizes_the_all_wildcard() {
        assert_eq!(RuleCurrency::parse("ALL"), RuleCurrency::Any);
        assert_eq!(RuleCurrency::parse("all"), RuleCurrency::Any);
        assert_eq!(RuleCurrency::parse("usd"), RuleCurrency::Code("USD".to_string()));
        assert_eq!(RuleCurrency::parse("ALL").as_str(), "ALL");
    }
}
