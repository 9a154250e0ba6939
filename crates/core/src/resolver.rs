use rust_decimal::Decimal;

use crate::domain::rule::{ApprovalRule, ResolvedWorkflowStep};
use crate::errors::WorkflowError;

/// Resolve a (department, amount, currency) triple against the rule table
/// snapshot into the ordered approval workflow.
///
/// Pure over the given rules: matching rows are projected to
/// (level, recipient), de-duplicated, and sorted ascending by level with ties
/// broken by recipient. An empty result means no approvers are configured;
/// the submit operation maps that to `NoWorkflowConfigured` rather than
/// letting an undefined max level through.
pub fn resolve(
    rules: &[ApprovalRule],
    department: &str,
    amount: Decimal,
    currency: &str,
) -> Result<Vec<ResolvedWorkflowStep>, WorkflowError> {
    validate_submission(department, amount, currency)?;

    let mut steps: Vec<ResolvedWorkflowStep> = rules
        .iter()
        .filter(|rule| rule.matches(department, amount, currency))
        .map(|rule| ResolvedWorkflowStep { level: rule.level, recipient: rule.recipient.clone() })
        .collect();

    steps.sort();
    steps.dedup();
    Ok(steps)
}

pub fn validate_submission(
    department: &str,
    amount: Decimal,
    currency: &str,
) -> Result<(), WorkflowError> {
    if department.trim().is_empty() {
        return Err(WorkflowError::Validation("department must not be empty".to_string()));
    }
    if currency.trim().is_empty() {
        return Err(WorkflowError::Validation("currency must not be empty".to_string()));
    }
    if amount <= Decimal::ZERO {
        return Err(WorkflowError::Validation(format!(
            "amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

/// Highest level across the resolved steps. `None` for an empty workflow.
pub fn max_level(steps: &[ResolvedWorkflowStep]) -> Option<u32> {
    steps.iter().map(|step| step.level).max()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::rule::{ApprovalRule, RuleCurrency};
    use crate::errors::WorkflowError;

    use super::{max_level, resolve};

    fn rule(
        department: &str,
        min: i64,
        max: i64,
        currency: RuleCurrency,
        level: u32,
        recipient: &str,
    ) -> ApprovalRule {
        ApprovalRule {
            department: department.to_string(),
            amount_min: Decimal::new(min, 0),
            amount_max: Decimal::new(max, 0),
            currency,
            level,
            recipient: recipient.to_string(),
        }
    }

    fn rule_table() -> Vec<ApprovalRule> {
        vec![
            rule("Logistics", 5000, 100_000, RuleCurrency::Any, 3, "cfo@example.com"),
            rule("Logistics", 1000, 100_000, RuleCurrency::Any, 2, "controller@example.com"),
            rule("Logistics", 0, 100_000, RuleCurrency::Any, 1, "logistics.lead@example.com"),
            rule("HR", 0, 100_000, RuleCurrency::Code("USD".to_string()), 1, "hr.lead@example.com"),
        ]
    }

    #[test]
    fn steps_are_sorted_by_level_then_recipient() {
        let steps = resolve(&rule_table(), "Logistics", Decimal::new(6000, 0), "USD")
            .expect("resolution should succeed");

        let levels: Vec<u32> = steps.iter().map(|step| step.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(steps[0].recipient, "logistics.lead@example.com");
        assert_eq!(max_level(&steps), Some(3));
    }

    #[test]
    fn amount_thresholds_select_fewer_levels() {
        let two = resolve(&rule_table(), "Logistics", Decimal::new(2500, 0), "USD")
            .expect("resolution should succeed");
        assert_eq!(two.len(), 2);

        let one = resolve(&rule_table(), "Logistics", Decimal::new(500, 0), "USD")
            .expect("resolution should succeed");
        assert_eq!(one.len(), 1);
    }

    #[test]
    fn resolution_is_deterministic() {
        let first = resolve(&rule_table(), "Logistics", Decimal::new(6000, 0), "USD")
            .expect("first resolution");
        let second = resolve(&rule_table(), "Logistics", Decimal::new(6000, 0), "USD")
            .expect("second resolution");
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_rule_rows_collapse_to_one_step() {
        let mut rules = rule_table();
        rules.push(rule("Logistics", 0, 100_000, RuleCurrency::Any, 1, "logistics.lead@example.com"));

        let steps = resolve(&rules, "Logistics", Decimal::new(500, 0), "USD")
            .expect("resolution should succeed");
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn currency_specific_rule_does_not_match_other_currencies() {
        let steps = resolve(&rule_table(), "HR", Decimal::new(500, 0), "EUR")
            .expect("resolution should succeed");
        assert!(steps.is_empty());
    }

    #[test]
    fn unknown_department_resolves_to_empty() {
        let steps = resolve(&rule_table(), "Marketing", Decimal::new(500, 0), "USD")
            .expect("resolution should succeed");
        assert!(steps.is_empty());
    }

    #[test]
    fn rejects_non_positive_amount() {
        let error = resolve(&rule_table(), "HR", Decimal::ZERO, "USD")
            .expect_err("zero amount should fail");
        assert!(matches!(error, WorkflowError::Validation(_)));

        let error = resolve(&rule_table(), "HR", Decimal::new(-100, 0), "USD")
            .expect_err("negative amount should fail");
        assert!(matches!(error, WorkflowError::Validation(_)));
    }

    #[test]
    fn rejects_blank_identifiers() {
        let error = resolve(&rule_table(), "  ", Decimal::new(100, 0), "USD")
            .expect_err("blank department should fail");
        assert!(matches!(error, WorkflowError::Validation(_)));

        let error = resolve(&rule_table(), "HR", Decimal::new(100, 0), "")
            .expect_err("blank currency should fail");
        assert!(matches!(error, WorkflowError::Validation(_)));
    }
}
