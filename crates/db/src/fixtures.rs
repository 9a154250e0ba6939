//! Reference-data bootstrap: the fixed rule table and the approver identities
//! derived from it. Runs once at process start and is safe to re-run; it
//! never duplicates rule rows or user identities. An existing identity is
//! raised to approver when its role ranks below that, and never lowered.

use rust_decimal::Decimal;
use uuid::Uuid;

use expenseflow_core::domain::rule::{ApprovalRule, RuleCurrency};
use expenseflow_core::domain::user::{Role, User, UserId};

use crate::repositories::{
    RepositoryError, RuleRepository, SqlRuleRepository, SqlUserRepository, UserRepository,
};
use crate::DbPool;

struct SeedRule {
    department: &'static str,
    amount_min: i64,
    amount_max: i64,
    currency: &'static str,
    level: u32,
    recipient: &'static str,
}

const AMOUNT_CAP: i64 = 1_000_000_000;

/// The canonical rule table. Per department, the level-1 ranges cover all
/// valid amounts; higher levels switch on at their thresholds.
const SEED_RULES: &[SeedRule] = &[
    SeedRule {
        department: "HR",
        amount_min: 0,
        amount_max: AMOUNT_CAP,
        currency: "ALL",
        level: 1,
        recipient: "hr.lead@expenseflow.dev",
    },
    SeedRule {
        department: "Logistics",
        amount_min: 0,
        amount_max: AMOUNT_CAP,
        currency: "ALL",
        level: 1,
        recipient: "logistics.lead@expenseflow.dev",
    },
    SeedRule {
        department: "Logistics",
        amount_min: 1_000,
        amount_max: AMOUNT_CAP,
        currency: "ALL",
        level: 2,
        recipient: "finance.controller@expenseflow.dev",
    },
    SeedRule {
        department: "Logistics",
        amount_min: 5_000,
        amount_max: AMOUNT_CAP,
        currency: "ALL",
        level: 3,
        recipient: "cfo@expenseflow.dev",
    },
    SeedRule {
        department: "IT",
        amount_min: 0,
        amount_max: AMOUNT_CAP,
        currency: "ALL",
        level: 1,
        recipient: "it.lead@expenseflow.dev",
    },
    SeedRule {
        department: "IT",
        amount_min: 2_000,
        amount_max: AMOUNT_CAP,
        currency: "ALL",
        level: 2,
        recipient: "finance.controller@expenseflow.dev",
    },
];

/// The seeded rule table as domain values.
pub fn default_rules() -> Vec<ApprovalRule> {
    SEED_RULES
        .iter()
        .map(|seed| ApprovalRule {
            department: seed.department.to_string(),
            amount_min: Decimal::from(seed.amount_min),
            amount_max: Decimal::from(seed.amount_max),
            currency: RuleCurrency::parse(seed.currency),
            level: seed.level,
            recipient: seed.recipient.to_string(),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeedReport {
    pub rules_seeded: usize,
    pub approvers_created: usize,
    pub approvers_promoted: usize,
}

/// Clear and repopulate the rule table, then ensure every distinct rule
/// recipient holds at least an approver-role identity. Missing identities
/// are created; existing ones are promoted when their role ranks below
/// approver and left alone otherwise, so an admin stays an admin.
pub async fn seed_reference_data(pool: &DbPool) -> Result<SeedReport, RepositoryError> {
    let rules = default_rules();
    let rule_repo = SqlRuleRepository::new(pool.clone());
    let user_repo = SqlUserRepository::new(pool.clone());

    rule_repo.replace_all(&rules).await?;

    let mut recipients: Vec<&str> = rules.iter().map(|rule| rule.recipient.as_str()).collect();
    recipients.sort();
    recipients.dedup();

    let mut approvers_created = 0;
    let mut approvers_promoted = 0;
    for recipient in recipients {
        match user_repo.find_by_email(recipient).await? {
            None => {
                user_repo
                    .insert(&User {
                        id: UserId(Uuid::new_v4().to_string()),
                        email: recipient.to_string(),
                        display_name: display_name_from_email(recipient),
                        role: Role::Approver,
                    })
                    .await?;
                approvers_created += 1;
            }
            Some(existing) if existing.role.rank() < Role::Approver.rank() => {
                user_repo.update_role(recipient, Role::Approver).await?;
                approvers_promoted += 1;
            }
            Some(_) => {}
        }
    }

    Ok(SeedReport { rules_seeded: rules.len(), approvers_created, approvers_promoted })
}

fn display_name_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let mut name = String::with_capacity(local.len());
    let mut capitalize = true;
    for ch in local.chars() {
        if ch == '.' || ch == '_' || ch == '-' {
            name.push(' ');
            capitalize = true;
        } else if capitalize {
            name.extend(ch.to_uppercase());
            capitalize = false;
        } else {
            name.push(ch);
        }
    }
    name
}
