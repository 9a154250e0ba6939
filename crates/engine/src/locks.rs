//! Per-expense decision serialization.
//!
//! Approve/decline is a read-decide-write sequence; two concurrent decisions
//! on the same expense must not interleave or one mutation is lost. Each
//! expense id maps to its own async mutex so decisions on distinct expenses
//! never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Default)]
pub struct ExpenseLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ExpenseLocks {
    /// Take the lock for one expense, creating it on first use. The guard is
    /// owned so it can be held across awaits inside the decision path.
    /// Entries are never evicted; one map slot per expense ever decided on.
    pub async fn acquire(&self, expense_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(expense_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}
