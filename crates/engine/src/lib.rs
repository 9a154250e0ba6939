pub mod bootstrap;
pub mod locks;
pub mod service;

pub use bootstrap::{bootstrap, Application, BootstrapError};
pub use locks::ExpenseLocks;
pub use service::{ExpenseService, NewExpense};
