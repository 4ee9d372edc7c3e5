//! Group-expense-splitting engine.
//!
//! The engine tracks, per group, a signed running balance for each member
//! and reduces that balance vector to the minimum set of point-to-point
//! payments needed to zero it out.
//!
//! The core pieces:
//! - [`money`]: integer-cent amounts and the rounded per-member share;
//! - [`ledger`]: the per-group balance vector with all-or-nothing deltas;
//! - [`split`]: expense event -> ledger delta (and its exact inverse);
//! - [`settle`]: balance vector -> minimal transfer list;
//! - [`Engine`]: persistence and per-group locking around all of the above.

pub use currency::Currency;
pub use error::EngineError;
pub use expenses::Expense;
pub use groups::Group;
pub use ledger::{BalanceEntry, BalanceStatus, Ledger};
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, ExpenseUpdate};
pub use settle::Transfer;
pub use settlements::Settlement;

mod currency;
mod error;
pub mod expenses;
pub mod groups;
pub mod ledger;
pub mod money;
mod ops;
pub mod settle;
pub mod settlements;
pub mod split;

type ResultEngine<T> = Result<T, EngineError>;
