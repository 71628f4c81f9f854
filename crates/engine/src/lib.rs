//! Budget reconciliation engine of the basket shopping list manager.
//!
//! The engine keeps three things in step for every list: the purchase state
//! of its items, the remaining value of its [`Budget`] and the entries of the
//! [`ExpenseMirror`]. The database is the store of record; the mirror is a
//! cache that [`Engine::reconcile`] can rebuild at any time.

pub use budgets::Budget;
pub use error::EngineError;
pub use items::Item;
pub use lists::{List, ListKind, ListWithBudget};
pub use mirror::{ExpenseMirror, JsonFileMirror, MemoryMirror, MirrorEntry};
pub use money::MoneyCents;
pub use observer::{EngineObserver, NoopObserver};
pub use ops::{
    Engine, EngineBuilder, ExpenseSummary, FieldPatch, ItemPatch, ListEdit, NewItem, NewList,
    ReconcileReport, ToggleOutcome,
};
pub use purchase::{PurchaseState, TogglePlan};
pub use quantity::Quantity;

mod budgets;
mod error;
mod items;
mod lists;
mod locks;
mod mirror;
mod money;
mod observer;
mod ops;
mod purchase;
mod quantity;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
