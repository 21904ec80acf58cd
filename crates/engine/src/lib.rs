//! Divvy engine: expense tracking with validated, exactly-balanced splits.
//!
//! The heart of the crate is the split engine: given an expense total, a
//! [`SplitStrategy`] and a list of [`SplitLine`]s, [`compute_splits`]
//! produces per-participant [`ComputedShare`]s that sum exactly to the
//! total, or a typed validation failure.
//!
//! [`Engine`] wraps the split computation with persistence: owner-scoped CRUD
//! for friends, categories, groups and expenses, where every split set is
//! written (and rewritten) atomically with its parent expense.

pub use categories::Category;
pub use commands::{ExpenseCreateCmd, ExpenseUpdateCmd};
pub use error::EngineError;
pub use expense_splits::ExpenseShare;
pub use expenses::Expense;
pub use friends::Friend;
pub use groups::Group;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, ExpenseListFilter, Page};
pub use percent::Percent;
pub use split::{
    ComputedShare, FriendAccess, ParticipantKind, ParticipantRef, ParticipantResolver,
    SplitError, SplitLine, SplitStrategy, compute_splits,
};
pub use users::User;

mod categories;
mod commands;
mod error;
mod expense_splits;
mod expenses;
mod friends;
mod groups;
mod money;
mod ops;
mod percent;
mod split;
mod users;

pub type ResultEngine<T> = Result<T, EngineError>;
