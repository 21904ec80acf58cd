//! Command structs for engine write operations.
//!
//! These types group parameters for the expense writes, keeping call sites
//! readable and avoiding long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{SplitLine, SplitStrategy};

/// Create an expense together with its split lines.
#[derive(Clone, Debug)]
pub struct ExpenseCreateCmd {
    pub owner_id: Uuid,
    pub description: String,
    pub amount_minor: i64,
    /// ISO 4217 code; defaults to `BRL` when `None`.
    pub currency: Option<String>,
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub strategy: SplitStrategy,
    pub lines: Vec<SplitLine>,
}

impl ExpenseCreateCmd {
    #[must_use]
    pub fn new(
        owner_id: Uuid,
        description: impl Into<String>,
        amount_minor: i64,
        date: NaiveDate,
        strategy: SplitStrategy,
    ) -> Self {
        Self {
            owner_id,
            description: description.into(),
            amount_minor,
            currency: None,
            date,
            category_id: None,
            group_id: None,
            strategy,
            lines: Vec::new(),
        }
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn group_id(mut self, group_id: Uuid) -> Self {
        self.group_id = Some(group_id);
        self
    }

    #[must_use]
    pub fn line(mut self, line: SplitLine) -> Self {
        self.lines.push(line);
        self
    }

    #[must_use]
    pub fn lines(mut self, lines: Vec<SplitLine>) -> Self {
        self.lines = lines;
        self
    }
}

/// Partially update an expense.
///
/// `None` leaves a field unchanged. The nullable references use a double
/// `Option`: `Some(None)` clears the field. Supplying `lines` replaces the
/// persisted split set wholesale after re-validation against the (possibly
/// updated) amount and strategy; leaving it `None` keeps the stored shares
/// untouched.
#[derive(Clone, Debug, Default)]
pub struct ExpenseUpdateCmd {
    pub owner_id: Uuid,
    pub expense_id: Uuid,
    pub description: Option<String>,
    pub amount_minor: Option<i64>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    pub category_id: Option<Option<Uuid>>,
    pub group_id: Option<Option<Uuid>>,
    pub strategy: Option<SplitStrategy>,
    pub lines: Option<Vec<SplitLine>>,
}

impl ExpenseUpdateCmd {
    #[must_use]
    pub fn new(owner_id: Uuid, expense_id: Uuid) -> Self {
        Self {
            owner_id,
            expense_id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn category_id(mut self, category_id: Option<Uuid>) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn group_id(mut self, group_id: Option<Uuid>) -> Self {
        self.group_id = Some(group_id);
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: SplitStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    #[must_use]
    pub fn lines(mut self, lines: Vec<SplitLine>) -> Self {
        self.lines = Some(lines);
        self
    }
}
