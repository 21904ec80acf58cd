use sea_orm::DatabaseConnection;
use unicode_normalization::UnicodeNormalization;

use crate::{EngineError, ResultEngine};

mod categories;
mod expenses;
mod friends;
mod groups;
mod users;

pub use expenses::ExpenseListFilter;

/// Currency assigned to expenses that do not declare one.
pub(crate) const DEFAULT_CURRENCY: &str = "BRL";

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// One page of an owner-scoped listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

pub(crate) fn validate_page(page: u64, limit: u64) -> ResultEngine<()> {
    if page == 0 {
        return Err(EngineError::InvalidAmount("page must be >= 1".to_string()));
    }
    if limit == 0 || limit > 100 {
        return Err(EngineError::InvalidAmount(
            "limit must be between 1 and 100".to_string(),
        ));
    }
    Ok(())
}

/// Trim and NFC-normalize a required name-like field.
pub(crate) fn normalize_required_text(value: &str, what: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!("{what} must not be empty")));
    }
    Ok(trimmed.nfc().collect())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.nfc().collect())
}

/// Validate an ISO 4217-shaped currency code (3 ASCII uppercase letters).
pub(crate) fn validate_currency(code: &str) -> ResultEngine<String> {
    let trimmed = code.trim();
    if trimmed.len() != 3 || !trimmed.bytes().all(|b| b.is_ascii_uppercase()) {
        return Err(EngineError::InvalidName(format!(
            "invalid currency code: {code}"
        )));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
