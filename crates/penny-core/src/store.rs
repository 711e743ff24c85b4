//! Period-scoped transaction access used by the report pipeline

use crate::error::Result;
use crate::models::Transaction;
use crate::period::Period;

/// Source of transactions for a period.
///
/// Implementations return every transaction whose date falls inside the
/// period and report data-layer failures as `Error::StoreUnavailable`.
pub trait TransactionStore: Send + Sync {
    fn fetch(&self, period: &Period) -> Result<Vec<Transaction>>;
}

impl<T: TransactionStore + ?Sized> TransactionStore for std::sync::Arc<T> {
    fn fetch(&self, period: &Period) -> Result<Vec<Transaction>> {
        (**self).fetch(period)
    }
}

impl<T: TransactionStore + ?Sized> TransactionStore for &T {
    fn fetch(&self, period: &Period) -> Result<Vec<Transaction>> {
        (**self).fetch(period)
    }
}
