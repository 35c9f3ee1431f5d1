//! Record sources: where pages of operations come from
//!
//! A source answers one [`OperationQuery`] with one [`Page`]. Pagination,
//! filtering and navigation live in [`crate::fetcher`]; sources only need to
//! honour the query's scope, order, cursor and limit.

pub mod horizon;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::record::{Cursor, Record};

pub use horizon::HorizonSource;
pub use memory::MemorySource;
pub use sqlite::SqliteSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

/// Which slice of the operation stream a query covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    All,
    Account(String),
    Transaction(String),
}

/// Request builder for one page of operations.
///
/// Scoping calls replace each other, so the last of `for_account` /
/// `for_transaction` wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationQuery {
    pub scope: Scope,
    pub limit: Option<u32>,
    pub order: Order,
    pub cursor: Option<Cursor>,
}

impl OperationQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_account(mut self, account: impl Into<String>) -> Self {
        self.scope = Scope::Account(account.into());
        self
    }

    pub fn for_transaction(mut self, tx: impl Into<String>) -> Self {
        self.scope = Scope::Transaction(tx.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub(crate) fn matches_scope(&self, record: &Record) -> bool {
        match &self.scope {
            Scope::All => true,
            Scope::Account(account) => record.source_account.as_deref() == Some(account.as_str()),
            Scope::Transaction(tx) => record.transaction_hash.as_deref() == Some(tx.as_str()),
        }
    }
}

/// Records returned by a single source call. Empty means the stream is
/// exhausted in the requested direction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub records: Vec<Record>,
}

impl Page {
    pub fn new(records: Vec<Record>) -> Self {
        Page { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_paging_token(&self) -> Option<&Cursor> {
        self.records.last().map(|r| &r.paging_token)
    }
}

/// Anything that can answer an [`OperationQuery`].
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn call(&self, query: &OperationQuery) -> Result<Page>;
}

#[async_trait]
impl<S: RecordSource + ?Sized> RecordSource for Arc<S> {
    async fn call(&self, query: &OperationQuery) -> Result<Page> {
        (**self).call(query).await
    }
}

#[async_trait]
impl<S: RecordSource + ?Sized> RecordSource for &S {
    async fn call(&self, query: &OperationQuery) -> Result<Page> {
        (**self).call(query).await
    }
}

/// Source selected at runtime from configuration.
pub enum AnySource {
    Horizon(HorizonSource),
    Sqlite(SqliteSource),
    Memory(MemorySource),
}

impl AnySource {
    pub fn kind(&self) -> &'static str {
        match self {
            AnySource::Horizon(_) => "horizon",
            AnySource::Sqlite(_) => "sqlite",
            AnySource::Memory(_) => "memory",
        }
    }
}

#[async_trait]
impl RecordSource for AnySource {
    async fn call(&self, query: &OperationQuery) -> Result<Page> {
        match self {
            AnySource::Horizon(s) => s.call(query).await,
            AnySource::Sqlite(s) => s.call(query).await,
            AnySource::Memory(s) => s.call(query).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_scope_call_wins() {
        let q = OperationQuery::new().for_transaction("abc").for_account("GABC");
        assert_eq!(q.scope, Scope::Account("GABC".to_string()));

        let q = OperationQuery::new().for_account("GABC").for_transaction("abc");
        assert_eq!(q.scope, Scope::Transaction("abc".to_string()));
    }

    #[test]
    fn test_page_last_paging_token() {
        let page = Page::new(vec![Record::new("a", "5", "payment"), Record::new("b", "3", "payment")]);
        assert_eq!(page.last_paging_token(), Some(&Cursor::new("3")));
        assert!(Page::default().last_paging_token().is_none());
    }
}
