//! In-memory record source
//!
//! Holds a fixed ledger of operations and answers queries the same way a
//! Horizon-style server would. Used by tests and by the `memory` source kind.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{OperationQuery, Order, Page, RecordSource};
use crate::error::{OpTableError, Result};
use crate::record::{OperationType, Record};

/// Default page size when a query carries no limit.
const DEFAULT_LIMIT: u32 = 10;

pub struct MemorySource {
    /// Ascending by paging token.
    records: RwLock<Vec<Record>>,
    calls: AtomicUsize,
    fail_on_call: Option<usize>,
}

impl MemorySource {
    pub fn new(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| a.paging_token.cmp(&b.paging_token));
        Self {
            records: RwLock::new(records),
            calls: AtomicUsize::new(0),
            fail_on_call: None,
        }
    }

    /// Deterministic sample ledger of `count` operations cycling through the
    /// known operation types, with paging tokens `1..=count`.
    pub fn sample(count: u64) -> Self {
        let records = (1..=count)
            .map(|i| {
                let op_type = OperationType::ALL[(i as usize - 1) % OperationType::ALL.len()];
                let mut record = Record::new(i.to_string(), i, op_type.as_str())
                    .with_source_account(format!("G{:055}", i % 7))
                    .with_transaction_hash(format!("{:064x}", i / 3))
                    .with_created_at(
                        chrono::DateTime::from_timestamp(1_700_000_000 + (i as i64) * 5, 0)
                            .map(|dt| dt.to_rfc3339())
                            .unwrap_or_default(),
                    );
                if op_type == OperationType::Payment {
                    record
                        .extra
                        .insert("amount".to_string(), format!("{}.0000000", i).into());
                    record
                        .extra
                        .insert("asset_type".to_string(), "native".into());
                }
                record
            })
            .collect();
        Self::new(records)
    }

    /// Make the `n`th call (1-based) fail with a source error.
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn push(&self, record: Record) {
        let mut records = self.records.write();
        let pos = records.partition_point(|r| r.paging_token <= record.paging_token);
        records.insert(pos, record);
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `call`s answered so far, failed ones included.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn select(&self, query: &OperationQuery) -> Vec<Record> {
        let records = self.records.read();
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT) as usize;
        let after_cursor = |r: &&Record| match &query.cursor {
            Some(c) if !c.is_start() => match query.order {
                Order::Asc => r.paging_token > *c,
                Order::Desc => r.paging_token < *c,
            },
            _ => true,
        };

        match query.order {
            Order::Asc => records
                .iter()
                .filter(|r| query.matches_scope(r))
                .filter(after_cursor)
                .take(limit)
                .cloned()
                .collect(),
            Order::Desc => records
                .iter()
                .rev()
                .filter(|r| query.matches_scope(r))
                .filter(after_cursor)
                .take(limit)
                .cloned()
                .collect(),
        }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn call(&self, query: &OperationQuery) -> Result<Page> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(n) {
            return Err(OpTableError::SourceError(format!(
                "simulated failure on call {}",
                n
            )));
        }
        Ok(Page::new(self.select(query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Cursor;

    fn tokens(page: &Page) -> Vec<String> {
        page.records
            .iter()
            .map(|r| r.paging_token.to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_desc_order_with_cursor() {
        let source = MemorySource::sample(20);
        let q = OperationQuery::new().order(Order::Desc).limit(3);

        let page = source.call(&q).await.unwrap();
        assert_eq!(tokens(&page), vec!["20", "19", "18"]);

        let page = source
            .call(&q.clone().cursor(Cursor::new("18")))
            .await
            .unwrap();
        assert_eq!(tokens(&page), vec!["17", "16", "15"]);
        assert_eq!(source.call_count(), 2);
    }

    #[tokio::test]
    async fn test_asc_order_and_exhaustion() {
        let source = MemorySource::sample(5);
        let q = OperationQuery::new().limit(10).cursor(Cursor::new("3"));
        let page = source.call(&q).await.unwrap();
        assert_eq!(tokens(&page), vec!["4", "5"]);

        let q = OperationQuery::new().cursor(Cursor::new("5"));
        assert!(source.call(&q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scope_filters() {
        let source = MemorySource::new(vec![
            Record::new("1", 1u64, "payment").with_source_account("GA"),
            Record::new("2", 2u64, "payment").with_source_account("GB"),
            Record::new("3", 3u64, "payment")
                .with_source_account("GA")
                .with_transaction_hash("t1"),
        ]);
        let page = source
            .call(&OperationQuery::new().for_account("GA"))
            .await
            .unwrap();
        assert_eq!(tokens(&page), vec!["1", "3"]);

        let page = source
            .call(&OperationQuery::new().for_transaction("t1"))
            .await
            .unwrap();
        assert_eq!(tokens(&page), vec!["3"]);
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let source = MemorySource::sample(5).failing_on_call(2);
        assert!(source.call(&OperationQuery::new()).await.is_ok());
        let err = source.call(&OperationQuery::new()).await.unwrap_err();
        assert!(matches!(err, OpTableError::SourceError(_)));
        assert!(source.call(&OperationQuery::new()).await.is_ok());
    }

    #[test]
    fn test_push_keeps_order() {
        let source = MemorySource::new(vec![Record::new("1", 1u64, "payment")]);
        source.push(Record::new("3", 3u64, "payment"));
        source.push(Record::new("2", 2u64, "payment"));
        let records = source.records.read();
        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }
}
