//! SQLite-backed record source
//!
//! Keeps a local copy of operations so the table can be browsed offline.
//! Paging tokens must be integers here; they double as the sort key.

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, types::Value as SqlValue, Connection};
use std::sync::Mutex;

use super::{OperationQuery, Order, Page, RecordSource, Scope};
use crate::error::{OpTableError, Result};
use crate::record::Record;

const DEFAULT_LIMIT: u32 = 10;

pub struct SqliteSource {
    conn: Mutex<Connection>,
}

impl SqliteSource {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .map_err(|e| OpTableError::DatabaseError(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| OpTableError::DatabaseError(format!("Failed to open database: {}", e)))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS operations (
                paging_token INTEGER PRIMARY KEY,
                id TEXT NOT NULL,
                op_type TEXT NOT NULL,
                source_account TEXT,
                transaction_hash TEXT,
                body TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            OpTableError::DatabaseError(format!("Failed to create operations table: {}", e))
        })?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS operations_by_account ON operations (source_account)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS operations_by_tx ON operations (transaction_hash)",
            [],
        )?;

        Ok(SqliteSource {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace records, all in one transaction. Returns the number
    /// of rows written.
    pub fn insert_records(&self, records: &[Record]) -> Result<usize> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| OpTableError::DatabaseError("Mutex poisoned".to_string()))?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO operations
                    (paging_token, id, op_type, source_account, transaction_hash, body)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for record in records {
                let token = paging_key(record)?;
                let body = serde_json::to_string(record)?;
                stmt.execute(params![
                    token,
                    record.id,
                    record.op_type,
                    record.source_account,
                    record.transaction_hash,
                    body
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    pub fn count(&self) -> Result<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| OpTableError::DatabaseError("Mutex poisoned".to_string()))?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM operations", [], |row| row.get(0))?;
        Ok(n as usize)
    }

    fn select(&self, query: &OperationQuery) -> Result<Vec<Record>> {
        let mut sql = String::from("SELECT body FROM operations WHERE 1 = 1");
        let mut args: Vec<SqlValue> = Vec::new();

        match &query.scope {
            Scope::All => {}
            Scope::Account(account) => {
                sql.push_str(" AND source_account = ?");
                args.push(SqlValue::Text(account.clone()));
            }
            Scope::Transaction(tx) => {
                sql.push_str(" AND transaction_hash = ?");
                args.push(SqlValue::Text(tx.clone()));
            }
        }

        if let Some(cursor) = query.cursor.as_ref().filter(|c| !c.is_start()) {
            let key: i64 = cursor.as_str().parse().map_err(|_| {
                OpTableError::InvalidInput(format!("Cursor is not an integer: {}", cursor))
            })?;
            sql.push_str(match query.order {
                Order::Asc => " AND paging_token > ?",
                Order::Desc => " AND paging_token < ?",
            });
            args.push(SqlValue::Integer(key));
        }

        sql.push_str(match query.order {
            Order::Asc => " ORDER BY paging_token ASC",
            Order::Desc => " ORDER BY paging_token DESC",
        });
        sql.push_str(" LIMIT ?");
        args.push(SqlValue::Integer(
            query.limit.unwrap_or(DEFAULT_LIMIT) as i64,
        ));

        let conn = self
            .conn
            .lock()
            .map_err(|_| OpTableError::DatabaseError("Mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare(&sql)?;
        let bodies = stmt
            .query_map(params_from_iter(args), |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(OpTableError::from))
            .collect()
    }
}

fn paging_key(record: &Record) -> Result<i64> {
    record.paging_token.as_str().parse().map_err(|_| {
        OpTableError::InvalidInput(format!(
            "Paging token of operation {} is not an integer: {}",
            record.id, record.paging_token
        ))
    })
}

#[async_trait]
impl RecordSource for SqliteSource {
    async fn call(&self, query: &OperationQuery) -> Result<Page> {
        self.select(query).map(Page::new)
    }
}
