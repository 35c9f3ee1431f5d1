//! Integration tests for the SQLite record source

use tempfile::TempDir;
use optable::fetcher::{NavState, OperationFetcher};
use optable::record::Record;
use optable::source::{OperationQuery, RecordSource, SqliteSource};

fn seed(db: &SqliteSource, count: u64) -> Result<(), Box<dyn std::error::Error>> {
    let records: Vec<Record> = (1..=count)
        .map(|i| {
            let op_type = if i % 4 == 0 { "change_trust" } else { "payment" };
            let account = if i % 2 == 0 { "GEVEN" } else { "GODD" };
            Record::new(i.to_string(), i, op_type)
                .with_source_account(account)
                .with_transaction_hash(format!("{:064x}", i / 2))
        })
        .collect();
    db.insert_records(&records)?;
    Ok(())
}

#[tokio::test]
async fn test_records_survive_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("ops.db");
    let path = path.to_string_lossy();

    {
        let db = SqliteSource::open(&path)?;
        seed(&db, 30)?;
    }

    let db = SqliteSource::open(&path)?;
    assert_eq!(db.count()?, 30);

    let page = db.call(&OperationQuery::new().limit(5)).await?;
    let ids: Vec<_> = page.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    Ok(())
}

#[tokio::test]
async fn test_passthrough_attributes_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let db = SqliteSource::open_in_memory()?;
    let mut record = Record::new("9", 9u64, "payment").with_created_at("2024-05-05T10:00:00Z");
    record.extra.insert("amount".to_string(), "12.5".into());
    db.insert_records(&[record.clone()])?;

    let page = db.call(&OperationQuery::new()).await?;
    assert_eq!(page.records, vec![record]);
    Ok(())
}

#[tokio::test]
async fn test_filtered_paging_over_account() -> Result<(), Box<dyn std::error::Error>> {
    let db = SqliteSource::open_in_memory()?;
    seed(&db, 100)?;

    let fetcher = OperationFetcher::new(&db, OperationQuery::new().for_account("GEVEN"), 5)
        .with_filter(Some("change_trust".to_string()));
    let mut nav = NavState::new();

    let first = fetcher.fetch_records().await?;
    let ids: Vec<_> = first.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["100", "96", "92", "88", "84"]);

    let second = fetcher.next(&mut nav, &first).await?;
    let ids: Vec<_> = second.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["80", "76", "72", "68", "64"]);
    Ok(())
}

#[tokio::test]
async fn test_transaction_scope() -> Result<(), Box<dyn std::error::Error>> {
    let db = SqliteSource::open_in_memory()?;
    seed(&db, 10)?;

    let tx = format!("{:064x}", 3);
    let page = db.call(&OperationQuery::new().for_transaction(tx)).await?;
    let ids: Vec<_> = page.records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["6", "7"]);
    Ok(())
}
