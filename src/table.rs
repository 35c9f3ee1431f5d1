//! Terminal rendering of an operations page

use chrono::DateTime;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use serde_json::Value;

use crate::record::Record;

pub const MORE_DATA_DISCLAIMER: &str =
    "More data is possibly available: the filter stopped after scanning the record cap.";

/// Build the operations table. Compact mode drops the transaction and type
/// columns.
pub fn render(records: &[Record], compact: bool) -> Table {
    let mut header = vec!["Account", "Operation"];
    if !compact {
        header.extend(["Transaction", "Type"]);
    }
    header.push("Time");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header.into_iter().map(|h| {
            Cell::new(h)
                .fg(TableColor::Cyan)
                .add_attribute(Attribute::Bold)
        }));

    for record in records {
        let mut row = vec![
            Cell::new(short_account(record.source_account.as_deref())).fg(TableColor::White),
            Cell::new(operation_summary(record)).fg(type_color(&record.op_type)),
        ];
        if !compact {
            row.push(
                Cell::new(short_hash(record.transaction_hash.as_deref())).fg(TableColor::White),
            );
            row.push(Cell::new(&record.op_type).fg(type_color(&record.op_type)));
        }
        row.push(Cell::new(format_time(record.created_at.as_deref())).fg(TableColor::Grey));
        table.add_row(row);
    }

    table
}

/// Line shown under the filter selector, if any.
pub fn disclaimer(filter: Option<&str>, possibly_more_data_available: bool) -> Option<&'static str> {
    match filter {
        Some(_) if possibly_more_data_available => Some(MORE_DATA_DISCLAIMER),
        _ => None,
    }
}

/// One-line description of what an operation did.
pub fn operation_summary(record: &Record) -> String {
    let field = |key: &str| record.extra.get(key).and_then(Value::as_str);
    let asset = || match field("asset_type") {
        Some("native") | None => "XLM".to_string(),
        Some(_) => field("asset_code").unwrap_or("?").to_string(),
    };

    match record.op_type.as_str() {
        "payment" => match (field("amount"), field("to")) {
            (Some(amount), Some(to)) => format!("{} {} to {}", amount, asset(), short_account(Some(to))),
            (Some(amount), None) => format!("{} {}", amount, asset()),
            _ => "payment".to_string(),
        },
        "create_account" => match (field("starting_balance"), field("account")) {
            (Some(balance), Some(account)) => {
                format!("create {} with {}", short_account(Some(account)), balance)
            }
            _ => "create account".to_string(),
        },
        "change_trust" => match field("asset_code") {
            Some(code) => format!("trust {}", code),
            None => "change trust".to_string(),
        },
        "manage_data" => match field("name") {
            Some(name) => format!("data {}", name),
            None => "manage data".to_string(),
        },
        other => other.replace('_', " "),
    }
}

fn type_color(op_type: &str) -> TableColor {
    match op_type {
        "payment" | "path_payment_strict_receive" | "path_payment_strict_send" => TableColor::Green,
        "create_account" | "account_merge" => TableColor::Yellow,
        "manage_sell_offer" | "manage_buy_offer" | "create_passive_sell_offer" => TableColor::Magenta,
        _ => TableColor::White,
    }
}

// Lengths below count chars, not bytes.
fn short_account(account: Option<&str>) -> String {
    match account {
        Some(a) if a.chars().count() > 20 => {
            let head: String = a.chars().take(8).collect();
            let mut tail: Vec<char> = a.chars().rev().take(8).collect();
            tail.reverse();
            format!("{}...{}", head, tail.into_iter().collect::<String>())
        }
        Some(a) => a.to_string(),
        None => "-".to_string(),
    }
}

fn short_hash(hash: Option<&str>) -> String {
    match hash {
        Some(h) if h.chars().count() > 16 => {
            format!("{}...", h.chars().take(13).collect::<String>())
        }
        Some(h) => h.to_string(),
        None => "-".to_string(),
    }
}

fn format_time(created_at: Option<&str>) -> String {
    match created_at.map(DateTime::parse_from_rfc3339) {
        Some(Ok(dt)) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Some(Err(_)) => "Invalid".to_string(),
        None => "-".to_string(),
    }
}
