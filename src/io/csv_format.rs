//! CSV format handling for categories, rules, transactions and output
//!
//! This module centralizes all CSV format concerns, providing:
//! - Row structures for deserialization
//! - Conversion from CSV rows to domain types
//! - Loaders for the category and rule tables
//! - Categorized transaction output serialization
//!
//! Conversions are pure. Loaders and the writer work on any `Read`/`Write`,
//! so tests run against in-memory buffers.
//!
//! # Formats
//!
//! ```text
//! categories.csv    id,company,parent,name,color,is_system,is_active
//! rules.csv         id,company,category,name,condition_type,field_name,field_value,priority,is_active
//! transactions.csv  tx,company,type,amount,description,category
//! output            tx,company,category,category_path
//! ```
//!
//! Empty `company` and `parent` cells mean "system-wide" and "root". Empty
//! `priority`, `is_active`, `is_system` and `color` cells take their defaults.

use crate::core::category_table::CategoryTable;
use crate::types::category::DEFAULT_COLOR;
use crate::types::{
    CategorizationRule, Category, CategoryId, CompanyId, ConditionType, EngineError, FieldName,
    RuleId, Transaction, TransactionId, TransactionType, DEFAULT_PRIORITY,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::{Read, Write};
use std::str::FromStr;

/// Transaction row
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvTransaction {
    pub tx: TransactionId,
    pub company: CompanyId,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub amount: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<CategoryId>,
}

/// Rule row
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRule {
    pub id: RuleId,
    pub company: CompanyId,
    pub category: CategoryId,
    pub name: String,
    pub condition_type: String,
    pub field_name: String,
    #[serde(default)]
    pub field_value: String,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub is_active: Option<String>,
}

/// Category row
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvCategory {
    pub id: CategoryId,
    #[serde(default)]
    pub company: Option<CompanyId>,
    #[serde(default)]
    pub parent: Option<CategoryId>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub is_system: Option<String>,
    #[serde(default)]
    pub is_active: Option<String>,
}

/// Convert a CsvTransaction to a Transaction
///
/// # Returns
///
/// * `Ok(Transaction)` - Successfully converted transaction
/// * `Err(String)` - Invalid type or amount
pub fn convert_csv_transaction(row: CsvTransaction) -> Result<Transaction, String> {
    let tx_type = TransactionType::from_str(&row.tx_type)
        .map_err(|e| format!("{} for tx {}", e, row.tx))?;

    let amount = Decimal::from_str(row.amount.trim())
        .map_err(|_| format!("Invalid amount '{}' for tx {}", row.amount, row.tx))?;

    let mut tx = Transaction::new(row.tx, row.company, row.description, amount, tx_type);
    tx.category = row.category;
    Ok(tx)
}

/// Convert a CsvRule to a CategorizationRule
///
/// Only the enum columns are checked here. The condition itself is validated
/// when the rule is compiled into a snapshot.
pub fn convert_csv_rule(row: CsvRule) -> Result<CategorizationRule, String> {
    let condition_type = ConditionType::from_str(&row.condition_type)
        .map_err(|e| format!("{} for rule {}", e, row.id))?;
    let field_name =
        FieldName::from_str(&row.field_name).map_err(|e| format!("{} for rule {}", e, row.id))?;
    let is_active = parse_flag(row.is_active.as_deref(), true)
        .map_err(|e| format!("{} for rule {}", e, row.id))?;

    Ok(CategorizationRule {
        id: row.id,
        company: row.company,
        category: row.category,
        name: row.name,
        condition_type,
        field_name,
        field_value: row.field_value,
        priority: row.priority.unwrap_or(DEFAULT_PRIORITY),
        is_active,
    })
}

/// Convert a CsvCategory to a Category
pub fn convert_csv_category(row: CsvCategory) -> Result<Category, String> {
    let is_system = parse_flag(row.is_system.as_deref(), false)
        .map_err(|e| format!("{} for category {}", e, row.id))?;
    let is_active = parse_flag(row.is_active.as_deref(), true)
        .map_err(|e| format!("{} for category {}", e, row.id))?;

    Ok(Category {
        id: row.id,
        company: row.company,
        parent: row.parent,
        name: row.name,
        color: row
            .color
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        is_system,
        is_active,
    })
}

/// Parse a boolean cell, accepting `true`/`false`/`1`/`0` in any case
fn parse_flag(value: Option<&str>, default: bool) -> Result<bool, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(true),
        Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(false),
        Some(v) => Err(format!("Invalid boolean '{}'", v)),
    }
}

/// Deserialize every row of a table, converting each with `convert`
///
/// The first bad row aborts the load with its line number.
fn read_table<R, Row, T, F>(input: R, convert: F) -> Result<Vec<T>, EngineError>
where
    R: Read,
    Row: DeserializeOwned,
    F: Fn(Row) -> Result<T, String>,
{
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let line = record.position().map(|pos| pos.line());
        let row: Row = record.deserialize(Some(&headers))?;
        let value = convert(row).map_err(|message| EngineError::ParseError { line, message })?;
        rows.push(value);
    }
    Ok(rows)
}

/// Load a category table
///
/// Parents must appear before their children.
///
/// # Errors
///
/// [`EngineError::ParseError`] for malformed rows, [`EngineError::Category`]
/// for rows that break the table invariants.
pub fn read_categories<R: Read>(input: R) -> Result<CategoryTable, EngineError> {
    let mut table = CategoryTable::new();
    for category in read_table(input, convert_csv_category)? {
        table.insert(category)?;
    }
    Ok(table)
}

/// Load persisted rules without validating their conditions
pub fn read_rules<R: Read>(input: R) -> Result<Vec<CategorizationRule>, EngineError> {
    read_table(input, convert_csv_rule)
}

/// Write categorized transactions to CSV format
///
/// Writes transactions with columns: tx, company, category, category_path.
/// Uncategorized transactions get empty category cells. Transactions are
/// sorted by id for deterministic output.
///
/// # Arguments
///
/// * `transactions` - Transactions to write
/// * `categories` - Table used to render each category's full path
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_transactions_csv(
    transactions: &[Transaction],
    categories: &CategoryTable,
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["tx", "company", "category", "category_path"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|tx| tx.id);

    for tx in sorted {
        let (category, path) = match tx.category {
            Some(id) => (
                id.to_string(),
                categories.full_path(id).unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        writer
            .write_record(&[tx.id.to_string(), tx.company.to_string(), category, path])
            .map_err(|e| format!("Failed to write transaction record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}
