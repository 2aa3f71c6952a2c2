//! Generic row-level SQL shared by the local and remote stores.

use std::collections::BTreeSet;

use libsql::params::Params;
use libsql::Connection;

use crate::error::Result;
use crate::sync::{ConflictPolicy, Row, Value};

/// Quote an SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Read every row of a result set into column-keyed rows.
pub async fn collect_rows(mut rows: libsql::Rows) -> Result<Vec<Row>> {
    let column_count = rows.column_count();
    let columns: Vec<String> = (0..column_count)
        .map(|index| rows.column_name(index).unwrap_or_default().to_string())
        .collect();

    let mut collected = Vec::new();
    while let Some(row) = rows.next().await? {
        let mut record = Row::new();
        for (index, name) in (0..column_count).zip(&columns) {
            record.insert(name.clone(), Value::from(row.get_value(index)?));
        }
        collected.push(record);
    }
    Ok(collected)
}

pub async fn select_by_owner(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner: &str,
) -> Result<Vec<Row>> {
    let sql = format!(
        "SELECT * FROM {} WHERE {} = ? ORDER BY id",
        quote_ident(table),
        quote_ident(owner_column)
    );
    let rows = conn.query(&sql, [owner]).await?;
    collect_rows(rows).await
}

pub async fn count_by_owner(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner: &str,
) -> Result<usize> {
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(owner_column)
    );
    let mut rows = conn.query(&sql, [owner]).await?;
    let count = if let Some(row) = rows.next().await? {
        row.get::<i64>(0)?
    } else {
        0
    };
    Ok(usize::try_from(count).unwrap_or_default())
}

pub async fn delete_by_owner(
    conn: &Connection,
    table: &str,
    owner_column: &str,
    owner: &str,
) -> Result<u64> {
    let sql = format!(
        "DELETE FROM {} WHERE {} = ?",
        quote_ident(table),
        quote_ident(owner_column)
    );
    Ok(conn.execute(&sql, [owner]).await?)
}

/// Insert rows with multi-row `VALUES` statements of at most `batch_size` rows.
///
/// The column list is the union of the rows' keys; a row missing a column
/// binds NULL for it.
pub async fn insert_rows(
    conn: &Connection,
    table: &str,
    rows: &[Row],
    policy: ConflictPolicy,
    batch_size: usize,
) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let columns: Vec<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(String::as_str))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let verb = match policy {
        ConflictPolicy::Abort => "INSERT",
        ConflictPolicy::Ignore => "INSERT OR IGNORE",
    };
    let column_list = columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ");
    let tuple = format!("({})", vec!["?"; columns.len()].join(", "));

    let mut written = 0;
    for (batch_index, batch) in rows.chunks(batch_size.max(1)).enumerate() {
        let sql = format!(
            "{verb} INTO {} ({column_list}) VALUES {}",
            quote_ident(table),
            vec![tuple.as_str(); batch.len()].join(", ")
        );
        let mut values = Vec::with_capacity(batch.len() * columns.len());
        for row in batch {
            for column in &columns {
                let value = row.get(*column).cloned().unwrap_or(Value::Null);
                values.push(value.into_libsql());
            }
        }
        let affected = conn.execute(&sql, Params::Positional(values)).await?;
        tracing::debug!(
            "Inserted batch {} into {} ({} of {} rows)",
            batch_index,
            table,
            affected,
            batch.len()
        );
        written += affected;
    }

    Ok(written)
}

/// Names of all tables in the database catalog.
pub async fn table_names(conn: &Connection) -> Result<BTreeSet<String>> {
    let mut rows = conn
        .query("SELECT name FROM sqlite_master WHERE type = 'table'", ())
        .await?;
    let mut names = BTreeSet::new();
    while let Some(row) = rows.next().await? {
        names.insert(row.get::<String>(0)?);
    }
    Ok(names)
}

/// Run `statements` inside one transaction, rolling back on the first failure.
pub async fn execute_in_transaction(
    conn: &Connection,
    statements: Vec<(String, Params)>,
) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    for (sql, params) in statements {
        if let Err(e) = conn.execute(&sql, params).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(e.into());
        }
    }

    if let Err(e) = conn.execute("COMMIT", ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(e.into());
    }
    Ok(())
}
