use std::path::Path;

use crate::cli::TableArg;
use crate::commands::common::open_database;
use crate::error::CliError;

pub async fn run_delete(
    table: TableArg,
    id: i64,
    user_id: &str,
    db_path: &Path,
) -> Result<(), CliError> {
    let db = open_database(db_path).await?;
    db.delete_record(table.key(), user_id, id).await?;

    println!("Deleted {} #{id}", table.key());
    Ok(())
}
