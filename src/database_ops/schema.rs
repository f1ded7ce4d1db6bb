//! Schema helpers for the additive admin migrations (information_schema
//! lookups and single-column ALTERs). Identifiers are interpolated, not
//! bound, so they go through `quote_ident`.

use anyhow::Result;
use sqlx::Row;

use crate::database_ops::db::Db;

/// Column name + resolved data type as reported by information_schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
}

pub async fn column_exists(db: &Db, table: &str, column: &str) -> Result<bool> {
    let exists: bool = sqlx::query(
        "SELECT EXISTS (\
            SELECT 1 FROM information_schema.columns \
            WHERE table_schema = ANY (current_schemas(true)) \
              AND table_name = $1 AND column_name = $2\
         )",
    )
    .persistent(false)
    .bind(table)
    .bind(column)
    .fetch_one(&db.pool)
    .await?
    .get(0);
    Ok(exists)
}

/// Readback for post-ALTER verification; None if the column is not visible.
pub async fn column_info(db: &Db, table: &str, column: &str) -> Result<Option<ColumnInfo>> {
    let row = sqlx::query(
        "SELECT column_name, data_type \
         FROM information_schema.columns \
         WHERE table_schema = ANY (current_schemas(true)) \
           AND table_name = $1 AND column_name = $2",
    )
    .persistent(false)
    .bind(table)
    .bind(column)
    .fetch_optional(&db.pool)
    .await?;

    Ok(row.map(|r| ColumnInfo {
        name: r.get("column_name"),
        data_type: r.get("data_type"),
    }))
}

/// ALTER TABLE .. ADD COLUMN with a nullable TEXT type. Additive only; the
/// single statement is atomic, so no cleanup path is needed.
pub async fn add_nullable_text_column(db: &Db, table: &str, column: &str) -> Result<()> {
    let sql = format!(
        "ALTER TABLE {} ADD COLUMN {} TEXT",
        quote_ident(table),
        quote_ident(column)
    );
    sqlx::query(&sql).persistent(false).execute(&db.pool).await?;
    Ok(())
}

pub async fn count_rows(db: &Db, table: &str) -> Result<i64> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
    let count: i64 = sqlx::query(&sql)
        .persistent(false)
        .fetch_one(&db.pool)
        .await?
        .get(0);
    Ok(count)
}

/// Double-quote an identifier, escaping embedded quotes. The tournament
/// schema uses camelCase column names, which are case-folded unless quoted.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_camel_case_idents() {
        assert_eq!(quote_ident("knockoutStage"), "\"knockoutStage\"");
        assert_eq!(quote_ident("matches"), "\"matches\"");
    }

    #[test]
    fn escapes_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
