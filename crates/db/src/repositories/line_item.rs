use cotiza_core::domain::line_item::{LineItem, LineItemId, NewLineItem};
use cotiza_core::domain::quote::QuoteId;
use cotiza_core::domain::role::RoleId;

use super::{get_column, get_decimal, get_optional_decimal, LineItemRepository, RepositoryError};
use crate::DbPool;

pub struct SqlLineItemRepository {
    pool: DbPool,
}

impl SqlLineItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const ITEM_COLUMNS: &str =
    "id, quote_id, role_id, description, manual_hours, hourly_rate, ai_suggested_hours, sequence";

fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<LineItem, RepositoryError> {
    Ok(LineItem {
        id: LineItemId(get_column(row, "id")?),
        quote_id: QuoteId(get_column(row, "quote_id")?),
        role_id: RoleId(get_column(row, "role_id")?),
        description: get_column(row, "description")?,
        manual_hours: get_decimal(row, "manual_hours")?,
        hourly_rate: get_decimal(row, "hourly_rate")?,
        ai_suggested_hours: get_optional_decimal(row, "ai_suggested_hours")?,
        sequence: get_column(row, "sequence")?,
    })
}

#[async_trait::async_trait]
impl LineItemRepository for SqlLineItemRepository {
    async fn create(
        &self,
        quote_id: QuoteId,
        item: NewLineItem,
    ) -> Result<LineItem, RepositoryError> {
        let item = item.normalized();
        let result = sqlx::query(
            "INSERT INTO quote_item
                (quote_id, role_id, description, manual_hours, hourly_rate, ai_suggested_hours, sequence)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(quote_id.0)
        .bind(item.role_id.0)
        .bind(&item.description)
        .bind(item.manual_hours.to_string())
        .bind(item.hourly_rate.to_string())
        .bind(item.ai_suggested_hours.map(|hours| hours.to_string()))
        .bind(item.sequence)
        .execute(&self.pool)
        .await?;

        Ok(LineItem {
            id: LineItemId(result.last_insert_rowid()),
            quote_id,
            role_id: item.role_id,
            description: item.description,
            manual_hours: item.manual_hours,
            hourly_rate: item.hourly_rate,
            ai_suggested_hours: item.ai_suggested_hours,
            sequence: item.sequence,
        })
    }

    async fn find_by_id(&self, id: LineItemId) -> Result<Option<LineItem>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {ITEM_COLUMNS} FROM quote_item WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_item).transpose()
    }

    async fn list_for_quote(&self, quote_id: QuoteId) -> Result<Vec<LineItem>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {ITEM_COLUMNS} FROM quote_item WHERE quote_id = ? ORDER BY sequence ASC, id ASC"
        ))
        .bind(quote_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_item).collect()
    }

    async fn update(
        &self,
        id: LineItemId,
        item: NewLineItem,
    ) -> Result<Option<LineItem>, RepositoryError> {
        let item = item.normalized();
        let result = sqlx::query(
            "UPDATE quote_item
             SET role_id = ?, description = ?, manual_hours = ?, hourly_rate = ?,
                 ai_suggested_hours = ?, sequence = ?
             WHERE id = ?",
        )
        .bind(item.role_id.0)
        .bind(&item.description)
        .bind(item.manual_hours.to_string())
        .bind(item.hourly_rate.to_string())
        .bind(item.ai_suggested_hours.map(|hours| hours.to_string()))
        .bind(item.sequence)
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: LineItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM quote_item WHERE id = ?")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
