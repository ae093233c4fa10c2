use chrono::{DateTime, Utc};

use cotiza_core::domain::project::ProjectId;
use cotiza_core::domain::quote::{FinancialParameters, Quote, QuoteId};

use super::{get_column, get_decimal, QuoteRepository, RepositoryError};
use crate::DbPool;

pub struct SqlQuoteRepository {
    pool: DbPool,
}

impl SqlQuoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const QUOTE_COLUMNS: &str =
    "id, project_id, applied_margin, applied_risk, applied_tax, ai_raw_input, created_at";

fn row_to_quote(row: &sqlx::sqlite::SqliteRow) -> Result<Quote, RepositoryError> {
    let created_at_str: String = get_column(row, "created_at")?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("created_at: {error}")))?;

    Ok(Quote {
        id: QuoteId(get_column(row, "id")?),
        project_id: ProjectId(get_column(row, "project_id")?),
        applied_margin: get_decimal(row, "applied_margin")?,
        applied_risk: get_decimal(row, "applied_risk")?,
        applied_tax: get_decimal(row, "applied_tax")?,
        ai_raw_input: get_column(row, "ai_raw_input")?,
        created_at,
    })
}

#[async_trait::async_trait]
impl QuoteRepository for SqlQuoteRepository {
    async fn create(
        &self,
        project_id: ProjectId,
        financials: FinancialParameters,
        ai_raw_input: Option<String>,
    ) -> Result<Quote, RepositoryError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO quote (project_id, applied_margin, applied_risk, applied_tax, ai_raw_input, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(project_id.0)
        .bind(financials.margin.to_string())
        .bind(financials.risk.to_string())
        .bind(financials.tax.to_string())
        .bind(ai_raw_input.as_deref())
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(Quote {
            id: QuoteId(result.last_insert_rowid()),
            project_id,
            applied_margin: financials.margin,
            applied_risk: financials.risk,
            applied_tax: financials.tax,
            ai_raw_input,
            created_at,
        })
    }

    async fn find_by_id(&self, id: QuoteId) -> Result<Option<Quote>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quote WHERE id = ?"))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_quote).transpose()
    }

    async fn list_for_project(&self, project_id: ProjectId) -> Result<Vec<Quote>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUOTE_COLUMNS} FROM quote WHERE project_id = ? ORDER BY id ASC"
        ))
        .bind(project_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_quote).collect()
    }

    async fn update_financials(
        &self,
        id: QuoteId,
        financials: FinancialParameters,
    ) -> Result<Option<Quote>, RepositoryError> {
        let result = sqlx::query(
            "UPDATE quote SET applied_margin = ?, applied_risk = ?, applied_tax = ? WHERE id = ?",
        )
        .bind(financials.margin.to_string())
        .bind(financials.risk.to_string())
        .bind(financials.tax.to_string())
        .bind(id.0)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }
}
