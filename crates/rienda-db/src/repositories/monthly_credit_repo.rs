//! Monthly credit ledger repository implementation
//!
//! The (suscripcion_id, mes, anio) unique index makes get_or_create safe
//! under concurrent callers; mutations are single atomic UPDATEs.

use async_trait::async_trait;
use rienda_core::{
    models::MonthlyCreditRecord, traits::MonthlyCreditRepository, AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgMonthlyCreditRepository {
    pool: PgPool,
}

impl PgMonthlyCreditRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CreditRow {
    id: Uuid,
    suscripcion_id: Uuid,
    mes: i32,
    anio: i32,
    clases_usadas: i32,
}

impl From<CreditRow> for MonthlyCreditRecord {
    fn from(row: CreditRow) -> Self {
        Self {
            id: row.id,
            suscripcion_id: row.suscripcion_id,
            mes: row.mes as u32,
            anio: row.anio,
            clases_usadas: row.clases_usadas,
        }
    }
}

const CREDIT_COLUMNS: &str = "id, suscripcion_id, mes, anio, clases_usadas";

#[async_trait]
impl MonthlyCreditRepository for PgMonthlyCreditRepository {
    #[instrument(skip(self))]
    async fn find(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<Option<MonthlyCreditRecord>> {
        let row = sqlx::query_as::<sqlx::Postgres, CreditRow>(&format!(
            r#"
            SELECT {}
            FROM clases_mensuales
            WHERE suscripcion_id = $1 AND mes = $2 AND anio = $3
            "#,
            CREDIT_COLUMNS
        ))
        .bind(suscripcion_id)
        .bind(mes as i32)
        .bind(anio)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding monthly credit record: {}", e);
            AppError::Database(format!("Failed to find monthly record: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn get_or_create(
        &self,
        suscripcion_id: Uuid,
        mes: u32,
        anio: i32,
    ) -> AppResult<MonthlyCreditRecord> {
        debug!(
            "Ensuring monthly record for subscription {} period {}/{}",
            suscripcion_id, mes, anio
        );

        // Insert-if-absent, then reselect. ON CONFLICT DO NOTHING returns no
        // row when another caller won the insert, so the RETURNING clause
        // alone is not enough.
        sqlx::query(
            r#"
            INSERT INTO clases_mensuales (suscripcion_id, mes, anio, clases_usadas)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (suscripcion_id, mes, anio) DO NOTHING
            "#,
        )
        .bind(suscripcion_id)
        .bind(mes as i32)
        .bind(anio)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating monthly record: {}", e);
            AppError::Database(format!("Failed to create monthly record: {}", e))
        })?;

        let row = sqlx::query_as::<sqlx::Postgres, CreditRow>(&format!(
            r#"
            SELECT {}
            FROM clases_mensuales
            WHERE suscripcion_id = $1 AND mes = $2 AND anio = $3
            "#,
            CREDIT_COLUMNS
        ))
        .bind(suscripcion_id)
        .bind(mes as i32)
        .bind(anio)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error reading monthly record: {}", e);
            AppError::Database(format!("Failed to read monthly record: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn increment(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO clases_mensuales (suscripcion_id, mes, anio, clases_usadas)
            VALUES ($1, $2, $3, 1)
            ON CONFLICT (suscripcion_id, mes, anio)
            DO UPDATE SET clases_usadas = clases_mensuales.clases_usadas + 1
            "#,
        )
        .bind(suscripcion_id)
        .bind(mes as i32)
        .bind(anio)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error incrementing monthly usage: {}", e);
            AppError::Database(format!("Failed to increment monthly usage: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn decrement(&self, suscripcion_id: Uuid, mes: u32, anio: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE clases_mensuales
            SET clases_usadas = GREATEST(clases_usadas - 1, 0)
            WHERE suscripcion_id = $1 AND mes = $2 AND anio = $3
            "#,
        )
        .bind(suscripcion_id)
        .bind(mes as i32)
        .bind(anio)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error decrementing monthly usage: {}", e);
            AppError::Database(format!("Failed to decrement monthly usage: {}", e))
        })?;

        Ok(())
    }
}
