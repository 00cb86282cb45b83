//! Payment proof repository implementation

use async_trait::async_trait;
use rienda_core::{
    models::{NewPaymentProof, PaymentProof, ProofStatus},
    traits::PaymentProofRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgPaymentProofRepository {
    pool: PgPool,
}

impl PgPaymentProofRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProofRow {
    id: Uuid,
    factura_id: Uuid,
    user_id: Uuid,
    monto: Decimal,
    archivo_url: String,
    estado: String,
    observaciones: Option<String>,
}

impl From<ProofRow> for PaymentProof {
    fn from(row: ProofRow) -> Self {
        Self {
            id: row.id,
            factura_id: row.factura_id,
            user_id: row.user_id,
            monto: row.monto,
            archivo_url: row.archivo_url,
            estado: ProofStatus::from_str(&row.estado).unwrap_or(ProofStatus::Pendiente),
            observaciones: row.observaciones,
        }
    }
}

const PROOF_COLUMNS: &str = "id, factura_id, user_id, monto, archivo_url, estado, observaciones";

#[async_trait]
impl PaymentProofRepository for PgPaymentProofRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<PaymentProof>> {
        let row = sqlx::query_as::<sqlx::Postgres, ProofRow>(&format!(
            "SELECT {} FROM comprobantes WHERE id = $1",
            PROOF_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding payment proof {}: {}", id, e);
            AppError::Database(format!("Failed to find payment proof: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, proof))]
    async fn create(&self, proof: &NewPaymentProof) -> AppResult<PaymentProof> {
        debug!("Registering payment proof for invoice {}", proof.factura_id);

        let row = sqlx::query_as::<sqlx::Postgres, ProofRow>(&format!(
            r#"
            INSERT INTO comprobantes (factura_id, user_id, monto, archivo_url, estado)
            VALUES ($1, $2, $3, $4, 'pendiente')
            RETURNING {}
            "#,
            PROOF_COLUMNS
        ))
        .bind(proof.factura_id)
        .bind(proof.user_id)
        .bind(proof.monto)
        .bind(&proof.archivo_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating payment proof: {}", e);
            AppError::Database(format!("Failed to create payment proof: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn set_estado(
        &self,
        id: Uuid,
        estado: ProofStatus,
        observaciones: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE comprobantes
            SET estado = $2, observaciones = COALESCE($3, observaciones)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(estado.to_string())
        .bind(observaciones)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error updating payment proof {}: {}", id, e);
            AppError::Database(format!("Failed to update payment proof: {}", e))
        })?;

        Ok(())
    }
}
