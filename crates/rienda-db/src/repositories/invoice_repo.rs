//! Invoice repository implementation
//!
//! Settled checks accept the legacy state labels still present in older
//! rows ("pagado", "aprobado", "confirmado") alongside "pagada".

use async_trait::async_trait;
use chrono::NaiveDate;
use rienda_core::{
    models::{Invoice, InvoiceStatus, NewInvoice},
    traits::InvoiceRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgInvoiceRepository {
    pool: PgPool,
}

impl PgInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: Uuid,
    user_id: Uuid,
    suscripcion_id: Uuid,
    mes: i32,
    anio: i32,
    monto: Decimal,
    estado: String,
    fecha_vencimiento: NaiveDate,
    fecha_pago: Option<NaiveDate>,
    pagada: bool,
}

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            suscripcion_id: row.suscripcion_id,
            mes: row.mes as u32,
            anio: row.anio,
            monto: row.monto,
            estado: InvoiceStatus::from_str(&row.estado).unwrap_or(InvoiceStatus::Pendiente),
            fecha_vencimiento: row.fecha_vencimiento,
            fecha_pago: row.fecha_pago,
            pagada: row.pagada,
        }
    }
}

const INVOICE_COLUMNS: &str = "id, user_id, suscripcion_id, mes, anio, monto, estado, \
     fecha_vencimiento, fecha_pago, pagada";

const SETTLED_LABELS: &str = "('pagada', 'pagado', 'aprobado', 'confirmado')";

#[async_trait]
impl InvoiceRepository for PgInvoiceRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Invoice>> {
        let row = sqlx::query_as::<sqlx::Postgres, InvoiceRow>(&format!(
            "SELECT {} FROM facturas WHERE id = $1",
            INVOICE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding invoice {}: {}", id, e);
            AppError::Database(format!("Failed to find invoice: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, invoice))]
    async fn create(&self, invoice: &NewInvoice) -> AppResult<Invoice> {
        debug!(
            "Creating invoice for user {} period {}/{}",
            invoice.user_id, invoice.mes, invoice.anio
        );

        let row = sqlx::query_as::<sqlx::Postgres, InvoiceRow>(&format!(
            r#"
            INSERT INTO facturas (
                user_id, suscripcion_id, mes, anio, monto, estado,
                fecha_vencimiento, pagada
            )
            VALUES ($1, $2, $3, $4, $5, 'pendiente', $6, FALSE)
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(invoice.user_id)
        .bind(invoice.suscripcion_id)
        .bind(invoice.mes as i32)
        .bind(invoice.anio)
        .bind(invoice.monto)
        .bind(invoice.fecha_vencimiento)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating invoice: {}", e);
            AppError::Database(format!("Failed to create invoice: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn exists_for_month(&self, user_id: Uuid, mes: u32, anio: i32) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM facturas
                WHERE user_id = $1 AND mes = $2 AND anio = $3
            )
            "#,
        )
        .bind(user_id)
        .bind(mes as i32)
        .bind(anio)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking invoice existence: {}", e);
            AppError::Database(format!("Failed to check invoice: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn has_settled_for_month(&self, user_id: Uuid, mes: u32, anio: i32) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(&format!(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM facturas
                WHERE user_id = $1 AND mes = $2 AND anio = $3
                  AND (pagada = TRUE OR estado IN {})
            )
            "#,
            SETTLED_LABELS
        ))
        .bind(user_id)
        .bind(mes as i32)
        .bind(anio)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking settled invoice: {}", e);
            AppError::Database(format!("Failed to check invoice payment: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn mark_paid(&self, id: Uuid, fecha_pago: NaiveDate) -> AppResult<Invoice> {
        let row = sqlx::query_as::<sqlx::Postgres, InvoiceRow>(&format!(
            r#"
            UPDATE facturas
            SET estado = 'pagada', pagada = TRUE, fecha_pago = $2
            WHERE id = $1
            RETURNING {}
            "#,
            INVOICE_COLUMNS
        ))
        .bind(id)
        .bind(fecha_pago)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error marking invoice {} paid: {}", id, e);
            AppError::Database(format!("Failed to mark invoice paid: {}", e))
        })?
        .ok_or_else(|| AppError::NotFound(format!("Invoice {} not found", id)))?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn list_pending_for_user(&self, user_id: Uuid) -> AppResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<sqlx::Postgres, InvoiceRow>(&format!(
            r#"
            SELECT {}
            FROM facturas
            WHERE user_id = $1
              AND pagada = FALSE
              AND estado NOT IN {}
            ORDER BY anio DESC, mes DESC
            "#,
            INVOICE_COLUMNS, SETTLED_LABELS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing pending invoices: {}", e);
            AppError::Database(format!("Failed to list pending invoices: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn list_for_user_since(
        &self,
        user_id: Uuid,
        desde: NaiveDate,
    ) -> AppResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<sqlx::Postgres, InvoiceRow>(&format!(
            r#"
            SELECT {}
            FROM facturas
            WHERE user_id = $1
              AND make_date(anio, mes, 1) >= $2
            ORDER BY anio DESC, mes DESC
            "#,
            INVOICE_COLUMNS
        ))
        .bind(user_id)
        .bind(desde)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing invoice history: {}", e);
            AppError::Database(format!("Failed to list invoices: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
