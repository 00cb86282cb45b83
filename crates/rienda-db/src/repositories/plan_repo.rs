//! Plan repository implementation

use async_trait::async_trait;
use rienda_core::{
    models::{Plan, PlanType},
    traits::PlanRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgPlanRepository {
    pool: PgPool,
}

impl PgPlanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: Uuid,
    nombre: String,
    tipo: String,
    clases_mes: i32,
    precio: Decimal,
    activo: bool,
}

impl From<PlanRow> for Plan {
    fn from(row: PlanRow) -> Self {
        Self {
            id: row.id,
            nombre: row.nombre,
            tipo: PlanType::from_str(&row.tipo).unwrap_or(PlanType::Escuelita),
            clases_mes: row.clases_mes,
            precio: row.precio,
            activo: row.activo,
        }
    }
}

#[async_trait]
impl PlanRepository for PgPlanRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Plan>> {
        debug!("Finding plan by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, PlanRow>(
            r#"
            SELECT id, nombre, tipo, clases_mes, precio, activo
            FROM planes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding plan {}: {}", id, e);
            AppError::Database(format!("Failed to find plan: {}", e))
        })?;

        Ok(row.map(Into::into))
    }
}
