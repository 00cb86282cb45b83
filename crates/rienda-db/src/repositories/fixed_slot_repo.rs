//! Fixed schedule slot repository implementation

use async_trait::async_trait;
use chrono::NaiveTime;
use rienda_core::{models::FixedScheduleSlot, traits::FixedSlotRepository, AppError, AppResult};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgFixedSlotRepository {
    pool: PgPool,
}

impl PgFixedSlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FixedSlotRow {
    id: Uuid,
    user_id: Uuid,
    profesor_id: Uuid,
    caballo_id: Option<Uuid>,
    dia_semana: i16,
    hora: NaiveTime,
    activo: bool,
}

impl From<FixedSlotRow> for FixedScheduleSlot {
    fn from(row: FixedSlotRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            profesor_id: row.profesor_id,
            caballo_id: row.caballo_id,
            dia_semana: row.dia_semana as u8,
            hora: row.hora,
            activo: row.activo,
        }
    }
}

#[async_trait]
impl FixedSlotRepository for PgFixedSlotRepository {
    #[instrument(skip(self))]
    async fn list_active_for_user(&self, user_id: Uuid) -> AppResult<Vec<FixedScheduleSlot>> {
        debug!("Listing fixed slots for user {}", user_id);

        let rows = sqlx::query_as::<sqlx::Postgres, FixedSlotRow>(
            r#"
            SELECT id, user_id, profesor_id, caballo_id, dia_semana, hora, activo
            FROM horarios_fijos
            WHERE user_id = $1 AND activo = TRUE
            ORDER BY dia_semana, hora
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing fixed slots: {}", e);
            AppError::Database(format!("Failed to list fixed slots: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
