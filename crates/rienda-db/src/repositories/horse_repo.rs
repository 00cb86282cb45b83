//! Horse repository implementation

use async_trait::async_trait;
use rienda_core::{
    models::{Horse, HorseStatus, HorseType},
    traits::HorseRepository,
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgHorseRepository {
    pool: PgPool,
}

impl PgHorseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HorseRow {
    id: Uuid,
    nombre: String,
    tipo: String,
    estado: String,
    limite_clases_dia: i32,
    activo: bool,
    dueno_id: Option<Uuid>,
    dueno_id2: Option<Uuid>,
}

impl From<HorseRow> for Horse {
    fn from(row: HorseRow) -> Self {
        Self {
            id: row.id,
            nombre: row.nombre,
            tipo: HorseType::from_str(&row.tipo).unwrap_or(HorseType::Escuela),
            // Unknown state reads as resting, which keeps the horse out of
            // the booking pool.
            estado: HorseStatus::from_str(&row.estado).unwrap_or(HorseStatus::Descanso),
            limite_clases_dia: row.limite_clases_dia,
            activo: row.activo,
            dueno_id: row.dueno_id,
            dueno_id2: row.dueno_id2,
        }
    }
}

const HORSE_COLUMNS: &str =
    "id, nombre, tipo, estado, limite_clases_dia, activo, dueno_id, dueno_id2";

#[async_trait]
impl HorseRepository for PgHorseRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Horse>> {
        debug!("Finding horse by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, HorseRow>(&format!(
            "SELECT {} FROM caballos WHERE id = $1",
            HORSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding horse {}: {}", id, e);
            AppError::Database(format!("Failed to find horse: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn first_active_school_horse(&self) -> AppResult<Option<Horse>> {
        let row = sqlx::query_as::<sqlx::Postgres, HorseRow>(&format!(
            r#"
            SELECT {}
            FROM caballos
            WHERE tipo = 'escuela' AND estado = 'activo' AND activo = TRUE
            ORDER BY nombre
            LIMIT 1
            "#,
            HORSE_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding school horse: {}", e);
            AppError::Database(format!("Failed to find school horse: {}", e))
        })?;

        Ok(row.map(Into::into))
    }
}
