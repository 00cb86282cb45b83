//! Teacher repository implementation

use async_trait::async_trait;
use rienda_core::{models::Teacher, traits::TeacherRepository, AppError, AppResult};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgTeacherRepository {
    pool: PgPool,
}

impl PgTeacherRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TeacherRow {
    id: Uuid,
    user_id: Uuid,
    especialidad: Option<String>,
    porcentaje_escuelita: Decimal,
    porcentaje_pension: Decimal,
    activo: bool,
}

impl From<TeacherRow> for Teacher {
    fn from(row: TeacherRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            especialidad: row.especialidad,
            porcentaje_escuelita: row.porcentaje_escuelita,
            porcentaje_pension: row.porcentaje_pension,
            activo: row.activo,
        }
    }
}

#[async_trait]
impl TeacherRepository for PgTeacherRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Teacher>> {
        debug!("Finding teacher by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, TeacherRow>(
            r#"
            SELECT id, user_id, especialidad, porcentaje_escuelita, porcentaje_pension, activo
            FROM profesores
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding teacher {}: {}", id, e);
            AppError::Database(format!("Failed to find teacher: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_active(&self) -> AppResult<Vec<Teacher>> {
        let rows = sqlx::query_as::<sqlx::Postgres, TeacherRow>(
            r#"
            SELECT id, user_id, especialidad, porcentaje_escuelita, porcentaje_pension, activo
            FROM profesores
            WHERE activo = TRUE
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing teachers: {}", e);
            AppError::Database(format!("Failed to list teachers: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
