//! Lesson repository implementation
//!
//! Overlap queries use the half-open interval test
//! `NOT (hora_fin <= $start OR hora_inicio >= $end)` expressed as the
//! equivalent `hora_inicio < $end AND hora_fin > $start`, always restricted
//! to lessons in the `programada` state.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rienda_core::{
    models::{Lesson, LessonStatus, NewLesson},
    traits::LessonRepository,
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgLessonRepository {
    pool: PgPool,
}

impl PgLessonRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LessonRow {
    id: Uuid,
    user_id: Uuid,
    profesor_id: Uuid,
    caballo_id: Uuid,
    fecha: NaiveDate,
    hora_inicio: NaiveTime,
    hora_fin: NaiveTime,
    estado: String,
    es_extra: bool,
    es_reagendada: bool,
    clase_original_id: Option<Uuid>,
    notas: Option<String>,
}

impl From<LessonRow> for Lesson {
    fn from(row: LessonRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            profesor_id: row.profesor_id,
            caballo_id: row.caballo_id,
            fecha: row.fecha,
            hora_inicio: row.hora_inicio,
            hora_fin: row.hora_fin,
            estado: LessonStatus::from_str(&row.estado).unwrap_or(LessonStatus::Programada),
            es_extra: row.es_extra,
            es_reagendada: row.es_reagendada,
            clase_original_id: row.clase_original_id,
            notas: row.notas,
        }
    }
}

const LESSON_COLUMNS: &str = "id, user_id, profesor_id, caballo_id, fecha, hora_inicio, \
     hora_fin, estado, es_extra, es_reagendada, clase_original_id, notas";

#[async_trait]
impl LessonRepository for PgLessonRepository {
    #[instrument(skip(self, lesson))]
    async fn create(&self, lesson: &NewLesson) -> AppResult<Lesson> {
        debug!(
            "Creating lesson for user {} on {}",
            lesson.user_id, lesson.fecha
        );

        let row = sqlx::query_as::<sqlx::Postgres, LessonRow>(&format!(
            r#"
            INSERT INTO clases (
                user_id, profesor_id, caballo_id, fecha, hora_inicio, hora_fin,
                estado, es_extra, es_reagendada, clase_original_id, notas
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'programada', $7, $8, $9, $10)
            RETURNING {}
            "#,
            LESSON_COLUMNS
        ))
        .bind(lesson.user_id)
        .bind(lesson.profesor_id)
        .bind(lesson.caballo_id)
        .bind(lesson.fecha)
        .bind(lesson.hora_inicio)
        .bind(lesson.hora_fin)
        .bind(lesson.es_extra)
        .bind(lesson.es_reagendada)
        .bind(lesson.clase_original_id)
        .bind(&lesson.notas)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating lesson: {}", e);
            if e.to_string().contains("unique constraint")
                || e.to_string().contains("duplicate key")
            {
                // Lost the slot race to a concurrent booking
                AppError::Database("Lesson slot already taken".to_string())
            } else {
                AppError::Database(format!("Failed to create lesson: {}", e))
            }
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn find_by_id_for_user(&self, id: Uuid, user_id: Uuid) -> AppResult<Option<Lesson>> {
        let row = sqlx::query_as::<sqlx::Postgres, LessonRow>(&format!(
            "SELECT {} FROM clases WHERE id = $1 AND user_id = $2",
            LESSON_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding lesson {}: {}", id, e);
            AppError::Database(format!("Failed to find lesson: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn teacher_has_overlap(
        &self,
        profesor_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM clases
                WHERE profesor_id = $1
                  AND fecha = $2
                  AND estado = 'programada'
                  AND hora_inicio < $4
                  AND hora_fin > $3
            )
            "#,
        )
        .bind(profesor_id)
        .bind(fecha)
        .bind(hora_inicio)
        .bind(hora_fin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking teacher overlap: {}", e);
            AppError::Database(format!("Failed to check teacher availability: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn horse_has_overlap(
        &self,
        caballo_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM clases
                WHERE caballo_id = $1
                  AND fecha = $2
                  AND estado = 'programada'
                  AND hora_inicio < $4
                  AND hora_fin > $3
            )
            "#,
        )
        .bind(caballo_id)
        .bind(fecha)
        .bind(hora_inicio)
        .bind(hora_fin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking horse overlap: {}", e);
            AppError::Database(format!("Failed to check horse availability: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn count_scheduled_for_horse_on(
        &self,
        caballo_id: Uuid,
        fecha: NaiveDate,
    ) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM clases
            WHERE caballo_id = $1 AND fecha = $2 AND estado = 'programada'
            "#,
        )
        .bind(caballo_id)
        .bind(fecha)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting horse lessons: {}", e);
            AppError::Database(format!("Failed to count horse lessons: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn user_has_scheduled_on(&self, user_id: Uuid, fecha: NaiveDate) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM clases
                WHERE user_id = $1 AND fecha = $2 AND estado = 'programada'
            )
            "#,
        )
        .bind(user_id)
        .bind(fecha)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking rider's day: {}", e);
            AppError::Database(format!("Failed to check rider schedule: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn co_owner_has_overlap(
        &self,
        caballo_id: Uuid,
        co_owner_id: Uuid,
        fecha: NaiveDate,
        hora_inicio: NaiveTime,
        hora_fin: NaiveTime,
    ) -> AppResult<bool> {
        let result: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM clases
                WHERE caballo_id = $1
                  AND user_id = $2
                  AND fecha = $3
                  AND estado = 'programada'
                  AND hora_inicio < $5
                  AND hora_fin > $4
            )
            "#,
        )
        .bind(caballo_id)
        .bind(co_owner_id)
        .bind(fecha)
        .bind(hora_inicio)
        .bind(hora_fin)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error checking co-owner overlap: {}", e);
            AppError::Database(format!("Failed to check co-owner schedule: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn set_estado(&self, id: Uuid, estado: LessonStatus) -> AppResult<()> {
        sqlx::query("UPDATE clases SET estado = $2 WHERE id = $1")
            .bind(id)
            .bind(estado.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error updating lesson {} state: {}", id, e);
                AppError::Database(format!("Failed to update lesson state: {}", e))
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_scheduled_before(&self, user_id: Uuid, before: NaiveDate) -> AppResult<i64> {
        let result: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM clases
            WHERE user_id = $1 AND estado = 'programada' AND fecha < $2
            "#,
        )
        .bind(user_id)
        .bind(before)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error counting past lessons: {}", e);
            AppError::Database(format!("Failed to count past lessons: {}", e))
        })?;

        Ok(result.0)
    }

    #[instrument(skip(self))]
    async fn list_scheduled_for_teacher_between(
        &self,
        profesor_id: Uuid,
        desde: NaiveDate,
        hasta: NaiveDate,
    ) -> AppResult<Vec<Lesson>> {
        let rows = sqlx::query_as::<sqlx::Postgres, LessonRow>(&format!(
            r#"
            SELECT {}
            FROM clases
            WHERE profesor_id = $1
              AND fecha >= $2
              AND fecha <= $3
              AND estado = 'programada'
            ORDER BY fecha, hora_inicio
            "#,
            LESSON_COLUMNS
        ))
        .bind(profesor_id)
        .bind(desde)
        .bind(hasta)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing teacher lessons: {}", e);
            AppError::Database(format!("Failed to list teacher lessons: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
