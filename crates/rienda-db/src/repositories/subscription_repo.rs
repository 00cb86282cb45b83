//! Subscription repository implementation
//!
//! Counter mutations are single atomic UPDATE statements; the services
//! never read-then-write the global usage counter.

use async_trait::async_trait;
use chrono::NaiveDate;
use rienda_core::{models::Subscription, traits::SubscriptionRepository, AppError, AppResult};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: Uuid,
    plan_id: Uuid,
    fecha_inicio: NaiveDate,
    fecha_fin: Option<NaiveDate>,
    clases_incluidas: i32,
    clases_usadas: i32,
    activa: bool,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            plan_id: row.plan_id,
            fecha_inicio: row.fecha_inicio,
            fecha_fin: row.fecha_fin,
            clases_incluidas: row.clases_incluidas,
            clases_usadas: row.clases_usadas,
            activa: row.activa,
        }
    }
}

const SUB_COLUMNS: &str =
    "id, user_id, plan_id, fecha_inicio, fecha_fin, clases_incluidas, clases_usadas, activa";

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Subscription>> {
        let row = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            "SELECT {} FROM suscripciones WHERE id = $1",
            SUB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding subscription {}: {}", id, e);
            AppError::Database(format!("Failed to find subscription: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_active_by_user(&self, user_id: Uuid) -> AppResult<Option<Subscription>> {
        debug!("Finding active subscription for user {}", user_id);

        let row = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            r#"
            SELECT {}
            FROM suscripciones
            WHERE user_id = $1 AND activa = TRUE
            ORDER BY fecha_inicio DESC
            LIMIT 1
            "#,
            SUB_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding active subscription: {}", e);
            AppError::Database(format!("Failed to find subscription: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn find_current_by_user(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> AppResult<Option<Subscription>> {
        let row = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            r#"
            SELECT {}
            FROM suscripciones
            WHERE user_id = $1
              AND activa = TRUE
              AND fecha_inicio <= $2
              AND (fecha_fin IS NULL OR fecha_fin >= $2)
            ORDER BY fecha_inicio DESC
            LIMIT 1
            "#,
            SUB_COLUMNS
        ))
        .bind(user_id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding current subscription: {}", e);
            AppError::Database(format!("Failed to find subscription: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, subscription))]
    async fn create(&self, subscription: &Subscription) -> AppResult<Subscription> {
        debug!("Creating subscription for user {}", subscription.user_id);

        let row = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            r#"
            INSERT INTO suscripciones (
                user_id, plan_id, fecha_inicio, fecha_fin,
                clases_incluidas, clases_usadas, activa
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SUB_COLUMNS
        ))
        .bind(subscription.user_id)
        .bind(subscription.plan_id)
        .bind(subscription.fecha_inicio)
        .bind(subscription.fecha_fin)
        .bind(subscription.clases_incluidas)
        .bind(subscription.clases_usadas)
        .bind(subscription.activa)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error creating subscription: {}", e);
            AppError::Database(format!("Failed to create subscription: {}", e))
        })?;

        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn deactivate_all_for_user(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE suscripciones SET activa = FALSE WHERE user_id = $1 AND activa = TRUE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error deactivating subscriptions: {}", e);
            AppError::Database(format!("Failed to deactivate subscriptions: {}", e))
        })?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn set_classes_used(&self, id: Uuid, clases_usadas: i32) -> AppResult<()> {
        sqlx::query("UPDATE suscripciones SET clases_usadas = $2 WHERE id = $1")
            .bind(id)
            .bind(clases_usadas)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error setting classes used: {}", e);
                AppError::Database(format!("Failed to update classes used: {}", e))
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn increment_classes_used(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("UPDATE suscripciones SET clases_usadas = clases_usadas + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("Database error incrementing classes used: {}", e);
                AppError::Database(format!("Failed to increment classes used: {}", e))
            })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn decrement_classes_used(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            "UPDATE suscripciones SET clases_usadas = GREATEST(clases_usadas - 1, 0) WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error decrementing classes used: {}", e);
            AppError::Database(format!("Failed to decrement classes used: {}", e))
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_active_escuelita(&self) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            r#"
            SELECT s.{}
            FROM suscripciones s
            INNER JOIN users u ON u.id = s.user_id
            WHERE s.activa = TRUE AND u.activo = TRUE AND u.rol = 'escuelita'
            ORDER BY s.fecha_inicio
            "#,
            SUB_COLUMNS.replace(", ", ", s."),
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing escuelita subscriptions: {}", e);
            AppError::Database(format!("Failed to list subscriptions: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self, user_ids))]
    async fn list_active_by_users(&self, user_ids: &[Uuid]) -> AppResult<Vec<Subscription>> {
        let rows = sqlx::query_as::<sqlx::Postgres, SubscriptionRow>(&format!(
            r#"
            SELECT {}
            FROM suscripciones
            WHERE activa = TRUE AND user_id = ANY($1)
            "#,
            SUB_COLUMNS
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing subscriptions by users: {}", e);
            AppError::Database(format!("Failed to list subscriptions: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
