//! User repository implementation

use async_trait::async_trait;
use rienda_core::{
    models::{User, UserRole},
    traits::UserRepository,
    AppError, AppResult,
};
use sqlx::PgPool;
use tracing::{debug, error, instrument};
use uuid::Uuid;

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    nombre: String,
    apellido: String,
    email: String,
    rol: String,
    activo: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            nombre: row.nombre,
            apellido: row.apellido,
            email: row.email,
            // Least-privileged rider role if the column holds garbage
            rol: UserRole::from_str(&row.rol).unwrap_or(UserRole::Escuelita),
            activo: row.activo,
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        debug!("Finding user by id: {}", id);

        let row = sqlx::query_as::<sqlx::Postgres, UserRow>(
            r#"
            SELECT id, nombre, apellido, email, rol, activo
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding user {}: {}", id, e);
            AppError::Database(format!("Failed to find user: {}", e))
        })?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self))]
    async fn list_active_by_roles(&self, roles: &[UserRole]) -> AppResult<Vec<User>> {
        let role_names: Vec<String> = roles.iter().map(ToString::to_string).collect();

        let rows = sqlx::query_as::<sqlx::Postgres, UserRow>(
            r#"
            SELECT id, nombre, apellido, email, rol, activo
            FROM users
            WHERE activo = TRUE AND rol = ANY($1)
            ORDER BY apellido, nombre
            "#,
        )
        .bind(&role_names)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing users by roles: {}", e);
            AppError::Database(format!("Failed to list users: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
