use crate::domain::error::DomainError;
use crate::domain::form::FieldErrors;
use crate::domain::group::{Group, NewGroup};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create(&self, group: NewGroup) -> Result<Group, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError>;
    async fn list(&self) -> Result<Vec<Group>, DomainError>;
    /// Deletes the group; its posts stay with `group_id` cleared.
    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError>;
}

/// Field-level error for a duplicate title or slug.
pub(crate) fn duplicate_group(field: &str) -> DomainError {
    let mut errors = FieldErrors::default();
    let label = match field {
        "title" => "Title",
        _ => "Slug",
    };
    errors.add(field, format!("Group with this {label} already exists."));
    DomainError::Validation(errors)
}

#[derive(Clone)]
pub struct PostgresGroupRepository {
    pool: PgPool,
}

impl PostgresGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn create(&self, group: NewGroup) -> Result<Group, DomainError> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO topic_groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let constraint = e
                .as_database_error()
                .and_then(|db| db.constraint())
                .map(str::to_owned);
            match constraint.as_deref() {
                Some(c) if c.contains("title") => duplicate_group("title"),
                Some(c) if c.contains("slug") => duplicate_group("slug"),
                _ => {
                    error!("failed to create group: {}", e);
                    DomainError::Internal(format!("database error: {}", e))
                }
            }
        })?;

        info!(group_id = group.id, slug = %group.slug, "group created");
        Ok(group)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM topic_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find group by id {}: {}", id, e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM topic_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to find group by slug {}: {}", slug, e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }

    async fn list(&self) -> Result<Vec<Group>, DomainError> {
        sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM topic_groups ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to list groups: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM topic_groups WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(slug = %slug, "group deleted");
        }
        Ok(removed)
    }
}
