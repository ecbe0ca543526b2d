use std::sync::Arc;

use crate::entities::blog_post_entity as posts;
use crate::error::{AppError, AppResult, FieldError};
use crate::models::*;
use crate::utils::{DEFAULT_BLOG_LIMIT, resolve_limit, slugify};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};

#[derive(Clone)]
pub struct BlogService {
    pool: Arc<DatabaseConnection>,
}

fn slug_conflict(slug: &str) -> AppError {
    AppError::Conflict(format!("A blog post with slug '{slug}' already exists"))
}

/// The unique index on `slug` is the final arbiter when two writers race past the pre-check.
fn map_unique_violation(err: DbErr, slug: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => slug_conflict(slug),
        _ => AppError::DatabaseError(err),
    }
}

impl BlogService {
    pub fn new(pool: Arc<DatabaseConnection>) -> Self {
        Self { pool }
    }

    /// Newest posts first. Drafts are included only when `published_only` is false.
    pub async fn list_posts(
        &self,
        published_only: bool,
        limit: Option<i64>,
    ) -> AppResult<Vec<posts::Model>> {
        let mut query = posts::Entity::find();
        if published_only {
            query = query.filter(posts::Column::Published.eq(true));
        }

        let models = query
            .order_by_desc(posts::Column::CreatedAt)
            .limit(resolve_limit(limit, DEFAULT_BLOG_LIMIT))
            .all(self.pool.as_ref())
            .await?;
        Ok(models)
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> AppResult<Option<posts::Model>> {
        let post = posts::Entity::find()
            .filter(posts::Column::Slug.eq(slug))
            .one(self.pool.as_ref())
            .await?;
        Ok(post)
    }

    pub async fn get_post(&self, id: i64) -> AppResult<Option<posts::Model>> {
        Ok(posts::Entity::find_by_id(id).one(self.pool.as_ref()).await?)
    }

    async fn ensure_slug_free(&self, slug: &str, except_id: Option<i64>) -> AppResult<()> {
        if let Some(existing) = self.get_post_by_slug(slug).await?
            && Some(existing.id) != except_id
        {
            return Err(slug_conflict(slug));
        }
        Ok(())
    }

    pub async fn create_post(&self, request: CreateBlogPostRequest) -> AppResult<posts::Model> {
        request.validate()?;

        let slug = match normalize_optional(request.slug) {
            Some(s) => s,
            None => slugify(&request.title),
        };
        if slug.is_empty() {
            return Err(AppError::InvalidFields(vec![FieldError::new(
                "slug",
                "cannot be derived from the title; provide one explicitly",
            )]));
        }
        self.ensure_slug_free(&slug, None).await?;

        let now = Utc::now();
        let model = posts::ActiveModel {
            title: Set(request.title.trim().to_string()),
            slug: Set(slug.clone()),
            excerpt: Set(normalize_optional(request.excerpt)),
            content: Set(request.content),
            category: Set(request.category.trim().to_string()),
            author: Set(request.author.trim().to_string()),
            reading_time: Set(request.reading_time),
            featured_image: Set(normalize_optional(request.featured_image)),
            published: Set(request.published.unwrap_or(false)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(self.pool.as_ref())
        .await
        .map_err(|e| map_unique_violation(e, &slug))?;

        log::info!("Blog post {} created with slug '{}'", model.id, model.slug);
        Ok(model)
    }

    pub async fn update_post(
        &self,
        id: i64,
        request: UpdateBlogPostRequest,
    ) -> AppResult<posts::Model> {
        request.validate()?;

        let existing = self
            .get_post(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Blog post not found".to_string()))?;

        let new_slug = request.slug.as_deref().map(str::trim).map(str::to_string);
        if let Some(slug) = &new_slug
            && *slug != existing.slug
        {
            self.ensure_slug_free(slug, Some(id)).await?;
        }
        let slug_for_error = new_slug.clone().unwrap_or_else(|| existing.slug.clone());

        let mut model = existing.into_active_model();
        if let Some(v) = request.title {
            model.title = Set(v.trim().to_string());
        }
        if let Some(v) = new_slug {
            model.slug = Set(v);
        }
        if let Some(v) = request.excerpt {
            model.excerpt = Set(normalize_optional(v));
        }
        if let Some(v) = request.content {
            model.content = Set(v);
        }
        if let Some(v) = request.category {
            model.category = Set(v.trim().to_string());
        }
        if let Some(v) = request.author {
            model.author = Set(v.trim().to_string());
        }
        if let Some(v) = request.reading_time {
            model.reading_time = Set(v);
        }
        if let Some(v) = request.featured_image {
            model.featured_image = Set(normalize_optional(v));
        }
        if let Some(v) = request.published {
            model.published = Set(v);
        }
        model.updated_at = Set(Utc::now());

        let updated = model
            .update(self.pool.as_ref())
            .await
            .map_err(|e| map_unique_violation(e, &slug_for_error))?;
        Ok(updated)
    }

    pub async fn delete_post(&self, id: i64) -> AppResult<()> {
        let result = posts::Entity::delete_by_id(id).exec(self.pool.as_ref()).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Blog post not found".to_string()));
        }
        log::info!("Blog post {id} deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn stored_post(id: i64, slug: &str) -> posts::Model {
        let at = Utc.with_ymd_and_hms(2025, 9, 10, 8, 0, 0).unwrap();
        posts::Model {
            id,
            title: "Value bets: week 38".to_string(),
            slug: slug.to_string(),
            excerpt: None,
            content: "Three picks above 2.00".to_string(),
            category: "analyse".to_string(),
            author: "Admin".to_string(),
            reading_time: Some(3),
            featured_image: None,
            published: true,
            created_at: at,
            updated_at: at,
        }
    }

    fn request(slug: Option<&str>) -> CreateBlogPostRequest {
        CreateBlogPostRequest {
            title: "Value bets: week 38".to_string(),
            slug: slug.map(str::to_string),
            excerpt: None,
            content: "Three picks above 2.00".to_string(),
            category: "analyse".to_string(),
            author: "Admin".to_string(),
            reading_time: Some(3),
            featured_image: None,
            published: Some(true),
        }
    }

    #[tokio::test]
    async fn test_create_post_derives_slug_from_title() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<posts::Model>::new()])
            .append_query_results([vec![stored_post(1, "value-bets-week-38")]])
            .into_connection();
        let service = BlogService::new(Arc::new(db));

        let post = service.create_post(request(None)).await.unwrap();
        assert_eq!(post.slug, "value-bets-week-38");
    }

    #[tokio::test]
    async fn test_create_post_rejects_taken_slug() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_post(4, "value-bets-week-38")]])
            .into_connection();
        let service = BlogService::new(Arc::new(db));

        let err = service
            .create_post(request(Some("value-bets-week-38")))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_missing_post_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([sea_orm::MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();
        let service = BlogService::new(Arc::new(db));

        let err = service.delete_post(99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
