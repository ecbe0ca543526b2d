use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::blog_post_entity;
use crate::error::AppResult;
use crate::models::double_option;
use crate::utils::{FieldErrors, is_valid_slug};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BlogQuery {
    /// `false` also lists drafts (admins only); defaults to `true`
    pub published: Option<bool>,
    /// Maximum number of posts (default 20)
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogPostRequest {
    #[schema(example = "Les 5 value bets du week-end")]
    pub title: String,
    /// Derived from the title when omitted or blank
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    #[schema(example = "analyse")]
    pub category: String,
    pub author: String,
    pub reading_time: Option<i32>,
    pub featured_image: Option<String>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub excerpt: Option<Option<String>>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub author: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i32>)]
    pub reading_time: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub featured_image: Option<Option<String>>,
    pub published: Option<bool>,
}

fn check_reading_time(errors: &mut FieldErrors, reading_time: Option<i32>) {
    if let Some(minutes) = reading_time
        && minutes < 1
    {
        errors.add("readingTime", "must be at least 1 minute");
    }
}

fn check_slug(errors: &mut FieldErrors, slug: &str) {
    if !is_valid_slug(slug) {
        errors.add(
            "slug",
            "must contain only lowercase letters, digits and single hyphens",
        );
    }
}

impl CreateBlogPostRequest {
    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        errors.require_text("title", &self.title);
        errors.require_text("content", &self.content);
        errors.require_text("category", &self.category);
        errors.require_text("author", &self.author);
        if let Some(slug) = self.slug.as_deref().map(str::trim)
            && !slug.is_empty()
        {
            check_slug(&mut errors, slug);
        }
        check_reading_time(&mut errors, self.reading_time);
        errors.into_result()
    }
}

impl UpdateBlogPostRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.excerpt.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.author.is_none()
            && self.reading_time.is_none()
            && self.featured_image.is_none()
            && self.published.is_none()
    }

    pub fn validate(&self) -> AppResult<()> {
        let mut errors = FieldErrors::new();
        if self.is_empty() {
            errors.add("body", "no fields to update");
        }
        errors.require_text_if_set("title", self.title.as_ref());
        errors.require_text_if_set("content", self.content.as_ref());
        errors.require_text_if_set("category", self.category.as_ref());
        errors.require_text_if_set("author", self.author.as_ref());
        if let Some(slug) = &self.slug {
            check_slug(&mut errors, slug.trim());
        }
        check_reading_time(&mut errors, self.reading_time.flatten());
        errors.into_result()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub category: String,
    pub author: String,
    pub reading_time: Option<i32>,
    pub featured_image: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<blog_post_entity::Model> for BlogPostResponse {
    fn from(m: blog_post_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            slug: m.slug,
            excerpt: m.excerpt,
            content: m.content,
            category: m.category,
            author: m.author,
            reading_time: m.reading_time,
            featured_image: m.featured_image,
            published: m.published,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
