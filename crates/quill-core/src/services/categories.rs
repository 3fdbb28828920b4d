//! Category management and the post-count recount.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{Category, CategoryCount, CategoryDraft, ChangeEvent, ChangeKind, Collection};
use crate::error::DomainError;
use crate::ports::{ArticleRepository, CategoryRepository, ChangeFeed};
use crate::validation::validate_category;

use super::notify;

pub struct CategoryService {
    categories: Arc<dyn CategoryRepository>,
    posts: Arc<dyn ArticleRepository>,
    tutorials: Arc<dyn ArticleRepository>,
    feed: Arc<dyn ChangeFeed>,
}

impl CategoryService {
    pub fn new(
        categories: Arc<dyn CategoryRepository>,
        posts: Arc<dyn ArticleRepository>,
        tutorials: Arc<dyn ArticleRepository>,
        feed: Arc<dyn ChangeFeed>,
    ) -> Self {
        Self {
            categories,
            posts,
            tutorials,
            feed,
        }
    }

    /// All categories by name.
    pub async fn list(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.categories.list().await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        self.categories
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", slug))
    }

    pub async fn create(&self, draft: CategoryDraft) -> Result<Category, DomainError> {
        let draft = normalize(draft);
        validate_category(&draft)?;

        if self.categories.find_by_slug(&draft.slug).await?.is_some() {
            return Err(DomainError::Duplicate(format!(
                "Category with slug '{}' already exists",
                draft.slug
            )));
        }

        let saved = self.categories.save(Category::create(draft, Utc::now())).await?;
        tracing::info!(id = %saved.id, slug = %saved.slug, "Category created");
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Categories, ChangeKind::Created, saved.id)).await;
        Ok(saved)
    }

    /// Update a category. The slug can only change while nothing references it.
    pub async fn update(&self, id: Uuid, draft: CategoryDraft) -> Result<Category, DomainError> {
        let draft = normalize(draft);
        validate_category(&draft)?;

        let mut category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", id))?;

        if draft.slug != category.slug {
            if self.categories.find_by_slug(&draft.slug).await?.is_some() {
                return Err(DomainError::Duplicate(format!(
                    "Category with slug '{}' already exists",
                    draft.slug
                )));
            }
            let (posts, tutorials) = self.usage(&category.slug).await?;
            if posts + tutorials > 0 {
                return Err(DomainError::Conflict(format!(
                    "Cannot rename slug of '{}' while {} posts and {} tutorials use it",
                    category.name, posts, tutorials
                )));
            }
        }

        category.apply(draft);
        let saved = self.categories.save(category).await?;
        tracing::info!(id = %saved.id, "Category updated");
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Categories, ChangeKind::Updated, saved.id)).await;
        Ok(saved)
    }

    /// Delete a category that no post or tutorial references.
    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let category = self
            .categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", id))?;

        let (posts, tutorials) = self.usage(&category.slug).await?;
        if posts + tutorials > 0 {
            return Err(DomainError::Conflict(format!(
                "Cannot delete '{}': {} posts and {} tutorials still use it",
                category.name, posts, tutorials
            )));
        }

        self.categories.delete(id).await?;
        tracing::info!(id = %id, slug = %category.slug, "Category deleted");
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Categories, ChangeKind::Deleted, id)).await;
        Ok(())
    }

    /// Recount posts and tutorials per category and store the totals.
    ///
    /// Categories nobody references are reset to zero. Articles whose category
    /// slug matches no category are ignored.
    pub async fn recalculate_counts(&self) -> Result<Vec<CategoryCount>, DomainError> {
        let posts = self.posts.count_by_category().await?;
        let tutorials = self.tutorials.count_by_category().await?;
        let categories = self.categories.list().await?;

        let mut report = Vec::with_capacity(categories.len());
        for category in categories {
            let count = tally(&category, &posts, &tutorials);
            if category.post_count != count.total as i64 {
                self.categories
                    .set_post_count(category.id, count.total as i64)
                    .await?;
            }
            report.push(count);
        }

        tracing::info!(categories = report.len(), "Category counts recalculated");
        notify(self.feed.as_ref(), ChangeEvent::new(Collection::Categories, ChangeKind::Updated, "*")).await;
        Ok(report)
    }

    async fn usage(&self, slug: &str) -> Result<(u64, u64), DomainError> {
        let posts = self.posts.count_in_category(slug).await?;
        let tutorials = self.tutorials.count_in_category(slug).await?;
        Ok((posts, tutorials))
    }
}

fn tally(
    category: &Category,
    posts: &HashMap<String, u64>,
    tutorials: &HashMap<String, u64>,
) -> CategoryCount {
    let p = posts.get(&category.slug).copied().unwrap_or(0);
    let t = tutorials.get(&category.slug).copied().unwrap_or(0);
    CategoryCount {
        slug: category.slug.clone(),
        name: category.name.clone(),
        posts: p,
        tutorials: t,
        total: p + t,
    }
}

fn normalize(mut draft: CategoryDraft) -> CategoryDraft {
    draft.name = draft.name.trim().to_string();
    draft.slug = draft.slug.trim().to_string();
    draft.color = draft.color.trim().to_string();
    draft.icon = draft.icon.trim().to_string();
    draft.description = draft
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    draft
}
