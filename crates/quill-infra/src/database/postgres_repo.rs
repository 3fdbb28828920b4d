//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, NullOrdering, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use quill_core::domain::{
    AnalyticsEvent, Article, ArticleKind, ArticleQuery, Category, Comment, CommentQuery,
    EventQuery, NewComment, SiteSettings, UserActivity,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    AdminDirectory, AnalyticsRepository, ArticleRepository, CategoryRepository,
    CommentRepository, SettingsRepository,
};

use super::entity::{
    admin, analytics_event, category, comment, post, setting, tutorial, user_activity,
};
use super::postgres_base::{PostgresBaseRepository, UpsertEntity, db_err};

pub type PostgresPostRepository = PostgresBaseRepository<post::Entity>;
pub type PostgresTutorialRepository = PostgresBaseRepository<tutorial::Entity>;
pub type PostgresCategoryRepository = PostgresBaseRepository<category::Entity>;
pub type PostgresCommentRepository = PostgresBaseRepository<comment::Entity>;
pub type PostgresAdminDirectory = PostgresBaseRepository<admin::Entity>;
pub type PostgresAnalyticsRepository = PostgresBaseRepository<analytics_event::Entity>;
pub type PostgresSettingsRepository = PostgresBaseRepository<setting::Entity>;

/// Posts and tutorials share one implementation; the macro fills in the entity module.
macro_rules! article_repository {
    ($repo:ty, $entity:ident, $kind:expr) => {
        impl UpsertEntity for $entity::Entity {
            // Counters and creation metadata are never overwritten by an update.
            fn on_conflict() -> OnConflict {
                OnConflict::column($entity::Column::Id)
                    .update_columns([
                        $entity::Column::Title,
                        $entity::Column::Slug,
                        $entity::Column::Content,
                        $entity::Column::Excerpt,
                        $entity::Column::CoverImage,
                        $entity::Column::Category,
                        $entity::Column::Tags,
                        $entity::Column::Published,
                        $entity::Column::PublishedAt,
                        $entity::Column::UpdatedAt,
                        $entity::Column::ReadingTime,
                        $entity::Column::Difficulty,
                    ])
                    .to_owned()
            }
        }

        #[async_trait]
        impl ArticleRepository for $repo {
            fn kind(&self) -> ArticleKind {
                $kind
            }

            async fn find_by_slug(&self, slug: &str) -> Result<Option<Article>, RepoError> {
                let result = $entity::Entity::find()
                    .filter($entity::Column::Slug.eq(slug))
                    .one(&self.db)
                    .await
                    .map_err(db_err)?;
                Ok(result.map(Into::into))
            }

            async fn list(&self, query: &ArticleQuery) -> Result<Vec<Article>, RepoError> {
                let mut select = $entity::Entity::find();
                if let Some(published) = query.published {
                    select = select.filter($entity::Column::Published.eq(published));
                }
                if let Some(category) = &query.category {
                    select = select.filter($entity::Column::Category.eq(category.as_str()));
                }
                if let Some(tag) = &query.tag {
                    select = select.filter(Expr::cust_with_values(
                        "tags @> $1",
                        [serde_json::json!([tag])],
                    ));
                }
                if let Some(difficulty) = query.difficulty {
                    select = select.filter($entity::Column::Difficulty.eq(difficulty.as_str()));
                }

                select = select
                    .order_by_with_nulls($entity::Column::PublishedAt, Order::Desc, NullOrdering::Last)
                    .order_by_desc($entity::Column::CreatedAt);
                if let Some(offset) = query.offset {
                    select = select.offset(offset);
                }
                if let Some(limit) = query.limit {
                    select = select.limit(limit);
                }

                let rows = select.all(&self.db).await.map_err(db_err)?;
                Ok(rows.into_iter().map(Into::into).collect())
            }

            async fn increment_views(&self, id: Uuid) -> Result<(), RepoError> {
                let result = $entity::Entity::update_many()
                    .col_expr($entity::Column::Views, Expr::col($entity::Column::Views).add(1))
                    .filter($entity::Column::Id.eq(id))
                    .exec(&self.db)
                    .await
                    .map_err(db_err)?;
                if result.rows_affected == 0 {
                    return Err(RepoError::NotFound);
                }
                Ok(())
            }

            async fn increment_likes(&self, id: Uuid) -> Result<(), RepoError> {
                let result = $entity::Entity::update_many()
                    .col_expr($entity::Column::Likes, Expr::col($entity::Column::Likes).add(1))
                    .filter($entity::Column::Id.eq(id))
                    .exec(&self.db)
                    .await
                    .map_err(db_err)?;
                if result.rows_affected == 0 {
                    return Err(RepoError::NotFound);
                }
                Ok(())
            }

            async fn count_by_category(&self) -> Result<HashMap<String, u64>, RepoError> {
                let rows: Vec<(String, i64)> = $entity::Entity::find()
                    .select_only()
                    .column($entity::Column::Category)
                    .column_as(Expr::col($entity::Column::Id).count(), "count")
                    .group_by($entity::Column::Category)
                    .into_tuple()
                    .all(&self.db)
                    .await
                    .map_err(db_err)?;
                Ok(rows
                    .into_iter()
                    .map(|(slug, count)| (slug, count.max(0) as u64))
                    .collect())
            }

            async fn count_in_category(&self, slug: &str) -> Result<u64, RepoError> {
                $entity::Entity::find()
                    .filter($entity::Column::Category.eq(slug))
                    .count(&self.db)
                    .await
                    .map_err(db_err)
            }
        }
    };
}

article_repository!(PostgresPostRepository, post, ArticleKind::Post);
article_repository!(PostgresTutorialRepository, tutorial, ArticleKind::Tutorial);

impl UpsertEntity for category::Entity {
    fn on_conflict() -> OnConflict {
        OnConflict::column(category::Column::Id)
            .update_columns([
                category::Column::Name,
                category::Column::Slug,
                category::Column::Description,
                category::Column::Color,
                category::Column::Icon,
            ])
            .to_owned()
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let rows = category::Entity::find()
            .order_by_asc(category::Column::Name)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_post_count(&self, id: Uuid, count: i64) -> Result<(), RepoError> {
        let result = category::Entity::update_many()
            .col_expr(category::Column::PostCount, Expr::value(count))
            .filter(category::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn insert(&self, new: NewComment) -> Result<Comment, RepoError> {
        let pending = Comment::pending(new, Utc::now());
        let model = comment::Entity::insert(comment::ActiveModel::from(pending))
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let result = comment::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn list(&self, query: &CommentQuery) -> Result<Vec<Comment>, RepoError> {
        let mut select = comment::Entity::find();
        if let Some(post_id) = query.post_id {
            select = select.filter(comment::Column::PostId.eq(post_id));
        }
        if let Some(approved) = query.approved {
            select = select.filter(comment::Column::Approved.eq(approved));
        }
        select = select.order_by_desc(comment::Column::CreatedAt);
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        let rows = select.all(&self.db).await.map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn approve(&self, id: Uuid) -> Result<Comment, RepoError> {
        let model = comment::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or(RepoError::NotFound)?;
        if model.approved {
            return Ok(model.into());
        }

        let mut active = model.into_active_model();
        active.approved = Set(true);
        active.updated_at = Set(Utc::now().into());
        let updated = active.update(&self.db).await.map_err(db_err)?;
        Ok(updated.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = comment::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let result = comment::Entity::delete_many()
            .filter(comment::Column::PostId.eq(post_id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected)
    }

    async fn increment_likes(&self, id: Uuid) -> Result<(), RepoError> {
        let result = comment::Entity::update_many()
            .col_expr(comment::Column::Likes, Expr::col(comment::Column::Likes).add(1))
            .filter(comment::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl AdminDirectory for PostgresAdminDirectory {
    async fn is_admin(&self, user_id: &str) -> Result<bool, RepoError> {
        let found = admin::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(found.is_some())
    }

    async fn grant(&self, user_id: &str) -> Result<(), RepoError> {
        let row = admin::ActiveModel {
            user_id: Set(user_id.to_string()),
            created_at: Set(Utc::now().into()),
        };
        let result = admin::Entity::insert(row)
            .on_conflict(
                OnConflict::column(admin::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(&self.db)
            .await;

        match result {
            Ok(_) | Err(DbErr::RecordNotInserted) => {
                tracing::info!(user_id = %user_id, "Admin granted");
                Ok(())
            }
            Err(e) => Err(db_err(e)),
        }
    }
}

#[async_trait]
impl AnalyticsRepository for PostgresAnalyticsRepository {
    async fn record_event(&self, event: AnalyticsEvent) -> Result<(), RepoError> {
        analytics_event::Entity::insert(analytics_event::ActiveModel::from(event))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn events(&self, query: &EventQuery) -> Result<Vec<AnalyticsEvent>, RepoError> {
        let mut select = analytics_event::Entity::find();
        if let Some(kind) = query.kind {
            select = select.filter(analytics_event::Column::Event.eq(kind.as_str()));
        }
        if let Some(post_id) = query.post_id {
            select = select.filter(analytics_event::Column::PostId.eq(post_id));
        }
        if let Some(user_id) = &query.user_id {
            select = select.filter(analytics_event::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(since) = query.since {
            select = select.filter(analytics_event::Column::Timestamp.gte(since));
        }
        if let Some(until) = query.until {
            select = select.filter(analytics_event::Column::Timestamp.lte(until));
        }
        select = select.order_by_desc(analytics_event::Column::Timestamp);
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        select
            .all(&self.db)
            .await
            .map_err(db_err)?
            .into_iter()
            .map(AnalyticsEvent::try_from)
            .collect()
    }

    async fn find_activity(&self, user_id: &str) -> Result<Option<UserActivity>, RepoError> {
        let result = user_activity::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.map(Into::into))
    }

    async fn save_activity(&self, activity: UserActivity) -> Result<UserActivity, RepoError> {
        let model = user_activity::Entity::insert(user_activity::ActiveModel::from(activity))
            .on_conflict(
                OnConflict::column(user_activity::Column::UserId)
                    .update_columns([
                        user_activity::Column::UserName,
                        user_activity::Column::UserEmail,
                        user_activity::Column::UserPhoto,
                        user_activity::Column::LastActive,
                        user_activity::Column::TotalViews,
                        user_activity::Column::TotalLikes,
                        user_activity::Column::TotalComments,
                    ])
                    .to_owned(),
            )
            .exec_with_returning(&self.db)
            .await
            .map_err(db_err)?;
        Ok(model.into())
    }

    async fn list_activity(&self, limit: u64) -> Result<Vec<UserActivity>, RepoError> {
        let rows = user_activity::Entity::find()
            .order_by_desc(user_activity::Column::LastActive)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl SettingsRepository for PostgresSettingsRepository {
    async fn load(&self) -> Result<Option<SiteSettings>, RepoError> {
        let Some(row) = setting::Entity::find_by_id(setting::SITE_KEY.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
        else {
            return Ok(None);
        };

        serde_json::from_value(row.data)
            .map(Some)
            .map_err(|e| RepoError::Query(format!("Corrupt settings document: {e}")))
    }

    async fn store(&self, settings: SiteSettings) -> Result<SiteSettings, RepoError> {
        let data = serde_json::to_value(&settings).map_err(|e| RepoError::Query(e.to_string()))?;
        let row = setting::ActiveModel {
            key: Set(setting::SITE_KEY.to_string()),
            data: Set(data),
            updated_at: Set(settings.updated_at.unwrap_or_else(Utc::now).into()),
        };
        setting::Entity::insert(row)
            .on_conflict(
                OnConflict::column(setting::Column::Key)
                    .update_columns([setting::Column::Data, setting::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(settings)
    }
}
