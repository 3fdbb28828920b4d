//! Post entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::{Article, ArticleKind};

use super::{difficulty_from_column, tags_from_json, tags_to_json};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub excerpt: String,
    pub cover_image: Option<String>,
    pub category: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub tags: Json,
    pub published: bool,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
    pub author_id: String,
    pub author_name: String,
    pub reading_time: i32,
    pub views: i64,
    pub likes: i64,
    pub difficulty: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Article {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            kind: ArticleKind::Post,
            title: model.title,
            slug: model.slug,
            content: model.content,
            excerpt: model.excerpt,
            cover_image: model.cover_image,
            category: model.category,
            tags: tags_from_json(model.tags),
            published: model.published,
            published_at: model.published_at.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
            author_id: model.author_id,
            author_name: model.author_name,
            reading_time: model.reading_time,
            views: model.views,
            likes: model.likes,
            difficulty: difficulty_from_column(model.difficulty),
        }
    }
}

impl From<Article> for ActiveModel {
    fn from(article: Article) -> Self {
        Self {
            id: Set(article.id),
            title: Set(article.title),
            slug: Set(article.slug),
            content: Set(article.content),
            excerpt: Set(article.excerpt),
            cover_image: Set(article.cover_image),
            category: Set(article.category),
            tags: Set(tags_to_json(article.tags)),
            published: Set(article.published),
            published_at: Set(article.published_at.map(Into::into)),
            created_at: Set(article.created_at.into()),
            updated_at: Set(article.updated_at.into()),
            author_id: Set(article.author_id),
            author_name: Set(article.author_name),
            reading_time: Set(article.reading_time),
            views: Set(article.views),
            likes: Set(article.likes),
            difficulty: Set(article.difficulty.map(|d| d.as_str().to_string())),
        }
    }
}
