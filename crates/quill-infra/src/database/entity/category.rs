//! Category entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::Category;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub icon: String,
    pub post_count: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Category {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            color: model.color,
            icon: model.icon,
            post_count: model.post_count,
            created_at: model.created_at.into(),
        }
    }
}

impl From<Category> for ActiveModel {
    fn from(category: Category) -> Self {
        Self {
            id: Set(category.id),
            name: Set(category.name),
            slug: Set(category.slug),
            description: Set(category.description),
            color: Set(category.color),
            icon: Set(category.icon),
            post_count: Set(category.post_count),
            created_at: Set(category.created_at.into()),
        }
    }
}
