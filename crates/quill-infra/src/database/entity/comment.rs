//! Comment entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::Comment;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Post or tutorial id; comments on both kinds share this table.
    pub post_id: Uuid,
    pub user_id: String,
    pub user_name: String,
    pub user_photo: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub likes: i64,
    pub approved: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Comment {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            post_id: model.post_id,
            user_id: model.user_id,
            user_name: model.user_name,
            user_photo: model.user_photo,
            content: model.content,
            parent_id: model.parent_id,
            likes: model.likes,
            approved: model.approved,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Comment> for ActiveModel {
    fn from(comment: Comment) -> Self {
        Self {
            id: Set(comment.id),
            post_id: Set(comment.post_id),
            user_id: Set(comment.user_id),
            user_name: Set(comment.user_name),
            user_photo: Set(comment.user_photo),
            content: Set(comment.content),
            parent_id: Set(comment.parent_id),
            likes: Set(comment.likes),
            approved: Set(comment.approved),
            created_at: Set(comment.created_at.into()),
            updated_at: Set(comment.updated_at.into()),
        }
    }
}
