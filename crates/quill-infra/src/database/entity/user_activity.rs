//! Per-user activity counters.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::UserActivity;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub user_name: String,
    pub user_email: Option<String>,
    pub user_photo: Option<String>,
    pub last_active: DateTimeWithTimeZone,
    pub joined_at: DateTimeWithTimeZone,
    pub total_views: i64,
    pub total_likes: i64,
    pub total_comments: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for UserActivity {
    fn from(model: Model) -> Self {
        Self {
            user_id: model.user_id,
            user_name: model.user_name,
            user_email: model.user_email,
            user_photo: model.user_photo,
            last_active: model.last_active.into(),
            joined_at: model.joined_at.into(),
            total_views: model.total_views,
            total_likes: model.total_likes,
            total_comments: model.total_comments,
        }
    }
}

impl From<UserActivity> for ActiveModel {
    fn from(activity: UserActivity) -> Self {
        Self {
            user_id: Set(activity.user_id),
            user_name: Set(activity.user_name),
            user_email: Set(activity.user_email),
            user_photo: Set(activity.user_photo),
            last_active: Set(activity.last_active.into()),
            joined_at: Set(activity.joined_at.into()),
            total_views: Set(activity.total_views),
            total_likes: Set(activity.total_likes),
            total_comments: Set(activity.total_comments),
        }
    }
}
