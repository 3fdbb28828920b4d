//! Analytics event entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use quill_core::domain::{AnalyticsEvent, EventKind};
use quill_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "analytics_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event: String,
    pub post_id: Option<Uuid>,
    pub post_title: Option<String>,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
    pub timestamp: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for AnalyticsEvent {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let kind: EventKind = model.event.parse().map_err(RepoError::Query)?;
        Ok(Self {
            id: model.id,
            kind,
            post_id: model.post_id,
            post_title: model.post_title,
            user_id: model.user_id,
            user_name: model.user_name,
            metadata: model.metadata,
            timestamp: model.timestamp.into(),
        })
    }
}

impl From<AnalyticsEvent> for ActiveModel {
    fn from(event: AnalyticsEvent) -> Self {
        Self {
            id: Set(event.id),
            event: Set(event.kind.as_str().to_string()),
            post_id: Set(event.post_id),
            post_title: Set(event.post_title),
            user_id: Set(event.user_id),
            user_name: Set(event.user_name),
            metadata: Set(event.metadata),
            timestamp: Set(event.timestamp.into()),
        }
    }
}
