use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240101_000001_create_tables"
    }
}

/// Posts and tutorials share one column layout.
const ARTICLE_TABLES: [&str; 2] = ["posts", "tutorials"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in ARTICLE_TABLES {
            manager.create_table(article_table(table)).await?;
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(format!("idx_{table}_category"))
                        .table(Alias::new(table))
                        .col(Article::Category)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Categories::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::Slug).string().not_null().unique_key())
                    .col(ColumnDef::new(Categories::Description).string())
                    .col(ColumnDef::new(Categories::Color).string().not_null())
                    .col(ColumnDef::new(Categories::Icon).string().not_null())
                    .col(
                        ColumnDef::new(Categories::PostCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Categories::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comments::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comments::PostId).uuid().not_null())
                    .col(ColumnDef::new(Comments::UserId).string().not_null())
                    .col(ColumnDef::new(Comments::UserName).string().not_null())
                    .col(ColumnDef::new(Comments::UserPhoto).string())
                    .col(ColumnDef::new(Comments::Content).text().not_null())
                    .col(ColumnDef::new(Comments::ParentId).uuid())
                    .col(ColumnDef::new(Comments::Likes).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Comments::Approved).boolean().not_null().default(false))
                    .col(
                        ColumnDef::new(Comments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Comments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_comments_post_id")
                    .table(Comments::Table)
                    .col(Comments::PostId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Admins::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Admins::UserId).string().not_null().primary_key())
                    .col(
                        ColumnDef::new(Admins::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AnalyticsEvents::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AnalyticsEvents::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(AnalyticsEvents::Event).string().not_null())
                    .col(ColumnDef::new(AnalyticsEvents::PostId).uuid())
                    .col(ColumnDef::new(AnalyticsEvents::PostTitle).string())
                    .col(ColumnDef::new(AnalyticsEvents::UserId).string())
                    .col(ColumnDef::new(AnalyticsEvents::UserName).string())
                    .col(ColumnDef::new(AnalyticsEvents::Metadata).json_binary())
                    .col(
                        ColumnDef::new(AnalyticsEvents::Timestamp)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_analytics_events_timestamp")
                    .table(AnalyticsEvents::Table)
                    .col(AnalyticsEvents::Timestamp)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserActivity::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserActivity::UserId).string().not_null().primary_key())
                    .col(ColumnDef::new(UserActivity::UserName).string().not_null())
                    .col(ColumnDef::new(UserActivity::UserEmail).string())
                    .col(ColumnDef::new(UserActivity::UserPhoto).string())
                    .col(
                        ColumnDef::new(UserActivity::LastActive)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(UserActivity::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(UserActivity::TotalViews).big_integer().not_null().default(0))
                    .col(ColumnDef::new(UserActivity::TotalLikes).big_integer().not_null().default(0))
                    .col(
                        ColumnDef::new(UserActivity::TotalComments)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Settings::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Settings::Key).string().not_null().primary_key())
                    .col(ColumnDef::new(Settings::Data).json_binary().not_null())
                    .col(
                        ColumnDef::new(Settings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Settings::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(UserActivity::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AnalyticsEvents::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Admins::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comments::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).if_exists().to_owned())
            .await?;
        for table in ARTICLE_TABLES {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

fn article_table(table: &str) -> TableCreateStatement {
    Table::create()
        .table(Alias::new(table))
        .if_not_exists()
        .col(ColumnDef::new(Article::Id).uuid().not_null().primary_key())
        .col(ColumnDef::new(Article::Title).string().not_null())
        .col(ColumnDef::new(Article::Slug).string().not_null().unique_key())
        .col(ColumnDef::new(Article::Content).text().not_null())
        .col(ColumnDef::new(Article::Excerpt).string().not_null())
        .col(ColumnDef::new(Article::CoverImage).string())
        .col(ColumnDef::new(Article::Category).string().not_null())
        .col(ColumnDef::new(Article::Tags).json_binary().not_null())
        .col(ColumnDef::new(Article::Published).boolean().not_null().default(false))
        .col(ColumnDef::new(Article::PublishedAt).timestamp_with_time_zone())
        .col(ColumnDef::new(Article::CreatedAt).timestamp_with_time_zone().not_null())
        .col(ColumnDef::new(Article::UpdatedAt).timestamp_with_time_zone().not_null())
        .col(ColumnDef::new(Article::AuthorId).string().not_null())
        .col(ColumnDef::new(Article::AuthorName).string().not_null())
        .col(ColumnDef::new(Article::ReadingTime).integer().not_null().default(1))
        .col(ColumnDef::new(Article::Views).big_integer().not_null().default(0))
        .col(ColumnDef::new(Article::Likes).big_integer().not_null().default(0))
        // Only tutorials carry a difficulty
        .col(ColumnDef::new(Article::Difficulty).string())
        .to_owned()
}

#[derive(DeriveIden)]
enum Article {
    Id,
    Title,
    Slug,
    Content,
    Excerpt,
    CoverImage,
    Category,
    Tags,
    Published,
    PublishedAt,
    CreatedAt,
    UpdatedAt,
    AuthorId,
    AuthorName,
    ReadingTime,
    Views,
    Likes,
    Difficulty,
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Color,
    Icon,
    PostCount,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    PostId,
    UserId,
    UserName,
    UserPhoto,
    Content,
    ParentId,
    Likes,
    Approved,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Admins {
    Table,
    UserId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AnalyticsEvents {
    Table,
    Id,
    Event,
    PostId,
    PostTitle,
    UserId,
    UserName,
    Metadata,
    Timestamp,
}

#[derive(DeriveIden)]
enum UserActivity {
    Table,
    UserId,
    UserName,
    UserEmail,
    UserPhoto,
    LastActive,
    JoinedAt,
    TotalViews,
    TotalLikes,
    TotalComments,
}

#[derive(DeriveIden)]
enum Settings {
    Table,
    Key,
    Data,
    UpdatedAt,
}
