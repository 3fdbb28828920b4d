//! Storage: PostgreSQL through SeaORM, plus in-memory repositories.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;

#[cfg(feature = "postgres")]
pub mod entity;

pub use connections::DatabaseConfig;
#[cfg(feature = "postgres")]
pub use connections::connect;
#[cfg(feature = "postgres")]
pub use sea_orm::DatabaseConnection;

pub use memory::{
    InMemoryAdminDirectory, InMemoryAnalyticsRepository, InMemoryArticleRepository,
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemorySettingsRepository,
};

#[cfg(feature = "postgres")]
pub use postgres_base::PostgresBaseRepository;
#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresAdminDirectory, PostgresAnalyticsRepository, PostgresCategoryRepository,
    PostgresCommentRepository, PostgresPostRepository, PostgresSettingsRepository,
    PostgresTutorialRepository,
};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
