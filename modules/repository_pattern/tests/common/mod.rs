//! Shared fixtures: a small author/book schema on a temporary SQLite file
#![allow(dead_code)]

use repository_pattern::{DatabaseConfig, UnitOfWork};
use sea_orm::ActiveValue::{NotSet, Set};
use tempfile::TempDir;

pub mod author {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "authors")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        pub country: String,
        pub born: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::book::Entity")]
        Books,
    }

    impl Related<super::book::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Books.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod book {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "books")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub author_id: i32,
        pub title: String,
        pub published: i32,
        pub created_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::author::Entity",
            from = "Column::AuthorId",
            to = "super::author::Column::Id"
        )]
        Author,
    }

    impl Related<super::author::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Author.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod migrations {
    use sea_orm_migration::prelude::*;

    pub struct Migrator;

    #[async_trait::async_trait]
    impl MigratorTrait for Migrator {
        fn migrations() -> Vec<Box<dyn MigrationTrait>> {
            vec![Box::new(m20250101_000001_create_library::Migration)]
        }
    }

    mod m20250101_000001_create_library {
        use super::*;

        #[derive(DeriveMigrationName)]
        pub struct Migration;

        #[async_trait::async_trait]
        impl MigrationTrait for Migration {
            async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
                manager
                    .create_table(
                        Table::create()
                            .table(Authors::Table)
                            .if_not_exists()
                            .col(
                                ColumnDef::new(Authors::Id)
                                    .integer()
                                    .not_null()
                                    .auto_increment()
                                    .primary_key(),
                            )
                            .col(ColumnDef::new(Authors::Name).string().not_null())
                            .col(ColumnDef::new(Authors::Country).string().not_null())
                            .col(ColumnDef::new(Authors::Born).integer().not_null())
                            .to_owned(),
                    )
                    .await?;

                manager
                    .create_table(
                        Table::create()
                            .table(Books::Table)
                            .if_not_exists()
                            .col(
                                ColumnDef::new(Books::Id)
                                    .integer()
                                    .not_null()
                                    .auto_increment()
                                    .primary_key(),
                            )
                            .col(ColumnDef::new(Books::AuthorId).integer().not_null())
                            .col(ColumnDef::new(Books::Title).string().not_null())
                            .col(ColumnDef::new(Books::Published).integer().not_null())
                            .col(
                                ColumnDef::new(Books::CreatedAt)
                                    .timestamp_with_time_zone()
                                    .not_null(),
                            )
                            .foreign_key(
                                ForeignKey::create()
                                    .name("fk_books_author")
                                    .from(Books::Table, Books::AuthorId)
                                    .to(Authors::Table, Authors::Id)
                                    .on_delete(ForeignKeyAction::Cascade),
                            )
                            .to_owned(),
                    )
                    .await
            }

            async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
                manager
                    .drop_table(Table::drop().table(Books::Table).to_owned())
                    .await?;
                manager
                    .drop_table(Table::drop().table(Authors::Table).to_owned())
                    .await
            }
        }

        #[derive(DeriveIden)]
        enum Authors {
            Table,
            Id,
            Name,
            Country,
            Born,
        }

        #[derive(DeriveIden)]
        enum Books {
            Table,
            Id,
            AuthorId,
            Title,
            Published,
            CreatedAt,
        }
    }
}

/// Unit of work on a fresh, migrated database. Keep the `TempDir` alive for
/// the duration of the test.
pub async fn setup() -> anyhow::Result<(TempDir, UnitOfWork)> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("library.db");
    let config = DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections: Some(2),
        ..Default::default()
    };
    let uow = UnitOfWork::connect(&config).await?;
    uow.migrate::<migrations::Migrator>().await?;
    Ok((dir, uow))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn new_author(name: &str, country: &str, born: i32) -> author::ActiveModel {
    author::ActiveModel {
        id: NotSet,
        name: Set(name.to_owned()),
        country: Set(country.to_owned()),
        born: Set(born),
    }
}

pub fn author_with_id(id: i32, name: &str) -> author::ActiveModel {
    author::ActiveModel {
        id: Set(id),
        name: Set(name.to_owned()),
        country: Set("nowhere".to_owned()),
        born: Set(1900),
    }
}

pub fn new_book(author_id: i32, title: &str, published: i32) -> book::ActiveModel {
    book::ActiveModel {
        id: NotSet,
        author_id: Set(author_id),
        title: Set(title.to_owned()),
        published: Set(published),
        created_at: Set(chrono::Utc::now()),
    }
}

pub fn print_test_header(test_name: &str, purpose: &str) {
    println!("\n🧪 TEST: {}", test_name);
    println!("📋 PURPOSE: {}", purpose);
}
