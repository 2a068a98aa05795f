use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use utils::assets::asset_dir;

pub mod entities;
pub mod models;
pub mod types;

pub use sea_orm::{DbErr, TransactionTrait};

#[derive(Clone)]
pub struct DBService {
    pub pool: DatabaseConnection,
}

fn database_url() -> String {
    if let Ok(url) = std::env::var("DATABASE_URL") {
        let url = url.trim().to_string();
        if !url.is_empty() {
            return url;
        }
    }
    format!(
        "sqlite://{}?mode=rwc",
        asset_dir().join("db.sqlite").to_string_lossy()
    )
}

impl DBService {
    pub async fn new() -> Result<DBService, DbErr> {
        let pool = Database::connect(database_url()).await?;
        db_migration::Migrator::up(&pool, None).await?;
        Ok(DBService { pool })
    }
}
