use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::licenses;
use crate::entities::users;

pub mod migrator;
pub mod repositories;

pub use repositories::user::RegisterOutcome;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn license_repo(&self) -> repositories::license::LicenseRepository {
        repositories::license::LicenseRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_with_license(
        &self,
        username: &str,
    ) -> Result<Option<(users::Model, Option<licenses::Model>)>> {
        self.user_repo().get_with_license(username).await
    }

    pub async fn list_users_with_licenses(
        &self,
    ) -> Result<Vec<(users::Model, Option<licenses::Model>)>> {
        self.user_repo().list_with_licenses().await
    }

    pub async fn register_user(
        &self,
        username: &str,
        password_hash: &str,
        license_key: &str,
    ) -> Result<RegisterOutcome> {
        self.user_repo()
            .register(username, password_hash, license_key)
            .await
    }

    pub async fn record_login(&self, username: &str, ip: Option<&str>) -> Result<()> {
        self.user_repo().record_login(username, ip).await
    }

    pub async fn update_user_password_hash(
        &self,
        username: &str,
        new_hash: &str,
    ) -> Result<bool> {
        self.user_repo()
            .update_password_hash(username, new_hash)
            .await
    }

    pub async fn set_user_banned(
        &self,
        username: &str,
        banned: bool,
        reason: Option<&str>,
    ) -> Result<bool> {
        self.user_repo().set_banned(username, banned, reason).await
    }

    pub async fn delete_user(&self, username: &str) -> Result<bool> {
        self.user_repo().delete_by_username(username).await
    }

    // ========== Licenses ==========

    pub async fn create_license(&self, rank: &str) -> Result<licenses::Model> {
        self.license_repo().create(rank).await
    }

    pub async fn get_license(&self, key: &str) -> Result<Option<licenses::Model>> {
        self.license_repo().get_by_key(key).await
    }

    pub async fn list_licenses(&self) -> Result<Vec<licenses::Model>> {
        self.license_repo().list_all().await
    }

    pub async fn delete_license(&self, key: &str) -> Result<bool> {
        self.license_repo().delete_by_key(key).await
    }

    pub async fn update_license_rank(&self, id: i32, rank: &str) -> Result<()> {
        self.license_repo().update_rank(id, rank).await
    }
}
