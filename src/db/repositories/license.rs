use anyhow::{Context, Result};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::entities::{licenses, prelude::*};

pub struct LicenseRepository {
    conn: DatabaseConnection,
}

impl LicenseRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Create an unused license with a fresh random key.
    pub async fn create(&self, rank: &str) -> Result<licenses::Model> {
        let model = licenses::ActiveModel {
            key: Set(Uuid::new_v4().to_string()),
            is_used: Set(false),
            rank: Set(rank.to_string()),
            ..Default::default()
        };

        model
            .insert(&self.conn)
            .await
            .context("Failed to insert license")
    }

    pub async fn get_by_key(&self, key: &str) -> Result<Option<licenses::Model>> {
        Licenses::find()
            .filter(licenses::Column::Key.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query license by key")
    }

    pub async fn list_all(&self) -> Result<Vec<licenses::Model>> {
        Licenses::find()
            .all(&self.conn)
            .await
            .context("Failed to list licenses")
    }

    /// Delete a license regardless of used-state. Any linked user keeps its
    /// row; its license reference is nulled out by the foreign key.
    pub async fn delete_by_key(&self, key: &str) -> Result<bool> {
        let result = Licenses::delete_many()
            .filter(licenses::Column::Key.eq(key))
            .exec(&self.conn)
            .await
            .context("Failed to delete license")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn update_rank(&self, id: i32, rank: &str) -> Result<()> {
        let license = Licenses::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query license for rank update")?
            .ok_or_else(|| anyhow::anyhow!("License {id} not found"))?;

        let mut active: licenses::ActiveModel = license.into();
        active.rank = Set(rank.to_string());
        active.update(&self.conn).await?;

        Ok(())
    }
}
