use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait, sea_query::Expr,
};

use crate::entities::{licenses, prelude::*, users};

/// Result of an atomic registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// User created and license consumed; carries the license rank.
    Registered { rank: String },
    /// A user with this username already exists.
    UserExists,
    /// No license with this key, or it was already consumed.
    LicenseInvalid,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

/// Compare-and-set claim on a license: flips `is_used` only if it is still
/// false, returning the number of rows changed. A claim racing against
/// another sees 0 and must treat the license as gone.
async fn claim_license<C: ConnectionTrait>(conn: &C, license_id: i32) -> Result<u64> {
    let claimed = Licenses::update_many()
        .col_expr(licenses::Column::IsUsed, Expr::value(true))
        .filter(licenses::Column::Id.eq(license_id))
        .filter(licenses::Column::IsUsed.eq(false))
        .exec(conn)
        .await
        .context("Failed to claim license")?;
    Ok(claimed.rows_affected)
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Fetch a user together with its linked license, if any. The rank is
    /// derived from the license at read time, never stored on the user.
    pub async fn get_with_license(
        &self,
        username: &str,
    ) -> Result<Option<(users::Model, Option<licenses::Model>)>> {
        Users::find()
            .filter(users::Column::Username.eq(username))
            .find_also_related(Licenses)
            .one(&self.conn)
            .await
            .context("Failed to query user with license")
    }

    pub async fn list_with_licenses(
        &self,
    ) -> Result<Vec<(users::Model, Option<licenses::Model>)>> {
        Users::find()
            .find_also_related(Licenses)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    /// Atomically create a user and consume the license.
    ///
    /// Runs in one transaction: re-checks the username, claims the license
    /// with a compare-and-set on `is_used`, then inserts the user. If any
    /// step fails nothing is applied. Two registrations racing on the same
    /// key cannot both succeed; the loser sees `LicenseInvalid`.
    pub async fn register(
        &self,
        username: &str,
        password_hash: &str,
        license_key: &str,
    ) -> Result<RegisterOutcome> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let existing = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&txn)
            .await
            .context("Failed to check username availability")?;
        if existing.is_some() {
            return Ok(RegisterOutcome::UserExists);
        }

        let Some(license) = Licenses::find()
            .filter(licenses::Column::Key.eq(license_key))
            .filter(licenses::Column::IsUsed.eq(false))
            .one(&txn)
            .await
            .context("Failed to look up license")?
        else {
            return Ok(RegisterOutcome::LicenseInvalid);
        };

        if claim_license(&txn, license.id).await? != 1 {
            return Ok(RegisterOutcome::LicenseInvalid);
        }

        users::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            license_id: Set(Some(license.id)),
            banned: Set(false),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert user")?;

        txn.commit().await.context("Failed to commit registration")?;

        Ok(RegisterOutcome::Registered { rank: license.rank })
    }

    /// Record a successful login. Timestamps are RFC 3339.
    pub async fn record_login(&self, username: &str, ip: Option<&str>) -> Result<()> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for login bookkeeping")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {username}"))?;

        let mut active: users::ActiveModel = user.into();
        active.last_login_ip = Set(ip.map(ToString::to_string));
        active.last_login_time = Set(Some(chrono::Utc::now().to_rfc3339()));
        active.update(&self.conn).await?;

        Ok(())
    }

    /// Replace the stored digest. Returns false if the user does not exist.
    pub async fn update_password_hash(&self, username: &str, new_hash: &str) -> Result<bool> {
        let Some(user) = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for password update")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash.to_string());
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Ban or unban. Unbanning always clears the stored reason.
    pub async fn set_banned(
        &self,
        username: &str,
        banned: bool,
        reason: Option<&str>,
    ) -> Result<bool> {
        let Some(user) = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user for ban update")?
        else {
            return Ok(false);
        };

        let mut active: users::ActiveModel = user.into();
        active.banned = Set(banned);
        active.ban_reason = Set(if banned {
            reason.map(ToString::to_string)
        } else {
            None
        });
        active.update(&self.conn).await?;

        Ok(true)
    }

    /// Delete a user. The consumed license stays behind, still marked used.
    pub async fn delete_by_username(&self, username: &str) -> Result<bool> {
        let result = Users::delete_many()
            .filter(users::Column::Username.eq(username))
            .exec(&self.conn)
            .await
            .context("Failed to delete user")?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    async fn store() -> Store {
        Store::with_pool_options("sqlite::memory:", 1, 1)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_claim_license_flips_exactly_once() {
        let store = store().await;
        let license = store.create_license("gold").await.unwrap();

        assert_eq!(claim_license(&store.conn, license.id).await.unwrap(), 1);
        // The license is now used; the compare-and-set matches no row.
        assert_eq!(claim_license(&store.conn, license.id).await.unwrap(), 0);

        let reloaded = store.get_license(&license.key).await.unwrap().unwrap();
        assert!(reloaded.is_used);
    }

    #[tokio::test]
    async fn test_register_rejects_license_claimed_underneath() {
        let store = store().await;
        let license = store.create_license("gold").await.unwrap();
        let repo = UserRepository::new(store.conn.clone());

        // Another registration wins the key first.
        assert_eq!(claim_license(&store.conn, license.id).await.unwrap(), 1);

        let outcome = repo
            .register("latecomer", &crate::hash::digest("pw"), &license.key)
            .await
            .unwrap();
        assert_eq!(outcome, RegisterOutcome::LicenseInvalid);

        // The losing attempt must not leave a user behind.
        assert!(repo.get_with_license("latecomer").await.unwrap().is_none());
    }
}
