use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Legacy credential digest, never the plaintext.
    pub password_hash: String,

    /// The license consumed at registration. Nullable: deleting a license
    /// orphans its user rather than cascading.
    pub license_id: Option<i32>,

    pub banned: bool,

    /// Meaningful only while `banned` is true.
    pub ban_reason: Option<String>,

    pub last_login_ip: Option<String>,

    /// RFC 3339, set on successful login only.
    pub last_login_time: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::licenses::Entity",
        from = "Column::LicenseId",
        to = "super::licenses::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    License,
}

impl Related<super::licenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::License.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
