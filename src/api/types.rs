use serde::{Deserialize, Serialize};

use crate::entities::{licenses, users};

// Request bodies use Option fields so a missing key maps onto the service's
// own error taxonomy instead of an extractor rejection.

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub license_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteLicenseRequest {
    pub admin_password: Option<String>,
    pub license_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub admin_password: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub admin_password: Option<String>,
    pub username: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRankRequest {
    pub admin_password: Option<String>,
    pub username: Option<String>,
    pub new_rank: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateLicenseRequest {
    pub admin_password: Option<String>,
    pub rank: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BanUserQuery {
    pub admin_password: Option<String>,
    pub username: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UnbanUserQuery {
    pub admin_password: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckLicenseQuery {
    pub admin_password: Option<String>,
    pub license_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub rank: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub rank: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LicenseDto {
    pub key: String,
    pub is_used: bool,
    pub rank: String,
}

impl From<licenses::Model> for LicenseDto {
    fn from(license: licenses::Model) -> Self {
        Self {
            key: license.key,
            is_used: license.is_used,
            rank: license.rank,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LicenseListResponse {
    pub licenses: Vec<LicenseDto>,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub username: String,
    /// Key of the consumed license, if the user still has one linked.
    pub license_used: Option<String>,
    /// Derived from the linked license at read time.
    pub rank: Option<String>,
    pub banned: bool,
    pub ban_reason: Option<String>,
    pub last_login_ip: Option<String>,
    pub last_login_time: Option<String>,
}

impl UserDto {
    pub fn from_row(user: users::Model, license: Option<licenses::Model>) -> Self {
        Self {
            username: user.username,
            license_used: license.as_ref().map(|l| l.key.clone()),
            rank: license.map(|l| l.rank),
            banned: user.banned,
            ban_reason: if user.banned { user.ban_reason } else { None },
            last_login_ip: user.last_login_ip,
            last_login_time: user.last_login_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserDto>,
}

#[derive(Debug, Serialize)]
pub struct GeneratedLicenseResponse {
    pub license_key: String,
    pub rank: String,
}

#[derive(Debug, Serialize)]
pub struct CheckLicenseResponse {
    pub license_key: String,
    pub is_used: bool,
    pub rank: String,
}
