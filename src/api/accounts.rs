//! Registration and login.

use axum::{
    Json,
    extract::{ConnectInfo, State},
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::api::types::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use crate::db::RegisterOutcome;
use crate::hash;

/// POST /register
///
/// Creates a user against an unused license key. The user insert and the
/// license flip happen in one transaction; on any precondition failure
/// nothing is mutated.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let (username, password, license_key) = match (
        payload.username.filter(|s| !s.is_empty()),
        payload.password.filter(|s| !s.is_empty()),
        payload.license_key.filter(|s| !s.is_empty()),
    ) {
        (Some(u), Some(p), Some(k)) => (u, p, k),
        _ => {
            return Err(ApiError::validation(
                "Username, password, and license key are required",
            ));
        }
    };

    let password_hash = hash::digest(&password);

    match state
        .store()
        .register_user(&username, &password_hash, &license_key)
        .await?
    {
        RegisterOutcome::Registered { rank } => {
            tracing::info!("Registered user: {username}");
            Ok(Json(RegisterResponse {
                message: "User registered successfully!".to_string(),
                rank,
            }))
        }
        RegisterOutcome::UserExists => {
            Err(ApiError::Conflict("User already exists".to_string()))
        }
        RegisterOutcome::LicenseInvalid => Err(ApiError::Conflict(
            "Invalid or already used license key".to_string(),
        )),
    }
}

/// POST /login
///
/// Check order is load-bearing: lookup, then ban check, then password
/// comparison. A banned account's response never reveals whether the
/// password was correct, and unknown-user and wrong-password failures are
/// indistinguishable.
pub async fn login(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (username, password) = match (
        payload.username.filter(|s| !s.is_empty()),
        payload.password.filter(|s| !s.is_empty()),
    ) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            return Err(ApiError::validation("Username and password are required"));
        }
    };

    let Some((user, license)) = state.store().get_user_with_license(&username).await? else {
        return Err(ApiError::InvalidCredentials);
    };

    if user.banned {
        return Err(ApiError::Banned(user.ban_reason));
    }

    if hash::digest(&password) != user.password_hash {
        return Err(ApiError::InvalidCredentials);
    }

    let ip = addr.ip().to_string();
    state.store().record_login(&username, Some(&ip)).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        rank: license.map(|l| l.rank),
    }))
}
