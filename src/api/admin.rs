//! Administrative endpoints.
//!
//! Every handler authorizes through the [`AdminGate`] before any lookup or
//! mutation. A failed gate check short-circuits with a generic 403 and
//! leaves the store untouched.
//!
//! [`AdminGate`]: crate::auth::AdminGate

use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::{ApiError, AppState};
use crate::api::types::{
    AdminQuery, BanUserQuery, ChangePasswordRequest, ChangeRankRequest, CheckLicenseQuery,
    CheckLicenseResponse, DeleteLicenseRequest, DeleteUserRequest, GenerateLicenseRequest,
    GeneratedLicenseResponse, LicenseDto, LicenseListResponse, MessageResponse, UnbanUserQuery,
    UserDto, UserListResponse,
};

fn authorize(state: &AppState, supplied: Option<&str>) -> Result<(), ApiError> {
    if state.gate().authorize(supplied.unwrap_or_default()) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

fn require(field: Option<String>, name: &str) -> Result<String, ApiError> {
    field
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::validation(format!("{name} is required")))
}

/// POST /delete_license
pub async fn delete_license(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DeleteLicenseRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&state, payload.admin_password.as_deref())?;
    let license_key = require(payload.license_key, "License key")?;

    if !state.store().delete_license(&license_key).await? {
        return Err(ApiError::license_not_found());
    }

    Ok(Json(MessageResponse {
        message: format!("License {license_key} deleted successfully"),
    }))
}

/// POST /delete_user
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DeleteUserRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&state, payload.admin_password.as_deref())?;
    let username = require(payload.username, "Username")?;

    if !state.store().delete_user(&username).await? {
        return Err(ApiError::user_not_found());
    }

    Ok(Json(MessageResponse {
        message: format!("User {username} deleted successfully"),
    }))
}

/// POST /change_password
///
/// Admin-set password change; the stored digest is replaced and the old
/// password stops working immediately.
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&state, payload.admin_password.as_deref())?;
    let username = require(payload.username, "Username")?;
    let new_password = require(payload.new_password, "New password")?;

    let new_hash = crate::hash::digest(&new_password);
    if !state
        .store()
        .update_user_password_hash(&username, &new_hash)
        .await?
    {
        return Err(ApiError::user_not_found());
    }

    tracing::info!("Password changed for user: {username}");

    Ok(Json(MessageResponse {
        message: format!("Password for {username} updated successfully"),
    }))
}

/// POST /change_rank
///
/// The rank lives on the license, so this mutates the user's linked
/// license; a user without one cannot be re-ranked.
pub async fn change_rank(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChangeRankRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&state, payload.admin_password.as_deref())?;
    let username = require(payload.username, "Username")?;
    let new_rank = require(payload.new_rank, "New rank")?;

    let Some((_, Some(license))) = state.store().get_user_with_license(&username).await? else {
        return Err(ApiError::NotFound("User or license not found".to_string()));
    };

    state.store().update_license_rank(license.id, &new_rank).await?;

    Ok(Json(MessageResponse {
        message: format!("Rank for {username} changed to {new_rank} successfully"),
    }))
}

/// GET /licenses
pub async fn list_licenses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<LicenseListResponse>, ApiError> {
    authorize(&state, query.admin_password.as_deref())?;

    let licenses = state.store().list_licenses().await?;
    Ok(Json(LicenseListResponse {
        licenses: licenses.into_iter().map(LicenseDto::from).collect(),
    }))
}

/// GET /users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    authorize(&state, query.admin_password.as_deref())?;

    let rows = state.store().list_users_with_licenses().await?;
    Ok(Json(UserListResponse {
        users: rows
            .into_iter()
            .map(|(user, license)| UserDto::from_row(user, license))
            .collect(),
    }))
}

/// GET /ban_user
pub async fn ban_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BanUserQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&state, query.admin_password.as_deref())?;
    let username = require(query.username, "Username")?;
    let reason = query.reason.unwrap_or_default();

    if !state
        .store()
        .set_user_banned(&username, true, Some(&reason))
        .await?
    {
        return Err(ApiError::user_not_found());
    }

    tracing::info!("Banned user {username}: {reason}");

    Ok(Json(MessageResponse {
        message: format!("User {username} has been banned for: {reason}"),
    }))
}

/// GET /unban_user
pub async fn unban_user(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UnbanUserQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    authorize(&state, query.admin_password.as_deref())?;
    let username = require(query.username, "Username")?;

    if !state.store().set_user_banned(&username, false, None).await? {
        return Err(ApiError::user_not_found());
    }

    Ok(Json(MessageResponse {
        message: format!("User {username} has been unbanned"),
    }))
}

/// POST /generate_license
///
/// The rank is free-form and stored exactly as supplied.
pub async fn generate_license(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GenerateLicenseRequest>,
) -> Result<Json<GeneratedLicenseResponse>, ApiError> {
    authorize(&state, payload.admin_password.as_deref())?;
    let rank = payload.rank.unwrap_or_default();

    let license = state.store().create_license(&rank).await?;

    tracing::info!("Generated license {} (rank: {})", license.key, license.rank);

    Ok(Json(GeneratedLicenseResponse {
        license_key: license.key,
        rank: license.rank,
    }))
}

/// GET /check_license
pub async fn check_license(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckLicenseQuery>,
) -> Result<Json<CheckLicenseResponse>, ApiError> {
    authorize(&state, query.admin_password.as_deref())?;
    let license_key = require(query.license_key, "License key")?;

    let Some(license) = state.store().get_license(&license_key).await? else {
        return Err(ApiError::license_not_found());
    };

    Ok(Json(CheckLicenseResponse {
        license_key: license.key,
        is_used: license.is_used,
        rank: license.rank,
    }))
}
