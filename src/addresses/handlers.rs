use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use super::repo::{self, Address, NewAddress};
use crate::auth::extractors::AuthUser;
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/default", get(get_default))
        .route(
            "/:id",
            get(get_address).put(update_address).delete(delete_address),
        )
        .route("/:id/default", post(set_default))
}

fn default_address_type() -> String {
    "HOME".into()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_address_type")]
    pub address_type: String,
}

impl AddressRequest {
    fn validate(&self) -> Result<(), ApiError> {
        let required = [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ApiError::BadRequest(format!("{field} is required")));
            }
        }
        if !matches!(self.address_type.as_str(), "HOME" | "WORK" | "OTHER") {
            return Err(ApiError::BadRequest("Invalid address type".into()));
        }
        Ok(())
    }

    fn into_new_address(self) -> NewAddress {
        NewAddress {
            full_name: self.full_name,
            phone: self.phone,
            address_line1: self.address_line1,
            address_line2: self.address_line2,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            country: self.country,
            is_default: self.is_default,
            address_type: self.address_type,
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn create_address(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Address>>), ApiError> {
    payload.validate()?;

    let mut tx = state.db.begin().await?;
    if payload.is_default {
        repo::clear_defaults_tx(&mut tx, user_id).await?;
    }
    let address = repo::insert_tx(&mut tx, user_id, &payload.into_new_address()).await?;
    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::message_data("Address added", address),
    ))
}

#[instrument(skip(state))]
pub async fn list_addresses(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<Address>> {
    let addresses = repo::list(&state.db, user_id).await?;
    Ok(ApiResponse::data(addresses))
}

#[instrument(skip(state))]
pub async fn get_default(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Address> {
    let address = repo::find_default(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No default address set".into()))?;
    Ok(ApiResponse::data(address))
}

#[instrument(skip(state))]
pub async fn get_address(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Address> {
    let address = repo::find_by_id(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Address not found".into()))?;
    Ok(ApiResponse::data(address))
}

#[instrument(skip(state, payload))]
pub async fn update_address(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddressRequest>,
) -> ApiResult<Address> {
    payload.validate()?;

    let mut tx = state.db.begin().await?;
    if payload.is_default {
        repo::clear_defaults_tx(&mut tx, user_id).await?;
    }
    let address = repo::update_tx(&mut tx, user_id, id, &payload.into_new_address())
        .await?
        .ok_or_else(|| ApiError::NotFound("Address not found".into()))?;
    tx.commit().await?;

    Ok(ApiResponse::message_data("Address updated", address))
}

#[instrument(skip(state))]
pub async fn set_default(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Address> {
    let existing = repo::find_by_id(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Address not found".into()))?;
    if existing.is_default {
        return Err(ApiError::BadRequest("Address is already the default".into()));
    }

    let mut tx = state.db.begin().await?;
    repo::clear_defaults_tx(&mut tx, user_id).await?;
    let address = repo::set_default_tx(&mut tx, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Address not found".into()))?;
    tx.commit().await?;

    Ok(ApiResponse::message_data("Default address updated", address))
}

#[instrument(skip(state))]
pub async fn delete_address(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let address = repo::find_by_id(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Address not found".into()))?;

    let mut tx = state.db.begin().await?;
    repo::delete_tx(&mut tx, user_id, id).await?;
    if address.is_default {
        repo::promote_newest_tx(&mut tx, user_id).await?;
    }
    tx.commit().await?;

    Ok(ApiResponse::message("Address deleted"))
}
