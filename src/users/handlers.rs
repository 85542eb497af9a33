use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{
    AccessTokenResponse, AuthResponse, AvatarResponse, ForgotPasswordRequest, LoginRequest,
    PublicUser, RegisterRequest, ResetPasswordRequest, UpdateProfileRequest, UserDetails,
    VerifyEmailRequest, VerifyForgotOtpRequest,
};
use super::emails::{forgot_password_template, verify_email_template};
use super::repo::User;
use crate::auth::cookies::{
    append_cookie, auth_cookie, cookie_value, expired_cookie, ACCESS_COOKIE, REFRESH_COOKIE,
};
use crate::auth::extractors::AuthUser;
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{generate_otp, hash_password, is_valid_email, verify_password};
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::uploads::services::{ext_from_mime, upload_images, UploadItem};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-email", post(verify_email))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/refresh-token", post(refresh_token))
        .route("/user-details", get(user_details))
        .route("/forgot-password", post(forgot_password))
        .route("/verify-forgot-password-otp", post(verify_forgot_otp))
        .route("/reset-password", post(reset_password))
        .route("/:id", put(update_profile))
        .route(
            "/user-avatar",
            put(upload_avatar).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
}

fn auth_cookies(keys: &JwtKeys, access: &str, refresh: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    append_cookie(
        &mut headers,
        &auth_cookie(ACCESS_COOKIE, access, keys.access_ttl.as_secs()),
    );
    append_cookie(
        &mut headers,
        &auth_cookie(REFRESH_COOKIE, refresh, keys.refresh_ttl.as_secs()),
    );
    headers
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<ApiResponse<AuthResponse>>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Provide name, email, and password".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        return Err(ApiError::BadRequest("Password too short".into()));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::BadRequest("Email already registered".into()));
    }

    let otp = generate_otp();
    let otp_expiry = OffsetDateTime::now_utc() + TimeDuration::minutes(5);
    let hash = hash_password(&payload.password)?;
    let user = User::create(
        &state.db,
        payload.name.trim(),
        &payload.email,
        &hash,
        &otp,
        otp_expiry,
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    User::set_refresh_token(&state.db, user.id, &refresh_token).await?;

    let verify_url = format!("{}/verify-email", state.config.frontend_url);
    state
        .mailer
        .send(
            &user.email,
            "Verify your email",
            &verify_email_template(&user.name, &otp, &verify_url),
        )
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    let headers = auth_cookies(&keys, &access_token, &refresh_token);
    Ok((
        StatusCode::CREATED,
        headers,
        ApiResponse::message_data(
            "User registered successfully. Please verify your email.",
            AuthResponse {
                access_token,
                refresh_token,
                user: PublicUser::from(&user),
            },
        ),
    ))
}

#[instrument(skip(state, payload))]
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> ApiResult<()> {
    let user = User::find_by_otp(&state.db, &payload.code)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid verification code".into()))?;

    if let Some(expiry) = user.otp_expiry {
        if expiry < OffsetDateTime::now_utc() {
            return Err(ApiError::BadRequest("Verification code has expired".into()));
        }
    }

    User::mark_verified(&state.db, user.id).await?;
    info!(user_id = %user.id, "email verified");
    Ok(ApiResponse::message("Email verified successfully"))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<ApiResponse<AuthResponse>>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("User not registered".into()))?;

    if user.status != "Active" {
        return Err(ApiError::BadRequest(
            "Account not active. Please contact admin.".into(),
        ));
    }
    if !user.verify_email {
        return Err(ApiError::BadRequest(
            "Email not verified yet. Please verify your email first.".into(),
        ));
    }
    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::BadRequest("Invalid password".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    User::stamp_login(&state.db, user.id, &refresh_token).await?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    let headers = auth_cookies(&keys, &access_token, &refresh_token);
    Ok((
        headers,
        ApiResponse::message_data(
            "Login successful",
            AuthResponse {
                access_token,
                refresh_token,
                user: PublicUser::from(&user),
            },
        ),
    ))
}

#[instrument(skip(state, headers))]
pub async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<ApiResponse<AccessTokenResponse>>), ApiError> {
    let token = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|c| cookie_value(c, REFRESH_COOKIE).map(|t| t.to_string()))
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.to_string())
        })
        .ok_or_else(|| ApiError::Unauthorized("Refresh token not found".into()))?;

    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&token)
        .map_err(|_| ApiError::Unauthorized("Token is expired or invalid".into()))?;

    User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;

    let access_token = keys.sign_access(claims.sub)?;
    let mut out = HeaderMap::new();
    append_cookie(
        &mut out,
        &auth_cookie(ACCESS_COOKIE, &access_token, keys.access_ttl.as_secs()),
    );
    Ok((
        out,
        ApiResponse::message_data(
            "New access token generated",
            AccessTokenResponse { access_token },
        ),
    ))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<(HeaderMap, Json<ApiResponse<()>>), ApiError> {
    User::set_refresh_token(&state.db, user_id, "").await?;

    let mut headers = HeaderMap::new();
    append_cookie(&mut headers, &expired_cookie(ACCESS_COOKIE));
    append_cookie(&mut headers, &expired_cookie(REFRESH_COOKIE));
    info!(user_id = %user_id, "user logged out");
    Ok((headers, ApiResponse::message("Logout successfully")))
}

#[instrument(skip(state))]
pub async fn user_details(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<UserDetails> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(ApiResponse::data(UserDetails::from(user)))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<UserDetails> {
    if caller_id != id {
        return Err(ApiError::Forbidden(
            "Not authorized to update this user".into(),
        ));
    }

    let existing = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let name = payload.name.unwrap_or_else(|| existing.name.clone());
    let email = payload
        .email
        .map(|e| e.trim().to_lowercase())
        .unwrap_or_else(|| existing.email.clone());
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    let email_changed = email != existing.email;
    let (otp, otp_expiry) = if email_changed {
        (
            Some(generate_otp()),
            Some(OffsetDateTime::now_utc() + TimeDuration::minutes(10)),
        )
    } else {
        (None, None)
    };

    let password_hash = match payload.password {
        Some(p) if !p.is_empty() => {
            if p.len() < 8 {
                return Err(ApiError::BadRequest("Password too short".into()));
            }
            hash_password(&p)?
        }
        _ => existing.password_hash.clone(),
    };

    let updated = User::update_profile(
        &state.db,
        id,
        &name,
        &email,
        payload.mobile.as_deref().or(existing.mobile.as_deref()),
        &password_hash,
        if email_changed { false } else { existing.verify_email },
        otp.as_deref(),
        otp_expiry,
    )
    .await?;

    if let Some(code) = otp {
        let verify_url = format!("{}/verify-email", state.config.frontend_url);
        state
            .mailer
            .send(
                &email,
                "Verify your email",
                &verify_email_template(&name, &code, &verify_url),
            )
            .await?;
    }

    info!(user_id = %id, "user updated");
    Ok(ApiResponse::message_data(
        "User updated successfully",
        UserDetails::from(updated),
    ))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<()> {
    let email = payload.email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Email not found".into()))?;

    let otp = generate_otp();
    let expiry = OffsetDateTime::now_utc() + TimeDuration::hours(1);
    User::set_forgot_otp(&state.db, user.id, &otp, expiry).await?;

    state
        .mailer
        .send(
            &email,
            "Forgot Password",
            &forgot_password_template(&user.name, &otp),
        )
        .await?;

    Ok(ApiResponse::message("OTP sent to your email"))
}

#[instrument(skip(state, payload))]
pub async fn verify_forgot_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyForgotOtpRequest>,
) -> ApiResult<()> {
    if payload.email.is_empty() || payload.otp.is_empty() {
        return Err(ApiError::BadRequest(
            "Provide required fields: email and otp.".into(),
        ));
    }
    let email = payload.email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Email not available.".into()))?;

    match user.forgot_password_expiry {
        Some(expiry) if expiry >= OffsetDateTime::now_utc() => {}
        _ => return Err(ApiError::BadRequest("OTP is expired.".into())),
    }
    if user.forgot_password_otp.as_deref() != Some(payload.otp.as_str()) {
        return Err(ApiError::BadRequest("Invalid OTP.".into()));
    }

    User::clear_forgot_otp(&state.db, user.id).await?;
    Ok(ApiResponse::message("OTP verified successfully."))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<()> {
    if payload.email.is_empty()
        || payload.new_password.is_empty()
        || payload.confirm_password.is_empty()
    {
        return Err(ApiError::BadRequest(
            "Provide required fields: email, newPassword, confirmPassword.".into(),
        ));
    }
    if payload.new_password != payload.confirm_password {
        return Err(ApiError::BadRequest(
            "newPassword and confirmPassword do not match.".into(),
        ));
    }

    let email = payload.email.trim().to_lowercase();
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Email is not available.".into()))?;

    let hash = hash_password(&payload.new_password)?;
    User::set_password(&state.db, user.id, &hash).await?;
    info!(user_id = %user.id, "password reset");
    Ok(ApiResponse::message("Password updated successfully."))
}

/// PUT /api/user/user-avatar (multipart, first file field wins).
/// The previous avatar's remote object is removed through its stored key.
#[instrument(skip(state, mp))]
pub async fn upload_avatar(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut mp: Multipart,
) -> ApiResult<AvatarResponse> {
    let mut file: Option<UploadItem> = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.file_name().is_some() || field.name() == Some("avatar") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            if ext_from_mime(&content_type).is_none() {
                return Err(ApiError::BadRequest("Unsupported image type".into()));
            }
            let body = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.to_string()))?;
            file = Some(UploadItem { body, content_type });
            break;
        }
    }
    let file = file.ok_or_else(|| ApiError::BadRequest("No image file provided".into()))?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !user.avatar.is_empty() {
        crate::uploads::services::delete_image_by_url(&state, &user.avatar).await?;
    }

    let folder = format!("avatars/{}", user_id);
    let urls = upload_images(&state, &folder, vec![file]).await?;
    let avatar = urls
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("upload returned no url")))?;
    User::set_avatar(&state.db, user_id, &avatar).await?;

    info!(user_id = %user_id, "avatar updated");
    Ok(ApiResponse::message_data(
        "Avatar updated successfully",
        AvatarResponse { avatar, user_id },
    ))
}
