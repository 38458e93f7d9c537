use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::constants::*;
use crate::error::{AppError, AppJson, AppResult};
use crate::models::{AuthResponse, LoginPayload, RegisterPayload, User};
use crate::state::AppState;
use crate::users::{get_user_by_email, get_user_by_id, insert_user};
use crate::utils::{normalize_email, now_utc, validate_email, validate_string_length};

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::internal(format!("Failed to parse password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn validate_registration(payload: &RegisterPayload) -> AppResult<()> {
    validate_string_length(&payload.name, "Name", MAX_NAME_LENGTH)?;
    validate_email(&normalize_email(&payload.email))?;
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::bad_request(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

fn auth_response(state: &AppState, user: User) -> AppResult<AuthResponse> {
    let access_token = state
        .tokens
        .issue(&user.id)
        .map_err(|e| AppError::internal(format!("Failed to issue token: {}", e)))?;

    Ok(AuthResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
        user,
    })
}

pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterPayload>,
) -> AppResult<Json<AuthResponse>> {
    validate_registration(&payload)?;
    let email = normalize_email(&payload.email);

    if get_user_by_email(&state.db, &email).await?.is_some() {
        return Err(AppError::bad_request(ERR_EMAIL_TAKEN));
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        email,
        currency: DEFAULT_CURRENCY.to_string(),
        monthly_budget: DEFAULT_MONTHLY_BUDGET,
        created_at: now_utc(),
        password_hash: hash_password(&payload.password)?,
    };
    insert_user(&state.db, &user).await?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok(Json(auth_response(&state, user)?))
}

pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> AppResult<Json<AuthResponse>> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request(ERR_INVALID_CREDENTIALS));
    }

    let user = get_user_by_email(&state.db, &normalize_email(&payload.email))
        .await?
        .ok_or_else(|| AppError::bad_request(ERR_INVALID_CREDENTIALS))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::info!(user_id = %user.id, "login rejected: wrong password");
        return Err(AppError::bad_request(ERR_INVALID_CREDENTIALS));
    }

    tracing::info!(user_id = %user.id, "user logged in");
    Ok(Json(auth_response(&state, user)?))
}

/// Resolves the bearer token in `headers` to a stored user.
pub async fn authenticate(state: &AppState, headers: &HeaderMap) -> AppResult<User> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|token| !token.is_empty())
        .ok_or_else(AppError::unauthorized)?;

    let claims = state.tokens.validate(token).map_err(|e| {
        tracing::warn!(error = %e, "rejected bearer token");
        AppError::unauthorized()
    })?;

    get_user_by_id(&state.db, &claims.sub).await?.ok_or_else(|| {
        tracing::warn!(user_id = %claims.sub, "token subject has no user record");
        AppError::unauthorized()
    })
}

/// Guards protected routes and makes the caller's `User` available as an extension.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}
