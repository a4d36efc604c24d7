//! HTTP routes for the authentication surface.
//!
//! Handlers stay thin: parse and validate, call the service, map the result
//! to a status code. All domain logic lives in `sentra-auth`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use sentra_auth::AuthError;
use sentra_auth::mfa::{MfaService, MfaVerification};
use sentra_auth::service::{AuthService, RegisterInput};
use sentra_auth::token::TokenService;
use sentra_core::Mailer;
use sentra_store::MemoryStore;

use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::mailer::LogMailer;
use crate::validation::{RegistrationSchema, validate_password};

pub struct AppState {
    pub auth: AuthService<MemoryStore, MemoryStore>,
    pub mfa: MfaService<MemoryStore, MemoryStore>,
    pub tokens: TokenService<MemoryStore>,
    pub mailer: LogMailer,
    pub schema: RegistrationSchema,
}

impl AppState {
    pub fn new(store: MemoryStore, config: &ServerConfig) -> Result<Self, AuthError> {
        let tokens = TokenService::new(store.clone(), config.auth.clone());
        let auth = AuthService::new(store.clone(), tokens.clone(), config.auth.clone());
        let mfa = MfaService::new(store, tokens.clone(), config.auth.clone())?;

        Ok(Self {
            auth,
            mfa,
            tokens,
            mailer: LogMailer,
            schema: RegistrationSchema::new(&config.registration.required_fields),
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/auth/register", post(register))
        .route("/v1/auth/login", post(login))
        .route("/v1/auth/logout", post(logout))
        .route("/v1/auth/refresh-tokens", post(refresh_tokens))
        .route("/v1/auth/forgot-password", post(forgot_password))
        .route("/v1/auth/reset-password", post(reset_password))
        .route(
            "/v1/auth/send-verification-email",
            post(send_verification_email),
        )
        .route("/v1/auth/verify-email", post(verify_email))
        .route("/v1/auth/enable-mfa", post(enable_mfa))
        .route("/v1/auth/verify-mfa", post(verify_mfa))
        .route("/v1/auth/disable-mfa", post(disable_mfa))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError(AuthError::Unauthorized))
}

fn invalid(message: impl Into<String>) -> ApiError {
    ApiError(AuthError::Validation(message.into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub user_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email, or username when username login is enabled.
    pub email: Option<String>,
    pub login: Option<String>,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MfaCodeRequest {
    pub mfa_token: String,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.schema.validate(&request).map_err(invalid)?;

    let user = state
        .auth
        .register(RegisterInput {
            email: request.email,
            username: request.user_name,
            password: request.password,
            first_name: request.first_name,
            last_name: request.last_name,
            company: request.company,
        })
        .await?;
    let tokens = state.tokens.generate_auth_tokens(&user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "tokens": tokens })),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let identifier = request
        .login
        .or(request.email)
        .ok_or_else(|| invalid("email is required"))?;

    let output = state
        .auth
        .login_with_password(&identifier, &request.password)
        .await?;
    Ok(Json(json!({ "user": output.user, "tokens": output.tokens })))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.logout(&request.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn refresh_tokens(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let pair = state.auth.refresh_auth(&request.refresh_token).await?;
    Ok(Json(pair))
}

async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = state
        .auth
        .generate_reset_password_token(&request.email)
        .await?
    {
        state
            .mailer
            .send_reset_password_email(&request.email, &token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "mail dispatch failed");
                ApiError(AuthError::Unknown)
            })?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn reset_password(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_password(&request.password).map_err(invalid)?;
    state
        .auth
        .reset_password(&query.token, &request.password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn send_verification_email(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth.authenticate(bearer(&headers)?).await?;
    let token = state.auth.generate_verify_email_token(&user).await?;
    state
        .mailer
        .send_verification_email(&user.email, &token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "mail dispatch failed");
            ApiError(AuthError::Unknown)
        })?;
    Ok(StatusCode::NO_CONTENT)
}

async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state.auth.verify_email(&query.token).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn enable_mfa(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let enrollment = state.mfa.enable_totp(bearer(&headers)?).await?;
    Ok(Json(enrollment))
}

async fn verify_mfa(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<MfaCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state
        .mfa
        .verify_login(bearer(&headers)?, &request.mfa_token)
        .await?;

    let body = match outcome {
        MfaVerification::LoginCompleted { user, tokens } => {
            json!({ "user": user, "tokens": tokens })
        }
        MfaVerification::EnrollmentConfirmed => json!({}),
    };
    Ok(Json(body))
}

async fn disable_mfa(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<MfaCodeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .mfa
        .disable(bearer(&headers)?, &request.mfa_token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
