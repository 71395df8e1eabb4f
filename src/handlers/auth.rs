use super::common::{created_response, success_response};
use crate::{
    auth::{AuthenticatedUser, TokenPair},
    entities::user,
    errors::ServiceError,
    handlers::AppState,
    services::users::{
        AddressInput, ProfileChanges, RegisterInput, ResendOutcome, ResetPasswordInput,
        VerifyOutcome,
    },
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub phone_number: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub code: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddressPayload {
    pub address_line_1: String,
    #[serde(default)]
    pub address_line_2: Option<String>,
    pub city: String,
    pub country: String,
    pub postcode: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<AddressPayload>,
}

#[derive(Debug, Serialize)]
pub struct AddressResponse {
    pub address_line_1: String,
    pub address_line_2: String,
    pub city: String,
    pub country: String,
    pub postcode: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub role: String,
    pub is_email_verified: bool,
    pub address: AddressResponse,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            phone_number: model.phone_number,
            role: model.role,
            is_email_verified: model.is_email_verified,
            address: AddressResponse {
                address_line_1: model.address_line_1.unwrap_or_default(),
                address_line_2: model.address_line_2.unwrap_or_default(),
                city: model.city.unwrap_or_default(),
                country: model.country.unwrap_or_default(),
                postcode: model.postcode.unwrap_or_default(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TokenResponse<'a> {
    message: &'a str,
    #[serde(flatten)]
    tokens: TokenPair,
    user: UserResponse,
}

/// Register a new account; it stays inactive until the email is verified
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state
        .services
        .users
        .register(RegisterInput {
            full_name: payload.full_name,
            phone_number: payload.phone_number,
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok(created_response(json!({
        "message": "Registration successful! Please check your email for verification code.",
        "user": UserResponse::from(account),
    })))
}

/// Verify email with the code sent to the user; success also signs in
pub async fn verify_email(
    State(state): State<AppState>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    match state
        .services
        .users
        .verify_email(&payload.email, &payload.code)
        .await?
    {
        VerifyOutcome::AlreadyVerified => Ok(success_response(json!({
            "message": "Email is already verified.",
        }))),
        VerifyOutcome::Verified { account, tokens } => {
            Ok(success_response(TokenResponse {
                message: "Email verified successfully! You can now login.",
                tokens,
                user: account.into(),
            }))
        }
    }
}

/// Resend the verification code
pub async fn resend_verification(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    match state
        .services
        .users
        .resend_verification(&payload.email)
        .await?
    {
        ResendOutcome::AlreadyVerified => Ok(success_response(json!({
            "message": "Email is already verified.",
        }))),
        ResendOutcome::Sent => Ok(success_response(json!({
            "message": "Verification code resent successfully.",
        }))),
    }
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let (account, tokens) = state
        .services
        .users
        .login(&payload.email, &payload.password)
        .await?;

    Ok(success_response(TokenResponse {
        message: "Login successful.",
        tokens,
        user: account.into(),
    }))
}

/// Exchange a refresh token for a fresh pair
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let tokens = state
        .services
        .users
        .refresh_token(&payload.refresh_token)
        .await?;
    Ok(success_response(tokens))
}

/// Invalidate a refresh token
pub async fn logout(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.users.logout(&payload.refresh_token).await?;
    Ok(success_response(json!({
        "message": "Logout successful.",
    })))
}

/// Get current user profile
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state.services.users.get_profile(user.user_id).await?;
    Ok(success_response(json!({
        "user": UserResponse::from(account),
    })))
}

/// Update user profile including address
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    let account = state
        .services
        .users
        .update_profile(
            user.user_id,
            ProfileChanges {
                full_name: payload.full_name,
                phone_number: payload.phone_number,
                address: payload.address.map(|address| AddressInput {
                    address_line_1: address.address_line_1,
                    address_line_2: address.address_line_2,
                    city: address.city,
                    country: address.country,
                    postcode: address.postcode,
                }),
            },
        )
        .await?;

    Ok(success_response(json!({
        "message": "Profile updated successfully.",
        "user": UserResponse::from(account),
    })))
}

/// Request a password reset code. The response never reveals whether the
/// email exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state.services.users.forgot_password(&payload.email).await?;
    Ok(success_response(json!({
        "message": "If the email exists, a password reset code has been sent.",
    })))
}

/// Verify the reset code and set the new password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    state
        .services
        .users
        .reset_password(ResetPasswordInput {
            email: payload.email,
            code: payload.code,
            password: payload.password,
            confirm_password: payload.confirm_password,
        })
        .await?;

    Ok(success_response(json!({
        "message": "Password reset successful! You can now login with your new password.",
    })))
}

/// Creates the router for account endpoints
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-email", post(verify_email))
        .route("/resend-verification", post(resend_verification))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh_token))
        .route("/logout", post(logout))
        .route("/profile", get(get_profile).patch(update_profile))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password", post(reset_password))
}
