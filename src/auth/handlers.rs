use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tracing::instrument;

use crate::{
    api::{ApiResponse, Empty},
    auth::{
        dto::{AuthPayload, LoginRequest, RegisterRequest, UpdateProfileRequest, UserPayload},
        extractors::AuthUser,
        services,
    },
    error::AppError,
    state::AppState,
    validation::Valid,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).put(update_profile))
        .route("/logout", post(logout))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Valid(payload): Valid<RegisterRequest>,
) -> Result<(StatusCode, ApiResponse<AuthPayload>), AppError> {
    let (token, user) = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message(
            "User registered successfully",
            AuthPayload {
                token,
                user: user.into(),
            },
        ),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Valid(payload): Valid<LoginRequest>,
) -> Result<ApiResponse<AuthPayload>, AppError> {
    let (token, user) = services::login(&state, payload).await?;
    Ok(ApiResponse::with_message(
        "Login successful",
        AuthPayload {
            token,
            user: user.into(),
        },
    ))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<ApiResponse<UserPayload>, AppError> {
    let user = services::profile(&state, user_id).await?;
    Ok(ApiResponse::ok(UserPayload { user: user.into() }))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Valid(payload): Valid<UpdateProfileRequest>,
) -> Result<ApiResponse<UserPayload>, AppError> {
    let user = services::update_profile(&state, user_id, payload).await?;
    Ok(ApiResponse::with_message(
        "Profile updated successfully",
        UserPayload { user: user.into() },
    ))
}

/// Tokens are stateless; the client simply discards its copy.
#[instrument]
pub async fn logout(AuthUser(user_id): AuthUser) -> ApiResponse<Empty> {
    tracing::info!(%user_id, "logout acknowledged");
    ApiResponse::message("Logout successful. Please remove the token from your client.")
}
