use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, patch},
    Router,
};
use tracing::instrument;

use crate::{
    api::{parse_id, ApiPath, ApiQuery, ApiResponse, Empty},
    auth::AuthUser,
    error::AppError,
    requests::{
        dto::{CreateRequestBody, RequestList, RequestPayload, RequestQuery, UpdateStatusBody},
        services,
    },
    state::AppState,
    validation::Valid,
};

/// Every route here requires a bearer token.
pub fn request_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_my_requests).post(create_request))
        .route("/skill/:skill_id", get(list_skill_requests))
        .route("/:id", get(get_request).delete(cancel_request))
        .route("/:id/status", patch(update_request_status))
}

#[instrument(skip(state, payload))]
pub async fn create_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Valid(payload): Valid<CreateRequestBody>,
) -> Result<(StatusCode, ApiResponse<RequestPayload>), AppError> {
    let request = services::create(&state, user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Request sent successfully", RequestPayload { request }),
    ))
}

#[instrument(skip(state))]
pub async fn list_my_requests(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<RequestQuery>,
) -> Result<ApiResponse<RequestList>, AppError> {
    let requests = services::list_mine(&state, user_id, query).await?;
    Ok(ApiResponse::ok(requests.into()))
}

#[instrument(skip(state))]
pub async fn get_request(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<RequestPayload>, AppError> {
    let id = parse_id(&id, "Invalid request ID")?;
    let request = services::get_by_id(&state, id).await?;
    Ok(ApiResponse::ok(RequestPayload { request }))
}

#[instrument(skip(state, payload))]
pub async fn update_request_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<String>,
    Valid(payload): Valid<UpdateStatusBody>,
) -> Result<ApiResponse<RequestPayload>, AppError> {
    let id = parse_id(&id, "Invalid request ID")?;
    let request = services::update_status(&state, id, user_id, payload.status).await?;
    let message = format!("Request {} successfully", request.status.label());
    Ok(ApiResponse::with_message(message, RequestPayload { request }))
}

#[instrument(skip(state))]
pub async fn cancel_request(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let id = parse_id(&id, "Invalid request ID")?;
    services::cancel(&state, id, user_id).await?;
    Ok(ApiResponse::message("Request cancelled successfully"))
}

#[instrument(skip(state))]
pub async fn list_skill_requests(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(skill_id): ApiPath<String>,
) -> Result<ApiResponse<RequestList>, AppError> {
    let skill_id = parse_id(&skill_id, "Invalid skill ID")?;
    let requests = services::list_for_skill(&state, skill_id, user_id).await?;
    Ok(ApiResponse::ok(requests.into()))
}
