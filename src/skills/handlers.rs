use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::instrument;

use crate::{
    api::{parse_id, ApiPath, ApiQuery, ApiResponse, Empty},
    auth::AuthUser,
    error::AppError,
    skills::{
        dto::{
            CreateSkillRequest, SearchQuery, SkillList, SkillPayload, SkillQuery,
            UpdateSkillRequest,
        },
        services,
    },
    state::AppState,
    validation::Valid,
};

/// Reads are public; mutations require a bearer token.
pub fn skill_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_skills).post(create_skill))
        .route("/search", get(search_skills))
        .route("/user/:user_id", get(list_user_skills))
        .route("/:id", get(get_skill).put(update_skill).delete(delete_skill))
}

#[instrument(skip(state))]
pub async fn list_skills(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SkillQuery>,
) -> Result<ApiResponse<SkillList>, AppError> {
    let skills = services::list(&state, query).await?;
    Ok(ApiResponse::ok(skills.into()))
}

#[instrument(skip(state))]
pub async fn search_skills(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<SearchQuery>,
) -> Result<ApiResponse<SkillList>, AppError> {
    let skills = services::search(&state, q.query).await?;
    Ok(ApiResponse::ok(skills.into()))
}

#[instrument(skip(state))]
pub async fn list_user_skills(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<String>,
) -> Result<ApiResponse<SkillList>, AppError> {
    let user_id = parse_id(&user_id, "Invalid user ID")?;
    let skills = services::list_by_user(&state, user_id).await?;
    Ok(ApiResponse::ok(skills.into()))
}

#[instrument(skip(state))]
pub async fn get_skill(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<SkillPayload>, AppError> {
    let id = parse_id(&id, "Invalid skill ID")?;
    let skill = services::get_by_id(&state, id).await?;
    Ok(ApiResponse::ok(SkillPayload { skill }))
}

#[instrument(skip(state, payload))]
pub async fn create_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Valid(payload): Valid<CreateSkillRequest>,
) -> Result<(StatusCode, ApiResponse<SkillPayload>), AppError> {
    let skill = services::create(&state, user_id, payload).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::with_message("Skill created successfully", SkillPayload { skill }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<String>,
    Valid(payload): Valid<UpdateSkillRequest>,
) -> Result<ApiResponse<SkillPayload>, AppError> {
    let id = parse_id(&id, "Invalid skill ID")?;
    let skill = services::update(&state, id, user_id, payload).await?;
    Ok(ApiResponse::with_message(
        "Skill updated successfully",
        SkillPayload { skill },
    ))
}

#[instrument(skip(state))]
pub async fn delete_skill(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiPath(id): ApiPath<String>,
) -> Result<ApiResponse<Empty>, AppError> {
    let id = parse_id(&id, "Invalid skill ID")?;
    services::soft_delete(&state, id, user_id).await?;
    Ok(ApiResponse::message("Skill deleted successfully"))
}
