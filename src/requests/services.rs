use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::dto::{UserProjection, UserSummary};
use crate::error::AppError;
use crate::requests::dto::{CreateRequestBody, Join, RequestQuery, RequestView, SkillSummary};
use crate::requests::repo_types::{
    ExchangeRequest, NewExchangeRequest, Party, RequestFilter, RequestStatus,
};
use crate::state::AppState;
use crate::store::StoreError;

const PENDING_EXISTS: &str = "You already have a pending request for this skill";

fn dedup(mut ids: Vec<Uuid>) -> Vec<Uuid> {
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Attaches skill and party projections with one batched lookup per table.
/// Soft-deleted skills still resolve here.
async fn populate(
    state: &AppState,
    requests: Vec<ExchangeRequest>,
    join: Join,
) -> Result<Vec<RequestView>, AppError> {
    let (with_skill, with_owner, projection) = match join {
        Join::Brief => (true, true, UserProjection::Contact),
        Join::Full => (true, true, UserProjection::Listing),
        Join::RequesterOnly => (false, false, UserProjection::Listing),
    };

    let skills: HashMap<Uuid, SkillSummary> = if with_skill {
        let ids = dedup(requests.iter().map(|r| r.skill_id).collect());
        state
            .skills
            .find_many(&ids)
            .await?
            .iter()
            .map(|s| (s.id, SkillSummary::project(s, join == Join::Full)))
            .collect()
    } else {
        HashMap::new()
    };

    let mut user_ids: Vec<Uuid> = requests.iter().map(|r| r.from_user_id).collect();
    if with_owner {
        user_ids.extend(requests.iter().map(|r| r.to_user_id));
    }
    let users: HashMap<Uuid, UserSummary> = state
        .users
        .find_many(&dedup(user_ids))
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::project(u, projection)))
        .collect();

    Ok(requests
        .into_iter()
        .map(|r| {
            let skill = skills.get(&r.skill_id).cloned();
            let from = users.get(&r.from_user_id).cloned();
            let to = if with_owner {
                users.get(&r.to_user_id).cloned()
            } else {
                None
            };
            RequestView::new(r, skill, from, to)
        })
        .collect())
}

async fn populate_one(
    state: &AppState,
    request: ExchangeRequest,
    join: Join,
) -> Result<RequestView, AppError> {
    populate(state, vec![request], join)
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Request not found"))
}

async fn find(state: &AppState, id: Uuid) -> Result<ExchangeRequest, AppError> {
    state
        .requests
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Request not found"))
}

pub async fn create(
    state: &AppState,
    from_user_id: Uuid,
    input: CreateRequestBody,
) -> Result<RequestView, AppError> {
    let skill_id = Uuid::parse_str(input.skill_id.trim())
        .map_err(|_| AppError::bad_request("Invalid ID format"))?;

    let skill = state
        .skills
        .find_by_id(skill_id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::not_found("Skill not found"))?;

    if skill.user_id == from_user_id {
        warn!(%skill_id, user_id = %from_user_id, "self request refused");
        return Err(AppError::bad_request("You cannot request your own skill"));
    }

    if state
        .requests
        .find_pending(skill_id, from_user_id)
        .await?
        .is_some()
    {
        return Err(AppError::conflict(PENDING_EXISTS));
    }

    let new = NewExchangeRequest {
        id: Uuid::new_v4(),
        skill_id,
        from_user_id,
        to_user_id: skill.user_id,
        message: input
            .message
            .map(|m| m.trim().to_string())
            .unwrap_or_default(),
    };
    let request = match state.requests.create(new).await {
        Ok(request) => request,
        // lost the race against a concurrent create
        Err(err) if err.downcast_ref::<StoreError>().is_some() => {
            return Err(AppError::conflict(PENDING_EXISTS));
        }
        Err(err) => return Err(err.into()),
    };
    info!(request_id = %request.id, %skill_id, from = %from_user_id, "request created");
    populate_one(state, request, Join::Brief).await
}

pub async fn list_mine(
    state: &AppState,
    user_id: Uuid,
    query: RequestQuery,
) -> Result<Vec<RequestView>, AppError> {
    let status = match query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<RequestStatus>()
                .map_err(|_| AppError::bad_request("Invalid status"))?,
        ),
        None => None,
    };
    let filter = RequestFilter {
        user_id,
        party: Party::from_query(query.kind.as_deref()),
        status,
    };
    let requests = state.requests.list(filter).await?;
    populate(state, requests, Join::Full).await
}

pub async fn get_by_id(state: &AppState, id: Uuid) -> Result<RequestView, AppError> {
    let request = find(state, id).await?;
    populate_one(state, request, Join::Full).await
}

/// Decides whether `requester` may move `request` to `next`.
/// Authorization is checked before the state machine.
fn check_transition(
    request: &ExchangeRequest,
    requester: Uuid,
    next: RequestStatus,
) -> Result<(), AppError> {
    let current = request.status;
    match next {
        RequestStatus::Pending => return Err(AppError::bad_request("Invalid status")),
        RequestStatus::Accepted | RequestStatus::Rejected if requester != request.to_user_id => {
            return Err(AppError::forbidden(
                "You are not authorized to update this request",
            ));
        }
        RequestStatus::Completed if requester != request.from_user_id => {
            return Err(AppError::forbidden(
                "Only the requester can mark this as completed",
            ));
        }
        RequestStatus::Completed if current != RequestStatus::Accepted => {
            return Err(AppError::bad_request(
                "Only accepted requests can be marked as completed",
            ));
        }
        _ => {}
    }

    if current.is_terminal() {
        return Err(AppError::bad_request(format!(
            "Cannot update a {} request",
            current.label()
        )));
    }
    if current != RequestStatus::Pending && next != RequestStatus::Completed {
        return Err(AppError::bad_request("Request has already been accepted"));
    }
    Ok(())
}

pub async fn update_status(
    state: &AppState,
    id: Uuid,
    requester: Uuid,
    next: RequestStatus,
) -> Result<RequestView, AppError> {
    let request = find(state, id).await?;
    if let Err(err) = check_transition(&request, requester, next) {
        warn!(request_id = %id, %requester, from = %request.status, to = %next, "transition refused");
        return Err(err);
    }

    let updated = state
        .requests
        .transition(id, request.status, next)
        .await?
        .ok_or_else(|| AppError::conflict("Request was modified by another action, try again"))?;
    info!(request_id = %id, from = %request.status, to = %next, "request status updated");
    populate_one(state, updated, Join::Brief).await
}

pub async fn cancel(state: &AppState, id: Uuid, requester: Uuid) -> Result<(), AppError> {
    let request = find(state, id).await?;
    if request.from_user_id != requester {
        warn!(request_id = %id, %requester, "cancel by non-requester refused");
        return Err(AppError::forbidden("You can only cancel your own requests"));
    }
    if request.status != RequestStatus::Pending {
        return Err(AppError::bad_request(format!(
            "Cannot cancel a {} request",
            request.status.label()
        )));
    }
    if !state.requests.delete_pending(id).await? {
        return Err(AppError::conflict(
            "Request was modified by another action, try again",
        ));
    }
    info!(request_id = %id, "request cancelled");
    Ok(())
}

pub async fn list_for_skill(
    state: &AppState,
    skill_id: Uuid,
    requester: Uuid,
) -> Result<Vec<RequestView>, AppError> {
    let owns = state
        .skills
        .find_by_id(skill_id)
        .await?
        .is_some_and(|s| s.user_id == requester);
    if !owns {
        warn!(%skill_id, %requester, "skill request listing refused");
        return Err(AppError::forbidden(
            "You can only view requests for your own skills",
        ));
    }
    let requests = state.requests.list_for_skill(skill_id).await?;
    populate(state, requests, Join::RequesterOnly).await
}
