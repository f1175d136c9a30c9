use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::api::Ref;
use crate::auth::dto::UserSummary;
use crate::requests::repo_types::{ExchangeRequest, RequestStatus};
use crate::skills::repo_types::{ExperienceLevel, Skill};
use crate::validation::{Check, Rule, Validate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequestBody {
    /// Kept as text so a malformed id gets its own message.
    pub skill_id: String,
    pub message: Option<String>,
}

impl Validate for CreateRequestBody {
    const RULES: &'static [Rule] = &[
        Rule::new("skillId", Check::Required, "Skill ID is required"),
        Rule::new(
            "message",
            Check::MaxLen(500),
            "Message cannot exceed 500 characters",
        )
        .optional(),
    ];
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusBody {
    pub status: RequestStatus,
}

impl Validate for UpdateStatusBody {
    const RULES: &'static [Rule] = &[Rule::new(
        "status",
        Check::OneOf(&["Accepted", "Rejected", "Completed"]),
        "Invalid status",
    )];
}

/// `GET /api/requests` filters.
#[derive(Debug, Default, Deserialize)]
pub struct RequestQuery {
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Narrowed skill attached to requests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience_level: Option<ExperienceLevel>,
}

impl SkillSummary {
    pub fn project(skill: &Skill, detailed: bool) -> Self {
        Self {
            id: skill.id,
            title: skill.title.clone(),
            category: skill.category.clone(),
            description: detailed.then(|| skill.description.clone()),
            experience_level: detailed.then_some(skill.experience_level),
        }
    }
}

/// How much of the referenced records a request response carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Join {
    /// skill title and category, both parties' contact fields
    Brief,
    /// adds skill description and level, parties' profile image
    Full,
    /// only the requester, with profile image
    RequesterOnly,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub skill_id: Ref<SkillSummary>,
    pub from_user_id: Ref<UserSummary>,
    pub to_user_id: Ref<UserSummary>,
    pub message: String,
    pub status: RequestStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl RequestView {
    pub fn new(
        request: ExchangeRequest,
        skill: Option<SkillSummary>,
        from: Option<UserSummary>,
        to: Option<UserSummary>,
    ) -> Self {
        Self {
            id: request.id,
            skill_id: Ref::resolve(request.skill_id, skill),
            from_user_id: Ref::resolve(request.from_user_id, from),
            to_user_id: Ref::resolve(request.to_user_id, to),
            message: request.message,
            status: request.status,
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RequestPayload {
    pub request: RequestView,
}

#[derive(Debug, Serialize)]
pub struct RequestList {
    pub count: usize,
    pub requests: Vec<RequestView>,
}

impl From<Vec<RequestView>> for RequestList {
    fn from(requests: Vec<RequestView>) -> Self {
        Self {
            count: requests.len(),
            requests,
        }
    }
}
