use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::api::Ref;
use crate::auth::dto::UserSummary;
use crate::skills::repo_types::{Availability, ExperienceLevel, Skill};
use crate::validation::{Check, Rule, Validate};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSkillRequest {
    pub category: String,
    pub title: String,
    pub description: String,
    pub experience_level: ExperienceLevel,
    #[serde(default)]
    pub availability: Availability,
}

impl Validate for CreateSkillRequest {
    const RULES: &'static [Rule] = &[
        Rule::new("category", Check::Required, "Category is required"),
        Rule::new("title", Check::Required, "Title is required"),
        Rule::new("title", Check::MinLen(3), "Title must be at least 3 characters"),
        Rule::new("description", Check::Required, "Description is required"),
        Rule::new(
            "description",
            Check::MinLen(10),
            "Description must be at least 10 characters",
        ),
        Rule::new(
            "experienceLevel",
            Check::OneOf(ExperienceLevel::NAMES),
            "Invalid experience level",
        ),
    ];
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSkillRequest {
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub availability: Option<Availability>,
}

impl Validate for UpdateSkillRequest {
    const RULES: &'static [Rule] = &[
        Rule::new("category", Check::Required, "Category cannot be empty").optional(),
        Rule::new("title", Check::MinLen(3), "Title must be at least 3 characters").optional(),
        Rule::new(
            "description",
            Check::MinLen(10),
            "Description must be at least 10 characters",
        )
        .optional(),
        Rule::new(
            "experienceLevel",
            Check::OneOf(ExperienceLevel::NAMES),
            "Invalid experience level",
        )
        .optional(),
    ];
}

/// `GET /api/skills` filters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillQuery {
    pub category: Option<String>,
    pub experience_level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Ref<UserSummary>,
    pub category: String,
    pub title: String,
    pub description: String,
    pub experience_level: ExperienceLevel,
    pub availability: Availability,
    pub is_active: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl SkillView {
    pub fn new(skill: Skill, owner: Option<UserSummary>) -> Self {
        Self {
            id: skill.id,
            user_id: Ref::resolve(skill.user_id, owner),
            category: skill.category,
            title: skill.title,
            description: skill.description,
            experience_level: skill.experience_level,
            availability: skill.availability.0,
            is_active: skill.is_active,
            created_at: skill.created_at,
            updated_at: skill.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillPayload {
    pub skill: SkillView,
}

#[derive(Debug, Serialize)]
pub struct SkillList {
    pub count: usize,
    pub skills: Vec<SkillView>,
}

impl From<Vec<SkillView>> for SkillList {
    fn from(skills: Vec<SkillView>) -> Self {
        Self {
            count: skills.len(),
            skills,
        }
    }
}
