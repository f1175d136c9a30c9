use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_level")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Expert,
}

impl ExperienceLevel {
    pub const NAMES: &'static [&'static str] = &["Beginner", "Intermediate", "Expert"];
}

impl FromStr for ExperienceLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Beginner" => Ok(ExperienceLevel::Beginner),
            "Intermediate" => Ok(ExperienceLevel::Intermediate),
            "Expert" => Ok(ExperienceLevel::Expert),
            _ => Err(()),
        }
    }
}

/// Days and time slots the owner can teach in. Free-form strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub time_slots: Vec<String>,
}

/// Skill record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub user_id: Uuid, // owner
    pub category: String,
    pub title: String,
    pub description: String,
    pub experience_level: ExperienceLevel,
    pub availability: Json<Availability>,
    pub is_active: bool, // false once soft-deleted
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSkill {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub title: String,
    pub description: String,
    pub experience_level: ExperienceLevel,
    pub availability: Availability,
}

#[derive(Debug, Clone, Default)]
pub struct SkillChanges {
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub availability: Option<Availability>,
}

/// Filter over active skills. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct SkillFilter {
    pub category: Option<String>,
    pub experience_level: Option<ExperienceLevel>,
    pub owner: Option<Uuid>,
}
