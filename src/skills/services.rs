use std::collections::HashMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::dto::{UserProjection, UserSummary};
use crate::error::AppError;
use crate::skills::dto::{CreateSkillRequest, SkillQuery, SkillView, UpdateSkillRequest};
use crate::skills::repo_types::{ExperienceLevel, NewSkill, Skill, SkillChanges, SkillFilter};
use crate::state::AppState;

/// Attaches the owner projection to each skill with one batched user lookup.
async fn with_owners(
    state: &AppState,
    skills: Vec<Skill>,
    projection: UserProjection,
) -> Result<Vec<SkillView>, AppError> {
    let mut owner_ids: Vec<Uuid> = skills.iter().map(|s| s.user_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();

    let owners: HashMap<Uuid, UserSummary> = state
        .users
        .find_many(&owner_ids)
        .await?
        .iter()
        .map(|u| (u.id, UserSummary::project(u, projection)))
        .collect();

    Ok(skills
        .into_iter()
        .map(|s| {
            let owner = owners.get(&s.user_id).cloned();
            SkillView::new(s, owner)
        })
        .collect())
}

async fn with_owner(
    state: &AppState,
    skill: Skill,
    projection: UserProjection,
) -> Result<SkillView, AppError> {
    let owner = state.users.find_by_id(skill.user_id).await?;
    let owner = owner.as_ref().map(|u| UserSummary::project(u, projection));
    Ok(SkillView::new(skill, owner))
}

/// Loads a skill for a mutation by `requester`, enforcing ownership.
async fn owned_skill(
    state: &AppState,
    id: Uuid,
    requester: Uuid,
    action: &str,
) -> Result<Skill, AppError> {
    let skill = state
        .skills
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Skill not found"))?;
    if skill.user_id != requester {
        warn!(skill_id = %id, %requester, action, "skill ownership check failed");
        return Err(AppError::forbidden(format!(
            "You are not authorized to {action} this skill"
        )));
    }
    Ok(skill)
}

fn supplied(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn create(
    state: &AppState,
    owner: Uuid,
    input: CreateSkillRequest,
) -> Result<SkillView, AppError> {
    let skill = state
        .skills
        .create(NewSkill {
            id: Uuid::new_v4(),
            user_id: owner,
            category: input.category.trim().to_string(),
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            experience_level: input.experience_level,
            availability: input.availability,
        })
        .await?;
    info!(skill_id = %skill.id, owner = %owner, "skill created");
    with_owner(state, skill, UserProjection::Contact).await
}

pub async fn list(state: &AppState, query: SkillQuery) -> Result<Vec<SkillView>, AppError> {
    let experience_level = match supplied(query.experience_level) {
        Some(raw) => Some(
            raw.parse::<ExperienceLevel>()
                .map_err(|_| AppError::bad_request("Invalid experience level"))?,
        ),
        None => None,
    };
    let filter = SkillFilter {
        category: supplied(query.category),
        experience_level,
        owner: None,
    };
    let skills = state.skills.list_active(filter).await?;
    with_owners(state, skills, UserProjection::Listing).await
}

pub async fn get_by_id(state: &AppState, id: Uuid) -> Result<SkillView, AppError> {
    let skill = state
        .skills
        .find_by_id(id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| AppError::not_found("Skill not found"))?;
    with_owner(state, skill, UserProjection::Detailed).await
}

pub async fn list_by_user(state: &AppState, user_id: Uuid) -> Result<Vec<SkillView>, AppError> {
    let filter = SkillFilter {
        owner: Some(user_id),
        ..Default::default()
    };
    let skills = state.skills.list_active(filter).await?;
    with_owners(state, skills, UserProjection::Listing).await
}

pub async fn update(
    state: &AppState,
    id: Uuid,
    requester: Uuid,
    input: UpdateSkillRequest,
) -> Result<SkillView, AppError> {
    owned_skill(state, id, requester, "update").await?;

    let changes = SkillChanges {
        category: supplied(input.category),
        title: supplied(input.title),
        description: supplied(input.description),
        experience_level: input.experience_level,
        availability: input.availability,
    };
    let skill = state
        .skills
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("Skill not found"))?;
    info!(skill_id = %id, "skill updated");
    with_owner(state, skill, UserProjection::Listing).await
}

pub async fn soft_delete(state: &AppState, id: Uuid, requester: Uuid) -> Result<(), AppError> {
    owned_skill(state, id, requester, "delete").await?;
    if !state.skills.set_active(id, false).await? {
        return Err(AppError::not_found("Skill not found"));
    }
    info!(skill_id = %id, "skill soft deleted");
    Ok(())
}

pub async fn search(state: &AppState, query: Option<String>) -> Result<Vec<SkillView>, AppError> {
    let query = supplied(query).ok_or_else(|| AppError::bad_request("Search query is required"))?;
    let skills = state.skills.search_active(&query).await?;
    with_owners(state, skills, UserProjection::Listing).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{dto::RegisterRequest, services as auth};
    use crate::skills::repo_types::Availability;

    async fn user(state: &AppState, email: &str, phone: &str) -> Uuid {
        let (_, user) = auth::register(
            state,
            RegisterRequest {
                name: "Someone".into(),
                email: email.into(),
                phone: phone.into(),
                password: "secret123".into(),
            },
        )
        .await
        .unwrap();
        user.id
    }

    fn guitar() -> CreateSkillRequest {
        CreateSkillRequest {
            category: "Music".into(),
            title: "Guitar Lessons".into(),
            description: "Acoustic guitar for absolute beginners".into(),
            experience_level: ExperienceLevel::Intermediate,
            availability: Availability {
                days: vec!["Monday".into()],
                time_slots: vec!["18:00-20:00".into()],
            },
        }
    }

    fn cooking() -> CreateSkillRequest {
        CreateSkillRequest {
            category: "Cooking".into(),
            title: "Italian Pasta".into(),
            description: "Fresh pasta from scratch, no machine".into(),
            experience_level: ExperienceLevel::Expert,
            availability: Availability::default(),
        }
    }

    #[tokio::test]
    async fn create_joins_narrow_owner_projection() {
        let state = AppState::fake();
        let owner = user(&state, "ann@example.com", "1234567890").await;
        let view = create(&state, owner, guitar()).await.unwrap();
        assert!(view.is_active);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["userId"]["_id"], owner.to_string());
        assert_eq!(json["userId"]["email"], "ann@example.com");
        assert!(json["userId"].get("bio").is_none());
        assert_eq!(json["availability"]["timeSlots"][0], "18:00-20:00");
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let state = AppState::fake();
        let owner = user(&state, "ann@example.com", "1234567890").await;
        let first = create(&state, owner, guitar()).await.unwrap();
        let second = create(&state, owner, cooking()).await.unwrap();

        let all = list(&state, SkillQuery::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let music = list(
            &state,
            SkillQuery {
                category: Some("Music".into()),
                experience_level: Some("Intermediate".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(music.len(), 1);
        assert_eq!(music[0].id, first.id);

        let err = list(
            &state,
            SkillQuery {
                category: None,
                experience_level: Some("Guru".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn soft_deleted_skill_disappears_from_reads() {
        let state = AppState::fake();
        let owner = user(&state, "ann@example.com", "1234567890").await;
        let skill = create(&state, owner, guitar()).await.unwrap();

        soft_delete(&state, skill.id, owner).await.unwrap();

        assert!(list(&state, SkillQuery::default()).await.unwrap().is_empty());
        assert!(list_by_user(&state, owner).await.unwrap().is_empty());
        assert!(search(&state, Some("guitar".into())).await.unwrap().is_empty());
        assert!(matches!(
            get_by_id(&state, skill.id).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        // the record itself is kept
        let stored = state.skills.find_by_id(skill.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn only_the_owner_may_update_or_delete() {
        let state = AppState::fake();
        let owner = user(&state, "ann@example.com", "1234567890").await;
        let other = user(&state, "bob@example.com", "2222222222").await;
        let skill = create(&state, owner, guitar()).await.unwrap();

        let err = update(
            &state,
            skill.id,
            other,
            UpdateSkillRequest {
                title: Some("Stolen".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = soft_delete(&state, skill.id, other).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        let err = soft_delete(&state, Uuid::new_v4(), owner).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let stored = state.skills.find_by_id(skill.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "Guitar Lessons");
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let state = AppState::fake();
        let owner = user(&state, "ann@example.com", "1234567890").await;
        let skill = create(&state, owner, guitar()).await.unwrap();

        let updated = update(
            &state,
            skill.id,
            owner,
            UpdateSkillRequest {
                title: Some("Electric Guitar".into()),
                experience_level: Some(ExperienceLevel::Expert),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.title, "Electric Guitar");
        assert_eq!(updated.experience_level, ExperienceLevel::Expert);
        assert_eq!(updated.category, "Music");
        assert_eq!(updated.availability.days, vec!["Monday".to_string()]);
    }

    #[tokio::test]
    async fn get_by_id_uses_detailed_owner_projection() {
        let state = AppState::fake();
        let owner = user(&state, "ann@example.com", "1234567890").await;
        auth::update_profile(
            &state,
            owner,
            crate::auth::dto::UpdateProfileRequest {
                bio: Some("Plays since 2005".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let skill = create(&state, owner, guitar()).await.unwrap();

        let json = serde_json::to_value(get_by_id(&state, skill.id).await.unwrap()).unwrap();
        assert_eq!(json["userId"]["bio"], "Plays since 2005");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_fields() {
        let state = AppState::fake();
        let owner = user(&state, "ann@example.com", "1234567890").await;
        let guitar = create(&state, owner, guitar()).await.unwrap();
        create(&state, owner, cooking()).await.unwrap();

        let by_title = search(&state, Some("GUITAR".into())).await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].id, guitar.id);

        let by_category = search(&state, Some("cook".into())).await.unwrap();
        assert_eq!(by_category.len(), 1);

        let by_description = search(&state, Some("scratch".into())).await.unwrap();
        assert_eq!(by_description.len(), 1);

        let err = search(&state, Some("   ".into())).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref m) if m == "Search query is required"));
        assert!(search(&state, None).await.is_err());
    }
}
