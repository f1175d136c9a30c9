//! In-process store used by tests. Enforces the same unique constraints as
//! the PostgreSQL schema and returns listings newest first.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::UserRepo;
use crate::auth::repo_types::{NewUser, ProfileChanges, User};
use crate::requests::repo::RequestRepo;
use crate::requests::repo_types::{
    ExchangeRequest, NewExchangeRequest, RequestFilter, RequestStatus,
};
use crate::skills::repo::SkillRepo;
use crate::skills::repo_types::{NewSkill, Skill, SkillChanges, SkillFilter};
use crate::store::StoreError;

#[derive(Default)]
struct Tables {
    // insertion order; listings walk these in reverse
    users: Vec<User>,
    skills: Vec<Skill>,
    requests: Vec<ExchangeRequest>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }
}

fn matches(filter: &RequestFilter, request: &ExchangeRequest) -> bool {
    let side = (filter.party.includes_sent() && request.from_user_id == filter.user_id)
        || (filter.party.includes_received() && request.to_user_id == filter.user_id);
    side && filter.status.map_or(true, |s| s == request.status)
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_or_phone(
        &self,
        email: &str,
        phone: &str,
    ) -> anyhow::Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.email == email || u.phone == phone)
            .cloned())
    }

    async fn find_by_phone_excluding(
        &self,
        phone: &str,
        exclude: Uuid,
    ) -> anyhow::Result<Option<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .find(|u| u.phone == phone && u.id != exclude)
            .cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let mut tables = self.lock();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate { field: "email" }.into());
        }
        if tables.users.iter().any(|u| u.phone == user.phone) {
            return Err(StoreError::Duplicate { field: "phone" }.into());
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            password_hash: user.password_hash,
            bio: None,
            profile_image: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> anyhow::Result<Option<User>> {
        let mut tables = self.lock();
        if let Some(phone) = &changes.phone {
            if tables.users.iter().any(|u| &u.phone == phone && u.id != id) {
                return Err(StoreError::Duplicate { field: "phone" }.into());
            }
        }
        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl SkillRepo for MemoryStore {
    async fn create(&self, skill: NewSkill) -> anyhow::Result<Skill> {
        let now = OffsetDateTime::now_utc();
        let skill = Skill {
            id: skill.id,
            user_id: skill.user_id,
            category: skill.category,
            title: skill.title,
            description: skill.description,
            experience_level: skill.experience_level,
            availability: Json(skill.availability),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.lock().skills.push(skill.clone());
        Ok(skill)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Skill>> {
        Ok(self.lock().skills.iter().find(|s| s.id == id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Skill>> {
        Ok(self
            .lock()
            .skills
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn list_active(&self, filter: SkillFilter) -> anyhow::Result<Vec<Skill>> {
        Ok(self
            .lock()
            .skills
            .iter()
            .rev()
            .filter(|s| s.is_active)
            .filter(|s| filter.category.as_ref().map_or(true, |c| &s.category == c))
            .filter(|s| {
                filter
                    .experience_level
                    .map_or(true, |l| s.experience_level == l)
            })
            .filter(|s| filter.owner.map_or(true, |o| s.user_id == o))
            .cloned()
            .collect())
    }

    async fn search_active(&self, query: &str) -> anyhow::Result<Vec<Skill>> {
        let needle = query.to_lowercase();
        Ok(self
            .lock()
            .skills
            .iter()
            .rev()
            .filter(|s| s.is_active)
            .filter(|s| {
                [&s.title, &s.description, &s.category]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, changes: SkillChanges) -> anyhow::Result<Option<Skill>> {
        let mut tables = self.lock();
        let Some(skill) = tables.skills.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(category) = changes.category {
            skill.category = category;
        }
        if let Some(title) = changes.title {
            skill.title = title;
        }
        if let Some(description) = changes.description {
            skill.description = description;
        }
        if let Some(level) = changes.experience_level {
            skill.experience_level = level;
        }
        if let Some(availability) = changes.availability {
            skill.availability = Json(availability);
        }
        skill.updated_at = OffsetDateTime::now_utc();
        Ok(Some(skill.clone()))
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let mut tables = self.lock();
        match tables.skills.iter_mut().find(|s| s.id == id) {
            Some(skill) => {
                skill.is_active = active;
                skill.updated_at = OffsetDateTime::now_utc();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RequestRepo for MemoryStore {
    async fn create(&self, request: NewExchangeRequest) -> anyhow::Result<ExchangeRequest> {
        let mut tables = self.lock();
        let pending_exists = tables.requests.iter().any(|r| {
            r.status == RequestStatus::Pending
                && r.skill_id == request.skill_id
                && r.from_user_id == request.from_user_id
        });
        if pending_exists {
            return Err(StoreError::Duplicate { field: "request" }.into());
        }
        let now = OffsetDateTime::now_utc();
        let request = ExchangeRequest {
            id: request.id,
            skill_id: request.skill_id,
            from_user_id: request.from_user_id,
            to_user_id: request.to_user_id,
            message: request.message,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        tables.requests.push(request.clone());
        Ok(request)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<ExchangeRequest>> {
        Ok(self.lock().requests.iter().find(|r| r.id == id).cloned())
    }

    async fn find_pending(
        &self,
        skill_id: Uuid,
        from_user_id: Uuid,
    ) -> anyhow::Result<Option<ExchangeRequest>> {
        Ok(self
            .lock()
            .requests
            .iter()
            .find(|r| {
                r.status == RequestStatus::Pending
                    && r.skill_id == skill_id
                    && r.from_user_id == from_user_id
            })
            .cloned())
    }

    async fn list(&self, filter: RequestFilter) -> anyhow::Result<Vec<ExchangeRequest>> {
        Ok(self
            .lock()
            .requests
            .iter()
            .rev()
            .filter(|r| matches(&filter, r))
            .cloned()
            .collect())
    }

    async fn list_for_skill(&self, skill_id: Uuid) -> anyhow::Result<Vec<ExchangeRequest>> {
        Ok(self
            .lock()
            .requests
            .iter()
            .rev()
            .filter(|r| r.skill_id == skill_id)
            .cloned()
            .collect())
    }

    async fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
    ) -> anyhow::Result<Option<ExchangeRequest>> {
        let mut tables = self.lock();
        match tables
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == from)
        {
            Some(request) => {
                request.status = to;
                request.updated_at = OffsetDateTime::now_utc();
                Ok(Some(request.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_pending(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut tables = self.lock();
        let before = tables.requests.len();
        tables
            .requests
            .retain(|r| !(r.id == id && r.status == RequestStatus::Pending));
        Ok(tables.requests.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, phone: &str) -> NewUser {
        NewUser {
            id: Uuid::new_v4(),
            name: "Someone".into(),
            email: email.into(),
            phone: phone.into(),
            password_hash: "hash".into(),
        }
    }

    #[tokio::test]
    async fn unique_email_and_phone() {
        let store = MemoryStore::default();
        UserRepo::create(&store, new_user("a@x.io", "1111111111"))
            .await
            .unwrap();

        let err = UserRepo::create(&store, new_user("a@x.io", "2222222222"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Duplicate { field: "email" })
        ));

        let err = UserRepo::create(&store, new_user("b@x.io", "1111111111"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Duplicate { field: "phone" })
        ));
    }

    #[tokio::test]
    async fn one_pending_request_per_skill_and_requester() {
        let store = MemoryStore::default();
        let request = || NewExchangeRequest {
            id: Uuid::new_v4(),
            skill_id: Uuid::nil(),
            from_user_id: Uuid::nil(),
            to_user_id: Uuid::new_v4(),
            message: String::new(),
        };
        let first = RequestRepo::create(&store, request()).await.unwrap();
        assert!(RequestRepo::create(&store, request()).await.is_err());

        store
            .transition(first.id, RequestStatus::Pending, RequestStatus::Rejected)
            .await
            .unwrap();
        assert!(RequestRepo::create(&store, request()).await.is_ok());
    }

    #[tokio::test]
    async fn request_listing_respects_side_and_status() {
        use crate::requests::repo_types::Party;

        let store = MemoryStore::default();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let new = |from, to| NewExchangeRequest {
            id: Uuid::new_v4(),
            skill_id: Uuid::new_v4(),
            from_user_id: from,
            to_user_id: to,
            message: String::new(),
        };
        let sent = RequestRepo::create(&store, new(me, other)).await.unwrap();
        let received = RequestRepo::create(&store, new(other, me)).await.unwrap();
        RequestRepo::create(&store, new(other, Uuid::new_v4()))
            .await
            .unwrap();
        store
            .transition(received.id, RequestStatus::Pending, RequestStatus::Accepted)
            .await
            .unwrap();

        let ids = |list: Vec<ExchangeRequest>| list.into_iter().map(|r| r.id).collect::<Vec<_>>();
        let filter = |party, status| RequestFilter {
            user_id: me,
            party,
            status,
        };

        let both = store.list(filter(Party::Either, None)).await.unwrap();
        assert_eq!(ids(both), vec![received.id, sent.id]);
        let only_sent = store.list(filter(Party::Sent, None)).await.unwrap();
        assert_eq!(ids(only_sent), vec![sent.id]);
        let accepted = store
            .list(filter(Party::Either, Some(RequestStatus::Accepted)))
            .await
            .unwrap();
        assert_eq!(ids(accepted), vec![received.id]);
        let pending_received = store
            .list(filter(Party::Received, Some(RequestStatus::Pending)))
            .await
            .unwrap();
        assert!(pending_received.is_empty());
    }
}
