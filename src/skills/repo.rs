use async_trait::async_trait;
use sqlx::types::Json;
use uuid::Uuid;

use crate::skills::repo_types::{NewSkill, Skill, SkillChanges, SkillFilter};
use crate::store::{like_pattern, write_error, PgStore};

#[async_trait]
pub trait SkillRepo: Send + Sync {
    async fn create(&self, skill: NewSkill) -> anyhow::Result<Skill>;
    /// Any skill, active or not.
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Skill>>;
    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Skill>>;
    /// Active skills matching `filter`, newest first.
    async fn list_active(&self, filter: SkillFilter) -> anyhow::Result<Vec<Skill>>;
    /// Active skills whose title, description or category contain `query`
    /// (case-insensitive), best match first.
    async fn search_active(&self, query: &str) -> anyhow::Result<Vec<Skill>>;
    async fn update(&self, id: Uuid, changes: SkillChanges) -> anyhow::Result<Option<Skill>>;
    /// Returns false when no such skill exists.
    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool>;
}

#[async_trait]
impl SkillRepo for PgStore {
    async fn create(&self, skill: NewSkill) -> anyhow::Result<Skill> {
        sqlx::query_as::<_, Skill>(
            r#"
            INSERT INTO skills (id, user_id, category, title, description, experience_level, availability)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, user_id, category, title, description, experience_level, availability,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(skill.id)
        .bind(skill.user_id)
        .bind(&skill.category)
        .bind(&skill.title)
        .bind(&skill.description)
        .bind(skill.experience_level)
        .bind(Json(&skill.availability))
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, user_id, category, title, description, experience_level, availability,
                   is_active, created_at, updated_at
            FROM skills
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(skill)
    }

    async fn find_many(&self, ids: &[Uuid]) -> anyhow::Result<Vec<Skill>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let skills = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, user_id, category, title, description, experience_level, availability,
                   is_active, created_at, updated_at
            FROM skills
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    async fn list_active(&self, filter: SkillFilter) -> anyhow::Result<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, user_id, category, title, description, experience_level, availability,
                   is_active, created_at, updated_at
            FROM skills
            WHERE is_active
              AND ($1::text IS NULL OR category = $1)
              AND ($2::experience_level IS NULL OR experience_level = $2)
              AND ($3::uuid IS NULL OR user_id = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.category)
        .bind(filter.experience_level)
        .bind(filter.owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    async fn search_active(&self, query: &str) -> anyhow::Result<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>(
            r#"
            SELECT id, user_id, category, title, description, experience_level, availability,
                   is_active, created_at, updated_at
            FROM skills
            WHERE is_active
              AND (title ILIKE $2 ESCAPE '\'
                   OR description ILIKE $2 ESCAPE '\'
                   OR category ILIKE $2 ESCAPE '\')
            ORDER BY ts_rank(
                         to_tsvector('english', title || ' ' || description || ' ' || category),
                         plainto_tsquery('english', $1)
                     ) DESC,
                     created_at DESC
            "#,
        )
        .bind(query)
        .bind(like_pattern(query))
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    async fn update(&self, id: Uuid, changes: SkillChanges) -> anyhow::Result<Option<Skill>> {
        sqlx::query_as::<_, Skill>(
            r#"
            UPDATE skills
               SET category = COALESCE($2, category),
                   title = COALESCE($3, title),
                   description = COALESCE($4, description),
                   experience_level = COALESCE($5, experience_level),
                   availability = COALESCE($6, availability),
                   updated_at = now()
             WHERE id = $1
            RETURNING id, user_id, category, title, description, experience_level, availability,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.category)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.experience_level)
        .bind(changes.availability.map(Json))
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE skills
               SET is_active = $2, updated_at = now()
             WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(active)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;
        Ok(result.rows_affected() > 0)
    }
}
