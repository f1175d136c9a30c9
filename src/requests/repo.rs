use async_trait::async_trait;
use uuid::Uuid;

use crate::requests::repo_types::{
    ExchangeRequest, NewExchangeRequest, RequestFilter, RequestStatus,
};
use crate::store::{write_error, PgStore};

#[async_trait]
pub trait RequestRepo: Send + Sync {
    async fn create(&self, request: NewExchangeRequest) -> anyhow::Result<ExchangeRequest>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<ExchangeRequest>>;
    async fn find_pending(
        &self,
        skill_id: Uuid,
        from_user_id: Uuid,
    ) -> anyhow::Result<Option<ExchangeRequest>>;
    /// Requests matching `filter`, newest first.
    async fn list(&self, filter: RequestFilter) -> anyhow::Result<Vec<ExchangeRequest>>;
    /// All requests against a skill, newest first.
    async fn list_for_skill(&self, skill_id: Uuid) -> anyhow::Result<Vec<ExchangeRequest>>;
    /// Compare-and-set on the status. `None` if the request is gone or no
    /// longer in `from`.
    async fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
    ) -> anyhow::Result<Option<ExchangeRequest>>;
    /// Deletes the request only while it is still Pending.
    async fn delete_pending(&self, id: Uuid) -> anyhow::Result<bool>;
}

#[async_trait]
impl RequestRepo for PgStore {
    async fn create(&self, request: NewExchangeRequest) -> anyhow::Result<ExchangeRequest> {
        sqlx::query_as::<_, ExchangeRequest>(
            r#"
            INSERT INTO exchange_requests (id, skill_id, from_user_id, to_user_id, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, skill_id, from_user_id, to_user_id, message, status, created_at, updated_at
            "#,
        )
        .bind(request.id)
        .bind(request.skill_id)
        .bind(request.from_user_id)
        .bind(request.to_user_id)
        .bind(&request.message)
        .fetch_one(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<ExchangeRequest>> {
        let request = sqlx::query_as::<_, ExchangeRequest>(
            r#"
            SELECT id, skill_id, from_user_id, to_user_id, message, status, created_at, updated_at
            FROM exchange_requests
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn find_pending(
        &self,
        skill_id: Uuid,
        from_user_id: Uuid,
    ) -> anyhow::Result<Option<ExchangeRequest>> {
        let request = sqlx::query_as::<_, ExchangeRequest>(
            r#"
            SELECT id, skill_id, from_user_id, to_user_id, message, status, created_at, updated_at
            FROM exchange_requests
            WHERE skill_id = $1 AND from_user_id = $2 AND status = 'Pending'
            "#,
        )
        .bind(skill_id)
        .bind(from_user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn list(&self, filter: RequestFilter) -> anyhow::Result<Vec<ExchangeRequest>> {
        let requests = sqlx::query_as::<_, ExchangeRequest>(
            r#"
            SELECT id, skill_id, from_user_id, to_user_id, message, status, created_at, updated_at
            FROM exchange_requests
            WHERE (($2 AND from_user_id = $1) OR ($3 AND to_user_id = $1))
              AND ($4::request_status IS NULL OR status = $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.user_id)
        .bind(filter.party.includes_sent())
        .bind(filter.party.includes_received())
        .bind(filter.status)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn list_for_skill(&self, skill_id: Uuid) -> anyhow::Result<Vec<ExchangeRequest>> {
        let requests = sqlx::query_as::<_, ExchangeRequest>(
            r#"
            SELECT id, skill_id, from_user_id, to_user_id, message, status, created_at, updated_at
            FROM exchange_requests
            WHERE skill_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(skill_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn transition(
        &self,
        id: Uuid,
        from: RequestStatus,
        to: RequestStatus,
    ) -> anyhow::Result<Option<ExchangeRequest>> {
        sqlx::query_as::<_, ExchangeRequest>(
            r#"
            UPDATE exchange_requests
               SET status = $3, updated_at = now()
             WHERE id = $1 AND status = $2
            RETURNING id, skill_id, from_user_id, to_user_id, message, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)
    }

    async fn delete_pending(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM exchange_requests
             WHERE id = $1 AND status = 'Pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
