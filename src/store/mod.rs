use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

#[cfg(test)]
pub mod memory;

/// Storage failures that callers branch on. Everything else travels as a
/// plain `anyhow::Error`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("duplicate value for unique field `{field}`")]
    Duplicate { field: &'static str },
}

/// PostgreSQL-backed implementation of the repository traits.
#[derive(Clone)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

/// Turns unique-index violations into [`StoreError::Duplicate`].
pub(crate) fn write_error(err: sqlx::Error) -> anyhow::Error {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("users_email_key") => "email",
                Some("users_phone_key") => "phone",
                Some("exchange_requests_one_pending_key") => "request",
                _ => "record",
            };
            return StoreError::Duplicate { field }.into();
        }
    }
    anyhow::Error::new(err).context("database write")
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}
