//! PostgreSQL-backed store over the forum schema.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres, Row};
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tracing::debug;

use tag_gating_types::{
    BlockedSetQuery, ContentId, ContentScope, Identity, ScopeExecutor, ScopeRow, StoreError,
    TagStore, Viewer, ViewerId, ViewerResolver,
};

use crate::sql::{render_blocked_query, render_scope, Bind, Statement, TAGS_FOR_TOPIC};

/// Prefix of user-field rows in `user_custom_fields`.
const USER_FIELD_PREFIX: &str = "user_field_";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_all<'q>(stmt: &'q Statement) -> Query<'q, Postgres, PgArguments> {
    stmt.binds
        .iter()
        .fold(sqlx::query(&stmt.sql), |query, bind| match bind {
            Bind::Text(value) => query.bind(value.as_str()),
            Bind::Int(value) => query.bind(*value),
            Bind::IntArray(values) => query.bind(values.as_slice()),
        })
}

fn query_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Connection(e.to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl TagStore for PgStore {
    async fn tags_for(&self, content_id: ContentId) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(TAGS_FOR_TOPIC)
            .bind(content_id.0)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        rows.iter()
            .map(|row| row.try_get::<String, _>(0).map_err(query_error))
            .collect()
    }

    async fn resolve_blocked(
        &self,
        query: &BlockedSetQuery,
    ) -> Result<HashSet<ContentId>, StoreError> {
        let stmt = render_blocked_query(query);
        let rows = bind_all(&stmt)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        let blocked = rows
            .iter()
            .map(|row| row.try_get::<i64, _>(0).map(ContentId).map_err(query_error))
            .collect::<Result<HashSet<_>, _>>()?;
        debug!(tag = %query.tag_name, blocked = blocked.len(), "Blocked set resolved");
        Ok(blocked)
    }
}

#[async_trait]
impl ScopeExecutor for PgStore {
    async fn fetch(&self, scope: &ContentScope) -> Result<Vec<ScopeRow>, StoreError> {
        let stmt = render_scope(scope);
        let rows = bind_all(&stmt)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;
        rows.iter()
            .map(|row| {
                Ok(ScopeRow {
                    row_id: row.try_get("row_id").map_err(query_error)?,
                    content_id: ContentId(row.try_get("content_id").map_err(query_error)?),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ViewerResolver for PgStore {
    async fn resolve(&self, actor: Option<ViewerId>) -> Result<Viewer, StoreError> {
        let id = match actor {
            Some(id) => id,
            None => return Ok(Viewer::Anonymous),
        };

        let user = sqlx::query(
            "SELECT (u.admin OR u.moderator) AS privileged FROM users u WHERE u.id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;
        let privileged: bool = match user {
            Some(row) => row.try_get("privileged").map_err(query_error)?,
            None => {
                debug!(viewer = %id, "Unknown viewer treated as anonymous");
                return Ok(Viewer::Anonymous);
            }
        };

        let rows = sqlx::query(
            "SELECT name, value FROM user_custom_fields \
             WHERE user_id = $1 AND name LIKE 'user\\_field\\_%'",
        )
        .bind(id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        let mut attributes = HashMap::new();
        for row in &rows {
            let name: String = row.try_get("name").map_err(query_error)?;
            let value: Option<String> = row.try_get("value").map_err(query_error)?;
            if let (Some(field_id), Some(value)) = (name.strip_prefix(USER_FIELD_PREFIX), value) {
                attributes.insert(field_id.to_string(), value);
            }
        }

        Ok(Viewer::User(Identity {
            id,
            privileged,
            attributes,
        }))
    }
}
