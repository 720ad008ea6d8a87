//! PostgreSQL rendering of gating queries over the forum schema.
//!
//! Tables used: `tags(id, name)`, `topic_tags(topic_id, tag_id)`,
//! `topics(id, user_id, category_id)`, `posts(id, topic_id)`.
//! Ids are selected as `bigint` so they decode into `i64` whatever the
//! column width.

use tag_gating_types::{BlockedSetQuery, ContentScope, Relation};

/// A typed bind parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    Text(String),
    Int(i64),
    IntArray(Vec<i64>),
}

/// SQL text with `$n` placeholders and binds in placeholder order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub binds: Vec<Bind>,
}

#[derive(Default)]
struct Params {
    binds: Vec<Bind>,
}

impl Params {
    fn push(&mut self, bind: Bind) -> String {
        self.binds.push(bind);
        format!("${}", self.binds.len())
    }
}

pub const TAGS_FOR_TOPIC: &str = "SELECT t.name FROM tags t \
     JOIN topic_tags tt ON tt.tag_id = t.id \
     WHERE tt.topic_id = $1 ORDER BY t.name";

/// Render a blocked-set query as a standalone statement.
pub fn render_blocked_query(query: &BlockedSetQuery) -> Statement {
    let mut params = Params::default();
    let sql = blocked_subquery(query, &mut params);
    Statement {
        sql,
        binds: params.binds,
    }
}

fn blocked_subquery(query: &BlockedSetQuery, params: &mut Params) -> String {
    let mut sql = format!(
        "SELECT tt.topic_id::bigint FROM topic_tags tt \
         JOIN tags tg ON tg.id = tt.tag_id \
         JOIN topics tp ON tp.id = tt.topic_id \
         WHERE tg.name = {}",
        params.push(Bind::Text(query.tag_name.clone()))
    );
    if let Some(owner) = query.exempt_owner {
        // IS DISTINCT FROM keeps ownerless topics blocked.
        sql.push_str(&format!(
            " AND tp.user_id IS DISTINCT FROM {}",
            params.push(Bind::Int(owner.0))
        ));
    }
    if let Some(within) = &query.within {
        let ids = within.iter().map(|id| id.0).collect();
        sql.push_str(&format!(
            " AND tt.topic_id = ANY({})",
            params.push(Bind::IntArray(ids))
        ));
    }
    sql
}

/// Render a scope as one statement yielding `row_id` and `content_id`.
pub fn render_scope(scope: &ContentScope) -> Statement {
    let mut params = Params::default();

    let (from, row, key) = match scope.relation {
        Relation::Posts => (
            "posts r LEFT JOIN topics c ON c.id = r.topic_id",
            "r.id",
            "r.topic_id",
        ),
        Relation::Topics => ("topics c", "c.id", "c.id"),
    };

    let mut conditions = Vec::new();
    if let Some(category) = scope.category {
        conditions.push(format!(
            "c.category_id = {}",
            params.push(Bind::Int(category.0))
        ));
    }
    for query in &scope.excluded {
        conditions.push(format!(
            "{key} NOT IN ({})",
            blocked_subquery(query, &mut params)
        ));
    }

    let mut sql = format!("SELECT {row}::bigint AS row_id, {key}::bigint AS content_id FROM {from}");
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY {row}"));
    if let Some(page) = scope.page {
        // A limit past i64::MAX is no limit at all.
        if let Ok(limit) = i64::try_from(page.limit) {
            let limit = params.push(Bind::Int(limit));
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        let offset = i64::try_from(page.offset).unwrap_or(i64::MAX);
        let offset = params.push(Bind::Int(offset));
        sql.push_str(&format!(" OFFSET {offset}"));
    }

    Statement {
        sql,
        binds: params.binds,
    }
}
