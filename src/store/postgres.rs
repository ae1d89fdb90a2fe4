//! PostgreSQL backend. Tables live in a schema named by settings (default `hydrus`).

use crate::error::CrudError;
use crate::model::{Edge, EdgeValue, Instance, Property, PropertyKind, RdfClass, StoredDocument};
use crate::store::{GraphStore, GraphTx};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{ConnectOptions, Postgres, Row, Transaction};
use std::str::FromStr;

const DOCUMENT_ID: &str = "api_doc";
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the schema and the graph tables if they do not exist.
    pub async fn ensure_tables(&self) -> Result<(), CrudError> {
        let s = &self.schema;
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", s))
            .execute(&self.pool)
            .await?;
        for stmt in &table_ddl(s) {
            sqlx::query(stmt).execute(&self.pool).await?;
        }
        tracing::info!(schema = %s, "graph tables ready");
        Ok(())
    }
}

/// DDL for the graph tables in schema `s`. `instance.seq` orders class members
/// by creation, including rows written in the same transaction.
fn table_ddl(s: &str) -> Vec<String> {
    vec![
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {s}.rdf_class (
                name TEXT PRIMARY KEY,
                title TEXT,
                description TEXT
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {s}.property (
                name TEXT PRIMARY KEY,
                kind TEXT NOT NULL DEFAULT 'plain'
                    CHECK (kind IN ('plain', 'abstract', 'instance'))
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {s}.instance (
                id TEXT PRIMARY KEY,
                class_name TEXT NOT NULL REFERENCES {s}.rdf_class(name),
                seq BIGSERIAL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
            )
            "#
        ),
        format!("ALTER TABLE {s}.instance ADD COLUMN IF NOT EXISTS seq BIGSERIAL"),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {s}.graph (
                id BIGSERIAL PRIMARY KEY,
                subject TEXT NOT NULL REFERENCES {s}.instance(id) ON DELETE CASCADE,
                predicate TEXT NOT NULL REFERENCES {s}.property(name),
                position INTEGER NOT NULL DEFAULT 0,
                object_class TEXT REFERENCES {s}.rdf_class(name),
                object_instance TEXT REFERENCES {s}.instance(id) ON DELETE CASCADE,
                object_value JSONB,
                owned BOOLEAN NOT NULL DEFAULT FALSE,
                CHECK (num_nonnulls(object_class, object_instance, object_value) = 1)
            )
            "#
        ),
        format!("CREATE INDEX IF NOT EXISTS graph_subject_idx ON {s}.graph (subject)"),
        format!("CREATE INDEX IF NOT EXISTS graph_object_instance_idx ON {s}.graph (object_instance)"),
        format!("CREATE INDEX IF NOT EXISTS graph_predicate_idx ON {s}.graph (predicate)"),
        format!("CREATE INDEX IF NOT EXISTS instance_class_seq_idx ON {s}.instance (class_name, seq)"),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {s}.api_doc (
                id TEXT PRIMARY KEY,
                payload JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                version BIGINT NOT NULL DEFAULT 1
            )
            "#
        ),
        format!(
            r#"
            CREATE TABLE IF NOT EXISTS {s}.api_doc_history (
                id TEXT NOT NULL,
                payload JSONB NOT NULL,
                version BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (id, version)
            )
            "#
        ),
    ]
}

fn instances_of_sql(schema: &str) -> String {
    format!(
        "SELECT id, class_name FROM {}.instance WHERE class_name = $1 ORDER BY seq",
        schema
    )
}

#[async_trait]
impl GraphStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn GraphTx>, CrudError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx {
            tx,
            schema: self.schema.clone(),
        }))
    }

    async fn ping(&self) -> Result<(), CrudError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

pub struct PgTx {
    tx: Transaction<'static, Postgres>,
    schema: String,
}

impl PgTx {
    fn table(&self, name: &str) -> String {
        format!("{}.{}", self.schema, name)
    }
}

fn row_to_edge(row: &PgRow) -> Result<Edge, CrudError> {
    let object_class: Option<String> = row.try_get("object_class")?;
    let object_instance: Option<String> = row.try_get("object_instance")?;
    let object_value: Option<Value> = row.try_get("object_value")?;
    let value = match (object_class, object_instance, object_value) {
        (Some(c), _, _) => EdgeValue::Class(c),
        (_, Some(i), _) => EdgeValue::Instance(i),
        (_, _, Some(v)) => EdgeValue::Terminal(v),
        _ => return Err(CrudError::Backend("graph row without an object".into())),
    };
    Ok(Edge {
        subject: row.try_get("subject")?,
        predicate: row.try_get("predicate")?,
        position: row.try_get("position")?,
        value,
        owned: row.try_get("owned")?,
    })
}

fn parse_kind(kind: &str) -> Result<PropertyKind, CrudError> {
    kind.parse().map_err(CrudError::Backend)
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION))
}

const EDGE_COLUMNS: &str = "subject, predicate, position, object_class, object_instance, object_value, owned";

#[async_trait]
impl GraphTx for PgTx {
    async fn find_class(&mut self, name: &str) -> Result<Option<RdfClass>, CrudError> {
        let sql = format!("SELECT name, title, description FROM {} WHERE name = $1", self.table("rdf_class"));
        tracing::debug!(sql = %sql, name, "query");
        let row: Option<(String, Option<String>, Option<String>)> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(|(name, title, description)| RdfClass {
            name,
            title,
            description,
        }))
    }

    async fn insert_class(&mut self, class: &RdfClass) -> Result<bool, CrudError> {
        let sql = format!(
            "INSERT INTO {} (name, title, description) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
            self.table("rdf_class")
        );
        let done = sqlx::query(&sql)
            .bind(&class.name)
            .bind(&class.title)
            .bind(&class.description)
            .execute(&mut *self.tx)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn classes(&mut self) -> Result<Vec<RdfClass>, CrudError> {
        let sql = format!("SELECT name, title, description FROM {} ORDER BY name", self.table("rdf_class"));
        let rows: Vec<(String, Option<String>, Option<String>)> =
            sqlx::query_as(&sql).fetch_all(&mut *self.tx).await?;
        Ok(rows
            .into_iter()
            .map(|(name, title, description)| RdfClass {
                name,
                title,
                description,
            })
            .collect())
    }

    async fn find_property(&mut self, name: &str) -> Result<Option<Property>, CrudError> {
        let sql = format!("SELECT name, kind FROM {} WHERE name = $1", self.table("property"));
        tracing::debug!(sql = %sql, name, "query");
        let row: Option<(String, String)> = sqlx::query_as(&sql)
            .bind(name)
            .fetch_optional(&mut *self.tx)
            .await?;
        match row {
            Some((name, kind)) => Ok(Some(Property {
                name,
                kind: parse_kind(&kind)?,
            })),
            None => Ok(None),
        }
    }

    async fn insert_property(&mut self, property: &Property) -> Result<bool, CrudError> {
        let sql = format!(
            "INSERT INTO {} (name, kind) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING",
            self.table("property")
        );
        let done = sqlx::query(&sql)
            .bind(&property.name)
            .bind(property.kind.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(done.rows_affected() > 0)
    }

    async fn set_property_kind(&mut self, name: &str, kind: PropertyKind) -> Result<(), CrudError> {
        let sql = format!("UPDATE {} SET kind = $2 WHERE name = $1", self.table("property"));
        sqlx::query(&sql)
            .bind(name)
            .bind(kind.as_str())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn properties(&mut self) -> Result<Vec<Property>, CrudError> {
        let sql = format!("SELECT name, kind FROM {} ORDER BY name", self.table("property"));
        let rows: Vec<(String, String)> = sqlx::query_as(&sql).fetch_all(&mut *self.tx).await?;
        rows.into_iter()
            .map(|(name, kind)| parse_kind(&kind).map(|kind| Property { name, kind }))
            .collect()
    }

    async fn find_instance(&mut self, id: &str) -> Result<Option<Instance>, CrudError> {
        let sql = format!("SELECT id, class_name FROM {} WHERE id = $1", self.table("instance"));
        tracing::debug!(sql = %sql, id, "query");
        let row: Option<(String, String)> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(|(id, class_name)| Instance { id, class_name }))
    }

    async fn insert_instance(&mut self, instance: &Instance) -> Result<(), CrudError> {
        let sql = format!("INSERT INTO {} (id, class_name) VALUES ($1, $2)", self.table("instance"));
        let res = sqlx::query(&sql)
            .bind(&instance.id)
            .bind(&instance.class_name)
            .execute(&mut *self.tx)
            .await;
        match res {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(CrudError::InstanceExists(instance.id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_instance(&mut self, id: &str) -> Result<bool, CrudError> {
        // graph rows go with the instance through ON DELETE CASCADE
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table("instance"));
        let done = sqlx::query(&sql).bind(id).execute(&mut *self.tx).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn instances_of(&mut self, class_name: &str) -> Result<Vec<Instance>, CrudError> {
        let sql = instances_of_sql(&self.schema);
        let rows: Vec<(String, String)> = sqlx::query_as(&sql)
            .bind(class_name)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, class_name)| Instance { id, class_name })
            .collect())
    }

    async fn insert_edge(&mut self, edge: &Edge) -> Result<(), CrudError> {
        let (class, instance, value) = match &edge.value {
            EdgeValue::Class(c) => (Some(c.as_str()), None, None),
            EdgeValue::Instance(i) => (None, Some(i.as_str()), None),
            EdgeValue::Terminal(v) => (None, None, Some(v)),
        };
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            self.table("graph"),
            EDGE_COLUMNS
        );
        tracing::debug!(sql = %sql, subject = %edge.subject, predicate = %edge.predicate, "insert edge");
        sqlx::query(&sql)
            .bind(&edge.subject)
            .bind(&edge.predicate)
            .bind(edge.position)
            .bind(class)
            .bind(instance)
            .bind(value)
            .bind(edge.owned)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn edges_from(&mut self, subject: &str) -> Result<Vec<Edge>, CrudError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE subject = $1 ORDER BY predicate, position, id",
            EDGE_COLUMNS,
            self.table("graph")
        );
        let rows = sqlx::query(&sql).bind(subject).fetch_all(&mut *self.tx).await?;
        rows.iter().map(row_to_edge).collect()
    }

    async fn edges_to(&mut self, object: &str) -> Result<Vec<Edge>, CrudError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE object_instance = $1 AND subject <> $1 ORDER BY subject, predicate, position",
            EDGE_COLUMNS,
            self.table("graph")
        );
        let rows = sqlx::query(&sql).bind(object).fetch_all(&mut *self.tx).await?;
        rows.iter().map(row_to_edge).collect()
    }

    async fn has_terminal_edges(&mut self, predicate: &str) -> Result<bool, CrudError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE predicate = $1 AND object_value IS NOT NULL)",
            self.table("graph")
        );
        tracing::debug!(sql = %sql, predicate, "query");
        let (found,): (bool,) = sqlx::query_as(&sql)
            .bind(predicate)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(found)
    }

    async fn latest_document(&mut self) -> Result<Option<StoredDocument>, CrudError> {
        let sql = format!("SELECT payload, version, updated_at FROM {} WHERE id = $1", self.table("api_doc"));
        let row: Option<(Value, i64, chrono::DateTime<chrono::Utc>)> = sqlx::query_as(&sql)
            .bind(DOCUMENT_ID)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(|(payload, version, updated_at)| StoredDocument {
            payload,
            version,
            updated_at,
        }))
    }

    /// Copy the current row to history, then replace it with a bumped version.
    async fn save_document(&mut self, payload: &Value) -> Result<i64, CrudError> {
        let current = self.latest_document().await?;
        let new_version = match &current {
            Some(doc) if &doc.payload == payload => return Ok(doc.version),
            Some(doc) => doc.version + 1,
            None => 1,
        };
        let doc_table = self.table("api_doc");
        let history_table = self.table("api_doc_history");

        if current.is_some() {
            sqlx::query(&format!(
                "INSERT INTO {} (id, payload, version, created_at) SELECT id, payload, version, updated_at FROM {} WHERE id = $1",
                history_table, doc_table
            ))
            .bind(DOCUMENT_ID)
            .execute(&mut *self.tx)
            .await?;
            sqlx::query(&format!("DELETE FROM {} WHERE id = $1", doc_table))
                .bind(DOCUMENT_ID)
                .execute(&mut *self.tx)
                .await?;
        }

        sqlx::query(&format!(
            "INSERT INTO {} (id, payload, updated_at, version) VALUES ($1, $2, NOW(), $3)",
            doc_table
        ))
        .bind(DOCUMENT_ID)
        .bind(payload)
        .bind(new_version)
        .execute(&mut *self.tx)
        .await?;
        Ok(new_version)
    }

    async fn commit(self: Box<Self>) -> Result<(), CrudError> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), CrudError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), CrudError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| CrudError::Backend("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
