use anyhow::Context;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{
    postgres::{PgListener, PgPoolOptions},
    types::Json,
    FromRow, PgPool,
};
use time::OffsetDateTime;
use tracing::{debug, error};
use uuid::Uuid;

use super::{Document, Listener, OrderBy, OrderKey, RecordStore, Snapshot, StoreError, Subscription};

/// Channel the `documents` trigger notifies with the changed collection name.
const CHANGES_CHANNEL: &str = "record_changes";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: Uuid,
    data: Json<Map<String, Value>>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<DocumentRow> for Document {
    fn from(r: DocumentRow) -> Self {
        Self {
            id: r.id,
            data: r.data.0,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn fetch_snapshot(
    db: &PgPool,
    collection: &str,
    order: &OrderBy,
) -> Result<Snapshot, StoreError> {
    let dir = order.direction.as_sql();
    let key = order.key();
    let order_clause = match key {
        OrderKey::CreatedAt => format!("created_at {dir}, id {dir}"),
        OrderKey::UpdatedAt => format!("updated_at {dir}, id {dir}"),
        OrderKey::Field(_) => format!("data->>$2 {dir}, created_at {dir}"),
    };
    let sql = format!(
        r#"
        SELECT id, data, created_at, updated_at
        FROM documents
        WHERE collection = $1
        ORDER BY {order_clause}
        "#
    );

    let mut query = sqlx::query_as::<_, DocumentRow>(&sql).bind(collection);
    if let OrderKey::Field(field) = key {
        query = query.bind(field);
    }
    let rows = query.fetch_all(db).await?;
    Ok(rows.into_iter().map(Document::from).collect())
}

#[async_trait]
impl RecordStore for PgStore {
    async fn subscribe(
        &self,
        collection: &str,
        order: OrderBy,
        listener: Listener,
    ) -> Result<Subscription, StoreError> {
        let mut changes = PgListener::connect_with(&self.pool).await?;
        changes.listen(CHANGES_CHANNEL).await?;
        let initial = fetch_snapshot(&self.pool, collection, &order).await?;

        let pool = self.pool.clone();
        let collection = collection.to_string();
        let task = tokio::spawn(async move {
            listener(Ok(initial));
            loop {
                match changes.recv().await {
                    Ok(note) if note.payload() == collection => {
                        match fetch_snapshot(&pool, &collection, &order).await {
                            Ok(snapshot) => listener(Ok(snapshot)),
                            Err(e) => {
                                error!(error = %e, %collection, "snapshot query failed");
                                listener(Err(e));
                                break;
                            }
                        }
                    }
                    Ok(_) => continue,
                    Err(e) => {
                        error!(error = %e, %collection, "change listener failed");
                        listener(Err(StoreError::Subscription(e.to_string())));
                        break;
                    }
                }
            }
        });

        Ok(Subscription::new(move || {
            debug!("pg subscription released");
            task.abort();
        }))
    }

    async fn query(&self, collection: &str, order: &OrderBy) -> Result<Snapshot, StoreError> {
        fetch_snapshot(&self.pool, collection, order).await
    }

    async fn insert(&self, collection: &str, data: Map<String, Value>) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO documents (id, collection, data)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(id)
        .bind(collection)
        .bind(Json(data))
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    async fn remove(&self, collection: &str, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = $2
            "#,
        )
        .bind(collection)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                collection: collection.to_string(),
                id,
            });
        }
        Ok(())
    }
}
