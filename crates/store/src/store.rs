//! PostgreSQL-backed store for segments and user memberships.
//!
//! Each operation validates its arguments, then issues exactly one statement.
//! Nothing is cached; every call round-trips to the database.

use segments_core::config::DatabaseConfig;
use segments_core::error::{SegmentError, SegmentResult};
use segments_core::types::{Segment, User};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Connection, FromRow};
use tracing::{debug, info};

use crate::queries;

#[derive(Debug, FromRow)]
struct SegmentRow {
    id: String,
    name: String,
}

impl From<SegmentRow> for Segment {
    fn from(row: SegmentRow) -> Self {
        Segment::with_id(row.id, row.name)
    }
}

/// Owns the connection pool and exposes segment and membership operations.
///
/// Clones share one pool, so closing any clone closes it for all of them.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    pool: PgPool,
}

impl SegmentStore {
    /// Open a pool and verify the database answers a ping.
    pub async fn open(config: &DatabaseConfig) -> SegmentResult<Self> {
        let options = config.connect_options()?;

        info!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_with(options)
            .await
            .map_err(|e| SegmentError::connection("Failed to open database connection", e))?;

        let store = Self { pool };
        if let Err(e) = store.ping().await {
            store.pool.close().await;
            return Err(e);
        }

        info!("PostgreSQL connection established");
        Ok(store)
    }

    /// Wrap a pool the caller already configured. No ping is performed.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a ping over a pooled connection.
    pub async fn ping(&self) -> SegmentResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| SegmentError::connection("Failed to acquire database connection", e))?;
        conn.ping()
            .await
            .map_err(|e| SegmentError::connection("Database did not respond to ping", e))
    }

    /// Close every pooled connection. Fails if the pool was already closed.
    pub async fn close(self) -> SegmentResult<()> {
        if self.pool.is_closed() {
            return Err(SegmentError::connection(
                "Failed to close database connection",
                sqlx::Error::PoolClosed,
            ));
        }
        self.pool.close().await;
        info!("PostgreSQL connection closed");
        Ok(())
    }

    // ─── Segments ──────────────────────────────────────────────────────────

    /// Insert a segment and return the id the database assigned to it.
    /// Any id already set on `segment` is ignored.
    pub async fn create_segment(&self, segment: &Segment) -> SegmentResult<String> {
        require(&segment.name, "Segment name cannot be empty")?;

        record_statement("create_segment");
        let id: String = sqlx::query_scalar(queries::INSERT_SEGMENT)
            .bind(&segment.name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| failed("create_segment", "Failed to create segment".to_string(), e))?;

        debug!(segment_id = %id, name = %segment.name, "Segment created");
        Ok(id)
    }

    /// Rename the segment identified by `segment.id`. Returns the number of
    /// rows changed; an unknown id changes nothing and is not an error.
    pub async fn update_segment(&self, segment: &Segment) -> SegmentResult<u64> {
        require(&segment.name, "Segment name cannot be empty")?;
        let id = segment.id().unwrap_or_default();
        require(id, "Segment ID cannot be empty")?;

        record_statement("update_segment");
        let result = sqlx::query(queries::UPDATE_SEGMENT)
            .bind(&segment.name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                failed(
                    "update_segment",
                    format!("Failed to update segment with ID: {id}"),
                    e,
                )
            })?;

        debug!(segment_id = id, rows = result.rows_affected(), "Segment updated");
        Ok(result.rows_affected())
    }

    /// Delete a segment by id. Deleting an id that does not exist returns 0.
    pub async fn delete_segment(&self, segment_id: &str) -> SegmentResult<u64> {
        require(segment_id, "Segment ID cannot be empty")?;

        record_statement("delete_segment");
        let result = sqlx::query(queries::DELETE_SEGMENT)
            .bind(segment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                failed(
                    "delete_segment",
                    format!("Failed to delete segment with ID: {segment_id}"),
                    e,
                )
            })?;

        debug!(segment_id = segment_id, rows = result.rows_affected(), "Segment deleted");
        Ok(result.rows_affected())
    }

    pub async fn get_segment(&self, segment_id: &str) -> SegmentResult<Option<Segment>> {
        require(segment_id, "Segment ID cannot be empty")?;

        record_statement("get_segment");
        let row: Option<SegmentRow> = sqlx::query_as(queries::SELECT_SEGMENT)
            .bind(segment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                failed(
                    "get_segment",
                    format!("Failed to get segment with ID: {segment_id}"),
                    e,
                )
            })?;

        Ok(row.map(Segment::from))
    }

    // ─── Memberships ───────────────────────────────────────────────────────

    /// Duplicate pairs and unknown segments are rejected by the database and
    /// surface as persistence errors.
    pub async fn add_user_to_segment(&self, user_id: &str, segment_id: &str) -> SegmentResult<()> {
        require(user_id, "User ID cannot be empty")?;
        require(segment_id, "Segment ID cannot be empty")?;

        record_statement("add_user_to_segment");
        sqlx::query(queries::INSERT_MEMBERSHIP)
            .bind(user_id)
            .bind(segment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                failed(
                    "add_user_to_segment",
                    format!("Failed to add user {user_id} to segment {segment_id}"),
                    e,
                )
            })?;

        debug!(user_id = user_id, segment_id = segment_id, "User added to segment");
        Ok(())
    }

    /// Returns the number of memberships removed; 0 when the user was not a member.
    pub async fn remove_user_from_segment(
        &self,
        user_id: &str,
        segment_id: &str,
    ) -> SegmentResult<u64> {
        require(user_id, "User ID cannot be empty")?;
        require(segment_id, "Segment ID cannot be empty")?;

        record_statement("remove_user_from_segment");
        let result = sqlx::query(queries::DELETE_MEMBERSHIP)
            .bind(user_id)
            .bind(segment_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                failed(
                    "remove_user_from_segment",
                    format!("Failed to remove user {user_id} from segment {segment_id}"),
                    e,
                )
            })?;

        debug!(
            user_id = user_id,
            segment_id = segment_id,
            rows = result.rows_affected(),
            "User removed from segment"
        );
        Ok(result.rows_affected())
    }

    /// Segments the user belongs to, in the order the database returns them.
    pub async fn get_user_segments(&self, user_id: &str) -> SegmentResult<Vec<Segment>> {
        require(user_id, "User ID cannot be empty")?;

        record_statement("get_user_segments");
        let rows: Vec<SegmentRow> = sqlx::query_as(queries::SELECT_USER_SEGMENTS)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                failed(
                    "get_user_segments",
                    format!("Failed to get segments for user {user_id}"),
                    e,
                )
            })?;

        debug!(user_id = user_id, count = rows.len(), "Fetched user segments");
        Ok(rows.into_iter().map(Segment::from).collect())
    }

    pub async fn load_user(&self, user_id: &str) -> SegmentResult<User> {
        let segments = self.get_user_segments(user_id).await?;
        Ok(User {
            id: user_id.to_string(),
            segments,
        })
    }
}

fn require(value: &str, message: &'static str) -> SegmentResult<()> {
    if value.is_empty() {
        return Err(SegmentError::validation(message));
    }
    Ok(())
}

fn record_statement(op: &'static str) {
    metrics::counter!("segments.store.statements", "op" => op).increment(1);
}

fn failed(op: &'static str, context: String, source: sqlx::Error) -> SegmentError {
    metrics::counter!("segments.store.errors", "op" => op).increment(1);
    SegmentError::persistence(context, source)
}
