//! SQLite persistence gateway for communications, tasks, and activities.
//!
//! The [`TaskStore`] is the sole gateway to the database. Every read and
//! mutation is keyed by the owning user; update and delete report
//! [`StoreError::NotFound`] when the row is missing *or* owned by someone
//! else, so callers cannot probe for other users' record ids.
//!
//! The extraction batch ([`TaskStore::record_extraction`]) runs inside one
//! transaction: either the communication, all its tasks, and all their
//! activity entries commit together, or nothing does.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use crate::extract::sanitize::ExtractedTask;
use crate::model::{
    AbcdeLetter, ActivityEntry, ChunkSize, Communication, EisenhowerQuadrant, InputKind,
    ModelError, PrioritizationMethod, Priority, Task, TaskStats, TaskStatus,
};

mod row;

use row::{ActivityRow, CommunicationRow, TaskRow};

/// Embedded schema, applied idempotently on every open.
const SCHEMA: &str = include_str!("../../migrations/001_schema.sql");

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Record does not exist or does not belong to the requesting user.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of record looked up.
        resource: &'static str,
        /// Requested row id.
        id: i64,
    },

    /// A due date string could not be parsed.
    #[error("unparseable due date: {0:?}")]
    InvalidDueDate(String),

    /// A stored enum column held an unrecognised value.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Tag list could not be encoded or decoded.
    #[error("tag serialization error: {0}")]
    Tags(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Insert / update payloads
// ---------------------------------------------------------------------------

/// Fields for a new communication record.
#[derive(Debug, Clone)]
pub struct NewCommunication {
    /// Owning user.
    pub user_id: String,
    /// User-supplied title.
    pub title: String,
    /// Raw submitted text.
    pub content: String,
    /// Extractor summary, set once at creation.
    pub summary: Option<String>,
    /// How the text entered the system.
    pub kind: InputKind,
}

/// Fields for a new task record.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Owning user.
    pub user_id: String,
    /// Originating communication, absent for manual tasks.
    pub communication_id: Option<i64>,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Priority.
    pub priority: Priority,
    /// Initial status.
    pub status: TaskStatus,
    /// Optional assignee.
    pub assignee: Option<String>,
    /// Tags.
    pub tags: Vec<String>,
    /// Optional due date (RFC 3339 or `YYYY-MM-DD`).
    pub due_date: Option<String>,
}

impl NewTask {
    /// Build a pending task from a sanitized extraction, linked to its
    /// communication. Prioritization-method fields stay unset — those belong
    /// to the user's ranking flow, never to the pipeline.
    pub fn from_extracted(user_id: &str, communication_id: i64, task: ExtractedTask) -> Self {
        Self {
            user_id: user_id.to_owned(),
            communication_id: Some(communication_id),
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: TaskStatus::Pending,
            assignee: task.assignee,
            tags: task.tags,
            due_date: task.due_date,
        }
    }
}

/// A partial task patch. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New priority.
    pub priority: Option<Priority>,
    /// New status. Moving to completed stamps `completed_at`; moving away
    /// clears it.
    pub status: Option<TaskStatus>,
    /// New assignee.
    pub assignee: Option<String>,
    /// Replacement tag list.
    pub tags: Option<Vec<String>>,
    /// New due date.
    pub due_date: Option<String>,
    /// Eisenhower quadrant assignment.
    pub eisenhower_quadrant: Option<EisenhowerQuadrant>,
    /// ABCDE letter assignment.
    pub abcde_priority: Option<AbcdeLetter>,
    /// Eat-the-frog flag.
    pub is_eat_the_frog: Option<bool>,
    /// Chunk size assignment.
    pub chunk_size: Option<ChunkSize>,
    /// Estimated duration in minutes.
    pub estimated_minutes: Option<i64>,
}

/// Validate that a due date string parses as RFC 3339 or `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`StoreError::InvalidDueDate`] otherwise.
pub fn validate_due_date(due: &str) -> Result<(), StoreError> {
    if chrono::DateTime::parse_from_rfc3339(due).is_ok() {
        return Ok(());
    }
    if chrono::NaiveDate::parse_from_str(due, "%Y-%m-%d").is_ok() {
        return Ok(());
    }
    Err(StoreError::InvalidDueDate(due.to_owned()))
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// SQLite-backed persistence gateway.
#[derive(Debug, Clone)]
pub struct TaskStore {
    db: SqlitePool,
}

impl TaskStore {
    /// Open a store backed by a file, creating it and applying the schema if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the pool cannot be opened or the
    /// schema cannot be applied.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        info!(path, "task store opened");
        Ok(Self { db: pool })
    }

    /// Open an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the pool cannot be opened.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::new()
            .filename(":memory:")
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        sqlx::raw_sql(SCHEMA).execute(&pool).await?;
        Ok(Self { db: pool })
    }

    /// Returns a reference to the underlying pool (for ad-hoc test queries).
    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    // ── Communications ──────────────────────────────────────────

    /// Create a communication record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on insert failure.
    pub async fn create_communication(
        &self,
        new: NewCommunication,
    ) -> Result<Communication, StoreError> {
        let row = insert_communication(&self.db, &new).await?;
        row.try_into()
    }

    /// Fetch one communication owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if missing or owned by another user.
    pub async fn communication(&self, user_id: &str, id: i64) -> Result<Communication, StoreError> {
        let row: Option<CommunicationRow> = sqlx::query_as(
            "SELECT id, user_id, title, content, summary, kind, created_at \
             FROM communications WHERE id = ?1 AND user_id = ?2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        row.ok_or(StoreError::NotFound {
            resource: "communication",
            id,
        })?
        .try_into()
    }

    /// List a user's communications, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn communications_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Communication>, StoreError> {
        let rows: Vec<CommunicationRow> = sqlx::query_as(
            "SELECT id, user_id, title, content, summary, kind, created_at \
             FROM communications WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    // ── Tasks ───────────────────────────────────────────────────

    /// Create a task record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidDueDate`] for an unparseable due date and
    /// [`StoreError::Database`] on insert failure.
    pub async fn create_task(&self, new: NewTask) -> Result<Task, StoreError> {
        if let Some(due) = &new.due_date {
            validate_due_date(due)?;
        }
        let row = insert_task(&self.db, &new).await?;
        row.try_into()
    }

    /// Fetch one task owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if missing or owned by another user.
    pub async fn task(&self, user_id: &str, id: i64) -> Result<Task, StoreError> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tasks WHERE id = ?1 AND user_id = ?2",
            row::TASK_COLUMNS
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        row.ok_or(StoreError::NotFound {
            resource: "task",
            id,
        })?
        .try_into()
    }

    /// List a user's tasks, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn tasks_for_user(&self, user_id: &str) -> Result<Vec<Task>, StoreError> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tasks WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            row::TASK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Apply a partial update to a task owned by `user_id`.
    ///
    /// Setting status to completed stamps `completed_at`; any other status
    /// clears it, keeping the completed ⇔ completed-at invariant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the task is missing or owned by
    /// another user, [`StoreError::InvalidDueDate`] for a bad due date.
    pub async fn update_task(
        &self,
        user_id: &str,
        id: i64,
        update: TaskUpdate,
    ) -> Result<Task, StoreError> {
        // Ownership check doubles as the base for the patch.
        let current = self.task(user_id, id).await?;

        if let Some(due) = &update.due_date {
            validate_due_date(due)?;
        }

        let title = update.title.unwrap_or(current.title);
        let description = update.description.unwrap_or(current.description);
        let priority = update.priority.unwrap_or(current.priority);
        let status = update.status.unwrap_or(current.status);
        let assignee = update.assignee.or(current.assignee);
        let tags = update.tags.unwrap_or(current.tags);
        let due_date = update.due_date.or(current.due_date);
        let quadrant = update.eisenhower_quadrant.or(current.eisenhower_quadrant);
        let abcde = update.abcde_priority.or(current.abcde_priority);
        let eat_the_frog = update.is_eat_the_frog.unwrap_or(current.is_eat_the_frog);
        let chunk_size = update.chunk_size.or(current.chunk_size);
        let estimated = update.estimated_minutes.or(current.estimated_minutes);

        let tags_json = serde_json::to_string(&tags)?;
        let completed = status == TaskStatus::Completed;

        let row: TaskRow = sqlx::query_as(&format!(
            "UPDATE tasks SET \
                 title = ?1, description = ?2, priority = ?3, status = ?4, \
                 assignee = ?5, tags = ?6, due_date = ?7, \
                 eisenhower_quadrant = ?8, abcde_priority = ?9, \
                 is_eat_the_frog = ?10, chunk_size = ?11, estimated_minutes = ?12, \
                 completed_at = CASE \
                     WHEN ?13 THEN coalesce(completed_at, datetime('now')) \
                     ELSE NULL END, \
                 updated_at = datetime('now') \
             WHERE id = ?14 AND user_id = ?15 \
             RETURNING {}",
            row::TASK_COLUMNS
        ))
        .bind(&title)
        .bind(&description)
        .bind(priority.as_str())
        .bind(status.as_str())
        .bind(&assignee)
        .bind(&tags_json)
        .bind(&due_date)
        .bind(quadrant.map(|q| q.as_str()))
        .bind(abcde.map(|a| a.as_str()))
        .bind(eat_the_frog)
        .bind(chunk_size.map(|c| c.as_str()))
        .bind(estimated)
        .bind(completed)
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        debug!(task = id, user = user_id, "task updated");
        row.try_into()
    }

    /// Delete a task owned by `user_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the task is missing or owned by
    /// another user.
    pub async fn delete_task(&self, user_id: &str, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                resource: "task",
                id,
            });
        }
        debug!(task = id, user = user_id, "task deleted");
        Ok(())
    }

    /// Aggregate task counts for a user.
    ///
    /// A task is overdue when its due date is in the past and its status is
    /// not completed. Date-only due dates count from midnight UTC.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn task_stats(&self, user_id: &str) -> Result<TaskStats, StoreError> {
        let tasks = self.tasks_for_user(user_id).await?;
        let now = chrono::Utc::now();

        let count = |pred: &dyn Fn(&Task) -> bool| -> u64 {
            let n = tasks.iter().filter(|t| pred(t)).count();
            u64::try_from(n).unwrap_or(u64::MAX)
        };

        Ok(TaskStats {
            total: count(&|_| true),
            completed: count(&|t| t.status == TaskStatus::Completed),
            in_progress: count(&|t| t.status == TaskStatus::InProgress),
            pending: count(&|t| t.status == TaskStatus::Pending),
            overdue: count(&|t| {
                t.status != TaskStatus::Completed
                    && t.due_date
                        .as_deref()
                        .and_then(parse_due_date_utc)
                        .is_some_and(|due| due < now)
            }),
        })
    }

    // ── Activities ──────────────────────────────────────────────

    /// Append an activity log entry.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on insert failure.
    pub async fn create_activity(
        &self,
        user_id: &str,
        task_id: Option<i64>,
        action: &str,
        description: &str,
    ) -> Result<ActivityEntry, StoreError> {
        let row = insert_activity(&self.db, user_id, task_id, action, description).await?;
        Ok(row.into())
    }

    /// List a user's most recent activity entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn activities_for_user(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ActivityEntry>, StoreError> {
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<ActivityRow> = sqlx::query_as(
            "SELECT id, user_id, task_id, action, description, created_at \
             FROM activities WHERE user_id = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .bind(user_id)
        .bind(limit_i64)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    // ── Users ───────────────────────────────────────────────────

    /// Set a user's prioritization method, creating the user row if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on write failure.
    pub async fn set_prioritization_method(
        &self,
        user_id: &str,
        method: PrioritizationMethod,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, prioritization_method) VALUES (?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET \
                 prioritization_method = excluded.prioritization_method, \
                 updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(method.as_str())
        .execute(&self.db)
        .await?;
        Ok(())
    }

    /// Get a user's prioritization method. Users without a stored choice get
    /// the default (Eisenhower).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn prioritization_method(
        &self,
        user_id: &str,
    ) -> Result<PrioritizationMethod, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT prioritization_method FROM users WHERE id = ?1")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await?;
        match row {
            Some((method,)) => Ok(PrioritizationMethod::parse(&method)?),
            None => Ok(PrioritizationMethod::default()),
        }
    }

    // ── Extraction batch ────────────────────────────────────────

    /// Persist a full extraction result atomically.
    ///
    /// Inserts the communication first, then each task in the given order,
    /// then one `created` activity entry per task (same order), all inside a
    /// single transaction. On any failure the whole batch rolls back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] from the first failing statement.
    pub async fn record_extraction(
        &self,
        new_communication: NewCommunication,
        tasks: Vec<ExtractedTask>,
    ) -> Result<(Communication, Vec<Task>), StoreError> {
        let mut tx: Transaction<'_, Sqlite> = self.db.begin().await?;

        let communication: Communication =
            insert_communication(&mut *tx, &new_communication).await?.try_into()?;

        let mut created = Vec::with_capacity(tasks.len());
        for extracted in tasks {
            let new_task = NewTask::from_extracted(
                &new_communication.user_id,
                communication.id,
                extracted,
            );
            if let Some(due) = &new_task.due_date {
                validate_due_date(due)?;
            }
            let task: Task = insert_task(&mut *tx, &new_task).await?.try_into()?;

            let description = format!(
                "Task \"{}\" created from communication analysis",
                task.title
            );
            insert_activity(
                &mut *tx,
                &new_communication.user_id,
                Some(task.id),
                "created",
                &description,
            )
            .await?;

            created.push(task);
        }

        tx.commit().await?;
        debug!(
            communication = communication.id,
            tasks = created.len(),
            "extraction batch recorded"
        );
        Ok((communication, created))
    }
}

// ---------------------------------------------------------------------------
// Shared insert statements (pool or transaction)
// ---------------------------------------------------------------------------

async fn insert_communication<'e, E>(
    executor: E,
    new: &NewCommunication,
) -> Result<CommunicationRow, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as(
        "INSERT INTO communications (user_id, title, content, summary, kind) \
         VALUES (?1, ?2, ?3, ?4, ?5) \
         RETURNING id, user_id, title, content, summary, kind, created_at",
    )
    .bind(&new.user_id)
    .bind(&new.title)
    .bind(&new.content)
    .bind(&new.summary)
    .bind(new.kind.as_str())
    .fetch_one(executor)
    .await
}

async fn insert_task<'e, E>(executor: E, new: &NewTask) -> Result<TaskRow, StoreError>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let tags_json = serde_json::to_string(&new.tags)?;
    let row = sqlx::query_as(&format!(
        "INSERT INTO tasks \
             (user_id, communication_id, title, description, priority, status, \
              assignee, tags, due_date) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
         RETURNING {}",
        row::TASK_COLUMNS
    ))
    .bind(&new.user_id)
    .bind(new.communication_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.priority.as_str())
    .bind(new.status.as_str())
    .bind(&new.assignee)
    .bind(&tags_json)
    .bind(&new.due_date)
    .fetch_one(executor)
    .await?;
    Ok(row)
}

async fn insert_activity<'e, E>(
    executor: E,
    user_id: &str,
    task_id: Option<i64>,
    action: &str,
    description: &str,
) -> Result<ActivityRow, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query_as(
        "INSERT INTO activities (user_id, task_id, action, description) \
         VALUES (?1, ?2, ?3, ?4) \
         RETURNING id, user_id, task_id, action, description, created_at",
    )
    .bind(user_id)
    .bind(task_id)
    .bind(action)
    .bind(description)
    .fetch_one(executor)
    .await
}

/// Parse a stored due date into UTC. Date-only values count from midnight.
fn parse_due_date_utc(due: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(due) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    let date = chrono::NaiveDate::parse_from_str(due, "%Y-%m-%d").ok()?;
    Some(chrono::DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        chrono::Utc,
    ))
}
