//! Row types mapping SQLite columns onto domain records.
//!
//! Enum and tag columns come back as text; conversion into domain types goes
//! through the model parsers so a corrupted column surfaces as a
//! [`StoreError`](super::StoreError) instead of a silent default.

use sqlx::FromRow;

use crate::model::{
    AbcdeLetter, ActivityEntry, ChunkSize, Communication, EisenhowerQuadrant, InputKind, Priority,
    Task, TaskStatus,
};

use super::StoreError;

/// Task column list shared by every SELECT/RETURNING on the tasks table.
pub(super) const TASK_COLUMNS: &str = "id, user_id, communication_id, title, description, \
     priority, status, assignee, tags, due_date, completed_at, \
     eisenhower_quadrant, abcde_priority, is_eat_the_frog, chunk_size, \
     estimated_minutes, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(super) struct CommunicationRow {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub summary: Option<String>,
    pub kind: String,
    pub created_at: String,
}

impl TryFrom<CommunicationRow> for Communication {
    type Error = StoreError;

    fn try_from(row: CommunicationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            content: row.content,
            summary: row.summary,
            kind: InputKind::parse(&row.kind)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct TaskRow {
    pub id: i64,
    pub user_id: String,
    pub communication_id: Option<i64>,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub assignee: Option<String>,
    pub tags: String,
    pub due_date: Option<String>,
    pub completed_at: Option<String>,
    pub eisenhower_quadrant: Option<String>,
    pub abcde_priority: Option<String>,
    pub is_eat_the_frog: bool,
    pub chunk_size: Option<String>,
    pub estimated_minutes: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            communication_id: row.communication_id,
            title: row.title,
            description: row.description,
            priority: Priority::parse(&row.priority)?,
            status: TaskStatus::parse(&row.status)?,
            assignee: row.assignee,
            tags: serde_json::from_str(&row.tags)?,
            due_date: row.due_date,
            completed_at: row.completed_at,
            eisenhower_quadrant: row
                .eisenhower_quadrant
                .as_deref()
                .map(EisenhowerQuadrant::parse)
                .transpose()?,
            abcde_priority: row
                .abcde_priority
                .as_deref()
                .map(AbcdeLetter::parse)
                .transpose()?,
            is_eat_the_frog: row.is_eat_the_frog,
            chunk_size: row.chunk_size.as_deref().map(ChunkSize::parse).transpose()?,
            estimated_minutes: row.estimated_minutes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(super) struct ActivityRow {
    pub id: i64,
    pub user_id: String,
    pub task_id: Option<i64>,
    pub action: String,
    pub description: String,
    pub created_at: String,
}

impl From<ActivityRow> for ActivityEntry {
    fn from(row: ActivityRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            task_id: row.task_id,
            action: row.action,
            description: row.description,
            created_at: row.created_at,
        }
    }
}
