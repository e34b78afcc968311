//! Domain types for communications, tasks, and the activity log.
//!
//! Every enum that is persisted carries an `as_str`/`parse` pair so SQLite
//! round-trips stay explicit — no stringly-typed columns leak past this
//! module.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Task priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal urgency. Default for anything the extractor leaves ambiguous.
    #[default]
    Medium,
    /// Urgent.
    High,
}

impl Priority {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised priority.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(ModelError::InvalidEnum {
                field: "priority",
                value: other.to_owned(),
            }),
        }
    }
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started. All extracted tasks begin here.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Done. A completed task always has `completed_at` set.
    Completed,
}

impl TaskStatus {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised status.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(ModelError::InvalidEnum {
                field: "status",
                value: other.to_owned(),
            }),
        }
    }
}

/// How the communication text entered the system. Descriptive metadata only —
/// the pipeline behaves identically for all three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Pasted or typed free text.
    #[default]
    Text,
    /// Uploaded file contents.
    File,
    /// Voicemail or meeting transcription.
    Voice,
}

impl InputKind {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Voice => "voice",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised input kind.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "text" => Ok(Self::Text),
            "file" => Ok(Self::File),
            "voice" => Ok(Self::Voice),
            other => Err(ModelError::InvalidEnum {
                field: "kind",
                value: other.to_owned(),
            }),
        }
    }
}

/// Eisenhower matrix quadrant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EisenhowerQuadrant {
    /// Do first.
    UrgentImportant,
    /// Delegate.
    UrgentNotImportant,
    /// Schedule.
    NotUrgentImportant,
    /// Drop.
    NotUrgentNotImportant,
}

impl EisenhowerQuadrant {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UrgentImportant => "urgent-important",
            Self::UrgentNotImportant => "urgent-not-important",
            Self::NotUrgentImportant => "not-urgent-important",
            Self::NotUrgentNotImportant => "not-urgent-not-important",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised quadrant.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "urgent-important" => Ok(Self::UrgentImportant),
            "urgent-not-important" => Ok(Self::UrgentNotImportant),
            "not-urgent-important" => Ok(Self::NotUrgentImportant),
            "not-urgent-not-important" => Ok(Self::NotUrgentNotImportant),
            other => Err(ModelError::InvalidEnum {
                field: "eisenhower_quadrant",
                value: other.to_owned(),
            }),
        }
    }
}

/// ABCDE-method letter grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbcdeLetter {
    /// Must do.
    A,
    /// Should do.
    B,
    /// Nice to do.
    C,
    /// Delegate.
    D,
    /// Eliminate.
    E,
}

impl AbcdeLetter {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::E => "E",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised letter.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "D" => Ok(Self::D),
            "E" => Ok(Self::E),
            other => Err(ModelError::InvalidEnum {
                field: "abcde_priority",
                value: other.to_owned(),
            }),
        }
    }
}

/// Work-chunk size class for the chunking method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkSize {
    /// Under ~30 minutes.
    Small,
    /// Half a day.
    Medium,
    /// A day or more.
    Large,
}

impl ChunkSize {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised chunk size.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(ModelError::InvalidEnum {
                field: "chunk_size",
                value: other.to_owned(),
            }),
        }
    }
}

/// User-selectable task-ranking scheme. Stored per user; the extraction
/// pipeline never sets the method-specific task fields itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrioritizationMethod {
    /// Urgent/important matrix.
    #[default]
    Eisenhower,
    /// Hardest task first.
    EatTheFrog,
    /// A–E letter grades.
    Abcde,
    /// Size-based chunking.
    Chunking,
}

impl PrioritizationMethod {
    /// Returns the string representation stored in SQLite.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eisenhower => "eisenhower",
            Self::EatTheFrog => "eat-the-frog",
            Self::Abcde => "abcde",
            Self::Chunking => "chunking",
        }
    }

    /// Parse from a SQLite text value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a recognised method.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        match s {
            "eisenhower" => Ok(Self::Eisenhower),
            "eat-the-frog" => Ok(Self::EatTheFrog),
            "abcde" => Ok(Self::Abcde),
            "chunking" => Ok(Self::Chunking),
            other => Err(ModelError::InvalidEnum {
                field: "prioritization_method",
                value: other.to_owned(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A stored unit of input text that a batch of tasks was derived from.
///
/// Content is immutable once created; the summary is set exactly once, at
/// creation, from the extractor response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Communication {
    /// Database row id.
    pub id: i64,
    /// Owning user.
    pub user_id: String,
    /// User-supplied title.
    pub title: String,
    /// The raw submitted text.
    pub content: String,
    /// Extractor-generated summary.
    pub summary: Option<String>,
    /// How the text entered the system.
    pub kind: InputKind,
    /// ISO-8601 creation timestamp (set by SQLite on insert).
    pub created_at: String,
}

/// A single actionable item, AI-derived or manually created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Database row id.
    pub id: i64,
    /// Owning user.
    pub user_id: String,
    /// Originating communication, absent for manually created tasks.
    pub communication_id: Option<i64>,
    /// Short action-oriented title.
    pub title: String,
    /// Context from the original text.
    pub description: String,
    /// Priority, always set (defaults to medium).
    pub priority: Priority,
    /// Lifecycle status.
    pub status: TaskStatus,
    /// Free-text assignee, if one was mentioned.
    pub assignee: Option<String>,
    /// Free-text tags, possibly empty.
    pub tags: Vec<String>,
    /// Due date as stored (RFC 3339 or `YYYY-MM-DD`).
    pub due_date: Option<String>,
    /// When the task was completed. Set iff status is completed.
    pub completed_at: Option<String>,
    /// Eisenhower quadrant, set by the prioritization flow.
    pub eisenhower_quadrant: Option<EisenhowerQuadrant>,
    /// ABCDE letter, set by the prioritization flow.
    pub abcde_priority: Option<AbcdeLetter>,
    /// Marked as the day's most important task.
    pub is_eat_the_frog: bool,
    /// Chunk size class, set by the prioritization flow.
    pub chunk_size: Option<ChunkSize>,
    /// Estimated duration in minutes.
    pub estimated_minutes: Option<i64>,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
    /// ISO-8601 last-update timestamp.
    pub updated_at: String,
}

/// Append-only audit record of a task state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Database row id.
    pub id: i64,
    /// Owning user.
    pub user_id: String,
    /// Related task, if any.
    pub task_id: Option<i64>,
    /// Action tag: `created`, `updated`, `completed`, `deleted`.
    pub action: String,
    /// Human-readable description.
    pub description: String,
    /// ISO-8601 creation timestamp.
    pub created_at: String,
}

/// Aggregate task counts for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    /// All tasks.
    pub total: u64,
    /// Tasks with status completed.
    pub completed: u64,
    /// Tasks with status in_progress.
    pub in_progress: u64,
    /// Tasks with status pending.
    pub pending: u64,
    /// Tasks past their due date and not completed.
    pub overdue: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from model-level parsing.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// An invalid enum value was read from the database.
    #[error("invalid {field} value: {value:?}")]
    InvalidEnum {
        /// Which field contained the bad value.
        field: &'static str,
        /// The unexpected value.
        value: String,
    },
}
