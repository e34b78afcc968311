//! Taskmill — turn free-form communication text into tracked tasks.
//!
//! Meeting transcripts, messages, and voicemail transcriptions go in; an
//! LLM extraction service pulls out actionable tasks, which are sanitized
//! and persisted alongside the source communication and an audit trail.
//!
//! See `DESIGN.md` for architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod extract;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod store;
