//! Ingestion worker: watches a directory and pushes each new video through
//! the upload workflow.
//!
//! - [`WatchDispatcher`] runs on the watcher's notification thread and only
//!   classifies events and enqueues paths.
//! - [`IngestionWorkflow`] carries one file from upload destination to local
//!   cleanup on the async runtime.
//! - [`ProcessSupervisor`] owns the watch subscription and the task set.

pub mod dispatcher;
pub mod supervisor;
pub mod workflow;

pub use dispatcher::{is_eligible_video, WatchDispatcher, VIDEO_SUFFIX};
pub use supervisor::{IngestStats, ProcessSupervisor, RunningSupervisor};
pub use workflow::{IngestOutcome, IngestState, IngestionWorkflow};
