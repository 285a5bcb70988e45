//! Report submission workflow
//!
//! `state_machine` holds the pure wizard transitions; `driver` runs the
//! collaborator calls around them.

pub mod driver;
pub mod error;
pub mod state_machine;

pub use driver::{SubmissionWorkflow, WorkflowSettings};
pub use error::WorkflowError;
pub use state_machine::{SubmissionContext, WorkflowEvent, WorkflowStage};
