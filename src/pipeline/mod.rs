//! Two-stage processing pipeline: OCR (file bytes to text) then AI
//! extraction (text to structured fields). One background worker drains a
//! strict FIFO queue; stage transitions go through the status state machine
//! in [`state`].

pub mod confidence;
pub mod extract_stage;
pub mod ocr_stage;
pub mod queue;
pub mod runner;
pub mod state;

pub use confidence::*;
pub use extract_stage::ExtractStage;
pub use ocr_stage::OcrStage;
pub use queue::*;
pub use runner::PipelineRunner;
pub use state::*;

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::extract::ExtractError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Contract not found: {0}")]
    NotFound(Uuid),

    #[error("Precondition not met: {0}")]
    Precondition(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Capability(#[from] ExtractError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}
