use thiserror::Error;

use crate::models::ContractStatus;

/// Events that drive a contract through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEvent {
    OcrStarted,
    OcrSucceeded,
    OcrFailed,
    AiStarted,
    AiSucceeded,
    AiFailed,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid transition: {event:?} from status {from}")]
pub struct TransitionError {
    pub from: ContractStatus,
    pub event: PipelineEvent,
}

/// The complete transition table. Stage failures revert to the pending
/// status of the failed stage so the work can be resubmitted; everything
/// not listed is invalid.
pub fn transition(
    from: ContractStatus,
    event: PipelineEvent,
) -> Result<ContractStatus, TransitionError> {
    use ContractStatus::*;
    use PipelineEvent::*;

    match (from, event) {
        (PendingOcr, OcrStarted) => Ok(OcrProcessing),
        (OcrProcessing, OcrSucceeded) => Ok(PendingAi),
        (OcrProcessing, OcrFailed) => Ok(PendingOcr),
        (PendingAi, AiStarted) => Ok(AiProcessing),
        (AiProcessing, AiSucceeded) => Ok(Completed),
        (AiProcessing, AiFailed) => Ok(PendingAi),
        (from, event) => Err(TransitionError { from, event }),
    }
}

/// Admission check for a user-triggered OCR resubmission. Only a contract
/// sitting in `pending_ocr` may be resubmitted; anything else is already in
/// flight or done. The automatic submission right after upload does not go
/// through this check.
pub fn admit_ocr(status: ContractStatus) -> Result<(), TransitionError> {
    if status == ContractStatus::PendingOcr {
        Ok(())
    } else {
        Err(TransitionError {
            from: status,
            event: PipelineEvent::OcrStarted,
        })
    }
}
