//! OCR stage: attached files to one combined text artifact.

use std::sync::Arc;

use rusqlite::Connection;
use uuid::Uuid;

use super::queue::{Stage, TaskSink};
use super::state::{transition, PipelineEvent};
use super::PipelineError;
use crate::db::repository;
use crate::extract::{FileKind, TextRecognizer};
use crate::storage::{BlobArea, BlobStore};

/// Separator between per-file texts in the combined artifact.
pub const PAGE_SEPARATOR: &str = "\n\n--- PAGE BREAK ---\n\n";

/// Placeholder inserted when one file cannot be recognized. The stage still
/// succeeds; the gap is visible in the combined text.
pub fn recognition_placeholder(filename: &str) -> String {
    format!("[file {filename} recognition failed]")
}

pub struct OcrStage {
    store: Arc<BlobStore>,
    recognizer: Box<dyn TextRecognizer + Send>,
}

impl OcrStage {
    pub fn new(store: Arc<BlobStore>, recognizer: Box<dyn TextRecognizer + Send>) -> Self {
        Self { store, recognizer }
    }

    /// Run OCR for one contract and, on success, queue the extraction stage.
    ///
    /// A single unreadable file degrades to a placeholder; only a contract
    /// with no files at all, or a storage/database failure, fails the stage.
    /// On failure the status reverts to `pending_ocr`.
    pub fn execute(
        &self,
        conn: &Connection,
        contract_id: Uuid,
        sink: &dyn TaskSink,
    ) -> Result<(), PipelineError> {
        let contract = repository::get_contract(conn, &contract_id)?
            .ok_or(PipelineError::NotFound(contract_id))?;

        let files = repository::list_files(conn, &contract_id)?;
        if files.is_empty() {
            return Err(PipelineError::Precondition(format!(
                "contract {contract_id} has no files attached"
            )));
        }

        let processing = transition(contract.status, PipelineEvent::OcrStarted)?;
        repository::update_status(conn, &contract_id, &processing)?;
        tracing::info!(contract_id = %contract_id, files = files.len(), "OCR stage started");

        match self.recognize_and_store(conn, contract_id, &files) {
            Ok(()) => {
                let next = transition(processing, PipelineEvent::OcrSucceeded)?;
                repository::update_status(conn, &contract_id, &next)?;
                tracing::info!(contract_id = %contract_id, "OCR stage completed");
                sink.enqueue(contract_id, Stage::Extract);
                Ok(())
            }
            Err(e) => {
                let reverted = transition(processing, PipelineEvent::OcrFailed)?;
                repository::update_status(conn, &contract_id, &reverted)?;
                Err(e)
            }
        }
    }

    fn recognize_and_store(
        &self,
        conn: &Connection,
        contract_id: Uuid,
        files: &[crate::models::ContractFile],
    ) -> Result<(), PipelineError> {
        let mut parts = Vec::with_capacity(files.len());
        for file in files {
            parts.push(self.recognize_file(file));
        }

        let combined = parts.join(PAGE_SEPARATOR);
        let locator = self.store.put(
            BlobArea::Text,
            &format!("{contract_id}.txt"),
            combined.as_bytes(),
        )?;
        repository::set_ocr_text_path(conn, &contract_id, &locator)?;
        Ok(())
    }

    /// Recognize one file, degrading any per-file problem to a placeholder.
    fn recognize_file(&self, file: &crate::models::ContractFile) -> String {
        let bytes = match self.store.get(&file.file_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(file = %file.filename, error = %e, "File unreadable, using placeholder");
                return recognition_placeholder(&file.filename);
            }
        };
        let kind = match FileKind::from_filename(&file.filename) {
            Ok(kind) => kind,
            Err(e) => {
                tracing::warn!(file = %file.filename, error = %e, "Unsupported kind, using placeholder");
                return recognition_placeholder(&file.filename);
            }
        };
        match self.recognizer.recognize(&bytes, kind) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %file.filename, error = %e, "Recognition failed, using placeholder");
                recognition_placeholder(&file.filename)
            }
        }
    }
}
