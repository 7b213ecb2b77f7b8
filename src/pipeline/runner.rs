use rusqlite::Connection;
use uuid::Uuid;

use super::extract_stage::ExtractStage;
use super::ocr_stage::OcrStage;
use super::queue::{Stage, StageRunner, TaskSink};
use super::PipelineError;

/// Binds the two stage executors to the worker thread's own database
/// connection. The worker owns this exclusively, so the connection never
/// crosses threads.
pub struct PipelineRunner {
    conn: Connection,
    ocr: OcrStage,
    extract: ExtractStage,
}

impl PipelineRunner {
    pub fn new(conn: Connection, ocr: OcrStage, extract: ExtractStage) -> Self {
        Self { conn, ocr, extract }
    }
}

impl StageRunner for PipelineRunner {
    fn run(
        &mut self,
        contract_id: Uuid,
        stage: Stage,
        sink: &dyn TaskSink,
    ) -> Result<(), PipelineError> {
        match stage {
            Stage::Ocr => self.ocr.execute(&self.conn, contract_id, sink),
            Stage::Extract => self.extract.execute(&mut self.conn, contract_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::db::repository;
    use crate::db::sqlite::open_memory_database;
    use crate::extract::{ExtractedFields, ExtractedParty, MockFieldExtractor, MockRecognizer};
    use crate::models::{Contract, ContractFile, ContractStatus, ContractType};
    use crate::storage::{BlobArea, BlobStore};

    struct VecSink(std::sync::Mutex<Vec<(Uuid, Stage)>>);

    impl TaskSink for VecSink {
        fn enqueue(&self, contract_id: Uuid, stage: Stage) {
            self.0.lock().unwrap().push((contract_id, stage));
        }
    }

    #[test]
    fn ocr_then_extract_runs_the_whole_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(BlobStore::open(dir.path()).unwrap());

        let conn = open_memory_database().unwrap();
        let contract = Contract::new("HT-2026-010", ContractType::Purchase, Some("uploader"));
        repository::insert_contract(&conn, &contract).unwrap();
        let locator = store
            .put(BlobArea::Raw, &format!("{}_scan.pdf", contract.id), b"%PDF")
            .unwrap();
        repository::insert_file(
            &conn,
            &ContractFile::new(contract.id, &locator, "scan.pdf", 0),
        )
        .unwrap();

        let fields = ExtractedFields {
            total_amount: Some(42000.0),
            subject_matter: Some("Spare parts".into()),
            sign_date: Some("2026-04-01".into()),
            effective_date: Some("2026-04-15".into()),
            expire_date: Some("2027-04-15".into()),
            parties: vec![ExtractedParty {
                party_type: Some("甲方".into()),
                party_name: Some("Acme".into()),
                ..Default::default()
            }],
        };
        let mut runner = PipelineRunner::new(
            conn,
            OcrStage::new(store.clone(), Box::new(MockRecognizer::always("scanned text"))),
            ExtractStage::new(store, Box::new(MockFieldExtractor::new(fields))),
        );

        let sink = VecSink(std::sync::Mutex::new(Vec::new()));
        runner.run(contract.id, Stage::Ocr, &sink).unwrap();

        let chained = sink.0.lock().unwrap().clone();
        assert_eq!(chained, vec![(contract.id, Stage::Extract)]);

        runner.run(contract.id, Stage::Extract, &sink).unwrap();

        let done = repository::get_contract(&runner.conn, &contract.id)
            .unwrap()
            .unwrap();
        assert_eq!(done.status, ContractStatus::Completed);
        assert_eq!(done.total_amount, Some(42000.0));
    }
}
