pub mod api;
pub mod config;
pub mod contracts;
pub mod db;
pub mod extract;
pub mod models;
pub mod pipeline;
pub mod review;
pub mod storage;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::{server, ApiContext};
use crate::extract::{
    ChatCompletionsClient, FieldExtractor, HttpOcrClient, TextRecognizer, UnavailableExtractor,
    UnavailableRecognizer,
};
use crate::pipeline::{ExtractStage, OcrStage, PipelineRunner, TaskQueue};
use crate::storage::BlobStore;

/// Wire everything together and serve the API until shutdown.
pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let settings = config::Settings::from_env()?;
    std::fs::create_dir_all(&settings.data_dir)
        .map_err(|e| format!("Cannot create data directory: {e}"))?;

    let store = Arc::new(
        BlobStore::open(&settings.blobs_dir()).map_err(|e| format!("Blob storage: {e}"))?,
    );

    // The worker thread owns this connection for the process lifetime;
    // opening it up front also runs pending migrations.
    let worker_conn =
        db::sqlite::open_database(&settings.db_path()).map_err(|e| format!("Database: {e}"))?;

    let recognizer: Box<dyn TextRecognizer + Send> = match &settings.ocr_base_url {
        Some(url) => Box::new(HttpOcrClient::new(url, settings.ocr_timeout_secs)),
        None => {
            tracing::warn!("PACTUM_OCR_BASE_URL not set, recognition will degrade to placeholders");
            Box::new(UnavailableRecognizer)
        }
    };
    let extractor: Box<dyn FieldExtractor + Send> = match &settings.llm_base_url {
        Some(url) => Box::new(ChatCompletionsClient::new(
            url,
            &settings.llm_api_key,
            &settings.llm_model,
            settings.llm_timeout_secs,
        )),
        None => {
            tracing::warn!("PACTUM_LLM_BASE_URL not set, extraction will fail until configured");
            Box::new(UnavailableExtractor)
        }
    };

    let runner = PipelineRunner::new(
        worker_conn,
        OcrStage::new(store.clone(), recognizer),
        ExtractStage::new(store.clone(), extractor),
    );
    let queue = Arc::new(TaskQueue::start(Box::new(runner)));

    let ctx = ApiContext::new(settings.db_path(), store, queue);
    server::serve(ctx, settings.bind_addr).await
}
