use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Pactum";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8300";
pub const DEFAULT_LLM_MODEL: &str = "qwen-plus";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 300;

/// Default log filter: info level, quieter HTTP internals.
pub fn default_log_filter() -> String {
    "info,hyper=warn,reqwest=warn".to_string()
}

/// Get the application data directory
/// ~/Pactum/ on all platforms, overridable with PACTUM_DATA_DIR
pub fn app_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PACTUM_DATA_DIR") {
        return PathBuf::from(dir);
    }
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Pactum")
}

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    /// OpenAI-compatible chat completions base URL, e.g.
    /// `https://dashscope.aliyuncs.com/compatible-mode/v1`.
    pub llm_base_url: Option<String>,
    pub llm_api_key: String,
    pub llm_model: String,
    pub llm_timeout_secs: u64,
    /// Standalone OCR service base URL. Without it, recognition degrades
    /// to per-file placeholders.
    pub ocr_base_url: Option<String>,
    pub ocr_timeout_secs: u64,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        let bind_addr = std::env::var("PACTUM_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|e| format!("Invalid PACTUM_BIND_ADDR '{bind_addr}': {e}"))?;

        Ok(Self {
            data_dir: app_data_dir(),
            bind_addr,
            llm_base_url: std::env::var("PACTUM_LLM_BASE_URL").ok().filter(|s| !s.is_empty()),
            llm_api_key: std::env::var("PACTUM_LLM_API_KEY").unwrap_or_default(),
            llm_model: std::env::var("PACTUM_LLM_MODEL")
                .unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            llm_timeout_secs: env_u64("PACTUM_LLM_TIMEOUT_SECS", DEFAULT_LLM_TIMEOUT_SECS),
            ocr_base_url: std::env::var("PACTUM_OCR_BASE_URL").ok().filter(|s| !s.is_empty()),
            ocr_timeout_secs: env_u64("PACTUM_OCR_TIMEOUT_SECS", DEFAULT_OCR_TIMEOUT_SECS),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("pactum.db")
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.data_dir.join("blobs")
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_name_is_pactum() {
        assert_eq!(APP_NAME, "Pactum");
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }

    #[test]
    fn default_bind_addr_parses() {
        assert!(DEFAULT_BIND_ADDR.parse::<SocketAddr>().is_ok());
    }

    #[test]
    fn db_and_blob_paths_under_data_dir() {
        let settings = Settings {
            data_dir: PathBuf::from("/tmp/pactum-test"),
            bind_addr: DEFAULT_BIND_ADDR.parse().unwrap(),
            llm_base_url: None,
            llm_api_key: String::new(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_timeout_secs: DEFAULT_LLM_TIMEOUT_SECS,
            ocr_base_url: None,
            ocr_timeout_secs: DEFAULT_OCR_TIMEOUT_SECS,
        };
        assert!(settings.db_path().starts_with(&settings.data_dir));
        assert!(settings.blobs_dir().ends_with("blobs"));
    }
}
