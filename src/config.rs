use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_posts_url")]
    pub posts_url: String,

    #[serde(default = "default_likes_url")]
    pub likes_url: String,

    /// Seconds between retry timer firings while a cycle is incomplete.
    #[serde(default = "default_retry_interval_seconds")]
    pub retry_interval_seconds: u64,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Directory holding records.json and the raw payload archive.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_posts_url() -> String {
    "http://localhost:3000/api/posts".to_string()
}

fn default_likes_url() -> String {
    "http://localhost:3000/api/likes".to_string()
}

fn default_retry_interval_seconds() -> u64 {
    15
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            posts_url: default_posts_url(),
            likes_url: default_likes_url(),
            retry_interval_seconds: default_retry_interval_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

impl BackendConfig {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BackendConfig = toml::from_str(&content)?;
        Ok(config)
    }
}
