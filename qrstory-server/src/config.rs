use std::env;

/// Server configuration, read from environment variables with fallback
/// defaults. `MONGO_URI` is the only required setting.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
    pub mongo_uri: Option<String>,
    pub db_name: String,
    pub collection_name: String,
    pub bucket_name: String,
    pub id_prefix: String,
    pub id_length: usize,
    pub max_blob_bytes: u64,
    pub allowed_origins: Vec<String>,
    /// Where `/view/{id}` redirects; the story ID is appended as a query
    pub reveal_page: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HTTP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("HTTP_PORT").unwrap_or_else(|_| "5000".to_string()),
            mongo_uri: env::var("MONGO_URI").ok(),
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "qrdatabase".to_string()),
            collection_name: env::var("STORY_COLLECTION").unwrap_or_else(|_| "stories".to_string()),
            bucket_name: env::var("IMAGE_BUCKET").unwrap_or_else(|_| "images".to_string()),
            id_prefix: env::var("STORY_ID_PREFIX").unwrap_or_else(|_| "qrs_".to_string()),
            id_length: env::var("STORY_ID_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            max_blob_bytes: env::var("MAX_BLOB_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10 * 1024 * 1024),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            reveal_page: env::var("REVEAL_PAGE").unwrap_or_else(|_| "/reveal.html".to_string()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
