//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// `DATABASE_URL` value that selects the in-memory store.
pub const MEMORY_DATABASE_URL: &str = "memory";

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL, or `memory` for the in-process store.
    pub database_url: String,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// Path to uploads directory (default: ./uploads).
    pub uploads_dir: PathBuf,

    /// Base URL for serving uploaded files (default: /files).
    pub files_url: String,

    /// Asset folder for offer pictures (default: offers).
    pub offers_folder: String,

    /// Asset folder for user avatars (default: avatars).
    pub avatars_folder: String,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,

    /// S3 bucket. When set and the `s3` feature is enabled, assets go to S3.
    pub s3_bucket: Option<String>,

    /// Key prefix inside the bucket.
    pub s3_prefix: Option<String>,

    /// Custom endpoint for S3-compatible services.
    pub s3_endpoint: Option<String>,

    /// Public base URL of the bucket (CDN or website endpoint).
    pub s3_public_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./uploads"));

        let files_url = env::var("FILES_URL").unwrap_or_else(|_| "/files".to_string());

        let offers_folder = env::var("OFFERS_FOLDER").unwrap_or_else(|_| "offers".to_string());

        let avatars_folder = env::var("AVATARS_FOLDER").unwrap_or_else(|_| "avatars".to_string());

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_else(|_| vec!["*".to_string()]);

        let optional = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            uploads_dir,
            files_url,
            offers_folder,
            avatars_folder,
            cors_allowed_origins,
            s3_bucket: optional("S3_BUCKET"),
            s3_prefix: optional("S3_PREFIX"),
            s3_endpoint: optional("S3_ENDPOINT"),
            s3_public_url: optional("S3_PUBLIC_URL"),
        })
    }

    /// Whether the in-memory store was requested.
    pub fn uses_memory_store(&self) -> bool {
        self.database_url == MEMORY_DATABASE_URL
    }

    /// Configuration for tests and local runs without external services.
    pub fn in_memory(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            port: 0,
            database_url: MEMORY_DATABASE_URL.to_string(),
            database_max_connections: 1,
            uploads_dir: uploads_dir.into(),
            files_url: "/files".to_string(),
            offers_folder: "offers".to_string(),
            avatars_folder: "avatars".to_string(),
            cors_allowed_origins: vec!["*".to_string()],
            s3_bucket: None,
            s3_prefix: None,
            s3_endpoint: None,
            s3_public_url: None,
        }
    }
}
