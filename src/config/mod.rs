use std::env;
use std::path::PathBuf;

/// Server configuration for story authoring and media handling
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string (default: "sqlite://stories.db?mode=rwc")
    pub database_url: String,

    /// Root directory that media directories are resolved against (default: ".")
    pub data_root: PathBuf,

    /// Directory holding uploaded media, relative to `data_root` (default: "uploads")
    pub uploads_dir: String,

    /// Directory receiving recoverably deleted media, relative to `data_root`
    /// (default: "deleted_uploads")
    pub deleted_files_recovery_dir: String,

    /// URL path uploaded media is served under (default: "/uploads")
    pub uploaded_files_handler_path: String,

    /// Whether new stories may be saved (default: true)
    pub authoring_enabled: bool,

    /// Active UI theme, falls back to `base_theme_name` when unset
    pub theme: Option<String>,

    /// Base UI theme name (default: "base")
    pub base_theme_name: String,

    /// Maximum request body size in bytes (default: 256 MB)
    pub max_file_size: usize,

    /// Upper bound for a single image rotation in seconds (default: 30)
    pub rotation_timeout_secs: u64,

    /// Basic auth credentials guarding story deletion. Deletion is open when unset.
    pub basic_auth_username: Option<String>,
    pub basic_auth_password: Option<String>,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://stories.db?mode=rwc".to_string(),
            data_root: PathBuf::from("."),
            uploads_dir: "uploads".to_string(),
            deleted_files_recovery_dir: "deleted_uploads".to_string(),
            uploaded_files_handler_path: "/uploads".to_string(),
            authoring_enabled: true,
            theme: None,
            base_theme_name: "base".to_string(),
            max_file_size: 256 * 1024 * 1024, // 256 MB
            rotation_timeout_secs: 30,
            basic_auth_username: None,
            basic_auth_password: None,
            allowed_origins: vec![
                "http://localhost:8081".to_string(),
                "http://127.0.0.1:8081".to_string(),
            ],
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            data_root: env::var("DATA_ROOT")
                .map(PathBuf::from)
                .unwrap_or(default.data_root),

            uploads_dir: env::var("UPLOADS_DIR").unwrap_or(default.uploads_dir),

            deleted_files_recovery_dir: env::var("DELETED_FILES_RECOVERY_DIR")
                .unwrap_or(default.deleted_files_recovery_dir),

            uploaded_files_handler_path: env::var("UPLOADED_FILES_HANDLER_PATH")
                .unwrap_or(default.uploaded_files_handler_path),

            authoring_enabled: env::var("AUTHORING_ENABLED")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(default.authoring_enabled),

            theme: env::var("THEME").ok().filter(|v| !v.is_empty()),

            base_theme_name: env::var("BASE_THEME").unwrap_or(default.base_theme_name),

            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            rotation_timeout_secs: env::var("ROTATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.rotation_timeout_secs),

            basic_auth_username: env::var("BASIC_AUTH_USERNAME").ok(),
            basic_auth_password: env::var("BASIC_AUTH_PASSWORD").ok(),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),
        }
    }

    /// Create config for development and tests (in-memory database, authoring on)
    pub fn development() -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            rotation_timeout_secs: 5,
            ..Self::default()
        }
    }

    pub fn uploads_path(&self) -> PathBuf {
        self.data_root.join(&self.uploads_dir)
    }

    pub fn recovery_path(&self) -> PathBuf {
        self.data_root.join(&self.deleted_files_recovery_dir)
    }

    /// Theme exposed to the client
    pub fn effective_theme(&self) -> &str {
        self.theme.as_deref().unwrap_or(&self.base_theme_name)
    }

    pub fn requires_basic_auth(&self) -> bool {
        self.basic_auth_username.is_some() && self.basic_auth_password.is_some()
    }
}
