use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Service name reported by the health endpoint
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Human-readable logs instead of JSON
    #[serde(default = "default_debug")]
    pub debug: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// OpenAI API key. Without it the placeholder image generator is used.
    pub openai_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible images API
    #[serde(default = "default_image_api_base_url")]
    pub image_api_base_url: String,

    #[serde(default = "default_image_model")]
    pub image_model: String,

    #[serde(default = "default_image_size")]
    pub image_size: String,

    #[serde(default = "default_image_timeout_secs")]
    pub image_timeout_secs: u64,

    /// S3-compatible endpoint URL (R2, Supabase Storage, MinIO, ...)
    pub storage_endpoint: Option<String>,

    /// S3 access key ID
    pub storage_access_key: Option<String>,

    /// S3 secret access key
    pub storage_secret_key: Option<String>,

    #[serde(default = "default_storage_bucket")]
    pub storage_bucket: String,

    #[serde(default = "default_storage_region")]
    pub storage_region: String,

    /// Public base URL for uploaded objects. Falls back to `{endpoint}/{bucket}`.
    pub storage_public_url: Option<String>,

    #[serde(default = "default_storage_timeout_secs")]
    pub storage_timeout_secs: u64,

    /// Base URL used for placeholder comic URLs when storage is not configured
    #[serde(default = "default_placeholder_base_url")]
    pub placeholder_base_url: String,

    /// PostgreSQL connection string. Without it comic records are not persisted.
    pub database_url: Option<String>,

    /// HMAC secret for access tokens
    #[serde(default = "default_secret_key")]
    pub secret_key: String,

    /// JWT signing algorithm (e.g., "HS256")
    #[serde(default = "default_algorithm")]
    pub algorithm: String,

    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: i64,

    #[serde(default = "default_auth_stub_email")]
    pub auth_stub_email: String,

    #[serde(default = "default_auth_stub_password")]
    pub auth_stub_password: String,
}

fn default_app_name() -> String {
    "Comic Diary AI Server".to_string()
}

fn default_debug() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_image_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_image_model() -> String {
    "dall-e-3".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_image_timeout_secs() -> u64 {
    120
}

fn default_storage_bucket() -> String {
    "comics".to_string()
}

fn default_storage_region() -> String {
    "auto".to_string()
}

fn default_storage_timeout_secs() -> u64 {
    60
}

fn default_placeholder_base_url() -> String {
    "https://via.placeholder.com/comics".to_string()
}

fn default_secret_key() -> String {
    "your-secret-key-here".to_string()
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> i64 {
    30
}

fn default_auth_stub_email() -> String {
    "test@example.com".to_string()
}

fn default_auth_stub_password() -> String {
    "password".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build a config from explicit key/value pairs, ignoring the process environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn storage_configured(&self) -> bool {
        self.storage_endpoint.is_some()
            && self.storage_access_key.is_some()
            && self.storage_secret_key.is_some()
    }
}
