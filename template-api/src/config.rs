use std::time::Duration;

use envconfig::Envconfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(from = "BIND_HOST", default = "0.0.0.0")]
    pub host: String,

    // Hosting platforms inject PORT
    #[envconfig(from = "PORT", default = "8000")]
    pub port: u16,

    #[envconfig(default = "redis://localhost:6379")]
    pub redis_url: String,

    pub supabase_url: Option<String>,

    pub supabase_service_role_key: Option<String>,

    pub supabase_key: Option<String>,

    #[envconfig(default = "http://localhost:3000")]
    pub cors_origins: String,

    #[envconfig(default = "10")]
    pub backend_connect_timeout_secs: u64,

    #[envconfig(default = "false")]
    pub enable_metrics: bool,

    #[envconfig(default = "false")]
    pub debug: bool,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn bind(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn supabase_url(&self) -> Option<&str> {
        non_empty(&self.supabase_url)
    }

    /// The service role key wins over the anon key when both are set.
    pub fn supabase_credential(&self) -> Option<&str> {
        non_empty(&self.supabase_service_role_key).or_else(|| non_empty(&self.supabase_key))
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect()
    }

    pub fn backend_connect_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_connect_timeout_secs.max(1))
    }

    pub fn default_for_test() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            redis_url: "redis://localhost:6379/".to_string(),
            supabase_url: None,
            supabase_service_role_key: None,
            supabase_key: None,
            cors_origins: "http://localhost:3000".to_string(),
            backend_connect_timeout_secs: 1,
            enable_metrics: false,
            debug: false,
        }
    }
}
