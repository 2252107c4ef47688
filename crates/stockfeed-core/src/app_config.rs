use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub ollama_url: String,
    pub ollama_model: String,
    pub narration_timeout_secs: u64,
    pub pulse_timeout_secs: u64,
    pub analysis_timeout_secs: u64,
    pub expert_timeout_secs: u64,
    pub quote_base_url: String,
    pub quote_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("ollama_url", &self.ollama_url)
            .field("ollama_model", &self.ollama_model)
            .field("narration_timeout_secs", &self.narration_timeout_secs)
            .field("pulse_timeout_secs", &self.pulse_timeout_secs)
            .field("analysis_timeout_secs", &self.analysis_timeout_secs)
            .field("expert_timeout_secs", &self.expert_timeout_secs)
            .field("quote_base_url", &self.quote_base_url)
            .field("quote_timeout_secs", &self.quote_timeout_secs)
            .finish()
    }
}
