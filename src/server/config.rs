use super::RequestsLoggingLevel;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_METRICS_PORT: u16 = 9091;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    /// `/metrics` is served on its own port, never on the API one.
    pub metrics_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::default(),
            port: DEFAULT_PORT,
            metrics_port: DEFAULT_METRICS_PORT,
        }
    }
}
