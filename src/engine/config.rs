//! Engine connection settings.

use std::fmt;
use std::time::Duration;

/// Where and how to reach the engine.
///
/// Built explicitly and handed to the components that need it; nothing is
/// read from the process environment.
#[derive(Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    /// Upper bound on concurrently open sessions.
    pub max_sessions: usize,
    /// How long a checkout waits for a busy pool before giving up.
    pub checkout_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: String::new(),
            database: "tpch".into(),
            max_sessions: 4,
            checkout_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Create a configuration for the given database on the default server.
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    pub fn checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    /// `user@host:port/database`, safe for logs.
    pub fn target(&self) -> String {
        format!("{}@{}:{}/{}", self.user, self.host, self.port, self.database)
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .field("max_sessions", &self.max_sessions)
            .field("checkout_timeout", &self.checkout_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.target(), "postgres@localhost:5432/tpch");
        assert!(config.password.is_empty());
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new("tpch_sf1")
            .host("db.internal")
            .port(6543)
            .user("analyst")
            .password("hunter2")
            .max_sessions(1)
            .checkout_timeout(Duration::from_millis(250));

        assert_eq!(config.target(), "analyst@db.internal:6543/tpch_sf1");
        assert_eq!(config.max_sessions, 1);
        assert_eq!(config.checkout_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_debug_hides_password() {
        let config = EngineConfig::default().password("hunter2");
        let text = format!("{:?}", config);
        assert!(!text.contains("hunter2"));
        assert!(text.contains("***"));
    }
}
