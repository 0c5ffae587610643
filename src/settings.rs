use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Telegram {
    /// Bot token and target chat for admin alerts. Either may be absent; the
    /// notifier then degrades to a warning-only no-op instead of failing startup.
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Admin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub store: Store,
    #[serde(default)]
    pub telegram: Telegram,
    pub admin: Admin,
    pub server: Server,
}

impl Settings {
    /// `config.toml` is optional and every key has a default, so a bare
    /// environment still boots. `FLEXIHUB_TELEGRAM__BOT_TOKEN` style variables
    /// override the file.
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .set_default("store.path", "flexihub_db")?
            // Static admin credential pair; override in config or environment.
            .set_default("admin.username", "admin")?
            .set_default("admin.password", "admin")?
            .set_default("server.bind", "0.0.0.0:8080")?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("FLEXIHUB").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boots_without_config_file_or_environment() {
        let settings = Settings::new().unwrap();
        assert_eq!(settings.admin.username, "admin");
        assert_eq!(settings.server.bind, "0.0.0.0:8080");
        assert!(!settings.store.path.is_empty());
    }
}
