use std::env;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub db_path: String,
    pub image_dir: String,
    pub audio_dir: String,
    /// Request body cap; base64 media blows past axum's 2 MB default.
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            db_path: "./memories.db".to_string(),
            image_dir: "./memory_images".to_string(),
            audio_dir: "./memory_audios".to_string(),
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from a variable lookup. Unparseable or out-of-range numbers fall
    /// back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("MEMORY_VAULT_HOST").unwrap_or(defaults.host),
            port: lookup("MEMORY_VAULT_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            db_path: lookup("MEMORY_VAULT_DB_PATH").unwrap_or(defaults.db_path),
            image_dir: lookup("MEMORY_VAULT_IMAGE_DIR").unwrap_or(defaults.image_dir),
            audio_dir: lookup("MEMORY_VAULT_AUDIO_DIR").unwrap_or(defaults.audio_dir),
            max_body_bytes: lookup("MEMORY_VAULT_MAX_BODY_MB")
                .and_then(|s| s.parse::<usize>().ok())
                .and_then(|mb| mb.checked_mul(1024 * 1024))
                .unwrap_or(defaults.max_body_bytes),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> ServiceConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
        assert_eq!(config.max_body_bytes, 25 * 1024 * 1024);
        assert_eq!(config.db_path, "./memories.db");
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            ("MEMORY_VAULT_HOST", "0.0.0.0"),
            ("MEMORY_VAULT_PORT", "8080"),
            ("MEMORY_VAULT_DB_PATH", "/data/vault.db"),
            ("MEMORY_VAULT_IMAGE_DIR", "/data/img"),
            ("MEMORY_VAULT_AUDIO_DIR", "/data/aud"),
            ("MEMORY_VAULT_MAX_BODY_MB", "10"),
        ]);
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.db_path, "/data/vault.db");
        assert_eq!(config.image_dir, "/data/img");
        assert_eq!(config.audio_dir, "/data/aud");
        assert_eq!(config.max_body_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = from_vars(&[
            ("MEMORY_VAULT_PORT", "not-a-port"),
            ("MEMORY_VAULT_MAX_BODY_MB", "lots"),
        ]);
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_body_bytes, 25 * 1024 * 1024);

        let config = from_vars(&[("MEMORY_VAULT_PORT", "70000")]);
        assert_eq!(config.port, 5000);
    }

    #[test]
    fn test_oversized_body_limit_falls_back() {
        let huge = (usize::MAX / 1000).to_string();
        let config = from_vars(&[("MEMORY_VAULT_MAX_BODY_MB", huge.as_str())]);
        assert_eq!(config.max_body_bytes, 25 * 1024 * 1024);
    }
}
