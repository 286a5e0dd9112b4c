use std::{fs, path::Path, time::Duration};

use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "activities.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub server_url: String,
    pub message_hide_delay_ms: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            message_hide_delay_ms: 5000,
            request_timeout_secs: 10,
        }
    }
}

impl ClientSettings {
    pub fn message_hide_delay(&self) -> Duration {
        Duration::from_millis(self.message_hide_delay_ms)
    }

    /// Replaces the server url, normalizing it the same way file and env
    /// values are.
    pub fn with_server_url(mut self, raw: &str) -> Self {
        self.server_url = normalize_server_url(raw);
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    server_url: Option<String>,
    message_hide_delay_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
}

pub fn load_settings() -> ClientSettings {
    load_settings_with(Path::new(DEFAULT_CONFIG_FILE), |key| std::env::var(key).ok())
}

pub fn load_settings_with(
    config_path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> ClientSettings {
    let mut settings = ClientSettings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, env);

    settings.server_url = normalize_server_url(&settings.server_url);
    settings
}

fn apply_file_overrides(settings: &mut ClientSettings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<FileSettings>(raw) else {
        tracing::warn!("ignoring unparsable {DEFAULT_CONFIG_FILE}");
        return;
    };

    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.message_hide_delay_ms {
        settings.message_hide_delay_ms = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
}

fn apply_env_overrides(settings: &mut ClientSettings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("ACTIVITIES_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__MESSAGE_HIDE_DELAY_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.message_hide_delay_ms = parsed;
        }
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}

fn normalize_server_url(raw_server_url: &str) -> String {
    let raw_server_url = raw_server_url.trim();

    if raw_server_url.is_empty() {
        return ClientSettings::default().server_url;
    }

    let with_scheme = if raw_server_url.contains("://") {
        raw_server_url.to_string()
    } else {
        format!("http://{raw_server_url}")
    };

    with_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env, fs,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn normalizes_bare_host_and_trailing_slash() {
        assert_eq!(
            normalize_server_url("localhost:8000/"),
            "http://localhost:8000"
        );
        assert_eq!(
            normalize_server_url(" https://school.example/api/ "),
            "https://school.example/api"
        );
        assert_eq!(normalize_server_url("   "), "http://127.0.0.1:8000");
    }

    #[test]
    fn defaults_apply_without_file_or_env() {
        let settings = load_settings_with(Path::new("/nonexistent/activities.toml"), env_from(&[]));
        assert_eq!(settings, ClientSettings::default());
        assert_eq!(settings.message_hide_delay(), Duration::from_millis(5000));
    }

    #[test]
    fn env_overrides_file_values() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let temp_root = env::temp_dir().join(format!("activities_client_cfg_{suffix}"));
        fs::create_dir_all(&temp_root).expect("temp root");
        let path = temp_root.join("activities.toml");
        fs::write(
            &path,
            "server_url = \"http://file.example:9000/\"\nmessage_hide_delay_ms = 2500\n",
        )
        .expect("write config");

        let settings = load_settings_with(
            &path,
            env_from(&[
                ("APP__SERVER_URL", "http://env.example"),
                ("APP__REQUEST_TIMEOUT_SECS", "3"),
            ]),
        );
        assert_eq!(settings.server_url, "http://env.example");
        assert_eq!(settings.message_hide_delay_ms, 2500);
        assert_eq!(settings.request_timeout_secs, 3);

        let file_only = load_settings_with(&path, env_from(&[]));
        assert_eq!(file_only.server_url, "http://file.example:9000");

        fs::remove_dir_all(temp_root).expect("cleanup");
    }

    #[test]
    fn unparsable_numbers_are_ignored() {
        let mut settings = ClientSettings::default();
        apply_env_overrides(
            &mut settings,
            env_from(&[("APP__MESSAGE_HIDE_DELAY_MS", "soon")]),
        );
        assert_eq!(settings.message_hide_delay_ms, 5000);
    }

    #[test]
    fn broken_config_file_keeps_defaults() {
        let mut settings = ClientSettings::default();
        apply_file_overrides(&mut settings, "server_url = [not toml");
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn cli_flag_override_is_normalized() {
        let settings = ClientSettings::default().with_server_url("example.org:8080/");
        assert_eq!(settings.server_url, "http://example.org:8080");
    }
}
