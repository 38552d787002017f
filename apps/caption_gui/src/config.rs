use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use shared::protocol::DEFAULT_ENDPOINT_BASE;

pub const DEFAULT_CONFIG_FILE: &str = "caption_gui.toml";

#[derive(Parser, Debug, Default)]
#[command(name = "caption-gui", about = "Desktop client for an image captioning endpoint")]
pub struct CliArgs {
    /// TOML settings file (default: ./caption_gui.toml if present)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Base url of the captioning service
    #[arg(long)]
    pub endpoint_url: Option<String>,
    /// Abort caption requests after this many seconds (0 disables)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub endpoint_url: String,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_BASE.into(),
            request_timeout_secs: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Defaults, then the settings file, then environment, then command line.
/// A broken settings file is skipped and handed back so it can be logged once
/// tracing is up.
pub fn load_settings(
    args: &CliArgs,
    env: impl Fn(&str) -> Option<String>,
) -> (Settings, Option<anyhow::Error>) {
    let path = args
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let explicit = args.config.is_some();

    let (mut settings, file_error) = match read_settings_file(&path, explicit) {
        Ok(settings) => (settings.unwrap_or_default(), None),
        Err(err) => (Settings::default(), Some(err)),
    };

    apply_env_overrides(&mut settings, env);
    apply_cli_overrides(&mut settings, args);
    settings.endpoint_url = normalize_endpoint_url(&settings.endpoint_url);
    (settings, file_error)
}

fn read_settings_file(path: &Path, explicit: bool) -> anyhow::Result<Option<Settings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !explicit => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    let settings = toml::from_str::<Settings>(&raw)
        .with_context(|| format!("invalid settings in '{}'", path.display()))?;
    Ok(Some(settings))
}

fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("CAPTION_ENDPOINT_URL") {
        settings.endpoint_url = v;
    }
    if let Some(v) = env("APP__ENDPOINT_URL") {
        settings.endpoint_url = v;
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

fn apply_cli_overrides(settings: &mut Settings, args: &CliArgs) {
    if let Some(v) = &args.endpoint_url {
        settings.endpoint_url = v.clone();
    }
    if let Some(v) = args.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
}

fn normalize_endpoint_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return Settings::default().endpoint_url;
    }
    if raw.contains("://") {
        return raw.to_string();
    }
    format!("http://{raw}")
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, io::Write};

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn args_with_config(path: &Path) -> CliArgs {
        CliArgs {
            config: Some(path.to_path_buf()),
            ..CliArgs::default()
        }
    }

    #[test]
    fn normalizes_endpoint_urls() {
        assert_eq!(normalize_endpoint_url("  "), DEFAULT_ENDPOINT_BASE);
        assert_eq!(
            normalize_endpoint_url("localhost:5000"),
            "http://localhost:5000"
        );
        assert_eq!(
            normalize_endpoint_url(" https://captions.example.com "),
            "https://captions.example.com"
        );
    }

    #[test]
    fn missing_default_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = read_settings_file(&dir.path().join(DEFAULT_CONFIG_FILE), false)
            .expect("missing file is fine");
        assert!(settings.is_none());
        assert_eq!(Settings::default().request_timeout(), None);
    }

    #[test]
    fn explicit_missing_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = args_with_config(&dir.path().join("nope.toml"));
        let (settings, err) = load_settings(&args, env_from(&[]));
        assert!(err.is_some());
        assert_eq!(settings.endpoint_url, DEFAULT_ENDPOINT_BASE);
    }

    #[test]
    fn file_then_env_then_cli_precedence() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "endpoint_url = \"http://file-host:5000\"\nrequest_timeout_secs = 30\nlog_filter = \"debug\""
        )
        .expect("write");

        let args = args_with_config(file.path());
        let (settings, err) = load_settings(&args, env_from(&[]));
        assert!(err.is_none());
        assert_eq!(settings.endpoint_url, "http://file-host:5000");
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.log_filter, "debug");

        let (settings, _) = load_settings(
            &args,
            env_from(&[
                ("CAPTION_ENDPOINT_URL", "http://env-host:5000"),
                ("APP__REQUEST_TIMEOUT_SECS", "0"),
            ]),
        );
        assert_eq!(settings.endpoint_url, "http://env-host:5000");
        assert_eq!(settings.request_timeout(), None);

        let args = CliArgs {
            endpoint_url: Some("cli-host:8080".to_string()),
            ..args_with_config(file.path())
        };
        let (settings, _) = load_settings(
            &args,
            env_from(&[("APP__ENDPOINT_URL", "http://env-host:5000")]),
        );
        assert_eq!(settings.endpoint_url, "http://cli-host:8080");
    }

    #[test]
    fn invalid_toml_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "endpoint_url = [not toml").expect("write");

        let (settings, err) = load_settings(&args_with_config(file.path()), env_from(&[]));
        let err = err.expect("parse error reported");
        assert!(format!("{err:#}").contains("invalid settings"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn unparseable_env_timeout_is_ignored() {
        let mut settings = Settings::default();
        apply_env_overrides(
            &mut settings,
            env_from(&[("APP__REQUEST_TIMEOUT_SECS", "soon")]),
        );
        assert_eq!(settings.request_timeout_secs, None);
    }
}
