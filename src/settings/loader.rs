//! Settings loading, saving, and environment variable interpolation.
//!
//! The `SettingsManager` handles:
//! - Loading settings from `~/.studio/settings.toml`
//! - Resolving `$VAR` and `${VAR}` environment variable references
//! - Atomic file writes with temp file + rename
//! - First-run template generation

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::sync::RwLock;

use super::schema::StudioSettings;
use crate::repository::RepositoryProvider;

/// Embedded template for first-run generation.
const TEMPLATE: &str = include_str!("template.toml");

/// Get the path to the global settings file.
pub fn settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".studio")
        .join("settings.toml")
}

/// Manages settings loading, interpolation, and persistence.
pub struct SettingsManager {
    /// Cached settings (with env vars resolved)
    settings: RwLock<StudioSettings>,

    /// Path to the settings file
    path: PathBuf,
}

impl SettingsManager {
    /// Create a new SettingsManager, loading from the global path if available.
    pub async fn new() -> Result<Self> {
        Self::with_path(settings_path()).await
    }

    /// Create a SettingsManager backed by an explicit settings file.
    pub async fn with_path(path: PathBuf) -> Result<Self> {
        let settings = Self::load_from_path(&path).await?;

        Ok(Self {
            settings: RwLock::new(settings),
            path,
        })
    }

    async fn load_from_path(path: &Path) -> Result<StudioSettings> {
        if !path.exists() {
            tracing::debug!("[settings] File not found at {:?}, using defaults", path);
            return Ok(StudioSettings::default());
        }

        let contents = tokio::fs::read_to_string(path)
            .await
            .context("Failed to read settings file")?;

        let mut settings: StudioSettings =
            toml::from_str(&contents).context("Failed to deserialize settings")?;

        Self::resolve_env_vars(&mut settings);

        tracing::info!("[settings] Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Resolve $ENV_VAR references in string fields.
    fn resolve_env_vars(settings: &mut StudioSettings) {
        fn resolve_opt(value: &mut Option<String>) {
            if let Some(v) = value {
                if let Some(resolved) = resolve_env_ref(v) {
                    *v = resolved;
                }
            }
        }

        fn resolve(value: &mut String) {
            if let Some(resolved) = resolve_env_ref(value) {
                *value = resolved;
            }
        }

        resolve_opt(&mut settings.repository.token);
        resolve_opt(&mut settings.repository.instance_url);
        resolve_opt(&mut settings.storage.data_dir);
        resolve(&mut settings.repository.owner);
        resolve(&mut settings.repository.repo);
        resolve(&mut settings.author.name);
        resolve(&mut settings.author.email);
    }

    /// Get the current settings (read-only).
    pub async fn get(&self) -> StudioSettings {
        self.settings.read().await.clone()
    }

    /// Update settings and persist to disk.
    pub async fn update(&self, new_settings: StudioSettings) -> Result<()> {
        *self.settings.write().await = new_settings.clone();

        let toml_string =
            toml::to_string_pretty(&new_settings).context("Failed to serialize settings")?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("toml.tmp");
        tokio::fs::write(&temp_path, &toml_string).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        tracing::info!("[settings] Saved settings to {:?}", self.path);
        Ok(())
    }

    /// Get a specific setting by dot-notation key (e.g., "repository.branch").
    pub async fn get_value(&self, key: &str) -> Result<serde_json::Value> {
        let settings = self.settings.read().await;
        let json = serde_json::to_value(&*settings)?;

        let mut current = &json;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow::anyhow!("Setting '{}' not found", key))?;
        }

        Ok(current.clone())
    }

    /// Set a specific setting by dot-notation key.
    pub async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut settings = self.settings.write().await;
        let mut json = serde_json::to_value(&*settings)?;

        let parts: Vec<&str> = key.split('.').collect();
        set_nested_value(&mut json, &parts, value)?;

        *settings = serde_json::from_value(json)?;
        drop(settings);

        self.update(self.get().await).await
    }

    /// Get the settings file path.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Ensure settings file exists, creating from template if needed.
    ///
    /// Returns `true` if a new file was created.
    pub async fn ensure_settings_file(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, TEMPLATE).await?;
        tracing::info!("[settings] Generated settings template at {:?}", self.path);
        Ok(true)
    }
}

/// Set a value in a nested JSON object using a key path.
fn set_nested_value(
    json: &mut serde_json::Value,
    parts: &[&str],
    value: serde_json::Value,
) -> Result<()> {
    let Some((last, parents)) = parts.split_last() else {
        return Err(anyhow::anyhow!("Empty key path"));
    };

    let mut current = json;
    for part in parents {
        current = current
            .get_mut(*part)
            .ok_or_else(|| anyhow::anyhow!("Setting path '{}' not found", parts.join(".")))?;
    }

    match current.as_object_mut() {
        Some(obj) => {
            obj.insert((*last).to_string(), value);
            Ok(())
        }
        None => Err(anyhow::anyhow!("Cannot set value on non-object")),
    }
}

/// Resolve a $ENV_VAR or ${ENV_VAR} reference.
///
/// Returns `Some(resolved)` if the value starts with `$` and the env var exists.
/// Returns `None` if no env var reference or env var not set.
fn resolve_env_ref(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let reference = trimmed.strip_prefix('$')?;

    let var_name = reference
        .strip_prefix('{')
        .and_then(|r| r.strip_suffix('}'))
        .unwrap_or(reference);

    std::env::var(var_name).ok()
}

/// Get a setting value with environment variable fallback.
///
/// Priority order:
/// 1. Settings value (if set and non-empty)
/// 2. Environment variable (first match from list)
/// 3. Default value
pub fn get_with_env_fallback(
    setting: &Option<String>,
    env_vars: &[&str],
    default: Option<String>,
) -> Option<String> {
    if let Some(v) = setting {
        if !v.is_empty() {
            return Some(v.clone());
        }
    }

    for env_var in env_vars {
        if let Ok(v) = std::env::var(env_var) {
            if !v.is_empty() {
                return Some(v);
            }
        }
    }

    default
}

/// Resolve the repository write token.
///
/// Priority: settings.repository.token > $STUDIO_GIT_TOKEN > provider-specific variable
pub fn resolve_token(settings: &StudioSettings) -> Option<String> {
    let provider_var = match settings.repository.provider {
        RepositoryProvider::GitHub => "GITHUB_TOKEN",
        RepositoryProvider::GitLab => "GITLAB_TOKEN",
    };

    get_with_env_fallback(
        &settings.repository.token,
        &["STUDIO_GIT_TOKEN", provider_var],
        None,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_env_ref_dollar_format() {
        std::env::set_var("STUDIO_TEST_VAR_1", "test_value_1");

        assert_eq!(
            resolve_env_ref("$STUDIO_TEST_VAR_1"),
            Some("test_value_1".to_string())
        );

        std::env::remove_var("STUDIO_TEST_VAR_1");
    }

    #[test]
    fn test_resolve_env_ref_braces_format() {
        std::env::set_var("STUDIO_TEST_VAR_2", "test_value_2");

        assert_eq!(
            resolve_env_ref("${STUDIO_TEST_VAR_2}"),
            Some("test_value_2".to_string())
        );

        std::env::remove_var("STUDIO_TEST_VAR_2");
    }

    #[test]
    fn test_resolve_env_ref_no_match() {
        assert_eq!(resolve_env_ref("regular_value"), None);
        assert_eq!(resolve_env_ref("$NONEXISTENT_VAR_XYZ_12345"), None);
    }

    #[test]
    fn test_get_with_env_fallback_from_setting() {
        let setting = Some("from_settings".to_string());
        let result = get_with_env_fallback(&setting, &["SOME_VAR"], None);
        assert_eq!(result, Some("from_settings".to_string()));
    }

    #[test]
    fn test_get_with_env_fallback_empty_setting() {
        std::env::set_var("STUDIO_EMPTY_SETTING_TEST", "from_env");

        let setting = Some("".to_string());
        let result = get_with_env_fallback(&setting, &["STUDIO_EMPTY_SETTING_TEST"], None);
        assert_eq!(result, Some("from_env".to_string()));

        std::env::remove_var("STUDIO_EMPTY_SETTING_TEST");
    }

    #[test]
    fn test_get_with_env_fallback_default() {
        let result = get_with_env_fallback(
            &None,
            &["NONEXISTENT_VAR_ABC"],
            Some("default_value".to_string()),
        );
        assert_eq!(result, Some("default_value".to_string()));
    }

    #[test]
    fn test_resolve_token_prefers_settings() {
        let mut settings = StudioSettings::default();
        settings.repository.token = Some("ghp_from_settings".to_string());
        assert_eq!(resolve_token(&settings), Some("ghp_from_settings".to_string()));
    }

    #[tokio::test]
    async fn test_settings_manager_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SettingsManager::with_path(dir.path().join("settings.toml"))
            .await
            .unwrap();

        let settings = manager.get().await;
        assert_eq!(settings.version, 1);
        assert_eq!(settings.repository.branch, "main");
    }

    #[tokio::test]
    async fn test_settings_manager_get_and_set_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let manager = SettingsManager::with_path(path.clone()).await.unwrap();

        let value = manager.get_value("repository.branch").await.unwrap();
        assert_eq!(value, serde_json::json!("main"));

        manager
            .set_value("repository.branch", serde_json::json!("content"))
            .await
            .unwrap();
        assert!(path.exists());

        let reloaded = SettingsManager::with_path(path).await.unwrap();
        assert_eq!(reloaded.get().await.repository.branch, "content");
    }

    #[tokio::test]
    async fn test_ensure_settings_file_writes_template_once() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SettingsManager::with_path(dir.path().join("nested").join("settings.toml"))
            .await
            .unwrap();

        assert!(manager.ensure_settings_file().await.unwrap());
        assert!(!manager.ensure_settings_file().await.unwrap());

        let reloaded = SettingsManager::with_path(manager.path().clone())
            .await
            .unwrap();
        assert_eq!(reloaded.get().await.version, 1);
        assert_eq!(reloaded.get().await.advanced.log_level, "info");
    }
}
