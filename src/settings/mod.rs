//! Centralized TOML-based settings system for Studio.
//!
//! Settings are loaded from `~/.studio/settings.toml` with environment variable
//! interpolation support. Repository tokens fall back to environment variables
//! through the `get_with_env_fallback` helper.
//!
//! # Usage
//!
//! ```rust,ignore
//! use studio_lib::settings::{resolve_token, SettingsManager};
//!
//! let manager = SettingsManager::new().await?;
//! let settings = manager.get().await;
//! let token = resolve_token(&settings);
//! ```

pub mod loader;
pub mod schema;

pub use loader::{get_with_env_fallback, resolve_token, settings_path, SettingsManager};
pub use schema::StudioSettings;
