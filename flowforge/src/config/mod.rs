//! CLI settings
//!
//! Layers, lowest priority first:
//! - built-in defaults embedded in the binary
//! - user settings (`$FLOWFORGE_CONFIG`, XDG or `~/.config/flowforge/config.toml`)
//! - project settings (`.flowforge.toml` in the current or a parent directory)
//! - an explicit `--config` file

pub mod builtin;
pub mod loader;
pub mod schema;

pub use loader::SettingsLoader;
pub use schema::Settings;
