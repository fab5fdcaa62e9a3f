//! Built-in default settings embedded in the binary
//!
//! The builtin layer is the lowest-priority settings layer. It is parsed on
//! first access and cached using LazyLock.

use super::schema::Settings;
use std::sync::LazyLock;

static BUILTIN_LAYER: LazyLock<toml::Table> = LazyLock::new(load_builtin_layer);

static BUILTIN_SETTINGS: LazyLock<Settings> = LazyLock::new(|| {
    toml::Value::Table(get_builtin_layer().clone())
        .try_into()
        .expect("Failed to parse builtin settings")
});

/// Raw builtin layer, the base every other layer is merged onto
pub fn get_builtin_layer() -> &'static toml::Table {
    &BUILTIN_LAYER
}

/// Get the builtin settings
pub fn get_builtin() -> &'static Settings {
    &BUILTIN_SETTINGS
}

fn load_builtin_layer() -> toml::Table {
    const BUILTIN_TOML: &str = include_str!("../builtin-settings.toml");
    toml::from_str(BUILTIN_TOML).expect("Failed to parse builtin settings")
}
