//! Settings file discovery, loading and layering

use super::builtin;
use super::schema::Settings;
use crate::error::{Result, SettingsError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROJECT_SETTINGS_FILE: &str = ".flowforge.toml";

pub struct SettingsLoader;

impl SettingsLoader {
    /// Find user settings by checking environment and standard locations
    pub fn find_user_config() -> Option<PathBuf> {
        Self::user_config_candidates(
            env::var_os("FLOWFORGE_CONFIG").map(PathBuf::from),
            env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
            env::var_os("HOME").map(PathBuf::from),
        )
        .into_iter()
        .find(|p| p.exists())
    }

    /// User settings locations in lookup order
    /// 1. `$FLOWFORGE_CONFIG`
    /// 2. `$XDG_CONFIG_HOME/flowforge/config.toml`
    /// 3. `~/.config/flowforge/config.toml`
    pub fn user_config_candidates(
        explicit: Option<PathBuf>,
        xdg_config_home: Option<PathBuf>,
        home: Option<PathBuf>,
    ) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        candidates.extend(explicit);
        candidates.extend(xdg_config_home.map(|xdg| xdg.join("flowforge/config.toml")));
        candidates.extend(home.map(|home| home.join(".config/flowforge/config.toml")));
        candidates
    }

    /// Find project settings by searching up from the current directory
    pub fn find_project_config() -> Option<PathBuf> {
        let current = env::current_dir().ok()?;
        Self::find_project_config_from(&current)
    }

    pub fn find_project_config_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(PROJECT_SETTINGS_FILE))
            .find(|p| p.exists())
    }

    /// Read one settings layer without applying defaults
    pub fn load_layer<P: AsRef<Path>>(path: P) -> Result<toml::Table> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a single settings file on top of the builtin defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let mut merged = builtin::get_builtin_layer().clone();
        Self::merge_layers(&mut merged, Self::load_layer(path)?);
        Self::finish(merged)
    }

    pub fn load_builtin() -> Settings {
        builtin::get_builtin().clone()
    }

    /// Merge an overriding layer into a base layer
    /// Tables are merged key by key, any other value replaces the base value
    pub fn merge_layers(base: &mut toml::Table, overlay: toml::Table) {
        for (key, value) in overlay {
            let overlay_table = match value {
                toml::Value::Table(table) => table,
                other => {
                    base.insert(key, other);
                    continue;
                }
            };
            if let Some(toml::Value::Table(base_table)) = base.get_mut(&key) {
                Self::merge_layers(base_table, overlay_table);
                continue;
            }
            base.insert(key, toml::Value::Table(overlay_table));
        }
    }

    /// Load with full settings priority order
    /// Priority: built-in < user < project < explicit
    pub fn load_with_priority(explicit: Option<&Path>) -> Result<Settings> {
        let mut paths = Vec::new();

        if let Some(user_path) = Self::find_user_config() {
            tracing::debug!("Loading user settings from {:?}", user_path);
            paths.push(user_path);
        }

        if let Some(project_path) = Self::find_project_config() {
            tracing::debug!("Loading project settings from {:?}", project_path);
            paths.push(project_path);
        }

        if let Some(explicit_path) = explicit {
            tracing::debug!("Loading explicit settings from {:?}", explicit_path);
            paths.push(explicit_path.to_path_buf());
        }

        Self::load_layers(&paths)
    }

    /// Merge the given files in order onto the builtin layer
    pub fn load_layers(paths: &[PathBuf]) -> Result<Settings> {
        let mut merged = builtin::get_builtin_layer().clone();
        for path in paths {
            Self::merge_layers(&mut merged, Self::load_layer(path)?);
        }
        Self::finish(merged)
    }

    fn finish(merged: toml::Table) -> Result<Settings> {
        Ok(toml::Value::Table(merged).try_into()?)
    }
}
