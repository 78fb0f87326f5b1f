use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use inquire::validator::Validation;
use inquire::{CustomUserError, Text};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{FormError, StoreError};
use crate::forms::positive_int;

pub const API_URL_ENV: &str = "AREPAS_API_URL";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_DATA_ROOT: &str = "~/Documents/ArepasERP";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const TIMEOUT_FIELD: &str = "Tiempo máximo";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppSettings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Where report templates and generated reports live
    #[serde(default = "default_data_root")]
    pub data_root: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_data_root() -> String {
    DEFAULT_DATA_ROOT.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            data_root: default_data_root(),
            timeout_secs: default_timeout(),
        }
    }
}

impl AppSettings {
    /// Environment wins over the file, like a build-time API URL did.
    pub fn with_env_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            debug!(%url, "API URL taken from {API_URL_ENV}");
            self.api_url = url;
        }
        self.api_url = normalize_api_url(&self.api_url);
        self
    }

    pub fn data_root_path(&self) -> PathBuf {
        PathBuf::from(expand_home_dir(&self.data_root))
    }
}

pub fn normalize_api_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Platform config directory (settings + session).
pub fn config_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "arepas-erp", "app") {
        let dir = proj_dirs.config_dir();
        if !dir.exists() {
            fs::create_dir_all(dir).ok();
        }
        return dir.to_path_buf();
    }
    PathBuf::from(".")
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn default_location() -> Self {
        Self::new(config_dir().join("settings.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<AppSettings>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path).map_err(|e| StoreError::io(&self.path, e))?;
        toml::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::parse(&self.path, e))
    }

    pub fn save(&self, settings: &AppSettings) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
        }
        let toml_str = toml::to_string_pretty(settings).map_err(|e| StoreError::parse(&self.path, e))?;
        fs::write(&self.path, toml_str).map_err(|e| StoreError::io(&self.path, e))
    }

    /// Stored settings (or defaults) with the environment applied.
    pub fn effective(&self) -> Result<AppSettings, StoreError> {
        let stored = self.load()?.unwrap_or_default();
        Ok(stored.with_env_override(std::env::var(API_URL_ENV).ok()))
    }
}

pub fn setup_config_wizard(store: &SettingsStore) -> Result<AppSettings> {
    println!("\n⚙️  --- Configuración ---");
    let current = store.load()?.unwrap_or_default();

    let api_url = Text::new("URL del API:")
        .with_default(&current.api_url)
        .with_help_message("Ej. http://192.168.1.10:8000/api")
        .prompt()?;

    println!("📂 Abriendo selector de carpeta...");
    let picked_path = rfd::FileDialog::new()
        .set_title("Carpeta de datos (plantillas y reportes)")
        .pick_folder();

    let data_root = if let Some(path) = picked_path {
        path.to_string_lossy().to_string()
    } else {
        println!("❌ No se seleccionó carpeta. Ingrese la ruta manualmente.");
        Text::new("Carpeta de datos:")
            .with_default(&current.data_root)
            .prompt()?
    };

    let timeout = Text::new("Tiempo máximo por petición (segundos):")
        .with_default(&current.timeout_secs.to_string())
        .with_validator(|input: &str| -> Result<Validation, CustomUserError> {
            Ok(match parse_timeout(input) {
                Ok(_) => Validation::Valid,
                Err(e) => Validation::Invalid(e.to_string().into()),
            })
        })
        .prompt()?;
    let timeout_secs = parse_timeout(&timeout)?;

    let settings = AppSettings {
        api_url: normalize_api_url(&api_url),
        data_root,
        timeout_secs,
    };
    store
        .save(&settings)
        .with_context(|| format!("guardando {}", store.path().display()))?;
    info!(path = %store.path().display(), "settings saved");
    println!("✅ Configuración guardada.");
    Ok(settings)
}

/// Whole seconds, at least one.
pub fn parse_timeout(input: &str) -> Result<u64, FormError> {
    positive_int(TIMEOUT_FIELD, input).map(|n| n as u64)
}

pub fn expand_home_dir(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(base_dirs) = BaseDirs::new() {
            let home = base_dirs.home_dir().to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.toml"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("nested/settings.toml"));
        let settings = AppSettings {
            api_url: "http://10.0.0.5:8000/api".into(),
            data_root: "/srv/arepas".into(),
            timeout_secs: 5,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), Some(settings));
    }

    #[test]
    fn partial_file_gets_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "api_url = \"http://erp.local/api/\"\n").unwrap();
        let loaded = SettingsStore::new(path).load().unwrap().unwrap();
        assert_eq!(loaded.timeout_secs, 30);
        assert_eq!(loaded.data_root, "~/Documents/ArepasERP");
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "api_url = [").unwrap();
        let err = SettingsStore::new(path).load().unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }

    #[test]
    fn env_override_and_normalization() {
        let base = AppSettings {
            api_url: "http://erp.local/api/".into(),
            ..AppSettings::default()
        };
        assert_eq!(base.clone().with_env_override(None).api_url, "http://erp.local/api");
        assert_eq!(
            base.clone().with_env_override(Some("http://other:9000/api".into())).api_url,
            "http://other:9000/api"
        );
        assert_eq!(
            base.with_env_override(Some("  ".into())).api_url,
            "http://erp.local/api"
        );
    }

    #[test]
    fn timeout_needs_a_whole_positive_number() {
        assert_eq!(parse_timeout(" 15 "), Ok(15));
        assert_eq!(parse_timeout("0"), Err(FormError::NotPositive(TIMEOUT_FIELD)));
        assert!(matches!(parse_timeout("-3"), Err(FormError::NotPositive(_))));
        assert!(matches!(parse_timeout("diez"), Err(FormError::InvalidNumber { .. })));
        assert_eq!(parse_timeout(""), Err(FormError::Required(TIMEOUT_FIELD)));
    }

    #[test]
    fn home_expansion_only_touches_tilde() {
        assert_eq!(expand_home_dir("/abs/path"), "/abs/path");
        assert_eq!(expand_home_dir("rel/~x"), "rel/~x");
    }
}
