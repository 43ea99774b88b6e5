use std::path::{Path, PathBuf};

use eframe::egui;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::export::{DEFAULT_EXPORT_FILE_NAME, DEFAULT_IMAGE_FILE_NAME};
use crate::history::HistoryLimit;
use crate::session::{SessionSettings, TOOLBAR_HEIGHT};
use crate::surface::BrushStyle;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub brush: BrushConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrushConfig {
    /// `#rrggbb` or `#rrggbbaa`.
    #[serde(default = "default_brush_color")]
    pub color: String,
    #[serde(default = "default_brush_width")]
    pub width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_toolbar_height")]
    pub toolbar_height: u32,
    #[serde(default = "default_initial_width")]
    pub initial_width: u32,
    #[serde(default = "default_initial_height")]
    pub initial_height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum retained snapshots; 0 keeps everything.
    #[serde(default)]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_export_file_name")]
    pub file_name: String,
    #[serde(default = "default_image_file_name")]
    pub image_file_name: String,
}

fn default_brush_color() -> String {
    "#ff0000".to_string()
}

fn default_brush_width() -> f32 {
    5.0
}

fn default_toolbar_height() -> u32 {
    TOOLBAR_HEIGHT
}

fn default_initial_width() -> u32 {
    1200
}

fn default_initial_height() -> u32 {
    800
}

fn default_export_file_name() -> String {
    DEFAULT_EXPORT_FILE_NAME.to_string()
}

fn default_image_file_name() -> String {
    DEFAULT_IMAGE_FILE_NAME.to_string()
}

impl Default for BrushConfig {
    fn default() -> Self {
        Self {
            color: default_brush_color(),
            width: default_brush_width(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            toolbar_height: default_toolbar_height(),
            initial_width: default_initial_width(),
            initial_height: default_initial_height(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_name: default_export_file_name(),
            image_file_name: default_image_file_name(),
        }
    }
}

impl AppConfig {
    pub fn brush_style(&self) -> BrushStyle {
        let color = match egui::Color32::from_hex(&self.brush.color) {
            Ok(color) => color,
            Err(e) => {
                log::warn!("invalid brush color {:?} ({e:?}), using red", self.brush.color);
                BrushStyle::default().color
            }
        };
        let width = if self.brush.width.is_finite() {
            self.brush.width
        } else {
            BrushStyle::default().width
        };
        BrushStyle { color, width }
    }

    /// Stores `brush` as the default for the next session.
    pub fn remember_brush(&mut self, brush: BrushStyle) {
        let [r, g, b, a] = brush.color.to_srgba_unmultiplied();
        self.brush.color = if a == 255 {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        };
        self.brush.width = brush.width;
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            brush: self.brush_style(),
            history_limit: HistoryLimit::from_config(self.history.limit),
            toolbar_height: self.canvas.toolbar_height,
            export_file_name: self.export.file_name.clone(),
            image_file_name: self.export.image_file_name.clone(),
        }
    }
}

/// `<config_dir>/annotate-coco/config.toml`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("annotate-coco").join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration, falling back to defaults on any failure.
pub fn load_config() -> AppConfig {
    match config_path().and_then(|path| load_config_from(&path)) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}. Using defaults.");
            AppConfig::default()
        }
    }
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let toml = toml::to_string_pretty(config)?;
    std::fs::write(path, toml).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_path()?)
}
