//! Configuration system for taskstrip
//!
//! Loads configuration from TOML file at `~/.config/taskstrip/config.toml`
//! Auto-generates default config file on first run if missing.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub panel: PanelConfig,
    pub theme: ThemeConfig,
    /// Widgets in paint / hit-test order
    pub widgets: Vec<WidgetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            panel: PanelConfig::default(),
            theme: ThemeConfig::default(),
            widgets: vec![
                WidgetConfig::Launchbar(LaunchbarConfig::default()),
                WidgetConfig::Desktops(DesktopsConfig::default()),
                WidgetConfig::Taskbar(TaskbarConfig::default()),
                WidgetConfig::Clock(ClockConfig::default()),
            ],
        }
    }
}

impl Config {
    /// Load configuration from file, or use defaults if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            info!("Config file not found at {:?}, using defaults", config_path);
            if let Err(e) = Self::save_default(&config_path) {
                warn!("Failed to create default config file: {}", e);
            }
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .context("Failed to read config file")?;
        let config = Self::parse(&content)?;

        info!("Configuration loaded from {:?}", config_path);
        debug!("Config: {:?}", config);

        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Get the path to the config file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("taskstrip");

        Ok(config_dir.join("config.toml"))
    }

    /// Save default configuration to file
    fn save_default(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(&Self::default())
            .context("Failed to serialize default config")?;

        fs::write(path, toml_string)
            .context("Failed to write default config file")?;

        info!("Created default config file at {:?}", path);
        Ok(())
    }
}

/// Screen edge the panel sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelPosition {
    Top,
    Bottom,
    Left,
    Right,
}

impl PanelPosition {
    pub fn is_vertical(self) -> bool {
        matches!(self, PanelPosition::Left | PanelPosition::Right)
    }
}

/// Panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub position: PanelPosition,
    /// Height of a horizontal panel / width of a vertical one, in pixels
    pub thickness: u16,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            position: PanelPosition::Bottom,
            thickness: 28,
        }
    }
}

/// Colours of one widget state, `#rrggbb`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateColors {
    pub background: String,
    pub text: String,
}

/// Theme colours, `#rrggbb`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: String,
    pub idle: StateColors,
    pub pressed: StateColors,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        // Nord
        Self {
            background: "#2e3440".into(),
            idle: StateColors {
                background: "#3b4252".into(),
                text: "#d8dee9".into(),
            },
            pressed: StateColors {
                background: "#5e81ac".into(),
                text: "#eceff4".into(),
            },
        }
    }
}

/// One `[[widgets]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WidgetConfig {
    Taskbar(TaskbarConfig),
    Clock(ClockConfig),
    Desktops(DesktopsConfig),
    Launchbar(LaunchbarConfig),
    Decor(DecorConfig),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskbarConfig {
    /// Upper bound on a task button's width, 0 for none
    pub task_max_width: i32,
    /// How far outside the taskbar a task must be dropped to close it
    pub task_death_threshold: i32,
    pub icon_size: u32,
}

impl Default for TaskbarConfig {
    fn default() -> Self {
        Self {
            task_max_width: 200,
            task_death_threshold: 50,
            icon_size: 16,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// strftime format
    pub format: String,
    pub width: i32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            format: "%H:%M".into(),
            width: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesktopsConfig {
    pub width: i32,
}

impl Default for DesktopsConfig {
    fn default() -> Self {
        Self { width: 120 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchItem {
    pub label: String,
    pub command: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchbarConfig {
    pub item_width: i32,
    pub items: Vec<LaunchItem>,
}

impl Default for LaunchbarConfig {
    fn default() -> Self {
        Self {
            item_width: 48,
            items: vec![LaunchItem {
                label: "term".into(),
                command: "xterm".into(),
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorConfig {
    pub width: i32,
    /// Fill colour, panel background when unset
    pub color: Option<String>,
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            width: 8,
            color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_widget_list() {
        let config = Config::parse(
            r##"
            [panel]
            position = "top"
            thickness = 32

            [[widgets]]
            type = "taskbar"
            task_death_threshold = 80

            [[widgets]]
            type = "clock"
            format = "%a %H:%M"

            [[widgets]]
            type = "decor"
            color = "#ff0000"
            "##,
        )
        .unwrap();

        assert_eq!(config.panel.position, PanelPosition::Top);
        assert_eq!(config.panel.thickness, 32);
        assert_eq!(config.widgets.len(), 3);
        match &config.widgets[0] {
            WidgetConfig::Taskbar(t) => {
                assert_eq!(t.task_death_threshold, 80);
                assert_eq!(t.icon_size, 16);
            }
            other => panic!("expected taskbar, got {:?}", other),
        }
        assert_eq!(config.theme.background, ThemeConfig::default().background);
    }

    #[test]
    fn test_unknown_widget_type_is_rejected() {
        assert!(Config::parse("[[widgets]]\ntype = \"systray\"\n").is_err());
    }

    #[test]
    fn test_default_config_serializes() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back = Config::parse(&text).unwrap();
        assert_eq!(back.widgets.len(), Config::default().widgets.len());
    }
}
