mod palette;

use std::collections::HashMap;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use clap::ValueEnum;
use pgex_core::{DetailStyles, StatDisplay, StyleRef, StyleSet, Styles};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::utils::read_file;
use palette::{get_palette, parse_style_string, AnsiPaint, Palette};

pub static CONFIG_DIR: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pgex")
});

pub const CONFIG_FILE_NAME: &str = "pgex.toml";

#[derive(Serialize, Deserialize, Clone, Debug, Default, JsonSchema)]
#[schemars(deny_unknown_fields)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub view: ViewConfig,
    pub theme: ThemeConfig,
    /// Named color palettes, selected with `theme.palette`.
    pub palettes: HashMap<String, Palette>,
}

impl Config {
    /// Loads the configuration at `path`. A missing file yields the defaults; a file
    /// that does not parse is reported and also yields the defaults.
    pub fn from_config_file<P: AsRef<Path> + Debug>(path: P) -> Self {
        if !path.as_ref().exists() {
            debug!("No configuration file at {:?}", path);
            return Self::default();
        }
        match read_file(&path) {
            Ok(contents) => Self::from_toml(&contents).unwrap_or_else(|err| {
                warn!("Ignoring invalid configuration file {:?}: {}", path, err);
                Self::default()
            }),
            Err(err) => {
                warn!("Could not read configuration file {:?}: {}", path, err);
                Self::default()
            }
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn default_path() -> PathBuf {
        CONFIG_DIR.join(CONFIG_FILE_NAME)
    }

    /// JSON schema of the configuration file.
    pub fn schema() -> String {
        let schema = schemars::schema_for!(Config);
        serde_json::to_string_pretty(&schema).unwrap_or_default()
    }

    /// Builds the style set the render engine uses. With `color` off every style is
    /// plain.
    pub fn style_set(&self, color: bool) -> StyleSet {
        if !color {
            return StyleSet::plain();
        }
        let palette = get_palette(&self.palettes, self.theme.palette.as_deref());
        StyleSet {
            cursor: self.theme.cursor.to_styles(palette),
            child_of_selected: self.theme.child_of_selected.to_styles(palette),
            normal: self.theme.normal.to_styles(palette),
            detail: self.theme.detail.to_styles(palette),
        }
    }
}

/// Statistic overlay, as spelled on the command line and in the config file.
#[derive(ValueEnum, Serialize, Deserialize, JsonSchema, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatMode {
    #[default]
    Rows,
    Buffers,
    Cost,
    Time,
    None,
}

impl From<StatMode> for StatDisplay {
    fn from(mode: StatMode) -> Self {
        match mode {
            StatMode::Rows => StatDisplay::Rows,
            StatMode::Buffers => StatDisplay::Buffers,
            StatMode::Cost => StatDisplay::Cost,
            StatMode::Time => StatDisplay::Time,
            StatMode::None => StatDisplay::None,
        }
    }
}

/// Defaults for the view toggles. Command line flags take precedence.
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[schemars(deny_unknown_fields)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub join_view: bool,
    pub stat: StatMode,
    pub indent: bool,
    pub parallel: bool,
    pub row_deviation: bool,
    /// Fixed output width; the terminal width is used when unset.
    pub width: Option<usize>,
    pub color: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            join_view: false,
            stat: StatMode::Rows,
            indent: true,
            parallel: false,
            row_deviation: false,
            width: None,
            color: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[schemars(deny_unknown_fields)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Name of an entry in `palettes`.
    pub palette: Option<String>,
    pub cursor: TierTheme,
    pub child_of_selected: TierTheme,
    pub normal: TierTheme,
    pub detail: DetailTheme,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            palette: None,
            cursor: TierTheme {
                gutter: "reverse".to_string(),
                workers: "reverse yellow".to_string(),
                everything: "reverse".to_string(),
                node_name: "reverse bold".to_string(),
                relation: "reverse cyan".to_string(),
                value: "reverse".to_string(),
                ..TierTheme::default()
            },
            child_of_selected: TierTheme {
                node_name: "bold green".to_string(),
                relation: "green".to_string(),
                value: "green".to_string(),
                ..TierTheme::default()
            },
            normal: TierTheme::default(),
            detail: DetailTheme::default(),
        }
    }
}

/// Style strings for one highlight tier, see [`parse_style_string`].
#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[schemars(deny_unknown_fields)]
#[serde(default, deny_unknown_fields)]
pub struct TierTheme {
    pub gutter: String,
    pub workers: String,
    pub everything: String,
    pub node_name: String,
    pub relation: String,
    pub value: String,
}

impl Default for TierTheme {
    fn default() -> Self {
        Self {
            gutter: "bright-black".to_string(),
            workers: "yellow".to_string(),
            everything: String::new(),
            node_name: "bold".to_string(),
            relation: "cyan".to_string(),
            value: String::new(),
        }
    }
}

impl TierTheme {
    fn to_styles(&self, palette: Option<&Palette>) -> Styles {
        let style = |s: &str| StyleRef::new(AnsiPaint(parse_style_string(s, palette)));
        Styles {
            gutter: style(&self.gutter),
            workers: style(&self.workers),
            everything: style(&self.everything),
            node_name: style(&self.node_name),
            relation: style(&self.relation),
            value: style(&self.value),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, JsonSchema)]
#[schemars(deny_unknown_fields)]
#[serde(default, deny_unknown_fields)]
pub struct DetailTheme {
    pub label: String,
    pub warning: String,
    pub caution: String,
}

impl Default for DetailTheme {
    fn default() -> Self {
        Self {
            label: "bright-black".to_string(),
            warning: "bold red".to_string(),
            caution: "yellow".to_string(),
        }
    }
}

impl DetailTheme {
    fn to_styles(&self, palette: Option<&Palette>) -> DetailStyles {
        let style = |s: &str| StyleRef::new(AnsiPaint(parse_style_string(s, palette)));
        DetailStyles {
            label: style(&self.label),
            warning: style(&self.warning),
            caution: style(&self.caution),
        }
    }
}
