use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    io,
    path::PathBuf,
    sync::LazyLock,
};
use strum::{Display, VariantArray};

pub static CONFIG_PATH: LazyLock<PathBuf> =
    LazyLock::new(|| dirs::config_dir().unwrap().join("rollscope.toml"));

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// theme brightness percentage, 0-200, 100 = no change
    pub theme_brightness: u16,
    /// theme contrast percentage, 0-200, 100 = no change
    pub theme_contrast: u16,
    /// display scale of the cover image
    pub image_zoom: f32,
    pub aspect_ratio: AspectRatio,
    /// stroke width of the oscilloscope trace
    pub scope_line_width: f32,
    pub midi_path: Option<PathBuf>,
    pub image_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme_brightness: 100,
            theme_contrast: 100,
            image_zoom: 1.0,
            aspect_ratio: AspectRatio::default(),
            scope_line_width: 2.0,
            midi_path: None,
            image_path: None,
        }
    }
}

impl Config {
    #[must_use]
    pub fn read() -> Self {
        let config = read_to_string(&*CONFIG_PATH);

        let read =
            toml::from_str::<Self>(config.as_deref().unwrap_or_default()).unwrap_or_default();

        if config.is_err_and(|e| e.kind() == io::ErrorKind::NotFound) {
            read.write();
        }

        read
    }

    pub fn write(&self) {
        write(&*CONFIG_PATH, toml::to_string(self).unwrap()).unwrap();
    }
}

/// Selects the internal pixel dimensions handed to the renderers.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize, VariantArray,
)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    #[strum(to_string = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    #[strum(to_string = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            Self::Landscape => (854.0, 480.0),
            Self::Portrait => (270.0, 480.0),
        }
    }
}
