use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;
use crate::hover::ButtonId;
use crate::variant::VariantChoice;

pub const DEFAULT_HOMEBREW_URL: &str = "https://homebrew.sylvixor.com";
pub const DEFAULT_TOOLS_URL: &str = "https://tools.sylvixor.com";
pub const DEFAULT_TITLE: &str = "Welcome, see projects below";
pub const DEFAULT_CREDIT: &str = "@sylvixor";

/// Tunables of the compositing pass that differ between variants. Fields
/// omitted from a config file keep the values of the variant being configured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShaderConstants {
    pub distortion_amount: f32,
    pub bloom_strength: f32,
    pub aberration: f32,
    pub brightness_flicker: f32,
}

impl ShaderConstants {
    pub const DESKTOP: ShaderConstants = ShaderConstants {
        distortion_amount: 0.06,
        bloom_strength: 0.8,
        aberration: 0.007,
        brightness_flicker: 0.0,
    };

    pub const MOBILE: ShaderConstants = ShaderConstants {
        distortion_amount: 0.5,
        bloom_strength: 0.8,
        aberration: 0.003,
        brightness_flicker: 0.04,
    };

    fn validate(&self) -> Result<(), ConfigError> {
        check_range("distortion_amount", self.distortion_amount, 0.0, 2.0)?;
        check_range("bloom_strength", self.bloom_strength, 0.0, 1.0)?;
        check_range("aberration", self.aberration, 0.0, 0.1)?;
        check_range("brightness_flicker", self.brightness_flicker, 0.0, 0.5)
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ShaderOverrides {
    distortion_amount: Option<f32>,
    bloom_strength: Option<f32>,
    aberration: Option<f32>,
    brightness_flicker: Option<f32>,
}

impl ShaderOverrides {
    fn apply(self, base: ShaderConstants) -> ShaderConstants {
        ShaderConstants {
            distortion_amount: self.distortion_amount.unwrap_or(base.distortion_amount),
            bloom_strength: self.bloom_strength.unwrap_or(base.bloom_strength),
            aberration: self.aberration.unwrap_or(base.aberration),
            brightness_flicker: self.brightness_flicker.unwrap_or(base.brightness_flicker),
        }
    }
}

fn desktop_constants<'de, D: Deserializer<'de>>(d: D) -> Result<ShaderConstants, D::Error> {
    ShaderOverrides::deserialize(d).map(|overrides| overrides.apply(ShaderConstants::DESKTOP))
}

fn mobile_constants<'de, D: Deserializer<'de>>(d: D) -> Result<ShaderConstants, D::Error> {
    ShaderOverrides::deserialize(d).map(|overrides| overrides.apply(ShaderConstants::MOBILE))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Links {
    pub homebrew: String,
    pub tools: String,
}

impl Links {
    pub fn url_for(&self, button: ButtonId) -> &str {
        match button {
            ButtonId::Homebrew => &self.homebrew,
            ButtonId::Tools => &self.tools,
        }
    }
}

impl Default for Links {
    fn default() -> Self {
        Self {
            homebrew: DEFAULT_HOMEBREW_URL.to_string(),
            tools: DEFAULT_TOOLS_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    pub title: String,
    /// The narrow layout breaks the title over several centred lines.
    pub mobile_title: Vec<String>,
    pub credit: String,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            mobile_title: vec!["welcome, see".to_string(), "projects below".to_string()],
            credit: DEFAULT_CREDIT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub variant: VariantChoice,
    pub links: Links,
    pub text: TextConfig,
    #[serde(deserialize_with = "desktop_constants")]
    pub desktop_shader: ShaderConstants,
    #[serde(deserialize_with = "mobile_constants")]
    pub mobile_shader: ShaderConstants,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            variant: VariantChoice::Auto,
            links: Links::default(),
            text: TextConfig::default(),
            desktop_shader: ShaderConstants::DESKTOP,
            mobile_shader: ShaderConstants::MOBILE,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for button in ButtonId::ALL {
            if self.links.url_for(button).trim().is_empty() {
                return Err(ConfigError::EmptyUrl {
                    button: button.label(),
                });
            }
        }
        self.desktop_shader.validate()?;
        self.mobile_shader.validate()
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppConfig = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    config.validate()?;
    Ok(config)
}

fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}
