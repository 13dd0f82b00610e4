use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use crt_core::{AppConfig, BitmapFont, GlyphSource, TrueTypeFont, VariantChoice, load_config};
use log::info;

#[derive(Parser, Debug)]
#[command(about = "CRT-styled link page composited with wgpu", version)]
pub struct Args {
    /// Optional JSON config with links, text and shader constants
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Background video (.ogv) or still image (.png/.jpg)
    #[arg(long)]
    pub video: Option<PathBuf>,

    /// Force a layout instead of picking one from the window width
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// TrueType font for the UI text; defaults to the built-in bitmap font
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Skip creating a winit window/event loop; useful for headless automation
    #[arg(long)]
    pub headless: bool,

    /// When set, render one composited frame on the CPU and write it as PNG
    #[arg(long)]
    pub dump_render: Option<PathBuf>,

    /// Elapsed seconds used for the dumped frame
    #[arg(long, default_value_t = 0.0)]
    pub dump_time: f32,

    #[arg(long, default_value_t = 1280)]
    pub window_width: u32,

    #[arg(long, default_value_t = 720)]
    pub window_height: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VariantArg {
    Auto,
    Desktop,
    Mobile,
}

impl From<VariantArg> for VariantChoice {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Auto => VariantChoice::Auto,
            VariantArg::Desktop => VariantChoice::Desktop,
            VariantArg::Mobile => VariantChoice::Mobile,
        }
    }
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.window_width > 0 && self.window_height > 0,
            "window size must be non-zero (got {}x{})",
            self.window_width,
            self.window_height
        );
        ensure!(
            self.dump_time.is_finite() && self.dump_time >= 0.0,
            "dump_time must be a non-negative number of seconds (got {})",
            self.dump_time
        );
        Ok(())
    }
}

/// Config file (if any) with command-line overrides applied.
pub fn load_app_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(variant) = args.variant {
        config.variant = variant.into();
    }
    Ok(config)
}

pub fn load_font(path: Option<&Path>) -> Result<Arc<dyn GlyphSource>> {
    match path {
        Some(path) => {
            let font = TrueTypeFont::load(path)
                .with_context(|| format!("loading font {}", path.display()))?;
            info!("using font {}", path.display());
            Ok(Arc::new(font))
        }
        None => Ok(Arc::new(BitmapFont)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn variant_flag_overrides_config_file() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("crt.json");
        let body = json!({ "variant": "desktop", "text": { "credit": "@someone" } });
        std::fs::write(&path, body.to_string()).expect("write config");

        let args = Args::try_parse_from([
            "crt_viewer",
            "--config",
            path.to_str().expect("utf-8 path"),
            "--variant",
            "mobile",
        ])
        .expect("parse args");
        let config = load_app_config(&args).expect("load config");
        assert_eq!(config.variant, VariantChoice::Mobile);
        assert_eq!(config.text.credit, "@someone");
    }

    #[test]
    fn defaults_validate() {
        let args = Args::try_parse_from(["crt_viewer"]).expect("parse args");
        assert_eq!((args.window_width, args.window_height), (1280, 720));
        assert!(args.validate().is_ok());
        assert_eq!(load_app_config(&args).expect("config"), AppConfig::default());
    }

    #[test]
    fn negative_dump_time_is_rejected() {
        let args = Args::try_parse_from(["crt_viewer", "--dump-time=-1"]).expect("parse args");
        assert!(args.validate().is_err());
    }

    #[test]
    fn missing_font_file_is_an_error() {
        let temp = tempdir().expect("temp dir");
        let err = load_font(Some(temp.path().join("nope.ttf").as_path()))
            .err()
            .expect("font load should fail");
        assert!(format!("{err:#}").contains("nope.ttf"));
    }
}
