use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{field} must be within {min}..={max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: f32,
        max: f32,
        value: f32,
    },
    #[error("navigation url for {button} is empty")]
    EmptyUrl { button: &'static str },
}

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("raster dimensions {width}x{height} are empty")]
    EmptyRaster { width: u32, height: u32 },
    #[error("font {path} could not be read: {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("font {path} could not be parsed: {reason}")]
    FontParse { path: PathBuf, reason: &'static str },
}

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("no video source configured")]
    Missing,
    #[error("video '{name}' failed to start: {reason}")]
    Start { name: String, reason: String },
    #[error("video '{name}' failed to decode: {reason}")]
    Decode { name: String, reason: String },
}
