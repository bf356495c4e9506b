//! Viewer configuration.
//!
//! Layered, later layers win:
//! 1. built-in defaults
//! 2. JSON file (`--config <path>`, `$MYELIN_VIEWER_CONFIG`, or `myelin-viewer.json`
//!    in the working directory when present)
//! 3. environment (`MYELIN_DATA`, `MYELIN_IMAGE_DIR`)
//! 4. command line (`--data`, `--images`, `--export`)

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "myelin-viewer.json";
pub const DEFAULT_IMAGE_DIR: &str = "Figure_5_images";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Observation table (.csv / .json / .parquet). Asked for interactively when unset.
    pub data_path: Option<PathBuf>,
    /// Directory holding `MAX_<cell_ID>_d<day>.jpg` files.
    pub image_dir: PathBuf,
    /// When set, write chart descriptions here and exit instead of opening a window.
    pub export_dir: Option<PathBuf>,
    /// Initial window size in points.
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            image_dir: PathBuf::from(DEFAULT_IMAGE_DIR),
            export_dir: None,
            window_size: [1400.0, 900.0],
        }
    }
}

/// Command-line flags, before merging.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    data: Option<PathBuf>,
    images: Option<PathBuf>,
    export: Option<PathBuf>,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(flag) = args.next() {
        let slot = match flag.as_str() {
            "--config" => &mut parsed.config,
            "--data" => &mut parsed.data,
            "--images" => &mut parsed.images,
            "--export" => &mut parsed.export,
            other if !other.starts_with("--") && parsed.data.is_none() => {
                parsed.data = Some(PathBuf::from(other));
                continue;
            }
            other => bail!("unrecognised argument '{other}'"),
        };
        let value = args
            .next()
            .with_context(|| format!("{flag} expects a path"))?;
        *slot = Some(PathBuf::from(value));
    }
    Ok(parsed)
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Build the configuration from the process environment and arguments.
    pub fn load() -> Result<Self> {
        Self::resolve(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    fn resolve<I, E>(args: I, env: E) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        E: Fn(&str) -> Option<String>,
    {
        let cli = parse_args(args)?;

        let file = cli
            .config
            .clone()
            .or_else(|| env("MYELIN_VIEWER_CONFIG").map(PathBuf::from))
            .or_else(|| {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                default.is_file().then_some(default)
            });

        let mut config = match file {
            Some(path) => {
                log::info!("Reading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        if let Some(data) = env("MYELIN_DATA") {
            config.data_path = Some(PathBuf::from(data));
        }
        if let Some(dir) = env("MYELIN_IMAGE_DIR") {
            config.image_dir = PathBuf::from(dir);
        }

        if cli.data.is_some() {
            config.data_path = cli.data;
        }
        if let Some(dir) = cli.images {
            config.image_dir = dir;
        }
        if cli.export.is_some() {
            config.export_dir = cli.export;
        }

        Ok(config)
    }
}
