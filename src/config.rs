use crate::av::Rational;
use crate::error::{Result, StreamerError};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Files searched, in order, by [`StreamerConfig::load`].
pub const CONFIG_PATHS: [&str; 2] = ["./h264ts.toml", "./config.toml"];

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "H264TS_";

/// Parameters of one streaming session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// File path or `udp://`/`tcp://` URL
    pub destination: String,
    pub width: u32,
    pub height: u32,
    /// Integer frame rate; the stream time base is `1/fps`
    pub fps: u32,
    /// Target bit rate in bits per second
    pub bit_rate: u64,
    pub gop_size: u32,
    pub max_b_frames: u32,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self {
            destination: String::from("output.ts"),
            width: 1280,
            height: 720,
            fps: 30,
            bit_rate: 2 * 1024 * 1024,
            gop_size: 10,
            max_b_frames: 2,
        }
    }
}

impl StreamerConfig {
    pub fn new(destination: impl Into<String>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            destination: destination.into(),
            width,
            height,
            fps,
            ..Self::default()
        }
    }

    /// Defaults, then the first config file found, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        for path in &CONFIG_PATHS {
            if Path::new(path).exists() {
                log::debug!("loading configuration from {}", path);
                config = Self::from_file(path)?;
                break;
            }
        }

        config.apply_overrides(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| StreamerError::Config(e.to_string()))
    }

    /// Applies `H264TS_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(destination) = var("DESTINATION") {
            self.destination = destination;
        }
        if let Some(width) = var("WIDTH") {
            self.width = parse_number("WIDTH", &width)?;
        }
        if let Some(height) = var("HEIGHT") {
            self.height = parse_number("HEIGHT", &height)?;
        }
        if let Some(fps) = var("FPS") {
            self.fps = parse_number("FPS", &fps)?;
        }
        if let Some(bit_rate) = var("BIT_RATE") {
            self.bit_rate = parse_number("BIT_RATE", &bit_rate)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(StreamerError::Config("destination must not be empty".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(StreamerError::Config(format!(
                "invalid dimensions {}x{}",
                self.width, self.height
            )));
        }
        if self.fps == 0 || self.fps > i32::MAX as u32 {
            return Err(StreamerError::Config(format!("invalid frame rate {}", self.fps)));
        }
        Ok(())
    }

    /// Stream time base, one tick per frame.
    pub fn time_base(&self) -> Rational {
        Rational::from_fps(self.fps)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        StreamerError::Config(format!("{ENV_PREFIX}{name}: expected a number, got {value:?}"))
    })
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# h264ts configuration
# Every key is optional; missing keys keep their defaults.

destination = "output.ts"
width = 1280
height = 720
fps = 30
bit_rate = 2097152
gop_size = 10
max_b_frames = 2
"#;
        std::fs::write(path, template)?;
    }
    Ok(())
}
