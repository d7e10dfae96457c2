//! Configuration for the gazelink plugins

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Settings the host session injects into every plugin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Minimum confidence for gaze data to count as usable (0.0-1.0)
    pub min_data_confidence: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_data_confidence: 0.6,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_data_confidence) {
            return Err(Error::Configuration(format!(
                "min_data_confidence must be between 0.0 and 1.0, got {}",
                self.min_data_confidence
            )));
        }
        Ok(())
    }
}

/// Object detection plugin settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub enabled: bool,
    /// Position in the plugin chain (lower runs earlier)
    pub order: f64,
    /// Detections below this confidence are dropped
    pub min_confidence: f32,
    /// Upper bound on detections republished per cycle
    pub max_detections: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 0.6,
            min_confidence: 0.25,
            max_detections: 100,
        }
    }
}

/// Overlay plugin settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub enabled: bool,
    pub order: f64,
    pub box_color: [f32; 4],
    pub box_thickness: f32,
    pub show_labels: bool,
    pub gaze_color: [f32; 4],
    pub gaze_radius: f32,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 0.9,
            box_color: [0.2, 0.5, 0.9, 1.0],
            box_thickness: 2.0,
            show_labels: true,
            gaze_color: [1.0, 0.2, 0.4, 0.8],
            gaze_radius: 20.0,
        }
    }
}

/// Message bus bridge settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub enabled: bool,
    pub order: f64,
    /// Node name, also the prefix of every topic
    pub node_name: String,
    /// Per-topic publisher queue depth
    pub queue_depth: usize,
    /// Pixel encoding announced on image messages
    pub image_encoding: String,
    pub depth_encoding: String,
    pub gaze_frame_id: String,
    pub publish_frame: bool,
    pub publish_depth: bool,
    pub publish_gaze: bool,
    pub publish_imu: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            order: 0.7,
            node_name: "PupilRosNode".to_string(),
            queue_depth: 10,
            image_encoding: "bgr8".to_string(),
            depth_encoding: "mono16".to_string(),
            gaze_frame_id: "gaze".to_string(),
            publish_frame: true,
            publish_depth: true,
            publish_gaze: true,
            publish_imu: false,
        }
    }
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        validate_node_name(&self.node_name)?;
        if self.queue_depth == 0 {
            return Err(Error::Configuration("queue_depth must be > 0".to_string()));
        }
        if self.image_encoding.is_empty() || self.depth_encoding.is_empty() {
            return Err(Error::Configuration("image encodings cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Node names follow the bus naming rules: ASCII letters, digits and
/// underscores, not starting with a digit.
pub fn validate_node_name(name: &str) -> Result<()> {
    let first = name
        .chars()
        .next()
        .ok_or_else(|| Error::Configuration("node name cannot be empty".to_string()))?;

    if first.is_ascii_digit() {
        return Err(Error::Configuration(format!(
            "node name '{}' cannot start with a digit",
            name
        )));
    }

    if let Some(bad) = name.chars().find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        return Err(Error::Configuration(format!(
            "node name '{}' contains invalid character '{}'",
            name, bad
        )));
    }

    Ok(())
}

/// Complete gazelink configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazelinkConfig {
    pub session: SessionConfig,
    pub detection: DetectionConfig,
    pub overlay: OverlayConfig,
    pub bridge: BridgeConfig,
}

impl GazelinkConfig {
    /// Load and validate configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from JSON, TOML or YAML text. When no format
    /// accepts the text, the error carries each parser's message.
    pub fn from_str(content: &str) -> Result<Self> {
        let json_err = match serde_json::from_str::<GazelinkConfig>(content) {
            Ok(config) => return Ok(config),
            Err(e) => e,
        };

        let toml_err = match toml::from_str::<GazelinkConfig>(content) {
            Ok(config) => return Ok(config),
            Err(e) => e,
        };

        match serde_yaml::from_str::<GazelinkConfig>(content) {
            Ok(config) => Ok(config),
            Err(yaml_err) => Err(Error::Serialization(format!(
                "configuration is not valid JSON ({}), TOML ({}) or YAML ({})",
                json_err,
                toml_err.to_string().trim_end(),
                yaml_err
            ))),
        }
    }

    /// Defaults overridden by environment variables.
    ///
    /// Values are taken as given; call [`GazelinkConfig::validate`] before
    /// use, an invalid `GAZELINK_NODE_NAME` is otherwise only rejected when
    /// the bridge node starts.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("GAZELINK_MIN_DATA_CONFIDENCE") {
            if let Ok(v) = value.parse::<f64>() {
                config.session.min_data_confidence = v;
            }
        }

        if let Ok(name) = std::env::var("GAZELINK_NODE_NAME") {
            config.bridge.node_name = name;
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        self.session.validate()?;
        self.bridge.validate()?;

        if !(0.0..=1.0).contains(&self.detection.min_confidence) {
            return Err(Error::Configuration(
                "detection.min_confidence must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.detection.max_detections == 0 {
            return Err(Error::Configuration(
                "detection.max_detections must be > 0".to_string(),
            ));
        }

        if self.overlay.gaze_radius.is_nan() || self.overlay.gaze_radius <= 0.0 {
            return Err(Error::Configuration(
                "overlay.gaze_radius must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
