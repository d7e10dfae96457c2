//! gazelink-core: shared types for the gazelink plugins
//!
//! Holds the data carried through the host's per-cycle event bag (scene and
//! depth frames, gaze candidates, IMU samples, detected objects), the
//! workspace-wide error type and the plugin configuration.

pub mod types;
pub mod error;
pub mod config;

pub use error::{Error, Result};
pub use types::{BoundingBox, DetectedObject, Frame, GazeCandidate, ImuSample};
pub use config::{
    validate_node_name, BridgeConfig, DetectionConfig, GazelinkConfig, OverlayConfig,
    SessionConfig,
};
