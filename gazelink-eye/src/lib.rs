//! gazelink-eye: scene-camera plugins
//!
//! Object detection on the scene frame (the detector model itself is
//! supplied by the caller) and the overlay that turns detections and gaze
//! into draw commands for the host's renderer.

pub mod detection;
pub mod overlay;

pub use detection::{DetectionPipeline, ObjectDetectionPlugin, ObjectDetector};
pub use overlay::{CommandBuffer, DrawCommand, OverlayPlugin, OverlaySink};
