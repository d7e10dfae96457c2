//! Data carried through the host's event bag

use crate::error::{Error, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Camera image for one processing cycle.
///
/// Pixels are stored row-major with interleaved channels, the way the host
/// camera sources deliver them (BGR for the scene camera, single channel for
/// depth sensors).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: u32,
    height: u32,
    channels: u32,
    timestamp: f64,
    data: Bytes,
}

impl Frame {
    /// Create a frame, checking the buffer length against the dimensions
    pub fn new(width: u32, height: u32, channels: u32, timestamp: f64, data: impl Into<Bytes>) -> Result<Self> {
        let data = data.into();
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|px| px.checked_mul(channels as usize))
            .ok_or_else(|| Error::InvalidFrame(format!(
                "{}x{}x{} overflows the addressable size", width, height, channels
            )))?;

        if data.len() != expected {
            return Err(Error::InvalidFrame(format!(
                "buffer holds {} bytes, {}x{}x{} needs {}",
                data.len(), width, height, channels, expected
            )));
        }

        Ok(Self { width, height, channels, timestamp, data })
    }

    /// Frame with no pixels
    pub fn empty(timestamp: f64) -> Self {
        Self {
            width: 0,
            height: 0,
            channels: 0,
            timestamp,
            data: Bytes::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Row-major shape: (height, width, channels)
    pub fn shape(&self) -> (u32, u32, u32) {
        (self.height, self.width, self.channels)
    }

    /// Image size as (width, height)
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Bytes per row
    pub fn step(&self) -> u32 {
        self.width.saturating_mul(self.channels)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw pixel buffer. Cloning the returned `Bytes` does not copy pixels.
    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// One gaze estimate. `norm_pos` lives in the unit square with its origin
/// at the bottom-left corner of the scene image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeCandidate {
    pub confidence: f64,
    pub norm_pos: (f64, f64),
    #[serde(default)]
    pub timestamp: f64,
}

impl GazeCandidate {
    pub fn new(confidence: f64, norm_pos: (f64, f64)) -> Self {
        Self {
            confidence,
            norm_pos,
            timestamp: 0.0,
        }
    }
}

/// Raw IMU reading, forwarded without interpretation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    pub timestamp: f64,
    /// Angular velocity, deg/s
    pub gyro: [f64; 3],
    /// Linear acceleration, g
    pub accel: [f64; 3],
}

/// Axis-aligned box in pixel space, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Build from two corner points given in any order
    pub fn from_corners(a: (f32, f32), b: (f32, f32)) -> Self {
        let x = a.0.min(b.0);
        let y = a.1.min(b.1);
        Self {
            x,
            y,
            width: (a.0 - b.0).abs(),
            height: (a.1 - b.1).abs(),
        }
    }

    /// (top-left, bottom-right)
    pub fn corners(&self) -> ((f32, f32), (f32, f32)) {
        ((self.x, self.y), (self.x + self.width, self.y + self.height))
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Finite coordinates and non-negative extent
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Object reported by an external detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub class_id: usize,
    pub class_name: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}
