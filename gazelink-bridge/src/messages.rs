//! Bus message types, laid out after the common robotics sensor messages

use bytes::Bytes;
use chrono::{DateTime, Utc};
use gazelink_core::{Error, Frame, ImuSample, Result};
use gazelink_events::DenormalizedGaze;
use serde::{Deserialize, Serialize};

const DEG_TO_RAD: f64 = std::f64::consts::PI / 180.0;
const STANDARD_GRAVITY: f64 = 9.80665;

/// Wall-clock stamp split into seconds and nanoseconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

impl Time {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Seconds saturate at the i32 range
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        let sec = at.timestamp().clamp(i32::MIN as i64, i32::MAX as i64) as i32;
        Self {
            sec,
            nanosec: at.timestamp_subsec_nanos(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub stamp: Time,
    pub frame_id: String,
}

impl Header {
    pub fn new(stamp: Time, frame_id: impl Into<String>) -> Self {
        Self {
            stamp,
            frame_id: frame_id.into(),
        }
    }
}

/// Raw image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMessage {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub encoding: String,
    pub is_bigendian: u8,
    /// Row length in bytes
    pub step: u32,
    pub data: Bytes,
}

impl ImageMessage {
    /// Wrap a frame without copying its pixels
    pub fn from_frame(frame: &Frame, encoding: &str, header: Header) -> Result<Self> {
        let expected = encoding_channels(encoding)
            .ok_or_else(|| Error::Bus(format!("unsupported image encoding '{}'", encoding)))?;

        if frame.channels() != expected {
            return Err(Error::Bus(format!(
                "encoding '{}' needs {} channels, frame has {}",
                encoding,
                expected,
                frame.channels()
            )));
        }

        Ok(Self {
            header,
            height: frame.height(),
            width: frame.width(),
            encoding: encoding.to_string(),
            is_bigendian: 0,
            step: frame.step(),
            data: frame.data().clone(),
        })
    }
}

/// Interleaved channel count for an encoding name
fn encoding_channels(encoding: &str) -> Option<u32> {
    match encoding {
        "bgr8" | "rgb8" => Some(3),
        "bgra8" | "rgba8" => Some(4),
        "mono8" => Some(1),
        // 16-bit depth is carried as two bytes per pixel in a single-channel frame
        "mono16" | "16UC1" => Some(2),
        _ => None,
    }
}

/// Image geometry published next to each image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraInfoMessage {
    pub header: Header,
    pub height: u32,
    pub width: u32,
}

impl CameraInfoMessage {
    pub fn from_frame(frame: &Frame, header: Header) -> Self {
        Self {
            header,
            height: frame.height(),
            width: frame.width(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

/// Gaze point in scene image pixels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeStamped {
    pub header: Header,
    pub gaze: Point2,
    pub image_size: ImageSize,
    pub confidence: f64,
}

impl GazeStamped {
    pub fn from_gaze(gaze: &DenormalizedGaze, header: Header) -> Self {
        let (x, y) = gaze.denormalized_position;
        let (width, height) = gaze.frame_size_used;
        Self {
            header,
            gaze: Point2 { x, y },
            image_size: ImageSize { width, height },
            confidence: gaze.candidate.confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    fn scaled(v: [f64; 3], factor: f64) -> Self {
        Self {
            x: v[0] * factor,
            y: v[1] * factor,
            z: v[2] * factor,
        }
    }
}

/// IMU reading in SI units (rad/s, m/s^2)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuMessage {
    pub header: Header,
    pub angular_velocity: Vector3,
    pub linear_acceleration: Vector3,
}

impl ImuMessage {
    /// Converts the tracker's deg/s and g readings
    pub fn from_sample(sample: &ImuSample, header: Header) -> Self {
        Self {
            header,
            angular_velocity: Vector3::scaled(sample.gyro, DEG_TO_RAD),
            linear_acceleration: Vector3::scaled(sample.accel, STANDARD_GRAVITY),
        }
    }
}

/// Any message the bridge publishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "msg")]
pub enum BusMessage {
    Image(ImageMessage),
    CameraInfo(CameraInfoMessage),
    Gaze(GazeStamped),
    Imu(ImuMessage),
}

impl BusMessage {
    pub fn header(&self) -> &Header {
        match self {
            BusMessage::Image(m) => &m.header,
            BusMessage::CameraInfo(m) => &m.header,
            BusMessage::Gaze(m) => &m.header,
            BusMessage::Imu(m) => &m.header,
        }
    }

    /// Message type name on the bus
    pub fn type_name(&self) -> &'static str {
        match self {
            BusMessage::Image(_) => "sensor_msgs/Image",
            BusMessage::CameraInfo(_) => "sensor_msgs/CameraInfo",
            BusMessage::Gaze(_) => "pupil_labs_ros2_msgs/GazeStamped",
            BusMessage::Imu(_) => "sensor_msgs/Imu",
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }
}
