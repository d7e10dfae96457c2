//! gazelink-bridge: republishes tracker data onto a robotics message bus
//!
//! Scene and depth frames, camera info, the best gaze estimate and IMU
//! samples are converted into bus messages and published on topics
//! prefixed with the bridge node's name.

pub mod messages;
pub mod bus;
pub mod node;
pub mod publisher;

pub use bus::{BroadcastBus, MessageBus};
pub use messages::{
    BusMessage, CameraInfoMessage, GazeStamped, Header, ImageMessage, ImuMessage, Time,
};
pub use node::{BridgeNode, NodeTopics};
pub use publisher::BusPublisherPlugin;
