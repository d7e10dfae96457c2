//! Per-cycle event bag

use gazelink_core::{DetectedObject, Frame, GazeCandidate, ImuSample};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Channels the plugins know how to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Frame,
    DepthFrame,
    Gaze,
    Imu,
    Objects,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Frame,
        Channel::DepthFrame,
        Channel::Gaze,
        Channel::Imu,
        Channel::Objects,
    ];

    /// Key used in the event bag
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Frame => "frame",
            Channel::DepthFrame => "depth_frame",
            Channel::Gaze => "gaze",
            Channel::Imu => "imu",
            Channel::Objects => "objects",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == name)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload stored under one channel key
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelPayload {
    Frame(Frame),
    Gaze(Vec<GazeCandidate>),
    Imu(Vec<ImuSample>),
    Objects(Vec<DetectedObject>),
    /// Key is present but carries no value
    Null,
    /// Host data no plugin interprets
    Other(JsonValue),
}

impl ChannelPayload {
    /// Whether the payload counts as "no data".
    ///
    /// Frames are never falsy, even without pixels; a null value, an empty
    /// collection or an empty/false/zero JSON value is.
    pub fn is_falsy(&self) -> bool {
        match self {
            ChannelPayload::Frame(_) => false,
            ChannelPayload::Gaze(g) => g.is_empty(),
            ChannelPayload::Imu(s) => s.is_empty(),
            ChannelPayload::Objects(o) => o.is_empty(),
            ChannelPayload::Null => true,
            ChannelPayload::Other(value) => match value {
                JsonValue::Null => true,
                JsonValue::Bool(b) => !b,
                JsonValue::Number(n) => n.as_f64() == Some(0.0),
                JsonValue::String(s) => s.is_empty(),
                JsonValue::Array(a) => a.is_empty(),
                JsonValue::Object(o) => o.is_empty(),
            },
        }
    }

    /// Short variant name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            ChannelPayload::Frame(_) => "frame",
            ChannelPayload::Gaze(_) => "gaze",
            ChannelPayload::Imu(_) => "imu",
            ChannelPayload::Objects(_) => "objects",
            ChannelPayload::Null => "null",
            ChannelPayload::Other(_) => "other",
        }
    }
}

/// Mapping from channel name to payload, delivered once per host cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventBag {
    channels: BTreeMap<String, ChannelPayload>,
}

impl EventBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.insert_channel(Channel::Frame, ChannelPayload::Frame(frame));
        self
    }

    pub fn with_depth_frame(mut self, frame: Frame) -> Self {
        self.insert_channel(Channel::DepthFrame, ChannelPayload::Frame(frame));
        self
    }

    pub fn with_gaze(mut self, gaze: Vec<GazeCandidate>) -> Self {
        self.insert_channel(Channel::Gaze, ChannelPayload::Gaze(gaze));
        self
    }

    pub fn with_imu(mut self, samples: Vec<ImuSample>) -> Self {
        self.insert_channel(Channel::Imu, ChannelPayload::Imu(samples));
        self
    }

    pub fn with_objects(mut self, objects: Vec<DetectedObject>) -> Self {
        self.insert_channel(Channel::Objects, ChannelPayload::Objects(objects));
        self
    }

    /// Insert under an arbitrary key, returning the replaced payload
    pub fn insert(&mut self, key: impl Into<String>, payload: ChannelPayload) -> Option<ChannelPayload> {
        self.channels.insert(key.into(), payload)
    }

    pub fn insert_channel(&mut self, channel: Channel, payload: ChannelPayload) -> Option<ChannelPayload> {
        self.insert(channel.as_str(), payload)
    }

    pub fn get(&self, key: &str) -> Option<&ChannelPayload> {
        self.channels.get(key)
    }

    pub fn get_channel(&self, channel: Channel) -> Option<&ChannelPayload> {
        self.get(channel.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<ChannelPayload> {
        self.channels.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.channels.contains_key(key)
    }

    /// Keys currently present, sorted
    pub fn keys(&self) -> BTreeSet<String> {
        self.channels.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_names_round_trip() {
        for channel in Channel::ALL {
            assert_eq!(Channel::from_name(channel.as_str()), Some(channel));
        }
        assert_eq!(Channel::from_name("pupil"), None);
        assert_eq!(Channel::DepthFrame.to_string(), "depth_frame");
    }

    #[test]
    fn test_falsy_payloads() {
        assert!(ChannelPayload::Null.is_falsy());
        assert!(ChannelPayload::Gaze(vec![]).is_falsy());
        assert!(ChannelPayload::Imu(vec![]).is_falsy());
        assert!(ChannelPayload::Objects(vec![]).is_falsy());
        assert!(ChannelPayload::Other(json!(null)).is_falsy());
        assert!(ChannelPayload::Other(json!(false)).is_falsy());
        assert!(ChannelPayload::Other(json!(0)).is_falsy());
        assert!(ChannelPayload::Other(json!("")).is_falsy());
        assert!(ChannelPayload::Other(json!([])).is_falsy());
        assert!(ChannelPayload::Other(json!({})).is_falsy());

        assert!(!ChannelPayload::Frame(Frame::empty(0.0)).is_falsy());
        assert!(!ChannelPayload::Gaze(vec![GazeCandidate::new(0.1, (0.5, 0.5))]).is_falsy());
        assert!(!ChannelPayload::Other(json!({"fps": 30})).is_falsy());
    }

    #[test]
    fn test_insert_replaces() {
        let mut bag = EventBag::new().with_objects(vec![]);
        let previous = bag.insert_channel(Channel::Objects, ChannelPayload::Null);
        assert_eq!(previous, Some(ChannelPayload::Objects(vec![])));
        assert_eq!(bag.get_channel(Channel::Objects), Some(&ChannelPayload::Null));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_keys_sorted_and_include_unknown() {
        let mut bag = EventBag::new()
            .with_gaze(vec![])
            .with_frame(Frame::empty(0.0));
        bag.insert("fixations", ChannelPayload::Other(json!([])));

        let keys: Vec<String> = bag.keys().into_iter().collect();
        assert_eq!(keys, vec!["fixations", "frame", "gaze"]);
    }

    #[test]
    fn test_remove_and_contains() {
        let mut bag = EventBag::new().with_imu(vec![]);
        assert!(bag.contains("imu"));
        assert!(bag.remove("imu").is_some());
        assert!(!bag.contains("imu"));
        assert!(bag.is_empty());
    }
}
