//! Named bridge node owning the advertised topics

use crate::bus::MessageBus;
use crate::messages::BusMessage;
use gazelink_core::{validate_node_name, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Topic names derived from a node name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTopics {
    pub frame_image: String,
    pub frame_info: String,
    pub depth_image: String,
    pub gaze: String,
    pub imu: String,
}

impl NodeTopics {
    pub fn for_node(name: &str) -> Self {
        Self {
            frame_image: format!("{}/frame/image", name),
            frame_info: format!("{}/frame/info", name),
            depth_image: format!("{}/depth/image", name),
            gaze: format!("{}/gaze", name),
            imu: format!("{}/imu", name),
        }
    }

    pub fn all(&self) -> [&str; 5] {
        [
            self.frame_image.as_str(),
            self.frame_info.as_str(),
            self.depth_image.as_str(),
            self.gaze.as_str(),
            self.imu.as_str(),
        ]
    }
}

/// A node on the bus. Its topics stay advertised for as long as it lives.
pub struct BridgeNode {
    name: String,
    depth: usize,
    bus: Arc<dyn MessageBus>,
    topics: NodeTopics,
}

impl BridgeNode {
    pub fn new(name: &str, bus: Arc<dyn MessageBus>, depth: usize) -> Result<Self> {
        validate_node_name(name)?;
        let topics = NodeTopics::for_node(name);
        advertise_all(bus.as_ref(), &topics, depth)?;

        info!("Bridge node '{}' started", name);
        Ok(Self {
            name: name.to_string(),
            depth,
            bus,
            topics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topics(&self) -> &NodeTopics {
        &self.topics
    }

    /// Restart the node under a new name. On any failure the node keeps its
    /// current name and topics. Topics shared with another node of the new
    /// name stay up for that node.
    pub fn rename(&mut self, new_name: &str) -> Result<()> {
        if new_name == self.name {
            return Ok(());
        }
        validate_node_name(new_name)?;

        let topics = NodeTopics::for_node(new_name);
        advertise_all(self.bus.as_ref(), &topics, self.depth)?;
        unadvertise_all(self.bus.as_ref(), &self.topics);

        info!("Bridge node '{}' restarted as '{}'", self.name, new_name);
        self.name = new_name.to_string();
        self.topics = topics;
        Ok(())
    }

    pub fn publish(&self, topic: &str, message: BusMessage) -> Result<usize> {
        self.bus.publish(topic, message)
    }
}

impl Drop for BridgeNode {
    fn drop(&mut self) {
        unadvertise_all(self.bus.as_ref(), &self.topics);
    }
}

fn advertise_all(bus: &dyn MessageBus, topics: &NodeTopics, depth: usize) -> Result<()> {
    let all = topics.all();
    for (index, topic) in all.iter().enumerate() {
        if let Err(e) = bus.advertise(topic, depth) {
            warn!("Failed to advertise {}: {}", topic, e);
            for advertised in &all[..index] {
                bus.unadvertise(advertised);
            }
            return Err(e);
        }
    }
    Ok(())
}

fn unadvertise_all(bus: &dyn MessageBus, topics: &NodeTopics) {
    for topic in topics.all() {
        bus.unadvertise(topic);
    }
}
