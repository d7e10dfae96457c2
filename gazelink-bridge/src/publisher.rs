//! Plugin that republishes each cycle's tracker data on the bus

use crate::bus::MessageBus;
use crate::messages::{
    BusMessage, CameraInfoMessage, GazeStamped, Header, ImageMessage, ImuMessage, Time,
};
use crate::node::BridgeNode;
use gazelink_core::{BridgeConfig, Frame, Result, SessionConfig};
use gazelink_events::{EventBag, EventExtractor, GazeOutcome, Plugin};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Publishes the scene frame with its camera info, the depth frame, the
/// best gaze estimate and optionally IMU samples under the node's topics.
pub struct BusPublisherPlugin {
    config: BridgeConfig,
    extractor: EventExtractor,
    node: BridgeNode,
    published: u64,
}

impl BusPublisherPlugin {
    pub fn new(bus: Arc<dyn MessageBus>, config: BridgeConfig, session: SessionConfig) -> Result<Self> {
        config.validate()?;
        let node = BridgeNode::new(&config.node_name, bus, config.queue_depth)?;
        Ok(Self {
            config,
            extractor: EventExtractor::new(session),
            node,
            published: 0,
        })
    }

    pub fn node(&self) -> &BridgeNode {
        &self.node
    }

    /// Restart the bridge node under a new name
    pub fn rename_node(&mut self, name: &str) -> Result<()> {
        self.node.rename(name)?;
        self.config.node_name = name.to_string();
        Ok(())
    }

    /// Messages handed to the bus so far
    pub fn published(&self) -> u64 {
        self.published
    }

    fn send(&mut self, topic: &str, message: BusMessage) -> Result<()> {
        let receivers = self.node.publish(topic, message)?;
        self.published += 1;
        trace!("Published on {} to {} subscribers", topic, receivers);
        Ok(())
    }

    fn publish_frame(&mut self, frame: &Frame, stamp: Time) -> Result<()> {
        let header = Header::new(stamp, "frame");
        let image = ImageMessage::from_frame(frame, &self.config.image_encoding, header.clone())?;
        let info = CameraInfoMessage::from_frame(frame, header);

        let topics = self.node.topics().clone();
        self.send(&topics.frame_image, BusMessage::Image(image))?;
        self.send(&topics.frame_info, BusMessage::CameraInfo(info))
    }

    fn publish_depth(&mut self, frame: &Frame, stamp: Time) -> Result<()> {
        let header = Header::new(stamp, "depth");
        let image = ImageMessage::from_frame(frame, &self.config.depth_encoding, header)?;
        let topic = self.node.topics().depth_image.clone();
        self.send(&topic, BusMessage::Image(image))
    }
}

impl Plugin for BusPublisherPlugin {
    fn name(&self) -> &str {
        "bus_publisher"
    }

    fn order(&self) -> f64 {
        self.config.order
    }

    /// Every enabled stream is attempted; the first failure is returned
    /// after the rest have been published.
    fn on_cycle(&mut self, bag: &mut EventBag) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let stamp = Time::now();
        let mut first_error = None;
        let mut record = |result: Result<()>| {
            if let Err(e) = result {
                warn!("Bus publish failed: {}", e);
                first_error.get_or_insert(e);
            }
        };

        // extracted regardless of publish_frame so the gaze has a frame size
        match self.extractor.extract_frame(bag) {
            Some(frame) if self.config.publish_frame => record(self.publish_frame(frame, stamp)),
            Some(_) => {}
            None => debug!("No frame data available"),
        }

        if self.config.publish_depth {
            match self.extractor.extract_depth_frame(bag) {
                Some(frame) => record(self.publish_depth(frame, stamp)),
                None => debug!("No depth frame data available"),
            }
        }

        if self.config.publish_gaze {
            match self.extractor.extract_best_gaze(bag) {
                GazeOutcome::Selected(gaze) => {
                    let header = Header::new(stamp, self.config.gaze_frame_id.as_str());
                    let message = BusMessage::Gaze(GazeStamped::from_gaze(&gaze, header));
                    let topic = self.node.topics().gaze.clone();
                    record(self.send(&topic, message));
                }
                GazeOutcome::NoGaze => debug!("No gaze data available"),
                GazeOutcome::FrameSizeUnknown => debug!("Gaze not published, frame size unknown"),
            }
        }

        if self.config.publish_imu {
            if let Some(samples) = self.extractor.extract_imu(bag) {
                let topic = self.node.topics().imu.clone();
                for sample in samples {
                    let message = ImuMessage::from_sample(sample, Header::new(stamp, "imu"));
                    record(self.send(&topic, BusMessage::Imu(message)));
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
