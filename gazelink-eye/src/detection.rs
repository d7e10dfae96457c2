//! Object detection on the scene camera frame

use gazelink_core::{DetectedObject, DetectionConfig, Frame, Result, SessionConfig};
use gazelink_events::{Channel, ChannelPayload, EventBag, EventExtractor, Plugin};
use std::sync::Arc;
use tracing::debug;

/// Pretrained detector the pipeline delegates inference to
pub trait ObjectDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Detect objects in one frame; boxes are in frame pixels
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectedObject>>;
}

/// Detection pipeline: inference plus confidence and count limits
pub struct DetectionPipeline {
    detector: Arc<dyn ObjectDetector>,
    min_confidence: f32,
    max_detections: usize,
}

impl DetectionPipeline {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: &DetectionConfig) -> Self {
        Self {
            detector,
            min_confidence: config.min_confidence,
            max_detections: config.max_detections,
        }
    }

    /// Run the detector and keep the most confident valid detections
    pub fn detect(&self, frame: &Frame) -> Result<Vec<DetectedObject>> {
        debug!("Running object detection ({}) on {}x{} frame", self.detector.name(), frame.width(), frame.height());
        let raw = self.detector.detect(frame)?;
        let raw_count = raw.len();

        let mut detections: Vec<DetectedObject> = raw
            .into_iter()
            .filter(|d| d.confidence.is_finite() && d.confidence >= self.min_confidence)
            .filter(|d| d.bbox.is_valid())
            .collect();

        // stable: equal confidences keep detector order
        detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        detections.truncate(self.max_detections);

        debug!("Kept {} of {} detections", detections.len(), raw_count);
        Ok(detections)
    }
}

/// Runs detection on each scene frame and republishes the result under
/// the `objects` channel for later plugins.
pub struct ObjectDetectionPlugin {
    config: DetectionConfig,
    extractor: EventExtractor,
    pipeline: DetectionPipeline,
    frames_processed: u64,
}

impl ObjectDetectionPlugin {
    pub fn new(detector: Arc<dyn ObjectDetector>, config: DetectionConfig, session: SessionConfig) -> Self {
        let pipeline = DetectionPipeline::new(detector, &config);
        Self {
            config,
            extractor: EventExtractor::new(session),
            pipeline,
            frames_processed: 0,
        }
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }
}

impl Plugin for ObjectDetectionPlugin {
    fn name(&self) -> &str {
        "object_detection"
    }

    fn order(&self) -> f64 {
        self.config.order
    }

    fn on_cycle(&mut self, bag: &mut EventBag) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }

        let detections = match self.extractor.extract_frame(bag) {
            Some(frame) => self.pipeline.detect(frame)?,
            None => return Ok(()),
        };

        self.frames_processed += 1;
        bag.insert_channel(Channel::Objects, ChannelPayload::Objects(detections));
        Ok(())
    }
}
