//! Overlay of detections and gaze on the scene view

use gazelink_core::{OverlayConfig, Result, SessionConfig};
use gazelink_events::{denormalize, EventBag, EventExtractor, Plugin};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

/// Primitive handed to the host renderer. Coordinates are scene frame
/// pixels with a top-left origin; colors are RGBA in 0.0-1.0.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        top_left: (f32, f32),
        bottom_right: (f32, f32),
        color: [f32; 4],
        thickness: f32,
    },
    Label {
        position: (f32, f32),
        text: String,
        color: [f32; 4],
    },
    Circle {
        center: (f32, f32),
        radius: f32,
        color: [f32; 4],
    },
}

/// Renderer-side receiver of draw commands
pub trait OverlaySink: Send {
    fn draw(&mut self, commands: &[DrawCommand]);
}

/// Sink that records the commands of the last render
#[derive(Debug, Clone, Default)]
pub struct CommandBuffer {
    commands: Arc<RwLock<Vec<DrawCommand>>>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.commands.read().clone()
    }
}

impl OverlaySink for CommandBuffer {
    fn draw(&mut self, commands: &[DrawCommand]) {
        *self.commands.write() = commands.to_vec();
    }
}

/// Builds draw commands every cycle and flushes them on render
pub struct OverlayPlugin {
    config: OverlayConfig,
    extractor: EventExtractor,
    sink: Box<dyn OverlaySink>,
    pending: Vec<DrawCommand>,
}

impl OverlayPlugin {
    pub fn new(config: OverlayConfig, session: SessionConfig, sink: Box<dyn OverlaySink>) -> Self {
        Self {
            config,
            extractor: EventExtractor::new(session),
            sink,
            pending: Vec::new(),
        }
    }

    /// Commands waiting for the next render
    pub fn pending(&self) -> &[DrawCommand] {
        &self.pending
    }

    fn build_commands(&mut self, bag: &EventBag) -> Vec<DrawCommand> {
        // only needed for its size
        let _ = self.extractor.extract_frame(bag);
        let mut commands = Vec::new();

        if let Some(objects) = self.extractor.extract_objects(bag) {
            for object in objects {
                let (top_left, bottom_right) = object.bbox.corners();
                commands.push(DrawCommand::Rect {
                    top_left,
                    bottom_right,
                    color: self.config.box_color,
                    thickness: self.config.box_thickness,
                });
                if self.config.show_labels {
                    commands.push(DrawCommand::Label {
                        position: top_left,
                        text: format!("{} {:.2}", object.class_name, object.confidence),
                        color: self.config.box_color,
                    });
                }
            }
        }

        match (self.extractor.cached_frame_size(), self.extractor.confident_gaze(bag)) {
            (Some(size), Some(gaze)) => {
                for candidate in gaze {
                    let (x, y) = denormalize(candidate.norm_pos, size);
                    commands.push(DrawCommand::Circle {
                        center: (x as f32, y as f32),
                        radius: self.config.gaze_radius,
                        color: self.config.gaze_color,
                    });
                }
            }
            (None, Some(_)) => debug!("Skipping gaze overlay: frame size unknown"),
            _ => {}
        }

        commands
    }
}

impl Plugin for OverlayPlugin {
    fn name(&self) -> &str {
        "overlay"
    }

    fn order(&self) -> f64 {
        self.config.order
    }

    fn on_cycle(&mut self, bag: &mut EventBag) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        self.pending = self.build_commands(bag);
        trace!("Overlay prepared {} draw commands", self.pending.len());
        Ok(())
    }

    fn on_render(&mut self) {
        self.sink.draw(&self.pending);
    }

    fn on_detach(&mut self) {
        self.pending.clear();
        self.sink.draw(&[]);
    }
}
