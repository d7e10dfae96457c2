//! Event field extraction and gaze enrichment

use crate::bag::{Channel, ChannelPayload, EventBag};
use gazelink_core::{DetectedObject, Frame, GazeCandidate, ImuSample, SessionConfig};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Gaze candidate mapped into pixel space of the scene frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenormalizedGaze {
    pub candidate: GazeCandidate,
    /// Pixel position, top-left origin
    pub denormalized_position: (f64, f64),
    /// (width, height) the position was computed against
    pub frame_size_used: (u32, u32),
}

/// Result of picking the best gaze candidate for a cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GazeOutcome {
    /// No gaze channel, or an empty one
    NoGaze,
    /// Gaze arrived before any scene frame, so it cannot be mapped to pixels
    FrameSizeUnknown,
    Selected(DenormalizedGaze),
}

impl GazeOutcome {
    pub fn selected(&self) -> Option<&DenormalizedGaze> {
        match self {
            GazeOutcome::Selected(gaze) => Some(gaze),
            _ => None,
        }
    }

    pub fn into_selected(self) -> Option<DenormalizedGaze> {
        match self {
            GazeOutcome::Selected(gaze) => Some(gaze),
            _ => None,
        }
    }
}

/// Map unit-square coordinates (origin bottom-left) into pixel coordinates
/// (origin top-left) of an image with the given (width, height).
pub fn denormalize(norm_pos: (f64, f64), size: (u32, u32)) -> (f64, f64) {
    let (width, height) = (size.0 as f64, size.1 as f64);
    (norm_pos.0 * width, (1.0 - norm_pos.1) * height)
}

/// Reads typed fields out of the host's event bag.
///
/// Scene and depth frame sizes are remembered across cycles so gaze can be
/// denormalized on cycles that carry gaze but no frame. One extractor is
/// meant to be owned by one plugin and driven from one thread.
#[derive(Debug, Clone)]
pub struct EventExtractor {
    session: SessionConfig,
    cached_frame_size: Option<(u32, u32)>,
    cached_depth_frame_size: Option<(u32, u32)>,
}

impl EventExtractor {
    pub fn new(session: SessionConfig) -> Self {
        Self {
            session,
            cached_frame_size: None,
            cached_depth_frame_size: None,
        }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    /// Scene frame (width, height) seen last, if any
    pub fn cached_frame_size(&self) -> Option<(u32, u32)> {
        self.cached_frame_size
    }

    /// Depth frame (width, height) seen last, if any
    pub fn cached_depth_frame_size(&self) -> Option<(u32, u32)> {
        self.cached_depth_frame_size
    }

    /// Scene camera frame of this cycle. Records its size on success.
    pub fn extract_frame<'a>(&mut self, bag: &'a EventBag) -> Option<&'a Frame> {
        let frame = frame_in(bag, Channel::Frame)?;
        self.cached_frame_size = Some(frame.size());
        Some(frame)
    }

    /// Depth camera frame of this cycle. Records its size on success.
    pub fn extract_depth_frame<'a>(&mut self, bag: &'a EventBag) -> Option<&'a Frame> {
        let frame = frame_in(bag, Channel::DepthFrame)?;
        self.cached_depth_frame_size = Some(frame.size());
        Some(frame)
    }

    /// Highest-confidence gaze candidate, denormalized against the last
    /// scene frame size. No confidence threshold is applied; ties go to the
    /// candidate that comes first.
    pub fn extract_best_gaze(&self, bag: &EventBag) -> GazeOutcome {
        let candidates = match gaze_in(bag) {
            Some(candidates) => candidates,
            None => return GazeOutcome::NoGaze,
        };

        let size = match self.cached_frame_size {
            Some(size) => size,
            None => {
                warn!(
                    "Dropping {} gaze candidates: no scene frame seen yet, frame size unknown",
                    candidates.len()
                );
                return GazeOutcome::FrameSizeUnknown;
            }
        };

        let best = candidates
            .iter()
            .skip(1)
            .fold(&candidates[0], |best, candidate| {
                if ranks_above(candidate.confidence, best.confidence) {
                    candidate
                } else {
                    best
                }
            });

        GazeOutcome::Selected(DenormalizedGaze {
            candidate: *best,
            denormalized_position: denormalize(best.norm_pos, size),
            frame_size_used: size,
        })
    }

    /// Every gaze candidate meeting the session's `min_data_confidence`,
    /// produced lazily in bag order.
    pub fn confident_gaze<'a>(&self, bag: &'a EventBag) -> Option<impl Iterator<Item = &'a GazeCandidate> + 'a> {
        let min_confidence = self.session.min_data_confidence;
        let candidates = gaze_in(bag)?;
        Some(candidates.iter().filter(move |g| g.confidence >= min_confidence))
    }

    /// IMU samples of this cycle, unmodified
    pub fn extract_imu<'a>(&self, bag: &'a EventBag) -> Option<&'a [ImuSample]> {
        match bag.get_channel(Channel::Imu) {
            Some(ChannelPayload::Imu(samples)) if !samples.is_empty() => Some(samples.as_slice()),
            other => {
                debug!("No IMU data ({})", describe(other));
                None
            }
        }
    }

    /// Detected objects of this cycle, unmodified
    pub fn extract_objects<'a>(&self, bag: &'a EventBag) -> Option<&'a [DetectedObject]> {
        match bag.get_channel(Channel::Objects) {
            Some(ChannelPayload::Objects(objects)) if !objects.is_empty() => Some(objects.as_slice()),
            other => {
                debug!("No detected objects ({})", describe(other));
                None
            }
        }
    }

    /// Names of the channels present in the bag
    pub fn list_channel_names(&self, bag: &EventBag) -> BTreeSet<String> {
        bag.keys()
    }
}

fn frame_in(bag: &EventBag, channel: Channel) -> Option<&Frame> {
    match bag.get_channel(channel) {
        Some(ChannelPayload::Frame(frame)) => Some(frame),
        Some(ChannelPayload::Null) | None => None,
        Some(other) => {
            debug!("Ignoring '{}' channel carrying {} payload", channel, other.kind());
            None
        }
    }
}

fn gaze_in(bag: &EventBag) -> Option<&[GazeCandidate]> {
    match bag.get_channel(Channel::Gaze) {
        Some(ChannelPayload::Gaze(candidates)) if !candidates.is_empty() => Some(candidates.as_slice()),
        Some(ChannelPayload::Gaze(_)) | Some(ChannelPayload::Null) | None => None,
        Some(other) => {
            debug!("Ignoring 'gaze' channel carrying {} payload", other.kind());
            None
        }
    }
}

/// NaN ranks below every number
fn ranks_above(candidate: f64, best: f64) -> bool {
    if best.is_nan() {
        !candidate.is_nan()
    } else {
        candidate > best
    }
}

fn describe(payload: Option<&ChannelPayload>) -> &'static str {
    match payload {
        None => "channel absent",
        Some(p) if p.is_falsy() => "channel empty",
        Some(p) => p.kind(),
    }
}
