//! gazelink-events: per-cycle event handling shared by all gazelink plugins
//!
//! The host hands every plugin one [`EventBag`] per processing cycle. The
//! [`EventExtractor`] pulls typed fields out of it (scene and depth frames,
//! gaze, IMU, detected objects), ranks gaze candidates and maps them into
//! pixel space. Plugins implement [`Plugin`] and are driven by a
//! [`PluginHost`].

pub mod bag;
pub mod extractor;
pub mod plugin;

pub use bag::{Channel, ChannelPayload, EventBag};
pub use extractor::{denormalize, DenormalizedGaze, EventExtractor, GazeOutcome};
pub use plugin::{Plugin, PluginHost};
