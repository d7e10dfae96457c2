//! Property tests for the event extractor

use gazelink_core::{Frame, GazeCandidate, SessionConfig};
use gazelink_events::{denormalize, ChannelPayload, EventBag, EventExtractor, GazeOutcome};
use proptest::prelude::*;

fn gaze_strategy() -> impl Strategy<Value = GazeCandidate> {
    (0.0f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0)
        .prop_map(|(confidence, x, y)| GazeCandidate::new(confidence, (x, y)))
}

proptest! {
    #[test]
    fn frame_size_is_width_height(width in 0u32..64, height in 0u32..64) {
        let mut extractor = EventExtractor::new(SessionConfig::default());
        let data = vec![0u8; (width * height * 3) as usize];
        let frame = Frame::new(width, height, 3, 0.0, data).unwrap();
        let bag = EventBag::new().with_frame(frame);

        let extracted = extractor.extract_frame(&bag).unwrap();
        prop_assert_eq!(extracted.shape(), (height, width, 3));
        prop_assert_eq!(extractor.cached_frame_size(), Some((width, height)));
    }

    #[test]
    fn missing_frame_never_touches_cache(width in 1u32..32, height in 1u32..32, null in any::<bool>()) {
        let mut extractor = EventExtractor::new(SessionConfig::default());
        let frame = Frame::new(width, height, 1, 0.0, vec![0u8; (width * height) as usize]).unwrap();
        extractor.extract_frame(&EventBag::new().with_frame(frame));

        let mut bag = EventBag::new().with_gaze(vec![GazeCandidate::new(0.5, (0.5, 0.5))]);
        if null {
            bag.insert("frame", ChannelPayload::Null);
        }
        prop_assert!(extractor.extract_frame(&bag).is_none());
        prop_assert_eq!(extractor.cached_frame_size(), Some((width, height)));
    }

    #[test]
    fn best_gaze_without_frame_is_unknown(candidates in prop::collection::vec(gaze_strategy(), 1..20)) {
        let extractor = EventExtractor::new(SessionConfig::default());
        let bag = EventBag::new().with_gaze(candidates);
        prop_assert_eq!(extractor.extract_best_gaze(&bag), GazeOutcome::FrameSizeUnknown);
    }

    #[test]
    fn best_gaze_is_first_maximum(
        candidates in prop::collection::vec(gaze_strategy(), 1..20),
        width in 1u32..2000,
        height in 1u32..2000,
    ) {
        let mut extractor = EventExtractor::new(SessionConfig::default());
        let frame = Frame::new(width, height, 0, 0.0, Vec::<u8>::new()).unwrap();
        extractor.extract_frame(&EventBag::new().with_frame(frame));

        let max = candidates.iter().map(|c| c.confidence).fold(f64::MIN, f64::max);
        let first_max = candidates.iter().position(|c| c.confidence == max).unwrap();

        let bag = EventBag::new().with_gaze(candidates.clone());
        let selected = extractor.extract_best_gaze(&bag).into_selected().unwrap();

        prop_assert_eq!(selected.candidate, candidates[first_max]);
        prop_assert_eq!(selected.frame_size_used, (width, height));
        prop_assert_eq!(
            selected.denormalized_position,
            denormalize(candidates[first_max].norm_pos, (width, height))
        );
    }

    #[test]
    fn denormalized_gaze_stays_in_frame(x in 0.0f64..=1.0, y in 0.0f64..=1.0, width in 1u32..4000, height in 1u32..4000) {
        let (px, py) = denormalize((x, y), (width, height));
        prop_assert!(px >= 0.0 && px <= width as f64);
        prop_assert!(py >= 0.0 && py <= height as f64);
    }

    #[test]
    fn confident_gaze_respects_threshold(
        candidates in prop::collection::vec(gaze_strategy(), 1..20),
        threshold in 0.0f64..=1.0,
    ) {
        let extractor = EventExtractor::new(SessionConfig { min_data_confidence: threshold });
        let bag = EventBag::new().with_gaze(candidates.clone());
        let kept: Vec<GazeCandidate> = extractor.confident_gaze(&bag).unwrap().copied().collect();
        let expected: Vec<GazeCandidate> = candidates.into_iter().filter(|c| c.confidence >= threshold).collect();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn channel_listing_is_idempotent(keys in prop::collection::btree_set("[a-z_]{1,12}", 0..10)) {
        let extractor = EventExtractor::new(SessionConfig::default());
        let mut bag = EventBag::new();
        for key in &keys {
            bag.insert(key.clone(), ChannelPayload::Null);
        }
        let before = bag.clone();

        let first = extractor.list_channel_names(&bag);
        let second = extractor.list_channel_names(&bag);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first, keys);
        prop_assert_eq!(bag, before);
    }
}
