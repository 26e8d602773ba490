//! Frame analyzer: landmark sets in, blink events out

use std::collections::HashMap;

use tracing::{debug, info};

use crate::analysis::{FaceAnalysis, FaceKey, FrameAnalysis};
use crate::config::{BlinkConfig, FaceTracking};
use crate::ear::face_ear;
use crate::geometry::BoundingBox;
use crate::landmarks::{EyeSide, LandmarkSet};
use crate::state::BlinkState;
use crate::DetectionError;

/// Blink state plus the last frame its face was seen in
#[derive(Debug, Clone, Copy)]
struct TrackedFace {
    state: BlinkState,
    last_seen: u64,
}

/// Turns per-frame landmark sets into blink events and a running count
pub struct FrameAnalyzer {
    config: BlinkConfig,
    faces: HashMap<FaceKey, TrackedFace>,
    /// Blinks since the last `get_and_reset_blink_count`
    blink_counter: u64,
    /// Frames that contained at least one face
    face_frames: u64,
}

impl FrameAnalyzer {
    /// Create an analyzer with a validated configuration
    pub fn new(config: BlinkConfig) -> Result<Self, DetectionError> {
        config.validate()?;
        info!(
            "Creating frame analyzer: threshold {}, cooldown {} frames, scheme {}, tracking {:?}",
            config.ear_threshold, config.cooldown_frames, config.scheme.name, config.face_tracking
        );
        Ok(Self {
            config,
            faces: HashMap::new(),
            blink_counter: 0,
            face_frames: 0,
        })
    }

    /// Analyze one frame's detected faces
    ///
    /// A frame without faces leaves every state untouched.
    pub fn process(&mut self, frame_faces: &[LandmarkSet]) -> FrameAnalysis {
        if frame_faces.is_empty() {
            return FrameAnalysis::default();
        }

        self.face_frames += 1;
        let mut analysis = FrameAnalysis {
            faces: Vec::with_capacity(frame_faces.len()),
            blinks: 0,
        };

        for (slot, face) in frame_faces.iter().enumerate() {
            let face_analysis = self.process_face(slot, face);
            if face_analysis.blink {
                analysis.blinks += 1;
            }
            analysis.faces.push(face_analysis);
        }

        self.blink_counter += analysis.blinks as u64;
        self.evict_stale();
        analysis
    }

    fn process_face(&mut self, slot: usize, face: &LandmarkSet) -> FaceAnalysis {
        let scheme = &self.config.scheme;
        let complete = face.is_complete(scheme);
        if !complete {
            debug!(
                "Face {} has {} landmarks, scheme {} expects {}",
                slot,
                face.len(),
                scheme.name,
                scheme.point_count
            );
        }

        let ear = face_ear(face, scheme);
        let key = self.key_for(slot, face);
        let frame = self.face_frames;

        let tracked = self.faces.entry(key).or_insert(TrackedFace {
            state: BlinkState::default(),
            last_seen: frame,
        });
        tracked.last_seen = frame;
        let blink = tracked.state.update(
            ear.mean,
            self.config.ear_threshold,
            self.config.cooldown_frames,
        );

        if blink {
            debug!("Blink on face {:?} (ear {:.3})", key, ear.mean);
        }

        FaceAnalysis {
            key,
            ear,
            blink,
            eye_closed: tracked.state.is_eye_closed,
            cooldown_remaining: tracked.state.cooldown_remaining,
            complete,
            face_bbox: BoundingBox::enclosing(face.points()),
            left_eye: face.eye(EyeSide::Left, scheme).points().to_vec(),
            right_eye: face.eye(EyeSide::Right, scheme).points().to_vec(),
        }
    }

    fn key_for(&self, slot: usize, face: &LandmarkSet) -> FaceKey {
        match self.config.face_tracking {
            FaceTracking::Shared => FaceKey::Shared,
            FaceTracking::PerFace => face
                .identity()
                .map(FaceKey::Identity)
                .unwrap_or(FaceKey::Slot(slot)),
        }
    }

    fn evict_stale(&mut self) {
        let limit = self.config.stale_after_frames;
        if limit == 0 {
            return;
        }
        let now = self.face_frames;
        self.faces.retain(|key, tracked| {
            let keep = *key == FaceKey::Shared || now - tracked.last_seen <= limit;
            if !keep {
                debug!("Dropping stale blink state for {:?}", key);
            }
            keep
        });
    }

    /// Blinks since the previous call; resets the count to zero
    pub fn get_and_reset_blink_count(&mut self) -> u64 {
        std::mem::take(&mut self.blink_counter)
    }

    /// Blinks accumulated since the last reset, without resetting
    pub fn pending_blinks(&self) -> u64 {
        self.blink_counter
    }

    /// Current state for a face key
    pub fn blink_state(&self, key: FaceKey) -> Option<BlinkState> {
        self.faces.get(&key).map(|t| t.state)
    }

    /// Number of faces with live state
    pub fn tracked_faces(&self) -> usize {
        self.faces.len()
    }

    pub fn config(&self) -> &BlinkConfig {
        &self.config
    }

    /// Forget all face state and the pending count
    pub fn reset(&mut self) {
        self.faces.clear();
        self.blink_counter = 0;
        self.face_frames = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point2;
    use crate::landmarks::LandmarkScheme;

    /// 68-point face whose eyes both have the given EAR
    fn face_with_ear(ear: f64) -> LandmarkSet {
        let mut points = vec![Point2::new(100.0, 100.0); 68];
        for range in [42..48, 36..42] {
            let x0 = range.start as f64 * 10.0;
            // Corners 40 apart, lids opened so (a + b) / (2 * 40) == ear
            let half = ear * 40.0 / 2.0;
            let eye = [
                Point2::new(x0, 50.0),
                Point2::new(x0 + 13.0, 50.0 - half),
                Point2::new(x0 + 27.0, 50.0 - half),
                Point2::new(x0 + 40.0, 50.0),
                Point2::new(x0 + 27.0, 50.0 + half),
                Point2::new(x0 + 13.0, 50.0 + half),
            ];
            points[range].copy_from_slice(&eye);
        }
        LandmarkSet::new(points)
    }

    fn analyzer() -> FrameAnalyzer {
        FrameAnalyzer::new(BlinkConfig::default()).unwrap()
    }

    fn feed(analyzer: &mut FrameAnalyzer, ears: &[f64]) -> Vec<u32> {
        ears.iter()
            .map(|&ear| analyzer.process(&[face_with_ear(ear)]).blinks)
            .collect()
    }

    #[test]
    fn test_face_ear_fixture() {
        let face = face_with_ear(0.3);
        let pair = face_ear(&face, &LandmarkScheme::IBUG_68);
        assert!((pair.mean - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_single_blink_at_third_frame() {
        let mut analyzer = analyzer();
        let blinks = feed(&mut analyzer, &[0.30, 0.30, 0.15, 0.15, 0.30]);
        assert_eq!(blinks, vec![0, 0, 1, 0, 0]);
        assert_eq!(analyzer.get_and_reset_blink_count(), 1);
    }

    #[test]
    fn test_sustained_closure() {
        let mut analyzer = analyzer();
        let blinks = feed(&mut analyzer, &[0.10; 20]);
        assert_eq!(blinks.iter().sum::<u32>(), 1);

        let state = analyzer.blink_state(FaceKey::Slot(0)).unwrap();
        assert!(state.is_eye_closed);
    }

    #[test]
    fn test_two_separate_dips() {
        let mut ears = vec![0.30; 5];
        ears.extend([0.10; 2]);
        ears.extend([0.30; 15]);
        ears.extend([0.10; 2]);
        ears.extend([0.30; 5]);

        let mut analyzer = analyzer();
        feed(&mut analyzer, &ears);
        assert_eq!(analyzer.get_and_reset_blink_count(), 2);
    }

    #[test]
    fn test_get_and_reset_is_idempotent() {
        let mut analyzer = analyzer();
        feed(&mut analyzer, &[0.30, 0.10, 0.30]);
        assert_eq!(analyzer.get_and_reset_blink_count(), 1);
        assert_eq!(analyzer.get_and_reset_blink_count(), 0);
    }

    #[test]
    fn test_windowed_counts() {
        // Three dips inside 30 frames, each past the previous cooldown
        let mut ears = vec![0.30; 30];
        for i in [2, 14, 26] {
            ears[i] = 0.10;
        }

        let mut analyzer = analyzer();
        feed(&mut analyzer, &ears);
        assert_eq!(analyzer.get_and_reset_blink_count(), 3);

        feed(&mut analyzer, &[0.30; 29]);
        assert_eq!(analyzer.get_and_reset_blink_count(), 0);
    }

    #[test]
    fn test_empty_frame_is_noop() {
        let mut analyzer = analyzer();
        feed(&mut analyzer, &[0.10]);
        let before = analyzer.blink_state(FaceKey::Slot(0)).unwrap();

        let analysis = analyzer.process(&[]);
        assert!(!analysis.face_detected());
        assert_eq!(analysis.blinks, 0);
        assert_eq!(analyzer.blink_state(FaceKey::Slot(0)), Some(before));
    }

    #[test]
    fn test_malformed_face_does_not_block_others() {
        let mut analyzer = analyzer();
        let truncated = LandmarkSet::new(vec![Point2::new(1.0, 1.0); 20]);

        let analysis = analyzer.process(&[truncated, face_with_ear(0.30)]);
        assert_eq!(analysis.faces.len(), 2);
        assert!(!analysis.faces[0].complete);
        assert_eq!(analysis.faces[0].ear.mean, 0.0);
        // The sentinel reads as a closed eye
        assert!(analysis.faces[0].blink);
        assert!(analysis.faces[1].complete);
        assert!(!analysis.faces[1].blink);
    }

    #[test]
    fn test_faces_tracked_independently() {
        let mut analyzer = analyzer();
        analyzer.process(&[face_with_ear(0.10), face_with_ear(0.30)]);
        let analysis = analyzer.process(&[face_with_ear(0.10), face_with_ear(0.10)]);

        assert!(!analysis.faces[0].blink);
        assert!(analysis.faces[1].blink);
        assert_eq!(analyzer.tracked_faces(), 2);
    }

    #[test]
    fn test_identity_beats_slot() {
        let mut analyzer = analyzer();
        analyzer.process(&[face_with_ear(0.10).with_identity(7)]);

        // Same person now detected second; still in cooldown, so no new blink
        let analysis = analyzer.process(&[
            face_with_ear(0.30).with_identity(3),
            face_with_ear(0.10).with_identity(7),
        ]);
        assert_eq!(analysis.faces[1].key, FaceKey::Identity(7));
        assert!(!analysis.faces[1].blink);
        assert!(analyzer.blink_state(FaceKey::Identity(7)).unwrap().is_eye_closed);
    }

    #[test]
    fn test_shared_tracking() {
        let config = BlinkConfig {
            face_tracking: FaceTracking::Shared,
            ..Default::default()
        };
        let mut analyzer = FrameAnalyzer::new(config).unwrap();

        // The second face sees the state the first face just closed
        let analysis = analyzer.process(&[face_with_ear(0.10), face_with_ear(0.10)]);
        assert_eq!(analysis.blinks, 1);
        assert_eq!(analyzer.tracked_faces(), 1);
        assert!(analyzer.blink_state(FaceKey::Shared).is_some());
    }

    #[test]
    fn test_stale_faces_evicted() {
        let config = BlinkConfig {
            stale_after_frames: 2,
            ..Default::default()
        };
        let mut analyzer = FrameAnalyzer::new(config).unwrap();
        analyzer.process(&[face_with_ear(0.3).with_identity(1)]);
        for _ in 0..3 {
            analyzer.process(&[face_with_ear(0.3).with_identity(2)]);
        }

        assert!(analyzer.blink_state(FaceKey::Identity(1)).is_none());
        assert!(analyzer.blink_state(FaceKey::Identity(2)).is_some());
    }

    #[test]
    fn test_annotation_regions() {
        let mut analyzer = analyzer();
        let analysis = analyzer.process(&[face_with_ear(0.3)]);
        let face = &analysis.faces[0];

        assert_eq!(face.left_eye.len(), 6);
        assert_eq!(face.right_eye.len(), 6);
        assert!(face.face_bbox.is_some());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = BlinkConfig { ear_threshold: -1.0, ..Default::default() };
        assert!(FrameAnalyzer::new(config).is_err());
    }

    #[test]
    fn test_reset() {
        let mut analyzer = analyzer();
        feed(&mut analyzer, &[0.10]);
        analyzer.reset();
        assert_eq!(analyzer.tracked_faces(), 0);
        assert_eq!(analyzer.pending_blinks(), 0);
    }
}
