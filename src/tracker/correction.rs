use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::pose::{Keypoint, KeypointMap, LandmarkSchema, MovementDirection, PixelPoint};

use super::derived::DerivedPoints;
use super::frame::{FrameRecord, Provenance};
use super::interpolate::interpolate_between;

/// 手動補正の信頼度（完全に信頼する）
const MANUAL_SCORE: f64 = 1.0;

/// 手動補正エンジン
///
/// 補正したフレームを「ピン」として固定し、連続するピンの間を補間し直す。
#[derive(Debug, Clone, Copy)]
pub struct CorrectionEngine {
    derived: DerivedPoints,
    direction: MovementDirection,
}

impl CorrectionEngine {
    pub fn new(schema: LandmarkSchema, direction: MovementDirection) -> Self {
        Self {
            derived: DerivedPoints::new(schema),
            direction,
        }
    }

    /// `frame_index` のフレームのキーポイントを上書きし、ピン間を補間し直す
    ///
    /// ピンに挟まれていないフレームは変更しない。
    pub fn apply_adjustment(
        &self,
        frames: &mut [FrameRecord],
        frame_index: usize,
        adjustments: &BTreeMap<usize, PixelPoint>,
    ) -> Result<()> {
        let position = frames
            .iter()
            .position(|f| f.frame_index == frame_index)
            .ok_or(AnalysisError::FrameOutOfRange {
                index: frame_index,
                len: frames.len(),
            })?;

        let schema = self.derived.schema();
        let target = &mut frames[position];
        let keypoints = target.keypoints.get_or_insert_with(KeypointMap::new);
        for (&index, point) in adjustments {
            let name = keypoints
                .get(&index)
                .and_then(|kp| kp.name.clone())
                .or_else(|| schema.landmark(index).map(|lm| lm.name().to_string()));
            keypoints.insert(
                index,
                Keypoint {
                    x: point.x,
                    y: point.y,
                    score: MANUAL_SCORE,
                    name,
                },
            );
        }

        let keypoints = keypoints.clone();
        target.center_of_mass = self.derived.center_of_mass(&keypoints);
        target.head_position = self.derived.head_position(&keypoints);
        if target.biomechanics.is_some() {
            target.biomechanics = Some(self.derived.biomechanics(&keypoints, self.direction));
        }
        target.provenance = Provenance::ManuallyAdjusted;

        debug!(frame = frame_index, landmarks = adjustments.len(), "manual adjustment");
        reinterpolate_pins(frames);
        Ok(())
    }
}

/// 連続する手動補正フレームの間をすべて補間し直す
pub fn reinterpolate_pins(frames: &mut [FrameRecord]) {
    let mut pins: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.is_manually_adjusted())
        .map(|(i, _)| i)
        .collect();
    pins.sort_by_key(|&i| frames[i].frame_index);

    for pair in pins.windows(2) {
        interpolate_between(frames, pair[0], pair[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Landmark;
    use crate::testing::runner_pose;
    use assert_matches::assert_matches;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn track(schema: &LandmarkSchema, xs: &[f64]) -> Vec<FrameRecord> {
        let derived = DerivedPoints::new(*schema);
        xs.iter()
            .enumerate()
            .map(|(i, &x)| {
                let kp = runner_pose(schema, x, 0.9).keypoints;
                FrameRecord::detected(
                    i,
                    i as f64 * 0.1,
                    kp.clone(),
                    derived.center_of_mass(&kp),
                    derived.head_position(&kp),
                    None,
                )
            })
            .collect()
    }

    /// 肩・腰を中心 x に移動させる補正
    fn shift_torso(schema: &LandmarkSchema, x: f64) -> BTreeMap<usize, PixelPoint> {
        let mut adj = BTreeMap::new();
        for (lm, dx, y) in [
            (Landmark::LeftShoulder, -10.0, 50.0),
            (Landmark::RightShoulder, 10.0, 50.0),
            (Landmark::LeftHip, -10.0, 150.0),
            (Landmark::RightHip, 10.0, 150.0),
        ] {
            adj.insert(schema.index(lm).unwrap(), PixelPoint::new(x + dx, y));
        }
        adj
    }

    #[test]
    fn test_adjustment_overwrites_and_marks_frame() {
        let schema = LandmarkSchema::coco17();
        let engine = CorrectionEngine::new(schema, MovementDirection::Right);
        let mut frames = track(&schema, &[0.0, 10.0, 20.0]);

        engine
            .apply_adjustment(&mut frames, 1, &shift_torso(&schema, 500.0))
            .unwrap();

        let frame = &frames[1];
        assert!(frame.is_manually_adjusted());
        let hip = &frame.keypoints.as_ref().unwrap()[&11];
        assert_eq!((hip.x, hip.y, hip.score), (490.0, 150.0, 1.0));
        assert_eq!(hip.name.as_deref(), Some("left_hip"));
        assert!(approx_eq(frame.center_of_mass.unwrap().x, 500.0, 1e-9));
        // ピンが 1 つだけなら他は変わらない
        assert_eq!(frames[0].provenance, Provenance::Detected);
        assert!(approx_eq(frames[2].center_of_mass.unwrap().x, 20.0, 1e-9));
    }

    #[test]
    fn test_frames_between_pins_reinterpolated() {
        let schema = LandmarkSchema::coco17();
        let engine = CorrectionEngine::new(schema, MovementDirection::Right);
        let mut frames = track(&schema, &[0.0, 7.0, 3.0, 99.0, 40.0, 50.0, 60.0]);

        engine.apply_adjustment(&mut frames, 0, &shift_torso(&schema, 0.0)).unwrap();
        engine.apply_adjustment(&mut frames, 4, &shift_torso(&schema, 40.0)).unwrap();

        for i in 1..4 {
            assert!(frames[i].is_interpolated());
            let com = frames[i].center_of_mass.unwrap();
            assert!(approx_eq(com.x, i as f64 * 10.0, 1e-9));
        }
        // ピンの外側は触らない
        assert_eq!(frames[5].provenance, Provenance::Detected);
        assert!(approx_eq(frames[6].center_of_mass.unwrap().x, 60.0, 1e-9));
    }

    #[test]
    fn test_pins_never_overwritten() {
        let schema = LandmarkSchema::coco17();
        let engine = CorrectionEngine::new(schema, MovementDirection::Right);
        let mut frames = track(&schema, &[0.0, 10.0, 20.0, 30.0, 40.0]);

        engine.apply_adjustment(&mut frames, 0, &shift_torso(&schema, 5.0)).unwrap();
        engine.apply_adjustment(&mut frames, 2, &shift_torso(&schema, 300.0)).unwrap();
        let pinned = frames[2].keypoints.clone();
        engine.apply_adjustment(&mut frames, 4, &shift_torso(&schema, 45.0)).unwrap();
        reinterpolate_pins(&mut frames);

        assert_eq!(frames[2].keypoints, pinned);
        assert!(frames[2].is_manually_adjusted());
        assert!(approx_eq(frames[1].center_of_mass.unwrap().x, 152.5, 1e-9));
    }

    #[test]
    fn test_adjusting_missing_frame_creates_keypoints() {
        let schema = LandmarkSchema::coco17();
        let engine = CorrectionEngine::new(schema, MovementDirection::Right);
        let mut frames = vec![FrameRecord::missing(0, 0.0)];

        engine.apply_adjustment(&mut frames, 0, &shift_torso(&schema, 12.0)).unwrap();
        assert!(frames[0].is_manually_adjusted());
        assert_eq!(frames[0].keypoints.as_ref().unwrap().len(), 4);
        assert!(frames[0].center_of_mass.is_some());
        assert!(frames[0].head_position.is_none());
    }

    #[test]
    fn test_unknown_frame_rejected() {
        let schema = LandmarkSchema::coco17();
        let engine = CorrectionEngine::new(schema, MovementDirection::Right);
        let mut frames = track(&schema, &[0.0, 1.0]);
        let result = engine.apply_adjustment(&mut frames, 7, &BTreeMap::new());
        assert_matches!(result, Err(AnalysisError::FrameOutOfRange { index: 7, len: 2 }));
    }
}
