//! Test doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{AnalysisError, Result};
use crate::pose::{Keypoint, KeypointMap, Landmark, LandmarkSchema, PoseEstimator, PoseResult, ScoredPoint};
use crate::tracker::FrameRecord;
use crate::video::{VideoFrame, VideoSource};

/// 黒フレームを返すだけの動画。シーク履歴を記録する
pub struct SyntheticVideo {
    pub duration: f64,
    pub seeks: Vec<f64>,
}

impl SyntheticVideo {
    pub fn new(duration: f64) -> Self {
        Self {
            duration,
            seeks: Vec::new(),
        }
    }
}

impl VideoSource for SyntheticVideo {
    fn duration(&self) -> f64 {
        self.duration
    }

    fn dimensions(&self) -> (u32, u32) {
        (32, 24)
    }

    async fn seek(&mut self, time_secs: f64) -> Result<VideoFrame> {
        self.seeks.push(time_secs);
        Ok(VideoFrame::blank(time_secs, 32, 24))
    }
}

type Script = Box<dyn FnMut(usize, f64) -> Option<PoseResult> + Send>;

/// (呼び出し回数, 時刻) → 姿勢 のスクリプトで動く推定器
pub struct ScriptedEstimator {
    schema: LandmarkSchema,
    script: Script,
    pub calls: Arc<AtomicUsize>,
    ready: bool,
    fail_init: bool,
}

impl ScriptedEstimator {
    pub fn new(
        schema: LandmarkSchema,
        script: impl FnMut(usize, f64) -> Option<PoseResult> + Send + 'static,
    ) -> Self {
        Self {
            schema,
            script: Box::new(script),
            calls: Arc::new(AtomicUsize::new(0)),
            ready: false,
            fail_init: false,
        }
    }

    pub fn failing(schema: LandmarkSchema) -> Self {
        Self {
            fail_init: true,
            ..Self::new(schema, |_, _| None)
        }
    }

    pub fn ready(mut self) -> Self {
        self.ready = true;
        self
    }
}

impl PoseEstimator for ScriptedEstimator {
    async fn initialize(&mut self) -> Result<()> {
        if self.fail_init {
            return Err(AnalysisError::Initialization("model file not found".into()));
        }
        self.ready = true;
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<PoseResult>> {
        if !self.ready {
            return Err(AnalysisError::NotReady);
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.script)(call, frame.timestamp))
    }

    fn dispose(&mut self) {
        self.ready = false;
    }

    fn schema(&self) -> LandmarkSchema {
        self.schema
    }
}

/// 重心 x 座標が `com_x` になる右向きの走行姿勢
pub fn runner_pose(schema: &LandmarkSchema, com_x: f64, score: f64) -> PoseResult {
    let layout: [(Landmark, f64, f64); 17] = [
        (Landmark::Nose, 15.0, 0.0),
        (Landmark::LeftEar, 5.0, 5.0),
        (Landmark::RightEar, 5.0, 5.0),
        (Landmark::LeftShoulder, -10.0, 50.0),
        (Landmark::RightShoulder, 10.0, 50.0),
        (Landmark::LeftHip, -10.0, 150.0),
        (Landmark::RightHip, 10.0, 150.0),
        (Landmark::LeftKnee, -5.0, 200.0),
        (Landmark::RightKnee, 30.0, 190.0),
        (Landmark::LeftAnkle, -20.0, 250.0),
        (Landmark::RightAnkle, 20.0, 245.0),
        (Landmark::LeftHeel, -25.0, 255.0),
        (Landmark::RightHeel, 15.0, 250.0),
        (Landmark::LeftToe, -5.0, 255.0),
        (Landmark::RightToe, 35.0, 245.0),
        (Landmark::LeftWrist, -30.0, 120.0),
        (Landmark::RightWrist, 30.0, 100.0),
    ];

    let mut keypoints = KeypointMap::new();
    for (landmark, dx, y) in layout {
        if let Some(idx) = schema.index(landmark) {
            keypoints.insert(idx, Keypoint::new(com_x + dx, y, score).named(landmark.name()));
        }
    }
    PoseResult::new(keypoints, score)
}

/// 重心 x 座標の列から検出済みフレーム列を作る
pub fn frames_from_com(xs: &[f64], fps: f64) -> Vec<FrameRecord> {
    xs.iter()
        .enumerate()
        .map(|(i, &x)| {
            FrameRecord::detected(
                i,
                i as f64 / fps,
                KeypointMap::new(),
                Some(ScoredPoint::new(x, 100.0, 0.9)),
                None,
                None,
            )
        })
        .collect()
}
