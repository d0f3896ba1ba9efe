//! 1 本の動画の解析セッション
//!
//! 推定器・キャリブレーション・フレーム列・計測タイムをまとめて持ち、
//! 追跡 → 手動補正 → 物理計算 → 書き出し の順に使う。

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::calibration::CalibrationState;
use crate::error::AnalysisError;
use crate::physics::{calculate_with, PhysicsAnalysis, PhysicsOptions, TimeOverrides};
use crate::pose::{PixelPoint, PoseEstimator};
use crate::tracker::{process, CorrectionEngine, FrameRecord, SequencerOptions, TrackingRun};
use crate::video::VideoSource;

/// 推定器を専有する解析セッション
///
/// 推定器への `detect` は常に `&mut self` 経由なので同時に呼ばれることはない。
/// セッションを破棄すると推定器も解放される。
pub struct AnalysisSession<E: PoseEstimator> {
    estimator: E,
    calibration: CalibrationState,
    sequencer: SequencerOptions,
    physics: PhysicsOptions,
    frames: Vec<FrameRecord>,
    time_overrides: TimeOverrides,
    athlete_weight_lbs: Option<f64>,
}

impl<E: PoseEstimator> AnalysisSession<E> {
    /// 推定器を初期化してセッションを開始する。初期化に失敗したらそのまま返す
    pub async fn start(
        mut estimator: E,
        sequencer: SequencerOptions,
        physics: PhysicsOptions,
    ) -> std::result::Result<Self, AnalysisError> {
        if !estimator.is_ready() {
            estimator.initialize().await?;
        }
        info!(schema = ?estimator.schema().kind(), profile = ?sequencer.profile, "session started");
        Ok(Self {
            estimator,
            calibration: CalibrationState::default(),
            sequencer,
            physics,
            frames: Vec::new(),
            time_overrides: TimeOverrides::default(),
            athlete_weight_lbs: None,
        })
    }

    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut CalibrationState {
        &mut self.calibration
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn options(&self) -> &SequencerOptions {
        &self.sequencer
    }

    /// 動画を追跡してフレーム列を置き換える
    ///
    /// キャリブレーション前は開始しない。キャンセルされた場合は
    /// 途中結果を返すだけで、セッションのフレーム列は変更しない。
    pub async fn track<V, P, C>(
        &mut self,
        video: &mut V,
        on_progress: P,
        is_cancelled: C,
    ) -> std::result::Result<TrackingRun, AnalysisError>
    where
        V: VideoSource,
        P: FnMut(f64),
        C: Fn() -> bool,
    {
        self.calibration.require_pixels_per_yard()?;

        let run = process(video, &mut self.estimator, &self.sequencer, on_progress, is_cancelled).await?;
        if run.is_complete() {
            self.frames = run.frames.clone();
        } else {
            warn!(frames = run.frames.len(), "tracking cancelled; keeping previous frames");
        }
        Ok(run)
    }

    /// 1 フレームのキーポイントを手で直す
    pub fn adjust(
        &mut self,
        frame_index: usize,
        adjustments: &BTreeMap<usize, PixelPoint>,
    ) -> std::result::Result<(), AnalysisError> {
        let engine = CorrectionEngine::new(self.estimator.schema(), self.sequencer.movement_direction);
        engine.apply_adjustment(&mut self.frames, frame_index, adjustments)
    }

    pub fn set_time_overrides(&mut self, overrides: TimeOverrides) {
        self.time_overrides = overrides;
    }

    pub fn set_athlete_weight(&mut self, weight_lbs: Option<f64>) {
        self.athlete_weight_lbs = weight_lbs;
    }

    /// 物理計算。データ不足なら Ok(None)
    pub fn analyze(&self) -> std::result::Result<Option<PhysicsAnalysis>, AnalysisError> {
        let pixels_per_yard = self.calibration.require_pixels_per_yard()?;
        Ok(calculate_with(
            &self.frames,
            pixels_per_yard,
            self.sequencer.fps,
            Some(&self.time_overrides),
            self.athlete_weight_lbs,
            &self.physics,
        ))
    }

    pub fn export(&self) -> SessionFile {
        SessionFile {
            fps: self.sequencer.fps,
            calibration: self.calibration.clone(),
            frames: self.frames.clone(),
            time_overrides: self.time_overrides.clone(),
            athlete_weight_lbs: self.athlete_weight_lbs,
        }
    }
}

impl<E: PoseEstimator> Drop for AnalysisSession<E> {
    fn drop(&mut self) {
        self.estimator.dispose();
    }
}

/// 追跡済みセッションの JSON 表現
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    pub fps: f64,
    pub calibration: CalibrationState,
    pub frames: Vec<FrameRecord>,
    #[serde(default)]
    pub time_overrides: TimeOverrides,
    #[serde(default)]
    pub athlete_weight_lbs: Option<f64>,
}

impl SessionFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file: {}", path.display()))?;
        let session: SessionFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse session file: {}", path.display()))?;
        Ok(session)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json).context("Failed to write session file")?;
        Ok(())
    }

    /// 保存済みのフレームから物理計算をやり直す
    pub fn analyze(&self, options: &PhysicsOptions) -> std::result::Result<Option<PhysicsAnalysis>, AnalysisError> {
        let pixels_per_yard = self.calibration.require_pixels_per_yard()?;
        Ok(calculate_with(
            &self.frames,
            pixels_per_yard,
            self.fps,
            Some(&self.time_overrides),
            self.athlete_weight_lbs,
            options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::DistanceUnit;
    use crate::pose::{Landmark, LandmarkSchema};
    use crate::testing::{runner_pose, ScriptedEstimator, SyntheticVideo};
    use crate::tracker::Provenance;
    use assert_matches::assert_matches;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    /// 1 フレームごとに重心が 10px 右へ進む推定器
    fn runner() -> ScriptedEstimator {
        let schema = LandmarkSchema::coco17();
        ScriptedEstimator::new(schema, move |call, _| {
            Some(runner_pose(&schema, 100.0 + call as f64 * 10.0, 0.9))
        })
    }

    fn options() -> SequencerOptions {
        SequencerOptions {
            fps: 10.0,
            ..SequencerOptions::default()
        }
    }

    async fn calibrated_session() -> AnalysisSession<ScriptedEstimator> {
        let mut session = AnalysisSession::start(runner(), options(), PhysicsOptions::default())
            .await
            .unwrap();
        let cal = session.calibration_mut();
        assert!(cal.add_marker(0.0, 0.0));
        assert!(cal.add_marker(100.0, 0.0));
        assert!(cal.set_distance(10.0, DistanceUnit::Yards));
        session
    }

    #[tokio::test]
    async fn test_initialization_failure_propagates() {
        let estimator = ScriptedEstimator::failing(LandmarkSchema::coco17());
        let result = AnalysisSession::start(estimator, options(), PhysicsOptions::default()).await;
        assert_matches!(result.map(|_| ()), Err(AnalysisError::Initialization(_)));
    }

    #[tokio::test]
    async fn test_track_requires_calibration() {
        let mut session = AnalysisSession::start(runner(), options(), PhysicsOptions::default())
            .await
            .unwrap();
        let mut video = SyntheticVideo::new(1.0);
        let result = session.track(&mut video, |_| {}, || false).await;
        assert_matches!(result, Err(AnalysisError::CalibrationIncomplete(_)));
        assert!(video.seeks.is_empty());
        assert_matches!(session.analyze(), Err(AnalysisError::CalibrationIncomplete(_)));
    }

    #[tokio::test]
    async fn test_track_and_analyze() {
        let mut session = calibrated_session().await;
        let mut video = SyntheticVideo::new(2.0);
        let run = session.track(&mut video, |_| {}, || false).await.unwrap();
        assert!(run.is_complete());
        assert_eq!(session.frames().len(), 20);

        // 10px/frame, 10 px/yd, 10 fps → 10 yd/s
        let analysis = session.analyze().unwrap().unwrap();
        assert!(approx_eq(analysis.frames[5].velocity, 10.0, 1e-9));
        assert!(approx_eq(analysis.summary.total_distance, 19.0, 1e-9));
        assert!(!analysis.has_time_overrides);

        session.set_time_overrides(TimeOverrides::default().with_split(10, 0.5));
        session.set_athlete_weight(Some(200.0));
        let timed = session.analyze().unwrap().unwrap();
        assert!(timed.has_time_overrides);
        assert_eq!(timed.summary.splits[0].time, Some(0.5));
        assert!(timed.summary.max_power.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_track_keeps_previous_frames() {
        let mut session = calibrated_session().await;
        let mut video = SyntheticVideo::new(1.0);
        session.track(&mut video, |_| {}, || false).await.unwrap();
        assert_eq!(session.frames().len(), 10);

        let mut video = SyntheticVideo::new(2.0);
        let run = session.track(&mut video, |_| {}, || true).await.unwrap();
        assert!(run.cancelled);
        assert_eq!(session.frames().len(), 10);
    }

    #[tokio::test]
    async fn test_adjust_marks_frame() {
        let mut session = calibrated_session().await;
        let mut video = SyntheticVideo::new(1.0);
        session.track(&mut video, |_| {}, || false).await.unwrap();

        let hip = LandmarkSchema::coco17().index(Landmark::LeftHip).unwrap();
        let adjustments = BTreeMap::from([(hip, PixelPoint::new(500.0, 150.0))]);
        session.adjust(3, &adjustments).unwrap();
        assert_eq!(session.frames()[3].provenance, Provenance::ManuallyAdjusted);

        assert_matches!(
            session.adjust(99, &adjustments),
            Err(AnalysisError::FrameOutOfRange { index: 99, .. })
        );
    }

    #[tokio::test]
    async fn test_session_file_round_trip() {
        let mut session = calibrated_session().await;
        let mut video = SyntheticVideo::new(1.5);
        session.track(&mut video, |_| {}, || false).await.unwrap();
        session.set_time_overrides(TimeOverrides::default().with_split(10, 1.2));
        session.set_athlete_weight(Some(175.0));

        let file = session.export();
        let path = std::env::temp_dir().join("freakforge_motion_session_test.json");
        file.save(&path).unwrap();
        let loaded = SessionFile::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded.frames.len(), file.frames.len());
        assert_eq!(loaded.athlete_weight_lbs, Some(175.0));
        let expected = session.analyze().unwrap().unwrap();
        let reloaded = loaded.analyze(&PhysicsOptions::default()).unwrap().unwrap();
        assert_eq!(reloaded.summary.splits, expected.summary.splits);
        assert!(approx_eq(reloaded.summary.max_velocity, expected.summary.max_velocity, 1e-9));
    }

    #[test]
    fn test_load_missing_file() {
        let err = SessionFile::load("/nonexistent/session.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read session file"));
    }
}
