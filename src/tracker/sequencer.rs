use tracing::{debug, info, warn};

use crate::error::{AnalysisError, Result};
use crate::pose::{MovementDirection, PoseEstimator, TrackingProfile};
use crate::video::VideoSource;

use super::derived::{DerivedPoints, MIN_CONFIDENCE};
use super::frame::FrameRecord;
use super::interpolate::fill_gaps;

/// フレーム数計算時の丸め誤差吸収
const FRAME_COUNT_EPSILON: f64 = 1e-9;

/// フレームシーケンサの設定
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerOptions {
    /// サンプリングレート（フレーム/秒）
    pub fps: f64,
    pub profile: TrackingProfile,
    pub enable_biomechanics: bool,
    pub movement_direction: MovementDirection,
    /// 開始時刻（秒）。None なら 0
    pub start_time: Option<f64>,
    /// 終了時刻（秒）。None なら動画の長さ
    pub end_time: Option<f64>,
    /// これ未満のキーポイントは捨てる
    pub confidence_threshold: f64,
}

impl Default for SequencerOptions {
    fn default() -> Self {
        Self {
            fps: 30.0,
            profile: TrackingProfile::Sprint,
            enable_biomechanics: true,
            movement_direction: MovementDirection::Right,
            start_time: None,
            end_time: None,
            confidence_threshold: MIN_CONFIDENCE,
        }
    }
}

/// 1 回の追跡処理の結果
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingRun {
    pub frames: Vec<FrameRecord>,
    /// キャンセルされた。frames は途中までで、欠損補間も行っていない
    pub cancelled: bool,
    /// 推定器が姿勢を返したフレーム数
    pub detected: usize,
}

impl TrackingRun {
    pub fn is_complete(&self) -> bool {
        !self.cancelled
    }
}

/// [start, end) を 1/fps 刻みでサンプリングしたときのフレーム数
fn frame_count(start: f64, end: f64, fps: f64) -> usize {
    let span = end - start;
    if span <= 0.0 {
        return 0;
    }
    (span * fps + FRAME_COUNT_EPSILON).floor() as usize
}

/// 動画の各サンプル時刻で姿勢推定を行い、フレーム列を組み立てる
///
/// - `on_progress` は毎フレーム後に 0〜100 の進捗率で呼ばれる
/// - `is_cancelled` はフレームごとに 1 回だけ確認する。処理中のフレームは最後まで終える
/// - 推定器は順番に 1 フレームずつ呼ばれる（並行呼び出しはしない）
pub async fn process<V, E, P, C>(
    video: &mut V,
    estimator: &mut E,
    options: &SequencerOptions,
    mut on_progress: P,
    is_cancelled: C,
) -> Result<TrackingRun>
where
    V: VideoSource,
    E: PoseEstimator,
    P: FnMut(f64),
    C: Fn() -> bool,
{
    if !(options.fps.is_finite() && options.fps > 0.0) {
        return Err(AnalysisError::InvalidOptions(format!("fps must be positive, got {}", options.fps)));
    }
    if !estimator.is_ready() {
        return Err(AnalysisError::NotReady);
    }

    let duration = video.duration().max(0.0);
    let start = options.start_time.unwrap_or(0.0).max(0.0);
    let end = options.end_time.unwrap_or(duration).min(duration);
    if !end.is_finite() {
        // ストリーミング録画などで長さが不明な動画
        return Err(AnalysisError::Video(format!(
            "video duration is not finite ({}); set an end time",
            video.duration()
        )));
    }
    if options.end_time.is_some() && options.start_time.is_some() && end < start {
        return Err(AnalysisError::InvalidOptions(format!(
            "end time {} is before start time {}",
            end, start
        )));
    }

    let total = frame_count(start, end, options.fps);
    let schema = estimator.schema();
    let derived = DerivedPoints::new(schema).with_confidence_floor(options.confidence_threshold);
    let profile_indices = schema.profile_indices(options.profile);
    let direction = options.movement_direction;

    let (width, height) = video.dimensions();
    info!(start, end, fps = options.fps, total, width, height, profile = ?options.profile, "tracking started");

    let mut frames = Vec::new();
    let mut detected = 0;

    for i in 0..total {
        if is_cancelled() {
            warn!(completed = frames.len(), total, "tracking cancelled");
            return Ok(TrackingRun {
                frames,
                cancelled: true,
                detected,
            });
        }

        let time = start + i as f64 / options.fps;
        let frame = video.seek(time).await?;
        let pose = estimator.detect(&frame)?;

        let keypoints = pose
            .map(|p| p.restrict(&profile_indices, options.confidence_threshold))
            .filter(|kp| !kp.is_empty());

        let record = match keypoints {
            Some(keypoints) => {
                detected += 1;
                let biomechanics = options
                    .enable_biomechanics
                    .then(|| derived.biomechanics(&keypoints, direction));
                FrameRecord::detected(
                    i,
                    frame.timestamp,
                    keypoints.clone(),
                    derived.center_of_mass(&keypoints),
                    derived.head_position(&keypoints),
                    biomechanics,
                )
            }
            None => {
                debug!(frame = i, t = frame.timestamp, "no pose");
                FrameRecord::missing(i, frame.timestamp)
            }
        };
        frames.push(record);

        on_progress((i + 1) as f64 / total as f64 * 100.0);
        tokio::task::yield_now().await;
    }

    let filled = fill_gaps(&mut frames);
    info!(frames = frames.len(), detected, filled, "tracking finished");

    Ok(TrackingRun {
        frames,
        cancelled: false,
        detected,
    })
}
