pub mod kinematics;
pub mod smooth;
pub mod summary;
pub mod time_override;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::tracker::FrameRecord;

pub use kinematics::{crossing_time, power_watts, PositionSample};
pub use smooth::moving_average;
pub use summary::{AnalysisSummary, SplitSource, SplitTime};
pub use time_override::TimeOverrides;

use kinematics::{finite_or_zero, fixed_step, track_positions, variable_step};
use time_override::rescale_times;

/// yd/s → mph
pub const YARDS_PER_SECOND_TO_MPH: f64 = 2.045454545;
/// 重力加速度 (ft/s²)。g 換算の除数
pub const GRAVITY_FT_PER_S2: f64 = 32.174;

pub const DEFAULT_SMOOTHING_WINDOW: usize = 5;
pub const DEFAULT_SPLIT_DISTANCES: [u32; 4] = [10, 20, 30, 40];

pub fn yards_per_second_to_mph(velocity: f64) -> f64 {
    finite_or_zero(velocity * YARDS_PER_SECOND_TO_MPH)
}

/// 加速度 → g（32.174 で割る）
pub fn acceleration_to_g(acceleration: f64) -> f64 {
    finite_or_zero(acceleration / GRAVITY_FT_PER_S2)
}

/// 1 フレームの運動量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsFrame {
    pub frame: usize,
    /// 最初に追跡できたサンプルからの経過秒（計測タイム指定時は補正後）
    pub time: f64,
    /// 開始位置からの距離（ヤード）
    pub position: f64,
    /// yd/s
    pub velocity: f64,
    pub velocity_mph: f64,
    /// yd/s²
    pub acceleration: f64,
    pub acceleration_g: f64,
    /// W
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsAnalysis {
    pub frames: Vec<PhysicsFrame>,
    pub summary: AnalysisSummary,
    pub has_time_overrides: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsOptions {
    /// 集計前の移動平均の窓幅（フレーム）
    pub smoothing_window: usize,
    /// スプリットを求める距離（ヤード）
    pub split_distances: Vec<u32>,
}

impl Default for PhysicsOptions {
    fn default() -> Self {
        Self {
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            split_distances: DEFAULT_SPLIT_DISTANCES.to_vec(),
        }
    }
}

/// 既定の設定で [`calculate_with`] を呼ぶ
pub fn calculate(
    frames: &[FrameRecord],
    pixels_per_unit: f64,
    fps: f64,
    overrides: Option<&TimeOverrides>,
    athlete_weight_lbs: Option<f64>,
) -> Option<PhysicsAnalysis> {
    calculate_with(
        frames,
        pixels_per_unit,
        fps,
        overrides,
        athlete_weight_lbs,
        &PhysicsOptions::default(),
    )
}

/// フレーム列から速度・加速度・パワーと集計値を求める
///
/// 重心を持つフレームが 2 つ未満、またはスケール・fps が不正なら None（データ不足）。
pub fn calculate_with(
    frames: &[FrameRecord],
    pixels_per_unit: f64,
    fps: f64,
    overrides: Option<&TimeOverrides>,
    athlete_weight_lbs: Option<f64>,
    options: &PhysicsOptions,
) -> Option<PhysicsAnalysis> {
    if !(fps.is_finite() && fps > 0.0) {
        debug!(fps, "invalid frame rate");
        return None;
    }

    let samples = track_positions(frames, pixels_per_unit);
    if samples.len() < 2 {
        debug!(samples = samples.len(), "insufficient position samples");
        return None;
    }

    let positions: Vec<f64> = samples.iter().map(|s| s.position).collect();
    let origin = samples[0].timestamp;
    let original_times: Vec<f64> = samples
        .iter()
        .map(|s| finite_or_zero(s.timestamp - origin))
        .collect();

    let active_overrides = overrides.filter(|o| o.is_active());
    let (times, velocity, acceleration) = match active_overrides {
        Some(o) => {
            let final_position = positions[positions.len() - 1];
            let points = o.control_points(final_position);
            let times = rescale_times(&positions, &original_times, &points);
            let (v, a) = variable_step(&positions, &times);
            (times, v, a)
        }
        None => {
            let (v, a) = fixed_step(&positions, fps);
            (original_times, v, a)
        }
    };

    let weight = athlete_weight_lbs.filter(|w| w.is_finite() && *w > 0.0);

    let physics_frames: Vec<PhysicsFrame> = samples
        .iter()
        .enumerate()
        .map(|(i, sample)| PhysicsFrame {
            frame: sample.frame,
            time: times[i],
            position: finite_or_zero(sample.position),
            velocity: velocity[i],
            velocity_mph: yards_per_second_to_mph(velocity[i]),
            acceleration: acceleration[i],
            acceleration_g: acceleration_to_g(acceleration[i]),
            power: weight.map(|w| power_watts(velocity[i], acceleration[i], w)),
        })
        .collect();

    let summary = summary::summarize(&physics_frames, active_overrides, options);

    Some(PhysicsAnalysis {
        frames: physics_frames,
        summary,
        has_time_overrides: active_overrides.is_some(),
    })
}
