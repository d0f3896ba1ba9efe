use serde::{Deserialize, Serialize};

use super::kinematics::{crossing_time, finite_or_zero};
use super::smooth::moving_average;
use super::time_override::TimeOverrides;
use super::{acceleration_to_g, yards_per_second_to_mph, PhysicsFrame, PhysicsOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SplitSource {
    /// 動画から補間
    Video,
    /// 現場計測値
    Override,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitTime {
    /// ヤード
    pub distance: u32,
    /// 到達しなかった場合は None
    pub time: Option<f64>,
    pub source: SplitSource,
}

/// 全フレームの集計
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    /// yd/s
    pub max_velocity: f64,
    pub max_velocity_mph: f64,
    pub avg_velocity: f64,
    pub avg_velocity_mph: f64,
    /// 符号付きの最大加速度 (yd/s²)
    pub peak_acceleration: f64,
    pub peak_acceleration_g: f64,
    /// |加速度| の最大値 (g)
    pub max_acceleration_g: f64,
    /// W。体重が与えられたときのみ
    pub max_power: Option<f64>,
    pub total_time: f64,
    pub total_distance: f64,
    pub splits: Vec<SplitTime>,
}

fn max_of(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    finite_or_zero(max)
}

/// 平滑化した系列から最大値を取り、スプリットを求める
pub fn summarize(
    frames: &[PhysicsFrame],
    overrides: Option<&TimeOverrides>,
    options: &PhysicsOptions,
) -> AnalysisSummary {
    let window = options.smoothing_window;
    let velocity: Vec<f64> = frames.iter().map(|f| f.velocity).collect();
    let acceleration: Vec<f64> = frames.iter().map(|f| f.acceleration).collect();
    let positions: Vec<f64> = frames.iter().map(|f| f.position).collect();
    let times: Vec<f64> = frames.iter().map(|f| f.time).collect();

    let smoothed_velocity = moving_average(&velocity, window);
    let smoothed_acceleration = moving_average(&acceleration, window);

    let max_power = if frames.iter().any(|f| f.power.is_some()) {
        let power: Vec<f64> = frames.iter().map(|f| f.power.unwrap_or(0.0)).collect();
        Some(max_of(&moving_average(&power, window)))
    } else {
        None
    };

    let max_velocity = max_of(&smoothed_velocity);
    let peak_acceleration = max_of(&smoothed_acceleration);
    let max_abs_acceleration = max_of(
        &smoothed_acceleration
            .iter()
            .map(|a| a.abs())
            .collect::<Vec<_>>(),
    );

    let (total_time, total_distance) = match (frames.first(), frames.last()) {
        (Some(first), Some(last)) => (finite_or_zero(last.time - first.time), last.position),
        _ => (0.0, 0.0),
    };
    let avg_velocity = if total_time > 0.0 {
        finite_or_zero(total_distance / total_time)
    } else {
        0.0
    };

    let splits = options
        .split_distances
        .iter()
        .map(|&distance| match overrides.and_then(|o| o.split(distance)) {
            Some(time) => SplitTime {
                distance,
                time: Some(time),
                source: SplitSource::Override,
            },
            None => SplitTime {
                distance,
                time: crossing_time(&positions, &times, distance as f64),
                source: SplitSource::Video,
            },
        })
        .collect();

    AnalysisSummary {
        max_velocity,
        max_velocity_mph: yards_per_second_to_mph(max_velocity),
        avg_velocity,
        avg_velocity_mph: yards_per_second_to_mph(avg_velocity),
        peak_acceleration,
        peak_acceleration_g: acceleration_to_g(peak_acceleration),
        max_acceleration_g: acceleration_to_g(max_abs_acceleration),
        max_power,
        total_time,
        total_distance,
        splits,
    }
}
