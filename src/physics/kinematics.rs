//! Position, velocity, acceleration and power along the primary movement axis.

use crate::calibration::METERS_PER_YARD;
use crate::tracker::FrameRecord;

/// 1 ポンド = 0.453592 kg
pub const KG_PER_LB: f64 = 0.453592;

/// 重心を持つフレームの位置サンプル
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSample {
    pub frame: usize,
    pub timestamp: f64,
    /// 最初のサンプルからの移動距離（較正単位）
    pub position: f64,
}

/// 非有限値は 0 にする
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// 重心の x 座標から 1 次元の移動距離を作る
///
/// 重心のないフレームは捨てる。スケールが不正なら空。
pub fn track_positions(frames: &[FrameRecord], pixels_per_unit: f64) -> Vec<PositionSample> {
    if !(pixels_per_unit.is_finite() && pixels_per_unit > 0.0) {
        return Vec::new();
    }

    let mut origin = None;
    frames
        .iter()
        .filter_map(|f| {
            let com = f.center_of_mass?;
            if !com.x.is_finite() {
                return None;
            }
            let x0 = *origin.get_or_insert(com.x);
            Some(PositionSample {
                frame: f.frame_index,
                timestamp: f.timestamp,
                position: (com.x - x0).abs() / pixels_per_unit,
            })
        })
        .collect()
}

/// 固定刻み dt = 1/fps の前進差分
///
/// 先頭フレームの速度、先頭 2 フレームの加速度は 0。
pub fn fixed_step(positions: &[f64], fps: f64) -> (Vec<f64>, Vec<f64>) {
    let n = positions.len();
    let mut velocity = vec![0.0; n];
    let mut acceleration = vec![0.0; n];
    if !(fps.is_finite() && fps > 0.0) {
        return (velocity, acceleration);
    }

    for i in 1..n {
        velocity[i] = finite_or_zero((positions[i] - positions[i - 1]) * fps);
    }
    for i in 2..n {
        acceleration[i] = finite_or_zero((velocity[i] - velocity[i - 1]) * fps);
    }
    (velocity, acceleration)
}

/// 可変刻みの前進差分。dt <= 0 の区間は 0
pub fn variable_step(positions: &[f64], times: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let n = positions.len().min(times.len());
    let mut velocity = vec![0.0; n];
    let mut acceleration = vec![0.0; n];

    let rate = |delta: f64, dt: f64| {
        if dt > 0.0 && dt.is_finite() {
            finite_or_zero(delta / dt)
        } else {
            0.0
        }
    };

    for i in 1..n {
        velocity[i] = rate(positions[i] - positions[i - 1], times[i] - times[i - 1]);
    }
    for i in 2..n {
        acceleration[i] = rate(velocity[i] - velocity[i - 1], times[i] - times[i - 1]);
    }
    (velocity, acceleration)
}

/// 瞬間パワー (W)。入力はヤード系、計算は SI 系
pub fn power_watts(velocity: f64, acceleration: f64, weight_lbs: f64) -> f64 {
    let mass = weight_lbs * KG_PER_LB;
    let v = (velocity * METERS_PER_YARD).abs();
    let a = (acceleration * METERS_PER_YARD).abs();
    let power = mass * a * v;
    if power.is_finite() && power > 0.0 {
        power
    } else {
        0.0
    }
}

/// 初めて `distance` に到達した時刻（前後サンプルの線形補間）
pub fn crossing_time(positions: &[f64], times: &[f64], distance: f64) -> Option<f64> {
    let i = positions.iter().position(|&p| p >= distance)?;
    if i == 0 {
        return times.first().copied();
    }
    let (p0, p1) = (positions[i - 1], positions[i]);
    let (t0, t1) = (times[i - 1], times[i]);
    let span = p1 - p0;
    if span <= 0.0 {
        return Some(t1);
    }
    Some(finite_or_zero(t0 + (distance - p0) / span * (t1 - t0)))
}
