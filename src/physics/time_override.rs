use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::kinematics::{crossing_time, finite_or_zero};

/// 現場で計測したタイム（動画から求めた時間より優先される）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeOverrides {
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    /// 距離（ヤード） → 計測タイム（秒）
    #[serde(default)]
    pub splits: BTreeMap<u32, Option<f64>>,
}

fn usable(time: Option<f64>) -> Option<f64> {
    time.filter(|t| t.is_finite() && *t >= 0.0)
}

impl TimeOverrides {
    pub fn with_split(mut self, distance: u32, time: f64) -> Self {
        self.splits.insert(distance, Some(time));
        self
    }

    pub fn start(&self) -> Option<f64> {
        usable(self.start_time)
    }

    pub fn end(&self) -> Option<f64> {
        usable(self.end_time)
    }

    pub fn split(&self, distance: u32) -> Option<f64> {
        self.splits.get(&distance).copied().flatten().and_then(|t| usable(Some(t)))
    }

    /// 使える値が 1 つでもあるか
    pub fn is_active(&self) -> bool {
        self.start().is_some()
            || self.end().is_some()
            || self.splits.keys().any(|d| self.split(*d).is_some())
    }

    /// (位置, 時刻) の制御点。位置順、同じ位置は先に現れたものを採用
    ///
    /// 始点は 0 ↦ start_time（なければ元の先頭時刻 0）、終点は最終位置 ↦ end_time。
    pub fn control_points(&self, final_position: f64) -> Vec<(f64, f64)> {
        let mut points = vec![(0.0, self.start().unwrap_or(0.0))];
        for &distance in self.splits.keys() {
            if distance == 0 {
                continue;
            }
            if let Some(time) = self.split(distance) {
                points.push((distance as f64, time));
            }
        }
        if let Some(end) = self.end() {
            if final_position > 0.0 && final_position.is_finite() {
                points.push((final_position, end));
            }
        }

        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.dedup_by(|later, earlier| later.0 == earlier.0);
        points
    }
}

/// 各サンプルの時刻を制御点間の位置による線形補間で置き換える
///
/// 最後の制御点より先のサンプルは、その制御点を通過した元の時刻からの経過時間を足す。
pub fn rescale_times(positions: &[f64], original_times: &[f64], points: &[(f64, f64)]) -> Vec<f64> {
    let Some(&(last_pos, last_time)) = points.last() else {
        return original_times.to_vec();
    };
    let first_time = points[0].1;
    let last_crossing = crossing_time(positions, original_times, last_pos);

    positions
        .iter()
        .zip(original_times)
        .map(|(&p, &orig)| {
            if p <= points[0].0 {
                return first_time;
            }
            if p > last_pos {
                let crossed = last_crossing.unwrap_or(orig);
                return finite_or_zero(last_time + (orig - crossed));
            }
            let k = points
                .windows(2)
                .position(|w| p >= w[0].0 && p <= w[1].0)
                .unwrap_or(0);
            let (p0, t0) = points[k];
            let (p1, t1) = points.get(k + 1).copied().unwrap_or((p0, t0));
            let span = p1 - p0;
            if span <= 0.0 {
                return t0;
            }
            finite_or_zero(t0 + (p - p0) / span * (t1 - t0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_inactive_by_default() {
        let overrides = TimeOverrides::default();
        assert!(!overrides.is_active());

        let mut nulls = TimeOverrides::default();
        nulls.splits.insert(10, None);
        nulls.start_time = Some(f64::NAN);
        assert!(!nulls.is_active());

        assert!(TimeOverrides::default().with_split(10, 1.6).is_active());
    }

    #[test]
    fn test_control_points_sorted_and_bounded() {
        let overrides = TimeOverrides {
            start_time: Some(0.2),
            end_time: Some(5.0),
            splits: BTreeMap::from([(20, Some(2.9)), (10, Some(1.7)), (30, None)]),
        };
        let points = overrides.control_points(40.0);
        assert_eq!(points, vec![(0.0, 0.2), (10.0, 1.7), (20.0, 2.9), (40.0, 5.0)]);
    }

    #[test]
    fn test_split_at_final_position_wins_over_end() {
        let overrides = TimeOverrides {
            start_time: None,
            end_time: Some(5.2),
            splits: BTreeMap::from([(40, Some(5.0))]),
        };
        let points = overrides.control_points(40.0);
        assert_eq!(points, vec![(0.0, 0.0), (40.0, 5.0)]);
    }

    #[test]
    fn test_rescale_between_points() {
        let positions = [0.0, 5.0, 10.0, 25.0, 40.0];
        let original = [0.0, 0.5, 1.0, 2.5, 4.0];
        let points = [(0.0, 0.0), (10.0, 1.5), (40.0, 5.0)];
        let times = rescale_times(&positions, &original, &points);
        assert!(approx_eq(times[1], 0.75, 1e-12));
        assert!(approx_eq(times[2], 1.5, 1e-12));
        assert!(approx_eq(times[3], 3.25, 1e-12));
        assert!(approx_eq(times[4], 5.0, 1e-12));
    }

    #[test]
    fn test_rescale_beyond_last_point_keeps_original_pace() {
        let positions = [0.0, 10.0, 20.0, 30.0];
        let original = [0.0, 1.0, 2.0, 3.0];
        let points = [(0.0, 0.5)];
        let times = rescale_times(&positions, &original, &points);
        assert_eq!(times, vec![0.5, 1.5, 2.5, 3.5]);
    }
}
