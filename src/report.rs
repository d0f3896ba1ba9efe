use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::physics::PhysicsAnalysis;

/// 選手記録に追加する 1 回分の計測結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceEntry {
    pub date: NaiveDate,
    pub drill_name: String,
    pub max_speed_mph: f64,
    pub max_acceleration_g: f64,
    pub max_power: Option<f64>,
    /// 距離（ヤード） → 秒。到達しなかった距離は含めない
    pub splits: BTreeMap<u32, f64>,
    pub has_time_overrides: bool,
}

impl PhysicsAnalysis {
    pub fn performance_entry(&self, date: NaiveDate, drill_name: impl Into<String>) -> PerformanceEntry {
        let splits = self
            .summary
            .splits
            .iter()
            .filter_map(|s| s.time.map(|t| (s.distance, t)))
            .collect();

        PerformanceEntry {
            date,
            drill_name: drill_name.into(),
            max_speed_mph: self.summary.max_velocity_mph,
            max_acceleration_g: self.summary.max_acceleration_g,
            max_power: self.summary.max_power,
            splits,
            has_time_overrides: self.has_time_overrides,
        }
    }
}
