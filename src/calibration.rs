use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

use crate::error::AnalysisError;
use crate::pose::PixelPoint;

/// 1 ヤード = 0.9144 メートル
pub const METERS_PER_YARD: f64 = 0.9144;

// --- データ構造 ---

/// キャリブレーション方式（マーカー数の上限が変わる）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CalibrationMode {
    /// 2 点間の距離
    #[default]
    Line,
    /// 3 コーン
    Cones,
    /// 4 点グリッド
    Grid,
}

impl CalibrationMode {
    pub fn max_markers(self) -> usize {
        match self {
            CalibrationMode::Line => 2,
            CalibrationMode::Cones => 3,
            CalibrationMode::Grid => 4,
        }
    }

    fn label(self, n: usize) -> String {
        match self {
            CalibrationMode::Line => (if n == 0 { "Start" } else { "End" }).to_string(),
            CalibrationMode::Cones => format!("Cone {}", n + 1),
            CalibrationMode::Grid => format!("P{}", n + 1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Yards,
    Meters,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub x: f64,
    pub y: f64,
    pub label: String,
}

impl Marker {
    pub fn position(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

/// 2 点のピクセル距離 / 実距離。マーカー不足・距離が不正なら None
///
/// 3 点目以降のマーカーは表示用で、スケールには使わない。
pub fn compute_scale(markers: &[PixelPoint], real_distance: f64) -> Option<f64> {
    if markers.len() < 2 || !(real_distance.is_finite() && real_distance > 0.0) {
        return None;
    }
    let pixels = markers[0].distance_to(&markers[1]);
    let scale = pixels / real_distance;
    (scale.is_finite() && scale > 0.0).then_some(scale)
}

/// 画面上のマーカーと実距離から求めたスケール
///
/// スケールは一度求まるとマーカーをリセットするまで変わらない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationState {
    pub mode: CalibrationMode,
    pub markers: Vec<Marker>,
    pub real_world_distance: Option<f64>,
    pub unit: DistanceUnit,
    pixels_per_unit: Option<f64>,
}

impl CalibrationState {
    pub fn new(mode: CalibrationMode) -> Self {
        Self {
            mode,
            markers: Vec::new(),
            real_world_distance: None,
            unit: DistanceUnit::Yards,
            pixels_per_unit: None,
        }
    }

    /// マーカーを追加する。上限に達していれば false
    pub fn add_marker(&mut self, x: f64, y: f64) -> bool {
        if self.markers.len() >= self.mode.max_markers() {
            return false;
        }
        let label = self.mode.label(self.markers.len());
        self.markers.push(Marker { x, y, label });
        self.try_compute();
        true
    }

    /// 実距離を設定する。キャリブレーション済みなら無視して false
    pub fn set_distance(&mut self, distance: f64, unit: DistanceUnit) -> bool {
        if self.is_calibrated() {
            warn!("calibration is locked; reset markers before changing the distance");
            return false;
        }
        self.real_world_distance = Some(distance);
        self.unit = unit;
        self.try_compute();
        true
    }

    fn try_compute(&mut self) {
        if self.pixels_per_unit.is_some() {
            return;
        }
        let Some(distance) = self.real_world_distance else {
            return;
        };
        let points: Vec<PixelPoint> = self.markers.iter().map(Marker::position).collect();
        self.pixels_per_unit = compute_scale(&points, distance);
        if let Some(scale) = self.pixels_per_unit {
            info!(scale, unit = ?self.unit, "calibrated");
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.pixels_per_unit.is_some()
    }

    pub fn pixels_per_unit(&self) -> Option<f64> {
        self.pixels_per_unit
    }

    /// 物理計算用にヤード単位へ揃えたスケール
    pub fn pixels_per_yard(&self) -> Option<f64> {
        self.pixels_per_unit.map(|ppu| match self.unit {
            DistanceUnit::Yards => ppu,
            DistanceUnit::Meters => ppu * METERS_PER_YARD,
        })
    }

    /// 解析開始の前提条件
    pub fn require_pixels_per_yard(&self) -> std::result::Result<f64, AnalysisError> {
        if self.markers.len() < 2 {
            return Err(AnalysisError::CalibrationIncomplete("at least two markers are required"));
        }
        match self.real_world_distance {
            Some(d) if d.is_finite() && d > 0.0 => {}
            _ => return Err(AnalysisError::CalibrationIncomplete("a positive real-world distance is required")),
        }
        self.pixels_per_yard()
            .ok_or(AnalysisError::CalibrationIncomplete("markers must not coincide"))
    }

    /// マーカーとスケールを破棄する（距離と単位は残す）
    pub fn reset(&mut self) {
        self.markers.clear();
        self.pixels_per_unit = None;
    }
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self::new(CalibrationMode::Line)
    }
}

// --- Save / Load ---

pub fn save_calibration(path: &str, cal: &CalibrationState) -> Result<()> {
    let json = serde_json::to_string_pretty(cal)?;
    fs::write(path, json).context("Failed to write calibration file")?;
    Ok(())
}

pub fn load_calibration(path: &str) -> Result<CalibrationState> {
    let content = fs::read_to_string(path).context("Failed to read calibration file")?;
    let cal: CalibrationState = serde_json::from_str(&content)?;
    Ok(cal)
}
