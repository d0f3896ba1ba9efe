use serde::{Deserialize, Serialize};

use crate::pose::{KeypointMap, ScoredPoint, Side};

/// キーポイントの出所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    /// 姿勢推定器の検出値
    Detected,
    /// 検出なし（補間前）
    Missing,
    /// 前後フレームからの補間、または端点のコピー
    Interpolated,
    /// ユーザーによる手動補正（補間の境界として固定される）
    ManuallyAdjusted,
}

/// バイオメカニクス指標（角度は度）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Biomechanics {
    pub spine_angle: Option<f64>,
    pub shin_angle: Option<f64>,
    pub foot_angle: Option<f64>,
    pub lead_leg: Option<Side>,
}

/// 追跡シーケンスの 1 フレーム
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    pub frame_index: usize,
    /// 動画内の時刻（秒）
    pub timestamp: f64,
    pub keypoints: Option<KeypointMap>,
    pub center_of_mass: Option<ScoredPoint>,
    pub head_position: Option<ScoredPoint>,
    pub biomechanics: Option<Biomechanics>,
    /// このフレームで姿勢が検出されなかった（補間後も記録として残る）
    pub is_missing: bool,
    pub provenance: Provenance,
}

impl FrameRecord {
    pub fn detected(
        frame_index: usize,
        timestamp: f64,
        keypoints: KeypointMap,
        center_of_mass: Option<ScoredPoint>,
        head_position: Option<ScoredPoint>,
        biomechanics: Option<Biomechanics>,
    ) -> Self {
        Self {
            frame_index,
            timestamp,
            keypoints: Some(keypoints),
            center_of_mass,
            head_position,
            biomechanics,
            is_missing: false,
            provenance: Provenance::Detected,
        }
    }

    pub fn missing(frame_index: usize, timestamp: f64) -> Self {
        Self {
            frame_index,
            timestamp,
            keypoints: None,
            center_of_mass: None,
            head_position: None,
            biomechanics: None,
            is_missing: true,
            provenance: Provenance::Missing,
        }
    }

    /// 補間の材料として使えるか
    pub fn has_pose(&self) -> bool {
        self.provenance != Provenance::Missing
    }

    pub fn is_interpolated(&self) -> bool {
        self.provenance == Provenance::Interpolated
    }

    pub fn is_manually_adjusted(&self) -> bool {
        self.provenance == Provenance::ManuallyAdjusted
    }
}
