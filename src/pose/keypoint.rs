use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// ランドマークインデックス → キーポイント
pub type KeypointMap = BTreeMap<usize, Keypoint>;

/// 単一キーポイント（ピクセル座標）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    /// 信頼度スコア (0.0〜1.0)
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, score: f64) -> Self {
        Self {
            x,
            y,
            score,
            name: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 信頼度が閾値以上か（NaN座標は常に無効）
    pub fn is_valid(&self, threshold: f64) -> bool {
        self.score >= threshold && self.x.is_finite() && self.y.is_finite()
    }

    pub fn position(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

/// ピクセル座標上の点
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(&self, other: &PixelPoint) -> PixelPoint {
        PixelPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// 信頼度付きの派生点（重心・頭部位置）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub x: f64,
    pub y: f64,
    pub score: f64,
}

impl ScoredPoint {
    pub fn new(x: f64, y: f64, score: f64) -> Self {
        Self { x, y, score }
    }

    pub fn position(&self) -> PixelPoint {
        PixelPoint::new(self.x, self.y)
    }
}

/// 左右
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// 画面上の進行方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementDirection {
    Left,
    #[default]
    Right,
}

impl MovementDirection {
    /// 進行方向を +x に揃えるための符号
    pub fn sign(self) -> f64 {
        match self {
            MovementDirection::Left => -1.0,
            MovementDirection::Right => 1.0,
        }
    }
}

/// 1フレーム分の姿勢推定結果
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseResult {
    pub keypoints: KeypointMap,
    /// 姿勢全体のスコア
    pub score: f64,
}

impl PoseResult {
    pub fn new(keypoints: KeypointMap, score: f64) -> Self {
        Self { keypoints, score }
    }

    /// 全キーポイントの平均信頼度
    pub fn average_confidence(&self) -> f64 {
        if self.keypoints.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.keypoints.values().map(|k| k.score).sum();
        sum / self.keypoints.len() as f64
    }

    /// 指定インデックスのみ残し、閾値未満のキーポイントを落とす
    pub fn restrict(&self, indices: &[usize], threshold: f64) -> KeypointMap {
        self.keypoints
            .iter()
            .filter(|(idx, kp)| indices.contains(idx) && kp.is_valid(threshold))
            .map(|(idx, kp)| (*idx, kp.clone()))
            .collect()
    }
}
