use crate::pose::{
    Keypoint, KeypointMap, Landmark, LandmarkSchema, MovementDirection, PixelPoint, ScoredPoint,
    Side,
};

use super::frame::Biomechanics;

/// 派生点の計算に使う最低信頼度
pub const MIN_CONFIDENCE: f64 = 0.3;

/// 重心の腰側の重み（肩側は 1 - HIP_WEIGHT）
const HIP_WEIGHT: f64 = 0.6;

/// キーポイントから重心・頭部・関節角度を計算する
///
/// 状態を持たない。ランドマークはすべてスキーマ経由で名前から引く。
/// 座標は画像座標系（y 下向き）。角度は進行方向を +x に揃えてから計算する。
#[derive(Debug, Clone, Copy)]
pub struct DerivedPoints {
    schema: LandmarkSchema,
    confidence_floor: f64,
}

impl DerivedPoints {
    pub fn new(schema: LandmarkSchema) -> Self {
        Self {
            schema,
            confidence_floor: MIN_CONFIDENCE,
        }
    }

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor;
        self
    }

    pub fn schema(&self) -> LandmarkSchema {
        self.schema
    }

    fn point<'a>(&self, keypoints: &'a KeypointMap, landmark: Landmark) -> Option<&'a Keypoint> {
        let index = self.schema.index(landmark)?;
        keypoints
            .get(&index)
            .filter(|kp| kp.is_valid(self.confidence_floor))
    }

    fn midpoint(&self, keypoints: &KeypointMap, a: Landmark, b: Landmark) -> Option<(PixelPoint, f64)> {
        let a = self.point(keypoints, a)?;
        let b = self.point(keypoints, b)?;
        Some((a.position().midpoint(&b.position()), (a.score + b.score) / 2.0))
    }

    /// 肩中点と腰中点の加重平均 (0.4 / 0.6)
    pub fn center_of_mass(&self, keypoints: &KeypointMap) -> Option<ScoredPoint> {
        let (shoulder, shoulder_score) =
            self.midpoint(keypoints, Landmark::LeftShoulder, Landmark::RightShoulder)?;
        let (hip, hip_score) = self.midpoint(keypoints, Landmark::LeftHip, Landmark::RightHip)?;

        let w = HIP_WEIGHT;
        Some(ScoredPoint::new(
            (1.0 - w) * shoulder.x + w * hip.x,
            (1.0 - w) * shoulder.y + w * hip.y,
            (shoulder_score + hip_score) / 2.0,
        ))
    }

    /// 鼻 → 両耳の平均 → 片耳 の順で頭部位置を決める
    pub fn head_position(&self, keypoints: &KeypointMap) -> Option<ScoredPoint> {
        if let Some(nose) = self.point(keypoints, Landmark::Nose) {
            return Some(ScoredPoint::new(nose.x, nose.y, nose.score));
        }

        let left = self.point(keypoints, Landmark::LeftEar);
        let right = self.point(keypoints, Landmark::RightEar);
        match (left, right) {
            (Some(l), Some(r)) => Some(ScoredPoint::new(
                (l.x + r.x) / 2.0,
                (l.y + r.y) / 2.0,
                (l.score + r.score) / 2.0,
            )),
            (Some(ear), None) | (None, Some(ear)) => Some(ScoredPoint::new(ear.x, ear.y, ear.score)),
            (None, None) => None,
        }
    }

    /// 進行方向により前にある足首の側
    pub fn lead_leg(&self, keypoints: &KeypointMap, direction: MovementDirection) -> Option<Side> {
        let left = self.point(keypoints, Landmark::LeftAnkle);
        let right = self.point(keypoints, Landmark::RightAnkle);
        match (left, right) {
            (Some(l), Some(r)) => {
                if direction.sign() * (r.x - l.x) > 0.0 {
                    Some(Side::Right)
                } else {
                    Some(Side::Left)
                }
            }
            (Some(_), None) => Some(Side::Left),
            (None, Some(_)) => Some(Side::Right),
            (None, None) => None,
        }
    }

    /// 鉛直軸と 腰中点→頭部 ベクトルのなす角。正 = 前傾
    pub fn spine_angle(&self, keypoints: &KeypointMap, direction: MovementDirection) -> Option<f64> {
        let head = self.head_position(keypoints)?;
        let (hip, _) = self.midpoint(keypoints, Landmark::LeftHip, Landmark::RightHip)?;

        let forward = direction.sign() * (head.x - hip.x);
        let up = hip.y - head.y;
        Some(f64::atan2(forward, up).to_degrees())
    }

    /// 鉛直軸と 膝→足首 ベクトルのなす角。正 = 膝が足首より前
    pub fn shin_angle(
        &self,
        keypoints: &KeypointMap,
        side: Side,
        direction: MovementDirection,
    ) -> Option<f64> {
        let knee = self.point(keypoints, Landmark::knee(side))?;
        let ankle = self.point(keypoints, Landmark::ankle(side))?;

        let forward = direction.sign() * (knee.x - ankle.x);
        let down = ankle.y - knee.y;
        Some(f64::atan2(forward, down).to_degrees())
    }

    /// 水平軸と 踵→つま先 のなす角。正 = つま先が上（背屈）
    ///
    /// 踵・つま先を持たないスキーマでは、足部が脛に直交していると仮定して
    /// 脛角度から推定する。
    pub fn foot_angle(
        &self,
        keypoints: &KeypointMap,
        side: Side,
        direction: MovementDirection,
    ) -> Option<f64> {
        if !self.schema.has_feet() {
            return self.shin_angle(keypoints, side, direction).map(|shin| -shin);
        }

        let heel = self.point(keypoints, Landmark::heel(side))?;
        let toe = self.point(keypoints, Landmark::toe(side))?;

        let forward = direction.sign() * (toe.x - heel.x);
        let up = heel.y - toe.y;
        Some(f64::atan2(up, forward).to_degrees())
    }

    pub fn biomechanics(&self, keypoints: &KeypointMap, direction: MovementDirection) -> Biomechanics {
        let lead_leg = self.lead_leg(keypoints, direction);
        Biomechanics {
            spine_angle: self.spine_angle(keypoints, direction),
            shin_angle: lead_leg.and_then(|side| self.shin_angle(keypoints, side, direction)),
            foot_angle: lead_leg.and_then(|side| self.foot_angle(keypoints, side, direction)),
            lead_leg,
        }
    }
}
