use serde::{Deserialize, Serialize};

use super::keypoint::Side;

/// モデル非依存の身体ランドマーク
///
/// 派生点の計算はこの名前でのみランドマークを参照し、
/// 実際のインデックスは [`LandmarkSchema`] が解決する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Landmark {
    Nose,
    LeftEye,
    RightEye,
    LeftEar,
    RightEar,
    LeftShoulder,
    RightShoulder,
    LeftElbow,
    RightElbow,
    LeftWrist,
    RightWrist,
    LeftHip,
    RightHip,
    LeftKnee,
    RightKnee,
    LeftAnkle,
    RightAnkle,
    LeftHeel,
    RightHeel,
    LeftToe,
    RightToe,
}

impl Landmark {
    pub const ALL: [Landmark; 21] = [
        Landmark::Nose,
        Landmark::LeftEye,
        Landmark::RightEye,
        Landmark::LeftEar,
        Landmark::RightEar,
        Landmark::LeftShoulder,
        Landmark::RightShoulder,
        Landmark::LeftElbow,
        Landmark::RightElbow,
        Landmark::LeftWrist,
        Landmark::RightWrist,
        Landmark::LeftHip,
        Landmark::RightHip,
        Landmark::LeftKnee,
        Landmark::RightKnee,
        Landmark::LeftAnkle,
        Landmark::RightAnkle,
        Landmark::LeftHeel,
        Landmark::RightHeel,
        Landmark::LeftToe,
        Landmark::RightToe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Landmark::Nose => "nose",
            Landmark::LeftEye => "left_eye",
            Landmark::RightEye => "right_eye",
            Landmark::LeftEar => "left_ear",
            Landmark::RightEar => "right_ear",
            Landmark::LeftShoulder => "left_shoulder",
            Landmark::RightShoulder => "right_shoulder",
            Landmark::LeftElbow => "left_elbow",
            Landmark::RightElbow => "right_elbow",
            Landmark::LeftWrist => "left_wrist",
            Landmark::RightWrist => "right_wrist",
            Landmark::LeftHip => "left_hip",
            Landmark::RightHip => "right_hip",
            Landmark::LeftKnee => "left_knee",
            Landmark::RightKnee => "right_knee",
            Landmark::LeftAnkle => "left_ankle",
            Landmark::RightAnkle => "right_ankle",
            Landmark::LeftHeel => "left_heel",
            Landmark::RightHeel => "right_heel",
            Landmark::LeftToe => "left_toe",
            Landmark::RightToe => "right_toe",
        }
    }

    pub fn knee(side: Side) -> Self {
        match side {
            Side::Left => Landmark::LeftKnee,
            Side::Right => Landmark::RightKnee,
        }
    }

    pub fn ankle(side: Side) -> Self {
        match side {
            Side::Left => Landmark::LeftAnkle,
            Side::Right => Landmark::RightAnkle,
        }
    }

    pub fn heel(side: Side) -> Self {
        match side {
            Side::Left => Landmark::LeftHeel,
            Side::Right => Landmark::RightHeel,
        }
    }

    pub fn toe(side: Side) -> Self {
        match side {
            Side::Left => Landmark::LeftToe,
            Side::Right => Landmark::RightToe,
        }
    }
}

/// ランドマークスキーマの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// MoveNet / COCO の 17 点（踵・つま先なし）
    #[default]
    Coco17,
    /// BlazePose の 33 点
    #[serde(rename = "blazepose33")]
    BlazePose33,
}

/// MoveNet の 17 キーポイントインデックス
const COCO17: &[(Landmark, usize)] = &[
    (Landmark::Nose, 0),
    (Landmark::LeftEye, 1),
    (Landmark::RightEye, 2),
    (Landmark::LeftEar, 3),
    (Landmark::RightEar, 4),
    (Landmark::LeftShoulder, 5),
    (Landmark::RightShoulder, 6),
    (Landmark::LeftElbow, 7),
    (Landmark::RightElbow, 8),
    (Landmark::LeftWrist, 9),
    (Landmark::RightWrist, 10),
    (Landmark::LeftHip, 11),
    (Landmark::RightHip, 12),
    (Landmark::LeftKnee, 13),
    (Landmark::RightKnee, 14),
    (Landmark::LeftAnkle, 15),
    (Landmark::RightAnkle, 16),
];

/// BlazePose の 33 点のうち使用するもの（目は中央点、つま先は foot_index）
const BLAZEPOSE33: &[(Landmark, usize)] = &[
    (Landmark::Nose, 0),
    (Landmark::LeftEye, 2),
    (Landmark::RightEye, 5),
    (Landmark::LeftEar, 7),
    (Landmark::RightEar, 8),
    (Landmark::LeftShoulder, 11),
    (Landmark::RightShoulder, 12),
    (Landmark::LeftElbow, 13),
    (Landmark::RightElbow, 14),
    (Landmark::LeftWrist, 15),
    (Landmark::RightWrist, 16),
    (Landmark::LeftHip, 23),
    (Landmark::RightHip, 24),
    (Landmark::LeftKnee, 25),
    (Landmark::RightKnee, 26),
    (Landmark::LeftAnkle, 27),
    (Landmark::RightAnkle, 28),
    (Landmark::LeftHeel, 29),
    (Landmark::RightHeel, 30),
    (Landmark::LeftToe, 31),
    (Landmark::RightToe, 32),
];

/// ランドマーク名 ⇔ モデル出力インデックスの対応表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LandmarkSchema {
    kind: SchemaKind,
    count: usize,
    table: &'static [(Landmark, usize)],
}

impl LandmarkSchema {
    pub fn coco17() -> Self {
        Self {
            kind: SchemaKind::Coco17,
            count: 17,
            table: COCO17,
        }
    }

    pub fn blazepose33() -> Self {
        Self {
            kind: SchemaKind::BlazePose33,
            count: 33,
            table: BLAZEPOSE33,
        }
    }

    pub fn from_kind(kind: SchemaKind) -> Self {
        match kind {
            SchemaKind::Coco17 => Self::coco17(),
            SchemaKind::BlazePose33 => Self::blazepose33(),
        }
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// モデルが出力するキーポイント総数
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn index(&self, landmark: Landmark) -> Option<usize> {
        self.table
            .iter()
            .find(|(lm, _)| *lm == landmark)
            .map(|(_, idx)| *idx)
    }

    pub fn landmark(&self, index: usize) -> Option<Landmark> {
        self.table
            .iter()
            .find(|(_, idx)| *idx == index)
            .map(|(lm, _)| *lm)
    }

    /// 踵・つま先を持つか（足首角度の精度に影響）
    pub fn has_feet(&self) -> bool {
        self.index(Landmark::LeftHeel).is_some() && self.index(Landmark::LeftToe).is_some()
    }

    /// プロファイルのランドマークのうち、このスキーマに存在するもののインデックス
    pub fn profile_indices(&self, profile: TrackingProfile) -> Vec<usize> {
        let mut indices: Vec<usize> = profile
            .landmarks()
            .iter()
            .filter_map(|lm| self.index(*lm))
            .collect();
        indices.sort_unstable();
        indices
    }
}

impl Default for LandmarkSchema {
    fn default() -> Self {
        Self::coco17()
    }
}

/// ドリル種別ごとの追跡対象ランドマーク
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingProfile {
    /// 40ヤード走など直線スプリント
    #[default]
    Sprint,
    /// 垂直跳び・立ち幅跳び（腕振りを含む）
    Jump,
    /// シャトル・3コーン
    Agility,
    Full,
}

const HEAD: [Landmark; 5] = [
    Landmark::Nose,
    Landmark::LeftEye,
    Landmark::RightEye,
    Landmark::LeftEar,
    Landmark::RightEar,
];

const TORSO_AND_LEGS: [Landmark; 8] = [
    Landmark::LeftShoulder,
    Landmark::RightShoulder,
    Landmark::LeftHip,
    Landmark::RightHip,
    Landmark::LeftKnee,
    Landmark::RightKnee,
    Landmark::LeftAnkle,
    Landmark::RightAnkle,
];

const FEET: [Landmark; 4] = [
    Landmark::LeftHeel,
    Landmark::RightHeel,
    Landmark::LeftToe,
    Landmark::RightToe,
];

const ARMS: [Landmark; 4] = [
    Landmark::LeftElbow,
    Landmark::RightElbow,
    Landmark::LeftWrist,
    Landmark::RightWrist,
];

impl TrackingProfile {
    pub fn landmarks(self) -> Vec<Landmark> {
        let mut landmarks: Vec<Landmark> = HEAD.iter().chain(TORSO_AND_LEGS.iter()).copied().collect();
        match self {
            TrackingProfile::Sprint => landmarks.extend(FEET),
            TrackingProfile::Jump => {
                landmarks.extend(FEET);
                landmarks.extend(ARMS);
            }
            TrackingProfile::Agility => {}
            TrackingProfile::Full => return Landmark::ALL.to_vec(),
        }
        landmarks
    }
}
