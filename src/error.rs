/// 解析パイプラインのエラー
///
/// 検出ミス（フレームに人物がいない）・データ不足・キャンセルはエラーではなく、
/// それぞれ `Ok(None)` / `None` / `TrackingRun::cancelled` で表現する。
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// 姿勢推定器の初期化失敗（自動リトライはしない）
    #[error("pose estimator failed to initialize: {0}")]
    Initialization(String),

    #[error("pose estimator is not ready (call initialize first)")]
    NotReady,

    #[error("pose detection failed: {0}")]
    Detection(String),

    #[error("video error: {0}")]
    Video(String),

    #[error("calibration incomplete: {0}")]
    CalibrationIncomplete(&'static str),

    #[error("frame {index} is out of range (sequence has {len} frames)")]
    FrameOutOfRange { index: usize, len: usize },

    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
