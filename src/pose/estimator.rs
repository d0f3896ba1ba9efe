use std::future::Future;

use super::keypoint::PoseResult;
use super::schema::LandmarkSchema;
use crate::error::Result;
use crate::video::VideoFrame;

/// 姿勢推定器（キーポイントプロバイダ）
///
/// セッションにつき 1 インスタンスを使い回す。`detect` を並行に呼んではならない。
pub trait PoseEstimator {
    /// モデルの読み込み。失敗時は `AnalysisError::Initialization`
    fn initialize(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn is_ready(&self) -> bool;

    /// 1 フレームから姿勢を検出する。人物がいなければ `Ok(None)`
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<PoseResult>>;

    /// 保持しているリソースを解放する。以後 `is_ready()` は false
    fn dispose(&mut self);

    /// 出力キーポイントのインデックス体系
    fn schema(&self) -> LandmarkSchema;
}
