use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::PathBuf;
use tracing::{debug, info};

use super::estimator::PoseEstimator;
use super::keypoint::{Keypoint, KeypointMap, PoseResult};
use super::preprocess::{preprocess_for_movenet, MOVENET_INPUT_SIZE};
use super::schema::LandmarkSchema;
use crate::error::{AnalysisError, Result};
use crate::video::VideoFrame;

/// 平均信頼度がこれ未満なら人物なしとみなす
pub const MIN_POSE_SCORE: f64 = 0.2;

/// MoveNet (single pose) を使用した姿勢検出器
pub struct MoveNetDetector {
    model_path: PathBuf,
    input_size: usize,
    session: Option<Session>,
}

impl MoveNetDetector {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            input_size: MOVENET_INPUT_SIZE,
            session: None,
        }
    }

    pub fn with_input_size(mut self, input_size: usize) -> Self {
        self.input_size = input_size;
        self
    }

    fn load_session(&self) -> ort::Result<Session> {
        Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(&self.model_path)
    }
}

impl PoseEstimator for MoveNetDetector {
    async fn initialize(&mut self) -> Result<()> {
        let session = self.load_session().map_err(|e| {
            AnalysisError::Initialization(format!("{}: {}", self.model_path.display(), e))
        })?;
        info!("loaded pose model {}", self.model_path.display());
        self.session = Some(session);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.session.is_some()
    }

    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<PoseResult>> {
        let session = self.session.as_mut().ok_or(AnalysisError::NotReady)?;
        let input = preprocess_for_movenet(frame, self.input_size);
        let input_tensor =
            Tensor::from_array(input).map_err(|e| AnalysisError::Detection(e.to_string()))?;
        let outputs = session
            .run(ort::inputs!["serving_default_input_0" => input_tensor])
            .map_err(|e| AnalysisError::Detection(format!("inference failed: {}", e)))?;

        // MoveNet の出力は [1, 1, 17, 3] (y, x, confidence)、座標は 0-1 正規化
        let output: ndarray::ArrayViewD<f32> = outputs["StatefulPartitionedCall_0"]
            .try_extract_array()
            .map_err(|e| AnalysisError::Detection(e.to_string()))?;

        let schema = LandmarkSchema::coco17();
        let width = frame.width() as f64;
        let height = frame.height() as f64;
        let mut keypoints = KeypointMap::new();
        for i in 0..schema.count() {
            let y = output[[0, 0, i, 0]] as f64;
            let x = output[[0, 0, i, 1]] as f64;
            let score = output[[0, 0, i, 2]] as f64;
            let mut kp = Keypoint::new(x * width, y * height, score);
            if let Some(landmark) = schema.landmark(i) {
                kp = kp.named(landmark.name());
            }
            keypoints.insert(i, kp);
        }

        let pose = PoseResult::new(keypoints, 0.0);
        let score = pose.average_confidence();
        if score < MIN_POSE_SCORE {
            debug!(t = frame.timestamp, score, "no person detected");
            return Ok(None);
        }
        Ok(Some(PoseResult { score, ..pose }))
    }

    fn dispose(&mut self) {
        self.session = None;
    }

    fn schema(&self) -> LandmarkSchema {
        LandmarkSchema::coco17()
    }
}
