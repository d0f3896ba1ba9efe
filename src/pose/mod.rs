#[cfg(feature = "onnx")]
pub mod detector;
pub mod estimator;
pub mod keypoint;
pub mod preprocess;
pub mod schema;

#[cfg(feature = "onnx")]
pub use detector::MoveNetDetector;
pub use estimator::PoseEstimator;
pub use keypoint::{
    Keypoint, KeypointMap, MovementDirection, PixelPoint, PoseResult, ScoredPoint, Side,
};
pub use preprocess::preprocess_for_movenet;
pub use schema::{Landmark, LandmarkSchema, SchemaKind, TrackingProfile};
