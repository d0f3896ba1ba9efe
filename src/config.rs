use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::physics::{PhysicsOptions, DEFAULT_SMOOTHING_WINDOW, DEFAULT_SPLIT_DISTANCES};
use crate::pose::preprocess::MOVENET_INPUT_SIZE;
use crate::pose::{LandmarkSchema, MovementDirection, SchemaKind, TrackingProfile};
use crate::tracker::{SequencerOptions, MIN_CONFIDENCE};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TrackingConfig {
    /// サンプリングレート（フレーム/秒）
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// キーポイント信頼度の閾値
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,
    /// sprint / jump / agility / full
    #[serde(default)]
    pub profile: TrackingProfile,
    /// coco17 / blazepose33
    #[serde(default)]
    pub schema: SchemaKind,
    /// left / right
    #[serde(default)]
    pub movement_direction: MovementDirection,
    #[serde(default = "default_enable_biomechanics")]
    pub enable_biomechanics: bool,
}

fn default_fps() -> f64 { 30.0 }
fn default_confidence_threshold() -> f64 { MIN_CONFIDENCE }
fn default_enable_biomechanics() -> bool { true }

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            confidence_threshold: default_confidence_threshold(),
            profile: TrackingProfile::default(),
            schema: SchemaKind::default(),
            movement_direction: MovementDirection::default(),
            enable_biomechanics: default_enable_biomechanics(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PhysicsConfig {
    /// 移動平均の窓幅（フレーム）
    #[serde(default = "default_smoothing_window")]
    pub smoothing_window: usize,
    /// スプリット距離（ヤード）
    #[serde(default = "default_split_distances")]
    pub split_distances: Vec<u32>,
}

fn default_smoothing_window() -> usize { DEFAULT_SMOOTHING_WINDOW }
fn default_split_distances() -> Vec<u32> { DEFAULT_SPLIT_DISTANCES.to_vec() }

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            smoothing_window: default_smoothing_window(),
            split_distances: default_split_distances(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// MoveNet ONNX モデルのパス
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    /// モデル入力サイズ（正方形）
    #[serde(default = "default_input_size")]
    pub input_size: usize,
}

fn default_model_path() -> PathBuf { PathBuf::from("models/movenet_lightning.onnx") }
fn default_input_size() -> usize { MOVENET_INPUT_SIZE }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            input_size: default_input_size(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        Ok(config)
    }

    /// 読めなければ警告を出して既定値を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %format!("{e:#}"), "using default config");
                Self::default()
            }
        }
    }

    pub fn schema(&self) -> LandmarkSchema {
        LandmarkSchema::from_kind(self.tracking.schema)
    }

    pub fn sequencer_options(&self) -> SequencerOptions {
        SequencerOptions {
            fps: self.tracking.fps,
            profile: self.tracking.profile,
            enable_biomechanics: self.tracking.enable_biomechanics,
            movement_direction: self.tracking.movement_direction,
            start_time: None,
            end_time: None,
            confidence_threshold: self.tracking.confidence_threshold,
        }
    }

    /// 設定のモデルで MoveNet 検出器を作る（初期化はセッション開始時）
    #[cfg(feature = "onnx")]
    pub fn detector(&self) -> crate::pose::MoveNetDetector {
        crate::pose::MoveNetDetector::new(&self.model.path).with_input_size(self.model.input_size)
    }

    pub fn physics_options(&self) -> PhysicsOptions {
        PhysicsOptions {
            smoothing_window: self.physics.smoothing_window,
            split_distances: self.physics.split_distances.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.sequencer_options(), SequencerOptions::default());
        assert_eq!(config.physics_options(), PhysicsOptions::default());
        assert_eq!(config.model.input_size, 192);
        assert_eq!(config.schema().kind(), SchemaKind::Coco17);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [tracking]
            fps = 60.0
            profile = "full"
            schema = "blazepose33"
            movement_direction = "left"

            [physics]
            split_distances = [5, 10]
            "#,
        )
        .unwrap();

        let options = config.sequencer_options();
        assert_eq!(options.fps, 60.0);
        assert_eq!(options.profile, TrackingProfile::Full);
        assert_eq!(options.movement_direction, MovementDirection::Left);
        assert!(options.enable_biomechanics);
        assert_eq!(config.schema().kind(), SchemaKind::BlazePose33);

        let physics = config.physics_options();
        assert_eq!(physics.smoothing_window, 5);
        assert_eq!(physics.split_distances, vec![5, 10]);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        assert!(Config::load("/nonexistent/config.toml").is_err());
        let config = Config::load_or_default("/nonexistent/config.toml");
        assert_eq!(config.tracking.fps, 30.0);
    }
}
