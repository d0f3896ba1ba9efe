use ndarray::Array3;
use std::future::Future;

use crate::error::Result;

/// デコード済みの 1 フレーム（RGB, shape = [height, width, 3]）
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// 動画内の時刻（秒）
    pub timestamp: f64,
    pub pixels: Array3<u8>,
}

impl VideoFrame {
    pub fn new(timestamp: f64, pixels: Array3<u8>) -> Self {
        Self { timestamp, pixels }
    }

    /// 黒一色のフレーム
    pub fn blank(timestamp: f64, width: u32, height: u32) -> Self {
        Self {
            timestamp,
            pixels: Array3::zeros((height as usize, width as usize, 3)),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.dim().1 as u32
    }

    pub fn height(&self) -> u32 {
        self.pixels.dim().0 as u32
    }
}

/// シーク可能な動画ソース
///
/// シーク完了を待つ `seek` がフレームループの唯一の中断点になる。
pub trait VideoSource {
    /// 長さ（秒）
    fn duration(&self) -> f64;

    /// (width, height)
    fn dimensions(&self) -> (u32, u32);

    /// 指定時刻へシークし、シーク完了後のフレームを取り込む
    fn seek(&mut self, time_secs: f64) -> impl Future<Output = Result<VideoFrame>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_frame_dimensions() {
        let frame = VideoFrame::blank(0.5, 640, 480);
        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.pixels.dim(), (480, 640, 3));
    }
}
