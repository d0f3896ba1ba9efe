use ndarray::Array4;

use crate::video::VideoFrame;

/// MoveNet用の入力サイズ
pub const MOVENET_INPUT_SIZE: usize = 192;

/// RGB フレームを MoveNet 用の入力テンソルに変換
///
/// - size x size にバイリニアでリサイズ
/// - [1, size, size, 3] の f32 テンソル (0.0-255.0)
pub fn preprocess_for_movenet(frame: &VideoFrame, size: usize) -> Array4<f32> {
    let (src_h, src_w, _) = frame.pixels.dim();
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
    if src_h == 0 || src_w == 0 || size == 0 {
        return tensor;
    }

    let scale_x = src_w as f32 / size as f32;
    let scale_y = src_h as f32 / size as f32;

    for y in 0..size {
        // ピクセル中心を合わせる
        let sy = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (src_h - 1) as f32);
        let y0 = sy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let fy = sy - y0 as f32;

        for x in 0..size {
            let sx = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (src_w - 1) as f32);
            let x0 = sx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let fx = sx - x0 as f32;

            for c in 0..3 {
                let p00 = frame.pixels[[y0, x0, c]] as f32;
                let p01 = frame.pixels[[y0, x1, c]] as f32;
                let p10 = frame.pixels[[y1, x0, c]] as f32;
                let p11 = frame.pixels[[y1, x1, c]] as f32;
                let top = p00 + (p01 - p00) * fx;
                let bottom = p10 + (p11 - p10) * fx;
                tensor[[0, y, x, c]] = top + (bottom - top) * fy;
            }
        }
    }

    tensor
}
