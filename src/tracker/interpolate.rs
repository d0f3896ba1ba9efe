use crate::pose::{Keypoint, KeypointMap, ScoredPoint};

use super::frame::{Biomechanics, FrameRecord, Provenance};

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (1.0 - t) * a + t * b
}

fn lerp_keypoint(a: &Keypoint, b: &Keypoint, t: f64) -> Keypoint {
    Keypoint {
        x: lerp(a.x, b.x, t),
        y: lerp(a.y, b.y, t),
        score: lerp(a.score, b.score, t),
        name: a.name.clone().or_else(|| b.name.clone()),
    }
}

/// 両側にあるランドマークは補間、片側にしかないものはそのままコピー
fn lerp_keypoints(a: Option<&KeypointMap>, b: Option<&KeypointMap>, t: f64) -> Option<KeypointMap> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let mut out = KeypointMap::new();
            for (idx, ka) in a {
                let kp = match b.get(idx) {
                    Some(kb) => lerp_keypoint(ka, kb, t),
                    None => ka.clone(),
                };
                out.insert(*idx, kp);
            }
            for (idx, kb) in b {
                out.entry(*idx).or_insert_with(|| kb.clone());
            }
            Some(out)
        }
        (Some(only), None) | (None, Some(only)) => Some(only.clone()),
        (None, None) => None,
    }
}

fn lerp_point(a: Option<ScoredPoint>, b: Option<ScoredPoint>, t: f64) -> Option<ScoredPoint> {
    match (a, b) {
        (Some(a), Some(b)) => Some(ScoredPoint::new(
            lerp(a.x, b.x, t),
            lerp(a.y, b.y, t),
            lerp(a.score, b.score, t),
        )),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

fn lerp_option(a: Option<f64>, b: Option<f64>, t: f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(lerp(a, b, t)),
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

fn lerp_biomechanics(a: Option<Biomechanics>, b: Option<Biomechanics>, t: f64) -> Option<Biomechanics> {
    match (a, b) {
        (Some(a), Some(b)) => {
            let (near, far) = if t < 0.5 { (a, b) } else { (b, a) };
            Some(Biomechanics {
                spine_angle: lerp_option(a.spine_angle, b.spine_angle, t),
                shin_angle: lerp_option(a.shin_angle, b.shin_angle, t),
                foot_angle: lerp_option(a.foot_angle, b.foot_angle, t),
                lead_leg: near.lead_leg.or(far.lead_leg),
            })
        }
        (Some(only), None) | (None, Some(only)) => Some(only),
        (None, None) => None,
    }
}

/// 補間係数。タイムスタンプが揃っていなければフレーム番号で代用する
fn fraction(from: &FrameRecord, to: &FrameRecord, at: &FrameRecord) -> f64 {
    let span = to.timestamp - from.timestamp;
    let t = if span > 0.0 && span.is_finite() {
        (at.timestamp - from.timestamp) / span
    } else {
        let frames = to.frame_index as f64 - from.frame_index as f64;
        if frames > 0.0 {
            (at.frame_index as f64 - from.frame_index as f64) / frames
        } else {
            0.0
        }
    };
    t.clamp(0.0, 1.0)
}

fn copy_pose(target: &mut FrameRecord, source: &FrameRecord) {
    target.keypoints = source.keypoints.clone();
    target.center_of_mass = source.center_of_mass;
    target.head_position = source.head_position;
    target.biomechanics = source.biomechanics;
    target.provenance = Provenance::Interpolated;
}

/// frames[start] と frames[end] の間（両端を含まない）を線形補間で上書きする
pub fn interpolate_between(frames: &mut [FrameRecord], start: usize, end: usize) {
    if end <= start + 1 || end >= frames.len() {
        return;
    }

    let from = frames[start].clone();
    let (head, tail) = frames.split_at_mut(end);
    let to = &tail[0];

    for frame in head[start + 1..].iter_mut() {
        let t = fraction(&from, to, frame);
        frame.keypoints = lerp_keypoints(from.keypoints.as_ref(), to.keypoints.as_ref(), t);
        frame.center_of_mass = lerp_point(from.center_of_mass, to.center_of_mass, t);
        frame.head_position = lerp_point(from.head_position, to.head_position, t);
        frame.biomechanics = lerp_biomechanics(from.biomechanics, to.biomechanics, t);
        frame.provenance = Provenance::Interpolated;
    }
}

/// 欠損フレームを埋める
///
/// 有効フレームに挟まれた欠損区間は線形補間、先頭・末尾の欠損区間は
/// 最も近い有効フレームのコピー（外挿はしない）。有効フレームが一つもなければ何もしない。
/// 埋めたフレーム数を返す。
pub fn fill_gaps(frames: &mut [FrameRecord]) -> usize {
    let valid: Vec<usize> = frames
        .iter()
        .enumerate()
        .filter(|(_, f)| f.has_pose())
        .map(|(i, _)| i)
        .collect();

    let (first, last) = match (valid.first(), valid.last()) {
        (Some(&first), Some(&last)) => (first, last),
        _ => return 0,
    };

    let mut filled = 0;

    let source = frames[first].clone();
    for frame in frames[..first].iter_mut() {
        copy_pose(frame, &source);
        filled += 1;
    }
    let source = frames[last].clone();
    for frame in frames[last + 1..].iter_mut() {
        copy_pose(frame, &source);
        filled += 1;
    }

    for pair in valid.windows(2) {
        let (start, end) = (pair[0], pair[1]);
        if end > start + 1 {
            interpolate_between(frames, start, end);
            filled += end - start - 1;
        }
    }

    filled
}
