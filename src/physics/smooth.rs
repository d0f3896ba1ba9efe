/// 対称移動平均（端は窓を切り詰める）
///
/// 偶数の窓幅は 1 つ大きい奇数として扱う。窓幅 0/1 は恒等変換。
pub fn moving_average(values: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    let n = values.len();

    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half).min(n - 1);
            let slice = &values[lo..=hi];
            if slice.is_empty() {
                0.0
            } else {
                slice.iter().sum::<f64>() / slice.len() as f64
            }
        })
        .collect()
}
