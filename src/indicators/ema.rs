/// Exponential Moving Average series.
///
/// Seeded with the simple average of the first `window` closes, then
/// smoothed with `k = 2 / (window + 1)`. The result is aligned to the end
/// of the input: `out[0]` corresponds to `closes[window - 1]` and
/// `out.len() == closes.len() - window + 1`.
///
/// Returns an empty series when `window == 0` or there are fewer than
/// `window` closes.
pub fn ema(closes: &[f64], window: usize) -> Vec<f64> {
    if window == 0 || closes.len() < window {
        return Vec::new();
    }

    let k = 2.0 / (window as f64 + 1.0);
    let seed = closes[..window].iter().sum::<f64>() / window as f64;

    let mut series = Vec::with_capacity(closes.len() - window + 1);
    series.push(seed);

    let mut prev = seed;
    for close in &closes[window..] {
        prev = close * k + prev * (1.0 - k);
        series.push(prev);
    }

    series
}
