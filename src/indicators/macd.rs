use super::ema::ema;

/// Last values of the MACD line, its signal line and the histogram.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MacdOutput {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Moving Average Convergence Divergence.
///
/// The short and long EMA series have different lengths; the shorter one
/// is left-padded with zeros before subtracting, and the signal line is
/// padded the same way against the MACD line. The padding distorts the
/// first few values of each series, only the last values are returned.
///
/// Returns all zeros when any intermediate series comes out empty.
pub fn macd(
    closes: &[f64],
    short_window: usize,
    long_window: usize,
    signal_window: usize,
) -> MacdOutput {
    let short = ema(closes, short_window);
    let long = ema(closes, long_window);
    if short.is_empty() || long.is_empty() {
        return MacdOutput::default();
    }

    let len = short.len().max(long.len());
    let short = pad_front(short, len);
    let long = pad_front(long, len);
    let macd_line: Vec<f64> = short.iter().zip(&long).map(|(s, l)| s - l).collect();

    let signal_line = ema(&macd_line, signal_window);
    if signal_line.is_empty() {
        return MacdOutput::default();
    }
    let signal_line = pad_front(signal_line, macd_line.len());

    let last = macd_line.len() - 1;
    MacdOutput {
        macd: macd_line[last],
        signal: signal_line[last],
        histogram: macd_line[last] - signal_line[last],
    }
}

fn pad_front(series: Vec<f64>, len: usize) -> Vec<f64> {
    if series.len() >= len {
        return series;
    }
    let mut padded = vec![0.0; len - series.len()];
    padded.extend(series);
    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rising(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + i as f64 * 1.5).collect()
    }

    /// Accelerating uptrend: momentum keeps building.
    fn accelerating(n: usize) -> Vec<f64> {
        (0..n).map(|i| 100.0 + 0.01 * (i * i) as f64).collect()
    }

    #[test]
    fn test_macd_insufficient_data_is_zero() {
        let closes = rising(20);
        assert_eq!(macd(&closes, 12, 26, 9), MacdOutput::default());
    }

    #[test]
    fn test_macd_histogram_direction() {
        let up = accelerating(200);
        let down: Vec<f64> = up.iter().map(|p| 1000.0 - p).collect();

        let bullish = macd(&up, 12, 26, 9);
        let bearish = macd(&down, 12, 26, 9);

        assert!(bullish.histogram > 0.0, "rising series: {:?}", bullish);
        assert!(bearish.histogram < 0.0, "falling series: {:?}", bearish);
        assert!(bullish.macd > 0.0);
        assert!(bearish.macd < 0.0);
    }

    #[test]
    fn test_macd_constant_series_keeps_padding_residue() {
        let closes = vec![10.0; 50];
        let out = macd(&closes, 12, 26, 9);

        assert!(out.macd.abs() < 1e-9);
        // The zero-padded head of the MACD line still drags the signal line
        // after 50 candles.
        assert!(out.histogram < 0.0);
        assert!(out.histogram > -0.1);
    }

    #[test]
    fn test_macd_zero_padding_is_kept() {
        // With 5 closes, short=2 gives 4 points and long=4 gives 2, so the
        // long series is padded to [0, 0, l0, l1]. The MACD line then starts
        // with the raw short EMA values.
        let closes = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let short = ema(&closes, 2);
        let long = ema(&closes, 4);
        let out = macd(&closes, 2, 4, 1);

        let expected_last = short[3] - long[1];
        assert!((out.macd - expected_last).abs() < 1e-12);
        // A signal window of 1 reproduces the MACD line exactly.
        assert!(out.histogram.abs() < 1e-12);
    }
}
