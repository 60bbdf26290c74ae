/// Value returned when there is not enough history to say anything.
pub const NEUTRAL_RSI: f64 = 50.0;

/// Relative Strength Index over the most recent `period` price changes.
///
/// Uses plain averages of gains and losses (no Wilder smoothing).
///
/// Values:
/// - RSI >= 70: Overbought
/// - RSI <= 30: Oversold
///
/// Returns [`NEUTRAL_RSI`] with fewer than `period + 1` closes, and 100
/// when the window holds no losses at all.
pub fn rsi(closes: &[f64], period: usize) -> f64 {
    if period == 0 || closes.len() < period + 1 {
        return NEUTRAL_RSI;
    }

    let window = &closes[closes.len() - period - 1..];
    let (gains, losses) = window
        .windows(2)
        .map(|pair| pair[1] - pair[0])
        .fold((0.0, 0.0), |(gains, losses), change| {
            if change > 0.0 {
                (gains + change, losses)
            } else {
                (gains, losses - change)
            }
        });

    let avg_gain = gains / period as f64;
    let avg_loss = losses / period as f64;

    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
