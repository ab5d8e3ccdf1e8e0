//! Indicator kernels: pure functions over a close-price vector producing an
//! equal-length `Decimal` vector, NaN-sentinelled until the warm-up index.
//!
//! Each kernel is a scalar reference implementation. It reads only data up
//! to the current index — no kernel may look ahead, since the event loop
//! relies on that to avoid look-ahead bias.

use crate::decimal::Decimal;

/// Rolling mean with a sliding-window update.
pub fn sma(closes: &[Decimal], period: usize) -> Vec<Decimal> {
    let n = closes.len();
    let mut out = vec![Decimal::NAN; n];
    if period == 0 || period > n {
        return out;
    }

    let mut sum = Decimal::ZERO;
    let divisor = Decimal::from_int(period as i64);
    for (i, &price) in closes.iter().enumerate() {
        sum = sum + price;
        if i >= period {
            sum = sum - closes[i - period];
        }
        if i >= period - 1 {
            out[i] = sum.checked_div(divisor).expect("period is nonzero");
        }
    }
    out
}

/// `EMA_t = alpha * price_t + (1 - alpha) * EMA_{t-1}`, seeded from the
/// first `period` SMA value, with `alpha = 2 / (period + 1)`.
pub fn ema(closes: &[Decimal], period: usize) -> Vec<Decimal> {
    ema_from(closes, period, alpha_for_period(period))
}

fn alpha_for_period(period: usize) -> Decimal {
    Decimal::from_int(2)
        .checked_div(Decimal::from_int(period as i64 + 1))
        .expect("period is nonzero")
}

/// Shared EMA recursion seeded from the SMA of the first `period` values of
/// `input`, skipping any leading NaN-sentinel run (used to chain EMA over
/// an already-NaN-sentinelled vector, e.g. MACD's signal line).
fn ema_from(input: &[Decimal], period: usize, alpha: Decimal) -> Vec<Decimal> {
    let n = input.len();
    let mut out = vec![Decimal::NAN; n];
    if period == 0 {
        return out;
    }

    let start = match input.iter().position(|v| !v.is_nan()) {
        Some(s) => s,
        None => return out,
    };
    let valid = &input[start..];
    if valid.len() < period {
        return out;
    }

    let seed = sma(valid, period);
    let seed_idx = start + period - 1;
    out[seed_idx] = seed[period - 1];
    let one_minus_alpha = Decimal::ONE - alpha;

    let mut prev = out[seed_idx];
    for i in (seed_idx + 1)..n {
        prev = alpha.checked_mul(input[i]).expect("alpha in [0,1]")
            + one_minus_alpha.checked_mul(prev).expect("prev is finite");
        out[i] = prev;
    }
    out
}

/// Wilder smoothing of gains/losses: `RS = avg_gain / avg_loss`,
/// `RSI = 100 - 100 / (1 + RS)`. The initial average is a simple mean over
/// the first `period` deltas; subsequent averages use Wilder's recursive
/// smoothing (`alpha = 1/period`).
pub fn rsi(closes: &[Decimal], period: usize) -> Vec<Decimal> {
    let n = closes.len();
    let mut out = vec![Decimal::NAN; n];
    if period == 0 || n < period + 1 {
        return out;
    }

    let mut gains = vec![Decimal::ZERO; n];
    let mut losses = vec![Decimal::ZERO; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        if delta.is_positive() {
            gains[i] = delta;
        } else if delta.is_negative() {
            losses[i] = delta.abs();
        }
    }

    let period_dec = Decimal::from_int(period as i64);
    let mut avg_gain = mean(&gains[1..=period]);
    let mut avg_loss = mean(&losses[1..=period]);
    out[period] = rsi_value(avg_gain, avg_loss);

    let period_minus_one = Decimal::from_int(period as i64 - 1);
    for i in (period + 1)..n {
        avg_gain = (avg_gain.checked_mul(period_minus_one).unwrap() + gains[i])
            .checked_div(period_dec)
            .unwrap();
        avg_loss = (avg_loss.checked_mul(period_minus_one).unwrap() + losses[i])
            .checked_div(period_dec)
            .unwrap();
        out[i] = rsi_value(avg_gain, avg_loss);
    }

    out
}

fn rsi_value(avg_gain: Decimal, avg_loss: Decimal) -> Decimal {
    if avg_loss.is_zero() {
        return if avg_gain.is_zero() { Decimal::from_int(50) } else { Decimal::from_int(100) };
    }
    let rs = avg_gain.checked_div(avg_loss).unwrap();
    let hundred = Decimal::from_int(100);
    hundred - hundred.checked_div(Decimal::ONE + rs).unwrap()
}

fn mean(values: &[Decimal]) -> Decimal {
    let sum: Decimal = values.iter().copied().sum();
    sum.checked_div(Decimal::from_int(values.len() as i64)).unwrap()
}

/// MACD line, signal line, and histogram for the given fast/slow/signal
/// periods.
pub struct Macd {
    pub macd_line: Vec<Decimal>,
    pub signal_line: Vec<Decimal>,
    pub histogram: Vec<Decimal>,
}

pub fn macd(closes: &[Decimal], fast: usize, slow: usize, signal: usize) -> Macd {
    let n = closes.len();
    let ema_fast = ema(closes, fast);
    let ema_slow = ema(closes, slow);

    let mut macd_line = vec![Decimal::NAN; n];
    for i in 0..n {
        if !ema_fast[i].is_nan() && !ema_slow[i].is_nan() {
            macd_line[i] = ema_fast[i] - ema_slow[i];
        }
    }

    let signal_line = ema_from(&macd_line, signal, alpha_for_period(signal));

    let mut histogram = vec![Decimal::NAN; n];
    for i in 0..n {
        if !macd_line[i].is_nan() && !signal_line[i].is_nan() {
            histogram[i] = macd_line[i] - signal_line[i];
        }
    }

    Macd { macd_line, signal_line, histogram }
}

/// Bollinger bands: SMA middle band, +/- `k` sample standard deviations.
/// Variance is computed over the rolling window; the square root is the one
/// place this kernel widens to `f64`, since square root has no exact
/// decimal counterpart.
pub struct Bollinger {
    pub upper: Vec<Decimal>,
    pub middle: Vec<Decimal>,
    pub lower: Vec<Decimal>,
}

pub fn bollinger(closes: &[Decimal], period: usize, k: f64) -> Bollinger {
    let n = closes.len();
    let middle = sma(closes, period);
    let mut upper = vec![Decimal::NAN; n];
    let mut lower = vec![Decimal::NAN; n];

    if period < 2 {
        return Bollinger { upper, middle, lower };
    }

    for i in (period - 1)..n {
        let window = &closes[(i + 1 - period)..=i];
        let mean_f = middle[i].to_float();
        let variance: f64 = window
            .iter()
            .map(|v| {
                let d = v.to_float() - mean_f;
                d * d
            })
            .sum::<f64>()
            / (period as f64 - 1.0);
        let band = Decimal::from_float(k * variance.sqrt());
        upper[i] = middle[i] + band;
        lower[i] = middle[i] - band;
    }

    Bollinger { upper, middle, lower }
}
