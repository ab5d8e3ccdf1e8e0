//! Performance metrics computed from a completed run's trades and equity
//! curve.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{account::EquitySnapshot, decimal::Decimal};

/// Sentinel used for `profit_factor` when there were no losing trades and
/// at least one winning trade (division by zero is otherwise undefined).
pub const PROFIT_FACTOR_INFINITY_SENTINEL: f64 = 999.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_profit: Decimal,
    pub total_loss: Decimal,
    pub net_profit: Decimal,
    pub profit_factor: f64,
    pub average_profit: Decimal,
    pub average_loss: Decimal,
    pub expectancy: f64,
    pub winning_count: u32,
    pub losing_count: u32,
    pub win_rate: f64,
    pub longest_win_streak: u32,
    pub longest_loss_streak: u32,
    pub max_drawdown: f64,
    pub drawdown_duration_candles: u32,
    pub sharpe: f64,
    pub sortino: f64,
    pub calmar: f64,
    pub total_return: f64,
    pub annualized_return: f64,
}

/// Minimal view over completed trades the analyzer needs: realized pnl per
/// trade. Kept separate from [`crate::account::Trade`] so the analyzer does
/// not need to know about sides, prices, or timestamps.
pub fn analyze(trade_pnls: &[Decimal], equity_curve: &[EquitySnapshot], initial_capital: Decimal) -> PerformanceMetrics {
    let profit_metrics = profit_and_loss(trade_pnls);
    let risk_metrics = risk_and_return(equity_curve, initial_capital);

    PerformanceMetrics {
        total_profit: profit_metrics.total_profit,
        total_loss: profit_metrics.total_loss,
        net_profit: profit_metrics.net_profit,
        profit_factor: profit_metrics.profit_factor,
        average_profit: profit_metrics.average_profit,
        average_loss: profit_metrics.average_loss,
        expectancy: profit_metrics.expectancy,
        winning_count: profit_metrics.winning_count,
        losing_count: profit_metrics.losing_count,
        win_rate: profit_metrics.win_rate,
        longest_win_streak: profit_metrics.longest_win_streak,
        longest_loss_streak: profit_metrics.longest_loss_streak,
        max_drawdown: risk_metrics.max_drawdown,
        drawdown_duration_candles: risk_metrics.drawdown_duration_candles,
        sharpe: risk_metrics.sharpe,
        sortino: risk_metrics.sortino,
        calmar: risk_metrics.calmar,
        total_return: risk_metrics.total_return,
        annualized_return: risk_metrics.annualized_return,
    }
}

struct ProfitMetrics {
    total_profit: Decimal,
    total_loss: Decimal,
    net_profit: Decimal,
    profit_factor: f64,
    average_profit: Decimal,
    average_loss: Decimal,
    expectancy: f64,
    winning_count: u32,
    losing_count: u32,
    win_rate: f64,
    longest_win_streak: u32,
    longest_loss_streak: u32,
}

/// Accumulates `total_profit`/`total_loss`/`net_profit`/`average_profit`/
/// `average_loss` as exact [`Decimal`] sums — `net_profit` must equal
/// `total_profit - total_loss` bit-for-bit, which an f64 accumulation
/// cannot guarantee. Only `profit_factor`, `expectancy`, and `win_rate`
/// are genuine ratios and widen to `f64`.
fn profit_and_loss(trade_pnls: &[Decimal]) -> ProfitMetrics {
    let mut total_profit = Decimal::ZERO;
    let mut total_loss = Decimal::ZERO;
    let mut winning_count = 0u32;
    let mut losing_count = 0u32;
    let mut longest_win_streak = 0u32;
    let mut longest_loss_streak = 0u32;
    let mut current_win_streak = 0u32;
    let mut current_loss_streak = 0u32;

    for &pnl in trade_pnls {
        if pnl.is_positive() {
            total_profit = total_profit.checked_add(pnl).expect("finite total_profit");
            winning_count += 1;
            current_win_streak += 1;
            current_loss_streak = 0;
            longest_win_streak = longest_win_streak.max(current_win_streak);
        } else if pnl.is_negative() {
            total_loss = total_loss.checked_add(pnl.abs()).expect("finite total_loss");
            losing_count += 1;
            current_loss_streak += 1;
            current_win_streak = 0;
            longest_loss_streak = longest_loss_streak.max(current_loss_streak);
        } else {
            current_win_streak = 0;
            current_loss_streak = 0;
        }
    }

    let net_profit = total_profit.checked_sub(total_loss).expect("finite net_profit");
    let profit_factor = if total_loss.is_zero() {
        if total_profit.is_positive() { PROFIT_FACTOR_INFINITY_SENTINEL } else { 0.0 }
    } else {
        total_profit.to_float() / total_loss.to_float()
    };

    let average_profit = if winning_count > 0 {
        total_profit.checked_div(Decimal::from_int(winning_count as i64)).expect("finite average_profit")
    } else {
        Decimal::ZERO
    };
    let average_loss = if losing_count > 0 {
        total_loss.checked_div(Decimal::from_int(losing_count as i64)).expect("finite average_loss")
    } else {
        Decimal::ZERO
    };
    let win_rate = if trade_pnls.is_empty() { 0.0 } else { winning_count as f64 / trade_pnls.len() as f64 };
    let expectancy = average_profit.to_float() * win_rate - average_loss.to_float() * (1.0 - win_rate);

    ProfitMetrics {
        total_profit,
        total_loss,
        net_profit,
        profit_factor,
        average_profit,
        average_loss,
        expectancy,
        winning_count,
        losing_count,
        win_rate,
        longest_win_streak,
        longest_loss_streak,
    }
}

struct RiskMetrics {
    max_drawdown: f64,
    drawdown_duration_candles: u32,
    sharpe: f64,
    sortino: f64,
    calmar: f64,
    total_return: f64,
    annualized_return: f64,
}

fn risk_and_return(equity_curve: &[EquitySnapshot], initial_capital: Decimal) -> RiskMetrics {
    if equity_curve.is_empty() {
        return RiskMetrics {
            max_drawdown: 0.0,
            drawdown_duration_candles: 0,
            sharpe: 0.0,
            sortino: 0.0,
            calmar: 0.0,
            total_return: 0.0,
            annualized_return: 0.0,
        };
    }

    let (max_drawdown, drawdown_duration_candles) = drawdown_stats(equity_curve);

    let final_equity = equity_curve.last().unwrap().equity.to_float();
    let initial = initial_capital.to_float();
    let total_return = if initial == 0.0 { 0.0 } else { (final_equity - initial) / initial };

    let span_ms = equity_curve.last().unwrap().timestamp_ms - equity_curve.first().unwrap().timestamp_ms;
    let days = (Duration::milliseconds(span_ms).num_seconds() as f64 / 86_400.0).max(1.0 / 24.0);
    let annualized_return = total_return / (days / 365.0);

    if equity_curve.len() < 2 {
        return RiskMetrics {
            max_drawdown,
            drawdown_duration_candles,
            sharpe: 0.0,
            sortino: 0.0,
            calmar: if max_drawdown == 0.0 { 0.0 } else { annualized_return / max_drawdown },
            total_return,
            annualized_return,
        };
    }

    let returns: Vec<f64> = equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity.to_float();
            let next = w[1].equity.to_float();
            if prev == 0.0 { 0.0 } else { (next - prev) / prev }
        })
        .collect();

    let mean_return = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean_return).powi(2)).sum::<f64>() / returns.len() as f64;
    let stdev = variance.sqrt();

    let downside: Vec<f64> = returns.iter().filter(|&&r| r < 0.0).copied().collect();
    let downside_variance = if downside.is_empty() {
        0.0
    } else {
        downside.iter().map(|r| r.powi(2)).sum::<f64>() / downside.len() as f64
    };
    let downside_deviation = downside_variance.sqrt();

    let sharpe = if stdev == 0.0 { 0.0 } else { (mean_return * 252.0) / (stdev * 252.0_f64.sqrt()) };
    let sortino = if downside_deviation == 0.0 { 0.0 } else { (mean_return * 252.0) / (downside_deviation * 252.0_f64.sqrt()) };
    let calmar = if max_drawdown == 0.0 { 0.0 } else { annualized_return / max_drawdown };

    RiskMetrics {
        max_drawdown,
        drawdown_duration_candles,
        sharpe,
        sortino,
        calmar,
        total_return,
        annualized_return,
    }
}

/// `max_drawdown = max_t (peak_so_far - equity_t) / peak_so_far`.
/// `drawdown_duration` is the longest interval (in candle count) from a
/// peak to the next time equity meets or exceeds it.
fn drawdown_stats(equity_curve: &[EquitySnapshot]) -> (f64, u32) {
    let mut peak = equity_curve[0].equity.to_float();
    let mut peak_index = 0usize;
    let mut max_drawdown = 0.0;
    let mut longest_duration = 0u32;

    for (i, snapshot) in equity_curve.iter().enumerate() {
        let equity = snapshot.equity.to_float();
        if equity >= peak {
            if equity > peak {
                peak = equity;
                peak_index = i;
            } else {
                peak_index = i;
            }
            continue;
        }
        if peak > 0.0 {
            let drawdown = (peak - equity) / peak;
            if drawdown > max_drawdown {
                max_drawdown = drawdown;
            }
        }
        let duration = (i - peak_index) as u32;
        longest_duration = longest_duration.max(duration);
    }

    (max_drawdown, longest_duration)
}
