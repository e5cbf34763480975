//! Technical indicators module
//! Implements RSI, MACD, SMA and EMA over a closing-price series

use chrono::Utc;
use super::{Candle, IndicatorSet, Macd};

const RSI_PERIOD: usize = 14;
const MACD_FAST: usize = 12;
const MACD_SLOW: usize = 26;
const MACD_SIGNAL: usize = 9;

/// Samples back used for the 24h change on an hourly series
const DAY_LOOKBACK: usize = 25;
const DAY_HOURS: usize = 24;

/// Compute the indicator set from hourly candles. `None` for an empty series.
pub fn compute_indicators(coin: &str, candles: &[Candle]) -> Option<IndicatorSet> {
    if candles.is_empty() {
        return None;
    }

    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let volumes: Vec<f64> = candles.iter().map(|c| c.volume).collect();

    let rsi = if closes.len() > RSI_PERIOD {
        Some(calculate_rsi(&closes, RSI_PERIOD))
    } else {
        None
    };

    let macd = if closes.len() >= MACD_SLOW + MACD_SIGNAL - 1 {
        Some(calculate_macd(&closes, MACD_FAST, MACD_SLOW, MACD_SIGNAL))
    } else {
        None
    };

    let sma_if = |period: usize| {
        if closes.len() >= period {
            Some(calculate_sma(&closes, period))
        } else {
            None
        }
    };

    let ema20 = if closes.len() >= 20 {
        Some(calculate_ema(&closes, 20))
    } else {
        None
    };

    let current_price = closes[closes.len() - 1];
    let price_24h_ago = if closes.len() >= DAY_LOOKBACK {
        closes[closes.len() - DAY_LOOKBACK]
    } else {
        closes[0]
    };
    let price_change_24h = if price_24h_ago != 0.0 {
        (current_price - price_24h_ago) / price_24h_ago * 100.0
    } else {
        0.0
    };

    let volume24h = volumes.iter().rev().take(DAY_HOURS).sum::<f64>();

    Some(IndicatorSet {
        coin: coin.to_string(),
        rsi,
        macd,
        sma20: sma_if(20),
        sma50: sma_if(50),
        sma200: sma_if(200),
        ema20,
        volume24h,
        current_price,
        price_change_24h,
        timestamp: Utc::now(),
    })
}

/// Calculate RSI (Relative Strength Index) with Wilder smoothing
pub fn calculate_rsi(prices: &[f64], period: usize) -> f64 {
    if period == 0 || prices.len() < period + 1 {
        return 50.0; // Neutral
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);

    for window in prices.windows(2) {
        let change = window[1] - window[0];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(change.abs());
        }
    }

    let mut avg_gain = gains.iter().take(period).sum::<f64>() / period as f64;
    let mut avg_loss = losses.iter().take(period).sum::<f64>() / period as f64;

    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        return if avg_gain == 0.0 { 50.0 } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Calculate MACD line, signal line and histogram
pub fn calculate_macd(prices: &[f64], fast_period: usize, slow_period: usize, signal_period: usize) -> Macd {
    if prices.len() < slow_period {
        return Macd {
            macd: 0.0,
            signal: 0.0,
            histogram: 0.0,
        };
    }

    let fast_series = ema_series(prices, fast_period);
    let slow_series = ema_series(prices, slow_period);

    // Both series end at the last price; align on the shorter (slow) one
    let offset = fast_series.len() - slow_series.len();
    let macd_values: Vec<f64> = slow_series
        .iter()
        .enumerate()
        .map(|(i, slow)| fast_series[i + offset] - slow)
        .collect();

    let macd = *macd_values.last().unwrap_or(&0.0);

    let signal = if macd_values.len() >= signal_period {
        calculate_ema(&macd_values, signal_period)
    } else {
        macd_values.iter().sum::<f64>() / macd_values.len() as f64
    };

    Macd {
        macd,
        signal,
        histogram: macd - signal,
    }
}

/// Calculate SMA (Simple Moving Average) over the last `period` prices
pub fn calculate_sma(prices: &[f64], period: usize) -> f64 {
    if prices.is_empty() || period == 0 {
        return 0.0;
    }

    if prices.len() < period {
        return prices.iter().sum::<f64>() / prices.len() as f64;
    }

    let recent_prices = &prices[prices.len() - period..];
    recent_prices.iter().sum::<f64>() / period as f64
}

/// Calculate EMA (Exponential Moving Average) seeded with the first-period SMA
pub fn calculate_ema(prices: &[f64], period: usize) -> f64 {
    ema_series(prices, period).last().copied().unwrap_or(0.0)
}

/// EMA value for every index from `period - 1` onwards
fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
    if prices.is_empty() || period == 0 {
        return Vec::new();
    }

    if prices.len() < period {
        return vec![calculate_sma(prices, prices.len())];
    }

    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut ema = calculate_sma(&prices[0..period], period);
    let mut series = Vec::with_capacity(prices.len() - period + 1);
    series.push(ema);

    for &price in &prices[period..] {
        ema = (price - ema) * multiplier + ema;
        series.push(ema);
    }

    series
}
