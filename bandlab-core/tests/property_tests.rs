//! Property tests for indicator and engine invariants.
//!
//! Uses proptest to verify:
//! 1. ATR is never negative
//! 2. EMA-anchored channel bands stay ordered once warmed up
//! 3. Monotonic-deque extrema match a naive window scan
//! 4. Equity conservation: final equity = initial cash + Σ net PnL, exactly
//! 5. Exclusivity: trades never overlap and each bar holds one side
//! 6. Determinism: identical inputs give bit-identical outputs
//! 7. Flat prices never trade, whatever the price level or windows

use chrono::NaiveDate;
use proptest::prelude::*;

use bandlab_core::domain::Bar;
use bandlab_core::engine::{run_backtest, BacktestSettings};
use bandlab_core::indicators::{rolling_max, rolling_min, Atr, ChannelSpec, Indicator};
use bandlab_core::strategy::{build_strategy, AnchorMode, StrategyConfig, StrategyKind};

// ── Strategies (proptest) ────────────────────────────────────────────

/// Random walk of valid bars: each step is (close change, upper wick, lower wick).
fn arb_bars(min: usize, max: usize) -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((-3.0..3.0_f64, 0.0..2.0_f64, 0.0..2.0_f64), min..max).prop_map(
        |steps| {
            let base = NaiveDate::from_ymd_opt(2020, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let mut close = 100.0_f64;
            steps
                .into_iter()
                .enumerate()
                .map(|(i, (change, up, down))| {
                    let open = close;
                    close = (close + change).max(5.0);
                    Bar {
                        timestamp: base + chrono::Duration::days(i as i64),
                        open,
                        high: open.max(close) + up,
                        low: (open.min(close) - down).max(1.0),
                        close,
                        volume: 1_000.0,
                    }
                })
                .collect()
        },
    )
}

fn arb_config() -> impl Strategy<Value = StrategyConfig> {
    (
        prop::bool::ANY,
        prop::bool::ANY,
        2..8_usize,
        2..8_usize,
        1..6_usize,
        0.0..3.0_f64,
        0.0..3.0_f64,
        0.1..=1.0_f64,
    )
        .prop_map(|(long_short, extrema, ema, atr, trail, up, down, size)| {
            if long_short {
                let anchor = if extrema {
                    AnchorMode::Extrema
                } else {
                    AnchorMode::Middle
                };
                StrategyConfig::new(StrategyKind::LongShort)
                    .with_anchor(anchor)
                    .with_param("ema_period", ema as f64)
                    .with_param("atr_period", atr as f64)
                    .with_param("high_period", trail as f64)
                    .with_param("low_period", trail as f64)
                    .with_param("upper_band_multiplier", up)
                    .with_param("lower_band_multiplier", down)
                    .with_param("long_size", size)
                    .with_param("short_size", size)
            } else {
                StrategyConfig::new(StrategyKind::ChannelBreakout)
                    .with_param("ema_period", ema as f64)
                    .with_param("atr_period", atr as f64)
                    .with_param("multiplier", up)
                    .with_param("long_size", size)
            }
        })
}

// ── Indicators ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn atr_is_non_negative(bars in arb_bars(2, 80), period in 1..10_usize) {
        for v in Atr::new(period).compute(&bars) {
            prop_assert!(v.is_nan() || v >= 0.0);
        }
    }

    #[test]
    fn bands_are_ordered(
        bars in arb_bars(10, 80),
        ema in 1..10_usize,
        atr in 1..10_usize,
        mult in 0.0..4.0_f64,
    ) {
        let spec = ChannelSpec::keltner(ema, atr, mult);
        let ch = spec.compute(&bars);
        for i in spec.lookback()..bars.len() {
            prop_assert!(ch.lower[i] <= ch.middle[i]);
            prop_assert!(ch.middle[i] <= ch.upper[i]);
        }
    }

    #[test]
    fn rolling_extrema_match_naive_scan(
        values in prop::collection::vec(-100.0..100.0_f64, 1..120),
        period in 1..15_usize,
    ) {
        let maxes = rolling_max(&values, period);
        let mins = rolling_min(&values, period);
        for t in 0..values.len() {
            if t + 1 < period {
                prop_assert!(maxes[t].is_nan() && mins[t].is_nan());
                continue;
            }
            let window = &values[t + 1 - period..=t];
            let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let lo = window.iter().copied().fold(f64::INFINITY, f64::min);
            prop_assert_eq!(maxes[t], hi);
            prop_assert_eq!(mins[t], lo);
        }
    }
}

// ── Engine ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn equity_is_conserved(
        bars in arb_bars(12, 120),
        config in arb_config(),
        rate in 0.0..0.01_f64,
    ) {
        let strategy = build_strategy(&config).unwrap();
        let settings = BacktestSettings::new(10_000.0, rate);
        let result = run_backtest(&bars, strategy.as_ref(), &settings).unwrap();

        let expected = 10_000.0 + result.trades.iter().map(|t| t.net_pnl).sum::<f64>();
        prop_assert_eq!(result.final_equity, expected);
        prop_assert_eq!(result.equity_curve.len(), bars.len());
        prop_assert_eq!(result.equity_curve.last().map(|p| p.equity), Some(expected));
    }

    #[test]
    fn positions_never_overlap(bars in arb_bars(12, 120), config in arb_config()) {
        let strategy = build_strategy(&config).unwrap();
        let result = run_backtest(&bars, strategy.as_ref(), &BacktestSettings::default()).unwrap();

        for pair in result.trades.windows(2) {
            prop_assert!(pair[0].exit_bar <= pair[1].entry_bar);
        }
        for trade in &result.trades {
            for point in &result.equity_curve[trade.entry_bar..trade.exit_bar] {
                prop_assert_eq!(point.side, trade.side);
            }
        }
        prop_assert!(result.trades.iter().filter(|t| t.is_forced_close()).count() <= 1);
    }

    #[test]
    fn runs_are_deterministic(bars in arb_bars(12, 80), config in arb_config()) {
        let strategy = build_strategy(&config).unwrap();
        let settings = BacktestSettings::new(25_000.0, 0.0005);
        let a = run_backtest(&bars, strategy.as_ref(), &settings).unwrap();
        let b = run_backtest(&bars, build_strategy(&config).unwrap().as_ref(), &settings).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn no_entry_before_warmup(bars in arb_bars(12, 80), config in arb_config()) {
        let strategy = build_strategy(&config).unwrap();
        let result = run_backtest(&bars, strategy.as_ref(), &BacktestSettings::default()).unwrap();
        for trade in &result.trades {
            prop_assert!(trade.entry_bar >= result.warmup_bars);
        }
    }
}

fn flat_bars(price: f64, n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n)
        .map(|i| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1_000.0,
        })
        .collect()
}

proptest! {
    #[test]
    fn flat_prices_never_trade(
        price in 0.01..1000.0_f64,
        ema in 2..25_usize,
        atr in 2..11_usize,
        trail in 2..8_usize,
        mult in 0.0..3.0_f64,
        long_short in prop::bool::ANY,
        extrema in prop::bool::ANY,
    ) {
        let config = if long_short {
            let anchor = if extrema { AnchorMode::Extrema } else { AnchorMode::Middle };
            StrategyConfig::new(StrategyKind::LongShort)
                .with_anchor(anchor)
                .with_param("ema_period", ema as f64)
                .with_param("atr_period", atr as f64)
                .with_param("high_period", trail as f64)
                .with_param("low_period", trail as f64)
                .with_param("upper_band_multiplier", mult)
                .with_param("lower_band_multiplier", mult)
        } else {
            StrategyConfig::new(StrategyKind::ChannelBreakout)
                .with_param("ema_period", ema as f64)
                .with_param("atr_period", atr as f64)
                .with_param("multiplier", mult)
        };
        let strategy = build_strategy(&config).unwrap();
        let settings = BacktestSettings::new(100_000.0, 0.001);
        let result = run_backtest(&flat_bars(price, 50), strategy.as_ref(), &settings).unwrap();

        prop_assert!(result.trades.is_empty());
        prop_assert_eq!(result.final_equity, 100_000.0);
    }
}
