use rsi_sentinel::domain::{PriceCandle, SignalKind, Thresholds, ZoneState};
use rsi_sentinel::indicators::IndicatorConfig;
use rsi_sentinel::strategy::{AlertPolicy, DetectorConfig, SignalDetector};

fn detector(indicator: IndicatorConfig, oversold: f64, overbought: f64) -> SignalDetector {
    SignalDetector::new(DetectorConfig {
        indicator,
        thresholds: Thresholds::new(oversold, overbought).unwrap(),
        ..DetectorConfig::default()
    })
    .unwrap()
}

fn feed(detector: &mut SignalDetector, closes: &[f64]) -> Vec<(Option<f64>, Option<SignalKind>)> {
    closes
        .iter()
        .map(|&close| {
            let eval = detector
                .evaluate(&PriceCandle::closed(close).unwrap())
                .unwrap();
            (eval.reading, eval.signal.map(|s| s.kind))
        })
        .collect()
}

/// Flat seed, a rally, then one sharp drop back into neutral.
#[test]
fn rally_then_drop_returns_to_neutral_once() {
    let mut det = detector(IndicatorConfig::rsi(3), 20.0, 80.0);
    let out = feed(&mut det, &[10.0, 10.0, 10.0, 10.0, 50.0, 90.0, 91.0, 92.0, 50.0]);

    for (reading, signal) in &out[..3] {
        assert!(reading.is_none());
        assert!(signal.is_none());
    }
    for (reading, _) in &out[3..8] {
        assert_eq!(*reading, Some(100.0));
    }
    assert_eq!(out[3].1, Some(SignalKind::EnteredOverbought));
    assert!(out[4..8].iter().all(|(_, s)| s.is_none()));

    let last = out[8].0.unwrap();
    assert!((last - 33.19).abs() < 0.01, "got {last}");
    assert_eq!(out[8].1, Some(SignalKind::ReturnedToNeutral));

    let neutral = out
        .iter()
        .filter(|(_, s)| *s == Some(SignalKind::ReturnedToNeutral))
        .count();
    assert_eq!(neutral, 1);
    assert_eq!(det.zone_state(), ZoneState::NeutralIdle);
}

/// Repeat policy keeps alerting while overbought but still reports neutral once.
#[test]
fn repeat_policy_overbought_run_then_single_neutral() {
    let mut det = SignalDetector::new(DetectorConfig {
        indicator: IndicatorConfig::rsi(3),
        thresholds: Thresholds::new(20.0, 80.0).unwrap(),
        policy: AlertPolicy::Repeat,
        ..DetectorConfig::default()
    })
    .unwrap();
    let out = feed(&mut det, &[10.0, 10.0, 10.0, 10.0, 50.0, 90.0, 91.0, 92.0, 50.0, 49.0]);

    let overbought = out
        .iter()
        .filter(|(_, s)| *s == Some(SignalKind::EnteredOverbought))
        .count();
    assert_eq!(overbought, 5);
    assert_eq!(out[8].1, Some(SignalKind::ReturnedToNeutral));
    assert_eq!(out[9].1, None);
}

#[test]
fn strictly_rising_closes_read_100() {
    let mut det = detector(IndicatorConfig::rsi(5), 30.0, 70.0);
    let closes: Vec<f64> = (1..=20).map(|i| 100.0 + i as f64).collect();
    let out = feed(&mut det, &closes);

    assert!(out[5..].iter().all(|(r, _)| *r == Some(100.0)));
    let kinds: Vec<_> = out.iter().filter_map(|(_, s)| *s).collect();
    assert_eq!(kinds, vec![SignalKind::EnteredOverbought]);
}

#[test]
fn strictly_falling_closes_read_0() {
    let mut det = detector(IndicatorConfig::rsi(5), 30.0, 70.0);
    let closes: Vec<f64> = (1..=20).map(|i| 200.0 - i as f64).collect();
    let out = feed(&mut det, &closes);

    assert!(out[5..].iter().all(|(r, _)| *r == Some(0.0)));
    let kinds: Vec<_> = out.iter().filter_map(|(_, s)| *s).collect();
    assert_eq!(kinds, vec![SignalKind::EnteredOversold]);
    assert_eq!(det.zone_state(), ZoneState::Oversold);
}

#[test]
fn period_or_fewer_closes_never_read() {
    let mut det = detector(IndicatorConfig::rsi(14), 30.0, 70.0);
    let closes: Vec<f64> = (0..14).map(|i| if i % 2 == 0 { 10.0 } else { 30.0 }).collect();
    let out = feed(&mut det, &closes);
    assert!(out.iter().all(|(r, s)| r.is_none() && s.is_none()));
    assert!(det.reading().is_none());
}

#[test]
fn open_candles_are_ignored_between_closes() {
    let mut with_open = detector(IndicatorConfig::rsi(3), 20.0, 80.0);
    let mut closed_only = detector(IndicatorConfig::rsi(3), 20.0, 80.0);

    for close in [10.0, 12.0, 11.0, 13.0, 9.0, 14.0] {
        for tick in [close * 3.0, close / 4.0] {
            let eval = with_open.evaluate(&PriceCandle::open(tick).unwrap()).unwrap();
            assert!(eval.reading.is_none() && eval.signal.is_none());
        }
        let a = with_open.evaluate(&PriceCandle::closed(close).unwrap()).unwrap();
        let b = closed_only.evaluate(&PriceCandle::closed(close).unwrap()).unwrap();
        assert_eq!(a.reading, b.reading);
        assert_eq!(a.signal.map(|s| s.kind), b.signal.map(|s| s.kind));
    }
    assert_eq!(with_open.window().to_vec(), closed_only.window().to_vec());
}

/// Two fresh detectors fed the same closes agree on every reading and signal.
#[test]
fn replaying_the_same_closes_is_deterministic() {
    let closes: Vec<f64> = (0..60)
        .map(|i| 100.0 + ((i * 37) % 23) as f64 - ((i * 11) % 7) as f64 * 1.5)
        .collect();

    for indicator in [IndicatorConfig::rsi(6), IndicatorConfig::stoch_rsi(6, 3, 2)] {
        let mut first = detector(indicator.clone(), 25.0, 75.0);
        let mut second = detector(indicator, 25.0, 75.0);
        assert_eq!(feed(&mut first, &closes), feed(&mut second, &closes));
    }
}

#[test]
fn stoch_rsi_reads_once_fast_d_is_defined() {
    // lookback = 3 + (2 - 1) + (2 - 1) = 5, so the sixth close reads first
    let mut det = detector(IndicatorConfig::stoch_rsi(3, 2, 2), 20.0, 80.0);
    let closes = [10.0, 11.0, 10.5, 12.0, 11.0, 13.0, 12.5, 14.0, 9.0, 8.0];
    let out = feed(&mut det, &closes);

    assert!(out[..5].iter().all(|(r, _)| r.is_none()));
    for (reading, _) in &out[5..] {
        let value = reading.unwrap();
        assert!((0.0..=100.0).contains(&value), "out of range: {value}");
    }
    assert!(det.window().len() <= 6);
    assert_eq!(det.indicator_label(), "StochRSI(3,2,2)");
}
