//! Closing rules for open signals

use chrono::{DateTime, Utc};
use shared::{Direction, Signal, SignalStatus};

use crate::data::{Candle, Timeframe};

/// Replays candles opened after the signal was created and returns the
/// closing status, or `None` while the signal should stay active.
///
/// The stop-loss is checked before the take-profit inside a candle. A
/// touch inside the still-forming candle closes the signal, but only
/// candles whose bucket ended by `now` count toward `eta`. With no touch
/// after `eta` finished candles the signal is cancelled.
pub fn resolve(
    signal: &Signal,
    candles: &[Candle],
    timeframe: Timeframe,
    now: DateTime<Utc>,
) -> Option<SignalStatus> {
    let eta = usize::try_from(signal.eta.max(0)).unwrap_or(0);
    let mut finished = 0usize;

    for candle in candles.iter().filter(|c| c.timestamp > signal.created_at) {
        if finished >= eta {
            break;
        }

        let (stop_hit, target_hit) = match signal.direction {
            Direction::Long => (candle.low <= signal.sl, candle.high >= signal.tp),
            Direction::Short => (candle.high >= signal.sl, candle.low <= signal.tp),
        };
        if stop_hit {
            return Some(SignalStatus::ClosedLoss);
        }
        if target_hit {
            return Some(SignalStatus::ClosedWin);
        }

        if candle.is_closed(timeframe, now) {
            finished += 1;
        }
    }

    (finished >= eta).then_some(SignalStatus::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};

    fn at(hours: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap() + Duration::hours(hours)
    }

    fn signal(direction: Direction, eta: i32) -> Signal {
        let (tp, sl) = match direction {
            Direction::Long => (102.0, 99.0),
            Direction::Short => (98.0, 101.0),
        };
        Signal {
            id: 1,
            pair: "BTCUSDT".into(),
            direction,
            price: 100.0,
            tp,
            sl,
            probability: 0.7,
            eta,
            timeframe: "1h".into(),
            status: SignalStatus::Active,
            created_at: at(0),
        }
    }

    fn candle(hour: i64, low: f64, high: f64) -> Candle {
        Candle::new(at(hour), 100.0, high, low, 100.0, 1.0)
    }

    /// Resolve with every given candle already finished
    fn settle(signal: &Signal, candles: &[Candle]) -> Option<SignalStatus> {
        resolve(signal, candles, Timeframe::H1, at(1_000))
    }

    #[test]
    fn long_hits_target() {
        let candles = [candle(1, 99.5, 101.0), candle(2, 99.5, 102.5)];
        assert_eq!(settle(&signal(Direction::Long, 5), &candles), Some(SignalStatus::ClosedWin));
    }

    #[test]
    fn stop_checked_first() {
        let candles = [candle(1, 98.0, 103.0)];
        assert_eq!(settle(&signal(Direction::Long, 5), &candles), Some(SignalStatus::ClosedLoss));
        assert_eq!(settle(&signal(Direction::Short, 5), &candles), Some(SignalStatus::ClosedLoss));
    }

    #[test]
    fn short_hits_target() {
        let candles = [candle(1, 97.5, 100.5)];
        assert_eq!(settle(&signal(Direction::Short, 5), &candles), Some(SignalStatus::ClosedWin));
    }

    #[test]
    fn candles_before_creation_are_ignored() {
        let candles = [candle(0, 50.0, 150.0), candle(-1, 50.0, 150.0)];
        assert_eq!(settle(&signal(Direction::Long, 5), &candles), None);
    }

    #[test]
    fn expires_after_eta() {
        let quiet: Vec<Candle> = (1..=3).map(|h| candle(h, 99.5, 101.0)).collect();
        assert_eq!(settle(&signal(Direction::Long, 3), &quiet), Some(SignalStatus::Cancelled));
        assert_eq!(settle(&signal(Direction::Long, 4), &quiet), None);
    }

    #[test]
    fn touch_after_eta_does_not_count() {
        let candles = [candle(1, 99.5, 101.0), candle(2, 99.5, 105.0)];
        assert_eq!(settle(&signal(Direction::Long, 1), &candles), Some(SignalStatus::Cancelled));
    }

    #[test]
    fn forming_candle_does_not_expire_the_signal() {
        let mut signal = signal(Direction::Long, 1);
        signal.created_at = at(0) + Duration::minutes(30);
        let candles = [candle(0, 99.5, 101.0), candle(1, 99.5, 101.0)];

        // 25 minutes into the first bucket after creation
        let now = at(1) + Duration::minutes(25);
        assert_eq!(resolve(&signal, &candles, Timeframe::H1, now), None);

        // the same candle once its hour is over
        let now = at(2);
        assert_eq!(
            resolve(&signal, &candles, Timeframe::H1, now),
            Some(SignalStatus::Cancelled)
        );
    }

    #[test]
    fn touch_inside_forming_candle_closes() {
        let mut signal = signal(Direction::Long, 1);
        signal.created_at = at(0) + Duration::minutes(30);
        let candles = [candle(1, 99.5, 102.5)];
        let now = at(1) + Duration::minutes(10);
        assert_eq!(
            resolve(&signal, &candles, Timeframe::H1, now),
            Some(SignalStatus::ClosedWin)
        );
    }
}
