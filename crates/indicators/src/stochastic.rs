use crate::Series;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_KD_PERIOD: usize = 9;

/// Stochastic Oscillator in the KD form used by Taiwan charting.
///
/// RSV = (Close - Lowest Low) / (Highest High - Lowest Low) * 100
/// K   = 2/3 * prev K + 1/3 * RSV
/// D   = 2/3 * prev D + 1/3 * K
///
/// K and D both start from 50 rather than from the first RSV.
#[derive(Debug, Clone)]
pub struct Kd {
    len: usize,
    highs: VecDeque<Decimal>,
    lows: VecDeque<Decimal>,
    prev_k: Decimal,
    prev_d: Decimal,
    ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KdOutput {
    pub k: Decimal,
    pub d: Decimal,
}

const SEED: Decimal = dec!(50);

impl Kd {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "KD period must be > 0");
        Self {
            len: period,
            highs: VecDeque::with_capacity(period),
            lows: VecDeque::with_capacity(period),
            prev_k: SEED,
            prev_d: SEED,
            ready: false,
        }
    }

    /// Raw stochastic value of `close` within the current window.
    fn rsv(&self, close: Decimal) -> Option<Decimal> {
        let highest = self.highs.iter().max()?;
        let lowest = self.lows.iter().min()?;
        let range = *highest - *lowest;
        if range.is_zero() {
            Some(SEED)
        } else {
            Some((close - *lowest) / range * Decimal::ONE_HUNDRED)
        }
    }

    pub fn next_hlc(&mut self, high: Decimal, low: Decimal, close: Decimal) -> Option<KdOutput> {
        self.highs.push_back(high);
        self.lows.push_back(low);

        if self.highs.len() > self.len {
            self.highs.pop_front();
            self.lows.pop_front();
        }

        if self.highs.len() < self.len {
            return None;
        }

        let rsv = self.rsv(close)?;
        let three = Decimal::from(3);
        let k = (self.prev_k * Decimal::TWO + rsv) / three;
        let d = (self.prev_d * Decimal::TWO + k) / three;

        self.prev_k = k;
        self.prev_d = d;
        self.ready = true;

        Some(KdOutput { k, d })
    }

    pub fn output(&self) -> Option<KdOutput> {
        self.ready.then_some(KdOutput {
            k: self.prev_k,
            d: self.prev_d,
        })
    }

    pub fn reset(&mut self) {
        self.highs.clear();
        self.lows.clear();
        self.prev_k = SEED;
        self.prev_d = SEED;
        self.ready = false;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Index-aligned K and D lines.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KdSeries {
    pub k: Series,
    pub d: Series,
}

impl KdSeries {
    pub fn at(&self, index: usize) -> Option<KdOutput> {
        Some(KdOutput {
            k: (*self.k.get(index)?)?,
            d: (*self.d.get(index)?)?,
        })
    }
}

/// KD over aligned highs, lows and closes. Output follows the length of
/// `closes`; indices past the end of a shorter `highs`/`lows` are absent.
pub fn kd(highs: &[Decimal], lows: &[Decimal], closes: &[Decimal], period: usize) -> KdSeries {
    let mut out = KdSeries {
        k: vec![None; closes.len()],
        d: vec![None; closes.len()],
    };
    if period == 0 {
        return out;
    }

    let mut kernel = Kd::new(period);
    let rows = highs.iter().zip(lows).zip(closes).enumerate();
    for (i, ((high, low), close)) in rows {
        if let Some(o) = kernel.next_hlc(*high, *low, *close) {
            out.k[i] = Some(o.k);
            out.d[i] = Some(o.d);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kd_first_value_from_seed() {
        let highs = [dec!(12), dec!(14), dec!(13)];
        let lows = [dec!(9), dec!(10), dec!(8)];
        let closes = [dec!(11), dec!(13), dec!(12)];
        let out = kd(&highs, &lows, &closes, 3);

        assert!(out.k[..2].iter().all(Option::is_none));
        // RSV = (12 - 8) / (14 - 8) * 100 = 66.67
        let rsv = dec!(4) / dec!(6) * dec!(100);
        let k = (dec!(100) + rsv) / dec!(3);
        let d = (dec!(100) + k) / dec!(3);
        assert_eq!(out.at(2), Some(KdOutput { k, d }));
    }

    #[test]
    fn test_kd_flat_window_rsv_is_50() {
        let flat = vec![dec!(20); 12];
        let out = kd(&flat, &flat, &flat, 9);
        for i in 8..12 {
            let o = out.at(i).unwrap();
            assert_eq!(o.k, dec!(50));
            assert_eq!(o.d, dec!(50));
        }
    }

    #[test]
    fn test_kd_recurrence_uses_previous_k() {
        let mut kd = Kd::new(1);
        let first = kd.next_hlc(dec!(10), dec!(0), dec!(10)).unwrap();
        // RSV 100 -> K = (100 + 100) / 3
        assert_eq!(first.k, dec!(200) / dec!(3));
        let second = kd.next_hlc(dec!(10), dec!(0), dec!(0)).unwrap();
        // RSV 0 -> K = 2/3 * prev K
        assert_eq!(second.k, first.k * dec!(2) / dec!(3));
        assert_eq!(kd.output(), Some(second));
    }

    #[test]
    fn test_kd_bounds() {
        let highs: Vec<Decimal> = (0..40).map(|i| dec!(105) + Decimal::from(i % 5)).collect();
        let lows: Vec<Decimal> = (0..40).map(|i| dec!(95) - Decimal::from(i % 4)).collect();
        let closes: Vec<Decimal> = (0..40).map(|i| dec!(95) + Decimal::from((i * 7) % 11)).collect();
        let out = kd(&highs, &lows, &closes, 9);
        for v in out.k.iter().chain(&out.d).flatten() {
            assert!(*v >= Decimal::ZERO && *v <= dec!(100));
        }
    }

    #[test]
    fn test_kd_lengths() {
        let out = kd(&[dec!(1); 5], &[dec!(1); 5], &[dec!(1); 5], 9);
        assert_eq!(out.k.len(), 5);
        assert!(out.k.iter().chain(&out.d).all(Option::is_none));

        let out = kd(&[dec!(2); 3], &[dec!(1); 3], &[dec!(1); 6], 2);
        assert_eq!(out.k.len(), 6);
        assert!(out.k[1].is_some() && out.k[2].is_some());
        assert!(out.k[3..].iter().all(Option::is_none));
    }

    #[test]
    fn test_kd_reset() {
        let mut kd = Kd::new(1);
        kd.next_hlc(dec!(10), dec!(0), dec!(10));
        kd.reset();
        assert!(!kd.is_ready());
        assert_eq!(kd.output(), None);
    }
}
