//! Incremental rolling-window sums over a bounded trailing buffer.

use std::collections::VecDeque;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::record::WindowFeatures;
use premia_types::WindowSet;

/// Raised when a running sum or mean leaves the `Decimal` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("decimal overflow in rolling window arithmetic")]
pub struct Overflow;

/// One sample fed into the rolling state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// `primary.close - secondary.close`.
    pub diff: Decimal,
    /// Percentage premium, already rounded; `None` when undefined.
    pub pct: Option<Decimal>,
    /// Primary base volume.
    pub primary_volume: Decimal,
    /// Secondary base volume.
    pub secondary_volume: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Sums {
    diff: Decimal,
    pct: Decimal,
    pct_count: usize,
    primary_volume: Decimal,
    secondary_volume: Decimal,
}

impl Sums {
    const ZERO: Self = Self {
        diff: Decimal::ZERO,
        pct: Decimal::ZERO,
        pct_count: 0,
        primary_volume: Decimal::ZERO,
        secondary_volume: Decimal::ZERO,
    };

    fn add(self, o: &Observation) -> Result<Self, Overflow> {
        let (pct, pct_count) = match o.pct {
            Some(p) => (self.pct.checked_add(p).ok_or(Overflow)?, self.pct_count + 1),
            None => (self.pct, self.pct_count),
        };
        Ok(Self {
            diff: self.diff.checked_add(o.diff).ok_or(Overflow)?,
            pct,
            pct_count,
            primary_volume: self
                .primary_volume
                .checked_add(o.primary_volume)
                .ok_or(Overflow)?,
            secondary_volume: self
                .secondary_volume
                .checked_add(o.secondary_volume)
                .ok_or(Overflow)?,
        })
    }

    fn sub(self, o: &Observation) -> Result<Self, Overflow> {
        let (pct, pct_count) = match o.pct {
            Some(p) => (self.pct.checked_sub(p).ok_or(Overflow)?, self.pct_count - 1),
            None => (self.pct, self.pct_count),
        };
        Ok(Self {
            diff: self.diff.checked_sub(o.diff).ok_or(Overflow)?,
            pct,
            pct_count,
            primary_volume: self
                .primary_volume
                .checked_sub(o.primary_volume)
                .ok_or(Overflow)?,
            secondary_volume: self
                .secondary_volume
                .checked_sub(o.secondary_volume)
                .ok_or(Overflow)?,
        })
    }
}

/// Per-instrument rolling state for one cycle.
///
/// Keeps the last `max(windows)` observations and one set of running sums per
/// window. Each push adds the new sample to every window and evicts the sample
/// that fell out of it, so the cost per observation is O(windows). Sums are
/// exact decimal arithmetic over already-rounded inputs, which makes the
/// incremental result identical to recomputing each window from scratch.
/// Volume sums are reported normalized so their text form does not depend on
/// which samples were evicted before.
///
/// The state is created by the feature calculator, fed in timestamp order and
/// dropped at the end of the cycle.
#[derive(Debug, Clone)]
pub struct RollingState {
    sizes: Vec<usize>,
    sums: Vec<Sums>,
    buf: VecDeque<Observation>,
    cap: usize,
    scale: u32,
}

impl RollingState {
    /// Fresh state for the given windows; means are rounded to `scale` places.
    #[must_use]
    pub fn new(windows: &WindowSet, scale: u32) -> Self {
        let sizes = windows.sizes().to_vec();
        Self {
            sums: vec![Sums::ZERO; sizes.len()],
            cap: windows.max(),
            buf: VecDeque::with_capacity(windows.max()),
            sizes,
            scale,
        }
    }

    /// Number of observations currently buffered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True before the first successful push.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Push the next observation and return the features of every window,
    /// the new sample included.
    ///
    /// A window holding fewer than `w` samples averages over the samples it
    /// has.
    ///
    /// # Errors
    /// Returns `Overflow` if any sum or mean leaves the `Decimal` range. The
    /// state is left exactly as before the call, so the caller may drop the
    /// sample and continue.
    pub fn push(&mut self, obs: Observation) -> Result<Vec<WindowFeatures>, Overflow> {
        let len = self.buf.len();
        let mut next = Vec::with_capacity(self.sizes.len());
        let mut features = Vec::with_capacity(self.sizes.len());

        for (&w, &sums) in self.sizes.iter().zip(&self.sums) {
            let mut s = sums.add(&obs)?;
            if len >= w {
                s = s.sub(&self.buf[len - w])?;
            }
            let count = (len + 1).min(w);
            features.push(self.features_for(w, count, &s, &obs)?);
            next.push(s);
        }

        self.sums = next;
        self.buf.push_back(obs);
        if self.buf.len() > self.cap {
            self.buf.pop_front();
        }
        Ok(features)
    }

    fn features_for(
        &self,
        window: usize,
        count: usize,
        s: &Sums,
        obs: &Observation,
    ) -> Result<WindowFeatures, Overflow> {
        let avg_diff = mean(s.diff, count, self.scale)?;
        let avg_pct = if s.pct_count == 0 {
            None
        } else {
            Some(mean(s.pct, s.pct_count, self.scale)?)
        };
        let deviation_diff = obs.diff.checked_sub(avg_diff).ok_or(Overflow)?;
        let deviation_pct = match (obs.pct, avg_pct) {
            (Some(p), Some(a)) => Some(p.checked_sub(a).ok_or(Overflow)?),
            _ => None,
        };
        Ok(WindowFeatures {
            window,
            avg_diff,
            avg_pct,
            deviation_diff,
            deviation_pct,
            primary_volume_sum: s.primary_volume.normalize(),
            secondary_volume_sum: s.secondary_volume.normalize(),
        })
    }
}

fn mean(sum: Decimal, count: usize, scale: u32) -> Result<Decimal, Overflow> {
    let n = Decimal::from(u64::try_from(count).map_err(|_| Overflow)?);
    sum.checked_div(n)
        .map(|m| m.round_dp(scale).normalize())
        .ok_or(Overflow)
}
