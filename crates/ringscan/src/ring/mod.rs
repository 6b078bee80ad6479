//! Token-ring partitioning.
//!
//! The ring is the signed 64-bit token space `[i64::MIN, i64::MAX]`, treated
//! as a bounded line rather than a circle. Its cardinality does not fit in
//! 64 bits, so all span arithmetic goes through `BigInt`.

#[cfg(test)]
mod tests;

use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive};
use std::{fmt, num::NonZeroUsize};

/// Smallest token on the ring.
pub const RING_MIN: i64 = i64::MIN;

/// Largest token on the ring.
pub const RING_MAX: i64 = i64::MAX;

///
/// TokenRange
///
/// Contiguous slice of the ring.
/// `from` is the inclusive lower boundary (absent = ring minimum), `to` the
/// exclusive upper boundary (absent = ring maximum). A `to` equal to the ring
/// maximum is inclusive: no token lies beyond it. When both are present
/// `from < to`.
///

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct TokenRange {
    from: Option<i64>,
    to: Option<i64>,
}

impl TokenRange {
    /// The whole ring.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            from: None,
            to: None,
        }
    }

    /// Build a range, returning `None` when both bounds are present and
    /// not strictly increasing.
    #[must_use]
    pub const fn new(from: Option<i64>, to: Option<i64>) -> Option<Self> {
        if let (Some(from), Some(to)) = (from, to)
            && from >= to
        {
            return None;
        }

        Some(Self { from, to })
    }

    #[must_use]
    pub const fn from(&self) -> Option<i64> {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> Option<i64> {
        self.to
    }

    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Lower boundary with the ring minimum substituted for an absent bound.
    #[must_use]
    pub const fn lower_bound(&self) -> i64 {
        match self.from {
            Some(from) => from,
            None => RING_MIN,
        }
    }

    /// Upper boundary with the ring maximum substituted for an absent bound.
    #[must_use]
    pub const fn upper_bound(&self) -> i64 {
        match self.to {
            Some(to) => to,
            None => RING_MAX,
        }
    }

    /// Fraction of this range covered once a scan has reached `token`.
    ///
    /// Tokens below the lower bound yield 0, tokens at or above the upper
    /// bound yield 1. The result is always within `[0, 1]`.
    #[must_use]
    pub fn fraction_at(&self, token: i64) -> f64 {
        let lower = self.lower_bound();
        let upper = self.upper_bound();

        if token < lower {
            return 0.0;
        }
        if token >= upper {
            return 1.0;
        }

        let span = BigInt::from(upper) - BigInt::from(lower);
        let done = BigInt::from(token) - BigInt::from(lower);

        ratio(&done, &span).clamp(0.0, 1.0)
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.from {
            Some(from) => write!(f, "({from}, ")?,
            None => f.write_str("[min, ")?,
        }
        match self.to {
            Some(to) => write!(f, "{to}]"),
            None => f.write_str("max]"),
        }
    }
}

/// Split the whole ring into `splits` contiguous, non-overlapping ranges.
///
/// The first range has an absent lower bound. The last range ends at the ring
/// maximum and absorbs the remainder of the integer division; a single split
/// is the whole ring `{absent, absent}`. Adjacent ranges share their boundary.
#[must_use]
pub fn split_token_ring(splits: NonZeroUsize) -> Vec<TokenRange> {
    let count = splits.get();
    if count == 1 {
        return vec![TokenRange::full()];
    }

    let min = BigInt::from(RING_MIN);
    let cardinality = BigInt::from(RING_MAX) - &min;
    let step = cardinality / BigInt::from(count);

    (0..count)
        .map(|i| {
            let lower = &min + &step * BigInt::from(i);

            let from = (i != 0).then(|| narrow(&lower));
            let to = if i == count - 1 {
                RING_MAX
            } else {
                narrow(&(lower + &step))
            };

            TokenRange { from, to: Some(to) }
        })
        .collect()
}

// Narrow a ring coordinate back to i64.
// Boundaries are MIN + i*step with i < splits, so they never leave the ring;
// saturation only guards the conversion.
fn narrow(value: &BigInt) -> i64 {
    value.to_i64().unwrap_or(if value.is_negative() {
        RING_MIN
    } else {
        RING_MAX
    })
}

// Divide two non-negative spans that may exceed 64 bits.
fn ratio(done: &BigInt, span: &BigInt) -> f64 {
    match (done.to_f64(), span.to_f64()) {
        (Some(done), Some(span)) if span > 0.0 => done / span,
        _ => 0.0,
    }
}
