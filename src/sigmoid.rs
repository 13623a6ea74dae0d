//! Precomputed lookup table approximating the logistic function.

use std::sync::OnceLock;

use crate::real;

/// Dot products are only scored inside `(-MAX_EXP, MAX_EXP)`; outside it the
/// sigmoid is treated as fully saturated.
pub(crate) const MAX_EXP: real = 6.0;

const EXP_TABLE_SIZE: usize = 1000;

static TABLE: OnceLock<SigmoidTable> = OnceLock::new();

/// Process-wide table, computed once before the first training task reads it
/// and never mutated afterwards.
pub(crate) fn sigmoid_table() -> &'static SigmoidTable {
    TABLE.get_or_init(SigmoidTable::new)
}

pub(crate) struct SigmoidTable {
    values: Vec<real>,
}

impl SigmoidTable {
    fn new() -> Self {
        let values = (0..EXP_TABLE_SIZE)
            .map(|i| {
                let e = ((i as real / EXP_TABLE_SIZE as real * 2.0 - 1.0) * MAX_EXP).exp(); // Precompute the exp() table
                e / (e + 1.0) // Precompute f(x) = x / (x + 1)
            })
            .collect();
        SigmoidTable { values }
    }

    /// Lookup for `x` inside the table's domain.
    pub(crate) fn value(&self, x: real) -> real {
        self.values[((x + MAX_EXP) * (EXP_TABLE_SIZE as real / MAX_EXP / 2.0)) as usize]
    }

    /// Like [`value`](Self::value), saturating to the asymptotes outside the
    /// domain.
    pub(crate) fn value_saturating(&self, x: real) -> real {
        if x > MAX_EXP {
            1.0
        } else if x < -MAX_EXP {
            0.0
        } else {
            self.value(x)
        }
    }
}
