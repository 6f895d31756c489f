/*!
Weighted sampling through a discretized inverse cumulative distribution.

A `Distributor` spreads the categories of a weighted list over a fixed number
of slots, each category getting a contiguous run of slots proportional to its
weight. A draw is then one uniform number and one array lookup. The price is a
resolution of `1/SLOTS`: a category with less weight than that gets no slot
and can never be drawn.
*/
use crate::error::SimulationError;
use rand::Rng;

/// Size of the slot table.
pub const SLOTS: usize = 4096;

#[derive(Debug, Clone)]
pub struct Distributor<T> {
    /// The filled slots. Rounding down means this may hold fewer than
    /// `SLOTS` entries, and only the filled ones are ever sampled.
    slots: Vec<T>,
}

impl<T: Copy> Distributor<T> {
    pub fn new<I>(weighted: I) -> Result<Self, SimulationError>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        Self::with_slots(weighted, SLOTS)
    }

    pub fn with_slots<I>(weighted: I, budget: usize) -> Result<Self, SimulationError>
    where
        I: IntoIterator<Item = (T, f64)>,
    {
        let weighted: Vec<(T, f64)> = weighted.into_iter().collect();
        if let Some((_, w)) = weighted.iter().find(|(_, w)| !(*w >= 0.)) {
            return Err(SimulationError::config(format!(
                "distribution weight {} is not a non-negative number",
                w
            )));
        }
        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        if !(total > 0.) || !total.is_finite() {
            return Err(SimulationError::config(format!(
                "distribution weights must add up to a positive number, not {}",
                total
            )));
        }

        let mut slots = Vec::with_capacity(budget);
        for (value, weight) in weighted {
            let n = (weight / total * budget as f64).floor() as usize;
            let n = n.min(budget - slots.len());
            slots.extend(std::iter::repeat(value).take(n));
        }
        if slots.is_empty() {
            return Err(SimulationError::config(
                "no category of the distribution is large enough to be drawn",
            ));
        }
        Ok(Distributor { slots })
    }

    /// Number of filled slots.
    pub fn top(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[T] {
        &self.slots
    }

    /// Look up the value for a uniform number `u` in `[0, 1)`.
    pub fn lookup(&self, u: f64) -> T {
        let index = (u * self.slots.len() as f64).floor() as usize;
        self.slots[index.min(self.slots.len() - 1)]
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.lookup(rng.gen::<f64>())
    }
}
