/*!
The population: a flat vector of people, read as a grid.

People never move. Who can infect whom depends only on where they sit in the
grid, so the grid is nothing more than a way of computing the index of a
neighbour from an index and an offset.
*/
use crate::error::SimulationError;
use rayon::prelude::*;
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthState {
    Susceptible,
    Incubating,
    Asymptomatic,
    /// Infectious before showing symptoms.
    Carrying,
    Ill,
    Recovered,
    Vaccinated,
    Died,
    /// Placeholder. Ages like the immune states and is never counted.
    Nobody,
}

impl HealthState {
    pub fn is_infectious(self) -> bool {
        matches!(
            self,
            HealthState::Carrying | HealthState::Ill | HealthState::Asymptomatic
        )
    }
}

/// One person. Small and `Copy`, so that the daily scan over tens of
/// millions of them stays a walk over contiguous memory.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub state: HealthState,
    pub days_in_state: u16,
    /// Row of the spreader grade table.
    pub spreader_grade: u8,
    /// Age in years.
    pub age: u8,
}

impl Person {
    pub fn new(spreader_grade: u8, age: u8) -> Self {
        Person {
            state: HealthState::Susceptible,
            days_in_state: 0,
            spreader_grade,
            age,
        }
    }

    pub fn enter(&mut self, state: HealthState) {
        self.state = state;
        self.days_in_state = 0;
    }

    pub fn age_one_day(&mut self) {
        self.days_in_state = self.days_in_state.saturating_add(1);
    }
}

/// Number of people in each state.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub susceptible: usize,
    pub incubating: usize,
    pub asymptomatic: usize,
    pub carrying: usize,
    pub ill: usize,
    pub recovered: usize,
    pub vaccinated: usize,
    pub died: usize,
}

impl Counts {
    fn slot(&mut self, state: HealthState) -> Option<&mut usize> {
        match state {
            HealthState::Susceptible => Some(&mut self.susceptible),
            HealthState::Incubating => Some(&mut self.incubating),
            HealthState::Asymptomatic => Some(&mut self.asymptomatic),
            HealthState::Carrying => Some(&mut self.carrying),
            HealthState::Ill => Some(&mut self.ill),
            HealthState::Recovered => Some(&mut self.recovered),
            HealthState::Vaccinated => Some(&mut self.vaccinated),
            HealthState::Died => Some(&mut self.died),
            HealthState::Nobody => None,
        }
    }

    /// Book one person moving from `from` to `to`.
    pub fn transition(&mut self, from: HealthState, to: HealthState) {
        if let Some(c) = self.slot(from) {
            *c = c.saturating_sub(1);
        }
        if let Some(c) = self.slot(to) {
            *c += 1;
        }
    }

    pub fn add(&mut self, state: HealthState) {
        if let Some(c) = self.slot(state) {
            *c += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.susceptible
            + self.incubating
            + self.asymptomatic
            + self.carrying
            + self.ill
            + self.recovered
            + self.vaccinated
            + self.died
    }

    fn merge(mut self, other: Counts) -> Counts {
        self.susceptible += other.susceptible;
        self.incubating += other.incubating;
        self.asymptomatic += other.asymptomatic;
        self.carrying += other.carrying;
        self.ill += other.ill;
        self.recovered += other.recovered;
        self.vaccinated += other.vaccinated;
        self.died += other.died;
        self
    }
}

/// How offsets that leave the grid come back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Wrap {
    /// Offsets are applied to the flat index, modulo the population size. A
    /// horizontal offset past the end of a row continues on the next row.
    Flat,
    /// Columns wrap within their row and rows wrap within the grid.
    Torus,
}

impl Default for Wrap {
    fn default() -> Self {
        Wrap::Flat
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Population {
    pub people: Vec<Person>,
    pub width: usize,
    pub height: usize,
    pub wrap: Wrap,
}

impl Population {
    /// The grid dimensions for a requested population size: as square as
    /// possible, and rounded down to whole rows.
    pub fn dimensions(requested: usize) -> Result<(usize, usize), SimulationError> {
        if requested == 0 {
            return Err(SimulationError::config("the population must not be empty"));
        }
        let mut width = (requested as f64).sqrt().floor() as usize;
        // Float rounding can be off by one for very large sizes.
        while width * width > requested {
            width -= 1;
        }
        while (width + 1) * (width + 1) <= requested {
            width += 1;
        }
        Ok((width, requested / width))
    }

    pub fn new<F>(requested: usize, wrap: Wrap, mut person: F) -> Result<Self, SimulationError>
    where
        F: FnMut() -> Person,
    {
        let (width, height) = Population::dimensions(requested)?;
        let people = (0..width * height).map(|_| person()).collect();
        Ok(Population {
            people,
            width,
            height,
            wrap,
        })
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// The index of the person `dx` columns and `dy` rows away from `index`.
    /// Offsets of any size are reduced before they are applied.
    pub fn neighbour(&self, index: usize, dx: i64, dy: i64) -> usize {
        let n = self.people.len();
        // n == width * height, so whole rows reduce modulo the height.
        let rows = dy.rem_euclid(self.height as i64) as usize;
        match self.wrap {
            Wrap::Flat => {
                let columns = dx.rem_euclid(n as i64) as usize;
                (index + columns + rows * self.width) % n
            }
            Wrap::Torus => {
                let columns = dx.rem_euclid(self.width as i64) as usize;
                let x = (index % self.width + columns) % self.width;
                let y = (index / self.width + rows) % self.height;
                y * self.width + x
            }
        }
    }

    /// Count the people in each state by looking at every one of them. The
    /// simulation keeps its counts up to date incrementally; this is only for
    /// checking that bookkeeping.
    pub fn census(&self) -> Counts {
        self.people
            .par_iter()
            .fold(Counts::default, |mut c, p| {
                c.add(p.state);
                c
            })
            .reduce(Counts::default, Counts::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(requested: usize, wrap: Wrap) -> Population {
        Population::new(requested, wrap, || Person::new(0, 0)).unwrap()
    }

    #[test]
    fn grid_is_rounded_down_to_a_rectangle() {
        for &requested in &[1usize, 2, 10, 100, 101, 1000, 1 << 20, 12_345_678] {
            let (width, height) = Population::dimensions(requested).unwrap();
            assert_eq!(width, (requested as f64).sqrt().floor() as usize);
            assert!(width * height <= requested);
            assert!(width * (height + 1) > requested);
        }
        let g = grid(1000, Wrap::Flat);
        assert_eq!((g.width, g.height, g.len()), (31, 32, 992));
    }

    #[test]
    fn empty_grid_is_rejected() {
        assert!(Population::dimensions(0).is_err());
    }

    #[test]
    fn flat_wrap_bleeds_into_the_next_row() {
        let g = grid(100, Wrap::Flat);
        assert_eq!(g.neighbour(9, 1, 0), 10);
        assert_eq!(g.neighbour(0, -1, 0), 99);
        assert_eq!(g.neighbour(0, 0, -1), 90);
        assert_eq!(g.neighbour(95, 3, 1), 8);
        assert_eq!(g.neighbour(55, -25, -30), 30);
    }

    #[test]
    fn huge_offsets_do_not_overflow() {
        let g = grid(100, Wrap::Flat);
        let offsets = [
            (i64::MAX, i64::MAX),
            (i64::MIN, i64::MAX),
            (i64::MAX, i64::MIN),
            (3, i64::MIN),
        ];
        for &(dx, dy) in offsets.iter() {
            let expected = (55 + dx as i128 + dy as i128 * 10).rem_euclid(100) as usize;
            assert_eq!(g.neighbour(55, dx, dy), expected);
        }
        let t = grid(100, Wrap::Torus);
        let expected_x = (5 + i64::MAX as i128).rem_euclid(10) as usize;
        let expected_y = (5 + i64::MIN as i128).rem_euclid(10) as usize;
        assert_eq!(t.neighbour(55, i64::MAX, i64::MIN), expected_y * 10 + expected_x);
    }

    #[test]
    fn torus_wrap_stays_in_the_row() {
        let g = grid(100, Wrap::Torus);
        assert_eq!(g.neighbour(9, 1, 0), 0);
        assert_eq!(g.neighbour(0, -1, 0), 9);
        assert_eq!(g.neighbour(0, 0, -1), 90);
        assert_eq!(g.neighbour(99, 1, 1), 0);
    }

    #[test]
    fn counts_follow_transitions() {
        let mut c = Counts {
            susceptible: 3,
            ..Counts::default()
        };
        c.transition(HealthState::Susceptible, HealthState::Incubating);
        c.transition(HealthState::Incubating, HealthState::Carrying);
        assert_eq!(c.susceptible, 2);
        assert_eq!(c.incubating, 0);
        assert_eq!(c.carrying, 1);
        assert_eq!(c.total(), 3);
    }

    #[test]
    fn census_counts_every_person() {
        let mut g = grid(100, Wrap::Flat);
        g.people[3].enter(HealthState::Ill);
        g.people[50].enter(HealthState::Died);
        g.people[51].enter(HealthState::Nobody);
        let c = g.census();
        assert_eq!(c.ill, 1);
        assert_eq!(c.died, 1);
        assert_eq!(c.susceptible, 97);
        assert_eq!(c.total(), 99);
    }
}
