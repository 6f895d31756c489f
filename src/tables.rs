/*!
Attribute tables: who spreads how much and how far, and how age affects the
outcome of an illness. Both come with built-in defaults and can be replaced by
CSV files; the spreader grades are changed at runtime by interventions.
*/
use crate::csvtable::{self, Rows};
use crate::distribution::Distributor;
use crate::error::SimulationError;
use log::trace;
use serde_derive::{Deserialize, Serialize};
use std::path::Path;

/// One row of the spreader grade table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreaderGrade {
    pub grade: u32,
    /// Share of the population in this grade. Only used when the population
    /// is created.
    pub proportion: f64,
    /// Personal reproduction number.
    pub r: f64,
    /// Half width, in grid cells, of the square inside which this grade
    /// infects others.
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreaderGrades {
    pub grades: Vec<SpreaderGrade>,
}

/// R and radius must be finite and not negative.
fn usable(r: f64, radius: f64) -> bool {
    r >= 0. && r.is_finite() && radius >= 0. && radius.is_finite()
}

/// A person's grade is stored in a byte.
pub const MAX_SPREADER_GRADES: usize = 256;

impl Default for SpreaderGrades {
    fn default() -> Self {
        // About 80% of secondary transmissions come from a small fraction of
        // infectious individuals.
        let rows = [
            (0.25, 0.5, 3.),
            (0.5, 1.0, 5.),
            (0.2, 1.25, 10.),
            (0.05, 12.5, 25.),
        ];
        SpreaderGrades {
            grades: rows
                .iter()
                .enumerate()
                .map(|(i, &(proportion, r, radius))| SpreaderGrade {
                    grade: i as u32,
                    proportion,
                    r,
                    radius,
                })
                .collect(),
        }
    }
}

impl SpreaderGrades {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        Self::from_rows(&csvtable::read_table(path, false)?)
    }

    pub fn from_rows(rows: &Rows) -> Result<Self, SimulationError> {
        const TABLE: &str = "spreader grade";
        csvtable::expect_columns(rows, 4, TABLE)?;
        let mut grades = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            grades.push(SpreaderGrade {
                grade: csvtable::cell(rows, i, 0, TABLE)? as u32,
                proportion: csvtable::cell(rows, i, 1, TABLE)?,
                r: csvtable::cell(rows, i, 2, TABLE)?,
                radius: csvtable::cell(rows, i, 3, TABLE)?,
            });
        }
        let grades = SpreaderGrades { grades };
        grades.check()?;
        trace!("Loaded {} spreader grades", grades.len());
        Ok(grades)
    }

    pub fn check(&self) -> Result<(), SimulationError> {
        if self.grades.is_empty() || self.grades.len() > MAX_SPREADER_GRADES {
            return Err(SimulationError::config(format!(
                "need between 1 and {} spreader grades, got {}",
                MAX_SPREADER_GRADES,
                self.grades.len()
            )));
        }
        if let Some(g) = self.grades.iter().find(|g| !usable(g.r, g.radius)) {
            return Err(SimulationError::config(format!(
                "spreader grade {} has invalid R {} or radius {}",
                g.grade, g.r, g.radius
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.grades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grades.is_empty()
    }

    pub fn get(&self, index: u8) -> &SpreaderGrade {
        &self.grades[index as usize]
    }

    /// Sampler over row indices, weighted by proportion.
    pub fn distributor(&self) -> Result<Distributor<u8>, SimulationError> {
        Distributor::new(
            self.grades
                .iter()
                .enumerate()
                .map(|(i, g)| (i as u8, g.proportion)),
        )
    }
}

/// One row of the age table, covering ages from `age` up to the next row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    pub age: u8,
    pub weight: f64,
    /// Relative susceptibility. Carried along, but not used by the model yet.
    pub susceptibility: f64,
    /// Probability of dying at the end of the illness.
    pub mortality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeTable {
    bands: Vec<AgeBand>,
    /// Row index for every age in years.
    #[serde(skip)]
    by_year: Vec<usize>,
}

const YEARS_PER_AGE_GROUP: u8 = 6;

/// Share of the UK population (ONS mid-2019 estimates) in six-year groups.
const PEOPLE_PER_AGE_GROUP: [f64; 16] = [
    0.0752058, 0.0796961, 0.0754907, 0.071097, 0.085826, 0.0956717, 0.0869349, 0.077162,
    0.0813619, 0.0645441, 0.057532, 0.0524967, 0.0458074, 0.028929, 0.0222447, 0.,
];

const MORTALITY_PER_AGE_GROUP: [f64; 16] = [
    0.00002, 0.00002, 0.00005, 0.0001, 0.0002, 0.0004, 0.0008, 0.0015, 0.003, 0.006, 0.012,
    0.025, 0.05, 0.09, 0.15, 0.2,
];

impl Default for AgeTable {
    fn default() -> Self {
        let mut table = AgeTable {
            bands: PEOPLE_PER_AGE_GROUP
                .iter()
                .zip(MORTALITY_PER_AGE_GROUP.iter())
                .enumerate()
                .map(|(i, (&weight, &mortality))| AgeBand {
                    age: i as u8 * YEARS_PER_AGE_GROUP,
                    weight,
                    susceptibility: 1.,
                    mortality,
                })
                .collect(),
            by_year: vec![],
        };
        table.index_years();
        table
    }
}

impl AgeTable {
    pub fn new(bands: Vec<AgeBand>) -> Result<Self, SimulationError> {
        if bands.is_empty() {
            return Err(SimulationError::config("the age table is empty"));
        }
        if bands.windows(2).any(|w| w[0].age >= w[1].age) {
            return Err(SimulationError::config(
                "age table rows must be in strictly increasing order of age",
            ));
        }
        let mut table = AgeTable {
            bands,
            by_year: vec![],
        };
        table.index_years();
        Ok(table)
    }

    fn index_years(&mut self) {
        let mut row = 0;
        self.by_year = (0..=u8::MAX as usize)
            .map(|year| {
                while row + 1 < self.bands.len() && self.bands[row + 1].age as usize <= year {
                    row += 1;
                }
                row
            })
            .collect();
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        Self::from_rows(&csvtable::read_table(path, false)?)
    }

    pub fn from_rows(rows: &Rows) -> Result<Self, SimulationError> {
        const TABLE: &str = "age";
        csvtable::expect_columns(rows, 4, TABLE)?;
        let mut bands = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            let age = csvtable::cell(rows, i, 0, TABLE)?;
            if !(0. ..=u8::MAX as f64).contains(&age) {
                return Err(SimulationError::config(format!(
                    "{} table row {} has age {} outside 0 to {}",
                    TABLE,
                    i + 1,
                    age,
                    u8::MAX
                )));
            }
            bands.push(AgeBand {
                age: age as u8,
                weight: csvtable::cell(rows, i, 1, TABLE)?,
                susceptibility: csvtable::cell(rows, i, 2, TABLE)?,
                mortality: csvtable::cell(rows, i, 3, TABLE)?,
            });
        }
        trace!("Loaded {} age bands", bands.len());
        AgeTable::new(bands)
    }

    pub fn bands(&self) -> &[AgeBand] {
        &self.bands
    }

    /// The band covering `age`.
    pub fn band(&self, age: u8) -> &AgeBand {
        match self.by_year.get(age as usize) {
            Some(&row) => &self.bands[row],
            // Only before `index_years` ran on a deserialized table.
            None => self
                .bands
                .iter()
                .rev()
                .find(|b| b.age <= age)
                .unwrap_or(&self.bands[0]),
        }
    }

    pub fn mortality(&self, age: u8) -> f64 {
        self.band(age).mortality
    }

    /// Sampler over ages, weighted by population share.
    pub fn distributor(&self) -> Result<Distributor<u8>, SimulationError> {
        Distributor::new(self.bands.iter().map(|b| (b.age, b.weight)))
    }

    /// Rebuild the per-year index after deserialization.
    pub fn reindex(&mut self) {
        self.index_years();
    }
}

/// A scheduled intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intervention {
    /// Applied on the first simulated day after this one.
    pub day: u32,
    pub vaccinations: usize,
    /// New `(R, radius)` for the first grades of the spreader table, in order.
    pub grades: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interventions {
    pub schedule: Vec<Intervention>,
    /// Index of the next row not yet applied.
    pub next: usize,
}

impl Interventions {
    pub fn new(schedule: Vec<Intervention>) -> Self {
        Interventions { schedule, next: 0 }
    }

    pub fn from_file<P: AsRef<Path>>(path: P, zero_repeats: bool) -> Result<Self, SimulationError> {
        Self::from_rows(&csvtable::read_table(path, zero_repeats)?)
    }

    pub fn from_rows(rows: &Rows) -> Result<Self, SimulationError> {
        const TABLE: &str = "interventions";
        let columns = rows.first().map_or(2, |r| r.len());
        if columns < 2 || columns % 2 != 0 {
            return Err(SimulationError::config(format!(
                "{} table needs day, vaccinations, and R and radius pairs, got {} columns",
                TABLE, columns
            )));
        }
        csvtable::expect_columns(rows, columns, TABLE)?;
        let mut schedule = Vec::with_capacity(rows.len());
        for i in 0..rows.len() {
            let mut grades = Vec::with_capacity((columns - 2) / 2);
            for c in (2..columns).step_by(2) {
                grades.push((
                    csvtable::cell(rows, i, c, TABLE)?,
                    csvtable::cell(rows, i, c + 1, TABLE)?,
                ));
            }
            schedule.push(Intervention {
                day: csvtable::cell(rows, i, 0, TABLE)? as u32,
                vaccinations: csvtable::cell(rows, i, 1, TABLE)? as usize,
                grades,
            });
        }
        trace!("Loaded {} interventions", schedule.len());
        Ok(Interventions::new(schedule))
    }

    /// Interventions may only touch grades that exist.
    pub fn check(&self, grades: &SpreaderGrades) -> Result<(), SimulationError> {
        for i in self.schedule.iter() {
            if i.grades.len() > grades.len() {
                return Err(SimulationError::config(format!(
                    "intervention on day {} changes {} grades, but there are only {}",
                    i.day,
                    i.grades.len(),
                    grades.len()
                )));
            }
            if let Some((r, radius)) = i.grades.iter().find(|(r, radius)| !usable(*r, *radius)) {
                return Err(SimulationError::config(format!(
                    "intervention on day {} sets invalid R {} or radius {}",
                    i.day, r, radius
                )));
            }
        }
        Ok(())
    }

    /// The next unapplied intervention, if it is due on `day`.
    pub fn due(&self, day: u32) -> Option<&Intervention> {
        self.schedule.get(self.next).filter(|i| day > i.day)
    }
}
