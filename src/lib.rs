/*!
Model Description
=================

This model description loosely follows the ODD (Overview, Design concept,
Details) protocol (Grimm et al., 2006; Grimm et al., 2010). The description
lives next to the code that implements it, so the two can be read together.

# 1. Purpose

The model simulates the spread of an infectious disease through a large
synthetic population, and reports for every day how many people are
susceptible, incubating, infectious, ill, recovered, vaccinated or dead. It is
meant to explore how heterogeneity in the population (age, and how strongly
and how far a person spreads the disease) and scheduled interventions
(vaccination pushes, reductions of contact radius and R) change the course of
an epidemic.

Reports suggest that most secondary transmissions of some diseases are caused
by a small fraction of the infectious individuals. The model therefore
assigns every person a *spreader grade*, which fixes their personal
reproduction number and the distance over which they infect others.

 */

use log::{debug, info, warn};
use rand::prelude::*;
use serde_derive::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub mod cli;
pub mod csvtable;
mod debug;
pub mod distribution;
pub mod error;
pub mod grid;
pub mod logging;
pub mod parameters;
pub mod tables;
pub mod util;

pub use error::SimulationError;
pub use grid::{Counts, HealthState, Person, Population, Wrap};
pub use parameters::{Days, Parameters};
pub use tables::{AgeTable, Interventions, SpreaderGrades};

/**
# 2. Entities, state variables, and scales

Time advances in discrete steps of one day.

## 2.1 People and the grid

The agents are people, each with a health state, the number of days they
have been in that state, a spreader grade and an age. People do not move. They
are stored in one flat vector that is read as a grid of rows, and an infectious
person reaches the people within a square around their own cell, whose half
width is given by their spreader grade (see `grid`).

## 2.2 Attribute tables

The spreader grade table gives the share of the population in each grade, its
personal R and its contact radius. The age table gives the share of the
population in each age band and the probability of dying at the end of an
illness. Interventions overwrite the R and radius of spreader grades while the
simulation runs (see `tables`).

## 2.3 State

The state holds the parameters, the tables, the intervention schedule, the
population, and the number of people in each health state. These counts are
kept up to date with every change of state, instead of being recounted from
the population. The state also keeps the previous day's counts and how many
days in a row they have stayed the same, to detect the end of the epidemic.

 */
#[derive(Serialize, Deserialize)]
pub struct State {
    /// The parameters of the model
    pub p: Parameters,
    pub grades: SpreaderGrades,
    pub ages: AgeTable,
    pub interventions: Interventions,
    pub population: Population,
    pub counts: Counts,
    /// The counts at the end of the previous day.
    pub previous: Counts,
    /// Number of consecutive days on which the counts did not change.
    pub stable_days: Days,
    /// The next day to simulate.
    pub t: Days,
    #[serde(skip, default = "unseeded")]
    rng: StdRng,
}

fn unseeded() -> StdRng {
    StdRng::seed_from_u64(0)
}

impl State {
    /// The counts must always add up to the population size. If they do not,
    /// the bookkeeping has gone wrong somewhere.
    pub fn check_counts(&self) -> Result<(), SimulationError> {
        let actual = self.counts.total();
        if actual == self.population.len() {
            Ok(())
        } else {
            Err(SimulationError::CountMismatch {
                expected: self.population.len(),
                actual,
            })
        }
    }

    /// Compare today's counts to yesterday's and remember them. Returns
    /// whether the epidemic has stood still for longer than an infectious
    /// period.
    fn settle(&mut self) -> bool {
        if self.counts == self.previous {
            self.stable_days += 1;
        } else {
            self.stable_days = 0;
        }
        self.previous = self.counts;
        self.stable_days > self.p.infectious_days
    }
}

/**
# 3. Process overview and scheduling

Each day proceeds as follows.

1. If an intervention is due, it is applied (Submodel 7.3). At most one
   intervention is applied per day.
2. Every person, in the order in which they are stored, advances through
   their course of disease (Submodel 7.2). Infectious people may infect others
   (Submodel 7.1) before possibly moving on to the next state.
3. The counts are checked and reported.

Because people are updated in order, somebody infected today by a person
further down the grid is updated later on the same day, while somebody
infected by a person further up is not. A newly infected person is incubating
and cannot pass the infection on the same day either way.

 */
pub fn step(s: &mut State) {
    let State {
        p,
        grades,
        ages,
        interventions,
        population,
        counts,
        rng,
        t,
        ..
    } = s;

    if let Some(vaccinated) =
        submodels::interventions::apply_due(interventions, grades, population, counts, *t, rng)
    {
        info!("Day {}: intervention applied, {} people vaccinated", t, vaccinated);
    }

    let mut infected = 0;
    for i in 0..population.len() {
        infected += submodels::progression::advance(i, population, counts, grades, ages, p, rng);
    }
    debug!("Day {}: {} new infections", t, infected);

    if let Err(e) = s.check_counts() {
        warn!("Day {}: {}", s.t, e);
    }
}

/**
# 4. Design concepts

## 4.1 Stochasticity

All random draws come from a single generator seeded from the parameters, in
a fixed order, so a run can be repeated exactly.

Attributes are drawn from discretized distributions (see `distribution`),
which turn each draw into a single table lookup at the cost of a resolution of
1/4096.

## 4.2 Observation

The model reports the counts of people in each state at the end of every day
as one CSV row. The asymptomatic count is left out by default, as the
asymptomatic course is switched off by default.

 */
pub mod observation {
    use crate::*;
    use std::io::Write;

    #[derive(Debug, Clone, Default)]
    pub struct ObservationSettings {
        /// File to write the report to, standard output if `None`.
        pub output: Option<String>,
        pub report_asymptomatic: bool,
        /// File to store the state to, at the end and every `store_every` days.
        pub statefile: Option<String>,
        pub store_every: Days,
        /// Log progress, and recount the population every day to check the
        /// counts.
        pub verbose: bool,
    }

    pub fn open_output(path: Option<&str>) -> Result<Box<dyn Write>, SimulationError> {
        match path {
            None => Ok(Box::new(std::io::stdout())),
            Some(path) => match File::create(path) {
                Ok(f) => Ok(Box::new(BufWriter::new(f))),
                Err(e) => Err(SimulationError::Io(std::io::Error::new(
                    e.kind(),
                    format!("could not create output file {}: {}", path, e),
                ))),
            },
        }
    }

    pub struct Report<W: Write> {
        writer: csv::Writer<W>,
        asymptomatic: bool,
    }

    impl<W: Write> Report<W> {
        pub fn new(out: W, asymptomatic: bool) -> Result<Self, SimulationError> {
            let mut writer = csv::Writer::from_writer(out);
            let mut header = vec!["Day", "Susceptible", "Incubating"];
            if asymptomatic {
                header.push("Asymptomatic");
            }
            header.extend_from_slice(&["Carrying", "Ill", "Recovered", "Vaccinated", "Died"]);
            writer.write_record(&header)?;
            Ok(Report {
                writer,
                asymptomatic,
            })
        }

        pub fn record(&mut self, day: Days, c: &Counts) -> Result<(), SimulationError> {
            let mut row = vec![day as usize, c.susceptible, c.incubating];
            if self.asymptomatic {
                row.push(c.asymptomatic);
            }
            row.extend_from_slice(&[c.carrying, c.ill, c.recovered, c.vaccinated, c.died]);
            self.writer
                .write_record(row.iter().map(|n| n.to_string()))?;
            Ok(())
        }

        pub fn finish(mut self) -> Result<W, SimulationError> {
            self.writer.flush()?;
            self.writer
                .into_inner()
                .map_err(|e| SimulationError::Io(e.into_error()))
        }
    }
}

use observation::{ObservationSettings, Report};

/**
# 5. Initialization

Every person starts susceptible, with a spreader grade and an age drawn from
the two attribute tables. Then `starting_cases` people are picked at random
and made incubating. The picks are independent, so the same person may be
picked twice; the counts still assume `starting_cases` distinct cases.

 */
pub fn initialization(
    p: Parameters,
    grades: SpreaderGrades,
    ages: AgeTable,
    interventions: Interventions,
) -> Result<State, SimulationError> {
    p.validate()?;
    grades.check()?;
    interventions.check(&grades)?;

    let mut rng = StdRng::seed_from_u64(p.seed);
    let grade_distributor = grades.distributor()?;
    let age_distributor = ages.distributor()?;

    let mut population = Population::new(p.population_size, p.wrap, || {
        let grade = grade_distributor.sample(&mut rng);
        let age = age_distributor.sample(&mut rng);
        Person::new(grade, age)
    })?;
    info!(
        "Population of {} on a {}x{} grid",
        population.len(),
        population.width,
        population.height
    );
    if p.starting_cases > population.len() {
        return Err(SimulationError::config(format!(
            "{} starting cases do not fit into a population of {}",
            p.starting_cases,
            population.len()
        )));
    }

    for _ in 0..p.starting_cases {
        let i = submodels::pick(&mut rng, population.len());
        population.people[i].enter(HealthState::Incubating);
    }
    let counts = Counts {
        susceptible: population.len() - p.starting_cases,
        incubating: p.starting_cases,
        ..Counts::default()
    };

    Ok(State {
        p,
        grades,
        ages,
        interventions,
        population,
        counts,
        previous: counts,
        stable_days: 0,
        t: 0,
        rng,
    })
}

/**
# 6. Input Data

The spreader grade table, the age table and the intervention schedule can be
read from CSV files (see `csvtable`). Without files, the built-in tables are
used and there are no interventions.

 */
pub fn setup(o: &cli::Options) -> Result<State, SimulationError> {
    let mut p = o.parameters.clone();
    p.seed = match o.seed {
        Some(seed) => seed,
        None => {
            let seed = random();
            info!("Using random seed {}", seed);
            seed
        }
    };
    let grades = match &o.tables.spreaders {
        Some(path) => SpreaderGrades::from_file(path)?,
        None => SpreaderGrades::default(),
    };
    let ages = match &o.tables.ages {
        Some(path) => AgeTable::from_file(path)?,
        None => AgeTable::default(),
    };
    let interventions = match &o.tables.interventions {
        Some(path) => Interventions::from_file(path, o.tables.interventions_zero_repeat)?,
        None => Interventions::default(),
    };
    initialization(p, grades, ages, interventions)
}

/**
# 7. Submodels

*/
pub mod submodels {
    use rand::Rng;

    /// A uniformly random index below `n`.
    pub fn pick<R: Rng + ?Sized>(rng: &mut R, n: usize) -> usize {
        ((rng.gen::<f64>() * n as f64) as usize).min(n - 1)
    }

    /**
    ## 7.1 Infection

    An infectious person with personal reproduction number R, over an
    infectious period of D days, makes a series of attempts every day. The
    first attempt succeeds with probability R/D, and every further attempt
    with a probability lower by 1/D², until that probability would be
    negative. A successful attempt picks a cell at random in the square of
    the person's contact radius around them. If that cell holds a
    susceptible person, they are infected and start incubating. Picking the
    person's own cell is a wasted attempt.

    */
    pub mod infection {
        use crate::*;

        pub fn infect<R: Rng + ?Sized>(
            index: usize,
            population: &mut Population,
            counts: &mut Counts,
            grades: &SpreaderGrades,
            infectious_days: Days,
            rng: &mut R,
        ) -> usize {
            let grade = grades.get(population.people[index].spreader_grade);
            let radius = grade.radius;
            let days = infectious_days as f64;
            let mut infected = 0;

            let mut remaining = grade.r;
            while remaining / days >= 0. {
                if rng.gen::<f64>() < remaining / days {
                    let dx = (rng.gen::<f64>() * 2. * radius - radius) as i64;
                    let dy = (rng.gen::<f64>() * 2. * radius - radius) as i64;
                    if dx != 0 || dy != 0 {
                        let target = population.neighbour(index, dx, dy);
                        let person = &mut population.people[target];
                        if person.state == HealthState::Susceptible {
                            person.enter(HealthState::Incubating);
                            counts.transition(HealthState::Susceptible, HealthState::Incubating);
                            infected += 1;
                        }
                    }
                }
                remaining -= 1. / days;
            }
            infected
        }
    }

    /**
    ## 7.2 Course of disease

    Incubating people become infectious after `incubation_days`. They then
    carry the disease without symptoms for `carrying_days` and are ill for
    `ill_days`, after which they die with the mortality of their age band or
    recover. A share `asymptomatic_probability` of incubations instead ends in
    an asymptomatic infection of `asymptomatic_days`, followed by recovery.
    Recovered and vaccinated people stay immune.

    A person leaves a state on the day its counter exceeds the state's length,
    so they spend one day more in it than the length says.

    */
    pub mod progression {
        use crate::submodels::infection::infect;
        use crate::*;

        /// Advance person `index` by one day. Returns the number of people
        /// they infected.
        pub fn advance<R: Rng + ?Sized>(
            index: usize,
            population: &mut Population,
            counts: &mut Counts,
            grades: &SpreaderGrades,
            ages: &AgeTable,
            p: &Parameters,
            rng: &mut R,
        ) -> usize {
            let state = population.people[index].state;
            match state {
                HealthState::Susceptible | HealthState::Died => 0,
                HealthState::Recovered | HealthState::Vaccinated | HealthState::Nobody => {
                    // Immunity does not wane
                    population.people[index].age_one_day();
                    0
                }
                HealthState::Incubating => {
                    let person = &mut population.people[index];
                    person.age_one_day();
                    if person.days_in_state as Days > p.incubation_days {
                        // Only draw when needed, so that the default course
                        // does not use up random numbers.
                        let next = if p.asymptomatic_probability > 0.
                            && rng.gen::<f64>() < p.asymptomatic_probability
                        {
                            HealthState::Asymptomatic
                        } else {
                            HealthState::Carrying
                        };
                        person.enter(next);
                        counts.transition(state, next);
                    }
                    0
                }
                HealthState::Carrying | HealthState::Ill | HealthState::Asymptomatic => {
                    population.people[index].age_one_day();
                    let infected = infect(index, population, counts, grades, p.infectious_days, rng);

                    let person = &mut population.people[index];
                    let days = person.days_in_state as Days;
                    let next = match state {
                        HealthState::Carrying if days > p.carrying_days => Some(HealthState::Ill),
                        HealthState::Ill if days > p.ill_days => {
                            if rng.gen::<f64>() < ages.mortality(person.age) {
                                Some(HealthState::Died)
                            } else {
                                Some(HealthState::Recovered)
                            }
                        }
                        HealthState::Asymptomatic if days > p.asymptomatic_days => {
                            Some(HealthState::Recovered)
                        }
                        _ => None,
                    };
                    if let Some(next) = next {
                        person.enter(next);
                        counts.transition(state, next);
                    }
                    infected
                }
            }
        }
    }

    /**
    ## 7.3 Interventions

    An intervention is applied on the first day after its scheduled day. It
    vaccinates up to the given number of people picked at random: picks that
    hit someone who is not susceptible are wasted, not repeated. It then sets
    the R and contact radius of the first spreader grades to the given values.

    */
    pub mod interventions {
        use crate::*;

        pub fn vaccinate<R: Rng + ?Sized>(
            population: &mut Population,
            counts: &mut Counts,
            n: usize,
            rng: &mut R,
        ) -> usize {
            let size = population.len();
            let mut vaccinated = 0;
            for _ in 0..n {
                let person = &mut population.people[super::pick(rng, size)];
                if person.state == HealthState::Susceptible {
                    person.enter(HealthState::Vaccinated);
                    counts.transition(HealthState::Susceptible, HealthState::Vaccinated);
                    vaccinated += 1;
                }
            }
            vaccinated
        }

        /// Apply the next intervention if it is due on `day`. Returns the
        /// number of people vaccinated, or `None` if nothing was due.
        pub fn apply_due<R: Rng + ?Sized>(
            interventions: &mut Interventions,
            grades: &mut SpreaderGrades,
            population: &mut Population,
            counts: &mut Counts,
            day: Days,
            rng: &mut R,
        ) -> Option<usize> {
            let intervention = interventions.due(day)?;
            let vaccinated = vaccinate(population, counts, intervention.vaccinations, rng);
            for (grade, &(r, radius)) in grades.grades.iter_mut().zip(intervention.grades.iter()) {
                debug!(
                    "Grade {}: R {} -> {}, radius {} -> {}",
                    grade.grade, grade.r, r, grade.radius, radius
                );
                grade.r = r;
                grade.radius = radius;
            }
            interventions.next += 1;
            Some(vaccinated)
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// All requested days were simulated.
    Completed,
    /// The counts stood still for longer than an infectious period, on the
    /// given day.
    Equilibrium(Days),
}

pub fn store_state<P: AsRef<Path>>(state: &State, statefile: P) -> Result<(), SimulationError> {
    let file = File::create(statefile.as_ref()).map_err(|e| {
        SimulationError::Io(std::io::Error::new(
            e.kind(),
            format!(
                "could not create state file {}: {}",
                statefile.as_ref().display(),
                e
            ),
        ))
    })?;
    serde_json::to_writer(BufWriter::new(file), state)?;
    Ok(())
}

/// Read a stored state. The random number generator is not part of the
/// stored state; it is seeded again from the seed and the day.
pub fn load_state<P: AsRef<Path>>(statefile: P) -> Result<State, SimulationError> {
    let file = File::open(statefile.as_ref()).map_err(|e| {
        SimulationError::config(format!(
            "could not read state file {}: {}",
            statefile.as_ref().display(),
            e
        ))
    })?;
    let mut state: State = serde_json::from_reader(BufReader::new(file))?;
    state.p.validate()?;
    state.grades.check()?;
    state.interventions.check(&state.grades)?;
    if state.population.len() != state.population.width * state.population.height {
        return Err(SimulationError::config(
            "stored population does not fill its grid",
        ));
    }
    if let Some(i) = state
        .population
        .people
        .iter()
        .position(|person| person.spreader_grade as usize >= state.grades.len())
    {
        return Err(SimulationError::config(format!(
            "stored person {} has an unknown spreader grade",
            i
        )));
    }
    if let Err(e) = state.check_counts() {
        warn!("Stored state on day {}: {}", state.t, e);
    }
    state.ages.reindex();
    state.rng = StdRng::seed_from_u64(state.p.seed.wrapping_add(state.t as u64));
    Ok(state)
}

/// Simulate days up to and including `max_t`, reporting every day, unless the
/// epidemic comes to a standstill first.
pub fn run<W: std::io::Write>(
    s: &mut State,
    max_t: Days,
    report: &mut Report<W>,
    o: &ObservationSettings,
) -> Result<Outcome, SimulationError> {
    let mut outcome = Outcome::Completed;
    while s.t <= max_t {
        step(s);
        report.record(s.t, &s.counts)?;

        if o.verbose {
            debug!("Day {}: {:?}", s.t, s.counts);
            let census = s.population.census();
            if census != s.counts {
                debug!("Day {}: recounted {:?}", s.t, census);
            }
        }

        let settled = s.settle();
        s.t += 1;
        if let Some(statefile) = &o.statefile {
            if o.store_every > 0 && s.t % o.store_every == 0 {
                store_state(s, statefile)?;
            }
        }
        if settled {
            outcome = Outcome::Equilibrium(s.t - 1);
            info!("Equilibrium reached on day {}", s.t - 1);
            break;
        }
    }
    if let Some(statefile) = &o.statefile {
        store_state(s, statefile)?;
    }
    info!("Ended after day {}", s.t.saturating_sub(1));
    Ok(outcome)
}
