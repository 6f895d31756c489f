use crate::observation::ObservationSettings;
use crate::util::parse_count;
use crate::{Days, Parameters, Wrap};
use argparse::action::Action::Single;
use argparse::action::ParseResult;
use argparse::action::ParseResult::{Error, Parsed};
use argparse::action::TypedAction;
use argparse::action::{Action, IArgAction};
use argparse::{ArgumentParser, Store, StoreConst, StoreOption, StoreTrue};
use std::cell::RefCell;
use std::rc::Rc;

pub struct StoreCountAction<'a> {
    pub cell: Rc<RefCell<&'a mut usize>>,
    pub suffixes: &'static str,
}

impl<'a> IArgAction for StoreCountAction<'a> {
    fn parse_arg(&self, arg: &str) -> ParseResult {
        match parse_count(arg, self.suffixes) {
            Ok(x) => {
                **self.cell.borrow_mut() = x;
                Parsed
            }
            Err(e) => Error(e),
        }
    }
}

/// Store a count that may carry one of the given multiplier suffixes.
pub struct StoreCount(pub &'static str);

impl TypedAction<usize> for StoreCount {
    fn bind<'x>(&self, cell: Rc<RefCell<&'x mut usize>>) -> Action<'x> {
        Single(Box::new(StoreCountAction {
            cell,
            suffixes: self.0,
        }))
    }
}

/// Where to read the optional tables from.
#[derive(Debug, Default, Clone)]
pub struct TableFiles {
    pub spreaders: Option<String>,
    pub ages: Option<String>,
    pub interventions: Option<String>,
    pub interventions_zero_repeat: bool,
}

/// Everything the command line can set.
#[derive(Debug, Clone)]
pub struct Options {
    pub parameters: Parameters,
    /// Seed for the random number generator; drawn at random if not given.
    pub seed: Option<u64>,
    pub cycles: Days,
    pub tables: TableFiles,
    pub observation: ObservationSettings,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            parameters: Parameters::default(),
            seed: None,
            cycles: 365,
            tables: TableFiles::default(),
            observation: ObservationSettings::default(),
        }
    }
}

pub fn parse_args(o: &mut Options) -> ArgumentParser {
    let mut parser = ArgumentParser::new();
    parser.set_description(
        "Simulate an epidemic spreading through a population on a grid, and print the \
         number of people in each state for every day.",
    );
    parser.refer(&mut o.cycles).add_option(
        &["-c", "--cycles"],
        Store,
        "number of days to simulate after day 0",
    );
    parser.refer(&mut o.parameters.population_size).add_option(
        &["-p", "--population"],
        StoreCount("kmg"),
        "population size; accepts k, M and G suffixes",
    );
    parser.refer(&mut o.parameters.starting_cases).add_option(
        &["-s", "--starting-cases"],
        StoreCount("km"),
        "number of initial cases; accepts k and M suffixes",
    );
    parser.refer(&mut o.parameters.reproduction_rate).add_option(
        &["-R", "--reproduction"],
        Store,
        "overall reproduction rate (the spreader grades set the actual R)",
    );
    parser.refer(&mut o.parameters.infectious_days).add_option(
        &["-I", "--infectious"],
        Store,
        "length of the infectious period, in days",
    );
    parser.refer(&mut o.parameters.incubation_days).add_option(
        &["--incubation"],
        Store,
        "days from infection to becoming infectious",
    );
    parser.refer(&mut o.parameters.carrying_days).add_option(
        &["--carrying"],
        Store,
        "days of infectiousness before symptoms",
    );
    parser.refer(&mut o.parameters.ill_days).add_option(
        &["--ill"],
        Store,
        "days of illness before recovery or death",
    );
    parser.refer(&mut o.parameters.asymptomatic_days).add_option(
        &["--asymptomatic"],
        Store,
        "days of an asymptomatic infection",
    );
    parser
        .refer(&mut o.parameters.asymptomatic_probability)
        .add_option(
            &["--asymptomatic-probability"],
            Store,
            "probability that an infection runs without symptoms",
        );
    parser.refer(&mut o.parameters.wrap).add_option(
        &["--torus"],
        StoreConst(Wrap::Torus),
        "wrap columns within their row instead of continuing on the next row",
    );
    parser.refer(&mut o.seed).add_option(
        &["--seed"],
        StoreOption,
        "seed for the random number generator",
    );
    parser.refer(&mut o.tables.spreaders).add_option(
        &["-g", "--spreaders"],
        StoreOption,
        "CSV file of spreader grades: grade, proportion, R, radius",
    );
    parser.refer(&mut o.tables.ages).add_option(
        &["-a", "--ages"],
        StoreOption,
        "CSV file of age bands: age, weight, susceptibility, mortality",
    );
    parser.refer(&mut o.tables.interventions).add_option(
        &["-i", "--interventions"],
        StoreOption,
        "CSV file of interventions: day, vaccinations, then R and radius for each grade",
    );
    parser
        .refer(&mut o.tables.interventions_zero_repeat)
        .add_option(
            &["--interventions-zero-repeat"],
            StoreTrue,
            "in the interventions file, 0 repeats the value from the row above",
        );
    parser.refer(&mut o.observation.output).add_option(
        &["-o", "--output"],
        StoreOption,
        "file to write the daily counts to (default: standard output)",
    );
    parser
        .refer(&mut o.observation.report_asymptomatic)
        .add_option(
            &["--report-asymptomatic"],
            StoreTrue,
            "include the asymptomatic count in the output",
        );
    parser.refer(&mut o.observation.statefile).add_option(
        &["--statefile"],
        StoreOption,
        "file to store the simulation state to",
    );
    parser.refer(&mut o.observation.store_every).add_option(
        &["--store-every"],
        Store,
        "period of state saving, in days",
    );
    parser.refer(&mut o.observation.verbose).add_option(
        &["-v", "--verbose"],
        StoreTrue,
        "log progress to standard error",
    );
    parser
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Options, i32> {
        let mut o = Options::default();
        {
            let parser = parse_args(&mut o);
            let mut args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            args.insert(0, "epidemic".to_string());
            parser.parse(args, &mut std::io::sink(), &mut std::io::sink())?;
        }
        Ok(o)
    }

    #[test]
    fn defaults() {
        let o = parse(&[]).unwrap();
        assert_eq!(o.cycles, 365);
        assert_eq!(o.parameters, Parameters::default());
        assert_eq!(o.seed, None);
        assert!(o.observation.output.is_none());
    }

    #[test]
    fn counts_take_suffixes() {
        let o = parse(&["-p", "4M", "--starting-cases", "2k", "-c", "10"]).unwrap();
        assert_eq!(o.parameters.population_size, 4_000_000);
        assert_eq!(o.parameters.starting_cases, 2_000);
        assert_eq!(o.cycles, 10);
        assert!(parse(&["-s", "1g"]).is_err());
        assert!(parse(&["-p", "lots"]).is_err());
    }

    #[test]
    fn files_and_flags() {
        let o = parse(&[
            "-g",
            "grades.csv",
            "--interventions",
            "plan.csv",
            "-o",
            "out.csv",
            "--torus",
            "--seed",
            "42",
            "-v",
        ])
        .unwrap();
        assert_eq!(o.tables.spreaders.as_deref(), Some("grades.csv"));
        assert_eq!(o.tables.interventions.as_deref(), Some("plan.csv"));
        assert_eq!(o.observation.output.as_deref(), Some("out.csv"));
        assert_eq!(o.parameters.wrap, Wrap::Torus);
        assert_eq!(o.seed, Some(42));
        assert!(o.observation.verbose);
    }

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(parse(&["--help"]).err(), Some(0));
    }
}
