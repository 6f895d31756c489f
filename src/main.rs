use epidemic::cli::{parse_args, Options};
use epidemic::logging::init_logging;
use epidemic::observation::{open_output, Report};
use epidemic::{run, setup, Outcome, SimulationError};
use log::info;

fn simulate(o: &Options) -> Result<(), SimulationError> {
    let mut s = setup(o)?;
    info!("Initialized: {:?}", s);

    let out = open_output(o.observation.output.as_deref())?;
    let mut report = Report::new(out, o.observation.report_asymptomatic)?;
    match run(&mut s, o.cycles, &mut report, &o.observation)? {
        Outcome::Completed => info!("Simulated {} days", o.cycles),
        Outcome::Equilibrium(day) => info!("Stopped at equilibrium on day {}", day),
    }
    report.finish()?;
    Ok(())
}

fn main() {
    let mut o = Options::default();
    {
        let parser = parse_args(&mut o);
        parser.parse_args_or_exit();
    }

    if let Err(e) = init_logging(o.observation.verbose) {
        eprintln!("{}", e);
    }

    if let Err(e) = simulate(&o) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
