use ::argparse;
use epidemic::logging::init_logging;
use epidemic::observation::{open_output, ObservationSettings, Report};
use epidemic::*;
use log::info;

fn resume(
    statefile: &str,
    end: Days,
    o: &ObservationSettings,
) -> Result<(), SimulationError> {
    let mut state = load_state(statefile)?;
    info!("Resuming from day {}: {:?}", state.t, state);

    let out = open_output(o.output.as_deref())?;
    let mut report = Report::new(out, o.report_asymptomatic)?;
    run(&mut state, end, &mut report, o)?;
    report.finish()?;
    Ok(())
}

fn main() {
    let mut o = ObservationSettings {
        statefile: Some("resumed.json".to_string()),
        ..ObservationSettings::default()
    };

    let mut statefile = "state.json".to_string();
    let mut end: Days = 365;
    {
        let mut parser = argparse::ArgumentParser::new();
        parser.set_description("Resume an epidemic simulation from a stored state");
        parser.refer(&mut statefile).add_option(
            &["--resume-from"],
            argparse::Store,
            "File to read initial state from",
        );
        parser.refer(&mut end).add_option(
            &["-c", "--cycles"],
            argparse::Store,
            "last day to simulate (counted from the start of the original run)",
        );
        parser.refer(&mut o.output).add_option(
            &["-o", "--output"],
            argparse::StoreOption,
            "file to write the daily counts to (default: standard output)",
        );
        parser.refer(&mut o.statefile).add_option(
            &["--statefile"],
            argparse::StoreOption,
            "File to write state to",
        );
        parser.refer(&mut o.store_every).add_option(
            &["--store-every"],
            argparse::Store,
            "period of state saving, in days",
        );
        parser.refer(&mut o.report_asymptomatic).add_option(
            &["--report-asymptomatic"],
            argparse::StoreTrue,
            "include the asymptomatic count in the output",
        );
        parser.refer(&mut o.verbose).add_option(
            &["-v", "--verbose"],
            argparse::StoreTrue,
            "log progress to standard error",
        );
        parser.parse_args_or_exit();
    }

    if let Err(e) = init_logging(o.verbose) {
        eprintln!("{}", e);
    }

    if let Err(e) = resume(&statefile, end, &o) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
