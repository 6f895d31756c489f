use assert_cmd::Command;
use std::fs;

fn epidemic() -> Command {
    Command::cargo_bin("epidemic").unwrap()
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn prints_a_row_per_day() {
    let out = stdout_of(epidemic().args(&["-p", "10k", "-c", "5", "--seed", "1"]));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(
        lines[0],
        "Day,Susceptible,Incubating,Carrying,Ill,Recovered,Vaccinated,Died"
    );
    assert_eq!(lines.len(), 7);
    assert_eq!(lines[1], "0,9999,1,0,0,0,0,0");
}

#[test]
fn seed_makes_runs_repeatable() {
    let args = ["-p", "4096", "-s", "4", "-c", "40", "--seed", "17"];
    assert_eq!(stdout_of(epidemic().args(&args)), stdout_of(epidemic().args(&args)));
}

#[test]
fn help_exits_cleanly() {
    epidemic().arg("--help").assert().success();
}

#[test]
fn zero_infectious_days_fail() {
    epidemic()
        .args(&["-p", "100", "-I", "0"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn tables_are_read_from_files() {
    let dir = tempfile::tempdir().unwrap();
    let grades = dir.path().join("grades.csv");
    fs::write(&grades, "Grade,Proportion,R,Radius\n1,0.5,0,3\n2,0.5,0,5\n").unwrap();
    let ages = dir.path().join("ages.csv");
    fs::write(&ages, "Age,Weight,Susceptibility,Mortality\n0,1,1,0\n50,1,1,0\n").unwrap();
    let output = dir.path().join("out.csv");

    epidemic()
        .args(&["-p", "100", "-c", "30", "--seed", "5"])
        .arg("-g")
        .arg(&grades)
        .arg("--ages")
        .arg(&ages)
        .arg("-o")
        .arg(&output)
        .assert()
        .success()
        .stdout("");

    let out = fs::read_to_string(&output).unwrap();
    // Nobody spreads, so the single case recovers and nothing else happens.
    let last = out.lines().last().unwrap();
    assert_eq!(last.split(',').skip(1).collect::<Vec<_>>(), vec!["99", "0", "0", "0", "1", "0", "0"]);
}

#[test]
fn bad_table_shape_fails() {
    let dir = tempfile::tempdir().unwrap();
    let grades = dir.path().join("grades.csv");
    fs::write(&grades, "1,0.5,1\n2,0.5,2\n").unwrap();
    epidemic()
        .args(&["-p", "100", "-g"])
        .arg(&grades)
        .assert()
        .failure()
        .code(1);
}

#[test]
fn missing_table_fails() {
    epidemic()
        .args(&["-p", "100", "-i", "/nonexistent/interventions.csv"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn unwritable_output_fails() {
    epidemic()
        .args(&["-p", "100", "-c", "1", "-o", "/nonexistent/dir/out.csv"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn resume_continues_a_stored_run() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("state.json");
    let resumed = dir.path().join("resumed.json");

    epidemic()
        .args(&["-p", "2500", "-s", "3", "-c", "9", "--seed", "8"])
        .arg("--statefile")
        .arg(&state)
        .assert()
        .success();

    let out = Command::cargo_bin("resume")
        .unwrap()
        .arg("--resume-from")
        .arg(&state)
        .arg("--statefile")
        .arg(&resumed)
        .args(&["-c", "14"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let out = String::from_utf8(out).unwrap();
    let days: Vec<&str> = out
        .lines()
        .skip(1)
        .map(|l| l.split(',').next().unwrap())
        .collect();
    assert_eq!(days, vec!["10", "11", "12", "13", "14"]);
    assert!(resumed.exists());
}
