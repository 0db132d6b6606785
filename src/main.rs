use bbsat::batch::{run_directory, BatchConfig};
use bbsat::report::write_table;
use bbsat::*;
use clap::{App, Arg, ArgMatches};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let matches = App::new("bbsat")
        .about("Branch-and-bound SAT solver for DIMACS CNF formulas")
        .arg(
            Arg::with_name("INPUT")
                .help("input file or directory of .cnf files (stdin if absent)")
                .index(1),
        )
        .arg(
            Arg::with_name("mode")
                .long("mode")
                .short("m")
                .takes_value(true)
                .possible_values(&["first", "all"])
                .default_value("first")
                .help("stop at the first solution, or enumerate all minimal ones"),
        )
        .arg(
            Arg::with_name("heuristic")
                .long("heuristic")
                .takes_value(true)
                .possible_values(&["urgency", "plain"])
                .default_value("urgency")
                .help("clause classification strategy"),
        )
        .arg(
            Arg::with_name("lenient")
                .long("lenient")
                .help("skip malformed lines and unreadable files instead of failing"),
        )
        .arg(
            Arg::with_name("report")
                .long("report")
                .short("r")
                .takes_value(true)
                .value_name("FILE")
                .help("where to write the batch report (stdout if absent)"),
        )
        .arg(
            Arg::with_name("models")
                .long("models")
                .help("print every solution, not just the first"),
        )
        .get_matches();

    let config = match batch_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(-1);
        }
    };

    let exit_code = match matches.value_of("INPUT") {
        Some(path) if Path::new(path).is_dir() => run_batch(Path::new(path), &config, matches.value_of("report")),
        Some(path) => run_single(parse_file(Path::new(path), config.policy), &config, matches.is_present("models")),
        None => run_single(parse(io::stdin(), config.policy), &config, matches.is_present("models")),
    };
    std::process::exit(exit_code);
}

fn batch_config(matches: &ArgMatches) -> Result<BatchConfig, String> {
    let solver = SolverConfig {
        mode: matches.value_of("mode").unwrap_or("first").parse()?,
        heuristic: matches.value_of("heuristic").unwrap_or("urgency").parse()?,
        record_decisions: false,
    };
    let policy = if matches.is_present("lenient") {
        ParsePolicy::Lenient
    } else {
        ParsePolicy::Strict
    };
    Ok(BatchConfig { solver, policy })
}

fn run_single(formula: Result<Formula, Error>, config: &BatchConfig, all_models: bool) -> i32 {
    let formula = match formula {
        Ok(f) => f,
        Err(e) => {
            eprintln!("parse error: {}", e);
            return -1;
        }
    };

    let outcome = Solver::with_config(&formula, config.solver).solve();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if let Err(e) = write_outcome(&mut out, &formula, &outcome, all_models) {
        eprintln!("write error: {}", e);
        return -1;
    }

    match outcome.result() {
        SatResult::Satisfiable => 0,
        SatResult::Unsatisfiable => 1,
    }
}

fn write_outcome<W: Write>(out: &mut W, formula: &Formula, outcome: &Outcome, all_models: bool) -> io::Result<()> {
    writeln!(
        out,
        "c {} variables, {} clauses, {} branches (worst case 2^{}), {:?}",
        formula.num_variables(),
        formula.num_clauses(),
        outcome.branches,
        formula.num_variables(),
        outcome.elapsed
    )?;
    match outcome.result() {
        SatResult::Satisfiable => writeln!(out, "s SATISFIABLE")?,
        SatResult::Unsatisfiable => writeln!(out, "s UNSATISFIABLE")?,
    }

    let shown = if all_models { outcome.solutions.len() } else { 1 };
    for model in outcome.solutions.iter().take(shown) {
        let literals: Vec<String> = formula
            .assignment(model)
            .iter()
            .map(|l| l.to_dimacs().to_string())
            .collect();
        writeln!(out, "v {} 0", literals.join(" "))?;
    }
    out.flush()
}

fn run_batch(dir: &Path, config: &BatchConfig, report: Option<&str>) -> i32 {
    let records = match run_directory(dir, config) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("batch error: {}", e);
            return -1;
        }
    };

    let stdout = io::stdout();
    let written = match report {
        Some(path) => File::create(path).and_then(|file| write_table(BufWriter::new(file), &records)),
        None => write_table(stdout.lock(), &records),
    };
    if let Err(e) = written {
        eprintln!("cannot write report: {}", e);
        return -1;
    }

    if records.iter().all(|r| r.verified) {
        0
    } else {
        1
    }
}
