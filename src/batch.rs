//! Solving every formula in a directory and checking the answers.

use crate::error::Error;
use crate::formula::dimacs::{parse_file, ParsePolicy};
use crate::solver::{Solver, SolverConfig};
use crate::SatResult;
use log::{info, warn};
use std::convert::TryFrom;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Copy, Default, Debug)]
pub struct BatchConfig {
    pub solver: SolverConfig,
    /// Also decides whether an unreadable file aborts the batch or is skipped.
    pub policy: ParsePolicy,
}

/// One row of a run report.
#[derive(Clone, Debug)]
pub struct RunRecord {
    pub file: String,
    pub num_variables: usize,
    pub num_clauses: usize,
    pub result: SatResult,
    pub branches: u64,
    pub elapsed: Duration,
    pub solutions: usize,
    /// Every returned solution satisfies every clause.
    pub verified: bool,
}

impl RunRecord {
    /// The exhaustive bound 2^n on search nodes, if it fits in a `u128`.
    pub fn worst_case(&self) -> Option<u128> {
        u32::try_from(self.num_variables)
            .ok()
            .and_then(|shift| 1u128.checked_shl(shift))
    }
}

/// Solves `path` and verifies every solution against the formula.
pub fn run_file(path: &Path, config: &BatchConfig) -> Result<RunRecord, Error> {
    let formula = parse_file(path, config.policy)?;
    let outcome = Solver::with_config(&formula, config.solver).solve();

    let verified = outcome
        .solutions
        .iter()
        .all(|model| formula.verify(model).is_empty());
    if !verified {
        warn!("{}: a returned solution violates the formula", path.display());
    }

    let file = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(RunRecord {
        file,
        num_variables: formula.num_variables(),
        num_clauses: formula.num_clauses(),
        result: outcome.result(),
        branches: outcome.branches,
        elapsed: outcome.elapsed,
        solutions: outcome.solutions.len(),
        verified,
    })
}

/// Solves every `.cnf` file in `dir`, in file-name order.
///
/// Under [`ParsePolicy::Lenient`] a file that fails to load is logged and skipped; under
/// [`ParsePolicy::Strict`] it ends the batch.
pub fn run_directory(dir: &Path, config: &BatchConfig) -> Result<Vec<RunRecord>, Error> {
    let entries = fs::read_dir(dir).map_err(|source| Error::InputUnavailable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths: Vec<PathBuf> = vec![];
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "cnf") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut records = vec![];
    for (i, path) in paths.iter().enumerate() {
        match run_file(path, config) {
            Ok(record) => {
                info!(
                    "[{}/{}] {}: {:?} after {} branches in {:?}",
                    i + 1,
                    paths.len(),
                    record.file,
                    record.result,
                    record.branches,
                    record.elapsed
                );
                records.push(record);
            }
            Err(e) if config.policy == ParsePolicy::Lenient => {
                warn!("skipping {}: {}", path.display(), e);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(records)
}
