use crate::batch::RunRecord;
use crate::SatResult;
use std::io::{self, Write};

const HEADER: [&str; 9] = [
    "file",
    "n",
    "m",
    "sat/unsat",
    "branches",
    "worst case",
    "time (s)",
    "solutions",
    "check",
];

/// Writes `records` as a tab-separated table with a header row.
pub fn write_table<W: Write>(mut out: W, records: &[RunRecord]) -> io::Result<()> {
    writeln!(out, "{}", HEADER.join("\t"))?;
    for record in records {
        let result = match record.result {
            SatResult::Satisfiable => "sat",
            SatResult::Unsatisfiable => "unsat",
        };
        let worst_case = match record.worst_case() {
            Some(bound) => bound.to_string(),
            None => format!("2^{}", record.num_variables),
        };
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}\t{:.6}\t{}\t{}",
            record.file,
            record.num_variables,
            record.num_clauses,
            result,
            record.branches,
            worst_case,
            record.elapsed.as_secs_f64(),
            record.solutions,
            if record.verified { "ok" } else { "FAILED" }
        )?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn record(file: &str, n: usize, result: SatResult) -> RunRecord {
        RunRecord {
            file: file.to_string(),
            num_variables: n,
            num_clauses: 3,
            result,
            branches: 7,
            elapsed: Duration::from_millis(1500),
            solutions: if result == SatResult::Satisfiable { 1 } else { 0 },
            verified: true,
        }
    }

    #[test]
    fn table_layout() {
        let records = vec![
            record("a.cnf", 3, SatResult::Satisfiable),
            record("b.cnf", 200, SatResult::Unsatisfiable),
        ];
        let mut out = vec![];
        write_table(&mut out, &records).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("file\tn\tm"));
        assert_eq!(lines[1], "a.cnf\t3\t3\tsat\t7\t8\t1.500000\t1\tok");
        assert_eq!(lines[2], "b.cnf\t200\t3\tunsat\t7\t2^200\t1.500000\t0\tok");
    }
}
