use crate::error::Error;
use crate::formula::{Clause, Formula, Literal};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// What to do when the input disagrees with the format.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ParsePolicy {
    /// Return the first error.
    Strict,
    /// Log a warning, skip the offending line, and reconcile the declared sizes.
    Lenient,
}

impl Default for ParsePolicy {
    fn default() -> Self {
        ParsePolicy::Strict
    }
}

pub fn parse_file(path: &Path, policy: ParsePolicy) -> Result<Formula, Error> {
    let file = File::open(path).map_err(|source| Error::InputUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    parse(file, policy)
}

pub fn parse<R: Read>(reader: R, policy: ParsePolicy) -> Result<Formula, Error> {
    let reader = BufReader::new(reader);

    let mut header: Option<(usize, usize)> = None;
    let mut clauses = vec![];
    let mut pending = vec![];
    let mut max_variable = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('c') || trimmed.starts_with('%') {
            continue;
        }

        if trimmed.starts_with('p') {
            match parse_header(trimmed, line_no) {
                Ok(sizes) => header = Some(sizes),
                Err(e) if policy == ParsePolicy::Lenient => warn!("skipping problem line: {}", e),
                Err(e) => return Err(e),
            }
            continue;
        }

        if header.is_none() && policy == ParsePolicy::Strict {
            return Err(Error::MissingHeader);
        }

        // parse the whole line first so a bad token never leaves half a clause behind
        let literals = match parse_literals(trimmed, line_no) {
            Ok(literals) => literals,
            Err(e) if policy == ParsePolicy::Lenient => {
                warn!("skipping clause line: {}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        // clauses may span lines; zero closes the current one
        for literal in literals {
            match literal {
                Some(l) => {
                    max_variable = max_variable.max(l.idx());
                    pending.push(l);
                }
                None => {
                    if !pending.is_empty() {
                        clauses.push(Clause::new(pending.drain(..)));
                    }
                }
            }
        }
    }

    if !pending.is_empty() {
        clauses.push(Clause::new(pending));
    }

    let (num_variables, num_clauses) = match header {
        Some(sizes) => sizes,
        None if policy == ParsePolicy::Lenient => {
            warn!("no problem line, inferring sizes from the clauses");
            (max_variable, clauses.len())
        }
        None => return Err(Error::MissingHeader),
    };

    let num_variables = reconcile("variable", num_variables, max_variable, policy, |d, f| f > d)?;
    reconcile("clause count", num_clauses, clauses.len(), policy, |d, f| f != d)?;

    Formula::new(num_variables, clauses)
}

fn parse_header(line: &str, line_no: usize) -> Result<(usize, usize), Error> {
    let mut parts = line.split_whitespace();
    let _ = parts.next();

    let malformed = |token: Option<&str>| Error::Malformed {
        line: line_no,
        token: token.unwrap_or("").to_string(),
    };

    let format = parts.next();
    if format != Some("cnf") {
        return Err(malformed(format));
    }

    let mut size = || {
        let token = parts.next();
        token
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or_else(|| malformed(token))
    };
    let num_variables = size()?;
    let num_clauses = size()?;
    Ok((num_variables, num_clauses))
}

fn parse_literals(line: &str, line_no: usize) -> Result<Vec<Option<Literal>>, Error> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<i64>()
                .map(Literal::from_dimacs)
                .map_err(|_| Error::Malformed {
                    line: line_no,
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Checks a declared size against the parsed one, returning the size to use.
fn reconcile(
    what: &'static str,
    declared: usize,
    found: usize,
    policy: ParsePolicy,
    disagrees: impl Fn(usize, usize) -> bool,
) -> Result<usize, Error> {
    if !disagrees(declared, found) {
        return Ok(declared);
    }
    match policy {
        ParsePolicy::Strict => Err(Error::SizeMismatch { what, declared, found }),
        ParsePolicy::Lenient => {
            warn!("{} mismatch: declared {}, found {}", what, declared, found);
            Ok(declared.max(found))
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::formula::{n, p, Variable};
    use crate::{SatResult, Solver};

    use super::*;

    #[test]
    fn parse_cnf_basic() {
        let cnf = "c  simple_v3_c2.cnf
c
p cnf 3 2
1 -3 0
2 3 -1 0";
        let f = parse(cnf.as_bytes(), ParsePolicy::Strict).expect("failed to parse");
        assert_eq!(f.num_variables(), 3);
        assert_eq!(f.clauses().count(), 2);

        assert_eq!(
            f.clauses().nth(0).unwrap().literals().cloned().collect::<Vec<_>>(),
            vec![p(1), n(3)]
        );
        assert_eq!(
            f.clauses().nth(1).unwrap().literals().cloned().collect::<Vec<_>>(),
            vec![p(2), p(3), n(1)]
        );
    }

    #[test]
    fn parse_benchmark_trailer() {
        // SATLIB uniform instances end with a '%' line and a lone zero
        let cnf = "c uf-style
p cnf 3 2
 1 -2 3 0
-1  2 0
%
0

";
        let f = parse(cnf.as_bytes(), ParsePolicy::Strict).expect("failed to parse");
        assert_eq!(f.num_clauses(), 2);
    }

    #[test]
    fn parse_clause_across_lines() {
        let cnf = "p cnf 2 1\n1 2\n-1 -2 0\n";
        let f = parse(cnf.as_bytes(), ParsePolicy::Strict).expect("failed to parse");
        assert_eq!(f.num_clauses(), 1);
        assert_eq!(f.clauses().next().unwrap().len(), 4);
    }

    #[test]
    fn malformed_token_strict() {
        let cnf = "p cnf 2 2\n1 2 0\n1 x 0\n";
        match parse(cnf.as_bytes(), ParsePolicy::Strict) {
            Err(Error::Malformed { line, token }) => {
                assert_eq!(line, 3);
                assert_eq!(token, "x");
            }
            other => panic!("expected malformed input, got {:?}", other),
        }
    }

    #[test]
    fn malformed_token_lenient() {
        let cnf = "p cnf 2 2\n1 2 0\n1 x 0\n-1 0\n";
        let f = parse(cnf.as_bytes(), ParsePolicy::Lenient).expect("lenient parse");
        assert_eq!(f.num_clauses(), 2);
        assert_eq!(f.clauses().nth(1).unwrap().literals().cloned().collect::<Vec<_>>(), vec![n(1)]);
    }

    #[test]
    fn missing_header() {
        let cnf = "1 2 0\n";
        assert!(matches!(parse(cnf.as_bytes(), ParsePolicy::Strict), Err(Error::MissingHeader)));

        let f = parse(cnf.as_bytes(), ParsePolicy::Lenient).expect("lenient parse");
        assert_eq!(f.num_variables(), 2);
        assert_eq!(f.num_clauses(), 1);
    }

    #[test]
    fn bad_problem_line() {
        let cnf = "p dnf 2 1\n1 2 0\n";
        assert!(matches!(
            parse(cnf.as_bytes(), ParsePolicy::Strict),
            Err(Error::Malformed { line: 1, .. })
        ));
    }

    #[test]
    fn size_mismatch() {
        let cnf = "p cnf 2 3\n1 2 0\n-1 3 0\n";
        match parse(cnf.as_bytes(), ParsePolicy::Strict) {
            Err(Error::SizeMismatch { what, declared, found }) => {
                assert_eq!(what, "variable");
                assert_eq!(declared, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected a size mismatch, got {:?}", other),
        }

        let f = parse(cnf.as_bytes(), ParsePolicy::Lenient).expect("lenient parse");
        assert_eq!(f.num_variables(), 3);
        assert_eq!(f.num_clauses(), 2);
        assert_eq!(f.occurrences(Variable(3)).len(), 1);
    }

    #[test]
    fn oversized_header() {
        for header in &[
            "p cnf 18446744073709551615 0\n",
            "p cnf 9223372036854775807 1\n1 0\n",
        ] {
            for &policy in &[ParsePolicy::Strict, ParsePolicy::Lenient] {
                match parse(header.as_bytes(), policy) {
                    Err(Error::SizeMismatch { what, declared, .. }) => {
                        assert_eq!(what, "variable");
                        assert!(declared >= usize::MAX / 2);
                    }
                    other => panic!("expected a size mismatch, got {:?}", other),
                }
            }
        }
    }

    #[test]
    fn unavailable_input() {
        let r = parse_file(Path::new("/nonexistent/input.cnf"), ParsePolicy::Strict);
        assert!(matches!(r, Err(Error::InputUnavailable { .. })));
    }

    #[test]
    fn solve_cnf_quinn() {
        let cnf = "c  quinn.cnf
c
p cnf 16 18
  1    2  0
 -2   -4  0
  3    4  0
 -4   -5  0
  5   -6  0
  6   -7  0
  6    7  0
  7  -16  0
  8   -9  0
 -8  -14  0
  9   10  0
  9  -10  0
-10  -11  0
 10   12  0
 11   12  0
 13   14  0
 14  -15  0
 15   16  0
";

        let f = parse(cnf.as_bytes(), ParsePolicy::Strict).expect("failed to parse");

        let outcome = Solver::new(&f).solve();
        assert_eq!(outcome.result(), SatResult::Satisfiable);
        assert!(f.verify(&outcome.solutions[0]).is_empty());
    }
}
