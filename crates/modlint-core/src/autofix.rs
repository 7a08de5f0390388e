//! Correction application
//!
//! Corrections address the original buffer by line and character column.
//! They are converted to byte offsets up front, conflicting ones are dropped,
//! and the rest are spliced in from the end of the buffer backwards so that
//! earlier offsets stay valid.

use std::cmp::Reverse;
use std::fs;
use std::ops::Range;
use std::path::Path;

use tracing::{debug, warn};

use crate::diagnostics::Correction;
use crate::error::ModlintError;
use crate::position::byte_offset_of;
use crate::result::Result;

/// Result of applying a batch of corrections to one buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub output: String,
    pub applied: usize,
    /// Corrections dropped because an earlier one touched the same text
    pub skipped: Vec<Correction>,
}

impl FixOutcome {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Apply `corrections` to `source`.
///
/// The first correction (in input order) wins when two overlap. A correction
/// pointing outside the buffer fails the whole batch, since it means the
/// corrections were computed for different text.
pub fn apply_corrections(source: &str, corrections: &[Correction]) -> Result<FixOutcome> {
    let mut accepted: Vec<(Range<usize>, &Correction)> = Vec::new();
    let mut skipped = Vec::new();

    for correction in corrections {
        if !correction.is_well_formed() {
            return Err(ModlintError::autofix_error(format!(
                "correction {}:{}-{}:{} ends before it starts",
                correction.start_line,
                correction.start_column,
                correction.end_line,
                correction.end_column
            )));
        }
        let start = resolve(source, correction.start_line, correction.start_column)?;
        let end = resolve(source, correction.end_line, correction.end_column)?;
        let range = start..end;

        if accepted.iter().any(|(other, _)| overlaps(other, &range)) {
            debug!(
                line = correction.start_line,
                column = correction.start_column,
                "skipping overlapping correction"
            );
            skipped.push(correction.clone());
            continue;
        }
        accepted.push((range, correction));
    }

    // Highest offsets first; at equal starts the wider edit goes first so an
    // insertion at the same point lands before it
    accepted.sort_by_key(|(range, _)| Reverse((range.start, range.end)));

    let mut output = source.to_string();
    for (range, correction) in &accepted {
        output.replace_range(range.clone(), &correction.replacement);
    }

    Ok(FixOutcome {
        output,
        applied: accepted.len(),
        skipped,
    })
}

/// Apply corrections to a file on disk; nothing is written on a dry run
pub fn fix_file(path: &Path, corrections: &[Correction], dry_run: bool) -> Result<FixOutcome> {
    let source = fs::read_to_string(path).map_err(|e| ModlintError::io_error(path, e))?;
    let outcome = apply_corrections(&source, corrections)?;

    if !outcome.skipped.is_empty() {
        warn!(
            file = %path.display(),
            skipped = outcome.skipped.len(),
            "some corrections overlapped and were not applied"
        );
    }
    if !dry_run && outcome.changed() {
        fs::write(path, &outcome.output).map_err(|e| ModlintError::io_error(path, e))?;
    }
    Ok(outcome)
}

fn resolve(source: &str, line: usize, column: usize) -> Result<usize> {
    byte_offset_of(source, line, column).ok_or_else(|| {
        ModlintError::autofix_error(format!("position {line}:{column} is outside the text"))
    })
}

/// Insertions only conflict with each other at the same point, or with a
/// replacement strictly around them
fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => a.start == b.start,
        (true, false) => b.start < a.start && a.start < b.end,
        (false, true) => a.start < b.start && b.start < a.end,
        (false, false) => a.start < b.end && b.start < a.end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::TextSpan;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_insert_semicolon() {
        let source = "[ItemType]\nname = Test Item\ndamage = 10;";
        let fix = Correction::insert("mod.txt", 2, 16, ";");
        let outcome = apply_corrections(source, &[fix]).unwrap();
        assert_eq!(outcome.output, "[ItemType]\nname = Test Item;\ndamage = 10;");
        assert_eq!(outcome.applied, 1);
    }

    #[test]
    fn test_no_corrections_is_identity() {
        let source = "[Action] ID=a;\n";
        let outcome = apply_corrections(source, &[]).unwrap();
        assert_eq!(outcome.output, source);
        assert!(!outcome.changed());
    }

    #[test]
    fn test_columns_are_characters() {
        let source = "name=é; colr=x;";
        let fix = Correction::replace("f", TextSpan::new(1, 8, 1, 12), "color");
        let outcome = apply_corrections(source, &[fix]).unwrap();
        assert_eq!(outcome.output, "name=é; color=x;");
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let source = "a=1\nb=2\n";
        let first = Correction::insert("f", 1, 3, ";");
        let second = Correction::insert("f", 2, 3, ";");
        let forward = apply_corrections(source, &[first.clone(), second.clone()]).unwrap();
        let backward = apply_corrections(source, &[second, first]).unwrap();
        assert_eq!(forward.output, "a=1;\nb=2;\n");
        assert_eq!(forward.output, backward.output);
    }

    #[test]
    fn test_overlapping_corrections_first_wins() {
        let source = "[Acton]";
        let first = Correction::replace("f", TextSpan::new(1, 1, 1, 6), "Action");
        let second = Correction::replace("f", TextSpan::new(1, 3, 1, 5), "XX");
        let outcome = apply_corrections(source, &[first, second.clone()]).unwrap();
        assert_eq!(outcome.output, "[Action]");
        assert_eq!(outcome.skipped, vec![second]);
    }

    #[test]
    fn test_insertion_next_to_replacement() {
        let source = "abc";
        let replace = Correction::replace("f", TextSpan::new(1, 0, 1, 2), "XY");
        let insert = Correction::insert("f", 1, 0, ">");
        let outcome = apply_corrections(source, &[replace, insert]).unwrap();
        assert_eq!(outcome.output, ">XYc");
        assert_eq!(outcome.applied, 2);
    }

    #[test]
    fn test_out_of_range_is_an_error() {
        let err = apply_corrections("abc", &[Correction::insert("f", 3, 0, ";")]).unwrap_err();
        assert!(matches!(err, ModlintError::AutofixError { .. }));
        assert!(apply_corrections("abc", &[Correction::insert("f", 1, 9, ";")]).is_err());
    }

    #[test]
    fn test_fix_file_respects_dry_run() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "a=1").unwrap();
        let fix = Correction::insert("f", 1, 3, ";");

        let outcome = fix_file(file.path(), std::slice::from_ref(&fix), true).unwrap();
        assert_eq!(outcome.output, "a=1;\n");
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "a=1\n");

        fix_file(file.path(), &[fix], false).unwrap();
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "a=1;\n");
    }
}
