use super::table::{Column, RowWidthMismatch, Table};
use super::traits::DataFile;
use crate::core::units::{Unit, UnitRegistry, parse_fortran_float};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, warn};

static NAME_WITH_UNIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^(]*)\(([^)]*)\)").expect("static pattern"));

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Output file has no column header")]
    MissingHeader,
    #[error("Row has {found} values but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
    #[error("Invalid output pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl From<RowWidthMismatch> for OutputError {
    fn from(e: RowWidthMismatch) -> Self {
        OutputError::RowWidth {
            expected: e.expected,
            found: e.found,
        }
    }
}

/// How an output file should be treated, looked up by its file stem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    /// Kept as raw text.
    Opaque,
    Table,
}

/// An ordered list of anchored file-stem patterns. The first match wins.
#[derive(Debug, Clone, Default)]
pub struct OutputParsers {
    rules: Vec<(Regex, OutputKind)>,
}

impl OutputParsers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, pattern: &str, kind: OutputKind) -> Result<(), OutputError> {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
            OutputError::Pattern {
                pattern: pattern.to_string(),
                source,
            }
        })?;
        self.rules.push((regex, kind));
        Ok(())
    }

    pub fn with(mut self, pattern: &str, kind: OutputKind) -> Result<Self, OutputError> {
        self.register(pattern, kind)?;
        Ok(self)
    }

    pub fn classify(&self, stem: &str) -> Option<OutputKind> {
        self.rules
            .iter()
            .find(|(regex, _)| regex.is_match(stem))
            .map(|(_, kind)| *kind)
    }
}

/// Reads the column-oriented text tables written by the scattering programs.
///
/// The file opens with a block of comment lines starting with ` #` (a ` #---`
/// rule ends it). The header is taken from the last one or two comment lines:
/// when the line before the last is blank, the last line alone holds the
/// labels, separated by runs of two or more spaces; otherwise the two lines are
/// column-aligned halves of the labels and are joined column by column. Labels
/// follow `name(unit)`; repeated names become `name[0]`, `name[1]` and so on.
/// Data rows whose width differs from the header, or that do not parse as
/// numbers, are dropped.
pub struct TableFile<'a> {
    units: &'a UnitRegistry,
}

impl<'a> TableFile<'a> {
    pub fn new(units: &'a UnitRegistry) -> Self {
        Self { units }
    }

    fn split_label(&self, label: &str) -> (String, Unit) {
        let Some(captures) = NAME_WITH_UNIT.captures(label) else {
            return (label.trim().to_string(), Unit::dimensionless());
        };
        let name = captures[1].trim().to_string();
        let unit_text = captures[2].trim();
        if unit_text.is_empty() {
            return (name, Unit::dimensionless());
        }
        match self.units.parse_unit(unit_text) {
            Ok(unit) => (name, unit),
            Err(e) => {
                warn!(
                    column = %name,
                    unit = unit_text,
                    error = %e,
                    "Unrecognized unit in header, treating column as dimensionless"
                );
                (name, Unit::dimensionless())
            }
        }
    }
}

fn is_comment(line: &str) -> bool {
    line.starts_with(" #") && !line.starts_with(" #---")
}

/// Labels of column-aligned two-line headers, joined column by column.
pub fn join_double_header(first: &str, second: &str) -> Vec<String> {
    let width = first.chars().count().max(second.chars().count()) + 1;
    let pad = |line: &str| -> Vec<char> {
        let mut chars: Vec<char> = line.chars().collect();
        chars.resize(width, ' ');
        chars
    };
    let (top, bottom) = (pad(first), pad(second));
    let blank = |i: usize| top[i] == ' ' && bottom[i] == ' ';

    let mut labels = Vec::new();
    let mut end = 0;
    while let Some(start) = (end..width).find(|&i| !blank(i)) {
        end = (start..width).find(|&i| blank(i)).unwrap_or(width);
        let upper: String = top[start..end].iter().collect();
        let lower: String = bottom[start..end].iter().collect();
        let parts: Vec<&str> = [upper.trim(), lower.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        labels.push(parts.join(" "));
    }
    labels
}

/// The raw column labels found at the end of a comment block.
pub fn header_labels(comments: &[String]) -> Option<Vec<String>> {
    let last = comments.last()?;
    let single_line = comments.len() < 2 || comments[comments.len() - 2].trim().is_empty();
    let labels = if single_line {
        last.split("  ")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    } else {
        join_double_header(&comments[comments.len() - 2], last)
    };
    Some(labels)
}

/// Suffixes `[i]` to names that occur more than once.
pub fn disambiguate(names: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in &names {
        *counts.entry(name.clone()).or_default() += 1;
    }
    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .into_iter()
        .map(|name| {
            if counts[&name] > 1 {
                let index = seen.entry(name.clone()).or_default();
                let augmented = format!("{}[{}]", name, index);
                *index += 1;
                augmented
            } else {
                name
            }
        })
        .collect()
}

fn parse_row(line: &str) -> Option<Vec<f64>> {
    let values: Option<Vec<f64>> = line.split_whitespace().map(parse_fortran_float).collect();
    values.filter(|row| !row.is_empty())
}

impl DataFile for TableFile<'_> {
    type Data = Table;
    type Error = OutputError;

    fn read_from(&self, reader: &mut impl BufRead) -> Result<Table, OutputError> {
        let mut lines = reader.lines();
        let mut comments = Vec::new();
        let mut pending = None;
        for line in lines.by_ref() {
            let line = line?;
            if is_comment(&line) {
                comments.push(line[2..].to_string());
            } else {
                pending = Some(line);
                break;
            }
        }

        let labels = header_labels(&comments).ok_or(OutputError::MissingHeader)?;
        if labels.is_empty() {
            return Err(OutputError::MissingHeader);
        }
        let (names, units): (Vec<String>, Vec<Unit>) =
            labels.iter().map(|label| self.split_label(label)).unzip();
        let columns = disambiguate(names)
            .into_iter()
            .zip(units)
            .map(|(name, unit)| Column::new(name, unit))
            .collect();
        let mut table = Table::new(columns, comments);

        let mut skipped = 0usize;
        for line in pending.into_iter().map(Ok).chain(lines) {
            let line = line?;
            match parse_row(&line) {
                Some(row) if row.len() == table.width() => table.push_row(&row)?,
                Some(_) => skipped += 1,
                None => {}
            }
        }
        debug!(rows = table.len(), columns = table.width(), skipped, "Parsed output table");
        Ok(table)
    }

    fn write_to(&self, table: &Table, writer: &mut impl Write) -> Result<(), OutputError> {
        write!(writer, "{}", table)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DCS_SAMPLE: &str = " #  Elastic scattering of electrons by Au atoms\n\
 #  Differential cross section\n\
 #\n\
 #  Theta      DCS        DCS\n\
 #  (deg)      (cm**2/sr) (a0**2/sr)\n\
 #--------------------------------------\n\
   0.000E+00  1.500E-16  5.357E+00\n\
   1.000E+01  2.500E-17  8.928E-01\n\
   garbage line\n\
   2.000E+01  3.000E-18\n";

    #[test]
    fn two_line_headers_are_joined_by_column() {
        let labels = join_double_header("  Theta      DCS", "  (deg)      (cm**2/sr)");
        assert_eq!(labels, vec!["Theta (deg)", "DCS (cm**2/sr)"]);
    }

    #[test]
    fn single_line_header_after_blank_line_splits_on_double_spaces() {
        let comments = vec![
            "  title".to_string(),
            "   ".to_string(),
            "  Energy(eV)  TCS(cm**2)  TCS 1(cm**2)".to_string(),
        ];
        let labels = header_labels(&comments).unwrap();
        assert_eq!(labels, vec!["Energy(eV)", "TCS(cm**2)", "TCS 1(cm**2)"]);
    }

    #[test]
    fn duplicate_names_are_numbered() {
        let names = disambiguate(vec!["E".into(), "DCS".into(), "DCS".into(), "X".into()]);
        assert_eq!(names, vec!["E", "DCS[0]", "DCS[1]", "X"]);
    }

    #[test]
    fn reads_table_with_units_and_drops_bad_rows() {
        let units = UnitRegistry::new();
        let table = TableFile::new(&units).read_from_str(DCS_SAMPLE).unwrap();
        assert_eq!(
            table.column_names().collect::<Vec<_>>(),
            vec!["Theta", "DCS[0]", "DCS[1]"]
        );
        assert_eq!(table.unit("DCS[0]").unwrap().symbol(), "cm**2/sr");
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("Theta"), Some(&[0.0, 10.0][..]));
        assert_eq!(table.comments().len(), 5);
    }

    #[test]
    fn unknown_units_fall_back_to_dimensionless() {
        let units = UnitRegistry::new();
        let text = " #\n #  E(furlongs)  N\n 1.0 2.0\n";
        let table = TableFile::new(&units).read_from_str(text).unwrap();
        assert!(table.unit("E").unwrap().is_dimensionless());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_header_is_an_error() {
        let units = UnitRegistry::new();
        assert!(matches!(
            TableFile::new(&units).read_from_str(" 1.0 2.0\n"),
            Err(OutputError::MissingHeader)
        ));
    }

    #[test]
    fn registry_matches_whole_stems_in_order() {
        let parsers = OutputParsers::new()
            .with("dpwa", OutputKind::Opaque)
            .unwrap()
            .with("dcs_.*", OutputKind::Table)
            .unwrap();
        assert_eq!(parsers.classify("dcs_1p000e03"), Some(OutputKind::Table));
        assert_eq!(parsers.classify("dpwa"), Some(OutputKind::Opaque));
        assert_eq!(parsers.classify("xdpwa"), None);
        assert_eq!(parsers.classify("dpwa2"), None);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(matches!(
            OutputParsers::new().register("dcs_(", OutputKind::Table),
            Err(OutputError::Pattern { .. })
        ));
    }
}
