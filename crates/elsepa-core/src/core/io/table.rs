use super::format::format_scientific;
use crate::core::units::{Quantity, Unit};
use std::fmt;
use std::io::Write;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub unit: Unit,
}

impl Column {
    pub fn new(name: impl Into<String>, unit: Unit) -> Self {
        Self {
            name: name.into(),
            unit,
        }
    }

    /// `name (unit)`, or the bare name for dimensionless columns.
    pub fn label(&self) -> String {
        if self.unit.symbol().is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.unit.symbol())
        }
    }
}

/// A unit-aware numeric table stored column by column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    data: Vec<Vec<f64>>,
    comments: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowWidthMismatch {
    pub expected: usize,
    pub found: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>, comments: Vec<String>) -> Self {
        let data = vec![Vec::new(); columns.len()];
        Self {
            columns,
            data,
            comments,
        }
    }

    pub fn push_row(&mut self, row: &[f64]) -> Result<(), RowWidthMismatch> {
        if row.len() != self.columns.len() {
            return Err(RowWidthMismatch {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        for (column, value) in self.data.iter_mut().zip(row) {
            column.push(*value);
        }
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// The comment block the header was taken from.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.column_index(name).map(|i| &self.columns[i].unit)
    }

    /// Raw magnitudes of a column, in the column's unit.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_index(name).map(|i| self.data[i].as_slice())
    }

    pub fn column_quantities(&self, name: &str) -> Option<Vec<Quantity>> {
        let index = self.column_index(name)?;
        let unit = &self.columns[index].unit;
        Some(
            self.data[index]
                .iter()
                .map(|&x| Quantity::new(x, unit.clone()))
                .collect(),
        )
    }

    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.len() {
            return None;
        }
        Some(self.data.iter().map(|column| column[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<f64>> + '_ {
        (0..self.len()).map(|i| self.data.iter().map(|column| column[i]).collect())
    }

    pub fn value(&self, row: usize, column: usize) -> Option<Quantity> {
        let x = *self.data.get(column)?.get(row)?;
        Some(Quantity::new(x, self.columns[column].unit.clone()))
    }

    /// A new table holding the columns in `range` (clamped to the table width).
    pub fn select_columns(&self, range: Range<usize>) -> Table {
        let range = clamp(range, self.width());
        Table {
            columns: self.columns[range.clone()].to_vec(),
            data: self.data[range].to_vec(),
            comments: self.comments.clone(),
        }
    }

    /// A new table holding the rows in `range` (clamped to the row count).
    pub fn select_rows(&self, range: Range<usize>) -> Table {
        let range = clamp(range, self.len());
        Table {
            columns: self.columns.clone(),
            data: self
                .data
                .iter()
                .map(|column| column[range.clone()].to_vec())
                .collect(),
            comments: self.comments.clone(),
        }
    }

    /// Writes a header of `name (unit)` labels followed by one record per row.
    pub fn write_csv(&self, writer: impl Write) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(self.columns.iter().map(Column::label))?;
        for row in self.rows() {
            csv_writer.write_record(row.iter().map(|x| x.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self
            .columns
            .iter()
            .map(|c| format!("{} ({})", c.name, c.unit.symbol()))
            .collect();
        writeln!(f, "# {}", header.join(", "))?;
        for row in self.rows() {
            let cells: Vec<String> = row.iter().map(|&x| format_scientific(x, 4)).collect();
            writeln!(f, "{}", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units::Dimensions;

    fn sample() -> Table {
        let deg = Unit::new("deg", Dimensions::NONE, std::f64::consts::PI / 180.0);
        let area = Unit::new("cm**2/sr", Dimensions::AREA, 1e-4);
        let mut table = Table::new(
            vec![Column::new("Theta", deg), Column::new("DCS", area)],
            vec!["Theta (deg)  DCS (cm**2/sr)".into()],
        );
        table.push_row(&[0.0, 1.5e-16]).unwrap();
        table.push_row(&[10.0, 2.5e-17]).unwrap();
        table.push_row(&[20.0, 3.0e-18]).unwrap();
        table
    }

    #[test]
    fn rows_of_wrong_width_are_rejected() {
        let mut table = sample();
        assert_eq!(
            table.push_row(&[1.0]),
            Err(RowWidthMismatch {
                expected: 2,
                found: 1
            })
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn columns_are_available_as_quantities() {
        let table = sample();
        let dcs = table.column_quantities("DCS").unwrap();
        assert_eq!(dcs.len(), 3);
        assert_eq!(dcs[1].unit().symbol(), "cm**2/sr");
        assert_eq!(dcs[1].magnitude(), 2.5e-17);
        assert!(table.column_quantities("missing").is_none());
    }

    #[test]
    fn row_and_cell_access() {
        let table = sample();
        assert_eq!(table.row(1), Some(vec![10.0, 2.5e-17]));
        assert_eq!(table.row(3), None);
        assert_eq!(table.value(2, 0).unwrap().magnitude(), 20.0);
    }

    #[test]
    fn slicing_keeps_units_and_clamps() {
        let table = sample();
        let dcs_only = table.select_columns(1..5);
        assert_eq!(dcs_only.column_names().collect::<Vec<_>>(), vec!["DCS"]);
        assert_eq!(dcs_only.len(), 3);
        let head = table.select_rows(0..2);
        assert_eq!(head.len(), 2);
        assert_eq!(head.width(), 2);
    }

    #[test]
    fn display_uses_header_and_scientific_rows() {
        let text = sample().to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("# Theta (deg), DCS (cm**2/sr)"));
        assert_eq!(lines.next(), Some("0.0000e+00 1.5000e-16"));
    }

    #[test]
    fn csv_export_labels_columns_with_units() {
        let mut buffer = Vec::new();
        sample().write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Theta (deg),DCS (cm**2/sr)"));
        assert_eq!(lines.next(), Some("0,0.00000000000000015"));
    }
}
