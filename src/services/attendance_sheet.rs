use std::collections::HashSet;
use std::io;
use std::path::Path;

use thiserror::Error;

use crate::schemas::roster::Roster;
use crate::services::atomic_file::write_atomically;

pub(crate) const NAME_COLUMN: &str = "Name";
pub(crate) const ROLL_NUMBER_COLUMN: &str = "Roll Number";
pub(crate) const PRESENT: &str = "Present";
pub(crate) const ABSENT: &str = "Absent";

#[derive(Debug, Error)]
pub(crate) enum SheetError {
    #[error("attendance file is missing the '{0}' column")]
    MissingColumn(&'static str),
    #[error("attendance file lists roll number {0} more than once")]
    DuplicateRollNumber(String),
    #[error("attendance file has more than one '{0}' column")]
    DuplicateColumn(String),
    #[error("failed to read attendance file: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to access attendance file: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttendanceRow {
    name: String,
    roll_number: String,
    /// One value per entry in `AttendanceSheet::dates`.
    marks: Vec<String>,
}

/// Wide attendance table: one row per roll number, one column per date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttendanceSheet {
    dates: Vec<String>,
    rows: Vec<AttendanceRow>,
}

impl AttendanceSheet {
    /// A fresh sheet with every roster student and no dates yet.
    pub(crate) fn seed(roster: &Roster) -> Self {
        let rows = roster
            .entries()
            .iter()
            .map(|entry| AttendanceRow {
                name: entry.name.clone(),
                roll_number: entry.roll_number.clone(),
                marks: Vec::new(),
            })
            .collect();

        Self { dates: Vec::new(), rows }
    }

    /// Loads `path` when it exists, otherwise seeds from the roster.
    pub(crate) fn load_or_seed(path: &Path, roster: &Roster) -> Result<Self, SheetError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Creating an attendance file");
            return Ok(Self::seed(roster));
        }

        tracing::info!(path = %path.display(), "Loading the existing attendance file");
        let file = std::fs::File::open(path)?;
        let mut sheet = Self::read_from(file)?;
        sheet.add_missing_students(roster);
        Ok(sheet)
    }

    pub(crate) fn read_from<R: io::Read>(reader: R) -> Result<Self, SheetError> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers()?.clone();

        let name_idx = position(&headers, NAME_COLUMN)?;
        let roll_idx = position(&headers, ROLL_NUMBER_COLUMN)?;
        for column in [NAME_COLUMN, ROLL_NUMBER_COLUMN] {
            if headers.iter().filter(|header| *header == column).count() > 1 {
                return Err(SheetError::DuplicateColumn(column.to_string()));
            }
        }

        let date_indices: Vec<usize> =
            (0..headers.len()).filter(|idx| *idx != name_idx && *idx != roll_idx).collect();

        let mut seen_dates = HashSet::new();
        let mut dates = Vec::with_capacity(date_indices.len());
        for idx in &date_indices {
            let date = headers.get(*idx).unwrap_or_default().to_string();
            if !seen_dates.insert(date.clone()) {
                return Err(SheetError::DuplicateColumn(date));
            }
            dates.push(date);
        }

        let mut seen_rolls = HashSet::new();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let roll_number = record.get(roll_idx).unwrap_or_default().to_string();
            if !seen_rolls.insert(roll_number.clone()) {
                return Err(SheetError::DuplicateRollNumber(roll_number));
            }

            rows.push(AttendanceRow {
                name: record.get(name_idx).unwrap_or_default().to_string(),
                roll_number,
                marks: date_indices
                    .iter()
                    .map(|idx| record.get(*idx).unwrap_or_default().to_string())
                    .collect(),
            });
        }

        Ok(Self { dates, rows })
    }

    /// Appends roster students whose roll number has no row yet. Their cells
    /// for earlier dates stay empty.
    pub(crate) fn add_missing_students(&mut self, roster: &Roster) -> usize {
        let known: HashSet<String> = self.rows.iter().map(|row| row.roll_number.clone()).collect();
        let mut added = 0;

        for entry in roster.entries() {
            if known.contains(&entry.roll_number) {
                continue;
            }
            self.rows.push(AttendanceRow {
                name: entry.name.clone(),
                roll_number: entry.roll_number.clone(),
                marks: vec![String::new(); self.dates.len()],
            });
            added += 1;
        }

        if added > 0 {
            tracing::info!(added, "Added roster students missing from the attendance file");
        }
        added
    }

    /// Adds `date` with everyone absent. An existing column keeps its marks,
    /// but blank cells in it become absent.
    pub(crate) fn ensure_date_column(&mut self, date: &str) -> bool {
        if let Some(column) = self.dates.iter().position(|existing| existing == date) {
            for row in &mut self.rows {
                if row.marks[column].trim().is_empty() {
                    row.marks[column] = ABSENT.to_string();
                }
            }
            return false;
        }

        self.dates.push(date.to_string());
        for row in &mut self.rows {
            row.marks.push(ABSENT.to_string());
        }
        true
    }

    /// Marks the student present on `date`. Returns false when either the
    /// roll number or the date column is unknown.
    pub(crate) fn mark_present(&mut self, roll_number: &str, date: &str) -> bool {
        let Some(column) = self.dates.iter().position(|existing| existing == date) else {
            return false;
        };

        match self.rows.iter_mut().find(|row| row.roll_number == roll_number) {
            Some(row) => {
                row.marks[column] = PRESENT.to_string();
                true
            }
            None => false,
        }
    }

    pub(crate) fn status(&self, roll_number: &str, date: &str) -> Option<&str> {
        let column = self.dates.iter().position(|existing| existing == date)?;
        self.rows
            .iter()
            .find(|row| row.roll_number == roll_number)
            .and_then(|row| row.marks.get(column))
            .map(String::as_str)
    }

    pub(crate) fn dates(&self) -> &[String] {
        &self.dates
    }

    pub(crate) fn len(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn write_to<W: io::Write>(&self, writer: W) -> Result<(), SheetError> {
        let mut writer = csv::Writer::from_writer(writer);

        let mut header = vec![NAME_COLUMN, ROLL_NUMBER_COLUMN];
        header.extend(self.dates.iter().map(String::as_str));
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.name.as_str(), row.roll_number.as_str()];
            record.extend(row.marks.iter().map(String::as_str));
            writer.write_record(&record)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Rewrites the whole file through a temporary file and rename.
    pub(crate) fn save(&self, path: &Path) -> anyhow::Result<()> {
        write_atomically(path, |file| {
            self.write_to(file)?;
            Ok(())
        })
    }

    /// Fixed-width rendering for the console.
    pub(crate) fn render_table(&self) -> String {
        let mut header = vec![NAME_COLUMN.to_string(), ROLL_NUMBER_COLUMN.to_string()];
        header.extend(self.dates.iter().cloned());

        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.name.clone(), row.roll_number.clone()];
                cells.extend(row.marks.iter().cloned());
                cells
            })
            .collect();

        let widths: Vec<usize> = (0..header.len())
            .map(|idx| {
                body.iter()
                    .filter_map(|cells| cells.get(idx))
                    .chain(std::iter::once(&header[idx]))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        std::iter::once(&header)
            .chain(body.iter())
            .map(|cells| {
                cells
                    .iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{cell:<width$}", width = *width))
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn position(headers: &csv::StringRecord, column: &'static str) -> Result<usize, SheetError> {
    headers.iter().position(|header| header == column).ok_or(SheetError::MissingColumn(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::roster::RosterEntry;

    fn roster(entries: &[(&str, &str)]) -> Roster {
        Roster::from_entries(
            entries
                .iter()
                .map(|(name, roll)| RosterEntry {
                    name: name.to_string(),
                    roll_number: roll.to_string(),
                })
                .collect(),
        )
        .unwrap()
    }

    fn to_csv(sheet: &AttendanceSheet) -> String {
        let mut buffer = Vec::new();
        sheet.write_to(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn seeded_sheet_marks_present_and_defaults_absent() {
        let roster = roster(&[("John Doe", "101"), ("Jane Smith", "102")]);
        let mut sheet = AttendanceSheet::seed(&roster);

        assert!(sheet.ensure_date_column("2024-01-01"));
        assert!(sheet.mark_present("102", "2024-01-01"));

        assert_eq!(sheet.status("102", "2024-01-01"), Some(PRESENT));
        assert_eq!(sheet.status("101", "2024-01-01"), Some(ABSENT));
        assert_eq!(
            to_csv(&sheet),
            "Name,Roll Number,2024-01-01\nJohn Doe,101,Absent\nJane Smith,102,Present\n"
        );
    }

    #[test]
    fn new_date_preserves_previous_columns() {
        let existing = "Name,Roll Number,2024-01-01\nJohn Doe,101,Present\nJane Smith,102,Absent\n";
        let mut sheet = AttendanceSheet::read_from(existing.as_bytes()).unwrap();

        assert!(sheet.ensure_date_column("2024-01-02"));
        sheet.mark_present("102", "2024-01-02");

        assert_eq!(sheet.dates(), &["2024-01-01".to_string(), "2024-01-02".to_string()]);
        assert_eq!(
            to_csv(&sheet),
            "Name,Roll Number,2024-01-01,2024-01-02\n\
             John Doe,101,Present,Absent\n\
             Jane Smith,102,Absent,Present\n"
        );
    }

    #[test]
    fn existing_date_column_keeps_marks() {
        let existing = "Name,Roll Number,2024-01-01\nJohn Doe,101,Present\n";
        let mut sheet = AttendanceSheet::read_from(existing.as_bytes()).unwrap();

        assert!(!sheet.ensure_date_column("2024-01-01"));
        assert_eq!(sheet.status("101", "2024-01-01"), Some(PRESENT));
        assert_eq!(sheet.dates().len(), 1);
    }

    #[test]
    fn same_day_rerun_marks_new_students_absent() {
        let existing = "Name,Roll Number,2023-12-31,2024-01-01\nJohn Doe,101,Absent,Present\n";
        let mut sheet = AttendanceSheet::read_from(existing.as_bytes()).unwrap();
        sheet.add_missing_students(&roster(&[("John Doe", "101"), ("Ada Byron", "106")]));

        assert!(!sheet.ensure_date_column("2024-01-01"));

        assert_eq!(sheet.status("101", "2024-01-01"), Some(PRESENT));
        assert_eq!(sheet.status("106", "2024-01-01"), Some(ABSENT));
        assert_eq!(sheet.status("106", "2023-12-31"), Some(""));
        assert_eq!(
            to_csv(&sheet),
            "Name,Roll Number,2023-12-31,2024-01-01\n\
             John Doe,101,Absent,Present\n\
             Ada Byron,106,,Absent\n"
        );
    }

    #[test]
    fn mark_present_rejects_unknown_roll_or_date() {
        let mut sheet = AttendanceSheet::seed(&Roster::builtin());
        assert!(!sheet.mark_present("101", "2024-01-01"));
        sheet.ensure_date_column("2024-01-01");
        assert!(!sheet.mark_present("999", "2024-01-01"));
    }

    #[test]
    fn columns_are_located_by_name() {
        let existing = "2024-01-01,Roll Number,Name\nPresent,101,John Doe\n";
        let sheet = AttendanceSheet::read_from(existing.as_bytes()).unwrap();

        assert_eq!(sheet.status("101", "2024-01-01"), Some(PRESENT));
        assert_eq!(to_csv(&sheet), "Name,Roll Number,2024-01-01\nJohn Doe,101,Present\n");
    }

    #[test]
    fn missing_roll_column_is_an_error() {
        let err = AttendanceSheet::read_from("Name,2024-01-01\nJohn,Present\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, SheetError::MissingColumn(ROLL_NUMBER_COLUMN)));
    }

    #[test]
    fn duplicate_roll_numbers_are_an_error() {
        let existing = "Name,Roll Number\nJohn Doe,101\nJohnny Doe,101\n";
        let err = AttendanceSheet::read_from(existing.as_bytes()).unwrap_err();
        assert!(matches!(err, SheetError::DuplicateRollNumber(ref roll) if roll == "101"));
    }

    #[test]
    fn duplicate_date_columns_are_an_error() {
        let existing = "Name,Roll Number,2024-01-01,2024-01-01\nJohn Doe,101,Present,Absent\n";
        let err = AttendanceSheet::read_from(existing.as_bytes()).unwrap_err();
        assert!(matches!(err, SheetError::DuplicateColumn(_)));
    }

    #[test]
    fn repeated_identity_columns_are_an_error() {
        let err = AttendanceSheet::read_from("Name,Roll Number,Name\nJohn,101,Jo\n".as_bytes())
            .unwrap_err();
        assert!(matches!(err, SheetError::DuplicateColumn(ref column) if column == NAME_COLUMN));

        let existing = "Name,Roll Number,Roll Number\nJohn,101,101\n";
        let err = AttendanceSheet::read_from(existing.as_bytes()).unwrap_err();
        assert!(
            matches!(err, SheetError::DuplicateColumn(ref column) if column == ROLL_NUMBER_COLUMN)
        );
    }

    #[test]
    fn roster_additions_get_blank_history() {
        let existing = "Name,Roll Number,2024-01-01\nJohn Doe,101,Present\n";
        let mut sheet = AttendanceSheet::read_from(existing.as_bytes()).unwrap();

        let roster = roster(&[("John Doe", "101"), ("Ada Byron", "106")]);
        let added = sheet.add_missing_students(&roster);

        assert_eq!(added, 1);
        assert_eq!(sheet.len(), 2);
        assert_eq!(sheet.status("106", "2024-01-01"), Some(""));
    }

    #[test]
    fn load_or_seed_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attendance.csv");
        let roster = Roster::builtin();

        let mut sheet = AttendanceSheet::load_or_seed(&path, &roster).unwrap();
        assert_eq!(sheet.len(), 5);
        sheet.ensure_date_column("2024-01-01");
        sheet.mark_present("103", "2024-01-01");
        sheet.save(&path).unwrap();

        let reloaded = AttendanceSheet::load_or_seed(&path, &roster).unwrap();
        assert_eq!(reloaded, sheet);
    }

    #[test]
    fn render_table_aligns_columns() {
        let mut sheet = AttendanceSheet::seed(&roster(&[("Al", "1"), ("Beatrice", "22")]));
        sheet.ensure_date_column("2024-01-01");

        let rendered = sheet.render_table();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Name      Roll Number  2024-01-01");
        assert_eq!(lines[1], "Al        1            Absent");
        assert_eq!(lines[2], "Beatrice  22           Absent");
    }
}
