//! Roster table ingestion.
//!
//! Reads delimited availability tables:
//!
//! ```text
//! Name,ID number,h0,h1,...     ← header; must contain the id column
//! Ada,S001,0,1,,2,...          ← id followed by days*hours cells
//! ,IMPOSSIBLE,0,0,1,...        ← optional global impossible mask
//! ```
//!
//! `;` and tab delimiters are normalized to `,` before parsing, so a
//! file may mix them. Fields may be double-quoted, as spreadsheet
//! exports do for names containing commas. Columns left of the id column
//! are ignored, blank lines are skipped, and blank cells mean free.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::config::InputSettings;
use crate::error::{Result, SlotterError};
use crate::models::{Availability, AvailabilityGrid, PersonAvailability, RosterTable, WeekGeometry};

/// Parses roster tables for a fixed week geometry.
#[derive(Debug, Clone)]
pub struct RosterReader<'a> {
    week: &'a WeekGeometry,
    id_column: String,
    impossible_id: String,
}

impl<'a> RosterReader<'a> {
    /// Creates a reader with the default column conventions.
    pub fn new(week: &'a WeekGeometry) -> Self {
        Self::with_settings(week, &InputSettings::default())
    }

    /// Creates a reader with explicit column conventions.
    pub fn with_settings(week: &'a WeekGeometry, settings: &InputSettings) -> Self {
        Self {
            week,
            id_column: settings.id_column.clone(),
            impossible_id: settings.impossible_id.clone(),
        }
    }

    /// Reads and parses a roster file.
    pub fn read_file(&self, path: impl AsRef<Path>) -> Result<RosterTable> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let table = self.parse(&content, &path.display().to_string())?;
        info!(
            path = %path.display(),
            people = table.len(),
            impossible = table.impossible.is_some(),
            "roster loaded"
        );
        Ok(table)
    }

    /// Parses roster text. `source_name` labels errors.
    pub fn parse(&self, content: &str, source_name: &str) -> Result<RosterTable> {
        let normalized = content.replace([';', '\t'], ",");
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(normalized.as_bytes());
        let mut rows = reader
            .records()
            .filter(|r| !matches!(r, Ok(record) if record.iter().all(str::is_empty)));

        let header = rows
            .next()
            .ok_or_else(|| SlotterError::input_format(source_name, "file is empty"))?
            .map_err(|e| csv_error(source_name, e))?;
        let id_index = header
            .iter()
            .position(|h| h == self.id_column)
            .ok_or_else(|| {
                SlotterError::input_format(
                    source_name,
                    format!("missing identifier column '{}'", self.id_column),
                )
            })?;
        debug!(source = source_name, id_index, "located identifier column");

        let mut table = RosterTable::default();
        let mut seen = HashSet::new();

        for (line_no, row) in rows.enumerate() {
            let row_label = format!("{source_name} (data row {})", line_no + 1);
            let row = row.map_err(|e| csv_error(&row_label, e))?;

            let id = row
                .get(id_index)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| SlotterError::input_format(&row_label, "missing identifier"))?;

            let cells = row
                .iter()
                .skip(id_index + 1)
                .map(|cell| {
                    Availability::from_cell(cell).ok_or_else(|| {
                        SlotterError::input_format(
                            &row_label,
                            format!("unknown availability value '{cell}' for '{id}'"),
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let grid = AvailabilityGrid::from_cells(self.week, &cells).map_err(|e| match e {
                SlotterError::InputFormat { message, .. } => {
                    SlotterError::input_format(&row_label, format!("'{id}': {message}"))
                }
                other => other,
            })?;

            if id == self.impossible_id {
                if table.impossible.replace(grid).is_some() {
                    return Err(SlotterError::input_format(
                        &row_label,
                        format!("'{id}' appears more than once"),
                    ));
                }
                continue;
            }

            if !seen.insert(id.clone()) {
                return Err(SlotterError::input_format(
                    &row_label,
                    format!("duplicate identifier '{id}'"),
                ));
            }
            table.people.push(PersonAvailability::new(id, grid));
        }

        Ok(table)
    }

    /// Reads a file holding only an impossible mask.
    ///
    /// The mask row may use the reserved identifier or be the single
    /// data row of the file.
    pub fn read_mask_file(&self, path: impl AsRef<Path>) -> Result<AvailabilityGrid> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let mut table = self.parse(&fs::read_to_string(path)?, &name)?;
        match (table.impossible.take(), table.people.len()) {
            (Some(mask), 0) => Ok(mask),
            (None, 1) => Ok(table.people.remove(0).grid),
            _ => Err(SlotterError::input_format(
                name,
                "expected exactly one mask row",
            )),
        }
    }
}

fn csv_error(source_name: &str, e: csv::Error) -> SlotterError {
    SlotterError::input_format(source_name, format!("malformed row: {e}"))
}

/// Renders a roster table back to the input format.
///
/// Hour columns are named `D<day>H<hour>`.
pub fn render_table(
    week: &WeekGeometry,
    people: &[(String, Vec<Availability>)],
    id_column: &str,
) -> String {
    let mut out = String::from(id_column);
    for day in 0..week.days_in_week() {
        for hour in 0..week.hours_in_day() {
            out.push_str(&format!(",D{day}H{hour}"));
        }
    }
    out.push('\n');

    for (id, cells) in people {
        out.push_str(id);
        for cell in cells {
            out.push(',');
            out.push_str(cell.as_cell());
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn tiny_week() -> WeekGeometry {
        WeekGeometry::new(1, 4, 2).unwrap()
    }

    #[test]
    fn test_parse_basic() {
        let week = tiny_week();
        let reader = RosterReader::new(&week);
        let table = reader
            .parse("Name,ID number,a,b,c,d\nAda,S1,0,1,,2\nBob,S2,,,,\n", "test")
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.people[0].id, "S1");
        assert!(!table.people[0].grid.academic_free(0, 1));
        assert!(!table.people[0].grid.part_time_free(0, 3));
        assert!(table.people[0].grid.academic_free(0, 2)); // blank → free
        assert!(table.impossible.is_none());
    }

    #[test]
    fn test_mixed_delimiters() {
        let week = tiny_week();
        let reader = RosterReader::new(&week);
        let table = reader
            .parse("ID number;a;b;c;d\nS1\t0\t0\t1\t0\nS2,0;0\t0,0\n", "test")
            .unwrap();
        assert_eq!(table.len(), 2);
        assert!(!table.people[0].grid.academic_free(0, 2));
    }

    #[test]
    fn test_quoted_header_and_fields() {
        let week = tiny_week();
        let reader = RosterReader::new(&week);
        let table = reader
            .parse(
                "\"Name\",\"ID number\",a,b,c,d\n\"Doe, John\",S1,0,1,0,0\n\"Roe\",\"S2\",\"\",2,,\n",
                "test",
            )
            .unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.people[0].id, "S1");
        assert!(!table.people[0].grid.academic_free(0, 1));
        assert_eq!(table.people[1].id, "S2");
        assert!(table.people[1].grid.academic_free(0, 0)); // "" → free
        assert!(!table.people[1].grid.part_time_free(0, 1));
    }

    #[test]
    fn test_impossible_row_routed_to_mask() {
        let week = tiny_week();
        let reader = RosterReader::new(&week);
        let table = reader
            .parse("ID number,a,b,c,d\nS1,0,0,0,0\nIMPOSSIBLE,1,0,0,0\n", "test")
            .unwrap();
        assert_eq!(table.len(), 1);
        let mask = table.impossible.unwrap();
        assert!(!mask.academic_free(0, 0));
    }

    #[test]
    fn test_custom_settings() {
        let week = tiny_week();
        let settings = InputSettings {
            id_column: "sid".into(),
            impossible_id: "LECTURES".into(),
        };
        let reader = RosterReader::with_settings(&week, &settings);
        let table = reader
            .parse("sid,a,b,c,d\nLECTURES,0,0,0,1\nIMPOSSIBLE,0,0,0,0\n", "test")
            .unwrap();
        // "IMPOSSIBLE" is an ordinary id under these settings
        assert_eq!(table.people[0].id, "IMPOSSIBLE");
        assert!(table.impossible.is_some());
    }

    #[test]
    fn test_empty_file() {
        let week = tiny_week();
        let err = RosterReader::new(&week).parse("  \n\n", "empty.csv").unwrap_err();
        assert!(matches!(err, SlotterError::InputFormat { .. }));
        assert!(err.to_string().contains("empty.csv"));
    }

    #[test]
    fn test_missing_id_column() {
        let week = tiny_week();
        let err = RosterReader::new(&week)
            .parse("Name,a,b,c,d\nAda,0,0,0,0\n", "test")
            .unwrap_err();
        assert!(err.to_string().contains("ID number"));
    }

    #[test]
    fn test_wrong_cell_count() {
        let week = tiny_week();
        let err = RosterReader::new(&week)
            .parse("ID number,a,b,c,d\nS1,0,0,0\n", "test")
            .unwrap_err();
        assert!(err.to_string().contains("expected 4 cells"));
    }

    #[test]
    fn test_unknown_cell() {
        let week = tiny_week();
        let err = RosterReader::new(&week)
            .parse("ID number,a,b,c,d\nS1,0,3,0,0\n", "test")
            .unwrap_err();
        assert!(err.to_string().contains("'3'"));
    }

    #[test]
    fn test_duplicate_id() {
        let week = tiny_week();
        let err = RosterReader::new(&week)
            .parse("ID number,a,b,c,d\nS1,0,0,0,0\nS1,0,0,0,0\n", "test")
            .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn test_read_file_and_mask_file() {
        let week = tiny_week();
        let reader = RosterReader::new(&week);

        let mut roster = tempfile::NamedTempFile::new().unwrap();
        write!(roster, "ID number,a,b,c,d\nS1,0,0,0,0\n").unwrap();
        assert_eq!(reader.read_file(roster.path()).unwrap().len(), 1);

        let mut mask = tempfile::NamedTempFile::new().unwrap();
        write!(mask, "ID number,a,b,c,d\nlectures,0,1,1,0\n").unwrap();
        let grid = reader.read_mask_file(mask.path()).unwrap();
        assert!(!grid.academic_free(0, 1));
    }

    #[test]
    fn test_render_roundtrip() {
        let week = tiny_week();
        let people = vec![(
            "S9".to_string(),
            vec![
                Availability::Free,
                Availability::Busy,
                Availability::Extra,
                Availability::Free,
            ],
        )];
        let text = render_table(&week, &people, "ID number");
        let table = RosterReader::new(&week).parse(&text, "rendered").unwrap();
        assert_eq!(table.people[0].id, "S9");
        assert!(!table.people[0].grid.academic_free(0, 1));
        assert!(!table.people[0].grid.part_time_free(0, 2));
    }
}
