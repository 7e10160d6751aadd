// 📚 Record Store - Student Records
// Owned, ordered collection of student entries with add/search/sort/delete

use crate::error::{RecordError, RecordResult};
use crate::notice::Notice;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// STUDENT ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "Name")]
    pub name: String,

    /// Registration number - the lookup key by convention, never checked for uniqueness
    #[serde(rename = "Reg_No")]
    pub reg_no: String,

    #[serde(rename = "Grade")]
    pub grade: f64,
}

/// Input collected for Add. Any field may be missing (a cancelled prompt).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentDraft {
    #[serde(rename = "Name")]
    pub name: Option<String>,

    #[serde(rename = "Reg_No")]
    pub reg_no: Option<String>,

    #[serde(rename = "Grade", deserialize_with = "csv::invalid_option", default)]
    pub grade: Option<f64>,
}

impl StudentDraft {
    pub fn new(name: &str, reg_no: &str, grade: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            reg_no: Some(reg_no.to_string()),
            grade: Some(grade),
        }
    }

    /// Check required fields and produce the entry; reports the first missing one
    pub fn validate(self) -> RecordResult<Student> {
        let name = required_text(self.name, "name")?;
        let reg_no = required_text(self.reg_no, "registration number")?;
        let grade = match self.grade {
            Some(g) if g.is_finite() => g,
            _ => return Err(RecordError::Validation { field: "grade" }),
        };

        Ok(Student { name, reg_no, grade })
    }
}

/// Blank means missing, but the value is stored exactly as entered
fn required_text(value: Option<String>, field: &'static str) -> RecordResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RecordError::Validation { field }),
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOutcome {
    Sorted { swaps: usize },
    /// Fewer than two entries; nothing was touched
    NotEnoughRecords,
}

#[derive(Debug, PartialEq)]
pub enum Listing<'a> {
    Empty,
    Rows(&'a [Student]),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: usize,
    pub rejected: usize,
}

// ============================================================================
// RECORD STORE
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct RecordStore {
    students: Vec<Student>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn students(&self) -> &[Student] {
        &self.students
    }

    /// Append a new entry. A missing field fails without touching the collection.
    pub fn add(&mut self, draft: StudentDraft) -> RecordResult<&Student> {
        let student = draft.validate()?;
        debug!(reg_no = %student.reg_no, grade = student.grade, "adding student");

        self.students.push(student);
        Ok(&self.students[self.students.len() - 1])
    }

    /// First entry whose name matches ignoring case, or whose registration matches exactly
    pub fn search(&self, key: &str) -> RecordResult<&Student> {
        if key.is_empty() {
            return Err(RecordError::Validation { field: "search key" });
        }

        let key_lower = key.to_lowercase();
        self.students
            .iter()
            .find(|s| s.name.to_lowercase() == key_lower || s.reg_no == key)
            .ok_or_else(|| RecordError::NotFound(key.to_string()))
    }

    /// Ascending by grade, bubbling adjacent pairs until a pass makes no swap
    pub fn sort_by_grade(&mut self) -> SortOutcome {
        let n = self.students.len();
        if n < 2 {
            return SortOutcome::NotEnoughRecords;
        }

        let mut swaps = 0;
        for pass in 0..n - 1 {
            let mut swapped = false;
            for j in 0..n - pass - 1 {
                if self.students[j].grade > self.students[j + 1].grade {
                    self.students.swap(j, j + 1);
                    swapped = true;
                    swaps += 1;
                }
            }
            if !swapped {
                break;
            }
        }

        debug!(swaps, "sorted students by grade");
        SortOutcome::Sorted { swaps }
    }

    /// Remove the first entry with this registration number
    pub fn delete(&mut self, reg_no: &str) -> RecordResult<Student> {
        let index = self
            .students
            .iter()
            .position(|s| s.reg_no == reg_no)
            .ok_or_else(|| RecordError::NotFound(reg_no.to_string()))?;

        let removed = self.students.remove(index);
        debug!(reg_no = %removed.reg_no, "deleted student");
        Ok(removed)
    }

    pub fn view(&self) -> Listing<'_> {
        if self.students.is_empty() {
            Listing::Empty
        } else {
            Listing::Rows(&self.students)
        }
    }

    // ========================================================================
    // CSV IMPORT / EXPORT
    // ========================================================================

    /// Add every row of a `Name,Reg_No,Grade` CSV file through the same checks as `add`.
    /// Malformed rows are skipped; an I/O failure leaves the store untouched.
    pub fn load_csv(&mut self, path: &Path) -> RecordResult<ImportSummary> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut summary = ImportSummary::default();
        let mut loaded = Vec::new();

        for (i, result) in rdr.deserialize::<StudentDraft>().enumerate() {
            let checked = match result {
                Ok(draft) => draft.validate(),
                Err(err) if err.is_io_error() => return Err(err.into()),
                Err(err) => Err(err.into()),
            };

            match checked {
                Ok(student) => loaded.push(student),
                Err(err) => {
                    warn!(record = i + 1, error = %err, "skipping invalid student row");
                    summary.rejected += 1;
                }
            }
        }

        summary.added = loaded.len();
        self.students.extend(loaded);

        info!(added = summary.added, rejected = summary.rejected, path = ?path, "imported students");
        Ok(summary)
    }

    /// Write the collection in its current order
    pub fn save_csv(&self, path: &Path) -> RecordResult<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        for student in &self.students {
            wtr.serialize(student)?;
        }
        wtr.flush()?;

        info!(count = self.students.len(), path = ?path, "exported students");
        Ok(())
    }
}

// ============================================================================
// NOTICES
// ============================================================================

pub fn added_notice(student: &Student) -> Notice {
    Notice::info("Success", format!("Student '{}' added successfully!", student.name))
}

pub fn found_notice(student: &Student) -> Notice {
    Notice::info(
        "Found",
        format!(
            "Name: {}\nReg No: {}\nGrade: {}",
            student.name, student.reg_no, student.grade
        ),
    )
}

pub fn deleted_notice(student: &Student) -> Notice {
    Notice::info("Deleted", format!("Student '{}' removed successfully!", student.name))
}

pub fn sort_notice(outcome: SortOutcome) -> Notice {
    match outcome {
        SortOutcome::Sorted { .. } => Notice::info("Sorted", "Students sorted by grade successfully!"),
        SortOutcome::NotEnoughRecords => Notice::info("Info", "Not enough records to sort."),
    }
}

pub fn view_notice(listing: &Listing<'_>) -> Option<Notice> {
    match listing {
        Listing::Empty => Some(Notice::info("Info", "No student records found.")),
        Listing::Rows(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(entries: &[(&str, &str, f64)]) -> RecordStore {
        let mut store = RecordStore::new();
        for (name, reg, grade) in entries {
            store.add(StudentDraft::new(name, reg, *grade)).unwrap();
        }
        store
    }

    fn is_ascending(store: &RecordStore) -> bool {
        store.students().windows(2).all(|w| w[0].grade <= w[1].grade)
    }

    #[test]
    fn test_add_then_search_by_registration() {
        let mut store = RecordStore::new();
        let added = store.add(StudentDraft::new("Ada", "R-001", 91.5)).unwrap().clone();

        let found = store.search("R-001").unwrap();
        assert_eq!(found, &added);
        assert_eq!(found.grade, 91.5);
    }

    #[test]
    fn test_add_missing_field_never_mutates() {
        let mut store = store_with(&[("Ada", "R-001", 91.5)]);

        let drafts = vec![
            StudentDraft { name: None, reg_no: Some("R-2".into()), grade: Some(70.0) },
            StudentDraft { name: Some("  ".into()), reg_no: Some("R-2".into()), grade: Some(70.0) },
            StudentDraft { name: Some("Bo".into()), reg_no: None, grade: Some(70.0) },
            StudentDraft { name: Some("Bo".into()), reg_no: Some("R-2".into()), grade: None },
            StudentDraft { name: Some("Bo".into()), reg_no: Some("R-2".into()), grade: Some(f64::NAN) },
        ];

        for draft in drafts {
            let err = store.add(draft).unwrap_err();
            assert!(err.is_validation());
        }
        assert_eq!(store.len(), 1);
        assert_eq!(store.students()[0].name, "Ada");
    }

    #[test]
    fn test_validation_reports_first_missing_field() {
        let err = StudentDraft::default().validate().unwrap_err();
        match err {
            RecordError::Validation { field } => assert_eq!(field, "name"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_search_name_ignores_case_and_returns_first() {
        let store = store_with(&[("Grace", "R-1", 80.0), ("grace", "R-2", 60.0)]);

        let found = store.search("GRACE").unwrap();
        assert_eq!(found.reg_no, "R-1");
    }

    #[test]
    fn test_search_registration_is_exact() {
        let store = store_with(&[("Linus", "ab-7", 75.0)]);

        assert!(store.search("ab-7").is_ok());
        assert!(matches!(store.search("AB-7"), Err(RecordError::NotFound(_))));
        assert!(matches!(store.search(""), Err(RecordError::Validation { .. })));
    }

    #[test]
    fn test_delete_removes_exactly_one_then_not_found() {
        let mut store = store_with(&[("A", "R-1", 50.0), ("B", "R-2", 60.0), ("C", "R-3", 70.0)]);

        let removed = store.delete("R-2").unwrap();
        assert_eq!(removed.name, "B");
        assert_eq!(store.len(), 2);

        assert!(matches!(store.delete("R-2"), Err(RecordError::NotFound(_))));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_delete_duplicate_registration_takes_first() {
        let mut store = store_with(&[("First", "R-1", 50.0), ("Second", "R-1", 60.0)]);

        assert_eq!(store.delete("R-1").unwrap().name, "First");
        assert_eq!(store.delete("R-1").unwrap().name, "Second");
        assert!(store.is_empty());
    }

    #[test]
    fn test_sort_every_permutation_of_four() {
        let grades = [88.0, 42.5, 42.5, 99.0];
        let mut perm = [0usize, 1, 2, 3];

        // Heap's algorithm, iterative
        let mut c = [0usize; 4];
        let check = |perm: &[usize; 4]| {
            let mut store = RecordStore::new();
            for (i, &g) in perm.iter().enumerate() {
                store.add(StudentDraft::new(&format!("S{i}"), &format!("R{i}"), grades[g])).unwrap();
            }
            assert!(matches!(store.sort_by_grade(), SortOutcome::Sorted { .. }));
            assert!(is_ascending(&store), "not sorted: {:?}", store.students());
            assert_eq!(store.len(), 4);
        };
        check(&perm);
        let mut i = 0;
        while i < 4 {
            if c[i] < i {
                if i % 2 == 0 {
                    perm.swap(0, i);
                } else {
                    perm.swap(c[i], i);
                }
                check(&perm);
                c[i] += 1;
                i = 0;
            } else {
                c[i] = 0;
                i += 1;
            }
        }
    }

    #[test]
    fn test_sort_already_sorted_makes_no_swaps() {
        let mut store = store_with(&[("A", "1", 1.0), ("B", "2", 2.0), ("C", "3", 3.0)]);
        assert_eq!(store.sort_by_grade(), SortOutcome::Sorted { swaps: 0 });
    }

    #[test]
    fn test_sort_not_enough_records() {
        let mut empty = RecordStore::new();
        assert_eq!(empty.sort_by_grade(), SortOutcome::NotEnoughRecords);

        let mut single = store_with(&[("Solo", "R-1", 10.0)]);
        assert_eq!(single.sort_by_grade(), SortOutcome::NotEnoughRecords);
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_view_signals_empty() {
        let store = RecordStore::new();
        let listing = store.view();
        assert_eq!(listing, Listing::Empty);
        assert!(view_notice(&listing).is_some());

        let store = store_with(&[("A", "R-1", 1.0)]);
        assert!(matches!(store.view(), Listing::Rows(rows) if rows.len() == 1));
    }

    #[test]
    fn test_notices_carry_messages() {
        let store = store_with(&[("Ada", "R-001", 91.5)]);
        let student = store.search("ada").unwrap();

        assert_eq!(added_notice(student).body, "Student 'Ada' added successfully!");
        assert!(found_notice(student).body.contains("Reg No: R-001"));
        assert_eq!(sort_notice(SortOutcome::NotEnoughRecords).body, "Not enough records to sort.");

        let err = RecordError::NotFound("x".into());
        assert_eq!(Notice::from(&err).title, "Not Found");
    }

    #[test]
    fn test_csv_export_then_import_skips_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("students.csv");

        let store = store_with(&[("Ada", "R-1", 91.5), ("Linus", "R-2", 75.0)]);
        store.save_csv(&path).unwrap();

        let mut contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Name,Reg_No,Grade"));
        contents.push_str(",R-3,60\nGrace,R-4,not-a-number\n");
        std::fs::write(&path, contents).unwrap();

        let mut loaded = RecordStore::new();
        let summary = loaded.load_csv(&path).unwrap();

        assert_eq!(summary, ImportSummary { added: 2, rejected: 2 });
        assert_eq!(loaded.students(), store.students());
    }

    #[test]
    fn test_csv_short_row_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        std::fs::write(&path, "Name,Reg_No,Grade\nAda,R-1,90\nBo,R-2\nCy,R-3,70\n").unwrap();

        let mut store = RecordStore::new();
        let summary = store.load_csv(&path).unwrap();

        assert_eq!(summary, ImportSummary { added: 2, rejected: 1 });
        let regs: Vec<&str> = store.students().iter().map(|s| s.reg_no.as_str()).collect();
        assert_eq!(regs, vec!["R-1", "R-3"]);
    }

    #[test]
    fn test_csv_missing_file_leaves_store_unchanged() {
        let mut store = store_with(&[("Ada", "R-1", 90.0)]);

        let result = store.load_csv(Path::new("/nonexistent/students.csv"));
        assert!(result.is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_add_keeps_values_as_entered() {
        let mut store = RecordStore::new();
        store.add(StudentDraft::new(" Ada ", " R-1 ", 88.0)).unwrap();

        let found = store.search(" R-1 ").unwrap();
        assert_eq!(found.name, " Ada ");
        assert_eq!(found.reg_no, " R-1 ");
        assert!(store.search(" ada ").is_ok());

        assert_eq!(store.delete(" R-1 ").unwrap().name, " Ada ");
        assert!(store.is_empty());
    }
}
