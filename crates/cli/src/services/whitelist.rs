//! Whitelist CSV import.
//!
//! # File format
//!
//! ```text
//! name,team,email
//! Ada Lovelace,Engines,ada@example.com
//! ```
//!
//! The first line is a header and is skipped. Every other non-blank line
//! needs at least three comma-separated fields: column 0 is the name and
//! column 2 the email. Extra columns are ignored.
//!
//! Rows are handled in file order. Each row is checked when it is reached
//! and then inserted, until the first email already on the whitelist: there
//! the import stops, later lines are never read, and the run still counts as
//! a success. A malformed row aborts the import; rows before it stay.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, instrument, warn};

use super::RecordError;
use crate::db::{Store, StoreError};
use crate::models::WhitelistEntry;

/// One validated CSV row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhitelistRow {
    /// 1-based line number in the file.
    pub line: usize,
    pub name: String,
    pub email: String,
}

/// Outcome of an import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub inserted: usize,
    /// Line of the first row whose email was already present, if the import
    /// stopped there.
    pub stopped_at_duplicate: Option<usize>,
}

impl fmt::Display for ImportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Imported {} whitelist entries", self.inserted)?;
        if let Some(line) = self.stopped_at_duplicate {
            write!(f, " (stopped at existing email on line {line})")?;
        }
        Ok(())
    }
}

/// Parse the rows of a whitelist file lazily, in file order.
///
/// The header line and blank lines are skipped. Each item is
/// `RecordError::InvalidFormat` if that row has fewer than three fields or
/// an empty email column.
pub fn parse_whitelist(
    contents: &str,
) -> impl Iterator<Item = Result<WhitelistRow, RecordError>> + '_ {
    contents
        .lines()
        .enumerate()
        .skip(1)
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(idx, text)| parse_row(idx + 1, text))
}

fn parse_row(line: usize, text: &str) -> Result<WhitelistRow, RecordError> {
    let fields: Vec<&str> = text.split(',').collect();
    let [name, _, email, ..] = fields.as_slice() else {
        return Err(RecordError::InvalidFormat {
            line,
            reason: format!("expected at least 3 fields, found {}", fields.len()),
        });
    };

    let email = email.trim();
    if email.is_empty() {
        return Err(RecordError::InvalidFormat {
            line,
            reason: "empty email".to_owned(),
        });
    }

    Ok(WhitelistRow {
        line,
        name: name.trim().to_owned(),
        email: email.to_owned(),
    })
}

/// Whitelist operations over a store.
pub struct WhitelistService<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> WhitelistService<'a, S> {
    /// Create a new whitelist service.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Import the CSV file at `path`.
    ///
    /// # Errors
    ///
    /// - `RecordError::Io` if the file cannot be read
    /// - `RecordError::InvalidFormat` for the first malformed row reached
    /// - `RecordError::Store` if a lookup or insert fails
    ///
    /// Rows inserted before an error stay.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn import(&self, path: &Path) -> Result<ImportSummary, RecordError> {
        let contents = tokio::fs::read_to_string(path).await?;

        let mut summary = ImportSummary::default();
        for row in parse_whitelist(&contents) {
            let row = row?;
            debug!(line = row.line, "importing whitelist row");
            if self.store.find_whitelist_entry(&row.email).await?.is_some() {
                warn!(line = row.line, "email already whitelisted, stopping import");
                summary.stopped_at_duplicate = Some(row.line);
                break;
            }

            let entry = WhitelistEntry::new(row.name, row.email);
            match self.store.insert_whitelist_entry(&entry).await {
                Ok(()) => summary.inserted += 1,
                Err(StoreError::Conflict(_)) => {
                    warn!(line = row.line, "email whitelisted concurrently, stopping import");
                    summary.stopped_at_duplicate = Some(row.line);
                    break;
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(
            inserted = summary.inserted,
            stopped_at_duplicate = ?summary.stopped_at_duplicate,
            "whitelist import finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::db::{MemoryStore, Operation};

    fn csv(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn parse_all(contents: &str) -> Result<Vec<WhitelistRow>, RecordError> {
        parse_whitelist(contents).collect()
    }

    #[test]
    fn test_parse_skips_header_and_blank_lines() {
        let rows = parse_all("name,team,email\n\n Ada , x , ada@example.com \n").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].line, 3);
        assert_eq!(rows[0].name, "Ada");
        assert_eq!(rows[0].email, "ada@example.com");
    }

    #[test]
    fn test_parse_rejects_short_rows() {
        let err = parse_all("h\nAda,ada@example.com\n").unwrap_err();
        assert!(matches!(err, RecordError::InvalidFormat { line: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_empty_email_column() {
        let err = parse_all("h\nAda,x,ada@example.com\nBob,x, \n").unwrap_err();
        assert!(matches!(err, RecordError::InvalidFormat { line: 3, .. }));
    }

    #[test]
    fn test_parse_keeps_email_text_as_given() {
        let rows = parse_all("h\nAda,x,ada\n").unwrap();
        assert_eq!(rows[0].email, "ada");
    }

    #[test]
    fn test_parse_is_lazy() {
        let mut rows = parse_whitelist("h\nAda,x,ada@example.com\nbroken\n");
        assert!(rows.next().unwrap().is_ok());
        assert!(rows.next().unwrap().is_err());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_header_only_file_is_empty() {
        assert!(parse_all("name,team,email\n").unwrap().is_empty());
        assert!(parse_all("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_inserts_every_row() {
        let store = MemoryStore::new();
        let file = csv("name,team,email\nAda,x,ada@example.com\nBob,y,bob@example.com\n");

        let summary = WhitelistService::new(&store).import(file.path()).await.unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                inserted: 2,
                stopped_at_duplicate: None
            }
        );
        let emails: Vec<String> = store
            .whitelist()
            .into_iter()
            .map(|e| e.email)
            .collect();
        assert_eq!(emails, ["ada@example.com", "bob@example.com"]);
    }

    #[tokio::test]
    async fn test_import_stops_at_first_existing_email() {
        let store = MemoryStore::new();
        let file = csv(
            "name,team,email\n\
             Ada,x,ada@example.com\n\
             Ada Again,x,ada@example.com\n\
             Bob,y,bob@example.com\n",
        );

        let summary = WhitelistService::new(&store).import(file.path()).await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.stopped_at_duplicate, Some(3));
        assert_eq!(store.whitelist().len(), 1);
        assert_eq!(store.writes(), vec![Operation::InsertWhitelistEntry]);
    }

    #[tokio::test]
    async fn test_rows_after_duplicate_are_never_parsed() {
        let store = MemoryStore::new();
        let file = csv(
            "h\n\
             Ada,x,ada@example.com\n\
             Ada,x,ada@example.com\n\
             broken\n",
        );

        let summary = WhitelistService::new(&store).import(file.path()).await.unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                inserted: 1,
                stopped_at_duplicate: Some(3)
            }
        );
        assert_eq!(store.whitelist().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_row_keeps_earlier_inserts() {
        let store = MemoryStore::new();
        let file = csv(
            "name,team,email\n\
             Ada,x,ada@example.com\n\
             broken\n\
             Bob,y,bob@example.com\n",
        );

        let err = WhitelistService::new(&store).import(file.path()).await.unwrap_err();

        assert!(matches!(err, RecordError::InvalidFormat { line: 3, .. }));
        let emails: Vec<String> = store.whitelist().into_iter().map(|e| e.email).collect();
        assert_eq!(emails, ["ada@example.com"]);
    }

    #[tokio::test]
    async fn test_email_without_at_sign_is_imported() {
        let store = MemoryStore::new();
        let file = csv("h\nAda,x,ada\n");

        let summary = WhitelistService::new(&store).import(file.path()).await.unwrap();

        assert_eq!(summary.inserted, 1);
        assert_eq!(store.whitelist()[0].email, "ada");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let store = MemoryStore::new();
        let dir = tempfile::tempdir().unwrap();
        let err = WhitelistService::new(&store)
            .import(&dir.path().join("absent.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Io(_)));
    }

    #[test]
    fn test_summary_display() {
        let summary = ImportSummary {
            inserted: 1,
            stopped_at_duplicate: Some(3),
        };
        assert_eq!(
            summary.to_string(),
            "Imported 1 whitelist entries (stopped at existing email on line 3)"
        );
    }
}
