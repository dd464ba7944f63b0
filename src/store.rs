use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use tempfile::NamedTempFile;

use crate::entry::Entry;
use crate::error::{LedgerError, RecordError};
use crate::record::{COLUMNS, HEADER, LedgerRecord};

/// The narrow interface the presentation layer talks to.
pub trait Ledger {
    /// Appends every entry or none of them, returning how many rows were written.
    fn append(&self, entries: &[Entry]) -> Result<usize, LedgerError>;

    /// Every entry in file order.
    fn read_all(&self) -> Result<Vec<Entry>, LedgerError>;
}

/// CSV file backed ledger.
///
/// The file and its directory are created by the application bootstrap
/// (see [`crate::config::AppPaths::ensure_store`]), never by the store.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        LedgerStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    fn ensure_available(&self) -> Result<(), LedgerError> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(LedgerError::StoreUnavailable(self.path.clone()))
        }
    }

    /// The file rows actually land in, with symlinks followed.
    #[inline]
    fn write_target(&self) -> Result<PathBuf, LedgerError> {
        let target = fs::canonicalize(&self.path).map_err(LedgerError::WriteFailed)?;

        // A rename only needs a writable directory, so check the file itself.
        let readonly = fs::metadata(&target)
            .map_err(LedgerError::WriteFailed)?
            .permissions()
            .readonly();
        if readonly || OpenOptions::new().append(true).open(&target).is_err() {
            return Err(LedgerError::WriteFailed(io::Error::from(
                ErrorKind::PermissionDenied,
            )));
        }
        Ok(target)
    }

    #[inline]
    fn staging_dir(target: &Path) -> &Path {
        match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn encode_rows(entries: &[Entry], with_header: bool) -> io::Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        if with_header {
            writer.write_record(HEADER)?;
        }
        for entry in entries {
            writer.serialize(LedgerRecord::from(entry))?;
        }

        writer.into_inner().map_err(|e| e.into_error())
    }

    #[inline]
    fn commit(target: &Path, content: &[u8]) -> Result<(), LedgerError> {
        Self::commit_with(target, content, |file, bytes| file.write_all(bytes))
    }

    /// Stages `content` next to `target` and renames it into place, so a
    /// failure at any step leaves the previous file untouched.
    fn commit_with<F>(target: &Path, content: &[u8], write: F) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut File, &[u8]) -> io::Result<()>,
    {
        let permissions = fs::metadata(target)
            .map_err(LedgerError::WriteFailed)?
            .permissions();

        let mut staged =
            NamedTempFile::new_in(Self::staging_dir(target)).map_err(LedgerError::WriteFailed)?;
        write(staged.as_file_mut(), content).map_err(LedgerError::WriteFailed)?;

        let file = staged.as_file();
        file.sync_all().map_err(LedgerError::WriteFailed)?;
        file.set_permissions(permissions)
            .map_err(LedgerError::WriteFailed)?;

        staged
            .persist(target)
            .map_err(|e| LedgerError::WriteFailed(e.error))?;
        Ok(())
    }

    #[inline]
    fn parse_row(row: usize, record: &StringRecord) -> Result<Entry, RecordError> {
        if record.len() != COLUMNS {
            return Err(RecordError::ColumnCount {
                expected: COLUMNS,
                found: record.len(),
            });
        }

        let raw: LedgerRecord = record
            .deserialize(None)
            .map_err(|e| RecordError::Csv(e.to_string()))?;
        let entry = Entry::try_from(raw)?;

        tracing::trace!(row, name = %entry.name, "parsed ledger row");
        Ok(entry)
    }

    fn read_failed(error: csv::Error) -> LedgerError {
        match error.into_kind() {
            csv::ErrorKind::Io(error) => LedgerError::ReadFailed(error),
            kind => LedgerError::ReadFailed(io::Error::other(format!("{:?}", kind))),
        }
    }
}

impl Ledger for LedgerStore {
    fn append(&self, entries: &[Entry]) -> Result<usize, LedgerError> {
        self.ensure_available()?;

        if entries.is_empty() {
            return Ok(0);
        }

        let target = self.write_target()?;
        let mut content = fs::read(&target).map_err(LedgerError::WriteFailed)?;
        let with_header = content.is_empty();
        if !with_header && !content.ends_with(b"\n") {
            content.push(b'\n');
        }
        content.extend(Self::encode_rows(entries, with_header).map_err(LedgerError::WriteFailed)?);

        Self::commit(&target, &content)?;

        tracing::debug!(
            path = %self.path.display(),
            rows = entries.len(),
            with_header,
            "appended entries to ledger"
        );
        Ok(entries.len())
    }

    fn read_all(&self) -> Result<Vec<Entry>, LedgerError> {
        self.ensure_available()?;

        let file = File::open(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                LedgerError::StoreUnavailable(self.path.clone())
            }
            _ => LedgerError::ReadFailed(e),
        })?;

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let mut entries = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let parsed = match result {
                Err(e) if e.is_io_error() => return Err(Self::read_failed(e)),
                Err(e) => Err(RecordError::Csv(e.to_string())),
                Ok(record) if row == 0 => {
                    if record.iter().eq(HEADER) {
                        Ok(None)
                    } else {
                        Err(RecordError::UnexpectedHeader)
                    }
                }
                Ok(record) => Self::parse_row(row, &record).map(Some),
            };

            match parsed {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => {}
                Err(reason) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        row,
                        %reason,
                        "rejecting malformed ledger"
                    );
                    return Err(LedgerError::MalformedRecord { row, reason });
                }
            }
        }

        tracing::debug!(
            path = %self.path.display(),
            entries = entries.len(),
            "read ledger"
        );
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::FlowType;
    use chrono::NaiveDate;
    use rust_decimal::dec;
    use tempfile::TempDir;

    const HEADER_LINE: &str = "date_time,name,amount,reason,tag,flow_type\n";

    fn empty_store() -> (TempDir, LedgerStore) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.csv");
        File::create(&path).unwrap();
        (temp_dir, LedgerStore::open(path))
    }

    fn entry(name: &str, amount: rust_decimal::Decimal, flow_type: FlowType) -> Entry {
        Entry {
            date_time: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            name: name.to_string(),
            amount,
            reason: "daily".to_string(),
            tag: name.to_lowercase(),
            flow_type,
        }
    }

    fn milk() -> Entry {
        entry("Milk", dec!(40), FlowType::Debit)
    }

    fn salary() -> Entry {
        let mut salary = entry("Salary", dec!(50000), FlowType::Credit);
        salary.reason = "monthly".to_string();
        salary
    }

    fn file_count(dir: &TempDir) -> usize {
        fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_append_writes_header_once() {
        let (_dir, store) = empty_store();

        assert_eq!(store.append(&[milk()]).unwrap(), 1);
        assert_eq!(store.append(&[salary()]).unwrap(), 1);

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            content,
            format!(
                "{HEADER_LINE}\
                 2024-01-15 10:30:00,Milk,40,daily,milk,DEBIT\n\
                 2024-01-15 10:30:00,Salary,50000,monthly,salary,CREDIT\n"
            )
        );
        assert_eq!(content.matches("date_time").count(), 1);
    }

    #[test]
    fn test_read_all_in_insertion_order() {
        let (_dir, store) = empty_store();

        store.append(&[milk(), salary()]).unwrap();
        store.append(&[milk()]).unwrap();

        let entries = store.read_all().unwrap();
        assert_eq!(entries, vec![milk(), salary(), milk()]);
    }

    #[test]
    fn test_read_all_empty_and_header_only() {
        let (_dir, store) = empty_store();
        assert!(store.read_all().unwrap().is_empty());

        fs::write(store.path(), HEADER_LINE).unwrap();
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_append_empty_slice_is_noop() {
        let (_dir, store) = empty_store();

        assert_eq!(store.append(&[]).unwrap(), 0);
        assert_eq!(fs::read(store.path()).unwrap().len(), 0);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let store = LedgerStore::open(temp_dir.path().join("absent.csv"));

        assert!(matches!(
            store.read_all(),
            Err(LedgerError::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.append(&[milk()]),
            Err(LedgerError::StoreUnavailable(_))
        ));
        assert!(
            !store.path().exists(),
            "Store must not create the ledger file"
        );

        let store = LedgerStore::open(temp_dir.path().join("missing").join("ledger.csv"));
        assert!(matches!(
            store.append(&[milk()]),
            Err(LedgerError::StoreUnavailable(_))
        ));
    }

    #[test]
    fn test_fields_with_delimiters_are_quoted() {
        let (_dir, store) = empty_store();
        let mut tricky = milk();
        tricky.name = "Milk, \"full cream\"".to_string();
        tricky.reason = "two\nlines".to_string();

        store.append(&[tricky.clone(), salary()]).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("\"Milk, \"\"full cream\"\"\""));
        assert_eq!(store.read_all().unwrap(), vec![tricky, salary()]);
    }

    #[test]
    fn test_append_after_missing_trailing_newline() {
        let (_dir, store) = empty_store();
        fs::write(
            store.path(),
            format!("{HEADER_LINE}2024-01-15 10:30:00,Milk,40,daily,milk,DEBIT"),
        )
        .unwrap();

        store.append(&[salary()]).unwrap();

        assert_eq!(store.read_all().unwrap(), vec![milk(), salary()]);
    }

    #[test]
    fn test_failed_write_leaves_file_unchanged() {
        let (dir, store) = empty_store();
        store.append(&[milk()]).unwrap();
        let before = fs::read(store.path()).unwrap();

        let mut content = before.clone();
        content.extend(LedgerStore::encode_rows(&[salary()], false).unwrap());
        let result = LedgerStore::commit_with(store.path(), &content, |file, bytes| {
            file.write_all(&bytes[..bytes.len() - 7])?;
            Err(io::Error::other("disk full"))
        });

        assert!(matches!(result, Err(LedgerError::WriteFailed(_))));
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.read_all().unwrap(), vec![milk()]);
        assert_eq!(file_count(&dir), 1, "Staging file must be cleaned up");
    }

    #[test]
    fn test_append_to_readonly_ledger_fails() {
        let (dir, store) = empty_store();
        store.append(&[milk()]).unwrap();
        let before = fs::read(store.path()).unwrap();

        let mut permissions = fs::metadata(store.path()).unwrap().permissions();
        permissions.set_readonly(true);
        fs::set_permissions(store.path(), permissions).unwrap();

        match store.append(&[salary()]) {
            Err(LedgerError::WriteFailed(e)) => assert_eq!(e.kind(), ErrorKind::PermissionDenied),
            other => panic!("Expected write failure, got {:?}", other),
        }
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(store.read_all().unwrap(), vec![milk()]);
        assert_eq!(file_count(&dir), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_append_through_symlink_keeps_link() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real.csv");
        let link = temp_dir.path().join("link.csv");
        File::create(&real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let store = LedgerStore::open(&link);

        store.append(&[milk()]).unwrap();
        store.append(&[salary()]).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(
            LedgerStore::open(&real).read_all().unwrap(),
            vec![milk(), salary()]
        );
        assert_eq!(store.read_all().unwrap(), vec![milk(), salary()]);
        assert_eq!(file_count(&temp_dir), 2);
    }

    #[test]
    fn test_invalid_utf8_row_is_malformed() {
        let (_dir, store) = empty_store();
        let mut content = HEADER_LINE.as_bytes().to_vec();
        content.extend_from_slice(b"2024-01-15 10:30:00,Mi\xFFlk,40,daily,milk,DEBIT\n");
        fs::write(store.path(), content).unwrap();

        assert!(matches!(
            store.read_all(),
            Err(LedgerError::MalformedRecord {
                row: 1,
                reason: RecordError::Csv(_)
            })
        ));
    }

    #[test]
    fn test_successful_append_leaves_no_staging_file() {
        let (dir, store) = empty_store();

        store.append(&[milk(), salary()]).unwrap();

        assert_eq!(file_count(&dir), 1);
    }

    #[test]
    fn test_malformed_row_reports_index() {
        let (_dir, store) = empty_store();
        fs::write(
            store.path(),
            format!(
                "{HEADER_LINE}\
                 2024-01-15 10:30:00,Milk,40,daily,milk,DEBIT\n\
                 2024-01-15 10:30:00,Salary,lots,monthly,salary,CREDIT\n"
            ),
        )
        .unwrap();

        match store.read_all() {
            Err(LedgerError::MalformedRecord { row, reason }) => {
                assert_eq!(row, 2);
                assert_eq!(reason, RecordError::InvalidAmount("lots".to_string()));
            }
            other => panic!("Expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_column_count_is_malformed() {
        let (_dir, store) = empty_store();
        fs::write(
            store.path(),
            format!("{HEADER_LINE}2024-01-15 10:30:00,Milk,40,daily,DEBIT\n"),
        )
        .unwrap();

        match store.read_all() {
            Err(LedgerError::MalformedRecord { row, reason }) => {
                assert_eq!(row, 1);
                assert_eq!(
                    reason,
                    RecordError::ColumnCount {
                        expected: 6,
                        found: 5
                    }
                );
            }
            other => panic!("Expected malformed record, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_flow_type_and_header_are_malformed() {
        let (_dir, store) = empty_store();
        fs::write(
            store.path(),
            format!("{HEADER_LINE}2024-01-15 10:30:00,Milk,40,daily,milk,LOAN\n"),
        )
        .unwrap();
        assert!(matches!(
            store.read_all(),
            Err(LedgerError::MalformedRecord {
                row: 1,
                reason: RecordError::InvalidFlowType(_)
            })
        ));

        fs::write(store.path(), "when,who,how_much,why,tag,kind\n").unwrap();
        assert!(matches!(
            store.read_all(),
            Err(LedgerError::MalformedRecord {
                row: 0,
                reason: RecordError::UnexpectedHeader
            })
        ));
    }
}
