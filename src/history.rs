//! The persisted history table and its replace-by-period merge.

use crate::domain::{LedgerJar, LedgerRow, Month};
use crate::session::Session;
use crate::storage::atomic_write;
use anyhow::{Context, Result, anyhow, bail};
use rust_decimal::Decimal;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const HEADER: [&str; 5] = ["Año", "Mes", "Jarrón", "Subcategoría", "Monto asignado"];

/// What was found on disk before a save.
#[derive(Debug)]
pub enum HistoryLoad {
    Missing,
    Empty,
    Unreadable(anyhow::Error),
    Loaded(Vec<LedgerRow>),
}

/// Why a save ignored the existing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    EmptyFile,
    Unreadable { reason: String, backup: PathBuf },
}

#[derive(Debug)]
pub struct SaveOutcome {
    pub rows: Vec<LedgerRow>,
    /// Rows of the saved period that were dropped from the previous history.
    pub replaced: usize,
    pub fallback: Option<Fallback>,
}

pub fn load_history(path: &Path) -> HistoryLoad {
    if !path.exists() {
        return HistoryLoad::Missing;
    }
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(err) => {
            return HistoryLoad::Unreadable(
                anyhow!(err).context(format!("Failed to read {}", path.display())),
            );
        }
    };
    if raw.iter().all(u8::is_ascii_whitespace) {
        return HistoryLoad::Empty;
    }
    match parse_history(raw.as_slice()) {
        Ok(rows) => HistoryLoad::Loaded(rows),
        Err(err) => HistoryLoad::Unreadable(err),
    }
}

/// Reads the history for display. Missing and empty files are empty histories;
/// an unreadable file is an error here.
pub fn read_history(path: &Path) -> Result<Vec<LedgerRow>> {
    match load_history(path) {
        HistoryLoad::Missing | HistoryLoad::Empty => Ok(Vec::new()),
        HistoryLoad::Loaded(rows) => Ok(rows),
        HistoryLoad::Unreadable(err) => {
            Err(err.context(format!("History file {} is unreadable", path.display())))
        }
    }
}

pub fn parse_history<R: Read>(reader: R) -> Result<Vec<LedgerRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let mut idx = [0usize; 5];
    for (slot, name) in idx.iter_mut().zip(HEADER) {
        *slot = headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}') == name)
            .ok_or_else(|| anyhow!("missing column '{name}'"))?;
    }
    let [year_i, month_i, jar_i, sub_i, amount_i] = idx;

    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let line = i + 2;
        let record = result.with_context(|| format!("CSV parse error at line {line}"))?;
        let field = |at: usize| record.get(at).unwrap_or("");

        let year = field(year_i)
            .parse::<i32>()
            .with_context(|| format!("line {line}: invalid year '{}'", field(year_i)))?;
        let month = field(month_i)
            .parse::<Month>()
            .with_context(|| format!("line {line}: invalid month"))?;
        let Some(jar) = LedgerJar::from_column(field(jar_i)) else {
            bail!("line {line}: unknown jar '{}'", field(jar_i));
        };
        let amount = parse_stored_amount(field(amount_i))
            .with_context(|| format!("line {line}: invalid amount '{}'", field(amount_i)))?;

        rows.push(LedgerRow {
            year,
            month,
            jar,
            subcategory: field(sub_i).to_string(),
            amount,
        });
    }
    Ok(rows)
}

fn parse_stored_amount(raw: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|e| anyhow!(e))
}

pub fn write_history_to<W: Write>(rows: &[LedgerRow], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(HEADER)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_history(path: &Path, rows: &[LedgerRow]) -> Result<()> {
    let mut buf = Vec::new();
    write_history_to(rows, &mut buf)?;
    atomic_write(path, &buf)
}

/// Drops every row of (`year`, `month`), the income row included, and appends
/// `incoming`. Rows of other periods keep their order.
pub fn merge_period(
    existing: Vec<LedgerRow>,
    incoming: Vec<LedgerRow>,
    year: i32,
    month: Month,
) -> (Vec<LedgerRow>, usize) {
    let before = existing.len();
    let mut merged: Vec<LedgerRow> = existing
        .into_iter()
        .filter(|r| !r.is_period(year, month))
        .collect();
    let replaced = before - merged.len();
    merged.extend(incoming);
    (merged, replaced)
}

/// Merges the session into the history file at `path` and persists it.
pub fn save_session(path: &Path, session: &Session) -> Result<SaveOutcome> {
    let (existing, fallback) = match load_history(path) {
        HistoryLoad::Missing => (Vec::new(), None),
        HistoryLoad::Loaded(rows) => (rows, None),
        HistoryLoad::Empty => {
            tracing::warn!(
                path = %path.display(),
                "history file is empty, a new one will be created"
            );
            (Vec::new(), Some(Fallback::EmptyFile))
        }
        HistoryLoad::Unreadable(err) => {
            let backup = backup_path(path);
            fs::copy(path, &backup).with_context(|| {
                format!("Failed to back up unreadable history to {}", backup.display())
            })?;
            tracing::warn!(
                path = %path.display(),
                backup = %backup.display(),
                "could not read existing history ({err:#}); saving only the current session"
            );
            (
                Vec::new(),
                Some(Fallback::Unreadable {
                    reason: format!("{err:#}"),
                    backup,
                }),
            )
        }
    };

    let (rows, replaced) = merge_period(
        existing,
        session.ledger_rows(),
        session.year,
        session.month,
    );
    write_history(path, &rows)?;
    tracing::info!(
        path = %path.display(),
        year = session.year,
        month = %session.month,
        replaced,
        total = rows.len(),
        "history saved"
    );

    Ok(SaveOutcome {
        rows,
        replaced,
        fallback,
    })
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".corrupt");
    path.with_file_name(name)
}

/// Deletes the history file. Returns whether one existed.
pub fn clear_history(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    tracing::info!(path = %path.display(), "history cleared");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{INCOME_JAR, Jar};
    use rust_decimal_macros::dec;

    fn row(year: i32, month: Month, jar: LedgerJar, sub: &str, amount: Decimal) -> LedgerRow {
        LedgerRow {
            year,
            month,
            jar,
            subcategory: sub.to_string(),
            amount,
        }
    }

    fn income_rows(rows: &[LedgerRow], year: i32, month: Month) -> Vec<Decimal> {
        rows.iter()
            .filter(|r| r.is_period(year, month) && r.jar == LedgerJar::Income)
            .map(|r| r.amount)
            .collect()
    }

    #[test]
    fn resaving_a_period_replaces_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");

        let first = Session::new(dec!(1000000), 2025, Month::Enero).unwrap();
        let outcome = save_session(&path, &first).unwrap();
        assert_eq!(outcome.replaced, 0);
        assert!(outcome.fallback.is_none());

        let second = Session::new(dec!(1200000), 2025, Month::Enero).unwrap();
        let outcome = save_session(&path, &second).unwrap();
        assert_eq!(outcome.replaced, 1);

        let rows = read_history(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(income_rows(&rows, 2025, Month::Enero), vec![dec!(1200000)]);
    }

    #[test]
    fn merge_keeps_other_periods_in_order() {
        let existing = vec![
            row(2024, Month::Diciembre, LedgerJar::Income, "Total Ingreso", dec!(10)),
            row(2025, Month::Enero, LedgerJar::Income, "Total Ingreso", dec!(20)),
            row(2025, Month::Enero, LedgerJar::Jar(Jar::Fun), "Viajes", dec!(1)),
            row(2026, Month::Enero, LedgerJar::Income, "Total Ingreso", dec!(30)),
        ];
        let incoming = vec![row(2025, Month::Enero, LedgerJar::Income, "Total Ingreso", dec!(99))];
        let (merged, replaced) = merge_period(existing, incoming, 2025, Month::Enero);
        assert_eq!(replaced, 2);
        let amounts: Vec<Decimal> = merged.iter().map(|r| r.amount).collect();
        assert_eq!(amounts, vec![dec!(10), dec!(30), dec!(99)]);
    }

    #[test]
    fn expenses_of_a_resaved_period_are_not_duplicated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");

        let mut session = Session::new(dec!(1000), 2025, Month::Febrero).unwrap();
        session
            .add_expense(Jar::Basics, Some("Transporte"), Some("100"))
            .unwrap();
        save_session(&path, &session).unwrap();
        session
            .add_expense(Jar::Basics, Some("Deudas"), Some("50"))
            .unwrap();
        save_session(&path, &session).unwrap();

        let rows = read_history(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].subcategory, "Transporte");
        assert_eq!(rows[2].subcategory, "Deudas");
    }

    #[test]
    fn empty_file_falls_back_to_session_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "").unwrap();
        assert!(matches!(load_history(&path), HistoryLoad::Empty));

        let session = Session::new(dec!(500), 2025, Month::Abril).unwrap();
        let outcome = save_session(&path, &session).unwrap();
        assert_eq!(outcome.fallback, Some(Fallback::EmptyFile));
        assert_eq!(read_history(&path).unwrap().len(), 1);
    }

    #[test]
    fn corrupt_file_is_backed_up_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        fs::write(&path, "foo,bar\n1,2\n").unwrap();

        let session = Session::new(dec!(500), 2025, Month::Abril).unwrap();
        let outcome = save_session(&path, &session).unwrap();
        match outcome.fallback {
            Some(Fallback::Unreadable { reason, backup }) => {
                assert!(reason.contains("missing column"));
                assert_eq!(fs::read_to_string(backup).unwrap(), "foo,bar\n1,2\n");
            }
            other => panic!("unexpected fallback {other:?}"),
        }
        assert_eq!(read_history(&path).unwrap().len(), 1);
    }

    #[test]
    fn header_only_file_is_an_empty_history() {
        let rows = parse_history("Año,Mes,Jarrón,Subcategoría,Monto asignado\n".as_bytes()).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let raw = "\u{feff}Año,Mes,Jarrón,Subcategoría,Monto asignado\n\
                   2025,Enero,Ingreso Mensual,Total Ingreso,1000\n";
        let rows = parse_history(raw.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].year, 2025);
    }

    #[test]
    fn reads_files_written_with_float_amounts() {
        let raw = format!(
            "Año,Mes,Jarrón,Subcategoría,Monto asignado\n\
             2025,Enero,{INCOME_JAR},Total Ingreso,1000000.0\n\
             2025,Enero,Gastos básicos,Alimentación,500000\n"
        );
        let rows = parse_history(raw.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount, dec!(1000000));
        assert_eq!(rows[1].jar, LedgerJar::Jar(Jar::Basics));
    }

    #[test]
    fn unknown_jar_is_a_parse_error() {
        let raw = "Año,Mes,Jarrón,Subcategoría,Monto asignado\n2025,Enero,Ahorro,X,1\n";
        let err = parse_history(raw.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("unknown jar 'Ahorro'"));
    }

    #[test]
    fn written_file_has_spanish_header() {
        let mut buf = Vec::new();
        let rows = vec![row(2025, Month::Marzo, LedgerJar::Jar(Jar::Give), "Fundaciones", dec!(12.50))];
        write_history_to(&rows, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "Año,Mes,Jarrón,Subcategoría,Monto asignado\n2025,Marzo,Donar,Fundaciones,12.50\n"
        );
    }

    #[test]
    fn clear_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        assert!(!clear_history(&path).unwrap());
        fs::write(&path, "x").unwrap();
        assert!(clear_history(&path).unwrap());
        assert!(!path.exists());
    }
}
