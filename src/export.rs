use crate::domain::LedgerRow;
use crate::history::write_history_to;
use crate::rollup::{AnnualRollup, MonthlyRollup, annual, monthly};
use crate::storage::atomic_write;
use anyhow::Result;
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    /// Full history with the persisted columns.
    Csv,
    /// History plus the monthly and annual summaries.
    Json,
}

#[derive(Debug, Serialize)]
struct Bundle<'a> {
    history: &'a [LedgerRow],
    monthly: Vec<MonthlyRollup>,
    annual: Vec<AnnualRollup>,
}

pub fn render(rows: &[LedgerRow], format: ExportFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        ExportFormat::Csv => write_history_to(rows, &mut buf)?,
        ExportFormat::Json => {
            let bundle = Bundle {
                history: rows,
                monthly: monthly(rows)?,
                annual: annual(rows)?,
            };
            serde_json::to_writer_pretty(&mut buf, &bundle)?;
            buf.push(b'\n');
        }
    }
    Ok(buf)
}

pub fn export(rows: &[LedgerRow], format: ExportFormat, dest: &Path) -> Result<()> {
    let bytes = render(rows, format)?;
    atomic_write(dest, &bytes)?;
    tracing::info!(path = %dest.display(), rows = rows.len(), ?format, "exported history");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Jar, LedgerJar, Month};
    use rust_decimal_macros::dec;

    fn rows() -> Vec<LedgerRow> {
        vec![
            LedgerRow {
                year: 2025,
                month: Month::Junio,
                jar: LedgerJar::Income,
                subcategory: "Total Ingreso".into(),
                amount: dec!(1000),
            },
            LedgerRow {
                year: 2025,
                month: Month::Junio,
                jar: LedgerJar::Jar(Jar::Education),
                subcategory: "Libros".into(),
                amount: dec!(40),
            },
        ]
    }

    #[test]
    fn json_bundle_carries_both_rollups() {
        let bytes = render(&rows(), ExportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["history"].as_array().unwrap().len(), 2);
        assert_eq!(value["history"][1]["Jarrón"], "Educación");
        assert_eq!(value["monthly"][0]["Mes"], "Junio");
        assert_eq!(value["monthly"][0]["Saldo Mensual"], "960");
        assert_eq!(value["annual"][0]["Total Gastado del Año"], "40");
    }

    #[test]
    fn csv_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out").join("jarrones_historial.csv");
        export(&rows(), ExportFormat::Csv, &dest).unwrap();
        let text = std::fs::read_to_string(dest).unwrap();
        assert!(text.starts_with("Año,Mes,Jarrón,Subcategoría,Monto asignado\n"));
        assert!(text.contains("2025,Junio,Educación,Libros,40\n"));
    }
}
