use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::dataset::Dataset;
use crate::query::QueryOutcome;

/// Write the full unformatted result set as row-oriented CSV, row index as an
/// explicit first column. Written to a temp file and swapped into place.
pub fn export_csv(path: &Path, dataset: &Dataset, outcome: &QueryOutcome) -> Result<usize> {
    let rows = outcome.export_rows(dataset);
    let tmp = path.with_extension("csv.tmp");
    {
        let mut writer = csv::Writer::from_path(&tmp)
            .with_context(|| format!("create {}", tmp.display()))?;
        for row in &rows {
            writer.write_record(row).context("write csv row")?;
        }
        writer.flush().context("flush csv export")?;
    }
    fs::rename(&tmp, path).with_context(|| format!("swap csv into {}", path.display()))?;
    Ok(rows.len().saturating_sub(1))
}

/// Same rows, spreadsheet-compatible binary format.
pub fn export_xlsx(path: &Path, dataset: &Dataset, outcome: &QueryOutcome) -> Result<usize> {
    let rows = outcome.export_rows(dataset);
    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Candidates")?;
        write_rows(sheet, &rows)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(rows.len().saturating_sub(1))
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
