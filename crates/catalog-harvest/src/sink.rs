//! CSV result files: one per target, fixed column order.

use std::path::{Path, PathBuf};

use crate::types::{HarvestError, HarvestResult, ProductRecord, Target, COLUMNS};

/// Destination for one target's record set.
pub trait ResultSink {
    /// Persist `records` for `target` and return where they went.
    fn write(&mut self, target: &Target, records: &[ProductRecord]) -> HarvestResult<PathBuf>;
}

/// Writes `{dir}/{kind}_{label}.csv`.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, target: &Target) -> PathBuf {
        self.dir.join(format!("{}.csv", target.file_stem()))
    }
}

impl ResultSink for CsvSink {
    fn write(&mut self, target: &Target, records: &[ProductRecord]) -> HarvestResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(target);

        // Stage next to the destination so the final rename stays on one filesystem
        let mut staged = tempfile::NamedTempFile::new_in(&self.dir)?;
        write_records(staged.as_file_mut(), records)?;
        publish_permissions(staged.as_file())?;
        staged.persist(&path).map_err(|e| HarvestError::Io(e.error))?;

        Ok(path)
    }
}

/// Staging files are created owner-only; result files are world-readable.
#[cfg(unix)]
fn publish_permissions(file: &std::fs::File) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(std::fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn publish_permissions(_file: &std::fs::File) -> std::io::Result<()> {
    Ok(())
}

/// Write a header row and every record to `writer`.
pub fn write_records<W: std::io::Write>(writer: W, records: &[ProductRecord]) -> HarvestResult<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Read a result file back. Empty cells become `None`.
pub fn read_records(path: &Path) -> HarvestResult<Vec<ProductRecord>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?;
    if headers.iter().ne(COLUMNS.iter().copied()) {
        return Err(HarvestError::Sink(format!(
            "{} has unexpected columns: {}",
            path.display(),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut records = Vec::new();
    for row in rdr.deserialize() {
        records.push(row?);
    }
    Ok(records)
}

/// A result file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub rows: usize,
}

/// List `.csv` files in `dir` with their data row counts, sorted by name.
pub fn list_outputs(dir: &Path) -> HarvestResult<Vec<OutputFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .map(|path| -> HarvestResult<OutputFile> {
            let rows = csv::Reader::from_path(&path)?.records().count();
            Ok(OutputFile { path, rows })
        })
        .collect()
}
