//! JSONL persistence for records and pretty-printed JSON for manifests.
//!
//! Records are written one canonical JSON object per line; readers skip
//! blank lines and accept the legacy field aliases handled by the schema
//! deserializer. Manifest JSON is emitted with sorted keys so two identical
//! runs produce byte-identical files.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::SuiteError;
use crate::schema::ConflictExample;

fn ensure_parent_dir(path: &Path) -> Result<(), SuiteError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Read records from a JSONL file, one object per non-blank line.
pub fn read_examples<P: AsRef<Path>>(path: P) -> Result<Vec<ConflictExample>, SuiteError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut examples = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        examples.push(serde_json::from_str(trimmed)?);
    }
    debug!(
        path = %path.display(),
        records = examples.len(),
        "read example records"
    );
    Ok(examples)
}

/// Write records as JSONL, creating parent directories as needed.
pub fn write_examples<P: AsRef<Path>>(
    path: P,
    examples: &[ConflictExample],
) -> Result<(), SuiteError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let mut writer = BufWriter::new(File::create(path)?);
    for example in examples {
        writeln!(writer, "{}", serde_json::to_string(example)?)?;
    }
    writer.flush()?;
    debug!(
        path = %path.display(),
        records = examples.len(),
        "wrote example records"
    );
    Ok(())
}

/// Write a suite or pilot manifest as pretty JSON with sorted keys.
pub fn write_manifest<P: AsRef<Path>, T: Serialize>(
    path: P,
    manifest: &T,
) -> Result<(), SuiteError> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let value = serde_json::to_value(manifest)?;
    fs::write(path, serde_json::to_string_pretty(&value)?)?;
    Ok(())
}

/// Read a manifest written by [`write_manifest`].
pub fn read_manifest<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> Result<T, SuiteError> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}
