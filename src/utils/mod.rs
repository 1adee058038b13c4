use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write one entry per line, creating parent directories as needed.
pub fn write_lines<I, S>(path: &Path, lines: I) -> io::Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    let mut written = 0usize;
    for line in lines {
        writer.write_all(line.as_ref().as_bytes())?;
        writer.write_all(b"\n")?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

/// Read a newline-delimited list, trimming whitespace, dropping blank lines
/// and repeated entries.
pub fn read_unique_lines(path: &Path) -> io::Result<BTreeSet<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut entries = BTreeSet::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            entries.insert(trimmed.to_string());
        }
    }
    Ok(entries)
}
