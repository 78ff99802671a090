//! Run transcripts: every line goes to the console and to an output file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Console-plus-file logger for a single run. Creating it truncates the file
/// and writes a banner header; each `log` call appends one line.
pub struct OutputLog {
    path: PathBuf,
    writer: BufWriter<File>,
    echo: bool,
}

impl OutputLog {
    /// Create (or truncate) the transcript at `path` with a banner `header`.
    /// Parent directories are created as needed.
    pub fn create<P: AsRef<Path>>(path: P, header: &str) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&path)?;
        let mut log = Self {
            path,
            writer: BufWriter::new(file),
            echo: true,
        };
        writeln!(log.writer, "=== {} ===", header)?;
        writeln!(log.writer)?;
        log.writer.flush()?;
        Ok(log)
    }

    /// Disable console echo; lines still go to the file. Used by tests.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Append one line to the transcript and echo it to stdout.
    pub fn log(&mut self, line: &str) -> io::Result<()> {
        if self.echo {
            println!("{}", line);
        }
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Append one line to an existing transcript without truncating it.
pub fn append_line<P: AsRef<Path>>(path: P, line: &str) -> io::Result<()> {
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", line)?;
    writer.flush()?;
    Ok(())
}
