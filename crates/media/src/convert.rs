//! Conversion of vector formats browsers cannot display into PNG.

use deck_core::{Error, Result};
use std::io::Write;
use std::process::{Command, Stdio};

/// Extensions handled by a converter rather than decoded directly.
pub const UNSUPPORTED_EXTENSIONS: &[&str] = &["wmf", "emf"];

pub fn is_unsupported(extension: &str) -> bool {
    UNSUPPORTED_EXTENSIONS.contains(&extension)
}

/// Turns picture bytes of an unsupported format into PNG bytes.
pub trait ImageConverter {
    fn to_png(&self, data: &[u8], extension: &str) -> Result<Vec<u8>>;
}

/// Converter backed by an ImageMagick-compatible command reading the
/// source on stdin and writing PNG to stdout.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
}

impl CommandConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandConverter {
    fn default() -> Self {
        Self::new("magick")
    }
}

impl ImageConverter for CommandConverter {
    fn to_png(&self, data: &[u8], extension: &str) -> Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .arg(format!("{}:-", extension))
            .arg("png:-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::ImageError(format!("Cannot run {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(data)?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() || output.stdout.is_empty() {
            return Err(Error::ImageError(format!(
                "{} failed to convert {}: {}",
                self.program,
                extension,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output.stdout)
    }
}
