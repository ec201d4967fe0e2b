//! Temporary key files for session configuration tests.

use std::io::Write;

use tempfile::NamedTempFile;

/// Key file filled with a repeated byte, removed on drop.
#[derive(Debug)]
pub struct TempKeyFile {
    file: NamedTempFile,
}

impl TempKeyFile {
    pub fn new(len: usize) -> std::io::Result<Self> {
        Self::filled(len, b'a')
    }

    pub fn filled(len: usize, fill: u8) -> std::io::Result<Self> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&vec![fill; len])?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path_str(&self) -> String {
        self.file.path().to_string_lossy().into_owned()
    }
}
