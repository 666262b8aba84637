//! Desktop shell property hook.
//!
//! Some platforms keep a separate property store (title, subject, tags,
//! comments, author) next to the file's own metadata. The randomizer hands the
//! generated values to a [`ShellProperties`] implementation after each write;
//! the default does nothing. The same values are always embedded in the EXIF
//! block as XP* tags, which is what Windows Explorer reads.

use anyhow::Result;
use std::path::Path;

/// The free-text properties offered to the shell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShellProps {
    pub title: String,
    pub subject: String,
    pub tags: String,
    pub comments: String,
    pub author: String,
}

/// Best-effort writer for shell-level file properties.
pub trait ShellProperties: Send + Sync {
    /// Name for log messages.
    fn name(&self) -> &str;

    /// Apply `props` to the file at `path`. Failures are logged, never fatal.
    fn apply(&self, path: &Path, props: &ShellProps) -> Result<()>;
}

/// Does nothing. Used on every platform unless a caller supplies its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopShell;

impl ShellProperties for NoopShell {
    fn name(&self) -> &str {
        "noop"
    }

    fn apply(&self, path: &Path, _props: &ShellProps) -> Result<()> {
        log::debug!("Shell properties skipped for {}", path.display());
        Ok(())
    }
}

/// The shell hook for the current platform.
pub fn platform_default() -> Box<dyn ShellProperties> {
    Box::new(NoopShell)
}
