// src/filter/hidden.rs

//! Platform-selected hidden-entry detection.

use std::io;
use std::path::Path;

/// How hidden entries are recognised on the current platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiddenRule {
    /// Base name starts with `.` (POSIX convention).
    DotPrefix,
    /// The filesystem hidden-attribute bit is set.
    #[cfg(windows)]
    HiddenAttribute,
}

impl HiddenRule {
    /// The rule for the platform this binary was built for.
    #[cfg(windows)]
    pub const fn platform() -> Self {
        HiddenRule::HiddenAttribute
    }

    /// The rule for the platform this binary was built for.
    #[cfg(not(windows))]
    pub const fn platform() -> Self {
        HiddenRule::DotPrefix
    }

    /// Whether `path` names a hidden entry.
    ///
    /// Errors when the check needs metadata that cannot be read, or when the
    /// path has no base name at all.
    pub fn is_hidden(self, path: &Path) -> io::Result<bool> {
        match self {
            HiddenRule::DotPrefix => {
                let name = path.file_name().ok_or_else(|| {
                    io::Error::new(io::ErrorKind::InvalidInput, format!("{path:?} has no file name"))
                })?;
                Ok(name.as_encoded_bytes().first() == Some(&b'.'))
            }
            #[cfg(windows)]
            HiddenRule::HiddenAttribute => {
                use std::os::windows::fs::MetadataExt;

                const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
                let meta = std::fs::symlink_metadata(path)?;
                Ok(meta.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0)
            }
        }
    }
}

impl Default for HiddenRule {
    fn default() -> Self {
        HiddenRule::platform()
    }
}
