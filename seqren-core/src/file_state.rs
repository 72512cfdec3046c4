use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, FileTimes, Permissions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// File attribute flags, stored with the conventional bit values so logs
/// written on one platform read the same on another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(pub u32);

impl Attributes {
    pub const READONLY: u32 = 0x1;
    pub const HIDDEN: u32 = 0x2;
    pub const SYSTEM: u32 = 0x4;
    pub const ARCHIVE: u32 = 0x20;

    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub fn readonly(self) -> bool {
        self.contains(Self::READONLY)
    }

    #[must_use]
    pub fn with(self, flag: u32, on: bool) -> Self {
        if on {
            Self(self.0 | flag)
        } else {
            Self(self.0 & !flag)
        }
    }
}

/// Snapshot of one file's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileState {
    pub path: PathBuf,
    pub attributes: Attributes,
    pub modified: Option<DateTime<Utc>>,
    pub created: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    /// Unix permission bits at snapshot time. The read-only attribute decides
    /// the write bits; everything else is restored as recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

impl FileState {
    /// An empty state for `path`, used before anything has been read.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            attributes: Attributes::default(),
            modified: None,
            created: None,
            accessed: None,
            mode: None,
        }
    }

    /// Read the current state of `path` from disk.
    pub fn read(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            attributes: read_attributes(&metadata),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            created: metadata.created().ok().map(DateTime::<Utc>::from),
            accessed: metadata.accessed().ok().map(DateTime::<Utc>::from),
            mode: read_mode(&metadata),
        })
    }

    /// Write this state's times and attributes onto the file at `self.path`.
    ///
    /// Times that are `None` are left untouched. Creation time can only be set
    /// on Windows and macOS. On failure the file keeps its original
    /// permissions.
    pub fn apply(&self) -> io::Result<()> {
        let original = fs::metadata(&self.path)?.permissions();

        // A read-only file cannot be opened for writing its times.
        let unlocked = unlocked(&original);
        if unlocked != original {
            fs::set_permissions(&self.path, unlocked)?;
        }

        let result = self
            .write_times()
            .and_then(|()| fs::set_permissions(&self.path, self.permissions(&original)));
        if result.is_err() {
            let _ = fs::set_permissions(&self.path, original);
        }
        result
    }

    fn write_times(&self) -> io::Result<()> {
        let mut times = FileTimes::new();
        if let Some(modified) = self.modified {
            times = times.set_modified(SystemTime::from(modified));
        }
        if let Some(accessed) = self.accessed {
            times = times.set_accessed(SystemTime::from(accessed));
        }
        times = with_created(times, self.created);

        File::options().write(true).open(&self.path)?.set_times(times)
    }

    /// Final permissions: the recorded mode (or the current one) with its
    /// write bits following the read-only attribute.
    #[cfg(unix)]
    fn permissions(&self, current: &Permissions) -> Permissions {
        use std::os::unix::fs::PermissionsExt;
        let mode = self.mode.unwrap_or(current.mode() & MODE_MASK);
        let mode = if self.attributes.readonly() {
            mode & !0o222
        } else if mode & 0o222 == 0 {
            mode | 0o200
        } else {
            mode
        };
        Permissions::from_mode(mode)
    }

    #[cfg(not(unix))]
    fn permissions(&self, current: &Permissions) -> Permissions {
        let mut permissions = current.clone();
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(self.attributes.readonly());
        permissions
    }

    /// Same state for another path.
    #[must_use]
    pub fn at(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..self.clone()
        }
    }
}

#[cfg(unix)]
const MODE_MASK: u32 = 0o7777;

#[cfg(windows)]
fn read_attributes(metadata: &fs::Metadata) -> Attributes {
    use std::os::windows::fs::MetadataExt;
    Attributes(metadata.file_attributes())
}

#[cfg(not(windows))]
fn read_attributes(metadata: &fs::Metadata) -> Attributes {
    Attributes::default().with(Attributes::READONLY, metadata.permissions().readonly())
}

#[cfg(unix)]
fn read_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & MODE_MASK)
}

#[cfg(not(unix))]
fn read_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

/// Owner-writable copy of `permissions`.
#[cfg(unix)]
fn unlocked(permissions: &Permissions) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode(permissions.mode() | 0o200)
}

#[cfg(not(unix))]
fn unlocked(permissions: &Permissions) -> Permissions {
    let mut permissions = permissions.clone();
    // Only clears the attribute outside Unix.
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
    permissions
}

#[cfg(windows)]
fn with_created(times: FileTimes, created: Option<DateTime<Utc>>) -> FileTimes {
    use std::os::windows::fs::FileTimesExt;
    match created {
        Some(created) => times.set_created(SystemTime::from(created)),
        None => times,
    }
}

#[cfg(target_os = "macos")]
fn with_created(times: FileTimes, created: Option<DateTime<Utc>>) -> FileTimes {
    use std::os::macos::fs::FileTimesExt;
    match created {
        Some(created) => times.set_created(SystemTime::from(created)),
        None => times,
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
fn with_created(times: FileTimes, _created: Option<DateTime<Utc>>) -> FileTimes {
    times
}
