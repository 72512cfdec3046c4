use std::fs;
use std::io;
use std::path::Path;

use crate::rename::detect_case_insensitive_fs;

fn is_case_only_change(from: &Path, to: &Path) -> bool {
    from != to && from.to_string_lossy().to_lowercase() == to.to_string_lossy().to_lowercase()
}

/// Move `from` to `to` without ever replacing an existing file.
///
/// A case-only change on a case-insensitive filesystem goes through a
/// temporary name, since the destination "exists" as the source itself.
pub fn rename_file(from: &Path, to: &Path) -> io::Result<()> {
    fs::symlink_metadata(from)?;

    let parent = from.parent().unwrap_or_else(|| Path::new("."));
    if is_case_only_change(from, to) && detect_case_insensitive_fs(parent) {
        let temp_name = from.with_extension(format!("{}.seqren.tmp", std::process::id()));
        fs::rename(from, &temp_name)?;
        // On failure the file goes back to where it was before reporting.
        return fs::rename(&temp_name, to).inspect_err(|_| {
            let _ = fs::rename(&temp_name, from);
        });
    }

    if fs::symlink_metadata(to).is_ok() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", to.display()),
        ));
    }

    if let Some(dest_dir) = to.parent().filter(|p| !p.as_os_str().is_empty() && !p.exists()) {
        fs::create_dir_all(dest_dir)?;
    }

    fs::rename(from, to)
}
