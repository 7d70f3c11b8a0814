use std::path::{Path, PathBuf};

use crate::error::StagingError;

/// Local directory for files produced during a run: downloaded inputs,
/// combined documents and generated reports.
///
/// Files are never overwritten; a clash yields `name_2.ext`, `name_3.ext`, ...
pub struct LocalStaging {
    directory: PathBuf,
}

impl LocalStaging {
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn store(
        &self,
        content: &[u8],
        relative_directory: &str,
        filename: &str,
        extension: &str,
    ) -> Result<PathBuf, StagingError> {
        let dir_path = self.directory.join(relative_directory);
        ensure_directory(&dir_path)?;

        let full_filename = format!("{}.{}", filename, extension);
        store_with_atomic_creation(&dir_path, &full_filename, content)
    }
}

fn ensure_directory(path: &Path) -> Result<(), StagingError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StagingError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Splits `name.ext` into `("name", Some(".ext"))`.
pub fn split_extension(filename: &str) -> (&str, Option<&str>) {
    match filename.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => (&filename[..dot_pos], Some(&filename[dot_pos..])),
        _ => (filename, None),
    }
}

/// Candidate name for attempt `counter` (1 = the original name).
pub fn numbered_name(filename: &str, counter: u32) -> String {
    if counter <= 1 {
        return filename.to_string();
    }
    match split_extension(filename) {
        (base, Some(ext)) => format!("{}_{}{}", base, counter, ext),
        (base, None) => format!("{}_{}", base, counter),
    }
}

/// Highest numbered variant tried before giving up.
pub const MAX_NAME_ATTEMPTS: u32 = 1000;

fn store_with_atomic_creation(
    dir_path: &Path,
    filename: &str,
    content: &[u8],
) -> Result<PathBuf, StagingError> {
    use std::io::Write;

    for counter in 1..=MAX_NAME_ATTEMPTS {
        let try_path = dir_path.join(numbered_name(filename, counter));

        // create_new is the existence check and the creation in one step
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&try_path)
        {
            Ok(mut file) => {
                file.write_all(content)
                    .map_err(|e| StagingError::WriteFile {
                        path: try_path.clone(),
                        source: e,
                    })?;
                return Ok(try_path);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(StagingError::WriteFile {
                    path: try_path,
                    source: e,
                });
            }
        }
    }

    Err(StagingError::FileExists(dir_path.join(filename)))
}
