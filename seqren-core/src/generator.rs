use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::format_spec::{FormatSpec, FormatWarning, MAX_DUP_COUNT};
use crate::items::{path_key, PathPairMap, WorkingSet};

/// Highest starting counter probed by [`DestinationPathGenerator::find_next_avail_seq_count`].
pub const MAX_SEQ_COUNT: u32 = 99_999;

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Counter used for the first source.
    pub start: u32,
    /// Keep destinations distinct within the batch, retrying with `_(n)`.
    pub unique: bool,
    /// Also treat existing files outside the batch as collisions.
    pub check_existing: bool,
    /// Put every destination in this directory instead of the source's own.
    pub dest_dir: Option<PathBuf>,
    pub max_dup_count: u32,
    pub case_insensitive: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            start: 1,
            unique: true,
            check_existing: true,
            dest_dir: None,
            max_dup_count: MAX_DUP_COUNT,
            case_insensitive: cfg!(any(windows, target_os = "macos")),
        }
    }
}

/// Output of one generation pass.
#[derive(Debug, Clone, Default)]
pub struct Generated {
    pub pairs: PathPairMap,
    /// Counter the next batch would start from.
    pub next_counter: u32,
    pub warnings: Vec<(PathBuf, FormatWarning)>,
}

/// Turns ordered source paths into destination paths.
#[derive(Debug, Clone)]
pub struct DestinationPathGenerator {
    spec: FormatSpec,
    options: GenerateOptions,
}

impl DestinationPathGenerator {
    pub fn new(spec: FormatSpec, options: GenerateOptions) -> Result<Self> {
        spec.validate()?;
        Ok(Self { spec, options })
    }

    pub fn spec(&self) -> &FormatSpec {
        &self.spec
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    /// Generate destinations for `sources` in the order given.
    ///
    /// With `unique` set, a destination that collides with one already placed
    /// in this batch (or a foreign existing file when `check_existing` is set)
    /// is retried with the dup-count decorator. Running out of decorators fails
    /// the whole batch.
    pub fn generate(&self, sources: &[PathBuf]) -> Result<Generated> {
        let source_keys = self.keys(sources);
        let mut placed = HashSet::new();
        let mut generated = Generated::default();
        let mut counter = self.options.start;

        for source in sources {
            let dest = self.place(source, counter, &source_keys, &placed, &mut generated.warnings)?;
            placed.insert(path_key(&dest, self.options.case_insensitive));
            generated.pairs.insert(source.clone(), dest);
            counter = counter.saturating_add(1);
        }

        generated.next_counter = counter;
        Ok(generated)
    }

    /// Generate into the working set's rename items. Destinations are written
    /// only when the whole batch succeeded.
    pub fn generate_pairs(&self, working_set: &mut WorkingSet) -> Result<Generated> {
        let sources = working_set.sources().to_vec();
        let generated = self.generate(&sources)?;
        let items = working_set.rename_items();
        for (source, dest) in &generated.pairs {
            items.set_dest(source, dest.clone())?;
        }
        Ok(generated)
    }

    /// Smallest starting counter, from `start` up to [`MAX_SEQ_COUNT`], whose
    /// batch is distinct without decorators and hits no foreign file.
    pub fn find_next_avail_seq_count(&self, sources: &[PathBuf]) -> Result<u32> {
        let source_keys = self.keys(sources);

        'probe: for start in self.options.start..=MAX_SEQ_COUNT {
            let mut placed = HashSet::new();
            let mut counter = start;
            for source in sources {
                let (dest, _) = self.spec.format_path(source, counter, None, self.options.dest_dir.as_deref());
                let key = path_key(&dest, self.options.case_insensitive);
                if !placed.insert(key.clone()) || self.is_foreign_file(&dest, &key, &source_keys) {
                    continue 'probe;
                }
                counter = counter.saturating_add(1);
            }
            return Ok(start);
        }

        Err(Error::NoAvailableSeqCount {
            start: self.options.start,
            max: MAX_SEQ_COUNT,
        })
    }

    fn place(
        &self,
        source: &Path,
        counter: u32,
        source_keys: &HashSet<PathBuf>,
        placed: &HashSet<PathBuf>,
        warnings: &mut Vec<(PathBuf, FormatWarning)>,
    ) -> Result<PathBuf> {
        let dest_dir = self.options.dest_dir.as_deref();
        let (first, first_warnings) = self.spec.format_path(source, counter, None, dest_dir);
        warnings.extend(first_warnings.into_iter().map(|w| (source.to_path_buf(), w)));

        if !self.options.unique || !self.collides(&first, source_keys, placed) {
            return Ok(first);
        }

        for dup in 2..=self.options.max_dup_count {
            let (candidate, _) = self.spec.format_path(source, counter, Some(dup), dest_dir);
            if !self.collides(&candidate, source_keys, placed) {
                return Ok(candidate);
            }
        }

        Err(Error::DupCountExceeded {
            path: first,
            max: self.options.max_dup_count,
        })
    }

    fn collides(&self, dest: &Path, source_keys: &HashSet<PathBuf>, placed: &HashSet<PathBuf>) -> bool {
        let key = path_key(dest, self.options.case_insensitive);
        placed.contains(&key) || self.is_foreign_file(dest, &key, source_keys)
    }

    /// An existing file that is not one of the batch's own sources.
    fn is_foreign_file(&self, dest: &Path, key: &Path, source_keys: &HashSet<PathBuf>) -> bool {
        self.options.check_existing && !source_keys.contains(key) && dest.symlink_metadata().is_ok()
    }

    fn keys(&self, paths: &[PathBuf]) -> HashSet<PathBuf> {
        paths
            .iter()
            .map(|p| path_key(p, self.options.case_insensitive))
            .collect()
    }
}
