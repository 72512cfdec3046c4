use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::file_state::FileState;

/// Source path -> destination path.
pub type PathPairMap = BTreeMap<PathBuf, PathBuf>;

/// Key used to compare paths: lowercased on case-insensitive filesystems.
pub fn path_key(path: &Path, case_insensitive: bool) -> PathBuf {
    if case_insensitive {
        PathBuf::from(path.to_string_lossy().to_lowercase())
    } else {
        path.to_path_buf()
    }
}

/// A source path paired with its (editable) destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameItem {
    source: PathBuf,
    pub dest: PathBuf,
}

impl RenameItem {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            dest: PathBuf::new(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Case-sensitive so that casing-only renames count as modifications.
    pub fn is_modified(&self) -> bool {
        !self.dest.as_os_str().is_empty() && self.dest.as_os_str() != self.source.as_os_str()
    }
}

/// A source file state paired with its (editable) destination state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchItem {
    source: FileState,
    pub dest: FileState,
}

impl TouchItem {
    pub fn new(source: FileState) -> Self {
        Self {
            dest: source.clone(),
            source,
        }
    }

    pub fn source(&self) -> &FileState {
        &self.source
    }

    pub fn is_modified(&self) -> bool {
        self.dest != self.source
    }
}

/// Rename items kept sorted by source path for binary-search lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameItems {
    items: Vec<RenameItem>,
}

impl RenameItems {
    pub fn from_sources<I, P>(sources: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut items: Vec<RenameItem> = sources.into_iter().map(RenameItem::new).collect();
        items.sort_by(|a, b| a.source.cmp(&b.source));
        items.dedup_by(|a, b| a.source == b.source);
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenameItem> {
        self.items.iter()
    }

    pub fn find(&self, source: &Path) -> Option<&RenameItem> {
        self.items
            .binary_search_by(|item| item.source.as_path().cmp(source))
            .ok()
            .map(|i| &self.items[i])
    }

    pub fn find_mut(&mut self, source: &Path) -> Option<&mut RenameItem> {
        self.items
            .binary_search_by(|item| item.source.as_path().cmp(source))
            .ok()
            .map(move |i| &mut self.items[i])
    }

    /// Set one destination, returning the previous one.
    pub fn set_dest(&mut self, source: &Path, dest: PathBuf) -> Result<PathBuf> {
        let item = self
            .find_mut(source)
            .ok_or_else(|| Error::UnknownItem(source.to_path_buf()))?;
        Ok(std::mem::replace(&mut item.dest, dest))
    }

    /// Pairs for every modified item.
    pub fn pairs(&self) -> PathPairMap {
        self.items
            .iter()
            .filter(|item| item.is_modified())
            .map(|item| (item.source.clone(), item.dest.clone()))
            .collect()
    }

    pub fn modified_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_modified()).count()
    }
}

/// Touch items kept sorted by source path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TouchItems {
    items: Vec<TouchItem>,
}

impl TouchItems {
    pub fn from_states(states: impl IntoIterator<Item = FileState>) -> Self {
        let mut items: Vec<TouchItem> = states.into_iter().map(TouchItem::new).collect();
        items.sort_by(|a, b| a.source.path.cmp(&b.source.path));
        items.dedup_by(|a, b| a.source.path == b.source.path);
        Self { items }
    }

    /// Read the current state of every source from disk.
    pub fn read(sources: &[PathBuf]) -> Result<Self> {
        let states = sources
            .iter()
            .map(|path| FileState::read(path).map_err(|e| Error::io(path, e)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::from_states(states))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TouchItem> {
        self.items.iter()
    }

    pub fn find(&self, source: &Path) -> Option<&TouchItem> {
        self.items
            .binary_search_by(|item| item.source.path.as_path().cmp(source))
            .ok()
            .map(|i| &self.items[i])
    }

    fn find_mut(&mut self, source: &Path) -> Option<&mut TouchItem> {
        self.items
            .binary_search_by(|item| item.source.path.as_path().cmp(source))
            .ok()
            .map(move |i| &mut self.items[i])
    }

    pub fn set_dest(&mut self, source: &Path, dest: FileState) -> Result<FileState> {
        let item = self
            .find_mut(source)
            .ok_or_else(|| Error::UnknownItem(source.to_path_buf()))?;
        Ok(std::mem::replace(&mut item.dest, dest))
    }

    pub fn modified(&self) -> impl Iterator<Item = &TouchItem> {
        self.items.iter().filter(|item| item.is_modified())
    }
}

/// The files chosen for one session, plus lazily built item sets.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    sources: Vec<PathBuf>,
    rename: Option<RenameItems>,
    touch: Option<TouchItems>,
}

impl WorkingSet {
    pub fn new(sources: Vec<PathBuf>) -> Self {
        Self {
            sources,
            rename: None,
            touch: None,
        }
    }

    /// Sources in the order they were supplied.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn rename_items(&mut self) -> &mut RenameItems {
        let sources = &self.sources;
        self.rename
            .get_or_insert_with(|| RenameItems::from_sources(sources.iter().cloned()))
    }

    pub fn touch_items(&mut self) -> Result<&mut TouchItems> {
        if self.touch.is_none() {
            self.touch = Some(TouchItems::read(&self.sources)?);
        }
        Ok(self.touch.get_or_insert_with(TouchItems::default))
    }

    /// Item sets that have already been built, without building them.
    pub fn built_rename_items(&self) -> Option<&RenameItems> {
        self.rename.as_ref()
    }

    pub fn built_touch_items(&self) -> Option<&TouchItems> {
        self.touch.as_ref()
    }

    /// Replace the source list and drop every item set built from the old one.
    pub fn rebuild(&mut self, sources: Vec<PathBuf>) {
        *self = Self::new(sources);
    }

    /// Follow a sequence of executed moves and rebuild from the new locations.
    pub fn follow_moves(&mut self, moves: &[(PathBuf, PathBuf)]) {
        let sources = self
            .sources
            .iter()
            .map(|source| {
                moves.iter().fold(source.clone(), |current, (from, to)| {
                    if &current == from {
                        to.clone()
                    } else {
                        current
                    }
                })
            })
            .collect();
        self.rebuild(sources);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_item_modified_is_case_sensitive() {
        let mut item = RenameItem::new("/a/Photo.jpg");
        assert!(!item.is_modified());
        item.dest = PathBuf::from("/a/Photo.jpg");
        assert!(!item.is_modified());
        item.dest = PathBuf::from("/a/photo.jpg");
        assert!(item.is_modified());
    }

    #[test]
    fn test_items_sorted_and_searchable() {
        let mut items = RenameItems::from_sources(["/b", "/a", "/c", "/a"]);
        assert_eq!(items.len(), 3);
        assert!(items.find(Path::new("/b")).is_some());
        assert!(items.find(Path::new("/z")).is_none());

        let old = items.set_dest(Path::new("/b"), PathBuf::from("/bb")).unwrap();
        assert!(old.as_os_str().is_empty());
        assert_eq!(items.pairs().len(), 1);
        assert!(matches!(
            items.set_dest(Path::new("/z"), PathBuf::new()),
            Err(Error::UnknownItem(_))
        ));
    }

    #[test]
    fn test_follow_moves_rebuilds_items() {
        let mut set = WorkingSet::new(vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        set.rename_items()
            .set_dest(Path::new("/a"), PathBuf::from("/x"))
            .unwrap();

        set.follow_moves(&[
            (PathBuf::from("/a"), PathBuf::from("/tmp")),
            (PathBuf::from("/tmp"), PathBuf::from("/x")),
        ]);
        assert_eq!(set.sources(), &[PathBuf::from("/x"), PathBuf::from("/b")]);
        assert!(set.built_rename_items().is_none());
        assert_eq!(set.rename_items().modified_count(), 0);
    }

    #[test]
    fn test_path_key() {
        assert_eq!(
            path_key(Path::new("/A/B.txt"), true),
            PathBuf::from("/a/b.txt")
        );
        assert_eq!(
            path_key(Path::new("/A/B.txt"), false),
            PathBuf::from("/A/B.txt")
        );
    }
}
