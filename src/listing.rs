//! Directory listing engine.
//!
//! Turns a path on disk into a [`Listing`]: the queried entry first, followed
//! by its immediate children when it is a directory.

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Local};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::FileServerError;
use crate::size::format_size;

/// Modification time pattern, e.g. `2024-03-07 02:15PM`.
pub const DATE_FORMAT: &str = "%Y-%m-%d %I:%M%p";

/// Wire discriminant for an item. Serialized as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    Directory = 0,
    File = 1,
}

impl Serialize for ItemType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(*self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemKind {
    /// `count` is the number of entries reported for the directory, if any.
    Directory { count: Option<u64> },
    File {
        size: u64,
        modified: Option<DateTime<Local>>,
    },
}

/// One filesystem entry with display metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    name: String,
    kind: ItemKind,
}

impl Item {
    fn directory(name: &str, count: Option<u64>) -> Self {
        Self {
            name: format!("{}/", name),
            kind: ItemKind::Directory { count },
        }
    }

    fn file(name: &str, metadata: &fs::Metadata) -> Self {
        Self {
            name: name.to_string(),
            kind: ItemKind::File {
                size: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Local>::from),
            },
        }
    }

    /// Entry name; directories end with `/`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    pub fn item_type(&self) -> ItemType {
        match self.kind {
            ItemKind::Directory { .. } => ItemType::Directory,
            ItemKind::File { .. } => ItemType::File,
        }
    }

    /// Byte length for files, entry count for directories (0 when uncounted).
    pub fn size(&self) -> u64 {
        match self.kind {
            ItemKind::Directory { count } => count.unwrap_or(0),
            ItemKind::File { size, .. } => size,
        }
    }

    pub fn size_string(&self) -> String {
        match self.kind {
            ItemKind::Directory { count } => count.map(|c| c.to_string()).unwrap_or_default(),
            ItemKind::File { size, .. } => format_size(size),
        }
    }

    /// Formatted modification time; empty for directories.
    pub fn date(&self) -> String {
        match &self.kind {
            ItemKind::Directory { .. } => String::new(),
            ItemKind::File { modified, .. } => modified
                .map(|t| t.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }
}

impl Serialize for Item {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Item", 5)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("size", &self.size())?;
        state.serialize_field("size_string", &self.size_string())?;
        state.serialize_field("date", &self.date())?;
        state.serialize_field("type", &self.item_type())?;
        state.end()
    }
}

/// Items for one queried path. Index 0 is the path itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    items: Vec<Item>,
}

impl Listing {
    pub fn root(&self) -> Option<&Item> {
        self.items.first()
    }

    /// Immediate children of a directory root. Always empty for files.
    pub fn children(&self) -> &[Item] {
        self.items.get(1..).unwrap_or(&[])
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// An empty listing means the path does not exist.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// List `path` one level deep.
///
/// With `count_files`, each child directory reports how many files live
/// anywhere beneath it. The root entry always reports its immediate child
/// count. Children are sorted by name. Any read error aborts the listing.
pub fn list(path: &Path, count_files: bool) -> Result<Listing, FileServerError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        // A path below a regular file does not exist either.
        Err(err)
            if matches!(
                err.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
            ) =>
        {
            debug!("Nothing to list at {}", path.display());
            return Ok(Listing::default());
        }
        Err(err) => return Err(err.into()),
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    if !metadata.is_dir() {
        return Ok(Listing {
            items: vec![Item::file(&name, &metadata)],
        });
    }

    let mut entries = fs::read_dir(path)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut items = Vec::with_capacity(entries.len() + 1);
    items.push(Item::directory(&name, Some(entries.len() as u64)));

    for entry in entries {
        let entry_path = entry.path();
        let entry_name = entry.file_name().to_string_lossy().to_string();
        let metadata = entry_metadata(&entry)?;

        let item = if metadata.is_dir() {
            let count = if count_files {
                Some(count_nested_files(&entry_path)?)
            } else {
                None
            };
            Item::directory(&entry_name, count)
        } else {
            Item::file(&entry_name, &metadata)
        };

        items.push(item);
    }

    debug!(
        "Listed {} with {} entries (count_files: {})",
        path.display(),
        items.len() - 1,
        count_files
    );

    Ok(Listing { items })
}

/// Metadata following symlinks; dangling links fall back to the link itself.
fn entry_metadata(entry: &fs::DirEntry) -> io::Result<fs::Metadata> {
    match fs::metadata(entry.path()) {
        Ok(metadata) => Ok(metadata),
        Err(err) if err.kind() == io::ErrorKind::NotFound => entry.metadata(),
        Err(err) => Err(err),
    }
}

/// Count every non-directory entry under `dir`, at any depth.
///
/// Symlinks are never followed, including `dir` itself, so a linked
/// directory counts as empty and nothing outside the tree is walked.
fn count_nested_files(dir: &Path) -> Result<u64, FileServerError> {
    let mut count = 0;
    for entry in WalkDir::new(dir).follow_root_links(false).min_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::TempDir;

    fn names(listing: &Listing) -> Vec<&str> {
        listing.items().iter().map(Item::name).collect()
    }

    /// dir/{a, b, c/{x, y, deep/z}}
    fn sample_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::write(root.join("a"), "aaaa").unwrap();
        std::fs::write(root.join("b"), "bb").unwrap();
        std::fs::create_dir_all(root.join("c/deep")).unwrap();
        std::fs::write(root.join("c/x"), "x").unwrap();
        std::fs::write(root.join("c/y"), "y").unwrap();
        std::fs::write(root.join("c/deep/z"), "z").unwrap();
        temp_dir
    }

    #[test]
    fn test_list_directory() {
        let temp_dir = sample_tree();

        let listing = list(temp_dir.path(), false).unwrap();

        assert_eq!(listing.len(), 4);
        let root = listing.root().unwrap();
        assert_eq!(root.item_type(), ItemType::Directory);
        assert_eq!(root.size(), 3);
        assert_eq!(root.size_string(), "3");
        assert_eq!(root.date(), "");
        assert!(root.name().ends_with('/'));
        assert_eq!(&names(&listing)[1..], ["a", "b", "c/"]);
    }

    #[test]
    fn test_list_children_metadata() {
        let temp_dir = sample_tree();

        let listing = list(temp_dir.path(), false).unwrap();
        let children = listing.children();

        assert_eq!(children[0].item_type(), ItemType::File);
        assert_eq!(children[0].size(), 4);
        assert_eq!(children[0].size_string(), "4 Bytes");
        assert!(NaiveDateTime::parse_from_str(&children[0].date(), DATE_FORMAT).is_ok());

        assert_eq!(children[2].item_type(), ItemType::Directory);
        assert_eq!(children[2].size(), 0);
        assert_eq!(children[2].size_string(), "");
        assert_eq!(children[2].date(), "");
    }

    #[test]
    fn test_list_counts_nested_files() {
        let temp_dir = sample_tree();

        let listing = list(temp_dir.path(), true).unwrap();

        let root = listing.root().unwrap();
        assert_eq!(root.size(), 3);

        let dir = &listing.children()[2];
        assert_eq!(dir.name(), "c/");
        assert_eq!(dir.size(), 3);
        assert_eq!(dir.size_string(), "3");

        // Children are never expanded.
        assert_eq!(listing.len(), 4);
    }

    #[test]
    fn test_list_count_mode_on_subdirectory() {
        let temp_dir = sample_tree();

        let listing = list(&temp_dir.path().join("c"), true).unwrap();

        assert_eq!(names(&listing), ["c/", "deep/", "x", "y"]);
        assert_eq!(listing.root().unwrap().size(), 3);
        assert_eq!(listing.children()[0].size(), 1);
    }

    #[test]
    fn test_list_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f.bin");
        std::fs::write(&file, vec![0u8; 1536]).unwrap();

        for count_files in [false, true] {
            let listing = list(&file, count_files).unwrap();
            assert_eq!(listing.len(), 1);
            assert!(listing.children().is_empty());

            let item = listing.root().unwrap();
            assert_eq!(item.name(), "f.bin");
            assert_eq!(item.item_type(), ItemType::File);
            assert_eq!(item.size(), 1536);
            assert_eq!(item.size_string(), "1.50 KB");
        }
    }

    #[test]
    fn test_list_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let listing = list(temp_dir.path(), true).unwrap();

        assert_eq!(listing.len(), 1);
        assert_eq!(listing.root().unwrap().size(), 0);
        assert_eq!(listing.root().unwrap().size_string(), "0");
    }

    #[test]
    fn test_list_missing_path_is_empty() {
        let temp_dir = TempDir::new().unwrap();

        let listing = list(&temp_dir.path().join("missing"), false).unwrap();

        assert!(listing.is_empty());
        assert!(listing.root().is_none());
        assert!(listing.children().is_empty());
    }

    #[test]
    fn test_list_is_idempotent() {
        let temp_dir = sample_tree();

        let first = list(temp_dir.path(), true).unwrap();
        let second = list(temp_dir.path(), true).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_list_below_a_file_is_empty() {
        let temp_dir = sample_tree();

        assert!(list(&temp_dir.path().join("a/missing"), false)
            .unwrap()
            .is_empty());
        assert!(list(&temp_dir.path().join("a/x/y"), true)
            .unwrap()
            .is_empty());
    }

    /// Strip all permissions from `dir`. Returns false when the process can
    /// still read it anyway (running as root).
    #[cfg(unix)]
    fn lock_dir(dir: &Path) -> bool {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o000)).unwrap();
        std::fs::read_dir(dir).is_err()
    }

    #[cfg(unix)]
    fn unlock_dir(dir: &Path) {
        use std::os::unix::fs::PermissionsExt;

        std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_list_unreadable_subtree_aborts() {
        let temp_dir = sample_tree();
        let locked = temp_dir.path().join("c/deep");
        if !lock_dir(&locked) {
            unlock_dir(&locked);
            return;
        }

        let counted = list(temp_dir.path(), true);
        let direct = list(&locked, false);
        unlock_dir(&locked);

        assert!(matches!(counted, Err(FileServerError::Walk(_))));
        assert!(matches!(direct, Err(FileServerError::Walk(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_count_does_not_follow_symlinked_directory() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let outside = sample_tree();
        symlink(outside.path(), temp_dir.path().join("linked")).unwrap();

        let listing = list(temp_dir.path(), true).unwrap();

        let linked = &listing.children()[0];
        assert_eq!(linked.name(), "linked/");
        assert_eq!(linked.item_type(), ItemType::Directory);
        assert_eq!(linked.size(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_dangling_symlink_is_a_file() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        symlink(temp_dir.path().join("gone"), temp_dir.path().join("link")).unwrap();

        let listing = list(temp_dir.path(), false).unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing.children()[0].item_type(), ItemType::File);
    }

    #[test]
    fn test_item_serialization_shape() {
        let temp_dir = sample_tree();
        let listing = list(temp_dir.path(), false).unwrap();

        let root = serde_json::to_value(listing.root().unwrap()).unwrap();
        assert_eq!(root["type"], 0);
        assert_eq!(root["size"], 3);
        assert_eq!(root["size_string"], "3");
        assert_eq!(root["date"], "");

        let file = serde_json::to_value(&listing.children()[0]).unwrap();
        assert_eq!(file["name"], "a");
        assert_eq!(file["type"], 1);
        assert_eq!(file["size"], 4);
        assert_eq!(file["size_string"], "4 Bytes");
        assert!(file["date"].is_string());
    }
}
