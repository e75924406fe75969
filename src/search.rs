use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::dispatch::inspect;
use crate::error::Diagnostic;
use crate::types::{CodePoint, FontFile, FontIdentity};

/// Directories searched when none are configured: the system font directory
/// and the two per-user locations.
pub fn default_directories() -> Vec<PathBuf> {
    let mut directories = vec![PathBuf::from("/usr/share/fonts")];
    if let Some(home) = dirs::home_dir() {
        directories.push(home.join(".local/share/fonts"));
        directories.push(home.join(".fonts"));
    }
    directories
}

/// Builder for configuring a font search.
///
/// # Examples
///
/// ```no_run
/// use fontsearch::FontSearch;
///
/// let search = FontSearch::builder()
///     .directory("/usr/share/fonts/truetype")
///     .follow_symlinks(false)
///     .build();
/// for identity in search.search('ß' as u32, |d| eprintln!("{}", d)) {
///     println!("{}", identity);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FontSearchBuilder {
    directories: Vec<PathBuf>,
    follow_symlinks: bool,
}

impl Default for FontSearchBuilder {
    fn default() -> Self {
        FontSearchBuilder {
            directories: Vec::new(),
            follow_symlinks: true,
        }
    }
}

impl FontSearchBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory to search recursively.
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directories.push(directory.into());
        self
    }

    /// Add several directories to search recursively.
    pub fn directories<I, P>(mut self, directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.directories
            .extend(directories.into_iter().map(Into::into));
        self
    }

    /// Whether to descend into symlinked directories. Defaults to `true`.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Build the search configuration. Without any configured directory the
    /// [`default_directories`] are used.
    pub fn build(self) -> FontSearch {
        let directories = if self.directories.is_empty() {
            default_directories()
        } else {
            self.directories
        };
        FontSearch {
            directories,
            follow_symlinks: self.follow_symlinks,
        }
    }
}

/// Searches font directories for fonts supporting a code point.
///
/// # Examples
///
/// ```no_run
/// use std::collections::BTreeSet;
///
/// let fonts: BTreeSet<_> = fontsearch::FontSearch::default()
///     .search(0x1F600, |_| {})
///     .collect();
/// ```
#[derive(Debug, Clone)]
pub struct FontSearch {
    directories: Vec<PathBuf>,
    follow_symlinks: bool,
}

impl Default for FontSearch {
    fn default() -> Self {
        FontSearchBuilder::new().build()
    }
}

impl FontSearch {
    /// Create a builder for configuring the search.
    pub fn builder() -> FontSearchBuilder {
        FontSearchBuilder::new()
    }

    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Every recognized font file below the configured directories.
    pub fn font_files(&self) -> FontFiles {
        FontFiles::new(self.directories.clone(), self.follow_symlinks)
    }

    /// Lazily yields the identity of every face supporting `code_point`.
    ///
    /// Files are read one at a time as the iterator advances. Diagnostics are
    /// passed to `on_diagnostic` as they occur. Results are neither
    /// deduplicated nor sorted.
    pub fn search<F>(&self, code_point: CodePoint, on_diagnostic: F) -> Search<FontFiles, F>
    where
        F: FnMut(Diagnostic),
    {
        search_files(self.font_files(), code_point, on_diagnostic)
    }
}

/// Runs a search over an explicit sequence of font files.
pub fn search_files<I, F>(files: I, code_point: CodePoint, on_diagnostic: F) -> Search<I::IntoIter, F>
where
    I: IntoIterator<Item = FontFile>,
    F: FnMut(Diagnostic),
{
    Search {
        files: files.into_iter(),
        code_point,
        pending: Vec::new().into_iter(),
        on_diagnostic,
    }
}

/// Iterator returned by [`FontSearch::search`] and [`search_files`].
pub struct Search<I, F> {
    files: I,
    code_point: CodePoint,
    pending: std::vec::IntoIter<FontIdentity>,
    on_diagnostic: F,
}

impl<I, F> Iterator for Search<I, F>
where
    I: Iterator<Item = FontFile>,
    F: FnMut(Diagnostic),
{
    type Item = FontIdentity;

    fn next(&mut self) -> Option<FontIdentity> {
        loop {
            if let Some(identity) = self.pending.next() {
                return Some(identity);
            }
            let file = self.files.next()?;
            let report = inspect(&file, self.code_point);
            if let Some(diagnostic) = report.diagnostic {
                (self.on_diagnostic)(diagnostic);
            }
            self.pending = report.identities.into_iter();
        }
    }
}

/// Recursive walk over font directories, yielding classified font files.
///
/// Each directory is visited once even when reachable through several
/// symlinks. Directories that cannot be read are skipped.
pub struct FontFiles {
    pending: Vec<PathBuf>,
    entries: Option<fs::ReadDir>,
    visited: HashSet<PathBuf>,
    follow_symlinks: bool,
}

impl FontFiles {
    pub fn new(mut directories: Vec<PathBuf>, follow_symlinks: bool) -> FontFiles {
        // Popped from the back, so reverse to keep the configured order.
        directories.reverse();
        FontFiles {
            pending: directories,
            entries: None,
            visited: HashSet::new(),
            follow_symlinks,
        }
    }

    fn open(&mut self, directory: &Path) {
        let canonical = match fs::canonicalize(directory) {
            Ok(canonical) => canonical,
            Err(e) => {
                debug!("skipping {}: {}", directory.display(), e);
                return;
            }
        };
        if !self.visited.insert(canonical) {
            debug!("already visited {}", directory.display());
            return;
        }
        match fs::read_dir(directory) {
            Ok(entries) => self.entries = Some(entries),
            Err(e) => debug!("cannot read {}: {}", directory.display(), e),
        }
    }
}

impl Iterator for FontFiles {
    type Item = FontFile;

    fn next(&mut self) -> Option<FontFile> {
        loop {
            let entry = match self.entries.as_mut().map(Iterator::next) {
                Some(Some(Ok(entry))) => entry,
                Some(Some(Err(e))) => {
                    debug!("directory entry error: {}", e);
                    continue;
                }
                Some(None) => {
                    self.entries = None;
                    continue;
                }
                None => {
                    let directory = self.pending.pop()?;
                    self.open(&directory);
                    continue;
                }
            };
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let is_dir = if file_type.is_symlink() {
                match fs::metadata(&path) {
                    Ok(target) if target.is_dir() => {
                        if !self.follow_symlinks {
                            continue;
                        }
                        true
                    }
                    Ok(_) => false,
                    Err(e) => {
                        debug!("dangling symlink {}: {}", path.display(), e);
                        continue;
                    }
                }
            } else {
                file_type.is_dir()
            };
            if is_dir {
                self.pending.push(path);
            } else if let Some(file) = FontFile::from_path(path) {
                return Some(file);
            }
        }
    }
}
