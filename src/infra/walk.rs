//! Filepath: src/infra/walk.rs
//! Gitignore-aware discovery of problem files.
//! - Respects .gitignore, .git/info/exclude, and global gitignore
//! - Extra ignore globs (early prune + late filter)
//! - Extension filter (default: "pg")
//! - Optional hidden file policy, following symlinks, and max depth
//! - Deterministic ordering, deduplicated across roots
//!
//! Backed by ripgrep's `ignore` crate and `globset`.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::{DirEntry, WalkBuilder};
use tracing::{debug, warn};

/// Gitignore-aware walker with extra ignore globs and an extension filter.
/// Extra globs are applied in two places:
///   1) Early: prune directories during traversal (filter_entry).
///   2) Late: filter out files that still slipped through.
pub struct FileWalker
{
    /// Compiled set of additional ignore patterns
    ignore_patterns: GlobSet,

    /// Lower-cased extensions (without the dot) to keep; empty keeps all
    extensions: Vec<String>,

    /// Include hidden (dot) files; default true
    include_hidden: bool,

    /// Follow symbolic links; default false
    follow_symlinks: bool,

    /// Maximum recursion depth; default None (unbounded)
    max_depth: Option<usize>,
}

impl FileWalker
{
    /// Build a walker with additional ignore patterns (e.g., ".git/**",
    /// "**/Library/**"). Patterns match on (relative) paths.
    pub fn new(additional_ignores: &[String]) -> Result<Self>
    {
        let mut builder = GlobSetBuilder::new();

        for pattern in additional_ignores
        {
            builder.add(Glob::new(pattern)?);
        }

        Ok(Self {
            ignore_patterns: builder.build()?,
            extensions: vec!["pg".to_string()],
            include_hidden: true,
            follow_symlinks: false,
            max_depth: None,
        })
    }

    /// Restrict to files whose extension matches one of `exts`
    /// (case-insensitive, leading dots tolerated). An empty list keeps all files.
    pub fn with_extensions(
        mut self,
        exts: &[String],
    ) -> Self
    {
        self.extensions = exts
            .iter()
            .map(|e| {
                e.trim_start_matches('.')
                    .to_ascii_lowercase()
            })
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Include or exclude hidden files (dotfiles).
    pub fn with_include_hidden(
        mut self,
        include_hidden: bool,
    ) -> Self
    {
        self.include_hidden = include_hidden;
        self
    }

    /// Follow or skip symbolic links (default false).
    pub fn with_follow_symlinks(
        mut self,
        follow: bool,
    ) -> Self
    {
        self.follow_symlinks = follow;
        self
    }

    /// Limit recursion depth (`None` = unbounded).
    pub fn with_max_depth(
        mut self,
        depth: Option<usize>,
    ) -> Self
    {
        self.max_depth = depth;
        self
    }

    fn extension_matches(
        &self,
        path: &Path,
    ) -> bool
    {
        if self
            .extensions
            .is_empty()
        {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .is_some_and(|e| {
                self.extensions
                    .contains(&e)
            })
    }

    /// Internal: construct a configured WalkBuilder for `root`.
    fn build_walk(
        &self,
        root: &Path,
    ) -> WalkBuilder
    {
        let mut b = WalkBuilder::new(root);

        // WalkBuilder::hidden(true) => *skip* dotfiles
        b.hidden(!self.include_hidden);

        // Respect .ignore/.gitignore/.git/info/exclude and global gitignore
        b.git_ignore(true);
        b.git_global(true);
        b.git_exclude(true);

        b.follow_links(self.follow_symlinks);
        b.max_depth(self.max_depth);

        // Early directory pruning using extra ignores.
        // Globs see paths relative to `root`, and the root itself is never
        // pruned, so an ignored ancestor directory cannot hide the whole walk.
        let extra = self
            .ignore_patterns
            .clone();
        let base = root.to_path_buf();
        b.filter_entry(move |ent: &DirEntry| {
            if ent.depth() == 0
            {
                return true;
            }
            let is_dir = ent
                .file_type()
                .map(|ft| ft.is_dir())
                .unwrap_or(false);

            // Never descend into VCS metadata
            if is_dir && ent.file_name() == ".git"
            {
                return false;
            }
            let rel = ent
                .path()
                .strip_prefix(&base)
                .unwrap_or(ent.path());
            !(is_dir && extra.is_match(rel))
        });

        b
    }

    /// Traverse files under `root`, respecting ignore rules, extra globs and
    /// the extension filter. A root that is itself a file is returned as-is
    /// when its extension matches. Returns a **sorted** list.
    pub fn walk_files<P: AsRef<Path>>(
        &self,
        root: P,
    ) -> Vec<PathBuf>
    {
        let root_path = root.as_ref();

        if root_path.is_file()
        {
            return if self.extension_matches(root_path)
            {
                vec![root_path.to_path_buf()]
            }
            else
            {
                Vec::new()
            };
        }

        let walker = self
            .build_walk(root_path)
            .build();

        let mut out: Vec<PathBuf> = walker
            .filter_map(|res| match res
            {
                Ok(entry) => Some(entry),
                Err(err) =>
                {
                    warn!(error = %err, "skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| {
                entry
                    .file_type()
                    .is_some_and(|ft| ft.is_file())
            })
            .map(|entry| entry.into_path())
            .filter(|abs| self.extension_matches(abs))
            // Late file-level extra ignore filtering using RELATIVE path
            .filter(|abs| {
                let rel = abs
                    .strip_prefix(root_path)
                    .unwrap_or(abs);
                !self
                    .ignore_patterns
                    .is_match(rel)
            })
            .collect();

        out.sort();
        debug!(root = %root_path.display(), files = out.len(), "walked root");

        out
    }

    /// Walk several roots; missing roots are skipped with a warning.
    /// The union is sorted and deduplicated.
    pub fn walk_roots(
        &self,
        roots: &[PathBuf],
    ) -> Vec<PathBuf>
    {
        let mut all = BTreeSet::new();
        for root in roots
        {
            if !root.exists()
            {
                warn!(root = %root.display(), "root does not exist; skipping");
                continue;
            }
            all.extend(self.walk_files(root));
        }
        all.into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use assert_fs::TempDir;

    use super::*;

    /// Create a file with parent dirs as needed
    fn write_file(
        root: &Path,
        rel: &str,
        contents: &str,
    ) -> Result<()>
    {
        let path = root.join(rel);
        if let Some(parent) = path.parent()
        {
            std::fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    fn relative(
        root: &Path,
        files: Vec<PathBuf>,
    ) -> Vec<PathBuf>
    {
        files
            .into_iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_path_buf()
            })
            .collect()
    }

    #[test]
    fn test_keeps_only_pg_files_sorted() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, "b/second.pg", "DOCUMENT();")?;
        write_file(root, "a/first.PG", "DOCUMENT();")?;
        write_file(root, "a/notes.txt", "not a problem")?;
        write_file(root, "macros/PGcourse.pl", "1;")?;

        let walker = FileWalker::new(&[])?;
        let files = relative(root, walker.walk_files(root));

        assert_eq!(
            files,
            vec![PathBuf::from("a/first.PG"), PathBuf::from("b/second.pg")]
        );
        Ok(())
    }

    #[test]
    fn test_custom_extensions_and_empty_filter() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, "x.pg", "")?;
        write_file(root, "y.pl", "")?;

        let walker = FileWalker::new(&[])?.with_extensions(&[".PL".to_string()]);
        assert_eq!(relative(root, walker.walk_files(root)), vec![PathBuf::from("y.pl")]);

        let walker = FileWalker::new(&[])?.with_extensions(&[]);
        assert_eq!(walker.walk_files(root).len(), 2);
        Ok(())
    }

    #[test]
    fn test_additional_globs_prune_and_filter() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, "Library/old/a.pg", "")?;
        write_file(root, "Contrib/tmp/b.pg", "")?;
        write_file(root, "Contrib/keep/c.pg", "")?;

        let ignores = vec!["**/Library/**".to_string(), "**/tmp/**".to_string()];
        let walker = FileWalker::new(&ignores)?;
        let files = relative(root, walker.walk_files(root));

        assert_eq!(files, vec![PathBuf::from("Contrib/keep/c.pg")]);
        Ok(())
    }

    #[test]
    fn test_root_under_ignored_ancestor_is_still_walked() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir
            .path()
            .join("target/OPL");

        write_file(&root, "Algebra/a.pg", "")?;
        write_file(&root, "Algebra/target/skip.pg", "")?;

        let ignores = crate::infra::config::Config::default().ignore_patterns;
        let walker = FileWalker::new(&ignores)?;
        let files = relative(&root, walker.walk_roots(&[root.clone()]));

        assert_eq!(files, vec![PathBuf::from("Algebra/a.pg")]);
        Ok(())
    }

    #[test]
    fn test_hidden_files_included_unless_disabled() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, ".hidden.pg", "h")?;
        write_file(root, "visible.pg", "v")?;

        let walker = FileWalker::new(&[])?;
        let files = relative(root, walker.walk_files(root));
        assert!(files.contains(&PathBuf::from(".hidden.pg")));

        let walker = FileWalker::new(&[])?.with_include_hidden(false);
        let files = relative(root, walker.walk_files(root));
        assert!(!files.contains(&PathBuf::from(".hidden.pg")));
        assert!(files.contains(&PathBuf::from("visible.pg")));
        Ok(())
    }

    #[test]
    fn test_walk_roots_dedupes_and_accepts_file_roots() -> Result<()>
    {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        write_file(root, "set/one.pg", "")?;
        write_file(root, "set/two.pg", "")?;

        let walker = FileWalker::new(&[])?;
        let roots = vec![
            root.join("set"),
            root.join("set/one.pg"),
            root.join("missing"),
        ];
        let files = relative(root, walker.walk_roots(&roots));

        assert_eq!(
            files,
            vec![PathBuf::from("set/one.pg"), PathBuf::from("set/two.pg")]
        );
        Ok(())
    }

    #[test]
    fn test_max_depth() -> Result<()>
    {
        let tmp = TempDir::new()?;
        let root = tmp.path();

        write_file(root, "a.pg", "a")?;
        write_file(root, "sub/b.pg", "b")?;

        let walker = FileWalker::new(&[])?.with_max_depth(Some(1));
        let files = relative(root, walker.walk_files(root));
        assert!(files.contains(&PathBuf::from("a.pg")));
        assert!(!files.contains(&PathBuf::from("sub/b.pg")));
        Ok(())
    }
}
