//! Glob matcher deciding whether a file belongs to a bundless target.
//!
//! Patterns are compiled with `globset` defaults, so `*` also crosses path
//! separators: `src/a/*` excludes everything below `src/a`. A trailing
//! `/**` does not match the directory itself, which is why ignores ending in
//! `/**` also register the bare directory.
//!
//! Entries starting with `.` below a directory input (`src/.eslintrc.js`,
//! `src/.cache/a.ts`) are never matched. Dot segments spelled out in the
//! input itself (`.storybook`) are fine.

use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher};
use path_clean::PathClean;
use tracing::trace;

use crate::{Error, Result};

const RECURSIVE_SUFFIX: &str = "/**";

/// What a target input points at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Directory,
    File,
}

impl InputKind {
    /// Inspect `path` on disk without following a trailing symlink.
    pub fn detect(path: &Path) -> Result<Self> {
        let metadata = fs::symlink_metadata(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Error::MissingInput {
                    path: path.to_path_buf(),
                }
            } else {
                Error::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Ok(if metadata.is_dir() {
            Self::Directory
        } else {
            Self::File
        })
    }
}

/// Positive input glob plus ignore globs of one target.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    matcher: GlobMatcher,
    ignores: Vec<GlobMatcher>,
    /// Components of a directory input; `None` for file inputs
    input_depth: Option<usize>,
}

impl PathMatcher {
    /// Build a matcher for `input`, resolved against `root` to find out
    /// whether it is a directory.
    pub fn new(root: &Path, input: &str, ignores: &[String]) -> Result<Self> {
        let kind = InputKind::detect(&root.join(input))?;
        Self::with_kind(input, kind, ignores)
    }

    /// Build a matcher for an input of known kind.
    ///
    /// Directory inputs match every descendant; file inputs match only
    /// themselves. The input is taken literally, ignores are globs.
    pub fn with_kind(input: &str, kind: InputKind, ignores: &[String]) -> Result<Self> {
        let input = clean(input);
        let literal = globset::escape(&input);
        let pattern = match kind {
            InputKind::Directory if input == "." => "**".to_string(),
            InputKind::Directory => format!("{literal}{RECURSIVE_SUFFIX}"),
            InputKind::File => literal,
        };
        let input_depth = match kind {
            InputKind::Directory => Some(normal_components(Path::new(&input)).count()),
            InputKind::File => None,
        };

        let mut ignore_matchers = Vec::with_capacity(ignores.len());
        for ignore in ignores {
            ignore_matchers.push(compile(ignore)?);

            if ignore.ends_with(RECURSIVE_SUFFIX) {
                let mut dir = ignore.as_str();
                while let Some(stripped) = dir.strip_suffix(RECURSIVE_SUFFIX) {
                    dir = stripped;
                }
                if !dir.is_empty() {
                    ignore_matchers.push(compile(dir)?);
                }
            }
        }

        Ok(Self {
            matcher: compile(&pattern)?,
            ignores: ignore_matchers,
            input_depth,
        })
    }

    /// The positive pattern, e.g. `src/**`
    pub fn pattern(&self) -> &str {
        self.matcher.glob().glob()
    }

    pub fn ignore_patterns(&self) -> impl Iterator<Item = &str> {
        self.ignores.iter().map(|m| m.glob().glob())
    }

    /// True when `path` matches the input and none of the ignores.
    pub fn is_match(&self, path: impl AsRef<Path>) -> bool {
        let path: PathBuf = path.as_ref().to_path_buf().clean();
        let matched = self.matcher.is_match(&path)
            && !self.is_dot_entry(&path)
            && !self.ignores.iter().any(|m| m.is_match(&path));

        trace!(pattern = self.pattern(), path = %path.display(), matched, "path matcher");
        matched
    }

    fn is_dot_entry(&self, path: &Path) -> bool {
        let Some(depth) = self.input_depth else {
            return false;
        };
        normal_components(path)
            .skip(depth)
            .any(|name| name.to_string_lossy().starts_with('.'))
    }
}

fn normal_components(path: &Path) -> impl Iterator<Item = &std::ffi::OsStr> {
    path.components().filter_map(|component| match component {
        Component::Normal(name) => Some(name),
        _ => None,
    })
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|glob| glob.compile_matcher())
        .map_err(|source| Error::InvalidMatcherPattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// `./src/` and `src` name the same input.
pub(crate) fn clean(input: &str) -> String {
    PathBuf::from(input).clean().to_string_lossy().into_owned()
}
