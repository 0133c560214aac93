// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path information for files that dotf needs to interact
//! with. Everything here is purely lexical, i.e., the file system is never
//! consulted.

use std::path::{Component, Path, PathBuf};

/// Name of dotf configuration file in user's home directory.
pub const CONFIG_FILE_NAME: &str = ".dotf";

/// Lexically clean up a path.
///
/// Drops `.` components, and resolves `..` against the component before it.
/// A `..` that would climb above the root of an absolute path is dropped. A
/// `..` at the front of a relative path is kept. An empty result becomes `.`.
pub fn clean_path(path: impl AsRef<Path>) -> PathBuf {
    let mut cleaned = PathBuf::new();
    let mut depth = 0usize;

    for component in path.as_ref().components() {
        match component {
            Component::Prefix(_) | Component::RootDir => cleaned.push(component.as_os_str()),
            Component::CurDir => continue,
            Component::ParentDir if depth > 0 => {
                cleaned.pop();
                depth -= 1;
            }
            Component::ParentDir if cleaned.has_root() => continue,
            Component::ParentDir => cleaned.push(".."),
            Component::Normal(name) => {
                cleaned.push(name);
                depth += 1;
            }
        }
    }

    if cleaned.as_os_str().is_empty() {
        cleaned.push(".");
    }

    cleaned
}

/// Resolve location of tracked file inside of dotfile repository.
///
/// The path in repo is always treated as relative to the repository root,
/// even if it starts with a separator.
pub fn repo_file_path(repo: impl AsRef<Path>, path_in_repo: impl AsRef<Path>) -> PathBuf {
    let relative = path_in_repo
        .as_ref()
        .components()
        .filter(|component| !matches!(component, Component::Prefix(_) | Component::RootDir))
        .collect::<PathBuf>();

    clean_path(repo.as_ref().join(relative))
}

/// Resolve location of dotf configuration file from home directory.
pub fn config_file_path(home: impl AsRef<Path>) -> PathBuf {
    clean_path(home.as_ref().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use simple_test_case::test_case;

    #[test_case("/home/blah", "/home/blah"; "already clean")]
    #[test_case("/home//blah/", "/home/blah"; "repeated separators")]
    #[test_case("/home/./blah", "/home/blah"; "current dir")]
    #[test_case("/home/foo/../blah", "/home/blah"; "parent dir")]
    #[test_case("/../blah", "/blah"; "parent of root")]
    #[test_case("foo/../../blah", "../blah"; "relative parent")]
    #[test_case("foo/..", "."; "collapses to nothing")]
    #[test]
    fn clean_path_lexically(input: &str, expect: &str) {
        pretty_assertions::assert_eq!(clean_path(input), PathBuf::from(expect));
    }

    #[test_case("/r", "a.txt", "/r/a.txt"; "plain")]
    #[test_case("/r/", "/a.txt", "/r/a.txt"; "leading separator")]
    #[test_case("/r", "./vim/../vimrc", "/r/vimrc"; "unclean")]
    #[test]
    fn repo_file_path_is_relative_to_repo(repo: &str, file: &str, expect: &str) {
        pretty_assertions::assert_eq!(repo_file_path(repo, file), PathBuf::from(expect));
    }

    #[test]
    fn config_file_path_in_home() {
        assert_eq!(config_file_path("/home/"), PathBuf::from("/home/.dotf"));
    }
}
