//! File utility functions for listing and filtering files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Matches a file name against a shell-style wildcard pattern.
///
/// Supports `*` (any run of characters, including none) and `?` (exactly one
/// character). Matching is case-insensitive so `*.jpg` also picks up `.JPG`
/// files written by scanner software.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().flat_map(char::to_lowercase).collect();
    let name: Vec<char> = name.chars().flat_map(char::to_lowercase).collect();

    let (mut p, mut n) = (0usize, 0usize);
    // Position of the last `*` seen and the name index it was tried against.
    let mut backtrack: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p).copied() {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match backtrack {
                Some((star_p, star_n)) => {
                    p = star_p + 1;
                    n = star_n + 1;
                    backtrack = Some((star_p, star_n + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

/// Returns paths to all regular files in `dir` whose name matches `pattern`,
/// sorted by file name.
pub fn files_matching(dir: &Path, pattern: &str) -> io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .is_some_and(|name| wildcard_match(pattern, name))
        })
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_star_and_question_mark() {
        assert!(wildcard_match("*.jpg", "scan_01.jpg"));
        assert!(wildcard_match("*.jpg", "SCAN_01.JPG"));
        assert!(wildcard_match("scan_??.jpg", "scan_01.jpg"));
        assert!(wildcard_match("*", ""));
        assert!(wildcard_match("a*b*c", "aXXbYYc"));

        assert!(!wildcard_match("*.jpg", "scan_01.jpeg"));
        assert!(!wildcard_match("scan_?.jpg", "scan_01.jpg"));
        assert!(!wildcard_match("a*b*c", "aXXbYY"));
    }

    #[test]
    fn wildcard_handles_non_ascii_names() {
        assert!(wildcard_match("*.jpg", "葉っぱ_01.jpg"));
        assert!(wildcard_match("?lätter.jpg", "Blätter.jpg"));
    }

    #[test]
    fn files_matching_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.jpg", "notes.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("dir.jpg")).unwrap();

        let files = files_matching(dir.path(), "*.jpg").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();

        assert_eq!(names, vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn files_matching_missing_dir_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(files_matching(&dir.path().join("missing"), "*").is_err());
    }
}
