//! Offline view of a persisted dictionary file.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

use crate::dictionary::Dictionary;

/// Load `path` and print its entry count followed by each entry, sorted.
pub fn run(path: &Path, out: &mut impl Write) -> Result<usize> {
    let dictionary = Dictionary::new();
    let count = dictionary
        .load_from_file(path)
        .with_context(|| format!("cannot inspect {}", path.display()))?;

    writeln!(out, "{}: {} word(s)", path.display(), count)?;
    for entry in dictionary.list() {
        writeln!(out, "{}\t{}", entry.word, entry.definition)?;
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn prints_count_and_sorted_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dico.json");
        fs::write(&path, r#"{"zebre": "zebra", "arbre": "tree"}"#).unwrap();

        let mut out = Vec::new();
        assert_eq!(run(&path, &mut out).unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].ends_with(": 2 word(s)"));
        assert_eq!(lines[1], "arbre\ttree");
        assert_eq!(lines[2], "zebre\tzebra");
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = run(&dir.path().join("absent.json"), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("cannot inspect"));
    }
}
