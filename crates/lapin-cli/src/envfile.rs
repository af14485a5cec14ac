//! Minimal `KEY=VALUE` configuration-file parsing.
//!
//! The deployment config is a flat env file; blank lines and `#` comments
//! are skipped, everything after the first `=` belongs to the value.

use std::collections::BTreeMap;
use std::io;
use std::path::Path;

pub fn parse(content: &str) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = trimmed.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                vars.insert(key.to_string(), value.trim().to_string());
            }
        }
    }

    vars
}

pub fn load(path: &Path) -> io::Result<BTreeMap<String, String>> {
    Ok(parse(&std::fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_values_with_equals_signs() {
        let vars = parse("KEY=abc=def\n");
        assert_eq!(vars["KEY"], "abc=def");
    }

    #[test]
    fn skips_comments_and_blanks() {
        let vars = parse("# comment\n\n  \nA=1\n  # indented comment\nB=2\n");
        assert_eq!(vars.len(), 2);
        assert_eq!(vars["A"], "1");
        assert_eq!(vars["B"], "2");
    }

    #[test]
    fn trims_whitespace_around_key_and_value() {
        let vars = parse("  SPACED  =  value  \n");
        assert_eq!(vars["SPACED"], "value");
    }

    #[test]
    fn ignores_lines_without_separator() {
        let vars = parse("NOT A VAR\nOK=yes\n=no-key\n");
        assert_eq!(vars.len(), 1);
        assert_eq!(vars["OK"], "yes");
    }

    #[test]
    fn load_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "STORAGE_URL=https://forms.example.com\n").unwrap();

        let vars = load(&path).unwrap();
        assert_eq!(vars["STORAGE_URL"], "https://forms.example.com");
    }
}
