//! Line-oriented `key=value` format parser.
//!
//! Used for per-record overlay files and for the file-name alias table:
//! - one pair per line, split at the first `=`
//! - blank lines and lines without `=` are ignored
//! - keys and values are trimmed; later duplicates override earlier ones

use std::collections::BTreeMap;
use std::path::Path;

use harmonizer_shared::{HarmonizerError, Result};

/// Parse `key=value` lines into an ordered map.
pub fn parse_key_values(content: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        map.insert(key.to_string(), value.trim().to_string());
    }

    map
}

/// Read and parse a `key=value` file.
pub fn read_key_values(path: &Path) -> Result<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| HarmonizerError::io(path, e))?;
    Ok(parse_key_values(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_pairs() {
        let map = parse_key_values("doi=10.1553/0x0001e5b0\nvaw_PND=116000996\n");
        assert_eq!(map.len(), 2);
        assert_eq!(map["doi"], "10.1553/0x0001e5b0");
        assert_eq!(map["vaw_PND"], "116000996");
    }

    #[test]
    fn splits_on_first_equals_only() {
        let map = parse_key_values("oebl_Biographie=files/a=b.pdf");
        assert_eq!(map["oebl_Biographie"], "files/a=b.pdf");
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let map = parse_key_values("\n   \n# comment without separator\n=orphan\ndoi = 10.1/x  \r\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map["doi"], "10.1/x");
    }

    #[test]
    fn later_duplicates_win() {
        let map = parse_key_values("doi=a\ndoi=b");
        assert_eq!(map["doi"], "b");
    }

    #[test]
    fn empty_value_is_kept() {
        let map = parse_key_values("oebl_Geschlecht=");
        assert_eq!(map.get("oebl_Geschlecht").map(String::as_str), Some(""));
    }
}
