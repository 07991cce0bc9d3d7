//! Invisible character stripping.
//!
//! Vendor titles and feature bullets regularly carry zero-width spaces,
//! directional marks and stray byte-order marks. They render as nothing but
//! break string comparison and downstream templating, so everything written
//! to the cache passes through here first.

use serde_json::Value;

/// Check whether a character is an invisible control or formatting character.
///
/// Tab, newline and carriage return are kept.
pub fn is_invisible(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}' => true,
        // Soft hyphen, Mongolian vowel separator
        '\u{00AD}' | '\u{180E}' => true,
        // Zero-width space/joiners, LRM, RLM
        '\u{200B}'..='\u{200F}' => true,
        // Bidi embeddings and overrides
        '\u{202A}'..='\u{202E}' => true,
        // Word joiner, invisible operators, bidi isolates
        '\u{2060}'..='\u{2064}' | '\u{2066}'..='\u{2069}' => true,
        '\u{FEFF}' => true,
        _ => false,
    }
}

/// Remove invisible characters from a string.
pub fn strip_invisible(s: &str) -> String {
    s.chars().filter(|c| !is_invisible(*c)).collect()
}

/// Strip invisible characters from every string in a JSON value, keys included.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::String(s) => {
            if s.chars().any(is_invisible) {
                *s = strip_invisible(s);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sanitize_value),
        Value::Object(map) => {
            let dirty_keys: Vec<String> = map
                .keys()
                .filter(|k| k.chars().any(is_invisible))
                .cloned()
                .collect();
            for key in dirty_keys {
                if let Some(v) = map.remove(&key) {
                    map.insert(strip_invisible(&key), v);
                }
            }
            map.values_mut().for_each(sanitize_value);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_invisible() {
        assert_eq!(strip_invisible("電気\u{200B}ケトル"), "電気ケトル");
        assert_eq!(strip_invisible("\u{FEFF}Kettle\u{200E}"), "Kettle");
        assert_eq!(strip_invisible("a\u{202E}b\u{2066}c"), "abc");
        assert_eq!(strip_invisible("line1\nline2\tx"), "line1\nline2\tx");
    }

    #[test]
    fn test_keeps_visible_separators() {
        assert_eq!(strip_invisible("家電・PC　周辺機器"), "家電・PC　周辺機器");
    }

    #[test]
    fn test_sanitize_value_nested() {
        let mut value = json!({
            "title": "\u{200B}Title",
            "features": ["one\u{200D}", "two"],
            "specifications": {"col\u{200B}or": "red\u{FEFF}"},
            "rating": {"count": 3}
        });
        sanitize_value(&mut value);
        assert_eq!(
            value,
            json!({
                "title": "Title",
                "features": ["one", "two"],
                "specifications": {"color": "red"},
                "rating": {"count": 3}
            })
        );
    }
}
