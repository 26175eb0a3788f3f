//! JSON Pointer helpers (RFC 6901)
//!
//! Property keys address schema nodes as `file#pointer`. Segments are escaped
//! with `~0` for `~` and `~1` for `/`; resolution goes through
//! `serde_json::Value::pointer`, which performs the inverse unescaping.

use serde_json::Value;

/// Escape a single reference token
pub fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}

/// Unescape a single reference token
pub fn unescape(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Append an (unescaped) token to a pointer
pub fn append(pointer: &str, token: &str) -> String {
    let mut out = String::with_capacity(pointer.len() + token.len() + 1);
    out.push_str(pointer);
    out.push('/');
    out.push_str(&escape(token));
    out
}

/// Strip an optional leading `#` fragment marker.
///
/// Returns `None` when the remainder is neither empty nor rooted.
fn normalize(pointer: &str) -> Option<&str> {
    let pointer = pointer.strip_prefix('#').unwrap_or(pointer);
    if pointer.is_empty() || pointer.starts_with('/') {
        Some(pointer)
    } else {
        None
    }
}

/// Resolve a pointer against a document
pub fn resolve<'a>(root: &'a Value, pointer: &str) -> Option<&'a Value> {
    root.pointer(normalize(pointer)?)
}

/// Resolve a pointer against a document for mutation
pub fn resolve_mut<'a>(root: &'a mut Value, pointer: &str) -> Option<&'a mut Value> {
    root.pointer_mut(normalize(pointer)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_round_trip() {
        assert_eq!(escape("a/b~c"), "a~1b~0c");
        assert_eq!(unescape("a~1b~0c"), "a/b~c");
        // ~01 must decode to ~1, not /
        assert_eq!(unescape("~01"), "~1");
    }

    #[test]
    fn test_append() {
        assert_eq!(append("", "properties"), "/properties");
        assert_eq!(append("/properties", "a/b"), "/properties/a~1b");
    }

    #[test]
    fn test_resolve() {
        let doc = json!({ "properties": { "a/b~c": { "type": "string" } }, "list": [1, { "x": true }] });
        assert_eq!(resolve(&doc, "/properties/a~1b~0c"), Some(&json!({ "type": "string" })));
        assert_eq!(resolve(&doc, "#/list/1/x"), Some(&json!(true)));
        assert_eq!(resolve(&doc, ""), Some(&doc));
        assert_eq!(resolve(&doc, "properties"), None);
        assert_eq!(resolve(&doc, "/list/7"), None);
    }
}
