// Task output normalization
//
// Tasker does not reliably declare a content type for task output or
// global-variable values: a payload may be JSON, XML, comma-delimited
// text, or a bare scalar. The normalizer sniffs the format by running an
// ordered cascade of independent decoders and returning the first result
// that parses. Decoder failures never escape this module -- the scalar
// caster is the terminal case and cannot fail.
//
// Cascade order is deliberate: JSON validates most strictly (fewest false
// positives), XML has an unambiguous bracket grammar, delimited text is
// permissive enough to "succeed" on almost anything with a comma, and the
// scalar caster accepts everything.

use serde_json::{Map, Value};

/// Decoders tried in priority order by [`normalize`]. Each is a pure
/// function returning `None` when the payload is not its format.
const DECODERS: &[fn(&str) -> Option<Value>] = &[decode_json, decode_xml, decode_delimited];

/// Normalize raw task output into a structured [`Value`].
///
/// With `structured` unset, the text is returned verbatim as a string --
/// no sniffing ("raw passthrough"). Otherwise the decode cascade runs and
/// the first success wins; if nothing matches, the whole text is scalar
/// cast. Exactly one decoder's result is ever returned.
pub fn normalize(text: &str, structured: bool) -> Value {
    if !structured {
        return Value::String(text.to_owned());
    }
    for decode in DECODERS {
        if let Some(value) = decode(text) {
            return value;
        }
    }
    cast(Some(text))
}

/// Cast a single scalar token to its most specific JSON value.
///
/// - `None` and the case-insensitive literal `"null"` become `""`
/// - case-insensitive `"true"` / `"false"` become booleans
/// - digits-only tokens become integers
/// - anything that parses as a finite `f64` becomes a float
/// - everything else is returned as the original string
///
/// A leading sign disqualifies the digits-only check, so `"-5"` comes back
/// as the float `-5.0` rather than an integer. Callers depend on this.
pub fn cast(token: Option<&str>) -> Value {
    let Some(token) = token else {
        return Value::String(String::new());
    };
    let lower = token.to_ascii_lowercase();
    match lower.as_str() {
        "null" => return Value::String(String::new()),
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = token.parse::<u64>() {
            return Value::from(n);
        }
    }
    if let Ok(f) = token.parse::<f64>() {
        // Non-finite floats have no JSON representation; keep the token.
        if let Some(n) = serde_json::Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(token.to_owned())
}

/// Strict JSON parse. Bare scalars (`42`, `true`, `"x"`) count as JSON.
fn decode_json(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Fold an XML document into nested maps.
///
/// Follows the usual XML-to-map conventions: attributes become `"@name"`
/// keys, repeated sibling tags collapse into arrays, and element text
/// becomes the value itself -- or a `"#text"` entry when the element also
/// carries attributes or children. Every leaf text value and attribute is
/// passed through [`cast`] so `"true"` and `"42"` inside XML come out
/// typed instead of stringly.
fn decode_xml(text: &str) -> Option<Value> {
    let doc = roxmltree::Document::parse(text).ok()?;
    let root = doc.root_element();
    let mut out = Map::new();
    out.insert(root.tag_name().name().to_owned(), fold_element(root));
    Some(Value::Object(out))
}

fn fold_element(node: roxmltree::Node<'_, '_>) -> Value {
    let mut map = Map::new();

    for attr in node.attributes() {
        map.insert(format!("@{}", attr.name()), cast(Some(attr.value())));
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            let key = child.tag_name().name().to_owned();
            let value = fold_element(child);
            match map.entry(key) {
                serde_json::map::Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                // Repeated sibling tags become an array.
                serde_json::map::Entry::Occupied(mut slot) => {
                    let existing = slot.get_mut();
                    if let Value::Array(seq) = existing {
                        seq.push(value);
                    } else {
                        let first = existing.take();
                        *existing = Value::Array(vec![first, value]);
                    }
                }
            }
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    let leaf = if text.is_empty() {
        cast(None)
    } else {
        cast(Some(text))
    };

    if map.is_empty() {
        leaf
    } else {
        if !text.is_empty() {
            map.insert("#text".to_owned(), leaf);
        }
        Value::Object(map)
    }
}

/// Decode header-plus-rows delimited text into a column-oriented map.
///
/// The first non-empty line is the comma-delimited header; each later row
/// is split on commas, and each present cell is scalar cast and appended
/// to its column's array in row order. Cells past the header width are
/// dropped, and rows shorter than the header simply leave the missing
/// columns unappended -- ragged columns are accepted, not an error.
///
/// Returns `None` (not delimited text) when no column receives any data,
/// which sends the caller on to the scalar fallback. A single non-empty
/// line is therefore never treated as delimited text.
fn decode_delimited(text: &str) -> Option<Value> {
    let mut lines = text.trim().lines().filter(|l| !l.is_empty());
    let header: Vec<&str> = lines.next()?.split(',').collect();

    let mut out = Map::new();
    for row in lines {
        for (key, cell) in header.iter().zip(row.split(',')) {
            let column = out
                .entry((*key).to_owned())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(seq) = column {
                seq.push(cast(Some(cell)));
            }
        }
    }

    if out.is_empty() {
        return None;
    }
    Some(Value::Object(out))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::{cast, normalize};

    #[test]
    fn cast_null_and_empty() {
        assert_eq!(cast(None), json!(""));
        assert_eq!(cast(Some("null")), json!(""));
        assert_eq!(cast(Some("NULL")), json!(""));
    }

    #[test]
    fn cast_booleans_case_insensitive() {
        assert_eq!(cast(Some("true")), json!(true));
        assert_eq!(cast(Some("TRUE")), json!(true));
        assert_eq!(cast(Some("False")), json!(false));
    }

    #[test]
    fn cast_integers_and_floats() {
        assert_eq!(cast(Some("42")), json!(42));
        assert_eq!(cast(Some("007")), json!(7));
        assert_eq!(cast(Some("3.14")), json!(3.14));
        assert_eq!(cast(Some("1e3")), json!(1000.0));
    }

    #[test]
    fn cast_negative_integer_becomes_float() {
        // Signed tokens fail the digits-only check and take the float path.
        assert_eq!(cast(Some("-5")), json!(-5.0));
        assert!(cast(Some("-5")).is_f64());
    }

    #[test]
    fn cast_falls_back_to_original_token() {
        assert_eq!(cast(Some("hello")), json!("hello"));
        assert_eq!(cast(Some("12abc")), json!("12abc"));
        assert_eq!(cast(Some("nan")), json!("nan"));
    }

    #[test]
    fn cast_integer_overflow_takes_float_path() {
        let value = cast(Some("99999999999999999999999999"));
        assert!(value.is_f64());
    }

    #[test]
    fn normalize_raw_passthrough() {
        assert_eq!(normalize("{\"a\": 1}", false), json!("{\"a\": 1}"));
        assert_eq!(normalize("plain text", false), json!("plain text"));
    }

    #[test]
    fn normalize_json_wins_first() {
        assert_eq!(normalize(r#"{"a": [1, 2], "b": null}"#, true), json!({"a": [1, 2], "b": null}));
        assert_eq!(normalize("42", true), json!(42));
        assert_eq!(normalize("true", true), json!(true));
    }

    #[test]
    fn normalize_xml_nested_with_cast_leaves() {
        let xml = "<device><name>phone</name><rooted>false</rooted><sdk>33</sdk></device>";
        assert_eq!(
            normalize(xml, true),
            json!({"device": {"name": "phone", "rooted": false, "sdk": 33}})
        );
    }

    #[test]
    fn normalize_xml_attributes_and_repeats() {
        let xml = r#"<scenes count="2"><scene>Main</scene><scene>Alt</scene></scenes>"#;
        assert_eq!(
            normalize(xml, true),
            json!({"scenes": {"@count": 2, "scene": ["Main", "Alt"]}})
        );
    }

    #[test]
    fn normalize_xml_mixed_text_gets_text_key() {
        let xml = r#"<v unit="pct">87</v>"#;
        assert_eq!(normalize(xml, true), json!({"v": {"@unit": "pct", "#text": 87}}));
    }

    #[test]
    fn normalize_xml_empty_element_is_empty_string() {
        assert_eq!(normalize("<a><b/></a>", true), json!({"a": {"b": ""}}));
    }

    #[test]
    fn normalize_delimited_is_column_oriented() {
        let csv = "name,level\nalpha,3\nbeta,true\n";
        assert_eq!(
            normalize(csv, true),
            json!({"name": ["alpha", "beta"], "level": [3, true]})
        );
    }

    #[test]
    fn normalize_delimited_ragged_rows() {
        // Short rows leave trailing columns unappended; long rows drop extras.
        let csv = "a,b,c\n1,2\n4,5,6,7\n";
        assert_eq!(
            normalize(csv, true),
            json!({"a": [1, 4], "b": [2, 5], "c": [6]})
        );
    }

    #[test]
    fn normalize_scalar_fallback() {
        assert_eq!(normalize("87", true), json!(87));
        assert_eq!(normalize("on the move", true), json!("on the move"));
        // A lone line is a header with no rows -- not delimited text.
        assert_eq!(normalize("singleton", true), json!("singleton"));
    }

    #[test]
    fn normalize_invalid_everything_is_cast() {
        assert_eq!(normalize("TRUE", true), json!(true));
        assert_eq!(normalize("-12.5", true), json!(-12.5));
    }
}
