use log::warn;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};

use crate::error::{Result, ScrapeError};

/// Structured data embedded in a detail page. Key order follows the page.
pub type DetailRecord = Map<String, Value>;

pub const LD_JSON_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

pub struct Extractor {
    ld_json: Selector,
    control_chars: Regex,
}

impl Extractor {
    pub fn new() -> Self {
        // Hardcoded patterns; parsing them cannot fail.
        Extractor {
            ld_json: Selector::parse(LD_JSON_SELECTOR).expect("ld+json selector"),
            control_chars: Regex::new(r"[\x00-\x1F]").expect("control char regex"),
        }
    }

    /// Raw text of the first JSON-LD script in `html`, if the page has one.
    pub fn extract_structured_data(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.ld_json)
            .next()
            .map(|script| script.text().collect::<String>())
    }

    /// Decodes persisted or freshly fetched JSON-LD into a record.
    ///
    /// Clean single-encoded text parses directly. Text left behind by older
    /// writers (double-encoded strings, raw newlines inside values, stray
    /// `\n`/`\t` escapes) is retried after each step of
    /// [`Extractor::repair_steps`], stopping at the first one that parses.
    pub fn parse_detail(&self, raw: &str) -> Result<DetailRecord> {
        let first = match decode(raw) {
            Ok(record) => return Ok(record),
            Err(e) => e,
        };

        for repaired in self.repair_steps(raw) {
            if let Ok(record) = decode(&repaired) {
                warn!("Structured data was malformed and had to be repaired: {}", first);
                return Ok(record);
            }
        }
        Err(first)
    }

    /// Progressively repaired versions of `raw`, each building on the last:
    /// raw control characters as spaces, then an outer quoted wrapper
    /// removed, then stray escape sequences outside of escaped backslashes
    /// stripped.
    pub fn repair_steps(&self, raw: &str) -> Vec<String> {
        let mut steps = Vec::with_capacity(3);

        let text = self.control_chars.replace_all(raw.trim(), " ").into_owned();
        steps.push(text.clone());

        let text = match unwrap_quoted(&text) {
            Some(inner) => {
                steps.push(inner.clone());
                inner
            }
            None => text,
        };

        steps.push(strip_stray_escapes(&text));
        steps
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// `"{\"a\":1}"` style wrapper around a whole document.
fn unwrap_quoted(text: &str) -> Option<String> {
    let wrapped = text.len() >= 2
        && text.starts_with('"')
        && text.ends_with('"')
        && matches!(text.as_bytes()[1], b'{' | b'[');
    wrapped.then(|| text[1..text.len() - 1].replace(r#"\""#, "\""))
}

/// Replaces `\n`, `\r` and `\t` with a space unless the backslash is itself
/// escaped, so `C:\\new` survives.
fn strip_stray_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('n' | 'r' | 't') => {
                chars.next();
                out.push(' ');
            }
            Some('\\') => {
                chars.next();
                out.push_str("\\\\");
            }
            _ => out.push(c),
        }
    }
    out
}

fn decode(text: &str) -> Result<DetailRecord> {
    let value: Value = serde_json::from_str(text.trim())?;
    let value = match value {
        // A whole document stored as a JSON string.
        Value::String(inner) => serde_json::from_str(inner.trim())?,
        other => other,
    };
    into_record(value)
}

fn into_record(value: Value) -> Result<DetailRecord> {
    match value {
        Value::Object(map) => Ok(map),
        Value::Array(items) => items
            .into_iter()
            .find_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .ok_or(ScrapeError::UnsupportedShape("array without objects")),
        Value::Null => Err(ScrapeError::UnsupportedShape("null")),
        Value::Bool(_) => Err(ScrapeError::UnsupportedShape("boolean")),
        Value::Number(_) => Err(ScrapeError::UnsupportedShape("number")),
        Value::String(_) => Err(ScrapeError::UnsupportedShape("string")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"<html><head>
        <script type="text/javascript">var x = 1;</script>
        <script type="application/ld+json">{"@context":"https://schema.org","@type":"LocalBusiness","name":"Acme"}</script>
        <script type="application/ld+json">{"@type":"BreadcrumbList"}</script>
        </head><body></body></html>"#;

    #[test]
    fn takes_first_ld_json_script() {
        let extractor = Extractor::new();
        let raw = extractor.extract_structured_data(PAGE).unwrap();
        let record = extractor.parse_detail(&raw).unwrap();
        assert_eq!(record["@type"], json!("LocalBusiness"));
        assert_eq!(record["name"], json!("Acme"));
    }

    #[test]
    fn page_without_ld_json_has_no_data() {
        let extractor = Extractor::new();
        let html = r#"<html><head><script type="text/javascript">{}</script></head></html>"#;
        assert!(extractor.extract_structured_data(html).is_none());
    }

    #[test]
    fn keeps_page_key_order() {
        let extractor = Extractor::new();
        let record = extractor.parse_detail(r#"{"z":1,"a":2,"m":3}"#).unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn raw_newlines_inside_values_are_repaired() {
        let extractor = Extractor::new();
        let raw = "{\"name\":\"Acme\",\"description\":\"line one\nline two\ttabbed\"}";
        let record = extractor.parse_detail(raw).unwrap();
        assert_eq!(record["description"], json!("line one line two tabbed"));
    }

    #[test]
    fn double_encoded_document_is_unwrapped() {
        let extractor = Extractor::new();
        let inner = r#"{"name":"Acme","telephone":"02 9999 0000"}"#;
        let stored = serde_json::to_string(inner).unwrap();
        let record = extractor.parse_detail(&stored).unwrap();
        assert_eq!(record["telephone"], json!("02 9999 0000"));
    }

    #[test]
    fn quoted_wrapper_around_unescaped_document_is_repaired() {
        let extractor = Extractor::new();
        let stored = r#""{"name": "Acme", "url": "https://acme.example"}""#;
        let record = extractor.parse_detail(stored).unwrap();
        assert_eq!(record["name"], json!("Acme"));
        assert_eq!(record["url"], json!("https://acme.example"));
    }

    #[test]
    fn stray_escape_sequences_between_tokens_are_stripped() {
        let extractor = Extractor::new();
        let stored = r#"{\n  "name": "Acme",\t"telephone": "1300 000 000"\n}"#;
        let record = extractor.parse_detail(stored).unwrap();
        assert_eq!(record["telephone"], json!("1300 000 000"));
    }

    #[test]
    fn raw_newline_repair_keeps_escaped_backslashes() {
        let extractor = Extractor::new();
        let raw = "{\"name\":\"Acme\nPty\",\"path\":\"C:\\\\new\"}";
        let record = extractor.parse_detail(raw).unwrap();
        assert_eq!(record["name"], json!("Acme Pty"));
        assert_eq!(record["path"], json!("C:\\new"));
    }

    #[test]
    fn escape_stripping_skips_escaped_backslashes() {
        assert_eq!(strip_stray_escapes(r"a\nb\\nc\\\td"), r"a b\\nc\\ d");
    }

    #[test]
    fn array_payload_uses_first_object() {
        let extractor = Extractor::new();
        let record = extractor
            .parse_detail(r#"[1, {"name":"First"}, {"name":"Second"}]"#)
            .unwrap();
        assert_eq!(record["name"], json!("First"));
    }

    #[test]
    fn unrecoverable_text_is_an_error() {
        let extractor = Extractor::new();
        assert!(matches!(
            extractor.parse_detail("{\"name\": "),
            Err(ScrapeError::MalformedJson(_))
        ));
        assert!(matches!(
            extractor.parse_detail("42"),
            Err(ScrapeError::UnsupportedShape("number"))
        ));
    }
}
