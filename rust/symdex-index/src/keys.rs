//! Normalization of raw symbol names into index keys.
//!
//! Documentation generators emit the same symbol under several decorated spellings:
//! `close`, `close()`, `CFile(std::FILE *fileHandle) noexcept`, `operator&lt;&lt;`.
//! All of them must land in one bucket, and a query must be normalized exactly like
//! the keys it is matched against. The rule, applied in this order:
//!
//! 1. Decode HTML character references (`&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`,
//!    `&#NN;`, `&#xHH;`). Unknown references are kept verbatim.
//! 2. Trim surrounding whitespace.
//! 3. Strip decoration: the parameter list and everything after it (qualifiers such
//!    as `const`, `noexcept`, `=default`), then a trailing template argument list on
//!    names that are not operators. The call operator keeps its own `()`.
//! 4. Collapse internal whitespace runs to one space.
//! 5. Truncate to the maximum key length at a character boundary.
//!
//! The result is the *display key*; folding it with the index collation yields the
//! *match key*.

use std::borrow::Cow;

use crate::collation::Collation;

/// Default maximum length of a key in bytes before truncation.
pub const DEFAULT_MAX_KEY_LENGTH: usize = 256;

/// Longest character reference name considered for decoding, `&` and `;` excluded.
const MAX_ENTITY_LEN: usize = 8;

/// A normalized search token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    /// Normalized key in its original case, used for display.
    pub display: String,
    /// Collation-folded form, used for matching.
    pub folded: String,
}

/// Applies the normalization rule with a fixed collation and length limit.
pub struct KeyNormalizer {
    collation: Box<dyn Collation>,
    max_key_length: usize,
}

impl KeyNormalizer {
    pub fn new(collation: Box<dyn Collation>, max_key_length: usize) -> Self {
        Self {
            collation,
            max_key_length,
        }
    }

    pub fn collation(&self) -> &dyn Collation {
        self.collation.as_ref()
    }

    pub fn max_key_length(&self) -> usize {
        self.max_key_length
    }

    /// Normalizes a raw symbol name or query string.
    ///
    /// Returns `None` when nothing is left after stripping decoration.
    pub fn normalize(&self, raw: &str) -> Option<IndexKey> {
        let display = normalize_display(raw);
        let display = truncate_str(&display, self.max_key_length);
        if display.is_empty() {
            return None;
        }
        let folded = self.collation.fold(display).into_owned();
        Some(IndexKey {
            display: display.to_string(),
            folded,
        })
    }
}

impl Clone for KeyNormalizer {
    fn clone(&self) -> Self {
        Self {
            collation: self.collation.clone_boxed(),
            max_key_length: self.max_key_length,
        }
    }
}

impl std::fmt::Debug for KeyNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyNormalizer")
            .field("collation", &self.collation.name())
            .field("max_key_length", &self.max_key_length)
            .finish()
    }
}

/// Steps 1-4 of the normalization rule, without folding or truncation.
pub fn normalize_display(raw: &str) -> String {
    let decoded = decode_html_entities(raw);
    let stripped = strip_decoration(decoded.trim());
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes the HTML character references documentation generators put into
/// symbol names and scopes.
pub fn decode_html_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        let decoded = tail
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN + 1)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name.to_ascii_lowercase().as_str() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Removes the parameter list, trailing qualifiers and template arguments from a
/// trimmed symbol name.
pub fn strip_decoration(text: &str) -> &str {
    let text = match param_list_start(text) {
        Some(pos) => text[..pos].trim_end(),
        None => text,
    };
    if operator_token_end(text).is_some() {
        return text;
    }
    match template_args_start(text) {
        Some(pos) => text[..pos].trim_end(),
        None => text,
    }
}

/// Byte offset of the `(` that opens the parameter list, if any.
pub(crate) fn param_list_start(text: &str) -> Option<usize> {
    let mut from = 0;
    if let Some(end) = operator_token_end(text) {
        from = end;
        let rest = &text[end..];
        let trimmed = rest.trim_start();
        if trimmed.starts_with("()") {
            from = end + (rest.len() - trimmed.len()) + 2;
        }
    }
    text[from..].find('(').map(|pos| from + pos)
}

/// Byte offset just past the `operator` keyword when `text` names an operator,
/// either bare or as the last component of a qualified name.
fn operator_token_end(text: &str) -> Option<usize> {
    const KEYWORD: &str = "operator";
    // ASCII lowercasing keeps byte offsets valid in `text`.
    let lowered = text.to_ascii_lowercase();
    let mut search = 0;
    while let Some(pos) = lowered[search..].find(KEYWORD) {
        let start = search + pos;
        let end = start + KEYWORD.len();
        let before_ok = start == 0 || text[..start].ends_with("::");
        let after_ok = text[end..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
        if before_ok && after_ok {
            return Some(end);
        }
        search = end;
    }
    None
}

/// Byte offset of the `<` opening a balanced trailing template argument list.
fn template_args_start(text: &str) -> Option<usize> {
    if !text.ends_with('>') {
        return None;
    }
    let mut depth = 0usize;
    for (pos, ch) in text.char_indices().rev() {
        match ch {
            '>' => depth += 1,
            '<' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return (pos > 0).then_some(pos);
                }
            }
            _ => (),
        }
    }
    None
}

/// Truncate a string slice to the maximum allowed length at a codepoint boundary.
///
/// If the input is shorter than or equal to `max_len`, it is returned unchanged.
pub(crate) fn truncate_str(input: &str, max_len: usize) -> &str {
    if input.len() <= max_len {
        return input;
    }

    let mut boundary = max_len;
    while boundary > 0 && !input.is_char_boundary(boundary) {
        boundary -= 1;
    }

    &input[..boundary]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::{UnicodeCaseInsensitiveCollation, UnicodeCasePreservingCollation};

    fn normalizer() -> KeyNormalizer {
        KeyNormalizer::new(
            Box::new(UnicodeCaseInsensitiveCollation),
            DEFAULT_MAX_KEY_LENGTH,
        )
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(decode_html_entities("close"), "close");
        assert_eq!(decode_html_entities("operator&lt;&lt;"), "operator<<");
        assert_eq!(decode_html_entities("operator-&gt;"), "operator->");
        assert_eq!(
            decode_html_entities("const Path &amp;filepath"),
            "const Path &filepath"
        );
        assert_eq!(decode_html_entities("&#39;&#x41;&quot;"), "'A\"");
        assert_eq!(decode_html_entities("OPERATOR&LT;"), "OPERATOR<");

        // Unknown or unterminated references stay as they are.
        assert_eq!(decode_html_entities("a &b c"), "a &b c");
        assert_eq!(decode_html_entities("&unknown;"), "&unknown;");
        assert_eq!(decode_html_entities("a && b"), "a && b");
    }

    #[test]
    fn test_strip_decoration() {
        assert_eq!(strip_decoration("close()"), "close");
        assert_eq!(strip_decoration("close"), "close");
        assert_eq!(
            strip_decoration("CFile(std::FILE *fileHandle) noexcept"),
            "CFile"
        );
        assert_eq!(strip_decoration("CFile()=default"), "CFile");
        assert_eq!(
            strip_decoration("contains(const std::string_view &childName) const"),
            "contains"
        );
        assert_eq!(strip_decoration("operator()"), "operator()");
        assert_eq!(strip_decoration("operator()(int x) const"), "operator()");
        assert_eq!(strip_decoration("operator bool()"), "operator bool");
        assert_eq!(strip_decoration("operator<<"), "operator<<");
        assert_eq!(strip_decoration("operator<(const Path &other)"), "operator<");
        assert_eq!(strip_decoration("operator>"), "operator>");
        assert_eq!(strip_decoration("get<T>"), "get");
        assert_eq!(strip_decoration("convert<std::vector<int>>()"), "convert");
        assert_eq!(strip_decoration("FILE *"), "FILE *");
        assert_eq!(strip_decoration("operatorName()"), "operatorName");
        assert_eq!(strip_decoration("OPERATOR()"), "OPERATOR()");
    }

    #[test]
    fn test_qualified_operator() {
        assert_eq!(
            param_list_start("limes::files::CFile::operator()()"),
            Some("limes::files::CFile::operator()".len())
        );
        assert_eq!(param_list_start("cooperator()"), Some("cooperator".len()));
    }

    #[test]
    fn test_normalize_display() {
        assert_eq!(normalize_display("  close()  "), "close");
        assert_eq!(normalize_display("operator   bool"), "operator bool");
        assert_eq!(normalize_display("operator&lt;&lt;"), "operator<<");
        assert_eq!(normalize_display("()"), "");
        assert_eq!(normalize_display("   "), "");
    }

    #[test]
    fn test_normalize_merges_decorated_variants() {
        let normalizer = normalizer();
        let plain = normalizer.normalize("close").unwrap();
        let decorated = normalizer.normalize("close()").unwrap();
        let upper = normalizer.normalize("CLOSE").unwrap();
        assert_eq!(plain.folded, decorated.folded);
        assert_eq!(plain.folded, upper.folded);
        assert_eq!(upper.display, "CLOSE");
        assert!(normalizer.normalize("( )").is_none());
    }

    #[test]
    fn test_normalize_case_preserving() {
        let normalizer = KeyNormalizer::new(Box::new(UnicodeCasePreservingCollation), 16);
        let key = normalizer.normalize("CFile").unwrap();
        assert_eq!(key.folded, "CFile");
        assert_ne!(key, normalizer.normalize("cfile").unwrap());
    }

    #[test]
    fn test_normalize_truncates() {
        let normalizer = KeyNormalizer::new(Box::new(UnicodeCaseInsensitiveCollation), 5);
        let key = normalizer.normalize("café-test").unwrap();
        assert_eq!(key.display, "café");
        assert_eq!(normalizer.clone().max_key_length(), 5);
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("close", 10), "close");
        assert_eq!(truncate_str("close", 3), "clo");
        let truncated = truncate_str("你好世界", 4);
        assert_eq!(truncated, "你");
    }
}
