//! Reader for Doxygen `searchData` JavaScript files.
//!
//! Doxygen splits its client-side search index into files such as
//! `search/functions_c.js`, each holding one array literal:
//!
//! ```text
//! var searchData=
//! [
//!   ['close_3',['close',['../classlimes_1_1files_1_1_c_file.html#a4eb0...',1,'limes::files::CFile::close()'],
//!                       ['../classlimes_1_1files_1_1_dynamic_library.html#afff...',1,'limes::files::DynamicLibrary::close()']]],
//!   ...
//! ];
//! ```
//!
//! Every item is `[id, [name, [url, flag, scope], ...]]`:
//! - `id` is the lowercase name with every non-alphanumeric byte written as `_XX`
//!   (hex) and a `_<n>` sequence number appended;
//! - `name` is the symbol name, HTML-escaped;
//! - each link triple carries the anchor URL, a numeric flag and the scope text.
//!
//! Each group becomes one [`RawRecord`] keyed by the symbol name. The scope text of
//! overloaded members carries the full signature (`limes::files::CFile::close()`);
//! it is split into the container (`limes::files::CFile`) and the decorated display
//! name (`close()`).

use symdex_common::{Result, error::Error};

use crate::fragment::{Fragment, RawEntry, RawRecord};
use crate::keys;

/// Parses the contents of one `searchData` file.
pub fn parse_search_data(text: &str) -> Result<Fragment> {
    let mut parser = Parser::new(text);
    let root = parser.parse_document()?;
    let Value::List(items) = root.value else {
        return Err(malformed(root.offset, "expected the searchData array"));
    };

    let mut fragment = Fragment::new();
    for item in items {
        for record in parse_item(item)? {
            fragment.push(record);
        }
    }
    Ok(fragment)
}

/// Decodes a search id (`operator_3c_3c_401`) into the name it encodes (`operator<<`).
///
/// Returns `None` when the decoded bytes are not valid UTF-8.
pub fn decode_search_id(id: &str) -> Option<String> {
    let id = match id.rsplit_once('_') {
        Some((head, seq))
            if !head.is_empty() && !seq.is_empty() && seq.bytes().all(|b| b.is_ascii_digit()) =>
        {
            head
        }
        _ => id,
    };

    let bytes = id.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).ok()
}

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

/// Splits a scope text into `(container, display name)`.
///
/// When the scope's qualified name ends with `::<name>`, everything before it is the
/// container and the rest, parameter list included, is the display name. Otherwise
/// the whole scope is the container and `name` is displayed as is.
pub fn split_scope(scope: &str, name: &str) -> (String, String) {
    if scope.is_empty() || name.is_empty() {
        return (scope.to_string(), name.to_string());
    }
    let head_end = keys::param_list_start(scope).unwrap_or(scope.len());
    let head = &scope[..head_end];
    let needle = format!("::{name}");
    if let Some(pos) = head.rfind(&needle) {
        let after = &head[pos + needle.len()..];
        if after.trim().is_empty() || after.starts_with('<') {
            return (scope[..pos].to_string(), scope[pos + 2..].to_string());
        }
    }
    (scope.to_string(), name.to_string())
}

fn parse_item(item: Node) -> Result<Vec<RawRecord>> {
    let offset = item.offset;
    let Value::List(mut parts) = item.value else {
        return Err(malformed(offset, "expected an [id, [name, links...]] item"));
    };
    if parts.len() < 2 {
        return Err(malformed(offset, "item has no symbol group"));
    }
    let groups = parts.split_off(1);
    let id = match parts.pop() {
        Some(node) => expect_str(node, "search id")?,
        None => String::new(),
    };
    let decoded_id =
        decode_search_id(&id).ok_or_else(|| malformed(offset, "search id is not valid UTF-8"))?;

    groups
        .into_iter()
        .map(|group| parse_group(group, &decoded_id))
        .collect()
}

fn parse_group(group: Node, decoded_id: &str) -> Result<RawRecord> {
    let offset = group.offset;
    let Value::List(parts) = group.value else {
        return Err(malformed(offset, "expected a [name, links...] group"));
    };
    let mut parts = parts.into_iter();
    let name = match parts.next() {
        Some(node) => expect_str(node, "symbol name")?,
        None => return Err(malformed(offset, "empty symbol group")),
    };
    let name = keys::decode_html_entities(&name).into_owned();

    let mut entries = Vec::new();
    for link in parts {
        entries.push(parse_link(link, &name)?);
    }
    if entries.is_empty() {
        return Err(malformed(offset, "symbol group has no links"));
    }

    let raw_key = if name.trim().is_empty() {
        decoded_id.to_string()
    } else {
        name
    };
    Ok(RawRecord {
        raw_key: Some(raw_key),
        entries,
    })
}

fn parse_link(link: Node, name: &str) -> Result<RawEntry> {
    let offset = link.offset;
    let Value::List(parts) = link.value else {
        return Err(malformed(offset, "expected a [url, flag, scope] link"));
    };
    if !(2..=3).contains(&parts.len()) {
        return Err(malformed(
            offset,
            format!("link has {} elements, expected 2 or 3", parts.len()),
        ));
    }
    let mut parts = parts.into_iter();
    let url = parts
        .next()
        .map(|node| expect_str(node, "link url"))
        .transpose()?
        .unwrap_or_default();
    if let Some(flag) = parts.next() {
        if !matches!(flag.value, Value::Num) {
            return Err(malformed(flag.offset, "link flag must be a number"));
        }
    }
    let scope = parts
        .next()
        .map(|node| expect_str(node, "link scope"))
        .transpose()?
        .unwrap_or_default();
    let scope = keys::decode_html_entities(&scope);
    let (container, display) = split_scope(&scope, name);

    Ok(RawEntry {
        display_name: Some(display),
        anchor: Some(url),
        container_name: Some(container),
    })
}

fn expect_str(node: Node, what: &str) -> Result<String> {
    match node.value {
        Value::Str(s) => Ok(s),
        _ => Err(malformed(node.offset, format!("{what} must be a string"))),
    }
}

fn malformed(offset: usize, message: impl Into<String>) -> Error {
    Error::malformed_fragment(0, format!("byte {offset}"), message)
}

/// A parsed literal with the byte offset it started at.
#[derive(Debug, Clone, PartialEq)]
struct Node {
    offset: usize,
    value: Value,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Str(String),
    Num,
    List(Vec<Node>),
}

/// Recursive-descent parser for the JavaScript literal subset Doxygen emits:
/// arrays, quoted strings and integers.
struct Parser<'a> {
    text: &'a str,
    pos: usize,
    /// Number of currently open arrays.
    depth: usize,
}

/// Doxygen output nests four levels deep.
const MAX_NESTING_DEPTH: usize = 32;

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            depth: 0,
        }
    }

    fn parse_document(&mut self) -> Result<Node> {
        self.skip_ws();
        if self.rest().starts_with("var") {
            self.pos += "var".len();
            self.skip_ws();
            let ident_len = self
                .rest()
                .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
                .unwrap_or(self.rest().len());
            if ident_len == 0 {
                return Err(malformed(self.pos, "expected a variable name"));
            }
            self.pos += ident_len;
            self.skip_ws();
            self.expect('=')?;
        }
        self.skip_ws();
        let root = self.parse_value()?;
        self.skip_ws();
        if self.rest().starts_with(';') {
            self.pos += 1;
            self.skip_ws();
        }
        if !self.rest().is_empty() {
            return Err(malformed(self.pos, "unexpected trailing content"));
        }
        Ok(root)
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn expect(&mut self, ch: char) -> Result<()> {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(malformed(self.pos, format!("expected '{ch}'")))
        }
    }

    fn parse_value(&mut self) -> Result<Node> {
        let offset = self.pos;
        let value = match self.peek() {
            Some('[') => self.parse_list()?,
            Some(quote @ ('\'' | '"')) => Value::Str(self.parse_string(quote)?),
            Some(c) if c == '-' || c.is_ascii_digit() => {
                self.parse_number()?;
                Value::Num
            }
            Some(c) => return Err(malformed(offset, format!("unexpected character '{c}'"))),
            None => return Err(malformed(offset, "unexpected end of input")),
        };
        Ok(Node { offset, value })
    }

    fn parse_list(&mut self) -> Result<Value> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(malformed(self.pos, "nesting too deep"));
        }
        self.depth += 1;
        let list = self.parse_list_items();
        self.depth -= 1;
        list
    }

    fn parse_list_items(&mut self) -> Result<Value> {
        self.expect('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(']') {
                self.pos += 1;
                return Ok(Value::List(items));
            }
            items.push(self.parse_value()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => self.pos += 1,
                Some(']') => {
                    self.pos += 1;
                    return Ok(Value::List(items));
                }
                _ => return Err(malformed(self.pos, "expected ',' or ']'")),
            }
        }
    }

    fn parse_string(&mut self, quote: char) -> Result<String> {
        let start = self.pos;
        self.pos += quote.len_utf8();
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, ch)) = chars.next() {
            match ch {
                c if c == quote => {
                    self.pos += i + c.len_utf8();
                    return Ok(out);
                }
                '\\' => {
                    let Some((_, escaped)) = chars.next() else {
                        break;
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        'u' => {
                            let hex: String = chars.by_ref().take(4).map(|(_, c)| c).collect();
                            let ch = u32::from_str_radix(&hex, 16)
                                .ok()
                                .filter(|_| hex.len() == 4)
                                .and_then(char::from_u32)
                                .ok_or_else(|| {
                                    malformed(self.pos + i, format!("invalid escape \\u{hex}"))
                                })?;
                            out.push(ch);
                        }
                        other => out.push(other),
                    }
                }
                c => out.push(c),
            }
        }
        Err(malformed(start, "unterminated string"))
    }

    fn parse_number(&mut self) -> Result<i64> {
        let start = self.pos;
        let rest = self.rest();
        let sign = usize::from(rest.starts_with('-'));
        let digits = rest[sign..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len() - sign);
        let literal = &rest[..sign + digits];
        self.pos += literal.len();
        literal
            .parse()
            .map_err(|_| malformed(start, format!("invalid number '{literal}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use symdex_common::error::ErrorKind;

    const SAMPLE: &str = r#"var searchData=
[
  ['changename_2',['changeName',['../classlimes_1_1files_1_1_filesystem_entry.html#abd30',1,'limes::files::FilesystemEntry']]],
  ['close_3',['close',['../classlimes_1_1files_1_1_c_file.html#a4eb0',1,'limes::files::CFile::close()'],['../classlimes_1_1files_1_1_dynamic_library.html#afff5',1,'limes::files::DynamicLibrary::close()']]],
  ['operator_3c_3c_401',['operator&lt;&lt;',['../group__limes__files.html#gaa1d5',1,'limes::files::File::operator&lt;&lt;()']]]
];
"#;

    #[test]
    fn test_parse_sample() {
        let fragment = parse_search_data(SAMPLE).unwrap();
        assert_eq!(fragment.len(), 3);
        assert_eq!(fragment.entry_count(), 4);

        let change_name = &fragment.records()[0];
        assert_eq!(change_name.raw_key.as_deref(), Some("changeName"));
        assert_eq!(
            change_name.entries[0],
            RawEntry {
                display_name: Some("changeName".into()),
                anchor: Some("../classlimes_1_1files_1_1_filesystem_entry.html#abd30".into()),
                container_name: Some("limes::files::FilesystemEntry".into()),
            }
        );

        let close = &fragment.records()[1];
        assert_eq!(close.entries.len(), 2);
        assert_eq!(close.entries[0].display_name.as_deref(), Some("close()"));
        assert_eq!(
            close.entries[1].container_name.as_deref(),
            Some("limes::files::DynamicLibrary")
        );

        let shift = &fragment.records()[2];
        assert_eq!(shift.raw_key.as_deref(), Some("operator<<"));
        assert_eq!(shift.entries[0].display_name.as_deref(), Some("operator<<()"));
        assert_eq!(
            shift.entries[0].container_name.as_deref(),
            Some("limes::files::File")
        );
    }

    #[test]
    fn test_decode_search_id() {
        assert_eq!(decode_search_id("close_3").as_deref(), Some("close"));
        assert_eq!(decode_search_id("file_20_2a_390").as_deref(), Some("file *"));
        assert_eq!(
            decode_search_id("operator_3c_3c_401").as_deref(),
            Some("operator<<")
        );
        assert_eq!(decode_search_id("operator_21_3d_395").as_deref(), Some("operator!="));
        assert_eq!(decode_search_id("caf_c3_a9_7").as_deref(), Some("café"));
        assert_eq!(decode_search_id("plain").as_deref(), Some("plain"));
        assert_eq!(decode_search_id("bad_ff_1"), None);
    }

    #[test]
    fn test_split_scope() {
        assert_eq!(
            split_scope("limes::files::CFile::CFile(std::FILE *fileHandle) noexcept", "CFile"),
            (
                "limes::files::CFile".to_string(),
                "CFile(std::FILE *fileHandle) noexcept".to_string()
            )
        );
        assert_eq!(
            split_scope("limes::files::CFile::operator bool()", "operator bool"),
            ("limes::files::CFile".to_string(), "operator bool()".to_string())
        );
        assert_eq!(
            split_scope("limes::files::CFile", "FILE *"),
            ("limes::files::CFile".to_string(), "FILE *".to_string())
        );
        // A parameter type that happens to end with the name does not count.
        assert_eq!(
            split_scope("ns::Dir::open(std::path)", "path"),
            ("ns::Dir::open(std::path)".to_string(), "path".to_string())
        );
        assert_eq!(split_scope("", "x"), (String::new(), "x".to_string()));
    }

    #[test]
    fn test_string_escapes() {
        let fragment = parse_search_data(
            r#"var searchData=[['it_27s_0',['it\'s',['a.html#x',0,'ns::it\'s']]],['u_1',['A',['b.html',1]]]];"#,
        )
        .unwrap();
        assert_eq!(fragment.records()[0].raw_key.as_deref(), Some("it's"));
        assert_eq!(fragment.records()[0].entries[0].container_name.as_deref(), Some("ns"));
        assert_eq!(fragment.records()[1].raw_key.as_deref(), Some("A"));
        assert_eq!(fragment.records()[1].entries[0].container_name.as_deref(), Some(""));
    }

    #[test]
    fn test_bare_array_and_empty() {
        let fragment = parse_search_data("[]").unwrap();
        assert!(fragment.is_empty());
        let fragment = parse_search_data("[['x_0',['x',['x.html',1,'ns']],],]").unwrap();
        assert_eq!(fragment.len(), 1);
    }

    #[test]
    fn test_malformed_inputs() {
        let cases = [
            "var searchData=",
            "var searchData=[['x_0',['x',['x.html',1,'ns']]]",
            "var searchData=[['x_0',['x']]];",
            "var searchData=[['x_0',['x',['x.html','1','ns']]]];",
            "var searchData=[['x_0',['x',['x.html',1,'ns',2]]]];",
            "var searchData=[['x_0']];",
            "var searchData=[['x_0',['x',['x.html',1,'ns']]]]; trailing",
            "var searchData=[['x_0',['x',['x.html',1,'unterminated]]]];",
            "var = [];",
        ];
        for case in cases {
            let err = parse_search_data(case).unwrap_err();
            assert!(
                matches!(err.kind(), ErrorKind::MalformedFragment { .. }),
                "{case}: {err}"
            );
        }
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let err = parse_search_data(&"[".repeat(200_000)).unwrap_err();
        match err.kind() {
            ErrorKind::MalformedFragment {
                location, message, ..
            } => {
                assert_eq!(location, "byte 32");
                assert_eq!(message, "nesting too deep");
            }
            other => panic!("unexpected kind: {other:?}"),
        }

        let nested = format!(
            "{}{}",
            "[".repeat(MAX_NESTING_DEPTH),
            "]".repeat(MAX_NESTING_DEPTH)
        );
        assert!(Parser::new(&nested).parse_document().is_ok());
        let too_deep = format!("[{nested}]");
        assert!(Parser::new(&too_deep).parse_document().is_err());
    }

    #[test]
    fn test_error_location() {
        let err = parse_search_data("var searchData=[['x_0',['x',['x.html',true,'ns']]]];")
            .unwrap_err();
        match err.kind() {
            ErrorKind::MalformedFragment { location, .. } => assert_eq!(location, "byte 38"),
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}
