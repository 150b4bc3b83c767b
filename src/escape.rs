//! HTML entity handling for link text and macro targets.
use quick_xml::escape::{escape, resolve_html5_entity, unescape_with};

/// Decode HTML entities in a macro target once (`&lt;` becomes `<`).
///
/// AsciiDoc hands macro targets over entity-encoded. Each `&name;` or
/// `&#num;` span is decoded on its own; an unknown or unterminated entity and
/// a bare `&` are kept as written while the rest of the text is still decoded.
pub fn decode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(rest.get(..amp).unwrap_or_default());
        let tail = rest.get(amp..).unwrap_or_default();

        let decoded = entity_end(tail).and_then(|semi| {
            let span = tail.get(..=semi)?;
            let value = unescape_with(span, resolve_html5_entity).ok()?;
            return Some((value.into_owned(), semi));
        });
        match decoded {
            None => {
                out.push('&');
                rest = tail.get(1..).unwrap_or_default();
            },
            Some((value, semi)) => {
                out.push_str(&value);
                rest = tail.get(semi.saturating_add(1)..).unwrap_or_default();
            },
        }
    }

    out.push_str(rest);
    return out;
}

/// Escape text destined for display (`<` becomes `&lt;`).
pub fn encode(text: &str) -> String {
    return escape(text).into_owned();
}

/// Byte offset of the `;` closing the entity that starts `tail`, if one
/// closes before the next `&`.
fn entity_end(tail: &str) -> Option<usize> {
    let (idx, ch) = tail.char_indices().skip(1).find(|&(_, ch)| return ch == ';' || ch == '&')?;
    return (ch == ';').then_some(idx);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_template_punctuation() {
        assert_eq!(encode("std::vector<int>"), "std::vector&lt;int&gt;");
        assert_eq!(encode("\"url.hpp\""), "&quot;url.hpp&quot;");
        assert_eq!(encode("a && b"), "a &amp;&amp; b");
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(decode("std::vector&lt;int&gt;"), "std::vector<int>");
        assert_eq!(decode("&#x3C;algorithm&#62;"), "<algorithm>");
        assert_eq!(decode("a&nbsp;b"), "a\u{a0}b");
    }

    #[test]
    fn malformed_entities_pass_through() {
        assert_eq!(decode("a & b"), "a & b");
        assert_eq!(decode("&bogus;"), "&bogus;");
    }

    #[test]
    fn stray_ampersand_does_not_block_other_entities() {
        assert_eq!(decode("Foo&lt;Bar&gt;&"), "Foo<Bar>&");
        assert_eq!(decode("std::vector&lt;int&gt;&bogus;"), "std::vector<int>&bogus;");
        assert_eq!(decode("a && b&amp;c"), "a && b&c");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(encode("std::string"), "std::string");
        assert_eq!(decode("std::string"), "std::string");
    }
}
