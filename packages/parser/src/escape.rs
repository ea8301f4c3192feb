//! XML entity handling for text content and attribute values.

use std::borrow::Cow;

/// Escape the five XML special characters.
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    Cow::Owned(out)
}

/// Decode the five named entities.
///
/// `&amp;` is replaced last, so `&amp;lt;` decodes to the literal `&lt;`.
pub fn unescape(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }
    Cow::Owned(
        value
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_all_five() {
        assert_eq!(escape(r#"a<b>&"c"'"#), "a&lt;b&gt;&amp;&quot;c&quot;&apos;");
    }

    #[test]
    fn test_plain_text_is_borrowed() {
        assert!(matches!(escape("plain"), Cow::Borrowed(_)));
        assert!(matches!(unescape("plain"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_unescape_decodes_amp_last() {
        assert_eq!(unescape("&lt;tag&gt; &amp;lt;"), "<tag> &lt;");
        assert_eq!(unescape("it&apos;s &quot;x&quot;"), "it's \"x\"");
    }

    #[test]
    fn test_escape_then_unescape_restores() {
        let original = "if a < b && c > d { \"s\" + 'c' } &amp;";
        assert_eq!(unescape(&escape(original)), original);
    }
}
