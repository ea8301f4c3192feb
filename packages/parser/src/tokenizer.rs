use logos::{Lexer, Logos};
use std::fmt;

/// Tokens between tags: character data, markup openers and closers
///
/// After [`Markup::OpenTag`] the lexer is morphed into [`TagToken`] until
/// the start tag ends.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Markup<'src> {
    #[regex(r"<\?([^?]|\?[^>])*\?>")]
    ProcessingInstruction,

    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    #[regex(r"<!\[CDATA\[([^\]]|\][^\]]|\]\][^>])*\]\]>", cdata_body)]
    CData(&'src str),

    // An internal subset may hold `>` inside its brackets
    #[regex(r"<![A-Za-z][^>\[]*(\[[^\]]*\])?[^>]*>")]
    Doctype,

    #[regex(r"<[A-Za-z_:][A-Za-z0-9_:.\-]*", |lex| &lex.slice()[1..])]
    OpenTag(&'src str),

    #[regex(r"</[A-Za-z_:][A-Za-z0-9_:.\-]*[ \t\r\n]*>", close_name)]
    CloseTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),
}

/// Tokens inside a start tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum TagToken<'src> {
    #[regex(r"[A-Za-z_:][A-Za-z0-9_:.\-]*", |lex| lex.slice())]
    Name(&'src str),

    #[token("=")]
    Eq,

    #[regex(r#""[^"<]*""#, unquote)]
    #[regex(r"'[^'<]*'", unquote)]
    Value(&'src str),

    #[token(">")]
    End,

    #[token("/>")]
    SelfClose,
}

fn cdata_body<'src>(lex: &mut Lexer<'src, Markup<'src>>) -> &'src str {
    let slice = lex.slice();
    &slice["<![CDATA[".len()..slice.len() - "]]>".len()]
}

fn close_name<'src>(lex: &mut Lexer<'src, Markup<'src>>) -> &'src str {
    let slice = lex.slice();
    slice[2..slice.len() - 1].trim_end()
}

fn unquote<'src>(lex: &mut Lexer<'src, TagToken<'src>>) -> &'src str {
    let slice = lex.slice();
    &slice[1..slice.len() - 1]
}

impl<'src> fmt::Display for Markup<'src> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Markup::ProcessingInstruction => write!(f, "processing instruction"),
            Markup::Comment => write!(f, "comment"),
            Markup::CData(_) => write!(f, "CDATA section"),
            Markup::Doctype => write!(f, "doctype"),
            Markup::OpenTag(name) => write!(f, "<{}", name),
            Markup::CloseTag(name) => write!(f, "</{}>", name),
            Markup::Text(_) => write!(f, "text"),
        }
    }
}

impl<'src> fmt::Display for TagToken<'src> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TagToken::Name(name) => write!(f, "attribute name '{}'", name),
            TagToken::Eq => write!(f, "'='"),
            TagToken::Value(_) => write!(f, "quoted value"),
            TagToken::End => write!(f, "'>'"),
            TagToken::SelfClose => write!(f, "'/>'"),
        }
    }
}

/// Tokenize the markup level only, for diagnostics and tests
///
/// Start tags show up as their [`Markup::OpenTag`] prefix; the attribute
/// section that follows is lexed as text.
pub fn tokenize(source: &str) -> Vec<(Markup<'_>, std::ops::Range<usize>)> {
    let lexer = Markup::lexer(source);
    lexer
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, span)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markup_tokens() {
        let tokens = tokenize("<?xml version=\"1.0\"?><!-- c --><doc>a &amp; b</doc>");
        assert_eq!(tokens[0].0, Markup::ProcessingInstruction);
        assert_eq!(tokens[1].0, Markup::Comment);
        assert_eq!(tokens[2].0, Markup::OpenTag("doc"));
        assert_eq!(tokens[3].0, Markup::Text(">a &amp; b"));
        assert_eq!(tokens[4].0, Markup::CloseTag("doc"));
    }

    #[test]
    fn test_doctype_with_internal_subset() {
        let tokens = tokenize(r#"<!DOCTYPE document [<!ENTITY x "y">]><document/>"#);
        assert_eq!(tokens[0], (Markup::Doctype, 0..37));
        assert_eq!(tokens[1].0, Markup::OpenTag("document"));
    }

    #[test]
    fn test_close_tag_allows_trailing_whitespace() {
        let tokens = tokenize("</p  >");
        assert_eq!(tokens[0].0, Markup::CloseTag("p"));
    }

    #[test]
    fn test_cdata_body() {
        let tokens = tokenize("<![CDATA[a < b ]] c]]>");
        assert_eq!(tokens[0].0, Markup::CData("a < b ]] c"));
    }

    #[test]
    fn test_attribute_tokens() {
        let mut lex = TagToken::lexer(r#" src="a.png" alt='x "y"' />"#);
        assert_eq!(lex.next(), Some(Ok(TagToken::Name("src"))));
        assert_eq!(lex.next(), Some(Ok(TagToken::Eq)));
        assert_eq!(lex.next(), Some(Ok(TagToken::Value("a.png"))));
        assert_eq!(lex.next(), Some(Ok(TagToken::Name("alt"))));
        assert_eq!(lex.next(), Some(Ok(TagToken::Eq)));
        assert_eq!(lex.next(), Some(Ok(TagToken::Value("x \"y\""))));
        assert_eq!(lex.next(), Some(Ok(TagToken::SelfClose)));
        assert_eq!(lex.next(), None);
    }

    #[test]
    fn test_morph_between_modes() {
        let source = r#"<p align="center">hi</p>"#;
        let mut markup = Markup::lexer(source);
        assert_eq!(markup.next(), Some(Ok(Markup::OpenTag("p"))));

        let mut tag = markup.morph::<TagToken>();
        assert_eq!(tag.next(), Some(Ok(TagToken::Name("align"))));
        assert_eq!(tag.next(), Some(Ok(TagToken::Eq)));
        assert_eq!(tag.next(), Some(Ok(TagToken::Value("center"))));
        assert_eq!(tag.next(), Some(Ok(TagToken::End)));

        let mut markup = tag.morph::<Markup>();
        assert_eq!(markup.next(), Some(Ok(Markup::Text("hi"))));
        assert_eq!(markup.next(), Some(Ok(Markup::CloseTag("p"))));
    }
}
