//! Generic XML tree built from the token stream.
//!
//! Children stay in document order and entities are decoded; the typed
//! mapping in [`crate::parser`] walks this tree. Each element keeps the byte
//! span it covers in the source so unknown markup can be preserved verbatim.

use crate::error::{ParseError, ParseResult};
use crate::escape::unescape;
use crate::tokenizer::{Markup, TagToken};
use logos::{Lexer, Logos};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlContent>,
    /// From `<` of the start tag to `>` of the end tag
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlContent {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|child| match child {
            XmlContent::Element(el) => Some(el),
            XmlContent::Text(_) => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |el| el.name == name)
    }

    /// Concatenated character data of all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(children: &[XmlContent], out: &mut String) {
    for child in children {
        match child {
            XmlContent::Text(text) => out.push_str(text),
            XmlContent::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// Read a complete document and return its single root element.
pub fn read(source: &str) -> ParseResult<XmlElement> {
    let mut lexer = Markup::lexer(source);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    while let Some(token) = lexer.next() {
        let span = lexer.span();
        let token = token.map_err(|_| ParseError::invalid_syntax(span.start, "unexpected character"))?;

        match token {
            Markup::ProcessingInstruction | Markup::Comment | Markup::Doctype => {}
            Markup::CData(text) => push_text(&mut stack, text.to_string(), span.start)?,
            Markup::Text(text) => push_text(&mut stack, unescape(text).into_owned(), span.start)?,
            Markup::OpenTag(name) => {
                let mut tag_lexer = lexer.morph::<TagToken>();
                let (attributes, self_closing) = read_attributes(&mut tag_lexer, name)?;
                let end = tag_lexer.span().end;
                lexer = tag_lexer.morph();

                let element = XmlElement {
                    name: name.to_string(),
                    attributes,
                    children: Vec::new(),
                    span: span.start..end,
                };
                if self_closing {
                    attach(&mut stack, &mut root, element)?;
                } else {
                    stack.push(element);
                }
            }
            Markup::CloseTag(name) => {
                let mut element = stack.pop().ok_or_else(|| {
                    ParseError::invalid_syntax(span.start, format!("unexpected closing tag </{}>", name))
                })?;
                if element.name != name {
                    return Err(ParseError::mismatched_tag(span.start, element.name, name));
                }
                element.span.end = span.end;
                attach(&mut stack, &mut root, element)?;
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::unexpected_eof(format!("</{}>", open.name)));
    }
    root.ok_or_else(|| ParseError::MissingRoot {
        found: "no element".to_string(),
    })
}

fn read_attributes<'src>(
    lexer: &mut Lexer<'src, TagToken<'src>>,
    tag: &str,
) -> ParseResult<(Vec<(String, String)>, bool)> {
    let mut attributes: Vec<(String, String)> = Vec::new();

    loop {
        match next_tag_token(lexer, tag)? {
            TagToken::End => return Ok((attributes, false)),
            TagToken::SelfClose => return Ok((attributes, true)),
            TagToken::Name(name) => {
                let pos = lexer.span().start;
                match next_tag_token(lexer, tag)? {
                    TagToken::Eq => {}
                    other => {
                        return Err(ParseError::invalid_syntax(
                            lexer.span().start,
                            format!("expected '=' after attribute '{}', found {}", name, other),
                        ))
                    }
                }
                let value = match next_tag_token(lexer, tag)? {
                    TagToken::Value(value) => value,
                    other => {
                        return Err(ParseError::invalid_syntax(
                            lexer.span().start,
                            format!("expected quoted value for '{}', found {}", name, other),
                        ))
                    }
                };
                if attributes.iter().any(|(key, _)| key == name) {
                    return Err(ParseError::invalid_syntax(
                        pos,
                        format!("duplicate attribute '{}' on <{}>", name, tag),
                    ));
                }
                attributes.push((name.to_string(), unescape(value).into_owned()));
            }
            other => {
                return Err(ParseError::invalid_syntax(
                    lexer.span().start,
                    format!("unexpected {} in <{}> start tag", other, tag),
                ))
            }
        }
    }
}

fn next_tag_token<'src>(lexer: &mut Lexer<'src, TagToken<'src>>, tag: &str) -> ParseResult<TagToken<'src>> {
    match lexer.next() {
        Some(Ok(token)) => Ok(token),
        Some(Err(())) => Err(ParseError::invalid_syntax(
            lexer.span().start,
            format!("invalid character in <{}> start tag", tag),
        )),
        None => Err(ParseError::unexpected_eof(format!("end of <{}> start tag", tag))),
    }
}

fn push_text(stack: &mut [XmlElement], text: String, pos: usize) -> ParseResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            if let Some(XmlContent::Text(previous)) = parent.children.last_mut() {
                previous.push_str(&text);
            } else {
                parent.children.push(XmlContent::Text(text));
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ParseError::invalid_syntax(pos, "text outside the root element")),
    }
}

fn attach(stack: &mut [XmlElement], root: &mut Option<XmlElement>, element: XmlElement) -> ParseResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlContent::Element(element));
        return Ok(());
    }
    if root.is_some() {
        return Err(ParseError::invalid_syntax(
            element.span.start,
            format!("second root element <{}>", element.name),
        ));
    }
    *root = Some(element);
    Ok(())
}
