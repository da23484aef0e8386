/// Markup tokens and the token source abstraction the state machine reads.
///
/// `HtmlTokenizer` is the production source: a pull reader over `quick-xml`
/// configured to tolerate HTML (unclosed void elements, mismatched end tags,
/// unquoted attributes), fed with input cleaned up by the `markup` pass. Tag and
/// attribute names are lowercased; text and attribute values have HTML
/// entities resolved.

use quick_xml::events::{BytesStart, Event};
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use quick_xml::Reader;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::{self, Cursor, Read};
use thiserror::Error;
use tracing::debug;

use super::markup;

/// One unit of markup.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A run of character data between tags.
    Text(String),
    /// `<name attr="value">`
    StartTag {
        name: String,
        attrs: HashMap<String, String>,
    },
    /// `</name>`
    EndTag { name: String },
    /// `<name attr="value"/>`
    SelfClosingTag {
        name: String,
        attrs: HashMap<String, String>,
    },
}

impl Token {
    pub fn text(text: impl Into<String>) -> Self {
        Token::Text(text.into())
    }

    pub fn start(name: impl Into<String>) -> Self {
        Token::StartTag {
            name: name.into(),
            attrs: HashMap::new(),
        }
    }

    pub fn start_with(name: impl Into<String>, attrs: &[(&str, &str)]) -> Self {
        Token::StartTag {
            name: name.into(),
            attrs: attrs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn end(name: impl Into<String>) -> Self {
        Token::EndTag { name: name.into() }
    }

    pub fn self_closing(name: impl Into<String>) -> Self {
        Token::SelfClosingTag {
            name: name.into(),
            attrs: HashMap::new(),
        }
    }
}

/// Failure of the token source for any reason other than a clean end of
/// stream. Malformed markup is never an error; only reading can fail.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("I/O error while reading markup: {0}")]
    Io(#[from] io::Error),
}

/// A lazy, forward-only sequence of markup tokens.
///
/// `Ok(None)` is the clean end of the stream; an `Err` is terminal too.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Option<Token>, TokenError>;
}

/// Replays a prepared list of tokens, optionally ending in an error.
/// Useful for driving the state machine without markup.
#[derive(Debug, Default)]
pub struct TokenList {
    tokens: std::collections::VecDeque<Token>,
    terminal_error: Option<TokenError>,
}

impl TokenList {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenList {
            tokens: tokens.into(),
            terminal_error: None,
        }
    }

    /// Ends the sequence with `error` instead of a clean end of stream.
    pub fn ending_with(mut self, error: TokenError) -> Self {
        self.terminal_error = Some(error);
        self
    }
}

impl TokenSource for TokenList {
    fn next_token(&mut self) -> Result<Option<Token>, TokenError> {
        match self.tokens.pop_front() {
            Some(token) => Ok(Some(token)),
            None => match self.terminal_error.take() {
                Some(e) => Err(e),
                None => Ok(None),
            },
        }
    }
}

/// HTML tokenizer over any byte source.
///
/// The source is read to the end and cleaned up by `markup::normalize`
/// before the first token, so markup that the XML reader would reject
/// (stray `<`, script bodies, markup cut off by the end of input) comes out
/// the way a browser reads it. A read error is held back and reported after
/// the tokens of everything read before it.
pub struct HtmlTokenizer {
    reader: Reader<Cursor<Vec<u8>>>,
    buf: Vec<u8>,
    read_error: Option<io::Error>,
    finished: bool,
}

impl HtmlTokenizer {
    pub fn new<R: Read>(mut source: R) -> Self {
        let mut bytes = Vec::new();
        let read_error = source.read_to_end(&mut bytes).err();
        Self::with_read_error(&bytes, read_error)
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::with_read_error(bytes, None)
    }

    fn with_read_error(bytes: &[u8], read_error: Option<io::Error>) -> Self {
        let mut reader = Reader::from_reader(Cursor::new(markup::normalize(bytes)));
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        config.expand_empty_elements = false;
        config.trim_text(false);

        HtmlTokenizer {
            reader,
            buf: Vec::new(),
            read_error,
            finished: false,
        }
    }
}

impl TokenSource for HtmlTokenizer {
    fn next_token(&mut self) -> Result<Option<Token>, TokenError> {
        while !self.finished {
            self.buf.clear();
            let token = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => Token::StartTag {
                    name: tag_name(e.name().as_ref()),
                    attrs: attributes(&e),
                },
                Ok(Event::Empty(e)) => Token::SelfClosingTag {
                    name: tag_name(e.name().as_ref()),
                    attrs: attributes(&e),
                },
                Ok(Event::End(e)) => Token::EndTag {
                    name: tag_name(e.name().as_ref()),
                },
                Ok(Event::Text(e)) => Token::Text(decode_text(&e)),
                Ok(Event::Eof) => break,
                // nothing else survives normalization
                Ok(_) => continue,
                Err(quick_xml::Error::Io(e)) => {
                    self.finished = true;
                    return Err(TokenError::Io(io::Error::new(e.kind(), e.to_string())));
                }
                // markup not closed before the end of input
                Err(quick_xml::Error::Syntax(e)) => {
                    debug!(error = %e, "markup cut off at end of input");
                    break;
                }
                Err(e) => {
                    debug!(position = self.reader.error_position(), error = %e, "skipping malformed markup");
                    continue;
                }
            };
            return Ok(Some(token));
        }

        self.finished = true;
        match self.read_error.take() {
            Some(e) => Err(TokenError::Io(e)),
            None => Ok(None),
        }
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).to_ascii_lowercase()
}

fn attributes(start: &BytesStart<'_>) -> HashMap<String, String> {
    start
        .html_attributes()
        .filter_map(|attr| attr.ok())
        .map(|attr| {
            let key = tag_name(attr.key.as_ref());
            let raw = String::from_utf8_lossy(&attr.value);
            (key, unescape_html(&raw).into_owned())
        })
        .collect()
}

fn decode_text(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    unescape_html(&text).into_owned()
}

/// Resolves HTML5 named and numeric entities. Text with a broken entity is
/// passed through unchanged.
fn unescape_html(raw: &str) -> Cow<'_, str> {
    match unescape_with(raw, resolve_html5_entity) {
        Ok(text) => text,
        Err(_) => Cow::Borrowed(raw),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
