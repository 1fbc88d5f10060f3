//! # Lexer - Tokenizing Chat Markdown
//!
//! The first stage of the pipeline: source text becomes a flat, ordered
//! sequence of [`Token`]s.
//!
//! ## The Lossless Guarantee
//!
//! Every byte of the input appears in exactly one token, comments included
//! (they are emitted as [`TokenKind::Comment`] trivia and dropped by the
//! parser). Concatenating the token texts gives back the original:
//!
//! ```
//! use markdown_embeds_syntax::lexer::lex;
//!
//! let input = "# Hello, **world**!\n";
//! let reconstructed: String = lex(input).iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Rules
//!
//! At each cursor position the rules below are tried in order and the first
//! match wins. Rules marked *line start* only apply when nothing but
//! whitespace has been seen since the last newline.
//!
//! | rule | example | token |
//! |------|---------|-------|
//! | escape | `\*` | [`TokenKind::Escaped`] |
//! | escaped newline | `\` + newline | [`TokenKind::HardBreak`] |
//! | command | `{name:arg}` | [`TokenKind::Command`] |
//! | unordered list (*line start*) | `- ` | [`TokenKind::ListMarker`] |
//! | ordered list (*line start*) | `12. ` | [`TokenKind::ListMarker`] |
//! | heading (*line start*) | `## `, `#-`, `#!` | [`TokenKind::Heading`] |
//! | quote (*line start*) | `> ` | [`TokenKind::QuoteMarker`] |
//! | fenced code | ```` ```rust ...``` ```` | [`TokenKind::CodeBlock`] |
//! | inline code | `` `x` `` | [`TokenKind::InlineCode`] |
//! | mention | `<@123>`, `<t:1700000000:R>` | [`TokenKind::Mention`] |
//! | trailing spaces | `  ` + newline | [`TokenKind::HardBreak`] |
//! | comment | `<!-- x -->` | [`TokenKind::Comment`] |
//! | link opener | `[`, `![` | [`TokenKind::LinkStart`] |
//! | link middle | `](` | [`TokenKind::LinkMiddle`] |
//! | link closer | `)` | [`TokenKind::LinkEnd`] |
//! | style delimiters | `**` `__` `*` `_` `~~` | [`TokenKind::Delimiter`] |
//! | whitespace run | `\n\n  ` | [`TokenKind::Whitespace`] |
//! | word | `hello` | [`TokenKind::Text`] |
//! | any other char | `?` | [`TokenKind::Text`] |
//!
//! The rules up to comment depend on line position or scan lazily to a
//! closing marker, so they are matched by hand. From link opener on the
//! rules are context-free and come from the [Logos]-generated [`Atom`]
//! scanner.
//!
//! [Logos]: https://docs.rs/logos
//!
//! The last rule always matches, so every iteration advances the cursor and
//! lexing is total: there is no lexer error type.
//!
//! Two or more spaces before a newline only break the line when the next
//! line has content and the current line is not a heading; otherwise they
//! are ordinary whitespace, so blank lines still separate paragraphs and
//! headings still end at their newline.
//!
//! A fenced code block with no closing fence consumes the rest of the input
//! and is flagged `terminated: false`; the parser turns it back into literal
//! text.

use std::sync::OnceLock;

use logos::Logos;
use regex::Regex;
use serde::Serialize;

/// Which flavor of heading a `#` marker introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingVariant {
    /// `# Title` - a plain title.
    Block,
    /// `#-Title` - packed as an inline field when it fits.
    Inline,
    /// `#!Title` - always starts a new container.
    EmbedTitle,
}

impl HeadingVariant {
    fn from_marker(marker: char) -> Self {
        match marker {
            '-' => HeadingVariant::Inline,
            '!' => HeadingVariant::EmbedTitle,
            _ => HeadingVariant::Block,
        }
    }
}

/// The paired inline style a delimiter opens or closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    Bold,
    Underline,
    Italic,
    Strikethrough,
}

impl StyleKind {
    /// The delimiter this style is written with when re-serialized.
    pub fn default_marker(self) -> &'static str {
        match self {
            StyleKind::Bold => "**",
            StyleKind::Underline => "__",
            StyleKind::Italic => "*",
            StyleKind::Strikethrough => "~~",
        }
    }
}

/// Token kinds, each carrying the payload the parser needs.
///
/// Payload slices borrow from the source, so tokens are `Copy` and never
/// outlive the input they were produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// Literal text; the value is the token text itself.
    Text,
    /// `\x` - the escaped character, taken literally.
    Escaped(char),
    /// A forced line break: `\` or two or more spaces, then a newline.
    HardBreak,
    /// `{...}` - the expression between the braces.
    Command(&'a str),
    /// `- `, `* `, `+ ` or `N. ` at line start.
    ListMarker { ordered: bool, marker: &'a str },
    /// `>` at line start.
    QuoteMarker,
    /// `#` to `######` at line start, followed by the variant marker.
    Heading { level: u8, variant: HeadingVariant },
    /// `[` or `![`.
    LinkStart { image: bool },
    /// `](`
    LinkMiddle,
    /// `)`
    LinkEnd,
    /// ```` ```...``` ````; `code` is everything between the fences.
    CodeBlock { code: &'a str, terminated: bool },
    /// `` `...` ``
    InlineCode(&'a str),
    /// `<@id>`, `<@&id>`, `<#id>`, `</name:id>`, `<:name:id>` or `<t:secs>`.
    Mention,
    /// A style delimiter. Italics keep their literal marker in the token text.
    Delimiter(StyleKind),
    /// A run of whitespace with the number of newlines it contains.
    Whitespace { newlines: usize },
    /// `<!-- ... -->`, discarded by the parser.
    Comment,
}

/// A lexed token: its kind and the exact source text it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    /// Number of newlines if this token is a whitespace run.
    pub fn newlines(&self) -> Option<usize> {
        match self.kind {
            TokenKind::Whitespace { newlines } => Some(newlines),
            _ => None,
        }
    }

    /// True for a whitespace run containing at least `n` newlines.
    pub fn is_break(&self, n: usize) -> bool {
        self.newlines().is_some_and(|count| count >= n)
    }
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Invalid lexer regex"))
}

fn command_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^\{(.+?)\}")
}

fn unordered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^([-*+]) ")
}

fn ordered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^(\d+)\. ")
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^(#{1,6})([-! ])")
}

fn quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^> ?")
}

fn inline_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^`(.+?)`")
}

/// User, role, channel, slash command, custom emoji and timestamp mentions.
pub(crate) fn mention_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(
        &RE,
        r"^<(?:@!?(?P<user>\d+)|@&(?P<role>\d+)|#(?P<channel>\d+)|/(?P<command>[a-z0-9_-]+(?: [a-z0-9_-]+){0,2}):(?P<command_id>\d+)|(?P<animated>a?):(?P<emoji>\w+):(?P<emoji_id>\d+)|t:(?P<time>\d+)(?::(?P<style>[tTdDfFR]))?)>",
    )
}

fn trailing_spaces_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, r"^ {2,}\n")
}

const FENCE: &str = "```";
const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";

/// Lexer state: the cursor and whether we are at the start of a line.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line_start: bool,
    /// A heading marker was seen since the last newline.
    heading_line: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line_start: true,
            heading_line: false,
        }
    }

    /// Produce the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        let rest = &self.input[self.pos..];
        if rest.is_empty() {
            return None;
        }

        let (kind, len) = self.rule(rest);
        let text = &rest[..len];
        self.pos += len;
        self.line_start = match kind {
            TokenKind::HardBreak => true,
            TokenKind::Whitespace { newlines } => self.line_start || newlines > 0,
            _ => false,
        };
        self.heading_line = match kind {
            TokenKind::Heading { .. } => true,
            _ => self.heading_line && !text.contains('\n'),
        };
        Some(Token { kind, text })
    }

    /// Try every rule in priority order. The final rule always matches and
    /// consumes at least one character.
    fn rule(&self, rest: &'a str) -> (TokenKind<'a>, usize) {
        if let Some(hit) = escape(rest) {
            return hit;
        }
        if let Some(caps) = command_re().captures(rest) {
            let body = caps.get(1).map_or("", |m| m.as_str());
            return (TokenKind::Command(body), caps[0].len());
        }
        if self.line_start
            && let Some(hit) = self.line_start_rule(rest)
        {
            return hit;
        }
        if let Some(hit) = fenced_code(rest) {
            return hit;
        }
        if let Some(caps) = inline_code_re().captures(rest) {
            let code = caps.get(1).map_or("", |m| m.as_str());
            return (TokenKind::InlineCode(code), caps[0].len());
        }
        if let Some(m) = mention_re().find(rest) {
            return (TokenKind::Mention, m.len());
        }
        if !self.heading_line
            && let Some(len) = trailing_space_break(rest)
        {
            return (TokenKind::HardBreak, len);
        }
        if let Some(len) = comment(rest) {
            return (TokenKind::Comment, len);
        }
        atom(rest)
    }

    fn line_start_rule(&self, rest: &'a str) -> Option<(TokenKind<'a>, usize)> {
        if let Some(caps) = unordered_re().captures(rest) {
            let marker = caps.get(1).map_or("", |m| m.as_str());
            return Some((
                TokenKind::ListMarker {
                    ordered: false,
                    marker,
                },
                caps[0].len(),
            ));
        }
        if let Some(caps) = ordered_re().captures(rest) {
            let marker = caps.get(1).map_or("", |m| m.as_str());
            return Some((
                TokenKind::ListMarker {
                    ordered: true,
                    marker,
                },
                caps[0].len(),
            ));
        }
        if let Some(caps) = heading_re().captures(rest) {
            let level = caps[1].len() as u8;
            let variant = caps[2]
                .chars()
                .next()
                .map_or(HeadingVariant::Block, HeadingVariant::from_marker);
            return Some((TokenKind::Heading { level, variant }, caps[0].len()));
        }
        if let Some(m) = quote_re().find(rest) {
            return Some((TokenKind::QuoteMarker, m.len()));
        }
        None
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// `\x` takes the next character literally. A trailing backslash with
/// nothing after it falls through to plain text.
fn escape(rest: &str) -> Option<(TokenKind<'_>, usize)> {
    let mut chars = rest.chars();
    if chars.next() != Some('\\') {
        return None;
    }
    let escaped = chars.next()?;
    let kind = if escaped == '\n' {
        TokenKind::HardBreak
    } else {
        TokenKind::Escaped(escaped)
    };
    Some((kind, 1 + escaped.len_utf8()))
}

/// Two or more spaces and a newline, followed by a line with content.
fn trailing_space_break(rest: &str) -> Option<usize> {
    let len = trailing_spaces_re().find(rest)?.len();
    let next = rest[len..].trim_start_matches([' ', '\t']);
    (!next.is_empty() && !next.starts_with(['\n', '\r'])).then_some(len)
}

/// Non-greedy match of at least one character up to the next fence.
fn fenced_code(rest: &str) -> Option<(TokenKind<'_>, usize)> {
    let body = rest.strip_prefix(FENCE)?;
    let first = body.chars().next().map_or(0, char::len_utf8);
    match body[first..].find(FENCE) {
        Some(offset) if first > 0 => {
            let code = &body[..first + offset];
            Some((
                TokenKind::CodeBlock {
                    code,
                    terminated: true,
                },
                FENCE.len() * 2 + code.len(),
            ))
        }
        _ => Some((
            TokenKind::CodeBlock {
                code: body,
                terminated: false,
            },
            rest.len(),
        )),
    }
}

/// Context-free tokens. Anything Logos does not recognize is a single
/// character of text.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Atom {
    #[token("![")]
    ImageStart,
    #[token("[")]
    LinkStart,
    #[token("](")]
    LinkMiddle,
    #[token(")")]
    LinkEnd,
    #[token("**")]
    Bold,
    #[token("__")]
    Underline,
    #[token("*")]
    #[token("_")]
    Italic,
    #[token("~~")]
    Strikethrough,
    #[regex(r"\s+")]
    Whitespace,
    #[regex("[A-Za-z0-9]+")]
    Word,
}

impl Atom {
    fn to_token_kind<'a>(self, text: &str) -> TokenKind<'a> {
        match self {
            Atom::ImageStart => TokenKind::LinkStart { image: true },
            Atom::LinkStart => TokenKind::LinkStart { image: false },
            Atom::LinkMiddle => TokenKind::LinkMiddle,
            Atom::LinkEnd => TokenKind::LinkEnd,
            Atom::Bold => TokenKind::Delimiter(StyleKind::Bold),
            Atom::Underline => TokenKind::Delimiter(StyleKind::Underline),
            Atom::Italic => TokenKind::Delimiter(StyleKind::Italic),
            Atom::Strikethrough => TokenKind::Delimiter(StyleKind::Strikethrough),
            Atom::Whitespace => TokenKind::Whitespace {
                newlines: text.matches('\n').count(),
            },
            Atom::Word => TokenKind::Text,
        }
    }
}

/// The first context-free token of `rest`. Always consumes at least one
/// character.
fn atom(rest: &str) -> (TokenKind<'_>, usize) {
    let mut atoms = Atom::lexer(rest);
    match atoms.next() {
        Some(Ok(atom)) => (atom.to_token_kind(atoms.slice()), atoms.span().end),
        _ => {
            let len = rest.chars().next().map_or(1, char::len_utf8);
            (TokenKind::Text, len)
        }
    }
}

/// `<!--` + at least one character + `-->`, spanning lines.
fn comment(rest: &str) -> Option<usize> {
    let body = rest.strip_prefix(COMMENT_OPEN)?;
    let first = body.chars().next()?.len_utf8();
    let offset = body[first..].find(COMMENT_CLOSE)?;
    Some(COMMENT_OPEN.len() + first + offset + COMMENT_CLOSE.len())
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    let tokens: Vec<_> = Lexer::new(input).collect();
    log::debug!("lexed {} bytes into {} tokens", input.len(), tokens.len());
    tokens
}
