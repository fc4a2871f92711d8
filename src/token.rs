//! Token kinds and emitted tokens
//!
//! Every span the tokenizer produces carries a [`TokenKind`]. Kinds map to the
//! dotted scope names editors use for theming (see [`TokenKind::scope`]).

use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;

/// Semantic classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Plain content
    Text,
    EmptyLine,
    Empty,
    Escape,

    // Code
    InlineChunk,
    Code,

    // Headings
    Heading(u8),
    HeadingText,

    // Pandoc fenced divs
    FencedDiv(usize),
    FencedDivText(usize),
    KeywordOperator,

    // Block structure
    Blockquote,
    HorizontalRule,

    // Links and references
    Constant,
    Url,
    String,
    Keyword,
    Href,
    BraceOperator,
    NoSpell,
    Citation,

    // Math
    MathBegin,
    MathEnd,
    MathContent,

    // Emphasis
    Strong,
    Emphasis,

    // Comments and slide fields
    Comment,
    CommentText,
    SlideField,
}

impl TokenKind {
    /// Scope name used by editor themes
    pub fn scope(&self) -> Cow<'static, str> {
        let name = match self {
            TokenKind::Heading(level) => return Cow::Owned(format!("markup.heading.{}", level)),
            TokenKind::FencedDiv(color) => return Cow::Owned(format!("fenced_div_{}", color)),
            TokenKind::FencedDivText(color) => {
                return Cow::Owned(format!("fenced_div_text_{}", color))
            }
            TokenKind::Text => "text",
            TokenKind::EmptyLine => "empty_line",
            TokenKind::Empty => "empty",
            TokenKind::Escape => "constant.language.escape",
            TokenKind::InlineChunk => "support.function.inline_r_chunk",
            TokenKind::Code => "support.function",
            TokenKind::HeadingText => "heading",
            TokenKind::KeywordOperator => "keyword.operator",
            TokenKind::Blockquote => "string.blockquote",
            TokenKind::HorizontalRule => "constant.hr",
            TokenKind::Constant => "constant",
            TokenKind::Url => "url",
            TokenKind::String => "string",
            TokenKind::Keyword => "keyword",
            TokenKind::Href => "markup.href",
            TokenKind::BraceOperator => "paren.keyword.operator",
            TokenKind::NoSpell => "nospell",
            TokenKind::Citation => "markup.list",
            TokenKind::MathBegin => "latex.markup.list.string.begin",
            TokenKind::MathEnd => "latex.markup.list.string.end",
            TokenKind::MathContent => "latex.support.function",
            TokenKind::Strong => "constant.numeric.text",
            TokenKind::Emphasis => "constant.language.boolean.text",
            TokenKind::Comment => "comment",
            TokenKind::CommentText => "comment.text",
            TokenKind::SlideField => "comment.doc.tag",
        };
        Cow::Borrowed(name)
    }

    /// Whether tokens of this kind hold structural brackets for brace matching
    pub fn is_brace(&self) -> bool {
        matches!(self, TokenKind::BraceOperator)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.scope())
    }
}

impl Serialize for TokenKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.scope())
    }
}

/// A single classified span of a line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Token {
    /// Classification of this span
    pub kind: TokenKind,
    /// The covered text
    pub text: String,
    /// Start column (in characters) within the line
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, column: usize) -> Self {
        Self {
            kind,
            text: text.into(),
            column,
        }
    }

    /// Column one past the last character of this token
    pub fn end_column(&self) -> usize {
        self.column + self.text.chars().count()
    }

    /// Whether the given column falls inside this token
    pub fn contains_column(&self, column: usize) -> bool {
        column >= self.column && column < self.end_column()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_computed_scopes() {
        assert_eq!(TokenKind::Heading(3).scope(), "markup.heading.3");
        assert_eq!(TokenKind::FencedDiv(2).scope(), "fenced_div_2");
        assert_eq!(TokenKind::FencedDivText(0).scope(), "fenced_div_text_0");
    }

    #[test]
    fn test_static_scopes() {
        assert_eq!(TokenKind::Code.to_string(), "support.function");
        assert_eq!(TokenKind::BraceOperator.scope(), "paren.keyword.operator");
    }

    #[test]
    fn test_token_columns() {
        let token = Token::new(TokenKind::Text, "héllo", 2);
        assert_eq!(token.end_column(), 7);
        assert!(token.contains_column(2));
        assert!(token.contains_column(6));
        assert!(!token.contains_column(7));
    }

    #[test]
    fn test_token_serializes_scope() {
        let token = Token::new(TokenKind::Heading(1), "#", 0);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(json, r##"{"kind":"markup.heading.1","text":"#","column":0}"##);
    }
}
