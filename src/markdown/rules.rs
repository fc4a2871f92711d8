//! R Markdown highlight rules
//!
//! Rules are tried in the order they appear; the first one matching at the
//! scan position wins. Several inline fragments are shared between states and
//! are built by the functions below.

use super::handlers::{fence_exit, fence_open, fenced_div, heading_level, slide_field};
use super::scanners::{
    CODE_SPAN, EMPHASIS_STARS, EMPHASIS_UNDERSCORE, STRONG_STARS, STRONG_UNDERSCORE,
};
use crate::grammar::{Entry, FenceFamily, GrammarDecl, RuleDecl, StateDecl};
use crate::token::TokenKind::{self, *};

/// Smallest and largest code fence widths with their own block state
pub const MIN_FENCE_WIDTH: usize = 3;
pub const MAX_FENCE_WIDTH: usize = 16;

/// Prefix of the per-width code block states
pub const FENCE_STATE_PREFIX: &str = "github-block";

const FENCE_LINE: &str = r"^\s*`{3,16}";

/// Text up to an unescaped `]`
const BRACKETED: &str = r"(?:[^\]\\]|\\.)*";

/// Text up to an unescaped `"`
const QUOTED: &str = r#"(?:[^"\\]|\\.)*"#;

fn escape() -> RuleDecl {
    RuleDecl::token(r"\\[\\`*_{}\[\]()#+\-.!]", Escape)
}

fn inverted_question() -> RuleDecl {
    RuleDecl::token(r"[?]`", Text)
}

fn inline_chunk() -> RuleDecl {
    RuleDecl::token(r"`r (?:.*?[^`])`", InlineChunk)
}

fn code_span() -> RuleDecl {
    RuleDecl::scanner(CODE_SPAN, &[Code, Code, Code])
}

fn inline_note() -> RuleDecl {
    RuleDecl::token(&format!(r"\^\[{}\]", BRACKETED), Text)
}

fn reference() -> RuleDecl {
    RuleDecl::captures(
        r#"^([ ]{0,3}\[)([^\]]+)(\]:\s*)([^ ]+)(\s*(?:"[^"]+")?)(\s*)$"#,
        &[Text, Constant, Text, Url, TokenKind::String, Text],
    )
}

fn link_by_reference() -> RuleDecl {
    RuleDecl::captures(
        &format!(r"(\s*\[)({b})(\]\[)({b})(\])", b = BRACKETED),
        &[Text, Keyword, Text, Constant, Text],
    )
}

fn link_by_url() -> RuleDecl {
    let source = format!(
        concat!(
            r"(\s*\[)({b})(\]\()",
            r#"((?:[^)\s\\]|\\.|\s+(?:[^)\s\\"]|\\.))*)"#,
            r#"(\s*(?:"{q}"\s*)?)"#,
            r"(\))",
            r"(?:(\s*\{{)([^}}]+)(\s*\}}))?",
        ),
        b = BRACKETED,
        q = QUOTED
    );
    RuleDecl::captures(
        &source,
        &[
            Text,
            Keyword,
            Text,
            Href,
            TokenKind::String,
            Text,
            BraceOperator,
            NoSpell,
            BraceOperator,
        ],
    )
}

fn url_link() -> RuleDecl {
    RuleDecl::captures(
        concat!(
            r"(<)(",
            r#"(?:https?|ftp|dict):[^'">\s]+"#,
            r"|",
            r"(?:mailto:)?[-.\w]+@[-a-z0-9]+(?:\.[-a-z0-9]+)*\.[a-z]+",
            r")(>)",
        ),
        &[Text, Keyword, Text],
    )
}

fn inline_math() -> RuleDecl {
    RuleDecl::captures(
        r"(\$)((?:\\.|[^$\\])*?)(\$)",
        &[MathBegin, MathContent, MathEnd],
    )
}

fn blank_line() -> RuleDecl {
    RuleDecl::token(r"^\s*$", EmptyLine)
}

fn emphasis() -> [RuleDecl; 4] {
    [
        RuleDecl::scanner(STRONG_STARS, &[Strong, Strong, Strong]),
        RuleDecl::scanner(STRONG_UNDERSCORE, &[Text, Strong, Strong, Strong]),
        RuleDecl::scanner(EMPHASIS_STARS, &[Emphasis]),
        RuleDecl::scanner(EMPHASIS_UNDERSCORE, &[Text, Emphasis]),
    ]
}

fn links() -> [RuleDecl; 5] {
    [
        inline_note(),
        reference(),
        link_by_reference(),
        link_by_url(),
        url_link(),
    ]
}

fn horizontal_rule(mark: &str) -> RuleDecl {
    RuleDecl::token(&format!(r"^\s*[{m}](?:\s*[{m}]){{2,}}\s*$", m = mark), HorizontalRule)
        .next("allowBlock")
}

fn start() -> StateDecl {
    StateDecl::new("start")
        .rule(RuleDecl::handler(FENCE_LINE, fence_open).not_followed_by("`"))
        .rule(blank_line().next("allowBlock"))
        .rules([inverted_question(), inline_chunk(), code_span()])
        .rule(RuleDecl::token(r"^={3,}\s*$", Heading(1)).next("fieldblock"))
        .rule(RuleDecl::token(r"^-{3,}", Heading(2)).followed_by(r"\s*$"))
        .rule(RuleDecl::handler(r"^:{3,}\s*.*$", fenced_div).next("start"))
        .rule(RuleDecl::computed(r"^#{1,6}", heading_level).next("header"))
        // ioslides bullet
        .rule(RuleDecl::token(r"^\s*>\s*", Blockquote).followed_by("-"))
        .rule(RuleDecl::token(r"^\s*>\s*", Blockquote).next("blockquote"))
        .rules([inline_note(), reference(), link_by_reference()])
        .rules([
            horizontal_rule(r"*"),
            horizontal_rule(r"\-"),
            horizontal_rule(r"_"),
        ])
        .rule(RuleDecl::token(r"\\\$", Text))
        .rule(RuleDecl::token(r"\$\$", MathBegin).next("mathjaxdisplay"))
        .rule(inline_math())
        .rule(RuleDecl::token(r"\\\[", MathBegin).next("mathjaxnativedisplay"))
        .rule(RuleDecl::token(r"\\\(", MathBegin).next("mathjaxnativeinline"))
        .rule(url_link())
        // embedded latex command
        .rule(RuleDecl::token(r"\\(?:[a-zA-Z0-9]+|[^a-zA-Z0-9])", Keyword))
        .rule(RuleDecl::token(r"[{}]", BraceOperator))
        // pandoc citation
        .rule(RuleDecl::token(r"-?@[\w-]+", Citation))
        .rule(RuleDecl::token(r"[^*_%$`\[#<>{}\\@\s!]+", Text))
        .rule(RuleDecl::token(r"\\", Text))
        .rule(RuleDecl::token(r"^\s*(?:[*+-]|\d+\.)\s+", Text).next("listblock"))
        .rules(emphasis())
        .rule(RuleDecl::token(r"<!--", Comment).next("html-comment"))
        .include("basic")
}

fn basic() -> StateDecl {
    StateDecl::new("basic")
        .rules([escape(), inverted_question(), inline_chunk(), code_span()])
        .rules(links())
        .rules(emphasis())
}

fn html_comment() -> StateDecl {
    StateDecl::new("html-comment")
        .rule(RuleDecl::token(r"-->", Comment).next("start"))
        .default_token(CommentText)
}

fn allow_block() -> StateDecl {
    StateDecl::new("allowBlock")
        .rule(RuleDecl::token(r"^ {4}.+", Code).next("allowBlock"))
        .rule(blank_line().next("allowBlock"))
        .rule(RuleDecl::token("", Empty).followed_by(".").next("start"))
}

fn header() -> StateDecl {
    StateDecl::new("header")
        .rule(RuleDecl::token("$", Text).next("start"))
        .include("basic")
        .default_token(HeadingText)
}

fn list_block() -> StateDecl {
    StateDecl::new("listblock")
        .rule(blank_line().next("start"))
        .rule(RuleDecl::token(r"^\s{0,3}(?:[*+-]|\d+\.)\s+", Text).next("listblock"))
        .rule(inline_math())
        .include_no_escape("basic")
}

fn blockquote() -> StateDecl {
    StateDecl::new("blockquote")
        .rule(blank_line().next("start"))
        .rules([escape(), inverted_question(), inline_chunk(), code_span()])
        .rules(links())
        .rules(emphasis())
        .default_token(Blockquote)
}

fn field_block() -> StateDecl {
    StateDecl::new("fieldblock")
        .rule(RuleDecl::computed(r"^[\w-]+:", slide_field).next("fieldblockvalue"))
        .rule(RuleDecl::token("", Text).followed_by(".+").next("start"))
}

fn field_block_value() -> StateDecl {
    StateDecl::new("fieldblockvalue")
        .rule(RuleDecl::token("$", Text).next("fieldblock"))
        .rule(RuleDecl::token(r"[^{}]+", Text))
}

fn math_display() -> StateDecl {
    StateDecl::new("mathjaxdisplay")
        .rule(RuleDecl::token(r"\$\$", MathEnd).next("start"))
        .rule(RuleDecl::token(r"[^$]+", MathContent))
}

fn math_native(name: &str, close: &str) -> StateDecl {
    StateDecl::new(name)
        .rule(RuleDecl::token(close, MathEnd).next("start"))
        .rule(RuleDecl::token(r"[\s\S]", MathContent))
}

fn fence_blocks() -> FenceFamily {
    FenceFamily {
        prefix: FENCE_STATE_PREFIX.to_string(),
        widths: MIN_FENCE_WIDTH..=MAX_FENCE_WIDTH,
        entries: vec![
            Entry::Rule(RuleDecl::handler(FENCE_LINE, fence_exit).not_followed_by("`")),
            Entry::Rule(RuleDecl::token(r".+", Code)),
        ],
        default_token: Code,
    }
}

/// The complete grammar declaration, initial state `start`
pub fn declaration() -> GrammarDecl {
    GrammarDecl::new("start")
        .state(start())
        .state(basic())
        .state(html_comment())
        .state(allow_block())
        .state(header())
        .state(list_block())
        .state(blockquote())
        .state(field_block())
        .state(field_block_value())
        .state(math_display())
        .state(math_native("mathjaxnativedisplay", r"\\\]"))
        .state(math_native("mathjaxnativeinline", r"\\\)"))
        .fences(fence_blocks())
}
