//! Context-sensitive rule handlers
//!
//! Code fences and pandoc fenced divs cannot be classified from the match
//! alone. Fences must close with the width they opened with; fenced divs take
//! their color from a rotation that runs across the whole document.

use crate::grammar::{MatchInput, Outcome, State, Transition};
use crate::token::TokenKind;
use crate::tokenizer::Context;

/// Slide and front-matter field names highlighted after a `===` rule
pub const SLIDE_FIELDS: &[&str] = &[
    "title",
    "author",
    "date",
    "rtl",
    "depends",
    "autosize",
    "width",
    "height",
    "transition",
    "transition-speed",
    "font-family",
    "css",
    "class",
    "navigation",
    "incremental",
    "left",
    "right",
    "id",
    "audio",
    "video",
    "type",
    "at",
    "help-doc",
    "help-topic",
    "source",
    "console",
    "console-input",
    "execute",
    "pause",
];

/// ATX heading level from the run of `#`
pub fn heading_level(text: &str) -> TokenKind {
    TokenKind::Heading(text.len().clamp(1, 6) as u8)
}

/// `name:` at the start of a field line
pub fn slide_field(text: &str) -> TokenKind {
    let name = text.strip_suffix(':').unwrap_or(text);
    if SLIDE_FIELDS.contains(&name) {
        TokenKind::SlideField
    } else {
        TokenKind::Text
    }
}

/// Number of backticks in a fence line, ignoring leading whitespace
fn fence_width(text: &str) -> usize {
    text.trim_start().bytes().take_while(|&b| b == b'`').count()
}

/// Opening code fence
///
/// Enters the block state for the fence's width and remembers where to come
/// back to. Fences are not nested: inside an open fence this is plain code.
pub fn fence_open(input: &MatchInput<'_>, ctx: &mut Context) -> Outcome {
    let token = Outcome::single(TokenKind::Code, input.text.len());
    if ctx.in_fence() {
        return token.with_transition(Transition::Stay);
    }

    let width = fence_width(input.text);
    match input.grammar.fence_state(width) {
        Some(block) => {
            ctx.open_fence(width, input.state);
            token.with_transition(Transition::To(block))
        }
        None => token.with_transition(Transition::Stay),
    }
}

/// Fence line inside a code block; closes only on a matching width
pub fn fence_exit(input: &MatchInput<'_>, ctx: &mut Context) -> Outcome {
    let token = Outcome::single(TokenKind::Code, input.text.len());
    let expected = ctx
        .fence_width
        .or_else(|| input.grammar.state(input.state).and_then(State::width));
    if expected != Some(fence_width(input.text)) {
        return token.with_transition(Transition::Stay);
    }

    let back = ctx
        .close_fence()
        .unwrap_or_else(|| input.grammar.initial_state());
    token.with_transition(Transition::To(back))
}

/// Pandoc fenced div line (`:::`)
///
/// With rainbow coloring on, an opening line takes the current color and a
/// bare closing line takes it and advances the rotation.
pub fn fenced_div(input: &MatchInput<'_>, ctx: &mut Context) -> Outcome {
    let text = input.text;
    if !input.config.rainbow_enabled {
        return Outcome::single(TokenKind::KeywordOperator, text.len());
    }

    let count = input.config.color_count.max(1);
    let color = ctx.current_color(count);
    let colons = text.bytes().take_while(|&b| b == b':').count();

    if text[colons..].trim().is_empty() {
        ctx.advance_color(color, count);
        return Outcome::single(TokenKind::FencedDiv(color), text.len());
    }

    Outcome {
        tokens: vec![
            (TokenKind::FencedDiv(color), colons),
            (TokenKind::FencedDivText(color), text.len() - colons),
        ],
        transition: Transition::Declared,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level() {
        assert_eq!(heading_level("#"), TokenKind::Heading(1));
        assert_eq!(heading_level("####"), TokenKind::Heading(4));
        assert_eq!(heading_level("######"), TokenKind::Heading(6));
    }

    #[test]
    fn test_slide_field() {
        assert_eq!(slide_field("title:"), TokenKind::SlideField);
        assert_eq!(slide_field("transition-speed:"), TokenKind::SlideField);
        assert_eq!(slide_field("colour:"), TokenKind::Text);
    }

    #[test]
    fn test_fence_width_ignores_indent() {
        assert_eq!(fence_width("```"), 3);
        assert_eq!(fence_width("  ````"), 4);
        assert_eq!(fence_width("\t`````"), 5);
    }
}
