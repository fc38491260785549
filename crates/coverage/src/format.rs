//! CSS formatting for the emitted artifacts.
//!
//! The buffers being formatted are slices of real stylesheets cut at
//! arbitrary offsets, so they are frequently not valid CSS. A
//! [`CssFormatter`] is allowed to fail; [`format_or_fallback`] then applies
//! the regex-based [`fallback`] so output is always produced.

use crate::error::{ErrorKind, Result};
use cssparser::{ParseError, Parser, ParserInput, ToCss, Token};
use regex::Regex;
use std::sync::LazyLock;

const INDENT: &str = "  ";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(BRACE_REGEX, r"\s*([\{\}])\s*");
regex!(SEMICOLON_REGEX, r";\s*");
regex!(OPEN_BRACE_REGEX, r"\s*\{\s*");
regex!(CLOSE_BRACE_REGEX, r"\n\s*\}\s*");
regex!(COMMA_REGEX, r",\s*");
regex!(BLANK_LINE_REGEX, r"\n\s*\n");

/// A CSS pretty-printer.
pub trait CssFormatter: Send + Sync {
    /// Formats `css`, failing with [`ErrorKind::Format`] when the input is too
    /// malformed to print.
    fn format(&self, css: &str) -> Result<String>;
}

/// Formats with `formatter`, falling back to [`fallback`] if it fails.
pub fn format_or_fallback(formatter: &dyn CssFormatter, css: &str) -> String {
    match formatter.format(css) {
        Ok(formatted) => formatted,
        Err(err) => {
            tracing::warn!(error = %err, "CSS formatter failed; using fallback formatting");
            fallback(css)
        },
    }
}

/// Deterministic, never-failing formatter: one rule body line per
/// declaration, braces on their own lines. Only whitespace changes.
pub fn fallback(css: &str) -> String {
    let css = BRACE_REGEX.replace_all(css, " ${1}\n");
    let css = SEMICOLON_REGEX.replace_all(&css, ";\n  ");
    let css = OPEN_BRACE_REGEX.replace_all(&css, " {\n  ");
    let css = CLOSE_BRACE_REGEX.replace_all(&css, "\n}\n");
    let css = COMMA_REGEX.replace_all(&css, ", ");
    BLANK_LINE_REGEX.replace_all(&css, "\n").into_owned()
}

/// Token-level pretty-printer built on [`cssparser`].
///
/// Blocks are indented two spaces per level and every declaration ends its
/// line. Source whitespace between tokens collapses to a single space. Bad
/// strings, bad URLs and closing brackets without an opener are rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrettyFormatter;

impl CssFormatter for PrettyFormatter {
    fn format(&self, css: &str) -> Result<String> {
        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut printer = Printer::default();
        if print_tokens(&mut parser, &mut printer).is_err() {
            exn::bail!(ErrorKind::Format);
        }
        Ok(printer.finish())
    }
}

fn print_tokens<'i>(parser: &mut Parser<'i, '_>, printer: &mut Printer) -> std::result::Result<(), ParseError<'i, ()>> {
    loop {
        let token = match parser.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => return Ok(()),
        };
        match token {
            Token::WhiteSpace(_) => printer.space(),
            Token::Comment(_) => {
                let own_line = printer.at_line_start();
                printer.write(&token.to_css_string());
                if own_line {
                    printer.newline();
                }
            },
            Token::Semicolon => {
                printer.write(";");
                printer.newline();
            },
            Token::CurlyBracketBlock => {
                printer.space();
                printer.write("{");
                printer.newline();
                printer.depth += 1;
                parser.parse_nested_block(|nested| print_tokens(nested, printer))?;
                printer.depth -= 1;
                printer.newline();
                printer.write("}");
                printer.newline();
            },
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                let closing = if matches!(token, Token::SquareBracketBlock) { "]" } else { ")" };
                printer.write(&token.to_css_string());
                parser.parse_nested_block(|nested| print_tokens(nested, printer))?;
                printer.close(closing);
            },
            Token::BadString(_)
            | Token::BadUrl(_)
            | Token::CloseCurlyBracket
            | Token::CloseParenthesis
            | Token::CloseSquareBracket => return Err(parser.new_unexpected_token_error(token)),
            other => printer.write(&other.to_css_string()),
        }
    }
}

#[derive(Default)]
struct Printer {
    out: String,
    depth: usize,
    space: bool,
}
impl Printer {
    fn at_line_start(&self) -> bool {
        self.out.is_empty() || self.out.ends_with('\n')
    }

    fn space(&mut self) {
        self.space = !self.at_line_start() && !self.out.ends_with(['(', '[']);
    }

    fn write(&mut self, s: &str) {
        if self.at_line_start() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
        } else if self.space {
            self.out.push(' ');
        }
        self.space = false;
        self.out.push_str(s);
    }

    fn close(&mut self, s: &str) {
        self.space = false;
        self.write(s);
    }

    fn newline(&mut self) {
        if !self.at_line_start() {
            self.out.push('\n');
        }
        self.space = false;
    }

    fn finish(mut self) -> String {
        self.newline();
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Failing;
    impl CssFormatter for Failing {
        fn format(&self, _css: &str) -> Result<String> {
            exn::bail!(ErrorKind::Format)
        }
    }

    #[rstest]
    #[case("a{color:red;background:blue}", "a {\n  color:red;\n  background:blue\n}\n")]
    #[case("a { color: red; }", "a {\n  color: red;\n}\n")]
    #[case("@media (max-width:600px){a{b:c}}", "@media (max-width:600px) {\n  a {\n    b:c\n  }\n}\n")]
    #[case("/* header */\np{margin:0}", "/* header */\np {\n  margin:0\n}\n")]
    #[case("a{width:calc(100% - 2px)}", "a {\n  width:calc(100% - 2px)\n}\n")]
    #[case("", "")]
    fn test_pretty(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(PrettyFormatter.format(input).unwrap(), expected);
    }

    #[rstest]
    #[case("}a{")]
    #[case("a{b:c)}")]
    #[case("a{content:\"unterminated\n}")]
    fn test_pretty_rejects_malformed(#[case] input: &str) {
        let err = PrettyFormatter.format(input).unwrap_err();
        assert_eq!(*err, ErrorKind::Format);
    }

    #[rstest]
    #[case("a{color:red;}", "a {\n  color:red;\n}\n")]
    #[case("a{color:red;background:blue}", "a {\n  color:red;\n  background:blue }\n")]
    #[case("h1,h2{margin:0}", "h1, h2 {\n  margin:0 }\n")]
    fn test_fallback(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(fallback(input), expected);
    }

    #[test]
    fn test_fallback_is_used_when_formatter_fails() {
        let css = "a{color:red;}";
        assert_eq!(format_or_fallback(&Failing, css), fallback(css));
        assert_eq!(format_or_fallback(&PrettyFormatter, css), "a {\n  color:red;\n}\n");
    }
}
