//! Raw-token classification: turns the pest scan into the typed token
//! stream consumed by the block builder, and decides the compilation mode
//! from the `#mode` directive.

use mandarine::diag::{Diagnostic, ErrorKind, Loc};
use mandarine::enums::enum_to_u32;
use mandarine::{DataType, Mode, Result};
use num_derive::{FromPrimitive, ToPrimitive};
use pest::iterators::Pair;
use pest::{Parser, Span};
use util::{EnumFromStr, ParseEnumError};
use util_derive::EnumFromStr;

use crate::parser::{MandParser, Rule};

pub const TOKEN_COUNT: u32 = 10;

#[derive(Clone, Copy, PartialEq, Eq, Debug, FromPrimitive, ToPrimitive)]
pub enum TokenKind {
    NOTOKEN,
    WORD,
    OPERAND,
    NAME,
    TYPE,
    CODEOPEN,
    CODECLOSE,
    NUM,
    STRING,
    MODE,
    COUNT,
}

/// One classified source token. The sticky flags record that no
/// whitespace separated the token from its neighbour; only `*` and `&`
/// consult them, to bind as pointer markers instead of operators.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub loc: Loc,
    pub text: String,
    pub sticky_left: bool,
    pub sticky_right: bool,
}

/// Tokens that must stand by themselves, surrounded by whitespace.
const ALONE_TOKENS: [&str; 6] = [".mem", ",mem", "..n", ".n", ".c", "."];

fn is_alone_token(word: &str) -> bool {
    ALONE_TOKENS.contains(&word)
}

fn protected_token(word: &str) -> Option<TokenKind> {
    match word {
        "while" | "copy" | "else" | "if" | "dos" | "linux" | "buf" => Some(TokenKind::WORD),
        "u8" | "u16" | "u8p" | "u16p" => Some(TokenKind::TYPE),
        _ => None,
    }
}

/// Maps the four type keywords onto their data types.
pub fn type_keyword(word: &str) -> Option<DataType> {
    match word {
        "u8" => Some(DataType::UINT8),
        "u16" => Some(DataType::UINT16),
        "u8p" => Some(DataType::UINT8MEM),
        "u16p" => Some(DataType::UINT16MEM),
        _ => None,
    }
}

fn check_token_count(context: &str) -> Result<()> {
    let found = enum_to_u32(TokenKind::COUNT);
    if found != TOKEN_COUNT {
        return Err(
            Diagnostic::fail(ErrorKind::ENUM, format!("Exhaustive token protection in {}", context))
                .with_expected(TOKEN_COUNT, found),
        );
    }
    Ok(())
}

fn span_loc(file: &str, span: &Span) -> Loc {
    let (line, column) = span.start_pos().line_col();
    Loc::new(file, (line - 1) as u32, (column - 1) as u32)
}

/// Scans `input` into classified tokens and the compilation mode. The
/// mode is fixed before the first real token and immutable afterwards.
pub fn scan(input: &str, file: &str) -> Result<(Vec<Token>, Mode)> {
    check_token_count("scan")?;

    let mut pairs = MandParser::parse(Rule::program, input)
        .map_err(|err| Diagnostic::fail(ErrorKind::TOKENIZE, format!("{}", err.with_path(file))))?;
    let program = pairs
        .next()
        .ok_or_else(|| Diagnostic::fail(ErrorKind::SELF, "scan produced no program pair"))?;
    let raw: Vec<Pair<Rule>> = program
        .into_inner()
        .filter(|pair| pair.as_rule() != Rule::EOI)
        .collect();

    check_alone_chunks(&raw, file)?;

    let mut mode = Mode::STANDARD;
    let mut tokens = Vec::with_capacity(raw.len());
    for (index, pair) in raw.iter().enumerate() {
        let span = pair.as_span();
        let sticky_left = index > 0 && raw[index - 1].as_span().end() == span.start();
        let sticky_right = index + 1 < raw.len() && span.end() == raw[index + 1].as_span().start();
        let loc = span_loc(file, &span);

        if mode == Mode::SET && pair.as_rule() != Rule::word {
            return Err(Diagnostic::fail(
                ErrorKind::TOKENIZE,
                format!("Wrong option for `#mode` provided, found `{}`", pair.as_str()),
            )
            .at(loc));
        }

        let token = match pair.as_rule() {
            Rule::string => {
                let text = pair
                    .clone()
                    .into_inner()
                    .next()
                    .map(|inner| inner.as_str())
                    .unwrap_or("");
                Token {
                    kind: TokenKind::STRING,
                    text: unescape(text, &loc)?,
                    loc,
                    sticky_left,
                    sticky_right,
                }
            }
            Rule::operand => {
                let kind = match pair.as_str() {
                    "(" | "{" => TokenKind::CODEOPEN,
                    ")" | "}" => TokenKind::CODECLOSE,
                    _ => TokenKind::OPERAND,
                };
                Token {
                    kind,
                    text: pair.as_str().to_owned(),
                    loc,
                    sticky_left,
                    sticky_right,
                }
            }
            Rule::word => classify_word(pair, &mut mode, loc, sticky_left, sticky_right)?,
            _ => {
                return Err(Diagnostic::fail(
                    ErrorKind::SELF,
                    format!("unexpected scan rule {:?}", pair.as_rule()),
                ))
            }
        };
        tokens.push(token);
    }

    if mode == Mode::SET {
        return Err(Diagnostic::fail(
            ErrorKind::TOKENIZE,
            "`#mode` directive is missing its option word",
        ));
    }
    Ok((tokens, mode))
}

/// Rejects alone tokens glued into a larger whitespace chunk, e.g. `.n;`.
/// Chunks are maximal runs of span-adjacent non-string tokens.
fn check_alone_chunks(raw: &[Pair<Rule>], file: &str) -> Result<()> {
    let mut start = 0;
    while start < raw.len() {
        let mut end = start + 1;
        while end < raw.len()
            && raw[end - 1].as_rule() != Rule::string
            && raw[end].as_rule() != Rule::string
            && raw[end - 1].as_span().end() == raw[end].as_span().start()
        {
            end += 1;
        }
        if end - start > 1 {
            let text: String = raw[start..end].iter().map(|pair| pair.as_str()).collect();
            for alone in &ALONE_TOKENS {
                if text.starts_with(*alone) || text.ends_with(*alone) {
                    return Err(Diagnostic::fail(
                        ErrorKind::TOKENIZE,
                        format!("keyword contains disallowed token `{}` in `{}`", alone, text),
                    )
                    .at(span_loc(file, &raw[start].as_span())));
                }
            }
        }
        start = end;
    }
    Ok(())
}

fn parse_mode_option(word: &str) -> std::result::Result<Mode, ParseEnumError> {
    let mode: Mode = EnumFromStr::from_str(&word.to_uppercase())?;
    match mode {
        Mode::DOS | Mode::LINUX => Ok(mode),
        _ => Err(ParseEnumError {
            value: word.to_owned(),
            enum_name: "Mode",
        }),
    }
}

fn classify_word(
    pair: &Pair<Rule>,
    mode: &mut Mode,
    loc: Loc,
    sticky_left: bool,
    sticky_right: bool,
) -> Result<Token> {
    let text = pair.as_str();
    let token = {
        let loc = loc.clone();
        move |kind: TokenKind, text: String| Token {
            kind,
            loc: loc.clone(),
            text,
            sticky_left,
            sticky_right,
        }
    };

    if *mode == Mode::SET {
        let option = parse_mode_option(text).map_err(|err| {
            Diagnostic::fail(ErrorKind::TOKENIZE, format!("Wrong option for `#mode` provided: {}", err))
                .at(loc.clone())
        })?;
        *mode = option;
        return Ok(token(TokenKind::NOTOKEN, text.to_owned()));
    }

    if text == "#mode" {
        if pair.as_span().start() != 0 {
            return Err(Diagnostic::fail(
                ErrorKind::PARSE,
                "Compilation option token found past the beginning of the file",
            )
            .at(loc));
        }
        *mode = Mode::SET;
        return Ok(token(TokenKind::NOTOKEN, text.to_owned()));
    }

    if is_alone_token(text) {
        return Ok(token(TokenKind::WORD, text.to_owned()));
    }

    if let Some(kind) = protected_token(text) {
        if text == "dos" && *mode != Mode::DOS {
            return Err(Diagnostic::fail(
                ErrorKind::TOKENIZE,
                "Usage of `dos` token in non-DOS mode of compilation",
            )
            .at(loc));
        }
        if text == "linux" && *mode != Mode::LINUX {
            return Err(Diagnostic::fail(
                ErrorKind::TOKENIZE,
                "Usage of `linux` token in non-LINUX mode of compilation",
            )
            .at(loc));
        }
        return Ok(token(kind, text.to_owned()));
    }

    for alone in &ALONE_TOKENS {
        if text.starts_with(*alone) || text.ends_with(*alone) {
            return Err(Diagnostic::fail(
                ErrorKind::TOKENIZE,
                format!("keyword contains disallowed token `{}` in `{}`", alone, text),
            )
            .at(loc));
        }
    }

    if text.chars().all(|c| c.is_ascii_digit()) {
        return Ok(token(TokenKind::NUM, text.to_owned()));
    }
    if text.chars().next().map_or(false, |c| c.is_ascii_digit()) {
        return Err(
            Diagnostic::fail(ErrorKind::TOKENIZE, "name token cannot begin with a number").at(loc),
        );
    }

    // the prefix keeps user names disjoint from assembler reserved words
    Ok(token(TokenKind::NAME, format!("v{}", text)))
}

/// Decodes string-literal escapes: `\n` and friends become their control
/// characters, `\"` an embedded quote, anything else passes through.
fn unescape(text: &str, loc: &Loc) -> Result<String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {
                return Err(Diagnostic::fail(
                    ErrorKind::TOKENIZE,
                    "dangling escape in string literal",
                )
                .at(loc.clone()))
            }
        }
    }
    Ok(out)
}
