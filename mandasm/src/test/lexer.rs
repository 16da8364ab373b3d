use crate::lexer::{scan, TokenKind};
use mandarine::{ErrorKind, Mode};

fn kinds_and_texts(source: &str) -> Vec<(TokenKind, String)> {
    let (tokens, _) = scan(source, "test.mand").unwrap();
    tokens
        .into_iter()
        .map(|token| (token.kind, token.text))
        .collect()
}

#[test]
fn splits_glued_operators() {
    assert_eq!(
        kinds_and_texts("1+2"),
        vec![
            (TokenKind::NUM, "1".to_owned()),
            (TokenKind::OPERAND, "+".to_owned()),
            (TokenKind::NUM, "2".to_owned()),
        ]
    );
}

#[test]
fn operator_fusion_relexes_to_the_same_stream() {
    // sticky flags differ, the token stream does not
    assert_eq!(kinds_and_texts("x+y"), kinds_and_texts("x + y"));
    assert_eq!(kinds_and_texts("a<=b"), kinds_and_texts("a <= b"));
    assert_eq!(kinds_and_texts("42;"), kinds_and_texts("42 ;"));
}

#[test]
fn sticky_flags_record_adjacency() {
    let (tokens, _) = scan("a *b", "test.mand").unwrap();
    assert!(!tokens[0].sticky_right);
    assert!(!tokens[1].sticky_left);
    assert!(tokens[1].sticky_right);
    assert!(tokens[2].sticky_left);
}

#[test]
fn names_get_the_assembler_safe_prefix() {
    assert_eq!(
        kinds_and_texts("foo"),
        vec![(TokenKind::NAME, "vfoo".to_owned())]
    );
}

#[test]
fn keywords_are_not_names() {
    assert_eq!(
        kinds_and_texts("while copy u8"),
        vec![
            (TokenKind::WORD, "while".to_owned()),
            (TokenKind::WORD, "copy".to_owned()),
            (TokenKind::TYPE, "u8".to_owned()),
        ]
    );
}

#[test]
fn braces_classify_as_open_and_close() {
    assert_eq!(
        kinds_and_texts("( ) { }"),
        vec![
            (TokenKind::CODEOPEN, "(".to_owned()),
            (TokenKind::CODECLOSE, ")".to_owned()),
            (TokenKind::CODEOPEN, "{".to_owned()),
            (TokenKind::CODECLOSE, "}".to_owned()),
        ]
    );
}

#[test]
fn digit_initial_name_is_an_error() {
    let err = scan("4x", "test.mand").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TOKENIZE);
}

#[test]
fn alone_token_stands_alone() {
    assert_eq!(
        kinds_and_texts(". .n ..n .c .mem ,mem"),
        vec![
            (TokenKind::WORD, ".".to_owned()),
            (TokenKind::WORD, ".n".to_owned()),
            (TokenKind::WORD, "..n".to_owned()),
            (TokenKind::WORD, ".c".to_owned()),
            (TokenKind::WORD, ".mem".to_owned()),
            (TokenKind::WORD, ",mem".to_owned()),
        ]
    );
}

#[test]
fn alone_token_as_suffix_is_an_error() {
    assert_eq!(scan("x.n", "test.mand").unwrap_err().kind, ErrorKind::TOKENIZE);
    assert_eq!(scan(".n;", "test.mand").unwrap_err().kind, ErrorKind::TOKENIZE);
}

#[test]
fn mode_directive_sets_the_mode() {
    let (tokens, mode) = scan("#mode dos", "test.mand").unwrap();
    assert_eq!(mode, Mode::DOS);
    assert!(tokens.iter().all(|token| token.kind == TokenKind::NOTOKEN));

    let (_, mode) = scan("#mode linux", "test.mand").unwrap();
    assert_eq!(mode, Mode::LINUX);
}

#[test]
fn mode_directive_must_lead_the_file() {
    let err = scan("1 #mode dos", "test.mand").unwrap_err();
    assert_eq!(err.kind, ErrorKind::PARSE);
}

#[test]
fn mode_directive_rejects_unknown_options() {
    let err = scan("#mode amiga", "test.mand").unwrap_err();
    assert_eq!(err.kind, ErrorKind::TOKENIZE);
}

#[test]
fn platform_keywords_require_their_mode() {
    assert_eq!(scan("9 dos", "test.mand").unwrap_err().kind, ErrorKind::TOKENIZE);
    assert_eq!(scan("1 linux", "test.mand").unwrap_err().kind, ErrorKind::TOKENIZE);
    assert!(scan("#mode dos\n9 dos", "test.mand").is_ok());
}

#[test]
fn string_escapes_decode() {
    let (tokens, _) = scan("\"HI\\n\\\"x\\\"\"", "test.mand").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::STRING);
    assert_eq!(tokens[0].text, "HI\n\"x\"");
}

#[test]
fn lone_backslash_is_an_error() {
    assert_eq!(scan("a \\ b", "test.mand").unwrap_err().kind, ErrorKind::TOKENIZE);
}

#[test]
fn comments_vanish() {
    assert_eq!(kinds_and_texts("1 \\\\ 2 3 4\n5"), kinds_and_texts("1 5"));
}
