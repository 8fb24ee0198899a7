//! Lexer implementation using logos

mod token;

pub use token::Token;

use crate::ast::Span;
use crate::error::{CompileError, Result};
use logos::Logos;

/// Tokenize source code
pub fn tokenize(source: &str) -> Result<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::new(lexer.span().start, lexer.span().end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(_) => {
                return Err(CompileError::lexer(
                    format!("unexpected character: {:?}", lexer.slice()),
                    span,
                ));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").unwrap().is_empty());
    }

    #[test]
    fn test_tokenize_keywords() {
        assert_eq!(
            kinds("fun type var elseif neg end"),
            vec![Token::Fun, Token::Type, Token::Var, Token::Elseif, Token::Neg, Token::End]
        );
    }

    #[test]
    fn test_tokenize_keyword_prefix_is_identifier() {
        assert_eq!(kinds("integer"), vec![Token::Ident("integer".to_string())]);
        assert_eq!(kinds("ends"), vec![Token::Ident("ends".to_string())]);
    }

    #[test]
    fn test_tokenize_numbers_keep_text() {
        assert_eq!(
            kinds("42 3.14 .5"),
            vec![
                Token::IntLit("42".to_string()),
                Token::DoubleLit("3.14".to_string()),
                Token::DoubleLit(".5".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_string_without_escapes() {
        assert_eq!(
            kinds(r#""a\nb""#),
            vec![Token::StringLit("a\\nb".to_string())]
        );
    }

    #[test]
    fn test_tokenize_char() {
        assert_eq!(kinds("'x'"), vec![Token::CharLit('x')]);
    }

    #[test]
    fn test_tokenize_matrix_operators() {
        assert_eq!(
            kinds("a .* b ./ c .^ d ~e"),
            vec![
                Token::Ident("a".to_string()),
                Token::DotStar,
                Token::Ident("b".to_string()),
                Token::DotSlash,
                Token::Ident("c".to_string()),
                Token::DotCaret,
                Token::Ident("d".to_string()),
                Token::Tilde,
                Token::Ident("e".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_field_path() {
        assert_eq!(
            kinds("p.next"),
            vec![
                Token::Ident("p".to_string()),
                Token::Dot,
                Token::Ident("next".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_comparisons() {
        assert_eq!(
            kinds("== != <= >= < > ="),
            vec![
                Token::EqEq,
                Token::NotEq,
                Token::LtEq,
                Token::GtEq,
                Token::Lt,
                Token::Gt,
                Token::Eq,
            ]
        );
    }

    #[test]
    fn test_tokenize_skips_comments() {
        let tokens = tokenize("# a comment\nvar # trailing\n").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].0, Token::Var);
        assert_eq!(tokens[0].1, Span::new(12, 15));
    }

    #[test]
    fn test_tokenize_error_has_span() {
        let err = tokenize("var x = @").unwrap_err();
        assert_eq!(err.span(), Some(Span::new(8, 9)));
        assert!(err.message().contains('@'));
    }

    #[test]
    fn test_token_display() {
        assert_eq!(Token::DotStar.to_string(), ".*");
        assert_eq!(Token::StringLit("hi".to_string()).to_string(), "\"hi\"");
    }
}
