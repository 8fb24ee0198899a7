//! Token definitions

use logos::Logos;

/// MyPL token
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"#[^\n]*")]
pub enum Token {
    // Declarations
    #[token("type")]
    Type,
    #[token("fun")]
    Fun,
    #[token("var")]
    Var,
    #[token("new")]
    New,
    #[token("end")]
    End,

    // Control flow
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("elseif")]
    Elseif,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("to")]
    To,
    #[token("do")]
    Do,
    #[token("return")]
    Return,

    // Word operators
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("neg")]
    Neg,

    // Values
    #[token("nil")]
    Nil,
    #[token("true")]
    True,
    #[token("false")]
    False,

    // Primitive type names
    #[token("int")]
    IntType,
    #[token("double")]
    DoubleType,
    #[token("bool")]
    BoolType,
    #[token("char")]
    CharType,
    #[token("string")]
    StringType,
    #[token("matrix")]
    MatrixType,

    // Literals keep their text; range is checked when evaluated
    #[regex(r"[0-9]+", |lex| lex.slice().to_string())]
    IntLit(String),
    #[regex(r"[0-9]*\.[0-9]+", |lex| lex.slice().to_string())]
    DoubleLit(String),
    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    StringLit(String),
    #[regex(r"'[^']'", |lex| lex.slice().chars().nth(1))]
    CharLit(char),

    #[regex(r"[a-zA-Z][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token(".*")]
    DotStar,
    #[token("./")]
    DotSlash,
    #[token(".^")]
    DotCaret,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    LtEq,
    #[token(">")]
    Gt,
    #[token(">=")]
    GtEq,
    #[token("=")]
    Eq,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Type => write!(f, "type"),
            Token::Fun => write!(f, "fun"),
            Token::Var => write!(f, "var"),
            Token::New => write!(f, "new"),
            Token::End => write!(f, "end"),
            Token::If => write!(f, "if"),
            Token::Then => write!(f, "then"),
            Token::Elseif => write!(f, "elseif"),
            Token::Else => write!(f, "else"),
            Token::While => write!(f, "while"),
            Token::For => write!(f, "for"),
            Token::To => write!(f, "to"),
            Token::Do => write!(f, "do"),
            Token::Return => write!(f, "return"),
            Token::And => write!(f, "and"),
            Token::Or => write!(f, "or"),
            Token::Not => write!(f, "not"),
            Token::Neg => write!(f, "neg"),
            Token::Nil => write!(f, "nil"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::IntType => write!(f, "int"),
            Token::DoubleType => write!(f, "double"),
            Token::BoolType => write!(f, "bool"),
            Token::CharType => write!(f, "char"),
            Token::StringType => write!(f, "string"),
            Token::MatrixType => write!(f, "matrix"),
            Token::IntLit(s) | Token::DoubleLit(s) => write!(f, "{s}"),
            Token::StringLit(s) => write!(f, "\"{s}\""),
            Token::CharLit(c) => write!(f, "'{c}'"),
            Token::Ident(s) => write!(f, "{s}"),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Caret => write!(f, "^"),
            Token::Tilde => write!(f, "~"),
            Token::DotStar => write!(f, ".*"),
            Token::DotSlash => write!(f, "./"),
            Token::DotCaret => write!(f, ".^"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::Eq => write!(f, "="),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semi => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Dot => write!(f, "."),
        }
    }
}
