use crate::error::{ParseError, ParseResult};
use logos::{Lexer, Logos};
use playbox_common::{Cursor, Span};
use std::fmt;

/// Token types for the script subset
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token<'src> {
    // Keywords
    #[token("const")]
    Const,

    #[token("let")]
    Let,

    #[token("var")]
    Var,

    #[token("function")]
    Function,

    #[token("return")]
    Return,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("for")]
    For,

    #[token("while")]
    While,

    #[token("do")]
    Do,

    #[token("break")]
    Break,

    #[token("continue")]
    Continue,

    #[token("switch")]
    Switch,

    #[token("case")]
    Case,

    #[token("default")]
    Default,

    #[token("throw")]
    Throw,

    #[token("try")]
    Try,

    #[token("catch")]
    Catch,

    #[token("finally")]
    Finally,

    #[token("new")]
    New,

    #[token("delete")]
    Delete,

    #[token("typeof")]
    Typeof,

    #[token("void")]
    Void,

    #[token("instanceof")]
    Instanceof,

    #[token("in")]
    In,

    #[token("this")]
    This,

    #[token("null")]
    Null,

    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("class")]
    Class,

    #[token("extends")]
    Extends,

    #[token("super")]
    Super,

    #[token("import")]
    Import,

    #[token("export")]
    Export,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"0[xX][0-9a-fA-F]+", |lex| lex.slice())]
    #[regex(r"0[bB][01]+", |lex| lex.slice())]
    #[regex(r"0[oO][0-7]+", |lex| lex.slice())]
    Number(&'src str),

    // Quoted, escapes still in place
    #[regex(r#""([^"\\\n]|\\(.|\n))*""#, |lex| lex.slice())]
    #[regex(r#"'([^'\\\n]|\\(.|\n))*'"#, |lex| lex.slice())]
    String(&'src str),

    // Whole template literal including backticks and substitutions
    #[token("`", lex_template)]
    Template(&'src str),

    // Symbols
    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    Semicolon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("...")]
    Ellipsis,

    #[token("?.")]
    QuestionDot,

    #[token("?")]
    Question,

    #[token(":")]
    Colon,

    #[token("=>")]
    Arrow,

    #[token("=")]
    Equals,

    #[token("==")]
    EqualsEquals,

    #[token("===")]
    StrictEquals,

    #[token("!=")]
    NotEquals,

    #[token("!==")]
    StrictNotEquals,

    #[token("<")]
    LAngle,

    #[token("<=")]
    LessThanEquals,

    #[token(">")]
    RAngle,

    #[token(">=")]
    GreaterThanEquals,

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

    #[token("**")]
    StarStar,

    #[token("++")]
    PlusPlus,

    #[token("--")]
    MinusMinus,

    #[token("!")]
    Bang,

    #[token("~")]
    Tilde,

    #[token("&")]
    Ampersand,

    #[token("|")]
    Pipe,

    #[token("^")]
    Caret,

    #[token("<<")]
    ShiftLeft,

    #[token(">>")]
    ShiftRight,

    #[token(">>>")]
    UnsignedShiftRight,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    PipePipe,

    #[token("??")]
    QuestionQuestion,

    #[token("+=")]
    PlusEquals,

    #[token("-=")]
    MinusEquals,

    #[token("*=")]
    StarEquals,

    #[token("/=")]
    SlashEquals,

    #[token("%=")]
    PercentEquals,

    #[token("**=")]
    StarStarEquals,

    #[token("??=")]
    QuestionQuestionEquals,

    #[token("||=")]
    PipePipeEquals,

    #[token("&&=")]
    AndAndEquals,
}

/// Consume a template literal after its opening backtick
fn lex_template<'src>(lex: &mut Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let mut cursor = Cursor::new(lex.source());
    cursor.set_pos(lex.span().start);
    cursor.skip_template().ok()?;
    lex.bump(cursor.pos() - lex.span().end);
    Some(lex.slice())
}

impl<'src> Token<'src> {
    /// Source text of keyword tokens, which may still be used as property names
    pub fn keyword(&self) -> Option<&'static str> {
        let text = match self {
            Token::Const => "const",
            Token::Let => "let",
            Token::Var => "var",
            Token::Function => "function",
            Token::Return => "return",
            Token::If => "if",
            Token::Else => "else",
            Token::For => "for",
            Token::While => "while",
            Token::Do => "do",
            Token::Break => "break",
            Token::Continue => "continue",
            Token::Switch => "switch",
            Token::Case => "case",
            Token::Default => "default",
            Token::Throw => "throw",
            Token::Try => "try",
            Token::Catch => "catch",
            Token::Finally => "finally",
            Token::New => "new",
            Token::Delete => "delete",
            Token::Typeof => "typeof",
            Token::Void => "void",
            Token::Instanceof => "instanceof",
            Token::In => "in",
            Token::This => "this",
            Token::Null => "null",
            Token::True => "true",
            Token::False => "false",
            Token::Class => "class",
            Token::Extends => "extends",
            Token::Super => "super",
            Token::Import => "import",
            Token::Export => "export",
            _ => return None,
        };
        Some(text)
    }
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(keyword) = self.keyword() {
            return write!(f, "'{}'", keyword);
        }
        let symbol = match self {
            Token::Ident(s) => return write!(f, "identifier '{}'", s),
            Token::Number(n) => return write!(f, "number {}", n),
            Token::String(s) => return write!(f, "string {}", s),
            Token::Template(_) => "template literal",
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Semicolon => ";",
            Token::Comma => ",",
            Token::Dot => ".",
            Token::Ellipsis => "...",
            Token::QuestionDot => "?.",
            Token::Question => "?",
            Token::Colon => ":",
            Token::Arrow => "=>",
            Token::Equals => "=",
            Token::EqualsEquals => "==",
            Token::StrictEquals => "===",
            Token::NotEquals => "!=",
            Token::StrictNotEquals => "!==",
            Token::LAngle => "<",
            Token::LessThanEquals => "<=",
            Token::RAngle => ">",
            Token::GreaterThanEquals => ">=",
            Token::Plus => "+",
            Token::Minus => "-",
            Token::Star => "*",
            Token::Slash => "/",
            Token::Percent => "%",
            Token::StarStar => "**",
            Token::PlusPlus => "++",
            Token::MinusMinus => "--",
            Token::Bang => "!",
            Token::Tilde => "~",
            Token::Ampersand => "&",
            Token::Pipe => "|",
            Token::Caret => "^",
            Token::ShiftLeft => "<<",
            Token::ShiftRight => ">>",
            Token::UnsignedShiftRight => ">>>",
            Token::AndAnd => "&&",
            Token::PipePipe => "||",
            Token::QuestionQuestion => "??",
            Token::PlusEquals => "+=",
            Token::MinusEquals => "-=",
            Token::StarEquals => "*=",
            Token::SlashEquals => "/=",
            Token::PercentEquals => "%=",
            Token::StarStarEquals => "**=",
            Token::QuestionQuestionEquals => "??=",
            Token::PipePipeEquals => "||=",
            Token::AndAndEquals => "&&=",
            _ => "keyword",
        };
        write!(f, "'{}'", symbol)
    }
}

/// Tokenize a source string, dropping anything unrecognized
pub fn tokenize(source: &str) -> Vec<(Token, Span)> {
    Token::lexer(source)
        .spanned()
        .filter_map(|(result, span)| result.ok().map(|token| (token, Span::from(span))))
        .collect()
}

/// Tokenize a source string, failing on the first unrecognized input
pub fn try_tokenize(source: &str) -> ParseResult<Vec<(Token, Span)>> {
    let mut tokens = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => tokens.push((token, Span::from(span))),
            Err(()) => {
                let text = &source[span.clone()];
                let message = match text.chars().next() {
                    Some('"') | Some('\'') => "Unterminated string constant".to_string(),
                    Some('`') => "Unterminated template literal".to_string(),
                    Some('/') if text.starts_with("/*") => "Unterminated comment".to_string(),
                    _ => format!("Invalid or unexpected token '{}'", text),
                };
                return Err(ParseError::lex_error(Span::from(span), message));
            }
        }
    }
    Ok(tokens)
}
