use crate::span::Span;
use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
pub enum Token {
    // Numbers - highest priority so "-5" is not a dash followed by 5
    #[regex(r"-?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", parse_number, priority = 10)]
    Number(f64),

    // Atoms - sample, instrument and note names
    #[regex(r"[a-zA-Z][a-zA-Z0-9_#]*", priority = 5)]
    Atom,

    // Delimiters
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Separators
    #[token(",")]
    Comma,
    #[token("|")]
    Pipe,

    // Operators
    #[token("@")]
    At,
    #[token("_")]
    Underscore,
    #[token("!")]
    Bang,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("?")]
    Question,

    // Rests
    #[token("~")]
    Tilde,
    #[token("-")]
    Dash,

    // Comments
    #[regex(r"//[^\n]*")]
    Comment,

    // Anything the lexer could not classify
    Error,
}

fn parse_number(lex: &mut logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok().filter(|n: &f64| n.is_finite())
}

impl Token {
    pub fn is_closing(&self) -> bool {
        matches!(self, Token::RBracket | Token::RAngle | Token::RParen)
    }

    /// Tokens that end a sequence without being part of it
    pub fn ends_sequence(&self) -> bool {
        self.is_closing() || matches!(self, Token::Comma | Token::Pipe)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Atom => write!(f, "atom"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LAngle => write!(f, "<"),
            Token::RAngle => write!(f, ">"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
            Token::Pipe => write!(f, "|"),
            Token::At => write!(f, "@"),
            Token::Underscore => write!(f, "_"),
            Token::Bang => write!(f, "!"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Question => write!(f, "?"),
            Token::Tilde => write!(f, "~"),
            Token::Dash => write!(f, "-"),
            Token::Comment => write!(f, "comment"),
            Token::Error => write!(f, "error"),
        }
    }
}

/// Lexer wrapper with position tracking
pub struct Lexer<'source> {
    inner: logos::Lexer<'source, Token>,
    peeked: Option<Option<(Token, Span)>>,
}

impl<'source> Lexer<'source> {
    pub fn new(source: &'source str) -> Self {
        Lexer {
            inner: Token::lexer(source),
            peeked: None,
        }
    }

    pub fn next_token(&mut self) -> Option<(Token, Span)> {
        if let Some(peeked) = self.peeked.take() {
            return peeked;
        }

        loop {
            let token = self.inner.next()?;
            let span = Span::from(self.inner.span());

            if matches!(token, Ok(Token::Comment)) {
                continue;
            }

            let token = token.unwrap_or(Token::Error);
            return Some((token, span));
        }
    }

    pub fn peek_token(&mut self) -> Option<(Token, Span)> {
        if self.peeked.is_none() {
            self.peeked = Some(self.next_token());
        }
        self.peeked.as_ref().and_then(|x| x.clone())
    }

    pub fn source(&self) -> &'source str {
        self.inner.source()
    }

    pub fn slice(&self, span: Span) -> &'source str {
        &self.source()[span.to_range()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        while let Some((token, _)) = lexer.next_token() {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_lex_atoms() {
        let tokens = lex("bd sd supersaw RolandTR909");
        assert_eq!(tokens, vec![Token::Atom; 4]);
    }

    #[test]
    fn test_lex_numbers() {
        let tokens = lex("1 2.5 -3 4e2");
        assert_eq!(
            tokens,
            vec![
                Token::Number(1.0),
                Token::Number(2.5),
                Token::Number(-3.0),
                Token::Number(400.0)
            ]
        );
    }

    #[test]
    fn test_lex_brackets() {
        let tokens = lex("[bd <sd cp>]");
        assert_eq!(
            tokens,
            vec![
                Token::LBracket,
                Token::Atom,
                Token::LAngle,
                Token::Atom,
                Token::Atom,
                Token::RAngle,
                Token::RBracket
            ]
        );
    }

    #[test]
    fn test_lex_operators() {
        let tokens = lex("bd*2 sd@3 cp? hh!4 oh/2 _");
        assert_eq!(
            tokens,
            vec![
                Token::Atom,
                Token::Star,
                Token::Number(2.0),
                Token::Atom,
                Token::At,
                Token::Number(3.0),
                Token::Atom,
                Token::Question,
                Token::Atom,
                Token::Bang,
                Token::Number(4.0),
                Token::Atom,
                Token::Slash,
                Token::Number(2.0),
                Token::Underscore
            ]
        );
    }

    #[test]
    fn test_lex_silence() {
        let tokens = lex("~ - -5");
        assert_eq!(tokens, vec![Token::Tilde, Token::Dash, Token::Number(-5.0)]);
    }

    #[test]
    fn test_lex_euclid() {
        let tokens = lex("bd(3,8,2)");
        assert_eq!(
            tokens,
            vec![
                Token::Atom,
                Token::LParen,
                Token::Number(3.0),
                Token::Comma,
                Token::Number(8.0),
                Token::Comma,
                Token::Number(2.0),
                Token::RParen
            ]
        );
    }

    #[test]
    fn test_lex_skip_comments() {
        let tokens = lex("bd // comment\nsd");
        assert_eq!(tokens, vec![Token::Atom, Token::Atom]);
    }

    #[test]
    fn test_lex_unknown_characters() {
        let tokens = lex("bd & sd");
        assert_eq!(tokens, vec![Token::Atom, Token::Error, Token::Atom]);
    }

    #[test]
    fn test_lexer_slice() {
        let input = "bd sd cp";
        let mut lexer = Lexer::new(input);

        let (token, span) = lexer.next_token().unwrap();
        assert_eq!(token, Token::Atom);
        assert_eq!(lexer.slice(span), "bd");

        let (token, span) = lexer.next_token().unwrap();
        assert_eq!(token, Token::Atom);
        assert_eq!(lexer.slice(span), "sd");
    }

    #[test]
    fn test_lexer_peek() {
        let mut lexer = Lexer::new("bd 2");

        let (token, _) = lexer.peek_token().unwrap();
        assert_eq!(token, Token::Atom);
        let (token, _) = lexer.peek_token().unwrap();
        assert_eq!(token, Token::Atom);

        let (token, _) = lexer.next_token().unwrap();
        assert_eq!(token, Token::Atom);
        let (token, _) = lexer.next_token().unwrap();
        assert_eq!(token, Token::Number(2.0));
        assert!(lexer.next_token().is_none());
    }
}
