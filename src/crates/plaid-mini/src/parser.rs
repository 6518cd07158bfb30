use crate::ast::*;
use crate::error::{ParseError, Result};
use crate::lexer::{Lexer, Token};
use crate::span::Span;
use plaid_core::euclid::MAX_STEPS;

/// Largest count accepted after `!`
const MAX_REPEATS: f64 = 4096.0;

/// Recursive descent parser for mini notation
pub struct Parser<'source> {
    lexer: Lexer<'source>,
    seed_counter: u64,
    last_end: usize,
}

/// Which argument of an operator a literal belongs to
#[derive(Clone, Copy)]
enum Factor {
    Stretch,
    Hits,
    Steps,
    Rotation,
}

impl Factor {
    fn check(self, n: f64) -> std::result::Result<(), &'static str> {
        let integral = n.fract() == 0.0;
        match self {
            Factor::Stretch if n <= 0.0 => Err("factor must be positive"),
            Factor::Hits | Factor::Rotation if n < 0.0 => Err("must not be negative"),
            Factor::Steps if n <= 0.0 => Err("step count must be positive"),
            Factor::Steps if n > MAX_STEPS as f64 => Err("step count must not exceed 4096"),
            Factor::Hits | Factor::Steps | Factor::Rotation if !integral => {
                Err("must be a whole number")
            }
            _ => Ok(()),
        }
    }
}

impl<'source> Parser<'source> {
    pub fn new(source: &'source str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            seed_counter: 0,
            last_end: 0,
        }
    }

    /// Parse the whole input as one pattern
    pub fn parse(&mut self) -> Result<Ast> {
        let ast = self.parse_stack()?;
        match self.peek() {
            Some((token, span)) => Err(self.unexpected("end of input", &token, span)),
            None => Ok(ast),
        }
    }

    /// stack := choose ("," choose)*
    fn parse_stack(&mut self) -> Result<Ast> {
        let mut children = self.parse_branches(Token::Comma, Self::parse_choose)?;
        if children.len() == 1 {
            return Ok(children.remove(0));
        }
        let span = merged_span(&children);
        Ok(Ast::Pattern(PatternNode::new(
            children,
            Alignment::Stack,
            span,
        )))
    }

    /// choose := sequence ("|" sequence)*
    fn parse_choose(&mut self) -> Result<Ast> {
        let mut children = self.parse_branches(Token::Pipe, Self::parse_sequence)?;
        if children.len() == 1 {
            return Ok(children.remove(0));
        }
        let span = merged_span(&children);
        let seed = self.next_seed();
        Ok(Ast::Pattern(
            PatternNode::new(children, Alignment::Rand, span).with_seed(seed),
        ))
    }

    fn parse_branches(
        &mut self,
        separator: Token,
        mut branch: impl FnMut(&mut Self) -> Result<Ast>,
    ) -> Result<Vec<Ast>> {
        let mut children = vec![branch(self)?];
        while matches!(self.peek(), Some((ref token, _)) if *token == separator) {
            self.next();
            children.push(branch(self)?);
        }
        Ok(children)
    }

    /// sequence := step+
    fn parse_sequence(&mut self) -> Result<Ast> {
        let mut elements = vec![Ast::Element(self.parse_step()?)];

        while let Some((token, _)) = self.peek() {
            if token.ends_sequence() {
                break;
            }
            elements.push(Ast::Element(self.parse_step()?));
        }

        let span = merged_span(&elements);
        Ok(Ast::Pattern(PatternNode::new(
            elements,
            Alignment::Sequence,
            span,
        )))
    }

    /// step := slice op*
    fn parse_step(&mut self) -> Result<ElementNode> {
        let slice = self.parse_slice()?;
        let start = slice.span();
        let mut element = ElementNode::new(slice, start);

        while let Some((token, op_span)) = self.peek() {
            match token {
                Token::Star | Token::Slash => {
                    self.next();
                    let amount = self.parse_slice()?;
                    let op = if token == Token::Star { '*' } else { '/' };
                    self.validate_factor(op, &amount, Factor::Stretch)?;
                    let op_type = if token == Token::Star {
                        StretchType::Fast
                    } else {
                        StretchType::Slow
                    };
                    element.add_op(SliceOp::Stretch {
                        amount: Box::new(amount),
                        op_type,
                    });
                }
                Token::At => {
                    self.next();
                    let (weight, span) = self.expect_number("weight after '@'")?;
                    if weight <= 0.0 {
                        return Err(self.invalid_factor('@', span, "weight must be positive"));
                    }
                    element.weight = weight;
                }
                Token::Underscore => {
                    self.next();
                    element.weight += 1.0;
                }
                Token::Bang => {
                    self.next();
                    match self.adjacent_number() {
                        Some((n, span)) => {
                            if n < 1.0 || n.fract() != 0.0 {
                                return Err(self.invalid_factor(
                                    '!',
                                    span,
                                    "repeat count must be a positive whole number",
                                ));
                            }
                            if n > MAX_REPEATS {
                                return Err(self.invalid_factor(
                                    '!',
                                    span,
                                    "repeat count must not exceed 4096",
                                ));
                            }
                            element.reps = n as usize;
                        }
                        None => element.reps += 1,
                    }
                }
                Token::Question => {
                    self.next();
                    let amount = match self.adjacent_number() {
                        Some((n, span)) => {
                            if !(0.0..=1.0).contains(&n) {
                                return Err(self.invalid_factor(
                                    '?',
                                    span,
                                    "probability must lie in [0, 1]",
                                ));
                            }
                            n
                        }
                        None => 0.5,
                    };
                    let seed = self.next_seed();
                    element.add_op(SliceOp::DegradeBy { amount, seed });
                }
                Token::LParen => {
                    self.next();
                    let op = self.parse_euclid(op_span)?;
                    element.add_op(op);
                }
                _ => break,
            }
        }

        element.span = start.merge(Span::point(self.last_end));
        Ok(element)
    }

    /// Euclid arguments after the opening paren: hits, steps [, rotation] ")"
    fn parse_euclid(&mut self, open: Span) -> Result<SliceOp> {
        let hits = self.parse_choose()?;
        self.validate_factor('(', &hits, Factor::Hits)?;
        self.expect_closing(Token::Comma, '(', open)?;

        let steps = self.parse_choose()?;
        self.validate_factor('(', &steps, Factor::Steps)?;

        let rotation = match self.peek() {
            Some((Token::Comma, _)) => {
                self.next();
                let rotation = self.parse_choose()?;
                self.validate_factor('(', &rotation, Factor::Rotation)?;
                Some(Box::new(rotation))
            }
            _ => None,
        };
        self.expect_closing(Token::RParen, '(', open)?;

        Ok(SliceOp::Euclid {
            hits: Box::new(hits),
            steps: Box::new(steps),
            rotation,
        })
    }

    /// slice := atom | number | "~" | "-" | "[" stack "]" | "<" stack ">"
    fn parse_slice(&mut self) -> Result<Ast> {
        match self.peek() {
            Some((Token::LBracket, span)) => {
                self.next();
                let inner = self.parse_stack()?;
                self.expect_closing(Token::RBracket, '[', span)?;
                Ok(inner)
            }
            Some((Token::LAngle, span)) => {
                self.next();
                let children = self.parse_branches(Token::Comma, Self::parse_choose)?;
                let close = self.expect_closing(Token::RAngle, '<', span)?;
                Ok(Ast::Pattern(PatternNode::new(
                    children,
                    Alignment::Alternate,
                    span.merge(close),
                )))
            }
            Some((Token::Tilde | Token::Dash, span)) => {
                self.next();
                Ok(Ast::Atom(AtomNode::silence(span)))
            }
            Some((Token::Number(n), span)) => {
                self.next();
                Ok(Ast::Atom(AtomNode::number(n, span)))
            }
            Some((Token::Atom, span)) => {
                self.next();
                Ok(Ast::Atom(AtomNode::string(self.lexer.slice(span), span)))
            }
            Some((token, span)) => Err(self.unexpected("atom, number, or group", &token, span)),
            None => Err(ParseError::unexpected_eof("atom, number, or group")),
        }
    }

    // Helper methods

    fn peek(&mut self) -> Option<(Token, Span)> {
        self.lexer.peek_token()
    }

    fn next(&mut self) -> Option<(Token, Span)> {
        let next = self.lexer.next_token();
        if let Some((_, span)) = &next {
            self.last_end = span.end;
        }
        next
    }

    fn next_seed(&mut self) -> u64 {
        let seed = self.seed_counter;
        self.seed_counter += 1;
        seed
    }

    /// Consume a closing token, reporting a missing one against its opener
    fn expect_closing(&mut self, expected: Token, delimiter: char, open: Span) -> Result<Span> {
        match self.next() {
            Some((token, span)) if token == expected => Ok(span),
            Some((token, span)) => Err(self.unexpected(&expected.to_string(), &token, span)),
            None => Err(ParseError::unclosed_delimiter(delimiter, open)),
        }
    }

    fn expect_number(&mut self, expected: &str) -> Result<(f64, Span)> {
        match self.next() {
            Some((Token::Number(n), span)) => Ok((n, span)),
            Some((token, span)) => Err(self.unexpected(expected, &token, span)),
            None => Err(ParseError::unexpected_eof(expected)),
        }
    }

    /// A number written directly against the previous token, as in `a!3`
    fn adjacent_number(&mut self) -> Option<(f64, Span)> {
        match self.peek() {
            Some((Token::Number(n), span)) if span.start == self.last_end => {
                self.next();
                Some((n, span))
            }
            _ => None,
        }
    }

    fn validate_factor(&self, op: char, ast: &Ast, factor: Factor) -> Result<()> {
        let mut error = None;
        ast.for_each_atom(&mut |atom| {
            if error.is_some() {
                return;
            }
            let reason = match &atom.value {
                AtomValue::Number(n) => factor.check(*n).err(),
                AtomValue::String(_) => Some("not a number"),
                AtomValue::Silence => None,
            };
            if let Some(reason) = reason {
                error = Some(self.invalid_factor(op, atom.span, reason));
            }
        });
        error.map_or(Ok(()), Err)
    }

    fn invalid_factor(&self, op: char, span: Span, reason: &'static str) -> ParseError {
        ParseError::invalid_factor(op, self.lexer.slice(span), reason, span)
    }

    fn unexpected(&self, expected: &str, token: &Token, span: Span) -> ParseError {
        let fragment = self.lexer.slice(span);
        match token {
            Token::Error if fragment.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
                ParseError::invalid_number(fragment, span)
            }
            Token::Error => ParseError::invalid_token(fragment, span),
            _ => ParseError::unexpected_token(expected, fragment, span),
        }
    }
}

fn merged_span(nodes: &[Ast]) -> Span {
    nodes
        .iter()
        .map(Ast::span)
        .reduce(|a, b| a.merge(b))
        .unwrap_or_default()
}

/// Parse a mini-notation string into an AST
pub fn parse(input: &str) -> Result<Ast> {
    Parser::new(input).parse()
}
