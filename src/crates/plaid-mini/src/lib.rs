//! Mini-notation parser and evaluator
//!
//! Mini-notation is a terse string syntax for rhythmic patterns. This crate
//! parses it into an [`Ast`] and evaluates that into a [`plaid_core::Pattern`].
//!
//! # Examples
//!
//! ```
//! use plaid_mini::{compile, parse, evaluate};
//!
//! let ast = parse("bd*2 [sd cp] ~").unwrap();
//! let pattern = evaluate(&ast).unwrap();
//!
//! // Or in one step
//! let drums = compile("bd(3,8), hh*<4 8>").unwrap();
//! ```
//!
//! # Syntax
//!
//! - Space-separated sequences: `a b c`
//! - Sub-sequences: `[a b]`
//! - Stacking (layering): `a, b, c`
//! - Alternation per cycle: `<a b c>`
//! - Random choice per cycle: `a | b | c`
//! - Silence: `~` or `-`
//! - Speed: `a*2`, `a/2`, `a*<1 2 4>`
//! - Weight: `a@3`, `a _ _`
//! - Replication: `a!3`, `a ! !`
//! - Degrade: `a?`, `a?0.3`
//! - Euclidean rhythms: `bd(3,8)`, `bd(3,8,2)`

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod span;


pub use ast::{Alignment, Ast};
pub use error::{ParseError, Result};
pub use evaluator::evaluate;
pub use lexer::{Lexer, Token};
pub use parser::{parse, Parser};
pub use span::Span;

use plaid_core::Pattern;

/// Parse and evaluate mini-notation in one step
pub fn compile(source: &str) -> Result<Pattern> {
    let ast = parse(source)?;
    let pattern = evaluate(&ast)?;
    tracing::trace!(source, "compiled mini-notation");
    Ok(pattern)
}
