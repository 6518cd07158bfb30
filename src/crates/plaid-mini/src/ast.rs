use crate::span::Span;
use serde::{Deserialize, Serialize};

/// Abstract Syntax Tree for mini notation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ast {
    Atom(AtomNode),
    Pattern(PatternNode),
    Element(ElementNode),
}

impl Ast {
    pub fn span(&self) -> Span {
        match self {
            Ast::Atom(node) => node.span,
            Ast::Pattern(node) => node.span,
            Ast::Element(node) => node.span,
        }
    }

    /// The number this node stands for, if it is a plain numeric literal
    ///
    /// Sees through single-step sequences so `3` and `[3]` both count.
    pub fn literal_number(&self) -> Option<f64> {
        match self {
            Ast::Atom(AtomNode {
                value: AtomValue::Number(n),
                ..
            }) => Some(*n),
            Ast::Pattern(node)
                if node.alignment == Alignment::Sequence && node.children.len() == 1 =>
            {
                node.children[0].literal_number()
            }
            Ast::Element(node) if node.ops.is_empty() && node.reps == 1 => {
                node.source.literal_number()
            }
            _ => None,
        }
    }

    /// Visit every atom below this node
    pub fn for_each_atom<'a>(&'a self, f: &mut dyn FnMut(&'a AtomNode)) {
        match self {
            Ast::Atom(atom) => f(atom),
            Ast::Pattern(node) => node.children.iter().for_each(|c| c.for_each_atom(f)),
            Ast::Element(node) => {
                node.source.for_each_atom(f);
                for op in &node.ops {
                    match op {
                        SliceOp::Stretch { amount, .. } => amount.for_each_atom(f),
                        SliceOp::Euclid {
                            hits,
                            steps,
                            rotation,
                        } => {
                            hits.for_each_atom(f);
                            steps.for_each_atom(f);
                            if let Some(rotation) = rotation {
                                rotation.for_each_atom(f);
                            }
                        }
                        SliceOp::DegradeBy { .. } => {}
                    }
                }
            }
        }
    }
}

/// Atom - a leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomNode {
    pub value: AtomValue,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AtomValue {
    Number(f64),
    String(String),
    Silence, // ~ or -
}

impl AtomNode {
    pub fn new(value: AtomValue, span: Span) -> Self {
        AtomNode { value, span }
    }

    pub fn number(n: f64, span: Span) -> Self {
        AtomNode::new(AtomValue::Number(n), span)
    }

    pub fn string(s: impl Into<String>, span: Span) -> Self {
        AtomNode::new(AtomValue::String(s.into()), span)
    }

    pub fn silence(span: Span) -> Self {
        AtomNode::new(AtomValue::Silence, span)
    }
}

/// Pattern - a composite pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternNode {
    pub children: Vec<Ast>,
    pub alignment: Alignment,
    /// Per-node salt for random choice
    pub seed: Option<u64>,
    pub span: Span,
}

impl PatternNode {
    pub fn new(children: Vec<Ast>, alignment: Alignment, span: Span) -> Self {
        PatternNode {
            children,
            alignment,
            seed: None,
            span,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// How the children of a pattern node share time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    Sequence,  // space-separated, one cycle split by weight
    Stack,     // comma-separated layers
    Rand,      // pipe-separated, one branch per cycle
    Alternate, // <...>, one step per cycle
}

/// Element - a slice with modifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub source: Box<Ast>,
    pub ops: Vec<SliceOp>,
    /// Relative length within the enclosing sequence
    pub weight: f64,
    /// Number of verbatim copies in the enclosing sequence
    pub reps: usize,
    pub span: Span,
}

impl ElementNode {
    pub fn new(source: Ast, span: Span) -> Self {
        ElementNode {
            source: Box::new(source),
            ops: Vec::new(),
            weight: 1.0,
            reps: 1,
            span,
        }
    }

    pub fn with_ops(mut self, ops: Vec<SliceOp>) -> Self {
        self.ops = ops;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_reps(mut self, reps: usize) -> Self {
        self.reps = reps;
        self
    }

    pub fn add_op(&mut self, op: SliceOp) {
        self.ops.push(op);
    }
}

/// Slice operators, applied left to right
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SliceOp {
    Stretch {
        amount: Box<Ast>,
        op_type: StretchType,
    },
    Euclid {
        hits: Box<Ast>,
        steps: Box<Ast>,
        rotation: Option<Box<Ast>>,
    },
    DegradeBy {
        amount: f64,
        seed: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StretchType {
    Fast, // *
    Slow, // /
}
