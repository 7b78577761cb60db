//! Stage 7: emit canonical pattern code
//!
//! Chains are first lowered to a small expression tree and then rendered
//! with a single chaining grammar:
//!
//! ```text
//! expr      := base transform*
//! base      := name "(" args ")"            -- source call
//!            | name "(" expr ("," args)? ")" -- wrapper around an inner expr
//! transform := "." name "(" value? ")"
//! ```
//!
//! e.g. `jux(s("bd sd").fast(2).gain(0.8), "rev").room(0.3)`. Independent
//! chains are joined with a single space.

use crate::chain::{Chain, ChainNode, NormalizedChain};
use crate::graph::PropertyValue;
use std::fmt;

/// A transform chained onto an expression: `.name(arg)`
#[derive(Clone, Debug, PartialEq)]
pub struct Transform {
    pub name: String,
    /// `None` renders an empty argument list
    pub arg: Option<PropertyValue>,
}

/// Start of an expression
#[derive(Clone, Debug, PartialEq)]
pub enum Base {
    Call {
        name: String,
        args: Vec<PropertyValue>,
    },
    Wrap {
        name: String,
        inner: Box<PatternExpr>,
        args: Vec<PropertyValue>,
    },
}

/// A base followed by transforms, applied left to right
#[derive(Clone, Debug, PartialEq)]
pub struct PatternExpr {
    pub base: Base,
    pub transforms: Vec<Transform>,
}

impl PatternExpr {
    /// Lower a collapsed chain; `None` for an empty chain
    pub fn from_chain(chain: &NormalizedChain) -> Option<Self> {
        match chain {
            NormalizedChain::Plain(chain) => Self::from_plain(chain),
            NormalizedChain::Wrapped(wrapped) => {
                let inner = Self::from_plain(&wrapped.inner_chain)?;
                let head = wrapped.outer_chain.head().unwrap_or(&wrapped.wrapper);
                Some(Self {
                    base: Base::Wrap {
                        name: head.call.clone(),
                        inner: Box::new(inner),
                        args: head.argument_value().cloned().into_iter().collect(),
                    },
                    transforms: transforms(wrapped.outer_chain.effects()),
                })
            }
        }
    }

    fn from_plain(chain: &Chain) -> Option<Self> {
        let head = chain.head()?;
        Some(Self {
            base: Base::Call {
                name: head.call.clone(),
                args: head.argument_value().cloned().into_iter().collect(),
            },
            transforms: transforms(chain.effects()),
        })
    }
}

fn transforms(effects: &[ChainNode]) -> Vec<Transform> {
    effects
        .iter()
        .flat_map(|node| node.properties.iter())
        .filter_map(|prop| match &prop.value {
            // Flags: `rev: true` is `.rev()`, false is no transform at all
            PropertyValue::Bool(true) => Some(Transform {
                name: prop.name.clone(),
                arg: None,
            }),
            PropertyValue::Bool(false) => None,
            value => Some(Transform {
                name: prop.name.clone(),
                arg: Some(value.clone()),
            }),
        })
        .collect()
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[PropertyValue]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Base::Call { name, args } => {
                write!(f, "{}(", name)?;
                write_args(f, args)?;
                f.write_str(")")
            }
            Base::Wrap { name, inner, args } => {
                write!(f, "{}({}", name, inner)?;
                if !args.is_empty() {
                    f.write_str(", ")?;
                    write_args(f, args)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.arg {
            Some(arg) => write!(f, ".{}({})", self.name, arg),
            None => write!(f, ".{}()", self.name),
        }
    }
}

impl fmt::Display for PatternExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;
        for transform in &self.transforms {
            write!(f, "{}", transform)?;
        }
        Ok(())
    }
}

/// Render every chain and join the fragments with a space
pub fn emit_code(chains: &[NormalizedChain]) -> String {
    chains
        .iter()
        .filter_map(PatternExpr::from_chain)
        .map(|expr| expr.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
