//! Stage 6: fold redundant effect properties into one synthetic node
//!
//! Every property of every non-head node is grouped by name and combined
//! with its collapse rule: `multiply` takes the product (identity 1), `last`
//! keeps the value of the latest node. Results equal to the property's
//! neutral value are dropped. Whatever survives is carried by a single
//! synthetic node placed right after the head, so a collapsed chain is
//! always `[head]` or `[head, collapsed]`.
//!
//! Collapsing an already collapsed chain returns it unchanged.

use crate::chain::{Chain, ChainNode, NormalizedChain, WrappedChain};
use crate::config::{CollapseRule, NormalizerConfig};
use crate::error::{NormalizeError, NormalizeResult};
use crate::graph::{Property, PropertyValue};
use tracing::debug;

/// Products are rounded to this many decimal places
const PRODUCT_DECIMALS: i32 = 9;

/// A property held back from the collapse: (node id, property name)
pub type HeldBack<'h> = Option<(&'h str, &'h str)>;

/// Applies the configured rule table to chains
pub struct Collapser<'a> {
    config: &'a NormalizerConfig,
    /// Rule keys that matched a property, in first-encounter order
    applied: Vec<String>,
}

impl<'a> Collapser<'a> {
    pub fn new(config: &'a NormalizerConfig) -> Self {
        Self {
            config,
            applied: Vec::new(),
        }
    }

    /// Rule keys that matched at least one property so far
    pub fn rules_applied(&self) -> &[String] {
        &self.applied
    }

    pub fn into_rules_applied(self) -> Vec<String> {
        self.applied
    }

    /// Collapse a plain chain, or both halves of a wrapped one
    ///
    /// In the inner half, the active wrapper's own argument property is left
    /// out: it becomes the argument of the enclosing call instead.
    pub fn collapse(&mut self, chain: NormalizedChain) -> NormalizeResult<NormalizedChain> {
        match chain {
            NormalizedChain::Plain(chain) => {
                Ok(NormalizedChain::Plain(self.collapse_chain(&chain, None)?))
            }
            NormalizedChain::Wrapped(wrapped) => {
                let held_back = wrapped
                    .wrapper
                    .argument
                    .as_deref()
                    .map(|arg| (wrapped.wrapper.id.as_str(), arg));
                let inner_chain = self.collapse_chain(&wrapped.inner_chain, held_back)?;
                let outer_chain = self.collapse_chain(&wrapped.outer_chain, None)?;
                Ok(NormalizedChain::Wrapped(WrappedChain {
                    wrapper: wrapped.wrapper,
                    inner_chain,
                    outer_chain,
                }))
            }
        }
    }

    pub fn collapse_chain(
        &mut self,
        chain: &Chain,
        held_back: HeldBack<'_>,
    ) -> NormalizeResult<Chain> {
        let (head, last) = match (chain.nodes.first(), chain.nodes.last()) {
            (Some(head), Some(last)) if chain.len() > 1 => (head, last),
            _ => return Ok(chain.clone()),
        };

        let mut merged: Vec<Property> = Vec::new();
        for node in chain.effects() {
            for prop in &node.properties {
                // A synthetic node shares the wrapper's id but not its argument
                let key = (node.id.as_str(), prop.name.as_str());
                if !node.synthetic && held_back == Some(key) {
                    continue;
                }
                self.merge_property(&mut merged, node, prop)?;
            }
        }

        let before = merged.len();
        merged.retain(|prop| !self.is_neutral(prop));
        if merged.len() < before {
            debug!(
                "Dropped {} neutral propert(ies) on chain '{}'",
                before - merged.len(),
                head.id
            );
        }

        if merged.is_empty() {
            return Ok(Chain::new(vec![head.clone()]));
        }

        let collapsed = ChainNode {
            properties: merged,
            synthetic: true,
            ..last.clone()
        };
        Ok(Chain::new(vec![head.clone(), collapsed]))
    }

    fn merge_property(
        &mut self,
        merged: &mut Vec<Property>,
        node: &ChainNode,
        prop: &Property,
    ) -> NormalizeResult<()> {
        let rule = match self.config.rules.get(&prop.name) {
            Some(rule) => {
                if !self.applied.iter().any(|key| key == &prop.name) {
                    self.applied.push(prop.name.clone());
                }
                rule.rule
            }
            None => self.config.default_rule,
        };

        let slot = merged.iter().position(|p| p.name == prop.name);

        match rule {
            CollapseRule::Multiply => {
                let factor = prop.value.as_number().ok_or_else(|| {
                    NormalizeError::MalformedProperties {
                        node: node.id.clone(),
                        property: prop.name.clone(),
                        reason: format!("multiply rule needs a number, found {}", prop.value),
                    }
                })?;
                let current = match slot {
                    // Only numbers are ever stored for a multiply property
                    Some(i) => merged[i].value.as_number().unwrap_or(1.0),
                    None => 1.0,
                };
                let product = current * factor;
                if !product.is_finite() {
                    return Err(NormalizeError::MalformedProperties {
                        node: node.id.clone(),
                        property: prop.name.clone(),
                        reason: format!(
                            "product {} * {} is not a finite number",
                            current, factor
                        ),
                    });
                }
                let product = PropertyValue::Number(snap(product));
                match slot {
                    Some(i) => merged[i].value = product,
                    None => merged.push(Property {
                        name: prop.name.clone(),
                        value: product,
                    }),
                }
            }
            CollapseRule::Last => match slot {
                Some(i) => merged[i].value = prop.value.clone(),
                None => merged.push(prop.clone()),
            },
        }

        Ok(())
    }

    fn is_neutral(&self, prop: &Property) -> bool {
        let neutral = self
            .config
            .rules
            .get(&prop.name)
            .and_then(|rule| rule.neutral);
        match (neutral, prop.value.as_number()) {
            (Some(neutral), Some(value)) => (value - neutral).abs() <= self.config.neutral_epsilon,
            _ => false,
        }
    }
}

fn snap(value: f64) -> f64 {
    let scale = 10f64.powi(PRODUCT_DECIMALS);
    let scaled = value * scale;
    if scaled.is_finite() {
        scaled.round() / scale
    } else {
        value
    }
}
