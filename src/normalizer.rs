//! The normalizer: runs the seven pipeline stages over a graph
//!
//! ```text
//! prune & validate → linearize → structural merges → stage sort
//!     → lift wrappers → collapse → emit
//! ```
//!
//! A [`Normalizer`] is immutable once built, so one instance can serve any
//! number of threads. Each call works on its own copies of the chains.

use crate::chain::NormalizedChain;
use crate::collapse::Collapser;
use crate::config::NormalizerConfig;
use crate::diagnostics::Diagnostic;
use crate::emit::emit_code;
use crate::error::NormalizeResult;
use crate::graph::Graph;
use crate::linearize::linearize_chains;
use crate::prune::prune_and_validate;
use crate::schema::NodeSchema;
use crate::stage_sort::sort_effects_by_stage;
use crate::structural::resolve_structural_merges;
use crate::wrap::lift_wrappers;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};

/// Facts about a successful normalization
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Number of chains found by linearization
    pub input_chains: usize,
    pub output_pattern: String,
    /// Collapse rule keys that matched at least one property
    pub rules_applied: Vec<String>,
    /// ISO-8601 UTC generation time
    pub timestamp: String,
    /// Hex SHA-256 of `output_pattern`
    pub fingerprint: String,
}

/// Outcome of [`Normalizer::normalize_graph`]
///
/// On failure `code` is empty, `metadata` is `None` and `chains` is empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizationResult {
    pub success: bool,
    pub code: String,
    pub metadata: Option<Metadata>,
    pub chains: Vec<NormalizedChain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl NormalizationResult {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            code: String::new(),
            metadata: None,
            chains: Vec::new(),
            error: Some(message),
            diagnostics: Vec::new(),
        }
    }
}

/// Successful pipeline output, before it is wrapped into a result
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    pub code: String,
    pub chains: Vec<NormalizedChain>,
    pub input_chains: usize,
    pub rules_applied: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Compiles patch graphs into canonical pattern code
#[derive(Clone, Debug)]
pub struct Normalizer {
    schema: NodeSchema,
    config: NormalizerConfig,
}

impl Normalizer {
    pub fn new(schema: NodeSchema, config: NormalizerConfig) -> Self {
        Self { schema, config }
    }

    /// Normalizer with the default rule table
    pub fn with_schema(schema: NodeSchema) -> Self {
        Self::new(schema, NormalizerConfig::default())
    }

    pub fn schema(&self) -> &NodeSchema {
        &self.schema
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Normalize a graph, folding any failure into the result
    pub fn normalize_graph(&self, graph: &Graph) -> NormalizationResult {
        match self.try_normalize(graph) {
            Ok(normalized) => {
                let metadata = Metadata {
                    input_chains: normalized.input_chains,
                    output_pattern: normalized.code.clone(),
                    rules_applied: normalized.rules_applied,
                    timestamp: utc_timestamp(SystemTime::now()),
                    fingerprint: fingerprint(&normalized.code),
                };
                NormalizationResult {
                    success: true,
                    code: normalized.code,
                    metadata: Some(metadata),
                    chains: normalized.chains,
                    error: None,
                    diagnostics: normalized.diagnostics,
                }
            }
            Err(e) => {
                warn!("Normalization failed: {}", e);
                NormalizationResult::failure(e.to_string())
            }
        }
    }

    /// Run the pipeline, returning the first fatal error
    pub fn try_normalize(&self, graph: &Graph) -> NormalizeResult<Normalized> {
        let mut diagnostics = Vec::new();

        // 1. Prune & validate
        let pruned = prune_and_validate(graph, &mut diagnostics)?;

        // 2. Linearize
        let chains = linearize_chains(&pruned, &self.schema, &self.config, &mut diagnostics)?;
        let input_chains = chains.len();

        // 3. Structural merges
        let chains = resolve_structural_merges(chains, &pruned, &mut diagnostics);

        // 4-6. Stage sort, wrapper lifting, collapse
        let mut collapser = Collapser::new(&self.config);
        let mut finalized = Vec::with_capacity(chains.len());
        for chain in chains {
            let lifted = lift_wrappers(sort_effects_by_stage(chain));
            finalized.push(collapser.collapse(lifted)?);
        }

        // 7. Emit
        let code = emit_code(&finalized);

        debug!("Normalized code: {}", code);
        info!(
            "Normalized {} node(s) into {} chain(s) with {} diagnostic(s)",
            graph.nodes.len(),
            input_chains,
            diagnostics.len()
        );

        Ok(Normalized {
            code,
            chains: finalized,
            input_chains,
            rules_applied: collapser.into_rules_applied(),
            diagnostics,
        })
    }
}

/// Hex SHA-256 of the emitted code
pub fn fingerprint(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Format a time as `YYYY-MM-DDTHH:MM:SS.mmmZ`
fn utc_timestamp(time: SystemTime) -> String {
    let since_epoch = time.duration_since(UNIX_EPOCH).unwrap_or_default();
    let secs = since_epoch.as_secs();
    let millis = since_epoch.subsec_millis();

    let days = (secs / 86_400) as i64;
    let rem = secs % 86_400;
    let (year, month, day) = civil_from_days(days);

    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        year,
        month,
        day,
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60,
        millis
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day)
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
