//! Caller-selectable decode behaviour and resource caps.
//!
//! Every type here deserialises from JSON (or any serde format) with all
//! fields optional, so a caller can write `{"mode": "strict"}` and get the
//! default limits for the rest.

use serde::{Deserialize, Serialize};

/// How the decoder reacts to malformed values and dangling references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Abort on the first malformed value or unresolved reference.
    Strict,
    /// Skip malformed values and leave unresolved links empty, recording a
    /// warning for each.
    #[default]
    Lenient,
}

/// Upper bounds on the work a single document may cause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Total objects a document may declare.
    pub max_objects: usize,
    /// Deepest object nesting accepted by the decoder.
    pub max_depth: usize,
    /// Largest bracket or link-node repeat count that will be expanded.
    pub max_repeat_count: usize,
    /// Largest Markush variant count that will be enumerated.
    pub max_combinations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_objects: 1_000_000,
            max_depth: 64,
            max_repeat_count: 500,
            max_combinations: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub mode: Mode,
    pub limits: Limits,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            mode: Mode::Strict,
            ..Self::default()
        }
    }

    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn is_strict(&self) -> bool {
        self.mode == Mode::Strict
    }
}

/// Which reconstruction passes [`Pipeline`](crate::Pipeline) runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub decode: DecodeOptions,
    pub assign_stereo: bool,
    pub expand_brackets: bool,
    pub enumerate_markush: bool,
    pub assemble_reactions: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            decode: DecodeOptions::default(),
            assign_stereo: true,
            expand_brackets: true,
            enumerate_markush: true,
            assemble_reactions: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_lenient() {
        let opts = DecodeOptions::default();
        assert_eq!(opts.mode, Mode::Lenient);
        assert!(!opts.is_strict());
        assert!(DecodeOptions::strict().is_strict());
    }

    #[test]
    fn partial_json_keeps_default_limits() {
        let opts: DecodeOptions =
            serde_json::from_str(r#"{"mode": "strict", "limits": {"max_depth": 8}}"#).unwrap();
        assert_eq!(opts.mode, Mode::Strict);
        assert_eq!(opts.limits.max_depth, 8);
        assert_eq!(opts.limits.max_objects, Limits::default().max_objects);
    }

    #[test]
    fn pipeline_options_from_json() {
        let opts: PipelineOptions =
            serde_json::from_str(r#"{"enumerate_markush": false}"#).unwrap();
        assert!(!opts.enumerate_markush);
        assert!(opts.expand_brackets);
        assert_eq!(opts.decode.mode, Mode::Lenient);
    }
}
