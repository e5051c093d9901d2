//! Utterance-processor pipelines: named processes mapping to ordered
//! stage lists, dispatched by name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("process not defined: '{0}'")]
    ProcessNotDefined(String),
    #[error("stage not defined: '{0}'")]
    StageNotDefined(String),
    #[error("utterance needs a 'text' feature")]
    MissingText,
}

/// One step of a process: a stage name plus an optional sub-process name
/// passed through to the stage (e.g. which back-end process to run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStep {
    pub stage: String,
    pub subprocess: Option<String>,
}

impl PipelineStep {
    pub fn new(stage: &str) -> Self {
        PipelineStep { stage: stage.to_string(), subprocess: None }
    }

    pub fn with_sub(stage: &str, subprocess: &str) -> Self {
        PipelineStep {
            stage: stage.to_string(),
            subprocess: Some(subprocess.to_string()),
        }
    }
}

/// Process name -> ordered stage list.
pub type ProcessMap = BTreeMap<String, Vec<PipelineStep>>;

/// The front-end prefix shared by every synthesis process.
pub fn frontend_steps() -> Vec<PipelineStep> {
    vec![
        PipelineStep::new("tokenize"),
        PipelineStep::new("normalize"),
        PipelineStep::new("phrasify"),
        PipelineStep::new("phonetize"),
        PipelineStep::new("pauses"),
    ]
}

/// The standard process table: symbolic processes plus back-end specific
/// synthesis processes filled in by the voice according to its backend.
pub fn standard_processes() -> ProcessMap {
    let mut processes = ProcessMap::new();
    processes.insert(
        "text-to-words".into(),
        vec![
            PipelineStep::new("tokenize"),
            PipelineStep::new("normalize"),
            PipelineStep::new("phrasify"),
        ],
    );
    processes.insert("text-to-segments".into(), frontend_steps());
    processes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_processes() {
        let p = standard_processes();
        assert_eq!(p["text-to-words"].len(), 3);
        assert_eq!(p["text-to-segments"].len(), 5);
        assert_eq!(p["text-to-segments"][3], PipelineStep::new("phonetize"));
    }
}
