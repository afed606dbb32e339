//! Semantic analyzer seam
//!
//! Optional collaborator that enriches finalized versions with structural
//! metadata. Absence of an analyzer never affects textual correctness, so
//! callers treat every failure as "no metadata this time".

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub type AnalyzerResult<T> = Result<T, AnalyzerError>;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("no analyzer available for {0}")]
    Unavailable(String),
    #[error("parse failed: {0}")]
    Parse(String),
}

/// Shape of one parsed source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxSummary {
    pub language: String,
    pub node_count: usize,
    pub max_depth: usize,
}

/// Structural change counts between two texts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub additions: usize,
    pub deletions: usize,
    pub modifications: usize,
}

#[async_trait]
pub trait SemanticAnalyzer: Send + Sync {
    /// Parses one text into a structural summary.
    async fn parse(&self, code: &str, language: &str) -> AnalyzerResult<SyntaxSummary>;

    /// Summarizes the structural change between two texts.
    async fn change_summary(
        &self,
        old: &str,
        new: &str,
        language: &str,
    ) -> AnalyzerResult<ChangeSummary>;
}

/// Analyzer that reports itself unavailable for every language
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyzer;

#[async_trait]
impl SemanticAnalyzer for NoopAnalyzer {
    async fn parse(&self, _code: &str, language: &str) -> AnalyzerResult<SyntaxSummary> {
        Err(AnalyzerError::Unavailable(language.to_string()))
    }

    async fn change_summary(
        &self,
        _old: &str,
        _new: &str,
        language: &str,
    ) -> AnalyzerResult<ChangeSummary> {
        Err(AnalyzerError::Unavailable(language.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn the_noop_analyzer_is_always_unavailable() {
        let analyzer = NoopAnalyzer;

        let parsed = analyzer.parse("fn main() {}", "rust").await;
        assert!(matches!(parsed, Err(AnalyzerError::Unavailable(_))));

        let summary = analyzer.change_summary("a", "b", "rust").await;
        assert!(matches!(summary, Err(AnalyzerError::Unavailable(_))));
    }
}
