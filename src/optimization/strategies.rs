//! Optimization strategy implementations

use super::StrategyName;
use crate::analyzers::{
    Aggressiveness, Analyzer, FillerAnalyzer, PreserveSet, RedundancyAnalyzer, StructuralAnalyzer,
    VerbosityAnalyzer,
};
use tracing::debug;

/// A named text transform built from analyzers.
pub trait OptimizationStrategy: Send + Sync {
    fn name(&self) -> &str;

    /// Run the transform, forwarding `preserve` to every step
    fn optimize(&self, text: &str, preserve: &PreserveSet) -> String;
}

/// Ordered analyzer chain; each analyzer's output feeds the next.
pub struct Pipeline {
    name: String,
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl Pipeline {
    /// Whitespace normalization and filler phrases, then deduplication
    pub fn conservative() -> Self {
        Self {
            name: StrategyName::Conservative.to_string(),
            analyzers: vec![
                Box::new(StructuralAnalyzer::with_level(Aggressiveness::Low)),
                Box::new(FillerAnalyzer::with_level(Aggressiveness::Low)),
                Box::new(RedundancyAnalyzer::default()),
            ],
        }
    }

    pub fn moderate() -> Self {
        Self::leveled(StrategyName::Moderate, Aggressiveness::Medium)
    }

    pub fn aggressive() -> Self {
        Self::leveled(StrategyName::Aggressive, Aggressiveness::High)
    }

    /// Runs `analyzers` exactly as given. An empty list is the identity.
    pub fn custom(name: impl Into<String>, analyzers: Vec<Box<dyn Analyzer>>) -> Self {
        Self {
            name: name.into(),
            analyzers,
        }
    }

    /// Built-in pipeline for `name`; `Custom` yields an empty pipeline.
    pub fn for_name(name: StrategyName) -> Self {
        match name {
            StrategyName::Conservative => Self::conservative(),
            StrategyName::Moderate => Self::moderate(),
            StrategyName::Aggressive => Self::aggressive(),
            StrategyName::Custom => Self::custom(StrategyName::Custom.as_str(), Vec::new()),
        }
    }

    /// Append an analyzer to the end of the chain
    pub fn with(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzers.push(Box::new(analyzer));
        self
    }

    pub fn analyzer_names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    fn leveled(name: StrategyName, level: Aggressiveness) -> Self {
        Self {
            name: name.to_string(),
            analyzers: vec![
                Box::new(StructuralAnalyzer::with_level(level)),
                Box::new(FillerAnalyzer::with_level(level)),
                Box::new(VerbosityAnalyzer::with_level(level)),
                Box::new(RedundancyAnalyzer::default()),
            ],
        }
    }
}

impl OptimizationStrategy for Pipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn optimize(&self, text: &str, preserve: &PreserveSet) -> String {
        let mut result = text.to_string();

        for analyzer in &self.analyzers {
            let before = result.len();
            result = analyzer.analyze(&result, preserve);
            debug!(
                "{}: {} {} -> {} bytes",
                self.name,
                analyzer.name(),
                before,
                result.len()
            );
        }

        result
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("analyzers", &self.analyzer_names())
            .finish()
    }
}
