//! Runner configuration loaded from environment variables.

use crate::Phase;

/// Default number of generations a phase may dispatch.
pub const DEFAULT_MAX_GENERATIONS: usize = 6;

/// Limits applied by the dispatcher.
///
/// Reads from environment variables:
/// - `EVENT_RUNNER_MAX_BEFORE_GENERATIONS` (default: `6`)
/// - `EVENT_RUNNER_MAX_AFTER_GENERATIONS` (default: `6`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Maximum BeforeSave generations, counting the first harvest. Zero is
    /// treated as one.
    pub max_before_generations: usize,

    /// Maximum AfterSave generations, counting the first harvest. Zero is
    /// treated as one.
    pub max_after_generations: usize,
}

impl RunnerConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            max_before_generations: parse_limit(
                std::env::var("EVENT_RUNNER_MAX_BEFORE_GENERATIONS").ok(),
            ),
            max_after_generations: parse_limit(
                std::env::var("EVENT_RUNNER_MAX_AFTER_GENERATIONS").ok(),
            ),
        }
    }

    /// Returns the generation limit for a phase, never less than one.
    pub fn max_generations(&self, phase: Phase) -> usize {
        let limit = match phase {
            Phase::Before => self.max_before_generations,
            Phase::After => self.max_after_generations,
        };
        limit.max(1)
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_before_generations: DEFAULT_MAX_GENERATIONS,
            max_after_generations: DEFAULT_MAX_GENERATIONS,
        }
    }
}

// Zero would reject every commit that raises an event.
fn parse_limit(value: Option<String>) -> usize {
    value
        .and_then(|v| v.trim().parse().ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_MAX_GENERATIONS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = RunnerConfig::default();
        assert_eq!(config.max_generations(Phase::Before), 6);
        assert_eq!(config.max_generations(Phase::After), 6);
    }

    #[test]
    fn test_zero_limit_allows_one_generation() {
        let config = RunnerConfig {
            max_before_generations: 0,
            max_after_generations: 2,
        };
        assert_eq!(config.max_generations(Phase::Before), 1);
        assert_eq!(config.max_generations(Phase::After), 2);
    }

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(Some("10".to_string())), 10);
        assert_eq!(parse_limit(Some(" 3 ".to_string())), 3);
        assert_eq!(parse_limit(Some("0".to_string())), DEFAULT_MAX_GENERATIONS);
        assert_eq!(parse_limit(Some("lots".to_string())), DEFAULT_MAX_GENERATIONS);
        assert_eq!(parse_limit(None), DEFAULT_MAX_GENERATIONS);
    }
}
