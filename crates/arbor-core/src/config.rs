use serde::{Deserialize, Serialize};

/// How much refinement a turn gets before its answer is accepted as final.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningTier {
    #[default]
    Standard,
    Deep,
    Expert,
}

impl ReasoningTier {
    /// Deep and expert tiers run a self-critique pass.
    pub fn uses_critique(&self) -> bool {
        matches!(self, Self::Deep | Self::Expert)
    }

    /// Only the expert tier runs the iterative verification pass.
    pub fn uses_verification(&self) -> bool {
        matches!(self, Self::Expert)
    }
}

/// Per-1k-token pricing used for cost estimates shown in the UI.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Pricing {
    pub input_per_1k: f64,
    pub output_per_1k: f64,
}

/// Policy knobs for one conversation's generation turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Agent mode raises the recursion ceiling from 3 to 10.
    pub agent_mode: bool,
    /// Per-turn cap on executed tool calls.
    pub max_tool_calls: u32,
    pub reasoning_tier: ReasoningTier,
    pub pricing: Pricing,
}

impl GenerationConfig {
    pub fn max_depth(&self) -> u32 {
        if self.agent_mode {
            10
        } else {
            3
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            agent_mode: false,
            max_tool_calls: 12,
            reasoning_tier: ReasoningTier::Standard,
            pricing: Pricing::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_follows_agent_mode() {
        let mut config = GenerationConfig::default();
        assert_eq!(config.max_depth(), 3);
        config.agent_mode = true;
        assert_eq!(config.max_depth(), 10);
    }

    #[test]
    fn tier_stage_flags() {
        assert!(!ReasoningTier::Standard.uses_critique());
        assert!(ReasoningTier::Deep.uses_critique());
        assert!(!ReasoningTier::Deep.uses_verification());
        assert!(ReasoningTier::Expert.uses_verification());
    }
}
