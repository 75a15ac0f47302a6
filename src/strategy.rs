use std::fmt;
use std::str::FromStr;

pub const MAX_WEIGHT: u8 = 100;
pub const DEFAULT_WEIGHT: u8 = 20;

/// The five pedagogical content-delivery styles a teacher can weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Apprentice,
    Incidental,
    Inductive,
    Deductive,
    Discovery,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Apprentice,
        Strategy::Incidental,
        Strategy::Inductive,
        Strategy::Deductive,
        Strategy::Discovery,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Strategy::Apprentice => "Apprentice - Mentor-Student interaction",
            Strategy::Incidental => "Incidental - Case Studies",
            Strategy::Inductive => "Inductive - Examples",
            Strategy::Deductive => "Deductive - Application",
            Strategy::Discovery => "Discovery - Experimentation",
        }
    }

    pub fn help(self) -> &'static str {
        match self {
            Strategy::Apprentice => "Content presented in a systematic step-by-step procedural way",
            Strategy::Incidental => "Content presented in real-life scenarios or case studies",
            Strategy::Inductive => {
                "Content presented with examples that illustrate the principle clearly"
            }
            Strategy::Deductive => {
                "Content presented with interactive animations for learning by doing"
            }
            Strategy::Discovery => {
                "Content presented in a simulated learning environment for self-discovery"
            }
        }
    }

    /// Form field name.
    pub fn key(self) -> &'static str {
        match self {
            Strategy::Apprentice => "apprentice",
            Strategy::Incidental => "incidental",
            Strategy::Inductive => "inductive",
            Strategy::Deductive => "deductive",
            Strategy::Discovery => "discovery",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("weight for '{label}' must be between 0 and 100, got {value}", label = .strategy.label())]
pub struct WeightError {
    pub strategy: Strategy,
    pub value: u32,
}

/// A weight for every strategy, each in `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyWeights {
    values: [u8; 5],
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            values: [DEFAULT_WEIGHT; 5],
        }
    }
}

impl StrategyWeights {
    /// Builds weights in `Strategy::ALL` order.
    pub fn new(values: [u32; 5]) -> Result<Self, WeightError> {
        let mut weights = Self::default();
        for (strategy, value) in Strategy::ALL.into_iter().zip(values) {
            weights.set(strategy, value)?;
        }
        Ok(weights)
    }

    pub fn get(&self, strategy: Strategy) -> u8 {
        self.values[strategy.index()]
    }

    pub fn set(&mut self, strategy: Strategy, value: u32) -> Result<(), WeightError> {
        match u8::try_from(value) {
            Ok(v) if v <= MAX_WEIGHT => {
                self.values[strategy.index()] = v;
                Ok(())
            }
            _ => Err(WeightError { strategy, value }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Strategy, u8)> + '_ {
        Strategy::ALL.into_iter().map(|s| (s, self.get(s)))
    }

    /// Renders the strategy clause sent to the models, e.g.
    /// `"Inductive - Examples: 60%, Discovery - Experimentation: 25%"`.
    pub fn prompt_fragment(&self, style: FragmentStyle) -> String {
        let threshold = style.threshold();
        let mut selected: Vec<(Strategy, u8)> =
            self.iter().filter(|(_, v)| *v > threshold).collect();

        if style == FragmentStyle::Ranked {
            // sort_by is stable, ties keep declaration order
            selected.sort_by(|a, b| b.1.cmp(&a.1));
        }

        selected
            .iter()
            .map(|(s, v)| format!("{}: {}%", s.label(), v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// How weights are filtered and ordered in the prompt clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FragmentStyle {
    /// Every non-zero weight, in declaration order.
    Listed,
    /// Weights above 10, highest first.
    #[default]
    Ranked,
}

impl FragmentStyle {
    pub fn threshold(self) -> u8 {
        match self {
            FragmentStyle::Listed => 0,
            FragmentStyle::Ranked => 10,
        }
    }
}

impl FromStr for FragmentStyle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "listed" => Ok(FragmentStyle::Listed),
            "ranked" => Ok(FragmentStyle::Ranked),
            other => anyhow::bail!("Unknown strategy style: {} (expected listed or ranked)", other),
        }
    }
}

impl fmt::Display for FragmentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FragmentStyle::Listed => f.write_str("listed"),
            FragmentStyle::Ranked => f.write_str("ranked"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_zero_weights_give_empty_fragment() {
        let weights = StrategyWeights::new([0; 5]).unwrap();
        assert_eq!(weights.prompt_fragment(FragmentStyle::Listed), "");
        assert_eq!(weights.prompt_fragment(FragmentStyle::Ranked), "");
    }

    #[test]
    fn test_ranked_drops_weights_at_or_below_ten() {
        let weights = StrategyWeights::new([10, 11, 0, 5, 10]).unwrap();
        assert_eq!(
            weights.prompt_fragment(FragmentStyle::Ranked),
            "Incidental - Case Studies: 11%"
        );
    }

    #[test]
    fn test_ranked_orders_descending_and_keeps_ties_stable() {
        let weights = StrategyWeights::new([30, 80, 30, 100, 11]).unwrap();
        assert_eq!(
            weights.prompt_fragment(FragmentStyle::Ranked),
            "Deductive - Application: 100%, Incidental - Case Studies: 80%, \
             Apprentice - Mentor-Student interaction: 30%, Inductive - Examples: 30%, \
             Discovery - Experimentation: 11%"
        );
    }

    #[test]
    fn test_listed_keeps_declaration_order() {
        let weights = StrategyWeights::new([5, 0, 90, 1, 0]).unwrap();
        assert_eq!(
            weights.prompt_fragment(FragmentStyle::Listed),
            "Apprentice - Mentor-Student interaction: 5%, Inductive - Examples: 90%, \
             Deductive - Application: 1%"
        );
    }

    #[test]
    fn test_default_weights() {
        let weights = StrategyWeights::default();
        assert!(weights.iter().all(|(_, v)| v == DEFAULT_WEIGHT));
        assert_eq!(weights.iter().count(), 5);
    }

    #[test]
    fn test_out_of_range_weight_rejected() {
        let err = StrategyWeights::new([20, 20, 101, 20, 20]).unwrap_err();
        assert_eq!(err.strategy, Strategy::Inductive);
        assert_eq!(err.value, 101);

        let mut weights = StrategyWeights::default();
        assert!(weights.set(Strategy::Discovery, 300).is_err());
        assert_eq!(weights.get(Strategy::Discovery), DEFAULT_WEIGHT);
    }

    #[test]
    fn test_style_parsing() {
        assert_eq!("Listed".parse::<FragmentStyle>().unwrap(), FragmentStyle::Listed);
        assert_eq!(" ranked ".parse::<FragmentStyle>().unwrap(), FragmentStyle::Ranked);
        assert!("sorted".parse::<FragmentStyle>().is_err());
    }
}
