use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Opponent strength tier. Stronger tiers think faster and search deeper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
    Hell,
}

impl Difficulty {
    /// Latency between the machine's turn opening and its move landing.
    pub fn think(&self) -> Duration {
        match self {
            Self::Easy => Duration::from_millis(1400),
            Self::Medium => Duration::from_millis(1000),
            Self::Hard => Duration::from_millis(700),
            Self::Expert => Duration::from_millis(500),
            Self::Hell => Duration::from_millis(350),
        }
    }
    /// Tiers at or above this search one ply ahead instead of picking
    /// greedily.
    pub fn searches(&self) -> bool {
        matches!(self, Self::Expert | Self::Hell)
    }
    /// Only the weakest tier moves at random.
    pub fn random(&self) -> bool {
        matches!(self, Self::Easy)
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "expert" => Ok(Self::Expert),
            "hell" => Ok(Self::Hell),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Easy => write!(f, "easy"),
            Self::Medium => write!(f, "medium"),
            Self::Hard => write!(f, "hard"),
            Self::Expert => write!(f, "expert"),
            Self::Hell => write!(f, "hell"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn stronger_tiers_think_faster() {
        assert!(Difficulty::Easy.think() > Difficulty::Medium.think());
        assert!(Difficulty::Hard.think() > Difficulty::Expert.think());
        assert!(Difficulty::Expert.think() > Difficulty::Hell.think());
        assert_eq!(Difficulty::Hard.think(), Duration::from_millis(700));
    }
    #[test]
    fn tiers_parse_from_wire_keys() {
        assert_eq!("hell".parse::<Difficulty>(), Ok(Difficulty::Hell));
        assert!("nightmare".parse::<Difficulty>().is_err());
    }
}
