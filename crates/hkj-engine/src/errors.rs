use super::state::TokenKind;

/// Soft validation failures. Reported to the offending player only; the
/// state is never mutated on the error path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    UnknownPlayer,
    WrongPhase,
    NotYourTurn,
    TokenSpent(TokenKind),
    InteractionInProgress,
    NoInteraction,
    NotInteractionTarget,
    CardNotOwned,
    DuplicateCards,
    WrongCardCount { expected: usize, got: usize },
    BadGrouping,
    NotOffered,
    BadGroupIndex,
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownPlayer => write!(f, "player is not seated in this room"),
            Self::WrongPhase => write!(f, "current phase disallows this action"),
            Self::NotYourTurn => write!(f, "not your turn"),
            Self::TokenSpent(kind) => write!(f, "{} token already used this round", kind),
            Self::InteractionInProgress => {
                write!(f, "a pending interaction must be resolved first")
            }
            Self::NoInteraction => write!(f, "no interaction to resolve"),
            Self::NotInteractionTarget => {
                write!(f, "only the interaction target may resolve it")
            }
            Self::CardNotOwned => write!(f, "card is not in your hand"),
            Self::DuplicateCards => write!(f, "duplicate cards in selection"),
            Self::WrongCardCount { expected, got } => {
                write!(f, "expected {} cards, got {}", expected, got)
            }
            Self::BadGrouping => write!(f, "competition requires two groups of two cards"),
            Self::NotOffered => write!(f, "chosen card is not among the offered cards"),
            Self::BadGroupIndex => write!(f, "chosen group index must be 0 or 1"),
        }
    }
}

impl std::error::Error for RuleError {}
