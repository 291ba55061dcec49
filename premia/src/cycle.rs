//! Phase machine of one reconciliation cycle.
//!
//! A cycle walks `Idle → Normalizing → Matching → Computing → Merging → Idle`.
//! Any failure returns the machine to `Idle` from whatever phase it was in.
//! The machine carries no data; it only guards the order of stages and names
//! the phase a failure happened in.

use premia_core::PremiaError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    Normalizing,
    Matching,
    Computing,
    Merging,
}

impl CyclePhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Normalizing => "normalizing",
            Self::Matching => "matching",
            Self::Computing => "computing",
            Self::Merging => "merging",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleEvent {
    Start,
    Normalized,
    Matched,
    Computed,
    Merged,
    Failed,
}

impl CyclePhase {
    /// Apply `event`, returning the next phase.
    ///
    /// # Errors
    /// Returns `PremiaError::Other` for an event that is not valid in the
    /// current phase.
    pub fn handle(self, event: CycleEvent) -> Result<Self, PremiaError> {
        let next = match (self, event) {
            (Self::Idle, CycleEvent::Start) => Self::Normalizing,
            (Self::Normalizing, CycleEvent::Normalized) => Self::Matching,
            (Self::Matching, CycleEvent::Matched) => Self::Computing,
            (Self::Computing, CycleEvent::Computed) => Self::Merging,
            (Self::Merging, CycleEvent::Merged) => Self::Idle,
            (phase, CycleEvent::Failed) if phase != Self::Idle => Self::Idle,
            (phase, ev) => {
                return Err(PremiaError::Other(format!(
                    "invalid cycle transition: {ev:?} in phase {}",
                    phase.as_str()
                )));
            }
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(
            from = self.as_str(),
            to = next.as_str(),
            event = ?event,
            "cycle transition"
        );
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_returns_to_idle() {
        let mut p = CyclePhase::Idle;
        for ev in [
            CycleEvent::Start,
            CycleEvent::Normalized,
            CycleEvent::Matched,
            CycleEvent::Computed,
            CycleEvent::Merged,
        ] {
            p = p.handle(ev).unwrap();
        }
        assert_eq!(p, CyclePhase::Idle);
    }

    #[test]
    fn failure_from_any_active_phase_resets() {
        for p in [
            CyclePhase::Normalizing,
            CyclePhase::Matching,
            CyclePhase::Computing,
            CyclePhase::Merging,
        ] {
            assert_eq!(p.handle(CycleEvent::Failed).unwrap(), CyclePhase::Idle);
        }
    }

    #[test]
    fn out_of_order_events_are_rejected() {
        assert!(CyclePhase::Idle.handle(CycleEvent::Merged).is_err());
        assert!(CyclePhase::Idle.handle(CycleEvent::Failed).is_err());
        assert!(CyclePhase::Matching.handle(CycleEvent::Start).is_err());
    }
}
