// src/rules.rs
//
// The traffic-light decision table. One ordered table, first applicable
// rule wins; yellow and unknown colors never resolve a rule, evaluation
// falls through to the next one.
//
//   1. Right turns: a dedicated right arrow is authoritative (red is
//      enforced strictly). With no right arrow configured, right turns are
//      always allowed — the turn-on-red exception.
//   2. Dedicated arrows for left and straight are authoritative over the
//      circular light.
//   3. Circular fallback when no dedicated arrow resolved the case.
//   4. A straight arrow governs left turns at intersections with no left
//      arrow (checked after the circular, matching posted signal priority).
//   5. Unknown direction never violates: any green allows, otherwise
//      benefit of the doubt.
//   6. Default: inconclusive, no violation.
//
// Only invoked when the stop-line gate has fired for the track. With zero
// lights configured the table short-circuits to "not configured".

use tracing::debug;

use crate::lights::TrafficLightBank;
use crate::types::{Direction, LightColor, LightKind, VerdictReason};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleOutcome {
    pub is_violation: bool,
    pub reason: VerdictReason,
}

impl RuleOutcome {
    fn allowed(reason: VerdictReason) -> Self {
        Self {
            is_violation: false,
            reason,
        }
    }

    fn violation(reason: VerdictReason) -> Self {
        Self {
            is_violation: true,
            reason,
        }
    }
}

/// First red or green among the lights of one kind, registration order.
/// Yellow/unknown heads are skipped; they cannot resolve a rule.
fn first_resolved(bank: &TrafficLightBank, kind: LightKind) -> Option<LightColor> {
    bank.of_kind(kind)
        .map(|s| s.color)
        .find(|c| matches!(c, LightColor::Red | LightColor::Green))
}

pub fn evaluate(direction: Direction, bank: &TrafficLightBank) -> RuleOutcome {
    if bank.is_empty() {
        return RuleOutcome::allowed(VerdictReason::NotConfigured);
    }

    // Rule 5 first for unknown: none of the maneuver rules apply, and an
    // undetermined direction must never produce a violation.
    if direction == Direction::Unknown {
        return if bank.any_green() {
            RuleOutcome::allowed(VerdictReason::UnknownDirectionGreen)
        } else {
            RuleOutcome::allowed(VerdictReason::UnknownDirectionBenefit)
        };
    }

    // Rules 1 and 2: dedicated arrows are authoritative.
    match direction {
        Direction::Right => {
            if bank.has_kind(LightKind::RightArrow) {
                match first_resolved(bank, LightKind::RightArrow) {
                    Some(LightColor::Green) => {
                        return RuleOutcome::allowed(VerdictReason::RightArrowGreen)
                    }
                    Some(LightColor::Red) => {
                        return RuleOutcome::violation(VerdictReason::RightArrowRed)
                    }
                    _ => {} // unresolved arrow, fall through to the circular
                }
            } else {
                return RuleOutcome::allowed(VerdictReason::RightOnRedAllowed);
            }
        }
        Direction::Left => match first_resolved(bank, LightKind::LeftArrow) {
            Some(LightColor::Green) => {
                return RuleOutcome::allowed(VerdictReason::LeftArrowGreen)
            }
            Some(LightColor::Red) => {
                return RuleOutcome::violation(VerdictReason::LeftArrowRed)
            }
            _ => {}
        },
        Direction::Straight => match first_resolved(bank, LightKind::StraightArrow) {
            Some(LightColor::Green) => {
                return RuleOutcome::allowed(VerdictReason::StraightArrowGreen)
            }
            Some(LightColor::Red) => {
                return RuleOutcome::violation(VerdictReason::StraightArrowRed)
            }
            _ => {}
        },
        Direction::Unknown => unreachable!("handled above"),
    }

    // Rule 3: circular fallback.
    match first_resolved(bank, LightKind::Circular) {
        Some(LightColor::Green) => return RuleOutcome::allowed(VerdictReason::CircularGreen),
        Some(LightColor::Red) => return RuleOutcome::violation(VerdictReason::CircularRed),
        _ => {}
    }

    // Rule 4: with no dedicated left arrow, a straight arrow governs left
    // turns as well.
    if direction == Direction::Left && !bank.has_kind(LightKind::LeftArrow) {
        match first_resolved(bank, LightKind::StraightArrow) {
            Some(LightColor::Green) => {
                return RuleOutcome::allowed(VerdictReason::StraightFallbackGreen)
            }
            Some(LightColor::Red) => {
                return RuleOutcome::violation(VerdictReason::StraightFallbackRed)
            }
            _ => {}
        }
    }

    // Rule 6: everything relevant is yellow/unknown.
    debug!("rule table inconclusive for direction {}", direction);
    RuleOutcome::allowed(VerdictReason::Inconclusive)
}
