//! Pure helpers for merging conditions into a status
//!
//! Conditions are keyed by type. Writing a condition replaces the entry of the
//! same type in place, and `lastTransitionTime` only moves when the status
//! value changes.

use chrono::{DateTime, Utc};

use crate::crd::Condition;

/// Find the condition with the given type
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Merge `target` into `existing`, returning the updated list
///
/// - No entry of the target's type: append with `lastTransitionTime = now`.
/// - Entry with the same status: update reason, message and observed
///   generation; keep its transition time.
/// - Entry with a different status: replace it with `lastTransitionTime = now`.
///
/// The target's own `last_transition_time` is ignored. Extra entries of the
/// same type are dropped so at most one survives, at the first position.
pub fn merge(existing: &[Condition], target: Condition, now: DateTime<Utc>) -> Vec<Condition> {
    let type_ = target.type_.clone();
    let mut merged = Vec::with_capacity(existing.len() + 1);
    let mut target = Some(target);

    for current in existing {
        if current.type_ != type_ {
            merged.push(current.clone());
            continue;
        }
        // First entry of this type absorbs the target; later duplicates vanish.
        if let Some(next) = target.take() {
            merged.push(transition(current, next, now));
        }
    }

    if let Some(mut next) = target {
        next.last_transition_time = now;
        merged.push(next);
    }

    merged
}

fn transition(current: &Condition, mut next: Condition, now: DateTime<Utc>) -> Condition {
    next.last_transition_time = if current.status == next.status {
        current.last_transition_time
    } else {
        now
    };
    next
}
