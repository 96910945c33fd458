// ── Reconciliation engine ──
//
// Pure diff logic: given what the account has now, what this tool put
// there before, and what is wanted, compute the rule list to submit.
// No I/O and no clock, so every outcome is reproducible from its inputs.

use indexmap::IndexSet;
use serde::Serialize;

use ipfence_api::IpRule;

/// Inputs to a single reconciliation.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationInput<'a> {
    /// Rules currently on the account, in remote order.
    pub current_remote: &'a [IpRule],
    /// Rules this tool manages on the account. `None` on first creation.
    pub previously_tracked: Option<&'a [IpRule]>,
    /// Rules that should be present.
    pub desired: &'a [IpRule],
}

/// The mutation needed to move the account toward the desired rules.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationPlan {
    pub to_remove: IndexSet<IpRule>,
    pub to_add: IndexSet<IpRule>,
    /// Complete rule list to submit: retained remote rules in their
    /// original order, then additions in desired order.
    pub final_set: Vec<IpRule>,
    pub noop: bool,
    /// The account had no IP restriction at all, so nothing was planned.
    pub public_account: bool,
}

impl ReconciliationPlan {
    fn public() -> Self {
        Self {
            noop: true,
            public_account: true,
            ..Self::default()
        }
    }
}

/// Drop the empty "no rule" sentinel and duplicates, keeping first-seen order.
fn effective(rules: &[IpRule]) -> IndexSet<IpRule> {
    rules.iter().filter(|r| !r.is_sentinel()).cloned().collect()
}

/// Rules as they would be tracked: sentinel dropped, duplicates removed,
/// first-seen order kept.
pub fn normalize(rules: &[IpRule]) -> Vec<IpRule> {
    effective(rules).into_iter().collect()
}

/// Compute the minimal safe change.
///
/// - An account with no rules is fully public; restricting it would cut
///   off every client, so the plan is always a no-op.
/// - Only rules that were tracked, are no longer desired, and are still
///   present remotely are removed. Rules added by someone else stay.
/// - Desired rules missing remotely are appended.
pub fn plan(input: &ReconciliationInput<'_>) -> ReconciliationPlan {
    let current = effective(input.current_remote);
    if current.is_empty() {
        return ReconciliationPlan::public();
    }

    let desired = effective(input.desired);

    let to_remove: IndexSet<IpRule> = input
        .previously_tracked
        .map(|tracked| {
            effective(tracked)
                .into_iter()
                .filter(|rule| !desired.contains(rule) && current.contains(rule))
                .collect()
        })
        .unwrap_or_default();

    let to_add: IndexSet<IpRule> = desired
        .into_iter()
        .filter(|rule| !current.contains(rule))
        .collect();

    let final_set = current
        .iter()
        .filter(|rule| !to_remove.contains(*rule))
        .chain(to_add.iter())
        .cloned()
        .collect();

    let noop = to_remove.is_empty() && to_add.is_empty();
    ReconciliationPlan {
        to_remove,
        to_add,
        final_set,
        noop,
        public_account: false,
    }
}

/// Plan the removal of every rule this tool manages on the account.
///
/// Same as [`plan`] with nothing desired: only tracked rules that are still
/// present go, everything else is left alone.
pub fn plan_release(current_remote: &[IpRule], tracked: &[IpRule]) -> ReconciliationPlan {
    plan(&ReconciliationInput {
        current_remote,
        previously_tracked: Some(tracked),
        desired: &[],
    })
}

/// Refresh the tracked rules against what the account actually has.
///
/// Tracked rules that disappeared remotely are forgotten. A public account
/// (no rules at all) leaves the tracked rules untouched.
pub fn observe(current_remote: &[IpRule], tracked: &[IpRule]) -> Vec<IpRule> {
    let current = effective(current_remote);
    let tracked = effective(tracked);
    if current.is_empty() {
        return tracked.into_iter().collect();
    }
    tracked
        .into_iter()
        .filter(|rule| current.contains(rule))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rules(addrs: &[&str]) -> Vec<IpRule> {
        addrs.iter().copied().map(IpRule::new).collect()
    }

    fn set(addrs: &[&str]) -> IndexSet<IpRule> {
        addrs.iter().copied().map(IpRule::new).collect()
    }

    fn run(current: &[&str], tracked: Option<&[&str]>, desired: &[&str]) -> ReconciliationPlan {
        let current = rules(current);
        let tracked = tracked.map(rules);
        let desired = rules(desired);
        plan(&ReconciliationInput {
            current_remote: &current,
            previously_tracked: tracked.as_deref(),
            desired: &desired,
        })
    }

    #[test]
    fn minimal_diff() {
        let plan = run(&["A", "B"], Some(&["A", "B"]), &["B", "C"]);

        assert_eq!(plan.to_remove, set(&["A"]));
        assert_eq!(plan.to_add, set(&["C"]));
        assert_eq!(plan.final_set, rules(&["B", "C"]));
        assert!(!plan.noop);
    }

    #[test]
    fn external_rules_are_untouched() {
        let plan = run(&["A", "B", "X"], Some(&["A", "B"]), &["A"]);

        assert_eq!(plan.to_remove, set(&["B"]));
        assert!(plan.to_add.is_empty());
        assert_eq!(plan.final_set, rules(&["A", "X"]));
    }

    #[test]
    fn public_account_is_never_narrowed() {
        for desired in [&["A"][..], &["A", "B", "10.0.0.0/8"][..]] {
            let plan = run(&[], Some(&["A"]), desired);
            assert!(plan.noop);
            assert!(plan.public_account);
            assert!(plan.final_set.is_empty());
        }
    }

    #[test]
    fn sentinel_only_remote_counts_as_public() {
        let plan = run(&[""], None, &["A"]);
        assert!(plan.noop);
        assert!(plan.final_set.is_empty());
    }

    #[test]
    fn sentinel_never_reaches_final_set() {
        let plan = run(&["A", "", "B"], Some(&[""]), &["", "C"]);

        assert_eq!(plan.final_set, rules(&["A", "B", "C"]));
        assert!(plan.to_remove.is_empty());
        assert_eq!(plan.to_add, set(&["C"]));
    }

    #[test]
    fn creation_only_adds() {
        let plan = run(&["A", "B"], None, &["C"]);

        assert!(plan.to_remove.is_empty());
        assert_eq!(plan.final_set, rules(&["A", "B", "C"]));
    }

    #[test]
    fn reapplying_final_set_as_tracked_is_noop() {
        let current = rules(&["A", "B"]);
        let tracked = rules(&["A"]);
        let desired = rules(&["B", "C", "D"]);

        let first = plan(&ReconciliationInput {
            current_remote: &current,
            previously_tracked: Some(&tracked),
            desired: &desired,
        });
        assert!(!first.noop);

        let second = plan(&ReconciliationInput {
            current_remote: &first.final_set,
            previously_tracked: Some(&first.final_set),
            desired: &desired,
        });
        assert!(second.noop);
        assert_eq!(second.final_set, first.final_set);
    }

    #[test]
    fn reapplying_with_recorded_desired_keeps_external_rules() {
        let current = rules(&["A", "B", "X"]);
        let tracked = rules(&["A", "B"]);
        let desired = rules(&["B", "C", "D"]);

        let first = plan(&ReconciliationInput {
            current_remote: &current,
            previously_tracked: Some(&tracked),
            desired: &desired,
        });
        assert_eq!(first.final_set, rules(&["B", "X", "C", "D"]));

        // What apply records after success.
        let recorded = normalize(&desired);
        let second = plan(&ReconciliationInput {
            current_remote: &first.final_set,
            previously_tracked: Some(&recorded),
            desired: &desired,
        });
        assert!(second.noop);
        assert_eq!(second.final_set, first.final_set);
    }

    #[test]
    fn tracked_rule_already_gone_is_not_removed() {
        let plan = run(&["B"], Some(&["A", "B"]), &["B"]);
        assert!(plan.noop);
        assert_eq!(plan.final_set, rules(&["B"]));
    }

    #[test]
    fn desired_duplicates_are_added_once() {
        let plan = run(&["A"], None, &["C", "C", "A"]);
        assert_eq!(plan.to_add, set(&["C"]));
        assert_eq!(plan.final_set, rules(&["A", "C"]));
    }

    #[test]
    fn release_removes_only_tracked() {
        let plan = plan_release(&rules(&["A", "X", "B"]), &rules(&["A", "B", "Z"]));

        assert_eq!(plan.to_remove, set(&["A", "B"]));
        assert_eq!(plan.final_set, rules(&["X"]));
        assert!(!plan.noop);
    }

    #[test]
    fn release_can_empty_the_list() {
        let plan = plan_release(&rules(&["A"]), &rules(&["A"]));
        assert!(plan.final_set.is_empty());
        assert!(!plan.noop);
    }

    #[test]
    fn normalize_drops_sentinel_and_duplicates() {
        assert_eq!(normalize(&rules(&["B", "", "A", "B"])), rules(&["B", "A"]));
    }

    #[test]
    fn observe_prunes_vanished_rules() {
        let kept = observe(&rules(&["B", "X", ""]), &rules(&["A", "B"]));
        assert_eq!(kept, rules(&["B"]));
    }

    #[test]
    fn observe_public_account_keeps_tracked() {
        let kept = observe(&[], &rules(&["A", "B"]));
        assert_eq!(kept, rules(&["A", "B"]));
    }
}
