//! Detail-set reconciliation.
//!
//! Given the detail ids a movement currently owns and the ids present in a
//! caller's desired new line list, classify every line as create, update or
//! delete. Identity decides the classification, not content: an id present
//! in both lists is always an update even when its supply or quantity
//! changed, so its row (and anything referencing it) survives the edit.
//!
//! This is a pure set difference; it never touches the ledger or the store.

use std::collections::HashSet;

use uuid::Uuid;

/// The classification of a desired new line list against the persisted one.
///
/// `to_create` holds indices into the new list (new lines have no id yet);
/// `to_update` and `to_delete` hold detail ids. All three preserve first-seen
/// input order and collapse duplicate ids, so the plan is deterministic and
/// reconciling twice yields the same plan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub to_create: Vec<usize>,
    pub to_update: Vec<Uuid>,
    pub to_delete: Vec<Uuid>,
}

/// Classifies `new_ids` against `old_ids`.
///
/// A `None` entry in `new_ids` is a line to be created. A `Some(id)` entry
/// whose id is unknown to `old_ids` is also a create (the caller picked the
/// id). Ids in both lists are updates; ids only in `old_ids` are deletes.
pub fn reconcile(old_ids: &[Uuid], new_ids: &[Option<Uuid>]) -> ReconcilePlan {
    let old_set: HashSet<Uuid> = old_ids.iter().copied().collect();
    let new_set: HashSet<Uuid> = new_ids.iter().filter_map(|id| *id).collect();

    let mut to_create = Vec::new();
    let mut seen_new: HashSet<Uuid> = HashSet::new();
    for (index, id) in new_ids.iter().enumerate() {
        match id {
            None => to_create.push(index),
            Some(id) => {
                if !seen_new.insert(*id) {
                    continue;
                }
                if !old_set.contains(id) {
                    to_create.push(index);
                }
            }
        }
    }

    let mut to_update = Vec::new();
    let mut to_delete = Vec::new();
    let mut seen_old: HashSet<Uuid> = HashSet::new();
    for id in old_ids {
        if !seen_old.insert(*id) {
            continue;
        }
        if new_set.contains(id) {
            to_update.push(*id);
        } else {
            to_delete.push(*id);
        }
    }

    ReconcilePlan {
        to_create,
        to_update,
        to_delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<Uuid> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn classifies_disjoint_sets() {
        let old = ids(3);
        let fresh = Uuid::new_v4();
        let new = vec![Some(old[0]), None, Some(fresh), Some(old[2])];

        let plan = reconcile(&old, &new);

        assert_eq!(plan.to_create, vec![1, 2]);
        assert_eq!(plan.to_update, vec![old[0], old[2]]);
        assert_eq!(plan.to_delete, vec![old[1]]);
    }

    #[test]
    fn id_in_both_lists_is_always_an_update() {
        let old = ids(1);
        // Content may have changed entirely; identity still wins.
        let new = vec![Some(old[0])];

        let plan = reconcile(&old, &new);

        assert_eq!(plan.to_update, vec![old[0]]);
        assert!(plan.to_create.is_empty());
        assert!(plan.to_delete.is_empty());
    }

    #[test]
    fn empty_new_list_deletes_everything() {
        let old = ids(2);
        let plan = reconcile(&old, &[]);

        assert!(plan.to_create.is_empty());
        assert!(plan.to_update.is_empty());
        assert_eq!(plan.to_delete, old);
    }

    #[test]
    fn duplicates_collapse_first_seen() {
        let old = vec![];
        let id = Uuid::new_v4();
        let new = vec![Some(id), Some(id), None, None];

        let plan = reconcile(&old, &new);

        // The duplicated id creates once; each absent-id entry is its own line.
        assert_eq!(plan.to_create, vec![0, 2, 3]);

        let old = vec![id, id];
        let plan = reconcile(&old, &[]);
        assert_eq!(plan.to_delete, vec![id]);
    }

    #[test]
    fn preserves_first_seen_order() {
        let old = ids(4);
        let new = vec![Some(old[3]), Some(old[1])];

        let plan = reconcile(&old, &new);

        // Update/delete order follows the old list, not the new one.
        assert_eq!(plan.to_update, vec![old[1], old[3]]);
        assert_eq!(plan.to_delete, vec![old[0], old[2]]);
    }

    #[test]
    fn reconciling_twice_yields_the_same_plan() {
        let old = ids(3);
        let new = vec![Some(old[1]), None, Some(Uuid::new_v4())];

        assert_eq!(reconcile(&old, &new), reconcile(&old, &new));
    }
}
