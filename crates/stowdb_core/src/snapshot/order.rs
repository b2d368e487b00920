//! Load ordering of collections.

use crate::error::{CoreError, CoreResult};
use std::collections::{BTreeMap, BTreeSet};

/// Orders collections so every collection follows the ones it references.
///
/// `dependencies` maps each collection to the collections it references.
/// Self-references and references to collections outside the map are
/// ignored. Ties are broken by name.
///
/// # Errors
///
/// Returns [`CoreError::ReferenceCycle`] naming the collections that could
/// not be ordered.
pub fn load_order(dependencies: &BTreeMap<String, BTreeSet<String>>) -> CoreResult<Vec<String>> {
    let mut pending: BTreeMap<&str, BTreeSet<&str>> = dependencies
        .iter()
        .map(|(name, targets)| {
            let targets = targets
                .iter()
                .map(String::as_str)
                .filter(|target| *target != name.as_str() && dependencies.contains_key(*target))
                .collect();
            (name.as_str(), targets)
        })
        .collect();

    let mut order = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        let ready: Vec<&str> = pending
            .iter()
            .filter(|(_, targets)| targets.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if ready.is_empty() {
            return Err(CoreError::ReferenceCycle {
                collections: pending.keys().map(|name| (*name).to_string()).collect(),
            });
        }
        for name in ready {
            pending.remove(name);
            for targets in pending.values_mut() {
                targets.remove(name);
            }
            order.push(name.to_string());
        }
    }
    Ok(order)
}
