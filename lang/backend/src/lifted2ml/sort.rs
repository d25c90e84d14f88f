//! Topological ordering of definitions.
//!
//! `Let` bindings stay in source position (their right-hand sides may
//! have effects); the `Def` groups between them are emitted in
//! dependency order. A cyclic group means mutual recursion, which the
//! ML back end rejects outright.

use ast::lifted::*;
use ast::{FreeVars, HashMap, HashSet, SymbolId};

use crate::result::{BackendError, BackendResult};

pub fn sort_definitions(definitions: &[Definition]) -> BackendResult<Vec<&Definition>> {
    let mut out = Vec::with_capacity(definitions.len());
    let mut group: Vec<&Definition> = Vec::new();
    for definition in definitions {
        match definition {
            Definition::Def(_) => group.push(definition),
            Definition::Let(_) => {
                out.extend(sort_group(std::mem::take(&mut group))?);
                out.push(definition);
            }
        }
    }
    out.extend(sort_group(group)?);
    Ok(out)
}

/// Kahn's algorithm over one `Def` group. Ties are broken by source
/// position, so the output is deterministic.
fn sort_group(group: Vec<&Definition>) -> BackendResult<Vec<&Definition>> {
    if group.len() <= 1 {
        return Ok(group);
    }

    let ids: HashMap<SymbolId, usize> = group
        .iter()
        .enumerate()
        .filter_map(|(index, definition)| match definition {
            Definition::Def(def) => Some((def.id.id, index)),
            Definition::Let(_) => None,
        })
        .collect();

    // dependencies[i] = indices of group members that i's body mentions
    let dependencies: Vec<HashSet<usize>> = group
        .iter()
        .map(|definition| {
            definition
                .free_var_set()
                .iter()
                .filter_map(|free| ids.get(free).copied())
                .collect()
        })
        .collect();

    let mut emitted: Vec<bool> = vec![false; group.len()];
    let mut out = Vec::with_capacity(group.len());
    loop {
        let next = (0..group.len()).find(|&index| {
            !emitted[index]
                && dependencies[index]
                    .iter()
                    .all(|&dep| dep == index || emitted[dep])
        });
        match next {
            Some(index) => {
                emitted[index] = true;
                out.push(group[index]);
            }
            None => break,
        }
    }

    if out.len() < group.len() {
        let names: Vec<String> = group
            .iter()
            .enumerate()
            .filter(|(index, _)| !emitted[*index])
            .filter_map(|(_, definition)| match definition {
                Definition::Def(def) => Some(def.id.name.id.clone()),
                Definition::Let(_) => None,
            })
            .collect();
        return Err(BackendError::MutualRecursionUnsupported { names: names.join(", ") });
    }
    Ok(out)
}
