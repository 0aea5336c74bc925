//! Applies instructions to a parameter store.

use tracing::trace;

use crate::error::{Error, Result};
use crate::instruction::Instruction;
use crate::store::MultiValueStore;

/// Apply `instructions` to `store` and return the result.
///
/// A `KeepOnly` or `Discard` instruction is applied first wherever it sits
/// in the list. The remaining instructions run in order, so several
/// operations on one key compose left to right.
///
/// # Errors
///
/// Returns [`Error::Conflict`] if both `KeepOnly` and `Discard` are present.
pub fn apply(mut store: MultiValueStore, instructions: &[Instruction]) -> Result<MultiValueStore> {
    let keep_only = instructions.iter().find_map(|instruction| match instruction {
        Instruction::KeepOnly { keys } => Some(keys),
        _ => None,
    });
    let discard = instructions.iter().find_map(|instruction| match instruction {
        Instruction::Discard { keys } => Some(keys),
        _ => None,
    });

    match (keep_only, discard) {
        (Some(_), Some(_)) => {
            return Err(Error::Conflict(
                "'only' and 'discard' instructions reached the engine together".to_string(),
            ))
        }
        (Some(keys), None) => store.retain_keys(|key| {
            let keep = keys.iter().any(|wanted| wanted == key);
            if !keep {
                trace!(key, "dropped by 'only'");
            }
            keep
        }),
        (None, Some(keys)) => {
            for key in keys {
                if store.remove(key).is_some() {
                    trace!(key = %key, "dropped by 'discard'");
                }
            }
        }
        (None, None) => {}
    }

    for instruction in instructions {
        match instruction {
            Instruction::Set { key, values } => store.set_list(key.clone(), values.clone()),
            Instruction::Add { key, values } => {
                for value in values {
                    if !store.get_list(key).contains(value) {
                        store.append(key.clone(), value.clone());
                    }
                }
            }
            Instruction::Remove { key, values } => {
                for value in values {
                    store.remove_value(key, value);
                }
            }
            Instruction::KeepOnly { .. } | Instruction::Discard { .. } => {}
        }
    }

    Ok(store)
}
