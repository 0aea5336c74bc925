//! Post-mutation cleanup of blank values and tracking parameters.

use tracing::trace;

use crate::config::{RenderOptions, UTM_PREFIX};
use crate::store::MultiValueStore;

/// Returns true if `key` names a tracking parameter (`utm_*`, any case).
#[must_use]
pub fn is_tracking_key(key: &str) -> bool {
    key.len() >= UTM_PREFIX.len()
        && key.as_bytes()[..UTM_PREFIX.len()].eq_ignore_ascii_case(UTM_PREFIX.as_bytes())
}

/// Drop blank values and tracking parameters as configured.
///
/// The two filters look at different things (values vs. key names), so
/// the order they run in does not change the result.
#[must_use]
pub fn filter(mut store: MultiValueStore, options: &RenderOptions) -> MultiValueStore {
    if options.remove_utm {
        store.retain_keys(|key| {
            let tracking = is_tracking_key(key);
            if tracking {
                trace!(key, "dropped tracking parameter");
            }
            !tracking
        });
    }
    if options.remove_blank {
        store.retain_values(|value| !value.is_empty());
    }
    store
}
