//! Model Catalog
//!
//! Aggregation and ranking of models across backends: concurrent listing,
//! base-level collation sort, and the recently-used ranking derived from
//! session history.

use futures::future::try_join_all;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::backend::{ChatStrategy, Model};
use crate::error::ChatError;
use crate::session::SessionEntry;

/// Default number of models returned by [`recent_models`].
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// List every adapter's models concurrently and concatenate the results.
///
/// Each backend's internal ordering is preserved; entries are never
/// deduplicated across backends, since a same-named model on two backends
/// is two distinct entities. The first backend failure fails the call.
pub async fn list_all(strategies: &[Box<dyn ChatStrategy>]) -> Result<Vec<Model>, ChatError> {
    let listings = try_join_all(strategies.iter().map(|s| s.list_models())).await?;
    let catalog: Vec<Model> = listings.into_iter().flatten().collect();
    debug!(models = catalog.len(), backends = strategies.len(), "catalog assembled");
    Ok(catalog)
}

/// Sort models by name, ignoring case and diacritics but preserving
/// base-letter distinctions. Stable: ties keep their original order.
pub fn sort_by_name(models: &mut [Model]) {
    models.sort_by_key(|m| collation_key(&m.name));
}

/// Collation key: decompose, drop combining marks, lowercase.
/// `"Ärger"` keys as `"arger"`, so it sorts between `"apple"` and `"Zebra"`.
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Rank models by most recent session usage.
///
/// Walks `sessions` most-recent-first, resolves each referenced model name
/// against `catalog`, skips names no longer present, deduplicates by name
/// (most recent use wins), and stops once `limit` distinct models are
/// collected. An empty catalog yields an empty list.
#[must_use]
pub fn recent_models(sessions: &[SessionEntry], catalog: &[Model], limit: usize) -> Vec<Model> {
    let mut ordered: Vec<&SessionEntry> = sessions.iter().collect();
    ordered.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

    let mut recent: Vec<Model> = Vec::new();
    for session in ordered {
        if recent.len() >= limit {
            break;
        }
        if recent.iter().any(|m| m.name == session.model) {
            continue;
        }
        if let Some(model) = catalog.iter().find(|m| m.name == session.model) {
            recent.push(model.clone());
        }
    }
    recent
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use crate::backend::Backend;

    use super::*;

    fn model(name: &str) -> Model {
        Model::new(name, Backend::Ollama)
    }

    fn names(models: &[Model]) -> Vec<&str> {
        models.iter().map(|m| m.name.as_str()).collect()
    }

    #[test]
    fn sort_ignores_case_and_diacritics() {
        let mut models = vec![model("Zebra"), model("apple"), model("Ärger")];
        sort_by_name(&mut models);
        assert_eq!(names(&models), vec!["apple", "Ärger", "Zebra"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut models = vec![model("b"), model("A"), model("a"), model("B")];
        sort_by_name(&mut models);
        // "A" and "a" key identically, as do "b" and "B"; original order holds.
        assert_eq!(names(&models), vec!["A", "a", "b", "B"]);
    }

    fn history(names: &[&str]) -> Vec<SessionEntry> {
        // Most-recent-first input: assign descending timestamps.
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                SessionEntry::new(
                    *name,
                    Utc.timestamp_opt(1_000_000 - i as i64, 0).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn recent_models_dedupes_and_caps() {
        let catalog: Vec<Model> =
            ["m1", "m2", "m3", "m4", "m5", "m6"].iter().map(|n| model(*n)).collect();
        let sessions = history(&["m1", "m2", "m1", "m3", "m4", "m5", "m6"]);

        let recent = recent_models(&sessions, &catalog, 5);
        assert_eq!(names(&recent), vec!["m1", "m2", "m3", "m4", "m5"]);
    }

    #[test]
    fn recent_models_skips_names_absent_from_catalog() {
        let catalog = vec![model("kept")];
        let sessions = history(&["deleted", "kept"]);

        let recent = recent_models(&sessions, &catalog, DEFAULT_RECENT_LIMIT);
        assert_eq!(names(&recent), vec!["kept"]);
    }

    #[test]
    fn recent_models_with_empty_catalog_is_empty() {
        let sessions = history(&["m1"]);
        assert!(recent_models(&sessions, &[], DEFAULT_RECENT_LIMIT).is_empty());
    }

    #[test]
    fn recent_models_orders_by_timestamp_not_input_order() {
        let catalog = vec![model("old"), model("new")];
        let mut sessions = history(&["old"]);
        sessions.push(SessionEntry::new(
            "new",
            Utc.timestamp_opt(2_000_000, 0).unwrap(),
        ));

        let recent = recent_models(&sessions, &catalog, DEFAULT_RECENT_LIMIT);
        assert_eq!(names(&recent), vec!["new", "old"]);
    }
}
