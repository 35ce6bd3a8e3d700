//! Append-only versioned truth store backed by a JSON snapshot.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::entry::{versioned_id, EntityType, TruthEntry};
use super::error::TruthError;

/// A problem found while walking a version chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityWarning {
    /// `previous_version_id` names an entry that is not in the store.
    BrokenLink { entry_id: String, missing_id: String },
    /// The chain returns to an entry already visited.
    Cycle { entry_id: String },
    /// An entry sits at the next version id but does not continue the chain.
    MisplacedVersion { entry_id: String, expected_previous: String },
}

impl std::fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BrokenLink {
                entry_id,
                missing_id,
            } => write!(f, "{entry_id} points at missing version {missing_id}"),
            Self::Cycle { entry_id } => write!(f, "version chain loops back to {entry_id}"),
            Self::MisplacedVersion {
                entry_id,
                expected_previous,
            } => write!(f, "{entry_id} does not follow {expected_previous}"),
        }
    }
}

/// Version chain of one logical id, newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct VersionHistory {
    pub entries: Vec<TruthEntry>,
    pub warnings: Vec<IntegrityWarning>,
}

/// Versioned store of truth entries.
///
/// Entries are never overwritten or removed. When a path is set, every
/// mutation rewrites the whole snapshot; a single process owns the file.
#[derive(Debug, Default)]
pub struct TruthStore {
    entries: Vec<TruthEntry>,
    index: HashMap<String, usize>,
    path: Option<PathBuf>,
}

impl TruthStore {
    /// Create a store that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the snapshot at `path`.
    ///
    /// A missing or corrupt snapshot yields an empty store.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = Self {
            path: Some(path.clone()),
            ..Self::default()
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No truth snapshot found");
                return store;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read truth snapshot");
                return store;
            }
        };

        let raw: serde_json::Map<String, serde_json::Value> = match serde_json::from_str(&content)
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt truth snapshot, starting empty");
                return store;
            }
        };

        for (key, value) in raw {
            match serde_json::from_value::<TruthEntry>(value) {
                Ok(mut entry) => {
                    if entry.id.is_empty() {
                        entry.id = key;
                    }
                    store.insert(entry);
                }
                Err(e) => tracing::warn!(id = %key, error = %e, "Skipping unreadable truth entry"),
            }
        }
        tracing::debug!(path = %path.display(), count = store.len(), "Loaded truth snapshot");
        store
    }

    /// Snapshot path, if persistent.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[TruthEntry] {
        &self.entries
    }

    /// Look up an entry by its stored id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TruthEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    /// Store `entry`, as version 1 if its id is new, otherwise as the
    /// successor of the latest version of that logical id. Persists before
    /// returning the stored entry.
    ///
    /// # Errors
    ///
    /// Returns `TruthError` if the next version id is already taken or the
    /// snapshot cannot be written; the entry is not kept in either case.
    pub fn add_or_update(&mut self, entry: TruthEntry) -> Result<TruthEntry, TruthError> {
        let stored = self.stage(entry)?;
        if let Err(e) = self.save() {
            self.rollback(1);
            return Err(e);
        }
        tracing::debug!(id = %stored.id, version = stored.version, "Stored truth entry");
        Ok(stored)
    }

    /// Store several entries with the same rules as [`Self::add_or_update`],
    /// writing the snapshot once.
    ///
    /// # Errors
    ///
    /// Returns `TruthError` if any entry cannot be staged or the snapshot
    /// cannot be written; none of the entries are kept in that case.
    pub fn extend(
        &mut self,
        entries: impl IntoIterator<Item = TruthEntry>,
    ) -> Result<Vec<TruthEntry>, TruthError> {
        let mut stored = Vec::new();
        for entry in entries {
            match self.stage(entry) {
                Ok(entry) => stored.push(entry),
                Err(e) => {
                    self.rollback(stored.len());
                    return Err(e);
                }
            }
        }
        if let Err(e) = self.save() {
            self.rollback(stored.len());
            return Err(e);
        }
        Ok(stored)
    }

    /// Append `entry` (or its successor) without saving. Never overwrites, so
    /// `rollback` always removes exactly what was staged.
    fn stage(&mut self, entry: TruthEntry) -> Result<TruthEntry, TruthError> {
        let entry = match self.current(&entry.id) {
            Some(latest) => entry.successor_of(latest),
            None => entry,
        };
        if self.index.contains_key(&entry.id) {
            return Err(TruthError::VersionTaken { id: entry.id });
        }
        self.insert(entry.clone());
        Ok(entry)
    }

    fn insert(&mut self, entry: TruthEntry) {
        match self.index.get(&entry.id) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn rollback(&mut self, count: usize) {
        for _ in 0..count {
            if let Some(entry) = self.entries.pop() {
                self.index.remove(&entry.id);
            }
        }
    }

    /// Latest version of a logical id.
    ///
    /// The walk stops at the first entry that does not properly continue the
    /// chain; [`Self::history`] reports that as a warning.
    #[must_use]
    pub fn current(&self, logical_id: &str) -> Option<&TruthEntry> {
        self.walk_forward(logical_id).map(|(latest, _)| latest)
    }

    /// Follow `{id}_v{n+1}` links while each one names the previous entry and
    /// raises the version. Versions strictly increase, so this terminates.
    fn walk_forward(&self, logical_id: &str) -> Option<(&TruthEntry, Option<IntegrityWarning>)> {
        let mut latest = self.get(logical_id)?;
        loop {
            let Some(next) = self.get(&versioned_id(logical_id, latest.version + 1)) else {
                return Some((latest, None));
            };
            let continues = next.version > latest.version
                && next.previous_version_id.as_deref() == Some(latest.id.as_str());
            if !continues {
                let warning = IntegrityWarning::MisplacedVersion {
                    entry_id: next.id.clone(),
                    expected_previous: latest.id.clone(),
                };
                return Some((latest, Some(warning)));
            }
            latest = next;
        }
    }

    /// Version chain of a logical id, newest first.
    ///
    /// Links that do not resolve or that loop are reported as warnings and
    /// end the walk.
    #[must_use]
    pub fn history(&self, logical_id: &str) -> VersionHistory {
        let mut history = VersionHistory::default();
        let mut seen = HashSet::new();
        let mut cursor = match self.walk_forward(logical_id) {
            Some((latest, warning)) => {
                history.warnings.extend(warning);
                Some(latest)
            }
            None => None,
        };

        while let Some(entry) = cursor {
            if !seen.insert(entry.id.as_str()) {
                history.warnings.push(IntegrityWarning::Cycle {
                    entry_id: entry.id.clone(),
                });
                break;
            }
            history.entries.push(entry.clone());
            cursor = match entry.previous_version_id.as_deref() {
                None => None,
                Some(prev) => {
                    let found = self.get(prev);
                    if found.is_none() {
                        history.warnings.push(IntegrityWarning::BrokenLink {
                            entry_id: entry.id.clone(),
                            missing_id: prev.to_string(),
                        });
                    }
                    found
                }
            };
        }

        for warning in &history.warnings {
            tracing::warn!(logical_id, %warning, "Version chain integrity problem");
        }
        history
    }

    /// Every `previous_version_id` in the store that does not resolve, or
    /// that points at an entry with an equal or higher version.
    #[must_use]
    pub fn verify_integrity(&self) -> Vec<IntegrityWarning> {
        self.entries
            .iter()
            .filter_map(|e| {
                let prev = e.previous_version_id.as_deref()?;
                match self.get(prev) {
                    None => Some(IntegrityWarning::BrokenLink {
                        entry_id: e.id.clone(),
                        missing_id: prev.to_string(),
                    }),
                    Some(p) if p.version >= e.version => {
                        Some(IntegrityWarning::MisplacedVersion {
                            entry_id: e.id.clone(),
                            expected_previous: prev.to_string(),
                        })
                    }
                    Some(_) => None,
                }
            })
            .collect()
    }

    /// Entries newer than `window_hours` before now, newest first.
    #[must_use]
    pub fn get_recent_changes(&self, window_hours: u32) -> Vec<&TruthEntry> {
        self.recent_changes_since(Utc::now(), window_hours)
    }

    /// Entries with `timestamp > now - window_hours`, newest first.
    ///
    /// Entries whose timestamp cannot be parsed are left out.
    #[must_use]
    pub fn recent_changes_since(&self, now: DateTime<Utc>, window_hours: u32) -> Vec<&TruthEntry> {
        let cutoff = now - Duration::hours(i64::from(window_hours));
        let mut recent: Vec<(DateTime<Utc>, &TruthEntry)> = self
            .entries
            .iter()
            .filter_map(|e| e.parsed_timestamp().map(|t| (t, e)))
            .filter(|(t, _)| *t > cutoff)
            .collect();
        recent.sort_by(|a, b| b.0.cmp(&a.0));
        recent.into_iter().map(|(_, e)| e).collect()
    }

    /// Case-insensitive substring search over content, newest first.
    #[must_use]
    pub fn search(&self, query: &str, limit: usize) -> Vec<&TruthEntry> {
        let query = query.to_lowercase();
        let mut matches: Vec<(Option<DateTime<Utc>>, &TruthEntry)> = self
            .entries
            .iter()
            .filter(|e| e.content.to_lowercase().contains(&query))
            .map(|e| (e.parsed_timestamp(), e))
            .collect();
        matches.sort_by(|a, b| b.0.cmp(&a.0));
        matches.into_iter().take(limit).map(|(_, e)| e).collect()
    }

    /// All entries of one type, in insertion order.
    #[must_use]
    pub fn get_all_by_type(&self, entity_type: EntityType) -> Vec<&TruthEntry> {
        self.entries
            .iter()
            .filter(|e| e.entity_type == entity_type)
            .collect()
    }

    /// Rewrite the snapshot atomically (temp file + sync + rename).
    ///
    /// # Errors
    ///
    /// Returns `TruthError` if serialization or a file operation fails.
    pub fn save(&self) -> Result<(), TruthError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| TruthError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let snapshot: serde_json::Map<String, serde_json::Value> = self
            .entries
            .iter()
            .map(|e| Ok((e.id.clone(), serde_json::to_value(e)?)))
            .collect::<Result<_, serde_json::Error>>()?;
        let json = serde_json::to_string_pretty(&snapshot)?;

        let write_err = |e| TruthError::Write {
            path: path.clone(),
            source: e,
        };
        let temp_path = path.with_extension("json.tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_data().map_err(write_err)?;
        drop(file);
        std::fs::rename(&temp_path, path).map_err(write_err)?;

        tracing::debug!(path = %path.display(), count = self.entries.len(), "Saved truth snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hours_ago: i64) -> String {
        (Utc::now() - Duration::hours(hours_ago)).to_rfc3339()
    }

    fn decision(id: &str, content: &str, timestamp: &str) -> TruthEntry {
        TruthEntry::new(id, content, EntityType::Decision, timestamp, "e1")
    }

    #[test]
    fn test_first_add_is_version_one() {
        let mut store = TruthStore::in_memory();
        let stored = store.add_or_update(decision("d1", "ship", "")).unwrap();
        assert_eq!(stored.id, "d1");
        assert_eq!(stored.version, 1);
        assert!(stored.previous_version_id.is_none());
    }

    #[test]
    fn test_repeated_updates_chain_versions() {
        let mut store = TruthStore::in_memory();
        for i in 0..4 {
            store
                .add_or_update(decision("d1", &format!("rev {i}"), ""))
                .unwrap();
        }

        assert_eq!(store.len(), 4);
        let ids: Vec<_> = store.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["d1", "d1_v2", "d1_v3", "d1_v4"]);
        for pair in store.entries().windows(2) {
            assert_eq!(pair[1].version, pair[0].version + 1);
            assert_eq!(pair[1].previous_version_id.as_deref(), Some(pair[0].id.as_str()));
        }
        assert_eq!(store.current("d1").unwrap().content, "rev 3");
    }

    #[test]
    fn test_history_newest_first() {
        let mut store = TruthStore::in_memory();
        for i in 0..3 {
            store.add_or_update(decision("d1", &format!("rev {i}"), "")).unwrap();
        }
        let history = store.history("d1");
        let versions: Vec<_> = history.entries.iter().map(|e| e.version).collect();
        assert_eq!(versions, vec![3, 2, 1]);
        assert!(history.warnings.is_empty());
    }

    #[test]
    fn test_history_reports_broken_link() {
        let mut store = TruthStore::in_memory();
        let mut orphan = decision("d9", "orphan", "");
        orphan.previous_version_id = Some("gone".to_string());
        store.insert(orphan);

        let history = store.history("d9");
        assert_eq!(history.entries.len(), 1);
        assert_eq!(
            history.warnings,
            vec![IntegrityWarning::BrokenLink {
                entry_id: "d9".to_string(),
                missing_id: "gone".to_string(),
            }]
        );
        assert_eq!(store.verify_integrity().len(), 1);
    }

    #[test]
    fn test_history_reports_cycle() {
        let mut store = TruthStore::in_memory();
        let mut looped = decision("d5", "loop", "");
        looped.previous_version_id = Some("d5".to_string());
        store.insert(looped);

        let history = store.history("d5");
        assert_eq!(history.entries.len(), 1);
        assert!(matches!(history.warnings[0], IntegrityWarning::Cycle { .. }));
    }

    #[test]
    fn test_lookalike_id_does_not_hang_update() {
        let mut store = TruthStore::in_memory();
        store.add_or_update(decision("d1_v2", "separate entry", "")).unwrap();
        store.add_or_update(decision("d1", "first", "")).unwrap();

        // d1_v2 is a version 1 entry of its own, not a successor of d1
        assert_eq!(store.current("d1").unwrap().id, "d1");
        let result = store.add_or_update(decision("d1", "second", ""));

        assert!(matches!(result, Err(TruthError::VersionTaken { ref id }) if id == "d1_v2"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("d1_v2").unwrap().content, "separate entry");
    }

    #[test]
    fn test_extend_collision_rolls_back_staged_entries() {
        let mut store = TruthStore::in_memory();
        store.add_or_update(decision("d1_v2", "separate entry", "")).unwrap();
        store.add_or_update(decision("d1", "first", "")).unwrap();

        let result = store.extend(vec![decision("t1", "new", ""), decision("d1", "second", "")]);

        assert!(result.is_err());
        let ids: Vec<_> = store.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["d1_v2", "d1"]);
        assert!(store.get("t1").is_none());
        assert_eq!(store.get("d1_v2").unwrap().content, "separate entry");
    }

    #[test]
    fn test_corrupt_forward_link_reported_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truth.json");
        std::fs::write(
            &path,
            r#"{
                "d1": {"id": "d1", "content": "first", "entity_type": "decision", "version": 1},
                "d1_v2": {
                    "id": "d1_v2",
                    "content": "stray",
                    "entity_type": "decision",
                    "version": 1,
                    "previous_version_id": "d1"
                }
            }"#,
        )
        .unwrap();
        let store = TruthStore::open(&path);

        assert_eq!(store.current("d1").unwrap().id, "d1");
        let history = store.history("d1");
        assert_eq!(history.entries.len(), 1);
        assert_eq!(
            history.warnings,
            vec![IntegrityWarning::MisplacedVersion {
                entry_id: "d1_v2".to_string(),
                expected_previous: "d1".to_string(),
            }]
        );
        assert_eq!(store.verify_integrity(), history.warnings);
    }

    #[test]
    fn test_forward_link_not_pointing_back_stops_walk() {
        let mut store = TruthStore::in_memory();
        store.add_or_update(decision("d1", "first", "")).unwrap();
        store.add_or_update(decision("d1", "second", "")).unwrap();
        let mut stray = decision("d1_v3", "stray", "");
        stray.version = 3;
        stray.previous_version_id = Some("other".to_string());
        store.insert(stray);

        assert_eq!(store.current("d1").unwrap().id, "d1_v2");
        let history = store.history("d1");
        let ids: Vec<_> = history.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["d1_v2", "d1"]);
        assert!(matches!(
            history.warnings[0],
            IntegrityWarning::MisplacedVersion { ref entry_id, .. } if entry_id == "d1_v3"
        ));
    }

    #[test]
    fn test_history_unknown_id_is_empty() {
        let store = TruthStore::in_memory();
        let history = store.history("nope");
        assert!(history.entries.is_empty());
        assert!(history.warnings.is_empty());
    }

    #[test]
    fn test_recent_changes_window_and_order() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut store = TruthStore::in_memory();
        store.insert(decision("old", "old", "2024-05-30T12:00:00Z"));
        store.insert(decision("a", "a", "2024-06-01T09:00:00Z"));
        store.insert(decision("bad", "bad", "not a date"));
        store.insert(decision("b", "b", "2024-06-01T11:00:00Z"));
        store.insert(decision("edge", "edge", "2024-05-31T12:00:00Z"));

        let recent = store.recent_changes_since(now, 24);
        let ids: Vec<_> = recent.iter().map(|e| e.id.as_str()).collect();
        // strictly newer than the cutoff: the entry exactly 24h old is excluded
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_get_recent_changes_uses_now() {
        let mut store = TruthStore::in_memory();
        store.add_or_update(decision("a", "a", &at(1))).unwrap();
        store.add_or_update(decision("b", "b", &at(30))).unwrap();
        assert_eq!(store.get_recent_changes(24).len(), 1);
        assert_eq!(store.get_recent_changes(48).len(), 2);
    }

    #[test]
    fn test_search_case_insensitive_newest_first_limited() {
        let mut store = TruthStore::in_memory();
        store.insert(decision("1", "Launch plan v1", "2024-01-01T00:00:00Z"));
        store.insert(decision("2", "launch PLAN v2", "2024-02-01T00:00:00Z"));
        store.insert(decision("3", "Hiring", "2024-03-01T00:00:00Z"));
        store.insert(decision("4", "LAUNCH plan v3", "garbage"));

        let results = store.search("launch plan", 10);
        let ids: Vec<_> = results.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "4"]);

        assert_eq!(store.search("launch", 1).len(), 1);
        assert_eq!(store.search("launch", 1)[0].id, "2");
    }

    #[test]
    fn test_get_all_by_type_insertion_order() {
        let mut store = TruthStore::in_memory();
        store.insert(decision("d2", "x", ""));
        store.insert(TruthEntry::new("t1", "y", EntityType::Topic, "", ""));
        store.insert(decision("d1", "z", ""));
        let ids: Vec<_> = store
            .get_all_by_type(EntityType::Decision)
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["d2", "d1"]);
    }

    #[test]
    fn test_persist_and_reload_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("truth.json");

        let mut store = TruthStore::open(&path);
        store.add_or_update(decision("z", "last letter", "")).unwrap();
        store.add_or_update(decision("a", "first letter", "")).unwrap();
        store.add_or_update(decision("z", "update", "")).unwrap();
        assert!(path.exists());

        let reloaded = TruthStore::open(&path);
        let ids: Vec<_> = reloaded.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "z_v2"]);
        assert_eq!(reloaded.get("z_v2"), store.get("z_v2"));
    }

    #[test]
    fn test_open_corrupt_snapshot_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truth.json");
        std::fs::write(&path, "[[[").unwrap();
        assert!(TruthStore::open(&path).is_empty());
    }

    #[test]
    fn test_open_skips_bad_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truth.json");
        std::fs::write(
            &path,
            r#"{
                "good": {"content": "ok", "entity_type": "fact"},
                "bad": {"content": "?", "entity_type": "rumor"}
            }"#,
        )
        .unwrap();
        let store = TruthStore::open(&path);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("good").unwrap().content, "ok");
    }

    #[test]
    fn test_extend_writes_once_and_versions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("truth.json");
        let mut store = TruthStore::open(&path);

        let stored = store
            .extend(vec![decision("d", "one", ""), decision("d", "two", "")])
            .unwrap();

        assert_eq!(stored[1].id, "d_v2");
        assert_eq!(TruthStore::open(&path).len(), 2);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        // parent is a regular file, so the directory cannot be created
        let mut store = TruthStore::open(blocker.join("truth.json"));

        let result = store.add_or_update(decision("d", "x", ""));

        assert!(matches!(result, Err(TruthError::CreateDir { .. })));
        assert!(store.is_empty());
    }
}
