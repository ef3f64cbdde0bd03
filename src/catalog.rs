//! Merging scanned (and cached) entries into a collision-free catalog.

use crate::model::{AppEntry, render_name};
use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::PathBuf;

/// Display name -> entry mapping with the bookkeeping needed to shadow
/// entries by directory priority and number entries sharing a name.
#[derive(Debug, Default)]
pub struct Catalog {
    /// Roots in priority order, index 0 wins.
    priority: Vec<PathBuf>,
    by_name: BTreeMap<String, AppEntry>,
    /// id -> rendered name of the entry currently holding that id.
    by_id: HashMap<String, String>,
    /// Base name -> collision indices in use.
    taken: HashMap<String, BTreeSet<usize>>,
    /// Entries hidden by name but still reachable by id.
    excluded: HashMap<String, AppEntry>,
}

impl Catalog {
    pub fn new(priority: Vec<PathBuf>) -> Self {
        Self {
            priority,
            ..Self::default()
        }
    }

    /// Builds the catalog for one run. Entries are processed in priority
    /// order (then id, then file path) so the result does not depend on the
    /// order the scan produced them in.
    pub fn merge(
        entries: Vec<AppEntry>,
        priority: &[PathBuf],
        cached: Vec<AppEntry>,
        excludes: &HashSet<String>,
    ) -> Self {
        let mut catalog = Self::new(priority.to_vec());

        let mut all: Vec<AppEntry> = entries.into_iter().chain(cached).collect();
        all.sort_by(|a, b| {
            catalog
                .rank(a)
                .cmp(&catalog.rank(b))
                .then_with(|| a.id.cmp(&b.id))
                .then_with(|| a.file.cmp(&b.file))
        });

        let total = all.len();
        for entry in all {
            catalog.insert(entry);
        }
        catalog.exclude(excludes);

        info!("Catalog: {} entries from {} candidates", catalog.len(), total);
        catalog
    }

    /// Adds `entry`, replacing an entry with the same id only when `entry`
    /// comes from a strictly higher-priority root. Returns whether it was kept.
    pub fn insert(&mut self, mut entry: AppEntry) -> bool {
        if let Some(rendered) = self.by_id.get(&entry.id) {
            let incumbent = &self.by_name[rendered];
            if self.rank(&entry) >= self.rank(incumbent) {
                debug!("{:?} shadowed by {:?}", entry.file, incumbent.file);
                return false;
            }
            debug!("{:?} shadows {:?}", entry.file, incumbent.file);
            let rendered = rendered.clone();
            self.release(&rendered);
        }

        let index = self.free_index(&entry.name);
        entry.collision_index = index;
        let rendered = entry.display_name();

        self.taken.entry(entry.name.clone()).or_default().insert(index);
        self.by_id.insert(entry.id.clone(), rendered.clone());
        self.by_name.insert(rendered, entry);
        true
    }

    pub fn get(&self, name: &str) -> Option<&AppEntry> {
        self.by_name.get(name)
    }

    /// Looks up an entry by id, including entries whose name is excluded.
    pub fn get_by_id(&self, id: &str) -> Option<&AppEntry> {
        self.by_id
            .get(id)
            .and_then(|rendered| self.by_name.get(rendered))
            .or_else(|| self.excluded.get(id))
    }

    /// Rendered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, AppEntry> {
        self.by_name
    }

    fn rank(&self, entry: &AppEntry) -> usize {
        self.priority
            .iter()
            .position(|dir| dir == &entry.source_dir)
            .unwrap_or(usize::MAX)
    }

    fn release(&mut self, rendered: &str) {
        let Some(old) = self.by_name.remove(rendered) else {
            return;
        };
        self.by_id.remove(&old.id);
        if let Some(indices) = self.taken.get_mut(&old.name) {
            indices.remove(&old.collision_index);
            if indices.is_empty() {
                self.taken.remove(&old.name);
            }
        }
    }

    /// Lowest collision index for `name` that is neither in use nor rendered
    /// identically to some other entry's name (e.g. a literal "Editor (1)").
    fn free_index(&self, name: &str) -> usize {
        let taken = self.taken.get(name);
        let mut index = 0;
        loop {
            let in_use = taken.is_some_and(|indices| indices.contains(&index));
            if !in_use && !self.by_name.contains_key(&render_name(name, index)) {
                return index;
            }
            index += 1;
        }
    }

    fn exclude(&mut self, excludes: &HashSet<String>) {
        for name in excludes {
            if let Some(entry) = self.by_name.remove(name) {
                debug!("Excluding {:?}", name);
                self.by_id.remove(&entry.id);
                self.excluded.insert(entry.id.clone(), entry);
            }
        }
    }
}
