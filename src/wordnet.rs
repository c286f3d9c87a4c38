//! The model aggregate: entries, synsets and verb frames plus the resolver
//! maps built at load time.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::time::Instant;

use crate::error::{OewnError, Result};
use crate::models::{
    Entry, EntryKey, LexiconInfo, Sense, SenseRelation, Synset, SynsetRelation, VerbFrame,
};
use crate::relations::{SenseRelKind, SenseRelType};
use crate::resolve::ResolvedView;

/// Position of a sense in the model: owning entry and rank within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SenseIdx {
    pub entry: usize,
    pub sense: usize,
}

/// Aggregate root of a wordnet.
///
/// Persisted state is id-only: relations, members and senses refer to their
/// targets by id. The resolver maps and the resolved view are derived and are
/// never serialized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordnetModel {
    pub info: LexiconInfo,
    pub entries: Vec<Entry>,
    pub synsets: Vec<Synset>,
    pub verbframes: Vec<VerbFrame>,

    #[serde(skip)]
    pub(crate) synset_resolver: HashMap<String, usize>,
    #[serde(skip)]
    pub(crate) sense_resolver: HashMap<String, SenseIdx>,
    #[serde(skip)]
    pub(crate) member_resolver: HashMap<(String, String), usize>,
    #[serde(skip)]
    pub(crate) resolved: Option<ResolvedView>,
}

impl fmt::Display for WordnetModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Wordnet '{}'", self.info.id)
    }
}

impl WordnetModel {
    pub fn new(info: LexiconInfo) -> Self {
        WordnetModel {
            info,
            ..Default::default()
        }
    }

    /// Assembles a model from loaded collections and builds its resolvers.
    pub fn from_parts(
        info: LexiconInfo,
        entries: Vec<Entry>,
        synsets: Vec<Synset>,
        verbframes: Vec<VerbFrame>,
    ) -> Self {
        let mut wn = WordnetModel {
            info,
            entries,
            synsets,
            verbframes,
            ..Default::default()
        };
        wn.rebuild_resolvers();
        wn
    }

    /// Rebuilds the three resolver maps from scratch. Later duplicates win.
    pub fn rebuild_resolvers(&mut self) {
        let start = Instant::now();
        self.resolved = None;
        self.synset_resolver.clear();
        self.sense_resolver.clear();
        self.member_resolver.clear();

        for (i, synset) in self.synsets.iter().enumerate() {
            if self.synset_resolver.insert(synset.id.clone(), i).is_some() {
                warn!("Duplicate synset id {}", synset.id);
            }
        }
        for (e, entry) in self.entries.iter().enumerate() {
            for (s, sense) in entry.senses.iter().enumerate() {
                let idx = SenseIdx { entry: e, sense: s };
                if self.sense_resolver.insert(sense.id.clone(), idx).is_some() {
                    warn!("Duplicate sense id {}", sense.id);
                }
                self.member_resolver
                    .insert((entry.lemma.clone(), sense.synset.clone()), e);
            }
        }
        debug!(
            "Built resolvers for {} synsets, {} senses, {} members. Took {:.2?}",
            self.synset_resolver.len(),
            self.sense_resolver.len(),
            self.member_resolver.len(),
            start.elapsed()
        );
    }

    // --- lookups ---

    pub fn synset_index(&self, id: &str) -> Option<usize> {
        self.synset_resolver.get(id).copied()
    }

    pub fn synset(&self, id: &str) -> Option<&Synset> {
        self.synset_index(id).and_then(|i| self.synsets.get(i))
    }

    pub fn sense_index(&self, id: &str) -> Option<SenseIdx> {
        self.sense_resolver.get(id).copied()
    }

    pub fn sense_at(&self, idx: SenseIdx) -> Option<&Sense> {
        self.entries.get(idx.entry)?.senses.get(idx.sense)
    }

    pub fn sense(&self, id: &str) -> Option<&Sense> {
        self.sense_index(id).and_then(|idx| self.sense_at(idx))
    }

    /// Entry owning the sense.
    pub fn entry_of(&self, sense_id: &str) -> Option<&Entry> {
        self.sense_index(sense_id)
            .and_then(|idx| self.entries.get(idx.entry))
    }

    pub fn member_index(&self, lemma: &str, synset_id: &str) -> Option<usize> {
        self.member_resolver
            .get(&(lemma.to_string(), synset_id.to_string()))
            .copied()
    }

    /// Entry holding `lemma` as a member of the synset.
    pub fn member(&self, lemma: &str, synset_id: &str) -> Option<&Entry> {
        self.member_index(lemma, synset_id)
            .and_then(|i| self.entries.get(i))
    }

    pub fn entry_index(&self, key: &EntryKey) -> Option<usize> {
        self.entries.iter().position(|e| {
            e.lemma == key.lemma && e.pos == key.pos && e.discriminant == key.discriminant
        })
    }

    pub fn find_entry(&self, key: &EntryKey) -> Option<&Entry> {
        self.entry_index(key).and_then(|i| self.entries.get(i))
    }

    // --- derived views ---

    /// Entry key to entry map, built on demand.
    pub fn entry_resolver(&self) -> HashMap<EntryKey, &Entry> {
        self.entries.iter().map(|e| (e.key(), e)).collect()
    }

    /// Verb frame id to frame text, built on demand.
    pub fn verbframe_resolver(&self) -> HashMap<&str, &str> {
        self.verbframes
            .iter()
            .map(|f| (f.id.as_str(), f.frame.as_str()))
            .collect()
    }

    pub fn senses(&self) -> impl Iterator<Item = &Sense> {
        self.entries.iter().flat_map(|e| e.senses.iter())
    }

    pub fn sense_relations(&self) -> impl Iterator<Item = (&Sense, &SenseRelation)> {
        self.senses()
            .flat_map(|s| s.relations.iter().map(move |r| (s, r)))
    }

    pub fn synset_relations(&self) -> impl Iterator<Item = (&Synset, &SynsetRelation)> {
        self.synsets
            .iter()
            .flat_map(|ss| ss.relations.iter().map(move |r| (ss, r)))
    }

    pub fn info(&self) -> String {
        format!(
            "{} has {} entries, {} synsets and {} senses",
            self,
            self.entries.len(),
            self.synsets.len(),
            self.senses().count()
        )
    }

    pub fn info_relations(&self) -> String {
        format!(
            "{} has {} sense relations and {} synset relations",
            self,
            self.sense_relations().count(),
            self.synset_relations().count()
        )
    }

    // --- extension ---

    /// Adds every missing inverse edge, synsets first, then senses.
    ///
    /// Self-inverse types and types of the ignored sets are skipped. Nothing is
    /// changed if a target cannot be resolved. Returns the number of added edges.
    pub fn extend(&mut self) -> Result<usize> {
        let start = Instant::now();
        if self.resolved.take().is_some() {
            debug!("Dropped resolved view before extending");
        }
        let synset_additions = self.collect_synset_inverses()?;
        let sense_additions = self.collect_sense_inverses()?;
        let added = synset_additions.len() + sense_additions.len();

        for (target, relation) in synset_additions {
            self.synsets[target].relations.push(relation);
        }
        for (target, relation) in sense_additions {
            self.entries[target.entry].senses[target.sense]
                .relations
                .push(relation);
        }
        info!("Extended relations with {} inverse edges. Took {:.2?}", added, start.elapsed());
        Ok(added)
    }

    fn collect_synset_inverses(&self) -> Result<Vec<(usize, SynsetRelation)>> {
        let mut additions = Vec::new();
        let mut pending = HashSet::new();
        for synset in &self.synsets {
            for relation in &synset.relations {
                let t = relation.rel_type;
                let Some(inverse) = t.inverse() else {
                    continue;
                };
                if inverse == t || t.is_symmetry_ignored() {
                    continue;
                }
                let target_index = self
                    .synset_index(&relation.target)
                    .filter(|&i| i < self.synsets.len())
                    .ok_or_else(|| {
                        OewnError::reference("synset relation target", &synset.id, &relation.target)
                    })?;
                let present = self.synsets[target_index]
                    .relations
                    .iter()
                    .any(|r| r.target == synset.id && r.rel_type == inverse);
                if !present && pending.insert((target_index, synset.id.as_str(), inverse)) {
                    additions.push((target_index, SynsetRelation::new(&synset.id, inverse)));
                }
            }
        }
        Ok(additions)
    }

    fn collect_sense_inverses(&self) -> Result<Vec<(SenseIdx, SenseRelation)>> {
        let mut additions = Vec::new();
        let mut pending = HashSet::new();
        for sense in self.senses() {
            for relation in &sense.relations {
                // "other" relations have no inverse vocabulary
                let SenseRelKind::Standard(t) = relation.kind else {
                    continue;
                };
                let Some(inverse) = t.inverse() else {
                    continue;
                };
                if inverse == t || t.is_symmetry_ignored() {
                    continue;
                }
                let (target_index, target) = self
                    .sense_index(&relation.target)
                    .and_then(|idx| self.sense_at(idx).map(|s| (idx, s)))
                    .ok_or_else(|| {
                        OewnError::reference("sense relation target", &sense.id, &relation.target)
                    })?;
                let kind = SenseRelKind::Standard(inverse);
                let present = target
                    .relations
                    .iter()
                    .any(|r| r.target == sense.id && r.kind == kind);
                if !present && pending.insert((target_index, sense.id.as_str(), kind)) {
                    additions.push((target_index, SenseRelation::new(&sense.id, kind)));
                }
            }
        }
        Ok(additions)
    }

    // --- collocations ---

    /// Adds a collocation edge from each key to each of its partners, and back
    /// when `two_ways` is set. Touched senses end up deduplicated and sorted by
    /// (type, target). Returns the number of added edges and of unresolvable keys.
    pub fn inject_collocations(
        &mut self,
        collocations: &BTreeMap<String, Vec<String>>,
        two_ways: bool,
    ) -> (usize, usize) {
        let start = Instant::now();
        self.resolved = None;
        let mut count = 0;
        let mut fails = 0;
        let mut touched = HashSet::new();
        let kind = SenseRelKind::Standard(SenseRelType::Collocation);

        for (sk1, partners) in collocations {
            let Some(idx1) = self.sense_index(sk1) else {
                warn!("{} source not resolvable in collocation for {}", sk1, sk1);
                fails += 1;
                continue;
            };
            for sk2 in partners {
                let Some(idx2) = self.sense_index(sk2) else {
                    warn!("{} target not resolvable in collocation {}-{}", sk2, sk1, sk2);
                    fails += 1;
                    continue;
                };
                self.entries[idx1.entry].senses[idx1.sense]
                    .relations
                    .push(SenseRelation::new(sk2, kind));
                touched.insert(idx1);
                count += 1;
                if two_ways {
                    self.entries[idx2.entry].senses[idx2.sense]
                        .relations
                        .push(SenseRelation::new(sk1, kind));
                    touched.insert(idx2);
                    count += 1;
                }
            }
        }

        for idx in touched {
            let relations = &mut self.entries[idx.entry].senses[idx.sense].relations;
            relations.sort_by(|a, b| {
                (a.kind.as_str(), a.target.as_str()).cmp(&(b.kind.as_str(), b.target.as_str()))
            });
            relations.dedup();
        }
        info!(
            "Injected {} collocations, {} fails. Took {:.2?}",
            count,
            fails,
            start.elapsed()
        );
        (count, fails)
    }

    /// Every collocation edge, grouped by source sense id.
    pub fn collocations(&self) -> BTreeMap<String, Vec<String>> {
        let kind = SenseRelKind::Standard(SenseRelType::Collocation);
        let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (sense, relation) in self.sense_relations() {
            if relation.kind == kind {
                result
                    .entry(sense.id.clone())
                    .or_default()
                    .push(relation.target.clone());
            }
        }
        result
    }
}
