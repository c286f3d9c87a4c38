//! Transient traversal view over a closed model.
//!
//! The view is an index arena parallel to the model's collections. It is built
//! by [`WordnetModel::resolve`], dropped by [`WordnetModel::stale`] and never
//! persisted.

use log::info;
use std::time::Instant;

use crate::error::{OewnError, Result};
use crate::models::{Entry, Sense, SenseRelation, Synset, SynsetRelation};
use crate::wordnet::{SenseIdx, WordnetModel};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedView {
    /// Per entry, per sense: index of the sense's synset.
    sense_synsets: Vec<Vec<usize>>,
    /// Per entry, per sense, per relation: the target sense.
    sense_targets: Vec<Vec<Vec<SenseIdx>>>,
    /// Per synset: the entry of each member, in member order.
    synset_members: Vec<Vec<usize>>,
    /// Per synset, per relation: the target synset.
    synset_targets: Vec<Vec<usize>>,
}

impl WordnetModel {
    /// Resolves every cross reference into the transient view.
    ///
    /// Fails if a resolver map is empty or any reference is dangling; the model
    /// is then left unresolved.
    pub fn resolve(&mut self) -> Result<()> {
        let start = Instant::now();
        self.resolved = None;
        if self.synset_resolver.is_empty() {
            return Err(OewnError::MissingResolver("synset"));
        }
        if self.sense_resolver.is_empty() {
            return Err(OewnError::MissingResolver("sense"));
        }
        if self.member_resolver.is_empty() {
            return Err(OewnError::MissingResolver("member"));
        }

        let mut view = ResolvedView::default();
        for entry in &self.entries {
            let mut synsets = Vec::with_capacity(entry.senses.len());
            let mut targets = Vec::with_capacity(entry.senses.len());
            for sense in &entry.senses {
                synsets.push(
                    self.synset_index(&sense.synset)
                        .ok_or_else(|| OewnError::reference("sense synset", &sense.id, &sense.synset))?,
                );
                targets.push(
                    sense
                        .relations
                        .iter()
                        .map(|r| {
                            self.sense_index(&r.target).ok_or_else(|| {
                                OewnError::reference("sense relation target", &sense.id, &r.target)
                            })
                        })
                        .collect::<Result<Vec<_>>>()?,
                );
            }
            view.sense_synsets.push(synsets);
            view.sense_targets.push(targets);
        }

        for synset in &self.synsets {
            view.synset_members.push(
                synset
                    .members
                    .iter()
                    .map(|m| {
                        self.member_index(m, &synset.id)
                            .ok_or_else(|| OewnError::reference("synset member", &synset.id, m))
                    })
                    .collect::<Result<Vec<_>>>()?,
            );
            view.synset_targets.push(
                synset
                    .relations
                    .iter()
                    .map(|r| {
                        self.synset_index(&r.target).ok_or_else(|| {
                            OewnError::reference("synset relation target", &synset.id, &r.target)
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            );
        }

        self.resolved = Some(view);
        info!("Resolved {}. Took {:.2?}", self, start.elapsed());
        Ok(())
    }

    /// Drops the resolved view. Persisted fields are untouched.
    pub fn stale(&mut self) {
        self.resolved = None;
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Traversal accessor, available once [`resolve`](Self::resolve) succeeded.
    pub fn resolved(&self) -> Option<Resolved<'_>> {
        self.resolved.as_ref().map(|view| Resolved { wn: self, view })
    }
}

/// Borrowed pairing of a model with its resolved view.
#[derive(Clone, Copy)]
pub struct Resolved<'a> {
    wn: &'a WordnetModel,
    view: &'a ResolvedView,
}

impl<'a> Resolved<'a> {
    pub fn model(&self) -> &'a WordnetModel {
        self.wn
    }

    pub fn synset_of(&self, idx: SenseIdx) -> Option<&'a Synset> {
        let i = *self.view.sense_synsets.get(idx.entry)?.get(idx.sense)?;
        self.wn.synsets.get(i)
    }

    pub fn sense_targets(&self, idx: SenseIdx) -> Vec<(&'a SenseRelation, &'a Sense)> {
        let wn = self.wn;
        let (Some(sense), Some(targets)) = (
            wn.sense_at(idx),
            self.view
                .sense_targets
                .get(idx.entry)
                .and_then(|e| e.get(idx.sense)),
        ) else {
            return Vec::new();
        };
        sense
            .relations
            .iter()
            .zip(targets)
            .filter_map(|(r, &t)| wn.sense_at(t).map(|s| (r, s)))
            .collect()
    }

    pub fn members(&self, synset_index: usize) -> Vec<&'a Entry> {
        self.view
            .synset_members
            .get(synset_index)
            .map(|ms| ms.iter().filter_map(|&e| self.wn.entries.get(e)).collect())
            .unwrap_or_default()
    }

    pub fn synset_targets(&self, synset_index: usize) -> Vec<(&'a SynsetRelation, &'a Synset)> {
        let wn = self.wn;
        let (Some(synset), Some(targets)) = (
            wn.synsets.get(synset_index),
            self.view.synset_targets.get(synset_index),
        ) else {
            return Vec::new();
        };
        synset
            .relations
            .iter()
            .zip(targets)
            .filter_map(|(r, &t)| wn.synsets.get(t).map(|ss| (r, ss)))
            .collect()
    }
}
