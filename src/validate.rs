//! Semantic validation of a loaded model.
//!
//! The battery runs in a fixed order: entries, senses, synsets, symmetry,
//! transitivity, hypernym loops, domain loops. The model is never modified.

use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::time::Instant;

use crate::error::{OewnError, Result};
use crate::models::{Entry, PartOfSpeech, Sense, Synset};
use crate::progress::{ProgressCallback, StageProgress};
use crate::relations::{SenseRelKind, SenseRelType, SynsetRelType};
use crate::sensekey::{self, SenseKeyError};
use crate::wordnet::WordnetModel;

/// Designated top of the noun hierarchy (entity).
pub const DEFAULT_ROOT_SYNSET: &str = "00001740-n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rule {
    SenseIdFormat,
    SynsetIdFormat,
    SenseTargetPos,
    SynsetIdPos,
    DuplicateEntryKey,
    DuplicateEntrySense,
    DuplicateSenseId,
    MissingSenseId,
    SenseKeyMismatch,
    UnknownLexFile,
    SatelliteHead,
    MissingSynset,
    MissingTarget,
    Pertainym,
    DuplicateRelation,
    DuplicateVerbFrame,
    EmptyMembers,
    MissingMember,
    MissingDefinition,
    EmptyDefinition,
    CrossPosHypernym,
    SynsetAntonym,
    SimilarPos,
    SatelliteSimilar,
    HeadSimilar,
    NoHypernym,
    HypernymAndInstance,
    HypernymToInstance,
    Symmetry,
    Transitivity,
    HypernymLoop,
    DomainLoop,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One broken invariant, tagged with its rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: Rule,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.rule, self.message)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Stop at the first violation.
    #[default]
    FailFast,
    /// Report every violation.
    CollectAll,
}

#[derive(Debug, Clone)]
pub struct ValidationOptions {
    pub mode: ValidationMode,
    /// Also require the inverse of self-inverse relations (antonym, similar...).
    pub strict_symmetry: bool,
    /// The one noun synset allowed to have no hypernym.
    pub root_synset: String,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        ValidationOptions {
            mode: ValidationMode::FailFast,
            strict_symmetry: false,
            root_synset: DEFAULT_ROOT_SYNSET.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, rule: Rule) -> usize {
        self.violations.iter().filter(|v| v.rule == rule).count()
    }

    /// Turns a non-empty report into [`OewnError::Invalid`].
    pub fn into_result(self) -> Result<()> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(OewnError::Invalid(self.violations))
        }
    }
}

/// Runs every check against the model.
///
/// In fail-fast mode the first violation is returned as
/// [`OewnError::Validation`]; in collect-all mode every violation ends up in the
/// report and the call itself succeeds.
pub fn validate(wn: &WordnetModel, options: &ValidationOptions) -> Result<ValidationReport> {
    validate_with_progress(wn, options, None)
}

pub fn validate_with_progress(
    wn: &WordnetModel,
    options: &ValidationOptions,
    progress_callback: Option<&mut ProgressCallback>,
) -> Result<ValidationReport> {
    let start = Instant::now();
    let mut validator = Validator {
        wn,
        options,
        violations: Vec::new(),
    };

    let mut progress = StageProgress::new(progress_callback, "Validating", 7);
    progress.step("entries");
    validator.check_entries()?;
    progress.step("senses");
    validator.check_senses()?;
    progress.step("synsets");
    validator.check_synsets()?;
    progress.step("symmetry");
    validator.check_symmetry()?;
    progress.step("transitivity");
    validator.check_transitive()?;
    progress.step("hypernym loops");
    validator.check_no_loops()?;
    progress.step("domain loops");
    validator.check_no_domain_loops()?;
    progress.finish();

    info!(
        "Validated {} with {} violation(s). Took {:.2?}",
        wn,
        validator.violations.len(),
        start.elapsed()
    );
    Ok(ValidationReport {
        violations: validator.violations,
    })
}

struct Validator<'a> {
    wn: &'a WordnetModel,
    options: &'a ValidationOptions,
    violations: Vec<Violation>,
}

impl Validator<'_> {
    fn flag(&mut self, rule: Rule, message: String) -> Result<()> {
        let violation = Violation { rule, message };
        match self.options.mode {
            ValidationMode::FailFast => Err(OewnError::Validation(violation)),
            ValidationMode::CollectAll => {
                warn!("{}", violation);
                self.violations.push(violation);
                Ok(())
            }
        }
    }

    // E N T R I E S

    fn check_entries(&mut self) -> Result<()> {
        let wn = self.wn;
        let mut keys = HashSet::new();
        for entry in &wn.entries {
            let key = entry.key();
            if keys.contains(&key) {
                self.flag(Rule::DuplicateEntryKey, format!("Duplicate key: {}", key))?;
            }
            keys.insert(key);
        }
        for entry in &wn.entries {
            self.check_entry_sense_duplicates(entry)?;
        }
        Ok(())
    }

    fn check_entry_sense_duplicates(&mut self, entry: &Entry) -> Result<()> {
        for (i, sense) in entry.senses.iter().enumerate() {
            for sense2 in &entry.senses[i + 1..] {
                if sense2.synset == sense.synset {
                    self.flag(
                        Rule::DuplicateEntrySense,
                        format!(
                            "Duplicate senses {} + {} both referring to {}",
                            sense.id, sense2.id, sense.synset
                        ),
                    )?;
                }
            }
        }
        Ok(())
    }

    // S E N S E S

    fn check_senses(&mut self) -> Result<()> {
        let wn = self.wn;
        let mut seen = HashSet::new();
        for sense in wn.senses() {
            if !seen.insert(sense.id.as_str()) {
                self.flag(Rule::DuplicateSenseId, format!("Duplicate sense id {}", sense.id))?;
            }
        }
        for entry in &wn.entries {
            for (i, sense) in entry.senses.iter().enumerate() {
                self.check_sense(entry, i, sense)?;
                self.check_sense_relations(sense)?;
                self.check_sense_verbframes(sense)?;
            }
        }
        Ok(())
    }

    fn check_sense(&mut self, entry: &Entry, index: usize, sense: &Sense) -> Result<()> {
        let wn = self.wn;
        let mut derivable = true;
        if sense.id.is_empty() {
            self.flag(
                Rule::MissingSenseId,
                format!("Sense of {} does not have a sense id", entry.key()),
            )?;
        } else {
            match sensekey::parse_sense_key(&sense.id) {
                None => {
                    derivable = false;
                    self.flag(
                        Rule::SenseIdFormat,
                        format!("{} is not well-formed sense id", sense.id),
                    )?;
                }
                Some(parts) => {
                    let key_pos = sensekey::pos_from_ss_type(parts.ss_type);
                    let target_pos = sensekey::synset_id_pos(&sense.synset);
                    if key_pos.is_none() || key_pos != target_pos {
                        self.flag(
                            Rule::SenseTargetPos,
                            format!("{} target of {} is not well-formed", sense.synset, sense.id),
                        )?;
                    }
                }
            }
        }

        if wn.synset(&sense.synset).is_none() {
            return self.flag(
                Rule::MissingSynset,
                format!("Sense {} refers to nonexistent synset {}", sense.id, sense.synset),
            );
        }
        if !derivable {
            return Ok(());
        }
        match sensekey::make_sense_key(wn, entry, index) {
            Ok(key) if key == sense.id => Ok(()),
            Ok(key) => self.flag(
                Rule::SenseKeyMismatch,
                format!("Sense {} should have {} id", sense.id, key),
            ),
            Err(e @ SenseKeyError::UnknownLexFile { .. }) => {
                self.flag(Rule::UnknownLexFile, e.to_string())
            }
            Err(e @ SenseKeyError::UnresolvedHead(_)) => self.flag(Rule::SatelliteHead, e.to_string()),
            Err(e @ SenseKeyError::UnknownSynset { .. }) => {
                self.flag(Rule::MissingSynset, e.to_string())
            }
            Err(e @ SenseKeyError::Malformed(_)) => self.flag(Rule::SenseIdFormat, e.to_string()),
        }
    }

    fn check_sense_relations(&mut self, sense: &Sense) -> Result<()> {
        let wn = self.wn;
        let pos = wn.synset(&sense.synset).map(|ss| ss.pos);
        let pertainym = SenseRelKind::Standard(SenseRelType::Pertainym);

        for r in &sense.relations {
            if wn.sense(&r.target).is_none() {
                self.flag(
                    Rule::MissingTarget,
                    format!("{} refers to nonexistent sense {}", sense.id, r.target),
                )?;
            }
            if r.kind == pertainym {
                if let Some(pos) = pos {
                    if !pos.is_adjective() && pos != PartOfSpeech::R {
                        self.flag(
                            Rule::Pertainym,
                            format!(
                                "Pertainym {} of {} should be between adjectives",
                                r.target, sense.id
                            ),
                        )?;
                    }
                }
            }
        }

        let mut counter: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for r in &sense.relations {
            *counter.entry((r.target.as_str(), r.kind.as_str())).or_default() += 1;
        }
        for ((target, kind), count) in counter {
            if count > 1 {
                self.flag(
                    Rule::DuplicateRelation,
                    format!("Duplicate relation {} ={}=> {}", sense.id, kind, target),
                )?;
            }
        }
        Ok(())
    }

    fn check_sense_verbframes(&mut self, sense: &Sense) -> Result<()> {
        let Some(frames) = &sense.verbframe_ids else {
            return Ok(());
        };
        let mut counter: BTreeMap<&str, usize> = BTreeMap::new();
        for f in frames {
            *counter.entry(f.as_str()).or_default() += 1;
        }
        for (frame, count) in counter {
            if count > 1 {
                self.flag(
                    Rule::DuplicateVerbFrame,
                    format!("Duplicate verb frame {} in entry {}", frame, sense.id),
                )?;
            }
        }
        Ok(())
    }

    // S Y N S E T S

    fn check_synsets(&mut self) -> Result<()> {
        let wn = self.wn;
        for synset in &wn.synsets {
            self.check_synset(synset)?;
        }
        self.check_instances()
    }

    fn check_synset(&mut self, synset: &Synset) -> Result<()> {
        match sensekey::synset_id_pos(&synset.id) {
            None => self.flag(
                Rule::SynsetIdFormat,
                format!("{} is not well-formed synset id", synset.id),
            )?,
            Some(id_pos) if id_pos != synset.pos => self.flag(
                Rule::SynsetIdPos,
                format!(
                    "Synset ID {} clashes with part-of-speech {}",
                    synset.id,
                    synset.pos.as_char()
                ),
            )?,
            Some(_) => {}
        }

        self.check_members(synset)?;

        if synset.definitions.is_empty() {
            self.flag(
                Rule::MissingDefinition,
                format!("Synset without definition {}", synset.id),
            )?;
        }
        if synset.definitions.iter().any(|d| d.is_empty()) {
            self.flag(
                Rule::EmptyDefinition,
                format!("Synset with empty definition {}", synset.id),
            )?;
        }

        self.check_synset_relations(synset)
    }

    fn check_members(&mut self, synset: &Synset) -> Result<()> {
        if synset.members.is_empty() {
            self.flag(Rule::EmptyMembers, format!("Synset {} members empty", synset.id))?;
        }
        for m in &synset.members {
            if self.wn.member(m, &synset.id).is_none() {
                self.flag(
                    Rule::MissingMember,
                    format!("Synset {} refers to nonexistent member {}", synset.id, m),
                )?;
            }
        }
        Ok(())
    }

    fn check_synset_relations(&mut self, synset: &Synset) -> Result<()> {
        let wn = self.wn;
        let pos = synset.pos;

        for r in &synset.relations {
            let Some(target) = wn.synset(&r.target) else {
                self.flag(
                    Rule::MissingTarget,
                    format!("{} refers to nonexistent synset {}", synset.id, r.target),
                )?;
                continue;
            };
            match r.rel_type {
                SynsetRelType::Hypernym if !pos.equivalent(target.pos) => self.flag(
                    Rule::CrossPosHypernym,
                    format!("Cross-part-of-speech hypernym {} => {}", synset.id, r.target),
                )?,
                SynsetRelType::Antonym => self.flag(
                    Rule::SynsetAntonym,
                    format!("Antonymy should be at the sense level {} => {}", synset.id, r.target),
                )?,
                SynsetRelType::Similar => {
                    let verbs = pos == PartOfSpeech::V && target.pos == PartOfSpeech::V;
                    let adjectives = pos.is_adjective() && target.pos.is_adjective();
                    if !verbs && !adjectives {
                        self.flag(
                            Rule::SimilarPos,
                            format!(
                                "Similar relation not between verb/adjective {} => {}",
                                synset.id, r.target
                            ),
                        )?;
                    }
                }
                _ => {}
            }
        }

        let mut counter: BTreeMap<(&str, &str), usize> = BTreeMap::new();
        for r in &synset.relations {
            *counter
                .entry((r.target.as_str(), r.rel_type.as_str()))
                .or_default() += 1;
        }
        for ((target, rel_type), count) in counter {
            if count > 1 {
                self.flag(
                    Rule::DuplicateRelation,
                    format!("Duplicate synset relation {} ={}=> {}", synset.id, rel_type, target),
                )?;
            }
        }

        if pos == PartOfSpeech::S {
            match synset.targets(SynsetRelType::Similar).count() {
                0 => self.flag(
                    Rule::SatelliteSimilar,
                    format!("Satellite must have at least one similar relation {}", synset.id),
                )?,
                1 => {}
                _ => self.flag(
                    Rule::SatelliteSimilar,
                    format!("Satellite of more than one synset {}", synset.id),
                )?,
            }

            let mut heads: BTreeMap<&str, usize> = BTreeMap::new();
            for target in synset.targets(SynsetRelType::Similar) {
                if wn.synset(target).is_some_and(|head| head.pos == PartOfSpeech::A) {
                    *heads.entry(target).or_default() += 1;
                }
            }
            for (head, count) in heads {
                if count > 1 {
                    self.flag(
                        Rule::HeadSimilar,
                        format!(
                            "Head {} is the target of {} similar relations from {}",
                            head, count, synset.id
                        ),
                    )?;
                }
            }
        }

        if pos == PartOfSpeech::N
            && synset.id != self.options.root_synset
            && !synset.has_relation(SynsetRelType::Hypernym)
            && !synset.has_relation(SynsetRelType::InstanceHypernym)
        {
            self.flag(
                Rule::NoHypernym,
                format!("Noun synset {} has no hypernym", synset.id),
            )?;
        }
        Ok(())
    }

    fn check_instances(&mut self) -> Result<()> {
        let wn = self.wn;
        let mut instances = HashSet::new();
        for ss in &wn.synsets {
            if ss.has_relation(SynsetRelType::InstanceHypernym) {
                if ss.has_relation(SynsetRelType::Hypernym) {
                    self.flag(
                        Rule::HypernymAndInstance,
                        format!("Synset {} has both hypernym and instance hypernym", ss.id),
                    )?;
                }
                instances.insert(ss.id.as_str());
            }
        }
        for synset in &wn.synsets {
            for target in synset.targets(SynsetRelType::Hypernym) {
                if instances.contains(target) {
                    self.flag(
                        Rule::HypernymToInstance,
                        format!("Hypernym targets instance {} => {}", synset.id, target),
                    )?;
                }
            }
        }
        Ok(())
    }

    // S T R U C T U R E

    fn check_symmetry(&mut self) -> Result<()> {
        let wn = self.wn;
        let strict = self.options.strict_symmetry;

        for synset in &wn.synsets {
            for r in &synset.relations {
                let Some(inverse) = r.rel_type.inverse() else {
                    continue;
                };
                if r.rel_type.is_symmetry_ignored() || (inverse == r.rel_type && !strict) {
                    continue;
                }
                let Some(target) = wn.synset(&r.target) else {
                    continue;
                };
                if !target
                    .relations
                    .iter()
                    .any(|r2| r2.target == synset.id && r2.rel_type == inverse)
                {
                    self.flag(
                        Rule::Symmetry,
                        format!("No symmetric relation for {} ={}=> {}", synset.id, r.rel_type, target.id),
                    )?;
                }
            }
        }

        for sense in wn.senses() {
            for r in &sense.relations {
                let Some(inverse) = r.kind.inverse() else {
                    continue;
                };
                if r.kind.is_symmetry_ignored() || (inverse == r.kind && !strict) {
                    continue;
                }
                let Some(target) = wn.sense(&r.target) else {
                    continue;
                };
                if !target
                    .relations
                    .iter()
                    .any(|r2| r2.target == sense.id && r2.kind == inverse)
                {
                    self.flag(
                        Rule::Symmetry,
                        format!("No symmetric relation for {} ={}=> {}", sense.id, r.kind, target.id),
                    )?;
                }
            }
        }
        Ok(())
    }

    fn check_transitive(&mut self) -> Result<()> {
        let wn = self.wn;
        for synset in &wn.synsets {
            let direct: BTreeSet<&str> = synset.targets(SynsetRelType::Hypernym).collect();
            for &b in &direct {
                let Some(synset2) = wn.synset(b) else {
                    continue;
                };
                for c in synset2.targets(SynsetRelType::Hypernym) {
                    if direct.contains(c) {
                        self.flag(
                            Rule::Transitivity,
                            format!(
                                "Transitive error for {} => {} => {} with {} => {}",
                                synset.id, b, c, synset.id, c
                            ),
                        )?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_no_loops(&mut self) -> Result<()> {
        let closures = self.edge_sets(&[SynsetRelType::Hypernym]);
        self.close(closures, |id, via| (Rule::HypernymLoop, format!("Loop for {} <-> {}", id, via)))
    }

    fn check_no_domain_loops(&mut self) -> Result<()> {
        let closures = self.edge_sets(&[
            SynsetRelType::DomainTopic,
            SynsetRelType::DomainRegion,
            SynsetRelType::Exemplifies,
        ]);
        self.close(closures, |id, _| (Rule::DomainLoop, format!("Domain loop for {}", id)))
    }

    /// Direct targets of each synset over the given types, by synset index.
    fn edge_sets(&self, types: &[SynsetRelType]) -> Vec<BTreeSet<usize>> {
        let wn = self.wn;
        wn.synsets
            .iter()
            .map(|ss| {
                ss.relations
                    .iter()
                    .filter(|r| types.contains(&r.rel_type))
                    .filter_map(|r| wn.synset_index(&r.target))
                    .collect()
            })
            .collect()
    }

    /// Grows every reachable set until no set changes, flagging each synset
    /// found in its own closure once.
    fn close(
        &mut self,
        mut closures: Vec<BTreeSet<usize>>,
        describe: impl Fn(&str, &str) -> (Rule, String),
    ) -> Result<()> {
        let wn = self.wn;
        let mut reported = vec![false; closures.len()];
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..closures.len() {
                let size = closures[i].len();
                let reachable: Vec<usize> = closures[i].iter().copied().collect();
                for c in reachable {
                    if c != i {
                        let extra: Vec<usize> =
                            closures[c].difference(&closures[i]).copied().collect();
                        closures[i].extend(extra);
                    }
                    if !reported[i] && closures[i].contains(&i) {
                        reported[i] = true;
                        let (rule, message) = describe(&wn.synsets[i].id, &wn.synsets[c].id);
                        self.flag(rule, message)?;
                    }
                }
                if closures[i].len() != size {
                    changed = true;
                }
            }
        }
        Ok(())
    }
}
