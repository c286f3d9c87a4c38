//! Shared fixtures: a small lexicon around "force".

use crate::models::{
    AdjPosition, Entry, Example, LexiconInfo, PartOfSpeech, Pronunciation, Sense,
    SenseRelation, Synset, SynsetRelation, VerbFrame,
};
use crate::relations::{SenseRelType, SynsetRelType};
use crate::wordnet::WordnetModel;

/// A synset with members and no definition.
pub fn synset_with(id: &str, pos: PartOfSpeech, lex_name: &str, members: &[&str]) -> Synset {
    Synset::new(
        id,
        pos,
        members.iter().map(|m| m.to_string()).collect(),
        lex_name,
    )
}

fn synset(
    id: &str,
    pos: PartOfSpeech,
    lex_name: &str,
    members: &[&str],
    definition: &str,
    relations: &[(&str, SynsetRelType)],
) -> Synset {
    let mut ss = synset_with(id, pos, lex_name, members);
    ss.definitions.push(definition.to_string());
    ss.relations = relations
        .iter()
        .map(|(target, t)| SynsetRelation::new(target, *t))
        .collect();
    ss
}

fn entry(lemma: &str, pos: PartOfSpeech, senses: Vec<Sense>) -> Entry {
    let mut e = Entry::new(lemma, pos, None);
    e.senses = senses;
    e
}

fn sense(id: &str, synset: &str, relations: &[(&str, SenseRelType)]) -> Sense {
    let mut s = Sense::new(id, synset);
    s.relations = relations
        .iter()
        .map(|(target, t)| SenseRelation::new(target, *t))
        .collect();
    s
}

/// Closed under every validation rule once extended.
///
/// Synsets, in order: entity (root), three noun senses of force, the
/// strong/forceful adjective cluster, the verb force and weak.
pub fn force_model() -> WordnetModel {
    use PartOfSpeech::*;

    let mut entity = synset(
        "00001740-n",
        N,
        "noun.Tops",
        &["entity"],
        "that which is perceived or known or inferred to have its own distinct existence",
        &[],
    );
    entity.ili = "i35545".to_string();
    entity.ili_definition =
        Some("that which is perceived or known or inferred to have its own distinct existence".to_string());

    let mut phenomenon = synset(
        "00000100-n",
        N,
        "noun.phenomenon",
        &["force"],
        "a physical influence that produces change",
        &[("00001740-n", SynsetRelType::Hypernym)],
    );
    phenomenon.examples.push(Example {
        text: "the force of gravity".to_string(),
        source: Some("Physics".to_string()),
    });
    phenomenon.wikidata = Some("Q11402".to_string());

    let group = synset(
        "00000200-n",
        N,
        "noun.group",
        &["force"],
        "a unit that is part of some military service",
        &[("00001740-n", SynsetRelType::Hypernym)],
    );

    let mut act = synset(
        "00000300-n",
        N,
        "noun.act",
        &["force", "violence"],
        "an act of aggression",
        &[
            ("00001740-n", SynsetRelType::Hypernym),
            ("00000200-n", SynsetRelType::DomainTopic),
        ],
    );
    act.examples.push(Example::plain("he recoiled from the violence of the attack"));
    act.usages.push("informal".to_string());
    act.source = Some("Princeton".to_string());

    let strong = synset(
        "00000400-a",
        A,
        "adj.all",
        &["strong"],
        "having strength or power greater than average",
        &[("00000500-s", SynsetRelType::Similar)],
    );
    let forceful = synset(
        "00000500-s",
        S,
        "adj.all",
        &["forceful"],
        "characterized by force or power",
        &[("00000400-a", SynsetRelType::Similar)],
    );
    let verb = synset(
        "00000600-v",
        V,
        "verb.contact",
        &["force"],
        "move with force",
        &[],
    );
    let weak = synset(
        "00000700-a",
        A,
        "adj.all",
        &["weak"],
        "wanting in physical strength",
        &[],
    );

    let mut force_n = entry(
        "force",
        N,
        vec![
            sense("force%1:19:00::", "00000100-n", &[]),
            sense("force%1:14:00::", "00000200-n", &[]),
            sense(
                "force%1:04:00::",
                "00000300-n",
                &[("force%2:35:00::", SenseRelType::Derivation)],
            ),
        ],
    );
    force_n.pronunciations.push(Pronunciation {
        value: "fɔːs".to_string(),
        variety: Some("GB".to_string()),
    });
    force_n.pronunciations.push(Pronunciation {
        value: "fɔɹs".to_string(),
        variety: None,
    });

    let mut force_v = entry(
        "force",
        V,
        vec![sense(
            "force%2:35:00::",
            "00000600-v",
            &[("force%1:04:00::", SenseRelType::Derivation)],
        )],
    );
    force_v.forms.push("forced".to_string());
    force_v.senses[0].verbframe_ids = Some(vec!["via".to_string()]);
    force_v.senses[0].examples.push("they forced the door".to_string());

    let mut strong_e = entry(
        "strong",
        A,
        vec![sense(
            "strong%3:00:00::",
            "00000400-a",
            &[("weak%3:00:00::", SenseRelType::Antonym)],
        )],
    );
    strong_e.senses[0].adjposition = Some(AdjPosition::Attributive);

    let entries = vec![
        entry("entity", N, vec![sense("entity%1:03:00::", "00001740-n", &[])]),
        force_n,
        entry("violence", N, vec![sense("violence%1:04:00::", "00000300-n", &[])]),
        strong_e,
        entry(
            "forceful",
            S,
            vec![sense("forceful%5:00:00:strong:00", "00000500-s", &[])],
        ),
        force_v,
        entry(
            "weak",
            A,
            vec![sense(
                "weak%3:00:00::",
                "00000700-a",
                &[("strong%3:00:00::", SenseRelType::Antonym)],
            )],
        ),
    ];

    let verbframes = vec![
        VerbFrame {
            id: "via".to_string(),
            frame: "Somebody ----s something".to_string(),
        },
        VerbFrame {
            id: "nonreferential".to_string(),
            frame: "It is ----ing".to_string(),
        },
    ];

    WordnetModel::from_parts(
        LexiconInfo::default(),
        entries,
        vec![entity, phenomenon, group, act, strong, forceful, verb, weak],
        verbframes,
    )
}
