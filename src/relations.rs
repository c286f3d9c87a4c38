//! Closed relation vocabularies for the sense and synset layers.
//!
//! Each vocabulary carries its inverse table and the set of types that are
//! excluded from symmetry enforcement. Both tables are exhaustive matches so
//! adding a variant without deciding its inverse does not compile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! relation_vocabulary {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        $vis enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every member of the vocabulary, in declaration order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Name used in the YAML keys and the XML `relType` attribute.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $text, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok($name::$variant), )+
                    _ => Err(format!("Unknown {} '{}'", stringify!($name), s)),
                }
            }
        }
    };
}

relation_vocabulary! {
    /// Relation types between senses.
    pub enum SenseRelType {
        Antonym => "antonym",
        Also => "also",
        Participle => "participle",
        Pertainym => "pertainym",
        Derivation => "derivation",
        DomainTopic => "domain_topic",
        HasDomainTopic => "has_domain_topic",
        DomainRegion => "domain_region",
        HasDomainRegion => "has_domain_region",
        Exemplifies => "exemplifies",
        IsExemplifiedBy => "is_exemplified_by",
        Similar => "similar",
        Other => "other",
        Collocation => "collocation",
    }
}

relation_vocabulary! {
    /// Sub-vocabulary carried by sense relations whose type is "other".
    pub enum OtherSenseRelType {
        Agent => "agent",
        Material => "material",
        Event => "event",
        Instrument => "instrument",
        Location => "location",
        ByMeansOf => "by_means_of",
        Undergoer => "undergoer",
        Property => "property",
        Result => "result",
        State => "state",
        Uses => "uses",
        Destination => "destination",
        BodyPart => "body_part",
        Vehicle => "vehicle",
    }
}

relation_vocabulary! {
    /// Relation types between synsets.
    pub enum SynsetRelType {
        Agent => "agent",
        Also => "also",
        Attribute => "attribute",
        BeInState => "be_in_state",
        Causes => "causes",
        ClassifiedBy => "classified_by",
        Classifies => "classifies",
        CoAgentInstrument => "co_agent_instrument",
        CoAgentPatient => "co_agent_patient",
        CoAgentResult => "co_agent_result",
        CoInstrumentAgent => "co_instrument_agent",
        CoInstrumentPatient => "co_instrument_patient",
        CoInstrumentResult => "co_instrument_result",
        CoPatientAgent => "co_patient_agent",
        CoPatientInstrument => "co_patient_instrument",
        CoResultAgent => "co_result_agent",
        CoResultInstrument => "co_result_instrument",
        CoRole => "co_role",
        Direction => "direction",
        DomainRegion => "domain_region",
        DomainTopic => "domain_topic",
        Exemplifies => "exemplifies",
        Entails => "entails",
        EqSynonym => "eq_synonym",
        HasDomainRegion => "has_domain_region",
        HasDomainTopic => "has_domain_topic",
        IsExemplifiedBy => "is_exemplified_by",
        HoloLocation => "holo_location",
        HoloMember => "holo_member",
        HoloPart => "holo_part",
        HoloPortion => "holo_portion",
        HoloSubstance => "holo_substance",
        Holonym => "holonym",
        Hypernym => "hypernym",
        Hyponym => "hyponym",
        InManner => "in_manner",
        InstanceHypernym => "instance_hypernym",
        InstanceHyponym => "instance_hyponym",
        Instrument => "instrument",
        Involved => "involved",
        InvolvedAgent => "involved_agent",
        InvolvedDirection => "involved_direction",
        InvolvedInstrument => "involved_instrument",
        InvolvedLocation => "involved_location",
        InvolvedPatient => "involved_patient",
        InvolvedResult => "involved_result",
        InvolvedSourceDirection => "involved_source_direction",
        InvolvedTargetDirection => "involved_target_direction",
        IsCausedBy => "is_caused_by",
        IsEntailedBy => "is_entailed_by",
        Location => "location",
        MannerOf => "manner_of",
        MeroLocation => "mero_location",
        MeroMember => "mero_member",
        MeroPart => "mero_part",
        MeroPortion => "mero_portion",
        MeroSubstance => "mero_substance",
        Meronym => "meronym",
        Similar => "similar",
        Other => "other",
        Patient => "patient",
        RestrictedBy => "restricted_by",
        Restricts => "restricts",
        Result => "result",
        Role => "role",
        SourceDirection => "source_direction",
        StateOf => "state_of",
        TargetDirection => "target_direction",
        Subevent => "subevent",
        IsSubeventOf => "is_subevent_of",
        Antonym => "antonym",
    }
}

impl SenseRelType {
    /// Statically known inverse, if the type has one.
    pub fn inverse(self) -> Option<SenseRelType> {
        use SenseRelType::*;
        match self {
            DomainRegion => Some(HasDomainRegion),
            HasDomainRegion => Some(DomainRegion),
            DomainTopic => Some(HasDomainTopic),
            HasDomainTopic => Some(DomainTopic),
            Exemplifies => Some(IsExemplifiedBy),
            IsExemplifiedBy => Some(Exemplifies),
            Antonym => Some(Antonym),
            Similar => Some(Similar),
            Also => Some(Also),
            Derivation => Some(Derivation),
            Participle | Pertainym | Other | Collocation => None,
        }
    }

    /// Types whose inverse is never materialized in the source data.
    pub fn is_symmetry_ignored(self) -> bool {
        use SenseRelType::*;
        matches!(self, HasDomainRegion | HasDomainTopic | IsExemplifiedBy)
    }
}

impl SynsetRelType {
    /// Statically known inverse, if the type has one.
    pub fn inverse(self) -> Option<SynsetRelType> {
        use SynsetRelType::*;
        match self {
            Hypernym => Some(Hyponym),
            Hyponym => Some(Hypernym),
            InstanceHypernym => Some(InstanceHyponym),
            InstanceHyponym => Some(InstanceHypernym),
            Meronym => Some(Holonym),
            Holonym => Some(Meronym),
            MeroLocation => Some(HoloLocation),
            HoloLocation => Some(MeroLocation),
            MeroMember => Some(HoloMember),
            HoloMember => Some(MeroMember),
            MeroPart => Some(HoloPart),
            HoloPart => Some(MeroPart),
            MeroPortion => Some(HoloPortion),
            HoloPortion => Some(MeroPortion),
            MeroSubstance => Some(HoloSubstance),
            HoloSubstance => Some(MeroSubstance),
            BeInState => Some(StateOf),
            StateOf => Some(BeInState),
            Causes => Some(IsCausedBy),
            IsCausedBy => Some(Causes),
            Subevent => Some(IsSubeventOf),
            IsSubeventOf => Some(Subevent),
            MannerOf => Some(InManner),
            InManner => Some(MannerOf),
            Restricts => Some(RestrictedBy),
            RestrictedBy => Some(Restricts),
            Classifies => Some(ClassifiedBy),
            ClassifiedBy => Some(Classifies),
            Entails => Some(IsEntailedBy),
            IsEntailedBy => Some(Entails),
            DomainRegion => Some(HasDomainRegion),
            HasDomainRegion => Some(DomainRegion),
            DomainTopic => Some(HasDomainTopic),
            HasDomainTopic => Some(DomainTopic),
            Exemplifies => Some(IsExemplifiedBy),
            IsExemplifiedBy => Some(Exemplifies),
            Role => Some(Involved),
            Involved => Some(Role),
            Agent => Some(InvolvedAgent),
            InvolvedAgent => Some(Agent),
            Patient => Some(InvolvedPatient),
            InvolvedPatient => Some(Patient),
            Result => Some(InvolvedResult),
            InvolvedResult => Some(Result),
            Instrument => Some(InvolvedInstrument),
            InvolvedInstrument => Some(Instrument),
            Location => Some(InvolvedLocation),
            InvolvedLocation => Some(Location),
            Direction => Some(InvolvedDirection),
            InvolvedDirection => Some(Direction),
            TargetDirection => Some(InvolvedTargetDirection),
            InvolvedTargetDirection => Some(TargetDirection),
            SourceDirection => Some(InvolvedSourceDirection),
            InvolvedSourceDirection => Some(SourceDirection),
            CoAgentPatient => Some(CoPatientAgent),
            CoPatientAgent => Some(CoAgentPatient),
            CoAgentInstrument => Some(CoInstrumentAgent),
            CoInstrumentAgent => Some(CoAgentInstrument),
            CoAgentResult => Some(CoResultAgent),
            CoResultAgent => Some(CoAgentResult),
            CoPatientInstrument => Some(CoInstrumentPatient),
            CoInstrumentPatient => Some(CoPatientInstrument),
            CoResultInstrument => Some(CoInstrumentResult),
            CoInstrumentResult => Some(CoResultInstrument),
            Antonym => Some(Antonym),
            EqSynonym => Some(EqSynonym),
            Similar => Some(Similar),
            Attribute => Some(Attribute),
            CoRole => Some(CoRole),
            // "also" is asymmetric at synset level
            Also | Other => None,
        }
    }

    /// Types whose inverse is never materialized in the source data.
    pub fn is_symmetry_ignored(self) -> bool {
        use SynsetRelType::*;
        matches!(
            self,
            Hyponym
                | InstanceHyponym
                | Holonym
                | HoloLocation
                | HoloMember
                | HoloPart
                | HoloPortion
                | HoloSubstance
                | StateOf
                | IsCausedBy
                | IsSubeventOf
                | InManner
                | RestrictedBy
                | ClassifiedBy
                | IsEntailedBy
                | HasDomainRegion
                | HasDomainTopic
                | IsExemplifiedBy
                | Involved
                | InvolvedAgent
                | InvolvedPatient
                | InvolvedResult
                | InvolvedInstrument
                | InvolvedLocation
                | InvolvedDirection
                | InvolvedTargetDirection
                | InvolvedSourceDirection
                | CoPatientAgent
                | CoInstrumentAgent
                | CoResultAgent
                | CoInstrumentPatient
                | CoInstrumentResult
        )
    }
}

/// Type of a sense relation: either the standard vocabulary or an "other" subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SenseRelKind {
    Standard(SenseRelType),
    Other(OtherSenseRelType),
}

impl SenseRelKind {
    /// Name of the relation as a YAML key.
    pub fn as_str(self) -> &'static str {
        match self {
            SenseRelKind::Standard(t) => t.as_str(),
            SenseRelKind::Other(t) => t.as_str(),
        }
    }

    /// Looks a YAML key up in the standard vocabulary first, then in the "other" one.
    pub fn from_name(name: &str) -> Option<SenseRelKind> {
        name.parse::<SenseRelType>()
            .map(SenseRelKind::Standard)
            .or_else(|_| name.parse::<OtherSenseRelType>().map(SenseRelKind::Other))
            .ok()
    }

    pub fn is_other(self) -> bool {
        matches!(self, SenseRelKind::Other(_))
    }

    /// Inverse within the same vocabulary. "Other" subtypes have none.
    pub fn inverse(self) -> Option<SenseRelKind> {
        match self {
            SenseRelKind::Standard(t) => t.inverse().map(SenseRelKind::Standard),
            SenseRelKind::Other(_) => None,
        }
    }

    pub fn is_symmetry_ignored(self) -> bool {
        match self {
            SenseRelKind::Standard(t) => t.is_symmetry_ignored(),
            SenseRelKind::Other(_) => false,
        }
    }
}

impl fmt::Display for SenseRelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SenseRelType> for SenseRelKind {
    fn from(t: SenseRelType) -> Self {
        SenseRelKind::Standard(t)
    }
}

impl From<OtherSenseRelType> for SenseRelKind {
    fn from(t: OtherSenseRelType) -> Self {
        SenseRelKind::Other(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synset_inverse_is_involution() {
        for &t in SynsetRelType::ALL {
            if let Some(inv) = t.inverse() {
                assert_eq!(inv.inverse(), Some(t), "inverse of {} is not involutive", t);
            }
        }
    }

    #[test]
    fn test_sense_inverse_is_involution() {
        for &t in SenseRelType::ALL {
            if let Some(inv) = t.inverse() {
                assert_eq!(inv.inverse(), Some(t), "inverse of {} is not involutive", t);
            }
        }
    }

    #[test]
    fn test_synset_ignored_set_has_one_side_per_pair() {
        let ignored: Vec<_> = SynsetRelType::ALL
            .iter()
            .filter(|t| t.is_symmetry_ignored())
            .collect();
        assert_eq!(ignored.len(), 32);
        for &t in SynsetRelType::ALL {
            match t.inverse() {
                Some(inv) if inv != t => assert_ne!(
                    t.is_symmetry_ignored(),
                    inv.is_symmetry_ignored(),
                    "exactly one of {} / {} should be ignored",
                    t,
                    inv
                ),
                Some(_) => assert!(!t.is_symmetry_ignored(), "{} is self-inverse", t),
                None => assert!(!t.is_symmetry_ignored(), "{} has no inverse", t),
            }
        }
    }

    #[test]
    fn test_sense_ignored_set() {
        let ignored: Vec<_> = SenseRelType::ALL
            .iter()
            .copied()
            .filter(|t| t.is_symmetry_ignored())
            .collect();
        assert_eq!(
            ignored,
            vec![
                SenseRelType::HasDomainTopic,
                SenseRelType::HasDomainRegion,
                SenseRelType::IsExemplifiedBy
            ]
        );
    }

    #[test]
    fn test_synset_also_has_no_inverse() {
        assert_eq!(SynsetRelType::Also.inverse(), None);
        assert_eq!(SenseRelType::Also.inverse(), Some(SenseRelType::Also));
    }

    #[test]
    fn test_names_round_trip() {
        assert_eq!(SynsetRelType::ALL.len(), 71);
        for &t in SynsetRelType::ALL {
            assert_eq!(t.as_str().parse::<SynsetRelType>(), Ok(t));
        }
        for &t in SenseRelType::ALL {
            assert_eq!(t.as_str().parse::<SenseRelType>(), Ok(t));
        }
        assert_eq!(
            "co_instrument_result".parse::<SynsetRelType>(),
            Ok(SynsetRelType::CoInstrumentResult)
        );
        assert!("hyponymy".parse::<SynsetRelType>().is_err());
    }

    #[test]
    fn test_sense_kind_lookup() {
        assert_eq!(
            SenseRelKind::from_name("antonym"),
            Some(SenseRelKind::Standard(SenseRelType::Antonym))
        );
        assert_eq!(
            SenseRelKind::from_name("body_part"),
            Some(SenseRelKind::Other(OtherSenseRelType::BodyPart))
        );
        assert_eq!(SenseRelKind::from_name("hypernym"), None);
        assert_eq!(SenseRelKind::Other(OtherSenseRelType::Agent).inverse(), None);
        assert!(SenseRelKind::Other(OtherSenseRelType::Agent).is_other());
    }
}
