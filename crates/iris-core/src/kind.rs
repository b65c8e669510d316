//! Kind keys for every notation.
//!
//! Keys are unique across notations, so the bare key string stored in a
//! node's `type` field is enough to recover both the kind and its notation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Declares a closed set of kind keys with `key()`, `from_key()` and `ALL`.
macro_rules! kind_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $key:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(#[serde(rename = $key)] $variant,)+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn key(self) -> &'static str {
                match self {
                    $($name::$variant => $key,)+
                }
            }

            pub fn from_key(key: &str) -> Option<Self> {
                match key {
                    $($key => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.key())
            }
        }
    };
}

pub(crate) use kind_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Notation {
    Simple,
    Uml,
    Archimate,
    Sequence,
}

impl Notation {
    pub const ALL: [Notation; 4] = [
        Notation::Simple,
        Notation::Uml,
        Notation::Archimate,
        Notation::Sequence,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Notation::Simple => "simple",
            Notation::Uml => "uml",
            Notation::Archimate => "archimate",
            Notation::Sequence => "sequence",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Notation::Simple => "Simple View",
            Notation::Uml => "UML",
            Notation::Archimate => "ArchiMate",
            Notation::Sequence => "Sequence",
        }
    }
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Notation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Notation::ALL
            .into_iter()
            .find(|n| n.key() == s)
            .ok_or_else(|| CoreError::unknown("notation", s))
    }
}

kind_enum! {
    /// Simple View entity kinds.
    SimpleEntityKind {
        Component => "component",
        Service => "service",
        Interface => "interface",
        Package => "package",
        Actor => "actor",
        Database => "database",
        Queue => "queue",
    }
}

kind_enum! {
    /// Simple View relationship kinds.
    SimpleRelationshipKind {
        Uses => "uses",
        DependsOn => "depends_on",
        Composes => "composes",
        Implements => "implements",
        Contains => "contains",
    }
}

kind_enum! {
    /// Full View UML entity kinds.
    UmlEntityKind {
        Class => "class",
        Object => "object",
        UseCase => "use_case",
        State => "state",
        Activity => "activity",
        Node => "node",
    }
}

kind_enum! {
    /// Full View UML relationship kinds.
    UmlRelationshipKind {
        Association => "association",
        Aggregation => "aggregation",
        Composition => "composition",
        Dependency => "dependency",
        Realization => "realization",
        Generalization => "generalization",
    }
}

kind_enum! {
    ArchimateEntityKind {
        BusinessActor => "business_actor",
        BusinessRole => "business_role",
        BusinessProcess => "business_process",
        BusinessService => "business_service",
        BusinessObject => "business_object",
        ApplicationComponent => "application_component",
        ApplicationService => "application_service",
        ApplicationInterface => "application_interface",
        TechnologyNode => "technology_node",
        TechnologyService => "technology_service",
        TechnologyInterface => "technology_interface",
    }
}

kind_enum! {
    /// ArchiMate relationship kinds. Realization, composition and aggregation
    /// carry an `archimate_` prefix to stay distinct from their UML namesakes.
    ArchimateRelationshipKind {
        Serving => "serving",
        Flow => "flow",
        Triggering => "triggering",
        Access => "access",
        Influence => "influence",
        Realization => "archimate_realization",
        Composition => "archimate_composition",
        Aggregation => "archimate_aggregation",
    }
}

/// Any entity kind a canvas node can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityKind {
    Simple(SimpleEntityKind),
    Uml(UmlEntityKind),
    Archimate(ArchimateEntityKind),
}

impl EntityKind {
    pub fn key(self) -> &'static str {
        match self {
            EntityKind::Simple(k) => k.key(),
            EntityKind::Uml(k) => k.key(),
            EntityKind::Archimate(k) => k.key(),
        }
    }

    pub fn notation(self) -> Notation {
        match self {
            EntityKind::Simple(_) => Notation::Simple,
            EntityKind::Uml(_) => Notation::Uml,
            EntityKind::Archimate(_) => Notation::Archimate,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        SimpleEntityKind::from_key(key)
            .map(EntityKind::Simple)
            .or_else(|| UmlEntityKind::from_key(key).map(EntityKind::Uml))
            .or_else(|| ArchimateEntityKind::from_key(key).map(EntityKind::Archimate))
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::from_key(s).ok_or_else(|| CoreError::unknown("entity kind", s))
    }
}

impl From<SimpleEntityKind> for EntityKind {
    fn from(kind: SimpleEntityKind) -> Self {
        EntityKind::Simple(kind)
    }
}

impl From<UmlEntityKind> for EntityKind {
    fn from(kind: UmlEntityKind) -> Self {
        EntityKind::Uml(kind)
    }
}

impl From<ArchimateEntityKind> for EntityKind {
    fn from(kind: ArchimateEntityKind) -> Self {
        EntityKind::Archimate(kind)
    }
}

/// Any relationship kind a canvas edge can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipKind {
    Simple(SimpleRelationshipKind),
    Uml(UmlRelationshipKind),
    Archimate(ArchimateRelationshipKind),
}

impl RelationshipKind {
    pub fn key(self) -> &'static str {
        match self {
            RelationshipKind::Simple(k) => k.key(),
            RelationshipKind::Uml(k) => k.key(),
            RelationshipKind::Archimate(k) => k.key(),
        }
    }

    pub fn notation(self) -> Notation {
        match self {
            RelationshipKind::Simple(_) => Notation::Simple,
            RelationshipKind::Uml(_) => Notation::Uml,
            RelationshipKind::Archimate(_) => Notation::Archimate,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        SimpleRelationshipKind::from_key(key)
            .map(RelationshipKind::Simple)
            .or_else(|| UmlRelationshipKind::from_key(key).map(RelationshipKind::Uml))
            .or_else(|| ArchimateRelationshipKind::from_key(key).map(RelationshipKind::Archimate))
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RelationshipKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationshipKind::from_key(s).ok_or_else(|| CoreError::unknown("relationship kind", s))
    }
}

impl From<SimpleRelationshipKind> for RelationshipKind {
    fn from(kind: SimpleRelationshipKind) -> Self {
        RelationshipKind::Simple(kind)
    }
}

impl From<UmlRelationshipKind> for RelationshipKind {
    fn from(kind: UmlRelationshipKind) -> Self {
        RelationshipKind::Uml(kind)
    }
}

impl From<ArchimateRelationshipKind> for RelationshipKind {
    fn from(kind: ArchimateRelationshipKind) -> Self {
        RelationshipKind::Archimate(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn entity_keys_are_unique_across_notations() {
        let mut seen = HashSet::new();
        let keys = SimpleEntityKind::ALL
            .iter()
            .map(|k| k.key())
            .chain(UmlEntityKind::ALL.iter().map(|k| k.key()))
            .chain(ArchimateEntityKind::ALL.iter().map(|k| k.key()));
        for key in keys {
            assert!(seen.insert(key), "duplicate entity key {key}");
        }
        assert_eq!(seen.len(), 7 + 6 + 11);
    }

    #[test]
    fn relationship_keys_are_unique_across_notations() {
        let mut seen = HashSet::new();
        let keys = SimpleRelationshipKind::ALL
            .iter()
            .map(|k| k.key())
            .chain(UmlRelationshipKind::ALL.iter().map(|k| k.key()))
            .chain(ArchimateRelationshipKind::ALL.iter().map(|k| k.key()));
        for key in keys {
            assert!(seen.insert(key), "duplicate relationship key {key}");
        }
        assert_eq!(seen.len(), 5 + 6 + 8);
    }

    #[test]
    fn key_identifies_notation() {
        let kind: EntityKind = "use_case".parse().unwrap();
        assert_eq!(kind, EntityKind::Uml(UmlEntityKind::UseCase));
        assert_eq!(kind.notation(), Notation::Uml);

        let rel: RelationshipKind = "archimate_composition".parse().unwrap();
        assert_eq!(rel.notation(), Notation::Archimate);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = "simpleEntity".parse::<EntityKind>().unwrap_err();
        assert!(err.to_string().contains("simpleEntity"));
        assert!(serde_json::from_str::<EntityKind>("\"simpleEntity\"").is_err());
    }

    #[test]
    fn serializes_as_bare_key() {
        let kind = EntityKind::from(ArchimateEntityKind::TechnologyNode);
        assert_eq!(serde_json::to_string(&kind).unwrap(), "\"technology_node\"");
        let back: EntityKind = serde_json::from_str("\"technology_node\"").unwrap();
        assert_eq!(back, kind);
    }

    #[test]
    fn notation_parses_from_key() {
        assert_eq!("archimate".parse::<Notation>().unwrap(), Notation::Archimate);
        assert!("bpmn".parse::<Notation>().is_err());
    }
}
