//! Term inclusion rules used when checking which CV parameters a section may carry

use serde::Serialize;

use super::Ontology;

/// One rule stating that a section may (or must) carry a parameter for `accession`
///
/// The three flags mirror how rule tables are written for each section type:
///
/// - `only_one`: at most one matching parameter is allowed in the section.
/// - `allow_children`: parameters whose term descends from `accession` (via is_a or
///   part_of) match as well as the accession itself.
/// - `repeatable`: carried for the rule-consuming validation layer; it is not
///   interpreted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OboTermInclusion {
    accession: String,
    only_one: bool,
    allow_children: bool,
    repeatable: bool,
}

impl OboTermInclusion {
    /// Create a rule
    pub fn new(accession: &str, only_one: bool, allow_children: bool, repeatable: bool) -> Self {
        Self {
            accession: accession.to_string(),
            only_one,
            allow_children,
            repeatable,
        }
    }

    /// Accession the rule is anchored on
    pub fn accession(&self) -> &str {
        &self.accession
    }

    /// At most one matching parameter allowed
    pub fn only_one(&self) -> bool {
        self.only_one
    }

    /// Descendant terms match
    pub fn allow_children(&self) -> bool {
        self.allow_children
    }

    /// Repeatable flag, passed through uninterpreted
    pub fn repeatable(&self) -> bool {
        self.repeatable
    }

    /// Whether a parameter carrying `accession` satisfies this rule
    pub fn matches(&self, ontology: &Ontology, accession: &str) -> bool {
        accession == self.accession
            || (self.allow_children && ontology.is_descendant_of(accession, &self.accession))
    }

    /// Whether `count` matching parameters respect the cardinality flag
    pub fn accepts_count(&self, count: usize) -> bool {
        !self.only_one || count <= 1
    }
}
