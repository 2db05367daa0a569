//! Annotation sets keyed by accession

use std::sync::Arc;

use serde::Serialize;

use crate::obo::{OboTermInclusion, Ontology};

use super::cv_params::CvParam;
use super::models::ReferenceableParamGroup;

/// The CV parameters attached to one section, plus the referenceable groups it pulls in
///
/// Adding a parameter whose accession is already present replaces it. Lookups fall
/// through to referenced groups, in reference order, when the section itself does
/// not carry the accession.
#[derive(Debug, Clone, Default)]
pub struct ParamGroup {
    params: Vec<CvParam>,
    refs: Vec<Arc<ReferenceableParamGroup>>,
}

impl ParamGroup {
    /// Empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `param`, returning the parameter it replaced
    pub fn add(&mut self, param: CvParam) -> Option<CvParam> {
        match self
            .params
            .iter_mut()
            .find(|p| p.accession() == param.accession())
        {
            Some(existing) => Some(std::mem::replace(existing, param)),
            None => {
                self.params.push(param);
                None
            }
        }
    }

    /// Remove the parameter for `accession` from this group (not from references)
    pub fn remove(&mut self, accession: &str) -> Option<CvParam> {
        let index = self.params.iter().position(|p| p.accession() == accession)?;
        Some(self.params.remove(index))
    }

    /// Parameter for `accession`, own parameters first, then referenced groups
    pub fn get(&self, accession: &str) -> Option<&CvParam> {
        self.params
            .iter()
            .find(|p| p.accession() == accession)
            .or_else(|| self.refs.iter().find_map(|r| r.params().get(accession)))
    }

    /// Whether `accession` is present directly or through a reference
    pub fn contains(&self, accession: &str) -> bool {
        self.get(accession).is_some()
    }

    /// Own parameters, in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &CvParam> {
        self.params.iter()
    }

    /// Own parameters followed by those of referenced groups
    pub fn all(&self) -> Vec<&CvParam> {
        let mut out: Vec<&CvParam> = self.params.iter().collect();
        for group in &self.refs {
            out.extend(group.params().all());
        }
        out
    }

    /// Pull in a referenceable group
    pub fn add_reference(&mut self, group: Arc<ReferenceableParamGroup>) {
        if !self.refs.iter().any(|r| r.id() == group.id()) {
            self.refs.push(group);
        }
    }

    /// Referenced groups
    pub fn references(&self) -> &[Arc<ReferenceableParamGroup>] {
        &self.refs
    }

    /// Number of own parameters
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the group carries no own parameters
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// First parameter (own or referenced) whose term is `ancestor` or descends from it
    pub fn find_descendant(&self, ontology: &Ontology, ancestor: &str) -> Option<&CvParam> {
        self.all().into_iter().find(|p| {
            p.accession() == ancestor || ontology.is_descendant_of(p.accession(), ancestor)
        })
    }

    /// Number of parameters (own or referenced) satisfying `rule`
    pub fn count_matching(&self, ontology: &Ontology, rule: &OboTermInclusion) -> usize {
        self.all()
            .into_iter()
            .filter(|p| rule.matches(ontology, p.accession()))
            .count()
    }
}

/// Serialized as `accession -> text value` pairs for reports
impl Serialize for ParamGroup {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let all = self.all();
        let mut map = serializer.serialize_map(Some(all.len()))?;
        for param in all {
            map.serialize_entry(param.accession(), &param.as_string())?;
        }
        map.end()
    }
}
