//! # OBO Ontology Graph
//!
//! imzML annotates every section with controlled-vocabulary terms. The terms live in
//! OBO files (the imaging MS ontology, which imports PSI-MS, which imports UO). This
//! module loads such a closure into an immutable graph and answers accession lookups.
//!
//! ## Grammar handled here
//!
//! - Blank lines are ignored.
//! - `[Term]` opens a term stanza; the next line must be `id: <accession>`.
//! - Lines inside a stanza are handed to [`OboTerm::parse_tag_line`].
//! - `[Typedef]` closes term processing (typedefs are not modelled).
//! - Outside stanzas only `import: <source>` is acted upon, loading a child graph.
//!
//! After the whole source is read, one resolution pass wires `is_a`, `part_of` and
//! unit references. Unresolved references are logged and otherwise ignored.
//!
//! ## Example
//!
//! ```rust
//! use imzml::obo::Ontology;
//!
//! let ontology = Ontology::shared()?;
//! let term = ontology.term("IMS:1000050").expect("position x is bundled");
//! assert_eq!(term.name(), "position x");
//! // defined in an imported ontology
//! assert!(ontology.term("MS:1000285").is_some());
//! # Ok::<(), imzml::obo::OboError>(())
//! ```

mod error;
mod inclusion;
mod resources;
mod term;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use once_cell::sync::OnceCell;

pub use error::OboError;
pub use inclusion::OboTermInclusion;
pub use resources::{
    source_file_name, BundledResolver, DirectoryResolver, MapResolver, OntologyResolver,
    DEFAULT_ONTOLOGY,
};
pub use term::{OboTerm, ValueType};

static SHARED: OnceCell<Arc<Ontology>> = OnceCell::new();

/// A loaded ontology source plus its transitively imported sources
///
/// Built once and never mutated afterwards, so a single instance can be shared
/// freely between threads and documents.
#[derive(Debug)]
pub struct Ontology {
    source: String,
    imports: Vec<Ontology>,
    terms: HashMap<String, Arc<OboTerm>>,
    children: HashMap<String, Vec<String>>,
}

impl Ontology {
    /// The process-wide default imaging ontology
    ///
    /// Loaded from the bundled sources on first use and reused afterwards.
    pub fn shared() -> Result<Arc<Ontology>, OboError> {
        SHARED
            .get_or_try_init(|| Ontology::load(DEFAULT_ONTOLOGY, &BundledResolver).map(Arc::new))
            .cloned()
    }

    /// Load `name` and everything it imports through `resolver`
    ///
    /// A source that cannot be found (including an import) is an error; malformed
    /// lines are skipped.
    pub fn load(name: &str, resolver: &dyn OntologyResolver) -> Result<Self, OboError> {
        let mut loading = Vec::new();
        let ontology = Self::load_nested(name, resolver, &mut loading)?;
        info!(
            "Loaded ontology {} ({} terms, {} including imports)",
            ontology.source,
            ontology.terms.len(),
            ontology.total_terms()
        );
        Ok(ontology)
    }

    /// Parse already-read OBO text, resolving its imports through `resolver`
    pub fn parse(
        name: &str,
        content: &str,
        resolver: &dyn OntologyResolver,
    ) -> Result<Self, OboError> {
        let mut loading = vec![source_file_name(name).to_string()];
        Self::parse_nested(name, content, resolver, &mut loading)
    }

    fn load_nested(
        name: &str,
        resolver: &dyn OntologyResolver,
        loading: &mut Vec<String>,
    ) -> Result<Self, OboError> {
        let content = resolver.read_source(name)?;
        loading.push(source_file_name(name).to_string());
        let result = Self::parse_nested(name, &content, resolver, loading);
        loading.pop();
        result
    }

    fn parse_nested(
        name: &str,
        content: &str,
        resolver: &dyn OntologyResolver,
        loading: &mut Vec<String>,
    ) -> Result<Self, OboError> {
        let mut imports = Vec::new();
        let mut terms: HashMap<String, OboTerm> = HashMap::new();

        let mut current: Option<OboTerm> = None;
        let mut processing_terms = false;
        let mut expecting_id = false;

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if trimmed == "[Term]" {
                if let Some(term) = current.take() {
                    terms.insert(term.id().to_string(), term);
                }
                processing_terms = true;
                expecting_id = true;
            } else if trimmed == "[Typedef]" {
                if let Some(term) = current.take() {
                    terms.insert(term.id().to_string(), term);
                }
                processing_terms = false;
                expecting_id = false;
            } else if expecting_id {
                expecting_id = false;
                match trimmed.split_once(':') {
                    Some((tag, id)) if tag.trim() == "id" && !id.trim().is_empty() => {
                        current = Some(OboTerm::new(id.trim()));
                    }
                    _ => warn!("{}: [Term] not followed by an id line: {}", name, trimmed),
                }
            } else if processing_terms {
                if let Some(term) = current.as_mut() {
                    term.parse_tag_line(trimmed);
                }
            } else if let Some((tag, value)) = trimmed.split_once(':') {
                if tag.trim() == "import" {
                    let value = value.trim();
                    let file_name = source_file_name(value);
                    if loading.iter().any(|l| l == file_name) {
                        warn!("{}: skipping circular import of {}", name, value);
                        continue;
                    }
                    debug!("{}: importing {}", name, value);
                    imports.push(Self::load_nested(value, resolver, loading)?);
                }
            }
        }

        if let Some(term) = current.take() {
            terms.insert(term.id().to_string(), term);
        }

        let children = Self::resolve_references(name, &mut terms, &imports);

        Ok(Self {
            source: name.to_string(),
            imports,
            terms: terms
                .into_iter()
                .map(|(id, term)| (id, Arc::new(term)))
                .collect(),
            children,
        })
    }

    /// Wire parent/child and unit edges once the full closure is known
    fn resolve_references(
        name: &str,
        terms: &mut HashMap<String, OboTerm>,
        imports: &[Ontology],
    ) -> HashMap<String, Vec<String>> {
        let resolves =
            |id: &str, terms: &HashMap<String, OboTerm>| -> bool {
                terms.contains_key(id) || imports.iter().any(|i| i.term(id).is_some())
            };

        let mut parent_edges = Vec::new();
        let mut unit_edges = Vec::new();
        for (id, term) in terms.iter() {
            for parent in term.is_a().iter().chain(term.part_of()) {
                parent_edges.push((id.clone(), parent.clone()));
            }
            for unit in term.unit_refs() {
                unit_edges.push((id.clone(), unit.clone()));
            }
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for (child, parent) in parent_edges {
            if !resolves(&parent, terms) {
                warn!("{}: unresolved reference {} from {}", name, parent, child);
                continue;
            }
            if let Some(term) = terms.get_mut(&child) {
                term.add_parent(&parent);
            }
            let siblings = children.entry(parent).or_default();
            if !siblings.contains(&child) {
                siblings.push(child);
            }
        }

        for (id, unit) in unit_edges {
            if !resolves(&unit, terms) {
                warn!("{}: unresolved unit {} on {}", name, unit, id);
                continue;
            }
            if let Some(term) = terms.get_mut(&id) {
                term.add_unit(&unit);
            }
        }

        children
    }

    /// Logical name this graph was loaded from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Directly imported graphs, in declaration order
    pub fn imports(&self) -> &[Ontology] {
        &self.imports
    }

    /// Number of terms defined in this source (imports excluded)
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether this source defines no terms of its own
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of terms across the whole import closure
    pub fn total_terms(&self) -> usize {
        self.terms.len() + self.imports.iter().map(Ontology::total_terms).sum::<usize>()
    }

    /// Look up a term: locally first, then each import in declaration order
    ///
    /// Absence is a normal answer for unknown accessions, never an error.
    pub fn term(&self, id: &str) -> Option<&Arc<OboTerm>> {
        self.terms
            .get(id)
            .or_else(|| self.imports.iter().find_map(|import| import.term(id)))
    }

    /// Direct children (via is_a or part_of) of `id`, gathered across the closure
    pub fn children_of(&self, id: &str) -> Vec<&Arc<OboTerm>> {
        let mut ids = Vec::new();
        self.collect_child_ids(id, &mut ids);
        ids.into_iter().filter_map(|child| self.term(child)).collect()
    }

    fn collect_child_ids<'a>(&'a self, id: &str, out: &mut Vec<&'a str>) {
        if let Some(children) = self.children.get(id) {
            for child in children {
                if !out.contains(&child.as_str()) {
                    out.push(child);
                }
            }
        }
        for import in &self.imports {
            import.collect_child_ids(id, out);
        }
    }

    /// Whether `id` is a transitive is_a/part_of descendant of `ancestor`
    ///
    /// A term is not its own descendant.
    pub fn is_descendant_of(&self, id: &str, ancestor: &str) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(id.to_string());

        while let Some(current) = queue.pop_front() {
            let Some(term) = self.term(&current) else {
                continue;
            };
            for parent in term.parents() {
                if parent == ancestor {
                    return true;
                }
                if seen.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }
        false
    }
}

impl fmt::Display for Ontology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}
