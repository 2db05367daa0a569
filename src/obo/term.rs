//! A single `[Term]` stanza of an OBO file

use serde::Serialize;

/// Declared value type of a term, taken from its `xref: value-type:xsd\:...` line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueType {
    /// Free text (xsd:string, xsd:anyURI, xsd:dateTime, ...)
    String,
    /// Integer (xsd:int, xsd:integer, xsd:nonNegativeInteger, ...); values beyond
    /// 32 bits are kept as longs
    Integer,
    /// 64-bit integer (xsd:long, xsd:unsignedLong)
    Long,
    /// Floating point (xsd:float, xsd:double, xsd:decimal)
    Double,
    /// xsd:boolean
    Boolean,
}

impl ValueType {
    /// Map an XML schema type name (with or without the `xsd:` prefix)
    pub fn from_xsd(name: &str) -> Self {
        let name = name.trim().trim_start_matches("xsd:");
        match name {
            "int" | "integer" | "short" | "nonNegativeInteger" | "positiveInteger"
            | "nonPositiveInteger" | "negativeInteger" | "unsignedInt" | "unsignedShort" => {
                ValueType::Integer
            }
            "long" | "unsignedLong" => ValueType::Long,
            "float" | "double" | "decimal" => ValueType::Double,
            "boolean" => ValueType::Boolean,
            _ => ValueType::String,
        }
    }
}

/// An ontology term
///
/// Raw `is_a`, `part_of` and unit references are kept as written in the source.
/// The owning [`Ontology`](super::Ontology) resolves them after the whole closure
/// (including imports) has been read; only references that resolved end up in
/// [`parents`](OboTerm::parents) and [`units`](OboTerm::units).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OboTerm {
    id: String,
    name: String,
    definition: Option<String>,
    namespace: Option<String>,
    is_obsolete: bool,
    value_type: Option<ValueType>,
    is_a: Vec<String>,
    part_of: Vec<String>,
    unit_refs: Vec<String>,
    parents: Vec<String>,
    units: Vec<String>,
}

impl OboTerm {
    /// Create a term with only its identifier set
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: String::new(),
            definition: None,
            namespace: None,
            is_obsolete: false,
            value_type: None,
            is_a: Vec::new(),
            part_of: Vec::new(),
            unit_refs: Vec::new(),
            parents: Vec::new(),
            units: Vec::new(),
        }
    }

    /// Accession, e.g. `IMS:1000050`
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human-readable name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Definition text without the trailing reference list
    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// Namespace, if the stanza declared one
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Whether the term has been marked obsolete
    pub fn is_obsolete(&self) -> bool {
        self.is_obsolete
    }

    /// Declared value type, `None` when the term carries no value
    pub fn value_type(&self) -> Option<ValueType> {
        self.value_type
    }

    /// `is_a` references as written
    pub fn is_a(&self) -> &[String] {
        &self.is_a
    }

    /// `part_of` references as written
    pub fn part_of(&self) -> &[String] {
        &self.part_of
    }

    /// Unit references as written
    pub fn unit_refs(&self) -> &[String] {
        &self.unit_refs
    }

    /// Resolved parent accessions (is_a and part_of)
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Resolved unit accessions
    pub fn units(&self) -> &[String] {
        &self.units
    }

    /// Default unit (the first resolved one)
    pub fn unit(&self) -> Option<&str> {
        self.units.first().map(String::as_str)
    }

    pub(super) fn add_parent(&mut self, id: &str) {
        if !self.parents.iter().any(|p| p == id) {
            self.parents.push(id.to_string());
        }
    }

    pub(super) fn add_unit(&mut self, id: &str) {
        if !self.units.iter().any(|u| u == id) {
            self.units.push(id.to_string());
        }
    }

    /// Consume one `tag: value` line from inside the stanza
    ///
    /// Unknown tags and lines without a colon are ignored.
    pub fn parse_tag_line(&mut self, line: &str) {
        let Some((tag, value)) = line.split_once(':') else {
            return;
        };
        let value = value.trim();

        match tag.trim() {
            "name" => self.name = value.to_string(),
            "namespace" => self.namespace = Some(value.to_string()),
            "def" => self.definition = Some(quoted_text(value).to_string()),
            "is_obsolete" => self.is_obsolete = value == "true",
            "is_a" => self.is_a.push(reference(value).to_string()),
            "relationship" => {
                let mut parts = value.split_whitespace();
                match (parts.next(), parts.next()) {
                    (Some("part_of"), Some(target)) => self.part_of.push(target.to_string()),
                    (Some("has_units"), Some(target)) => self.unit_refs.push(target.to_string()),
                    _ => {}
                }
            }
            "xref" => {
                if let Some(rest) = value.strip_prefix("value-type:") {
                    let xsd = rest
                        .split_whitespace()
                        .next()
                        .unwrap_or_default()
                        .replace('\\', "");
                    self.value_type = Some(ValueType::from_xsd(&xsd));
                }
            }
            _ => {}
        }
    }
}

/// Drop trailing `! comment` and `{modifier}` parts of a reference
fn reference(value: &str) -> &str {
    let end = value.find(['!', '{']).unwrap_or(value.len());
    value[..end].trim()
}

/// Text between the first pair of double quotes, or the whole value
fn quoted_text(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.find('"').map(|end| &rest[..end]))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let mut term = OboTerm::new("MS:1000016");
        term.parse_tag_line("name: scan start time");
        term.parse_tag_line(r#"def: "The time that an analyzer started a scan." [PSI:MS]"#);
        term.parse_tag_line(r#"xref: value-type:xsd\:double "The allowed value-type for this CV term.""#);
        term.parse_tag_line("is_a: MS:1000499 ! spectrum attribute");
        term.parse_tag_line("relationship: has_units UO:0000010 ! second");
        term.parse_tag_line("relationship: part_of MS:1000442 ! spectrum");
        term.parse_tag_line("no colon here");

        assert_eq!(term.name(), "scan start time");
        assert_eq!(
            term.definition(),
            Some("The time that an analyzer started a scan.")
        );
        assert_eq!(term.value_type(), Some(ValueType::Double));
        assert_eq!(term.is_a(), &["MS:1000499".to_string()]);
        assert_eq!(term.part_of(), &["MS:1000442".to_string()]);
        assert_eq!(term.unit_refs(), &["UO:0000010".to_string()]);
        // nothing is resolved until the ontology wires it
        assert!(term.parents().is_empty());
        assert_eq!(term.unit(), None);
    }

    #[test]
    fn test_value_type_mapping() {
        assert_eq!(ValueType::from_xsd("xsd:nonNegativeInteger"), ValueType::Integer);
        assert_eq!(ValueType::from_xsd("long"), ValueType::Long);
        assert_eq!(ValueType::from_xsd("xsd:float"), ValueType::Double);
        assert_eq!(ValueType::from_xsd("xsd:boolean"), ValueType::Boolean);
        assert_eq!(ValueType::from_xsd("xsd:anyURI"), ValueType::String);
    }

    #[test]
    fn test_reference_strips_modifiers() {
        assert_eq!(reference("MS:1 {source=\"x\"} ! name"), "MS:1");
        assert_eq!(reference("MS:2"), "MS:2");
    }
}
