use anyhow::{Context, Result};

use imzml::obo::Ontology;

/// Print an ontology term with its parents (and optionally children)
pub fn run(ontology: &Ontology, accession: &str, children: bool) -> Result<()> {
    let term = ontology
        .term(accession)
        .with_context(|| format!("Unknown accession: {}", accession))?;

    println!("{} ! {}", term.id(), term.name());
    if let Some(definition) = term.definition() {
        println!("  definition: {}", definition);
    }
    if let Some(value_type) = term.value_type() {
        println!("  value type: {:?}", value_type);
    }
    if term.is_obsolete() {
        println!("  obsolete");
    }

    let name_of = |id: &str| ontology.term(id).map(|t| t.name().to_string()).unwrap_or_default();
    for parent in term.parents() {
        println!("  parent: {} ! {}", parent, name_of(parent.as_str()));
    }
    for unit in term.units() {
        println!("  unit: {} ! {}", unit, name_of(unit.as_str()));
    }

    if children {
        for child in ontology.children_of(accession) {
            println!("  child: {} ! {}", child.id(), child.name());
        }
    }
    Ok(())
}
