use quick_xml::events::BytesStart;

use super::ReaderError;

/// Value of attribute `name`, if present
pub(super) fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, ReaderError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ReaderError::Xml(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)?.to_string();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Value of attribute `name`; missing is an error
pub(super) fn required_attribute(e: &BytesStart, name: &str) -> Result<String, ReaderError> {
    get_attribute(e, name)?.ok_or_else(|| {
        ReaderError::MissingAttribute(format!(
            "{} on <{}>",
            name,
            String::from_utf8_lossy(e.name().as_ref())
        ))
    })
}
