//! Controlled Vocabulary (CV) parameter handling
//!
//! Every annotation in an imzML document is a CV parameter: an ontology term,
//! optionally a unit term, and a value whose type is fixed when the parameter is
//! created. This module provides the typed parameter and the accessions this crate
//! relies on.
//!
//! ## Value coercions
//!
//! | value | `as_string` | `as_double` | `as_integer` | `as_long` |
//! |---|---|---|---|---|
//! | `Empty` | `""` | NaN | `i32::MIN` | `i64::MIN` |
//! | `Double(v)` | decimal text | `v` | `v` rounded half away from zero | same |
//! | `Integer` / `Long` / `String` | text | parsed | parsed | parsed |
//! | `Boolean(b)` | `true`/`false` | 1.0 / 0.0 | 1 / 0 | 1 / 0 |

use std::fmt;
use std::sync::Arc;

use crate::obo::{OboTerm, Ontology, ValueType};

use super::CvParamError;

/// Value carried by a CV parameter
#[derive(Debug, Clone, PartialEq)]
pub enum CvValue {
    /// No value; the presence of the term is the information
    Empty,
    /// Free text
    String(String),
    /// 32-bit integer
    Integer(i32),
    /// 64-bit integer
    Long(i64),
    /// Floating point
    Double(f64),
    /// Boolean flag
    Boolean(bool),
}

impl CvValue {
    /// Name of the variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CvValue::Empty => "empty",
            CvValue::String(_) => "string",
            CvValue::Integer(_) => "integer",
            CvValue::Long(_) => "long",
            CvValue::Double(_) => "double",
            CvValue::Boolean(_) => "boolean",
        }
    }

    /// Parse `text` into the variant dictated by `value_type`
    pub fn parse_as(value_type: ValueType, text: &str) -> Result<Self, String> {
        let trimmed = text.trim();
        match value_type {
            ValueType::String => Ok(CvValue::String(text.to_string())),
            // unbounded xsd integers (offsets, lengths) may exceed 32 bits
            ValueType::Integer => match trimmed.parse() {
                Ok(value) => Ok(CvValue::Integer(value)),
                Err(_) => trimmed
                    .parse()
                    .map(CvValue::Long)
                    .map_err(|_| "integer".to_string()),
            },
            ValueType::Long => trimmed
                .parse()
                .map(CvValue::Long)
                .map_err(|_| "long".to_string()),
            ValueType::Double => trimmed
                .parse()
                .map(CvValue::Double)
                .map_err(|_| "double".to_string()),
            ValueType::Boolean => parse_bool(trimmed)
                .map(CvValue::Boolean)
                .ok_or_else(|| "boolean".to_string()),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Render a double the way the metadata writer expects (`50.0`, not `50`)
fn format_double(value: f64) -> String {
    let text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        format!("{}.0", text)
    } else {
        text
    }
}

/// A controlled vocabulary parameter bound to an ontology term
///
/// The term and unit are fixed at construction; the value can only be replaced
/// by another value of the same variant.
#[derive(Debug, Clone, PartialEq)]
pub struct CvParam {
    term: Arc<OboTerm>,
    unit: Option<Arc<OboTerm>>,
    value: CvValue,
}

impl CvParam {
    /// Create a parameter; a missing term is an [`CvParamError::AccessionNotFound`]
    pub fn new(
        term: Option<&Arc<OboTerm>>,
        unit: Option<&Arc<OboTerm>>,
        value: CvValue,
    ) -> Result<Self, CvParamError> {
        let term = term.ok_or_else(|| CvParamError::AccessionNotFound(describe(&value)))?;
        Ok(Self {
            term: Arc::clone(term),
            unit: unit.cloned(),
            value,
        })
    }

    /// Parameter without a value
    pub fn empty(term: Option<&Arc<OboTerm>>) -> Result<Self, CvParamError> {
        Self::new(term, None, CvValue::Empty)
    }

    /// Parameter with a string value
    pub fn string(term: Option<&Arc<OboTerm>>, value: impl Into<String>) -> Result<Self, CvParamError> {
        Self::new(term, None, CvValue::String(value.into()))
    }

    /// Parameter with a 32-bit integer value
    pub fn integer(term: Option<&Arc<OboTerm>>, value: i32) -> Result<Self, CvParamError> {
        Self::new(term, None, CvValue::Integer(value))
    }

    /// Parameter with a 64-bit integer value
    pub fn long(term: Option<&Arc<OboTerm>>, value: i64) -> Result<Self, CvParamError> {
        Self::new(term, None, CvValue::Long(value))
    }

    /// Parameter with a floating point value
    pub fn double(term: Option<&Arc<OboTerm>>, value: f64) -> Result<Self, CvParamError> {
        Self::new(term, None, CvValue::Double(value))
    }

    /// Parameter with a boolean value
    pub fn boolean(term: Option<&Arc<OboTerm>>, value: bool) -> Result<Self, CvParamError> {
        Self::new(term, None, CvValue::Boolean(value))
    }

    /// Look `accession` up in `ontology` and bind `value` to it
    pub fn from_accession(
        ontology: &Ontology,
        accession: &str,
        value: CvValue,
    ) -> Result<Self, CvParamError> {
        Self::new(ontology.term(accession), None, value)
            .map_err(|_| CvParamError::AccessionNotFound(accession.to_string()))
    }

    /// Build a parameter from its textual form, choosing the variant from the
    /// term's declared value type
    ///
    /// No text gives an empty parameter. Text on a term without a declared value
    /// type is kept as a string.
    pub fn from_text(
        term: &Arc<OboTerm>,
        unit: Option<&Arc<OboTerm>>,
        text: Option<&str>,
    ) -> Result<Self, CvParamError> {
        let value = match (text, term.value_type()) {
            (None, _) => CvValue::Empty,
            (Some(text), None) if text.is_empty() => CvValue::Empty,
            (Some(text), None) => CvValue::String(text.to_string()),
            (Some(text), Some(value_type)) => {
                CvValue::parse_as(value_type, text).map_err(|target| {
                    CvParamError::InvalidValue {
                        accession: term.id().to_string(),
                        value: text.to_string(),
                        target,
                    }
                })?
            }
        };
        Self::new(Some(term), unit, value)
    }

    /// Attach a unit term
    pub fn with_unit(mut self, unit: Option<&Arc<OboTerm>>) -> Self {
        self.unit = unit.cloned();
        self
    }

    /// Ontology term
    pub fn term(&self) -> &Arc<OboTerm> {
        &self.term
    }

    /// Accession of the term
    pub fn accession(&self) -> &str {
        self.term.id()
    }

    /// Name of the term
    pub fn name(&self) -> &str {
        self.term.name()
    }

    /// Unit term, if any
    pub fn unit(&self) -> Option<&Arc<OboTerm>> {
        self.unit.as_ref()
    }

    /// Raw value
    pub fn value(&self) -> &CvValue {
        &self.value
    }

    /// Whether the parameter carries no value
    pub fn is_empty(&self) -> bool {
        matches!(self.value, CvValue::Empty)
    }

    /// Value as text
    pub fn as_string(&self) -> String {
        match &self.value {
            CvValue::Empty => String::new(),
            CvValue::String(v) => v.clone(),
            CvValue::Integer(v) => v.to_string(),
            CvValue::Long(v) => v.to_string(),
            CvValue::Double(v) => format_double(*v),
            CvValue::Boolean(v) => v.to_string(),
        }
    }

    /// Value as a double; NaN when empty
    pub fn as_double(&self) -> Result<f64, CvParamError> {
        match &self.value {
            CvValue::Empty => Ok(f64::NAN),
            CvValue::Double(v) => Ok(*v),
            CvValue::Integer(v) => Ok(f64::from(*v)),
            CvValue::Long(v) => Ok(*v as f64),
            CvValue::Boolean(v) => Ok(if *v { 1.0 } else { 0.0 }),
            CvValue::String(v) => v.trim().parse().map_err(|_| self.invalid("double")),
        }
    }

    /// Value as a 32-bit integer; `i32::MIN` when empty
    ///
    /// Doubles are rounded half away from zero and saturate at the integer range.
    pub fn as_integer(&self) -> Result<i32, CvParamError> {
        match &self.value {
            CvValue::Empty => Ok(i32::MIN),
            CvValue::Double(v) => Ok(v.round() as i32),
            CvValue::Integer(v) => Ok(*v),
            CvValue::Long(v) => i32::try_from(*v).map_err(|_| self.invalid("integer")),
            CvValue::Boolean(v) => Ok(i32::from(*v)),
            CvValue::String(v) => v.trim().parse().map_err(|_| self.invalid("integer")),
        }
    }

    /// Value as a 64-bit integer; `i64::MIN` when empty
    ///
    /// Doubles are rounded half away from zero and saturate at the integer range.
    pub fn as_long(&self) -> Result<i64, CvParamError> {
        match &self.value {
            CvValue::Empty => Ok(i64::MIN),
            CvValue::Double(v) => Ok(v.round() as i64),
            CvValue::Integer(v) => Ok(i64::from(*v)),
            CvValue::Long(v) => Ok(*v),
            CvValue::Boolean(v) => Ok(i64::from(*v)),
            CvValue::String(v) => v.trim().parse().map_err(|_| self.invalid("long")),
        }
    }

    /// Replace the value by parsing `text` with the current variant's parser
    ///
    /// Parameters without a value cannot be given one.
    pub fn set_value_from_str(&mut self, text: &str) -> Result<(), CvParamError> {
        let value_type = match &self.value {
            CvValue::Empty => {
                return Err(CvParamError::ImmutableValue {
                    accession: self.accession().to_string(),
                })
            }
            CvValue::String(_) => ValueType::String,
            CvValue::Integer(_) => ValueType::Integer,
            CvValue::Long(_) => ValueType::Long,
            CvValue::Double(_) => ValueType::Double,
            CvValue::Boolean(_) => ValueType::Boolean,
        };
        self.value = CvValue::parse_as(value_type, text).map_err(|target| {
            CvParamError::InvalidValue {
                accession: self.accession().to_string(),
                value: text.to_string(),
                target,
            }
        })?;
        Ok(())
    }

    fn invalid(&self, target: &str) -> CvParamError {
        CvParamError::InvalidValue {
            accession: self.accession().to_string(),
            value: self.as_string(),
            target: target.to_string(),
        }
    }
}

fn describe(value: &CvValue) -> String {
    match value {
        CvValue::Empty => "<no value>".to_string(),
        CvValue::String(v) => v.clone(),
        CvValue::Integer(v) => v.to_string(),
        CvValue::Long(v) => v.to_string(),
        CvValue::Double(v) => format_double(*v),
        CvValue::Boolean(v) => v.to_string(),
    }
}

impl fmt::Display for CvParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            CvValue::Empty => write!(f, "[{}: {}]", self.accession(), self.name()),
            _ => write!(
                f,
                "[{}: {}={}]",
                self.accession(),
                self.name(),
                self.as_string()
            ),
        }
    }
}

/// Common MS CV accessions
#[allow(non_snake_case)]
pub mod MS_CV_ACCESSIONS {
    /// MS level
    pub const MS_LEVEL: &str = "MS:1000511";

    /// Total ion current
    pub const TOTAL_ION_CURRENT: &str = "MS:1000285";

    /// Lowest observed m/z
    pub const LOWEST_OBSERVED_MZ: &str = "MS:1000528";

    /// Highest observed m/z
    pub const HIGHEST_OBSERVED_MZ: &str = "MS:1000527";

    /// Data file content (required in fileContent)
    pub const DATA_FILE_CONTENT: &str = "MS:1000524";

    /// Spectrum representation (centroid/profile)
    pub const SPECTRUM_REPRESENTATION: &str = "MS:1000525";

    /// Software (parent of all software terms)
    pub const SOFTWARE: &str = "MS:1000531";

    // =========================================================================
    // Binary data encoding
    // =========================================================================

    /// Binary data type (parent of the element types)
    pub const BINARY_DATA_TYPE: &str = "MS:1000518";

    /// Binary data compression type (parent of the compression terms)
    pub const COMPRESSION_TYPE: &str = "MS:1000572";

    /// 32-bit integer
    pub const INTEGER_32_BIT: &str = "MS:1000519";

    /// 32-bit float
    pub const FLOAT_32_BIT: &str = "MS:1000521";

    /// 64-bit integer
    pub const INTEGER_64_BIT: &str = "MS:1000522";

    /// 64-bit float
    pub const FLOAT_64_BIT: &str = "MS:1000523";

    /// zlib compression
    pub const ZLIB_COMPRESSION: &str = "MS:1000574";

    /// No compression
    pub const NO_COMPRESSION: &str = "MS:1000576";

    /// MS-Numpress linear prediction
    pub const NUMPRESS_LINEAR: &str = "MS:1002312";

    /// MS-Numpress positive integer compression
    pub const NUMPRESS_PIC: &str = "MS:1002313";

    /// MS-Numpress short logged float compression
    pub const NUMPRESS_SLOF: &str = "MS:1002314";

    // =========================================================================
    // Binary array types
    // =========================================================================

    /// m/z array
    pub const MZ_ARRAY: &str = "MS:1000514";

    /// Intensity array
    pub const INTENSITY_ARRAY: &str = "MS:1000515";
}

/// Common IMS (imaging mass spectrometry) CV accessions used in imzML
#[allow(non_snake_case)]
pub mod IMS_CV_ACCESSIONS {
    /// ibd binary type (parent of continuous/processed)
    pub const BINARY_TYPE: &str = "IMS:1000003";

    /// Continuous binary type
    pub const BINARY_TYPE_CONTINUOUS: &str = "IMS:1000030";

    /// Processed binary type
    pub const BINARY_TYPE_PROCESSED: &str = "IMS:1000031";

    /// ibd file
    pub const IBD_FILE: &str = "IMS:1000007";

    /// ibd identification
    pub const IBD_IDENTIFICATION: &str = "IMS:1000008";

    /// Universally unique identifier
    pub const UUID_IDENTIFICATION: &str = "IMS:1000080";

    /// ibd checksum
    pub const IBD_CHECKSUM: &str = "IMS:1000009";

    /// ibd MD5
    pub const IBD_MD5: &str = "IMS:1000090";

    /// ibd SHA-1
    pub const IBD_SHA1: &str = "IMS:1000091";

    /// Max count of pixels x
    pub const MAX_COUNT_PIXEL_X: &str = "IMS:1000042";

    /// Max count of pixels y
    pub const MAX_COUNT_PIXEL_Y: &str = "IMS:1000043";

    /// Position x (pixel coordinate)
    pub const POSITION_X: &str = "IMS:1000050";

    /// Position y (pixel coordinate)
    pub const POSITION_Y: &str = "IMS:1000051";

    /// Position z (pixel coordinate)
    pub const POSITION_Z: &str = "IMS:1000052";

    /// External offset (byte position in the ibd file)
    pub const EXTERNAL_OFFSET: &str = "IMS:1000102";

    /// External array length (number of values)
    pub const EXTERNAL_ARRAY_LENGTH: &str = "IMS:1000103";

    /// External encoded length (number of bytes)
    pub const EXTERNAL_ENCODED_LENGTH: &str = "IMS:1000104";

    /// 32-bit integer (imaging variant)
    pub const INTEGER_32_BIT: &str = "IMS:1000141";

    /// 64-bit integer (imaging variant)
    pub const INTEGER_64_BIT: &str = "IMS:1000142";
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ontology() -> Arc<Ontology> {
        Ontology::shared().unwrap()
    }

    fn tic_term() -> Arc<OboTerm> {
        Arc::clone(ontology().term(MS_CV_ACCESSIONS::TOTAL_ION_CURRENT).unwrap())
    }

    #[test]
    fn test_missing_term_is_accession_not_found() {
        let err = CvParam::double(None, 42.5).unwrap_err();
        match err {
            CvParamError::AccessionNotFound(value) => assert_eq!(value, "42.5"),
            other => panic!("unexpected error: {other}"),
        }

        let err = CvParam::from_accession(&ontology(), "IMS:9999999", CvValue::Empty).unwrap_err();
        assert!(matches!(err, CvParamError::AccessionNotFound(ref a) if a == "IMS:9999999"));
    }

    #[test]
    fn test_empty_coercions() {
        let param = CvParam::empty(Some(&tic_term())).unwrap();
        assert_eq!(param.as_string(), "");
        assert!(param.as_double().unwrap().is_nan());
        assert_eq!(param.as_integer().unwrap(), i32::MIN);
        assert_eq!(param.as_long().unwrap(), i64::MIN);
    }

    #[test]
    fn test_empty_value_is_immutable() {
        let mut param = CvParam::empty(Some(&tic_term())).unwrap();
        let err = param.set_value_from_str("12").unwrap_err();
        assert!(matches!(err, CvParamError::ImmutableValue { .. }));
        assert!(param.is_empty());
    }

    #[test]
    fn test_double_rounds_half_away_from_zero() {
        let term = tic_term();
        let cases = [
            (3.5, 4),
            (2.5, 3),
            (-2.5, -3),
            (-3.5, -4),
            (3.4999, 3),
            (0.5, 1),
            (-0.5, -1),
        ];
        for (value, expected) in cases {
            let param = CvParam::double(Some(&term), value).unwrap();
            assert_eq!(param.as_integer().unwrap(), expected, "{value}");
            assert_eq!(param.as_long().unwrap(), i64::from(expected), "{value}");
        }
    }

    #[test]
    fn test_double_text_round_trip() {
        let mut param = CvParam::double(Some(&tic_term()), 50.0).unwrap();
        assert_eq!(param.as_string(), "50.0");
        param.set_value_from_str("1234.5").unwrap();
        assert_eq!(param.as_double().unwrap(), 1234.5);

        let err = param.set_value_from_str("not a number").unwrap_err();
        assert!(matches!(err, CvParamError::InvalidValue { .. }));
        // failed parse leaves the old value in place
        assert_eq!(param.as_double().unwrap(), 1234.5);
    }

    #[test]
    fn test_integer_and_string_coercions() {
        let term = tic_term();
        let int = CvParam::integer(Some(&term), 7).unwrap();
        assert_eq!(int.as_string(), "7");
        assert_eq!(int.as_double().unwrap(), 7.0);
        assert_eq!(int.as_long().unwrap(), 7);

        let long = CvParam::long(Some(&term), i64::from(i32::MAX) + 1).unwrap();
        assert!(long.as_integer().is_err());
        assert_eq!(long.as_double().unwrap(), 2_147_483_648.0);

        let text = CvParam::string(Some(&term), " 12 ").unwrap();
        assert_eq!(text.as_integer().unwrap(), 12);
        assert_eq!(text.as_double().unwrap(), 12.0);
        let bad = CvParam::string(Some(&term), "abc").unwrap();
        assert!(bad.as_long().is_err());
    }

    #[test]
    fn test_boolean_coercions() {
        let mut flag = CvParam::boolean(Some(&tic_term()), true).unwrap();
        assert_eq!(flag.as_string(), "true");
        assert_eq!(flag.as_integer().unwrap(), 1);
        flag.set_value_from_str("FALSE").unwrap();
        assert_eq!(flag.as_double().unwrap(), 0.0);
    }

    #[test]
    fn test_from_text_uses_term_value_type() {
        let ontology = ontology();
        let position = ontology.term(IMS_CV_ACCESSIONS::POSITION_X).unwrap();
        let param = CvParam::from_text(position, None, Some("12")).unwrap();
        assert_eq!(param.value(), &CvValue::Integer(12));

        let err = CvParam::from_text(position, None, Some("twelve")).unwrap_err();
        assert!(matches!(err, CvParamError::InvalidValue { .. }));

        let offset = ontology.term(IMS_CV_ACCESSIONS::EXTERNAL_OFFSET).unwrap();
        let param = CvParam::from_text(offset, None, Some("3000000000")).unwrap();
        assert_eq!(param.value(), &CvValue::Long(3_000_000_000));
        assert_eq!(param.as_long().unwrap(), 3_000_000_000);
        let small = CvParam::from_text(offset, None, Some("48")).unwrap();
        assert_eq!(small.value(), &CvValue::Integer(48));
        let err = CvParam::from_text(offset, None, Some("99999999999999999999")).unwrap_err();
        assert!(matches!(err, CvParamError::InvalidValue { .. }));

        let processed = ontology.term(IMS_CV_ACCESSIONS::BINARY_TYPE_PROCESSED).unwrap();
        let flag = CvParam::from_text(processed, None, Some("")).unwrap();
        assert!(flag.is_empty());

        let unit = ontology.term("MS:1000131");
        let tic = ontology.term(MS_CV_ACCESSIONS::TOTAL_ION_CURRENT).unwrap();
        let param = CvParam::from_text(tic, unit, Some("1.5e3")).unwrap();
        assert_eq!(param.as_double().unwrap(), 1500.0);
        assert_eq!(param.unit().map(|u| u.id()), Some("MS:1000131"));
        assert_eq!(param.to_string(), "[MS:1000285: total ion current=1500.0]");
    }

    proptest! {
        #[test]
        fn prop_double_coercion_is_nearest_integer(value in -1.0e9f64..1.0e9) {
            let param = CvParam::double(Some(&tic_term()), value).unwrap();
            let rounded = param.as_long().unwrap() as f64;
            prop_assert!((rounded - value).abs() <= 0.5);
        }

        #[test]
        fn prop_halves_round_away_from_zero(whole in -100_000i32..100_000) {
            let value = f64::from(whole) + 0.5;
            let expected = if value > 0.0 { whole + 1 } else { whole };
            let param = CvParam::double(Some(&tic_term()), value).unwrap();
            prop_assert_eq!(param.as_integer().unwrap(), expected);
            prop_assert_eq!(param.as_long().unwrap(), i64::from(expected));
        }
    }
}
