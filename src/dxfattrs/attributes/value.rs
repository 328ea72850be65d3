//! Attribute value types.
//!
//! `AttrValue` is the runtime representation of a decoded attribute. It is
//! narrower than [`TagValue`]: attributes are strings, integers (including
//! bool-as-integer and enumerated codes) or handle references.

use super::spec::AttributeKind;
use crate::tags::TagValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// Plain string (names, linetype references)
    Str(String),

    /// Integer code, flag word, enumerated or bool-as-int value
    Int(i32),

    /// Hex handle of another record
    Handle(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&str> {
        match self {
            AttrValue::Handle(h) => Some(h),
            _ => None,
        }
    }

    /// Whether this value can be stored in an attribute of `kind`.
    pub fn fits(&self, kind: AttributeKind) -> bool {
        matches!(
            (self, kind),
            (AttrValue::Str(_), AttributeKind::Str)
                | (AttrValue::Int(_), AttributeKind::Int)
                | (AttrValue::Int(_), AttributeKind::BoolInt)
                | (AttrValue::Handle(_), AttributeKind::Handle)
        )
    }

    /// Converts a raw tag value into an attribute value of `kind`.
    ///
    /// Integers written as strings or as integral floats are accepted, since
    /// tokenizers differ in how eagerly they type values.
    pub fn coerce(kind: AttributeKind, raw: &TagValue) -> Option<AttrValue> {
        match kind {
            AttributeKind::Str => Some(AttrValue::Str(raw.to_string())),
            AttributeKind::Handle => match raw {
                TagValue::Str(s) => Some(AttrValue::Handle(s.trim().to_ascii_uppercase())),
                _ => None,
            },
            AttributeKind::Int | AttributeKind::BoolInt => match raw {
                TagValue::Int(v) => Some(AttrValue::Int(*v)),
                TagValue::Str(s) => s.trim().parse().ok().map(AttrValue::Int),
                TagValue::Float(f) if f.fract() == 0.0 => Some(AttrValue::Int(*f as i32)),
                TagValue::Float(_) => None,
            },
        }
    }

    pub fn to_tag_value(&self) -> TagValue {
        match self {
            AttrValue::Str(s) | AttrValue::Handle(s) => TagValue::Str(s.clone()),
            AttrValue::Int(v) => TagValue::Int(*v),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_accepts_integer_strings() {
        let raw = TagValue::Str(" 62 ".into());
        assert_eq!(
            AttrValue::coerce(AttributeKind::Int, &raw),
            Some(AttrValue::Int(62))
        );
    }

    #[test]
    fn coerce_rejects_fractional_floats_for_ints() {
        assert_eq!(
            AttrValue::coerce(AttributeKind::Int, &TagValue::Float(1.5)),
            None
        );
        assert_eq!(
            AttrValue::coerce(AttributeKind::BoolInt, &TagValue::Float(1.0)),
            Some(AttrValue::Int(1))
        );
    }

    #[test]
    fn handles_are_normalized_to_uppercase() {
        let raw = TagValue::Str("1a".into());
        assert_eq!(
            AttrValue::coerce(AttributeKind::Handle, &raw),
            Some(AttrValue::Handle("1A".into()))
        );
        assert_eq!(
            AttrValue::coerce(AttributeKind::Handle, &TagValue::Int(3)),
            None
        );
    }

    #[test]
    fn fits_checks_kind() {
        assert!(AttrValue::Int(1).fits(AttributeKind::BoolInt));
        assert!(!AttrValue::Str("x".into()).fits(AttributeKind::Handle));
        assert!(AttrValue::Handle("F".into()).fits(AttributeKind::Handle));
    }

    #[test]
    fn tag_value_conversion() {
        assert_eq!(AttrValue::Handle("1F".into()).to_tag_value(), TagValue::Str("1F".into()));
        assert_eq!(AttrValue::Int(-5).to_tag_value(), TagValue::Int(-5));
    }
}
