//! Validators and fixers referenced by attribute schemas.
//!
//! Every function here is pure. Fixers are total over their input type and
//! their output always passes the paired validator.
//!
//! Table names:
//! - Must not be empty
//! - Must not contain any of `<>/\":;?*|=` or a backtick
//! - Layer names starting with `*ADSK_` are reserved system layers and valid

use thiserror::Error;

pub const INVALID_NAME_CHARACTERS: &str = "<>/\\\":;?*|=`";
const ADSK_SPECIAL_LAYER_PREFIX: &str = "*ADSK_";

pub const LINEWEIGHT_BYLAYER: i32 = -1;
pub const LINEWEIGHT_BYBLOCK: i32 = -2;
pub const LINEWEIGHT_DEFAULT: i32 = -3;

/// Physical widths in 1/100 mm.
pub const VALID_LINEWEIGHTS: [i32; 24] = [
    0, 5, 9, 13, 15, 18, 20, 25, 30, 35, 40, 50, 53, 60, 70, 80, 90, 100, 106, 120, 140, 158, 200,
    211,
];
const MAX_LINEWEIGHT: i32 = 211;

pub const DEFAULT_LAYER_COLOR: i32 = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameValidationError {
    #[error("name cannot be empty")]
    Empty,
    #[error(
        "name contains invalid character '{0}', invalid characters: {chars}",
        chars = INVALID_NAME_CHARACTERS
    )]
    InvalidCharacter(char),
}

/// Validates a table entry name.
///
/// # Examples
/// ```
/// use dxfattrs::attributes::validation::validate_table_name;
///
/// assert!(validate_table_name("Continuous").is_ok());
/// assert!(validate_table_name("").is_err());
/// assert!(validate_table_name("a/b").is_err());
/// ```
pub fn validate_table_name(name: &str) -> Result<(), NameValidationError> {
    if name.is_empty() {
        return Err(NameValidationError::Empty);
    }
    match name.chars().find(|ch| is_invalid_name_char(*ch)) {
        Some(ch) => Err(NameValidationError::InvalidCharacter(ch)),
        None => Ok(()),
    }
}

/// Like [`validate_table_name`], but accepts `*ADSK_` system layers.
pub fn validate_layer_name(name: &str) -> Result<(), NameValidationError> {
    if is_adsk_special_layer(name) {
        return validate_table_name(&name[ADSK_SPECIAL_LAYER_PREFIX.len()..]);
    }
    validate_table_name(name)
}

pub fn is_valid_table_name(name: &str) -> bool {
    validate_table_name(name).is_ok()
}

pub fn is_valid_layer_name(name: &str) -> bool {
    validate_layer_name(name).is_ok()
}

fn is_adsk_special_layer(name: &str) -> bool {
    name.len() > ADSK_SPECIAL_LAYER_PREFIX.len()
        && name
            .get(..ADSK_SPECIAL_LAYER_PREFIX.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(ADSK_SPECIAL_LAYER_PREFIX))
}

fn is_invalid_name_char(ch: char) -> bool {
    INVALID_NAME_CHARACTERS.contains(ch) || ch.is_control()
}

pub fn is_integer_bool(value: i32) -> bool {
    value == 0 || value == 1
}

/// ACI including the BYBLOCK (0) and BYLAYER (256) sentinels.
pub fn is_valid_aci(value: i32) -> bool {
    (0..=256).contains(&value)
}

/// Layer colors: sign is the on/off state, BYBLOCK and BYLAYER are invalid.
pub fn is_valid_layer_color_index(aci: i32) -> bool {
    -256 < aci && aci < 256 && aci != 0
}

pub fn fix_layer_color(aci: i32) -> i32 {
    if is_valid_layer_color_index(aci) {
        aci
    } else {
        DEFAULT_LAYER_COLOR
    }
}

pub fn is_valid_lineweight(lw: i32) -> bool {
    (LINEWEIGHT_DEFAULT..=LINEWEIGHT_BYLAYER).contains(&lw) || VALID_LINEWEIGHTS.contains(&lw)
}

/// Rounds up to the next valid width; out of range values are clamped.
pub fn fix_lineweight(lw: i32) -> i32 {
    if is_valid_lineweight(lw) {
        return lw;
    }
    if lw < LINEWEIGHT_DEFAULT {
        return LINEWEIGHT_DEFAULT;
    }
    if lw > MAX_LINEWEIGHT {
        return MAX_LINEWEIGHT;
    }
    VALID_LINEWEIGHTS
        .iter()
        .copied()
        .find(|&valid| valid >= lw)
        .unwrap_or(MAX_LINEWEIGHT)
}

/// BYLAYER and BYBLOCK make no sense for the layer itself.
pub fn is_valid_layer_lineweight(lw: i32) -> bool {
    is_valid_lineweight(lw) && lw != LINEWEIGHT_BYLAYER && lw != LINEWEIGHT_BYBLOCK
}

pub fn fix_layer_lineweight(lw: i32) -> i32 {
    if lw == LINEWEIGHT_BYLAYER || lw == LINEWEIGHT_BYBLOCK {
        LINEWEIGHT_DEFAULT
    } else {
        fix_lineweight(lw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_valid_table_names() {
        assert!(is_valid_table_name("0"));
        assert!(is_valid_table_name("WALLS"));
        assert!(is_valid_table_name("Layer with spaces"));
        assert!(is_valid_table_name("Ebene-1_ä"));
    }

    #[test]
    fn test_invalid_table_names() {
        assert_eq!(validate_table_name(""), Err(NameValidationError::Empty));
        for ch in INVALID_NAME_CHARACTERS.chars() {
            let name = format!("a{}b", ch);
            assert_eq!(
                validate_table_name(&name),
                Err(NameValidationError::InvalidCharacter(ch))
            );
        }
        assert!(!is_valid_table_name("tab\tname"));
    }

    #[test]
    fn test_adsk_special_layers() {
        assert!(is_valid_layer_name("*ADSK_CONSTRAINTS"));
        assert!(is_valid_layer_name("*adsk_system"));
        assert!(!is_valid_layer_name("*ADSK_"));
        assert!(!is_valid_layer_name("*OTHER"));
        assert!(!is_valid_table_name("*ADSK_CONSTRAINTS"));
    }

    #[test]
    fn test_error_display_lists_invalid_characters() {
        let message = NameValidationError::InvalidCharacter('?').to_string();
        assert!(message.contains('?'));
        assert!(message.contains(INVALID_NAME_CHARACTERS));
    }

    #[test]
    fn test_layer_color_validation() {
        assert!(is_valid_layer_color_index(1));
        assert!(is_valid_layer_color_index(255));
        assert!(is_valid_layer_color_index(-255));
        assert!(!is_valid_layer_color_index(0));
        assert!(!is_valid_layer_color_index(256));
        assert!(!is_valid_layer_color_index(-256));
    }

    #[test]
    fn test_layer_color_fixer() {
        assert_eq!(fix_layer_color(-5), -5);
        assert_eq!(fix_layer_color(0), 7);
        assert_eq!(fix_layer_color(256), 7);
        assert_eq!(fix_layer_color(1000), 7);
    }

    #[test]
    fn test_lineweight_validation() {
        assert!(is_valid_lineweight(LINEWEIGHT_BYLAYER));
        assert!(is_valid_lineweight(LINEWEIGHT_BYBLOCK));
        assert!(is_valid_lineweight(LINEWEIGHT_DEFAULT));
        assert!(is_valid_lineweight(0));
        assert!(is_valid_lineweight(211));
        assert!(!is_valid_lineweight(1));
        assert!(!is_valid_lineweight(-4));
        assert!(!is_valid_lineweight(212));
    }

    #[test]
    fn test_lineweight_fixer() {
        assert_eq!(fix_lineweight(1), 5);
        assert_eq!(fix_lineweight(51), 53);
        assert_eq!(fix_lineweight(210), 211);
        assert_eq!(fix_lineweight(500), 211);
        assert_eq!(fix_lineweight(-10), LINEWEIGHT_DEFAULT);
        assert_eq!(fix_lineweight(25), 25);
    }

    #[test]
    fn test_layer_lineweight_rejects_context_sentinels() {
        assert!(!is_valid_layer_lineweight(LINEWEIGHT_BYLAYER));
        assert!(!is_valid_layer_lineweight(LINEWEIGHT_BYBLOCK));
        assert!(is_valid_layer_lineweight(LINEWEIGHT_DEFAULT));
        assert_eq!(fix_layer_lineweight(LINEWEIGHT_BYLAYER), LINEWEIGHT_DEFAULT);
        assert_eq!(fix_layer_lineweight(LINEWEIGHT_BYBLOCK), LINEWEIGHT_DEFAULT);
    }

    proptest! {
        #[test]
        fn layer_color_fixer_output_validates(aci in any::<i32>()) {
            prop_assert!(is_valid_layer_color_index(fix_layer_color(aci)));
        }

        #[test]
        fn lineweight_fixer_output_validates(lw in any::<i32>()) {
            prop_assert!(is_valid_lineweight(fix_lineweight(lw)));
        }

        #[test]
        fn layer_lineweight_fixer_output_validates(lw in any::<i32>()) {
            let fixed = fix_layer_lineweight(lw);
            prop_assert!(is_valid_layer_lineweight(fixed));
            if is_valid_layer_lineweight(lw) {
                prop_assert_eq!(fixed, lw);
            }
        }
    }
}
