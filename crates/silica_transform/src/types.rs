//! Source types to hardware types.

use crate::error::TransformError;
use silica_ast::TypeRef;
use silica_ir::HwType;
use silica_resolve::ArraySizeTable;

/// Widths the timing reports are characterized for.
const REPORT_WIDTHS: [u16; 4] = [8, 16, 32, 64];

/// Maps a value type to hardware.
///
/// `array_key` names the value in the array-size table and is only read for
/// array types. `void` has no hardware type; callers handle it before.
pub fn hw_type(
    ty: &TypeRef,
    array_key: &str,
    arrays: &ArraySizeTable,
    member: &str,
) -> Result<HwType, TransformError> {
    match ty {
        TypeRef::Bool => Ok(HwType::Boolean),
        TypeRef::Int { width, signed } => Ok(HwType::scalar(*width, *signed)),
        TypeRef::Array(element) => {
            let element = match element.as_ref() {
                TypeRef::Bool => HwType::Boolean,
                TypeRef::Int { width, signed } => HwType::scalar(*width, *signed),
                TypeRef::Array(_) => {
                    return Err(TransformError::unsupported(
                        "multi-dimensional array",
                        member,
                    ))
                }
                other => {
                    return Err(TransformError::unsupported(
                        format!("array of `{other}`"),
                        member,
                    ))
                }
            };
            let length = arrays.require(array_key)?;
            Ok(HwType::Array {
                element: Box::new(element),
                length,
            })
        }
        TypeRef::Void => Err(TransformError::unsupported("use of a void value", member)),
        TypeRef::Named(name) => Err(TransformError::unsupported(
            format!("value of type `{name}`"),
            member,
        )),
    }
}

/// Maps a return type; `void` has none.
pub fn return_type(
    ty: &TypeRef,
    array_key: &str,
    arrays: &ArraySizeTable,
    member: &str,
) -> Result<Option<HwType>, TransformError> {
    match ty {
        TypeRef::Void => Ok(None),
        other => hw_type(other, array_key, arrays, member).map(Some),
    }
}

/// The common type two integer operands are widened to.
///
/// Mixed signedness widens to a signed type one bit wider than the unsigned
/// operand, rounded up to a report width, so `i32` with `u32` gives `i64`.
/// Booleans only combine with booleans.
pub fn promote(a: &HwType, b: &HwType) -> Option<HwType> {
    if a == b {
        return Some(a.clone());
    }
    match (a, b) {
        (HwType::Boolean, _) | (_, HwType::Boolean) => None,
        (HwType::Array { .. }, _) | (_, HwType::Array { .. }) => None,
        _ => {
            let (wa, sa) = a.shape()?;
            let (wb, sb) = b.shape()?;
            if sa == sb {
                return Some(HwType::scalar(wa.max(wb), sa));
            }
            let (signed_width, unsigned_width) = if sa { (wa, wb) } else { (wb, wa) };
            let width = signed_width.max(unsigned_width.saturating_add(1));
            Some(HwType::Signed(report_width(width)))
        }
    }
}

/// Rounds a width up to the nearest characterized one. Widths beyond the
/// largest are returned unchanged and fail the timing lookup.
pub fn report_width(width: u16) -> u16 {
    REPORT_WIDTHS
        .iter()
        .copied()
        .find(|w| *w >= width)
        .unwrap_or(width)
}

/// The `(width, signed)` a timing lookup uses for a value of `ty`.
pub fn cost_shape(ty: &HwType) -> Option<(u16, bool)> {
    match ty {
        HwType::Boolean => Some((1, false)),
        other => other.shape().map(|(w, s)| (report_width(w), s)),
    }
}

/// Returns true if `value` is representable in `ty`.
pub fn fits(value: i64, ty: &HwType) -> bool {
    let Some((width, signed)) = ty.shape() else {
        return false;
    };
    if matches!(ty, HwType::Boolean) {
        return false;
    }
    let width = u32::from(width);
    if signed {
        if width >= 64 {
            return true;
        }
        let bound = 1i128 << (width - 1);
        (-bound..bound).contains(&i128::from(value))
    } else {
        if value < 0 {
            return false;
        }
        width >= 64 || i128::from(value) < (1i128 << width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silica_config::HardwareGenerationConfig;

    fn arrays() -> ArraySizeTable {
        ArraySizeTable::from_config(
            &HardwareGenerationConfig::new("Nexys A7-100T").with_array_length("M()::buf", 16),
        )
    }

    #[test]
    fn maps_scalars_and_sized_arrays() {
        let table = arrays();
        assert_eq!(hw_type(&TypeRef::Bool, "", &table, "M()").unwrap(), HwType::Boolean);
        assert_eq!(
            hw_type(&TypeRef::u32(), "", &table, "M()").unwrap(),
            HwType::Unsigned(32)
        );
        assert_eq!(
            hw_type(&TypeRef::array_of(TypeRef::i32()), "M()::buf", &table, "M()").unwrap(),
            HwType::Array {
                element: Box::new(HwType::Signed(32)),
                length: 16
            }
        );
    }

    #[test]
    fn unsized_array_names_the_key() {
        let err = hw_type(&TypeRef::array_of(TypeRef::i32()), "M()::other", &arrays(), "M()")
            .unwrap_err();
        assert_eq!(err.code(), "E303");
        assert!(err.to_string().contains("M()::other"));
    }

    #[test]
    fn nested_arrays_are_unsupported() {
        let ty = TypeRef::array_of(TypeRef::array_of(TypeRef::Bool));
        let err = hw_type(&ty, "M()::buf", &arrays(), "M()").unwrap_err();
        assert_eq!(err.code(), "E400");
    }

    #[test]
    fn void_has_no_return_type() {
        assert_eq!(return_type(&TypeRef::Void, "", &arrays(), "M()").unwrap(), None);
    }

    #[test]
    fn promotion_follows_integer_rules() {
        assert_eq!(
            promote(&HwType::Signed(16), &HwType::Signed(32)),
            Some(HwType::Signed(32))
        );
        assert_eq!(
            promote(&HwType::Signed(32), &HwType::Unsigned(32)),
            Some(HwType::Signed(64))
        );
        assert_eq!(
            promote(&HwType::Unsigned(8), &HwType::Signed(32)),
            Some(HwType::Signed(32))
        );
        assert_eq!(promote(&HwType::Boolean, &HwType::Signed(32)), None);
    }

    #[test]
    fn literal_ranges() {
        assert!(fits(255, &HwType::Unsigned(8)));
        assert!(!fits(256, &HwType::Unsigned(8)));
        assert!(!fits(-1, &HwType::Unsigned(32)));
        assert!(fits(-128, &HwType::Signed(8)));
        assert!(!fits(128, &HwType::Signed(8)));
        assert!(fits(i64::MIN, &HwType::Signed(64)));
    }

    #[test]
    fn cost_widths_round_up() {
        assert_eq!(cost_shape(&HwType::Signed(12)), Some((16, true)));
        assert_eq!(cost_shape(&HwType::Boolean), Some((1, false)));
        assert_eq!(report_width(65), 65);
    }
}
