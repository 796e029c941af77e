//! Typed scalar values and numeric coercion rules (C1).

use std::cmp::Ordering;

///
/// ValueTag
///
/// Stable wire tag for one scalar's type. Written into the encoded query
/// form's `type_tag` field and into reference/attribute payloads.
///

#[repr(u16)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueTag {
    Int = 1,
    UInt = 2,
    Float32 = 3,
    Float64 = 4,
    Text = 5,
}

impl ValueTag {
    #[must_use]
    pub const fn to_u16(self) -> u16 {
        self as u16
    }

    #[must_use]
    pub const fn from_u16(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(Self::Int),
            2 => Some(Self::UInt),
            3 => Some(Self::Float32),
            4 => Some(Self::Float64),
            5 => Some(Self::Text),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Text)
    }
}

///
/// Value
///
/// A typed scalar: the operand of a query leaf, or one element read from
/// a dataset/attribute. Numeric variants are widened pairwise during
/// comparison rather than at construction (§4.1 numeric semantics).
///

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    UInt(u64),
    Float32(f32),
    Float64(f64),
    Text(String),
}

impl Value {
    #[must_use]
    pub const fn tag(&self) -> ValueTag {
        match self {
            Self::Int(_) => ValueTag::Int,
            Self::UInt(_) => ValueTag::UInt,
            Self::Float32(_) => ValueTag::Float32,
            Self::Float64(_) => ValueTag::Float64,
            Self::Text(_) => ValueTag::Text,
        }
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.tag().is_numeric()
    }

    /// Serialize this scalar's payload bytes (little-endian for numerics,
    /// UTF-8 for text). Does not include the tag or length prefix; callers
    /// combine this with `tag()` per §6's wire layout.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Int(v) => v.to_le_bytes().to_vec(),
            Self::UInt(v) => v.to_le_bytes().to_vec(),
            Self::Float32(v) => v.to_le_bytes().to_vec(),
            Self::Float64(v) => v.to_le_bytes().to_vec(),
            Self::Text(s) => s.as_bytes().to_vec(),
        }
    }

    /// Inverse of [`Value::to_bytes`] for a given tag.
    #[must_use]
    pub fn from_bytes(tag: ValueTag, bytes: &[u8]) -> Option<Self> {
        Some(match tag {
            ValueTag::Int => Self::Int(i64::from_le_bytes(bytes.try_into().ok()?)),
            ValueTag::UInt => Self::UInt(u64::from_le_bytes(bytes.try_into().ok()?)),
            ValueTag::Float32 => Self::Float32(f32::from_le_bytes(bytes.try_into().ok()?)),
            ValueTag::Float64 => Self::Float64(f64::from_le_bytes(bytes.try_into().ok()?)),
            ValueTag::Text => Self::Text(String::from_utf8(bytes.to_vec()).ok()?),
        })
    }

    fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::UInt(v) => Some(v as f64),
            Self::Float32(v) => Some(f64::from(v)),
            Self::Float64(v) => Some(v),
            Self::Text(_) => None,
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match *self {
            Self::Int(v) => Some(i128::from(v)),
            Self::UInt(v) => Some(i128::from(v)),
            Self::Float32(_) | Self::Float64(_) | Self::Text(_) => None,
        }
    }

    const fn is_floating(&self) -> bool {
        matches!(self, Self::Float32(_) | Self::Float64(_))
    }
}

// Numeric comparison after §4.1's widening rule. `NaN` never orders and
// never equals anything, including itself.
fn numeric_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    if left.is_floating() || right.is_floating() {
        let (l, r) = (left.as_f64()?, right.as_f64()?);
        return l.partial_cmp(&r);
    }
    let (l, r) = (left.as_i128()?, right.as_i128()?);
    Some(l.cmp(&r))
}

fn numeric_eq(left: &Value, right: &Value) -> Option<bool> {
    if left.is_floating() || right.is_floating() {
        let (l, r) = (left.as_f64()?, right.as_f64()?);
        // NaN is never equal to anything, including itself.
        return Some(l == r);
    }
    let (l, r) = (left.as_i128()?, right.as_i128()?);
    Some(l == r)
}

///
/// Compare two scalars for the ordering operators (`Less`, `Greater`,
/// `LessEq`, `GreaterEq`). Returns `None` when the comparison is not
/// defined (e.g. text operands, or a `NaN` present on either side).
///
#[must_use]
pub fn compare_order(left: &Value, right: &Value) -> Option<Ordering> {
    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }
    numeric_cmp(left, right)
}

///
/// Compare two scalars for equality under §4.1's rules: numeric values
/// widen pairwise; text values compare byte-wise. `NaN` never equals
/// anything.
///
#[must_use]
pub fn compare_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Text(a), Value::Text(b)) => a == b,
        (a, b) if a.is_numeric() && b.is_numeric() => numeric_eq(a, b).unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_float_widen_to_f64() {
        assert!(compare_eq(&Value::Int(25), &Value::Float64(25.0)));
        assert_eq!(
            compare_order(&Value::Int(20), &Value::Float64(21.2)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn nan_never_orders_or_equals() {
        let nan = Value::Float64(f64::NAN);
        assert_eq!(compare_order(&nan, &Value::Int(1)), None);
        assert!(!compare_eq(&nan, &Value::Float64(f64::NAN)));
    }

    #[test]
    fn text_only_supports_equality() {
        assert!(compare_order(&Value::Text("a".into()), &Value::Text("b".into())).is_none());
        assert!(!compare_eq(&Value::Text("a".into()), &Value::Int(1)));
    }

    #[test]
    fn byte_round_trip() {
        for value in [
            Value::Int(-7),
            Value::UInt(7),
            Value::Float32(1.5),
            Value::Float64(2.25),
            Value::Text("hi".into()),
        ] {
            let tag = value.tag();
            let bytes = value.to_bytes();
            assert_eq!(Value::from_bytes(tag, &bytes), Some(value));
        }
    }
}
