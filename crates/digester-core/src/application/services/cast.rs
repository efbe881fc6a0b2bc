//! Type casting cascade.
//!
//! Resolved raw values are coerced into field types through [`Castable`].
//! The cascade mirrors the order a field type is checked in:
//!
//! 1. text targets stringify,
//! 2. numeric targets parse the string form as a double and truncate,
//! 3. date targets parse with the caster's date format,
//! 4. composite targets ([`Json`]) deserialize the text directly, falling
//!    back to a JSON round trip of the raw value.
//!
//! Records apply the same cascade at runtime through [`cast_kind`].

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::application::ports::Caster;
use crate::domain::{CastError, FieldKind, HtmlSelection, RawValue, Scalar};

/// A field type the engine can produce from a raw value.
pub trait Castable: Sized + Send + 'static {
    /// Short type label shown by `inspect` and in cast errors.
    const KIND: &'static str;

    /// Coerce a non-null raw value.
    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError>;
}

/// Null in, `None` out; anything else goes through [`Castable::cast_from`].
pub fn cast<F: Castable>(value: RawValue, caster: &dyn Caster) -> Result<Option<F>, CastError> {
    if value.is_null() {
        return Ok(None);
    }
    F::cast_from(value, caster).map(Some)
}

impl Castable for String {
    const KIND: &'static str = "text";

    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
        match value {
            RawValue::Scalar(Scalar::Text(s)) => Ok(s),
            other => Ok(caster.to_text(&other)),
        }
    }
}

/// Parse the string form of a value as a double.
fn parse_double(value: &RawValue, caster: &dyn Caster) -> Result<f64, CastError> {
    let text = caster.to_text(value);
    text.trim()
        .parse::<f64>()
        .map_err(|_| CastError::NotNumeric { value: text })
}

macro_rules! castable_integer {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Castable for $ty {
                const KIND: &'static str = stringify!($ty);

                fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
                    let out_of_range = |value: String| CastError::OutOfRange {
                        value,
                        target: stringify!($ty),
                    };
                    match value {
                        RawValue::Scalar(Scalar::Int(i)) => {
                            <$ty>::try_from(i).map_err(|_| out_of_range(i.to_string()))
                        }
                        RawValue::Scalar(Scalar::Bool(_)) => Err(CastError::Incompatible {
                            expected: stringify!($ty),
                            found: "bool",
                        }),
                        other => {
                            let truncated = parse_double(&other, caster)?.trunc();
                            if truncated.is_finite()
                                && truncated >= <$ty>::MIN as f64
                                && truncated <= <$ty>::MAX as f64
                            {
                                Ok(truncated as $ty)
                            } else {
                                Err(out_of_range(caster.to_text(&other)))
                            }
                        }
                    }
                }
            }
        )*
    };
}

castable_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

impl Castable for f64 {
    const KIND: &'static str = "f64";

    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
        match value {
            RawValue::Scalar(Scalar::Float(x)) => Ok(x),
            RawValue::Scalar(Scalar::Int(i)) => Ok(i as f64),
            other => parse_double(&other, caster),
        }
    }
}

impl Castable for f32 {
    const KIND: &'static str = "f32";

    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
        f64::cast_from(value, caster).map(|x| x as f32)
    }
}

impl Castable for bool {
    const KIND: &'static str = "bool";

    fn cast_from(value: RawValue, _caster: &dyn Caster) -> Result<Self, CastError> {
        match &value {
            RawValue::Scalar(Scalar::Bool(b)) => Ok(*b),
            RawValue::Scalar(Scalar::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(CastError::Incompatible {
                    expected: "bool",
                    found: "text",
                }),
            },
            other => Err(CastError::Incompatible {
                expected: "bool",
                found: other.kind_name(),
            }),
        }
    }
}

impl Castable for DateTime<Utc> {
    const KIND: &'static str = "date";

    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
        match value {
            RawValue::Scalar(Scalar::Date(d)) => Ok(d),
            other => caster.to_date(&other),
        }
    }
}

impl Castable for RawValue {
    const KIND: &'static str = "raw";

    fn cast_from(value: RawValue, _caster: &dyn Caster) -> Result<Self, CastError> {
        Ok(value)
    }
}

impl Castable for HtmlSelection {
    const KIND: &'static str = "html";

    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
        match value {
            RawValue::Html(selection) => Ok(selection),
            other => caster.to_html(&other),
        }
    }
}

impl<F: Castable> Castable for Option<F> {
    const KIND: &'static str = F::KIND;

    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
        cast::<F>(value, caster)
    }
}

/// A sequence casts element-wise, as does an HTML selection (one element at
/// a time). Any other value becomes a one-element list.
impl<F: Castable> Castable for Vec<F> {
    const KIND: &'static str = "list";

    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
        match value {
            RawValue::Sequence(items) => items
                .into_iter()
                .filter(|item| !item.is_null())
                .map(|item| F::cast_from(item, caster))
                .collect(),
            RawValue::Html(selection) if selection.len() > 1 => selection
                .into_iter()
                .map(|element| F::cast_from(RawValue::Html(HtmlSelection::single(element)), caster))
                .collect(),
            other => F::cast_from(other, caster).map(|f| vec![f]),
        }
    }
}

/// Composite field deserialized from the JSON form of a raw value.
///
/// Text is first parsed as JSON directly into `T`; when that fails, or for
/// any other value, the value is serialized by the caster and deserialized
/// from that.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned + Send + 'static> Castable for Json<T> {
    const KIND: &'static str = "json";

    fn cast_from(value: RawValue, caster: &dyn Caster) -> Result<Self, CastError> {
        if let Some(Ok(parsed)) = value.as_text().map(|s| serde_json::from_str::<T>(s)) {
            return Ok(Json(parsed));
        }
        let json = caster.to_json(&value)?;
        serde_json::from_str(&json)
            .map(Json)
            .map_err(|e| CastError::InvalidJson {
                reason: e.to_string(),
            })
    }
}

/// Runtime form of the cascade for record fields.
///
/// Nested kinds are converted by the engine, not cast.
pub fn cast_kind(
    value: RawValue,
    kind: &FieldKind,
    caster: &dyn Caster,
) -> Result<RawValue, CastError> {
    if value.is_null() {
        return Ok(RawValue::Null);
    }
    Ok(match kind {
        FieldKind::Text => RawValue::text(String::cast_from(value, caster)?),
        FieldKind::Integer => RawValue::from(i64::cast_from(value, caster)?),
        FieldKind::Float => RawValue::from(f64::cast_from(value, caster)?),
        FieldKind::Date => RawValue::from(DateTime::<Utc>::cast_from(value, caster)?),
        FieldKind::Boolean => RawValue::from(bool::cast_from(value, caster)?),
        FieldKind::Json => match value {
            RawValue::Scalar(Scalar::Text(text)) => {
                caster.parse_json(&text).unwrap_or(RawValue::text(text))
            }
            RawValue::Html(selection) => RawValue::text(selection.outer_html()),
            other => other,
        },
        FieldKind::Entity(_) | FieldKind::Entities(_) => {
            return Err(CastError::Incompatible {
                expected: "entity",
                found: value.kind_name(),
            });
        }
    })
}
