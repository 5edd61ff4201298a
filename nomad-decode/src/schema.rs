//! Record schemas and the generic decode routine.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{json_kind, DecodeError, Result};

/// Loads one raw JSON value into a field of `R`.
pub type LoadFn<R> = fn(&mut R, &Value) -> Result<()>;

/// Dumps one field of `R` back to its raw JSON form.
pub type DumpFn<R> = fn(&R) -> Value;

/// One entry of a record schema.
pub struct FieldSpec<R> {
    /// Key in the upstream JSON payload.
    pub key: &'static str,
    /// Exposed field name on the record.
    pub name: &'static str,
    /// Applies the field's codec and stores the result.
    pub load: LoadFn<R>,
    /// Inverse of `load`, used for the structural form.
    pub dump: DumpFn<R>,
}

impl<R> FieldSpec<R> {
    /// Whether the exposed name differs from the normalized source key.
    pub fn is_renamed(&self) -> bool {
        crate::normalize_key(self.key) != self.name
    }
}

impl<R> fmt::Debug for FieldSpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("key", &self.key)
            .field("name", &self.name)
            .finish()
    }
}

/// The constant field table of a record type.
pub struct Schema<R: 'static> {
    /// Record type name, used in error messages.
    pub name: &'static str,
    /// Declared fields in declaration order.
    pub fields: &'static [FieldSpec<R>],
}

impl<R: 'static> Schema<R> {
    /// Find the field declared for a source key.
    pub fn by_key(&self, key: &str) -> Option<&'static FieldSpec<R>> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Find the field exposed under a name.
    pub fn by_name(&self, name: &str) -> Option<&'static FieldSpec<R>> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Source keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        self.fields.iter().map(|field| field.key)
    }
}

impl<R: 'static> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

/// A typed, immutable view of one API object.
///
/// Implementations are generated by [`record!`](crate::record); equality is
/// structural over the exposed fields.
pub trait Record: Sized + Default + Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The field table consulted by [`decode`].
    const SCHEMA: Schema<Self>;

    /// Dump the record back to a JSON object keyed by source keys, such that
    /// `decode(&record.to_structural_form())` reproduces an equal record.
    fn to_structural_form(&self) -> Value {
        let mut object = Map::new();
        for field in Self::SCHEMA.fields {
            object.insert(field.key.to_string(), (field.dump)(self));
        }
        Value::Object(object)
    }
}

/// Decode a JSON value into a record.
///
/// `null` decodes to `None`. For an object, every field starts out null or
/// empty and is then overwritten for each input key the schema declares;
/// undeclared keys are ignored.
pub fn decode<R: Record>(input: &Value) -> Result<Option<R>> {
    let object = match input {
        Value::Null => return Ok(None),
        Value::Object(object) => object,
        other => {
            return Err(DecodeError::NotAnObject {
                record: R::SCHEMA.name,
                found: json_kind(other),
            });
        }
    };

    let schema = R::SCHEMA;
    let mut record = R::default();
    for (key, raw) in object {
        if let Some(field) = schema.by_key(key) {
            (field.load)(&mut record, raw).map_err(|source| DecodeError::Field {
                record: schema.name,
                key: key.clone(),
                source: Box::new(source),
            })?;
        }
    }
    Ok(Some(record))
}

/// Decode a JSON array of records. `null` decodes to an empty list and null
/// elements are skipped.
pub fn decode_list<R: Record>(input: &Value) -> Result<Vec<R>> {
    match input {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for item in items {
                if let Some(record) = decode(item)? {
                    records.push(record);
                }
            }
            Ok(records)
        }
        other => Err(DecodeError::unexpected("array", other)),
    }
}

/// Declare a record type together with its schema.
///
/// Each field names its exposed identifier, its type, its source key and
/// optionally a [`Codec`](crate::Codec); without a codec the value is
/// deserialized as-is with [`Plain`](crate::Plain). Field types must
/// implement `Default`, which is the value of an absent key.
///
/// ```
/// use nomad_decode::{decode, record, NanosecondsAsDuration, StringAsNil};
/// use nomad_units::Duration;
///
/// record! {
///     /// A restart policy.
///     pub struct RestartPolicy {
///         attempts: Option<i64> = "Attempts",
///         delay: Option<Duration> = "Delay" => NanosecondsAsDuration,
///         mode: Option<String> = "Mode" => StringAsNil,
///     }
/// }
///
/// let json = serde_json::json!({"Attempts": 2, "Delay": 15000000000u64, "Mode": ""});
/// let policy: RestartPolicy = decode(&json).unwrap().unwrap();
/// assert_eq!(policy.attempts, Some(2));
/// assert_eq!(policy.delay.unwrap().seconds(), 15.0);
/// assert_eq!(policy.mode, None);
/// ```
#[macro_export]
macro_rules! record {
    (@codec) => { $crate::Plain };
    (@codec $codec:ty) => { $codec };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $field:ident : $ty:ty = $key:literal $(=> $codec:ty)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                pub $field: $ty,
            )*
        }

        impl $crate::Record for $name {
            const SCHEMA: $crate::Schema<Self> = $crate::Schema {
                name: stringify!($name),
                fields: &[
                    $(
                        $crate::FieldSpec {
                            key: $key,
                            name: stringify!($field),
                            load: |record: &mut $name, raw: &$crate::__private::Value| {
                                record.$field =
                                    <$crate::record!(@codec $($codec)?) as $crate::Codec<$ty>>::load(raw)?;
                                Ok(())
                            },
                            dump: |record: &$name| {
                                <$crate::record!(@codec $($codec)?) as $crate::Codec<$ty>>::dump(&record.$field)
                            },
                        },
                    )*
                ],
            };
        }
    };
}
