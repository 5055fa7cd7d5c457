//! Schema sources: raw JSON, Rust types, and pre-built wire schemas.

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::error::{GenaiError, Result};
use crate::types::SchemaConfig;
use crate::wire::{Schema, SchemaKind};

/// A Rust type with a known wire schema.
///
/// Implemented for primitives, `String`, `Vec<T>`, `Option<T>`, `Box<T>`
/// and string-keyed maps. Structs implement it by hand with
/// [`Schema::object`]:
///
/// ```
/// use genaiclient::adapter::SchemaType;
/// use genaiclient::wire::Schema;
///
/// struct Weather {
///     city: String,
///     celsius: f64,
///     note: Option<String>,
/// }
///
/// impl SchemaType for Weather {
///     fn schema() -> Schema {
///         Schema::object()
///             .field::<String>("city")
///             .described_field::<f64>("celsius", "Temperature in Celsius")
///             .field::<Option<String>>("note")
///             .build()
///     }
/// }
///
/// let schema = Weather::schema();
/// assert_eq!(schema.required, vec!["city", "celsius"]);
/// assert_eq!(schema.property_ordering, vec!["city", "celsius", "note"]);
/// ```
pub trait SchemaType {
    fn schema() -> Schema;

    /// Optional fields are left out of an object's `required` list.
    fn is_optional() -> bool {
        false
    }
}

macro_rules! impl_schema_type {
    ($kind:expr => $($ty:ty),+ $(,)?) => {
        $(
            impl SchemaType for $ty {
                fn schema() -> Schema {
                    Schema::of($kind)
                }
            }
        )+
    };
}

impl_schema_type!(SchemaKind::String => String, char);
impl_schema_type!(SchemaKind::Boolean => bool);
impl_schema_type!(SchemaKind::Integer => i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_schema_type!(SchemaKind::Number => f32, f64);

impl<T: SchemaType> SchemaType for Vec<T> {
    fn schema() -> Schema {
        Schema::array(T::schema())
    }
}

impl<T: SchemaType, const N: usize> SchemaType for [T; N] {
    fn schema() -> Schema {
        Schema::array(T::schema()).with_items_range(Some(N as u64), Some(N as u64))
    }
}

impl<T: SchemaType> SchemaType for Option<T> {
    fn schema() -> Schema {
        T::schema().nullable()
    }

    fn is_optional() -> bool {
        true
    }
}

impl<T: SchemaType> SchemaType for Box<T> {
    fn schema() -> Schema {
        T::schema()
    }

    fn is_optional() -> bool {
        T::is_optional()
    }
}

impl<V> SchemaType for HashMap<String, V> {
    fn schema() -> Schema {
        Schema::of(SchemaKind::Object)
    }
}

impl<V> SchemaType for BTreeMap<String, V> {
    fn schema() -> Schema {
        Schema::of(SchemaKind::Object)
    }
}

impl Schema {
    /// Start an object schema.
    pub fn object() -> ObjectSchemaBuilder {
        ObjectSchemaBuilder::default()
    }
}

/// Builder for object schemas. Property order follows insertion order.
#[derive(Debug, Default)]
pub struct ObjectSchemaBuilder {
    description: Option<String>,
    properties: BTreeMap<String, Schema>,
    ordering: Vec<String>,
    required: Vec<String>,
}

impl ObjectSchemaBuilder {
    /// Add a property typed by `T`; required unless `T` is optional.
    pub fn field<T: SchemaType>(self, name: impl Into<String>) -> Self {
        self.property(name, T::schema(), !T::is_optional())
    }

    pub fn described_field<T: SchemaType>(
        self,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        self.property(
            name,
            T::schema().with_description(description),
            !T::is_optional(),
        )
    }

    /// Add a property with an explicit schema.
    pub fn property(mut self, name: impl Into<String>, schema: Schema, required: bool) -> Self {
        let name = name.into();
        if self.properties.insert(name.clone(), schema).is_none() {
            self.ordering.push(name.clone());
        }
        if required && !self.required.contains(&name) {
            self.required.push(name);
        }
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn build(self) -> Schema {
        Schema {
            kind: Some(SchemaKind::Object),
            description: self.description,
            properties: self.properties,
            property_ordering: self.ordering,
            required: self.required,
            ..Default::default()
        }
    }
}

/// Resolve a schema config to a single wire schema.
///
/// Precedence: raw JSON, then the type-derived schema, then the pre-built
/// wire schema. `Ok(None)` when no source is set.
pub fn resolve_schema(config: &SchemaConfig, context: &str) -> Result<Option<Schema>> {
    if let Some(json) = &config.json {
        let schema = serde_json::from_value::<Schema>(Value::Object(json.clone()))
            .map_err(|e| GenaiError::config_conversion(format!("json schema for {context}"), e.into()))?;
        return Ok(Some(schema));
    }
    if let Some(derived) = &config.derived {
        return Ok(Some(derived.clone()));
    }
    Ok(config.wire.clone())
}
