//! Type descriptors: how to construct a loadable type and which
//! configuration fields bind onto it.

use std::fmt;

use serde_json::Value;

use crate::common::LoadError;
use crate::loadable::arguments::Arguments;
use crate::loadable::ConfigNode;

/// Scalar kinds a configuration field can bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    String,
    Bool,
    Int,
    Long,
    Float,
    Double,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarKind::String => "string",
            ScalarKind::Bool => "boolean",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
        };
        f.write_str(name)
    }
}

/// A value that can be read out of a configuration node.
///
/// Conversion is lenient the way hand-edited config files need it to be:
/// numbers and booleans written as strings are accepted.
pub trait Scalar: Sized {
    const KIND: ScalarKind;

    fn from_node(node: &ConfigNode) -> Option<Self>;
}

impl Scalar for String {
    const KIND: ScalarKind = ScalarKind::String;

    fn from_node(node: &ConfigNode) -> Option<Self> {
        match node {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl Scalar for bool {
    const KIND: ScalarKind = ScalarKind::Bool;

    fn from_node(node: &ConfigNode) -> Option<Self> {
        match node {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

impl Scalar for i64 {
    const KIND: ScalarKind = ScalarKind::Long;

    fn from_node(node: &ConfigNode) -> Option<Self> {
        match node {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Scalar for i32 {
    const KIND: ScalarKind = ScalarKind::Int;

    fn from_node(node: &ConfigNode) -> Option<Self> {
        i64::from_node(node).and_then(|n| i32::try_from(n).ok())
    }
}

impl Scalar for f64 {
    const KIND: ScalarKind = ScalarKind::Double;

    fn from_node(node: &ConfigNode) -> Option<Self> {
        match node {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl Scalar for f32 {
    const KIND: ScalarKind = ScalarKind::Float;

    fn from_node(node: &ConfigNode) -> Option<Self> {
        f64::from_node(node).map(|n| n as f32)
    }
}

/// Declared configuration field of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Key looked up in the configuration entry.
    pub name: String,
    /// Whether the entry fails to load without it.
    pub required: bool,
    /// Scalar kind the value is converted to.
    pub kind: ScalarKind,
}

/// Hook run on a freshly constructed instance after its fields are bound.
pub trait Loadable {
    /// Inspect the raw configuration entry. Errors fail the whole entry.
    fn load(&mut self, _entry: &ConfigNode) -> Result<(), LoadError> {
        Ok(())
    }
}

type Constructor<C> = Box<dyn Fn(&Arguments) -> Result<C, LoadError> + Send + Sync>;
type Setter<C> = Box<dyn Fn(&mut C, &ConfigNode) -> Result<(), LoadError> + Send + Sync>;
type Build<T> = Box<dyn Fn(&str, &Arguments, &ConfigNode) -> Result<T, LoadError> + Send + Sync>;

struct FieldBinding<C> {
    spec: FieldSpec,
    set: Setter<C>,
}

/// Everything the registry needs to turn a configuration entry into a `T`.
pub struct TypeDescriptor<T> {
    fields: Vec<FieldSpec>,
    build: Build<T>,
}

impl<T> TypeDescriptor<T> {
    /// Declared fields, in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Construct, bind, run the load hook and wrap.
    pub(crate) fn instantiate(
        &self,
        type_name: &str,
        arguments: &Arguments,
        entry: &ConfigNode,
    ) -> Result<T, LoadError> {
        (self.build)(type_name, arguments, entry)
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

/// Builder for a [`TypeDescriptor`] over the concrete instance type `C`.
pub struct DescriptorBuilder<C> {
    constructor: Constructor<C>,
    bindings: Vec<FieldBinding<C>>,
}

impl<C: Loadable + 'static> DescriptorBuilder<C> {
    /// Start describing a type whose instances are produced by `constructor`.
    pub fn new<F>(constructor: F) -> Self
    where
        F: Fn(&Arguments) -> Result<C, LoadError> + Send + Sync + 'static,
    {
        Self {
            constructor: Box::new(constructor),
            bindings: Vec::new(),
        }
    }

    /// Declare an optional field. Absent or null values leave the instance untouched.
    pub fn field<V, S>(self, name: &str, setter: S) -> Self
    where
        V: Scalar + 'static,
        S: Fn(&mut C, V) + Send + Sync + 'static,
    {
        self.bind(name, false, setter)
    }

    /// Declare a required field. Absent or null values fail the entry.
    pub fn required<V, S>(self, name: &str, setter: S) -> Self
    where
        V: Scalar + 'static,
        S: Fn(&mut C, V) + Send + Sync + 'static,
    {
        self.bind(name, true, setter)
    }

    fn bind<V, S>(mut self, name: &str, required: bool, setter: S) -> Self
    where
        V: Scalar + 'static,
        S: Fn(&mut C, V) + Send + Sync + 'static,
    {
        let field = name.to_string();
        let set: Setter<C> = Box::new(move |instance, node| {
            let value = V::from_node(node).ok_or_else(|| LoadError::InvalidValue {
                field: field.clone(),
                message: format!("expected a {} value", V::KIND),
            })?;
            setter(instance, value);
            Ok(())
        });

        self.bindings.push(FieldBinding {
            spec: FieldSpec {
                name: name.to_string(),
                required,
                kind: V::KIND,
            },
            set,
        });
        self
    }

    /// Finish the descriptor. `wrap` turns the loaded instance into the
    /// registry's product type, with access to the raw entry.
    pub fn finish<T, W>(self, wrap: W) -> TypeDescriptor<T>
    where
        T: 'static,
        W: Fn(C, &ConfigNode) -> Result<T, LoadError> + Send + Sync + 'static,
    {
        let fields = self.bindings.iter().map(|b| b.spec.clone()).collect();
        let constructor = self.constructor;
        let bindings = self.bindings;

        let build: Build<T> = Box::new(move |type_name, arguments, entry| {
            let mut instance = constructor(arguments)?;

            for binding in &bindings {
                match entry.get(&binding.spec.name).filter(|node| !node.is_null()) {
                    Some(node) => (binding.set)(&mut instance, node)?,
                    None if binding.spec.required => {
                        return Err(LoadError::MissingField {
                            field: binding.spec.name.clone(),
                            type_name: type_name.to_string(),
                        });
                    }
                    None => {}
                }
            }

            instance.load(entry)?;
            wrap(instance, entry)
        });

        TypeDescriptor { fields, build }
    }
}
