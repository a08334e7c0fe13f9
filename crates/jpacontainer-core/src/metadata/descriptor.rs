//! Declarative type descriptions.
//!
//! A [`TypeDescriptor`] describes the shape of a mapped class: its declared
//! fields and methods, their modifiers and the mapping annotations attached to
//! them. The metadata factory derives property metadata from these
//! descriptions the same way an annotation processor would from source.

use rkyv::{Archive, Deserialize, Serialize};
use serde::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

/// Mapping annotations recognized by the metadata factory.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Archive,
    Serialize,
    Deserialize,
    SerdeSerialize,
    SerdeDeserialize,
)]
pub enum AnnotationKind {
    /// Class is an entity. The annotation value is the explicit entity name.
    Entity,
    /// Class is embeddable into entities.
    Embeddable,
    /// Class contributes mapped properties to its subclasses.
    MappedSuperclass,
    /// Member is the identifier.
    Id,
    /// Member is an embedded identifier.
    EmbeddedId,
    /// Member is the optimistic locking version.
    Version,
    /// Member holds an embeddable value.
    Embedded,
    /// Member references a single entity (owning side).
    ManyToOne,
    /// Member references a single entity.
    OneToOne,
    /// Member holds a collection of entities.
    OneToMany,
    /// Member holds a collection of entities shared with other owners.
    ManyToMany,
    /// Member holds a collection of basic or embeddable values.
    ElementCollection,
    /// Member is not persistent.
    Transient,
}

/// An annotation attached to a class or member.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct Annotation {
    /// Annotation kind.
    pub kind: AnnotationKind,
    /// Optional annotation value.
    #[serde(default)]
    pub value: Option<String>,
}

impl Annotation {
    /// Create an annotation without a value.
    pub fn new(kind: AnnotationKind) -> Self {
        Self { kind, value: None }
    }

    /// Create an annotation with a value.
    pub fn with_value(kind: AnnotationKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: Some(value.into()),
        }
    }
}

impl From<AnnotationKind> for Annotation {
    fn from(kind: AnnotationKind) -> Self {
        Annotation::new(kind)
    }
}

/// Member modifiers relevant to persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Member belongs to the class, not the instance.
    pub is_static: bool,
    /// Member cannot be reassigned.
    pub is_final: bool,
    /// Member is excluded from serialization by the language.
    pub is_transient: bool,
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Declared type name.
    pub type_name: String,
    /// Field modifiers.
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Field annotations.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl FieldDescriptor {
    /// Create a plain instance field.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            modifiers: Modifiers::default(),
            annotations: Vec::new(),
        }
    }

    /// Attach an annotation.
    pub fn annotated(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Set the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if the field carries an annotation.
    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        has_annotation(&self.annotations, kind)
    }
}

/// A declared method.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct MethodDescriptor {
    /// Method name.
    pub name: String,
    /// Return type name, `None` for void.
    #[serde(default)]
    pub return_type: Option<String>,
    /// Parameter type names.
    #[serde(default)]
    pub parameter_types: Vec<String>,
    /// Method modifiers.
    #[serde(default)]
    pub modifiers: Modifiers,
    /// Method annotations.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

impl MethodDescriptor {
    /// Create a getter `get<Name>()` returning `type_name`.
    ///
    /// Boolean getters may use the `is` prefix, see [`MethodDescriptor::new`].
    pub fn getter(property: &str, type_name: impl Into<String>) -> Self {
        Self::new(accessor_name("get", property), Some(type_name.into()), Vec::new())
    }

    /// Create a setter `set<Name>(type_name)`.
    pub fn setter(property: &str, type_name: impl Into<String>) -> Self {
        Self::new(accessor_name("set", property), None, vec![type_name.into()])
    }

    /// Create an arbitrary method.
    pub fn new(
        name: impl Into<String>,
        return_type: Option<String>,
        parameter_types: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            return_type,
            parameter_types,
            modifiers: Modifiers::default(),
            annotations: Vec::new(),
        }
    }

    /// Attach an annotation.
    pub fn annotated(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Set the modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Check if the method carries an annotation.
    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        has_annotation(&self.annotations, kind)
    }

    /// Property name if this is a getter: `getX()`, or `isX()` returning boolean.
    pub fn getter_property(&self) -> Option<String> {
        if self.modifiers.is_static || !self.parameter_types.is_empty() {
            return None;
        }
        let return_type = self.return_type.as_deref()?;
        if return_type == "void" {
            return None;
        }
        let suffix = match self.name.strip_prefix("get") {
            Some(rest) => rest,
            None if is_boolean(return_type) => self.name.strip_prefix("is")?,
            None => return None,
        };
        decapitalize(suffix)
    }

    /// Property name if this is a setter: `setX(value)`.
    pub fn setter_property(&self) -> Option<String> {
        if self.modifiers.is_static || self.parameter_types.len() != 1 {
            return None;
        }
        decapitalize(self.name.strip_prefix("set")?)
    }
}

/// Description of one class.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize, SerdeDeserialize)]
pub struct TypeDescriptor {
    /// Fully qualified class name (the identity key).
    pub name: String,
    /// Direct superclass name.
    #[serde(default)]
    pub superclass: Option<String>,
    /// Class annotations.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Declared fields.
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
    /// Declared methods.
    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl TypeDescriptor {
    /// Create an empty class description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Shorthand for an `@Entity` class.
    pub fn entity(name: impl Into<String>) -> Self {
        Self::new(name).annotated(AnnotationKind::Entity)
    }

    /// Shorthand for an `@Embeddable` class.
    pub fn embeddable(name: impl Into<String>) -> Self {
        Self::new(name).annotated(AnnotationKind::Embeddable)
    }

    /// Shorthand for a `@MappedSuperclass` class.
    pub fn mapped_superclass(name: impl Into<String>) -> Self {
        Self::new(name).annotated(AnnotationKind::MappedSuperclass)
    }

    /// Set the superclass.
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Attach a class annotation.
    pub fn annotated(mut self, annotation: impl Into<Annotation>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    /// Declare a field.
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a method.
    pub fn with_method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Declare a getter/setter pair. Annotations go on the getter.
    pub fn with_accessors(
        self,
        property: &str,
        type_name: &str,
        annotations: impl IntoIterator<Item = AnnotationKind>,
    ) -> Self {
        let getter = annotations
            .into_iter()
            .fold(MethodDescriptor::getter(property, type_name), |m, a| {
                m.annotated(a)
            });
        self.with_method(getter)
            .with_method(MethodDescriptor::setter(property, type_name))
    }

    /// Check if the class carries an annotation.
    pub fn has_annotation(&self, kind: AnnotationKind) -> bool {
        has_annotation(&self.annotations, kind)
    }

    /// Value of a class annotation, if present and set.
    pub fn annotation_value(&self, kind: AnnotationKind) -> Option<&str> {
        self.annotations
            .iter()
            .find(|a| a.kind == kind)
            .and_then(|a| a.value.as_deref())
    }

    /// Class name without its package.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit(&['.', '$'][..]).next().unwrap_or(&self.name)
    }

    /// Find a declared setter for a property.
    pub fn find_setter(&self, property: &str) -> Option<&MethodDescriptor> {
        self.methods
            .iter()
            .find(|m| m.setter_property().as_deref() == Some(property))
    }
}

fn has_annotation(annotations: &[Annotation], kind: AnnotationKind) -> bool {
    annotations.iter().any(|a| a.kind == kind)
}

fn is_boolean(type_name: &str) -> bool {
    matches!(type_name, "boolean" | "bool" | "java.lang.Boolean" | "Boolean")
}

fn accessor_name(prefix: &str, property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => format!("{}{}{}", prefix, first.to_uppercase(), chars.as_str()),
        None => prefix.to_string(),
    }
}

/// Lowercase the first character: `FirstName` -> `firstName`.
pub fn decapitalize(name: &str) -> Option<String> {
    let mut chars = name.chars();
    let first = chars.next()?;
    Some(format!("{}{}", first.to_lowercase(), chars.as_str()))
}
