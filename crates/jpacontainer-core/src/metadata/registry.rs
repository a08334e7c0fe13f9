//! Registry of type descriptions consulted by the metadata factory.

use super::descriptor::TypeDescriptor;
use crate::error::Error;
use rkyv::{Archive, Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// The set of class descriptions known to a metadata factory.
#[derive(Debug, Clone, Default, PartialEq, Archive, Serialize, Deserialize)]
pub struct TypeRegistry {
    /// Type descriptions keyed by class name.
    pub types: HashMap<String, TypeDescriptor>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type description, replacing any description with the same name.
    pub fn with_type(mut self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Add a type description, replacing any description with the same name.
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Get a type description by class name.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// Get a type description, failing if it is unknown.
    pub fn require(&self, name: &str) -> Result<&TypeDescriptor, Error> {
        self.get(name)
            .ok_or_else(|| Error::UnknownType(name.to_string()))
    }

    /// Check if a class is described.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of described classes.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Class names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The described superclass of a class, if any.
    ///
    /// Superclasses outside the registry (such as the language's root
    /// object type) end the chain.
    pub fn superclass_of(&self, descriptor: &TypeDescriptor) -> Option<&TypeDescriptor> {
        descriptor
            .superclass
            .as_deref()
            .and_then(|name| self.get(name))
    }

    /// The class followed by its described superclasses, nearest first.
    ///
    /// Fails if the chain loops back onto a class already in it.
    pub fn superclass_chain<'a>(
        &'a self,
        descriptor: &'a TypeDescriptor,
    ) -> Result<Vec<&'a TypeDescriptor>, Error> {
        let mut chain = vec![descriptor];
        let mut current = descriptor;
        while let Some(parent) = self.superclass_of(current) {
            if chain.iter().any(|t| t.name == parent.name) {
                return Err(Error::InvalidDescriptor(format!(
                    "superclass cycle: {} extends {}",
                    current.name, parent.name
                )));
            }
            chain.push(parent);
            current = parent;
        }
        Ok(chain)
    }

    /// Check that every superclass chain terminates.
    pub fn validate(&self) -> Result<(), Error> {
        for name in self.type_names() {
            self.superclass_chain(self.require(name)?)?;
        }
        Ok(())
    }

    /// Parse a JSON array of type descriptions.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let descriptors: Vec<TypeDescriptor> =
            serde_json::from_str(json).map_err(|e| Error::Deserialization(e.to_string()))?;

        let mut registry = Self::new();
        for descriptor in descriptors {
            if registry.contains(&descriptor.name) {
                return Err(Error::InvalidDescriptor(format!(
                    "duplicate type description: {}",
                    descriptor.name
                )));
            }
            registry.register(descriptor);
        }
        registry.validate()?;
        Ok(registry)
    }

    /// Encode the registry as a JSON array, sorted by class name.
    pub fn to_json(&self) -> Result<String, Error> {
        let descriptors: Vec<&TypeDescriptor> = self
            .type_names()
            .into_iter()
            .filter_map(|name| self.get(name))
            .collect();
        serde_json::to_string_pretty(&descriptors).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Load type descriptions from a file.
    ///
    /// Files ending in `.json` are parsed as JSON, anything else as a binary
    /// snapshot written by [`TypeRegistry::to_bytes`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let registry = if path.extension().is_some_and(|ext| ext == "json") {
            let json = String::from_utf8(bytes).map_err(|e| Error::Deserialization(e.to_string()))?;
            Self::from_json(&json)?
        } else {
            Self::from_bytes(&bytes)?
        };
        debug!(path = %path.display(), types = registry.len(), "Loaded type registry");
        Ok(registry)
    }

    /// Serialize the registry to a binary snapshot.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a registry from a binary snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        // Archived maps need aligned storage; file contents carry no guarantee.
        let mut aligned = rkyv::util::AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        let registry = rkyv::from_bytes::<Self, rkyv::rancor::Error>(&aligned)
            .map_err(|e| Error::Deserialization(e.to_string()))?;
        registry.validate()?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::descriptor::{AnnotationKind, FieldDescriptor};

    fn sample_registry() -> TypeRegistry {
        TypeRegistry::new()
            .with_type(
                TypeDescriptor::mapped_superclass("com.example.Base")
                    .with_field(FieldDescriptor::new("id", "long").annotated(AnnotationKind::Id)),
            )
            .with_type(
                TypeDescriptor::entity("com.example.Person")
                    .extends("com.example.Base")
                    .with_field(FieldDescriptor::new("name", "String")),
            )
    }

    #[test]
    fn test_lookup() {
        let registry = sample_registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("com.example.Person"));
        assert!(registry.require("com.example.Missing").is_err());
        assert_eq!(
            registry.type_names(),
            vec!["com.example.Base", "com.example.Person"]
        );
    }

    #[test]
    fn test_superclass_chain_ends_outside_registry() {
        let registry = sample_registry().with_type(
            TypeDescriptor::mapped_superclass("com.example.Base").extends("java.lang.Object"),
        );
        let person = registry.get("com.example.Person").unwrap();
        let base = registry.superclass_of(person).unwrap();
        assert_eq!(base.name, "com.example.Base");
        assert!(registry.superclass_of(base).is_none());
    }

    #[test]
    fn test_json_roundtrip() {
        let registry = sample_registry();
        let json = registry.to_json().unwrap();
        assert_eq!(TypeRegistry::from_json(&json).unwrap(), registry);
    }

    #[test]
    fn test_json_defaults() {
        let json = r#"[
            {
                "name": "com.example.Tag",
                "annotations": [{"kind": "Entity"}],
                "fields": [
                    {"name": "id", "type_name": "long", "annotations": [{"kind": "Id"}]},
                    {"name": "label", "type_name": "String"}
                ]
            }
        ]"#;
        let registry = TypeRegistry::from_json(json).unwrap();
        let tag = registry.get("com.example.Tag").unwrap();
        assert!(tag.superclass.is_none());
        assert!(tag.methods.is_empty());
        assert!(!tag.fields[1].modifiers.is_static);
    }

    #[test]
    fn test_json_rejects_duplicates() {
        let json = r#"[{"name": "A"}, {"name": "A"}]"#;
        assert!(matches!(
            TypeRegistry::from_json(json),
            Err(Error::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_superclass_chain_order() {
        let registry = sample_registry();
        let person = registry.get("com.example.Person").unwrap();
        let names: Vec<&str> = registry
            .superclass_chain(person)
            .unwrap()
            .into_iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, vec!["com.example.Person", "com.example.Base"]);
    }

    #[test]
    fn test_superclass_cycles_rejected() {
        let mutual = r#"[
            {"name": "A", "superclass": "B", "annotations": [{"kind": "Entity"}]},
            {"name": "B", "superclass": "A", "annotations": [{"kind": "MappedSuperclass"}]}
        ]"#;
        let err = TypeRegistry::from_json(mutual).unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor(ref m) if m.contains("cycle")));
        assert!(err.is_argument_error());

        let own = r#"[{"name": "A", "superclass": "A"}]"#;
        assert!(matches!(
            TypeRegistry::from_json(own),
            Err(Error::InvalidDescriptor(_))
        ));

        // Registries assembled in code are checked on demand.
        let registry = TypeRegistry::new()
            .with_type(TypeDescriptor::entity("A").extends("B"))
            .with_type(TypeDescriptor::mapped_superclass("B").extends("A"));
        assert!(matches!(registry.validate(), Err(Error::InvalidDescriptor(_))));
        let bytes = registry.to_bytes().unwrap();
        assert!(matches!(
            TypeRegistry::from_bytes(&bytes),
            Err(Error::InvalidDescriptor(_))
        ));
    }

    #[test]
    fn test_binary_roundtrip() {
        let registry = sample_registry();
        let bytes = registry.to_bytes().unwrap();
        assert_eq!(TypeRegistry::from_bytes(&bytes).unwrap(), registry);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = sample_registry();

        let json_path = dir.path().join("types.json");
        std::fs::write(&json_path, registry.to_json().unwrap()).unwrap();
        assert_eq!(TypeRegistry::load(&json_path).unwrap(), registry);

        let bin_path = dir.path().join("types.bin");
        std::fs::write(&bin_path, registry.to_bytes().unwrap()).unwrap();
        assert_eq!(TypeRegistry::load(&bin_path).unwrap(), registry);

        assert!(matches!(
            TypeRegistry::load(dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
