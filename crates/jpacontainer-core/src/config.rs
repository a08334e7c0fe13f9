//! Container configuration.

/// Default for applying filter changes as soon as they are made.
pub const DEFAULT_APPLY_FILTERS_IMMEDIATELY: bool = true;

/// Default for rejecting non-filterable filters in `add_filter`.
pub const DEFAULT_VALIDATE_FILTERS_ON_ADD: bool = false;

/// Default alias of the query root entity.
pub const DEFAULT_ROOT_ALIAS: &str = "e";

/// Default prefix of generated query parameter names.
pub const DEFAULT_PARAMETER_PREFIX: &str = "p";

/// Filtering and query-building configuration of one container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Apply every filter change immediately and notify listeners.
    pub apply_filters_immediately: bool,

    /// Reject filters on non-filterable properties when they are added.
    pub validate_filters_on_add: bool,

    /// Alias of the root entity in generated queries.
    pub root_alias: String,

    /// Prefix of generated parameter names (`:p1`, `:p2`, ...).
    pub parameter_prefix: String,
}

impl ContainerConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            apply_filters_immediately: DEFAULT_APPLY_FILTERS_IMMEDIATELY,
            validate_filters_on_add: DEFAULT_VALIDATE_FILTERS_ON_ADD,
            root_alias: DEFAULT_ROOT_ALIAS.to_string(),
            parameter_prefix: DEFAULT_PARAMETER_PREFIX.to_string(),
        }
    }

    /// Set whether filter changes are applied immediately.
    pub fn with_apply_filters_immediately(mut self, immediately: bool) -> Self {
        self.apply_filters_immediately = immediately;
        self
    }

    /// Set whether filters are validated when added.
    pub fn with_validate_filters_on_add(mut self, validate: bool) -> Self {
        self.validate_filters_on_add = validate;
        self
    }

    /// Set the root alias.
    pub fn with_root_alias(mut self, alias: impl Into<String>) -> Self {
        self.root_alias = alias.into();
        self
    }

    /// Set the parameter name prefix.
    pub fn with_parameter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.parameter_prefix = prefix.into();
        self
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ContainerConfig::default();
        assert!(config.apply_filters_immediately);
        assert!(!config.validate_filters_on_add);
        assert_eq!(config.root_alias, "e");
        assert_eq!(config.parameter_prefix, "p");
    }

    #[test]
    fn test_builder_pattern() {
        let config = ContainerConfig::new()
            .with_apply_filters_immediately(false)
            .with_validate_filters_on_add(true)
            .with_root_alias("root")
            .with_parameter_prefix("arg");

        assert!(!config.apply_filters_immediately);
        assert!(config.validate_filters_on_add);
        assert_eq!(config.root_alias, "root");
        assert_eq!(config.parameter_prefix, "arg");
    }
}
