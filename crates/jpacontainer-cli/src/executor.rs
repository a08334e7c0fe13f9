//! Command execution.

use crate::formatter::Formatter;
use jpacontainer_core::{AccessType, AdvancedFilterableSupport, ContainerConfig, JpqlBuilder, MetadataFactory};
use jpacontainer_proto::Filter;
use thiserror::Error;

/// Execution errors.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// Metadata or conversion error.
    #[error(transparent)]
    Core(#[from] jpacontainer_core::Error),

    /// The filter JSON could not be read or parsed.
    #[error("invalid filter input: {0}")]
    FilterInput(String),
}

/// List described classes.
pub fn list_classes(factory: &MetadataFactory, formatter: &dyn Formatter) -> String {
    formatter.format_classes(&factory.registry().type_names())
}

/// Show class metadata.
///
/// Entities get their detected access type. Embeddables on their own have no
/// owner to inherit it from, so declared fields select field access.
pub fn show_metadata(
    factory: &MetadataFactory,
    class: &str,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let metadata = match factory.get_entity_class_metadata(class) {
        Ok(entity) => entity.into_class_metadata(),
        Err(jpacontainer_core::Error::NotAnEntity(_)) => {
            let descriptor = factory.registry().require(class)?;
            let access_type = if descriptor.fields.is_empty() {
                AccessType::Method
            } else {
                AccessType::Field
            };
            factory.get_class_metadata(class, access_type)?
        }
        Err(e) => return Err(e.into()),
    };
    Ok(formatter.format_metadata(&metadata))
}

/// Show the filterable properties derived for an entity.
pub fn show_filterable(
    factory: &MetadataFactory,
    class: &str,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let entity = factory.get_entity_class_metadata(class)?;
    let support = AdvancedFilterableSupport::<JpqlBuilder>::from_metadata(&entity, ContainerConfig::default());
    Ok(formatter.format_filterable(support.filterable_properties()))
}

/// Read a filter from inline JSON or from `@path`.
pub fn read_filter(input: &str) -> Result<Filter, ExecuteError> {
    let json = match input.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| ExecuteError::FilterInput(format!("{}: {}", path, e)))?,
        None => input.to_string(),
    };
    Filter::from_json(&json).map_err(|e| ExecuteError::FilterInput(e.to_string()))
}

/// Translate a filter into a query over an entity.
pub fn translate(
    factory: &MetadataFactory,
    class: &str,
    filter: Filter,
    config: ContainerConfig,
    formatter: &dyn Formatter,
) -> Result<String, ExecuteError> {
    let entity = factory.get_entity_class_metadata(class)?;
    let mut support = AdvancedFilterableSupport::<JpqlBuilder>::from_metadata(&entity, config);
    if !support.is_valid_filter(&filter) {
        tracing::warn!(filter = %filter, "Filter references non-filterable properties");
    }
    support.add_filter(filter)?;
    let query = support.build_query(entity.entity_name())?;
    Ok(formatter.format_query(&query))
}
