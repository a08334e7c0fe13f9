//! Output formatters.

use clap::ValueEnum;
use comfy_table::{Cell, Table};
use jpacontainer_core::metadata::{PropertyAccess, PropertyMetadata};
use jpacontainer_core::{ClassMetadata, CriteriaQuery};
use std::collections::BTreeSet;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format the list of described classes.
    fn format_classes(&self, classes: &[&str]) -> String;

    /// Format class metadata.
    fn format_metadata(&self, metadata: &ClassMetadata) -> String;

    /// Format filterable property ids.
    fn format_filterable(&self, properties: &BTreeSet<String>) -> String;

    /// Format a translated query.
    fn format_query(&self, query: &CriteriaQuery) -> String;

    /// Format a simple message.
    fn format_message(&self, message: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Properties sorted by name.
fn sorted_properties(metadata: &ClassMetadata) -> Vec<&PropertyMetadata> {
    let mut properties: Vec<_> = metadata.properties().collect();
    properties.sort_by(|a, b| a.name().cmp(b.name()));
    properties
}

fn role(metadata: &ClassMetadata, property: &PropertyMetadata) -> &'static str {
    let is = |p: Option<&PropertyMetadata>| p.is_some_and(|p| p.name() == property.name());
    if is(metadata.identifier_property()) {
        "identifier"
    } else if is(metadata.version_property()) {
        "version"
    } else {
        ""
    }
}

fn access(property: &PropertyMetadata) -> String {
    match property.access() {
        PropertyAccess::Field { field } => format!("field {}", field),
        PropertyAccess::Accessor { getter, setter } => match setter {
            Some(setter) => format!("{}/{}", getter, setter),
            None => getter.clone(),
        },
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_classes(&self, classes: &[&str]) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Class"]);
        for class in classes {
            table.add_row(vec![*class]);
        }
        table.to_string()
    }

    fn format_metadata(&self, metadata: &ClassMetadata) -> String {
        let title = match metadata.entity_name() {
            Some(name) => format!("Entity {} ({}, {} access)", name, metadata.mapped_class(), metadata.access_type()),
            None => format!("Embeddable {} ({} access)", metadata.mapped_class(), metadata.access_type()),
        };

        let mut table = Table::new();
        table.set_header(vec!["Property", "Type", "Kind", "Access", "Writable", "Role"]);
        for property in sorted_properties(metadata) {
            table.add_row(vec![
                Cell::new(property.name()),
                Cell::new(property.type_name()),
                Cell::new(property.kind()),
                Cell::new(access(property)),
                Cell::new(if property.is_writable() { "yes" } else { "no" }),
                Cell::new(role(metadata, property)),
            ]);
        }

        format!("{}\n{}", title, table)
    }

    fn format_filterable(&self, properties: &BTreeSet<String>) -> String {
        let mut table = Table::new();
        table.set_header(vec!["Filterable property"]);
        for property in properties {
            table.add_row(vec![property]);
        }
        table.to_string()
    }

    fn format_query(&self, query: &CriteriaQuery) -> String {
        if query.parameters.is_empty() {
            return query.to_string();
        }

        let mut table = Table::new();
        table.set_header(vec!["Parameter", "Value"]);
        for (name, value) in &query.parameters {
            table.add_row(vec![Cell::new(format!(":{}", name)), Cell::new(value)]);
        }
        format!("{}\n{}", query, table)
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_classes(&self, classes: &[&str]) -> String {
        serde_json::to_string_pretty(classes).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_metadata(&self, metadata: &ClassMetadata) -> String {
        let properties: Vec<serde_json::Value> = sorted_properties(metadata)
            .into_iter()
            .map(|p| {
                serde_json::json!({
                    "name": p.name(),
                    "type": p.type_name(),
                    "kind": p.kind().to_string(),
                    "access": access(p),
                    "writable": p.is_writable(),
                })
            })
            .collect();

        let json = serde_json::json!({
            "class": metadata.mapped_class(),
            "entity_name": metadata.entity_name(),
            "access_type": metadata.access_type().to_string(),
            "identifier": metadata.identifier_property().map(|p| p.name()),
            "version": metadata.version_property().map(|p| p.name()),
            "properties": properties,
        });
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_filterable(&self, properties: &BTreeSet<String>) -> String {
        serde_json::to_string_pretty(properties).unwrap_or_else(|_| "[]".to_string())
    }

    fn format_query(&self, query: &CriteriaQuery) -> String {
        let parameters: serde_json::Map<String, serde_json::Value> = query
            .parameters
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
                )
            })
            .collect();

        serde_json::json!({
            "jpql": query.to_string(),
            "parameters": parameters,
        })
        .to_string()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({ "message": message }).to_string()
    }
}
