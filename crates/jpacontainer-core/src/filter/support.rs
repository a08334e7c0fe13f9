//! Filter state of a container.

use super::converter::{FilterConverter, FilterTranslator};
use crate::config::ContainerConfig;
use crate::criteria::{CriteriaBuilder, CriteriaQuery, JpqlBuilder};
use crate::error::Error;
use crate::metadata::class::MetadataCache;
use crate::metadata::{ClassMetadata, EntityClassMetadata};
use jpacontainer_proto::Filter;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Notified after the applied filters change.
pub trait FiltersAppliedListener: Send + Sync {
    /// Called with the filters now in effect.
    fn filters_applied(&self, applied: &[Filter]);
}

impl<F> FiltersAppliedListener for F
where
    F: Fn(&[Filter]) + Send + Sync,
{
    fn filters_applied(&self, applied: &[Filter]) {
        self(applied)
    }
}

/// Handle returned by [`AdvancedFilterableSupport::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Arc<dyn FiltersAppliedListener>)>,
}

/// Filters registered on a container, and their conversion into predicates.
///
/// With immediate application (the default) every change takes effect at once
/// and listeners are notified synchronously. Otherwise changes accumulate until
/// [`apply_filters`](Self::apply_filters) is called.
///
/// Filterability is advisory: [`is_valid_filter`](Self::is_valid_filter) reports
/// whether a filter only touches filterable properties, but conversion never
/// checks it unless `validate_filters_on_add` is configured.
pub struct AdvancedFilterableSupport<B: CriteriaBuilder = JpqlBuilder> {
    config: ContainerConfig,
    metadata: Option<Arc<ClassMetadata>>,
    /// Keeps the links of `metadata` resolvable.
    retained_cache: Option<Arc<MetadataCache>>,
    filterable: BTreeSet<String>,
    filters: Vec<Filter>,
    applied: Vec<Filter>,
    unapplied: bool,
    converters: Vec<Arc<dyn FilterConverter<B>>>,
    listeners: RwLock<Listeners>,
}

impl<B: CriteriaBuilder> AdvancedFilterableSupport<B> {
    /// Create an empty filter state.
    pub fn new(config: ContainerConfig) -> Self {
        Self {
            config,
            metadata: None,
            retained_cache: None,
            filterable: BTreeSet::new(),
            filters: Vec::new(),
            applied: Vec::new(),
            unapplied: false,
            converters: Vec::new(),
            listeners: RwLock::new(Listeners::default()),
        }
    }

    /// Create a filter state for an entity.
    ///
    /// Filterable properties default to the persistent, non-collection
    /// properties of the entity plus those one level down in embedded and
    /// referenced types (`address.city`, `manager.name`).
    pub fn from_metadata(metadata: &EntityClassMetadata, config: ContainerConfig) -> Self {
        let mut filterable = BTreeSet::new();
        for property in metadata.persistent_properties() {
            if property.kind().is_collection() {
                continue;
            }
            filterable.insert(property.name().to_string());
            if let Some(nested) = property.type_metadata() {
                for child in nested.persistent_properties() {
                    if !child.kind().is_collection() {
                        filterable.insert(format!("{}.{}", property.name(), child.name()));
                    }
                }
            }
        }
        debug!(
            entity = metadata.entity_name(),
            filterable = filterable.len(),
            "Filterable properties derived from metadata"
        );

        let mut support = Self::new(config).with_metadata(Arc::clone(metadata.as_class_metadata()));
        support.filterable = filterable;
        support.retained_cache = Some(Arc::clone(metadata.cache()));
        support
    }

    /// Use class metadata for path resolution.
    pub fn with_metadata(mut self, metadata: Arc<ClassMetadata>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The configuration.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// Metadata of the filtered class, if known.
    pub fn metadata(&self) -> Option<&Arc<ClassMetadata>> {
        self.metadata.as_ref()
    }

    /// Replace the set of filterable property ids.
    pub fn set_filterable_properties<I, S>(&mut self, properties: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable = properties.into_iter().map(Into::into).collect();
    }

    /// Filterable property ids.
    pub fn filterable_properties(&self) -> &BTreeSet<String> {
        &self.filterable
    }

    /// Check if a property id is filterable.
    pub fn is_filterable(&self, property_id: &str) -> bool {
        self.filterable.contains(property_id)
    }

    /// Check if every property the filter touches is filterable.
    ///
    /// Properties below a join filter are checked with the join property as
    /// prefix. Composites without leaves are valid.
    pub fn is_valid_filter(&self, filter: &Filter) -> bool {
        filter
            .property_ids()
            .iter()
            .all(|id| self.is_filterable(id))
    }

    /// Register a filter.
    pub fn add_filter(&mut self, filter: Filter) -> Result<(), Error> {
        if self.config.validate_filters_on_add && !self.is_valid_filter(&filter) {
            return Err(Error::InvalidFilter(format!(
                "{} references non-filterable properties",
                filter
            )));
        }
        debug!(filter = %filter, "Adding filter");
        self.filters.push(filter);
        self.filters_changed();
        Ok(())
    }

    /// Remove the first registered filter equal to `filter`.
    ///
    /// Returns false if no such filter was registered.
    pub fn remove_filter(&mut self, filter: &Filter) -> bool {
        let Some(index) = self.filters.iter().position(|f| f == filter) else {
            return false;
        };
        self.filters.remove(index);
        self.filters_changed();
        true
    }

    /// Remove every registered filter.
    pub fn remove_all_filters(&mut self) {
        self.filters.clear();
        self.filters_changed();
    }

    /// Registered filters, applied or not.
    pub fn get_filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Filters in effect.
    pub fn get_applied_filters(&self) -> &[Filter] {
        if self.config.apply_filters_immediately {
            &self.filters
        } else {
            &self.applied
        }
    }

    /// Put the registered filters into effect and notify listeners.
    pub fn apply_filters(&mut self) {
        self.applied = self.filters.clone();
        self.unapplied = false;
        debug!(filters = self.applied.len(), "Filters applied");
        self.fire_filters_applied();
    }

    /// Check if filter changes wait for [`apply_filters`](Self::apply_filters).
    pub fn has_unapplied_filters(&self) -> bool {
        self.unapplied
    }

    /// Check if filter changes are applied immediately.
    pub fn is_apply_filters_immediately(&self) -> bool {
        self.config.apply_filters_immediately
    }

    /// Switch immediate application. Pending changes are applied when it is
    /// switched on.
    pub fn set_apply_filters_immediately(&mut self, immediately: bool) {
        self.config.apply_filters_immediately = immediately;
        if immediately && self.unapplied {
            self.apply_filters();
        }
    }

    /// Register a listener for applied filter changes.
    pub fn add_listener(&self, listener: impl FiltersAppliedListener + 'static) -> ListenerId {
        let mut listeners = self.listeners.write();
        listeners.next_id += 1;
        let id = ListenerId(listeners.next_id);
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _)| *entry != id);
        listeners.entries.len() != before
    }

    /// Register a converter. Registered converters are consulted in
    /// registration order before the built-in translation.
    pub fn add_converter(&mut self, converter: impl FilterConverter<B> + 'static) {
        self.converters.push(Arc::new(converter));
    }

    /// Convert a filter into a predicate on `root`.
    pub fn convert_filter(
        &self,
        filter: &Filter,
        builder: &mut B,
        root: &B::Path,
    ) -> Result<B::Predicate, Error> {
        self.translator().convert(filter, builder, root)
    }

    /// Conjunction of the applied filters, `None` without filters.
    pub fn applied_predicate(
        &self,
        builder: &mut B,
        root: &B::Path,
    ) -> Result<Option<B::Predicate>, Error> {
        let translator = self.translator();
        match self.get_applied_filters() {
            [] => Ok(None),
            [single] => translator.convert(single, builder, root).map(Some),
            filters => {
                let predicates = translator.convert_all(filters, builder, root)?;
                Ok(Some(builder.and(predicates)))
            }
        }
    }

    fn translator(&self) -> FilterTranslator<'_, B> {
        FilterTranslator::new(&self.converters, self.metadata.clone())
    }

    fn filters_changed(&mut self) {
        if self.config.apply_filters_immediately {
            self.apply_filters();
        } else {
            self.unapplied = true;
        }
    }

    fn fire_filters_applied(&self) {
        // Snapshot so listeners may register or remove listeners.
        let listeners: Vec<_> = self
            .listeners
            .read()
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        let applied = self.get_applied_filters();
        for listener in listeners {
            listener.filters_applied(applied);
        }
    }
}

impl AdvancedFilterableSupport<JpqlBuilder> {
    /// Build a select query over `entity_name` restricted by the applied filters.
    pub fn build_query(&self, entity_name: &str) -> Result<CriteriaQuery, Error> {
        let mut builder = JpqlBuilder::with_config(entity_name, &self.config);
        let root = builder.root();
        let predicate = self.applied_predicate(&mut builder, &root)?;
        let query = builder.finish(predicate);
        debug!(query = %query, "Built query");
        Ok(query)
    }
}

impl<B: CriteriaBuilder> Default for AdvancedFilterableSupport<B> {
    fn default() -> Self {
        Self::new(ContainerConfig::default())
    }
}

impl<B: CriteriaBuilder> fmt::Debug for AdvancedFilterableSupport<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdvancedFilterableSupport")
            .field("config", &self.config)
            .field("filterable", &self.filterable)
            .field("filters", &self.filters)
            .field("applied", &self.applied)
            .field("unapplied", &self.unapplied)
            .field("converters", &self.converters.len())
            .field("listeners", &self.listeners.read().entries.len())
            .finish()
    }
}
