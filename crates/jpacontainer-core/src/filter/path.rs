//! Property path resolution.

use crate::criteria::CriteriaBuilder;
use crate::metadata::ClassMetadata;
use std::sync::Arc;
use tracing::trace;

/// Resolve a dotted property id into a builder path, one navigation step per
/// segment.
///
/// With class metadata at hand, collection-valued segments followed by further
/// segments are joined; a trailing collection is navigated to as a whole. The
/// walk continues with the metadata of embedded and referenced types. Without
/// metadata, or past a segment it does not describe, every step is a plain
/// attribute navigation.
pub fn resolve_path<B: CriteriaBuilder>(
    builder: &mut B,
    root: &B::Path,
    property_id: &str,
    metadata: Option<&Arc<ClassMetadata>>,
) -> B::Path {
    walk(builder, root, property_id, metadata, false)
}

/// Resolve a dotted property id like [`resolve_path`], joining the last
/// segment whatever its kind.
pub fn resolve_join<B: CriteriaBuilder>(
    builder: &mut B,
    root: &B::Path,
    property_id: &str,
    metadata: Option<&Arc<ClassMetadata>>,
) -> B::Path {
    walk(builder, root, property_id, metadata, true)
}

fn walk<B: CriteriaBuilder>(
    builder: &mut B,
    root: &B::Path,
    property_id: &str,
    metadata: Option<&Arc<ClassMetadata>>,
    join_last: bool,
) -> B::Path {
    let mut path = root.clone();
    let mut owner = metadata.cloned();

    let mut segments = property_id.split('.').peekable();
    while let Some(segment) = segments.next() {
        let last = segments.peek().is_none();
        if last && join_last {
            trace!(segment, "Joining final segment");
            return builder.join(&path, segment);
        }
        let property = owner.as_ref().and_then(|m| m.property(segment));
        let (next, next_owner) = match property {
            Some(p) if p.kind().is_collection() && !last => {
                trace!(segment, kind = %p.kind(), "Joining collection segment");
                (builder.join(&path, segment), None)
            }
            Some(p) => (builder.get(&path, segment), p.type_metadata()),
            None => (builder.get(&path, segment), None),
        };
        path = next;
        owner = next_owner;
    }
    path
}

/// Metadata of the type reached by a dotted property id, if it is described.
pub(crate) fn target_metadata(
    metadata: Option<&Arc<ClassMetadata>>,
    property_id: &str,
) -> Option<Arc<ClassMetadata>> {
    metadata?.nested_property(property_id)?.type_metadata()
}
