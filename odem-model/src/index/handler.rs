use super::IndexDefinition;
use crate::types::{CompareOp, TypeRef};
use odem_types::{ItemId, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::trace;

/// Maintains the values of one index and answers lookups on it.
pub trait IndexHandler: Send + Sync + fmt::Debug {
    /// Operation the index answers.
    fn op(&self) -> CompareOp;

    /// Records `value` for `uuid`, replacing any earlier value.
    fn insert(&self, uuid: ItemId, value: Value);

    fn remove(&self, uuid: ItemId);

    /// Items whose value satisfies the operation with `operands`.
    fn find(&self, operands: &[Value]) -> Vec<ItemId>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

/// Creates handlers for one operation.
pub trait IndexHandlerFactory: Send + Sync {
    fn create(&self, definition: &IndexDefinition) -> Arc<dyn IndexHandler>;
}

/// Index handler keeping `(value, uuid)` pairs sorted by the type's order.
#[derive(Debug)]
pub struct SortedIndex {
    op: CompareOp,
    handler_type: TypeRef,
    entries: RwLock<Vec<(Value, ItemId)>>,
}

impl SortedIndex {
    pub fn new(op: CompareOp, handler_type: TypeRef) -> Self {
        Self {
            op,
            handler_type,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Snapshot of the entries in index order.
    pub fn entries(&self) -> Vec<(Value, ItemId)> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl IndexHandler for SortedIndex {
    fn op(&self) -> CompareOp {
        self.op
    }

    fn insert(&self, uuid: ItemId, value: Value) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|(_, known)| *known != uuid);
        let at = entries.partition_point(|(known, id)| {
            match self.handler_type.sort(known, &value) {
                std::cmp::Ordering::Less => true,
                std::cmp::Ordering::Equal => *id < uuid,
                std::cmp::Ordering::Greater => false,
            }
        });
        trace!(%uuid, op = %self.op, "index insert");
        entries.insert(at, (value, uuid));
    }

    fn remove(&self, uuid: ItemId) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(_, known)| *known != uuid);
    }

    fn find(&self, operands: &[Value]) -> Vec<ItemId> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(value, _)| self.handler_type.compare(value, self.op, operands))
            .map(|(_, uuid)| *uuid)
            .collect()
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

struct SortedIndexFactory;

impl IndexHandlerFactory for SortedIndexFactory {
    fn create(&self, definition: &IndexDefinition) -> Arc<dyn IndexHandler> {
        Arc::new(SortedIndex::new(definition.op, definition.handler_type))
    }
}

/// Index handler factories by operation name.
pub struct IndexHandlerRegistry {
    factories: BTreeMap<&'static str, Arc<dyn IndexHandlerFactory>>,
}

static STANDARD: LazyLock<IndexHandlerRegistry> = LazyLock::new(IndexHandlerRegistry::new);

impl IndexHandlerRegistry {
    fn new() -> Self {
        let sorted: Arc<dyn IndexHandlerFactory> = Arc::new(SortedIndexFactory);
        let factories = [
            CompareOp::Eq,
            CompareOp::NotEq,
            CompareOp::Lt,
            CompareOp::Lte,
            CompareOp::Gt,
            CompareOp::Gte,
            CompareOp::Between,
        ]
        .into_iter()
        .map(|op| (op.name(), Arc::clone(&sorted)))
        .collect();
        Self { factories }
    }

    /// The process-wide registry of built-in index operations.
    pub fn standard() -> &'static Self {
        &STANDARD
    }

    pub fn has(&self, op: &str) -> bool {
        self.factories.contains_key(op)
    }

    pub fn select(&self, op: &str) -> Option<Arc<dyn IndexHandlerFactory>> {
        self.factories.get(op).cloned()
    }

    /// Names of the supported operations.
    pub fn ops(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl fmt::Debug for IndexHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
