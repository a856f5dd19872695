//! Entity types: compiled schemas bound to a storage adapter.

use crate::accessor::Accessors;
use crate::config::DEFAULT_DATA_PREFIX;
use crate::error::{ModelError, ModelResult, ValidationError};
use crate::index::{collect_indices, extract_indices, IndexDescriptor, IndexHandlerRegistry};
use crate::pipeline::{DefaultProvider, Pipelines};
use crate::schema::{
    is_identifier, normalize_schema, Hook, HookBinding, LifecycleHook, OnUnsaved, RawSchema,
    Schema,
};
use crate::types::{Capabilities, CompareOp};
use odem_storage::{MemoryAdapter, StorageAdapter};
use odem_types::{ItemId, PropertyBag, Record, Value};
use std::fmt;
use std::sync::{Arc, LazyLock, OnceLock};
use tracing::{debug, trace};

const UUID_PLACEHOLDER: &str = "%u";
const ROOT_NAME: &str = "Model";

static DEFAULT_ADAPTER: LazyLock<Arc<dyn StorageAdapter>> =
    LazyLock::new(|| Arc::new(MemoryAdapter::new()));

static ROOT: LazyLock<Arc<EntityType>> = LazyLock::new(|| {
    let context = CompileContext::default();
    Arc::new(EntityType {
        name: ROOT_NAME.to_string(),
        schema: Schema::default(),
        adapter: Arc::clone(&context.adapter),
        derives_from: None,
        indices: Vec::new(),
        pipelines: Pipelines::default(),
        accessors: Accessors::default(),
        data_key: context.data_key_template(ROOT_NAME),
        default_on_unsaved: context.on_unsaved,
        observed: OnceLock::new(),
    })
});

/// The process-wide adapter used when neither a type nor a registry
/// provides one.
pub fn default_adapter() -> Arc<dyn StorageAdapter> {
    Arc::clone(&DEFAULT_ADAPTER)
}

/// Settings applied to every type compiled with them.
#[derive(Debug, Clone)]
pub struct CompileContext {
    /// First segment of data keys.
    pub data_prefix: String,
    /// Conflict policy of types not declaring `onUnsaved`.
    pub on_unsaved: OnUnsaved,
    /// Adapter of types compiled without an explicit one.
    pub adapter: Arc<dyn StorageAdapter>,
}

impl Default for CompileContext {
    fn default() -> Self {
        Self {
            data_prefix: DEFAULT_DATA_PREFIX.to_string(),
            on_unsaved: OnUnsaved::default(),
            adapter: default_adapter(),
        }
    }
}

impl CompileContext {
    fn data_key_template(&self, name: &str) -> String {
        format!("{}/{name}/items/{UUID_PLACEHOLDER}", self.data_prefix)
    }
}

/// A compiled entity type.
///
/// Immutable once compiled, apart from the index contents and the
/// observed-adapter slot.
pub struct EntityType {
    name: String,
    schema: Schema,
    adapter: Arc<dyn StorageAdapter>,
    derives_from: Option<Arc<EntityType>>,
    indices: Vec<IndexDescriptor>,
    pipelines: Pipelines,
    accessors: Accessors,
    data_key: String,
    default_on_unsaved: OnUnsaved,
    observed: OnceLock<Arc<dyn StorageAdapter>>,
}

/// Compiles an entity type using the process-wide defaults.
///
/// `base` defaults to the abstract root type, `adapter` to the process-wide
/// memory adapter.
pub fn compile_model(
    name: &str,
    schema: RawSchema,
    base: Option<Arc<EntityType>>,
    adapter: Option<Arc<dyn StorageAdapter>>,
) -> ModelResult<Arc<EntityType>> {
    compile_with(&CompileContext::default(), name, schema, base, adapter)
}

/// Compiles an entity type.
///
/// Fails with [`ModelError::Definition`] listing every problem found; no
/// partially built type is ever returned.
pub fn compile_with(
    context: &CompileContext,
    name: &str,
    raw: RawSchema,
    base: Option<Arc<EntityType>>,
    adapter: Option<Arc<dyn StorageAdapter>>,
) -> ModelResult<Arc<EntityType>> {
    let mut errors = Vec::new();
    if !is_identifier(name) {
        errors.push(format!("invalid model name {name:?}"));
    }

    let base = base.unwrap_or_else(EntityType::root);
    if !base.is_root() && !base.derives_from_root() {
        errors.push(format!("base type {} does not derive from {ROOT_NAME}", base.name));
    }
    let is_derived = !base.is_root();
    let adapter = adapter.unwrap_or_else(|| Arc::clone(&context.adapter));

    let registry = IndexHandlerRegistry::standard();
    let normalized = normalize_schema(name, raw, &base.schema, is_derived, &mut errors);
    let own_indices = collect_indices(
        &normalized.schema,
        &normalized.indices,
        &base.schema,
        registry,
        &mut errors,
    );

    let definition_error = |errors: Vec<String>| ModelError::Definition {
        model: name.to_string(),
        errors,
    };
    if !errors.is_empty() {
        return Err(definition_error(errors));
    }

    let schema = Schema::merged(&base.schema, &normalized.schema);
    let indices = extract_indices(&base.indices, own_indices, &normalized.schema, registry)
        .map_err(|err| definition_error(vec![err]))?;
    let pipelines = Pipelines::compile(&schema.props);
    let accessors = Accessors::build(&schema);

    debug!(
        model = name,
        base = %base.name,
        props = schema.props.len(),
        computed = schema.computed.len(),
        methods = schema.methods.len(),
        indices = indices.len(),
        "compiled model"
    );

    Ok(Arc::new(EntityType {
        name: name.to_string(),
        schema,
        adapter,
        derives_from: Some(base),
        indices,
        pipelines,
        accessors,
        data_key: context.data_key_template(name),
        default_on_unsaved: context.on_unsaved,
        observed: OnceLock::new(),
    }))
}

impl EntityType {
    /// The abstract type every entity type derives from.
    pub fn root() -> Arc<EntityType> {
        Arc::clone(&ROOT)
    }

    pub fn is_root(&self) -> bool {
        std::ptr::eq(self, Arc::as_ptr(&*ROOT))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The merged schema, own entries overriding inherited ones.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn adapter(&self) -> &Arc<dyn StorageAdapter> {
        &self.adapter
    }

    pub fn derives_from(&self) -> Option<&Arc<EntityType>> {
        self.derives_from.as_ref()
    }

    /// Tests whether `other` is a direct or transitive base of this type.
    pub fn derives_from_type(&self, other: &EntityType) -> bool {
        let mut current = self.derives_from.as_deref();
        while let Some(base) = current {
            if std::ptr::eq(base, other) {
                return true;
            }
            current = base.derives_from.as_deref();
        }
        false
    }

    fn derives_from_root(&self) -> bool {
        self.derives_from_type(&ROOT)
    }

    pub fn indices(&self) -> &[IndexDescriptor] {
        &self.indices
    }

    pub fn pipelines(&self) -> &Pipelines {
        &self.pipelines
    }

    pub fn accessors(&self) -> &Accessors {
        &self.accessors
    }

    /// Conflict policy declared by the schema or inherited, falling back to
    /// the one the type was compiled with.
    pub fn on_unsaved(&self) -> OnUnsaved {
        self.schema
            .options
            .on_unsaved
            .unwrap_or(self.default_on_unsaved)
    }

    /// Hook bound to items for `event`, if declared.
    pub fn hook(&self, event: LifecycleHook) -> Option<&Hook> {
        self.bound_hook(event, HookBinding::Instance)
    }

    /// Hook bound to the type itself for `event`, if declared.
    pub fn static_hook(&self, event: LifecycleHook) -> Option<&Hook> {
        self.bound_hook(event, HookBinding::Type)
    }

    fn bound_hook(&self, event: LifecycleHook, binding: HookBinding) -> Option<&Hook> {
        self.schema
            .hooks
            .get(&event)
            .filter(|_| event.binding() == binding)
    }

    pub fn coerce_properties(&self, bag: &mut PropertyBag, defaults: Option<DefaultProvider<'_>>) {
        self.pipelines.coerce(bag, defaults);
    }

    pub fn validate_properties(&self, bag: &PropertyBag, errors: &mut Vec<ValidationError>) {
        self.pipelines.validate_into(bag, errors);
    }

    pub fn serialize_properties(&self, bag: &PropertyBag, capabilities: Capabilities) -> Record {
        self.pipelines.serialize(bag, capabilities)
    }

    pub fn deserialize_properties(&self, record: &Record) -> PropertyBag {
        self.pipelines.deserialize(record)
    }

    /// Current value of a property or computed property of `bag`.
    pub fn property_value(&self, name: &str, bag: &PropertyBag) -> Option<Value> {
        if self.schema.props.contains(name) {
            return Some(bag.get(name).cloned().unwrap_or_default());
        }
        self.schema.computed.get(name).map(|def| def.read(bag))
    }

    /// Key of the record of item `uuid`.
    pub fn data_key(&self, uuid: ItemId) -> String {
        self.data_key.replace(UUID_PLACEHOLDER, &uuid.to_string())
    }

    /// Key below which all records of this type are stored.
    pub fn items_prefix(&self) -> &str {
        self.data_key
            .strip_suffix(UUID_PLACEHOLDER)
            .map_or(self.data_key.as_str(), |prefix| prefix.trim_end_matches('/'))
    }

    /// Extracts the item UUID from a data key of this type.
    pub fn key_to_uuid(&self, key: &str) -> Option<ItemId> {
        let (head, tail) = self.data_key.split_once(UUID_PLACEHOLDER)?;
        let id = key.strip_prefix(head)?.strip_suffix(tail)?;
        ItemId::parse(id).ok()
    }

    /// Records the values of item `uuid` in every index.
    pub fn update_indices(&self, uuid: ItemId, bag: &PropertyBag) {
        for descriptor in &self.indices {
            let value = self
                .property_value(descriptor.property(), bag)
                .unwrap_or_default();
            descriptor
                .handler
                .insert(uuid, descriptor.definition.reduce(&value));
        }
        trace!(model = %self.name, %uuid, "updated indices");
    }

    pub fn remove_from_indices(&self, uuid: ItemId) {
        for descriptor in &self.indices {
            descriptor.handler.remove(uuid);
        }
    }

    /// Looks up items through the index of `property` for `op`.
    pub fn find_by_index(
        &self,
        property: &str,
        op: CompareOp,
        operands: &[Value],
    ) -> ModelResult<Vec<ItemId>> {
        let descriptor = self
            .indices
            .iter()
            .find(|descriptor| descriptor.property() == property && descriptor.op() == op)
            .ok_or_else(|| {
                ModelError::Index(format!("model {} has no {op} index on {property}", self.name))
            })?;
        if operands.len() < op.arity() {
            return Err(ModelError::Index(format!(
                "{op} lookup on {property} needs {} operand(s)",
                op.arity()
            )));
        }
        Ok(descriptor.handler.find(operands))
    }

    /// Rebuilds every index from the records stored for this type, read
    /// through the observed adapter. Returns the number of items indexed.
    pub async fn index_existing(&self) -> ModelResult<usize> {
        let adapter = self.observed_adapter();
        for descriptor in &self.indices {
            descriptor.handler.clear();
        }

        let mut count = 0;
        for key in adapter.keys(self.items_prefix()).await? {
            let Some(uuid) = self.key_to_uuid(&key) else {
                continue;
            };
            let record = adapter.read(&key).await?;
            let bag = self.deserialize_properties(&record);
            self.update_indices(uuid, &bag);
            count += 1;
        }

        debug!(model = %self.name, items = count, "indexed existing items");
        Ok(count)
    }

    /// Binds the adapter whose records the indices reflect. Can be done once.
    pub fn observe_adapter(&self, adapter: Arc<dyn StorageAdapter>) -> ModelResult<()> {
        self.observed
            .set(adapter)
            .map_err(|_| ModelError::AdapterBound {
                model: self.name.clone(),
            })
    }

    /// The observed adapter, or the type's own adapter if none was bound.
    pub fn observed_adapter(&self) -> Arc<dyn StorageAdapter> {
        Arc::clone(self.observed.get().unwrap_or(&self.adapter))
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field(
                "derives_from",
                &self.derives_from.as_ref().map(|base| base.name.as_str()),
            )
            .field("props", &self.schema.props.names().collect::<Vec<_>>())
            .field("indices", &self.indices)
            .field("adapter", &self.adapter.name())
            .field("data_key", &self.data_key)
            .finish()
    }
}
