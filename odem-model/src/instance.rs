//! Items of an entity type and their load/save/remove lifecycle.

use crate::accessor::Accessor;
use crate::error::{ModelError, ModelResult, ValidationError};
use crate::model::EntityType;
use crate::pipeline::DefaultProvider;
use crate::schema::{LifecycleHook, OnUnsaved, PropertyDef};
use crate::types::Capabilities;
use odem_storage::StorageAdapter;
use odem_types::{ItemId, PropertyBag, Value};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-item overrides of the entity type's settings.
#[derive(Clone, Default)]
pub struct InstanceOptions {
    pub adapter: Option<Arc<dyn StorageAdapter>>,
    pub on_unsaved: Option<OnUnsaved>,
}

impl fmt::Debug for InstanceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceOptions")
            .field("adapter", &self.adapter.as_ref().map(|adapter| adapter.name()))
            .field("on_unsaved", &self.on_unsaved)
            .finish()
    }
}

/// Properties written since the last load or save.
#[derive(Debug, Clone, Default)]
struct ChangeTracker {
    changed: BTreeSet<String>,
    has_changed: bool,
}

impl ChangeTracker {
    fn mark(&mut self, name: &str) {
        self.changed.insert(name.to_string());
        self.has_changed = true;
    }

    fn clear(&mut self) {
        self.changed.clear();
        self.has_changed = false;
    }
}

/// One item of an entity type.
#[derive(Debug)]
pub struct Instance {
    model: Arc<EntityType>,
    uuid: Option<ItemId>,
    properties: PropertyBag,
    changes: ChangeTracker,
    loaded: Option<ModelResult<()>>,
    options: InstanceOptions,
}

fn schema_default(_: &str, def: &PropertyDef) -> Option<Value> {
    def.default.clone()
}

impl Instance {
    /// Creates an item without identity. It gets one on its first save.
    pub fn new(model: Arc<EntityType>) -> Self {
        Self::with_options(model, None, InstanceOptions::default())
    }

    /// Creates an item bound to the identity given as UUID value.
    pub fn with_uuid(model: Arc<EntityType>, uuid: impl Into<Value>) -> ModelResult<Self> {
        let value = uuid.into();
        let uuid = ItemId::normalize(&value).ok_or_else(|| ModelError::InvalidUuid {
            model: model.name().to_string(),
            value: crate::types::display(&value),
        })?;
        Ok(Self::with_options(model, Some(uuid), InstanceOptions::default()))
    }

    pub fn with_options(
        model: Arc<EntityType>,
        uuid: Option<ItemId>,
        options: InstanceOptions,
    ) -> Self {
        let mut properties = PropertyBag::new();
        let defaults: DefaultProvider<'_> = &schema_default;
        model.coerce_properties(&mut properties, Some(defaults));
        Self {
            model,
            uuid,
            properties,
            changes: ChangeTracker::default(),
            loaded: None,
            options,
        }
    }

    pub fn model(&self) -> &Arc<EntityType> {
        &self.model
    }

    pub fn uuid(&self) -> Option<ItemId> {
        self.uuid
    }

    pub fn is_bound(&self) -> bool {
        self.uuid.is_some()
    }

    /// Whether the last load succeeded or the item was saved since.
    pub fn is_loaded(&self) -> bool {
        matches!(self.loaded, Some(Ok(())))
    }

    pub fn has_changed(&self) -> bool {
        self.changes.has_changed
    }

    /// Names of the properties written since the last load or save.
    pub fn changed(&self) -> impl Iterator<Item = &str> {
        self.changes.changed.iter().map(String::as_str)
    }

    pub fn properties(&self) -> &PropertyBag {
        &self.properties
    }

    /// Data key of the item's record, if bound.
    pub fn data_key(&self) -> Option<String> {
        self.uuid.map(|uuid| self.model.data_key(uuid))
    }

    fn adapter(&self) -> Arc<dyn StorageAdapter> {
        Arc::clone(self.options.adapter.as_ref().unwrap_or(self.model.adapter()))
    }

    fn on_unsaved(&self) -> OnUnsaved {
        self.options.on_unsaved.unwrap_or_else(|| self.model.on_unsaved())
    }

    fn bound_uuid(&self) -> ModelResult<ItemId> {
        self.uuid.ok_or_else(|| ModelError::NotBound {
            model: self.model.name().to_string(),
        })
    }

    fn unknown(&self, name: &str) -> ModelError {
        ModelError::UnknownProperty {
            model: self.model.name().to_string(),
            name: name.to_string(),
        }
    }

    /// Reads a property, computed property or the item's `uuid`.
    pub fn get(&self, name: &str) -> ModelResult<Value> {
        if name == "uuid" {
            return Ok(self.uuid.map_or(Value::Null, Value::from));
        }
        match self.model.accessors().get(name) {
            Some(Accessor::Property(_) | Accessor::Computed(_)) => Ok(self
                .model
                .property_value(name, &self.properties)
                .unwrap_or_default()),
            _ => Err(self.unknown(name)),
        }
    }

    /// Writes a property or computed property. The value is coerced
    /// immediately.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let model = Arc::clone(&self.model);
        match model.accessors().get(name) {
            Some(Accessor::Property(def)) => {
                let coerced = def.handler().coerce(&value.into(), def, None);
                if self.properties.get(name) != Some(&coerced) {
                    self.properties.insert(name.to_string(), coerced);
                    self.changes.mark(name);
                }
                Ok(())
            }
            Some(Accessor::Computed(def)) => {
                let before = self.properties.clone();
                def.write(&mut self.properties, value.into());
                model.coerce_properties(&mut self.properties, None);
                for (prop, _) in model.schema().props.iter() {
                    if before.get(prop) != self.properties.get(prop) {
                        self.changes.mark(prop);
                    }
                }
                Ok(())
            }
            Some(Accessor::Method(_) | Accessor::Hook(_)) => Err(ModelError::ReadOnly {
                model: model.name().to_string(),
                name: name.to_string(),
            }),
            None if name == "uuid" => Err(ModelError::ReadOnly {
                model: model.name().to_string(),
                name: name.to_string(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    /// Invokes a method of the item.
    pub fn call(&mut self, name: &str, args: &[Value]) -> ModelResult<Value> {
        let model = Arc::clone(&self.model);
        match model.accessors().get(name) {
            Some(Accessor::Method(method)) => method.call(self, args),
            Some(_) => Err(ModelError::NotAMethod {
                model: model.name().to_string(),
                name: name.to_string(),
            }),
            None => Err(self.unknown(name)),
        }
    }

    fn run_hook(&mut self, event: LifecycleHook) -> ModelResult<()> {
        let model = Arc::clone(&self.model);
        match model.hook(event) {
            Some(hook) => hook.call(self),
            None => Ok(()),
        }
    }

    /// Applies the conflict policy. Errors for `fail`, logs for `warn`.
    fn check_unsaved(&self, action: &str) -> ModelResult<()> {
        match self.on_unsaved() {
            OnUnsaved::Ignore => Ok(()),
            OnUnsaved::Warn => {
                warn!(
                    model = %self.model.name(),
                    uuid = ?self.uuid,
                    changed = ?self.changes.changed,
                    "{action} item with unsaved changes"
                );
                Ok(())
            }
            OnUnsaved::Fail => Err(ModelError::Conflict {
                model: self.model.name().to_string(),
                uuid: self.bound_uuid()?,
            }),
        }
    }

    /// Checks all properties, running the validation hooks around it.
    pub fn validate(&mut self) -> ModelResult<Vec<ValidationError>> {
        self.run_hook(LifecycleHook::BeforeValidate)?;
        let mut errors = Vec::new();
        self.model.validate_properties(&self.properties, &mut errors);
        self.run_hook(LifecycleHook::AfterValidate)?;
        Ok(errors)
    }

    /// Loads the item's record. The outcome of the first attempt is kept
    /// and returned by later calls until the item is saved or reloaded.
    pub async fn load(&mut self) -> ModelResult<()> {
        if let Some(outcome) = &self.loaded {
            return outcome.clone();
        }
        let uuid = self.bound_uuid()?;
        if self.changes.has_changed {
            self.check_unsaved("discarding changes of")?;
        }

        let outcome = self.load_record(uuid).await;
        self.loaded = Some(outcome.clone());
        outcome
    }

    /// Discards the kept load outcome and loads again.
    pub async fn reload(&mut self) -> ModelResult<()> {
        self.loaded = None;
        self.load().await
    }

    async fn load_record(&mut self, uuid: ItemId) -> ModelResult<()> {
        self.run_hook(LifecycleHook::BeforeLoad)?;

        let key = self.model.data_key(uuid);
        let record = self.adapter().read(&key).await?;
        self.properties = self.model.deserialize_properties(&record);
        self.changes.clear();
        debug!(model = %self.model.name(), %uuid, "loaded item");

        self.run_hook(LifecycleHook::AfterLoad)
    }

    /// Validates and writes the item, assigning an identity on first save.
    ///
    /// A bound item that was never loaded but has recorded changes is a
    /// conflict handled by the `onUnsaved` policy before any I/O. Once the
    /// record is written the item counts as saved, even if an after-hook
    /// fails.
    pub async fn save(&mut self) -> ModelResult<()> {
        if self.uuid.is_some() && !self.is_loaded() && self.changes.has_changed {
            self.check_unsaved("saving")?;
        }

        let errors = self.validate()?;
        if !errors.is_empty() {
            return Err(ModelError::Validation(errors));
        }

        self.run_hook(LifecycleHook::BeforeSave)?;

        let is_new = self.uuid.is_none();
        if is_new {
            self.run_hook(LifecycleHook::BeforeCreate)?;
        }
        let uuid = self.uuid.unwrap_or_else(ItemId::new);

        let adapter = self.adapter();
        let record = self
            .model
            .serialize_properties(&self.properties, Capabilities::of(adapter.as_ref()));
        adapter.write(&self.model.data_key(uuid), &record).await?;

        self.uuid = Some(uuid);
        self.model.update_indices(uuid, &self.properties);
        self.changes.clear();
        self.loaded = Some(Ok(()));
        debug!(model = %self.model.name(), %uuid, created = is_new, "saved item");

        if is_new {
            self.run_hook(LifecycleHook::AfterCreate)?;
        }
        self.run_hook(LifecycleHook::AfterSave)
    }

    /// Removes the item's record. The item keeps its identity.
    pub async fn remove(&mut self) -> ModelResult<()> {
        let uuid = self.bound_uuid()?;
        self.run_hook(LifecycleHook::BeforeRemove)?;

        self.adapter().purge(&self.model.data_key(uuid)).await?;
        self.model.remove_from_indices(uuid);
        self.loaded = None;
        debug!(model = %self.model.name(), %uuid, "removed item");

        self.run_hook(LifecycleHook::AfterRemove)
    }

    /// Exports `uuid`, properties and computed properties.
    ///
    /// With `serialised`, values take their storage form and untyped
    /// computed properties are left out.
    pub fn to_object(&self, serialised: bool) -> PropertyBag {
        let capabilities = Capabilities::of(self.adapter().as_ref());
        let mut object = if serialised {
            self.model
                .serialize_properties(&self.properties, capabilities)
        } else {
            self.properties.clone()
        };

        let uuid = match self.uuid {
            Some(uuid) if serialised => Value::String(uuid.to_string()),
            Some(uuid) => Value::from(uuid),
            None => Value::Null,
        };
        object.insert("uuid".to_string(), uuid);

        for (name, def) in self.model.schema().computed.iter() {
            let value = def.read(&self.properties);
            if !serialised {
                object.insert(name.to_string(), value);
            } else if def.is_typed() {
                object.insert(
                    name.to_string(),
                    def.handler().serialize(&value, capabilities),
                );
            }
        }

        object
    }
}
