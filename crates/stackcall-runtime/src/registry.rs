//! Class and enum registries
//!
//! The marshalling core never owns class hierarchies or enum name tables. Hosts
//! inject them through `ClassRegistry` and `EnumRegistry`, bundled in `Registries`.
//! Both are read-only once calls start.
//!
//! `ClassTable` and `EnumTables` are simple in-memory implementations for hosts
//! without their own registry.

use crate::types::{ClassId, EnumId};
use crate::value::RawHandle;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Maps native handles to classes and performs checked downcasts.
pub trait ClassRegistry: Send + Sync {
    /// Display name of a declared class
    fn class_name(&self, class: &ClassId) -> String;

    /// Concrete runtime class name of the object behind a handle
    fn runtime_class_name(&self, handle: RawHandle) -> String;

    /// Return the handle if its object is an instance of `target` (or a subclass)
    fn downcast(&self, handle: RawHandle, target: &ClassId) -> Option<RawHandle>;
}

/// Bidirectional string/value lookup per enum type.
pub trait EnumRegistry: Send + Sync {
    /// Declared display name of the enum, if known
    fn enum_name(&self, id: &EnumId) -> Option<String>;

    fn parse(&self, id: &EnumId, name: &str) -> Option<i64>;

    fn variant_name(&self, id: &EnumId, value: i64) -> Option<String>;
}

/// Registries injected into every bound call
#[derive(Clone)]
pub struct Registries {
    pub classes: Arc<dyn ClassRegistry>,
    pub enums: Arc<dyn EnumRegistry>,
}

impl Registries {
    pub fn new(classes: Arc<dyn ClassRegistry>, enums: Arc<dyn EnumRegistry>) -> Self {
        Self { classes, enums }
    }
}

impl Default for Registries {
    fn default() -> Self {
        Self {
            classes: Arc::new(ClassTable::new()),
            enums: Arc::new(EnumTables::new()),
        }
    }
}

impl std::fmt::Debug for Registries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registries").finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
struct ClassTableInner {
    /// class -> (display name, parent)
    classes: HashMap<ClassId, (String, Option<ClassId>)>,
    /// live handle -> concrete class
    instances: HashMap<RawHandle, ClassId>,
}

/// In-memory class hierarchy and handle table
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    inner: Arc<RwLock<ClassTableInner>>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a class, optionally deriving from `parent`
    pub fn declare(
        &self,
        class: impl Into<ClassId>,
        display_name: impl Into<String>,
        parent: Option<ClassId>,
    ) -> &Self {
        self.write()
            .classes
            .insert(class.into(), (display_name.into(), parent));
        self
    }

    /// Record a live object of class `class` behind `handle`
    pub fn register_instance(&self, handle: RawHandle, class: impl Into<ClassId>) -> &Self {
        self.write().instances.insert(handle, class.into());
        self
    }

    /// Forget a destroyed object
    pub fn release(&self, handle: RawHandle) {
        self.write().instances.remove(&handle);
    }

    // A panic while holding the lock cannot leave the maps half-updated, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, ClassTableInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClassTableInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_subclass<'a>(
        inner: &'a ClassTableInner,
        mut class: &'a ClassId,
        target: &ClassId,
    ) -> bool {
        // Bounded by the number of declared classes so a cyclic declaration terminates
        for _ in 0..=inner.classes.len() {
            if class == target {
                return true;
            }
            match inner.classes.get(class).and_then(|(_, parent)| parent.as_ref()) {
                Some(parent) => class = parent,
                None => return false,
            }
        }
        false
    }
}

impl ClassRegistry for ClassTable {
    fn class_name(&self, class: &ClassId) -> String {
        self.read()
            .classes
            .get(class)
            .map(|(name, _)| name.clone())
            .unwrap_or_else(|| class.as_str().to_string())
    }

    fn runtime_class_name(&self, handle: RawHandle) -> String {
        let class = self.read().instances.get(&handle).cloned();
        match class {
            Some(class) => self.class_name(&class),
            None => "userdata".to_string(),
        }
    }

    fn downcast(&self, handle: RawHandle, target: &ClassId) -> Option<RawHandle> {
        let inner = self.read();
        let class = inner.instances.get(&handle)?;
        Self::is_subclass(&inner, class, target).then_some(handle)
    }
}

/// One enum's name table
#[derive(Debug, Clone, Default)]
pub struct EnumTable {
    display_name: String,
    by_name: HashMap<String, i64>,
    by_value: HashMap<i64, String>,
}

impl EnumTable {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn variant(mut self, name: impl Into<String>, value: i64) -> Self {
        let name = name.into();
        self.by_name.insert(name.clone(), value);
        self.by_value.insert(value, name);
        self
    }
}

/// In-memory enum registry
#[derive(Debug, Clone, Default)]
pub struct EnumTables {
    tables: HashMap<EnumId, EnumTable>,
}

impl EnumTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<EnumId>, table: EnumTable) -> Self {
        self.tables.insert(id.into(), table);
        self
    }
}

impl EnumRegistry for EnumTables {
    fn enum_name(&self, id: &EnumId) -> Option<String> {
        self.tables.get(id).map(|t| t.display_name.clone())
    }

    fn parse(&self, id: &EnumId, name: &str) -> Option<i64> {
        self.tables.get(id)?.by_name.get(name).copied()
    }

    fn variant_name(&self, id: &EnumId, value: i64) -> Option<String> {
        self.tables.get(id)?.by_value.get(&value).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vehicles() -> ClassTable {
        let classes = ClassTable::new();
        classes
            .declare("element", "element", None)
            .declare("vehicle", "vehicle", Some(ClassId::from("element")))
            .declare("ped", "ped", Some(ClassId::from("element")))
            .register_instance(RawHandle(1), "vehicle")
            .register_instance(RawHandle(2), "ped");
        classes
    }

    #[test]
    fn test_downcast_to_own_class_and_parent() {
        let classes = vehicles();
        assert_eq!(
            classes.downcast(RawHandle(1), &ClassId::from("vehicle")),
            Some(RawHandle(1))
        );
        assert_eq!(
            classes.downcast(RawHandle(1), &ClassId::from("element")),
            Some(RawHandle(1))
        );
    }

    #[test]
    fn test_downcast_to_sibling_fails() {
        let classes = vehicles();
        assert_eq!(classes.downcast(RawHandle(2), &ClassId::from("vehicle")), None);
    }

    #[test]
    fn test_released_handle_is_unknown() {
        let classes = vehicles();
        classes.release(RawHandle(1));
        assert_eq!(classes.downcast(RawHandle(1), &ClassId::from("vehicle")), None);
        assert_eq!(classes.runtime_class_name(RawHandle(1)), "userdata");
    }

    #[test]
    fn test_writes_survive_poisoned_lock() {
        let classes = vehicles();
        let shared = classes.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.inner.write().unwrap();
            panic!("handler crashed while holding the class table");
        })
        .join();
        assert!(classes.inner.is_poisoned());

        classes.register_instance(RawHandle(3), "vehicle");
        assert_eq!(
            classes.downcast(RawHandle(3), &ClassId::from("element")),
            Some(RawHandle(3))
        );
        classes.release(RawHandle(1));
        assert_eq!(classes.runtime_class_name(RawHandle(1)), "userdata");
    }

    #[test]
    fn test_runtime_class_name() {
        let classes = vehicles();
        assert_eq!(classes.runtime_class_name(RawHandle(2)), "ped");
    }

    #[test]
    fn test_enum_lookup_both_directions() {
        let enums = EnumTables::new().with(
            "weather",
            EnumTable::new("weather-type").variant("sunny", 0).variant("rain", 1),
        );
        let id = EnumId::from("weather");
        assert_eq!(enums.parse(&id, "rain"), Some(1));
        assert_eq!(enums.parse(&id, "snow"), None);
        assert_eq!(enums.variant_name(&id, 0).as_deref(), Some("sunny"));
        assert_eq!(enums.enum_name(&id).as_deref(), Some("weather-type"));
        assert_eq!(enums.enum_name(&EnumId::from("other")), None);
    }
}
