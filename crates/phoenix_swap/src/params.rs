//! The cached recipe a resource is rebuilt from.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Free-form construction properties handed to the library on every build.
pub type Properties = serde_json::Map<String, Value>;

/// Opaque library-specific description of a resource.
///
/// The hot-swap core never looks inside; it only hands the descriptor back
/// to the library's bootstrap, which downcasts it to its own type.
///
/// ```
/// use phoenix_swap::Descriptor;
///
/// struct UnitInfo {
///     url: &'static str,
/// }
///
/// let descriptor = Descriptor::new(UnitInfo { url: "db://primary" });
/// assert_eq!(descriptor.downcast_ref::<UnitInfo>().unwrap().url, "db://primary");
/// assert!(descriptor.downcast_ref::<String>().is_none());
/// ```
#[derive(Clone)]
pub struct Descriptor {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Descriptor {
    /// Wraps a library descriptor value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the wrapped value if it is a `T`.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Returns `true` if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Returns the type name of the wrapped value.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Everything needed to build a fresh instance of a resource.
///
/// Captured once, when the resource is registered, and never modified. The
/// presence of a [`Descriptor`] decides which construction call a rebuild
/// makes: the detailed form goes through the descriptor, the name-only form
/// through the resource name.
#[derive(Debug, Clone)]
pub struct ConstructionParams {
    name: String,
    descriptor: Option<Descriptor>,
    properties: Properties,
}

impl ConstructionParams {
    /// Name-only parameters.
    #[must_use]
    pub fn named(name: impl Into<String>, properties: Properties) -> Self {
        Self {
            name: name.into(),
            descriptor: None,
            properties,
        }
    }

    /// Detailed parameters carrying a library descriptor.
    #[must_use]
    pub fn described(
        name: impl Into<String>,
        descriptor: Descriptor,
        properties: Properties,
    ) -> Self {
        Self {
            name: name.into(),
            descriptor: Some(descriptor),
            properties,
        }
    }

    /// Adds one property. Only usable before the parameters are registered.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Logical resource name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Library descriptor, present for the detailed form.
    #[must_use]
    pub fn descriptor(&self) -> Option<&Descriptor> {
        self.descriptor.as_ref()
    }

    /// Construction properties.
    #[must_use]
    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    /// Returns `true` for the detailed (descriptor) form.
    #[must_use]
    pub fn is_detailed(&self) -> bool {
        self.descriptor.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct UnitInfo(&'static str);

    #[test]
    fn named_form_has_no_descriptor() {
        let params = ConstructionParams::named("orders", Properties::new())
            .with_property("pool.size", 8)
            .with_property("pool.url", "db://orders");

        assert_eq!(params.name(), "orders");
        assert!(!params.is_detailed());
        assert!(params.descriptor().is_none());
        assert_eq!(params.properties()["pool.size"], json!(8));
        assert_eq!(params.properties()["pool.url"], json!("db://orders"));
    }

    #[test]
    fn described_form_keeps_descriptor() {
        let params = ConstructionParams::described(
            "billing",
            Descriptor::new(UnitInfo("billing-unit")),
            Properties::new(),
        );

        assert!(params.is_detailed());
        let descriptor = params.descriptor().unwrap();
        assert!(descriptor.is::<UnitInfo>());
        assert_eq!(descriptor.downcast_ref::<UnitInfo>(), Some(&UnitInfo("billing-unit")));
        assert!(descriptor.type_name().ends_with("UnitInfo"));
    }

    #[test]
    fn clones_share_the_descriptor() {
        let params = ConstructionParams::described(
            "billing",
            Descriptor::new(UnitInfo("billing-unit")),
            Properties::new(),
        );
        let copy = params.clone();

        let a = params.descriptor().unwrap().downcast_ref::<UnitInfo>().unwrap();
        let b = copy.descriptor().unwrap().downcast_ref::<UnitInfo>().unwrap();
        assert!(core::ptr::eq(a, b));
    }

    #[test]
    fn debug_names_descriptor_type() {
        let descriptor = Descriptor::new(UnitInfo("x"));
        assert!(format!("{descriptor:?}").contains("UnitInfo"));
    }
}
