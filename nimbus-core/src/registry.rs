use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::sync::Arc;

// ── Errors ──────────────────────────────────────────────────────────────────

/// Errors raised while resolving services from a [`ServiceProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// No registration exists for the requested type.
    NotRegistered { type_name: &'static str },
    /// A factory failed to construct the requested service.
    Construction {
        type_name: &'static str,
        message: String,
    },
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::NotRegistered { type_name } => {
                write!(f, "Service of type `{type_name}` is not registered")
            }
            ServiceError::Construction { type_name, message } => {
                write!(f, "Failed to construct service `{type_name}`: {message}")
            }
        }
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    /// Shorthand for a construction failure of `T`.
    pub fn construction<T: ?Sized>(message: impl Into<String>) -> Self {
        ServiceError::Construction {
            type_name: type_name::<T>(),
            message: message.into(),
        }
    }
}

// ── Registrations ───────────────────────────────────────────────────────────

/// How a registered service is produced on resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// A single instance, cloned out on every resolution.
    Singleton,
    /// A factory invoked on every resolution.
    Transient,
}

type Factory =
    Arc<dyn Fn(&ServiceProvider) -> Result<Box<dyn Any + Send + Sync>, ServiceError> + Send + Sync>;

enum Instance {
    Value(Box<dyn Any + Send + Sync>),
    Factory(Factory),
}

struct ServiceDescriptor {
    type_id: TypeId,
    type_name: &'static str,
    instance: Instance,
}

impl ServiceDescriptor {
    fn lifetime(&self) -> Lifetime {
        match self.instance {
            Instance::Value(_) => Lifetime::Singleton,
            Instance::Factory(_) => Lifetime::Transient,
        }
    }
}

/// Ordered collection of service registrations.
///
/// Several registrations may exist for the same type: [`ServiceProvider::get`]
/// returns the last one, [`ServiceProvider::get_all`] returns all of them in
/// registration order. Trait-object hooks are registered as `Arc<dyn Trait>`.
///
/// # Example
///
/// ```ignore
/// let mut services = ServiceRegistry::new();
/// services
///     .add_singleton(SessionOptions::default())
///     .add_factory(|sp| Ok(MyLoader::new(sp.get::<Arc<HttpClient>>()?)));
/// let provider = services.build();
/// ```
#[derive(Default)]
pub struct ServiceRegistry {
    descriptors: Vec<ServiceDescriptor>,
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.descriptors.iter().map(|d| d.type_name))
            .finish()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Register an instance that is cloned out on every resolution.
    pub fn add_singleton<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.descriptors.push(ServiceDescriptor {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            instance: Instance::Value(Box::new(value)),
        });
        self
    }

    /// Register a factory that runs on every resolution.
    pub fn add_factory<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceProvider) -> Result<T, ServiceError> + Send + Sync + 'static,
    {
        self.descriptors.push(ServiceDescriptor {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            instance: Instance::Factory(Arc::new(move |provider| {
                factory(provider).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
            })),
        });
        self
    }

    /// Register `value` only if nothing is registered for `T` yet.
    ///
    /// Returns `true` when the value was added.
    pub fn try_add_singleton<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> bool {
        if self.contains::<T>() {
            return false;
        }
        self.add_singleton(value);
        true
    }

    /// Drop every registration for `T` and register `value` in its place.
    pub fn replace_singleton<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.remove_all::<T>();
        self.add_singleton(value)
    }

    /// Remove every registration for `T`, returning how many were removed.
    pub fn remove_all<T: 'static>(&mut self) -> usize {
        let before = self.descriptors.len();
        let type_id = TypeId::of::<T>();
        self.descriptors.retain(|d| d.type_id != type_id);
        before - self.descriptors.len()
    }

    /// Whether at least one registration exists for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        self.count::<T>() > 0
    }

    /// Number of registrations for `T`.
    pub fn count<T: 'static>(&self) -> usize {
        let type_id = TypeId::of::<T>();
        self.descriptors.iter().filter(|d| d.type_id == type_id).count()
    }

    /// Registrations in order, as `(type name, lifetime)` pairs.
    pub fn registrations(&self) -> impl Iterator<Item = (&'static str, Lifetime)> + '_ {
        self.descriptors.iter().map(|d| (d.type_name, d.lifetime()))
    }

    /// Freeze the registrations into a [`ServiceProvider`].
    pub fn build(self) -> ServiceProvider {
        ServiceProvider {
            descriptors: Arc::new(self.descriptors),
        }
    }
}

// ── ServiceProvider ─────────────────────────────────────────────────────────

/// Read-only, cheaply cloneable view used to resolve services.
#[derive(Clone)]
pub struct ServiceProvider {
    descriptors: Arc<Vec<ServiceDescriptor>>,
}

impl fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("registration_count", &self.descriptors.len())
            .finish()
    }
}

impl ServiceProvider {
    /// Resolve the last registration for `T`.
    pub fn get<T: Clone + 'static>(&self) -> Result<T, ServiceError> {
        let type_id = TypeId::of::<T>();
        let descriptor = self
            .descriptors
            .iter()
            .rev()
            .find(|d| d.type_id == type_id)
            .ok_or(ServiceError::NotRegistered {
                type_name: type_name::<T>(),
            })?;
        self.materialize(descriptor)
    }

    /// Resolve `T`, returning `None` if it is not registered.
    ///
    /// Construction failures are still reported as errors.
    pub fn get_optional<T: Clone + 'static>(&self) -> Result<Option<T>, ServiceError> {
        match self.get::<T>() {
            Ok(value) => Ok(Some(value)),
            Err(ServiceError::NotRegistered { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Resolve every registration for `T`, in registration order.
    pub fn get_all<T: Clone + 'static>(&self) -> Result<Vec<T>, ServiceError> {
        let type_id = TypeId::of::<T>();
        self.descriptors
            .iter()
            .filter(|d| d.type_id == type_id)
            .map(|d| self.materialize(d))
            .collect()
    }

    /// Whether at least one registration exists for `T`.
    pub fn contains<T: 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.descriptors.iter().any(|d| d.type_id == type_id)
    }

    fn materialize<T: Clone + 'static>(&self, descriptor: &ServiceDescriptor) -> Result<T, ServiceError> {
        let mismatch = || ServiceError::construction::<T>("registered value has an unexpected type");
        match &descriptor.instance {
            Instance::Value(value) => value.downcast_ref::<T>().cloned().ok_or_else(mismatch),
            Instance::Factory(factory) => factory(self)?
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|_| mismatch()),
        }
    }
}
