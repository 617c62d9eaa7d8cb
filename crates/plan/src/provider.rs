//! Resource providers: serializable descriptions of how to build one resource.
//!
//! The four variants share the same field shape, so the encoded form carries
//! an explicit tag under [`PROVIDER_TAG_KEY`] and decoding dispatches on it.

use std::sync::Arc;

use agentplan_core::{Resource, ResourceError, ResourceKind, ResourceResolver};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PlanError;
use crate::instance::Bindings;
use crate::types::{ProvideContext, ResourceArgs, TypeIdentifier};

pub const PROVIDER_TAG_KEY: &str = "__resource_provider_type__";

pub const NATIVE_TAG: &str = "NativeResourceProvider";
pub const NATIVE_SERIALIZABLE_TAG: &str = "NativeSerializableResourceProvider";
pub const FOREIGN_TAG: &str = "ForeignResourceProvider";
pub const FOREIGN_SERIALIZABLE_TAG: &str = "ForeignSerializableResourceProvider";

/// A resource declared by type identifier plus constructor arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    pub name: String,
    pub kind: ResourceKind,
    pub module: String,
    pub clazz: String,
    #[serde(default)]
    pub kwargs: ResourceArgs,
}

/// A resource captured as a prebuilt snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedResource {
    pub name: String,
    pub kind: ResourceKind,
    pub module: String,
    pub clazz: String,
    pub serialized: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceProvider {
    Native(ResourceDescriptor),
    NativeSerializable(SerializedResource),
    Foreign(ResourceDescriptor),
    ForeignSerializable(SerializedResource),
}

/// Builds resources whose providers belong to another host language's
/// runtime. To the resolver this is an opaque instantiation step.
pub trait ForeignRuntime: Send + Sync {
    fn instantiate(
        &self,
        provider: &ResourceProvider,
        resolver: Arc<dyn ResourceResolver>,
    ) -> Result<Resource, ResourceError>;
}

impl ResourceProvider {
    pub fn name(&self) -> &str {
        match self {
            ResourceProvider::Native(d) | ResourceProvider::Foreign(d) => &d.name,
            ResourceProvider::NativeSerializable(s) | ResourceProvider::ForeignSerializable(s) => {
                &s.name
            }
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceProvider::Native(d) | ResourceProvider::Foreign(d) => d.kind,
            ResourceProvider::NativeSerializable(s) | ResourceProvider::ForeignSerializable(s) => {
                s.kind
            }
        }
    }

    pub fn type_identifier(&self) -> TypeIdentifier {
        match self {
            ResourceProvider::Native(d) | ResourceProvider::Foreign(d) => {
                TypeIdentifier::new(&d.module, &d.clazz)
            }
            ResourceProvider::NativeSerializable(s) | ResourceProvider::ForeignSerializable(s) => {
                TypeIdentifier::new(&s.module, &s.clazz)
            }
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ResourceProvider::Native(_) => NATIVE_TAG,
            ResourceProvider::NativeSerializable(_) => NATIVE_SERIALIZABLE_TAG,
            ResourceProvider::Foreign(_) => FOREIGN_TAG,
            ResourceProvider::ForeignSerializable(_) => FOREIGN_SERIALIZABLE_TAG,
        }
    }

    pub fn is_foreign(&self) -> bool {
        matches!(
            self,
            ResourceProvider::Foreign(_) | ResourceProvider::ForeignSerializable(_)
        )
    }

    /// Encode with the discriminant tag.
    pub fn to_value(&self) -> Result<Value, PlanError> {
        let body = match self {
            ResourceProvider::Native(d) | ResourceProvider::Foreign(d) => serde_json::to_value(d)?,
            ResourceProvider::NativeSerializable(s) | ResourceProvider::ForeignSerializable(s) => {
                serde_json::to_value(s)?
            }
        };
        let Value::Object(mut map) = body else {
            return Err(PlanError::MalformedDocument(format!(
                "provider '{}' did not encode to an object",
                self.name()
            )));
        };
        map.insert(PROVIDER_TAG_KEY.to_string(), Value::String(self.tag().to_string()));
        Ok(Value::Object(map))
    }

    /// Decode, dispatching on the discriminant tag.
    pub fn from_value(value: Value) -> Result<Self, PlanError> {
        let Value::Object(mut map) = value else {
            return Err(PlanError::MalformedDocument(
                "resource provider must be an object".into(),
            ));
        };
        let tag = match map.remove(PROVIDER_TAG_KEY) {
            Some(Value::String(tag)) => tag,
            Some(other) => return Err(PlanError::UnsupportedProviderTag(other.to_string())),
            None => return Err(PlanError::UnsupportedProviderTag("<missing>".into())),
        };
        let body = Value::Object(map);
        match tag.as_str() {
            NATIVE_TAG => Ok(ResourceProvider::Native(serde_json::from_value(body)?)),
            NATIVE_SERIALIZABLE_TAG => Ok(ResourceProvider::NativeSerializable(
                serde_json::from_value(body)?,
            )),
            FOREIGN_TAG => Ok(ResourceProvider::Foreign(serde_json::from_value(body)?)),
            FOREIGN_SERIALIZABLE_TAG => Ok(ResourceProvider::ForeignSerializable(
                serde_json::from_value(body)?,
            )),
            _ => Err(PlanError::UnsupportedProviderTag(tag)),
        }
    }

    /// Build the resource. `resolver` is handed to the constructor so it can
    /// resolve its own named dependencies.
    pub fn provide(
        &self,
        bindings: &Bindings,
        resolver: Arc<dyn ResourceResolver>,
    ) -> Result<Resource, ResourceError> {
        let args = match self {
            ResourceProvider::Native(d) => d.kwargs.clone(),
            ResourceProvider::NativeSerializable(s) => match &s.serialized {
                Value::Object(map) => map.clone(),
                other => {
                    return Err(ResourceError::InvalidArguments {
                        kind: s.kind,
                        name: s.name.clone(),
                        reason: format!("snapshot must be an object, got {other}"),
                    });
                }
            },
            ResourceProvider::Foreign(_) | ResourceProvider::ForeignSerializable(_) => {
                let runtime = bindings.foreign.as_ref().ok_or_else(|| {
                    ResourceError::ForeignRuntimeUnavailable {
                        kind: self.kind(),
                        name: self.name().to_string(),
                    }
                })?;
                return runtime.instantiate(self, resolver);
            }
        };

        let ctx = ProvideContext {
            name: self.name(),
            kind: self.kind(),
            resolver,
            functions: &bindings.functions,
        };
        bindings.types.construct(&self.type_identifier(), args, &ctx)
    }
}
