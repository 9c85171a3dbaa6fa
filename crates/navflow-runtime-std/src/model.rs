//! JSON persistence for scoped models.

use std::rc::Rc;

use navflow_core::{CodecError, ModelPayload, ScopeFactory, ScopedModel};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes `model` for [`ScopedModel::persist`]. A model that fails to
/// serialize is logged and left out of the snapshot.
pub fn json_payload<T: Serialize>(model: &T) -> Option<ModelPayload> {
    match serde_json::to_vec(model) {
        Ok(payload) => Some(payload),
        Err(err) => {
            log::warn!(
                "not persisting {}: {err}",
                std::any::type_name::<T>()
            );
            None
        }
    }
}

/// Creates models with a closure and restores them from JSON payloads.
pub struct JsonScopeFactory<T> {
    create: Box<dyn Fn() -> T>,
}

impl<T> JsonScopeFactory<T>
where
    T: ScopedModel + DeserializeOwned + 'static,
{
    pub fn new(create: impl Fn() -> T + 'static) -> Self {
        Self {
            create: Box::new(create),
        }
    }
}

impl<T> JsonScopeFactory<T>
where
    T: ScopedModel + DeserializeOwned + Default + 'static,
{
    pub fn with_default() -> Self {
        Self::new(T::default)
    }
}

impl<T> ScopeFactory for JsonScopeFactory<T>
where
    T: ScopedModel + DeserializeOwned + 'static,
{
    fn create(&self) -> Rc<dyn ScopedModel> {
        Rc::new((self.create)())
    }

    fn restore(&self, payload: &[u8]) -> Result<Rc<dyn ScopedModel>, CodecError> {
        let model: T =
            serde_json::from_slice(payload).map_err(|err| CodecError::new(err.to_string()))?;
        Ok(Rc::new(model))
    }
}
