//! Opaque values attached to a request by middleware.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use axum::http::Request;

/// Ordered list of arbitrary values carried for the lifetime of a request.
#[derive(Clone, Default)]
pub struct Bindings(Vec<Arc<dyn Any + Send + Sync>>);

impl Bindings {
    pub fn push<T: Any + Send + Sync>(&mut self, value: T) {
        self.0.push(Arc::new(value));
    }

    /// First binding of type `T`.
    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.0.iter().find_map(|b| b.downcast_ref::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = &(dyn Any + Send + Sync)> {
        self.0.iter().map(|b| b.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bindings").field("len", &self.0.len()).finish()
    }
}

/// Attach `value` to `request`; picked up by the
/// [`RequestContext`](crate::RequestContext) extractor.
pub fn attach_binding<B, T: Any + Send + Sync>(request: &mut Request<B>, value: T) {
    let extensions = request.extensions_mut();
    match extensions.get_mut::<Bindings>() {
        Some(bindings) => bindings.push(value),
        None => {
            let mut bindings = Bindings::default();
            bindings.push(value);
            extensions.insert(bindings);
        }
    }
}
