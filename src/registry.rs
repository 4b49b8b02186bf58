//! Lookup of kernels by short name.

use std::sync::Arc;

use crate::errors::{HarnessError, HarnessResult};
use crate::kernel::{Dataset, DynKernel, Kernel};

/// Ordered collection of the kernels available for one dataset type.
pub struct KernelRegistry<D: Dataset> {
    kernels: Vec<DynKernel<D>>,
}

impl<D: Dataset> Default for KernelRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Dataset> Clone for KernelRegistry<D> {
    fn clone(&self) -> Self {
        Self {
            kernels: self.kernels.clone(),
        }
    }
}

impl<D: Dataset> KernelRegistry<D> {
    pub fn new() -> Self {
        Self {
            kernels: Vec::new(),
        }
    }

    /// Adds a kernel. A kernel registered under an existing name replaces it
    /// in place, keeping the registration order.
    pub fn register<K>(&mut self, kernel: K)
    where
        K: Kernel<D> + 'static,
    {
        let kernel: DynKernel<D> = Arc::new(kernel);
        match self
            .kernels
            .iter_mut()
            .find(|existing| existing.name() == kernel.name())
        {
            Some(slot) => *slot = kernel,
            None => self.kernels.push(kernel),
        }
    }

    /// Builder-style [`register`](Self::register).
    pub fn with<K>(mut self, kernel: K) -> Self
    where
        K: Kernel<D> + 'static,
    {
        self.register(kernel);
        self
    }

    pub fn kernels(&self) -> &[DynKernel<D>] {
        &self.kernels
    }

    pub fn names(&self) -> Vec<String> {
        self.kernels.iter().map(|k| k.name().to_string()).collect()
    }

    /// Long labels, in registration order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.kernels.iter().map(|k| k.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    /// Finds a kernel by its short name or its long label.
    pub fn find(&self, name: &str) -> Option<DynKernel<D>> {
        self.kernels
            .iter()
            .find(|kernel| kernel.name() == name || kernel.label() == name)
            .map(Arc::clone)
    }

    /// Like [`find`](Self::find), failing with `UnknownImplementation`.
    pub fn get(&self, name: &str) -> HarnessResult<DynKernel<D>> {
        self.find(name)
            .ok_or_else(|| HarnessError::UnknownImplementation {
                name: name.to_string(),
                available: self.names(),
            })
    }
}
