// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Module catalog.
//!
//! The registry is built once, single-threaded, from a directory of kernel
//! modules and is read-only afterwards. Every entry pairs the negotiated
//! [`ModuleDescriptor`] with the module's live guest instance behind its own
//! lock, so invocations of one module are serialized while different modules
//! run in parallel. A load either produces a complete catalog or fails as a
//! whole.

use crate::backends::wasm::{create_engine, detect_encoding, load_wasm_bytes, WasmKernelInstance};
use crate::bridge::capabilities::{negotiate, ModuleDescriptor};
use crate::config::{Config, EngineConfig, ModulesConfig};
use crate::errors::{BridgeError, BridgeResult};
use crate::observability::messages::catalog::{CatalogLoadStarted, CatalogLoaded};
use crate::observability::messages::wasm::EncodingDetected;
use crate::traits::GuestKernel;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

/// Where a module's instance is within the invocation protocol.
///
/// A slot rests in `Loaded` between invocations. Every invocation walks it
/// through the remaining phases and puts it back in `Loaded`, whether it
/// succeeded or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPhase {
    Loaded,
    Sized,
    Populated,
    Applied,
    Harvested,
}

impl fmt::Display for InvocationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loaded => "loaded",
            Self::Sized => "sized",
            Self::Populated => "populated",
            Self::Applied => "applied",
            Self::Harvested => "harvested",
        };
        f.write_str(name)
    }
}

/// A guest instance plus its protocol phase. Only reachable through the
/// owning [`ModuleHandle`]'s lock.
pub(crate) struct KernelSlot {
    pub(crate) kernel: Box<dyn GuestKernel>,
    phase: InvocationPhase,
}

impl KernelSlot {
    pub(crate) fn advance(&mut self, module: &str, phase: InvocationPhase) {
        tracing::trace!("Module '{}' {} -> {}", module, self.phase, phase);
        self.phase = phase;
    }
}

/// One catalog entry.
pub struct ModuleHandle {
    descriptor: ModuleDescriptor,
    slot: Mutex<KernelSlot>,
}

impl ModuleHandle {
    pub fn descriptor(&self) -> &ModuleDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// Take exclusive ownership of the instance for one invocation.
    pub(crate) fn lock(&self) -> BridgeResult<MutexGuard<'_, KernelSlot>> {
        self.slot
            .lock()
            .map_err(|_| BridgeError::InstancePoisoned(self.descriptor.name.clone()))
    }

    /// Current protocol phase. Waits for a running invocation to finish.
    pub fn phase(&self) -> BridgeResult<InvocationPhase> {
        Ok(self.lock()?.phase)
    }
}

impl fmt::Debug for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleHandle")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Catalog of negotiated kernel modules keyed by name.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: BTreeMap<String, ModuleHandle>,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the catalog described by a full configuration.
    pub fn from_config(cfg: &Config) -> BridgeResult<Self> {
        Self::load(&cfg.modules, &cfg.engine)
    }

    /// Load every file in `modules.directory` as a kernel module.
    ///
    /// Files are processed in file-name order. Symlinks are followed and
    /// subdirectories are skipped. Any failure aborts the load.
    pub fn load(modules: &ModulesConfig, engine_config: &EngineConfig) -> BridgeResult<Self> {
        let directory = modules.directory.display().to_string();
        tracing::info!(
            "{}",
            CatalogLoadStarted {
                directory: &directory,
            }
        );

        let engine = create_engine(engine_config)?;
        let mut registry = Self::new();

        for (file_name, path) in module_files(modules)? {
            let module_name = modules.module_name(&file_name);
            let bytes = load_wasm_bytes(&path, modules.max_module_bytes)?;

            let encoding = detect_encoding(&bytes)
                .map_err(|e| BridgeError::load_failure(module_name, e))?;
            tracing::debug!(
                "{}",
                EncodingDetected {
                    module_path: &path.display().to_string(),
                    encoding: encoding.as_str(),
                }
            );
            if !encoding.is_core_module() {
                return Err(BridgeError::load_failure(
                    module_name,
                    format!(
                        "{} binaries are not supported; kernels must be core modules",
                        encoding.as_str()
                    ),
                ));
            }

            let kernel = WasmKernelInstance::from_bytes(&engine, &bytes, module_name)?;
            registry.register(module_name, Box::new(kernel))?;
        }

        tracing::info!(
            "{}",
            CatalogLoaded {
                directory: &directory,
                module_count: registry.len(),
            }
        );
        Ok(registry)
    }

    /// Negotiate capabilities with an instantiated guest and add it.
    ///
    /// # Errors
    /// Negotiation errors, or [`BridgeError::LoadFailure`] if `name` is taken.
    pub fn register(
        &mut self,
        name: &str,
        mut kernel: Box<dyn GuestKernel>,
    ) -> BridgeResult<&ModuleDescriptor> {
        if self.modules.contains_key(name) {
            return Err(BridgeError::load_failure(name, "duplicate module name"));
        }
        let descriptor = negotiate(name, kernel.as_mut())?;
        let handle = ModuleHandle {
            descriptor,
            slot: Mutex::new(KernelSlot {
                kernel,
                phase: InvocationPhase::Loaded,
            }),
        };
        Ok(&self.modules.entry(name.to_string()).or_insert(handle).descriptor)
    }

    /// Find a module by name.
    pub fn lookup(&self, name: &str) -> BridgeResult<&ModuleHandle> {
        self.modules
            .get(name)
            .ok_or_else(|| BridgeError::NotFound(name.to_string()))
    }

    pub fn descriptor(&self, name: &str) -> BridgeResult<&ModuleDescriptor> {
        self.lookup(name).map(ModuleHandle::descriptor)
    }

    /// Module names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Descriptors of all modules in name order.
    pub fn descriptors(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.modules.values().map(ModuleHandle::descriptor)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Non-directory entries of the module directory as `(file name, path)`, sorted.
fn module_files(modules: &ModulesConfig) -> BridgeResult<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&modules.directory)? {
        let entry = entry?;
        // Follows symlinks; only directories are skipped.
        if std::fs::metadata(entry.path())?.is_dir() {
            continue;
        }
        let file_name = entry.file_name().to_string_lossy().into_owned();
        files.push((file_name, entry.path()));
    }
    files.sort();
    Ok(files)
}
