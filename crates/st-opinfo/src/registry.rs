// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Name-keyed table of operator descriptors.
//!
//! The registry is populated during startup, optionally sealed, and then
//! only read. Lookups take a shared lock and hand out `Arc`s, so dispatcher
//! threads never contend with each other.

use crate::descriptor::{
    AttrDecl, ImplyType, IoSlot, OperatorDescriptor, SlotRole, TypeFormatTuple,
};
use crate::dtype::DTypeFormat;
use crate::error::{OpInfoError, OpInfoResult};
use crate::op_info::{self, OpInfoRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::Deref;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Shared handle to a registered descriptor.
#[derive(Clone, Debug)]
pub struct RegistryHandle {
    descriptor: Arc<OperatorDescriptor>,
}

impl RegistryHandle {
    pub fn descriptor(&self) -> &OperatorDescriptor {
        &self.descriptor
    }

    pub fn into_arc(self) -> Arc<OperatorDescriptor> {
        self.descriptor
    }
}

impl Deref for RegistryHandle {
    type Target = OperatorDescriptor;

    fn deref(&self) -> &OperatorDescriptor {
        &self.descriptor
    }
}

/// Outcome of a kernel selection query.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KernelSelection {
    pub op_name: String,
    /// Index of the matched row in the descriptor's combination table.
    pub combination_index: usize,
    pub combination: TypeFormatTuple,
    /// Output pairs of the matched row, in output declaration order.
    pub outputs: Vec<DTypeFormat>,
}

#[derive(Default)]
struct RegistryTable {
    operators: HashMap<String, Arc<OperatorDescriptor>>,
    sealed: bool,
}

/// Registry of operator descriptors.
#[derive(Default)]
pub struct OperatorRegistry {
    table: RwLock<RegistryTable>,
}

impl OperatorRegistry {
    /// Create an empty, unsealed registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryTable> {
        self.table.read().unwrap_or_else(|poisoned| {
            warn!("operator registry lock poisoned; continuing with last state");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryTable> {
        self.table.write().unwrap_or_else(|poisoned| {
            warn!("operator registry lock poisoned; continuing with last state");
            poisoned.into_inner()
        })
    }

    /// Validate the parts and register the resulting AiCPU descriptor.
    pub fn declare(
        &self,
        name: impl Into<String>,
        slots: Vec<IoSlot>,
        attrs: Vec<AttrDecl>,
        combinations: Vec<TypeFormatTuple>,
    ) -> OpInfoResult<RegistryHandle> {
        self.register(OperatorDescriptor::new(name, slots, attrs, combinations)?)
    }

    /// Register a built descriptor.
    pub fn register(&self, descriptor: OperatorDescriptor) -> OpInfoResult<RegistryHandle> {
        let mut handles = self.register_all(vec![descriptor])?;
        Ok(handles.remove(0))
    }

    /// Register a batch atomically: either every descriptor is inserted or,
    /// on the first conflict, none are.
    pub fn register_all(
        &self,
        descriptors: Vec<OperatorDescriptor>,
    ) -> OpInfoResult<Vec<RegistryHandle>> {
        let mut table = self.write();

        let mut batch = HashSet::new();
        for descriptor in &descriptors {
            let name = descriptor.name();
            if table.sealed {
                return Err(OpInfoError::Sealed(name.to_string()));
            }
            if table.operators.contains_key(name) || !batch.insert(name) {
                return Err(OpInfoError::DuplicateRegistration(name.to_string()));
            }
        }

        let handles = descriptors
            .into_iter()
            .map(|descriptor| {
                debug!(
                    op = descriptor.name(),
                    imply_type = %descriptor.imply_type(),
                    slots = descriptor.slots().len(),
                    combinations = descriptor.combinations().len(),
                    "registered operator descriptor"
                );
                let descriptor = Arc::new(descriptor);
                table
                    .operators
                    .insert(descriptor.name().to_string(), Arc::clone(&descriptor));
                RegistryHandle { descriptor }
            })
            .collect();
        Ok(handles)
    }

    /// Look up a descriptor by operator name.
    pub fn lookup(&self, name: &str) -> OpInfoResult<RegistryHandle> {
        self.read()
            .operators
            .get(name)
            .cloned()
            .map(|descriptor| RegistryHandle { descriptor })
            .ok_or_else(|| OpInfoError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().operators.contains_key(name)
    }

    /// Registered operator names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read().operators.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.read().operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().operators.is_empty()
    }

    /// Descriptors implemented by the given backend, sorted by name.
    pub fn find_by_imply_type(&self, imply_type: ImplyType) -> Vec<RegistryHandle> {
        let mut found: Vec<RegistryHandle> = self
            .read()
            .operators
            .values()
            .filter(|descriptor| descriptor.imply_type() == imply_type)
            .cloned()
            .map(|descriptor| RegistryHandle { descriptor })
            .collect();
        found.sort_by(|a, b| a.name().cmp(b.name()));
        found
    }

    /// Pick the kernel row for the requested input pairs.
    /// See [`OperatorDescriptor::select`] for the matching rules.
    pub fn select(
        &self,
        name: &str,
        inputs: &[Option<DTypeFormat>],
    ) -> OpInfoResult<KernelSelection> {
        let handle = self.lookup(name)?;
        let declared = handle.num_inputs();
        if inputs.len() > declared {
            return Err(OpInfoError::InputArity {
                op: name.to_string(),
                declared,
                requested: inputs.len(),
            });
        }

        let Some((combination_index, combination)) = handle.select(inputs) else {
            let requested: Vec<String> = inputs
                .iter()
                .map(|input| match input {
                    Some(pair) => pair.to_string(),
                    None => "_".to_string(),
                })
                .collect();
            return Err(OpInfoError::Unsupported {
                op: name.to_string(),
                requested: requested.join(", "),
            });
        };

        let outputs = handle
            .positions(SlotRole::Output)
            .into_iter()
            .filter_map(|position| combination.get(position).copied())
            .collect();
        Ok(KernelSelection {
            op_name: name.to_string(),
            combination_index,
            combination: combination.clone(),
            outputs,
        })
    }

    /// End the startup phase. Later registrations fail with
    /// [`OpInfoError::Sealed`].
    pub fn seal(&self) {
        let mut table = self.write();
        if !table.sealed {
            table.sealed = true;
            info!(operators = table.operators.len(), "operator registry sealed");
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.read().sealed
    }

    /// Register every record of a JSON catalog (one record or an array).
    pub fn load_catalog(&self, data: &str) -> OpInfoResult<Vec<RegistryHandle>> {
        let descriptors = op_info::parse_catalog(data)?;
        let handles = self.register_all(descriptors)?;
        info!(operators = handles.len(), "loaded operator catalog");
        Ok(handles)
    }

    /// Op-info records for every registered descriptor, sorted by name.
    pub fn records(&self) -> Vec<OpInfoRecord> {
        let table = self.read();
        let mut records: Vec<OpInfoRecord> = table
            .operators
            .values()
            .map(|descriptor| descriptor.to_record())
            .collect();
        records.sort_by(|a, b| a.op_name.cmp(&b.op_name));
        records
    }

    pub fn to_catalog_json(&self) -> OpInfoResult<String> {
        Ok(serde_json::to_string_pretty(&self.records())?)
    }
}

impl fmt::Debug for OperatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.read();
        f.debug_struct("OperatorRegistry")
            .field("operators", &table.operators.len())
            .field("sealed", &table.sealed)
            .finish()
    }
}
