//! Record heap
//!
//! An append-only arena of record instances addressed by [`ObjHandle`].
//! Nothing is ever freed, so every handle handed out stays valid for the
//! whole run and records may reference each other cyclically.

use super::error::{InterpResult, RuntimeError};
use super::value::Value;
use std::collections::HashMap;
use std::fmt;

/// Opaque, never-reused record identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjHandle(pub u64);

impl fmt::Display for ObjHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field name to value
pub type Record = HashMap<String, Value>;

#[derive(Debug, Default)]
pub struct Heap {
    records: Vec<Record>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh record and return its handle
    pub fn allocate(&mut self, record: Record) -> ObjHandle {
        let handle = ObjHandle(self.records.len() as u64);
        self.records.push(record);
        tracing::trace!(handle = handle.0, "allocated record");
        handle
    }

    /// Copy of the record at `handle`
    pub fn get(&self, handle: ObjHandle) -> InterpResult<Record> {
        self.record(handle).cloned()
    }

    /// Replace the record stored at an existing handle
    pub fn put(&mut self, handle: ObjHandle, record: Record) -> InterpResult<()> {
        let slot = self
            .records
            .get_mut(handle.0 as usize)
            .ok_or_else(|| dangling(handle))?;
        *slot = record;
        Ok(())
    }

    /// Read one field without copying the whole record
    pub fn field(&self, handle: ObjHandle, name: &str) -> InterpResult<Value> {
        self.record(handle)?
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::undefined_field(name))
    }

    /// Overwrite one field: fetch the record, update it, write it back
    pub fn set_field(&mut self, handle: ObjHandle, name: &str, value: Value) -> InterpResult<()> {
        let mut record = self.get(handle)?;
        match record.get_mut(name) {
            Some(slot) => *slot = value,
            None => return Err(RuntimeError::undefined_field(name)),
        }
        self.put(handle, record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn record(&self, handle: ObjHandle) -> InterpResult<&Record> {
        self.records
            .get(handle.0 as usize)
            .ok_or_else(|| dangling(handle))
    }
}

fn dangling(handle: ObjHandle) -> RuntimeError {
    RuntimeError::internal(format!("dangling record handle {handle}"))
}
