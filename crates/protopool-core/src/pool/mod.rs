//! Process-wide descriptor registry.
//!
//! A [`DescriptorPool`] maps fully-qualified type names to descriptors parsed
//! from serialized `FileDescriptorProto` blobs. Pools are explicit values
//! with shared ownership — clone the pool to share it; tests instantiate
//! isolated pools instead of touching global state.
//!
//! ## Registration semantics
//!
//! Re-registering a byte-identical file under the same name is a no-op, so
//! independently compiled units that both import a shared file (a well-known
//! timestamp, say) can each register it. Re-registering *different* content
//! under an already-used name is a hard error and leaves the pool untouched.
//! Content identity is a blake3 hash of the registered blob.
//!
//! ## Resolution
//!
//! Message/enum field references are resolved lazily, on first accessor use,
//! so files may be registered in any order as long as all of them are present
//! before accessors are exercised. Resolutions are memoized per field.

pub mod well_known;

use crate::descriptor::{self, Descriptor, FieldDescriptor, FieldKind, FileDescriptor};
use crate::error::{Error, Result};
use crate::message::MessageClass;
use prost::Message;
use prost_types::FileDescriptorProto;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

struct RegisteredFile {
    file: Arc<FileDescriptor>,
    hash: blake3::Hash,
}

#[derive(Default)]
struct PoolState {
    files: HashMap<String, RegisteredFile>,
    index: HashMap<String, Descriptor>,
}

/// A shared registry of descriptors keyed by fully-qualified type name.
///
/// Cloning is cheap and yields a handle to the same registry. Registration
/// is serialized behind a write lock; lookups proceed concurrently.
#[derive(Clone, Default)]
pub struct DescriptorPool {
    state: Arc<RwLock<PoolState>>,
}

impl std::fmt::Debug for DescriptorPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("DescriptorPool")
            .field("files", &state.files.len())
            .field("types", &state.index.len())
            .finish()
    }
}

impl DescriptorPool {
    /// Creates an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a pool pre-loaded with the well-known types this crate ships
    /// (currently `google/protobuf/timestamp.proto`)
    pub fn with_well_known_types() -> Result<Self> {
        let pool = Self::new();
        pool.add_file(well_known::timestamp_file())?;
        Ok(pool)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, PoolState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Parses and registers a serialized `FileDescriptorProto` blob.
    ///
    /// Returns the registered file descriptor. Registering the same bytes
    /// again returns the original registration unchanged.
    pub fn add_file_bytes(&self, data: &[u8]) -> Result<Arc<FileDescriptor>> {
        let hash = blake3::hash(data);
        let file = descriptor::parse(data)?;
        self.register(file, hash)
    }

    /// Registers an already-decoded file descriptor proto.
    ///
    /// Content identity is taken from the proto's canonical encoding, so a
    /// proto registered here and its `encode_to_vec` bytes registered via
    /// [`DescriptorPool::add_file_bytes`] deduplicate against each other.
    pub fn add_file(&self, proto: FileDescriptorProto) -> Result<Arc<FileDescriptor>> {
        let hash = blake3::hash(&proto.encode_to_vec());
        let file = FileDescriptor::from_proto(&proto)?;
        self.register(file, hash)
    }

    /// Parses and registers a serialized `FileDescriptorSet`, one file at a
    /// time in declaration order.
    ///
    /// Fails on the first conflicting file; files registered before the
    /// failure stay registered.
    pub fn add_file_set_bytes(&self, data: &[u8]) -> Result<Vec<Arc<FileDescriptor>>> {
        let set = prost_types::FileDescriptorSet::decode(data)?;
        let mut files = Vec::with_capacity(set.file.len());
        for file in set.file {
            files.push(self.add_file(file)?);
        }
        Ok(files)
    }

    fn register(&self, file: FileDescriptor, hash: blake3::Hash) -> Result<Arc<FileDescriptor>> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = state.files.get(file.name()) {
            if existing.hash == hash {
                debug!(file = file.name(), "identical file already registered");
                return Ok(Arc::clone(&existing.file));
            }
            return Err(Error::already_registered(file.name()));
        }

        // Collect the new symbols before touching the index so a collision
        // leaves no partial registration behind
        let mut symbols = Vec::new();
        for message in file.messages() {
            collect_symbols(&mut symbols, message);
        }
        for en in file.enums() {
            symbols.push((en.full_name().to_string(), Descriptor::Enum(Arc::clone(en))));
        }

        for (name, _) in &symbols {
            if state.index.contains_key(name) {
                return Err(Error::DuplicateSymbol {
                    symbol: name.clone(),
                    file: file.name().to_string(),
                });
            }
        }

        debug!(
            file = file.name(),
            types = symbols.len(),
            "registered file"
        );

        let file = Arc::new(file);
        state.files.insert(
            file.name().to_string(),
            RegisteredFile {
                file: Arc::clone(&file),
                hash,
            },
        );
        state.index.extend(symbols);

        Ok(file)
    }

    /// Looks up a registered type by fully-qualified name.
    ///
    /// Absence is an error, never a default.
    pub fn lookup(&self, name: &str) -> Result<Descriptor> {
        self.read_state()
            .index
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(name))
    }

    /// Looks up a registered message type by fully-qualified name
    pub fn lookup_message(&self, name: &str) -> Result<Arc<descriptor::MessageDescriptor>> {
        match self.lookup(name)? {
            Descriptor::Message(m) => Ok(m),
            Descriptor::Enum(_) => Err(Error::invalid_descriptor(name, "not a message type")),
        }
    }

    /// Returns a registered file by its declared name
    pub fn file_by_name(&self, name: &str) -> Result<Arc<FileDescriptor>> {
        self.read_state()
            .files
            .get(name)
            .map(|r| Arc::clone(&r.file))
            .ok_or_else(|| Error::not_found(name))
    }

    /// Returns all registered files, sorted by name
    pub fn files(&self) -> Vec<Arc<FileDescriptor>> {
        let state = self.read_state();
        let mut files: Vec<_> = state.files.values().map(|r| Arc::clone(&r.file)).collect();
        files.sort_by(|a, b| a.name().cmp(b.name()));
        files
    }

    /// Returns all registered fully-qualified type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.read_state().index.keys().cloned().collect();
        names.sort();
        names
    }

    /// Clears the pool. Intended for tests that reuse a shared pool handle.
    pub fn reset(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.files.clear();
        state.index.clear();
    }

    /// Binds the named message type into an accessor class
    pub fn bind(&self, name: &str) -> Result<MessageClass> {
        let descriptor = self.lookup_message(name)?;
        Ok(MessageClass::bind(self.clone(), descriptor))
    }

    /// Resolves a field's message/enum type reference against this pool.
    ///
    /// Lazy by contract: called by accessor classes at first use, memoized on
    /// the field. Synthetic map-entry types resolve to the entry descriptor
    /// attached to the field rather than the shared index (they have no
    /// identity outside their owning field).
    pub fn resolve_field(&self, field: &FieldDescriptor) -> Result<Descriptor> {
        if let Some(resolved) = field.resolved() {
            return Ok(resolved.clone());
        }

        let (name, want_message) = match field.kind() {
            FieldKind::Message(name) => (name, true),
            FieldKind::Enum(name) => (name, false),
            _ => {
                return Err(Error::invalid_descriptor(
                    field.full_name(),
                    "field does not reference a named type",
                ))
            }
        };

        let resolved = if let Some(entry) = field.map_entry_message() {
            Descriptor::Message(Arc::clone(entry))
        } else {
            let found = self
                .read_state()
                .index
                .get(name)
                .cloned()
                .ok_or_else(|| Error::unresolved(name, field.full_name()))?;
            match (&found, want_message) {
                (Descriptor::Message(_), true) | (Descriptor::Enum(_), false) => found,
                (Descriptor::Message(_), false) => {
                    return Err(Error::invalid_descriptor(
                        name,
                        format!("'{}' expects an enum, found a message", field.full_name()),
                    ))
                }
                (Descriptor::Enum(_), true) => {
                    return Err(Error::invalid_descriptor(
                        name,
                        format!("'{}' expects a message, found an enum", field.full_name()),
                    ))
                }
            }
        };

        field.memoize_resolved(resolved.clone());
        Ok(resolved)
    }
}

fn collect_symbols(
    out: &mut Vec<(String, Descriptor)>,
    message: &Arc<descriptor::MessageDescriptor>,
) {
    // Synthetic map entries stay out of the shared namespace
    if message.is_map_entry() {
        return;
    }
    out.push((
        message.full_name().to_string(),
        Descriptor::Message(Arc::clone(message)),
    ));
    for nested in message.nested_messages() {
        collect_symbols(out, nested);
    }
    for en in message.nested_enums() {
        out.push((en.full_name().to_string(), Descriptor::Enum(Arc::clone(en))));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use pretty_assertions::assert_eq;

    const NS: &str = "temporal.api.cloud.namespace.v1";

    #[test]
    fn test_re_registration_is_idempotent() {
        let pool = DescriptorPool::new();
        let bytes = testutil::encode(testutil::namespace_file());

        let first = pool.add_file_bytes(&bytes).unwrap();
        let names_after_one = pool.type_names();

        let second = pool.add_file_bytes(&bytes).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.type_names(), names_after_one);
    }

    #[test]
    fn test_add_file_and_bytes_share_identity() {
        let pool = DescriptorPool::new();
        let proto = testutil::namespace_file();
        pool.add_file(proto.clone()).unwrap();
        // Same content as bytes is a no-op, not a conflict
        pool.add_file_bytes(&testutil::encode(proto)).unwrap();
        assert_eq!(pool.files().len(), 1);
    }

    #[test]
    fn test_conflicting_content_rejected() {
        let pool = DescriptorPool::new();
        pool.add_file(testutil::namespace_file()).unwrap();

        // Same file name, different message set
        let conflicting = testutil::file(
            "temporal/api/cloud/namespace/v1/message.proto",
            "other.pkg",
            vec![testutil::msg("Other", vec![])],
        );
        let err = pool.add_file(conflicting).unwrap_err();
        assert!(matches!(err, Error::AlreadyRegistered { .. }));

        // Original registration is untouched
        assert!(pool.lookup(&format!("{NS}.NamespaceSpec")).is_ok());
        assert!(pool.lookup("other.pkg.Other").is_err());
    }

    #[test]
    fn test_lookup_missing_is_not_found() {
        let pool = DescriptorPool::new();
        match pool.lookup("never.Registered").unwrap_err() {
            Error::NotFound { name } => assert_eq!(name, "never.Registered"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_symbol_across_files_leaves_pool_untouched() {
        let pool = DescriptorPool::new();
        pool.add_file(testutil::file(
            "a.proto",
            "shared",
            vec![testutil::msg("Thing", vec![]), testutil::msg("OnlyInA", vec![])],
        ))
        .unwrap();

        let err = pool
            .add_file(testutil::file(
                "b.proto",
                "shared",
                vec![testutil::msg("NewInB", vec![]), testutil::msg("Thing", vec![])],
            ))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSymbol { .. }));

        // No partial registration from the failed file
        assert!(pool.lookup("shared.NewInB").is_err());
        assert!(pool.file_by_name("b.proto").is_err());
    }

    #[test]
    fn test_map_entries_have_no_pool_identity() {
        let pool = DescriptorPool::with_well_known_types().unwrap();
        pool.add_file(testutil::namespace_file()).unwrap();

        assert!(pool.lookup(&format!("{NS}.NamespaceSpec")).is_ok());
        assert!(pool
            .lookup(&format!("{NS}.NamespaceSpec.CustomSearchAttributesEntry"))
            .is_err());
    }

    #[test]
    fn test_well_known_types() {
        let pool = DescriptorPool::with_well_known_types().unwrap();
        let ts = pool.lookup_message("google.protobuf.Timestamp").unwrap();
        assert_eq!(ts.field_by_number(1).unwrap().name(), "seconds");
        assert_eq!(ts.field_by_number(2).unwrap().name(), "nanos");

        // Pre-loading twice stays idempotent
        pool.add_file(well_known::timestamp_file()).unwrap();
    }

    #[test]
    fn test_lazy_resolution_tolerates_registration_order() {
        // Register the referencing file before the referenced one
        let pool = DescriptorPool::new();
        pool.add_file(testutil::namespace_file()).unwrap();

        let class = pool.bind(&format!("{NS}.Namespace")).unwrap();
        let ns = class.new_instance();
        // Timestamp not present yet: surfaced at access, not at registration
        assert!(matches!(
            ns.get("created_time").unwrap_err(),
            Error::UnresolvedReference { .. }
        ));

        // Once the import is present, the same field resolves
        pool.add_file(well_known::timestamp_file()).unwrap();
        assert!(ns.get("created_time").is_ok());
    }

    #[test]
    fn test_add_file_set() {
        let set = prost_types::FileDescriptorSet {
            file: vec![well_known::timestamp_file(), testutil::namespace_file()],
        };
        let pool = DescriptorPool::new();
        let files = pool.add_file_set_bytes(&set.encode_to_vec()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(pool.lookup(&format!("{NS}.Limits")).is_ok());
        assert!(pool.lookup("google.protobuf.Timestamp").is_ok());
    }

    #[test]
    fn test_reset() {
        let pool = DescriptorPool::with_well_known_types().unwrap();
        assert!(!pool.type_names().is_empty());
        pool.reset();
        assert!(pool.type_names().is_empty());
        assert!(pool.lookup("google.protobuf.Timestamp").is_err());
    }

    #[test]
    fn test_concurrent_registration_single_winner() {
        let pool = DescriptorPool::new();
        let bytes = testutil::encode(testutil::namespace_file());

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let pool = pool.clone();
                let bytes = bytes.clone();
                scope.spawn(move || pool.add_file_bytes(&bytes).unwrap());
            }
        });

        assert_eq!(pool.files().len(), 1);
    }
}
