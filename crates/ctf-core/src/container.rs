use ctf_format::{Kind, ParsedView};

use crate::error::{CtfError, Result};
use crate::id::TypeId;
use crate::layout::TypeQuery;
use crate::model::DataModel;
use crate::record::TypePayload;
use crate::store::{TypeStore, VarStore};

/// Container-wide flags, mirroring `ctf_file_t`'s `ctf_flags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    pub const RDWR: Flags = Flags(0x1);
    pub const DIRTY: Flags = Flags(0x2);
    pub const CHILD: Flags = Flags(0x4);

    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Flags) {
        self.0 |= rhs.0;
    }
}

/// The mutable half of a container: every type and variable ever
/// added, in the order they were added. Never pruned except by
/// [`crate::snapshot`] operations.
#[derive(Debug, Clone, Default)]
pub struct Dynamic {
    pub types: TypeStore,
    pub vars: VarStore,
    pub next_id: u32,
    /// Highest ID present in `self.parsed` as of the last `update`
    /// (0 if `update` has never run). `add_type`'s "pending tail scan"
    /// only looks at dynamic entries above this.
    pub old_id: u32,
    /// Monotonic count of variables ever added; each [`crate::record::VarRecord`]
    /// is stamped with the value current at its creation.
    pub var_seq: u64,
    pub snapshot_at_last_update: u64,
}

/// A writable CTF container: the dynamic type/variable dictionary
/// plus, once [`Container::update`] has run, a committed read-only
/// view produced by re-parsing the buffer it just emitted.
///
/// This is the "two-field shell" the design favors over an in-place
/// byte-level struct swap: `dynamic` is always authoritative for
/// queries, `parsed` exists to give `add_type` a fast name index and
/// to prove the serializer/reader round-trip.
#[derive(Debug, Clone)]
pub struct Container {
    pub(crate) flags: Flags,
    pub(crate) model: DataModel,
    pub(crate) dynamic: Dynamic,
    pub(crate) parsed: Option<ParsedView>,
    pub(crate) buffer: Option<Vec<u8>>,
    pub(crate) parent_name: Option<String>,
    /// Default-off `NO_COMPAT` relaxation: when set, `add_type`
    /// accepts 1-bit and 4-bit integers as compatible regardless of
    /// exact encoding, per Design Note 9.
    pub allow_int_compat: bool,
}

impl Container {
    pub fn new() -> Container {
        Container::with_model(DataModel::default())
    }

    pub fn with_model(model: DataModel) -> Container {
        Container {
            flags: Flags::RDWR,
            model,
            dynamic: Dynamic::default(),
            parsed: None,
            buffer: None,
            parent_name: None,
            allow_int_compat: false,
        }
    }

    /// Creates a child container bound to `parent_name`; its type IDs
    /// are shifted into the child ID space once it is first updated.
    pub fn child(parent_name: impl Into<String>) -> Container {
        let mut c = Container::new();
        c.flags |= Flags::CHILD;
        c.parent_name = Some(parent_name.into());
        c
    }

    pub fn is_child(&self) -> bool {
        self.flags.contains(Flags::CHILD)
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.contains(Flags::DIRTY)
    }

    pub fn is_writable(&self) -> bool {
        self.flags.contains(Flags::RDWR)
    }

    pub fn model(&self) -> DataModel {
        self.model
    }

    pub fn type_count(&self) -> usize {
        self.dynamic.types.len()
    }

    pub fn var_count(&self) -> usize {
        self.dynamic.vars.len()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.flags |= Flags::DIRTY;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.flags = Flags(self.flags.0 & !Flags::DIRTY.0);
    }

    pub(crate) fn require_writable(&self) -> Result<()> {
        if self.is_writable() {
            Ok(())
        } else {
            Err(CtfError::ReadOnly)
        }
    }

    pub(crate) fn max_id(&self) -> u32 {
        if self.is_child() {
            ctf_format::limits::MAX_TYPE
        } else {
            ctf_format::limits::MAX_PTYPE
        }
    }

    /// The offset added to every ID this container hands out: 0 for a
    /// parent, [`ctf_format::limits::CHILD_ID_BASE`] for a child, so a
    /// child's types never collide with its parent's.
    pub(crate) fn child_base(&self) -> u32 {
        if self.is_child() {
            ctf_format::limits::CHILD_ID_BASE
        } else {
            0
        }
    }

    pub(crate) fn allocate_id(&mut self) -> Result<TypeId> {
        let next = self.dynamic.next_id + 1;
        if next > self.max_id() {
            return Err(CtfError::Full);
        }
        self.dynamic.next_id = next;
        let shifted = if self.is_child() {
            crate::id::shift_to_child_space(next)
        } else {
            next
        };
        Ok(TypeId::new(shifted))
    }

    pub fn lookup_root(&self, kind: Kind, name: &str) -> Option<TypeId> {
        self.parsed
            .as_ref()
            .and_then(|p| p.lookup(kind, name))
            .map(TypeId::new)
    }

    /// The buffer emitted by the last successful `update`, if any.
    pub fn buffer(&self) -> Option<&[u8]> {
        self.buffer.as_deref()
    }

    pub fn parsed(&self) -> Option<&ParsedView> {
        self.parsed.as_ref()
    }

    /// Looks up a type's record directly in the dynamic store, which
    /// holds every type the container has ever been given regardless
    /// of whether `update` has run since.
    pub fn type_record(&self, id: TypeId) -> Option<&crate::record::TypeRecord> {
        self.dynamic.types.get(id)
    }

    pub fn lookup_var(&self, name: &str) -> Option<TypeId> {
        if let Some(v) = self.dynamic.vars.get(name) {
            return Some(v.ty);
        }
        self.parsed.as_ref().and_then(|p| p.var_by_name(name)).map(TypeId::new)
    }
}

impl Default for Container {
    fn default() -> Self {
        Container::new()
    }
}

impl TypeQuery for Container {
    fn kind_of(&self, id: TypeId) -> Result<Kind> {
        self.dynamic
            .types
            .get(id)
            .map(|r| r.kind)
            .ok_or(CtfError::BadId(id))
    }

    fn reference_of(&self, id: TypeId) -> Result<TypeId> {
        self.dynamic
            .types
            .get(id)
            .map(|r| r.reference)
            .ok_or(CtfError::BadId(id))
    }

    fn raw_size_of(&self, id: TypeId) -> Result<u64> {
        self.dynamic
            .types
            .get(id)
            .map(|r| r.size)
            .ok_or(CtfError::BadId(id))
    }

    fn vlen_of(&self, id: TypeId) -> Result<usize> {
        self.dynamic
            .types
            .get(id)
            .map(|r| r.vlen())
            .ok_or(CtfError::BadId(id))
    }

    fn encoding_bits_of(&self, id: TypeId) -> Result<Option<u16>> {
        let rec = self.dynamic.types.get(id).ok_or(CtfError::BadId(id))?;
        Ok(match &rec.payload {
            TypePayload::Encoded(enc) => Some(enc.bits),
            _ => None,
        })
    }

    fn members_of(&self, id: TypeId) -> Result<Vec<(TypeId, u64)>> {
        let record = self.dynamic.types.get(id).ok_or(CtfError::BadId(id))?;
        match &record.payload {
            TypePayload::Members(members) => {
                Ok(members.iter().map(|m| (m.ty, m.bit_offset)).collect())
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
#[path = "container_tests.rs"]
mod container_tests;
