//! The `add_*` family: every way to grow a container's type
//! dictionary, mirroring the `ctf_add_*` functions of the original.

use ctf_format::records::vlen_fits;
use ctf_format::Kind;

use crate::container::Container;
use crate::error::{CtfError, Result};
use crate::id::TypeId;
use crate::layout;
use crate::record::{Encoding, EnumeratorRecord, MemberRecord, TypePayload, TypeRecord};

impl Container {
    /// Looks up a root-visible type of the given kind by name, first
    /// among committed (already-`update`d) types, then among this
    /// container's own pending tail — the same two-phase lookup
    /// `add_type` uses against a foreign container, applied here
    /// against itself.
    pub(crate) fn lookup_own_named(&self, kind: Kind, name: &str) -> Option<TypeId> {
        if let Some(id) = self.lookup_root(kind, name) {
            return Some(id);
        }
        let base = self.child_base();
        for (id, rec) in self.dynamic.types.iter() {
            if id.get().saturating_sub(base) <= self.dynamic.old_id || !rec.root {
                continue;
            }
            if rec.name.as_deref() != Some(name) {
                continue;
            }
            let is_match = rec.kind == kind
                || matches!(&rec.payload, TypePayload::ForwardKind(k) if *k == kind);
            if is_match {
                return Some(id);
            }
        }
        None
    }

    fn add_encoded(&mut self, kind: Kind, name: &str, encoding: Encoding) -> Result<TypeId> {
        self.require_writable()?;
        // Size is derived from the encoded bit width, never taken from
        // the caller, exactly as `ctf_add_encoded` computes
        // `clp2(roundup(bits, NBBY) / NBBY)`.
        let size = layout::clp2((encoding.bits as u64).div_ceil(8));
        if let Some(existing) = self.lookup_own_named(kind, name) {
            let rec = self.dynamic.types.get(existing).ok_or(CtfError::BadId(existing))?;
            if rec.kind == kind
                && rec.size == size
                && matches!(&rec.payload, TypePayload::Encoded(e) if *e == encoding)
            {
                return Ok(existing);
            }
            return Err(CtfError::Conflict(name.to_string()));
        }
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: Some(name.to_string()),
                kind,
                root: true,
                reference: TypeId::NONE,
                size,
                payload: TypePayload::Encoded(encoding),
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    pub fn add_integer(&mut self, name: &str, encoding: Encoding) -> Result<TypeId> {
        self.add_encoded(Kind::Integer, name, encoding)
    }

    pub fn add_float(&mut self, name: &str, encoding: Encoding) -> Result<TypeId> {
        self.add_encoded(Kind::Float, name, encoding)
    }

    pub fn add_pointer(&mut self, target: TypeId) -> Result<TypeId> {
        self.require_writable()?;
        if !self.dynamic.types.contains(target) {
            return Err(CtfError::BadId(target));
        }
        for (id, rec) in self.dynamic.types.iter() {
            if rec.kind == Kind::Pointer && rec.reference == target {
                return Ok(id);
            }
        }
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: None,
                kind: Kind::Pointer,
                root: true,
                reference: target,
                size: 0,
                payload: TypePayload::None,
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    fn add_cv_qualifier(&mut self, kind: Kind, target: TypeId) -> Result<TypeId> {
        self.require_writable()?;
        if !self.dynamic.types.contains(target) {
            return Err(CtfError::BadId(target));
        }
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: None,
                kind,
                root: true,
                reference: target,
                size: 0,
                payload: TypePayload::None,
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    pub fn add_volatile(&mut self, target: TypeId) -> Result<TypeId> {
        self.add_cv_qualifier(Kind::Volatile, target)
    }

    pub fn add_const(&mut self, target: TypeId) -> Result<TypeId> {
        self.add_cv_qualifier(Kind::Const, target)
    }

    pub fn add_restrict(&mut self, target: TypeId) -> Result<TypeId> {
        self.add_cv_qualifier(Kind::Restrict, target)
    }

    /// Always allocates a fresh typedef, deliberately skipping the
    /// equivalence check other named kinds get — bitness-dependent
    /// typedefs like `pid_t` must be allowed to redefine themselves
    /// across containers without tripping a conflict.
    pub fn add_typedef(&mut self, name: &str, target: TypeId) -> Result<TypeId> {
        self.require_writable()?;
        if !self.dynamic.types.contains(target) {
            return Err(CtfError::BadId(target));
        }
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: Some(name.to_string()),
                kind: Kind::Typedef,
                root: true,
                reference: target,
                size: 0,
                payload: TypePayload::None,
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    pub fn add_array(&mut self, contents: TypeId, index: TypeId, nelems: u32) -> Result<TypeId> {
        self.require_writable()?;
        if !self.dynamic.types.contains(contents) {
            return Err(CtfError::BadId(contents));
        }
        if !self.dynamic.types.contains(index) {
            return Err(CtfError::BadId(index));
        }
        let pointer_size = self.model.pointer_size();
        let elem_size = layout::size_of_bytes(self, contents, pointer_size)?;
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: None,
                kind: Kind::Array,
                root: true,
                reference: contents,
                size: elem_size * nelems as u64,
                payload: TypePayload::Array { contents, index, nelems },
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    /// Rewrites an existing array type's element/index/length in
    /// place — used to fix up a flexible array member once its true
    /// dimension is known.
    pub fn set_array(&mut self, array: TypeId, contents: TypeId, index: TypeId, nelems: u32) -> Result<()> {
        self.require_writable()?;
        if self.kind_of_checked(array)? != Kind::Array {
            return Err(CtfError::Invalid(format!("{array} is not an array type")));
        }
        if !self.dynamic.types.contains(contents) {
            return Err(CtfError::BadId(contents));
        }
        if !self.dynamic.types.contains(index) {
            return Err(CtfError::BadId(index));
        }
        let pointer_size = self.model.pointer_size();
        let elem_size = layout::size_of_bytes(self, contents, pointer_size)?;
        let rec = self.dynamic.types.get_mut(array).unwrap();
        rec.reference = contents;
        rec.size = elem_size * nelems as u64;
        rec.payload = TypePayload::Array { contents, index, nelems };
        self.mark_dirty();
        Ok(())
    }

    pub fn add_function(
        &mut self,
        name: Option<&str>,
        return_type: TypeId,
        args: Vec<TypeId>,
        variadic: bool,
    ) -> Result<TypeId> {
        self.require_writable()?;
        if !self.dynamic.types.contains(return_type) {
            return Err(CtfError::BadId(return_type));
        }
        for &a in &args {
            if !self.dynamic.types.contains(a) {
                return Err(CtfError::BadId(a));
            }
        }
        if !vlen_fits(args.len() + variadic as usize) {
            return Err(CtfError::Overflow);
        }
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: name.map(String::from),
                kind: Kind::Function,
                root: true,
                reference: return_type,
                size: 0,
                payload: TypePayload::Function { return_type, args, variadic },
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    fn add_sou(&mut self, kind: Kind, name: Option<&str>, size: u64) -> Result<TypeId> {
        self.require_writable()?;
        if let Some(n) = name {
            if let Some(existing) = self.lookup_own_named(kind, n) {
                let rec = self.dynamic.types.get(existing).ok_or(CtfError::BadId(existing))?;
                match &rec.payload {
                    TypePayload::Members(_) if rec.kind == kind => return Ok(existing),
                    TypePayload::ForwardKind(fk) if *fk == kind => {
                        let rec = self.dynamic.types.get_mut(existing).unwrap();
                        rec.kind = kind;
                        rec.size = size;
                        rec.payload = TypePayload::Members(Vec::new());
                        self.mark_dirty();
                        return Ok(existing);
                    }
                    _ => return Err(CtfError::Conflict(n.to_string())),
                }
            }
        }
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: name.map(String::from),
                kind,
                root: true,
                reference: TypeId::NONE,
                size,
                payload: TypePayload::Members(Vec::new()),
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    pub fn add_struct(&mut self, name: Option<&str>) -> Result<TypeId> {
        self.add_struct_sized(name, 0)
    }

    pub fn add_struct_sized(&mut self, name: Option<&str>, size: u64) -> Result<TypeId> {
        self.add_sou(Kind::Struct, name, size)
    }

    pub fn add_union(&mut self, name: Option<&str>) -> Result<TypeId> {
        self.add_union_sized(name, 0)
    }

    pub fn add_union_sized(&mut self, name: Option<&str>, size: u64) -> Result<TypeId> {
        self.add_sou(Kind::Union, name, size)
    }

    pub fn add_enum(&mut self, name: Option<&str>) -> Result<TypeId> {
        self.require_writable()?;
        if let Some(n) = name {
            if let Some(existing) = self.lookup_own_named(Kind::Enum, n) {
                let rec = self.dynamic.types.get(existing).ok_or(CtfError::BadId(existing))?;
                match &rec.payload {
                    TypePayload::Enumerators(_) if rec.kind == Kind::Enum => return Ok(existing),
                    TypePayload::ForwardKind(fk) if *fk == Kind::Enum => {
                        let size = self.model.int_size();
                        let rec = self.dynamic.types.get_mut(existing).unwrap();
                        rec.kind = Kind::Enum;
                        rec.size = size;
                        rec.payload = TypePayload::Enumerators(Vec::new());
                        self.mark_dirty();
                        return Ok(existing);
                    }
                    _ => return Err(CtfError::Conflict(n.to_string())),
                }
            }
        }
        let size = self.model.int_size();
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: name.map(String::from),
                kind: Kind::Enum,
                root: true,
                reference: TypeId::NONE,
                size,
                payload: TypePayload::Enumerators(Vec::new()),
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    pub fn add_forward(&mut self, name: Option<&str>, kind: Kind) -> Result<TypeId> {
        self.require_writable()?;
        if !kind.is_sou() {
            return Err(CtfError::Invalid(format!("{kind:?} cannot be forward-declared")));
        }
        if let Some(n) = name {
            if let Some(existing) = self.lookup_own_named(kind, n) {
                return Ok(existing);
            }
        }
        let id = self.allocate_id()?;
        self.dynamic.types.insert(
            id,
            TypeRecord {
                name: name.map(String::from),
                kind: Kind::Forward,
                root: true,
                reference: TypeId::NONE,
                size: 0,
                payload: TypePayload::ForwardKind(kind),
            },
        );
        self.mark_dirty();
        Ok(id)
    }

    pub fn add_enumerator(&mut self, enum_id: TypeId, name: &str, value: i32) -> Result<()> {
        self.require_writable()?;
        let rec = self.dynamic.types.get_mut(enum_id).ok_or(CtfError::BadId(enum_id))?;
        if rec.kind != Kind::Enum {
            return Err(CtfError::NotEnum(enum_id));
        }
        let TypePayload::Enumerators(list) = &mut rec.payload else {
            return Err(CtfError::Corrupt("enum missing enumerator payload".into()));
        };
        if list.iter().any(|e| e.name == name) {
            return Err(CtfError::Duplicate(name.to_string()));
        }
        if !vlen_fits(list.len() + 1) {
            return Err(CtfError::Overflow);
        }
        list.push(EnumeratorRecord { name: name.to_string(), value });
        self.mark_dirty();
        Ok(())
    }

    pub fn add_member(&mut self, struct_id: TypeId, name: Option<&str>, member_ty: TypeId) -> Result<()> {
        self.add_member_offset(struct_id, name, member_ty, None)
    }

    pub fn add_member_offset(
        &mut self,
        struct_id: TypeId,
        name: Option<&str>,
        member_ty: TypeId,
        bit_offset: Option<u64>,
    ) -> Result<()> {
        self.require_writable()?;
        if !self.dynamic.types.contains(member_ty) {
            return Err(CtfError::BadId(member_ty));
        }
        let kind = self.kind_of_checked(struct_id)?;
        if !matches!(kind, Kind::Struct | Kind::Union) {
            return Err(CtfError::NotSou(struct_id));
        }

        let prev = {
            let rec = self.dynamic.types.get(struct_id).ok_or(CtfError::BadId(struct_id))?;
            let TypePayload::Members(list) = &rec.payload else {
                return Err(CtfError::Corrupt("struct/union missing member payload".into()));
            };
            if let Some(n) = name {
                if list.iter().any(|m| m.name.as_deref() == Some(n)) {
                    return Err(CtfError::Duplicate(n.to_string()));
                }
            }
            if !vlen_fits(list.len() + 1) {
                return Err(CtfError::Overflow);
            }
            if kind == Kind::Struct {
                list.last().map(|m| (m.ty, m.bit_offset))
            } else {
                None
            }
        };

        let pointer_size = self.model.pointer_size();
        let offset = layout::natural_member_offset(self, prev, member_ty, bit_offset, pointer_size)?;
        let member_bytes = layout::size_of_bytes(self, member_ty, pointer_size)?;
        let end_bytes = layout::round_up(offset + member_bytes * 8, 8) / 8;

        let rec = self.dynamic.types.get_mut(struct_id).unwrap();
        if let TypePayload::Members(list) = &mut rec.payload {
            list.push(MemberRecord {
                name: name.map(String::from),
                ty: member_ty,
                bit_offset: offset,
            });
        }
        if kind == Kind::Struct {
            rec.size = rec.size.max(end_bytes);
        } else {
            rec.size = rec.size.max(member_bytes);
        }
        self.mark_dirty();
        Ok(())
    }

    pub fn add_variable(&mut self, name: &str, ty: TypeId) -> Result<()> {
        self.require_writable()?;
        if !self.dynamic.types.contains(ty) {
            return Err(CtfError::BadId(ty));
        }
        if self.dynamic.vars.contains(name) {
            return Err(CtfError::Duplicate(name.to_string()));
        }
        self.dynamic.var_seq += 1;
        let seq = self.dynamic.var_seq;
        self.dynamic.vars.insert(name.to_string(), crate::record::VarRecord { ty, created_at: seq });
        self.mark_dirty();
        Ok(())
    }

    fn kind_of_checked(&self, id: TypeId) -> Result<Kind> {
        use crate::layout::TypeQuery;
        self.kind_of(id)
    }
}

#[cfg(test)]
#[path = "builders_tests.rs"]
mod builders_tests;
