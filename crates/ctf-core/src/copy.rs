//! `add_type`: structural-equivalence-based copy of a type (and
//! everything it transitively references) from one container into
//! another.

use std::collections::{HashMap, HashSet};

use ctf_format::Kind;

use crate::container::Container;
use crate::error::{CtfError, Result};
use crate::id::TypeId;
use crate::record::{Encoding, EnumeratorRecord, TypePayload, TypeRecord};

fn encodings_compatible(allow_relax: bool, a: (Encoding, u64), b: (Encoding, u64)) -> bool {
    let (enc_a, size_a) = a;
    let (enc_b, size_b) = b;
    if enc_a == enc_b && size_a == size_b {
        return true;
    }
    // NO_COMPAT relaxation: tolerate 1-bit/4-bit integers disagreeing
    // on exact width, since compilers disagree on how to represent
    // them. Off by default.
    allow_relax
        && matches!(enc_a.bits, 1 | 4)
        && matches!(enc_b.bits, 1 | 4)
        && enc_a.format == enc_b.format
}

fn enumerators_equal(a: &[EnumeratorRecord], b: &[EnumeratorRecord]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let matches = |xs: &[EnumeratorRecord], ys: &[EnumeratorRecord]| {
        xs.iter()
            .all(|x| ys.iter().any(|y| y.name == x.name && y.value == x.value))
    };
    matches(a, b) && matches(b, a)
}

impl Container {
    /// Copies `src_type` (and, transitively, every type it
    /// references) from `src` into `self`, returning the
    /// corresponding type ID in `self`.
    ///
    /// Deduplicates against `self`'s existing root-visible types by
    /// name and kind; a name collision with an incompatible
    /// definition is a [`CtfError::Conflict`]. A matching forward tag
    /// is promoted in place rather than shadowed. Self-referential
    /// aggregates (`struct list { struct list *next; }`) are handled
    /// by registering the destination ID before recursing into
    /// members.
    pub fn add_type(&mut self, src: &Container, src_type: TypeId) -> Result<TypeId> {
        self.require_writable()?;
        let mut in_progress = HashMap::new();
        self.add_type_rec(src, src_type, &mut in_progress)
    }

    fn add_type_rec(
        &mut self,
        src: &Container,
        src_type: TypeId,
        in_progress: &mut HashMap<u32, TypeId>,
    ) -> Result<TypeId> {
        if src_type.is_none() {
            return Ok(TypeId::NONE);
        }
        if let Some(&id) = in_progress.get(&src_type.get()) {
            return Ok(id);
        }
        let rec = src
            .dynamic
            .types
            .get(src_type)
            .ok_or(CtfError::BadId(src_type))?
            .clone();

        match rec.kind {
            Kind::Integer | Kind::Float => self.copy_encoded(&rec),
            Kind::Pointer => {
                let r = self.add_type_rec(src, rec.reference, in_progress)?;
                self.add_pointer(r)
            }
            Kind::Volatile => {
                let r = self.add_type_rec(src, rec.reference, in_progress)?;
                self.add_volatile(r)
            }
            Kind::Const => {
                let r = self.add_type_rec(src, rec.reference, in_progress)?;
                self.add_const(r)
            }
            Kind::Restrict => {
                let r = self.add_type_rec(src, rec.reference, in_progress)?;
                self.add_restrict(r)
            }
            Kind::Typedef => {
                let r = self.add_type_rec(src, rec.reference, in_progress)?;
                let name = rec
                    .name
                    .as_deref()
                    .ok_or_else(|| CtfError::Invalid("typedef without a name".into()))?;
                self.add_typedef(name, r)
            }
            Kind::Array => {
                let TypePayload::Array { contents, index, nelems } = &rec.payload else {
                    return Err(CtfError::Corrupt("array type missing array payload".into()));
                };
                let new_contents = self.add_type_rec(src, *contents, in_progress)?;
                let new_index = self.add_type_rec(src, *index, in_progress)?;
                self.add_array(new_contents, new_index, *nelems)
            }
            Kind::Function => {
                let TypePayload::Function { return_type, args, variadic } = &rec.payload else {
                    return Err(CtfError::Corrupt("function type missing function payload".into()));
                };
                let new_return = self.add_type_rec(src, *return_type, in_progress)?;
                let mut new_args = Vec::with_capacity(args.len());
                for a in args {
                    new_args.push(self.add_type_rec(src, *a, in_progress)?);
                }
                self.add_function(rec.name.as_deref(), new_return, new_args, *variadic)
            }
            Kind::Forward => self.copy_forward(&rec),
            Kind::Struct => self.copy_sou(src, src_type, &rec, Kind::Struct, in_progress),
            Kind::Union => self.copy_sou(src, src_type, &rec, Kind::Union, in_progress),
            Kind::Enum => self.copy_enum(&rec),
            Kind::Unknown => Err(CtfError::Invalid("cannot copy an unknown-kind type".into())),
        }
    }

    fn copy_encoded(&mut self, rec: &TypeRecord) -> Result<TypeId> {
        let name = rec
            .name
            .as_deref()
            .ok_or_else(|| CtfError::Invalid("integer/float type without a name".into()))?;
        let TypePayload::Encoded(enc) = &rec.payload else {
            return Err(CtfError::Corrupt("integer/float type missing encoding".into()));
        };
        if let Some(existing) = self.lookup_own_named(rec.kind, name) {
            let existing_rec = self.dynamic.types.get(existing).ok_or(CtfError::BadId(existing))?;
            if let TypePayload::Encoded(existing_enc) = &existing_rec.payload {
                if existing_rec.kind == rec.kind
                    && encodings_compatible(
                        self.allow_int_compat,
                        (*existing_enc, existing_rec.size),
                        (*enc, rec.size),
                    )
                {
                    return Ok(existing);
                }
            }
            return Err(CtfError::Conflict(name.to_string()));
        }
        if rec.kind == Kind::Integer {
            self.add_integer(name, *enc)
        } else {
            self.add_float(name, *enc)
        }
    }

    fn copy_forward(&mut self, rec: &TypeRecord) -> Result<TypeId> {
        let TypePayload::ForwardKind(k) = &rec.payload else {
            return Err(CtfError::Corrupt("forward type missing intended kind".into()));
        };
        if let Some(name) = rec.name.as_deref() {
            if let Some(existing) = self.lookup_own_named(*k, name) {
                return Ok(existing);
            }
        }
        self.add_forward(rec.name.as_deref(), *k)
    }

    fn copy_sou(
        &mut self,
        src: &Container,
        src_type: TypeId,
        rec: &TypeRecord,
        kind: Kind,
        in_progress: &mut HashMap<u32, TypeId>,
    ) -> Result<TypeId> {
        let TypePayload::Members(src_members) = &rec.payload else {
            return Err(CtfError::Corrupt("struct/union type missing members".into()));
        };

        if let Some(name) = rec.name.as_deref() {
            if let Some(existing) = self.lookup_own_named(kind, name) {
                let existing_rec = self
                    .dynamic
                    .types
                    .get(existing)
                    .ok_or(CtfError::BadId(existing))?
                    .clone();
                if existing_rec.kind == kind {
                    let mut seen = HashSet::new();
                    if self.structurally_equal(src, src_type, existing, &mut seen)? {
                        return Ok(existing);
                    }
                    return Err(CtfError::Conflict(name.to_string()));
                }
                if let TypePayload::ForwardKind(fk) = &existing_rec.payload {
                    if *fk == kind {
                        return self.promote_and_copy_members(
                            src,
                            existing,
                            kind,
                            rec.size,
                            src_members,
                            in_progress,
                        );
                    }
                }
                return Err(CtfError::Conflict(name.to_string()));
            }
        }

        let id = if kind == Kind::Struct {
            self.add_struct_sized(rec.name.as_deref(), 0)?
        } else {
            self.add_union_sized(rec.name.as_deref(), 0)?
        };
        in_progress.insert(src_type.get(), id);
        for m in src_members {
            let new_ty = self.add_type_rec(src, m.ty, in_progress)?;
            self.add_member_offset(id, m.name.as_deref(), new_ty, Some(m.bit_offset))?;
        }
        self.dynamic.types.get_mut(id).unwrap().size = rec.size;
        Ok(id)
    }

    fn promote_and_copy_members(
        &mut self,
        src: &Container,
        existing: TypeId,
        kind: Kind,
        size: u64,
        src_members: &[crate::record::MemberRecord],
        in_progress: &mut HashMap<u32, TypeId>,
    ) -> Result<TypeId> {
        {
            let r = self.dynamic.types.get_mut(existing).unwrap();
            r.kind = kind;
            r.size = 0;
            r.payload = TypePayload::Members(Vec::new());
        }
        in_progress.insert(existing.get(), existing);
        for m in src_members {
            let new_ty = self.add_type_rec(src, m.ty, in_progress)?;
            self.add_member_offset(existing, m.name.as_deref(), new_ty, Some(m.bit_offset))?;
        }
        self.dynamic.types.get_mut(existing).unwrap().size = size;
        self.mark_dirty();
        Ok(existing)
    }

    fn copy_enum(&mut self, rec: &TypeRecord) -> Result<TypeId> {
        let TypePayload::Enumerators(src_enumerators) = &rec.payload else {
            return Err(CtfError::Corrupt("enum type missing enumerators".into()));
        };

        if let Some(name) = rec.name.as_deref() {
            if let Some(existing) = self.lookup_own_named(Kind::Enum, name) {
                let existing_rec = self
                    .dynamic
                    .types
                    .get(existing)
                    .ok_or(CtfError::BadId(existing))?
                    .clone();
                if existing_rec.kind == Kind::Enum {
                    if let TypePayload::Enumerators(existing_enumerators) = &existing_rec.payload {
                        if enumerators_equal(existing_enumerators, src_enumerators) {
                            return Ok(existing);
                        }
                    }
                    return Err(CtfError::Conflict(name.to_string()));
                }
                if let TypePayload::ForwardKind(fk) = &existing_rec.payload {
                    if *fk == Kind::Enum {
                        {
                            let r = self.dynamic.types.get_mut(existing).unwrap();
                            r.kind = Kind::Enum;
                            r.payload = TypePayload::Enumerators(Vec::new());
                        }
                        for e in src_enumerators {
                            self.add_enumerator(existing, &e.name, e.value)?;
                        }
                        self.dynamic.types.get_mut(existing).unwrap().size = rec.size;
                        self.mark_dirty();
                        return Ok(existing);
                    }
                }
                return Err(CtfError::Conflict(name.to_string()));
            }
        }

        let id = self.add_enum(rec.name.as_deref())?;
        for e in src_enumerators {
            self.add_enumerator(id, &e.name, e.value)?;
        }
        self.dynamic.types.get_mut(id).unwrap().size = rec.size;
        Ok(id)
    }

    /// Structural equivalence with a cycle guard: a `(src, dst)` pair
    /// seen before in this comparison is assumed equal rather than
    /// re-walked, which is what makes comparing two self-referential
    /// structs terminate.
    fn structurally_equal(
        &self,
        src: &Container,
        a: TypeId,
        b: TypeId,
        seen: &mut HashSet<(u32, u32)>,
    ) -> Result<bool> {
        if a.is_none() && b.is_none() {
            return Ok(true);
        }
        if a.is_none() || b.is_none() {
            return Ok(false);
        }
        if !seen.insert((a.get(), b.get())) {
            return Ok(true);
        }
        let ra = src.dynamic.types.get(a).ok_or(CtfError::BadId(a))?;
        let rb = self.dynamic.types.get(b).ok_or(CtfError::BadId(b))?;
        if ra.kind != rb.kind || ra.name != rb.name {
            return Ok(false);
        }
        if matches!(ra.kind, Kind::Struct | Kind::Union) && ra.size != rb.size {
            return Ok(false);
        }
        match (&ra.payload, &rb.payload) {
            (TypePayload::Encoded(ea), TypePayload::Encoded(eb)) => Ok(encodings_compatible(
                self.allow_int_compat,
                (*ea, ra.size),
                (*eb, rb.size),
            )),
            (TypePayload::None, TypePayload::None) => {
                if ra.kind.is_reference() {
                    let (ra_ref, rb_ref) = (ra.reference, rb.reference);
                    self.structurally_equal(src, ra_ref, rb_ref, seen)
                } else {
                    Ok(true)
                }
            }
            (TypePayload::ForwardKind(ka), TypePayload::ForwardKind(kb)) => Ok(ka == kb),
            (
                TypePayload::Array { contents: ca, index: ia, nelems: na },
                TypePayload::Array { contents: cb, index: ib, nelems: nb },
            ) => {
                if na != nb {
                    return Ok(false);
                }
                Ok(self.structurally_equal(src, *ca, *cb, seen)?
                    && self.structurally_equal(src, *ia, *ib, seen)?)
            }
            (
                TypePayload::Function { return_type: ra2, args: aa, variadic: va },
                TypePayload::Function { return_type: rb2, args: ab, variadic: vb },
            ) => {
                if va != vb || aa.len() != ab.len() {
                    return Ok(false);
                }
                if !self.structurally_equal(src, *ra2, *rb2, seen)? {
                    return Ok(false);
                }
                for (x, y) in aa.iter().zip(ab.iter()) {
                    if !self.structurally_equal(src, *x, *y, seen)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (TypePayload::Members(ma), TypePayload::Members(mb)) => {
                if ma.len() != mb.len() {
                    return Ok(false);
                }
                for (x, y) in ma.iter().zip(mb.iter()) {
                    if x.name != y.name || x.bit_offset != y.bit_offset {
                        return Ok(false);
                    }
                    if !self.structurally_equal(src, x.ty, y.ty, seen)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (TypePayload::Enumerators(ea), TypePayload::Enumerators(eb)) => {
                Ok(enumerators_equal(ea, eb))
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
#[path = "copy_tests.rs"]
mod copy_tests;
