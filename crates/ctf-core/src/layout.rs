//! Size/alignment resolution and the natural struct-member layout
//! algorithm, mirroring `ctf_type_size`/`ctf_type_align`/
//! `ctf_add_member_offset` in the original.

use ctf_format::Kind;

use crate::error::{CtfError, Result};
use crate::id::TypeId;
use crate::record::TypePayload;

/// Rounds `x` up to the next power of two (`x` itself if already one).
/// `0` rounds to `0`.
pub fn clp2(x: u64) -> u64 {
    if x == 0 {
        return 0;
    }
    let mut v = x - 1;
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    v + 1
}

/// Resolves size/alignment/kind of any type ID, whether it's still
/// pending in the dynamic store or only reachable through the
/// committed parsed view.
pub trait TypeQuery {
    fn kind_of(&self, id: TypeId) -> Result<Kind>;
    fn reference_of(&self, id: TypeId) -> Result<TypeId>;
    fn raw_size_of(&self, id: TypeId) -> Result<u64>;
    fn vlen_of(&self, id: TypeId) -> Result<usize>;
    fn members_of(&self, id: TypeId) -> Result<Vec<(TypeId, u64)>>;
    /// The encoded bit width of an integer/float type, if `id` is one.
    /// `None` for every other kind.
    fn encoding_bits_of(&self, id: TypeId) -> Result<Option<u16>>;
}

/// Follows typedef/volatile/const/restrict chains down to the
/// underlying type.
pub fn resolve<Q: TypeQuery + ?Sized>(q: &Q, mut id: TypeId) -> Result<TypeId> {
    loop {
        let kind = q.kind_of(id)?;
        if kind.is_cv_qualifier() || kind == Kind::Typedef {
            id = q.reference_of(id)?;
        } else {
            return Ok(id);
        }
    }
}

pub fn align_of_bytes<Q: TypeQuery + ?Sized>(
    q: &Q,
    id: TypeId,
    pointer_size: u64,
) -> Result<u64> {
    let resolved = resolve(q, id)?;
    let kind = q.kind_of(resolved)?;
    let align = match kind {
        Kind::Integer | Kind::Float | Kind::Enum => clp2(q.raw_size_of(resolved)?).max(1),
        Kind::Pointer => pointer_size,
        Kind::Array => {
            let contents = q.reference_of(resolved)?;
            align_of_bytes(q, contents, pointer_size)?
        }
        Kind::Struct | Kind::Union => {
            let mut max_align = 1;
            for (member_ty, _) in q.members_of(resolved)? {
                max_align = max_align.max(align_of_bytes(q, member_ty, pointer_size)?);
            }
            max_align
        }
        Kind::Forward | Kind::Function | Kind::Unknown => 1,
        Kind::Typedef | Kind::Volatile | Kind::Const | Kind::Restrict => unreachable!(
            "resolve() strips cv-qualifiers and typedefs before we get here"
        ),
    };
    Ok(align)
}

pub fn size_of_bytes<Q: TypeQuery + ?Sized>(
    q: &Q,
    id: TypeId,
    pointer_size: u64,
) -> Result<u64> {
    let resolved = resolve(q, id)?;
    let kind = q.kind_of(resolved)?;
    match kind {
        Kind::Pointer => Ok(pointer_size),
        Kind::Array => {
            let contents = q.reference_of(resolved)?;
            let elem_size = size_of_bytes(q, contents, pointer_size)?;
            let nelems = q.raw_size_of(resolved)? / elem_size.max(1);
            Ok(elem_size * nelems)
        }
        Kind::Function | Kind::Forward => Ok(0),
        _ => q.raw_size_of(resolved),
    }
}

/// Computes the natural bit offset of the next member of an aggregate
/// given the previous member (if any) and the new member's type.
///
/// `explicit_offset` overrides natural placement when `Some`, exactly
/// as the original's `ctf_add_member_offset` treats any caller-supplied
/// non-sentinel bit offset as authoritative.
pub fn natural_member_offset<Q: TypeQuery + ?Sized>(
    q: &Q,
    prev: Option<(TypeId, u64)>,
    member_ty: TypeId,
    explicit_offset: Option<u64>,
    pointer_size: u64,
) -> Result<u64> {
    if let Some(off) = explicit_offset {
        return Ok(off);
    }
    let align_bits = align_of_bytes(q, member_ty, pointer_size)? * 8;
    let prev_end = match prev {
        None => 0,
        Some((prev_ty, prev_off)) => prev_off + size_of_bits_via(q, prev_ty, pointer_size)?,
    };
    Ok(round_up(prev_end, align_bits.max(1)))
}

/// A member's bit-contribution to the offset of whatever follows it:
/// the encoded bit width for an integer/float (so a `:1` bitfield
/// advances the cursor by one bit, not a whole byte), `sizeof * 8`
/// otherwise.
fn size_of_bits_via<Q: TypeQuery + ?Sized>(q: &Q, id: TypeId, pointer_size: u64) -> Result<u64> {
    let resolved = resolve(q, id)?;
    if let Some(bits) = q.encoding_bits_of(resolved)? {
        return Ok(bits as u64);
    }
    Ok(size_of_bytes(q, id, pointer_size)? * 8)
}

pub fn round_up(value: u64, align: u64) -> u64 {
    if align == 0 {
        return value;
    }
    value.div_ceil(align) * align
}

pub fn payload_members(payload: &TypePayload) -> Option<&[crate::record::MemberRecord]> {
    match payload {
        TypePayload::Members(m) => Some(m),
        _ => None,
    }
}

pub fn err_not_found(id: TypeId) -> CtfError {
    CtfError::BadId(id)
}
