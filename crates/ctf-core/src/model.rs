/// Fixes the pointer width and the size/alignment of `int`, the way
/// `ctf_setmodel` picks a compilation target in the original. Governs
/// enum size and the natural-alignment layout computed by
/// `add_member_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataModel {
    Ilp32,
    #[default]
    Lp64,
}

impl DataModel {
    pub fn pointer_size(self) -> u64 {
        match self {
            DataModel::Ilp32 => 4,
            DataModel::Lp64 => 8,
        }
    }

    pub fn int_size(self) -> u64 {
        4
    }

    pub fn long_size(self) -> u64 {
        match self {
            DataModel::Ilp32 => 4,
            DataModel::Lp64 => 8,
        }
    }
}
