//! Parameter-tree metadata. The actual field codec is monomorphized per `WireCodec` impl (see
//! `wire.rs`); this module only carries the introspectable shape — a `#[derive(Handler)]`
//! struct emits one `ParamNode` per annotated field, already sorted by `index`, for
//! logging/registry introspection and for asserting order-independence in tests.
use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Direction {
    In,
    Out,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct ParamNode {
    pub name: &'static str,
    pub index: i32,
    pub direction: Direction,
    pub kind: &'static str,
}

impl fmt::Display for ParamNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]:{}", self.name, self.index, self.kind)
    }
}

/// Implemented by `#[derive(Handler)]`. `INPUT`/`OUTPUT` are sorted ascending by `index`
/// (negative indices sort first, matching the generic-pagination-fields-precede-subclass-fields
/// requirement).
pub trait HandlerSchema {
    const CATEGORY: u8;
    const METHOD: u8;
    const REQUIRED_AUTH_LEVEL: u8;
    const INPUT: &'static [ParamNode];
    const OUTPUT: &'static [ParamNode];

    #[inline]
    fn registry_key() -> u16 {
        (Self::CATEGORY as u16) << 8 | Self::METHOD as u16
    }
}
