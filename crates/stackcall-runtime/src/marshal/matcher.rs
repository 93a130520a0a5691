//! Structural type matching
//!
//! Pure predicates over slot kinds. Matching never reads slot contents beyond
//! their kind, so it cannot fail on malformed values; those are caught during
//! extraction.

use crate::frame::{Slots, CONTEXT_SLOT};
use crate::types::SemanticType;
use crate::value::SlotKind;

/// Does the slot at `position` structurally satisfy `ty`?
pub fn matches<S: Slots + ?Sized>(slots: &S, position: usize, ty: &SemanticType) -> bool {
    let kind = slots.kind_at(position);
    match ty {
        SemanticType::Number(_) | SemanticType::String => {
            matches!(kind, SlotKind::Number | SlotKind::String)
        }
        SemanticType::Boolean => kind == SlotKind::Boolean,
        SemanticType::Enum(_) => kind == SlotKind::String,
        SemanticType::Optional(_) => true,
        SemanticType::Sequence(_) | SemanticType::Mapping(_, _) => kind == SlotKind::Table,
        SemanticType::Union(alternatives) => match_union(slots, position, alternatives).is_some(),
        SemanticType::Handle(_) => matches!(kind, SlotKind::UserData | SlotKind::LightUserData),
        SemanticType::Callback => kind == SlotKind::Function,
        SemanticType::Context => position == CONTEXT_SLOT,
        SemanticType::Placeholder => kind == SlotKind::None,
    }
}

/// Index of the first alternative matching at `position`, in declared order
pub fn match_union<S: Slots + ?Sized>(
    slots: &S,
    position: usize,
    alternatives: &[SemanticType],
) -> Option<usize> {
    alternatives
        .iter()
        .position(|alt| matches(slots, position, alt))
}
