//! Post-level reconciliation: ownership, the visibility overlay, the
//! delete/hide fallback chain, and optimistic like/comment mutations.

pub mod hide;
pub mod optimistic;
pub mod overlay;
pub mod ownership;

pub use hide::{HideCoordinator, HideOutcome};
pub use optimistic::{
    apply_like_toggle, apply_provisional_comment, LikeUndo, MutationCoordinator,
    ProvisionalComment,
};
pub use overlay::VisibilityOverlay;
pub use ownership::is_owner;
