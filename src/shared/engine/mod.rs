//! Operation Engine
//!
//! Pure functions that turn a document plus operations into a new document.
//! The engine owns every mutation semantic and hierarchy invariant; the
//! server only ever swaps in what the engine returns.
//!
//! # Module Structure
//!
//! ```text
//! engine/
//! ├── mod.rs      - Module exports and documentation
//! ├── apply.rs    - apply_operation / apply_operations / replay
//! ├── compose.rs  - group and ungroup planned as primitive batches
//! └── layout.rs   - container alignment (horizontal, vertical, grid)
//! ```

/// Primitive operation application
pub mod apply;

/// Composite intents built from primitives
pub mod compose;

/// Layout-driven repositioning
pub mod layout;

pub use apply::{apply_operation, apply_operations, normalize, replay};
pub use compose::{group, ungroup, GROUP_PADDING};
pub use layout::{align_children, layout_positions, LAYOUT_GAP, LAYOUT_PADDING};
