//! Reference data and curated inputs.
//!
//! - [`ReferencePanel`]: ordered reference sequences for one molecule family,
//!   with the conserved start motifs used as a pre-filter
//! - [`OverrideSet`]: per-entity manual corrections for a pipeline step
//! - [`ScanLists`]: known/ignored matches and new work carried between runs
//!
//! ## Panel file
//!
//! The panel file is keyed by molecule family. Either form is accepted:
//!
//! ```json
//! {
//!   "class_i": { "HLA-A*02:01": "GSHSMRYFFTSV...", "HLA-B*27:05": "GSHSMRYFHTSV..." },
//!   "class_ii": { "labels": ["HLA-DRA*01:01"], "sequences": ["IKEEHVIIQAEF..."] }
//! }
//! ```
//!
//! Declaration order is kept and acts as the tie-break between references
//! that score equally.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pdb_curator::catalog::ReferencePanel;
//! use std::path::Path;
//!
//! let panel = ReferencePanel::load(
//!     Path::new("assets/sequences/search_sequences.json"),
//!     Path::new("assets/sequences/class_i_starts.json"),
//!     "class_i",
//! )
//! .unwrap();
//! println!("{} references", panel.len());
//! ```

pub mod lists;
pub mod overrides;
pub mod panel;

pub use lists::ScanLists;
pub use overrides::OverrideSet;
pub use panel::{ReferenceEntry, ReferencePanel};
