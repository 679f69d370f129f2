//! Domain types - pure version model independent of git access

pub mod branch;
pub mod metadata;
pub mod prerelease;
pub mod version;

pub use branch::BranchKind;
pub use metadata::BuildMetaData;
pub use prerelease::{sanitize_label, PreReleaseTag};
pub use version::SemanticVersion;
