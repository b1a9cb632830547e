mod git;
mod versions;

pub use git::{RefKind, ResolvedRef, checkout_commit, clone_repository, resolve_ref};
pub use versions::{RemoteVersion, VersionSource};

#[cfg(test)]
pub(crate) use git::fixtures;
