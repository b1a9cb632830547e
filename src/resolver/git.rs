use git2::{AutotagOption, FetchOptions, Oid, RemoteCallbacks, Repository};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

use crate::{Error, Result};

/// Whether a version names a branch or a tag in its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefKind {
    Branch,
    Tag,
}

/// A version resolved to a commit inside a clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub kind: RefKind,
    pub commit: Oid,
}

/// Fetch options carrying the credential callbacks used for every remote.
pub(crate) fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        // Try SSH agent first for git@ URLs
        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(username) = username_from_url {
                return git2::Cred::ssh_key_from_agent(username);
            }
        }
        // Fall back to default credentials
        git2::Cred::default()
    });

    let mut fo = FetchOptions::new();
    fo.remote_callbacks(callbacks);
    fo
}

/// Clone `url` with all of its branches and tags into `path`.
#[instrument]
pub fn clone_repository(url: &str, path: &Path) -> Result<Repository> {
    let mut fo = fetch_options();
    fo.download_tags(AutotagOption::All);

    let mut builder = git2::build::RepoBuilder::new();
    builder.fetch_options(fo);

    debug!("cloning");
    builder.clone(url, path).map_err(|e| Error::CloneFailed {
        url: url.to_string(),
        source: e,
    })
}

/// Resolve `version` as a remote branch, then as a tag.
pub fn resolve_ref(repo: &Repository, url: &str, version: &str) -> Result<ResolvedRef> {
    let candidates = [
        (RefKind::Branch, format!("refs/remotes/origin/{}", version)),
        (RefKind::Tag, format!("refs/tags/{}", version)),
    ];

    for (kind, refname) in candidates {
        let Ok(reference) = repo.find_reference(&refname) else {
            continue;
        };

        // Handle both lightweight and annotated tags
        if let Ok(commit) = reference.peel_to_commit() {
            debug!(%refname, commit = %commit.id(), "resolved version");
            return Ok(ResolvedRef {
                kind,
                commit: commit.id(),
            });
        }
    }

    Err(Error::RefNotFound {
        url: url.to_string(),
        version: version.to_string(),
    })
}

/// Check out a commit, leaving HEAD detached.
#[instrument(skip(repo))]
pub fn checkout_commit(repo: &Repository, commit: Oid) -> Result<()> {
    debug!("finding commit object");
    let commit_obj = repo.find_commit(commit)?;

    debug!("checking out tree");
    repo.checkout_tree(
        commit_obj.as_object(),
        Some(git2::build::CheckoutBuilder::new().force()),
    )?;

    debug!("setting HEAD to detached state");
    repo.set_head_detached(commit)?;

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use std::fs;

    #[test]
    fn test_clone_and_resolve_tag() {
        let temp_dir = tempfile::tempdir().unwrap();
        let origin = temp_dir.path().join("origin");
        config_repo(&origin);

        let repo = clone_repository(&url(&origin), &temp_dir.path().join("clone")).unwrap();
        let resolved = resolve_ref(&repo, &url(&origin), "v1.0.0").unwrap();
        assert_eq!(resolved.kind, RefKind::Tag);

        checkout_commit(&repo, resolved.commit).unwrap();
        let content = fs::read_to_string(temp_dir.path().join("clone/nvim/init.lua")).unwrap();
        assert_eq!(content, "-- v1.0.0\n");
    }

    #[test]
    fn test_resolve_branch_before_tag() {
        let temp_dir = tempfile::tempdir().unwrap();
        let origin = temp_dir.path().join("origin");
        config_repo(&origin);

        let repo = clone_repository(&url(&origin), &temp_dir.path().join("clone")).unwrap();
        let resolved = resolve_ref(&repo, &url(&origin), "dev").unwrap();
        assert_eq!(resolved.kind, RefKind::Branch);
    }

    #[test]
    fn test_resolve_missing_ref() {
        let temp_dir = tempfile::tempdir().unwrap();
        let origin = temp_dir.path().join("origin");
        config_repo(&origin);

        let repo = clone_repository(&url(&origin), &temp_dir.path().join("clone")).unwrap();
        let result = resolve_ref(&repo, &url(&origin), "v9.9.9");
        assert!(matches!(result, Err(Error::RefNotFound { .. })));
    }

    #[test]
    fn test_clone_unreachable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("no-such-repo");

        let result = clone_repository(&url(&missing), &temp_dir.path().join("clone"));
        assert!(matches!(result, Err(Error::CloneFailed { .. })));
    }
}
