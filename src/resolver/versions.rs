use git2::{AutotagOption, Repository};
use tracing::{debug, instrument};

use super::git::{RefKind, fetch_options};
use crate::config::TagStyle;
use crate::layout::SCRATCH_PREFIX;
use crate::{Error, Result};

/// A tag or branch offered by a remote repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteVersion {
    /// Ref name as it exists in the repository; this is what gets installed.
    pub name: String,
    pub kind: RefKind,
}

/// Queries remote repositories for the versions they offer.
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionSource {
    tag_style: TagStyle,
}

impl VersionSource {
    pub fn new(tag_style: TagStyle) -> Self {
        Self { tag_style }
    }

    /// Name shown to the user for `version`.
    pub fn display<'a>(&self, version: &'a RemoteVersion) -> &'a str {
        match version.kind {
            RefKind::Tag => self.tag_style.display(&version.name),
            RefKind::Branch => &version.name,
        }
    }

    /// Tags (and optionally branches) of `url`, sorted descending.
    ///
    /// Tags are fetched into a throwaway bare repository, removed when this
    /// returns on any path. Callers treat an error as "unknown", never as
    /// "no versions".
    #[instrument(skip(self))]
    pub fn fetch_versions(&self, url: &str, include_branches: bool) -> Result<Vec<RemoteVersion>> {
        let scratch = tempfile::Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
        debug!(path = %scratch.path().display(), "created scratch repository");

        let repo = Repository::init_bare(scratch.path())?;
        let mut remote = repo.remote_anonymous(url)?;

        let mut refspecs = vec!["+refs/tags/*:refs/tags/*"];
        if include_branches {
            refspecs.push("+refs/heads/*:refs/remotes/origin/*");
        }

        let mut fo = fetch_options();
        fo.download_tags(AutotagOption::None);

        remote
            .fetch(&refspecs, Some(&mut fo), None)
            .map_err(|e| Error::CloneFailed {
                url: url.to_string(),
                source: e,
            })?;

        let mut versions: Vec<RemoteVersion> = repo
            .tag_names(None)?
            .iter()
            .flatten()
            .map(|name| RemoteVersion {
                name: name.to_string(),
                kind: RefKind::Tag,
            })
            .collect();

        if include_branches {
            for reference in repo.references_glob("refs/remotes/origin/*")? {
                let reference = reference?;
                let Some(name) = reference
                    .name()
                    .and_then(|n| n.strip_prefix("refs/remotes/origin/"))
                else {
                    continue;
                };
                if name == "HEAD" {
                    continue;
                }
                versions.push(RemoteVersion {
                    name: name.to_string(),
                    kind: RefKind::Branch,
                });
            }
        }

        versions.sort_by(|a, b| b.name.cmp(&a.name));
        debug!(count = versions.len(), "fetched remote versions");

        Ok(versions)
    }
}
