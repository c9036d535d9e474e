//! `go-import` TXT record parsing

use std::fmt;

/// Literal that every go-import TXT record starts with.
const GO_IMPORT_PREFIX: &str = "go-import ";

/// One go-import directive: where the source for an import path prefix lives.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ImportDirective {
    /// Import path prefix, e.g. `example.org/foo`
    pub prefix: String,
    /// Version control system (`git`, `hg`, `svn`, `bzr`)
    pub vcs: String,
    /// Repository URL
    pub url: String,
}

impl ImportDirective {
    pub fn new(
        prefix: impl Into<String>,
        vcs: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        ImportDirective {
            prefix: prefix.into(),
            vcs: vcs.into(),
            url: url.into(),
        }
    }
}

impl fmt::Display for ImportDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.prefix, self.vcs, self.url)
    }
}

/// Parse a single TXT string of the form `go-import <prefix> <vcs> <url>`.
///
/// Anything else returns `None`. Malformed records are expected in the wild
/// (SPF, site verification tokens, ...) and are skipped by the caller.
pub fn parse_import(record: &str) -> Option<ImportDirective> {
    let rest = record.strip_prefix(GO_IMPORT_PREFIX)?;

    let mut fields = rest.split_whitespace();
    let prefix = fields.next()?;
    let vcs = fields.next()?;
    let url = fields.next()?;
    if fields.next().is_some() {
        return None;
    }

    Some(ImportDirective::new(prefix, vcs, url))
}
