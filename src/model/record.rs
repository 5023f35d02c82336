use serde::Serialize;

/// An emitted collection entity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectionRecord {
    /// Canonical collection URL (query string stripped)
    pub url: String,

    /// Collection display name
    pub name: Option<String>,

    /// Collection description blurb
    pub description: Option<String>,
}

/// An emitted repository entity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RepositoryRecord {
    /// URL of the collection that listed this repository
    pub collection_url: String,

    /// Repository root URL
    pub url: String,

    /// Repository name
    pub name: Option<String>,

    /// Repository description
    pub description: Option<String>,

    /// Stargazer count from the side panel
    pub stars: Option<u64>,

    /// Watcher count from the side panel
    pub watchers: Option<u64>,

    /// Fork count from the side panel
    pub forks: Option<u64>,

    /// Most recent commit summary from the listing header
    pub last_commit: Option<String>,
}

/// An emitted file entity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileRecord {
    /// File page URL
    pub url: String,

    /// Root URL of the repository containing this file
    pub repository_url: String,

    /// URL of the immediate containing node: the repository root for
    /// top-level files, otherwise the containing directory page
    pub parent_url: String,

    /// File name as displayed in the listing
    pub name: String,
}

/// A typed output value routed to the matching sink stream
///
/// Records are immutable: created by a node handler, consumed exactly once by
/// the sink router, then discarded.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Collection(CollectionRecord),
    Repository(RepositoryRecord),
    File(FileRecord),
}

impl Record {
    /// Short label for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Collection(_) => "collection",
            Record::Repository(_) => "repository",
            Record::File(_) => "file",
        }
    }
}
