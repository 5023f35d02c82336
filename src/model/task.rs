use std::fmt;
use url::Url;

/// The structural role of a page, determining which handler processes it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The paginated directory of collections
    CollectionIndex,

    /// A single collection: a paginated list of repositories
    Collection,

    /// A repository root page with its top-level file listing
    Repository,

    /// A directory page inside a repository's file tree
    Directory,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::CollectionIndex => "collection-index",
            NodeKind::Collection => "collection",
            NodeKind::Repository => "repository",
            NodeKind::Directory => "directory",
        };
        write!(f, "{}", name)
    }
}

/// Parent linkage threaded from a task to its descendant tasks
///
/// A context is append-only: the `with_*` builders return extended copies and
/// nothing ever mutates one in place. Which fields are populated depends on
/// the task kind:
/// - Repository tasks carry `collection_url`
/// - Directory tasks carry `repository_url` and `parent_url`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// URL of the collection that listed this subtree
    pub collection_url: Option<String>,

    /// URL of the repository root this subtree belongs to
    pub repository_url: Option<String>,

    /// URL of the immediate parent node (repository root or ancestor directory)
    pub parent_url: Option<String>,
}

impl Context {
    /// Creates an empty context (used for collection-index and collection tasks)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns a copy with the collection URL set
    pub fn with_collection(&self, url: &str) -> Self {
        Self {
            collection_url: Some(url.to_string()),
            ..self.clone()
        }
    }

    /// Returns a copy with the repository URL set
    pub fn with_repository(&self, url: &str) -> Self {
        Self {
            repository_url: Some(url.to_string()),
            ..self.clone()
        }
    }

    /// Returns a copy with the parent node URL set
    pub fn with_parent(&self, url: &str) -> Self {
        Self {
            parent_url: Some(url.to_string()),
            ..self.clone()
        }
    }
}

/// A unit of pending fetch work
///
/// Tasks are immutable once created. Ownership moves from the handler that
/// discovered the link to the frontier, and from the frontier to the engine
/// for execution; a task is consumed exactly once and never re-queued.
#[derive(Debug, Clone)]
pub struct Task {
    /// The URL to fetch
    pub url: Url,

    /// Which handler processes the fetched document
    pub kind: NodeKind,

    /// Parent linkage to thread into descendant tasks and records
    pub context: Context,

    /// Page number hint, kept in sync with the URL's `page` query parameter
    pub page: u32,
}

impl Task {
    /// Creates a task for a freshly discovered link
    ///
    /// The page hint is derived from the URL so that pagination tasks and
    /// plain links go through the same constructor.
    pub fn new(kind: NodeKind, url: Url, context: Context) -> Self {
        let page = page_number(&url);
        Self {
            url,
            kind,
            context,
            page,
        }
    }

    /// Creates the initial seed task for the collection index
    pub fn seed(url: Url) -> Self {
        Self::new(NodeKind::CollectionIndex, url, Context::empty())
    }

    /// Creates the follow-up task for the next page of the same listing
    ///
    /// The base URL is canonicalized (query stripped) before the new page
    /// number is applied, so `?page=2` never stacks onto an existing query.
    pub fn next_page(&self) -> Self {
        let url = url_for_page(&self.url, self.page + 1);
        Self {
            url,
            kind: self.kind,
            context: self.context.clone(),
            page: self.page + 1,
        }
    }
}

/// Extracts the page number from a URL's `page` query parameter
///
/// Absent or non-numeric values mean page 1, matching the listing's behavior
/// of serving the first page at the bare URL.
pub fn page_number(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.parse().ok())
        .unwrap_or(1)
}

/// Returns the URL with its query string stripped
///
/// The canonical URL is the de-duplication key for paginated listings: every
/// page of the same collection canonicalizes to the same value.
pub fn canonical_url(url: &Url) -> Url {
    let mut canonical = url.clone();
    canonical.set_query(None);
    canonical.set_fragment(None);
    canonical
}

/// Builds the URL for a specific page of a paginated listing
pub fn url_for_page(url: &Url, page: u32) -> Url {
    let mut next = canonical_url(url);
    next.set_query(Some(&format!("page={}", page)));
    next
}
