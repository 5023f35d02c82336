//! Node handlers: one per page kind
//!
//! Each handler is a pure function of (page, task) to an outcome of child
//! tasks and emitted records. Handlers never touch shared state; the engine
//! owns pushing tasks onto the frontier and routing records to the sink.
//!
//! Selector strings target the collections listing markup: `article a` for
//! collection links, `article h1 a` for repository links, and
//! `button.ajax-pagination-btn` as the pagination continuation signal.

use crate::crawler::page::{parse_count, Page};
use crate::model::{
    canonical_url, CollectionRecord, Context, FileRecord, NodeKind, Record, RepositoryRecord, Task,
};
use thiserror::Error;
use url::Url;

/// Handler failure; the engine drops the task and continues the crawl
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{kind} task for {url} is missing required context field '{field}'")]
    MissingContext {
        kind: NodeKind,
        url: String,
        field: &'static str,
    },
}

/// What a handler produced from one fetched document
#[derive(Debug, Default)]
pub struct HandlerOutcome {
    /// Newly discovered work for the frontier
    pub tasks: Vec<Task>,

    /// Finished entities for the sink router
    pub records: Vec<Record>,
}

/// Dispatches a fetched document to the handler matching the task's kind
///
/// # Arguments
///
/// * `task` - The task that produced this document
/// * `page` - The parsed document
/// * `base` - Final URL after redirects, used for link resolution and as
///   "this page's URL" in contexts and records
pub fn handle_page(task: &Task, page: &Page, base: &Url) -> Result<HandlerOutcome, HandlerError> {
    match task.kind {
        NodeKind::CollectionIndex => Ok(handle_collection_index(task, page, base)),
        NodeKind::Collection => Ok(handle_collection(task, page, base)),
        NodeKind::Repository => handle_repository(task, page, base),
        NodeKind::Directory => handle_directory(task, page, base),
    }
}

/// Collection-index pages: paginate, and spawn one Collection task per link
fn handle_collection_index(task: &Task, page: &Page, base: &Url) -> HandlerOutcome {
    let mut outcome = HandlerOutcome::default();

    if page.has_continuation() {
        outcome.tasks.push(task.next_page());
    }

    for href in page.attrs("article a", "href") {
        if let Some(url) = resolve_link(base, &href) {
            outcome
                .tasks
                .push(Task::new(NodeKind::Collection, url, Context::empty()));
        }
    }

    outcome
}

/// Collection pages: paginate, spawn Repository tasks carrying this
/// collection's canonical URL, and emit the Collection record on page 1 only
fn handle_collection(task: &Task, page: &Page, base: &Url) -> HandlerOutcome {
    let mut outcome = HandlerOutcome::default();
    let collection_url = canonical_url(base);

    if page.has_continuation() {
        outcome.tasks.push(task.next_page());
    }

    let context = Context::empty().with_collection(collection_url.as_str());
    for href in page.attrs("article h1 a", "href") {
        if let Some(url) = resolve_link(base, &href) {
            outcome
                .tasks
                .push(Task::new(NodeKind::Repository, url, context.clone()));
        }
    }

    // Later pages of the same collection must not re-emit the record; the
    // canonical URL was already covered by page 1.
    if task.page == 1 {
        outcome
            .records
            .push(Record::Collection(CollectionRecord {
                url: collection_url.to_string(),
                name: page.first_text("h1.lh-condensed.mb-3"),
                description: page.first_text(".f3.color-fg-muted.lh-condensed.mb-3"),
            }));
    }

    outcome
}

/// Repository root pages: emit the Repository record, then walk the top-level
/// listing into Directory tasks and File records
fn handle_repository(
    task: &Task,
    page: &Page,
    base: &Url,
) -> Result<HandlerOutcome, HandlerError> {
    let collection_url =
        require_context(task, task.context.collection_url.as_deref(), "collection_url")?;

    let mut outcome = HandlerOutcome::default();
    let repo_url = base.to_string();

    outcome.records.push(Record::Repository(RepositoryRecord {
        collection_url: collection_url.to_string(),
        url: repo_url.clone(),
        name: page.first_text("div strong a"),
        description: page.first_text("p.f4.my-3"),
        stars: page
            .first_text("#repo-stars-counter-star")
            .and_then(|raw| parse_count(&raw)),
        watchers: page
            .first_text("#repo-notifications-counter")
            .or_else(|| page.first_text(r#"a[href$="/watchers"] strong"#))
            .and_then(|raw| parse_count(&raw)),
        forks: page
            .first_text("#repo-network-counter")
            .and_then(|raw| parse_count(&raw)),
        last_commit: page
            .first_text(".Box-header .markdown-title")
            .or_else(|| page.first_attr("relative-time", "datetime")),
    }));

    // Top-level entries: repository root is both repository_url and parent_url
    walk_listing(page, base, &repo_url, None, &mut outcome);

    Ok(outcome)
}

/// Directory pages: structural only, no record; recurse with parent_url
/// rebased to this page and repository_url passed through unchanged
fn handle_directory(task: &Task, page: &Page, base: &Url) -> Result<HandlerOutcome, HandlerError> {
    let repository_url =
        require_context(task, task.context.repository_url.as_deref(), "repository_url")?;
    require_context(task, task.context.parent_url.as_deref(), "parent_url")?;

    let mut outcome = HandlerOutcome::default();
    let repository_url = repository_url.to_string();
    walk_listing(
        page,
        base,
        &repository_url,
        task.context.parent_url.as_deref(),
        &mut outcome,
    );

    Ok(outcome)
}

/// Shared listing walk for repository roots and directories
///
/// Classifies each row by its octicon class: `octicon-file-directory*` marks
/// a directory, `octicon-file` a file. Directory must be checked first since
/// its class name contains the file marker as a prefix. Rows matching neither
/// are logged and skipped.
///
/// Directory links resolving back to this page, the repository root, or the
/// page's own parent (the ".." navigation row) are skipped: recursing into
/// an ancestor would never terminate.
fn walk_listing(
    page: &Page,
    base: &Url,
    repository_url: &str,
    page_parent: Option<&str>,
    outcome: &mut HandlerOutcome,
) {
    let parent_url = base.to_string();

    for row in page.listing_rows() {
        let (Some(href), Some(name)) = (row.href.as_deref(), row.name.as_deref()) else {
            tracing::debug!("Skipping listing row without link under {}", parent_url);
            continue;
        };

        let Some(url) = resolve_link(base, href) else {
            continue;
        };

        if row.icon_classes.contains("octicon-file-directory") {
            let target = url.as_str();
            if target == parent_url
                || target == repository_url
                || page_parent == Some(target)
            {
                tracing::debug!(
                    "Skipping listing entry '{}' linking back to ancestor {}",
                    name,
                    target
                );
                continue;
            }

            let context = Context::empty()
                .with_repository(repository_url)
                .with_parent(&parent_url);
            outcome
                .tasks
                .push(Task::new(NodeKind::Directory, url, context));
        } else if row.icon_classes.contains("octicon-file") {
            outcome.records.push(Record::File(FileRecord {
                url: url.to_string(),
                repository_url: repository_url.to_string(),
                parent_url: parent_url.clone(),
                name: name.to_string(),
            }));
        } else {
            tracing::warn!(
                "Unclassifiable listing entry '{}' under {} (icon classes: '{}')",
                name,
                parent_url,
                row.icon_classes
            );
        }
    }
}

fn require_context<'a>(
    task: &Task,
    value: Option<&'a str>,
    field: &'static str,
) -> Result<&'a str, HandlerError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| HandlerError::MissingContext {
            kind: task.kind,
            url: task.url.to_string(),
            field,
        })
}

fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    match base.join(href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Failed to resolve link '{}' against {}: {}", href, base, e);
            None
        }
    }
}
