//! Integration tests for the crawler
//!
//! These tests use wiremock to simulate the collections listing and verify
//! the full crawl cycle end-to-end, down to the CSV files the sink produces.

use octo_trawl::config::{Config, OutputConfig};
use octo_trawl::crawler::{crawl, CrawlOutcome};
use tempfile::TempDir;
use tokio::sync::watch;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer, out: &TempDir) -> Config {
    let mut config = Config::default();
    config.crawler.seed_url = format!("{}/collections", server.uri());
    config.governor.start_delay_ms = 0;
    config.governor.max_delay_ms = 50;
    config.governor.max_in_flight = 4;
    config.output = OutputConfig {
        collections_path: out.path().join("collections.csv").to_string_lossy().into_owned(),
        repositories_path: out
            .path()
            .join("repositories.csv")
            .to_string_lossy()
            .into_owned(),
        files_path: out.path().join("files.csv").to_string_lossy().into_owned(),
    };
    config
}

fn index_page(collection_paths: &[&str], has_more: bool) -> String {
    let mut body = String::from("<html><body>");
    for p in collection_paths {
        body.push_str(&format!(r#"<article><a href="{}">c</a></article>"#, p));
    }
    if has_more {
        body.push_str(r#"<button class="ajax-pagination-btn">Load more</button>"#);
    }
    body.push_str("</body></html>");
    body
}

fn collection_page(name: &str, repo_paths: &[&str], has_more: bool) -> String {
    let mut body = format!(
        r#"<html><body><h1 class="lh-condensed mb-3">{}</h1>
        <div class="f3 color-fg-muted lh-condensed mb-3">{} description</div>"#,
        name, name
    );
    for p in repo_paths {
        body.push_str(&format!(r#"<article><h1><a href="{}">r</a></h1></article>"#, p));
    }
    if has_more {
        body.push_str(r#"<button class="ajax-pagination-btn">Load more</button>"#);
    }
    body.push_str("</body></html>");
    body
}

fn listing_row(kind: &str, href: &str, name: &str) -> String {
    let icon = match kind {
        "dir" => "octicon octicon-file-directory-fill",
        _ => "octicon octicon-file",
    };
    format!(
        r#"<div class="js-navigation-item"><svg class="{}"></svg><a class="js-navigation-open" href="{}">{}</a></div>"#,
        icon, href, name
    )
}

fn repo_page(name: &str, stars: &str, rows: &[String]) -> String {
    format!(
        r##"<html><body>
        <div><strong><a href="#">{}</a></strong></div>
        <p class="f4 my-3">{} does things</p>
        <span id="repo-stars-counter-star">{}</span>
        <span id="repo-network-counter">7</span>
        {}
        </body></html>"##,
        name,
        name,
        stars,
        rows.join("\n")
    )
}

fn dir_page(rows: &[String]) -> String {
    format!("<html><body>{}</body></html>", rows.join("\n"))
}

async fn mount_page(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Seed index lists two collections; each collection lists one repository;
/// each repository has one top-level file and one subdirectory holding one
/// nested file. Asserts the record counts and the FK chains.
#[tokio::test]
async fn test_full_crawl_scenario() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(
        &server,
        "/collections",
        index_page(&["/collections/one", "/collections/two"], false),
    )
    .await;

    for (collection, owner) in [("one", "alice"), ("two", "bob")] {
        mount_page(
            &server,
            &format!("/collections/{}", collection),
            collection_page(collection, &[&format!("/{}/repo", owner)], false),
        )
        .await;

        mount_page(
            &server,
            &format!("/{}/repo", owner),
            repo_page(
                "repo",
                "1.2k",
                &[
                    listing_row("dir", &format!("/{}/repo/tree/main/src", owner), "src"),
                    listing_row("file", &format!("/{}/repo/blob/main/README.md", owner), "README.md"),
                ],
            ),
        )
        .await;

        mount_page(
            &server,
            &format!("/{}/repo/tree/main/src", owner),
            dir_page(&[listing_row(
                "file",
                &format!("/{}/repo/blob/main/src/lib.rs", owner),
                "lib.rs",
            )]),
        )
        .await;
    }

    let config = test_config(&server, &out);
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = crawl(config.clone(), stop_rx).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(report.tasks_dropped, 0);
    // index + 2 collections + 2 repositories + 2 directories
    assert_eq!(report.pages_fetched, 7);
    assert_eq!(report.collections, 2);
    assert_eq!(report.repositories, 2);
    assert_eq!(report.files, 4);

    let collections = std::fs::read_to_string(&config.output.collections_path).unwrap();
    assert_eq!(collections.lines().count(), 3); // header + 2 records
    assert!(collections.contains(&format!("{}/collections/one", server.uri())));
    assert!(collections.contains(&format!("{}/collections/two", server.uri())));

    // Repository FK: collection_url points back at the spawning collection
    let mut repo_reader = csv::Reader::from_path(&config.output.repositories_path).unwrap();
    let mut repo_rows = Vec::new();
    for row in repo_reader.records() {
        repo_rows.push(row.unwrap());
    }
    assert_eq!(repo_rows.len(), 2);
    for row in &repo_rows {
        let collection_url = row.get(0).unwrap();
        let repo_url = row.get(1).unwrap();
        if repo_url.contains("/alice/") {
            assert_eq!(collection_url, &format!("{}/collections/one", server.uri()));
        } else {
            assert_eq!(collection_url, &format!("{}/collections/two", server.uri()));
        }
        assert_eq!(row.get(4).unwrap(), "1200"); // stars, "1.2k" parsed
    }

    // File FKs: repository_url is depth-invariant, parent_url is the
    // immediate container
    let mut file_reader = csv::Reader::from_path(&config.output.files_path).unwrap();
    let mut file_rows = Vec::new();
    for row in file_reader.records() {
        file_rows.push(row.unwrap());
    }
    assert_eq!(file_rows.len(), 4);
    for row in &file_rows {
        let url = row.get(0).unwrap();
        let repository_url = row.get(1).unwrap();
        let parent_url = row.get(2).unwrap();
        let name = row.get(3).unwrap();

        let owner = if url.contains("/alice/") { "alice" } else { "bob" };
        assert_eq!(repository_url, &format!("{}/{}/repo", server.uri(), owner));

        if name == "README.md" {
            assert_eq!(parent_url, repository_url);
        } else {
            assert_eq!(name, "lib.rs");
            assert_eq!(
                parent_url,
                &format!("{}/{}/repo/tree/main/src", server.uri(), owner)
            );
        }
    }
}

/// A 404 repository drops that subtree only; the sibling collection and
/// repository still complete normally.
#[tokio::test]
async fn test_broken_repository_does_not_abort_crawl() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(
        &server,
        "/collections",
        index_page(&["/collections/one", "/collections/two"], false),
    )
    .await;
    mount_page(
        &server,
        "/collections/one",
        collection_page("one", &["/alice/good"], false),
    )
    .await;
    mount_page(
        &server,
        "/collections/two",
        collection_page("two", &["/bob/broken"], false),
    )
    .await;
    mount_page(
        &server,
        "/alice/good",
        repo_page(
            "good",
            "5",
            &[listing_row("file", "/alice/good/blob/main/main.rs", "main.rs")],
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bob/broken"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = test_config(&server, &out);
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = crawl(config.clone(), stop_rx).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Completed);
    assert_eq!(report.collections, 2);
    assert_eq!(report.repositories, 1);
    assert_eq!(report.tasks_dropped, 1);

    let repositories = std::fs::read_to_string(&config.output.repositories_path).unwrap();
    assert!(repositories.contains("/alice/good"));
    assert!(!repositories.contains("/bob/broken"));

    let files = std::fs::read_to_string(&config.output.files_path).unwrap();
    assert!(files.contains("main.rs"));
}

/// Pagination terminates: with a continuation on page 1 only, exactly the
/// two pages are fetched and no third page task is created.
#[tokio::test]
async fn test_index_pagination_terminates() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/collections"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(index_page(&["/collections/one"], true)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(index_page(&["/collections/two"], false)),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_page(&server, "/collections/one", collection_page("one", &[], false)).await;
    mount_page(&server, "/collections/two", collection_page("two", &[], false)).await;

    let mut config = test_config(&server, &out);
    config.crawler.seed_url = format!("{}/collections?page=1", server.uri());

    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = crawl(config, stop_rx).await.unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Completed);
    // 2 index pages + 2 collection pages, nothing dropped (a page=3 fetch
    // would 404 and show up as a drop)
    assert_eq!(report.pages_fetched, 4);
    assert_eq!(report.tasks_dropped, 0);
    assert_eq!(report.collections, 2);
}

/// A collection spanning two pages emits its record exactly once, and all
/// repositories from both pages carry the same canonical collection URL.
#[tokio::test]
async fn test_paginated_collection_emits_record_once() {
    let server = MockServer::start().await;
    let out = TempDir::new().unwrap();

    mount_page(&server, "/collections", index_page(&["/collections/big?page=1"], false)).await;

    Mock::given(method("GET"))
        .and(path("/collections/big"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(collection_page("big", &["/alice/first"], true)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/collections/big"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(collection_page("big", &["/bob/second"], false)),
        )
        .expect(1)
        .mount(&server)
        .await;

    for repo in ["/alice/first", "/bob/second"] {
        mount_page(&server, repo, repo_page("r", "1", &[])).await;
    }

    let config = test_config(&server, &out);
    let (_stop_tx, stop_rx) = watch::channel(false);
    let report = crawl(config.clone(), stop_rx).await.unwrap();

    assert_eq!(report.collections, 1);
    assert_eq!(report.repositories, 2);

    let collections = std::fs::read_to_string(&config.output.collections_path).unwrap();
    assert_eq!(collections.lines().count(), 2); // header + 1 record

    let expected_fk = format!("{}/collections/big", server.uri());
    let mut repo_reader = csv::Reader::from_path(&config.output.repositories_path).unwrap();
    for row in repo_reader.records() {
        let row = row.unwrap();
        assert_eq!(row.get(0).unwrap(), expected_fk);
    }
}
