//! Integration tests for the crawler
//!
//! These tests drive full runs against a scripted in-memory site and check
//! what lands in the output folder and the hash database.

use async_trait::async_trait;
use chrono::Utc;
use site_folio::config::Config;
use site_folio::crawler::{crawl, Coordinator};
use site_folio::export::ExportMode;
use site_folio::render::{RenderError, RenderResult, Renderer};
use site_folio::storage::{HashRecord, RunStatus, SqliteStorage, Storage};
use site_folio::{FolioError, NormalizedUrl};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A canned page: title and HTML, or the error rendering it produces
#[derive(Clone)]
enum Page {
    Html { title: String, html: String },
    Fail(RenderError),
}

/// Serves pages from a map and records the order URLs were rendered in
#[derive(Default)]
struct ScriptedSite {
    pages: Mutex<HashMap<String, Page>>,
    rendered: Mutex<Vec<String>>,
}

impl ScriptedSite {
    fn new() -> Self {
        Self::default()
    }

    fn page(self, url: &str, title: &str, html: &str) -> Self {
        self.set_page(url, title, html);
        self
    }

    fn failing(self, url: &str, error: RenderError) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(url.to_string(), Page::Fail(error));
        self
    }

    fn set_page(&self, url: &str, title: &str, html: &str) {
        self.pages.lock().unwrap().insert(
            url.to_string(),
            Page::Html {
                title: title.to_string(),
                html: html.to_string(),
            },
        );
    }

    fn rendered(&self) -> Vec<String> {
        self.rendered.lock().unwrap().clone()
    }
}

#[async_trait]
impl Renderer for ScriptedSite {
    async fn render(
        &self,
        url: &NormalizedUrl,
        _timeout: Duration,
    ) -> Result<RenderResult, RenderError> {
        self.rendered.lock().unwrap().push(url.to_string());
        let page = self.pages.lock().unwrap().get(url.as_str()).cloned();

        // Let other workers interleave
        tokio::task::yield_now().await;

        match page {
            Some(Page::Html { title, html }) => Ok(RenderResult {
                url: url.clone(),
                document_url: url.as_url().clone(),
                title,
                pdf_bytes: format!(
                    "%PDF-1.4\n<< /CreationDate (D:{}) >>\n{}\n%%EOF",
                    Utc::now().format("%Y%m%d%H%M%S%.f"),
                    html
                )
                .into_bytes(),
                html,
                timestamp: Utc::now(),
            }),
            Some(Page::Fail(error)) => Err(error),
            None => Err(RenderError::Load(format!("no such page: {}", url))),
        }
    }
}

/// Home, 3 sections with 2 articles each (10 pages reachable from the seed),
/// plus a sitemap, about and contact page linked only by [`link_rest`]
fn sample_site() -> ScriptedSite {
    let mut site = ScriptedSite::new().page(
        "https://example.com/",
        "Home",
        r#"<a href="/news">News</a> <a href="/docs/">Docs</a> <a href="/blog">Blog</a>
           <a href="https://other.org/">elsewhere</a>"#,
    );
    for section in ["news", "docs", "blog"] {
        site = site.page(
            &format!("https://example.com/{}", section),
            section,
            &format!(
                r#"<a href="/{s}/one">1</a> <a href="/{s}/two">2</a> <a href="/">home</a>"#,
                s = section
            ),
        );
        for article in ["one", "two"] {
            site = site.page(
                &format!("https://example.com/{}/{}", section, article),
                &format!("{} {}", section, article),
                &format!(r#"<p>{} {}</p><a href="/{}#top">up</a>"#, section, article, section),
            );
        }
    }
    site.page(
        "https://example.com/about",
        "About",
        r#"<a href="/contact">Contact</a>"#,
    )
    .page("https://example.com/contact", "Contact", "<p>mail us</p>")
    .page(
        "https://example.com/sitemap",
        "Sitemap",
        r#"<a href="/about">About</a>"#,
    )
}

/// The home page of `sample_site` with a link to the remaining pages
fn link_rest(site: &ScriptedSite) {
    site.set_page(
        "https://example.com/",
        "Home",
        r#"<a href="/news">News</a> <a href="/docs/">Docs</a> <a href="/blog">Blog</a>
           <a href="/sitemap">Sitemap</a> <a href="https://other.org/">elsewhere</a>"#,
    );
}

struct Workspace {
    _dir: tempfile::TempDir,
    output: PathBuf,
    database: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self {
            output: dir.path().join("out"),
            database: dir.path().join("hashes.db"),
            _dir: dir,
        }
    }

    fn config(&self, workers: usize) -> Config {
        let mut config = Config::default();
        config.crawler.workers = workers;
        config.output.directory = Some(self.output.clone());
        config
    }

    fn storage(&self) -> Arc<Mutex<dyn Storage>> {
        Arc::new(Mutex::new(SqliteStorage::new(&self.database).unwrap()))
    }

    fn records(&self) -> Vec<HashRecord> {
        let storage = SqliteStorage::new(&self.database).unwrap();
        let mut records = storage.list_records().unwrap();
        records.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));
        records
    }

    fn pdf_files(&self) -> Vec<String> {
        list_pdfs(&self.output)
    }
}

fn list_pdfs(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".pdf"))
        .collect();
    files.sort();
    files
}

async fn run(
    workspace: &Workspace,
    site: &Arc<ScriptedSite>,
    workers: usize,
    mode: ExportMode,
) -> site_folio::RunSummary {
    crawl(
        "https://example.com/",
        &workspace.config(workers),
        mode,
        site.clone(),
        workspace.storage(),
    )
    .await
    .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_reachable_page_visited_once() {
    for workers in [1, 2, 8] {
        let workspace = Workspace::new();
        let site = Arc::new(sample_site());
        link_rest(&site);

        let summary = run(&workspace, &site, workers, ExportMode::Append).await;

        assert_eq!(summary.processed, 13, "workers = {}", workers);
        assert_eq!(summary.created, 13, "workers = {}", workers);
        assert_eq!(summary.error_count, 0, "workers = {}", workers);
        assert!(summary.is_complete());

        let mut rendered = site.rendered();
        assert_eq!(rendered.len(), 13, "workers = {}", workers);
        rendered.sort();
        rendered.dedup();
        assert_eq!(rendered.len(), 13, "a page was rendered twice");

        assert!(!rendered.iter().any(|url| url.contains("other.org")));
        assert_eq!(workspace.pdf_files().len(), 13);
        assert_eq!(workspace.records().len(), 13);
    }
}

#[tokio::test]
async fn test_unreachable_pages_not_visited() {
    let workspace = Workspace::new();
    let site = Arc::new(sample_site());

    let summary = run(&workspace, &site, 2, ExportMode::Append).await;

    // about, contact and sitemap are never linked from the seed
    assert_eq!(summary.processed, 10);
    assert!(!site.rendered().iter().any(|url| url.ends_with("/sitemap")));
}

#[tokio::test]
async fn test_second_run_skips_unchanged_pages() {
    let workspace = Workspace::new();
    let site = Arc::new(sample_site());

    let first = run(&workspace, &site, 2, ExportMode::Append).await;
    assert_eq!(first.created, 10);
    let files_before = workspace.pdf_files();
    let records_before = workspace.records();

    let second = run(&workspace, &site, 2, ExportMode::Append).await;

    assert_eq!(second.processed, 10);
    assert_eq!(second.skipped, 10);
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 0);
    assert_eq!(workspace.pdf_files(), files_before);
    assert_eq!(workspace.records(), records_before);
}

#[tokio::test]
async fn test_changed_page_appends_one_version() {
    let workspace = Workspace::new();
    let site = Arc::new(sample_site());
    run(&workspace, &site, 1, ExportMode::Append).await;

    site.set_page(
        "https://example.com/news/one",
        "news one",
        r#"<p>news one, corrected</p><a href="/news">up</a>"#,
    );
    let summary = run(&workspace, &site, 1, ExportMode::Append).await;

    assert_eq!(summary.updated, 1);
    assert_eq!(summary.skipped, 9);
    assert_eq!(summary.created, 0);

    let files = workspace.pdf_files();
    assert_eq!(files.len(), 11);
    assert!(files.contains(&"news_one_one.pdf".to_string()));
    assert!(files.contains(&"news_one_one.v2.pdf".to_string()));

    let record = workspace
        .records()
        .into_iter()
        .find(|r| r.logical_name == "news_one_one")
        .unwrap();
    assert_eq!(record.version, 2);
    assert_eq!(record.pdf_path, "news_one_one.v2.pdf");
}

#[tokio::test]
async fn test_update_mode_replaces_changed_file() {
    let workspace = Workspace::new();
    let site = Arc::new(sample_site());
    run(&workspace, &site, 1, ExportMode::Append).await;

    site.set_page("https://example.com/docs/two", "docs two", "<p>rewritten</p>");
    let summary = run(&workspace, &site, 1, ExportMode::Update).await;

    assert_eq!(summary.updated, 1);
    assert_eq!(workspace.pdf_files().len(), 10);

    let written = std::fs::read(workspace.output.join("docs_two_two.pdf")).unwrap();
    assert!(String::from_utf8_lossy(&written).contains("rewritten"));
}

#[tokio::test]
async fn test_skip_mode_never_rewrites() {
    let workspace = Workspace::new();
    let site = Arc::new(sample_site());
    run(&workspace, &site, 1, ExportMode::Append).await;

    site.set_page("https://example.com/blog/one", "blog one", "<p>new text</p>");
    let summary = run(&workspace, &site, 1, ExportMode::Skip).await;

    assert_eq!(summary.skipped, 10);
    let written = std::fs::read(workspace.output.join("blog_one_one.pdf")).unwrap();
    assert!(!String::from_utf8_lossy(&written).contains("new text"));
}

#[tokio::test]
async fn test_overwrite_mode_rewrites_everything() {
    let workspace = Workspace::new();
    let site = Arc::new(sample_site());
    run(&workspace, &site, 2, ExportMode::Append).await;

    let summary = run(&workspace, &site, 2, ExportMode::Overwrite).await;

    assert_eq!(summary.updated, 10);
    assert_eq!(workspace.pdf_files().len(), 10);
}

#[tokio::test]
async fn test_load_error_does_not_halt_crawl() {
    let workspace = Workspace::new();
    let site = Arc::new(
        sample_site().failing(
            "https://example.com/docs",
            RenderError::Load("net::ERR_CONNECTION_RESET".to_string()),
        ),
    );

    let summary = run(&workspace, &site, 2, ExportMode::Append).await;

    // docs failed, so its two articles were never discovered
    assert_eq!(summary.processed, 8);
    assert_eq!(summary.created, 7);
    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].url, "https://example.com/docs");
    assert!(summary.errors[0].reason.contains("ERR_CONNECTION_RESET"));
    assert!(summary.is_complete());
}

#[tokio::test]
async fn test_same_title_and_segment_get_distinct_names() {
    let workspace = Workspace::new();
    let site = Arc::new(
        ScriptedSite::new()
            .page(
                "https://example.com/",
                "Home",
                r#"<a href="/a/guide.html">A</a> <a href="/b/guide">B</a>"#,
            )
            .page("https://example.com/a/guide.html", "Guide", "<p>first</p>")
            .page("https://example.com/b/guide", "Guide", "<p>second</p>"),
    );

    let summary = run(&workspace, &site, 1, ExportMode::Append).await;

    assert_eq!(summary.created, 3);
    let files = workspace.pdf_files();
    assert!(files.contains(&"Guide_guide.pdf".to_string()));
    assert!(files.contains(&"Guide_guide_1.pdf".to_string()));

    // A second run keeps the same name for each URL
    run(&workspace, &site, 1, ExportMode::Append).await;
    let records = workspace.records();
    let owner = |name: &str| {
        records
            .iter()
            .find(|r| r.logical_name == name)
            .map(|r| r.url.clone())
            .unwrap()
    };
    assert_eq!(owner("Guide_guide"), "https://example.com/a/guide.html");
    assert_eq!(owner("Guide_guide_1"), "https://example.com/b/guide");
}

#[tokio::test]
async fn test_single_worker_is_breadth_first() {
    let workspace = Workspace::new();
    let site = Arc::new(
        ScriptedSite::new()
            .page(
                "https://example.com/",
                "Home",
                r#"<a href="/a">A</a> <a href="/b">B</a>"#,
            )
            .page("https://example.com/a", "A", r#"<a href="/a/deep">deep</a>"#)
            .page("https://example.com/b", "B", r#"<a href="/c">C</a>"#)
            .page("https://example.com/a/deep", "Deep", "<p>deep</p>")
            .page("https://example.com/c", "C", "<p>c</p>"),
    );

    run(&workspace, &site, 1, ExportMode::Append).await;

    assert_eq!(
        site.rendered(),
        vec![
            "https://example.com/",
            "https://example.com/a",
            "https://example.com/b",
            "https://example.com/a/deep",
            "https://example.com/c",
        ]
    );
}

#[tokio::test]
async fn test_other_hosts_not_visited() {
    let workspace = Workspace::new();
    let site = Arc::new(
        ScriptedSite::new()
            .page(
                "https://example.com/",
                "Home",
                r#"<a href="https://docs.example.com/x">sub</a>
                   <a href="https://example.com.evil.net/">lookalike</a>
                   <a href="https://example.com:8443/alt">port</a>
                   <a href="mailto:team@example.com">mail</a>
                   <a href="/only">only</a>"#,
            )
            .page("https://example.com/only", "Only", "<p>only</p>"),
    );

    let summary = run(&workspace, &site, 2, ExportMode::Append).await;

    assert_eq!(summary.processed, 2);
    let mut rendered = site.rendered();
    rendered.sort();
    assert_eq!(
        rendered,
        vec!["https://example.com/", "https://example.com/only"]
    );
}

#[tokio::test]
async fn test_engine_loss_ends_with_partial_summary() {
    let workspace = Workspace::new();
    let site = Arc::new(sample_site().failing(
        "https://example.com/news",
        RenderError::EngineUnavailable("browser process exited".to_string()),
    ));
    let storage = workspace.storage();

    let coordinator = Coordinator::new(
        "https://example.com/",
        &workspace.config(1),
        ExportMode::Append,
        site.clone(),
        storage.clone(),
    )
    .unwrap();
    let (run_id, summary) = coordinator.run().await.unwrap();

    // Home is written before the engine goes away; nothing after news is dispatched
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.created, 1);
    assert_eq!(summary.error_count, 1);
    assert!(summary.aborted.unwrap().contains("browser process exited"));
    assert_eq!(workspace.pdf_files().len(), 1);

    let storage = storage.lock().unwrap();
    let run = storage.get_run(run_id.unwrap()).unwrap();
    assert_eq!(run.status, RunStatus::Aborted);
}

#[tokio::test]
async fn test_invalid_seed_is_fatal() {
    let workspace = Workspace::new();
    let site = Arc::new(ScriptedSite::new());

    for seed in ["mailto:someone@example.com", "https://", "ftp://example.com/"] {
        let result = crawl(
            seed,
            &workspace.config(1),
            ExportMode::Append,
            site.clone(),
            workspace.storage(),
        )
        .await;
        assert!(
            matches!(result, Err(FolioError::InvalidSeed(_))),
            "seed {} should be rejected",
            seed
        );
    }
    assert!(site.rendered().is_empty());
}

#[tokio::test]
async fn test_page_limit_stops_dispatch() {
    let workspace = Workspace::new();
    let site = Arc::new(sample_site());
    let mut config = workspace.config(1);
    config.crawler.max_pages = 4;

    let summary = crawl(
        "https://example.com/",
        &config,
        ExportMode::Append,
        site.clone(),
        workspace.storage(),
    )
    .await
    .unwrap();

    assert_eq!(summary.processed, 4);
    assert_eq!(site.rendered().len(), 4);
}
