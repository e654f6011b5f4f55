use std::path::{Path, PathBuf};

use regex::{Captures, Regex};
use serde_yaml::Value;
use walkdir::WalkDir;

use crate::data_models::{AcknowledgedResponse, BulkResponse, IndexedPage};
use crate::error::IndexerError;
use crate::es_client::{EsClient, RawResponse, join_url};
use crate::markdown;
use crate::project::{Action, IndexerOptions, Project, UrlRule, chapter_paths};

/// Builds and maintains the search index from a Markdown documentation tree.
///
/// ```text
/// create:
///     PUT  {es_url}/{index}               (only with index_properties)
///     POST {es_url}/{index}/_bulk?refresh  {"index": {}}\n{page}\n ...
/// delete:
///     DELETE {es_url}/{index}/
/// ```
pub struct Indexer {
    client: EsClient,
    options: IndexerOptions,
    working_dir: PathBuf,
    chapters: Value,
    url_rules: Vec<(Regex, String)>,
}

impl Indexer {
    pub fn new(
        client: EsClient,
        options: IndexerOptions,
        working_dir: PathBuf,
        chapters: Value,
    ) -> Result<Self, IndexerError> {
        let url_rules = compile_url_rules(&options.url_transform)?;
        Ok(Self {
            client,
            options,
            working_dir,
            chapters,
            url_rules,
        })
    }

    pub fn from_project(client: EsClient, project: Project) -> Result<Self, IndexerError> {
        Self::new(
            client,
            project.indexer_options,
            project.src_dir,
            project.chapters,
        )
    }

    pub fn options(&self) -> &IndexerOptions {
        &self.options
    }

    /// Runs the configured actions in order, unless `target` is filtered out.
    pub async fn apply(&self, target: Option<&str>) -> Result<(), IndexerError> {
        log::info!("Applying indexer");
        log::debug!(
            "Allowed targets: {:?}, current target: {:?}",
            self.options.targets,
            target
        );

        if !self.options.allows_target(target) {
            log::info!("Target not allowed, nothing to do");
            return Ok(());
        }

        for action in self.options.actions() {
            log::debug!("Applying action: {:?}", action);
            match action {
                Action::Create => self.create_index().await?,
                Action::Delete => self.delete_index().await?,
                Action::Unknown(name) => log::debug!("Unknown action {name}, skipping"),
            }
        }

        log::info!("Indexer applied");
        Ok(())
    }

    pub async fn create_index(&self) -> Result<(), IndexerError> {
        let index_url = join_url(&self.options.es_url, &self.options.index_name);

        if self.options.has_index_properties() {
            log::debug!("Creating index with specified properties, URL: {index_url}");
            let raw = self
                .client
                .put_json(&index_url, &self.options.index_properties)
                .await?;

            if is_acknowledged(&raw) {
                log::debug!("Index created");
            } else if is_tolerated_error(&raw, 400, "resource_already_exists_exception") {
                log::debug!("Index already exists");
            } else {
                return Err(rejected("Failed to create an index", &raw));
            }
        } else {
            log::debug!("An index without specific properties will be created");
        }

        let pages = self.collect_pages()?;
        if pages.is_empty() {
            log::warn!("No pages with content found, skipping bulk request");
            return Ok(());
        }

        let bulk_url = format!("{}/_bulk?refresh", index_url.trim_end_matches('/'));
        log::debug!("Adding {} pages to the index, URL: {bulk_url}", pages.len());

        let raw = self
            .client
            .post_ndjson(&bulk_url, bulk_body(&pages)?)
            .await?;
        let body: BulkResponse = serde_json::from_str(&raw.body).unwrap_or_default();
        if raw.status != 200 || body.errors != Some(false) {
            return Err(rejected("Failed to add content to the index", &raw));
        }

        log::info!("Indexed {} pages into {}", pages.len(), self.options.index_name);
        Ok(())
    }

    pub async fn delete_index(&self) -> Result<(), IndexerError> {
        let url = format!(
            "{}/",
            join_url(&self.options.es_url, &self.options.index_name)
        );
        log::debug!("Deleting the index, URL: {url}");

        let raw = self.client.delete(&url).await?;
        if is_acknowledged(&raw) {
            log::debug!("Index deleted");
        } else if is_tolerated_error(&raw, 404, "index_not_found_exception") {
            log::debug!("Index does not exist");
        } else {
            return Err(rejected("Failed to delete the index", &raw));
        }
        Ok(())
    }

    /// Source files to index: chapters only, or every `*.md` under the working dir.
    pub fn markdown_files(&self) -> Vec<PathBuf> {
        if self.options.use_chapters {
            log::debug!("Only files mentioned in chapters will be indexed");
            chapter_paths(&self.chapters, &self.working_dir)
        } else {
            log::debug!("All files of the project will be indexed");
            let mut files: Vec<PathBuf> = WalkDir::new(&self.working_dir)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
                .collect();
            files.sort();
            files
        }
    }

    pub fn collect_pages(&self) -> Result<Vec<IndexedPage>, IndexerError> {
        let mut pages = Vec::new();
        for path in self.markdown_files() {
            if let Some(page) = self.build_page(&path)? {
                pages.push(page);
            }
        }
        Ok(pages)
    }

    /// `None` for an empty file.
    pub fn build_page(&self, path: &Path) -> Result<Option<IndexedPage>, IndexerError> {
        log::debug!("Processing the file: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|source| IndexerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        if content.is_empty() {
            log::debug!("File has no content: {}", path.display());
            return Ok(None);
        }

        let url = self.page_url(path);
        let title = markdown::extract_title(&content);
        log::debug!("Adding the page, URL: {url}, title: {:?}", title);

        Ok(Some(IndexedPage::new(
            url,
            title,
            markdown::markdown_to_plaintext(&content),
        )))
    }

    /// Working-dir relative path with every rewrite rule applied in order.
    pub fn page_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.working_dir).unwrap_or(path);
        let mut url = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        for (pattern, replacement) in &self.url_rules {
            url = pattern.replace_all(&url, replacement.as_str()).into_owned();
        }
        url
    }
}

/// Newline-delimited `_bulk` body: an action line before each document.
pub fn bulk_body(pages: &[IndexedPage]) -> Result<String, IndexerError> {
    let mut body = String::new();
    for page in pages {
        body.push_str("{\"index\": {}}\n");
        body.push_str(&serde_json::to_string(page)?);
        body.push('\n');
    }
    Ok(body)
}

fn compile_url_rules(rules: &[UrlRule]) -> Result<Vec<(Regex, String)>, IndexerError> {
    rules
        .iter()
        .map(|rule| {
            Ok((
                Regex::new(&rule.pattern)?,
                normalize_replacement(&rule.replacement),
            ))
        })
        .collect()
}

/// Accepts `\g<1>` / `\g<name>` / `\1` group references next to the native `${1}`.
///
/// A replacement using the backslash forms is read with Python `re.sub`
/// semantics, so any `$` in it is literal.
pub fn normalize_replacement(replacement: &str) -> String {
    static BACKREF: once_cell::sync::Lazy<Regex> = once_cell::sync::Lazy::new(|| {
        Regex::new(r"\\g<(\w+)>|\\(\d+)").expect("backreference pattern is valid")
    });
    if !BACKREF.is_match(replacement) {
        return replacement.to_string();
    }
    let escaped = replacement.replace('$', "$$");
    BACKREF
        .replace_all(&escaped, |caps: &Captures| {
            let group = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            format!("${{{group}}}")
        })
        .into_owned()
}

fn is_acknowledged(raw: &RawResponse) -> bool {
    raw.status == 200
        && serde_json::from_str::<AcknowledgedResponse>(&raw.body)
            .map(|b| b.acknowledged == Some(true))
            .unwrap_or(false)
}

fn is_tolerated_error(raw: &RawResponse, status: u16, error_type: &str) -> bool {
    raw.status == status
        && serde_json::from_str::<AcknowledgedResponse>(&raw.body)
            .ok()
            .and_then(|b| b.error)
            .is_some_and(|e| e.error_type() == Some(error_type))
}

fn rejected(message: &str, raw: &RawResponse) -> IndexerError {
    log::error!("{message}, status: {}, body: {}", raw.status, raw.body);
    IndexerError::Rejected(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indexer(rules: Vec<UrlRule>) -> Indexer {
        let options = IndexerOptions {
            url_transform: rules,
            ..IndexerOptions::default()
        };
        Indexer::new(
            EsClient::with_client(reqwest::Client::new()),
            options,
            PathBuf::from("/work"),
            Value::Null,
        )
        .unwrap()
    }

    #[test]
    fn default_url_rule() {
        let idx = indexer(IndexerOptions::default().url_transform);
        assert_eq!(idx.page_url(Path::new("/work/intro.md")), "/intro/");
        assert_eq!(idx.page_url(Path::new("/work/guide/setup.md")), "/guide/setup/");
        // greedy \S+ keeps the index segment
        assert_eq!(idx.page_url(Path::new("/work/guide/index.md")), "/guide/index/");
    }

    #[test]
    fn rules_apply_in_order() {
        let idx = indexer(vec![
            UrlRule::new(r"\.md$", ".html"),
            UrlRule::new(r"^", "/docs/"),
            UrlRule::new(r"/index\.html$", "/"),
        ]);
        assert_eq!(idx.page_url(Path::new("/work/a/index.md")), "/docs/a/");
    }

    #[test]
    fn python_style_backreferences() {
        assert_eq!(normalize_replacement(r"/\g<1>/"), "/${1}/");
        assert_eq!(normalize_replacement(r"\g<name>-\2"), "${name}-${2}");
        assert_eq!(normalize_replacement("/${1}/"), "/${1}/");

        let idx = indexer(vec![UrlRule::new(r"^(\S+)\.md$", r"/\g<1>.html")]);
        assert_eq!(idx.page_url(Path::new("/work/x.md")), "/x.html");
    }

    #[test]
    fn dollar_is_literal_in_python_style_replacement() {
        assert_eq!(normalize_replacement(r"/v$1/\g<1>/"), "/v$$1/${1}/");

        let idx = indexer(vec![UrlRule::new(r"^(\S+)\.md$", r"/v$1/\g<1>/")]);
        assert_eq!(idx.page_url(Path::new("/work/intro.md")), "/v$1/intro/");
    }

    #[test]
    fn invalid_pattern_fails_construction() {
        let options = IndexerOptions {
            url_transform: vec![UrlRule::new("(unclosed", "x")],
            ..IndexerOptions::default()
        };
        let res = Indexer::new(
            EsClient::with_client(reqwest::Client::new()),
            options,
            PathBuf::from("/work"),
            Value::Null,
        );
        assert!(matches!(res, Err(IndexerError::Regex(_))));
    }

    #[test]
    fn bulk_body_is_ndjson() {
        let pages = vec![
            IndexedPage::new("/a/".into(), Some("A".into()), "alpha".into()),
            IndexedPage::new("/b/".into(), None, "béta \"quoted\"".into()),
        ];
        let body = bulk_body(&pages).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(body.ends_with('\n'));
        assert_eq!(lines[0], "{\"index\": {}}");
        assert_eq!(lines[2], "{\"index\": {}}");

        let second: serde_json::Value = serde_json::from_str(lines[3]).unwrap();
        assert_eq!(second["url"], "/b/");
        assert!(second["title"].is_null());
        assert_eq!(second["content"], "béta \"quoted\"");
        // non-ASCII stays unescaped
        assert!(lines[3].contains("béta"));
    }
}
