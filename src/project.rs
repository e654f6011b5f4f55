use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_yaml::Value;

use crate::error::IndexerError;

/// Key of the indexer's entry in the project's `preprocessors` list.
pub const PREPROCESSOR_NAME: &str = "elasticsearch";

pub const DEFAULT_URL_PATTERN: &str = r"^(\S+)(/index)?\.md$";
pub const DEFAULT_URL_REPLACEMENT: &str = "/${1}/";

#[derive(Debug, Clone, PartialEq)]
pub struct UrlRule {
    pub pattern: String,
    pub replacement: String,
}

impl UrlRule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Create,
    Delete,
    Unknown(String),
}

impl From<&str> for Action {
    fn from(s: &str) -> Self {
        match s {
            "create" => Action::Create,
            "delete" => Action::Delete,
            other => Action::Unknown(other.to_string()),
        }
    }
}

/// Indexer settings as written in the project file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IndexerOptions {
    pub es_url: String,
    pub index_name: String,
    /// Body for the index-create request; nothing is sent when empty.
    pub index_properties: serde_json::Value,
    #[serde(deserialize_with = "one_or_many")]
    pub actions: Vec<String>,
    pub use_chapters: bool,
    #[serde(deserialize_with = "url_rules")]
    pub url_transform: Vec<UrlRule>,
    pub targets: Vec<String>,
}

impl Default for IndexerOptions {
    fn default() -> Self {
        Self {
            es_url: "http://127.0.0.1:9200/".to_string(),
            index_name: String::new(),
            index_properties: serde_json::Value::Object(Default::default()),
            actions: vec!["create".to_string()],
            use_chapters: true,
            url_transform: vec![UrlRule::new(DEFAULT_URL_PATTERN, DEFAULT_URL_REPLACEMENT)],
            targets: Vec::new(),
        }
    }
}

impl IndexerOptions {
    pub fn actions(&self) -> Vec<Action> {
        self.actions.iter().map(|a| Action::from(a.as_str())).collect()
    }

    pub fn has_index_properties(&self) -> bool {
        match &self.index_properties {
            serde_json::Value::Null => false,
            serde_json::Value::Object(map) => !map.is_empty(),
            serde_json::Value::Array(items) => !items.is_empty(),
            _ => true,
        }
    }

    /// An empty `targets` list allows every target.
    pub fn allows_target(&self, target: Option<&str>) -> bool {
        if self.targets.is_empty() {
            return true;
        }
        target.is_some_and(|t| self.targets.iter().any(|allowed| allowed == t))
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, IndexerError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<OneOrMany<T>> for Vec<T> {
    fn from(value: OneOrMany<T>) -> Self {
        match value {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    OneOrMany::<T>::deserialize(deserializer).map(Vec::from)
}

/// Each rule map may hold several `pattern: replacement` pairs; file order is kept.
fn url_rules<'de, D>(deserializer: D) -> Result<Vec<UrlRule>, D::Error>
where
    D: Deserializer<'de>,
{
    let maps: Vec<serde_yaml::Mapping> = one_or_many(deserializer)?;
    let mut rules = Vec::new();
    for map in maps {
        for (pattern, replacement) in map {
            match (pattern, replacement) {
                (Value::String(pattern), Value::String(replacement)) => {
                    rules.push(UrlRule::new(pattern, replacement))
                }
                _ => {
                    return Err(serde::de::Error::custom(
                        "url_transform rules must map a string pattern to a string replacement",
                    ));
                }
            }
        }
    }
    Ok(rules)
}

/// A documentation project file (`foliant.yml`-style).
#[derive(Debug, Clone)]
pub struct Project {
    /// Directory holding the project file.
    pub root: PathBuf,
    /// Directory chapter paths are relative to.
    pub src_dir: PathBuf,
    pub chapters: Value,
    pub indexer_options: IndexerOptions,
}

impl Project {
    pub fn load(path: &Path) -> Result<Self, IndexerError> {
        let text = std::fs::read_to_string(path).map_err(|source| IndexerError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::from_yaml(&text, root)
    }

    pub fn from_yaml(yaml: &str, root: PathBuf) -> Result<Self, IndexerError> {
        let doc: Value = serde_yaml::from_str(yaml)?;

        let src_dir = doc
            .get("src_dir")
            .and_then(Value::as_str)
            .unwrap_or("src");
        let chapters = doc.get("chapters").cloned().unwrap_or(Value::Null);

        let indexer_options = match find_preprocessor(&doc, PREPROCESSOR_NAME) {
            Some(Value::Null) | None => IndexerOptions::default(),
            Some(options) => serde_yaml::from_value(options)?,
        };

        Ok(Self {
            src_dir: root.join(src_dir),
            root,
            chapters,
            indexer_options,
        })
    }
}

/// Entries of `preprocessors` are either a bare name or a `{name: options}` map.
fn find_preprocessor(doc: &Value, name: &str) -> Option<Value> {
    let preprocessors = doc.get("preprocessors")?.as_sequence()?;
    for entry in preprocessors {
        match entry {
            Value::String(s) if s == name => return Some(Value::Null),
            Value::Mapping(map) => {
                if let Some(options) = map.get(name) {
                    return Some(options.clone());
                }
            }
            _ => {}
        }
    }
    None
}

/// Markdown files named anywhere in a (possibly nested) chapters tree, in order.
pub fn chapter_paths(chapters: &Value, working_dir: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    collect_chapters(chapters, working_dir, &mut out);
    log::debug!("Chapters files paths: {:?}", out);
    out
}

fn collect_chapters(node: &Value, working_dir: &Path, out: &mut Vec<PathBuf>) {
    match node {
        Value::String(s) if s.ends_with(".md") => out.push(working_dir.join(s)),
        Value::Sequence(items) => {
            for item in items {
                collect_chapters(item, working_dir, out);
            }
        }
        Value::Mapping(map) => {
            for (_, value) in map {
                collect_chapters(value, working_dir, out);
            }
        }
        Value::Tagged(tagged) => collect_chapters(&tagged.value, working_dir, out),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_preprocessor_has_no_options() {
        let project = Project::from_yaml(
            "title: Docs\nchapters:\n  - index.md\npreprocessors:\n  - elasticsearch\n",
            PathBuf::from("/proj"),
        )
        .unwrap();
        let opts = &project.indexer_options;
        assert_eq!(opts.es_url, "http://127.0.0.1:9200/");
        assert_eq!(opts.actions(), vec![Action::Create]);
        assert!(opts.use_chapters);
        assert!(!opts.has_index_properties());
        assert_eq!(
            opts.url_transform,
            vec![UrlRule::new(DEFAULT_URL_PATTERN, DEFAULT_URL_REPLACEMENT)]
        );
        assert_eq!(project.src_dir, PathBuf::from("/proj/src"));
    }

    #[test]
    fn parses_full_options() {
        let yaml = r#"
src_dir: content
chapters:
  - index.md
preprocessors:
  - includes
  - elasticsearch:
      es_url: http://es.local:9200
      index_name: docs_itv
      index_properties:
        settings:
          number_of_shards: 1
      actions: [delete, create, reindex]
      use_chapters: false
      url_transform:
        - '^(\S+)\.md$': '/${1}.html'
          '^/index\.html$': '/'
        - 'foo': 'bar'
      targets: [site]
"#;
        let project = Project::from_yaml(yaml, PathBuf::from("/p")).unwrap();
        let opts = project.indexer_options;
        assert_eq!(opts.index_name, "docs_itv");
        assert!(opts.has_index_properties());
        assert_eq!(opts.index_properties["settings"]["number_of_shards"], 1);
        assert_eq!(
            opts.actions(),
            vec![
                Action::Delete,
                Action::Create,
                Action::Unknown("reindex".into())
            ]
        );
        assert!(!opts.use_chapters);
        assert_eq!(
            opts.url_transform,
            vec![
                UrlRule::new(r"^(\S+)\.md$", "/${1}.html"),
                UrlRule::new(r"^/index\.html$", "/"),
                UrlRule::new("foo", "bar"),
            ]
        );
        assert!(opts.allows_target(Some("site")));
        assert!(!opts.allows_target(Some("pdf")));
        assert!(!opts.allows_target(None));
        assert_eq!(project.src_dir, PathBuf::from("/p/content"));
    }

    #[test]
    fn scalar_action_and_single_rule_map() {
        let opts = IndexerOptions::from_yaml(
            "actions: delete\nurl_transform:\n  '\\.md$': '/'\n",
        )
        .unwrap();
        assert_eq!(opts.actions(), vec![Action::Delete]);
        assert_eq!(opts.url_transform, vec![UrlRule::new(r"\.md$", "/")]);
    }

    #[test]
    fn empty_targets_allow_everything() {
        let opts = IndexerOptions::default();
        assert!(opts.allows_target(None));
        assert!(opts.allows_target(Some("anything")));
    }

    #[test]
    fn chapters_walk_nested_structure() {
        let chapters: Value = serde_yaml::from_str(
            r#"
- index.md
- Guide:
    - guide/install.md
    - guide/usage.md
    - Deep:
        - guide/deep/one.md
- notes.txt
- Reference:
    api: ref/api.md
"#,
        )
        .unwrap();
        let paths = chapter_paths(&chapters, Path::new("/w"));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/w/index.md"),
                PathBuf::from("/w/guide/install.md"),
                PathBuf::from("/w/guide/usage.md"),
                PathBuf::from("/w/guide/deep/one.md"),
                PathBuf::from("/w/ref/api.md"),
            ]
        );
    }

    #[test]
    fn invalid_rule_value_is_rejected() {
        let err = IndexerOptions::from_yaml("url_transform:\n  - 'a': [1, 2]\n");
        assert!(err.is_err());
    }
}
