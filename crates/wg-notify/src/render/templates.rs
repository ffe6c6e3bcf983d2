//! Message templates keyed by event kind.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from building or rendering the template table.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid template file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("template for {rule} does not compile: {source}")]
    Compile {
        rule: String,
        #[source]
        source: Box<handlebars::TemplateError>,
    },

    #[error("template for {rule} cannot be rendered: {source}")]
    Render {
        rule: String,
        #[source]
        source: Box<handlebars::RenderError>,
    },
}

/// Template rule for one event kind.
///
/// Most kinds always produce the same message. `Keyed` rules only produce a
/// message for specific event descriptions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Template {
    Direct(String),
    Keyed(BTreeMap<String, String>),
}

/// Values available to templates.
#[derive(Debug, Clone, Serialize)]
pub struct Placeholders {
    pub title: String,
    pub name: String,
    pub rev: String,
    pub link: String,
    pub ev_id: u64,
}

impl Placeholders {
    fn sample() -> Self {
        Self {
            title: "Example Protocol".to_string(),
            name: "draft-ietf-wg-example".to_string(),
            rev: "00".to_string(),
            link: "https://datatracker.ietf.org/doc/draft-ietf-wg-example/".to_string(),
            ev_id: 1,
        }
    }
}

/// Registry name of a compiled template.
#[derive(Debug, Clone)]
enum Compiled {
    Direct(String),
    Keyed(HashMap<String, String>),
}

/// The compiled template table.
pub struct TemplateSet {
    rules: HashMap<String, Compiled>,
    /// Registry name to the rule it came from, e.g. `changed_state (Adopted)`.
    labels: HashMap<String, String>,
    registry: Handlebars<'static>,
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("kinds", &self.rules.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl TemplateSet {
    /// The built-in announcements.
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::new(builtin_rules())
    }

    /// Load a replacement table from a JSON file.
    ///
    /// Values are either a template string or an object mapping exact event
    /// descriptions to template strings.
    pub fn from_file(path: &Path) -> Result<Self, TemplateError> {
        let content = std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let rules: BTreeMap<String, Template> =
            serde_json::from_str(&content).map_err(|source| TemplateError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        Self::new(rules)
    }

    /// Compile a table. Every template is test-rendered so a typo in a
    /// placeholder fails here rather than mid-run.
    pub fn new(rules: BTreeMap<String, Template>) -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry.register_escape_fn(handlebars::no_escape);

        let mut compiled = HashMap::with_capacity(rules.len());
        let mut labels = HashMap::new();
        let mut next_id = 0usize;
        let mut register = |rule: String, source: &str| -> Result<String, TemplateError> {
            let name = format!("t{next_id}");
            next_id += 1;
            registry
                .register_template_string(&name, source)
                .map_err(|e| TemplateError::Compile {
                    rule: rule.clone(),
                    source: Box::new(e),
                })?;
            registry
                .render(&name, &Placeholders::sample())
                .map_err(|e| TemplateError::Render {
                    rule: rule.clone(),
                    source: Box::new(e),
                })?;
            labels.insert(name.clone(), rule);
            Ok(name)
        };

        for (kind, template) in rules {
            let entry = match template {
                Template::Direct(source) => Compiled::Direct(register(kind.clone(), &source)?),
                Template::Keyed(by_description) => {
                    let mut names = HashMap::with_capacity(by_description.len());
                    for (description, source) in by_description {
                        let name = register(format!("{kind} ({description})"), &source)?;
                        names.insert(description, name);
                    }
                    Compiled::Keyed(names)
                }
            };
            compiled.insert(kind, entry);
        }

        Ok(Self {
            rules: compiled,
            labels,
            registry,
        })
    }

    /// Find the template for an event, if the event is interesting at all.
    #[must_use]
    pub fn lookup(&self, kind: &str, description: &str) -> Option<&str> {
        match self.rules.get(kind)? {
            Compiled::Direct(name) => Some(name.as_str()),
            Compiled::Keyed(by_description) => by_description.get(description).map(String::as_str),
        }
    }

    /// Render a template returned by [`lookup`](Self::lookup).
    pub fn render(&self, template: &str, values: &Placeholders) -> Result<String, TemplateError> {
        self.registry
            .render(template, values)
            .map_err(|e| TemplateError::Render {
                rule: self.rule_label(template).to_string(),
                source: Box::new(e),
            })
    }

    fn rule_label<'a>(&'a self, template: &'a str) -> &'a str {
        self.labels.get(template).map_or(template, String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn builtin_rules() -> BTreeMap<String, Template> {
    let direct = |s: &str| Template::Direct(s.to_string());

    let mut rules = BTreeMap::new();
    rules.insert(
        "iesg_approved".to_string(),
        direct("The IESG has approved {{title}} for publication as an RFC. {{link}}"),
    );
    rules.insert(
        "new_revision".to_string(),
        direct("New revision {{rev}} of {{title}} published. {{link}}"),
    );
    rules.insert(
        "published_rfc".to_string(),
        direct("{{title}} has been published as an RFC. {{link}}"),
    );
    rules.insert(
        "sent_last_call".to_string(),
        direct("IETF Last Call for {{title}} has started. {{link}}"),
    );
    rules.insert(
        "started_iesg_process".to_string(),
        direct("{{title}} has entered evaluation by the IESG. {{link}}"),
    );
    rules.insert(
        "changed_state".to_string(),
        Template::Keyed(BTreeMap::from([(
            "IETF WG state changed to <b>In WG Last Call</b> from WG Document".to_string(),
            "{{title}} is now in Working Group Last Call. {{link}}".to_string(),
        )])),
    );
    rules
}
