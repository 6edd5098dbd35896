//! Template loading and placeholder substitution.
//!
//! User templates are plain HTML files with `{{name}}` placeholders. Every
//! occurrence of a placeholder is replaced. Placeholders the caller does not
//! recognise are left in place so client-side templating survives untouched.

use askama::Template;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Failed to load template {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to render built-in template: {0}")]
    Render(#[from] askama::Error),
}

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("static regex")
    })
}

/// A template file read from disk
#[derive(Debug, Clone)]
pub struct PageTemplate {
    path: PathBuf,
    source: String,
}

impl PageTemplate {
    /// Read a template file. A missing file is an error.
    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_source(path, source))
    }

    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the placeholders used in this template, in order of first use
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for caps in placeholder_regex().captures_iter(&self.source) {
            let name = placeholder_name(&caps);
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Replace every placeholder with the value `resolve` returns for it.
    ///
    /// `Ok(None)` keeps the placeholder text as written. The first error
    /// returned by `resolve` aborts the substitution.
    pub fn substitute<'v, F, E>(&self, mut resolve: F) -> Result<String, E>
    where
        F: FnMut(&str) -> Result<Option<Cow<'v, str>>, E>,
    {
        let mut out = String::with_capacity(self.source.len());
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(&self.source) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&self.source[last..whole.start()]);
            match resolve(placeholder_name(&caps))? {
                Some(value) => out.push_str(&value),
                None => out.push_str(whole.as_str()),
            }
            last = whole.end();
        }
        out.push_str(&self.source[last..]);

        Ok(out)
    }
}

fn placeholder_name<'h>(caps: &Captures<'h>) -> &'h str {
    caps.get(1).map_or("", |m| m.as_str())
}

/// One line of the home page post list
#[derive(Debug, Clone)]
pub struct PostListEntry {
    pub url: String,
    pub title: String,
    pub date: String,
}

/// Post list fragment substituted for `{{postlist}}` on the home page.
///
/// Header values are inserted unescaped, the same way post pages insert
/// them, so a title renders identically in both places.
#[derive(Template)]
#[template(
    source = r#"{% for post in posts %}    <li class="post-list-item">
      <a href="{{ post.url|safe }}">{{ post.title|safe }}</a>
      <div class="post-meta">{{ post.date|safe }}</div>
    </li>
{% endfor %}"#,
    ext = "html"
)]
pub struct PostListTemplate<'a> {
    pub posts: &'a [PostListEntry],
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn lookup<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl FnMut(&str) -> Result<Option<Cow<'a, str>>, Infallible> {
        move |name| {
            Ok(pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| Cow::Borrowed(*v)))
        }
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let tpl = PageTemplate::from_source(
            "layout.html",
            "<title>{{title}}</title><h1>{{title}}</h1><p>{{ title }}</p>",
        );
        let out = tpl.substitute(lookup(&[("title", "Hi")])).unwrap();
        assert_eq!(out, "<title>Hi</title><h1>Hi</h1><p>Hi</p>");
    }

    #[test]
    fn test_unknown_placeholders_are_kept() {
        let tpl = PageTemplate::from_source("app.html", "{{posts}} <div>{{ item.name }}</div> {{later}}");
        let out = tpl.substitute(lookup(&[("posts", "[]")])).unwrap();
        assert_eq!(out, "[] <div>{{ item.name }}</div> {{later}}");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let tpl = PageTemplate::from_source("layout.html", "{{content}}|{{title}}");
        let out = tpl
            .substitute(lookup(&[("content", "{{title}}"), ("title", "T")]))
            .unwrap();
        assert_eq!(out, "{{title}}|T");
    }

    #[test]
    fn test_resolver_error_aborts() {
        let tpl = PageTemplate::from_source("layout.html", "{{title}} {{date}}");
        let result: Result<String, String> = tpl.substitute(|name| {
            if name == "date" {
                Err(format!("missing {name}"))
            } else {
                Ok(Some(Cow::Borrowed("x")))
            }
        });
        assert_eq!(result.unwrap_err(), "missing date");
    }

    #[test]
    fn test_placeholders_listed_once() {
        let tpl = PageTemplate::from_source("t", "{{a}}{{b}}{{a}}{{ c }}");
        assert_eq!(tpl.placeholders(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_missing_template() {
        let tmp = tempfile::tempdir().unwrap();
        let err = PageTemplate::load(&tmp.path().join("layout.html")).unwrap_err();
        assert!(matches!(err, TemplateError::Load { .. }));
    }

    #[test]
    fn test_post_list_inserts_titles_verbatim() {
        let posts = vec![PostListEntry {
            url: "/hello-world.html".into(),
            title: "Q&amp;A <em>live</em>".into(),
            date: "2024-01-01".into(),
        }];
        let html = PostListTemplate { posts: &posts }.render().unwrap();
        assert!(html.contains(r#"<a href="/hello-world.html">Q&amp;A <em>live</em></a>"#));
        assert!(!html.contains("&#"));
        assert!(html.contains(r#"<div class="post-meta">2024-01-01</div>"#));
    }
}
