//! Projection of content records into pages or single-page payloads.

use crate::{
    config::{ClientConfig, MissingFieldPolicy},
    markdown::MarkdownProcessor,
    models::ContentRecord,
    templates::{PageTemplate, PostListEntry, PostListTemplate, TemplateError},
};
use askama::Template;
use serde::Serialize;
use std::borrow::Cow;
use thiserror::Error;

/// Header fields every post is expected to carry
pub const POST_FIELDS: [&str; 3] = ["title", "date", "description"];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Post '{slug}' has no '{field}' field")]
    MissingField { slug: String, field: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Failed to serialize single-page payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<askama::Error> for RenderError {
    fn from(err: askama::Error) -> Self {
        RenderError::Template(TemplateError::Render(err))
    }
}

/// Data object for one post in single-page mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostPayload {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub description: String,
    pub content: String,
}

/// Renders records with the site's markdown options and missing-field policy.
///
/// Header values are substituted as written, without HTML escaping, on post
/// pages and in the home page list alike.
#[derive(Debug, Clone)]
pub struct Renderer {
    markdown: MarkdownProcessor,
    policy: MissingFieldPolicy,
    site_title: String,
}

impl Renderer {
    pub fn new(policy: MissingFieldPolicy) -> Self {
        Self {
            markdown: MarkdownProcessor::new(),
            policy,
            site_title: String::new(),
        }
    }

    /// Value for the `{{site_title}}` placeholder in every template
    pub fn with_site_title(mut self, title: impl Into<String>) -> Self {
        self.site_title = title.into();
        self
    }

    pub fn markdown_to_html(&self, markdown: &str) -> String {
        self.markdown.convert(markdown)
    }

    /// Full HTML document for one post.
    ///
    /// Recognised placeholders: `title`, `date`, `description`, `content`
    /// (rendered body), `slug` and `site_title`.
    pub fn render_page(
        &self,
        record: &ContentRecord,
        template: &PageTemplate,
    ) -> Result<String, RenderError> {
        let content_html = self.markdown_to_html(&record.body);

        template.substitute(|name| match name {
            "content" => Ok(Some(Cow::Borrowed(content_html.as_str()))),
            "slug" => Ok(Some(Cow::Borrowed(record.slug.as_str()))),
            "site_title" => Ok(Some(Cow::Borrowed(self.site_title.as_str()))),
            field if POST_FIELDS.contains(&field) => self.field(record, field).map(Some),
            _ => Ok(None),
        })
    }

    /// Home page with `{{postlist}}` replaced by a link to every post and
    /// `{{site_title}}` by the site title
    pub fn render_home(
        &self,
        records: &[ContentRecord],
        template: &PageTemplate,
    ) -> Result<String, RenderError> {
        let posts = records
            .iter()
            .map(|record| {
                Ok(PostListEntry {
                    url: record.url(),
                    title: self.field(record, "title")?.into_owned(),
                    date: record.get("date").unwrap_or_default().to_string(),
                })
            })
            .collect::<Result<Vec<_>, RenderError>>()?;
        let postlist = PostListTemplate { posts: &posts }.render()?;

        template.substitute(|name| match name {
            "postlist" => Ok::<_, RenderError>(Some(Cow::Borrowed(postlist.as_str()))),
            "site_title" => Ok(Some(Cow::Borrowed(self.site_title.as_str()))),
            _ => Ok(None),
        })
    }

    /// Data object for one post
    pub fn post_payload(&self, record: &ContentRecord) -> Result<PostPayload, RenderError> {
        Ok(PostPayload {
            slug: record.slug.clone(),
            title: self.field(record, "title")?.into_owned(),
            date: self.field(record, "date")?.into_owned(),
            description: self.field(record, "description")?.into_owned(),
            content: self.markdown_to_html(&record.body),
        })
    }

    /// The one HTML document of single-page mode.
    ///
    /// Replaces `{{posts}}`, `{{about}}` and `{{config}}` with JSON, and
    /// `{{site_title}}` with the site title.
    pub fn render_single_page(
        &self,
        records: &[ContentRecord],
        about_markdown: &str,
        client_config: &ClientConfig,
        template: &PageTemplate,
    ) -> Result<String, RenderError> {
        let posts = records
            .iter()
            .map(|record| self.post_payload(record))
            .collect::<Result<Vec<_>, _>>()?;

        let posts_json = embeddable_json(&posts)?;
        let about_json = embeddable_json(&self.markdown_to_html(about_markdown))?;
        let config_json = embeddable_json(client_config)?;

        template.substitute(|name| {
            Ok::<_, RenderError>(match name {
                "posts" => Some(Cow::Borrowed(posts_json.as_str())),
                "about" => Some(Cow::Borrowed(about_json.as_str())),
                "config" => Some(Cow::Borrowed(config_json.as_str())),
                "site_title" => Some(Cow::Borrowed(self.site_title.as_str())),
                _ => None,
            })
        })
    }

    fn field<'r>(&self, record: &'r ContentRecord, field: &str) -> Result<Cow<'r, str>, RenderError> {
        match (record.get(field), self.policy) {
            (Some(value), _) => Ok(Cow::Borrowed(value)),
            (None, MissingFieldPolicy::Empty) => Ok(Cow::Borrowed("")),
            (None, MissingFieldPolicy::Error) => Err(RenderError::MissingField {
                slug: record.slug.clone(),
                field: field.to_string(),
            }),
        }
    }
}

/// Serialize to JSON that can sit inside a `<script>` element
fn embeddable_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}
