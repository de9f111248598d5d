//! Template Registry and Renderer
//!
//! Templates are compiled once when registered and rendered against the field
//! mapping produced by the override policy. The syntax is deliberately small:
//!
//! - `{{ path.to.field }}` substitutes a value, escaped for the template format
//! - `{{#if path}} ... {{else}} ... {{/if}}` branches on truthiness
//! - `{{#each path}} ... {{/each}}` iterates an array or object, exposing
//!   `this`, `this.field`, `@key` and `@index` inside the body
//!
//! Every referenced path must resolve; a missing field is an error, never
//! empty output.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use execution_notify_core::{NotifyError, NotifyResult};

use super::overrides::RenderPlan;
use crate::utils::escape::{escape_html, escape_markdown_v2};

const TELEGRAM_TEMPLATE: &str = include_str!("../../../templates/telegram-template.html");
const MAIL_TEMPLATE: &str = include_str!("../../../templates/mail-template.html");

/// Markup dialect of a template body
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemplateFormat {
    Html,
    MarkdownV2,
    Plain,
}

impl TemplateFormat {
    /// Escape a substituted value for this format.
    pub fn escape(&self, text: &str) -> String {
        match self {
            Self::Html => escape_html(text),
            Self::MarkdownV2 => escape_markdown_v2(text),
            Self::Plain => text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Var(String),
    If {
        path: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    Each {
        path: String,
        body: Vec<Node>,
    },
}

enum Token {
    Text(String),
    Tag(String),
}

#[derive(PartialEq)]
enum BlockKind {
    If,
    Each,
}

struct OpenBlock {
    kind: BlockKind,
    path: String,
    body: Vec<Node>,
    else_body: Option<Vec<Node>>,
}

impl OpenBlock {
    fn push(&mut self, node: Node) {
        match &mut self.else_body {
            Some(else_body) => else_body.push(node),
            None => self.body.push(node),
        }
    }

    fn close(self) -> Node {
        match self.kind {
            BlockKind::If => Node::If {
                path: self.path,
                then_branch: self.body,
                else_branch: self.else_body.unwrap_or_default(),
            },
            BlockKind::Each => Node::Each {
                path: self.path,
                body: self.body,
            },
        }
    }
}

/// A compiled template
#[derive(Debug, Clone)]
pub struct Template {
    id: String,
    format: TemplateFormat,
    nodes: Vec<Node>,
}

impl Template {
    /// Compile a template source.
    pub fn parse(
        id: impl Into<String>,
        format: TemplateFormat,
        source: &str,
    ) -> NotifyResult<Self> {
        let id = id.into();
        let nodes = parse_nodes(tokenize(source).map_err(|e| with_template_id(&id, e))?)
            .map_err(|e| with_template_id(&id, e))?;
        Ok(Self { id, format, nodes })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn format(&self) -> TemplateFormat {
        self.format
    }

    /// Render against `fields`.
    pub fn render(&self, fields: &Map<String, Value>) -> NotifyResult<String> {
        let mut out = String::new();
        let mut scopes = Vec::new();
        render_nodes(&self.nodes, fields, &mut scopes, self.format, &mut out)?;
        Ok(out)
    }
}

fn with_template_id(id: &str, err: NotifyError) -> NotifyError {
    match err {
        NotifyError::TemplateSyntax(msg) => {
            NotifyError::template_syntax(format!("{} (template '{}')", msg, id))
        }
        other => other,
    }
}

fn tokenize(source: &str) -> NotifyResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| NotifyError::template_syntax("unclosed '{{' tag"))?;
        tokens.push(Token::Tag(after[..end].trim().to_string()));
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    Ok(tokens)
}

fn parse_nodes(tokens: Vec<Token>) -> NotifyResult<Vec<Node>> {
    let mut root = Vec::new();
    let mut stack: Vec<OpenBlock> = Vec::new();

    for token in tokens {
        let node = match token {
            Token::Text(text) => Node::Text(text),
            Token::Tag(tag) => {
                if let Some(path) = tag.strip_prefix("#if ") {
                    stack.push(open_block(BlockKind::If, path)?);
                    continue;
                }
                if let Some(path) = tag.strip_prefix("#each ") {
                    stack.push(open_block(BlockKind::Each, path)?);
                    continue;
                }
                match tag.as_str() {
                    "else" => {
                        match stack.last_mut() {
                            Some(block) if block.kind == BlockKind::If && block.else_body.is_none() => {
                                block.else_body = Some(Vec::new());
                            }
                            _ => return Err(NotifyError::template_syntax("'else' outside of '#if'")),
                        }
                        continue;
                    }
                    "/if" => close_block(&mut stack, BlockKind::If, "/if")?,
                    "/each" => close_block(&mut stack, BlockKind::Each, "/each")?,
                    _ if tag.starts_with('#') || tag.starts_with('/') => {
                        return Err(NotifyError::template_syntax(format!(
                            "unknown block tag '{}'",
                            tag
                        )));
                    }
                    _ => Node::Var(validate_path(&tag)?),
                }
            }
        };

        match stack.last_mut() {
            Some(block) => block.push(node),
            None => root.push(node),
        }
    }

    if let Some(block) = stack.last() {
        return Err(NotifyError::template_syntax(format!(
            "unclosed block for '{}'",
            block.path
        )));
    }
    Ok(root)
}

fn open_block(kind: BlockKind, path: &str) -> NotifyResult<OpenBlock> {
    Ok(OpenBlock {
        kind,
        path: validate_path(path.trim())?,
        body: Vec::new(),
        else_body: None,
    })
}

fn close_block(stack: &mut Vec<OpenBlock>, kind: BlockKind, tag: &str) -> NotifyResult<Node> {
    match stack.pop() {
        Some(block) if block.kind == kind => Ok(block.close()),
        _ => Err(NotifyError::template_syntax(format!(
            "'{}' without matching open block",
            tag
        ))),
    }
}

fn validate_path(path: &str) -> NotifyResult<String> {
    let valid = !path.is_empty()
        && !path.contains(char::is_whitespace)
        && path.split('.').all(|segment| !segment.is_empty());
    if valid {
        Ok(path.to_string())
    } else {
        Err(NotifyError::template_syntax(format!(
            "invalid field reference '{}'",
            path
        )))
    }
}

/// Loop frame of an `#each` block
struct Scope {
    this: Value,
    key: Option<String>,
    index: usize,
}

fn render_nodes(
    nodes: &[Node],
    root: &Map<String, Value>,
    scopes: &mut Vec<Scope>,
    format: TemplateFormat,
    out: &mut String,
) -> NotifyResult<()> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Var(path) => {
                let value = resolve(path, root, scopes)?;
                out.push_str(&format.escape(&stringify(&value)));
            }
            Node::If {
                path,
                then_branch,
                else_branch,
            } => {
                let branch = if is_truthy(&resolve(path, root, scopes)?) {
                    then_branch
                } else {
                    else_branch
                };
                render_nodes(branch, root, scopes, format, out)?;
            }
            Node::Each { path, body } => {
                let items: Vec<(Option<String>, Value)> = match resolve(path, root, scopes)? {
                    Value::Array(items) => items.into_iter().map(|v| (None, v)).collect(),
                    Value::Object(map) => map.into_iter().map(|(k, v)| (Some(k), v)).collect(),
                    Value::Null => Vec::new(),
                    _ => {
                        return Err(NotifyError::unresolved_field(format!(
                            "{} (not iterable)",
                            path
                        )))
                    }
                };
                for (index, (key, this)) in items.into_iter().enumerate() {
                    scopes.push(Scope { this, key, index });
                    let result = render_nodes(body, root, scopes, format, out);
                    scopes.pop();
                    result?;
                }
            }
        }
    }
    Ok(())
}

fn resolve(path: &str, root: &Map<String, Value>, scopes: &[Scope]) -> NotifyResult<Value> {
    let missing = || NotifyError::unresolved_field(path);
    let mut segments = path.split('.');
    let head = segments.next().ok_or_else(missing)?;

    let mut current = match head {
        "this" => scopes.last().map(|s| s.this.clone()).ok_or_else(missing)?,
        "@key" => scopes
            .last()
            .and_then(|s| s.key.clone())
            .map(Value::String)
            .ok_or_else(missing)?,
        "@index" => scopes
            .last()
            .map(|s| Value::from(s.index))
            .ok_or_else(missing)?,
        name => root.get(name).cloned().ok_or_else(missing)?,
    };

    for segment in segments {
        current = match current {
            Value::Object(mut map) => map.remove(segment).ok_or_else(missing)?,
            Value::Array(mut items) => {
                let index: usize = segment.parse().map_err(|_| missing())?;
                if index < items.len() {
                    items.swap_remove(index)
                } else {
                    return Err(missing());
                }
            }
            _ => return Err(missing()),
        };
    }
    Ok(current)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Mapping from template id to compiled template, injected at startup.
#[derive(Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Template>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the bundled `telegram-template` and `mail-template`.
    pub fn with_defaults() -> NotifyResult<Self> {
        let mut registry = Self::new();
        registry.register_source("telegram-template", TemplateFormat::Html, TELEGRAM_TEMPLATE)?;
        registry.register_source("mail-template", TemplateFormat::Html, MAIL_TEMPLATE)?;
        Ok(registry)
    }

    /// Register a compiled template, returning the one it replaced.
    pub fn register(&mut self, template: Template) -> Option<Template> {
        self.templates.insert(template.id.clone(), template)
    }

    /// Compile and register a template source.
    pub fn register_source(
        &mut self,
        id: &str,
        format: TemplateFormat,
        source: &str,
    ) -> NotifyResult<()> {
        let template = Template::parse(id, format, source)?;
        if self.register(template).is_some() {
            tracing::debug!(template_id = %id, "Replaced registered template");
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> NotifyResult<&Template> {
        self.templates
            .get(id)
            .ok_or_else(|| NotifyError::template_not_found(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.templates.contains_key(id)
    }
}

/// Rendered message body together with its markup dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub body: String,
    pub format: TemplateFormat,
}

/// Renders registered templates and literal custom messages.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    registry: Arc<TemplateRegistry>,
}

impl TemplateRenderer {
    pub fn new(registry: Arc<TemplateRegistry>) -> Self {
        Self { registry }
    }

    pub fn render(
        &self,
        template_id: &str,
        fields: &Map<String, Value>,
    ) -> NotifyResult<RenderedMessage> {
        let template = self.registry.get(template_id)?;
        Ok(RenderedMessage {
            body: template.render(fields)?,
            format: template.format(),
        })
    }

    /// Substitute `fields` into a custom message. The result is plain text.
    pub fn render_literal(
        &self,
        message: &str,
        fields: &Map<String, Value>,
    ) -> NotifyResult<RenderedMessage> {
        let template = Template::parse("customMessage", TemplateFormat::Plain, message)?;
        Ok(RenderedMessage {
            body: template.render(fields)?,
            format: TemplateFormat::Plain,
        })
    }

    pub fn render_plan(&self, plan: &RenderPlan) -> NotifyResult<RenderedMessage> {
        match plan {
            RenderPlan::Template {
                template_id,
                fields,
            } => self.render(template_id, fields),
            RenderPlan::Literal { message, fields } => self.render_literal(message, fields),
        }
    }
}
