//! Domain models for selections, template nodes, class snapshots, and mutation requests.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Selector string identifying a rendered element in a live view.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selector(String);

impl Selector {
    pub fn new(selector: impl Into<String>) -> Self {
        Self(selector.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Selector {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One entry of the editor selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedElement {
    pub selector: Selector,
}

impl SelectedElement {
    pub fn new(selector: impl Into<Selector>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

/// Line/column location inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Handle to the structural source location backing a rendered element.
///
/// The core never inspects the fields beyond equality; they exist so collaborators can map a
/// node back to the code that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateNode {
    pub path: String,
    pub start: Position,
    #[serde(default)]
    pub end: Option<Position>,
    #[serde(default)]
    pub component: Option<String>,
}

impl TemplateNode {
    pub fn new(path: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            path: path.into(),
            start: Position { line, column },
            end: None,
            component: None,
        }
    }

    /// Attach the name of the component this node defines or belongs to.
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }
}

impl fmt::Display for TemplateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.path, self.start.line, self.start.column)?;
        if let Some(component) = &self.component {
            write!(f, " <{component}>")?;
        }
        Ok(())
    }
}

/// Which of the two editable class buffers an operation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BufferTarget {
    /// The selected element itself.
    Instance,
    /// The nearest enclosing component root of the selected element.
    Root,
}

impl BufferTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            BufferTarget::Instance => "instance",
            BufferTarget::Root => "root",
        }
    }
}

impl fmt::Display for BufferTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Class tokens observed for a node at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassSnapshot {
    tokens: Vec<String>,
}

impl ClassSnapshot {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Split a free-form class string on whitespace. Irregular spacing is collapsed, so
    /// `from_class_string(s).joined()` only equals `s` for single-spaced input.
    pub fn from_class_string(classes: &str) -> Self {
        Self {
            tokens: classes.split_whitespace().map(str::to_owned).collect(),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Editable representation: tokens joined by a single space, in fetch order.
    pub fn joined(&self) -> String {
        self.tokens.join(" ")
    }
}

/// Attribute overrides carried by a [`MutationRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeOverrides {
    pub class_name: String,
}

/// Semantic edit handed to the code mutation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRequest {
    pub template_node: TemplateNode,
    pub selector: Selector,
    pub attributes: AttributeOverrides,
    pub inserted_elements: Vec<TemplateNode>,
    pub moved_elements: Vec<TemplateNode>,
    pub removed_elements: Vec<TemplateNode>,
    /// Replace the existing class attribute instead of merging into it.
    pub override_classes: bool,
    pub requested_at: OffsetDateTime,
}

impl MutationRequest {
    /// Request that replaces the class attribute of `node` wholesale with `class_name`.
    pub fn override_classes(
        template_node: TemplateNode,
        selector: Selector,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            template_node,
            selector,
            attributes: AttributeOverrides {
                class_name: class_name.into(),
            },
            inserted_elements: Vec::new(),
            moved_elements: Vec::new(),
            removed_elements: Vec::new(),
            override_classes: true,
            requested_at: OffsetDateTime::now_utc(),
        }
    }

    /// Compare two requests ignoring when they were issued.
    pub fn same_edit(&self, other: &Self) -> bool {
        self.template_node == other.template_node
            && self.selector == other.selector
            && self.attributes == other.attributes
            && self.inserted_elements == other.inserted_elements
            && self.moved_elements == other.moved_elements
            && self.removed_elements == other.removed_elements
            && self.override_classes == other.override_classes
    }
}

/// Change produced by the code mutation service for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDiff {
    pub template_node: TemplateNode,
    pub original: String,
    pub generated: String,
}
