//! Generic document tree for the legacy html page.
//!
//! The page is parsed with `scraper` and converted once into plain
//! element/text nodes, so the decoder never touches the parser's own
//! node types.

use scraper::{ElementRef, Html};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    /// depth-first, pre-order search for the first element named `name`
    pub fn find_first(&self, name: &str) -> Option<&Element> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if let Node::Element(element) = node {
                if element.name == name {
                    return Some(element);
                }
                stack.extend(element.children.iter().rev());
            }
        }
        None
    }
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    pub fn child_elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.child_elements().filter(move |e| e.name == name)
    }

    pub fn first_child_element(&self) -> Option<&Element> {
        self.child_elements().next()
    }

    /// the trimmed text of the first child, if that child is a text node
    pub fn text(&self) -> &str {
        self.children
            .first()
            .and_then(Node::as_text)
            .map(str::trim)
            .unwrap_or("")
    }
}

/// parse an html document into the generic tree, rooted at `<html>`
pub fn parse_document(source: &str) -> Node {
    let document = Html::parse_document(source);
    Node::Element(convert(document.root_element()))
}

fn convert(element: ElementRef<'_>) -> Element {
    let value = element.value();
    let children = element
        .children()
        .filter_map(|child| match ElementRef::wrap(child) {
            Some(nested) => Some(Node::Element(convert(nested))),
            None => child
                .value()
                .as_text()
                .map(|text| Node::Text(text.text.to_string())),
        })
        .collect();

    Element {
        name: value.name().to_string(),
        attributes: value
            .attrs()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        children,
    }
}
