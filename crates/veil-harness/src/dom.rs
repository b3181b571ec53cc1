#![forbid(unsafe_code)]

//! Arena-backed in-memory DOM.
//!
//! Nodes are never freed; detached nodes stay addressable so tests can
//! inspect what the controller left behind. The arena owns one `body`
//! element, created up front, which is the document root.

use std::cell::RefCell;

use veil_core::{Dom, DomError, ElementView, NodeId, Selector, TransitionSupport};

use crate::markup::{self, MarkupElement};

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, String)>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    visible: bool,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            visible: true,
        }
    }
}

impl ElementView for NodeData {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn element_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

struct DomState {
    nodes: Vec<NodeData>,
    body: NodeId,
    transitions: TransitionSupport,
}

impl DomState {
    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.raw() as usize]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.raw() as usize]
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u64);
        self.nodes.push(data);
        id
    }

    fn build(&mut self, element: &MarkupElement) -> NodeId {
        let mut data = NodeData::new(&element.tag);
        data.text = element.text.clone();
        for (name, value) in &element.attrs {
            match name.as_str() {
                "id" => data.id = Some(value.clone()),
                "class" => data.classes = value.split_whitespace().map(String::from).collect(),
                _ => {}
            }
        }
        data.attrs = element.attrs.clone();
        let id = self.alloc(data);
        for child in &element.children {
            let child_id = self.build(child);
            self.link(id, child_id);
        }
        id
    }

    fn unlink(&mut self, child: NodeId) {
        if let Some(parent) = self.node_mut(child).parent.take() {
            self.node_mut(parent).children.retain(|c| *c != child);
        }
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.unlink(child);
        self.node_mut(parent).children.push(child);
        self.node_mut(child).parent = Some(parent);
    }

    fn clone_tree(&mut self, source: NodeId) -> NodeId {
        let mut data = self.node(source).clone();
        let children = std::mem::take(&mut data.children);
        data.parent = None;
        let id = self.alloc(data);
        for child in children {
            let copy = self.clone_tree(child);
            self.link(id, copy);
        }
        id
    }

    fn descendants(&self, scope: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.node(scope).children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.node(node).parent;
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.node(current).parent;
        }
        false
    }
}

/// In-memory [`Dom`] implementation.
pub struct FakeDom {
    state: RefCell<DomState>,
}

impl Default for FakeDom {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDom {
    /// Create a document containing only `body`. Transitions are unsupported
    /// until [`set_transition_support`](Self::set_transition_support).
    #[must_use]
    pub fn new() -> Self {
        let body = NodeData::new("body");
        Self {
            state: RefCell::new(DomState {
                nodes: vec![body],
                body: NodeId::new(0),
                transitions: TransitionSupport::Unsupported,
            }),
        }
    }

    /// The document body.
    #[must_use]
    pub fn body(&self) -> NodeId {
        self.state.borrow().body
    }

    /// Report `support` for every node from now on.
    pub fn set_transition_support(&self, support: TransitionSupport) {
        self.state.borrow_mut().transitions = support;
    }

    /// Number of nodes ever allocated, attached or not.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.state.borrow().nodes.len()
    }

    /// Create a detached element.
    pub fn create_element(&self, tag: &str) -> NodeId {
        self.state.borrow_mut().alloc(NodeData::new(tag))
    }

    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.borrow().node(node).parent
    }

    #[must_use]
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state.borrow().node(node).children.clone()
    }

    /// Whether `node` is attached under `body`.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        let state = self.state.borrow();
        node == state.body || state.is_ancestor(state.body, node)
    }

    /// Whether `node` and all of its ancestors are visible.
    #[must_use]
    pub fn is_rendered(&self, node: NodeId) -> bool {
        let state = self.state.borrow();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            let data = state.node(current);
            if !data.visible {
                return false;
            }
            cursor = data.parent;
        }
        true
    }

    /// The node's own visibility flag.
    #[must_use]
    pub fn is_visible(&self, node: NodeId) -> bool {
        self.state.borrow().node(node).visible
    }

    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.state.borrow().node(node).has_class(class)
    }

    #[must_use]
    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.state.borrow().node(node).classes.clone()
    }

    #[must_use]
    pub fn tag_name(&self, node: NodeId) -> String {
        self.state.borrow().node(node).tag.clone()
    }

    #[must_use]
    pub fn text(&self, node: NodeId) -> String {
        self.state.borrow().node(node).text.clone()
    }

    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.state
            .borrow()
            .node(node)
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    }

    /// All attached nodes matching `selector`, in document order.
    #[must_use]
    pub fn find_in_document(&self, selector: &Selector) -> Vec<NodeId> {
        let body = self.body();
        self.query_all(body, selector)
    }
}

impl Dom for FakeDom {
    fn parse_fragment(&self, markup: &str) -> Result<NodeId, DomError> {
        let roots = markup::parse(markup).map_err(|err| DomError::Parse {
            markup: markup.to_string(),
            reason: err.to_string(),
        })?;
        match roots.as_slice() {
            [] => Err(DomError::EmptyFragment),
            [root] => Ok(self.state.borrow_mut().build(root)),
            _ => Err(DomError::MultipleRoots { count: roots.len() }),
        }
    }

    fn deep_clone(&self, node: NodeId) -> NodeId {
        self.state.borrow_mut().clone_tree(node)
    }

    fn query(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.query_all(scope, selector).into_iter().next()
    }

    fn query_all(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        let state = self.state.borrow();
        let mut all = Vec::new();
        state.descendants(scope, &mut all);
        all.retain(|&id| selector.matches(state.node(id)));
        all
    }

    fn matches(&self, node: NodeId, selector: &Selector) -> bool {
        selector.matches(self.state.borrow().node(node))
    }

    fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor != node && self.state.borrow().is_ancestor(ancestor, node)
    }

    fn append_child(&self, parent: NodeId, child: NodeId) {
        self.state.borrow_mut().link(parent, child);
    }

    fn append_to_body(&self, node: NodeId) {
        let mut state = self.state.borrow_mut();
        let body = state.body;
        state.link(body, node);
    }

    fn detach(&self, node: NodeId) {
        self.state.borrow_mut().unlink(node);
    }

    fn add_class(&self, node: NodeId, class: &str) {
        let mut state = self.state.borrow_mut();
        let data = state.node_mut(node);
        if !data.has_class(class) {
            data.classes.push(class.to_string());
        }
    }

    fn remove_class(&self, node: NodeId, class: &str) {
        self.state
            .borrow_mut()
            .node_mut(node)
            .classes
            .retain(|c| c != class);
    }

    fn set_visible(&self, node: NodeId, visible: bool) {
        self.state.borrow_mut().node_mut(node).visible = visible;
    }

    fn transition_support(&self, _node: NodeId) -> TransitionSupport {
        self.state.borrow().transitions.clone()
    }
}
