use ego_tree::{NodeRef, Tree};
use scraper::node::Node;
use scraper::{Html, Selector as CssSelector};

pub use ego_tree::NodeId;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    name: String,
    attrs: Vec<(String, String)>,
}

impl ElementData {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        match self.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.attrs.push((name.to_string(), value.to_string())),
        }
    }

    fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attrs.iter().position(|(key, _)| key == name)?;
        Some(self.attrs.remove(index).1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomNode {
    Root,
    Element(ElementData),
    Text(String),
}

/// Mutable arena tree standing in for the host page's `<body>`.
///
/// Nodes removed with [`Document::detach`] stay addressable by id, so a
/// mutation record can still be inspected after the host dropped the subtree.
/// The arena never shrinks: every detached or orphaned node keeps its slot for
/// the life of the document, and each enhance/teardown cycle adds the nodes it
/// built. A host driver should re-parse the page when [`Document::arena_len`]
/// grows past what it is willing to hold.
#[derive(Debug, Clone)]
pub struct Document {
    tree: Tree<DomNode>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            tree: Tree::new(DomNode::Root),
        }
    }

    /// Parses an HTML page and keeps the content of its `<body>`.
    pub fn parse(html: &str) -> Self {
        let parsed = Html::parse_document(html);
        let mut document = Self::new();
        let body_sel = CssSelector::parse("body").ok();
        let body = body_sel.as_ref().and_then(|sel| parsed.select(sel).next());
        if let Some(body) = body {
            let root = document.root();
            import_children(*body, &mut document, root);
        }
        document
    }

    /// Parses `html` as a body fragment and appends the result to `parent`.
    /// Returns the new top-level nodes.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Vec<NodeId> {
        let parsed = Html::parse_fragment(html);
        let holder = self.create_element("template");
        import_children(*parsed.root_element(), self, holder);
        let added = self.children(holder);
        for node in &added {
            self.append_child(parent, *node);
        }
        added
    }

    pub fn root(&self) -> NodeId {
        self.tree.root().id()
    }

    pub fn node(&self, id: NodeId) -> Option<NodeRef<'_, DomNode>> {
        self.tree.get(id)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.tree.get(id)?.value() {
            DomNode::Element(data) => Some(data),
            _ => None,
        }
    }

    fn with_element_mut<R>(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut ElementData) -> R,
    ) -> Option<R> {
        let mut node = self.tree.get_mut(id)?;
        match node.value() {
            DomNode::Element(data) => Some(f(data)),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(ElementData::name)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.with_element_mut(id, |data| data.set_attr(name, value));
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.with_element_mut(id, |data| data.remove_attr(name))
            .flatten()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|data| data.has_class(class))
    }

    /// Checkbox state is the presence of the `checked` attribute.
    pub fn is_checked(&self, id: NodeId) -> bool {
        self.attr(id, "checked").is_some()
    }

    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if checked {
            self.set_attr(id, "checked", "");
        } else {
            self.remove_attr(id, "checked");
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.tree.get(id)?.parent().map(|parent| parent.id())
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| node.children().map(|child| child.id()).collect())
            .unwrap_or_default()
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .into_iter()
            .filter(|child| self.is_element(*child))
            .collect()
    }

    /// Element descendants in document order, excluding `id` itself.
    pub fn descendant_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| {
                node.descendants()
                    .skip(1)
                    .filter(|d| matches!(d.value(), DomNode::Element(_)))
                    .map(|d| d.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Element ancestors, nearest first.
    pub fn ancestor_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.tree
            .get(id)
            .map(|node| {
                node.ancestors()
                    .filter(|a| matches!(a.value(), DomNode::Element(_)))
                    .map(|a| a.id())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn next_element_sibling(&self, id: NodeId) -> Option<NodeId> {
        let mut sibling = self.tree.get(id)?.next_sibling();
        while let Some(node) = sibling {
            if matches!(node.value(), DomNode::Element(_)) {
                return Some(node.id());
            }
            sibling = node.next_sibling();
        }
        None
    }

    /// Nearest inclusive element ancestor passing `test`.
    pub fn closest_where(&self, id: NodeId, test: impl Fn(NodeId) -> bool) -> Option<NodeId> {
        if self.is_element(id) && test(id) {
            return Some(id);
        }
        self.ancestor_elements(id).into_iter().find(|ancestor| test(*ancestor))
    }

    /// Inclusive: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor
            || self
                .tree
                .get(node)
                .is_some_and(|n| n.ancestors().any(|a| a.id() == ancestor))
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root(), id)
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut text = String::new();
        if let Some(node) = self.tree.get(id) {
            for descendant in node.descendants() {
                if let DomNode::Text(content) = descendant.value() {
                    text.push_str(content);
                }
            }
        }
        text
    }

    /// Trimmed text of the node's direct text children, joined by single spaces.
    pub fn own_text(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        node.children()
            .filter_map(|child| match child.value() {
                DomNode::Text(content) => Some(content.trim()),
                _ => None,
            })
            .filter(|content| !content.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.tree.orphan(DomNode::Element(ElementData::new(name))).id()
    }

    pub fn create_element_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> NodeId {
        let mut data = ElementData::new(name);
        for (key, value) in attrs {
            data.set_attr(key, value);
        }
        self.tree.orphan(DomNode::Element(data)).id()
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.tree.orphan(DomNode::Text(text.to_string())).id()
    }

    /// Moves `child` (detaching it first) to the end of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent == child || self.contains(child, parent) {
            return;
        }
        if let Some(mut node) = self.tree.get_mut(parent) {
            node.append_id(child);
        }
    }

    /// Moves `node` to just before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node || self.contains(node, reference) {
            return;
        }
        if self.parent(reference).is_none() {
            return;
        }
        if let Some(mut target) = self.tree.get_mut(reference) {
            target.insert_id_before(node);
        }
    }

    /// Every node ever created in this document, attached or not.
    pub fn arena_len(&self) -> usize {
        self.tree.nodes().count()
    }

    pub fn detach(&mut self, id: NodeId) {
        if let Some(mut node) = self.tree.get_mut(id) {
            node.detach();
        }
    }

    pub fn remove_children(&mut self, id: NodeId) {
        for child in self.children(id) {
            self.detach(child);
        }
    }

    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.remove_children(id);
        let node = self.create_text(text);
        self.append_child(id, node);
    }

    /// Deep copy of a subtree as a new orphan.
    pub fn clone_subtree(&mut self, id: NodeId) -> Option<NodeId> {
        let value = match self.tree.get(id)?.value() {
            DomNode::Root => return None,
            other => other.clone(),
        };
        let children = self.children(id);
        let copy = self.tree.orphan(value).id();
        for child in children {
            if let Some(child_copy) = self.clone_subtree(child) {
                self.append_child(copy, child_copy);
            }
        }
        Some(copy)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.tree.get(id) {
            serialize(node, &mut out);
        }
        out
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(node) = self.tree.get(id) {
            for child in node.children() {
                serialize(child, &mut out);
            }
        }
        out
    }

    /// Serialisation of the whole document body.
    pub fn html(&self) -> String {
        self.inner_html(self.root())
    }
}

fn import_children(source: NodeRef<'_, Node>, document: &mut Document, parent: NodeId) {
    for child in source.children() {
        match child.value() {
            Node::Element(element) => {
                let mut data = ElementData::new(element.name());
                // Attribute order from the parser is unspecified; sort for stable output.
                let mut attrs: Vec<(&str, &str)> = element.attrs().collect();
                attrs.sort_by(|a, b| a.0.cmp(b.0));
                for (key, value) in attrs {
                    data.set_attr(key, value);
                }
                let id = document.tree.orphan(DomNode::Element(data)).id();
                document.append_child(parent, id);
                import_children(child, document, id);
            }
            Node::Text(text) => {
                let content: &str = text;
                let id = document.create_text(content);
                document.append_child(parent, id);
            }
            _ => {}
        }
    }
}

fn serialize(node: NodeRef<'_, DomNode>, out: &mut String) {
    match node.value() {
        DomNode::Root => {
            for child in node.children() {
                serialize(child, out);
            }
        }
        DomNode::Text(text) => escape_into(text, false, out),
        DomNode::Element(data) => {
            out.push('<');
            out.push_str(&data.name);
            for (key, value) in &data.attrs {
                out.push(' ');
                out.push_str(key);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            if VOID_ELEMENTS.contains(&data.name.as_str()) {
                return;
            }
            for child in node.children() {
                serialize(child, out);
            }
            out.push_str("</");
            out.push_str(&data.name);
            out.push('>');
        }
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            other => out.push(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Document;

    #[test]
    fn parse_keeps_body_content_and_serializes_back() {
        let doc = Document::parse(
            "<html><head><title>x</title></head><body><div id=\"a\" class=\"b c\">Hi <b>there</b></div></body></html>",
        );
        assert_eq!(
            doc.html(),
            "<div class=\"b c\" id=\"a\">Hi <b>there</b></div>"
        );
    }

    #[test]
    fn detached_nodes_remain_readable() {
        let mut doc = Document::parse("<body><p class=\"x\">text</p></body>");
        let p = doc.element_children(doc.root())[0];
        doc.detach(p);
        assert!(!doc.is_attached(p));
        assert!(doc.has_class(p, "x"));
        assert_eq!(doc.text_content(p), "text");
        assert_eq!(doc.html(), "");
    }

    #[test]
    fn detached_nodes_keep_their_arena_slots() {
        let mut doc = Document::parse("<body><ul><li>one</li><li>two</li></ul></body>");
        let ul = doc.element_children(doc.root())[0];
        let before = doc.arena_len();
        doc.detach(ul);
        assert_eq!(doc.arena_len(), before);
        assert_eq!(doc.text_content(ul), "onetwo");

        let copy = doc.clone_subtree(ul).expect("element clones");
        assert_eq!(doc.arena_len(), before + 5);
        assert!(!doc.is_attached(copy));
    }

    #[test]
    fn clone_subtree_is_deep_and_detached() {
        let mut doc = Document::parse("<body><ul><li>one</li><li>two</li></ul></body>");
        let ul = doc.element_children(doc.root())[0];
        let copy = doc.clone_subtree(ul).expect("element clones");
        assert!(!doc.is_attached(copy));
        assert_eq!(doc.outer_html(copy), doc.outer_html(ul));
        doc.append_child(doc.root(), copy);
        assert_eq!(doc.element_children(doc.root()).len(), 2);
    }

    #[test]
    fn append_refuses_cycles() {
        let mut doc = Document::parse("<body><div><span></span></div></body>");
        let div = doc.element_children(doc.root())[0];
        let span = doc.element_children(div)[0];
        doc.append_child(span, div);
        assert_eq!(doc.parent(span), Some(div));
        assert!(doc.is_attached(div));
    }

    #[test]
    fn append_html_adds_fragment_nodes() {
        let mut doc = Document::parse("<body><main></main></body>");
        let main = doc.element_children(doc.root())[0];
        let added = doc.append_html(main, "<p>one</p><p class=\"two\">two</p>");
        assert_eq!(added.len(), 2);
        assert_eq!(doc.parent(added[1]), Some(main));
        assert_eq!(doc.html(), "<main><p>one</p><p class=\"two\">two</p></main>");
    }

    #[test]
    fn checked_is_an_attribute() {
        let mut doc = Document::parse("<body><input type=\"checkbox\"></body>");
        let input = doc.element_children(doc.root())[0];
        assert!(!doc.is_checked(input));
        doc.set_checked(input, true);
        assert!(doc.is_checked(input));
        assert_eq!(doc.html(), "<input type=\"checkbox\" checked=\"\">");
    }
}
