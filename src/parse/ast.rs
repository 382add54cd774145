#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Element(ElementNode),
    Text(String),
    /// Construct outside the accepted subset, kept verbatim.
    Opaque(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ElementNode {
    /// Tag name; empty for fragments.
    pub(crate) tag: String,
    pub(crate) attrs: Vec<Attr>,
    pub(crate) children: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Attr {
    pub(crate) name: String,
    pub(crate) value: AttrValue,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AttrValue {
    Static(String),
    /// Attribute present without a value (`<input disabled />`).
    Flag,
    /// Non-static expression, kept verbatim.
    Opaque(String),
}

impl ElementNode {
    pub(crate) fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|a| a.name == name).map(|a| &a.value)
    }

    pub(crate) fn static_attr(&self, name: &str) -> Option<&str> {
        match self.attr(name)? {
            AttrValue::Static(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Class list from `className` or `class`.
    pub(crate) fn class_list(&self) -> &str {
        self.static_attr("className")
            .or_else(|| self.static_attr("class"))
            .unwrap_or("")
    }

    pub(crate) fn is_fragment(&self) -> bool {
        self.tag.is_empty()
    }

    /// Flattened text of all children, whitespace collapsed.
    pub(crate) fn plain_text(&self) -> String {
        let mut out = String::new();
        for c in &self.children {
            c.collect_text(&mut out);
        }
        collapse(&out)
    }

    /// Whether any descendant is an opaque construct.
    pub(crate) fn has_opaque(&self) -> bool {
        self.children.iter().any(|c| match c {
            Node::Opaque(_) => true,
            Node::Element(e) => e.has_opaque(),
            Node::Text(_) => false,
        })
    }
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl Node {
    /// Concatenated text of this node and its descendants, JSX whitespace rules applied.
    pub(crate) fn plain_text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        collapse(&out)
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text(t) | Node::Opaque(t) => {
                out.push_str(t);
            }
            Node::Element(e) => {
                if e.tag == "br" {
                    out.push(' ');
                }
                for c in &e.children {
                    c.collect_text(out);
                }
            }
        }
    }
}
