/// Child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attributes in document order, values unescaped.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// `<name>text</name>`
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut el = Self::new(name);
        el.children.push(Node::Text(text.into()));
        el
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    /// Direct text and CDATA content, trimmed. `None` when blank.
    pub fn text(&self) -> Option<String> {
        let mut out = String::new();
        for child in &self.children {
            if let Node::Text(t) | Node::CData(t) = child {
                out.push_str(t);
            }
        }
        let trimmed = out.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.name == name)
    }

    /// First direct child named `name`.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|e| e.name == name)
    }

    /// Every descendant (not `self`) named `name`, in document order.
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        collect_named(self, name, &mut out);
        out
    }

    /// First descendant (not `self`) named `name`.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Element> {
        for child in &mut self.children {
            if let Node::Element(e) = child {
                if e.name == name {
                    return Some(e);
                }
                if let Some(found) = e.find_mut(name) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Calls `f` on every descendant named `name`. Matches are not searched
    /// for nested matches.
    pub fn for_each_named_mut<F>(&mut self, name: &str, f: &mut F)
    where
        F: FnMut(&mut Element),
    {
        for child in &mut self.children {
            if let Node::Element(e) = child {
                if e.name == name {
                    f(e);
                } else {
                    e.for_each_named_mut(name, f);
                }
            }
        }
    }

    pub fn push_child(&mut self, el: Element) {
        self.children.push(Node::Element(el));
    }

    /// Removes direct element children for which `keep` returns false.
    /// Returns how many were removed.
    pub fn retain_elements<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Element) -> bool,
    {
        let before = self.children.len();
        self.children.retain(|c| match c {
            Node::Element(e) => keep(e),
            _ => true,
        });
        before - self.children.len()
    }

    pub fn remove_children_named(&mut self, name: &str) -> usize {
        self.retain_elements(|e| e.name != name)
    }
}

fn collect_named<'a>(el: &'a Element, name: &str, out: &mut Vec<&'a Element>) {
    for child in el.elements() {
        if child.name == name {
            out.push(child);
        }
        collect_named(child, name, out);
    }
}
