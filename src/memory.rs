//! An arena-backed in-memory document for headless use.
//!
//! Elements are addressed by [`NodeId`], an index into the arena that stays valid for the lifetime of the
//! [`MemoryDom`]. Outer replacement doesn't parse HTML: the replaced element keeps its identity, loses its
//! children and remembers the fragment, which [`MemoryDom::fragment`] returns.

use crate::dom::Dom;
use core::cell::RefCell;
use hashbrown::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
struct NodeData {
	tag: String,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
	attributes: HashMap<String, String>,
	text: Option<String>,
	fragment: Option<String>,
}

#[derive(Debug)]
pub struct MemoryDom {
	nodes: RefCell<Vec<NodeData>>,
}

impl Default for MemoryDom {
	fn default() -> Self {
		Self::new()
	}
}

impl MemoryDom {
	/// Creates a document containing only its root `<html>` element.
	#[must_use]
	pub fn new() -> Self {
		Self {
			nodes: RefCell::new(vec![NodeData {
				tag: "html".to_owned(),
				parent: None,
				children: Vec::new(),
				attributes: HashMap::new(),
				text: None,
				fragment: None,
			}]),
		}
	}

	#[must_use]
	pub fn root(&self) -> NodeId {
		NodeId(0)
	}

	/// Appends a new element to `parent`'s children.
	pub fn append(&self, parent: NodeId, tag: &str, attributes: &[(&str, &str)]) -> NodeId {
		let mut nodes = self.nodes.borrow_mut();
		let id = NodeId(nodes.len());
		nodes.push(NodeData {
			tag: tag.to_ascii_lowercase(),
			parent: Some(parent),
			children: Vec::new(),
			attributes: attributes.iter().map(|&(name, value)| (name.to_owned(), value.to_owned())).collect(),
			text: None,
			fragment: None,
		});
		nodes[parent.0].children.push(id);
		id
	}

	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<String> {
		self.nodes.borrow()[node.0].text.clone()
	}

	/// The fragment `node` was last replaced with.
	#[must_use]
	pub fn fragment(&self, node: NodeId) -> Option<String> {
		self.nodes.borrow()[node.0].fragment.clone()
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> String {
		self.nodes.borrow()[node.0].tag.clone()
	}

	/// Whether `node` is still reachable from the root.
	#[must_use]
	pub fn is_attached(&self, node: NodeId) -> bool {
		let nodes = self.nodes.borrow();
		let mut current = node;
		loop {
			match nodes[current.0].parent {
				None => return current == self.root(),
				Some(parent) if nodes[parent.0].children.contains(&current) => current = parent,
				Some(_) => return false,
			}
		}
	}

	fn descendants(&self, node: NodeId) -> Vec<NodeId> {
		let nodes = self.nodes.borrow();
		let mut found = Vec::new();
		let mut stack: Vec<NodeId> = nodes[node.0].children.iter().rev().copied().collect();
		while let Some(current) = stack.pop() {
			found.push(current);
			stack.extend(nodes[current.0].children.iter().rev().copied());
		}
		found
	}

	/// Supports `#id`, `.class`, `[attribute]`, `[attribute=value]` and tag names.
	fn matches(&self, node: NodeId, selector: &str) -> bool {
		let nodes = self.nodes.borrow();
		let data = &nodes[node.0];
		if let Some(id) = selector.strip_prefix('#') {
			data.attributes.get("id").map_or(false, |value| value == id)
		} else if let Some(class) = selector.strip_prefix('.') {
			data.attributes.get("class").map_or(false, |value| value.split_whitespace().any(|c| c == class))
		} else if let Some(inner) = selector.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
			match inner.split_once('=') {
				Some((name, expected)) => data.attributes.get(name).map_or(false, |value| value == expected.trim_matches('"')),
				None => data.attributes.contains_key(inner),
			}
		} else {
			data.tag.eq_ignore_ascii_case(selector)
		}
	}
}

impl Dom for MemoryDom {
	type Node = NodeId;

	fn closest(&self, node: &NodeId, attribute: &str) -> Option<NodeId> {
		let nodes = self.nodes.borrow();
		let mut current = Some(*node);
		while let Some(id) = current {
			if nodes[id.0].attributes.contains_key(attribute) {
				return Some(id);
			}
			current = nodes[id.0].parent;
		}
		None
	}

	fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
		self.nodes.borrow()[node.0].attributes.get(name).cloned()
	}

	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) {
		self.nodes.borrow_mut()[node.0].attributes.insert(name.to_owned(), value.to_owned());
	}

	fn descendants_with_attribute(&self, node: &NodeId, attribute: &str) -> Vec<NodeId> {
		let mut found = self.descendants(*node);
		let nodes = self.nodes.borrow();
		found.retain(|id| nodes[id.0].attributes.contains_key(attribute));
		found
	}

	fn set_text_content(&self, node: &NodeId, text: &str) {
		let mut nodes = self.nodes.borrow_mut();
		let children = core::mem::take(&mut nodes[node.0].children);
		for child in children {
			nodes[child.0].parent = None;
		}
		nodes[node.0].text = Some(text.to_owned());
	}

	fn query_selector(&self, selector: &str) -> Option<NodeId> {
		let selector = selector.trim();
		let root = self.root();
		core::iter::once(root).chain(self.descendants(root)).find(|&node| self.matches(node, selector))
	}

	fn form_fields(&self, node: &NodeId) -> Option<Vec<(String, String)>> {
		if self.tag(*node) != "form" {
			return None;
		}
		let nodes = self.nodes.borrow();
		Some(
			self.descendants(*node)
				.into_iter()
				.filter_map(|id| {
					let attributes = &nodes[id.0].attributes;
					let name = attributes.get("name")?;
					Some((name.clone(), attributes.get("value").cloned().unwrap_or_default()))
				})
				.collect(),
		)
	}

	fn replace_outer_html(&self, node: &NodeId, html: &str) {
		let mut nodes = self.nodes.borrow_mut();
		let children = core::mem::take(&mut nodes[node.0].children);
		for child in children {
			nodes[child.0].parent = None;
		}
		nodes[node.0].text = None;
		nodes[node.0].fragment = Some(html.to_owned());
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn closest_is_inclusive() {
		let dom = MemoryDom::new();
		let scope = dom.append(dom.root(), "div", &[("live-scope", "{}")]);
		let button = dom.append(scope, "button", &[]);
		assert_eq!(dom.closest(&button, "live-scope"), Some(scope));
		assert_eq!(dom.closest(&scope, "live-scope"), Some(scope));
		assert_eq!(dom.closest(&dom.root(), "live-scope"), None);
	}

	#[test]
	fn selectors() {
		let dom = MemoryDom::new();
		let body = dom.append(dom.root(), "body", &[]);
		let a = dom.append(body, "DIV", &[("id", "box"), ("class", "card wide")]);
		let b = dom.append(a, "span", &[("data-bind", "count")]);
		assert_eq!(dom.query_selector("#box"), Some(a));
		assert_eq!(dom.query_selector(".wide"), Some(a));
		assert_eq!(dom.query_selector("[data-bind]"), Some(b));
		assert_eq!(dom.query_selector("[data-bind=\"count\"]"), Some(b));
		assert_eq!(dom.query_selector("div"), Some(a));
		assert_eq!(dom.query_selector("#missing"), None);
	}

	#[test]
	fn replacement_detaches_children() {
		let dom = MemoryDom::new();
		let scope = dom.append(dom.root(), "div", &[]);
		let child = dom.append(scope, "span", &[]);
		dom.replace_outer_html(&scope, "<div>new</div>");
		assert_eq!(dom.fragment(scope).as_deref(), Some("<div>new</div>"));
		assert!(dom.is_attached(scope));
		assert!(!dom.is_attached(child));
		assert_eq!(dom.query_selector("span"), None);
	}

	#[test]
	fn form_fields_in_document_order() {
		let dom = MemoryDom::new();
		let form = dom.append(dom.root(), "form", &[]);
		dom.append(form, "input", &[("name", "title"), ("value", "Hello")]);
		dom.append(form, "button", &[]);
		dom.append(form, "input", &[("name", "done")]);
		assert_eq!(dom.form_fields(&form), Some(vec![("title".to_owned(), "Hello".to_owned()), ("done".to_owned(), String::new())]));
		assert_eq!(dom.form_fields(&dom.root()), None);
	}
}
