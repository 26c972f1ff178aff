//! The document surface the client needs.
//!
//! Methods take `&self` like [`web_sys`](https://docs.rs/web-sys) does: the document is mutated through shared
//! references on the one logical thread that owns it, including across an action's `.await` points.

use core::fmt::Debug;

pub trait Dom {
	/// A stable element identity. Equality must be identity, not structural equality.
	type Node: Clone + PartialEq + Debug;

	/// The nearest inclusive ancestor of `node` that carries `attribute`.
	fn closest(&self, node: &Self::Node, attribute: &str) -> Option<Self::Node>;

	fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str);

	/// Descendants of `node` (excluding itself) that carry `attribute`, in document order.
	fn descendants_with_attribute(&self, node: &Self::Node, attribute: &str) -> Vec<Self::Node>;

	fn set_text_content(&self, node: &Self::Node, text: &str);

	/// The first element in the document matching `selector`.
	fn query_selector(&self, selector: &str) -> Option<Self::Node>;

	/// The named fields of `node` if it is a form, in document order, otherwise [`None`].
	fn form_fields(&self, node: &Self::Node) -> Option<Vec<(String, String)>>;

	/// Replaces `node` including itself with the parsed `html` fragment.
	fn replace_outer_html(&self, node: &Self::Node, html: &str);
}
