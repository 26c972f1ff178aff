//! The DOM reconciliation collaborator, treated as a black box.

use crate::{
	dom::Dom,
	error::{Error, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MorphStyle {
	/// Reconcile the target element itself, not only its children.
	#[default]
	OuterHtml,
}

impl MorphStyle {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			MorphStyle::OuterHtml => "outerHTML",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MorphOptions {
	pub style: MorphStyle,
}

/// `morph(target, html, { style })`
pub trait Morph<D: Dom> {
	/// # Errors
	///
	/// [`Error::MissingCollaborator`] iff no morph implementation is available right now.
	/// The caller then falls back to direct outer replacement.
	fn morph(&self, dom: &D, target: &D::Node, html: &str, options: MorphOptions) -> Result<()>;
}

impl<D, F> Morph<D> for F
where
	D: Dom,
	F: Fn(&D, &D::Node, &str, MorphOptions) -> Result<()>,
{
	fn morph(&self, dom: &D, target: &D::Node, html: &str, options: MorphOptions) -> Result<()> {
		self(dom, target, html, options)
	}
}

/// Never available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMorph;

impl<D: Dom> Morph<D> for NoMorph {
	fn morph(&self, _: &D, _: &D::Node, _: &str, _: MorphOptions) -> Result<()> {
		Err(Error::MissingCollaborator)
	}
}
