//! Applying server fragments and undoing speculation.

use crate::{
	action::ActionDescriptor,
	config::Config,
	dom::Dom,
	morph::{Morph, MorphOptions},
	predict::PredictionResult,
	value::StateMapping,
};
use tracing::{debug, instrument, warn};

/// How a fragment replaces its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapStrategy {
	/// Full-subtree reconciliation through the morph collaborator, falling back to [`SwapStrategy::Replace`].
	Morph,
	/// Direct outer replacement.
	Replace,
}

impl SwapStrategy {
	/// Unknown tokens are reported and treated as [`SwapStrategy::Morph`].
	#[must_use]
	pub fn from_token(token: &str) -> Self {
		match token {
			"morph" => SwapStrategy::Morph,
			"outerHTML" | "replace" => SwapStrategy::Replace,
			unknown => {
				warn!("Unknown swap strategy {:?}, morphing instead.", unknown);
				SwapStrategy::Morph
			}
		}
	}
}

/// What the reconciler ended up doing with a successful response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapPath {
	Morphed,
	Replaced,
	/// Morphing was requested but the collaborator was unavailable; degraded to outer replacement.
	FellBack,
	/// The explicit target selector matched nothing.
	NoTarget,
}

/// Explicit target selector > owning scope > triggering element.
///
/// An explicit selector that matches nothing resolves to [`None`] rather than falling through.
pub fn resolve_target<D: Dom>(dom: &D, action: &ActionDescriptor, scope: Option<&D::Node>, element: &D::Node) -> Option<D::Node> {
	match &action.target_selector {
		Some(selector) => dom.query_selector(selector),
		None => Some(scope.unwrap_or(element).clone()),
	}
}

#[instrument(skip_all, fields(html.len = html.len()))]
pub fn apply<D: Dom, M: Morph<D>>(dom: &D, morph: &M, target: Option<&D::Node>, html: &str, strategy: SwapStrategy) -> SwapPath {
	let target = match target {
		Some(target) => target,
		None => {
			warn!("Action target not found, discarding the response.");
			return SwapPath::NoTarget;
		}
	};

	if cfg!(feature = "dangerous-logging") {
		debug!("Applying fragment to {:?}: {}", target, html);
	}

	match strategy {
		SwapStrategy::Replace => {
			dom.replace_outer_html(target, html);
			SwapPath::Replaced
		}
		SwapStrategy::Morph => match morph.morph(dom, target, html, MorphOptions::default()) {
			Ok(()) => SwapPath::Morphed,
			Err(error) => {
				warn!("{}, falling back to outer replacement.", error);
				dom.replace_outer_html(target, html);
				SwapPath::FellBack
			}
		},
	}
}

/// Restores the scope attribute to the exact pre-speculation envelope and re-renders bound fields.
#[instrument(skip_all)]
pub fn rollback<D: Dom>(dom: &D, config: &Config, scope: &D::Node, record: &PredictionResult) {
	dom.set_attribute(scope, &config.scope_attribute, &record.original_envelope);
	update_bindings(dom, config, scope, &record.original_state);
	debug!("Prediction rolled back.");
}

/// Replaces the text of every descendant bound to a field present in `state`.
pub fn update_bindings<D: Dom>(dom: &D, config: &Config, scope: &D::Node, state: &StateMapping) {
	for bound in dom.descendants_with_attribute(scope, &config.bind_attribute) {
		let text = dom.attribute(&bound, &config.bind_attribute).and_then(|field| state.display(&field));
		if let Some(text) = text {
			dom.set_text_content(&bound, &text);
		}
	}
}
