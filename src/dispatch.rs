use crate::{
	action::{self, ActionDescriptor},
	config::Config,
	dom::Dom,
	envelope::SignaturePolicy,
	error::{Error, RequestFailure, Result},
	gate::{PendingGuard, ScopeRegistry},
	morph::Morph,
	predict::{self, PredictionResult},
	reconcile::{self, SwapPath},
	transport::Transport,
};
use core::cell::RefCell;
use serde_json::{Map, Value as Json};
use tracing::{debug, error, info, instrument, trace, warn};

/// Request body for actions outside of any scope.
pub const EMPTY_BODY: &str = "{}";

/// How a triggered action ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
	/// No trigger for this event type.
	Ignored,
	/// The trigger could not be dispatched, see [`Error::DeprecatedCommand`].
	Abandoned(Error),
	/// The owning scope already had an action in flight. No request was sent.
	Rejected,
	/// The response was applied to the document.
	Settled(SwapPath),
	/// The request failed. `rolled_back` is `true` iff speculative state was restored.
	Failed { error: Error, rolled_back: bool },
}

/// The client half of the action protocol, for one document.
///
/// # Correct Use
///
/// All actions of a document must go through one [`Client`], since its registry is what serialises actions per scope.
/// Actions in distinct scopes are independent and may be in flight concurrently.
#[derive(Debug)]
pub struct Client<D: Dom, T, M> {
	config: Config,
	dom: D,
	transport: T,
	morph: M,
	registry: RefCell<ScopeRegistry<D::Node>>,
}

impl<D: Dom, T: Transport, M: Morph<D>> Client<D, T, M> {
	pub fn new(config: Config, dom: D, transport: T, morph: M) -> Self {
		Self {
			config,
			dom,
			transport,
			morph,
			registry: RefCell::new(ScopeRegistry::new()),
		}
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn dom(&self) -> &D {
		&self.dom
	}

	pub fn transport(&self) -> &T {
		&self.transport
	}

	pub fn morph(&self) -> &M {
		&self.morph
	}

	/// Whether `scope` has an action in flight.
	pub fn is_pending(&self, scope: &D::Node) -> bool {
		self.registry.borrow().is_pending(scope)
	}

	/// The nearest inclusive ancestor of `target` whose trigger is declared for `event_type`.
	///
	/// Only one trigger kind can be declared per element, so a trigger for a different event type means
	/// the event is not handled here.
	pub fn matching_trigger(&self, event_type: &str, target: &D::Node) -> Option<D::Node> {
		let element = self.dom.closest(target, &self.config.trigger_attribute)?;
		let trigger = self.dom.attribute(&element, &self.config.trigger_attribute)?;
		(action::trigger_event(&trigger) == Some(event_type)).then(|| element)
	}

	/// Entry point for a DOM event of type `event_type` fired at `target`.
	#[instrument(skip_all, fields(event_type = %event_type))]
	pub async fn handle_event(&self, event_type: &str, target: &D::Node) -> ActionOutcome {
		let element = match self.matching_trigger(event_type, target) {
			Some(element) => element,
			None => return ActionOutcome::Ignored,
		};
		let trigger = self.dom.attribute(&element, &self.config.trigger_attribute).unwrap_or_default();
		let struct_name = self
			.dom
			.closest(&element, &self.config.struct_attribute)
			.and_then(|component| self.dom.attribute(&component, &self.config.struct_attribute));

		match action::parse(&trigger, event_type, struct_name.as_deref(), &self.config) {
			Ok(Some(action)) => self.call_action(&action, &element).await,
			Ok(None) => ActionOutcome::Ignored,
			Err(error) => {
				error!("{}", error);
				ActionOutcome::Abandoned(error)
			}
		}
	}

	/// Dispatches `action` as triggered by `element`.
	///
	/// The request body is captured before any speculation, so the server always receives the envelope it rendered.
	/// The scope's guard is held until this future completes or is dropped.
	#[instrument(skip_all, fields(url = %action.url))]
	pub async fn call_action(&self, action: &ActionDescriptor, element: &D::Node) -> ActionOutcome {
		let scope = self.dom.closest(element, &self.config.scope_attribute);

		let guard = match &scope {
			Some(scope) => match PendingGuard::acquire(&self.registry, scope.clone()) {
				Ok(guard) => Some(guard),
				Err(error) => {
					warn!("Action ignored: {}.", error);
					return ActionOutcome::Rejected;
				}
			},
			None => None,
		};

		let body = self.capture_body(element, scope.as_ref());
		if cfg!(feature = "dangerous-logging") {
			debug!("Request body: {}", body);
		} else {
			debug!("Request body: {} bytes.", body.len());
		}

		if let (Some(scope), Some(guard)) = (&scope, &guard) {
			if let Some(prediction) = self.dom.attribute(element, &self.config.predict_attribute) {
				match predict::execute(&self.dom, &self.config, scope, &prediction, self.config.signature_policy) {
					Ok(record) => guard.record(record),
					Err(error) => warn!("No optimistic update: {}", error),
				}
			}
		}

		let result = match self.transport.post(&action.url, body).await {
			Ok(response) if response.is_success() => Ok(response.body),
			Ok(response) => Err(RequestFailure::Status(response.status)),
			Err(failure) => Err(failure),
		};
		trace!(success = result.is_ok(), "Request settled.");

		match result {
			Ok(html) => {
				let target = reconcile::resolve_target(&self.dom, action, scope.as_ref(), element);
				let path = reconcile::apply(&self.dom, &self.morph, target.as_ref(), &html, action.swap());
				info!(?path, "Action settled.");
				ActionOutcome::Settled(path)
			}
			Err(failure) => {
				let error = Error::RequestFailed(failure);
				error!("{}", error);
				let record = guard.as_ref().and_then(PendingGuard::take_record);
				let rolled_back = match (&scope, &record) {
					(Some(scope), Some(record)) => {
						reconcile::rollback(&self.dom, &self.config, scope, record);
						true
					}
					_ => false,
				};
				ActionOutcome::Failed { error, rolled_back }
			}
		}
	}

	/// Applies `prediction` to the scope owning `element` without contacting the server.
	///
	/// The old signature is kept verbatim behind the new payload ([`SignaturePolicy::PreserveStale`]),
	/// so the server will refuse the envelope until it renders a fresh one.
	///
	/// Returns [`Ok(None)`] if `element` is not inside a scope.
	///
	/// # Errors
	///
	/// [`Error::ConcurrentActionRejected`] while an action for the scope is in flight,
	/// [`Error::MalformedEnvelope`] if the scope's envelope can't be decoded.
	pub fn predict_local(&self, element: &D::Node, prediction: &str) -> Result<Option<PredictionResult>> {
		let scope = match self.dom.closest(element, &self.config.scope_attribute) {
			Some(scope) => scope,
			None => {
				warn!("Local prediction outside of any scope.");
				return Ok(None);
			}
		};
		let _guard = PendingGuard::acquire(&self.registry, scope.clone())?;
		predict::execute(&self.dom, &self.config, &scope, prediction, SignaturePolicy::PreserveStale).map(Some)
	}

	/// The form's fields as a flat JSON object if `element` is a form, otherwise the scope envelope verbatim.
	fn capture_body(&self, element: &D::Node, scope: Option<&D::Node>) -> String {
		if let Some(fields) = self.dom.form_fields(element) {
			let object: Map<String, Json> = fields.into_iter().map(|(name, value)| (name, Json::String(value))).collect();
			return Json::Object(object).to_string();
		}
		scope
			.and_then(|scope| self.dom.attribute(scope, &self.config.scope_attribute))
			.filter(|envelope| !envelope.is_empty())
			.unwrap_or_else(|| EMPTY_BODY.to_owned())
	}
}
