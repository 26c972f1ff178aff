//! Browser bindings: the live document, `fetch`, a morph library found on `window`, and event delegation.

use crate::{
	dispatch::Client,
	dom::Dom,
	error::{Error, RequestFailure, Result},
	morph::{Morph, MorphOptions},
	transport::{Response, Transport},
};
use async_trait::async_trait;
use js_sys::{Function, Object, Reflect};
use std::rc::Rc;
use tracing::{error, trace};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, FormData, HtmlFormElement, Request, RequestInit};

/// Installs `tracing-wasm` as global default subscriber.
///
/// # Panics
///
/// Iff a global default subscriber was already set.
pub fn init_logging() {
	tracing_wasm::set_as_global_default();
}

fn attribute_selector(attribute: &str) -> String {
	format!("[{}]", attribute)
}

#[derive(Debug, Clone)]
pub struct WebDom {
	document: Document,
}

impl WebDom {
	/// The current window's document, if there is one.
	#[must_use]
	pub fn new() -> Option<Self> {
		web_sys::window().and_then(|window| window.document()).map(Self::from_document)
	}

	#[must_use]
	pub fn from_document(document: Document) -> Self {
		Self { document }
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}
}

impl Dom for WebDom {
	type Node = Element;

	fn closest(&self, node: &Element, attribute: &str) -> Option<Element> {
		node.closest(&attribute_selector(attribute)).unwrap_or_else(|error| {
			error!("Invalid attribute name {:?}: {:?}", attribute, error);
			None
		})
	}

	fn attribute(&self, node: &Element, name: &str) -> Option<String> {
		node.get_attribute(name)
	}

	fn set_attribute(&self, node: &Element, name: &str, value: &str) {
		if let Err(error) = node.set_attribute(name, value) {
			error!("Failed to set attribute {:?}: {:?}", name, error);
		}
	}

	fn descendants_with_attribute(&self, node: &Element, attribute: &str) -> Vec<Element> {
		let list = match node.query_selector_all(&attribute_selector(attribute)) {
			Ok(list) => list,
			Err(error) => {
				error!("Invalid attribute name {:?}: {:?}", attribute, error);
				return Vec::new();
			}
		};
		(0..list.length()).filter_map(|i| list.item(i)).filter_map(|node| node.dyn_into::<Element>().ok()).collect()
	}

	fn set_text_content(&self, node: &Element, text: &str) {
		node.set_text_content(Some(text));
	}

	fn query_selector(&self, selector: &str) -> Option<Element> {
		self.document.query_selector(selector).unwrap_or_else(|error| {
			error!("Invalid selector {:?}: {:?}", selector, error);
			None
		})
	}

	fn form_fields(&self, node: &Element) -> Option<Vec<(String, String)>> {
		let form = node.dyn_ref::<HtmlFormElement>()?;
		let data = match FormData::new_with_form(form) {
			Ok(data) => data,
			Err(error) => {
				error!("Failed to read form data: {:?}", error);
				return Some(Vec::new());
			}
		};
		let entries = match js_sys::try_iter(&data) {
			Ok(Some(entries)) => entries,
			_ => return Some(Vec::new()),
		};
		Some(
			entries
				.filter_map(|entry| {
					let pair = js_sys::Array::from(&entry.ok()?);
					// File values have no string representation and are sent empty.
					Some((pair.get(0).as_string()?, pair.get(1).as_string().unwrap_or_default()))
				})
				.collect(),
		)
	}

	fn replace_outer_html(&self, node: &Element, html: &str) {
		node.set_outer_html(html);
	}
}

fn js_failure(error: JsValue) -> RequestFailure {
	RequestFailure::Transport(format!("{:?}", error))
}

/// `fetch`es relative to the current page.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

#[async_trait(?Send)]
impl Transport for FetchTransport {
	async fn post(&self, url: &str, body: String) -> Result<Response, RequestFailure> {
		let window = web_sys::window().ok_or_else(|| RequestFailure::Transport("no window".to_owned()))?;

		let init = RequestInit::new();
		init.set_method("POST");
		init.set_body(&JsValue::from_str(&body));
		let request = Request::new_with_str_and_init(url, &init).map_err(js_failure)?;
		request.headers().set("Content-Type", "application/json").map_err(js_failure)?;

		let response = JsFuture::from(window.fetch_with_request(&request)).await.map_err(js_failure)?;
		let response: web_sys::Response = response.dyn_into().map_err(js_failure)?;
		let status = response.status();
		trace!(status, "Received response.");

		let text = JsFuture::from(response.text().map_err(js_failure)?).await.map_err(js_failure)?;
		Ok(Response {
			status,
			body: text.as_string().unwrap_or_default(),
		})
	}
}

/// Calls `window[global].morph(target, html, { morphStyle })`, looked up anew on every call
/// so that a library loaded after the client still gets used.
#[derive(Debug, Clone)]
pub struct GlobalMorph {
	pub global: String,
}

impl Default for GlobalMorph {
	fn default() -> Self {
		Self { global: "Idiomorph".to_owned() }
	}
}

impl GlobalMorph {
	fn library(&self) -> Option<(JsValue, Function)> {
		let window = web_sys::window()?;
		let library = Reflect::get(&window, &JsValue::from_str(&self.global)).ok()?;
		if library.is_undefined() || library.is_null() {
			return None;
		}
		let morph = Reflect::get(&library, &JsValue::from_str("morph")).ok()?.dyn_into::<Function>().ok()?;
		Some((library, morph))
	}
}

impl Morph<WebDom> for GlobalMorph {
	fn morph(&self, _: &WebDom, target: &Element, html: &str, options: MorphOptions) -> Result<()> {
		let (library, morph) = self.library().ok_or(Error::MissingCollaborator)?;

		let js_options = Object::new();
		Reflect::set(&js_options, &JsValue::from_str("morphStyle"), &JsValue::from_str(options.style.as_str())).map_err(|_| Error::MissingCollaborator)?;

		morph.call3(&library, target, &JsValue::from_str(html), &js_options).map(drop).map_err(|error| {
			error!("Morph threw: {:?}", error);
			Error::MissingCollaborator
		})
	}
}

/// Routes the configured event types on the client's document into [`Client::handle_event`].
///
/// Events with a matching trigger have their default action prevented. The listeners live as long as the page.
///
/// # Errors
///
/// Iff a listener could not be registered.
pub fn delegate<T, M>(client: Rc<Client<WebDom, T, M>>) -> Result<(), JsValue>
where
	T: Transport + 'static,
	M: Morph<WebDom> + 'static,
{
	let document = client.dom().document().clone();
	for event_type in &client.config().events {
		let client = Rc::clone(&client);
		let listener = Closure::wrap(Box::new(move |event: web_sys::Event| {
			let target = match event.target().and_then(|target| target.dyn_into::<Element>().ok()) {
				Some(target) => target,
				None => return,
			};
			let event_type = event.type_();
			if let Some(element) = client.matching_trigger(&event_type, &target) {
				event.prevent_default();
				let client = Rc::clone(&client);
				spawn_local(async move {
					let outcome = client.handle_event(&event_type, &element).await;
					trace!(?outcome, "Event handled.");
				});
			}
		}) as Box<dyn Fn(web_sys::Event)>);
		document.add_event_listener_with_callback(event_type, listener.as_ref().unchecked_ref())?;
		listener.forget();
	}
	Ok(())
}
