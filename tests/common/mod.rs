#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::oneshot;
use live_dom::{
	memory::{MemoryDom, NodeId},
	Client, Config, Dom, MorphOptions, RequestFailure, Response, Transport,
};
use std::{cell::RefCell, collections::VecDeque};

pub type Reply = Result<Response, RequestFailure>;

pub fn init_logging() {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.with_test_writer()
		.try_init();
}

pub fn ok(html: &str) -> Reply {
	Ok(Response { status: 200, body: html.to_owned() })
}

pub fn status(status: u16) -> Reply {
	Ok(Response { status, body: String::new() })
}

/// Records every request and answers them in order, each once its sender fires.
#[derive(Default)]
pub struct ScriptedTransport {
	pub requests: RefCell<Vec<(String, String)>>,
	replies: RefCell<VecDeque<oneshot::Receiver<Reply>>>,
}

impl ScriptedTransport {
	/// Queues a reply that is available immediately.
	pub fn reply(&self, reply: Reply) {
		let (sender, receiver) = oneshot::channel();
		sender.send(reply).ok();
		self.replies.borrow_mut().push_back(receiver);
	}

	/// Queues a reply that arrives when the returned sender is used.
	pub fn hold(&self) -> oneshot::Sender<Reply> {
		let (sender, receiver) = oneshot::channel();
		self.replies.borrow_mut().push_back(receiver);
		sender
	}

	pub fn request_count(&self) -> usize {
		self.requests.borrow().len()
	}
}

#[async_trait(?Send)]
impl Transport for ScriptedTransport {
	async fn post(&self, url: &str, body: String) -> Result<Response, RequestFailure> {
		self.requests.borrow_mut().push((url.to_owned(), body));
		let receiver = self.replies.borrow_mut().pop_front();
		match receiver {
			Some(receiver) => receiver.await.unwrap_or_else(|_| Err(RequestFailure::Transport("reply dropped".to_owned()))),
			None => Err(RequestFailure::Transport("no reply scripted".to_owned())),
		}
	}
}

/// Morphs by remembering the call and replacing the target like outer replacement would.
#[derive(Default)]
pub struct RecordingMorph {
	pub calls: RefCell<Vec<(NodeId, String)>>,
}

impl live_dom::Morph<MemoryDom> for RecordingMorph {
	fn morph(&self, dom: &MemoryDom, target: &NodeId, html: &str, options: MorphOptions) -> live_dom::error::Result<()> {
		assert_eq!(options.style.as_str(), "outerHTML");
		self.calls.borrow_mut().push((*target, html.to_owned()));
		dom.replace_outer_html(target, html);
		Ok(())
	}
}

pub type TestClient = Client<MemoryDom, ScriptedTransport, RecordingMorph>;

pub fn client() -> TestClient {
	client_with(Config::default())
}

pub fn client_with(config: Config) -> TestClient {
	init_logging();
	Client::new(config, MemoryDom::new(), ScriptedTransport::default(), RecordingMorph::default())
}

/// `<div live-scope=envelope live-struct="Counter"><span data-bind="count"/><button live-on=trigger data-predict=prediction/></div>`
pub struct Component {
	pub scope: NodeId,
	pub button: NodeId,
	pub label: NodeId,
}

pub fn component(dom: &MemoryDom, envelope: &str, trigger: &str, prediction: Option<&str>) -> Component {
	let scope = dom.append(dom.root(), "div", &[("live-scope", envelope), ("live-struct", "Counter")]);
	let label = dom.append(scope, "span", &[("data-bind", "count")]);
	let mut attributes = vec![("live-on", trigger)];
	if let Some(prediction) = prediction {
		attributes.push(("data-predict", prediction));
	}
	let button = dom.append(scope, "button", &attributes);
	Component { scope, button, label }
}

pub fn envelope(client: &TestClient, scope: NodeId) -> String {
	client.dom().attribute(&scope, "live-scope").unwrap_or_default()
}
