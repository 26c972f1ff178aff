use core::future::Future;
use futures::{executor::block_on, join};
use live_dom::{
	reconcile::SwapPath,
	ActionOutcome, Config, Error, RequestFailure, SignaturePolicy,
};

mod common;
use common::{client, client_with, component, envelope, ok, status};

const SIGNED: &str = r#"{"count":5,"open":true}|c2lnbmF0dXJl"#;

#[test]
fn speculation_is_visible_and_the_original_is_sent() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", Some("count = count + 3; open = !open"));
	let held = client.transport().hold();

	let observe = async {
		assert!(client.is_pending(&c.scope));
		assert_eq!(envelope(&client, c.scope), r#"{"count":8,"open":false}|c2lnbmF0dXJl"#);
		assert_eq!(client.dom().text(c.label).as_deref(), Some("8"));
		held.send(ok("<div>server</div>")).unwrap();
	};
	let (outcome, ()) = block_on(async { join!(client.handle_event("click", &c.button), observe) });

	assert_eq!(outcome, ActionOutcome::Settled(SwapPath::Morphed));
	assert_eq!(*client.transport().requests.borrow(), vec![("/_live/action/Counter/increment".to_owned(), SIGNED.to_owned())]);
	assert!(!client.is_pending(&c.scope));
	assert_eq!(client.dom().fragment(c.scope).as_deref(), Some("<div>server</div>"));
}

#[test]
fn failed_status_rolls_back_byte_for_byte() {
	let client = client();
	let original = r#"{ "count" : 5 }|c2lnbmF0dXJl"#;
	let c = component(client.dom(), original, "click call increment", Some("count = count + 1"));
	client.transport().reply(status(403));

	let outcome = block_on(client.handle_event("click", &c.button));

	assert_eq!(
		outcome,
		ActionOutcome::Failed {
			error: Error::RequestFailed(RequestFailure::Status(403)),
			rolled_back: true,
		}
	);
	assert_eq!(envelope(&client, c.scope), original);
	assert_eq!(client.dom().text(c.label).as_deref(), Some("5"));
	assert!(!client.is_pending(&c.scope));
}

#[test]
fn transport_failure_rolls_back() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", Some("count = 0"));
	client.transport().reply(Err(RequestFailure::Transport("offline".to_owned())));

	let outcome = block_on(client.handle_event("click", &c.button));

	assert!(matches!(outcome, ActionOutcome::Failed { rolled_back: true, .. }));
	assert_eq!(envelope(&client, c.scope), SIGNED);
}

#[test]
fn failure_without_prediction_has_nothing_to_roll_back() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", None);
	client.transport().reply(status(500));

	let outcome = block_on(client.handle_event("click", &c.button));

	assert!(matches!(outcome, ActionOutcome::Failed { rolled_back: false, .. }));
	assert_eq!(envelope(&client, c.scope), SIGNED);
	assert_eq!(client.dom().text(c.label), None);
}

#[test]
fn rapid_triggers_in_one_scope_send_once() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", Some("count = count + 1"));
	let held = client.transport().hold();

	let release = async {
		held.send(ok("<div></div>")).unwrap();
	};
	let (first, second, ()) = block_on(async { join!(client.handle_event("click", &c.button), client.handle_event("click", &c.button), release) });

	assert_eq!(first, ActionOutcome::Settled(SwapPath::Morphed));
	assert_eq!(second, ActionOutcome::Rejected);
	assert_eq!(client.transport().request_count(), 1);
}

#[test]
fn rejected_trigger_leaves_state_alone() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", Some("count = count + 1"));
	let held = client.transport().hold();

	let second_then_release = async {
		let speculated = envelope(&client, c.scope);
		assert_eq!(client.handle_event("click", &c.button).await, ActionOutcome::Rejected);
		assert_eq!(envelope(&client, c.scope), speculated);
		assert_eq!(client.transport().request_count(), 1);
		held.send(status(409)).unwrap();
	};
	let (first, ()) = block_on(async { join!(client.handle_event("click", &c.button), second_then_release) });

	assert!(matches!(first, ActionOutcome::Failed { rolled_back: true, .. }));
	assert_eq!(envelope(&client, c.scope), SIGNED);
}

#[test]
fn distinct_scopes_are_independent() {
	let client = client();
	let a = component(client.dom(), SIGNED, "click call increment", Some("count = count + 1"));
	let b = component(client.dom(), r#"{"count":1}|b"#, "click call increment", Some("count = count + 1"));
	let held_a = client.transport().hold();
	let held_b = client.transport().hold();

	let release = async {
		assert_eq!(client.transport().request_count(), 2);
		assert!(client.is_pending(&a.scope) && client.is_pending(&b.scope));
		held_b.send(ok("<b></b>")).unwrap();
		held_a.send(status(500)).unwrap();
	};
	let (outcome_a, outcome_b, ()) = block_on(async { join!(client.handle_event("click", &a.button), client.handle_event("click", &b.button), release) });

	assert!(matches!(outcome_a, ActionOutcome::Failed { rolled_back: true, .. }));
	assert_eq!(outcome_b, ActionOutcome::Settled(SwapPath::Morphed));
	assert_eq!(envelope(&client, a.scope), SIGNED);
	assert_eq!(client.dom().fragment(b.scope).as_deref(), Some("<b></b>"));
}

#[test]
fn guard_clears_after_failure() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", None);
	client.transport().reply(status(502));
	client.transport().reply(ok("<div></div>"));

	assert!(matches!(block_on(client.handle_event("click", &c.button)), ActionOutcome::Failed { .. }));
	assert_eq!(block_on(client.handle_event("click", &c.button)), ActionOutcome::Settled(SwapPath::Morphed));
	assert_eq!(client.transport().request_count(), 2);
}

#[test]
fn dropped_action_releases_its_guard() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", None);
	let _held = client.transport().hold();

	{
		let mut action = Box::pin(client.handle_event("click", &c.button));
		let waker = futures::task::noop_waker();
		let mut context = std::task::Context::from_waker(&waker);
		assert!(action.as_mut().poll(&mut context).is_pending());
		assert!(client.is_pending(&c.scope));
	}
	assert!(!client.is_pending(&c.scope));
}

#[test]
fn malformed_envelope_disables_prediction_only() {
	let client = client();
	let c = component(client.dom(), "not json|sig", "click call increment", Some("count = 1"));
	client.transport().reply(ok("<div></div>"));

	let outcome = block_on(client.handle_event("click", &c.button));

	assert_eq!(outcome, ActionOutcome::Settled(SwapPath::Morphed));
	assert_eq!(client.transport().requests.borrow()[0].1, "not json|sig");
}

#[test]
fn stateless_actions() {
	let client = client();
	let dom = client.dom();
	let button = dom.append(dom.root(), "button", &[("live-on", "click call ping"), ("data-predict", "count = 1")]);
	client.transport().reply(ok("<button>pong</button>"));

	let outcome = block_on(client.handle_event("click", &button));

	assert_eq!(outcome, ActionOutcome::Settled(SwapPath::Morphed));
	assert_eq!(*client.transport().requests.borrow(), vec![("/_live/action/ping".to_owned(), "{}".to_owned())]);
	assert_eq!(dom.fragment(button).as_deref(), Some("<button>pong</button>"));
}

#[test]
fn empty_scope_attribute_sends_empty_object() {
	let client = client();
	let c = component(client.dom(), "", "click call increment", None);
	client.transport().reply(ok(""));

	block_on(client.handle_event("click", &c.button));

	assert_eq!(client.transport().requests.borrow()[0].1, "{}");
}

#[test]
fn forms_send_their_fields() {
	let client = client();
	let dom = client.dom();
	let scope = dom.append(dom.root(), "div", &[("live-scope", SIGNED), ("live-struct", "TodoList")]);
	let form = dom.append(scope, "form", &[("live-on", "submit call add")]);
	dom.append(form, "input", &[("name", "title"), ("value", "Milk \"2%\"")]);
	dom.append(form, "input", &[("name", "amount"), ("value", "2")]);
	client.transport().reply(ok("<div></div>"));

	assert_eq!(block_on(client.handle_event("click", &form)), ActionOutcome::Ignored);
	let outcome = block_on(client.handle_event("submit", &form));

	assert_eq!(outcome, ActionOutcome::Settled(SwapPath::Morphed));
	assert_eq!(
		*client.transport().requests.borrow(),
		vec![("/_live/action/TodoList/add".to_owned(), r#"{"title":"Milk \"2%\"","amount":"2"}"#.to_owned())]
	);
}

#[test]
fn explicit_target_and_fallback() {
	let client = client_with(Config::default());
	let dom = client.dom();
	let c = component(dom, SIGNED, "click call like -> # box outerHTML", None);
	let target = dom.append(dom.root(), "div", &[("id", "box")]);
	client.transport().reply(ok("<div id=\"box\">1</div>"));

	let outcome = block_on(client.handle_event("click", &c.button));

	assert_eq!(outcome, ActionOutcome::Settled(SwapPath::Replaced));
	assert_eq!(dom.fragment(target).as_deref(), Some("<div id=\"box\">1</div>"));
	assert_eq!(dom.fragment(c.scope), None);
	assert!(client.morph().calls.borrow().is_empty());
}

#[test]
fn missing_target_discards_response() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call like -> #nowhere", Some("count = 9"));
	client.transport().reply(ok("<div></div>"));

	let outcome = block_on(client.handle_event("click", &c.button));

	assert_eq!(outcome, ActionOutcome::Settled(SwapPath::NoTarget));
	assert_eq!(envelope(&client, c.scope), r#"{"count":9,"open":true}|c2lnbmF0dXJl"#);
}

#[test]
fn nested_trigger_targets() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", None);
	let icon = client.dom().append(c.button, "i", &[]);
	client.transport().reply(ok("<div></div>"));

	assert_eq!(block_on(client.handle_event("click", &icon)), ActionOutcome::Settled(SwapPath::Morphed));
	assert_eq!(*client.morph().calls.borrow(), vec![(c.scope, "<div></div>".to_owned())]);
}

#[test]
fn deprecated_set_is_reported_and_abandoned() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click set open = false", None);

	let outcome = block_on(client.handle_event("click", &c.button));

	assert_eq!(outcome, ActionOutcome::Abandoned(Error::DeprecatedCommand { command: "set".to_owned() }));
	assert_eq!(client.transport().request_count(), 0);
	assert!(!client.is_pending(&c.scope));
}

#[test]
fn other_events_are_ignored() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", Some("count = 0"));

	assert_eq!(client.matching_trigger("input", &c.button), None);
	assert_eq!(block_on(client.handle_event("input", &c.button)), ActionOutcome::Ignored);
	assert_eq!(block_on(client.handle_event("click", &c.label)), ActionOutcome::Ignored);
	assert_eq!(client.transport().request_count(), 0);
	assert_eq!(envelope(&client, c.scope), SIGNED);
}

#[test]
fn drop_policy_writes_unsigned_speculation() {
	let client = client_with(Config {
		signature_policy: SignaturePolicy::Drop,
		..Config::default()
	});
	let c = component(client.dom(), SIGNED, "click call increment", Some("count = count - 3"));
	let held = client.transport().hold();

	let observe = async {
		assert_eq!(envelope(&client, c.scope), r#"{"count":2,"open":true}"#);
		held.send(status(500)).unwrap();
	};
	block_on(async { join!(client.handle_event("click", &c.button), observe) });

	assert_eq!(client.transport().requests.borrow()[0].1, SIGNED);
	assert_eq!(envelope(&client, c.scope), SIGNED);
}

#[test]
fn local_prediction_keeps_the_stale_signature() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", None);

	let record = client.predict_local(&c.button, "count = 42").unwrap().unwrap();

	assert_eq!(record.original_envelope, SIGNED);
	assert_eq!(envelope(&client, c.scope), r#"{"count":42,"open":true}|c2lnbmF0dXJl"#);
	assert_eq!(client.dom().text(c.label).as_deref(), Some("42"));
	assert_eq!(client.transport().request_count(), 0);
	assert!(!client.is_pending(&c.scope));
}

#[test]
fn local_prediction_respects_the_guard() {
	let client = client();
	let c = component(client.dom(), SIGNED, "click call increment", None);
	let outside = client.dom().append(client.dom().root(), "p", &[]);
	let held = client.transport().hold();

	let local = async {
		assert_eq!(client.predict_local(&c.button, "count = 1"), Err(Error::ConcurrentActionRejected));
		assert_eq!(client.predict_local(&outside, "count = 1"), Ok(None));
		held.send(ok("")).unwrap();
	};
	block_on(async { join!(client.handle_event("click", &c.button), local) });

	assert_eq!(envelope(&client, c.scope), SIGNED);
}
