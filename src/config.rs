use crate::envelope::SignaturePolicy;
use serde::Deserialize;

/// Attribute names, URL prefix and policies shared by every part of the client.
///
/// All keys are optional when deserialising; missing ones take the [`Default`] values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Declares `"<event> call <action> [-> <selector> [<swap>]]"` on a triggering element.
	pub trigger_attribute: String,
	/// Holds the scope envelope on a component root.
	pub scope_attribute: String,
	/// Names the component on its root, used to namespace action URLs.
	pub struct_attribute: String,
	/// Declares the speculative mutation on a triggering element.
	pub predict_attribute: String,
	/// Names the state field a descendant element displays.
	pub bind_attribute: String,
	/// First path segment of action URLs, without slashes.
	pub prefix: String,
	/// What happens to the signature suffix when speculation rewrites an envelope.
	pub signature_policy: SignaturePolicy,
	/// Event types routed into the client by [`crate::web::delegate`].
	pub events: Vec<String>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			trigger_attribute: "live-on".to_owned(),
			scope_attribute: "live-scope".to_owned(),
			struct_attribute: "live-struct".to_owned(),
			predict_attribute: "data-predict".to_owned(),
			bind_attribute: "data-bind".to_owned(),
			prefix: "_live".to_owned(),
			signature_policy: SignaturePolicy::default(),
			events: ["click", "submit", "change", "input"].iter().map(|&event| event.to_owned()).collect(),
		}
	}
}

impl Config {
	/// Reads a configuration object, e.g. one embedded into the page by the server.
	///
	/// # Errors
	///
	/// Iff `json` is not an object matching [`Config`]'s shape.
	pub fn from_json(json: &str) -> serde_json::Result<Self> {
		serde_json::from_str(json)
	}

	/// `/<prefix>/action[/<struct_name>]/<action_name>`
	#[must_use]
	pub fn action_url(&self, struct_name: Option<&str>, action_name: &str) -> String {
		match struct_name {
			Some(struct_name) => format!("/{}/action/{}/{}", self.prefix, struct_name, action_name),
			None => format!("/{}/action/{}", self.prefix, action_name),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = Config::from_json(r#"{ "prefix": "_app", "signaturePolicy": "drop" }"#).unwrap();
		assert_eq!(config.prefix, "_app");
		assert_eq!(config.signature_policy, SignaturePolicy::Drop);
		assert_eq!(config.scope_attribute, "live-scope");
		assert_eq!(config.events.len(), 4);
	}

	#[test]
	fn action_urls() {
		let config = Config::default();
		assert_eq!(config.action_url(None, "like"), "/_live/action/like");
		assert_eq!(config.action_url(Some("Counter"), "like"), "/_live/action/Counter/like");
	}
}
