//! Trigger attributes: `"<event> call <action> [-> <selector> [<swap>]]"`.
//!
//! Upstream tokenisation may have split punctuation apart, so `- >` is read as one arrow and a `#`
//! followed by whitespace is glued to the next word (`# box` is the selector `#box`).

use crate::{
	config::Config,
	error::{Error, Result},
	reconcile::SwapStrategy,
};
use tracing::warn;

/// A parsed `call` command, ready to dispatch. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
	pub action_name: String,
	pub url: String,
	pub target_selector: Option<String>,
	pub swap_strategy: String,
}

impl ActionDescriptor {
	#[must_use]
	pub fn swap(&self) -> SwapStrategy {
		SwapStrategy::from_token(&self.swap_strategy)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
	Word(String),
	Arrow,
}

/// If `text` starts with an arrow (`-`, optional whitespace, `>`), the text after it.
fn strip_arrow(text: &str) -> Option<&str> {
	text.strip_prefix('-')?.trim_start().strip_prefix('>')
}

pub(crate) fn tokenize(source: &str) -> Vec<Token> {
	fn flush(word: &mut String, tokens: &mut Vec<Token>) {
		if !word.is_empty() {
			tokens.push(Token::Word(core::mem::take(word)));
		}
	}

	let mut tokens = Vec::new();
	let mut word = String::new();
	let mut rest = source;
	while let Some(c) = rest.chars().next() {
		if let Some(after) = strip_arrow(rest) {
			flush(&mut word, &mut tokens);
			tokens.push(Token::Arrow);
			rest = after;
		} else if c.is_whitespace() {
			flush(&mut word, &mut tokens);
			rest = &rest[c.len_utf8()..];
		} else if c == '#' {
			word.push('#');
			rest = rest[1..].trim_start();
		} else {
			word.push(c);
			rest = &rest[c.len_utf8()..];
		}
	}
	flush(&mut word, &mut tokens);
	tokens
}

/// The event type a trigger attribute declares, if any.
#[must_use]
pub fn trigger_event(trigger: &str) -> Option<&str> {
	trigger.split_whitespace().next()
}

/// Parses `trigger` as fired by an `event_type` event.
///
/// `struct_name` is the component name of the nearest enclosing component, if any,
/// which namespaces the action URL.
///
/// Returns [`Ok(None)`] when the trigger is declared for a different event type, which is a filter rather than an error,
/// and when the attribute is not a recognisable command.
///
/// # Errors
///
/// [`Error::DeprecatedCommand`] for the removed `set` command.
pub fn parse(trigger: &str, event_type: &str, struct_name: Option<&str>, config: &Config) -> Result<Option<ActionDescriptor>> {
	if trigger_event(trigger) != Some(event_type) {
		return Ok(None);
	}

	let tokens = tokenize(trigger);
	let word = |index: usize| match tokens.get(index) {
		Some(Token::Word(word)) => Some(word.as_str()),
		_ => None,
	};

	match word(1) {
		Some("call") => (),
		Some("set") => return Err(Error::DeprecatedCommand { command: "set".to_owned() }),
		other => {
			warn!("Unrecognised command {:?} in trigger {:?}.", other, trigger);
			return Ok(None);
		}
	}

	let action_name = match word(2) {
		Some(action_name) => action_name,
		None => {
			warn!("Missing action name in trigger {:?}.", trigger);
			return Ok(None);
		}
	};

	let (target_selector, swap_strategy) = match tokens.iter().position(|token| *token == Token::Arrow) {
		Some(arrow) => (word(arrow + 1), word(arrow + 2)),
		None => (None, None),
	};

	Ok(Some(ActionDescriptor {
		action_name: action_name.to_owned(),
		url: config.action_url(struct_name, action_name),
		target_selector: target_selector.map(str::to_owned),
		swap_strategy: swap_strategy.unwrap_or("morph").to_owned(),
	}))
}
