//! The prediction DSL: `field = expression [; field = expression ...]`.
//!
//! Each right-hand side is classified by the first rule that matches, in this order:
//!
//! 1. `!field`, naming the assigned field: boolean toggle.
//! 2. `field + N` / `field - N`, naming the assigned field, `N` a non-negative integer literal:
//!    increment/decrement.
//! 3. A literal: `true`/`false`, then an integer (`-?[0-9]+`), then a decimal (`-?[0-9]+\.[0-9]+`),
//!    then double-quoted text (quotes stripped), else the expression verbatim as text.
//!
//! An expression that mentions a different field than the one assigned is not an error,
//! it is a literal. Clauses that are not `field = expression` at all are skipped.

use crate::{
	config::Config,
	dom::Dom,
	envelope::{self, SignaturePolicy},
	error::{Error, Result},
	reconcile,
	value::{StateMapping, Value},
};
use tracing::{debug, instrument, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
	Toggle,
	Add(Amount),
	Subtract(Amount),
	Assign(Value),
}

/// The `N` of `field + N`. Literals beyond `i64` are kept as floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Amount {
	Integer(i64),
	Float(f64),
}

impl Amount {
	fn parse(digits: &str) -> Option<Self> {
		if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
			return None;
		}
		Some(match digits.parse() {
			Ok(integer) => Amount::Integer(integer),
			Err(_) => Amount::Float(digits.parse().ok()?),
		})
	}

	fn offset(self, state: &mut StateMapping, field: &str, sign: i64) {
		match self {
			Amount::Integer(amount) => state.offset(field, sign * amount),
			#[allow(clippy::cast_precision_loss)]
			Amount::Float(amount) => state.offset_float(field, sign as f64 * amount),
		}
	}
}

/// One parsed clause.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionStatement {
	pub field: String,
	pub operator: Operator,
	/// The right-hand side as written, trimmed.
	pub operand: String,
}

impl PredictionStatement {
	/// Parses `field = expression`.
	///
	/// # Errors
	///
	/// [`Error::UnmatchedClause`] iff `clause` doesn't have that shape.
	pub fn parse(clause: &str) -> Result<Self> {
		let unmatched = || Error::UnmatchedClause { clause: clause.to_owned() };

		let clause = clause.trim();
		let (field, rest) = split_word(clause);
		if field.is_empty() {
			return Err(unmatched());
		}
		let operand = rest.trim_start().strip_prefix('=').ok_or_else(unmatched)?.trim();
		if operand.is_empty() {
			return Err(unmatched());
		}

		Ok(Self {
			field: field.to_owned(),
			operator: classify(field, operand),
			operand: operand.to_owned(),
		})
	}

	pub fn apply(&self, state: &mut StateMapping) {
		match &self.operator {
			Operator::Toggle => state.toggle(&self.field),
			Operator::Add(amount) => amount.offset(state, &self.field, 1),
			Operator::Subtract(amount) => amount.offset(state, &self.field, -1),
			Operator::Assign(value) => state.set(&self.field, value),
		}
	}
}

/// A semicolon-separated list of clauses.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Prediction {
	pub statements: Vec<PredictionStatement>,
	/// [`Error::UnmatchedClause`]s, in source order.
	pub skipped: Vec<Error>,
}

impl Prediction {
	#[must_use]
	pub fn parse(source: &str) -> Self {
		let mut prediction = Self::default();
		for clause in source.split(';').map(str::trim).filter(|clause| !clause.is_empty()) {
			match PredictionStatement::parse(clause) {
				Ok(statement) => prediction.statements.push(statement),
				Err(error) => {
					debug!("Skipping prediction clause: {}", error);
					prediction.skipped.push(error);
				}
			}
		}
		prediction
	}

	/// Applies all statements in order. Later statements see earlier results.
	pub fn apply(&self, state: &mut StateMapping) {
		for statement in &self.statements {
			trace!(field = %statement.field, operator = ?statement.operator, "Applying prediction.");
			statement.apply(state);
		}
	}
}

/// Rollback record for one in-flight action.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
	/// The scope attribute exactly as it was before speculation.
	pub original_envelope: String,
	pub original_state: StateMapping,
	pub new_state: StateMapping,
}

/// Speculatively applies `source` to the envelope on `scope`.
///
/// This is visible: the rewritten envelope (see [`SignaturePolicy`]) replaces the scope attribute
/// and bound descendants show the new values immediately.
///
/// # Errors
///
/// [`Error::MalformedEnvelope`] iff the scope has no decodable envelope, in which case nothing was written.
#[instrument(skip_all)]
pub fn execute<D: Dom>(dom: &D, config: &Config, scope: &D::Node, source: &str, policy: SignaturePolicy) -> Result<PredictionResult> {
	let original_envelope = dom.attribute(scope, &config.scope_attribute).unwrap_or_default();
	let (original_state, signature) = {
		let decoded = envelope::decode(&original_envelope)?;
		(decoded.state, decoded.signature.map(str::to_owned))
	};

	let mut new_state = original_state.clone();
	Prediction::parse(source).apply(&mut new_state);

	let rewritten = policy.rewrite(&new_state.to_payload(), signature.as_deref());
	if cfg!(feature = "dangerous-logging") {
		debug!("Prediction executed: {:?} -> {}", source, rewritten);
	} else {
		debug!("Prediction executed ({} byte envelope).", rewritten.len());
	}
	dom.set_attribute(scope, &config.scope_attribute, &rewritten);
	reconcile::update_bindings(dom, config, scope, &new_state);

	Ok(PredictionResult {
		original_envelope,
		original_state,
		new_state,
	})
}

fn is_word_char(c: char) -> bool {
	c.is_ascii_alphanumeric() || c == '_'
}

/// Splits off the leading run of word characters.
fn split_word(text: &str) -> (&str, &str) {
	text.split_at(text.find(|c| !is_word_char(c)).unwrap_or(text.len()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
	Word(&'a str),
	Bang,
	Plus,
	Minus,
	Other,
}

fn tokenize(expression: &str) -> Vec<Token<'_>> {
	let mut tokens = Vec::new();
	let mut rest = expression;
	while let Some(c) = rest.chars().next() {
		if is_word_char(c) {
			let (word, after) = split_word(rest);
			tokens.push(Token::Word(word));
			rest = after;
			continue;
		}
		match c {
			c if c.is_whitespace() => (),
			'!' => tokens.push(Token::Bang),
			'+' => tokens.push(Token::Plus),
			'-' => tokens.push(Token::Minus),
			_ => tokens.push(Token::Other),
		}
		rest = &rest[c.len_utf8()..];
	}
	tokens
}

fn classify(field: &str, operand: &str) -> Operator {
	match tokenize(operand).as_slice() {
		[Token::Bang, Token::Word(name)] if *name == field => return Operator::Toggle,
		[Token::Word(name), Token::Plus, Token::Word(digits)] if *name == field => {
			if let Some(amount) = Amount::parse(digits) {
				return Operator::Add(amount);
			}
		}
		[Token::Word(name), Token::Minus, Token::Word(digits)] if *name == field => {
			if let Some(amount) = Amount::parse(digits) {
				return Operator::Subtract(amount);
			}
		}
		_ => (),
	}
	Operator::Assign(literal(operand))
}

fn literal(text: &str) -> Value {
	fn digits(text: &str) -> bool {
		!text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
	}

	let unsigned = text.strip_prefix('-').unwrap_or(text);
	match text {
		"true" => Value::Boolean(true),
		"false" => Value::Boolean(false),
		_ if digits(unsigned) => text.parse().map_or_else(|_| Value::Float(text.parse().unwrap_or(f64::NAN)), Value::Integer),
		_ if unsigned.split_once('.').map_or(false, |(whole, fraction)| digits(whole) && digits(fraction)) => Value::Float(text.parse().unwrap_or(f64::NAN)),
		_ if text.starts_with('"') && text.ends_with('"') => Value::String(text.get(1..text.len() - 1).unwrap_or_default().to_owned()),
		_ => Value::String(text.to_owned()),
	}
}
