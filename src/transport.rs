//! The network seam: one `POST` per action, answered by an HTML fragment.

use crate::error::RequestFailure;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
	pub status: u16,
	pub body: String,
}

impl Response {
	/// 2xx. Anything else is the only failure signal the dispatcher understands.
	#[must_use]
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Sends `body` as `application/json` via `POST` to `url`.
///
/// Futures are not required to be [`Send`]: all actions run on the document's thread.
#[async_trait(?Send)]
pub trait Transport {
	/// # Errors
	///
	/// [`RequestFailure::Transport`] iff no response was received.
	/// Non-2xx responses are returned as [`Ok`].
	async fn post(&self, url: &str, body: String) -> Result<Response, RequestFailure>;
}

#[async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for &T {
	async fn post(&self, url: &str, body: String) -> Result<Response, RequestFailure> {
		(**self).post(url, body).await
	}
}
