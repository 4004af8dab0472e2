/// Per-request context carrying a cancellation signal, an optional deadline and request-scoped
/// flags.
///
/// Cloning a context shares its cancellation signal, so cancelling a clone cancels every request
/// running under any of its copies. Cancellation before a request is sent aborts it without
/// contacting the server, cancellation while a response body is being read drops the body and
/// releases the connection. In both cases, the request fails with [crate::Error::Cancelled] (or
/// [crate::Error::DeadlineExceeded] once the deadline has passed).
#[derive(Clone, Debug, Default)]
pub struct RequestContext
{
	#[doc(hidden)]
	cancellation: tokio_util::sync::CancellationToken,
	#[doc(hidden)]
	deadline: Option<tokio::time::Instant>,
	#[doc(hidden)]
	bypass_rate_limit_check: bool,
}

impl RequestContext
{
	/// Create a context that is never cancelled and has no deadline.
	pub fn new() -> Self
	{
		Self::default()
	}

	/// Create a context that is cancelled together with the given token.
	pub fn with_cancellation(token: tokio_util::sync::CancellationToken) -> Self
	{
		Self
		{
			cancellation: token,
			..Self::default()
		}
	}

	/// Abort requests that haven’t completed after the given duration (measured from now).
	pub fn with_timeout(self, timeout: std::time::Duration) -> Self
	{
		self.with_deadline(tokio::time::Instant::now() + timeout)
	}

	/// Abort requests that haven’t completed at the given instant. An earlier deadline that is
	/// already set takes precedence.
	pub fn with_deadline(mut self, deadline: tokio::time::Instant) -> Self
	{
		self.deadline = Some(match self.deadline
		{
			Some(existing) => existing.min(deadline),
			None => deadline,
		});

		self
	}

	/// Skip both the local rate-limit enforcement before sending and the rate-limit accounting
	/// after receiving a response.
	pub fn bypass_rate_limit_check(mut self) -> Self
	{
		self.bypass_rate_limit_check = true;
		self
	}

	pub fn is_rate_limit_check_bypassed(&self) -> bool
	{
		self.bypass_rate_limit_check
	}

	pub fn cancellation_token(&self) -> &tokio_util::sync::CancellationToken
	{
		&self.cancellation
	}

	pub fn deadline(&self) -> Option<tokio::time::Instant>
	{
		self.deadline
	}

	/// Cancel all requests running under this context and its clones.
	pub fn cancel(&self)
	{
		self.cancellation.cancel();
	}

	/// Fail if this context was cancelled or its deadline has passed.
	pub fn check(&self) -> Result<(), crate::Error>
	{
		if self.cancellation.is_cancelled()
		{
			return Err(crate::Error::Cancelled);
		}

		match self.deadline
		{
			Some(deadline) if deadline <= tokio::time::Instant::now() =>
				Err(crate::Error::DeadlineExceeded),
			_ => Ok(()),
		}
	}

	/// Drive a future to completion unless this context is cancelled or its deadline passes first,
	/// in which case the future is dropped.
	pub async fn run<F>(&self, future: F) -> Result<F::Output, crate::Error>
	where
		F: std::future::Future,
	{
		self.check()?;

		let deadline = async
		{
			match self.deadline
			{
				Some(deadline) => tokio::time::sleep_until(deadline).await,
				None => std::future::pending().await,
			}
		};

		tokio::select!
		{
			biased;

			_ = self.cancellation.cancelled() => Err(crate::Error::Cancelled),
			_ = deadline => Err(crate::Error::DeadlineExceeded),
			output = future => Ok(output),
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[tokio::test]
	async fn runs_future_to_completion()
	{
		let context = RequestContext::new();
		let output = context.run(async {42}).await;

		assert!(matches!(output, Ok(42)));
	}

	#[tokio::test]
	async fn cancelled_context_aborts_before_running()
	{
		let context = RequestContext::new();
		context.cancel();

		let output = context.run(async {42}).await;

		assert!(matches!(output, Err(crate::Error::Cancelled)));
	}

	#[tokio::test]
	async fn cancellation_aborts_pending_future()
	{
		let context = RequestContext::new();
		let clone = context.clone();

		tokio::spawn(async move
		{
			tokio::time::sleep(std::time::Duration::from_millis(10)).await;
			clone.cancel();
		});

		let output = context.run(std::future::pending::<()>()).await;

		assert!(matches!(output, Err(crate::Error::Cancelled)));
	}

	#[tokio::test]
	async fn deadline_aborts_pending_future()
	{
		let context = RequestContext::new().with_timeout(std::time::Duration::from_millis(10));
		let output = context.run(std::future::pending::<()>()).await;

		assert!(matches!(output, Err(crate::Error::DeadlineExceeded)));
	}

	#[test]
	fn earlier_deadline_wins()
	{
		let now = tokio::time::Instant::now();
		let early = now + std::time::Duration::from_secs(1);
		let late = now + std::time::Duration::from_secs(60);

		let context = RequestContext::new().with_deadline(early).with_deadline(late);

		assert_eq!(context.deadline(), Some(early));
	}

	#[test]
	fn bypass_flag_is_opt_in()
	{
		assert!(!RequestContext::new().is_rate_limit_check_bypassed());
		assert!(RequestContext::new().bypass_rate_limit_check().is_rate_limit_check_bypassed());
	}
}
