/// All errors that may occur while making GitHub API requests or handling webhook deliveries.
#[derive(Debug, thiserror::Error)]
pub enum Error
{
	#[error("could not read config file")]
	ReadConfigFile(#[source] std::io::Error),
	#[error("could not parse config file")]
	ParseConfigFile(#[source] serde_yaml::Error),

	#[error("could not create HTTP client")]
	CreateHttpClient(#[source] reqwest::Error),
	#[error("base URL “{0}” must have a trailing slash")]
	InvalidBaseUrl(url::Url),
	#[error("could not parse URL")]
	ParseUrl(#[source] url::ParseError),
	#[error("invalid header value")]
	InvalidHeaderValue(#[source] reqwest::header::InvalidHeaderValue),
	#[error("could not encode request body")]
	EncodeRequestBody(#[source] serde_json::Error),
	#[error("could not encode query options: {0}")]
	EncodeQueryOptions(String),
	#[error("query option “{0}” cannot be encoded as a URL parameter")]
	UnsupportedQueryOption(String),

	#[error("could not make GitHub API request")]
	MakeGitHubApiRequest(#[source] reqwest_middleware::Error),
	#[error("could not read GitHub API response body")]
	ReadGitHubApiResponseBody(#[source] reqwest::Error),
	#[error("request was cancelled")]
	Cancelled,
	#[error("request deadline exceeded")]
	DeadlineExceeded,

	#[error("received GitHub API error (status code {}): {}", .0.status_code, .0.body.message)]
	ReceivedGitHubApiError(Box<crate::response::ErrorResponse>),
	#[error("two-factor authentication code required (status code {})", .0.status_code)]
	TwoFactorRequired(Box<crate::response::ErrorResponse>),
	#[error("API rate limit of {} exceeded for “{}”, resets at epoch {}: {message}",
		.rate.limit, .rate.resource, .rate.reset)]
	RateLimited
	{
		rate: crate::rate_limit::Rate,
		message: String,
		/// Whether the request was refused locally without contacting the server.
		pre_emptive: bool,
	},
	#[error("API secondary rate limit exceeded: {message}")]
	AbuseRateLimited
	{
		retry_after: Option<std::time::Duration>,
		message: String,
	},
	#[error("job scheduled on GitHub side, try again later")]
	Accepted
	{
		raw_body: Vec<u8>,
	},
	#[error("received redirection (status code {status_code})")]
	Redirection
	{
		status_code: reqwest::StatusCode,
		location: Option<url::Url>,
	},

	#[error("could not decode GitHub API response body")]
	DecodeGitHubApiResponseBody(#[source] serde_json::Error),
	#[error("repository content is neither a file ({file_error}) nor a directory ({directory_error})")]
	DecodeRepositoryContent
	{
		file_error: serde_json::Error,
		directory_error: serde_json::Error,
	},
	#[error("repository content is not valid UTF-8")]
	ContentNotUtf8(#[source] std::string::FromUtf8Error),

	#[error("could not verify payload signature")]
	SignatureVerification(#[from] crate::webhook::SignatureError),
	#[error("unsupported content type “{0}”")]
	UnsupportedContentType(String),
	#[error("could not read payload body")]
	ReadPayloadBody(#[source] std::io::Error),
	#[error("form-encoded payload body has no “payload” field")]
	MissingFormPayload,
	#[error("could not decode payload body")]
	DecodePayloadBody(#[source] serde_json::Error),
	#[error("unknown webhook event “{0}”")]
	UnknownEvent(String),

	#[error("unsupported content encoding “{encoding}”{}", .hint.map(|hint| format!(" ({hint})")).unwrap_or_default())]
	UnsupportedContentEncoding
	{
		encoding: String,
		hint: Option<&'static str>,
	},
	#[error("path “{0}” must not contain “..”")]
	PathForbidden(String),
	#[error("file is base64-encoded but has no content")]
	MissingBase64Content,
	#[error("could not decode base64 content")]
	MalformedBase64(#[source] base64::DecodeError),
	#[error("no file named “{file_name}” found in “{directory}”")]
	FileNotFound
	{
		file_name: String,
		directory: String,
	},
	#[error("no download link found for “{0}”")]
	MissingDownloadUrl(String),

	#[error("unexpected status code {0}")]
	UnexpectedStatus(reqwest::StatusCode),
	#[error("invalid or empty Location header in redirection response")]
	InvalidRedirectLocation,
	#[error("reached the maximum amount of {0} redirections")]
	TooManyRedirects(u32),

	#[error("invalid commit: {0}")]
	InvalidCommit(&'static str),
	#[error("could not sign commit")]
	SignCommit(#[source] std::io::Error),
	#[error("commit signer did not complete")]
	SignerTask(#[source] tokio::task::JoinError),
}

/// Coarse classification of [Error] values, for callers that only need to decide how to react.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind
{
	Configuration,
	InvalidRequest,
	/// Transport-level failure, retryable by the caller.
	Network,
	Cancelled,
	HttpStatus,
	RateLimited,
	Decode,
	SignatureVerify,
	UnsupportedContentType,
	UnsupportedContentEncoding,
	PathForbidden,
	MalformedBase64,
	NotFound,
	UnexpectedStatus,
	UnknownEvent,
	Signing,
}

impl Error
{
	pub fn kind(&self) -> ErrorKind
	{
		match self
		{
			Self::ReadConfigFile(_)
				| Self::ParseConfigFile(_)
				| Self::CreateHttpClient(_)
				| Self::InvalidBaseUrl(_) => ErrorKind::Configuration,
			Self::ParseUrl(_)
				| Self::InvalidHeaderValue(_)
				| Self::EncodeRequestBody(_)
				| Self::EncodeQueryOptions(_)
				| Self::UnsupportedQueryOption(_)
				| Self::ReadPayloadBody(_)
				| Self::InvalidCommit(_) => ErrorKind::InvalidRequest,
			Self::MakeGitHubApiRequest(_) | Self::ReadGitHubApiResponseBody(_) => ErrorKind::Network,
			Self::Cancelled | Self::DeadlineExceeded => ErrorKind::Cancelled,
			Self::ReceivedGitHubApiError(_)
				| Self::TwoFactorRequired(_)
				| Self::Accepted{..}
				| Self::Redirection{..} => ErrorKind::HttpStatus,
			Self::RateLimited{..} | Self::AbuseRateLimited{..} => ErrorKind::RateLimited,
			Self::DecodeGitHubApiResponseBody(_)
				| Self::DecodeRepositoryContent{..}
				| Self::ContentNotUtf8(_)
				| Self::MissingFormPayload
				| Self::DecodePayloadBody(_) => ErrorKind::Decode,
			Self::SignatureVerification(_) => ErrorKind::SignatureVerify,
			Self::UnsupportedContentType(_) => ErrorKind::UnsupportedContentType,
			Self::UnsupportedContentEncoding{..} => ErrorKind::UnsupportedContentEncoding,
			Self::PathForbidden(_) => ErrorKind::PathForbidden,
			Self::MissingBase64Content | Self::MalformedBase64(_) => ErrorKind::MalformedBase64,
			Self::FileNotFound{..} | Self::MissingDownloadUrl(_) => ErrorKind::NotFound,
			Self::UnexpectedStatus(_)
				| Self::InvalidRedirectLocation
				| Self::TooManyRedirects(_) => ErrorKind::UnexpectedStatus,
			Self::UnknownEvent(_) => ErrorKind::UnknownEvent,
			Self::SignCommit(_) | Self::SignerTask(_) => ErrorKind::Signing,
		}
	}

	/// The HTTP status code the server answered with, if this error stems from a response.
	pub fn status_code(&self) -> Option<reqwest::StatusCode>
	{
		match self
		{
			Self::ReceivedGitHubApiError(response) | Self::TwoFactorRequired(response) =>
				Some(response.status_code),
			Self::Accepted{..} => Some(reqwest::StatusCode::ACCEPTED),
			Self::Redirection{status_code, ..} | Self::UnexpectedStatus(status_code) =>
				Some(*status_code),
			_ => None,
		}
	}
}

// Allow this crate’s error type to be used for failed HTTP responses
impl warp::reject::Reject for Error
{
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn classifies_errors_by_kind()
	{
		assert_eq!(Error::Cancelled.kind(), ErrorKind::Cancelled);
		assert_eq!(Error::DeadlineExceeded.kind(), ErrorKind::Cancelled);
		assert_eq!(Error::PathForbidden("../etc".into()).kind(), ErrorKind::PathForbidden);
		assert_eq!(Error::MissingBase64Content.kind(), ErrorKind::MalformedBase64);
		assert_eq!(Error::UnknownEvent("nope".into()).kind(), ErrorKind::UnknownEvent);
		assert_eq!(Error::UnexpectedStatus(reqwest::StatusCode::OK).kind(),
			ErrorKind::UnexpectedStatus);
		assert_eq!(
			Error::SignatureVerification(crate::webhook::SignatureError::Mismatch).kind(),
			ErrorKind::SignatureVerify);
	}

	#[test]
	fn renders_encoding_hint()
	{
		let error = Error::UnsupportedContentEncoding
		{
			encoding: "none".into(),
			hint: Some("file too large, use the download URL"),
		};

		assert_eq!(error.to_string(),
			"unsupported content encoding “none” (file too large, use the download URL)");
	}
}
