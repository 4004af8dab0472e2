/// The standard media type of the v3 REST API, sent as `Accept` header unless overridden.
pub const MEDIA_TYPE_V3: &str = "application/vnd.github.v3+json";
/// Media type requesting the raw contents of a file.
pub const MEDIA_TYPE_RAW: &str = "application/vnd.github.v3.raw";
/// Preview media type for content attachments.
pub const MEDIA_TYPE_CONTENT_ATTACHMENTS_PREVIEW: &str =
	"application/vnd.github.content-attachments-preview+json";
/// Preview media type for the Pages API.
pub const MEDIA_TYPE_PAGES_PREVIEW: &str = "application/vnd.github.pages-api-preview+json";

#[doc(hidden)]
const HEADER_API_VERSION: &str = "x-github-api-version";
#[doc(hidden)]
const HEADER_OTP: &str = "x-github-otp";
#[doc(hidden)]
const HEADER_FROM_CACHE: &str = "x-from-cache";
#[doc(hidden)]
const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";

/// Configuration of the GitHub API client.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config
{
	/// The base URL of the GitHub API server with a trailing slash (optional, default:
	/// <https://api.github.com/>).
	#[serde(default = "github_com_api_base_url")]
	pub base_url: url::Url,
	/// The base URL for uploads with a trailing slash (optional, default:
	/// <https://uploads.github.com/>).
	#[serde(default = "github_com_upload_url")]
	pub upload_url: url::Url,
	/// A pre-obtained token sent as bearer credential with every API request (optional, requests
	/// are unauthenticated without it).
	#[serde(default)]
	pub token: Option<Credential>,
	/// The user agent sent with every request (optional, default: `hubwire/<version>`).
	#[serde(default = "default_user_agent")]
	pub user_agent: String,
	/// The REST API version requested via the `X-GitHub-Api-Version` header (optional, default:
	/// `2022-11-28`).
	#[serde(default = "default_api_version")]
	pub api_version: String,
	/// Whether requests to endpoints answering with redirects to short-lived download URLs count
	/// against the rate limit (optional, default: `false`).
	#[serde(default)]
	pub rate_limit_redirects: bool,
	/// How many permanent redirects to follow on such endpoints (optional, default: 10).
	#[serde(default = "default_max_redirects")]
	pub max_redirects: u32,
}

impl Default for Config
{
	fn default() -> Self
	{
		Self
		{
			base_url: github_com_api_base_url(),
			upload_url: github_com_upload_url(),
			token: None,
			user_agent: default_user_agent(),
			api_version: default_api_version(),
			rate_limit_redirects: false,
			max_redirects: default_max_redirects(),
		}
	}
}

#[doc(hidden)]
fn github_com_api_base_url() -> url::Url
{
	url::Url::parse("https://api.github.com/")
		.expect("this call is infallible because we know the URL to be well-formed")
}

#[doc(hidden)]
fn github_com_upload_url() -> url::Url
{
	url::Url::parse("https://uploads.github.com/")
		.expect("this call is infallible because we know the URL to be well-formed")
}

#[doc(hidden)]
fn default_user_agent() -> String
{
	concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned()
}

#[doc(hidden)]
fn default_api_version() -> String
{
	"2022-11-28".to_owned()
}

#[doc(hidden)]
fn default_max_redirects() -> u32
{
	10
}

/// An opaque bearer credential, set once at client construction.
#[derive(Clone, Eq, PartialEq, serde::Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential
{
	pub fn new<S>(token: S) -> Self
	where
		S: Into<String>
	{
		Self(token.into())
	}

	pub(crate) fn expose(&self) -> &str
	{
		&self.0
	}

	#[doc(hidden)]
	fn authorization_header(&self) -> Result<reqwest::header::HeaderValue, crate::Error>
	{
		let mut value = reqwest::header::HeaderValue::from_str(&format!("Bearer {}", self.0))
			.map_err(crate::Error::InvalidHeaderValue)?;
		value.set_sensitive(true);

		Ok(value)
	}
}

// Never print the token itself
impl std::fmt::Debug for Credential
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.write_str("Credential(<redacted>)")
	}
}

/// A GitHub API client carrying a pre-obtained credential.
///
/// The client can safely be shared between threads and tasks, which is achieved by internally
/// using thread-safe handles to the underlying data structures. All clones share the same
/// rate-limit state, independent clients each own their own.
#[derive(Clone)]
pub struct Client
{
	#[doc(hidden)]
	config: std::sync::Arc<Config>,
	#[doc(hidden)]
	reqwest_client: reqwest_middleware::ClientWithMiddleware,
	#[doc(hidden)]
	// Used where redirects must be inspected instead of followed
	reqwest_client_without_redirects: reqwest_middleware::ClientWithMiddleware,
	#[doc(hidden)]
	rate_limits: std::sync::Arc<crate::rate_limit::RateLimitState>,
}

impl Client
{
	/// Initialize a new GitHub API client with a given configuration.
	pub fn from_config(config: Config) -> Result<Self, crate::Error>
	{
		let build = |redirect_policy|
		{
			reqwest::ClientBuilder::new()
				// Set a recognizable user agent to get meaningful debugging information from GitHub
				.user_agent(config.user_agent.as_str())
				.redirect(redirect_policy)
				.build().map_err(crate::Error::CreateHttpClient)
		};

		let reqwest_client = build(reqwest::redirect::Policy::default())?;
		let reqwest_client_without_redirects = build(reqwest::redirect::Policy::none())?;

		Self::with_transports(config,
			reqwest_middleware::ClientBuilder::new(reqwest_client).build(),
			reqwest_middleware::ClientBuilder::new(reqwest_client_without_redirects).build())
	}

	/// Initialize a new GitHub API client on top of caller-provided transports, for example to
	/// plug in custom middleware. The second transport must not follow redirects.
	pub fn with_transports(
		config: Config,
		reqwest_client: reqwest_middleware::ClientWithMiddleware,
		reqwest_client_without_redirects: reqwest_middleware::ClientWithMiddleware)
		-> Result<Self, crate::Error>
	{
		// Endpoints are joined onto the base URLs, which only works as expected with a trailing
		// slash
		for url in [&config.base_url, &config.upload_url]
		{
			if !url.path().ends_with('/')
			{
				return Err(crate::Error::InvalidBaseUrl(url.clone()));
			}
		}

		Ok(Self
		{
			config: std::sync::Arc::new(config),
			reqwest_client,
			reqwest_client_without_redirects,
			rate_limits: std::sync::Arc::new(crate::rate_limit::RateLimitState::new()),
		})
	}

	pub fn config(&self) -> &Config
	{
		&self.config
	}

	/// The rate-limit snapshots recorded from responses so far.
	pub fn rate_limits(&self) -> &crate::rate_limit::RateLimitState
	{
		&self.rate_limits
	}

	pub fn repositories(&self) -> crate::repos::RepositoriesService<'_>
	{
		crate::repos::RepositoriesService::new(self)
	}

	pub fn git(&self) -> crate::git::GitService<'_>
	{
		crate::git::GitService::new(self)
	}

	pub fn actions(&self) -> crate::actions::ActionsService<'_>
	{
		crate::actions::ActionsService::new(self)
	}

	pub fn rate_limit(&self) -> crate::rate_limit::RateLimitService<'_>
	{
		crate::rate_limit::RateLimitService::new(self)
	}

	pub fn hook_deliveries(&self) -> crate::webhook::HookDeliveriesService<'_>
	{
		crate::webhook::HookDeliveriesService::new(self)
	}

	/// Build a request to the GitHub API with the credential, user agent, API version and default
	/// `Accept` headers applied.
	///
	/// # Arguments
	/// - `method`: The HTTP method to use (example: [reqwest::Method::POST]).
	/// - `endpoint`: The API endpoint (without host and leading slash, example:
	///   `repos/example_organization`), possibly with a query string.
	/// - `body`: A serializable type containing the request body.
	pub fn new_request<B>(&self, method: reqwest::Method, endpoint: &str, body: Option<&B>)
		-> Result<reqwest::Request, crate::Error>
	where
		B: serde::Serialize + ?Sized,
	{
		// Build the API endpoint URL from the base URL and the endpoint path
		let url = self.config.base_url.join(endpoint).map_err(crate::Error::ParseUrl)?;

		let mut request = self.new_request_to_url(method, url)?;

		// Append the request body if provided
		if let Some(body) = body
		{
			let body = serde_json::to_vec(body).map_err(crate::Error::EncodeRequestBody)?;

			request.headers_mut().insert(reqwest::header::CONTENT_TYPE,
				reqwest::header::HeaderValue::from_static("application/json"));
			*request.body_mut() = Some(body.into());
		}

		Ok(request)
	}

	/// Build a `POST` request uploading raw content to an endpoint relative to the upload URL, such
	/// as a release asset.
	///
	/// # Arguments
	/// - `endpoint`: The upload endpoint (without host and leading slash, example:
	///   `repos/o/r/releases/1/assets?name=asset.zip`).
	/// - `content`: The content to upload.
	/// - `media_type`: The media type of the content (example: `application/zip`).
	pub fn new_upload_request(&self, endpoint: &str, content: bytes::Bytes, media_type: &str)
		-> Result<reqwest::Request, crate::Error>
	{
		let url = self.config.upload_url.join(endpoint).map_err(crate::Error::ParseUrl)?;

		let mut request = self.new_request_to_url(reqwest::Method::POST, url)?;
		let headers = request.headers_mut();

		headers.insert(reqwest::header::CONTENT_TYPE,
			reqwest::header::HeaderValue::from_str(media_type)
				.map_err(crate::Error::InvalidHeaderValue)?);
		headers.insert(reqwest::header::CONTENT_LENGTH, content.len().into());
		*request.body_mut() = Some(content.into());

		Ok(request)
	}

	/// Build a request to an absolute URL with the same headers as [Client::new_request].
	pub fn new_request_to_url(&self, method: reqwest::Method, url: url::Url)
		-> Result<reqwest::Request, crate::Error>
	{
		let mut request = reqwest::Request::new(method, url);
		let headers = request.headers_mut();

		// Request the v3 REST API, as recommended by GitHub’s documentation
		headers.insert(reqwest::header::ACCEPT,
			reqwest::header::HeaderValue::from_static(MEDIA_TYPE_V3));
		headers.insert(reqwest::header::USER_AGENT,
			reqwest::header::HeaderValue::from_str(&self.config.user_agent)
				.map_err(crate::Error::InvalidHeaderValue)?);
		headers.insert(HEADER_API_VERSION,
			reqwest::header::HeaderValue::from_str(&self.config.api_version)
				.map_err(crate::Error::InvalidHeaderValue)?);

		// Provide the credential using the Authorization header
		if let Some(token) = &self.config.token
		{
			headers.insert(reqwest::header::AUTHORIZATION, token.authorization_header()?);
		}

		Ok(request)
	}

	/// Determine the rate-limit category of a request from its path relative to the API root.
	#[doc(hidden)]
	fn rate_limit_category(&self, request: &reqwest::Request) -> crate::rate_limit::Category
	{
		let base_path = self.config.base_url.path().trim_end_matches('/');
		let path = request.url().path();
		let path = path.strip_prefix(base_path).unwrap_or(path);

		crate::rate_limit::Category::for_request(request.method(), path)
	}

	/// Send a request through the given transport, enforcing and recording rate limits unless the
	/// context bypasses them. The response status is not inspected.
	pub(crate) async fn send(
		&self,
		context: &crate::RequestContext,
		transport: &reqwest_middleware::ClientWithMiddleware,
		request: reqwest::Request)
		-> Result<(reqwest::Response, crate::Response), crate::Error>
	{
		context.check()?;

		let category = self.rate_limit_category(&request);
		let bypass = context.is_rate_limit_check_bypassed();

		// If we’ve hit the rate limit, don’t make further requests before the reset time
		if !bypass
		{
			self.rate_limits.check(category)?;
		}

		log::debug!("{} {}", request.method(), request.url());

		let response = context.run(transport.execute(request)).await?
			.map_err(crate::Error::MakeGitHubApiRequest)?;
		let metadata = crate::Response::from_reqwest(&response);

		// Don’t update the rate limits from cached responses or responses without rate-limit
		// headers
		if !bypass && !response.headers().contains_key(HEADER_FROM_CACHE) && !metadata.rate.is_empty()
		{
			self.rate_limits.update(category, metadata.rate.clone());
		}

		Ok((response, metadata))
	}

	/// Map non-successful responses to errors, reading their bodies for details.
	pub(crate) async fn check_response(
		&self,
		context: &crate::RequestContext,
		response: reqwest::Response,
		metadata: &crate::Response)
		-> Result<reqwest::Response, crate::Error>
	{
		let status_code = response.status();

		if status_code.is_success() && status_code != reqwest::StatusCode::ACCEPTED
		{
			return Ok(response);
		}

		let url = response.url().to_owned();

		// Decode the body for debugging purposes
		let raw_body = context.run(response.bytes()).await?
			.map_err(crate::Error::ReadGitHubApiResponseBody)?;

		log::debug!("received status code {status_code} from {url}");

		// Scheduled jobs are reported as errors, as the result isn’t ready yet
		if status_code == reqwest::StatusCode::ACCEPTED
		{
			return Err(crate::Error::Accepted{raw_body: raw_body.to_vec()});
		}

		if status_code.is_redirection()
		{
			let location = metadata.headers.get(reqwest::header::LOCATION)
				.and_then(|location| location.to_str().ok())
				.and_then(|location| url.join(location).ok());

			return Err(crate::Error::Redirection{status_code, location});
		}

		let header = |name: &str| metadata.headers.get(name)
			.and_then(|value| value.to_str().ok())
			.map(str::trim);

		let error_response = crate::response::ErrorResponse::new(status_code, url, &raw_body);
		let is_rate_limit_status = status_code == reqwest::StatusCode::FORBIDDEN
			|| status_code == reqwest::StatusCode::TOO_MANY_REQUESTS;

		if status_code == reqwest::StatusCode::UNAUTHORIZED
			&& header(HEADER_OTP).map_or(false, |otp| otp.starts_with("required"))
		{
			return Err(crate::Error::TwoFactorRequired(Box::new(error_response)));
		}

		if is_rate_limit_status && header(HEADER_RATE_REMAINING) == Some("0")
		{
			return Err(crate::Error::RateLimited
			{
				rate: metadata.rate.clone(),
				message: error_response.body.message,
				pre_emptive: false,
			});
		}

		let is_secondary_rate_limit = error_response.body.documentation_url.as_deref()
			.map_or(false, |url| url.ends_with("#abuse-rate-limits")
				|| url.ends_with("secondary-rate-limits"));

		if is_rate_limit_status && is_secondary_rate_limit
		{
			let retry_after = secondary_retry_after(&metadata.headers);

			if let Some(retry_after) = retry_after
			{
				let retry_after = chrono::Duration::from_std(retry_after)
					.unwrap_or_else(|_| chrono::Duration::zero());
				self.rate_limits.record_secondary_limit(chrono::Utc::now() + retry_after);
			}

			log::warn!("hit GitHub API secondary rate limit");

			return Err(crate::Error::AbuseRateLimited
			{
				retry_after,
				message: error_response.body.message,
			});
		}

		Err(crate::Error::ReceivedGitHubApiError(Box::new(error_response)))
	}

	/// Send a request and return the response with its body unread. Non-successful responses are
	/// mapped to errors.
	pub async fn bare_do(&self, context: &crate::RequestContext, request: reqwest::Request)
		-> Result<(reqwest::Response, crate::Response), crate::Error>
	{
		let (response, metadata) = self.send(context, &self.reqwest_client, request).await?;
		let response = self.check_response(context, response, &metadata).await?;

		Ok((response, metadata))
	}

	/// Send a request without following redirects and without inspecting the response status.
	/// Rate limits are only enforced and recorded if `rate_limited` is set.
	pub(crate) async fn send_without_redirects(
		&self,
		context: &crate::RequestContext,
		request: reqwest::Request,
		rate_limited: bool)
		-> Result<(reqwest::Response, crate::Response), crate::Error>
	{
		if rate_limited
		{
			return self.send(context, &self.reqwest_client_without_redirects, request).await;
		}

		context.check()?;

		log::debug!("{} {}", request.method(), request.url());

		let response = context.run(self.reqwest_client_without_redirects.execute(request)).await?
			.map_err(crate::Error::MakeGitHubApiRequest)?;
		let metadata = crate::Response::from_reqwest(&response);

		Ok((response, metadata))
	}

	/// Send a request and decode the JSON response body into the target type.
	pub async fn do_json<R>(&self, context: &crate::RequestContext, request: reqwest::Request)
		-> Result<(R, crate::Response), crate::Error>
	where
		R: serde::de::DeserializeOwned,
	{
		let (body, metadata) = self.do_bytes(context, request).await?;

		// Allow deserializing empty responses as empty dictionaries instead, as empty strings are
		// invalid JSON
		let body = match body.is_empty()
		{
			true => b"{}".to_vec(),
			false => body,
		};

		let value = serde_json::from_slice(&body).map_err(crate::Error::DecodeGitHubApiResponseBody)?;

		Ok((value, metadata))
	}

	/// Send a request and read the full response body into memory.
	pub async fn do_bytes(&self, context: &crate::RequestContext, request: reqwest::Request)
		-> Result<(Vec<u8>, crate::Response), crate::Error>
	{
		let (response, metadata) = self.bare_do(context, request).await?;

		let body = context.run(response.bytes()).await?
			.map_err(crate::Error::ReadGitHubApiResponseBody)?;

		Ok((body.to_vec(), metadata))
	}

	/// Send a request and hand the unread response body over to the caller.
	pub async fn do_stream(&self, context: &crate::RequestContext, request: reqwest::Request)
		-> Result<(crate::ResponseBody, crate::Response), crate::Error>
	{
		let (response, metadata) = self.bare_do(context, request).await?;

		Ok((crate::ResponseBody::streaming(response, context.clone()), metadata))
	}

	/// Send a request and discard the response body.
	pub async fn do_discard(&self, context: &crate::RequestContext, request: reqwest::Request)
		-> Result<crate::Response, crate::Error>
	{
		let (_, metadata) = self.do_bytes(context, request).await?;

		Ok(metadata)
	}

	/// Make an HTTP request to the GitHub API and decode the JSON response.
	///
	/// # Arguments
	/// - `context`: The request context controlling cancellation and rate-limit accounting.
	/// - `method`: The HTTP method to use (example: [reqwest::Method::POST]).
	/// - `endpoint`: The API endpoint (without host and leading slash, example:
	///   `repos/example_organization`).
	/// - `body`: A serializable type containing the request body.
	pub async fn request<B, R>(
		&self,
		context: &crate::RequestContext,
		method: reqwest::Method,
		endpoint: &str,
		body: Option<&B>)
		-> Result<(R, crate::Response), crate::Error>
	where
		B: serde::Serialize + ?Sized,
		R: serde::de::DeserializeOwned,
	{
		let request = self.new_request(method, endpoint, body)?;

		self.do_json(context, request).await
	}

	/// Make an HTTP DELETE request to the GitHub API (for arguments, see [Client::request]).
	pub async fn delete(&self, context: &crate::RequestContext, endpoint: &str)
		-> Result<crate::Response, crate::Error>
	{
		let request = self.new_request(reqwest::Method::DELETE, endpoint, NO_BODY)?;

		self.do_discard(context, request).await
	}

	/// Make an HTTP GET request to the GitHub API (for arguments, see [Client::request]).
	pub async fn get<R>(&self, context: &crate::RequestContext, endpoint: &str)
		-> Result<(R, crate::Response), crate::Error>
	where
		R: serde::de::DeserializeOwned,
	{
		self.request(context, reqwest::Method::GET, endpoint, NO_BODY).await
	}

	/// Make an HTTP PATCH request to the GitHub API (for arguments, see [Client::request]).
	pub async fn patch<B, R>(&self, context: &crate::RequestContext, endpoint: &str, body: &B)
		-> Result<(R, crate::Response), crate::Error>
	where
		B: serde::Serialize + ?Sized,
		R: serde::de::DeserializeOwned,
	{
		self.request(context, reqwest::Method::PATCH, endpoint, Some(body)).await
	}

	/// Make an HTTP POST request to the GitHub API (for arguments, see [Client::request]).
	pub async fn post<B, R>(&self, context: &crate::RequestContext, endpoint: &str, body: &B)
		-> Result<(R, crate::Response), crate::Error>
	where
		B: serde::Serialize + ?Sized,
		R: serde::de::DeserializeOwned,
	{
		self.request(context, reqwest::Method::POST, endpoint, Some(body)).await
	}

	/// Make an HTTP PUT request to the GitHub API (for arguments, see [Client::request]).
	pub async fn put<B, R>(&self, context: &crate::RequestContext, endpoint: &str, body: &B)
		-> Result<(R, crate::Response), crate::Error>
	where
		B: serde::Serialize + ?Sized,
		R: serde::de::DeserializeOwned,
	{
		self.request(context, reqwest::Method::PUT, endpoint, Some(body)).await
	}

	/// Send an independent GET request to an absolute URL outside the API, such as a download
	/// link, and hand the body over to the caller. No credential is attached and no rate limits
	/// are recorded.
	pub(crate) async fn download(&self, context: &crate::RequestContext, url: url::Url)
		-> Result<(crate::ResponseBody, crate::Response), crate::Error>
	{
		context.check()?;

		let request = self.reqwest_client.get(url);
		let response = context.run(request.send()).await?
			.map_err(crate::Error::MakeGitHubApiRequest)?;
		let metadata = crate::Response::from_reqwest(&response);
		let response = self.check_response(context, response, &metadata).await?;

		Ok((crate::ResponseBody::streaming(response, context.clone()), metadata))
	}
}

/// Override the `Accept` header of a request, for example with a preview media type.
pub fn set_accept(request: &mut reqwest::Request, media_type: &'static str)
{
	request.headers_mut().insert(reqwest::header::ACCEPT,
		reqwest::header::HeaderValue::from_static(media_type));
}

/// When making requests without a request body, we don’t care which type is used to represent it.
/// However, the compiler needs to know some type at compile time. This alias is used in order not
/// to have to spell out the dummy type.
pub const NO_BODY: Option<&()> = None;

/// How long to wait after hitting a secondary rate limit, from `Retry-After` (in seconds) or else
/// from the rate-limit reset time (in epoch seconds).
#[doc(hidden)]
fn secondary_retry_after(headers: &reqwest::header::HeaderMap) -> Option<std::time::Duration>
{
	let header = |name: &str| headers.get(name)
		.and_then(|value| value.to_str().ok())
		.and_then(|value| value.trim().parse::<i64>().ok());

	if let Some(seconds) = header(reqwest::header::RETRY_AFTER.as_str())
	{
		return Some(std::time::Duration::from_secs(seconds.max(0) as u64));
	}

	let reset = header(crate::rate_limit::HEADER_RATE_RESET)?;
	let seconds = reset - chrono::Utc::now().timestamp();

	Some(std::time::Duration::from_secs(seconds.max(0) as u64))
}

#[cfg(test)]
pub(crate) mod tests
{
	use wiremock::matchers::{header, method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;

	/// Create a client talking to the mock server with a test token.
	pub(crate) fn test_client(mock_server: &MockServer) -> Client
	{
		test_client_with(mock_server, Config::default())
	}

	pub(crate) fn test_client_with(mock_server: &MockServer, config: Config) -> Client
	{
		let base_url = url::Url::parse(&format!("{}/", mock_server.uri())).expect("valid URL");

		Client::from_config(Config
		{
			base_url: base_url.clone(),
			upload_url: base_url,
			token: Some(Credential::new("test_token")),
			..config
		}).expect("valid configuration")
	}

	#[derive(Debug, serde::Deserialize)]
	struct Login
	{
		login: Option<String>,
	}

	#[tokio::test]
	async fn applies_default_headers_and_decodes_json() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/user"))
			.and(header("accept", MEDIA_TYPE_V3))
			.and(header("authorization", "Bearer test_token"))
			.and(header("user-agent", default_user_agent().as_str()))
			.and(header("x-github-api-version", "2022-11-28"))
			.respond_with(ResponseTemplate::new(200)
				.set_body_json(serde_json::json!({"login": "octocat"})))
			.expect(1)
			.mount(&mock_server)
			.await;

		let (user, response): (Login, _) = client.get(&crate::RequestContext::new(), "user").await?;

		assert_eq!(user.login.as_deref(), Some("octocat"));
		assert_eq!(response.status_code, reqwest::StatusCode::OK);

		Ok(())
	}

	#[tokio::test]
	async fn uploads_to_upload_url() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = Client::from_config(Config
		{
			base_url: url::Url::parse(&format!("{}/api/v3/", mock_server.uri()))?,
			upload_url: url::Url::parse(&format!("{}/api/uploads/", mock_server.uri()))?,
			token: Some(Credential::new("test_token")),
			..Config::default()
		})?;

		Mock::given(method("POST"))
			.and(path("/api/uploads/repos/o/r/releases/1/assets"))
			.and(wiremock::matchers::query_param("name", "notes.txt"))
			.and(header("content-type", "text/plain"))
			.and(header("content-length", "11"))
			.and(header("authorization", "Bearer test_token"))
			.and(wiremock::matchers::body_string("hello world"))
			.respond_with(ResponseTemplate::new(201)
				.set_body_json(serde_json::json!({"login": "uploader"})))
			.expect(1)
			.mount(&mock_server)
			.await;

		let request = client.new_upload_request("repos/o/r/releases/1/assets?name=notes.txt",
			bytes::Bytes::from_static(b"hello world"), "text/plain")?;
		let (uploader, response): (Login, _) =
			client.do_json(&crate::RequestContext::new(), request).await?;

		assert_eq!(uploader.login.as_deref(), Some("uploader"));
		assert_eq!(response.status_code, reqwest::StatusCode::CREATED);

		Ok(())
	}

	#[tokio::test]
	async fn empty_body_decodes_as_empty_record() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("PUT"))
			.and(path("/user/starred/o/r"))
			.respond_with(ResponseTemplate::new(204))
			.mount(&mock_server)
			.await;

		let (user, _): (Login, _) =
			client.put(&crate::RequestContext::new(), "user/starred/o/r", &()).await?;

		assert_eq!(user.login, None);

		Ok(())
	}

	#[tokio::test]
	async fn records_rate_limit_and_maps_exhausted_limit() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r"))
			.respond_with(ResponseTemplate::new(403)
				.insert_header("x-ratelimit-limit", "60")
				.insert_header("x-ratelimit-remaining", "0")
				.insert_header("x-ratelimit-used", "60")
				.insert_header("x-ratelimit-reset", "1700000000")
				.insert_header("x-ratelimit-resource", "core")
				.set_body_json(serde_json::json!({"message": "API rate limit exceeded"})))
			.mount(&mock_server)
			.await;

		let result: Result<(Login, _), _> =
			client.get(&crate::RequestContext::new(), "repos/o/r").await;

		match result
		{
			Err(crate::Error::RateLimited{rate, message, pre_emptive}) =>
			{
				assert_eq!(rate.reset, 1700000000);
				assert_eq!(message, "API rate limit exceeded");
				assert!(!pre_emptive);
			},
			other => panic!("expected rate-limit error, got {other:?}"),
		}

		let core = client.rate_limits().get(crate::rate_limit::Category::Core)
			.expect("core rate limit recorded");
		assert_eq!(core.remaining, 0);
		assert_eq!(core.reset, 1700000000);

		Ok(())
	}

	#[tokio::test]
	async fn exhausted_rate_limit_refuses_without_network() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&mock_server)
			.await;

		client.rate_limits().update(crate::rate_limit::Category::Search, crate::rate_limit::Rate
		{
			limit: 30,
			remaining: 0,
			used: 30,
			reset: chrono::Utc::now().timestamp() + 600,
			resource: "search".into(),
		});

		let result: Result<(Login, _), _> =
			client.get(&crate::RequestContext::new(), "search/issues?q=bug").await;

		assert!(matches!(result, Err(crate::Error::RateLimited{pre_emptive: true, ..})));

		Ok(())
	}

	#[tokio::test]
	async fn bypass_skips_enforcement_and_accounting() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/search/issues"))
			.respond_with(ResponseTemplate::new(200)
				.insert_header("x-ratelimit-limit", "30")
				.insert_header("x-ratelimit-remaining", "29")
				.set_body_json(serde_json::json!({})))
			.expect(1)
			.mount(&mock_server)
			.await;

		let exhausted = crate::rate_limit::Rate
		{
			limit: 30,
			remaining: 0,
			reset: chrono::Utc::now().timestamp() + 600,
			..Default::default()
		};
		client.rate_limits().update(crate::rate_limit::Category::Search, exhausted.clone());

		let context = crate::RequestContext::new().bypass_rate_limit_check();
		let _: (Login, _) = client.get(&context, "search/issues").await?;

		assert_eq!(client.rate_limits().get(crate::rate_limit::Category::Search), Some(exhausted));

		Ok(())
	}

	#[tokio::test]
	async fn cached_responses_are_not_counted() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200)
				.insert_header("x-from-cache", "1")
				.insert_header("x-ratelimit-remaining", "10")
				.set_body_json(serde_json::json!({})))
			.mount(&mock_server)
			.await;

		let _: (Login, _) = client.get(&crate::RequestContext::new(), "user").await?;

		assert_eq!(client.rate_limits().get(crate::rate_limit::Category::Core), None);

		Ok(())
	}

	#[tokio::test]
	async fn secondary_rate_limit_blocks_following_requests() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("POST"))
			.and(path("/repos/o/r/issues"))
			.respond_with(ResponseTemplate::new(403)
				.insert_header("retry-after", "120")
				.set_body_json(serde_json::json!({
					"message": "You have exceeded a secondary rate limit.",
					"documentation_url": "https://docs.github.com/rest/overview/rate-limits-for-the-rest-api#about-secondary-rate-limits",
				})))
			.expect(1)
			.mount(&mock_server)
			.await;

		let context = crate::RequestContext::new();
		let body = serde_json::json!({"title": "t"});

		let result: Result<(Login, _), _> = client.post(&context, "repos/o/r/issues", &body).await;
		assert!(matches!(result, Err(crate::Error::AbuseRateLimited{retry_after: Some(retry_after), ..})
			if retry_after == std::time::Duration::from_secs(120)));

		// The second attempt is refused locally
		let result: Result<(Login, _), _> = client.post(&context, "repos/o/r/issues", &body).await;
		assert!(matches!(result, Err(crate::Error::AbuseRateLimited{..})));

		Ok(())
	}

	#[tokio::test]
	async fn maps_error_statuses() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/missing"))
			.respond_with(ResponseTemplate::new(404)
				.set_body_json(serde_json::json!({
					"message": "Not Found",
					"documentation_url": "https://docs.github.com/rest/repos/repos#get-a-repository",
				})))
			.mount(&mock_server)
			.await;

		Mock::given(method("GET"))
			.and(path("/repos/o/r/stats/contributors"))
			.respond_with(ResponseTemplate::new(202).set_body_string("{}"))
			.mount(&mock_server)
			.await;

		Mock::given(method("GET"))
			.and(path("/user"))
			.respond_with(ResponseTemplate::new(401)
				.insert_header("x-github-otp", "required; sms")
				.set_body_json(serde_json::json!({"message": "Must specify two-factor code."})))
			.mount(&mock_server)
			.await;

		let context = crate::RequestContext::new();

		match client.get::<Login>(&context, "repos/o/missing").await
		{
			Err(crate::Error::ReceivedGitHubApiError(response)) =>
			{
				assert_eq!(response.status_code, reqwest::StatusCode::NOT_FOUND);
				assert_eq!(response.body.message, "Not Found");
				assert!(response.body.documentation_url.is_some());
			},
			other => panic!("expected API error, got {other:?}"),
		}

		assert!(matches!(client.get::<Login>(&context, "repos/o/r/stats/contributors").await,
			Err(crate::Error::Accepted{raw_body}) if raw_body == b"{}"));
		assert!(matches!(client.get::<Login>(&context, "user").await,
			Err(crate::Error::TwoFactorRequired(_))));

		Ok(())
	}

	#[tokio::test]
	async fn cancelled_context_never_sends() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200))
			.expect(0)
			.mount(&mock_server)
			.await;

		let context = crate::RequestContext::new();
		context.cancel();

		let result = client.get::<Login>(&context, "user").await;

		assert!(matches!(result, Err(crate::Error::Cancelled)));

		Ok(())
	}

	#[tokio::test]
	async fn deadline_aborts_slow_response() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.respond_with(ResponseTemplate::new(200)
				.set_delay(std::time::Duration::from_secs(5))
				.set_body_json(serde_json::json!({})))
			.mount(&mock_server)
			.await;

		let context = crate::RequestContext::new().with_timeout(std::time::Duration::from_millis(50));
		let result = client.get::<Login>(&context, "user").await;

		assert!(matches!(result, Err(crate::Error::DeadlineExceeded)));

		Ok(())
	}

	#[tokio::test]
	async fn streams_and_discards_bodies() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r/readme"))
			.respond_with(ResponseTemplate::new(200).set_body_string("# Title"))
			.mount(&mock_server)
			.await;

		let context = crate::RequestContext::new();

		let mut request = client.new_request(reqwest::Method::GET, "repos/o/r/readme", NO_BODY)?;
		set_accept(&mut request, MEDIA_TYPE_RAW);
		let (body, _) = client.do_stream(&context, request).await?;
		assert_eq!(body.bytes().await?, b"# Title");

		let request = client.new_request(reqwest::Method::GET, "repos/o/r/readme", NO_BODY)?;
		let response = client.do_discard(&context, request).await?;
		assert_eq!(response.status_code, reqwest::StatusCode::OK);

		Ok(())
	}

	#[test]
	fn rejects_base_url_without_trailing_slash()
	{
		let config = Config
		{
			base_url: url::Url::parse("https://github.example.com/api/v3").expect("valid URL"),
			..Config::default()
		};

		assert!(matches!(Client::from_config(config), Err(crate::Error::InvalidBaseUrl(_))));
	}

	#[test]
	fn derives_category_relative_to_enterprise_base_path()
	{
		let client = Client::from_config(Config
		{
			base_url: url::Url::parse("https://github.example.com/api/v3/").expect("valid URL"),
			..Config::default()
		}).expect("valid configuration");

		let request = client.new_request(reqwest::Method::GET, "search/code?q=x", NO_BODY)
			.expect("valid request");

		assert_eq!(client.rate_limit_category(&request), crate::rate_limit::Category::CodeSearch);
	}

	#[test]
	fn credential_is_redacted_in_debug_output()
	{
		let credential = Credential::new("ghp_secret");

		assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
	}
}
