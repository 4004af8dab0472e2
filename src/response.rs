#[doc(hidden)]
const HEADER_TOKEN_EXPIRATION: &str = "github-authentication-token-expiration";

/// Metadata of a GitHub API response: status, headers, the rate limit reported along with it and
/// pagination links.
#[derive(Clone, Debug)]
pub struct Response
{
	pub status_code: reqwest::StatusCode,
	pub headers: reqwest::header::HeaderMap,
	/// The rate-limit snapshot reported by this response (all zero if the headers are absent).
	pub rate: crate::rate_limit::Rate,
	pub next_page: Option<u32>,
	pub prev_page: Option<u32>,
	pub first_page: Option<u32>,
	pub last_page: Option<u32>,
	/// Set instead of [Response::next_page] if the next page is identified by a non-numeric token.
	pub next_page_token: Option<String>,
	/// Cursor for endpoints using cursor-based pagination.
	pub cursor: Option<String>,
	pub before: Option<String>,
	pub after: Option<String>,
	/// Expiration of the token used for this request, if the server reports it.
	pub token_expiration: Option<chrono::DateTime<chrono::FixedOffset>>,
}

impl Response
{
	pub fn from_parts(status_code: reqwest::StatusCode, headers: reqwest::header::HeaderMap) -> Self
	{
		let mut response = Self
		{
			status_code,
			rate: crate::rate_limit::Rate::from_headers(&headers),
			token_expiration: parse_token_expiration(&headers),
			headers,
			next_page: None,
			prev_page: None,
			first_page: None,
			last_page: None,
			next_page_token: None,
			cursor: None,
			before: None,
			after: None,
		};

		response.populate_page_values();
		response
	}

	pub(crate) fn from_reqwest(response: &reqwest::Response) -> Self
	{
		Self::from_parts(response.status(), response.headers().clone())
	}

	/// Parse the `Link` header into pagination values.
	#[doc(hidden)]
	fn populate_page_values(&mut self)
	{
		let links = match self.headers.get(reqwest::header::LINK).and_then(|value| value.to_str().ok())
		{
			Some(links) => links.to_owned(),
			None => return,
		};

		for link in links.split(',')
		{
			let mut segments = link.trim().split(';');

			let target = match segments.next().map(str::trim)
			{
				Some(target) if target.starts_with('<') && target.ends_with('>') =>
					&target[1..target.len() - 1],
				_ => continue,
			};

			let relations: Vec<_> = segments.map(str::trim).collect();

			// A link must at least have a target and a relation
			if relations.is_empty()
			{
				continue;
			}

			let url = match url::Url::parse(target)
			{
				Ok(url) => url,
				Err(_) => continue,
			};

			let query = |name: &str| url.query_pairs()
				.find(|(key, _)| key == name)
				.map(|(_, value)| value.into_owned())
				.filter(|value| !value.is_empty());

			if let Some(cursor) = query("cursor")
			{
				if relations.contains(&r#"rel="next""#)
				{
					self.cursor = Some(cursor);
				}

				continue;
			}

			let before = query("before");
			let after = query("after");
			let page = query("page").or_else(|| query("since"));

			if page.is_none() && before.is_none() && after.is_none()
			{
				continue;
			}

			let page_number = page.as_deref().and_then(|page| page.parse().ok());

			for relation in &relations
			{
				match *relation
				{
					r#"rel="next""# =>
					{
						self.next_page = page_number;

						if page_number.is_none()
						{
							self.next_page_token = page.clone();
						}

						self.after = after.clone();
					},
					r#"rel="prev""# =>
					{
						self.prev_page = page_number;
						self.before = before.clone();
					},
					r#"rel="first""# => self.first_page = page_number,
					r#"rel="last""# => self.last_page = page_number,
					_ => (),
				}
			}
		}
	}
}

#[doc(hidden)]
fn parse_token_expiration(headers: &reqwest::header::HeaderMap)
	-> Option<chrono::DateTime<chrono::FixedOffset>>
{
	let value = headers.get(HEADER_TOKEN_EXPIRATION)?.to_str().ok()?.trim();

	// Most tokens report their expiration in UTC, some with a numeric offset instead
	if let Some(value) = value.strip_suffix(" UTC")
	{
		return chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").ok()
			.map(|time| time.and_utc().fixed_offset());
	}

	chrono::DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z").ok()
}

/// Error body of a failed GitHub API response.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ErrorBody
{
	pub message: String,
	pub errors: Vec<ErrorDetail>,
	pub documentation_url: Option<String>,
	/// Only populated on some errors, such as 451 Unavailable For Legal Reasons.
	pub block: Option<ErrorBlock>,
}

/// Details about an individual error. GitHub sometimes reports plain strings instead of objects.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail
{
	Structured
	{
		#[serde(default)]
		resource: String,
		#[serde(default)]
		field: String,
		#[serde(default)]
		code: String,
		#[serde(default)]
		message: String,
	},
	Message(String),
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ErrorBlock
{
	pub reason: String,
	pub created_at: Option<crate::models::Timestamp>,
}

/// A failed GitHub API response.
#[derive(Clone, Debug)]
pub struct ErrorResponse
{
	pub status_code: reqwest::StatusCode,
	pub url: url::Url,
	/// The decoded error body (empty if the body wasn’t valid JSON).
	pub body: ErrorBody,
	/// The response body as received, for debugging purposes.
	pub raw_body: String,
}

impl ErrorResponse
{
	pub fn new(status_code: reqwest::StatusCode, url: url::Url, raw_body: &[u8]) -> Self
	{
		Self
		{
			status_code,
			url,
			body: serde_json::from_slice(raw_body).unwrap_or_default(),
			raw_body: String::from_utf8_lossy(raw_body).into_owned(),
		}
	}
}

/// A response body owned by the caller.
///
/// Dropping the body closes the underlying connection. Reads honor the cancellation and deadline
/// of the request context the body was obtained with.
pub struct ResponseBody
{
	#[doc(hidden)]
	inner: BodyInner,
	#[doc(hidden)]
	context: crate::RequestContext,
}

#[doc(hidden)]
enum BodyInner
{
	Buffered(Option<bytes::Bytes>),
	Streaming(reqwest::Response),
}

impl ResponseBody
{
	pub(crate) fn streaming(response: reqwest::Response, context: crate::RequestContext) -> Self
	{
		Self{inner: BodyInner::Streaming(response), context}
	}

	pub(crate) fn buffered(bytes: impl Into<bytes::Bytes>) -> Self
	{
		Self{inner: BodyInner::Buffered(Some(bytes.into())), context: crate::RequestContext::new()}
	}

	/// Read the next chunk of the body, or `None` once the body is exhausted.
	pub async fn chunk(&mut self) -> Result<Option<bytes::Bytes>, crate::Error>
	{
		match &mut self.inner
		{
			BodyInner::Buffered(bytes) => Ok(bytes.take().filter(|bytes| !bytes.is_empty())),
			BodyInner::Streaming(response) => self.context.run(response.chunk()).await?
				.map_err(crate::Error::ReadGitHubApiResponseBody),
		}
	}

	/// Read the remainder of the body into memory.
	pub async fn bytes(mut self) -> Result<Vec<u8>, crate::Error>
	{
		let mut buffer = Vec::new();

		while let Some(chunk) = self.chunk().await?
		{
			buffer.extend_from_slice(&chunk);
		}

		Ok(buffer)
	}

	/// Turn the body into a stream of chunks.
	pub fn into_stream(self)
		-> impl futures::Stream<Item = Result<bytes::Bytes, crate::Error>> + Send
	{
		futures::stream::try_unfold(self, |mut body| async move
		{
			Ok(body.chunk().await?.map(|chunk| (chunk, body)))
		})
	}
}

impl std::fmt::Debug for ResponseBody
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		let kind = match self.inner
		{
			BodyInner::Buffered(_) => "buffered",
			BodyInner::Streaming(_) => "streaming",
		};

		formatter.debug_struct("ResponseBody").field("kind", &kind).finish()
	}
}
