#[doc(hidden)]
const HEADER_RATE_LIMIT: &str = "x-ratelimit-limit";
#[doc(hidden)]
const HEADER_RATE_REMAINING: &str = "x-ratelimit-remaining";
#[doc(hidden)]
const HEADER_RATE_USED: &str = "x-ratelimit-used";
#[doc(hidden)]
pub(crate) const HEADER_RATE_RESET: &str = "x-ratelimit-reset";
#[doc(hidden)]
const HEADER_RATE_RESOURCE: &str = "x-ratelimit-resource";

/// Rate-limit bucket tracked independently by the GitHub server.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize,
	serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category
{
	Core,
	Search,
	Graphql,
	IntegrationManifest,
	SourceImport,
	CodeScanningUpload,
	ActionsRunnerRegistration,
	Scim,
	DependencySnapshots,
	CodeSearch,
	AuditLog,
}

impl Category
{
	pub const ALL: [Category; 11] =
	[
		Self::Core,
		Self::Search,
		Self::Graphql,
		Self::IntegrationManifest,
		Self::SourceImport,
		Self::CodeScanningUpload,
		Self::ActionsRunnerRegistration,
		Self::Scim,
		Self::DependencySnapshots,
		Self::CodeSearch,
		Self::AuditLog,
	];

	/// Look up a category by its wire name.
	pub fn from_name(name: &str) -> Option<Self>
	{
		Self::ALL.into_iter().find(|category| category.as_str() == name)
	}

	pub fn as_str(self) -> &'static str
	{
		match self
		{
			Self::Core => "core",
			Self::Search => "search",
			Self::Graphql => "graphql",
			Self::IntegrationManifest => "integration_manifest",
			Self::SourceImport => "source_import",
			Self::CodeScanningUpload => "code_scanning_upload",
			Self::ActionsRunnerRegistration => "actions_runner_registration",
			Self::Scim => "scim",
			Self::DependencySnapshots => "dependency_snapshots",
			Self::CodeSearch => "code_search",
			Self::AuditLog => "audit_log",
		}
	}

	/// Determine the category a request is counted against from its method and URL path (with
	/// leading slash, relative to the API root).
	///
	/// No endpoint maps to [Category::ActionsRunnerRegistration], requests to register runners are
	/// counted as [Category::Core].
	pub fn for_request(method: &reqwest::Method, path: &str) -> Self
	{
		if path.starts_with("/search/code") && method == reqwest::Method::GET
		{
			return Self::CodeSearch;
		}

		if path.starts_with("/search/")
		{
			return Self::Search;
		}

		if path == "/graphql"
		{
			return Self::Graphql;
		}

		if path.starts_with("/app-manifests/") && path.ends_with("/conversions")
			&& method == reqwest::Method::POST
		{
			return Self::IntegrationManifest;
		}

		if path.starts_with("/repos/") && path.ends_with("/import") && method == reqwest::Method::PUT
		{
			return Self::SourceImport;
		}

		if path.ends_with("/code-scanning/sarifs")
		{
			return Self::CodeScanningUpload;
		}

		if path.starts_with("/scim/")
		{
			return Self::Scim;
		}

		if path.starts_with("/repos/") && path.ends_with("/dependency-graph/snapshots")
			&& method == reqwest::Method::POST
		{
			return Self::DependencySnapshots;
		}

		if path.ends_with("/audit-log")
		{
			return Self::AuditLog;
		}

		Self::Core
	}
}

impl std::fmt::Display for Category
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.write_str(self.as_str())
	}
}

/// Rate-limit snapshot for one category, as reported by the server.
///
/// `used + remaining <= limit` is expected to hold but not enforced, the server is authoritative.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Rate
{
	/// The maximum number of requests permitted per hour.
	pub limit: i64,
	/// The number of requests remaining in the current window.
	pub remaining: i64,
	/// The number of requests made in the current window.
	pub used: i64,
	/// The time at which the current window resets, in UTC epoch seconds (0 if unknown).
	pub reset: i64,
	/// The name of the resource the limit applies to.
	pub resource: String,
}

impl Rate
{
	/// Parse the rate-limit headers of a response. Missing or malformed headers leave the
	/// respective fields at zero.
	pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self
	{
		let header = |name: &str|
		{
			headers.get(name).and_then(|value| value.to_str().ok()).map(str::trim)
		};
		let number = |name: &str| header(name).and_then(|value| value.parse().ok()).unwrap_or(0);

		Self
		{
			limit: number(HEADER_RATE_LIMIT),
			remaining: number(HEADER_RATE_REMAINING),
			used: number(HEADER_RATE_USED),
			reset: number(HEADER_RATE_RESET),
			resource: header(HEADER_RATE_RESOURCE).unwrap_or_default().to_owned(),
		}
	}

	/// Whether the response carried any rate-limit information at all.
	pub fn is_empty(&self) -> bool
	{
		*self == Self::default()
	}

	pub fn reset_time(&self) -> Option<chrono::DateTime<chrono::Utc>>
	{
		match self.reset
		{
			0 => None,
			reset => chrono::DateTime::<chrono::Utc>::from_timestamp(reset, 0),
		}
	}

	/// Whether this snapshot forbids further requests until its reset time.
	pub fn is_exhausted_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool
	{
		self.remaining == 0 && self.reset_time().map_or(false, |reset| now < reset)
	}
}

#[doc(hidden)]
#[derive(Debug, Default)]
struct State
{
	rates: std::collections::HashMap<Category, Rate>,
	secondary_reset: Option<chrono::DateTime<chrono::Utc>>,
}

/// Per-category rate-limit snapshots shared by all requests of a client.
///
/// Updates replace the stored snapshot of a category under a single exclusive lock that is only
/// held for the assignment. Enforcement reads take the same lock.
#[derive(Debug, Default)]
pub struct RateLimitState
{
	#[doc(hidden)]
	state: std::sync::Mutex<State>,
}

impl RateLimitState
{
	pub fn new() -> Self
	{
		Self::default()
	}

	#[doc(hidden)]
	fn lock(&self) -> std::sync::MutexGuard<'_, State>
	{
		// The guarded data is plain assignments, so a panic in another holder cannot leave it
		// half-written
		self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
	}

	/// The last known snapshot for a category.
	pub fn get(&self, category: Category) -> Option<Rate>
	{
		self.lock().rates.get(&category).cloned()
	}

	/// A copy of all known snapshots.
	pub fn snapshot(&self) -> std::collections::HashMap<Category, Rate>
	{
		self.lock().rates.clone()
	}

	/// Replace the snapshot of a category.
	pub fn update(&self, category: Category, rate: Rate)
	{
		log::debug!("rate limit for “{category}”: {} of {} remaining, resets at epoch {}",
			rate.remaining, rate.limit, rate.reset);

		self.lock().rates.insert(category, rate);
	}

	/// Record that the server asked us to back off from all requests until the given time.
	pub fn record_secondary_limit(&self, until: chrono::DateTime<chrono::Utc>)
	{
		self.lock().secondary_reset = Some(until);
	}

	/// Refuse a request locally if the last known snapshot of its category is exhausted and hasn’t
	/// reset yet, or if a secondary rate limit is still in effect.
	pub fn check(&self, category: Category) -> Result<(), crate::Error>
	{
		let now = chrono::Utc::now();

		let (rate, secondary_reset) =
		{
			let state = self.lock();
			(state.rates.get(&category).cloned(), state.secondary_reset)
		};

		if let Some(rate) = rate.filter(|rate| rate.is_exhausted_at(now))
		{
			log::warn!("API rate limit for “{category}” still exceeded, not making remote request");

			return Err(crate::Error::RateLimited
			{
				message: format!("API rate limit of {} still exceeded until epoch {}, not making \
					remote request", rate.limit, rate.reset),
				rate,
				pre_emptive: true,
			});
		}

		if let Some(secondary_reset) = secondary_reset.filter(|reset| now < *reset)
		{
			log::warn!("API secondary rate limit still in effect, not making remote request");

			return Err(crate::Error::AbuseRateLimited
			{
				retry_after: (secondary_reset - now).to_std().ok(),
				message: format!("API secondary rate limit exceeded until {secondary_reset}, not \
					making remote request"),
			});
		}

		Ok(())
	}
}

/// Rate limits per category as reported by the rate-limit endpoint.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RateLimits
{
	pub resources: std::collections::BTreeMap<Category, Rate>,
}

#[doc(hidden)]
#[derive(serde::Deserialize)]
struct RateLimitsResponse
{
	#[serde(default)]
	resources: std::collections::BTreeMap<String, Rate>,
}

/// The rate-limit endpoint.
pub struct RateLimitService<'a>
{
	#[doc(hidden)]
	client: &'a crate::Client,
}

impl<'a> RateLimitService<'a>
{
	pub(crate) fn new(client: &'a crate::Client) -> Self
	{
		Self{client}
	}

	/// Get the current rate limits of all categories and store them in the client’s rate-limit
	/// state.
	///
	/// Requests to this endpoint don’t count against any rate limit, so they are neither refused
	/// locally nor recorded from the response headers.
	pub async fn get(&self, context: &crate::RequestContext)
		-> Result<(RateLimits, crate::Response), crate::Error>
	{
		let context = context.clone().bypass_rate_limit_check();

		let (body, response): (RateLimitsResponse, _) = self.client.get(&context, "rate_limit").await?;

		let mut rate_limits = RateLimits::default();

		for (name, rate) in body.resources
		{
			match Category::from_name(&name)
			{
				Some(category) =>
				{
					self.client.rate_limits().update(category, rate.clone());
					rate_limits.resources.insert(category, rate);
				},
				None => log::debug!("ignoring rate limit of unknown category “{name}”"),
			}
		}

		Ok((rate_limits, response))
	}
}
