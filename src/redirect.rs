//! Resolving endpoints that answer with a `302 Found` pointing at short-lived object storage, such
//! as archive and artifact downloads.

impl crate::Client
{
	/// Send a request to an endpoint redirecting to a download location and return that location
	/// without downloading anything.
	///
	/// Permanent redirects (`301`) are followed up to the configured maximum. The final response
	/// must be a `302` with a valid `Location` header, anything else is an error. Whether the hops
	/// count against the rate limit is selected by [crate::client::Config::rate_limit_redirects].
	/// Response bodies along the way are drained and closed.
	pub async fn resolve_redirect(&self, context: &crate::RequestContext, mut request: reqwest::Request)
		-> Result<(url::Url, crate::Response), crate::Error>
	{
		let rate_limited = self.config().rate_limit_redirects;
		let max_redirects = self.config().max_redirects;
		let mut redirects = 0;

		loop
		{
			let method = request.method().clone();
			let (response, metadata) =
				self.send_without_redirects(context, request, rate_limited).await?;
			let status_code = response.status();

			if status_code != reqwest::StatusCode::MOVED_PERMANENTLY
				&& status_code != reqwest::StatusCode::FOUND
			{
				// Map error statuses the same way as any other request
				self.check_response(context, response, &metadata).await?;

				return Err(crate::Error::UnexpectedStatus(status_code));
			}

			let location = location(&response)?;

			// The body of a redirection carries no information, but reading it to the end lets
			// the connection be reused
			if let Err(error) = context.run(response.bytes()).await?
			{
				log::debug!("could not drain body of redirection: {error}");
			}

			if status_code == reqwest::StatusCode::FOUND
			{
				log::debug!("resolved redirection to download location");

				return Ok((location, metadata));
			}

			redirects += 1;

			if redirects > max_redirects
			{
				return Err(crate::Error::TooManyRedirects(max_redirects));
			}

			log::debug!("following permanent redirection to {location}");

			request = self.new_request_to_url(method, location)?;
		}
	}
}

/// The `Location` header of a redirection, resolved against the URL of the request.
#[doc(hidden)]
fn location(response: &reqwest::Response) -> Result<url::Url, crate::Error>
{
	let location = response.headers().get(reqwest::header::LOCATION)
		.and_then(|location| location.to_str().ok())
		.filter(|location| !location.trim().is_empty())
		.ok_or(crate::Error::InvalidRedirectLocation)?;

	response.url().join(location.trim()).map_err(|_| crate::Error::InvalidRedirectLocation)
}

#[cfg(test)]
mod tests
{
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use crate::client::tests::{test_client, test_client_with};

	fn tarball_request(client: &crate::Client) -> reqwest::Request
	{
		client.new_request(reqwest::Method::GET, "repos/o/r/tarball/main", crate::client::NO_BODY)
			.expect("valid request")
	}

	#[tokio::test]
	async fn returns_location_of_found_response() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r/tarball/main"))
			.respond_with(ResponseTemplate::new(302)
				.insert_header("location", "https://codeload.example/o/r/tar.gz/main")
				.insert_header("x-ratelimit-remaining", "41")
				.insert_header("x-ratelimit-limit", "60")
				.set_body_string("redirecting"))
			.expect(1)
			.mount(&mock_server)
			.await;

		let (location, response) =
			client.resolve_redirect(&crate::RequestContext::new(), tarball_request(&client)).await?;

		assert_eq!(location.as_str(), "https://codeload.example/o/r/tar.gz/main");
		assert_eq!(url::Url::parse(location.as_str())?, location);
		assert_eq!(response.status_code, reqwest::StatusCode::FOUND);
		// Without rate-limited redirects, no rate-limit headers are recorded
		assert_eq!(client.rate_limits().get(crate::rate_limit::Category::Core), None);

		Ok(())
	}

	#[tokio::test]
	async fn drains_bodies_of_repeated_redirections() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r/tarball/main"))
			.respond_with(ResponseTemplate::new(302)
				.insert_header("location", "https://codeload.example/o/r/tar.gz/main")
				.set_body_string("<html>moved</html>".repeat(4096)))
			.expect(3)
			.mount(&mock_server)
			.await;

		let context = crate::RequestContext::new();

		for _ in 0..3
		{
			let (location, _) = client.resolve_redirect(&context, tarball_request(&client)).await?;

			assert_eq!(location.as_str(), "https://codeload.example/o/r/tar.gz/main");
		}

		Ok(())
	}

	#[tokio::test]
	async fn follows_permanent_redirects_with_rate_limit_accounting() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client_with(&mock_server, crate::client::Config
		{
			rate_limit_redirects: true,
			..crate::client::Config::default()
		});

		Mock::given(method("GET"))
			.and(path("/repos/o/r/tarball/main"))
			.respond_with(ResponseTemplate::new(301)
				.insert_header("location", "/repos/o/renamed/tarball/main"))
			.expect(1)
			.mount(&mock_server)
			.await;

		Mock::given(method("GET"))
			.and(path("/repos/o/renamed/tarball/main"))
			.respond_with(ResponseTemplate::new(302)
				.insert_header("location", "https://codeload.example/o/renamed")
				.insert_header("x-ratelimit-limit", "5000")
				.insert_header("x-ratelimit-remaining", "4999"))
			.expect(1)
			.mount(&mock_server)
			.await;

		let (location, _) =
			client.resolve_redirect(&crate::RequestContext::new(), tarball_request(&client)).await?;

		assert_eq!(location.as_str(), "https://codeload.example/o/renamed");
		assert_eq!(client.rate_limits().get(crate::rate_limit::Category::Core)
			.map(|rate| rate.remaining), Some(4999));

		Ok(())
	}

	#[tokio::test]
	async fn rejects_final_status_other_than_found() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;

		Mock::given(method("GET"))
			.and(path("/repos/o/r/tarball/main"))
			.respond_with(ResponseTemplate::new(200).set_body_string("archive"))
			.mount(&mock_server)
			.await;

		for rate_limit_redirects in [false, true]
		{
			let client = test_client_with(&mock_server, crate::client::Config
			{
				rate_limit_redirects,
				..crate::client::Config::default()
			});

			let result =
				client.resolve_redirect(&crate::RequestContext::new(), tarball_request(&client)).await;

			assert!(matches!(result,
				Err(crate::Error::UnexpectedStatus(status)) if status == reqwest::StatusCode::OK));
		}

		Ok(())
	}

	#[tokio::test]
	async fn maps_error_statuses_and_missing_locations() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/missing/tarball/main"))
			.respond_with(ResponseTemplate::new(404)
				.set_body_json(serde_json::json!({"message": "Not Found"})))
			.mount(&mock_server)
			.await;

		Mock::given(method("GET"))
			.and(path("/repos/o/r/tarball/main"))
			.respond_with(ResponseTemplate::new(302))
			.mount(&mock_server)
			.await;

		let context = crate::RequestContext::new();
		let request = client.new_request(reqwest::Method::GET, "repos/o/missing/tarball/main",
			crate::client::NO_BODY)?;

		assert!(matches!(client.resolve_redirect(&context, request).await,
			Err(crate::Error::ReceivedGitHubApiError(_))));
		assert!(matches!(client.resolve_redirect(&context, tarball_request(&client)).await,
			Err(crate::Error::InvalidRedirectLocation)));

		Ok(())
	}

	#[tokio::test]
	async fn stops_after_maximum_redirects() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client_with(&mock_server, crate::client::Config
		{
			max_redirects: 2,
			..crate::client::Config::default()
		});

		Mock::given(method("GET"))
			.and(path("/repos/o/r/tarball/main"))
			.respond_with(ResponseTemplate::new(301)
				.insert_header("location", "/repos/o/r/tarball/main"))
			.expect(3)
			.mount(&mock_server)
			.await;

		let result =
			client.resolve_redirect(&crate::RequestContext::new(), tarball_request(&client)).await;

		assert!(matches!(result, Err(crate::Error::TooManyRedirects(2))));

		Ok(())
	}
}
