/// GitHub Actions endpoints answering with short-lived download locations.
pub struct ActionsService<'a>
{
	#[doc(hidden)]
	client: &'a crate::Client,
}

impl<'a> ActionsService<'a>
{
	pub(crate) fn new(client: &'a crate::Client) -> Self
	{
		Self{client}
	}

	#[doc(hidden)]
	async fn download_location(&self, context: &crate::RequestContext, endpoint: &str)
		-> Result<(url::Url, crate::Response), crate::Error>
	{
		let request = self.client.new_request(reqwest::Method::GET, endpoint, crate::client::NO_BODY)?;

		self.client.resolve_redirect(context, request).await
	}

	/// Get the URL to download a zip archive of a workflow artifact.
	pub async fn download_artifact(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		artifact_id: i64)
		-> Result<(url::Url, crate::Response), crate::Error>
	{
		let endpoint = format!("repos/{}/{}/actions/artifacts/{artifact_id}/zip",
			crate::query::escape_path_segment(owner),
			crate::query::escape_path_segment(repository));

		self.download_location(context, &endpoint).await
	}

	/// Get the URL to download the logs of a workflow run.
	pub async fn get_workflow_run_logs(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		run_id: i64)
		-> Result<(url::Url, crate::Response), crate::Error>
	{
		let endpoint = format!("repos/{}/{}/actions/runs/{run_id}/logs",
			crate::query::escape_path_segment(owner),
			crate::query::escape_path_segment(repository));

		self.download_location(context, &endpoint).await
	}
}

#[cfg(test)]
mod tests
{
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use crate::client::tests::test_client;

	#[tokio::test]
	async fn resolves_artifact_and_log_locations() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r/actions/artifacts/11/zip"))
			.respond_with(ResponseTemplate::new(302)
				.insert_header("location", "https://pipelines.example/artifact.zip"))
			.mount(&mock_server)
			.await;

		Mock::given(method("GET"))
			.and(path("/repos/o/r/actions/runs/22/logs"))
			.respond_with(ResponseTemplate::new(302)
				.insert_header("location", "https://pipelines.example/logs.zip"))
			.mount(&mock_server)
			.await;

		let context = crate::RequestContext::new();
		let actions = client.actions();

		let (artifact, _) = actions.download_artifact(&context, "o", "r", 11).await?;
		let (logs, _) = actions.get_workflow_run_logs(&context, "o", "r", 22).await?;

		assert_eq!(artifact.as_str(), "https://pipelines.example/artifact.zip");
		assert_eq!(logs.as_str(), "https://pipelines.example/logs.zip");

		Ok(())
	}

	#[tokio::test]
	async fn expired_logs_are_not_found() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r/actions/runs/33/logs"))
			.respond_with(ResponseTemplate::new(410)
				.set_body_json(serde_json::json!({"message": "Gone"})))
			.mount(&mock_server)
			.await;

		let result = client.actions()
			.get_workflow_run_logs(&crate::RequestContext::new(), "o", "r", 33).await;

		assert!(matches!(result,
			Err(error) if error.status_code() == Some(reqwest::StatusCode::GONE)));

		Ok(())
	}
}
