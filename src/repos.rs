/// Format of a repository archive.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat
{
	Tarball,
	Zipball,
}

impl ArchiveFormat
{
	pub fn as_str(self) -> &'static str
	{
		match self
		{
			Self::Tarball => "tarball",
			Self::Zipball => "zipball",
		}
	}
}

impl std::fmt::Display for ArchiveFormat
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.write_str(self.as_str())
	}
}

/// Repository endpoints. The contents API is covered in [crate::contents].
pub struct RepositoriesService<'a>
{
	#[doc(hidden)]
	pub(crate) client: &'a crate::Client,
}

impl<'a> RepositoriesService<'a>
{
	pub(crate) fn new(client: &'a crate::Client) -> Self
	{
		Self{client}
	}

	#[doc(hidden)]
	fn endpoint(owner: &str, repository: &str) -> String
	{
		format!("repos/{}/{}", crate::query::escape_path_segment(owner),
			crate::query::escape_path_segment(repository))
	}

	/// Get a repository.
	pub async fn get(&self, context: &crate::RequestContext, owner: &str, repository: &str)
		-> Result<(crate::models::Repository, crate::Response), crate::Error>
	{
		self.client.get(context, &Self::endpoint(owner, repository)).await
	}

	/// Get a branch. Renamed branches are followed to their new name.
	pub async fn get_branch(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		branch: &str)
		-> Result<(crate::models::Branch, crate::Response), crate::Error>
	{
		// Branch names may contain slashes, which must not be taken as path separators here
		let endpoint = format!("{}/branches/{}", Self::endpoint(owner, repository),
			crate::query::escape_path_segment(branch));

		self.client.get(context, &endpoint).await
	}

	/// Get the short-lived download URL of a repository archive, for the default branch unless a
	/// ref is given.
	pub async fn get_archive_link(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		format: ArchiveFormat,
		options: Option<&crate::contents::RepositoryContentGetOptions>)
		-> Result<(url::Url, crate::Response), crate::Error>
	{
		let mut endpoint = format!("{}/{format}", Self::endpoint(owner, repository));

		if let Some(reference) = options.and_then(|options| options.reference.as_deref())
			.filter(|reference| !reference.is_empty())
		{
			endpoint.push('/');
			endpoint.push_str(&crate::query::escape_ref(reference));
		}

		let request = self.client.new_request(reqwest::Method::GET, &endpoint, crate::client::NO_BODY)?;

		self.client.resolve_redirect(context, request).await
	}
}

#[cfg(test)]
mod tests
{
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	use super::*;
	use crate::client::tests::test_client;

	#[tokio::test]
	async fn gets_repository() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"id": 1296269,
				"name": "r",
				"full_name": "o/r",
				"owner": {"login": "o"},
				"default_branch": "main",
			})))
			.mount(&mock_server)
			.await;

		let (repository, _) = client.repositories().get(&crate::RequestContext::new(), "o", "r").await?;

		assert_eq!(repository.full_name.as_deref(), Some("o/r"));
		assert_eq!(repository.owner.and_then(|owner| owner.login).as_deref(), Some("o"));
		assert_eq!(repository.private, None);

		Ok(())
	}

	#[tokio::test]
	async fn gets_branch_with_slashes() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r/branches/feature%2Fx"))
			.respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
				"name": "feature/x",
				"protected": false,
				"commit": {"sha": "abc"},
			})))
			.mount(&mock_server)
			.await;

		let (branch, _) = client.repositories()
			.get_branch(&crate::RequestContext::new(), "o", "r", "feature/x").await?;

		assert_eq!(branch.name.as_deref(), Some("feature/x"));
		assert_eq!(branch.protected, Some(false));

		Ok(())
	}

	#[tokio::test]
	async fn resolves_archive_link() -> anyhow::Result<()>
	{
		let mock_server = MockServer::start().await;
		let client = test_client(&mock_server);

		Mock::given(method("GET"))
			.and(path("/repos/o/r/tarball/main"))
			.respond_with(ResponseTemplate::new(302)
				.insert_header("location", "https://codeload.example/o/r/legacy.tar.gz/refs/heads/main"))
			.expect(1)
			.mount(&mock_server)
			.await;

		let options = crate::contents::RepositoryContentGetOptions{reference: Some("main".into())};
		let (location, _) = client.repositories()
			.get_archive_link(&crate::RequestContext::new(), "o", "r", ArchiveFormat::Tarball,
				Some(&options)).await?;

		assert_eq!(location.host_str(), Some("codeload.example"));
		assert_eq!(location.path(), "/o/r/legacy.tar.gz/refs/heads/main");

		Ok(())
	}
}
