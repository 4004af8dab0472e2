//! The repository contents API, which answers with either a single file or a directory listing
//! behind the same URL.

#[doc(hidden)]
const ENCODING_NONE_HINT: &str =
	"file exceeds 1 MiB and must be fetched through its download URL";

crate::models::partial_record!
{
	/// A file, directory, symlink or submodule in a repository. Directory listings leave out
	/// `content` and `encoding`.
	pub struct RepositoryContent
	{
		/// `file`, `dir`, `symlink` or `submodule`.
		pub r#type: String,
		/// `base64`, empty for inline plain content or `none` for files too large to be inlined.
		pub encoding: String,
		pub size: i64,
		pub name: String,
		pub path: String,
		/// The content as reported by the server. Use [RepositoryContent::decoded_content] to get
		/// the actual file contents.
		pub content: String,
		pub sha: String,
		pub url: String,
		pub git_url: String,
		pub html_url: String,
		pub download_url: String,
		pub submodule_git_url: String,
		/// Target of a symlink.
		pub target: String,
	}
}

impl RepositoryContent
{
	/// The file contents, decoded according to [RepositoryContent::encoding].
	pub fn decoded_content(&self) -> Result<Vec<u8>, crate::Error>
	{
		match self.encoding.as_deref().unwrap_or_default()
		{
			"base64" =>
			{
				let content = self.content.as_deref().ok_or(crate::Error::MissingBase64Content)?;

				// GitHub wraps base64 content in lines
				let content: String =
					content.chars().filter(|character| !character.is_ascii_whitespace()).collect();

				use base64::Engine as _;

				base64::engine::general_purpose::STANDARD.decode(content)
					.map_err(crate::Error::MalformedBase64)
			},
			"" => Ok(self.content.clone().unwrap_or_default().into_bytes()),
			"none" => Err(crate::Error::UnsupportedContentEncoding
			{
				encoding: "none".to_owned(),
				hint: Some(ENCODING_NONE_HINT),
			}),
			encoding => Err(crate::Error::UnsupportedContentEncoding
			{
				encoding: encoding.to_owned(),
				hint: None,
			}),
		}
	}

	/// The decoded file contents as text.
	pub fn get_content(&self) -> Result<String, crate::Error>
	{
		String::from_utf8(self.decoded_content()?).map_err(crate::Error::ContentNotUtf8)
	}
}

/// Either branch of a contents response.
#[derive(Clone, Debug, PartialEq)]
pub enum Contents
{
	File(Box<RepositoryContent>),
	/// Directory entries in the order reported by the server.
	Directory(Vec<RepositoryContent>),
}

impl Contents
{
	pub fn file(&self) -> Option<&RepositoryContent>
	{
		match self
		{
			Self::File(file) => Some(file),
			Self::Directory(_) => None,
		}
	}

	pub fn directory(&self) -> Option<&[RepositoryContent]>
	{
		match self
		{
			Self::File(_) => None,
			Self::Directory(entries) => Some(entries),
		}
	}
}

/// Decode a contents response, first as a single file and then as a directory listing.
#[doc(hidden)]
fn decode_contents(raw_body: &[u8]) -> Result<Contents, crate::Error>
{
	// Only JSON objects count as files, as records would also be decoded from arrays
	let file_error =
		match serde_json::from_slice::<serde_json::Map<String, serde_json::Value>>(raw_body)
		{
			Ok(fields) => match serde_json::from_value(serde_json::Value::Object(fields))
			{
				Ok(file) => return Ok(Contents::File(Box::new(file))),
				Err(error) => error,
			},
			Err(error) => error,
		};

	log::debug!("repository content is not a single file, decoding as directory listing");

	serde_json::from_slice(raw_body)
		.map(Contents::Directory)
		.map_err(|directory_error| crate::Error::DecodeRepositoryContent
		{
			file_error,
			directory_error,
		})
}

/// Options for reading repository contents.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct RepositoryContentGetOptions
{
	/// The name of the commit, branch or tag (default: the repository’s default branch).
	#[serde(rename = "ref")]
	pub reference: Option<String>,
}

/// Split a file path into its parent directory (empty for the repository root) and its name.
#[doc(hidden)]
fn split_path(path: &str) -> (&str, &str)
{
	match path.trim_end_matches('/').rsplit_once('/')
	{
		Some((directory, file_name)) => (directory, file_name),
		None => ("", path.trim_end_matches('/')),
	}
}

impl crate::repos::RepositoriesService<'_>
{
	/// Get the contents of a file or directory in a repository.
	///
	/// Paths containing `..` are refused without contacting the server.
	pub async fn get_contents(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		path: &str,
		options: Option<&RepositoryContentGetOptions>)
		-> Result<(Contents, crate::Response), crate::Error>
	{
		if path.contains("..")
		{
			return Err(crate::Error::PathForbidden(path.to_owned()));
		}

		let endpoint = format!("repos/{}/{}/contents/{}",
			crate::query::escape_path_segment(owner),
			crate::query::escape_path_segment(repository),
			crate::query::escape_ref(path.trim_end_matches('/')));
		let endpoint = crate::query::add_options(&endpoint, options)?;

		let request = self.client.new_request(reqwest::Method::GET, &endpoint, crate::client::NO_BODY)?;
		let (raw_body, response) = self.client.do_bytes(context, request).await?;

		Ok((decode_contents(&raw_body)?, response))
	}

	/// Get the preferred README of a repository.
	pub async fn get_readme(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		options: Option<&RepositoryContentGetOptions>)
		-> Result<(RepositoryContent, crate::Response), crate::Error>
	{
		let endpoint = format!("repos/{}/{}/readme",
			crate::query::escape_path_segment(owner),
			crate::query::escape_path_segment(repository));
		let endpoint = crate::query::add_options(&endpoint, options)?;

		self.client.get(context, &endpoint).await
	}

	/// Read the contents of a file of any size.
	///
	/// Files small enough to be inlined are returned directly. For larger files, the parent
	/// directory is listed to find the download URL of the file, which is then read with an
	/// independent request. The caller owns the returned body.
	pub async fn download_contents(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		path: &str,
		options: Option<&RepositoryContentGetOptions>)
		-> Result<(crate::ResponseBody, crate::Response), crate::Error>
	{
		if path.contains("..")
		{
			return Err(crate::Error::PathForbidden(path.to_owned()));
		}

		// Errors are not final here, the directory listing might still reveal a download URL
		if let Ok((Contents::File(file), response)) =
			self.get_contents(context, owner, repository, path, options).await
		{
			match file.decoded_content()
			{
				Ok(content) if !content.is_empty() =>
					return Ok((crate::ResponseBody::buffered(content), response)),
				_ => log::debug!("content of “{path}” not inlined, looking up its download URL"),
			}
		}

		let (directory, file_name) = split_path(path);

		let (contents, _) = self.get_contents(context, owner, repository, directory, options).await?;

		let entry = contents.directory().unwrap_or_default().iter()
			.find(|entry| entry.name.as_deref() == Some(file_name))
			.ok_or_else(|| crate::Error::FileNotFound
			{
				file_name: file_name.to_owned(),
				directory: directory.to_owned(),
			})?;

		let download_url = entry.download_url.as_deref()
			.filter(|download_url| !download_url.is_empty())
			.ok_or_else(|| crate::Error::MissingDownloadUrl(path.to_owned()))?;
		let download_url = url::Url::parse(download_url).map_err(crate::Error::ParseUrl)?;

		self.client.download(context, download_url).await
	}
}
