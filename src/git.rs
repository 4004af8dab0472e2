//! The Git database API: creating (optionally signed) commits and reading references.

/// A backend producing detached signatures, such as a local GPG or SSH key or a remote signing
/// service.
///
/// The signer reads the message to sign from `message` and writes the armored signature to
/// `signature`. It is run on a blocking thread, so it may block on I/O.
pub trait MessageSigner: Send + Sync
{
	fn sign(&self, signature: &mut dyn std::io::Write, message: &mut dyn std::io::Read)
		-> std::io::Result<()>;
}

impl<F> MessageSigner for F
where
	F: Fn(&mut dyn std::io::Write, &mut dyn std::io::Read) -> std::io::Result<()> + Send + Sync,
{
	fn sign(&self, signature: &mut dyn std::io::Write, message: &mut dyn std::io::Read)
		-> std::io::Result<()>
	{
		self(signature, message)
	}
}

/// Options for creating commits.
#[derive(Clone, Default)]
pub struct CreateCommitOptions
{
	/// Signs commits that don’t carry a signature yet.
	pub signer: Option<std::sync::Arc<dyn MessageSigner>>,
}

impl std::fmt::Debug for CreateCommitOptions
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.debug_struct("CreateCommitOptions")
			.field("signer", &self.signer.as_ref().map(|_| "<signer>"))
			.finish()
	}
}

/// A commit to be created.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewCommit
{
	pub message: String,
	/// The SHA of the tree object this commit points to.
	pub tree: String,
	/// The SHAs of the parent commits, in order. Empty for a root commit.
	pub parents: Vec<String>,
	pub author: Option<crate::models::CommitAuthor>,
	/// Defaults to the author if absent.
	pub committer: Option<crate::models::CommitAuthor>,
	/// A detached signature of [NewCommit::signature_message]. If absent, it is computed by the
	/// signer passed in [CreateCommitOptions], if any.
	pub signature: Option<String>,
}

impl NewCommit
{
	/// The canonical form of this commit as stored by git, over which signatures are computed.
	pub fn signature_message(&self) -> Result<String, crate::Error>
	{
		if self.message.is_empty()
		{
			return Err(crate::Error::InvalidCommit("message is required for signing"));
		}

		let author = self.author.as_ref()
			.ok_or(crate::Error::InvalidCommit("author is required for signing"))?;
		let committer = self.committer.as_ref().unwrap_or(author);

		let mut lines = Vec::with_capacity(self.parents.len() + 4);

		if !self.tree.is_empty()
		{
			lines.push(format!("tree {}", self.tree));
		}

		for parent in &self.parents
		{
			lines.push(format!("parent {parent}"));
		}

		lines.push(format!("author {}", identity_line(author)?));
		// A blank line separates the headers from the message
		lines.push(format!("committer {}\n", identity_line(committer)?));
		lines.push(self.message.clone());

		Ok(lines.join("\n"))
	}
}

/// `name <email> <epoch seconds> <±HHMM>`, as in git commit objects.
#[doc(hidden)]
fn identity_line(identity: &crate::models::CommitAuthor) -> Result<String, crate::Error>
{
	let date = identity.date
		.ok_or(crate::Error::InvalidCommit("author and committer dates are required for signing"))?;

	Ok(format!("{} <{}> {} {}",
		identity.name.as_deref().unwrap_or_default(),
		identity.email.as_deref().unwrap_or_default(),
		date.0.timestamp(),
		date.0.format("%z")))
}

#[doc(hidden)]
#[derive(serde::Serialize)]
struct CreateCommitRequest<'a>
{
	message: &'a str,
	tree: &'a str,
	parents: &'a [String],
	#[serde(skip_serializing_if = "Option::is_none")]
	author: Option<&'a crate::models::CommitAuthor>,
	#[serde(skip_serializing_if = "Option::is_none")]
	committer: Option<&'a crate::models::CommitAuthor>,
	#[serde(skip_serializing_if = "Option::is_none")]
	signature: Option<&'a str>,
}

pub struct GitService<'a>
{
	#[doc(hidden)]
	client: &'a crate::Client,
}

impl<'a> GitService<'a>
{
	pub(crate) fn new(client: &'a crate::Client) -> Self
	{
		Self{client}
	}

	/// Create a commit in a repository, signing it first if a signer is given and the commit
	/// doesn’t carry a signature yet.
	pub async fn create_commit(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		commit: &NewCommit,
		options: Option<&CreateCommitOptions>)
		-> Result<(crate::models::Commit, crate::Response), crate::Error>
	{
		let signer = options.and_then(|options| options.signer.clone());

		let signature = match (&commit.signature, signer)
		{
			(Some(signature), _) => Some(signature.clone()),
			(None, Some(signer)) => Some(sign(context, signer, commit.signature_message()?).await?),
			(None, None) => None,
		};

		let body = CreateCommitRequest
		{
			message: &commit.message,
			tree: &commit.tree,
			parents: &commit.parents,
			author: commit.author.as_ref(),
			committer: commit.committer.as_ref(),
			signature: signature.as_deref(),
		};

		let endpoint = format!("repos/{}/{}/git/commits",
			crate::query::escape_path_segment(owner),
			crate::query::escape_path_segment(repository));

		self.client.post(context, &endpoint, &body).await
	}

	/// Get a single reference. The `refs/` prefix is optional (example: `heads/main`).
	pub async fn get_ref(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		reference: &str)
		-> Result<(crate::models::Reference, crate::Response), crate::Error>
	{
		let reference = reference.strip_prefix("refs/").unwrap_or(reference);

		let endpoint = format!("repos/{}/{}/git/ref/{}",
			crate::query::escape_path_segment(owner),
			crate::query::escape_path_segment(repository),
			crate::query::escape_ref(reference));

		self.client.get(context, &endpoint).await
	}
}

/// Run the signer on a blocking thread and collect its output.
#[doc(hidden)]
async fn sign(
	context: &crate::RequestContext,
	signer: std::sync::Arc<dyn MessageSigner>,
	message: String)
	-> Result<String, crate::Error>
{
	let task = tokio::task::spawn_blocking(move ||
	{
		let mut signature = Vec::new();
		signer.sign(&mut signature, &mut message.as_bytes())?;

		String::from_utf8(signature)
			.map_err(|error| std::io::Error::new(std::io::ErrorKind::InvalidData, error))
	});

	let signature = context.run(task).await?
		.map_err(crate::Error::SignerTask)?
		.map_err(crate::Error::SignCommit)?;

	log::debug!("signed commit");

	Ok(signature)
}
