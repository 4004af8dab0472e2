/// Declare a partial data model as returned in responses from the GitHub API.
///
/// Every field is independently optional: `None` means the server didn’t return the field, which
/// is distinct from a field returned with a zero value. Absent fields are also left out when
/// serializing a record for a request. The generated type implements [std::fmt::Display] through
/// [crate::stringify::stringify].
macro_rules! partial_record
{
	(
		$(#[$meta:meta])*
		pub struct $name:ident
		{
			$(
				$(#[$field_meta:meta])*
				pub $field:ident: $type:ty,
			)*
		}
	) =>
	{
		$(#[$meta])*
		#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
		#[serde(rename_all = "snake_case")]
		pub struct $name
		{
			$(
				$(#[$field_meta])*
				#[serde(default, skip_serializing_if = "Option::is_none")]
				pub $field: Option<$type>,
			)*
		}

		impl std::fmt::Display for $name
		{
			fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
			{
				formatter.write_str(&crate::stringify::stringify(self))
			}
		}
	};
}

pub(crate) use partial_record;

/// A point in time as reported by the GitHub API.
///
/// Most endpoints report RFC 3339 strings, while some webhook payloads (such as `push`) carry
/// integer epoch seconds. Both are accepted, and timestamps are always serialized as RFC 3339.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Timestamp(pub chrono::DateTime<chrono::FixedOffset>);

impl Timestamp
{
	/// Create a UTC timestamp from epoch seconds, if in range.
	pub fn from_unix(seconds: i64) -> Option<Self>
	{
		chrono::DateTime::<chrono::Utc>::from_timestamp(seconds, 0)
			.map(|time| Self(time.fixed_offset()))
	}

	pub fn to_rfc3339(&self) -> String
	{
		self.0.to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true)
	}
}

impl std::fmt::Display for Timestamp
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.write_str(&self.to_rfc3339())
	}
}

impl From<chrono::DateTime<chrono::FixedOffset>> for Timestamp
{
	fn from(time: chrono::DateTime<chrono::FixedOffset>) -> Self
	{
		Self(time)
	}
}

impl serde::Serialize for Timestamp
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_newtype_struct(crate::stringify::TIMESTAMP_NEWTYPE, &self.to_rfc3339())
	}
}

impl<'de> serde::Deserialize<'de> for Timestamp
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		deserializer.deserialize_any(TimestampVisitor)
	}
}

#[doc(hidden)]
struct TimestampVisitor;

impl<'de> serde::de::Visitor<'de> for TimestampVisitor
{
	type Value = Timestamp;

	fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.write_str("an RFC 3339 timestamp or integer epoch seconds")
	}

	fn visit_str<E>(self, value: &str) -> Result<Timestamp, E>
	where
		E: serde::de::Error,
	{
		chrono::DateTime::parse_from_rfc3339(value).map(Timestamp).map_err(E::custom)
	}

	fn visit_i64<E>(self, value: i64) -> Result<Timestamp, E>
	where
		E: serde::de::Error,
	{
		Timestamp::from_unix(value)
			.ok_or_else(|| E::custom(format!("epoch seconds {value} out of range")))
	}

	fn visit_u64<E>(self, value: u64) -> Result<Timestamp, E>
	where
		E: serde::de::Error,
	{
		let value = i64::try_from(value).map_err(E::custom)?;
		self.visit_i64(value)
	}

	fn visit_f64<E>(self, value: f64) -> Result<Timestamp, E>
	where
		E: serde::de::Error,
	{
		self.visit_i64(value.trunc() as i64)
	}
}

partial_record!
{
	/// Partial user data model as returned in responses from the GitHub API.
	pub struct User
	{
		/// The user’s handle.
		pub login: String,
		pub id: i64,
		pub node_id: String,
		pub avatar_url: String,
		pub html_url: String,
		pub name: String,
		pub email: String,
		/// `User`, `Organization` or `Bot`.
		pub r#type: String,
		pub site_admin: bool,
		pub url: String,
		pub created_at: Timestamp,
		pub updated_at: Timestamp,
	}
}

partial_record!
{
	/// Partial organization data model as returned in responses from the GitHub API.
	pub struct Organization
	{
		pub login: String,
		pub id: i64,
		pub node_id: String,
		pub url: String,
		pub avatar_url: String,
		pub description: String,
	}
}

partial_record!
{
	/// Partial repository data model as returned in responses from the GitHub API.
	pub struct Repository
	{
		pub id: i64,
		pub node_id: String,
		/// The name of the repository.
		pub name: String,
		/// The name including the owner, such as `octocat/Hello-World`.
		pub full_name: String,
		/// Record of the user or organization owning the repository.
		pub owner: User,
		pub private: bool,
		pub fork: bool,
		pub archived: bool,
		pub disabled: bool,
		pub description: String,
		pub homepage: String,
		pub html_url: String,
		pub clone_url: String,
		pub git_url: String,
		pub ssh_url: String,
		pub url: String,
		/// The name of the repository’s default branch (usually `main`).
		pub default_branch: String,
		/// Only set in `push` events, where it mirrors the default branch.
		pub master_branch: String,
		pub language: String,
		pub visibility: String,
		pub topics: Vec<String>,
		pub size: i64,
		pub stargazers_count: i64,
		pub watchers_count: i64,
		pub forks_count: i64,
		pub open_issues_count: i64,
		pub has_issues: bool,
		pub has_wiki: bool,
		pub has_pages: bool,
		pub parent: Box<Repository>,
		pub source: Box<Repository>,
		pub permissions: std::collections::BTreeMap<String, bool>,
		pub created_at: Timestamp,
		pub pushed_at: Timestamp,
		pub updated_at: Timestamp,
	}
}

partial_record!
{
	/// Partial data model of a GitHub App installation.
	pub struct Installation
	{
		pub id: i64,
		pub node_id: String,
		pub app_id: i64,
		pub app_slug: String,
		pub target_id: i64,
		pub target_type: String,
		pub account: User,
		pub repository_selection: String,
		pub permissions: std::collections::BTreeMap<String, String>,
		pub events: Vec<String>,
		pub created_at: Timestamp,
		pub updated_at: Timestamp,
	}
}

partial_record!
{
	/// Partial data model of a GitHub App.
	pub struct App
	{
		pub id: i64,
		pub slug: String,
		pub node_id: String,
		pub owner: User,
		pub name: String,
		pub html_url: String,
	}
}

partial_record!
{
	pub struct Label
	{
		pub id: i64,
		pub node_id: String,
		pub name: String,
		pub color: String,
		pub description: String,
		pub default: bool,
	}
}

partial_record!
{
	pub struct Milestone
	{
		pub id: i64,
		pub number: i64,
		pub title: String,
		pub state: String,
		pub due_on: Timestamp,
	}
}

partial_record!
{
	/// Partial issue data model. Pull requests are issues as well, in which case
	/// [Issue::pull_request] is set.
	pub struct Issue
	{
		pub id: i64,
		pub node_id: String,
		pub number: i64,
		pub state: String,
		pub state_reason: String,
		pub locked: bool,
		pub title: String,
		pub body: String,
		pub user: User,
		pub labels: Vec<Label>,
		pub assignee: User,
		pub assignees: Vec<User>,
		pub milestone: Milestone,
		pub comments: i64,
		pub author_association: String,
		pub html_url: String,
		pub url: String,
		pub pull_request: PullRequestLinks,
		pub closed_at: Timestamp,
		pub created_at: Timestamp,
		pub updated_at: Timestamp,
	}
}

partial_record!
{
	pub struct PullRequestLinks
	{
		pub url: String,
		pub html_url: String,
		pub diff_url: String,
		pub patch_url: String,
		pub merged_at: Timestamp,
	}
}

partial_record!
{
	pub struct IssueComment
	{
		pub id: i64,
		pub node_id: String,
		pub body: String,
		pub user: User,
		pub author_association: String,
		pub html_url: String,
		pub issue_url: String,
		pub url: String,
		pub created_at: Timestamp,
		pub updated_at: Timestamp,
	}
}

partial_record!
{
	/// Partial pull request data model as returned in responses from the GitHub API.
	pub struct PullRequest
	{
		pub id: i64,
		pub node_id: String,
		pub number: i64,
		pub state: String,
		pub locked: bool,
		pub title: String,
		pub body: String,
		pub draft: bool,
		pub merged: bool,
		pub mergeable: bool,
		pub mergeable_state: String,
		pub merge_commit_sha: String,
		pub user: User,
		pub merged_by: User,
		pub labels: Vec<Label>,
		pub assignees: Vec<User>,
		pub requested_reviewers: Vec<User>,
		pub head: PullRequestBranch,
		pub base: PullRequestBranch,
		pub commits: i64,
		pub additions: i64,
		pub deletions: i64,
		pub changed_files: i64,
		pub html_url: String,
		pub url: String,
		pub created_at: Timestamp,
		pub updated_at: Timestamp,
		pub closed_at: Timestamp,
		pub merged_at: Timestamp,
	}
}

partial_record!
{
	/// One end of a pull request.
	pub struct PullRequestBranch
	{
		pub label: String,
		pub r#ref: String,
		pub sha: String,
		pub repo: Repository,
		pub user: User,
	}
}

partial_record!
{
	/// Author or committer of a git commit. Webhook payloads report the login as `username`.
	pub struct CommitAuthor
	{
		pub date: Timestamp,
		pub name: String,
		pub email: String,
		#[serde(rename = "username")]
		pub login: String,
	}
}

partial_record!
{
	/// A commit as reported in `push` event payloads.
	pub struct HeadCommit
	{
		pub id: String,
		pub tree_id: String,
		pub distinct: bool,
		pub message: String,
		pub timestamp: Timestamp,
		pub url: String,
		pub author: CommitAuthor,
		pub committer: CommitAuthor,
		pub added: Vec<String>,
		pub removed: Vec<String>,
		pub modified: Vec<String>,
	}
}

partial_record!
{
	pub struct CheckRunOutput
	{
		pub title: String,
		pub summary: String,
		pub text: String,
		pub annotations_count: i64,
	}
}

partial_record!
{
	pub struct CheckRun
	{
		pub id: i64,
		pub node_id: String,
		pub head_sha: String,
		pub external_id: String,
		pub name: String,
		pub status: String,
		pub conclusion: String,
		pub url: String,
		pub html_url: String,
		pub details_url: String,
		pub output: CheckRunOutput,
		pub check_suite: CheckSuite,
		pub app: App,
		pub pull_requests: Vec<PullRequest>,
		pub started_at: Timestamp,
		pub completed_at: Timestamp,
	}
}

partial_record!
{
	pub struct CheckSuite
	{
		pub id: i64,
		pub node_id: String,
		pub head_branch: String,
		pub head_sha: String,
		pub before_sha: String,
		pub after_sha: String,
		pub status: String,
		pub conclusion: String,
		pub url: String,
		pub app: App,
		pub repository: Repository,
		pub pull_requests: Vec<PullRequest>,
		pub head_commit: Commit,
		pub created_at: Timestamp,
		pub updated_at: Timestamp,
	}
}

partial_record!
{
	pub struct WorkflowRun
	{
		pub id: i64,
		pub node_id: String,
		pub name: String,
		pub head_branch: String,
		pub head_sha: String,
		pub path: String,
		pub run_number: i64,
		pub run_attempt: i64,
		pub event: String,
		pub display_title: String,
		pub status: String,
		pub conclusion: String,
		pub workflow_id: i64,
		pub check_suite_id: i64,
		pub url: String,
		pub html_url: String,
		pub logs_url: String,
		pub artifacts_url: String,
		pub actor: User,
		pub triggering_actor: User,
		pub repository: Repository,
		pub head_repository: Repository,
		pub pull_requests: Vec<PullRequest>,
		pub created_at: Timestamp,
		pub updated_at: Timestamp,
		pub run_started_at: Timestamp,
	}
}

partial_record!
{
	pub struct WorkflowJob
	{
		pub id: i64,
		pub run_id: i64,
		pub run_attempt: i64,
		pub node_id: String,
		pub head_branch: String,
		pub head_sha: String,
		pub url: String,
		pub html_url: String,
		pub status: String,
		pub conclusion: String,
		pub name: String,
		pub workflow_name: String,
		pub labels: Vec<String>,
		pub runner_id: i64,
		pub runner_name: String,
		pub created_at: Timestamp,
		pub started_at: Timestamp,
		pub completed_at: Timestamp,
	}
}

partial_record!
{
	pub struct Release
	{
		pub id: i64,
		pub node_id: String,
		pub tag_name: String,
		pub target_commitish: String,
		pub name: String,
		pub body: String,
		pub draft: bool,
		pub prerelease: bool,
		pub make_latest: String,
		pub author: User,
		pub html_url: String,
		pub url: String,
		pub tarball_url: String,
		pub zipball_url: String,
		pub created_at: Timestamp,
		pub published_at: Timestamp,
	}
}

partial_record!
{
	/// Configuration of a repository or organization webhook.
	pub struct Hook
	{
		pub id: i64,
		pub r#type: String,
		pub name: String,
		pub url: String,
		pub active: bool,
		pub events: Vec<String>,
		pub config: std::collections::BTreeMap<String, serde_json::Value>,
		pub created_at: Timestamp,
		pub updated_at: Timestamp,
	}
}

partial_record!
{
	/// A git commit as returned by the Git database API.
	pub struct Commit
	{
		pub sha: String,
		pub node_id: String,
		pub id: String,
		pub tree_id: String,
		pub author: CommitAuthor,
		pub committer: CommitAuthor,
		pub message: String,
		pub tree: Tree,
		pub parents: Vec<Commit>,
		pub html_url: String,
		pub url: String,
		pub timestamp: Timestamp,
		pub verification: SignatureVerification,
		pub comment_count: i64,
	}
}

partial_record!
{
	/// Outcome of GitHub’s verification of a commit signature.
	pub struct SignatureVerification
	{
		pub verified: bool,
		pub reason: String,
		pub signature: String,
		pub payload: String,
	}
}

partial_record!
{
	pub struct Tree
	{
		pub sha: String,
		pub url: String,
		pub truncated: bool,
	}
}

partial_record!
{
	/// A git reference, such as `refs/heads/main`.
	pub struct Reference
	{
		pub r#ref: String,
		pub node_id: String,
		pub url: String,
		pub object: GitObject,
	}
}

partial_record!
{
	/// The object a git reference points to.
	pub struct GitObject
	{
		pub r#type: String,
		pub sha: String,
		pub url: String,
	}
}

partial_record!
{
	pub struct Branch
	{
		pub name: String,
		pub commit: BranchCommit,
		pub protected: bool,
	}
}

partial_record!
{
	/// The commit at the tip of a branch, wrapping the git commit itself.
	pub struct BranchCommit
	{
		pub sha: String,
		pub node_id: String,
		pub commit: Commit,
		pub author: User,
		pub committer: User,
		pub parents: Vec<Commit>,
		pub html_url: String,
		pub url: String,
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn distinguishes_absent_zero_and_populated_fields()
	{
		let absent: Repository = serde_json::from_str("{}").expect("valid record");
		let zero: Repository = serde_json::from_str(r#"{"id":0,"name":"","private":false}"#)
			.expect("valid record");
		let populated: Repository =
			serde_json::from_str(r#"{"id":42,"name":"hubwire","private":true}"#)
				.expect("valid record");

		assert_eq!(absent.id, None);
		assert_eq!(absent.name, None);
		assert_eq!(zero.id, Some(0));
		assert_eq!(zero.name.as_deref(), Some(""));
		assert_eq!(zero.private, Some(false));
		assert_eq!(populated.id, Some(42));
		assert_eq!(populated.private, Some(true));
	}

	#[test]
	fn serializes_populated_subset_only()
	{
		let reference = Reference
		{
			r#ref: Some("refs/heads/main".into()),
			object: Some(GitObject{sha: Some("abc".into()), ..GitObject::default()}),
			..Reference::default()
		};

		let json = serde_json::to_value(&reference).expect("serializable record");

		assert_eq!(json, serde_json::json!({"ref": "refs/heads/main", "object": {"sha": "abc"}}));
		assert_eq!(serde_json::from_value::<Reference>(json).expect("valid record"), reference);
	}

	#[test]
	fn accepts_rfc3339_and_epoch_timestamps()
	{
		let author: CommitAuthor =
			serde_json::from_str(r#"{"date":"2023-11-14T22:13:20Z","username":"octocat"}"#)
				.expect("valid record");
		let commit: HeadCommit = serde_json::from_str(r#"{"timestamp":1700000000}"#)
			.expect("valid record");

		assert_eq!(author.date, commit.timestamp);
		assert_eq!(author.login.as_deref(), Some("octocat"));
		assert_eq!(serde_json::to_string(&author.date).expect("serializable timestamp"),
			r#""2023-11-14T22:13:20Z""#);
	}

	#[test]
	fn displays_records_as_summaries()
	{
		let user = User
		{
			login: Some("octocat".into()),
			id: Some(1),
			..User::default()
		};

		assert_eq!(user.to_string(), r#"User{login:"octocat", id:1}"#);
	}
}
