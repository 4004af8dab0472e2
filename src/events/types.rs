//! Webhook event payloads.
//!
//! Frequently handled events have fully typed payloads. The remaining events share the fields
//! common to all deliveries and keep their specific fields as received.

use crate::models::{partial_record, CheckRun, CheckSuite, CommitAuthor, HeadCommit, Hook,
	Installation, Issue, IssueComment, Label, Milestone, Organization, PullRequest, Release,
	Repository, User, WorkflowJob, WorkflowRun};

/// Declare an event payload consisting of the fields shared by all webhook deliveries, with any
/// other fields retained as raw JSON.
macro_rules! webhook_event
{
	($(#[$meta:meta])* $name:ident) =>
	{
		$(#[$meta])*
		#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
		pub struct $name
		{
			#[serde(default, skip_serializing_if = "Option::is_none")]
			pub action: Option<String>,
			#[serde(default, skip_serializing_if = "Option::is_none")]
			pub repository: Option<Repository>,
			#[serde(default, skip_serializing_if = "Option::is_none")]
			pub sender: Option<User>,
			#[serde(default, skip_serializing_if = "Option::is_none")]
			pub installation: Option<Installation>,
			#[serde(default, skip_serializing_if = "Option::is_none")]
			pub organization: Option<Organization>,
			/// Fields specific to this event, as received.
			#[serde(flatten)]
			pub fields: serde_json::Map<String, serde_json::Value>,
		}
	};
}

partial_record!
{
	/// Triggered on a push to a branch or tag.
	pub struct PushEvent
	{
		pub push_id: i64,
		pub head: String,
		/// The full git ref that was pushed (example: `refs/heads/main`).
		pub r#ref: String,
		pub size: i64,
		pub commits: Vec<HeadCommit>,
		pub before: String,
		pub distinct_size: i64,
		pub action: String,
		pub after: String,
		pub created: bool,
		pub deleted: bool,
		pub forced: bool,
		pub base_ref: String,
		pub compare: String,
		/// The repository pushed to. Its timestamps are reported as epoch seconds.
		pub repository: Repository,
		pub head_commit: HeadCommit,
		pub pusher: CommitAuthor,
		pub sender: User,
		pub installation: Installation,
		pub organization: Organization,
	}
}

partial_record!
{
	pub struct PullRequestEvent
	{
		/// `opened`, `edited`, `closed`, `synchronize`, …
		pub action: String,
		pub assignee: User,
		pub number: i64,
		pub pull_request: PullRequest,
		pub changes: serde_json::Value,
		pub requested_reviewer: User,
		pub repository: Repository,
		pub sender: User,
		pub installation: Installation,
		pub label: Label,
		pub organization: Organization,
		/// Only set for `synchronize` actions.
		pub before: String,
		pub after: String,
	}
}

partial_record!
{
	pub struct IssuesEvent
	{
		pub action: String,
		pub issue: Issue,
		pub assignee: User,
		pub label: Label,
		pub milestone: Milestone,
		pub changes: serde_json::Value,
		pub repository: Repository,
		pub sender: User,
		pub installation: Installation,
		pub organization: Organization,
	}
}

partial_record!
{
	pub struct IssueCommentEvent
	{
		pub action: String,
		pub issue: Issue,
		pub comment: IssueComment,
		pub changes: serde_json::Value,
		pub repository: Repository,
		pub sender: User,
		pub installation: Installation,
		pub organization: Organization,
	}
}

partial_record!
{
	pub struct CheckRunEvent
	{
		pub check_run: CheckRun,
		pub action: String,
		pub repository: Repository,
		pub organization: Organization,
		pub sender: User,
		pub installation: Installation,
		pub requested_action: std::collections::BTreeMap<String, String>,
	}
}

partial_record!
{
	pub struct CheckSuiteEvent
	{
		pub check_suite: CheckSuite,
		pub action: String,
		pub repository: Repository,
		pub organization: Organization,
		pub sender: User,
		pub installation: Installation,
	}
}

partial_record!
{
	pub struct WorkflowRunEvent
	{
		pub action: String,
		pub workflow: serde_json::Value,
		pub workflow_run: WorkflowRun,
		pub organization: Organization,
		pub repository: Repository,
		pub sender: User,
		pub installation: Installation,
	}
}

partial_record!
{
	pub struct WorkflowJobEvent
	{
		pub workflow_job: WorkflowJob,
		pub action: String,
		pub organization: Organization,
		pub repository: Repository,
		pub sender: User,
		pub installation: Installation,
	}
}

partial_record!
{
	/// Triggered when a branch or tag is created.
	pub struct CreateEvent
	{
		pub r#ref: String,
		/// `branch` or `tag`.
		pub ref_type: String,
		/// The name of the repository’s default branch (usually `main`).
		pub master_branch: String,
		pub description: String,
		pub pusher_type: String,
		pub repository: Repository,
		pub organization: Organization,
		pub sender: User,
		pub installation: Installation,
	}
}

partial_record!
{
	/// Triggered when a branch or tag is deleted.
	pub struct DeleteEvent
	{
		pub r#ref: String,
		pub ref_type: String,
		pub pusher_type: String,
		pub repository: Repository,
		pub sender: User,
		pub installation: Installation,
		pub organization: Organization,
	}
}

partial_record!
{
	/// Sent once when a webhook is set up.
	pub struct PingEvent
	{
		/// Random string of GitHub zen.
		pub zen: String,
		pub hook_id: i64,
		pub hook: Hook,
		pub repository: Repository,
		pub organization: Organization,
		pub sender: User,
		pub installation: Installation,
	}
}

partial_record!
{
	pub struct ReleaseEvent
	{
		pub action: String,
		pub release: Release,
		pub repository: Repository,
		pub sender: User,
		pub installation: Installation,
		pub organization: Organization,
	}
}

partial_record!
{
	pub struct InstallationEvent
	{
		pub action: String,
		pub repositories: Vec<Repository>,
		pub sender: User,
		pub installation: Installation,
		pub requester: User,
		pub organization: Organization,
	}
}

webhook_event!(BranchProtectionConfigurationEvent);
webhook_event!(BranchProtectionRuleEvent);
webhook_event!(CodeScanningAlertEvent);
webhook_event!(CommitCommentEvent);
webhook_event!(ContentReferenceEvent);
webhook_event!(CustomPropertyEvent);
webhook_event!(CustomPropertyValuesEvent);
webhook_event!(DependabotAlertEvent);
webhook_event!(DeployKeyEvent);
webhook_event!(DeploymentEvent);
webhook_event!(DeploymentProtectionRuleEvent);
webhook_event!(DeploymentReviewEvent);
webhook_event!(DeploymentStatusEvent);
webhook_event!(DiscussionEvent);
webhook_event!(DiscussionCommentEvent);
webhook_event!(ForkEvent);
webhook_event!(GitHubAppAuthorizationEvent);
webhook_event!(GollumEvent);
webhook_event!(InstallationRepositoriesEvent);
webhook_event!(InstallationTargetEvent);
webhook_event!(LabelEvent);
webhook_event!(MarketplacePurchaseEvent);
webhook_event!(MemberEvent);
webhook_event!(MembershipEvent);
webhook_event!(MergeGroupEvent);
webhook_event!(MetaEvent);
webhook_event!(MilestoneEvent);
webhook_event!(OrganizationEvent);
webhook_event!(OrgBlockEvent);
webhook_event!(PackageEvent);
webhook_event!(PageBuildEvent);
webhook_event!(PersonalAccessTokenRequestEvent);
webhook_event!(ProjectV2Event);
webhook_event!(ProjectV2ItemEvent);
webhook_event!(PublicEvent);
webhook_event!(PullRequestReviewEvent);
webhook_event!(PullRequestReviewCommentEvent);
webhook_event!(PullRequestReviewThreadEvent);
webhook_event!(
	/// Like `pull_request`, but runs in the context of the base repository.
	PullRequestTargetEvent
);
webhook_event!(RegistryPackageEvent);
webhook_event!(RepositoryEvent);
webhook_event!(RepositoryDispatchEvent);
webhook_event!(RepositoryImportEvent);
webhook_event!(RepositoryRulesetEvent);
webhook_event!(RepositoryVulnerabilityAlertEvent);
webhook_event!(SecretScanningAlertEvent);
webhook_event!(SecretScanningAlertLocationEvent);
webhook_event!(SecurityAdvisoryEvent);
webhook_event!(SecurityAndAnalysisEvent);
webhook_event!(SponsorshipEvent);
webhook_event!(StarEvent);
webhook_event!(StatusEvent);
webhook_event!(TeamEvent);
webhook_event!(TeamAddEvent);
webhook_event!(UserEvent);
webhook_event!(WatchEvent);
webhook_event!(WorkflowDispatchEvent);
