//! The registry of webhook event kinds, mapping the names sent in the `X-GitHub-Event` header to
//! typed payloads.
//!
//! The set of events is closed: each kind is declared by exactly one entry in the list below,
//! which generates its [Event] variant, its [EventKind] and its registry binding.

mod types;

pub use types::*;

/// Entry of the event registry.
pub struct Binding
{
	name: &'static str,
	kind: EventKind,
	#[doc(hidden)]
	empty: fn() -> Event,
	#[doc(hidden)]
	decode: fn(&[u8]) -> Result<Event, serde_json::Error>,
}

impl Binding
{
	/// The event name as sent in the `X-GitHub-Event` header.
	pub fn name(&self) -> &'static str
	{
		self.name
	}

	pub fn kind(&self) -> EventKind
	{
		self.kind
	}

	/// An event of this kind with no fields populated.
	pub fn empty(&self) -> Event
	{
		(self.empty)()
	}

	pub fn decode(&self, raw_payload: &[u8]) -> Result<Event, crate::Error>
	{
		(self.decode)(raw_payload).map_err(crate::Error::DecodePayloadBody)
	}
}

impl std::fmt::Debug for Binding
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.debug_struct("Binding")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.finish()
	}
}

macro_rules! event_registry
{
	($($name:literal => $variant:ident($payload:ty),)*) =>
	{
		/// A decoded webhook event.
		#[derive(Clone, Debug, PartialEq)]
		pub enum Event
		{
			$($variant(Box<$payload>),)*
		}

		/// The kind of a webhook event, without its payload.
		#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
		pub enum EventKind
		{
			$($variant,)*
		}

		impl EventKind
		{
			/// The event name as sent in the `X-GitHub-Event` header.
			pub fn name(self) -> &'static str
			{
				match self
				{
					$(Self::$variant => $name,)*
				}
			}
		}

		impl Event
		{
			pub fn kind(&self) -> EventKind
			{
				match self
				{
					$(Self::$variant(_) => EventKind::$variant,)*
				}
			}
		}

		impl std::fmt::Display for Event
		{
			fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
			{
				match self
				{
					$(Self::$variant(payload) =>
						formatter.write_str(&crate::stringify::stringify(payload.as_ref())),)*
				}
			}
		}

		#[doc(hidden)]
		static BINDINGS: &[Binding] =
		&[
			$(
				Binding
				{
					name: $name,
					kind: EventKind::$variant,
					empty: || Event::$variant(Box::default()),
					decode: |raw_payload: &[u8]| -> Result<Event, serde_json::Error>
					{
						serde_json::from_slice::<$payload>(raw_payload)
							.map(|payload| Event::$variant(Box::new(payload)))
					},
				},
			)*
		];
	};
}

event_registry!
{
	"branch_protection_configuration" => BranchProtectionConfiguration(BranchProtectionConfigurationEvent),
	"branch_protection_rule" => BranchProtectionRule(BranchProtectionRuleEvent),
	"check_run" => CheckRun(CheckRunEvent),
	"check_suite" => CheckSuite(CheckSuiteEvent),
	"code_scanning_alert" => CodeScanningAlert(CodeScanningAlertEvent),
	"commit_comment" => CommitComment(CommitCommentEvent),
	"content_reference" => ContentReference(ContentReferenceEvent),
	"create" => Create(CreateEvent),
	"custom_property" => CustomProperty(CustomPropertyEvent),
	"custom_property_values" => CustomPropertyValues(CustomPropertyValuesEvent),
	"delete" => Delete(DeleteEvent),
	"dependabot_alert" => DependabotAlert(DependabotAlertEvent),
	"deploy_key" => DeployKey(DeployKeyEvent),
	"deployment" => Deployment(DeploymentEvent),
	"deployment_protection_rule" => DeploymentProtectionRule(DeploymentProtectionRuleEvent),
	"deployment_review" => DeploymentReview(DeploymentReviewEvent),
	"deployment_status" => DeploymentStatus(DeploymentStatusEvent),
	"discussion" => Discussion(DiscussionEvent),
	"discussion_comment" => DiscussionComment(DiscussionCommentEvent),
	"fork" => Fork(ForkEvent),
	"github_app_authorization" => GitHubAppAuthorization(GitHubAppAuthorizationEvent),
	"gollum" => Gollum(GollumEvent),
	"installation" => Installation(InstallationEvent),
	"installation_repositories" => InstallationRepositories(InstallationRepositoriesEvent),
	"installation_target" => InstallationTarget(InstallationTargetEvent),
	"issue_comment" => IssueComment(IssueCommentEvent),
	"issues" => Issues(IssuesEvent),
	"label" => Label(LabelEvent),
	"marketplace_purchase" => MarketplacePurchase(MarketplacePurchaseEvent),
	"member" => Member(MemberEvent),
	"membership" => Membership(MembershipEvent),
	"merge_group" => MergeGroup(MergeGroupEvent),
	"meta" => Meta(MetaEvent),
	"milestone" => Milestone(MilestoneEvent),
	"organization" => Organization(OrganizationEvent),
	"org_block" => OrgBlock(OrgBlockEvent),
	"package" => Package(PackageEvent),
	"page_build" => PageBuild(PageBuildEvent),
	"personal_access_token_request" => PersonalAccessTokenRequest(PersonalAccessTokenRequestEvent),
	"ping" => Ping(PingEvent),
	"projects_v2" => ProjectV2(ProjectV2Event),
	"projects_v2_item" => ProjectV2Item(ProjectV2ItemEvent),
	"public" => Public(PublicEvent),
	"pull_request" => PullRequest(PullRequestEvent),
	"pull_request_review" => PullRequestReview(PullRequestReviewEvent),
	"pull_request_review_comment" => PullRequestReviewComment(PullRequestReviewCommentEvent),
	"pull_request_review_thread" => PullRequestReviewThread(PullRequestReviewThreadEvent),
	"pull_request_target" => PullRequestTarget(PullRequestTargetEvent),
	"push" => Push(PushEvent),
	"registry_package" => RegistryPackage(RegistryPackageEvent),
	"release" => Release(ReleaseEvent),
	"repository" => Repository(RepositoryEvent),
	"repository_dispatch" => RepositoryDispatch(RepositoryDispatchEvent),
	"repository_import" => RepositoryImport(RepositoryImportEvent),
	"repository_ruleset" => RepositoryRuleset(RepositoryRulesetEvent),
	"repository_vulnerability_alert" => RepositoryVulnerabilityAlert(RepositoryVulnerabilityAlertEvent),
	"secret_scanning_alert" => SecretScanningAlert(SecretScanningAlertEvent),
	"secret_scanning_alert_location" => SecretScanningAlertLocation(SecretScanningAlertLocationEvent),
	"security_advisory" => SecurityAdvisory(SecurityAdvisoryEvent),
	"security_and_analysis" => SecurityAndAnalysis(SecurityAndAnalysisEvent),
	"sponsorship" => Sponsorship(SponsorshipEvent),
	"star" => Star(StarEvent),
	"status" => Status(StatusEvent),
	"team" => Team(TeamEvent),
	"team_add" => TeamAdd(TeamAddEvent),
	"user" => User(UserEvent),
	"watch" => Watch(WatchEvent),
	"workflow_dispatch" => WorkflowDispatch(WorkflowDispatchEvent),
	"workflow_job" => WorkflowJob(WorkflowJobEvent),
	"workflow_run" => WorkflowRun(WorkflowRunEvent),
}

impl Event
{
	/// The event name as sent in the `X-GitHub-Event` header.
	pub fn name(&self) -> &'static str
	{
		self.kind().name()
	}
}

impl std::fmt::Display for EventKind
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.write_str(self.name())
	}
}

/// Lookup tables over the registered events, built once on first use.
pub struct Registry
{
	#[doc(hidden)]
	by_name: std::collections::BTreeMap<&'static str, &'static Binding>,
	#[doc(hidden)]
	by_kind: std::collections::HashMap<EventKind, &'static Binding>,
}

impl Registry
{
	#[doc(hidden)]
	fn build() -> Self
	{
		let by_name = BINDINGS.iter().map(|binding| (binding.name, binding)).collect();
		let by_kind = BINDINGS.iter().map(|binding| (binding.kind, binding)).collect();

		Self{by_name, by_kind}
	}

	pub fn binding(&self, event_name: &str) -> Option<&'static Binding>
	{
		self.by_name.get(event_name).copied()
	}

	/// Decode a raw payload into the event type registered under the given name.
	pub fn decode(&self, event_name: &str, raw_payload: &[u8]) -> Result<Event, crate::Error>
	{
		let binding = self.binding(event_name).ok_or_else(||
		{
			log::warn!("received unknown webhook event “{event_name}”");
			crate::Error::UnknownEvent(event_name.to_owned())
		})?;

		binding.decode(raw_payload)
	}

	/// An event of the given kind with no fields populated, or `None` for unknown events.
	pub fn empty_for(&self, event_name: &str) -> Option<Event>
	{
		self.binding(event_name).map(Binding::empty)
	}

	/// All registered event names in sorted order.
	pub fn all_event_names(&self) -> Vec<&'static str>
	{
		self.by_name.keys().copied().collect()
	}

	pub fn kind_of(&self, event_name: &str) -> Option<EventKind>
	{
		self.binding(event_name).map(Binding::kind)
	}

	pub fn name_of(&self, kind: EventKind) -> Option<&'static str>
	{
		self.by_kind.get(&kind).map(|binding| binding.name)
	}
}

/// The process-wide event registry.
pub fn registry() -> &'static Registry
{
	static REGISTRY: std::sync::OnceLock<Registry> = std::sync::OnceLock::new();

	REGISTRY.get_or_init(Registry::build)
}

/// Decode a raw payload with the process-wide registry (see [Registry::decode]).
pub fn decode(event_name: &str, raw_payload: &[u8]) -> Result<Event, crate::Error>
{
	registry().decode(event_name, raw_payload)
}

/// See [Registry::empty_for].
pub fn empty_for(event_name: &str) -> Option<Event>
{
	registry().empty_for(event_name)
}

/// See [Registry::all_event_names].
pub fn all_event_names() -> Vec<&'static str>
{
	registry().all_event_names()
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn registry_is_bijective()
	{
		let registry = registry();

		assert_eq!(BINDINGS.len(), 70);
		assert_eq!(registry.by_name.len(), BINDINGS.len());
		assert_eq!(registry.by_kind.len(), BINDINGS.len());

		for binding in BINDINGS
		{
			assert_eq!(registry.kind_of(binding.name()), Some(binding.kind()));
			assert_eq!(registry.name_of(binding.kind()), Some(binding.name()));
			assert_eq!(binding.kind().name(), binding.name());
		}
	}

	#[test]
	fn every_event_decodes_from_empty_object()
	{
		for name in all_event_names()
		{
			let event = decode(name, b"{}").expect("empty payload decodes");

			assert_eq!(event.name(), name);
			assert_eq!(Some(event), empty_for(name));
		}
	}

	#[test]
	fn lists_event_names_sorted()
	{
		let names = all_event_names();
		let mut sorted = names.clone();
		sorted.sort_unstable();

		assert_eq!(names, sorted);
		assert!(names.contains(&"push"));
		assert!(names.contains(&"workflow_run"));
	}

	#[test]
	fn decodes_push_event()
	{
		let payload = br#"{
			"ref": "refs/heads/main",
			"before": "0000000000000000000000000000000000000000",
			"after": "6113728f27ae82c7b1a177c8d03f9e96e0adf246",
			"commits": [{"id": "6113728f", "message": "Update README", "timestamp": "2023-11-14T22:13:20Z"}],
			"repository": {"name": "r", "full_name": "o/r", "created_at": 1700000000, "pushed_at": 1700000100},
			"pusher": {"name": "octocat", "email": "octocat@example.com"},
			"sender": {"login": "octocat", "id": 1}
		}"#;

		let push = match decode("push", payload).expect("valid push payload")
		{
			Event::Push(push) => push,
			other => panic!("expected push event, got {}", other.name()),
		};

		assert_eq!(push.r#ref.as_deref(), Some("refs/heads/main"));
		assert_eq!(push.commits.as_ref().map(Vec::len), Some(1));
		assert_eq!(push.repository.and_then(|repository| repository.created_at),
			crate::models::Timestamp::from_unix(1700000000));
	}

	#[test]
	fn keeps_fields_of_loosely_typed_events()
	{
		let event = decode("star", br#"{"action":"created","starred_at":"2023-11-14T22:13:20Z"}"#)
			.expect("valid star payload");

		match event
		{
			Event::Star(star) =>
			{
				assert_eq!(star.action.as_deref(), Some("created"));
				assert_eq!(star.fields.get("starred_at"),
					Some(&serde_json::json!("2023-11-14T22:13:20Z")));
			},
			other => panic!("expected star event, got {}", other.name()),
		}
	}

	#[test]
	fn rejects_unknown_and_malformed_events()
	{
		assert!(matches!(decode("not_an_event", b"{}"), Err(crate::Error::UnknownEvent(name))
			if name == "not_an_event"));
		assert!(matches!(decode("push", b"[1, 2"), Err(crate::Error::DecodePayloadBody(_))));
		assert_eq!(empty_for("not_an_event"), None);
	}

	#[test]
	fn displays_payload_summary()
	{
		let event = decode("ping", br#"{"zen":"Keep it logically awesome.","hook_id":42}"#)
			.expect("valid ping payload");

		assert_eq!(event.to_string(), r#"PingEvent{zen:"Keep it logically awesome.", hook_id:42}"#);
	}
}
