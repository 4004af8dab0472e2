/// A record of one attempt to deliver a webhook.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct HookDelivery
{
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<i64>,
	/// Identifies all attempts of the same delivery, as sent in the `X-GitHub-Delivery` header.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub guid: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub delivered_at: Option<crate::models::Timestamp>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redelivery: Option<bool>,
	/// Time spent delivering, in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub duration: Option<f64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status_code: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub event: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub installation_id: Option<i64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub repository_id: Option<i64>,
	/// Only included when fetching a single delivery.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub request: Option<HookRequest>,
	/// Only included when fetching a single delivery.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub response: Option<HookResponse>,
}

/// The request GitHub sent for a delivery.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct HookRequest
{
	#[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
	pub headers: std::collections::BTreeMap<String, String>,
	/// The payload as sent, decoded on demand with [HookDelivery::parse_request_payload].
	#[serde(default, rename = "payload", skip_serializing_if = "Option::is_none")]
	pub raw_payload: Option<Box<serde_json::value::RawValue>>,
}

/// The response GitHub received for a delivery.
#[derive(Clone, Debug, Default, serde::Deserialize, serde::Serialize)]
pub struct HookResponse
{
	#[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
	pub headers: std::collections::BTreeMap<String, String>,
	#[serde(default, rename = "payload", skip_serializing_if = "Option::is_none")]
	pub raw_payload: Option<Box<serde_json::value::RawValue>>,
}

impl HookDelivery
{
	/// Whether this attempt was triggered manually rather than by the original event.
	pub fn is_redelivery(&self) -> bool
	{
		self.redelivery.unwrap_or(false)
	}

	/// Decode the payload of the delivered request into the event type named by this record.
	///
	/// Records without a request payload yield an event with no fields populated.
	pub fn parse_request_payload(&self) -> Result<crate::events::Event, crate::Error>
	{
		let event_name = self.event.as_deref().unwrap_or_default();
		let binding = crate::events::registry().binding(event_name)
			.ok_or_else(|| crate::Error::UnknownEvent(event_name.to_owned()))?;

		match self.request.as_ref().and_then(|request| request.raw_payload.as_deref())
		{
			Some(raw_payload) => binding.decode(raw_payload.get().as_bytes()),
			None => Ok(binding.empty()),
		}
	}
}

/// Endpoints for inspecting and retrying the deliveries of a repository webhook.
pub struct HookDeliveriesService<'a>
{
	#[doc(hidden)]
	client: &'a crate::Client,
}

impl<'a> HookDeliveriesService<'a>
{
	pub(crate) fn new(client: &'a crate::Client) -> Self
	{
		Self{client}
	}

	#[doc(hidden)]
	fn endpoint(owner: &str, repository: &str, hook_id: i64) -> String
	{
		format!("repos/{}/{}/hooks/{hook_id}/deliveries", crate::query::escape_path_segment(owner),
			crate::query::escape_path_segment(repository))
	}

	/// List the deliveries of a webhook, newest first. Listed records carry no request or
	/// response.
	pub async fn list(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		hook_id: i64,
		options: Option<&crate::query::ListCursorOptions>)
		-> Result<(Vec<HookDelivery>, crate::Response), crate::Error>
	{
		let endpoint = Self::endpoint(owner, repository, hook_id);
		let endpoint = crate::query::add_options(&endpoint, options)?;

		self.client.get(context, &endpoint).await
	}

	/// Get a single delivery including the request and response.
	pub async fn get(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		hook_id: i64,
		delivery_id: i64)
		-> Result<(HookDelivery, crate::Response), crate::Error>
	{
		let endpoint = format!("{}/{delivery_id}", Self::endpoint(owner, repository, hook_id));

		self.client.get(context, &endpoint).await
	}

	/// Ask GitHub to deliver a past delivery again. The new attempt is scheduled asynchronously,
	/// so this succeeds once GitHub accepted the request.
	pub async fn redeliver(
		&self,
		context: &crate::RequestContext,
		owner: &str,
		repository: &str,
		hook_id: i64,
		delivery_id: i64)
		-> Result<(), crate::Error>
	{
		let endpoint = format!("{}/{delivery_id}/attempts",
			Self::endpoint(owner, repository, hook_id));
		let request = self.client.new_request(reqwest::Method::POST, &endpoint,
			crate::client::NO_BODY)?;

		match self.client.do_discard(context, request).await
		{
			Ok(_) | Err(crate::Error::Accepted{..}) =>
			{
				log::info!("requested redelivery of delivery {delivery_id} of hook {hook_id}");
				Ok(())
			},
			Err(error) => Err(error),
		}
	}
}
