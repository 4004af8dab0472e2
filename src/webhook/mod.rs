//! Ingestion of webhook deliveries: payload extraction, signature verification and decoding into
//! typed events, plus the API endpoints for inspecting past deliveries.

mod deliveries;
mod payload;
mod signature;

pub use deliveries::{HookDeliveriesService, HookDelivery, HookRequest, HookResponse};
pub use payload::{extract, extract_bytes, Payload};
pub use signature::{verify_signature, HashAlgorithm, Signature, SignatureError};

/// Header naming the event of a delivery.
pub const HEADER_EVENT: &str = "x-github-event";
/// Header carrying the unique ID of a delivery.
pub const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header carrying the HMAC-SHA256 payload signature.
pub const HEADER_SIGNATURE_SHA256: &str = "x-hub-signature-256";
/// Header carrying the legacy HMAC-SHA1 payload signature.
pub const HEADER_SIGNATURE_SHA1: &str = "x-hub-signature";

/// Configuration of the webhook receiver.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct Config
{
	/// To verify that incoming webhook payloads actually come from GitHub, provide the webhook
	/// secret (optional, but recommended for production use).
	#[serde(default)]
	pub secret: Option<crate::client::Credential>,
	/// The address to listen on for deliveries (optional, default: `127.0.0.1:2342`).
	#[serde(default = "default_listen_address")]
	pub listen_address: std::net::SocketAddr,
	/// Deliveries with larger bodies are rejected (optional, default: 25 MiB, the maximum size
	/// GitHub sends).
	#[serde(default = "default_max_payload_size")]
	pub max_payload_size: u64,
}

impl Default for Config
{
	fn default() -> Self
	{
		Self
		{
			secret: None,
			listen_address: default_listen_address(),
			max_payload_size: default_max_payload_size(),
		}
	}
}

#[doc(hidden)]
fn default_listen_address() -> std::net::SocketAddr
{
	std::net::SocketAddr::from(([127, 0, 0, 1], 2342))
}

#[doc(hidden)]
fn default_max_payload_size() -> u64
{
	25 * 1024 * 1024
}

/// A verified and decoded webhook delivery.
#[derive(Clone, Debug, PartialEq)]
pub struct Delivery
{
	/// The unique ID of this delivery, if sent.
	pub id: Option<String>,
	pub event: crate::events::Event,
}

/// The ID of a delivery, from the `X-GitHub-Delivery` header.
pub fn delivery_id(headers: &warp::http::HeaderMap) -> Option<&str>
{
	headers.get(HEADER_DELIVERY).and_then(|value| value.to_str().ok())
}

/// The event name of a delivery, from the `X-GitHub-Event` header.
pub fn webhook_type(headers: &warp::http::HeaderMap) -> Option<&str>
{
	headers.get(HEADER_EVENT).and_then(|value| value.to_str().ok())
}

/// Extract the JSON payload from a delivery body and verify its signature over the body as
/// received.
///
/// # Arguments
/// - `content_type`: The `Content-Type` header of the delivery.
/// - `raw_body`: The request body.
/// - `signature_sha256`: The `X-Hub-Signature-256` header, if present.
/// - `signature_sha1`: The `X-Hub-Signature` header, if present.
/// - `secret`: The webhook secret. Without one, signatures are not checked.
pub fn validate_payload(
	content_type: &str,
	raw_body: bytes::Bytes,
	signature_sha256: Option<&str>,
	signature_sha1: Option<&str>,
	secret: Option<&crate::client::Credential>)
	-> Result<bytes::Bytes, crate::Error>
{
	let payload = extract_bytes(content_type, raw_body)?;

	verify_signature(signature_sha256, signature_sha1, &payload.raw_body,
		secret.map(|secret| secret.expose().as_bytes()))?;

	Ok(payload.payload)
}

/// Decode a verified payload into the event named by the `X-GitHub-Event` header.
pub fn parse_webhook(event_name: &str, payload: &[u8]) -> Result<crate::events::Event, crate::Error>
{
	crate::events::decode(event_name, payload)
}

/// [warp] filter extracting the delivery body, verifying its signature if a secret is configured
/// and decoding it into a typed event.
///
/// Failures are passed on as rejections carrying a [crate::Error], except for a missing
/// `X-GitHub-Event` header, which is rejected as a missing header.
///
/// # Arguments
/// - `config`: The webhook receiver configuration.
pub fn with_validated_event(config: Config)
	-> impl warp::Filter<Extract = (Delivery,), Error = warp::Rejection> + Clone
{
	use warp::Filter as _;

	let config = std::sync::Arc::new(config);

	warp::any()
		.map(move || config.clone())
		.and(warp::header::<String>(HEADER_EVENT))
		.and(warp::header::optional::<String>(HEADER_DELIVERY))
		.and(warp::header::optional::<String>("content-type"))
		.and(warp::header::optional::<String>(HEADER_SIGNATURE_SHA256))
		.and(warp::header::optional::<String>(HEADER_SIGNATURE_SHA1))
		// Relay the body exactly as received, signatures are computed over these bytes
		.and(warp::body::bytes())
		.and_then(
			|config: std::sync::Arc<Config>,
				event_name: String,
				delivery_id: Option<String>,
				content_type: Option<String>,
				signature_sha256: Option<String>,
				signature_sha1: Option<String>,
				raw_body: bytes::Bytes|
			async move
			{
				let payload = validate_payload(content_type.as_deref().unwrap_or_default(), raw_body,
					signature_sha256.as_deref(), signature_sha1.as_deref(), config.secret.as_ref())
						.map_err(warp::reject::custom)?;

				let event = parse_webhook(&event_name, &payload).map_err(warp::reject::custom)?;

				log::debug!("received “{event_name}” event (delivery {})",
					delivery_id.as_deref().unwrap_or("without ID"));

				Ok::<_, warp::Rejection>(Delivery{id: delivery_id, event})
			})
}
