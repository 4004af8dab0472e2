use hubwire::events::Event;
use hubwire::webhook::{Delivery, SignatureError};

#[tokio::main]
async fn main() -> anyhow::Result<()>
{
	pretty_env_logger::init();

	// Read the config file
	let config = hubwire::Config::from_file("config.yaml")?;
	let listen_address = config.webhook.listen_address;

	// With a token configured, report the rate limits it starts out with
	if config.github_api.token.is_some()
	{
		let github_api_client = hubwire::Client::from_config(config.github_api)?;
		let context = hubwire::RequestContext::new().with_timeout(std::time::Duration::from_secs(10));

		match github_api_client.rate_limit().get(&context).await
		{
			Ok((rate_limits, _)) =>
			{
				for (category, rate) in &rate_limits.resources
				{
					log::info!("rate limit for “{category}”: {}/{} remaining", rate.remaining,
						rate.limit);
				}
			},
			Err(error) => log::warn!("could not fetch rate limits: {:?}", anyhow::Error::from(error)),
		}
	}

	use warp::Filter as _;

	let webhook_route =
		// Only listen for requests to the root path
		warp::path::end()
		// Only listen for POST requests
		.and(warp::post())
		// Reject payloads larger than GitHub would ever send
		.and(warp::body::content_length_limit(config.webhook.max_payload_size))
		// Extract and verify the payload and decode it into a typed event
		.and(hubwire::webhook::with_validated_event(config.webhook))
		// Forward request to request handler
		.and_then(handle_delivery);

	let routes = webhook_route
		.recover(handle_rejection);

	log::info!("listening for incoming webhook events on {listen_address}");
	warp::serve(routes).run(listen_address).await;

	Ok(())
}

/// Request handler for verified webhook deliveries.
///
/// # Arguments
/// - `delivery`: The delivery with its decoded event.
async fn handle_delivery(delivery: Delivery) -> Result<impl warp::Reply, std::convert::Infallible>
{
	let delivery_id = delivery.id.as_deref().unwrap_or("without ID");

	match &delivery.event
	{
		Event::Ping(ping) => log::info!("received ping (delivery {delivery_id}): {}",
			ping.zen.as_deref().unwrap_or_default()),
		event => log::info!("received “{}” event (delivery {delivery_id}): {event}", event.name()),
	}

	let response = warp::reply::json(&InfoResponse{info: "received webhook event"});

	Ok(warp::reply::with_status(response, warp::http::StatusCode::OK))
}

/// Request handler for all requests that were rejected previously.
///
/// # Arguments
/// - `error`: Reasons for why this request was rejected by all routes.
async fn handle_rejection(error: warp::Rejection)
	-> Result<impl warp::Reply, std::convert::Infallible>
{
	let status_code;
	let message;

	if error.is_not_found()
	{
		status_code = warp::http::StatusCode::NOT_FOUND;
		message = "not found";
	}
	else if let Some(_) = error.find::<warp::reject::MethodNotAllowed>()
	{
		status_code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
		message = "method not allowed";
	}
	else if let Some(_) = error.find::<warp::reject::PayloadTooLarge>()
	{
		status_code = warp::http::StatusCode::PAYLOAD_TOO_LARGE;
		message = "payload too large";
	}
	else if let Some(_) = error.find::<warp::reject::LengthRequired>()
	{
		status_code = warp::http::StatusCode::LENGTH_REQUIRED;
		message = "length required";
	}
	else if let Some(_) = error.find::<warp::reject::MissingHeader>()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "missing webhook event header";
	}
	// Don’t treat events that we don’t know as errors and report a 200 OK instead
	else if let Some(hubwire::Error::UnknownEvent(_)) = error.find()
	{
		status_code = warp::http::StatusCode::OK;
		message = "not listening to this webhook event";
	}
	else if let Some(hubwire::Error::UnsupportedContentType(_)) = error.find()
	{
		status_code = warp::http::StatusCode::UNSUPPORTED_MEDIA_TYPE;
		message = "unsupported content type";
	}
	else if let Some(hubwire::Error::DecodePayloadBody(_) | hubwire::Error::MissingFormPayload) =
		error.find()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "malformed payload body";
	}
	else if let Some(hubwire::Error::SignatureVerification(SignatureError::Missing)) = error.find()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "missing payload signature";
	}
	else if let Some(hubwire::Error::SignatureVerification(_)) = error.find()
	{
		status_code = warp::http::StatusCode::BAD_REQUEST;
		message = "invalid payload signature";
	}
	// If users are able to trigger errors we did not anticipate, log the error chain so we can
	// inspect this more closely later
	else
	{
		status_code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
		message = "internal server error";

		log::error!("unhandled error: {:#?}", error);
	}

	let response = match status_code.is_success()
	{
		true => warp::reply::json(&InfoResponse{info: message}),
		false => warp::reply::json(&ErrorResponse{error: message}),
	};

	Ok(warp::reply::with_status(response, status_code))
}

/// Response type acknowledging successfully handled webhook events (serialized to JSON).
#[derive(serde::Serialize)]
struct InfoResponse<'a>
{
	/// Info message with human-readable information about how this request was handled.
	info: &'a str,
}

/// Response type informing about errors while handling webhook events (serialized to JSON).
#[derive(serde::Serialize)]
struct ErrorResponse<'a>
{
	/// Error message with a human-readable explanation as to why this request failed.
	error: &'a str,
}
