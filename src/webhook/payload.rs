/// The body of a webhook delivery, before and after content negotiation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Payload
{
	/// The body exactly as received. Signatures are computed over these bytes.
	pub raw_body: bytes::Bytes,
	/// The JSON event payload.
	pub payload: bytes::Bytes,
}

#[doc(hidden)]
const CONTENT_TYPE_JSON: &str = "application/json";
#[doc(hidden)]
const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";
#[doc(hidden)]
const FORM_PAYLOAD_FIELD: &str = "payload";

/// Read a delivery body from a stream and extract its JSON payload.
///
/// # Arguments
/// - `content_type`: The `Content-Type` header of the delivery, parameters included.
/// - `body`: The request body.
pub fn extract<R>(content_type: &str, mut body: R) -> Result<Payload, crate::Error>
where
	R: std::io::Read,
{
	let mut raw_body = Vec::new();
	body.read_to_end(&mut raw_body).map_err(crate::Error::ReadPayloadBody)?;

	extract_bytes(content_type, raw_body.into())
}

/// Extract the JSON payload from a delivery body that was already read in full.
///
/// JSON bodies are the payload themselves, form-encoded bodies carry it in their `payload` field.
pub fn extract_bytes(content_type: &str, raw_body: bytes::Bytes) -> Result<Payload, crate::Error>
{
	// Ignore parameters such as the charset
	let media_type = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

	match media_type.as_str()
	{
		CONTENT_TYPE_JSON => Ok(Payload{payload: raw_body.clone(), raw_body}),
		CONTENT_TYPE_FORM =>
		{
			let payload = url::form_urlencoded::parse(&raw_body)
				.find(|(key, _)| key == FORM_PAYLOAD_FIELD)
				.map(|(_, value)| bytes::Bytes::from(value.into_owned()))
				.ok_or(crate::Error::MissingFormPayload)?;

			Ok(Payload{raw_body, payload})
		},
		_ => Err(crate::Error::UnsupportedContentType(content_type.to_owned())),
	}
}
