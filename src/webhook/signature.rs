//! HMAC signatures of webhook payloads, as sent in the `X-Hub-Signature-256` and (legacy)
//! `X-Hub-Signature` headers.

/// Reasons for rejecting a payload signature.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SignatureError
{
	#[error("missing payload signature")]
	Missing,
	#[error("malformed payload signature, expected “<algorithm>=<hex digest>”")]
	Malformed,
	#[error("unsupported payload signature algorithm “{0}”")]
	UnknownPrefix(String),
	#[error("could not decode hex digest of payload signature")]
	HexDecode(#[source] hex::FromHexError),
	#[error("invalid payload signature")]
	Mismatch,
}

/// Hash functions GitHub signs payloads with.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HashAlgorithm
{
	Sha1,
	Sha256,
	Sha512,
}

impl HashAlgorithm
{
	/// The prefix naming this algorithm in signature headers.
	pub fn prefix(self) -> &'static str
	{
		match self
		{
			Self::Sha1 => "sha1",
			Self::Sha256 => "sha256",
			Self::Sha512 => "sha512",
		}
	}

	pub fn from_prefix(prefix: &str) -> Option<Self>
	{
		match prefix
		{
			"sha1" => Some(Self::Sha1),
			"sha256" => Some(Self::Sha256),
			"sha512" => Some(Self::Sha512),
			_ => None,
		}
	}

	/// Length of the digest in bytes.
	pub fn digest_length(self) -> usize
	{
		match self
		{
			Self::Sha1 => 20,
			Self::Sha256 => 32,
			Self::Sha512 => 64,
		}
	}

	/// Compute the HMAC of a payload keyed with the given secret.
	pub fn mac(self, secret: &[u8], payload: &[u8]) -> Vec<u8>
	{
		use hmac::Mac as _;

		match self
		{
			Self::Sha1 =>
			{
				let mut mac = hmac::Hmac::<sha1::Sha1>::new_from_slice(secret)
					.expect("this call is infallible because HMAC supports keys of arbitrary size");
				mac.update(payload);
				mac.finalize().into_bytes().to_vec()
			},
			Self::Sha256 =>
			{
				let mut mac = hmac::Hmac::<sha2::Sha256>::new_from_slice(secret)
					.expect("this call is infallible because HMAC supports keys of arbitrary size");
				mac.update(payload);
				mac.finalize().into_bytes().to_vec()
			},
			Self::Sha512 =>
			{
				let mut mac = hmac::Hmac::<sha2::Sha512>::new_from_slice(secret)
					.expect("this call is infallible because HMAC supports keys of arbitrary size");
				mac.update(payload);
				mac.finalize().into_bytes().to_vec()
			},
		}
	}
}

/// A parsed signature header value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Signature
{
	pub algorithm: HashAlgorithm,
	pub digest: Vec<u8>,
}

impl Signature
{
	/// Sign a payload with the given secret.
	pub fn sign(algorithm: HashAlgorithm, secret: &[u8], payload: &[u8]) -> Self
	{
		Self{algorithm, digest: algorithm.mac(secret, payload)}
	}

	/// Check that this signature was produced over the payload with the given secret.
	pub fn verify(&self, secret: &[u8], payload: &[u8]) -> Result<(), SignatureError>
	{
		let expected_digest = self.algorithm.mac(secret, payload);

		// The secure vector wrapper compares in constant time to prevent timing attacks
		let provided_digest = secstr::SecVec::new(self.digest.clone());
		let expected_digest = secstr::SecVec::new(expected_digest);

		if provided_digest == expected_digest
		{
			log::debug!("successfully verified {} payload signature", self.algorithm.prefix());
			Ok(())
		}
		else
		{
			log::warn!("received payload with invalid signature");
			Err(SignatureError::Mismatch)
		}
	}
}

impl std::str::FromStr for Signature
{
	type Err = SignatureError;

	fn from_str(value: &str) -> Result<Self, Self::Err>
	{
		let (prefix, hex_digest) = value.trim().split_once('=').ok_or(SignatureError::Malformed)?;

		let algorithm = HashAlgorithm::from_prefix(prefix)
			.ok_or_else(|| SignatureError::UnknownPrefix(prefix.to_owned()))?;
		let digest = hex::decode(hex_digest).map_err(SignatureError::HexDecode)?;

		// Also covers headers carrying only a prefix, such as “sha256=”
		if digest.len() != algorithm.digest_length()
		{
			log::debug!("{prefix} payload signature digest has {} bytes instead of {}", digest.len(),
				algorithm.digest_length());
			return Err(SignatureError::Malformed);
		}

		Ok(Self{algorithm, digest})
	}
}

impl std::fmt::Display for Signature
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		write!(formatter, "{}={}", self.algorithm.prefix(), hex::encode(&self.digest))
	}
}

/// Verify a payload against the signature headers of its delivery.
///
/// The SHA-256 header takes precedence over the legacy SHA-1 header. Without a secret, all
/// payloads are accepted.
///
/// # Arguments
/// - `signature_sha256`: Value of the `X-Hub-Signature-256` header, if present.
/// - `signature_sha1`: Value of the `X-Hub-Signature` header, if present.
/// - `payload`: The body exactly as received, before any form decoding.
/// - `secret`: The webhook secret shared with GitHub.
pub fn verify_signature(
	signature_sha256: Option<&str>,
	signature_sha1: Option<&str>,
	payload: &[u8],
	secret: Option<&[u8]>)
	-> Result<(), SignatureError>
{
	let secret = match secret.filter(|secret| !secret.is_empty())
	{
		Some(secret) => secret,
		None =>
		{
			log::warn!("no webhook secret configured, ignoring payload signature (this should be \
				configured for production use)");
			return Ok(());
		},
	};

	let signature = signature_sha256.or(signature_sha1).ok_or_else(||
	{
		log::warn!("received payload without signature");
		SignatureError::Missing
	})?;

	signature.parse::<Signature>()?.verify(secret, payload)
}

#[cfg(test)]
mod tests
{
	use super::*;

	const SECRET: &[u8] = b"s3cr3t";
	const PAYLOAD: &[u8] = br#"{"ref":"refs/heads/main"}"#;

	#[test]
	fn signs_and_verifies_with_every_algorithm()
	{
		for algorithm in [HashAlgorithm::Sha1, HashAlgorithm::Sha256, HashAlgorithm::Sha512]
		{
			let signature = Signature::sign(algorithm, SECRET, PAYLOAD);
			let parsed: Signature = signature.to_string().parse().expect("valid signature");

			assert_eq!(parsed.digest.len(), algorithm.digest_length());
			assert_eq!(parsed.verify(SECRET, PAYLOAD), Ok(()));
			assert_eq!(parsed.verify(b"wrong", PAYLOAD), Err(SignatureError::Mismatch));

			let mut tampered_payload = PAYLOAD.to_vec();
			tampered_payload[7] ^= 0x01;

			assert_eq!(parsed.verify(SECRET, &tampered_payload), Err(SignatureError::Mismatch));
		}
	}

	#[test]
	fn rejects_mismatches_regardless_of_position()
	{
		let signature = Signature::sign(HashAlgorithm::Sha256, SECRET, PAYLOAD);
		let last = signature.digest.len() - 1;

		let mut first_byte_wrong = signature.clone();
		first_byte_wrong.digest[0] ^= 0xff;
		let mut last_byte_wrong = signature.clone();
		last_byte_wrong.digest[last] ^= 0xff;

		assert_eq!(first_byte_wrong.verify(SECRET, PAYLOAD), Err(SignatureError::Mismatch));
		assert_eq!(last_byte_wrong.verify(SECRET, PAYLOAD), Err(SignatureError::Mismatch));

		// An early-exit comparison would reject the first case measurably faster
		let time = |signature: &Signature|
		{
			let start = std::time::Instant::now();

			for _ in 0..2000
			{
				let _ = std::hint::black_box(signature.verify(SECRET, PAYLOAD));
			}

			start.elapsed().as_secs_f64()
		};

		// Warm up before measuring
		time(&first_byte_wrong);

		let first_byte_time = time(&first_byte_wrong);
		let last_byte_time = time(&last_byte_wrong);
		let ratio = first_byte_time.max(last_byte_time) / first_byte_time.min(last_byte_time);

		assert!(ratio < 5.0, "mismatch position changed verification time by a factor of {ratio}");
	}

	#[test]
	fn matches_known_digest()
	{
		// HMAC-SHA256 test vector from RFC 4231, test case 2
		let signature = Signature::sign(HashAlgorithm::Sha256, b"Jefe",
			b"what do ya want for nothing?");

		assert_eq!(signature.to_string(),
			"sha256=5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843");
	}

	#[test]
	fn rejects_malformed_headers()
	{
		assert_eq!("sha256".parse::<Signature>(), Err(SignatureError::Malformed));
		assert_eq!("md5=00".parse::<Signature>(), Err(SignatureError::UnknownPrefix("md5".into())));
		assert!(matches!("sha256=zz".parse::<Signature>(), Err(SignatureError::HexDecode(_))));
		assert_eq!("sha256=".parse::<Signature>(), Err(SignatureError::Malformed));
		assert_eq!("sha1=abcd".parse::<Signature>(), Err(SignatureError::Malformed));
	}

	#[test]
	fn prefers_sha256_header()
	{
		let sha256 = Signature::sign(HashAlgorithm::Sha256, SECRET, PAYLOAD).to_string();
		let sha1 = Signature::sign(HashAlgorithm::Sha1, SECRET, PAYLOAD).to_string();
		let wrong_sha1 = Signature::sign(HashAlgorithm::Sha1, b"wrong", PAYLOAD).to_string();
		let wrong_sha256 = Signature::sign(HashAlgorithm::Sha256, b"wrong", PAYLOAD).to_string();

		assert_eq!(verify_signature(Some(sha256.as_str()), Some(wrong_sha1.as_str()), PAYLOAD,
			Some(SECRET)), Ok(()));
		assert_eq!(verify_signature(Some(wrong_sha256.as_str()), Some(sha1.as_str()), PAYLOAD,
			Some(SECRET)), Err(SignatureError::Mismatch));
		assert_eq!(verify_signature(None, Some(sha1.as_str()), PAYLOAD, Some(SECRET)), Ok(()));
	}

	#[test]
	fn requires_signature_only_with_secret()
	{
		assert_eq!(verify_signature(None, None, PAYLOAD, Some(SECRET)), Err(SignatureError::Missing));
		assert_eq!(verify_signature(None, None, PAYLOAD, None), Ok(()));
		assert_eq!(verify_signature(None, None, PAYLOAD, Some(&b""[..])), Ok(()));
	}
}
