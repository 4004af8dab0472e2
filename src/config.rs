#[derive(Clone, Debug, Default, serde::Deserialize)]
/// Top-level configuration of the API client and the webhook receiver.
pub struct Config
{
	/// Configuration options specific to the GitHub API.
	#[serde(default)]
	pub github_api: crate::client::Config,
	/// Configuration options of the webhook receiver.
	#[serde(default)]
	pub webhook: crate::webhook::Config,
}

impl Config
{
	/// Attempt to read and parse the configuration from a YAML file.
	///
	/// # Arguments
	/// `path`: Path to the configuration file in YAML format.
	pub fn from_file<P>(path: P) -> Result<Self, crate::Error>
	where
		P: AsRef<std::path::Path>
	{
		let file = std::fs::File::open(&path).map_err(crate::Error::ReadConfigFile)?;
		serde_yaml::from_reader(&file).map_err(crate::Error::ParseConfigFile)
	}
}
