//! Building endpoint paths: escaping path arguments and appending option records as query strings.

/// Options for endpoints using page-based pagination.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct ListOptions
{
	/// The page of results to retrieve.
	pub page: Option<u32>,
	/// The number of results per page (the server caps this at 100).
	pub per_page: Option<u32>,
}

/// Options for endpoints using cursor-based pagination.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct ListCursorOptions
{
	/// For paginated result sets, the page of results to retrieve.
	pub page: Option<String>,
	pub per_page: Option<u32>,
	/// A cursor, as given in the `Link` header. If specified, the query only searches for events
	/// after this cursor.
	pub after: Option<String>,
	/// A cursor, as given in the `Link` header. If specified, the query only searches for events
	/// before this cursor.
	pub before: Option<String>,
	/// A cursor, as given in the `Link` header, to resume from.
	pub cursor: Option<String>,
}

/// Percent-encode a single path argument, so that it cannot break out of its segment.
pub fn escape_path_segment(segment: &str) -> String
{
	urlencoding::encode(segment).into_owned()
}

/// Percent-encode a hierarchical path argument such as a git ref or a file path. Every component
/// is escaped, the `/` separators are kept.
pub fn escape_ref(reference: &str) -> String
{
	reference.split('/').map(escape_path_segment).collect::<Vec<_>>().join("/")
}

/// Append the fields of an option record to the query string of an endpoint.
///
/// Optional fields are emitted whenever they are set, so `Some(false)`, `Some(0)` and `Some("")`
/// reach the server, while `None` is omitted. Plain fields are omitted when `false`, zero, empty
/// or an empty sequence. Sequences are repeated as separate `key=value` pairs (use
/// [comma_separated] for the comma-joined convention). Nested records cannot be expressed and are
/// rejected. Parameters already present on the endpoint are kept, and all parameters are emitted
/// sorted by key.
pub fn add_options<O>(endpoint: &str, options: Option<&O>) -> Result<String, crate::Error>
where
	O: serde::Serialize + ?Sized,
{
	let options = match options
	{
		Some(options) => options,
		None => return Ok(endpoint.to_owned()),
	};

	let fields = options.serialize(RecordSerializer).map_err(|error| match error
	{
		QueryEncodingError::NotARecord => crate::Error::UnsupportedQueryOption(endpoint.to_owned()),
		QueryEncodingError::Unsupported(key) => crate::Error::UnsupportedQueryOption(key),
		QueryEncodingError::Custom(message) => crate::Error::EncodeQueryOptions(message),
	})?;

	let (path, query) = match endpoint.split_once('?')
	{
		Some((path, query)) => (path, query),
		None => (endpoint, ""),
	};

	let mut parameters = std::collections::BTreeMap::<String, Vec<String>>::new();

	for (key, value) in url::form_urlencoded::parse(query.as_bytes())
	{
		parameters.entry(key.into_owned()).or_default().push(value.into_owned());
	}

	for (key, value) in fields
	{
		parameters.entry(key).or_default().push(value);
	}

	if parameters.is_empty()
	{
		return Ok(path.to_owned());
	}

	let mut serializer = url::form_urlencoded::Serializer::new(String::new());

	for (key, values) in &parameters
	{
		for value in values
		{
			serializer.append_pair(key, value);
		}
	}

	Ok(format!("{path}?{}", serializer.finish()))
}

#[doc(hidden)]
#[derive(Debug, thiserror::Error)]
enum QueryEncodingError
{
	#[error("option records must be structs or maps")]
	NotARecord,
	#[error("option “{0}” is neither a scalar nor a sequence of scalars")]
	Unsupported(String),
	#[error("{0}")]
	Custom(String),
}

impl serde::ser::Error for QueryEncodingError
{
	fn custom<T>(message: T) -> Self
	where
		T: std::fmt::Display,
	{
		Self::Custom(message.to_string())
	}
}

#[doc(hidden)]
type Rejected<T> = serde::ser::Impossible<T, QueryEncodingError>;

#[doc(hidden)]
type Fields = Vec<(String, String)>;

macro_rules! reject_values
{
	($error:expr; $($method:ident($type:ty)),* $(,)?) =>
	{
		$(
			fn $method(self, _value: $type) -> Result<Self::Ok, Self::Error>
			{
				Err($error)
			}
		)*
	};
}

macro_rules! serialize_numbers
{
	($($method:ident($type:ty)),* $(,)?) =>
	{
		$(
			fn $method(self, value: $type) -> Result<Vec<String>, QueryEncodingError>
			{
				self.scalar(value == <$type>::default(), value.to_string())
			}
		)*
	};
}

/// Serializer accepting the option record itself, a struct or a map of parameters.
#[doc(hidden)]
struct RecordSerializer;

impl serde::Serializer for RecordSerializer
{
	type Ok = Fields;
	type Error = QueryEncodingError;
	type SerializeSeq = Rejected<Fields>;
	type SerializeTuple = Rejected<Fields>;
	type SerializeTupleStruct = Rejected<Fields>;
	type SerializeTupleVariant = Rejected<Fields>;
	type SerializeMap = FieldCollector;
	type SerializeStruct = FieldCollector;
	type SerializeStructVariant = Rejected<Fields>;

	reject_values!(QueryEncodingError::NotARecord;
		serialize_bool(bool), serialize_i8(i8), serialize_i16(i16), serialize_i32(i32),
		serialize_i64(i64), serialize_u8(u8), serialize_u16(u16), serialize_u32(u32),
		serialize_u64(u64), serialize_f32(f32), serialize_f64(f64), serialize_char(char),
		serialize_str(&str), serialize_bytes(&[u8]), serialize_unit_struct(&'static str));

	fn serialize_none(self) -> Result<Fields, QueryEncodingError>
	{
		Ok(Fields::new())
	}

	fn serialize_some<T>(self, value: &T) -> Result<Fields, QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		value.serialize(self)
	}

	fn serialize_unit(self) -> Result<Fields, QueryEncodingError>
	{
		Ok(Fields::new())
	}

	fn serialize_unit_variant(self, _name: &'static str, _index: u32, _variant: &'static str)
		-> Result<Fields, QueryEncodingError>
	{
		Err(QueryEncodingError::NotARecord)
	}

	fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T)
		-> Result<Fields, QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		value.serialize(self)
	}

	fn serialize_newtype_variant<T>(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		_value: &T)
		-> Result<Fields, QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		Err(QueryEncodingError::NotARecord)
	}

	fn serialize_seq(self, _length: Option<usize>) -> Result<Self::SerializeSeq, QueryEncodingError>
	{
		Err(QueryEncodingError::NotARecord)
	}

	fn serialize_tuple(self, _length: usize) -> Result<Self::SerializeTuple, QueryEncodingError>
	{
		Err(QueryEncodingError::NotARecord)
	}

	fn serialize_tuple_struct(self, _name: &'static str, _length: usize)
		-> Result<Self::SerializeTupleStruct, QueryEncodingError>
	{
		Err(QueryEncodingError::NotARecord)
	}

	fn serialize_tuple_variant(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		_length: usize)
		-> Result<Self::SerializeTupleVariant, QueryEncodingError>
	{
		Err(QueryEncodingError::NotARecord)
	}

	fn serialize_map(self, _length: Option<usize>) -> Result<FieldCollector, QueryEncodingError>
	{
		Ok(FieldCollector::default())
	}

	fn serialize_struct(self, _name: &'static str, _length: usize)
		-> Result<FieldCollector, QueryEncodingError>
	{
		Ok(FieldCollector::default())
	}

	fn serialize_struct_variant(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		_length: usize)
		-> Result<Self::SerializeStructVariant, QueryEncodingError>
	{
		Err(QueryEncodingError::NotARecord)
	}
}

/// Collects the parameters of a record. Flattened records arrive here as map entries.
#[doc(hidden)]
#[derive(Default)]
struct FieldCollector
{
	fields: Fields,
	pending_key: Option<String>,
}

impl FieldCollector
{
	fn push<T>(&mut self, key: &str, value: &T) -> Result<(), QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		let values = value.serialize(ParameterSerializer::field(key))?;

		self.fields.extend(values.into_iter().map(|value| (key.to_owned(), value)));

		Ok(())
	}
}

impl serde::ser::SerializeStruct for FieldCollector
{
	type Ok = Fields;
	type Error = QueryEncodingError;

	fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.push(key, value)
	}

	fn end(self) -> Result<Fields, QueryEncodingError>
	{
		Ok(self.fields)
	}
}

impl serde::ser::SerializeMap for FieldCollector
{
	type Ok = Fields;
	type Error = QueryEncodingError;

	fn serialize_key<T>(&mut self, key: &T) -> Result<(), QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		let mut keys = key.serialize(ParameterSerializer::element(""))?;

		match (keys.pop(), keys.is_empty())
		{
			(Some(key), true) => self.pending_key = Some(key),
			_ => return Err(QueryEncodingError::Custom("option keys must be strings".into())),
		}

		Ok(())
	}

	fn serialize_value<T>(&mut self, value: &T) -> Result<(), QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		let key = self.pending_key.take()
			.ok_or_else(|| QueryEncodingError::Custom("option value without key".into()))?;

		self.push(&key, value)
	}

	fn end(self) -> Result<Fields, QueryEncodingError>
	{
		Ok(self.fields)
	}
}

/// Serializer rendering the value of a single parameter into zero or more query values.
#[doc(hidden)]
#[derive(Clone, Copy)]
struct ParameterSerializer<'a>
{
	key: &'a str,
	/// Set once the value was wrapped in `Some`, so that zero values are kept.
	explicit: bool,
	in_sequence: bool,
}

impl<'a> ParameterSerializer<'a>
{
	fn field(key: &'a str) -> Self
	{
		Self{key, explicit: false, in_sequence: false}
	}

	fn element(key: &'a str) -> Self
	{
		Self{key, explicit: true, in_sequence: true}
	}

	fn scalar(self, is_zero: bool, value: String) -> Result<Vec<String>, QueryEncodingError>
	{
		match is_zero && !self.explicit
		{
			true => Ok(Vec::new()),
			false => Ok(vec![value]),
		}
	}

	fn unsupported(self) -> QueryEncodingError
	{
		QueryEncodingError::Unsupported(self.key.to_owned())
	}
}

impl<'a> serde::Serializer for ParameterSerializer<'a>
{
	type Ok = Vec<String>;
	type Error = QueryEncodingError;
	type SerializeSeq = SequenceParameters<'a>;
	type SerializeTuple = SequenceParameters<'a>;
	type SerializeTupleStruct = Rejected<Vec<String>>;
	type SerializeTupleVariant = Rejected<Vec<String>>;
	type SerializeMap = Rejected<Vec<String>>;
	type SerializeStruct = Rejected<Vec<String>>;
	type SerializeStructVariant = Rejected<Vec<String>>;

	serialize_numbers!(serialize_i8(i8), serialize_i16(i16), serialize_i32(i32),
		serialize_i64(i64), serialize_i128(i128), serialize_u8(u8), serialize_u16(u16),
		serialize_u32(u32), serialize_u64(u64), serialize_u128(u128), serialize_f32(f32),
		serialize_f64(f64));

	fn serialize_bool(self, value: bool) -> Result<Vec<String>, QueryEncodingError>
	{
		self.scalar(!value, value.to_string())
	}

	fn serialize_char(self, value: char) -> Result<Vec<String>, QueryEncodingError>
	{
		self.scalar(false, value.to_string())
	}

	fn serialize_str(self, value: &str) -> Result<Vec<String>, QueryEncodingError>
	{
		self.scalar(value.is_empty(), value.to_owned())
	}

	fn serialize_bytes(self, _value: &[u8]) -> Result<Vec<String>, QueryEncodingError>
	{
		Err(self.unsupported())
	}

	fn serialize_none(self) -> Result<Vec<String>, QueryEncodingError>
	{
		Ok(Vec::new())
	}

	fn serialize_some<T>(self, value: &T) -> Result<Vec<String>, QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		value.serialize(Self{explicit: true, ..self})
	}

	fn serialize_unit(self) -> Result<Vec<String>, QueryEncodingError>
	{
		Ok(Vec::new())
	}

	fn serialize_unit_struct(self, _name: &'static str) -> Result<Vec<String>, QueryEncodingError>
	{
		Ok(Vec::new())
	}

	fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str)
		-> Result<Vec<String>, QueryEncodingError>
	{
		Ok(vec![variant.to_owned()])
	}

	fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T)
		-> Result<Vec<String>, QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		value.serialize(self)
	}

	fn serialize_newtype_variant<T>(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		_value: &T)
		-> Result<Vec<String>, QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		Err(self.unsupported())
	}

	fn serialize_seq(self, _length: Option<usize>) -> Result<SequenceParameters<'a>, QueryEncodingError>
	{
		match self.in_sequence
		{
			true => Err(self.unsupported()),
			false => Ok(SequenceParameters{key: self.key, values: Vec::new()}),
		}
	}

	fn serialize_tuple(self, length: usize) -> Result<SequenceParameters<'a>, QueryEncodingError>
	{
		serde::Serializer::serialize_seq(self, Some(length))
	}

	fn serialize_tuple_struct(self, _name: &'static str, _length: usize)
		-> Result<Self::SerializeTupleStruct, QueryEncodingError>
	{
		Err(self.unsupported())
	}

	fn serialize_tuple_variant(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		_length: usize)
		-> Result<Self::SerializeTupleVariant, QueryEncodingError>
	{
		Err(self.unsupported())
	}

	fn serialize_map(self, _length: Option<usize>) -> Result<Self::SerializeMap, QueryEncodingError>
	{
		Err(self.unsupported())
	}

	fn serialize_struct(self, _name: &'static str, _length: usize)
		-> Result<Self::SerializeStruct, QueryEncodingError>
	{
		Err(self.unsupported())
	}

	fn serialize_struct_variant(
		self,
		_name: &'static str,
		_index: u32,
		_variant: &'static str,
		_length: usize)
		-> Result<Self::SerializeStructVariant, QueryEncodingError>
	{
		Err(self.unsupported())
	}
}

/// Repeats the parameter once per sequence element.
#[doc(hidden)]
struct SequenceParameters<'a>
{
	key: &'a str,
	values: Vec<String>,
}

impl serde::ser::SerializeSeq for SequenceParameters<'_>
{
	type Ok = Vec<String>;
	type Error = QueryEncodingError;

	fn serialize_element<T>(&mut self, value: &T) -> Result<(), QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.values.extend(value.serialize(ParameterSerializer::element(self.key))?);

		Ok(())
	}

	fn end(self) -> Result<Vec<String>, QueryEncodingError>
	{
		Ok(self.values)
	}
}

impl serde::ser::SerializeTuple for SequenceParameters<'_>
{
	type Ok = Vec<String>;
	type Error = QueryEncodingError;

	fn serialize_element<T>(&mut self, value: &T) -> Result<(), QueryEncodingError>
	where
		T: serde::Serialize + ?Sized,
	{
		serde::ser::SerializeSeq::serialize_element(self, value)
	}

	fn end(self) -> Result<Vec<String>, QueryEncodingError>
	{
		serde::ser::SerializeSeq::end(self)
	}
}

/// Serialize a sequence option as a single comma-joined value, for use with
/// `#[serde(serialize_with = "crate::query::comma_separated")]`.
#[allow(clippy::ptr_arg)]
pub fn comma_separated<T, S>(values: &Vec<T>, serializer: S) -> Result<S::Ok, S::Error>
where
	T: std::fmt::Display,
	S: serde::Serializer,
{
	let joined = values.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");

	serializer.serialize_str(&joined)
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[derive(Default, serde::Serialize)]
	struct IssueListOptions
	{
		state: Option<String>,
		labels: Vec<String>,
		#[serde(serialize_with = "comma_separated", skip_serializing_if = "Vec::is_empty")]
		sort_fields: Vec<String>,
		since: Option<String>,
		all: bool,
		#[serde(flatten)]
		list_options: ListOptions,
	}

	#[test]
	fn omits_unpopulated_fields()
	{
		let endpoint = add_options("repos/o/r/issues", Some(&IssueListOptions::default()))
			.expect("encodable options");

		assert_eq!(endpoint, "repos/o/r/issues");
	}

	#[test]
	fn emits_populated_fields_once_sorted()
	{
		let options = IssueListOptions
		{
			state: Some("open".into()),
			labels: vec!["bug".into(), "help wanted".into()],
			sort_fields: vec!["created".into(), "updated".into()],
			all: true,
			list_options: ListOptions{page: Some(2), per_page: None},
			..IssueListOptions::default()
		};

		let endpoint = add_options("repos/o/r/issues", Some(&options)).expect("encodable options");

		assert_eq!(endpoint, "repos/o/r/issues?all=true&labels=bug&labels=help+wanted&page=2\
			&sort_fields=created%2Cupdated&state=open");
	}

	#[test]
	fn keeps_options_set_to_zero_values()
	{
		#[derive(Default, serde::Serialize)]
		struct BranchListOptions
		{
			protected: Option<bool>,
			query: Option<String>,
			archived: bool,
			#[serde(flatten)]
			list_options: ListOptions,
		}

		let options = BranchListOptions
		{
			protected: Some(false),
			query: Some(String::new()),
			list_options: ListOptions{page: None, per_page: Some(0)},
			..BranchListOptions::default()
		};

		let endpoint = add_options("repos/o/r/branches", Some(&options)).expect("encodable options");

		assert_eq!(endpoint, "repos/o/r/branches?per_page=0&protected=false&query=");
		assert_eq!(add_options("repos/o/r/branches", Some(&BranchListOptions::default()))
			.expect("encodable options"), "repos/o/r/branches");
	}

	#[test]
	fn rejects_options_that_are_not_records()
	{
		assert!(matches!(add_options("user/repos", Some(&42)),
			Err(crate::Error::UnsupportedQueryOption(endpoint)) if endpoint == "user/repos"));
	}

	#[test]
	fn keeps_existing_query_parameters()
	{
		let options = ListOptions{page: Some(3), per_page: None};
		let endpoint = add_options("search/code?q=repo%3Ao%2Fr", Some(&options))
			.expect("encodable options");

		assert_eq!(endpoint, "search/code?page=3&q=repo%3Ao%2Fr");
		assert_eq!(add_options("user/repos", None::<&ListOptions>).expect("no options"),
			"user/repos");
	}

	#[test]
	fn rejects_nested_records()
	{
		#[derive(serde::Serialize)]
		struct Nested
		{
			inner: ListOptions,
		}

		let options = Nested{inner: ListOptions{page: Some(1), per_page: None}};

		assert!(matches!(add_options("x", Some(&options)),
			Err(crate::Error::UnsupportedQueryOption(key)) if key == "inner"));
	}

	#[test]
	fn escapes_path_arguments()
	{
		assert_eq!(escape_path_segment("feature/a#b"), "feature%2Fa%23b");
		assert_eq!(escape_ref("heads/feature/a#b c"), "heads/feature/a%23b%20c");
		assert_eq!(escape_ref("main"), "main");
	}
}
