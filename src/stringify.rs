//! Human-readable rendering of API records for logging.
//!
//! Records are rendered as `Name{field:value, …}`. Strings are quoted, absent values (`None`, empty
//! sequences and empty maps) are left out and [crate::models::Timestamp] values are shown inline.
//! Rendering never panics: values nested too deeply (or failing to serialize) are replaced with a
//! placeholder.

use std::fmt::Write as _;

/// Name under which [crate::models::Timestamp] serializes as a newtype, to be rendered inline.
pub(crate) const TIMESTAMP_NEWTYPE: &str = "Timestamp";

#[doc(hidden)]
const MAX_DEPTH: usize = 64;

/// Render any serializable value as a human-readable summary.
pub fn stringify<T>(value: &T) -> String
where
	T: serde::Serialize + ?Sized,
{
	match value.serialize(NodeSerializer{depth: 0})
	{
		Ok(node) => node.to_string(),
		Err(error) => format!("<unrenderable value: {error}>"),
	}
}

#[doc(hidden)]
#[derive(Debug)]
enum Node
{
	Null,
	Bool(bool),
	/// Numbers and enum variants, rendered as they are.
	Plain(String),
	String(String),
	Timestamp(String),
	Sequence(Vec<Node>),
	Map(Vec<(String, Node)>),
	Record
	{
		name: &'static str,
		fields: Vec<(&'static str, Node)>,
	},
	Tagged(&'static str, Box<Node>),
}

impl Node
{
	fn is_absent(&self) -> bool
	{
		match self
		{
			Self::Null => true,
			Self::Sequence(items) => items.is_empty(),
			Self::Map(entries) => entries.is_empty(),
			_ => false,
		}
	}

	fn into_key(self) -> String
	{
		match self
		{
			Self::String(key) | Self::Plain(key) => key,
			key => key.to_string(),
		}
	}
}

impl std::fmt::Display for Node
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		match self
		{
			Self::Null => formatter.write_str("null"),
			Self::Bool(value) => write!(formatter, "{value}"),
			Self::Plain(value) => formatter.write_str(value),
			Self::String(value) => write!(formatter, "{value:?}"),
			Self::Timestamp(value) => write!(formatter, "{TIMESTAMP_NEWTYPE}{{{value}}}"),
			Self::Sequence(items) =>
			{
				formatter.write_char('[')?;

				for (index, item) in items.iter().enumerate()
				{
					if index > 0
					{
						formatter.write_char(' ')?;
					}

					write!(formatter, "{item}")?;
				}

				formatter.write_char(']')
			},
			Self::Map(entries) =>
			{
				formatter.write_str("map[")?;

				for (index, (key, value)) in entries.iter().enumerate()
				{
					if index > 0
					{
						formatter.write_char(' ')?;
					}

					write!(formatter, "{key}:{value}")?;
				}

				formatter.write_char(']')
			},
			Self::Record{name, fields} =>
			{
				write!(formatter, "{name}{{")?;

				let present = fields.iter().filter(|(_, value)| !value.is_absent());

				for (index, (key, value)) in present.enumerate()
				{
					if index > 0
					{
						formatter.write_str(", ")?;
					}

					write!(formatter, "{key}:{value}")?;
				}

				formatter.write_char('}')
			},
			Self::Tagged(name, value) => write!(formatter, "{name}({value})"),
		}
	}
}

#[doc(hidden)]
#[derive(Debug)]
struct RenderError(String);

impl std::fmt::Display for RenderError
{
	fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result
	{
		formatter.write_str(&self.0)
	}
}

impl std::error::Error for RenderError
{
}

impl serde::ser::Error for RenderError
{
	fn custom<T>(message: T) -> Self
	where
		T: std::fmt::Display,
	{
		Self(message.to_string())
	}
}

/// Serializer building a [Node] tree instead of an encoded output.
#[doc(hidden)]
#[derive(Clone, Copy)]
struct NodeSerializer
{
	depth: usize,
}

impl NodeSerializer
{
	fn nested(self) -> Result<Self, RenderError>
	{
		match self.depth < MAX_DEPTH
		{
			true => Ok(Self{depth: self.depth + 1}),
			false => Err(RenderError("value is nested too deeply".into())),
		}
	}
}

impl serde::Serializer for NodeSerializer
{
	type Ok = Node;
	type Error = RenderError;
	type SerializeSeq = SequenceBuilder;
	type SerializeTuple = SequenceBuilder;
	type SerializeTupleStruct = SequenceBuilder;
	type SerializeTupleVariant = SequenceBuilder;
	type SerializeMap = MapBuilder;
	type SerializeStruct = RecordBuilder;
	type SerializeStructVariant = RecordBuilder;

	fn serialize_bool(self, value: bool) -> Result<Node, RenderError>
	{
		Ok(Node::Bool(value))
	}

	fn serialize_i8(self, value: i8) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_i16(self, value: i16) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_i32(self, value: i32) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_i64(self, value: i64) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_i128(self, value: i128) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_u8(self, value: u8) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_u16(self, value: u16) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_u32(self, value: u32) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_u64(self, value: u64) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_u128(self, value: u128) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_f32(self, value: f32) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_f64(self, value: f64) -> Result<Node, RenderError>
	{
		Ok(Node::Plain(value.to_string()))
	}

	fn serialize_char(self, value: char) -> Result<Node, RenderError>
	{
		Ok(Node::String(value.to_string()))
	}

	fn serialize_str(self, value: &str) -> Result<Node, RenderError>
	{
		Ok(Node::String(value.to_owned()))
	}

	fn serialize_bytes(self, value: &[u8]) -> Result<Node, RenderError>
	{
		Ok(Node::Sequence(value.iter().map(|byte| Node::Plain(byte.to_string())).collect()))
	}

	fn serialize_none(self) -> Result<Node, RenderError>
	{
		Ok(Node::Null)
	}

	fn serialize_some<T>(self, value: &T) -> Result<Node, RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		value.serialize(self)
	}

	fn serialize_unit(self) -> Result<Node, RenderError>
	{
		Ok(Node::Null)
	}

	fn serialize_unit_struct(self, name: &'static str) -> Result<Node, RenderError>
	{
		Ok(Node::Record{name, fields: Vec::new()})
	}

	fn serialize_unit_variant(self, _name: &'static str, _index: u32, variant: &'static str)
		-> Result<Node, RenderError>
	{
		Ok(Node::Plain(variant.to_owned()))
	}

	fn serialize_newtype_struct<T>(self, name: &'static str, value: &T) -> Result<Node, RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		match (name, value.serialize(self.nested()?)?)
		{
			(TIMESTAMP_NEWTYPE, Node::String(time)) => Ok(Node::Timestamp(time)),
			(_, node) => Ok(node),
		}
	}

	fn serialize_newtype_variant<T>(
		self,
		_name: &'static str,
		_index: u32,
		variant: &'static str,
		value: &T)
		-> Result<Node, RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		Ok(Node::Tagged(variant, Box::new(value.serialize(self.nested()?)?)))
	}

	fn serialize_seq(self, length: Option<usize>) -> Result<SequenceBuilder, RenderError>
	{
		SequenceBuilder::new(self, None, length)
	}

	fn serialize_tuple(self, length: usize) -> Result<SequenceBuilder, RenderError>
	{
		SequenceBuilder::new(self, None, Some(length))
	}

	fn serialize_tuple_struct(self, _name: &'static str, length: usize)
		-> Result<SequenceBuilder, RenderError>
	{
		SequenceBuilder::new(self, None, Some(length))
	}

	fn serialize_tuple_variant(
		self,
		_name: &'static str,
		_index: u32,
		variant: &'static str,
		length: usize)
		-> Result<SequenceBuilder, RenderError>
	{
		SequenceBuilder::new(self, Some(variant), Some(length))
	}

	fn serialize_map(self, _length: Option<usize>) -> Result<MapBuilder, RenderError>
	{
		Ok(MapBuilder{serializer: self.nested()?, entries: Vec::new(), key: None})
	}

	fn serialize_struct(self, name: &'static str, length: usize) -> Result<RecordBuilder, RenderError>
	{
		Ok(RecordBuilder{serializer: self.nested()?, name, fields: Vec::with_capacity(length)})
	}

	fn serialize_struct_variant(
		self,
		_name: &'static str,
		_index: u32,
		variant: &'static str,
		length: usize)
		-> Result<RecordBuilder, RenderError>
	{
		self.serialize_struct(variant, length)
	}
}

#[doc(hidden)]
struct SequenceBuilder
{
	serializer: NodeSerializer,
	tag: Option<&'static str>,
	items: Vec<Node>,
}

impl SequenceBuilder
{
	fn new(serializer: NodeSerializer, tag: Option<&'static str>, length: Option<usize>)
		-> Result<Self, RenderError>
	{
		Ok(Self
		{
			serializer: serializer.nested()?,
			tag,
			items: Vec::with_capacity(length.unwrap_or_default()),
		})
	}

	fn push<T>(&mut self, value: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.items.push(value.serialize(self.serializer)?);
		Ok(())
	}

	fn finish(self) -> Node
	{
		let sequence = Node::Sequence(self.items);

		match self.tag
		{
			Some(tag) => Node::Tagged(tag, Box::new(sequence)),
			None => sequence,
		}
	}
}

impl serde::ser::SerializeSeq for SequenceBuilder
{
	type Ok = Node;
	type Error = RenderError;

	fn serialize_element<T>(&mut self, value: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.push(value)
	}

	fn end(self) -> Result<Node, RenderError>
	{
		Ok(self.finish())
	}
}

impl serde::ser::SerializeTuple for SequenceBuilder
{
	type Ok = Node;
	type Error = RenderError;

	fn serialize_element<T>(&mut self, value: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.push(value)
	}

	fn end(self) -> Result<Node, RenderError>
	{
		Ok(self.finish())
	}
}

impl serde::ser::SerializeTupleStruct for SequenceBuilder
{
	type Ok = Node;
	type Error = RenderError;

	fn serialize_field<T>(&mut self, value: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.push(value)
	}

	fn end(self) -> Result<Node, RenderError>
	{
		Ok(self.finish())
	}
}

impl serde::ser::SerializeTupleVariant for SequenceBuilder
{
	type Ok = Node;
	type Error = RenderError;

	fn serialize_field<T>(&mut self, value: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.push(value)
	}

	fn end(self) -> Result<Node, RenderError>
	{
		Ok(self.finish())
	}
}

#[doc(hidden)]
struct MapBuilder
{
	serializer: NodeSerializer,
	entries: Vec<(String, Node)>,
	key: Option<String>,
}

impl serde::ser::SerializeMap for MapBuilder
{
	type Ok = Node;
	type Error = RenderError;

	fn serialize_key<T>(&mut self, key: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.key = Some(key.serialize(self.serializer)?.into_key());
		Ok(())
	}

	fn serialize_value<T>(&mut self, value: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		let key = self.key.take().unwrap_or_default();
		self.entries.push((key, value.serialize(self.serializer)?));
		Ok(())
	}

	fn end(self) -> Result<Node, RenderError>
	{
		Ok(Node::Map(self.entries))
	}
}

#[doc(hidden)]
struct RecordBuilder
{
	serializer: NodeSerializer,
	name: &'static str,
	fields: Vec<(&'static str, Node)>,
}

impl serde::ser::SerializeStruct for RecordBuilder
{
	type Ok = Node;
	type Error = RenderError;

	fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		self.fields.push((key, value.serialize(self.serializer)?));
		Ok(())
	}

	fn end(self) -> Result<Node, RenderError>
	{
		Ok(Node::Record{name: self.name, fields: self.fields})
	}
}

impl serde::ser::SerializeStructVariant for RecordBuilder
{
	type Ok = Node;
	type Error = RenderError;

	fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<(), RenderError>
	where
		T: serde::Serialize + ?Sized,
	{
		serde::ser::SerializeStruct::serialize_field(self, key, value)
	}

	fn end(self) -> Result<Node, RenderError>
	{
		serde::ser::SerializeStruct::end(self)
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[derive(serde::Serialize)]
	struct Owner
	{
		login: Option<String>,
		id: Option<i64>,
	}

	#[derive(serde::Serialize)]
	struct Repository
	{
		id: Option<i64>,
		name: Option<String>,
		private: Option<bool>,
		topics: Vec<String>,
		owner: Option<Owner>,
		pushed_at: Option<crate::models::Timestamp>,
		custom_properties: std::collections::BTreeMap<String, String>,
	}

	#[test]
	fn renders_present_fields_only()
	{
		let repository = Repository
		{
			id: Some(0),
			name: Some("hub\"wire".into()),
			private: None,
			topics: vec!["rust".into(), "github".into()],
			owner: Some(Owner{login: Some("octocat".into()), id: None}),
			pushed_at: crate::models::Timestamp::from_unix(1700000000),
			custom_properties: Default::default(),
		};

		assert_eq!(stringify(&repository),
			r#"Repository{id:0, name:"hub\"wire", topics:["rust" "github"], owner:Owner{login:"octocat"}, pushed_at:Timestamp{2023-11-14T22:13:20Z}}"#);
	}

	#[test]
	fn renders_maps_and_scalars()
	{
		let map: std::collections::BTreeMap<_, _> = [("a", 1), ("b", 2)].into_iter().collect();

		assert_eq!(stringify(&map), "map[a:1 b:2]");
		assert_eq!(stringify("text"), r#""text""#);
		assert_eq!(stringify(&None::<i32>), "null");
	}

	/// Serializes as an endless chain of nested records.
	struct Endless;

	impl serde::Serialize for Endless
	{
		fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
		where
			S: serde::Serializer,
		{
			use serde::ser::SerializeStruct as _;

			let mut record = serializer.serialize_struct("Endless", 1)?;
			record.serialize_field("next", &Endless)?;
			record.end()
		}
	}

	#[test]
	fn does_not_panic_on_endless_nesting()
	{
		assert_eq!(stringify(&Endless), "<unrenderable value: value is nested too deeply>");
	}
}
