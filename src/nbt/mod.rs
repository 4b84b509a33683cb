//! Streaming reader for the self-describing tagged-binary tree format
//! schematics are stored in (big-endian, 12 tag kinds). Self-contained: no
//! external NBT crate is depended on here.

pub mod tag;

pub use tag::{Compound, ListTag, TagTree};

use crate::error::{Error, Result};

const TAG_END: u8 = 0;
const TAG_BYTE: u8 = 1;
const TAG_SHORT: u8 = 2;
const TAG_INT: u8 = 3;
const TAG_LONG: u8 = 4;
const TAG_FLOAT: u8 = 5;
const TAG_DOUBLE: u8 = 6;
const TAG_BYTE_ARRAY: u8 = 7;
const TAG_STRING: u8 = 8;
const TAG_LIST: u8 = 9;
const TAG_COMPOUND: u8 = 10;
const TAG_INT_ARRAY: u8 = 11;
const TAG_LONG_ARRAY: u8 = 12;

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&e| e <= self.data.len())
            .ok_or_else(|| Error::MalformedContainer("read past end of buffer".into()))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn i8(&mut self) -> Result<i8> {
        Ok(self.u8()? as i8)
    }

    fn i16(&mut self) -> Result<i16> {
        Ok(i16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    fn i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_be_bytes(self.take(8)?.try_into().unwrap()))
    }

    fn name(&mut self) -> Result<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::MalformedContainer(format!("non-utf8 tag name: {e}")))
    }

    fn string(&mut self) -> Result<String> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::MalformedContainer(format!("non-utf8 string: {e}")))
    }

    fn byte_array(&mut self) -> Result<Vec<u8>> {
        let len = self.i32()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::MalformedContainer("negative byte-array length".into()))?;
        Ok(self.take(len)?.to_vec())
    }

    fn int_array(&mut self) -> Result<Vec<i32>> {
        let len = self.i32()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::MalformedContainer("negative int-array length".into()))?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.i32()?);
        }
        Ok(out)
    }

    fn long_array(&mut self) -> Result<Vec<i64>> {
        let len = self.i32()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::MalformedContainer("negative long-array length".into()))?;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.i64()?);
        }
        Ok(out)
    }

    fn payload(&mut self, kind: u8) -> Result<TagTree> {
        Ok(match kind {
            TAG_BYTE => TagTree::Byte(self.i8()?),
            TAG_SHORT => TagTree::Short(self.i16()?),
            TAG_INT => TagTree::Int(self.i32()?),
            TAG_LONG => TagTree::Long(self.i64()?),
            TAG_FLOAT => TagTree::Float(self.f32()?),
            TAG_DOUBLE => TagTree::Double(self.f64()?),
            TAG_BYTE_ARRAY => TagTree::ByteArray(self.byte_array()?),
            TAG_STRING => TagTree::String(self.string()?),
            TAG_LIST => {
                let element_kind = self.u8()?;
                let count = self.i32()?;
                let count = usize::try_from(count)
                    .map_err(|_| Error::MalformedContainer("negative list length".into()))?;
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    if element_kind == TAG_END {
                        break;
                    }
                    items.push(self.payload(element_kind)?);
                }
                TagTree::List(ListTag {
                    element_kind,
                    items,
                })
            }
            TAG_COMPOUND => TagTree::Compound(self.compound()?),
            TAG_INT_ARRAY => TagTree::IntArray(self.int_array()?),
            TAG_LONG_ARRAY => TagTree::LongArray(self.long_array()?),
            other => {
                return Err(Error::MalformedContainer(format!(
                    "unknown tag kind {other}"
                )));
            }
        })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::new();
        loop {
            let kind = self.u8()?;
            if kind == TAG_END {
                break;
            }
            let name = self.name()?;
            let payload = self.payload(kind)?;
            compound.child_tags.push((name, payload));
        }
        Ok(compound)
    }
}

/// Parse a tagged-binary tree from already-decompressed bytes.
///
/// Big-endian throughout. A root `End` tag (kind 0) yields `None`; any other
/// root kind must be a `Compound`, matching every real schematic container.
pub fn parse(bytes: &[u8]) -> Result<Option<Compound>> {
    let mut reader = Reader::new(bytes);
    let kind = reader.u8()?;
    if kind == TAG_END {
        return Ok(None);
    }
    // Root tag still carries a (usually empty) name before its payload.
    let _root_name = reader.name()?;
    match reader.payload(kind)? {
        TagTree::Compound(c) => Ok(Some(c)),
        _ => Err(Error::MalformedContainer(
            "root tag is not a compound".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound_bytes(name: &str, body: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(TAG_COMPOUND);
        out.extend_from_slice(&(name.len() as u16).to_be_bytes());
        out.extend_from_slice(name.as_bytes());
        body(&mut out);
        out.push(TAG_END);
        out
    }

    #[test]
    fn parses_flat_compound_with_scalars() {
        let bytes = compound_bytes("", |out| {
            out.push(TAG_SHORT);
            out.extend_from_slice(&2u16.to_be_bytes());
            out.extend_from_slice(b"Hi");
            out.extend_from_slice(&7i16.to_be_bytes());

            out.push(TAG_STRING);
            out.extend_from_slice(&4u16.to_be_bytes());
            out.extend_from_slice(b"Name");
            out.extend_from_slice(&5u16.to_be_bytes());
            out.extend_from_slice(b"stone");
        });

        let root = parse(&bytes).unwrap().unwrap();
        assert_eq!(root.get_short("Hi"), Some(7));
        assert_eq!(root.get_string("Name"), Some("stone"));
    }

    #[test]
    fn parses_nested_compound_and_arrays() {
        let bytes = compound_bytes("", |out| {
            out.push(TAG_INT_ARRAY);
            out.extend_from_slice(&3u16.to_be_bytes());
            out.extend_from_slice(b"Pos");
            out.extend_from_slice(&3i32.to_be_bytes());
            for v in [1i32, 2, 3] {
                out.extend_from_slice(&v.to_be_bytes());
            }

            out.push(TAG_COMPOUND);
            out.extend_from_slice(&5u16.to_be_bytes());
            out.extend_from_slice(b"Child");
            out.push(TAG_BYTE);
            out.extend_from_slice(&1u16.to_be_bytes());
            out.extend_from_slice(b"B");
            out.push(9i8 as u8);
            out.push(TAG_END);
        });

        let root = parse(&bytes).unwrap().unwrap();
        assert_eq!(root.get_int_array("Pos"), Some([1, 2, 3].as_slice()));
        let child = root.get_compound("Child").unwrap();
        assert_eq!(child.get("B"), Some(&TagTree::Byte(9)));
    }

    #[test]
    fn truncated_input_is_malformed() {
        let bytes = vec![TAG_COMPOUND, 0, 0, TAG_SHORT, 0, 1, b'X'];
        assert!(matches!(parse(&bytes), Err(Error::MalformedContainer(_))));
    }

    #[test]
    fn unknown_tag_kind_is_malformed() {
        let bytes = compound_bytes("", |out| {
            out.push(200);
            out.extend_from_slice(&1u16.to_be_bytes());
            out.extend_from_slice(b"X");
        });
        assert!(matches!(parse(&bytes), Err(Error::MalformedContainer(_))));
    }
}
