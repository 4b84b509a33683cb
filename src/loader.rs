//! Classifies a parsed tag tree into one of four schematic dialects and
//! materialises it into a uniform [`Volume`]. Dialect and field-kind
//! distinctions are an explicit tagged sum matched structurally, rather
//! than a chain of runtime probes on whatever array type happens to be
//! present.

use crate::error::{Error, Result};
use crate::nbt::{Compound, TagTree};
use crate::volume::{Dialect, Palette, Volume};

const MIN_BITS_PER_ENTRY: u32 = 4;

/// Number of bits needed to represent `palette_len` distinct values, at
/// least [`MIN_BITS_PER_ENTRY`].
fn bits_per_entry(palette_len: usize) -> u32 {
    let n = palette_len.max(1);
    if n <= 1 {
        return MIN_BITS_PER_ENTRY;
    }
    let bits = usize::BITS - (n - 1).leading_zeros();
    bits.max(MIN_BITS_PER_ENTRY)
}

/// Decode a packed-long block-state array. Entries may straddle a long
/// boundary when `bpe` does not divide 64 evenly (some writers instead pad
/// unused bits so entries never straddle; this decoder implements the
/// straddling variant only).
fn decode_packed_longs(longs: &[i64], count: usize, bpe: u32) -> Result<Vec<u32>> {
    if bpe == 0 || bpe > 32 {
        return Err(Error::UnsupportedEncoding(format!(
            "invalid bits-per-entry {bpe}"
        )));
    }
    let mask: u64 = (1u64 << bpe) - 1;
    let mut out = Vec::with_capacity(count);
    for i in 0..count {
        let bit_index = i as u64 * bpe as u64;
        let long_index = (bit_index / 64) as usize;
        let start_bit = (bit_index % 64) as u32;

        let lo = *longs.get(long_index).ok_or_else(|| {
            Error::DimensionMismatch("packed-long decode ran past end of array".into())
        })? as u64;
        let mut value = lo >> start_bit;

        if start_bit + bpe > 64 {
            let hi = *longs.get(long_index + 1).ok_or_else(|| {
                Error::DimensionMismatch("packed-long decode ran past end of array".into())
            })? as u64;
            value |= hi << (64 - start_bit);
        }
        out.push((value & mask) as u32);
    }
    Ok(out)
}

/// Encode palette indices into a packed-long array at a given `bpe`, the
/// inverse of [`decode_packed_longs`]. Used only by the round-trip test.
#[cfg(test)]
fn encode_packed_longs(values: &[u32], bpe: u32) -> Vec<i64> {
    let total_bits = values.len() as u64 * bpe as u64;
    let long_count = total_bits.div_ceil(64) as usize;
    let mut longs = vec![0u64; long_count.max(1)];
    for (i, &v) in values.iter().enumerate() {
        let bit_index = i as u64 * bpe as u64;
        let long_index = (bit_index / 64) as usize;
        let start_bit = (bit_index % 64) as u32;
        let v = v as u64 & ((1u64 << bpe) - 1);
        longs[long_index] |= v << start_bit;
        if start_bit + bpe > 64 {
            longs[long_index + 1] |= v >> (64 - start_bit);
        }
    }
    longs.into_iter().map(|v| v as i64).collect()
}

/// LEB128 decode: 7-bit little-endian groups with a continuation bit,
/// accumulating exactly `count` values.
fn decode_leb128(data: &[u8], count: usize) -> Result<Vec<u32>> {
    let mut result = Vec::with_capacity(count);
    let mut i = 0usize;
    while result.len() < count {
        let mut value: u32 = 0;
        let mut shift: u32 = 0;
        loop {
            if shift >= 35 {
                return Err(Error::MalformedContainer("varint exceeds 35 bits".into()));
            }
            let byte = *data
                .get(i)
                .ok_or_else(|| Error::DimensionMismatch("varint data ended prematurely".into()))?;
            i += 1;
            value |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
        }
        result.push(value);
    }
    Ok(result)
}

/// LEB128 encode, the inverse of [`decode_leb128`]. Used only by the
/// round-trip test.
#[cfg(test)]
fn encode_leb128(values: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    for &value in values {
        let mut v = value;
        loop {
            let mut byte = (v & 0x7F) as u8;
            v >>= 7;
            if v != 0 {
                byte |= 0x80;
            }
            out.push(byte);
            if v == 0 {
                break;
            }
        }
    }
    out
}

fn build_descriptor(name: &str, props: &[(String, String)]) -> String {
    let qualified = if name.contains(':') {
        name.to_lowercase()
    } else {
        format!("minecraft:{}", name.to_lowercase())
    };
    if props.is_empty() {
        return qualified;
    }
    let mut sorted = props.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));
    let inner: Vec<String> = sorted.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!("{qualified}[{}]", inner.join(","))
}

fn dimensions(root: &Compound) -> Result<(u32, u32, u32)> {
    if let Some(items) = root.get_list("Size") {
        if items.len() >= 3 {
            let w = items[0]
                .extract_int()
                .ok_or_else(|| Error::DimensionMismatch("Size[0] is not an integer".into()))?;
            let h = items[1]
                .extract_int()
                .ok_or_else(|| Error::DimensionMismatch("Size[1] is not an integer".into()))?;
            let l = items[2]
                .extract_int()
                .ok_or_else(|| Error::DimensionMismatch("Size[2] is not an integer".into()))?;
            return Ok((w as u32, h as u32, l as u32));
        }
    }
    let w = root
        .get_short("Width")
        .ok_or_else(|| Error::DimensionMismatch("missing Width".into()))?;
    let h = root
        .get_short("Height")
        .ok_or_else(|| Error::DimensionMismatch("missing Height".into()))?;
    let l = root
        .get_short("Length")
        .ok_or_else(|| Error::DimensionMismatch("missing Length".into()))?;
    Ok((w as u32, h as u32, l as u32))
}

fn read_palette(field_root: &Compound) -> Result<Palette> {
    let tag = field_root
        .get("Palette")
        .or_else(|| field_root.get("BlockStatePalette"))
        .ok_or_else(|| Error::UnknownDialect("missing Palette/BlockStatePalette".into()))?;

    match tag {
        TagTree::List(list) => {
            let mut descriptors = Vec::with_capacity(list.items.len());
            for item in &list.items {
                let TagTree::Compound(entry) = item else {
                    return Err(Error::UnsupportedEncoding(
                        "palette list entry is not a compound".into(),
                    ));
                };
                let name = entry.get_string("Name").ok_or_else(|| {
                    Error::UnsupportedEncoding("palette entry missing Name".into())
                })?;
                let mut props: Vec<(String, String)> = Vec::new();
                if let Some(properties) = entry.get_compound("Properties") {
                    for (k, v) in &properties.child_tags {
                        let value = match v {
                            TagTree::String(s) => s.clone(),
                            TagTree::Byte(b) => b.to_string(),
                            TagTree::Short(s) => s.to_string(),
                            TagTree::Int(i) => i.to_string(),
                            _ => continue,
                        };
                        props.push((k.clone(), value));
                    }
                }
                descriptors.push(build_descriptor(name, &props));
            }
            Ok(Palette { descriptors })
        }
        TagTree::Compound(map) => {
            // descriptor -> index, NOT index -> descriptor. The source bug
            // where these roles were transposed must not be reproduced.
            let mut max_index: i64 = -1;
            for (_, v) in &map.child_tags {
                if let TagTree::Int(idx) = v {
                    max_index = max_index.max(*idx as i64);
                }
            }
            if max_index < 0 {
                return Ok(Palette::default());
            }
            let mut descriptors = vec![String::new(); (max_index + 1) as usize];
            for (descriptor, v) in &map.child_tags {
                if let TagTree::Int(idx) = v {
                    if *idx >= 0 {
                        descriptors[*idx as usize] = descriptor.clone();
                    }
                }
            }
            Ok(Palette { descriptors })
        }
        _ => Err(Error::UnsupportedEncoding(
            "Palette is neither a list nor a compound".into(),
        )),
    }
}

fn decode_cells(field_root: &Compound, palette_len: usize, volume: usize) -> Result<Vec<u32>> {
    if let Some(tag) = field_root.get("BlockStates") {
        return match tag {
            TagTree::LongArray(longs) => {
                let bpe = bits_per_entry(palette_len);
                log::debug!("loader: packed longs, bits-per-entry={bpe}");
                decode_packed_longs(longs, volume, bpe)
            }
            _ => Err(Error::UnsupportedEncoding(
                "BlockStates is not a long array".into(),
            )),
        };
    }

    if let Some(tag) = field_root.get("BlockData") {
        return match tag {
            TagTree::ByteArray(bytes) => {
                log::debug!("loader: LEB128 varint cell data");
                decode_leb128(bytes, volume)
            }
            _ => Err(Error::UnsupportedEncoding(
                "BlockData is not a byte array".into(),
            )),
        };
    }

    for name in ["Blocks", "Data"] {
        let Some(tag) = field_root.get(name) else {
            continue;
        };
        match tag {
            TagTree::IntArray(arr) if arr.len() == volume => {
                return Ok(arr.iter().map(|&v| v as u32).collect());
            }
            TagTree::ByteArray(arr) if arr.len() == volume => {
                return Ok(arr.iter().map(|&v| v as u32).collect());
            }
            TagTree::ByteArray(arr) => {
                log::debug!("loader: {name} length mismatch, decoding as LEB128");
                return decode_leb128(arr, volume);
            }
            TagTree::IntArray(arr) => {
                return Err(Error::DimensionMismatch(format!(
                    "{name} int array length {} != volume {volume}",
                    arr.len()
                )));
            }
            _ => continue,
        }
    }

    Err(Error::UnsupportedEncoding(
        "no recognised block-array field present".into(),
    ))
}

fn load_modern(dim_root: &Compound, field_root: &Compound, dialect: Dialect) -> Result<Volume> {
    let (width, height, length) = dimensions(dim_root)?;
    let volume = width as usize * height as usize * length as usize;
    let palette = read_palette(field_root)?;
    let cells = decode_cells(field_root, palette.len(), volume)?;
    if cells.len() != volume {
        return Err(Error::DimensionMismatch(format!(
            "decoded {} cells, expected {volume}",
            cells.len()
        )));
    }
    Ok(Volume {
        width,
        height,
        length,
        dialect,
        palette: Some(palette),
        cells: Some(cells),
        legacy_blocks: None,
        legacy_data: None,
    })
}

fn load_classic(root: &Compound) -> Result<Volume> {
    let (width, height, length) = dimensions(root)?;
    let volume = width as usize * height as usize * length as usize;

    let blocks = root
        .get_byte_array("Blocks")
        .or_else(|| root.get_byte_array("BlockData"))
        .ok_or_else(|| Error::UnsupportedEncoding("classic dialect missing Blocks array".into()))?;
    if blocks.len() != volume {
        return Err(Error::DimensionMismatch(format!(
            "Blocks length {} != volume {volume}",
            blocks.len()
        )));
    }

    let add = root
        .get_byte_array("AddBlocks")
        .or_else(|| root.get_byte_array("Add"));
    if let Some(add_bytes) = add {
        let needed = volume.div_ceil(2);
        if add_bytes.len() < needed {
            return Err(Error::DimensionMismatch("AddBlocks array too short".into()));
        }
    }

    let data = root.get_byte_array("Data");
    if let Some(d) = data {
        if d.len() != volume {
            return Err(Error::DimensionMismatch(format!(
                "Data length {} != volume {volume}",
                d.len()
            )));
        }
    }

    let mut legacy_blocks = Vec::with_capacity(volume);
    for (i, &low) in blocks.iter().enumerate() {
        let add_nibble = match add {
            Some(add_bytes) => {
                let byte = add_bytes[i / 2];
                if i % 2 == 0 {
                    (byte >> 4) & 0x0F
                } else {
                    byte & 0x0F
                }
            }
            None => 0,
        };
        legacy_blocks.push(((add_nibble as u16) << 8) | low as u16);
    }

    let legacy_data: Vec<u8> = match data {
        Some(d) => d.iter().map(|&b| b & 0x0F).collect(),
        None => vec![0u8; volume],
    };

    Ok(Volume {
        width,
        height,
        length,
        dialect: Dialect::Classic,
        palette: None,
        cells: None,
        legacy_blocks: Some(legacy_blocks),
        legacy_data: Some(legacy_data),
    })
}

const STATES_WRAPPED_KEYS: [&str; 5] = ["Palette", "BlockStatePalette", "BlockStates", "BlockData", "Data"];
const MODERN_ARRAY_KEYS: [&str; 4] = ["BlockStates", "BlockData", "Blocks", "Data"];
const CLASSIC_ARRAY_KEYS: [&str; 3] = ["Blocks", "Data", "BlockData"];

fn has_palette(c: &Compound) -> bool {
    c.get("Palette").is_some() || c.get("BlockStatePalette").is_some()
}

fn find_fallback_source(root: &Compound) -> Result<&Compound> {
    let mut candidates = vec![root];
    if let Some(blocks) = root.get_compound("Blocks") {
        candidates.push(blocks);
    }
    for candidate in candidates {
        if has_palette(candidate) && MODERN_ARRAY_KEYS.iter().any(|k| candidate.get(k).is_some()) {
            return Ok(candidate);
        }
    }
    Err(Error::UnknownDialect(
        "no palette/block-array pair found in root or Blocks".into(),
    ))
}

/// Classify the root tag tree and materialise a [`Volume`].
pub fn load(root: &Compound) -> Result<Volume> {
    let data_root = root.get_compound("Schematic").unwrap_or(root);

    if let Some(blocks) = data_root.get_compound("Blocks") {
        if STATES_WRAPPED_KEYS.iter().any(|k| blocks.get(k).is_some()) {
            log::debug!("loader: classified as states_wrapped");
            return load_modern(data_root, blocks, Dialect::StatesWrapped);
        }
    }

    if has_palette(data_root) && MODERN_ARRAY_KEYS.iter().any(|k| data_root.get(k).is_some()) {
        log::debug!("loader: classified as modern");
        return load_modern(data_root, data_root, Dialect::Modern);
    }

    let has_dims = data_root.get("Width").is_some()
        && data_root.get("Height").is_some()
        && data_root.get("Length").is_some();
    if has_dims && CLASSIC_ARRAY_KEYS.iter().any(|k| data_root.get(k).is_some()) {
        log::debug!("loader: classified as classic");
        return load_classic(data_root);
    }

    log::debug!("loader: no direct match, searching for fallback palette/array pair");
    let source = find_fallback_source(data_root)?;
    load_modern(data_root, source, Dialect::Fallback)
}
