//! Java-edition schematic decode → block translation → command compaction.
//!
//! Converts a schematic blob (optionally gzip/zlib-framed) into a stream of
//! `setblock`/`fill` command lines reproducing the same volume on Bedrock.
//! Out of scope: the HTTP surface, package assembly, and persistence layers
//! that sit around this core in a full add-on pipeline (those are the
//! caller's concern, see `src/bin/litho2bedrock.rs` for a minimal one).

pub mod decompress;
pub mod error;
pub mod loader;
pub mod merge;
pub mod nbt;
pub mod translate;
pub mod volume;

use std::collections::HashMap;

pub use error::{Error, Result};
use translate::{TranslationEntry, Translator};

/// Run the full pipeline: decompress, parse, classify+decode, translate,
/// merge. Returns the emitted command stream, or a fatal [`Error`] on a
/// malformed container, an unrecognised dialect, a dimension mismatch, or
/// an unsupported field encoding.
pub fn convert(
    bytes: &[u8],
    java_to_bedrock: &HashMap<String, TranslationEntry>,
    legacy_map: &HashMap<String, String>,
) -> Result<String> {
    let raw = decompress::decompress(bytes);

    let root = nbt::parse(&raw)?
        .ok_or_else(|| Error::MalformedContainer("root tag is an empty End tag".into()))?;

    let volume = loader::load(&root)?;
    log::info!(
        "loaded {}x{}x{} volume ({:?} dialect)",
        volume.width,
        volume.height,
        volume.length,
        volume.dialect
    );

    let mut translator = Translator::new(java_to_bedrock, legacy_map);
    let commands = merge::emit_commands(&volume, &mut translator);
    log::info!("emitted {} command lines", commands.lines().count());

    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(bytes).unwrap();
        enc.finish().unwrap()
    }

    fn write_compound(body: impl FnOnce(&mut Vec<u8>)) -> Vec<u8> {
        let mut out = Vec::new();
        out.push(10); // TAG_Compound
        out.extend_from_slice(&0u16.to_be_bytes());
        body(&mut out);
        out.push(0); // TAG_End
        out
    }

    fn classic_one_stone() -> Vec<u8> {
        write_compound(|out| {
            for (name, value) in [("Width", 1i16), ("Height", 1), ("Length", 1)] {
                out.push(2); // TAG_Short
                out.extend_from_slice(&(name.len() as u16).to_be_bytes());
                out.extend_from_slice(name.as_bytes());
                out.extend_from_slice(&value.to_be_bytes());
            }
            out.push(7); // TAG_ByteArray
            out.extend_from_slice(&6u16.to_be_bytes());
            out.extend_from_slice(b"Blocks");
            out.extend_from_slice(&1i32.to_be_bytes());
            out.push(0x01);
        })
    }

    #[test]
    fn end_to_end_classic_single_stone_cell() {
        let bytes = gzip(&classic_one_stone());
        let mut legacy_map = HashMap::new();
        legacy_map.insert("1:0".to_string(), "minecraft:stone".to_string());
        let table = HashMap::new();

        let out = convert(&bytes, &table, &legacy_map).unwrap();
        assert_eq!(out, "setblock ~1 ~1 ~1 stone\n");
    }

    #[test]
    fn end_to_end_uncompressed_input_also_works() {
        let bytes = classic_one_stone();
        let mut legacy_map = HashMap::new();
        legacy_map.insert("1:0".to_string(), "minecraft:stone".to_string());
        let table = HashMap::new();

        let out = convert(&bytes, &table, &legacy_map).unwrap();
        assert_eq!(out, "setblock ~1 ~1 ~1 stone\n");
    }

    #[test]
    fn malformed_input_is_a_fatal_error() {
        let table = HashMap::new();
        let legacy_map = HashMap::new();
        let err = convert(b"not nbt at all, too short", &table, &legacy_map).unwrap_err();
        assert!(matches!(err, Error::MalformedContainer(_)));
    }
}
