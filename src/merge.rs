//! Origin selection and greedy run-merging: the pass whose correctness
//! determines output size. Iterates the volume as a `(position,
//! translated-key)` sequence and expands axis-aligned boxes over it.

use crate::translate::Translator;
use crate::volume::{Dialect, Volume};

fn translate_all(volume: &Volume, translator: &mut Translator) -> Vec<Option<String>> {
    let count = volume.cell_count();
    let mut out = Vec::with_capacity(count);
    match volume.dialect {
        Dialect::Classic => {
            let blocks = volume
                .legacy_blocks
                .as_ref()
                .expect("classic volume missing legacy_blocks");
            let data = volume
                .legacy_data
                .as_ref()
                .expect("classic volume missing legacy_data");
            for i in 0..count {
                out.push(translator.translate_legacy(blocks[i], data[i]));
            }
        }
        _ => {
            let palette = volume.palette.as_ref().expect("volume missing palette");
            let cells = volume.cells.as_ref().expect("volume missing cells");
            for i in 0..count {
                out.push(translator.translate_index(palette, cells[i]));
            }
        }
    }
    out
}

/// Pick the minimum-corner non-air cell in (z, x, y) lexicographic order;
/// `(0, 0, 0)` if every cell translates to nothing.
fn find_origin(volume: &Volume, keys: &[Option<String>]) -> (i32, i32, i32) {
    let mut best: Option<(i32, i32, i32)> = None;
    for index in 0..volume.cell_count() {
        if keys[index].is_none() {
            continue;
        }
        let (x, y, z) = volume.coords_of(index);
        let candidate = (z as i32, x as i32, y as i32);
        match best {
            Some(b) if candidate >= b => {}
            _ => best = Some(candidate),
        }
    }
    match best {
        Some((z, x, y)) => (x, y, z),
        None => (0, 0, 0),
    }
}

/// Run origin selection and greedy merging over a decoded volume and render
/// the resulting boxes as `setblock`/`fill` command lines.
pub fn emit_commands(volume: &Volume, translator: &mut Translator) -> String {
    let keys = translate_all(volume, translator);
    let (ox, oy, oz) = find_origin(volume, &keys);

    let w = volume.width as i32;
    let h = volume.height as i32;
    let l = volume.length as i32;
    let count = volume.cell_count();

    let mut visited = vec![false; count];
    let mut out = String::new();

    for index in 0..count {
        if visited[index] {
            continue;
        }
        let Some(key) = keys[index].clone() else {
            visited[index] = true;
            continue;
        };
        let (x0, y0, z0) = volume.coords_of(index);
        let (x0, y0, z0) = (x0 as i32, y0 as i32, z0 as i32);

        let same = |ix: i32, iy: i32, iz: i32| -> bool {
            let idx = volume.index_of(ix as u32, iy as u32, iz as u32);
            !visited[idx] && keys[idx].as_deref() == Some(key.as_str())
        };

        // Expand along +X.
        let mut x1 = x0;
        while x1 + 1 < w && same(x1 + 1, y0, z0) {
            x1 += 1;
        }

        // Expand along +Z, one whole row at a time.
        let mut z1 = z0;
        loop {
            let candidate_z = z1 + 1;
            if candidate_z >= l || !(x0..=x1).all(|x| same(x, y0, candidate_z)) {
                break;
            }
            z1 = candidate_z;
        }

        // Expand along +Y, one whole slab at a time.
        let mut y1 = y0;
        loop {
            let candidate_y = y1 + 1;
            if candidate_y >= h
                || !(x0..=x1).all(|x| (z0..=z1).all(|z| same(x, candidate_y, z)))
            {
                break;
            }
            y1 = candidate_y;
        }

        for y in y0..=y1 {
            for z in z0..=z1 {
                for x in x0..=x1 {
                    visited[volume.index_of(x as u32, y as u32, z as u32)] = true;
                }
            }
        }

        let rx1 = x0 - ox + 1;
        let ry1 = y0 - oy + 1;
        let rz1 = z0 - oz + 1;

        if x0 == x1 && y0 == y1 && z0 == z1 {
            out.push_str(&format!("setblock ~{rx1} ~{ry1} ~{rz1} {key}\n"));
        } else {
            let rx2 = x1 - ox + 1;
            let ry2 = y1 - oy + 1;
            let rz2 = z1 - oz + 1;
            out.push_str(&format!(
                "fill ~{rx1} ~{ry1} ~{rz1} ~{rx2} ~{ry2} ~{rz2} {key}\n"
            ));
        }
    }

    log::debug!("merger: emitted {} lines", out.lines().count());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Palette;
    use std::collections::HashMap;

    fn translator<'a>(
        table: &'a HashMap<String, crate::translate::TranslationEntry>,
        legacy: &'a HashMap<String, String>,
    ) -> Translator<'a> {
        Translator::new(table, legacy)
    }

    #[test]
    fn single_stone_cell_emits_setblock() {
        let volume = Volume {
            width: 1,
            height: 1,
            length: 1,
            dialect: Dialect::Modern,
            palette: Some(Palette {
                descriptors: vec!["minecraft:stone".to_string()],
            }),
            cells: Some(vec![0]),
            legacy_blocks: None,
            legacy_data: None,
        };
        let table = HashMap::new();
        let legacy = HashMap::new();
        let mut t = translator(&table, &legacy);
        assert_eq!(emit_commands(&volume, &mut t), "setblock ~1 ~1 ~1 stone\n");
    }

    #[test]
    fn run_of_two_stone_cells_emits_fill() {
        let volume = Volume {
            width: 2,
            height: 1,
            length: 1,
            dialect: Dialect::Modern,
            palette: Some(Palette {
                descriptors: vec!["minecraft:stone".to_string()],
            }),
            cells: Some(vec![0, 0]),
            legacy_blocks: None,
            legacy_data: None,
        };
        let table = HashMap::new();
        let legacy = HashMap::new();
        let mut t = translator(&table, &legacy);
        assert_eq!(
            emit_commands(&volume, &mut t),
            "fill ~1 ~1 ~1 ~2 ~1 ~1 stone\n"
        );
    }

    #[test]
    fn air_sandwich_origin_is_the_lone_stone_cell() {
        let volume = Volume {
            width: 3,
            height: 1,
            length: 1,
            dialect: Dialect::Modern,
            palette: Some(Palette {
                descriptors: vec!["minecraft:air".to_string(), "minecraft:stone".to_string()],
            }),
            cells: Some(vec![0, 1, 0]),
            legacy_blocks: None,
            legacy_data: None,
        };
        let table = HashMap::new();
        let legacy = HashMap::new();
        let mut t = translator(&table, &legacy);
        assert_eq!(emit_commands(&volume, &mut t), "setblock ~1 ~1 ~1 stone\n");
    }

    #[test]
    fn homogeneous_cube_merges_into_one_fill() {
        let volume = Volume {
            width: 2,
            height: 2,
            length: 2,
            dialect: Dialect::Modern,
            palette: Some(Palette {
                descriptors: vec!["minecraft:stone".to_string()],
            }),
            cells: Some(vec![0; 8]),
            legacy_blocks: None,
            legacy_data: None,
        };
        let table = HashMap::new();
        let legacy = HashMap::new();
        let mut t = translator(&table, &legacy);
        assert_eq!(
            emit_commands(&volume, &mut t),
            "fill ~1 ~1 ~1 ~2 ~2 ~2 stone\n"
        );
    }

    #[test]
    fn invalid_block_is_dropped() {
        let volume = Volume {
            width: 1,
            height: 1,
            length: 1,
            dialect: Dialect::Modern,
            palette: Some(Palette {
                descriptors: vec!["minecraft:piston_head".to_string()],
            }),
            cells: Some(vec![0]),
            legacy_blocks: None,
            legacy_data: None,
        };
        let table = HashMap::new();
        let legacy = HashMap::new();
        let mut t = translator(&table, &legacy);
        assert_eq!(emit_commands(&volume, &mut t), "");
    }

    #[test]
    fn non_overlapping_boxes_conserve_volume() {
        // Two distinct blocks side by side in X must not merge into one box.
        let volume = Volume {
            width: 2,
            height: 1,
            length: 1,
            dialect: Dialect::Modern,
            palette: Some(Palette {
                descriptors: vec!["minecraft:stone".to_string(), "minecraft:dirt".to_string()],
            }),
            cells: Some(vec![0, 1]),
            legacy_blocks: None,
            legacy_data: None,
        };
        let table = HashMap::new();
        let legacy = HashMap::new();
        let mut t = translator(&table, &legacy);
        let output = emit_commands(&volume, &mut t);
        assert_eq!(output.lines().count(), 2);
        assert!(output.contains("stone"));
        assert!(output.contains("dirt"));
    }
}
