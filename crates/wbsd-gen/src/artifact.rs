//! Text artifact rendering: self-contained, include-guarded constant-data
//! modules consumable from C.

use std::fs;
use std::path::Path;

use log::info;

use crate::error::GenError;
use crate::lanes::LANES;
use crate::tables::{TableSet, ENTRY_BYTES};

/// Array label used for the encryption table file.
pub const ENCRYPT_LABEL: &str = "wb_encr_tbl";
/// Array label used for the decryption table file.
pub const DECRYPT_LABEL: &str = "wb_decr_tbl";

/// Renders a table set as one constant-data module.
///
/// Every round becomes `const tbox_t <label>_<round>[16][256]` with entries
/// rendered as comma-separated decimal byte lists, all behind `guard`. The
/// module carries its own `tbox_t` typedef so it compiles stand-alone.
pub fn render(set: &TableSet, label: &str, guard: &str) -> String {
    let mut out = String::with_capacity(set.round_count() * LANES * 256 * ENTRY_BYTES * 5);
    out.push_str("/* Automatically generated white-box lookup tables. Do not edit. */\n\n");
    out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
    out.push_str("typedef unsigned char tbox_t[16];\n\n");
    for round in 0..set.round_count() {
        out.push_str(&format!("const tbox_t {label}_{round}[16][256] = {{\n"));
        for lane in 0..LANES {
            out.push_str("  {\n");
            for input in 0..=255u8 {
                let entry = set.round(round).lane(lane).get(input);
                let bytes: Vec<String> = entry.iter().map(u8::to_string).collect();
                out.push_str("    { ");
                out.push_str(&bytes.join(", "));
                out.push_str(if input != 255 { " },\n" } else { " }\n" });
            }
            out.push_str(if lane != LANES - 1 { "  },\n" } else { "  }\n" });
        }
        out.push_str("};\n\n");
    }
    out.push_str(&format!("#endif /* {guard} */\n"));
    out
}

/// Renders and writes one artifact in a single shot, so a failed write
/// surfaces as an error instead of a half-written file reported as success.
pub fn write(set: &TableSet, label: &str, path: &Path) -> Result<(), GenError> {
    let rendered = render(set, label, &guard_for(path));
    fs::write(path, rendered).map_err(|source| GenError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("wrote {} rounds to {}", set.round_count(), path.display());
    Ok(())
}

/// Derives the include guard from the file stem: uppercased, with
/// non-alphanumerics folded to underscores.
fn guard_for(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("wb_tbl");
    let mut guard: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    guard.push_str("_H");
    guard
}
