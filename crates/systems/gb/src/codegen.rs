//! Rust source generation.
//!
//! Emits a self-contained module of `const` tables: the deduplicated tile
//! data, and per scene the materialization table, the active sprite list and
//! one index constant per named tile. Output is deterministic for a given
//! manifest.

use std::collections::HashSet;
use std::fmt::Write;

use vramc_core::logging::{log, LogCategory, LogLevel};

use crate::manifest::CompiledAssets;
use crate::materialize::ScenePlan;
use crate::scene::TableKind;
use crate::AllocError;

#[derive(thiserror::Error, Debug)]
pub enum CodegenError {
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error("formatting failed")]
    Fmt(#[from] std::fmt::Error),
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Turn an arbitrary name into a Rust identifier: anything that is not
/// alphanumeric becomes `_`, and a leading digit gets a `_` prefix.
///
/// A lone `_` is not a usable name, so it becomes `__`.
pub fn sanitize_identifier(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if ident == "_" {
        ident.push('_');
    }
    ident
}

/// Lowercase module name for a scene.
pub fn module_name(name: &str) -> String {
    let ident = sanitize_identifier(&name.to_ascii_lowercase());
    if KEYWORDS.contains(&ident.as_str()) {
        format!("{}_", ident)
    } else {
        ident
    }
}

/// Uppercase constant name for a tile.
pub fn const_name(name: &str) -> String {
    sanitize_identifier(&name.to_ascii_uppercase())
}

/// `ident`, or `ident_2`, `ident_3`... if already taken.
fn unique(ident: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(ident.clone()) {
        return ident;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}_{}", ident, n);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn write_bytes(out: &mut String, bytes: &[u8]) -> std::fmt::Result {
    out.push('[');
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write!(out, "0x{:02X}", byte)?;
    }
    out.push(']');
    Ok(())
}

pub fn generate(assets: &CompiledAssets) -> Result<String, CodegenError> {
    let set = assets.set();
    let registry = set.registry();
    let mut out = String::new();

    writeln!(out, "// @generated by vramc. Do not edit.")?;
    writeln!(out)?;
    writeln!(out, "/// Unique tiles in registry order.")?;
    writeln!(out, "pub const TILE_DATA: [[u8; 16]; {}] = [", registry.len())?;
    for (index, tile) in registry.iter() {
        out.push_str("    ");
        write_bytes(&mut out, tile.as_bytes())?;
        writeln!(out, ", // {}", index)?;
    }
    writeln!(out, "];")?;

    let mut modules = HashSet::new();
    for id in 0..set.len() {
        let name = assets.scene_name(id).unwrap_or_default();
        let module = unique(module_name(name), &mut modules);
        let plan = ScenePlan::for_scene(set, id)?;
        let scene = set.scene(id)?;

        writeln!(out)?;
        writeln!(out, "/// Scene `{}`.", name)?;
        writeln!(out, "pub mod {} {{", module)?;
        writeln!(out, "    pub const ID: usize = {};", id)?;
        writeln!(out)?;
        writeln!(out, "    /// (address, index into `TILE_DATA`) in copy order.")?;
        writeln!(out, "    pub const TILES: [(u16, u16); {}] = [", plan.len())?;
        for copy in plan.copies() {
            writeln!(
                out,
                "        (0x{:04X}, {}), // {} slot {}",
                copy.address.get(),
                copy.registry_index.0,
                copy.table,
                copy.slot
            )?;
        }
        writeln!(out, "    ];")?;
        writeln!(out)?;
        let sprites: Vec<String> = scene.sprites().iter().map(|i| i.to_string()).collect();
        writeln!(
            out,
            "    pub const SPRITES: [u8; {}] = [{}];",
            sprites.len(),
            sprites.join(", ")
        )?;

        let placements = assets.named_placements(id)?;
        for table in [TableKind::Background, TableKind::Sprite, TableKind::Shared] {
            writeln!(out)?;
            writeln!(out, "    pub mod {} {{", table)?;
            let mut consts = HashSet::new();
            for placement in placements.iter().filter(|p| p.table == table) {
                let ident = unique(const_name(&placement.name), &mut consts);
                writeln!(out, "        pub const {}: u8 = {};", ident, placement.index)?;
            }
            writeln!(out, "    }}")?;
        }
        writeln!(out, "}}")?;

        log(LogCategory::CodeGen, LogLevel::Debug, || {
            format!("emitted scene '{}' as mod {} ({} tiles)", name, module, plan.len())
        });
    }

    log(LogCategory::CodeGen, LogLevel::Info, || {
        format!(
            "generated {} bytes of source for {} scenes",
            out.len(),
            set.len()
        )
    });
    Ok(out)
}
