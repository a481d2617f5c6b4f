//! Vector image stages: icon sanitizing, illustration pass-through, and
//! sprite assembly.
//!
//! Icons under `img/vector/` are individually sanitized. Icons under
//! `img/vector/sprite/` are merged into one `sprite.svg` document where each
//! source becomes a `<symbol>` addressable by its file stem. Vector files at
//! the image root are full illustrations and copied through unchanged.

use super::{ensure_parent, StageError, StageOutput};
use crate::build::{discover_files, BuildContext};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::{Path, PathBuf};

/// Fixed name of the assembled sprite document.
pub const SPRITE_FILE: &str = "sprite.svg";

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// Sanitize individual vector icons from `img/vector/*.svg` into the output
/// vector directory. The `sprite/` subdirectory is excluded; those files are
/// consumed by [`sprite`].
pub fn icons(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let vector_dir = ctx.out_dir().join("img/vector");
    let files = discover_files(&ctx.src_dir(), "img/vector/*.svg")?;

    let mut outputs = Vec::with_capacity(files.len());
    for file in files {
        let content = fs::read_to_string(&file).map_err(|e| StageError::io(&file, e))?;
        let sanitized = sanitize_svg(&content)
            .map_err(|message| StageError::Svg { path: file.clone(), message })?;

        let file_name = file.file_name().unwrap_or_default();
        let dest = vector_dir.join(file_name);
        ensure_parent(&dest)?;
        fs::write(&dest, sanitized).map_err(|e| StageError::io(&dest, e))?;
        outputs.push(dest);
    }
    Ok(StageOutput::files(outputs))
}

/// Copy full-page vector illustrations (`img/*.svg`) through unchanged.
pub fn illustrations(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let vector_dir = ctx.out_dir().join("img/vector");
    let files = discover_files(&ctx.src_dir(), "img/*.svg")?;

    let mut outputs = Vec::with_capacity(files.len());
    for file in files {
        let file_name = file.file_name().unwrap_or_default();
        let dest = vector_dir.join(file_name);
        ensure_parent(&dest)?;
        fs::copy(&file, &dest).map_err(|e| StageError::io(&file, e))?;
        outputs.push(dest);
    }
    Ok(StageOutput::files(outputs))
}

/// Assemble `img/vector/sprite/*.svg` into a single sprite document.
///
/// Reads the sprite sources directly from the source tree, never the
/// sanitized icon output, and rebuilds the document wholesale. Produces no
/// file when the sprite directory is empty.
pub fn sprite(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let files = discover_files(&ctx.src_dir(), "img/vector/sprite/*.svg")?;
    if files.is_empty() {
        return Ok(StageOutput::default());
    }

    let mut writer = Writer::new(Vec::new());
    let mut root = BytesStart::new("svg");
    root.push_attribute(("xmlns", SVG_NS));
    writer
        .write_event(Event::Start(root))
        .map_err(|e| sprite_error(&files[0], e))?;

    for file in &files {
        let id = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content = fs::read_to_string(file).map_err(|e| StageError::io(file, e))?;
        // Same cleanup as standalone icons, so sprite symbols carry no
        // editor metadata either
        let sanitized = sanitize_svg(&content)
            .map_err(|message| StageError::Svg { path: file.clone(), message })?;
        append_symbol(&mut writer, &id, &sanitized)
            .map_err(|message| StageError::Svg { path: file.clone(), message })?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("svg")))
        .map_err(|e| sprite_error(&files[0], e))?;

    let dest = ctx.out_dir().join("img/vector").join(SPRITE_FILE);
    ensure_parent(&dest)?;
    fs::write(&dest, writer.into_inner()).map_err(|e| StageError::io(&dest, e))?;
    Ok(StageOutput::files(vec![dest]))
}

fn sprite_error(path: &Path, e: impl std::fmt::Display) -> StageError {
    StageError::Svg { path: path.to_path_buf(), message: e.to_string() }
}

/// Element names whose whole subtree is dropped during sanitizing.
fn is_stripped_element(local_name: &[u8]) -> bool {
    matches!(local_name, b"metadata" | b"title" | b"desc")
}

/// Sanitize a vector document: drop the XML declaration, doctype, comments,
/// processing instructions and editor metadata subtrees, and collapse
/// inter-tag whitespace. Structural content is preserved.
pub fn sanitize_svg(input: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(input);
    let mut writer = Writer::new(Vec::new());
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_)) => {}
            Ok(Event::Start(e)) => {
                if skip_depth > 0 || is_stripped_element(e.local_name().as_ref()) {
                    skip_depth += 1;
                } else {
                    writer.write_event(Event::Start(e)).map_err(|e| e.to_string())?;
                }
            }
            Ok(Event::End(e)) => {
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else {
                    writer.write_event(Event::End(e)).map_err(|e| e.to_string())?;
                }
            }
            Ok(Event::Empty(e)) => {
                if skip_depth == 0 && !is_stripped_element(e.local_name().as_ref()) {
                    writer.write_event(Event::Empty(e)).map_err(|e| e.to_string())?;
                }
            }
            Ok(Event::Text(t)) => {
                if skip_depth == 0 {
                    let text = t.unescape().map_err(|e| e.to_string())?;
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        writer
                            .write_event(Event::Text(BytesText::new(trimmed)))
                            .map_err(|e| e.to_string())?;
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if skip_depth == 0 {
                    writer.write_event(Event::CData(c)).map_err(|e| e.to_string())?;
                }
            }
            Err(e) => {
                return Err(format!(
                    "parse error at offset {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
        }
    }

    String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
}

/// Rewrite one source document's root `<svg>` as a `<symbol id="...">` and
/// append it (with its content) to `writer`. The source `viewBox` carries
/// over so the symbol stays addressable at its original aspect ratio.
fn append_symbol(writer: &mut Writer<Vec<u8>>, id: &str, input: &str) -> Result<(), String> {
    let mut reader = Reader::from_str(input);
    let mut in_root = false;
    let mut seen_root = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Decl(_) | Event::DocType(_) | Event::Comment(_) | Event::PI(_)) => {}
            Ok(Event::Start(e)) => {
                if !in_root {
                    if e.local_name().as_ref() != b"svg" {
                        return Err(format!(
                            "expected <svg> root element, found <{}>",
                            String::from_utf8_lossy(e.name().as_ref())
                        ));
                    }
                    let symbol = symbol_open(id, &e)?;
                    writer.write_event(Event::Start(symbol)).map_err(|e| e.to_string())?;
                    in_root = true;
                    seen_root = true;
                } else {
                    depth += 1;
                    writer.write_event(Event::Start(e)).map_err(|e| e.to_string())?;
                }
            }
            Ok(Event::End(e)) => {
                if !in_root {
                    continue;
                }
                if depth == 0 {
                    // Closing the root <svg>
                    writer
                        .write_event(Event::End(BytesEnd::new("symbol")))
                        .map_err(|e| e.to_string())?;
                    in_root = false;
                } else {
                    depth -= 1;
                    writer.write_event(Event::End(e)).map_err(|e| e.to_string())?;
                }
            }
            Ok(Event::Empty(e)) => {
                if !in_root && !seen_root && e.local_name().as_ref() == b"svg" {
                    // Degenerate but legal: an empty icon document
                    let symbol = symbol_open(id, &e)?;
                    writer.write_event(Event::Empty(symbol)).map_err(|e| e.to_string())?;
                    seen_root = true;
                } else if in_root {
                    writer.write_event(Event::Empty(e)).map_err(|e| e.to_string())?;
                }
            }
            Ok(Event::Text(t)) => {
                if in_root {
                    let text = t.unescape().map_err(|e| e.to_string())?;
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        writer
                            .write_event(Event::Text(BytesText::new(trimmed)))
                            .map_err(|e| e.to_string())?;
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if in_root {
                    writer.write_event(Event::CData(c)).map_err(|e| e.to_string())?;
                }
            }
            Err(e) => {
                return Err(format!(
                    "parse error at offset {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
        }
    }

    if !seen_root {
        return Err("no <svg> root element".to_string());
    }
    Ok(())
}

/// Build the opening `<symbol>` tag for a sprite entry.
fn symbol_open(id: &str, svg_root: &BytesStart<'_>) -> Result<BytesStart<'static>, String> {
    let mut symbol = BytesStart::new("symbol");
    symbol.push_attribute(("id", id));
    for attr in svg_root.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.as_ref() == b"viewBox" {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            symbol.push_attribute(("viewBox", value.as_ref()));
        }
    }
    Ok(symbol)
}
