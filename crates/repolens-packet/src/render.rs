use crate::model::{BundleBlock, FileRepresentation};

/// Separator placed between rendered blocks.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Wrap one representation in the file envelope the final prompt expects.
#[must_use]
pub fn render_block(path: &str, text: &str) -> String {
    format!("=== FILE: {path} ===\n{text}\n=== END FILE ===")
}

/// Render every representation, keeping their order.
#[must_use]
pub fn build_bundle(files: &[FileRepresentation]) -> Vec<BundleBlock> {
    files
        .iter()
        .map(|file| BundleBlock {
            path: file.path.clone(),
            block: render_block(&file.path, &file.text),
        })
        .collect()
}

/// Join blocks into one prompt body.
#[must_use]
pub fn join_blocks(blocks: &[BundleBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.block.as_str())
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Concatenation of every prepared text, used as the substring authority
/// during grounding.
#[must_use]
pub fn evidence_blob(files: &[FileRepresentation]) -> String {
    files
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
