use crate::scanner::Scanner;
use solcloak_utils::errors::ScanError;

/// Returns the offset of the `}` matching the `{` at `open`.
///
/// Braces inside comments and string literals are ignored. Callers should treat
/// [`ScanError::BlockUnresolved`] as "skip this block".
pub fn find_block_end(src: &str, open: usize) -> Result<usize, ScanError> {
    if src.as_bytes().get(open) != Some(&b'{') {
        return Err(ScanError::NotAnOpenBrace(open));
    }
    let mut depth = 0usize;
    for cell in Scanner::starting_at(src, open) {
        if !cell.is_code() {
            continue;
        }
        match cell.byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(cell.offset);
                }
            }
            _ => {}
        }
    }
    Err(ScanError::BlockUnresolved(open))
}
