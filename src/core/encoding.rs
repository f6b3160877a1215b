/*!
Text encodings for key material.
*/

use crate::core::constants::pem::LINE_WIDTH;
use base64::{Engine as _, engine::general_purpose};

/// Encode bytes as standard base64, broken into lines of 64 columns.
///
/// Lines are joined with `\n` and the result carries no trailing newline.
pub fn encode_base64(bytes: &[u8]) -> String {
    let encoded = general_purpose::STANDARD.encode(bytes);

    let mut wrapped = String::with_capacity(encoded.len() + encoded.len() / LINE_WIDTH);
    for (i, line) in encoded.as_bytes().chunks(LINE_WIDTH).enumerate() {
        if i > 0 {
            wrapped.push('\n');
        }
        // base64 output is ASCII, so every chunk boundary is a char boundary
        wrapped.push_str(&encoded[i * LINE_WIDTH..i * LINE_WIDTH + line.len()]);
    }
    wrapped
}

/// Frame base64 text between a header and a footer.
pub fn wrap_pem(base64_text: &str, header: &str, footer: &str) -> String {
    let mut out = String::with_capacity(header.len() + base64_text.len() + footer.len());
    out.push_str(header);
    out.push_str(base64_text);
    out.push_str(footer);
    out
}
