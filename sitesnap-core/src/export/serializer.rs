//! CSV serializer for export documents.
//!
//! Output is fixed-format: comma separated, CRLF terminated, UTF-8 with a
//! leading byte-order mark so spreadsheet applications pick the right encoding.

/// UTF-8 byte-order mark written once at the start of every document.
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

pub const DELIMITER: char = ',';
pub const QUOTE: char = '"';
pub const LINE_ENDING: &str = "\r\n";

/// Quote a field only when it contains a quote, comma, CR or LF.
pub fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    let needs_quoting = field.contains(DELIMITER)
        || field.contains(QUOTE)
        || field.contains('\n')
        || field.contains('\r');

    if needs_quoting {
        let escaped = field.replace(QUOTE, "\"\"");
        format!("{}{}{}", QUOTE, escaped, QUOTE).into()
    } else {
        field.into()
    }
}

fn write_row<S: AsRef<str>>(out: &mut Vec<u8>, fields: &[S]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER as u8);
        }
        out.extend_from_slice(escape_field(field.as_ref()).as_bytes());
    }
    out.extend_from_slice(LINE_ENDING.as_bytes());
}

/// Render rows (header included) into a complete CSV document.
pub fn render<R, S>(rows: &[R]) -> Vec<u8>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut out = Vec::with_capacity(UTF8_BOM.len() + rows.len() * 64);
    out.extend_from_slice(&UTF8_BOM);
    for row in rows {
        write_row(&mut out, row.as_ref());
    }
    out
}
