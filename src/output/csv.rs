//! Minimal CSV writing helpers (quoting and CRLF safe)

use std::io::{self, Write};

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single CSV row to any writer
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            let escaped = cell.replace('"', "\"\"");
            write!(w, "\"{}\"", escaped)?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Render a header plus rows as one CSV string
pub fn rows_to_string(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut out = Vec::new();
    let header_row: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    // Writing to a Vec<u8> cannot fail
    write_row(&mut out, &header_row).unwrap();
    for row in rows {
        write_row(&mut out, row).unwrap();
    }
    String::from_utf8(out).unwrap()
}
