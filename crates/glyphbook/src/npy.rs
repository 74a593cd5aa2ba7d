//! Minimal NPY (NumPy array file) codec for 2-D `uint8` matrices.
//!
//! Only the subset the dataset cache needs: format versions 1.0/2.0,
//! dtype `u1` or `b1`, C order.

use crate::error::{GlyphError, Result};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;

pub(crate) fn encode_u8_matrix(rows: usize, cols: usize, data: &[u8]) -> Vec<u8> {
    debug_assert_eq!(rows * cols, data.len());
    let dict = format!("{{'descr': '|u1', 'fortran_order': False, 'shape': ({rows}, {cols}), }}");
    // magic + version + u16 length + dict + '\n', padded with spaces
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let pad = (ALIGN - unpadded % ALIGN) % ALIGN;
    let header_len = dict.len() + pad + 1;

    let mut out = Vec::with_capacity(unpadded + pad + data.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat(b' ').take(pad));
    out.push(b'\n');
    out.extend_from_slice(data);
    out
}

/// Returns `(rows, cols, data)`.
pub(crate) fn decode_u8_matrix(bytes: &[u8]) -> Result<(usize, usize, Vec<u8>)> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(GlyphError::Npy("missing NUMPY magic".into()));
    }
    let (header_len, header_start) = match bytes[6] {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(GlyphError::Npy("truncated header length".into()));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        v => return Err(GlyphError::Npy(format!("unsupported format version {v}"))),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(GlyphError::Npy("truncated header".into()));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|e| GlyphError::Npy(format!("header is not text: {e}")))?;

    let descr = dict_value(header, "descr")?;
    let descr = descr.trim_matches(|c| c == '\'' || c == '"');
    if !matches!(descr, "|u1" | "<u1" | ">u1" | "u1" | "|b1" | "|i1") {
        return Err(GlyphError::Npy(format!("unsupported dtype {descr}")));
    }
    if dict_value(header, "fortran_order")? != "False" {
        return Err(GlyphError::Npy("fortran-ordered arrays are not supported".into()));
    }
    let shape = parse_shape(dict_value(header, "shape")?)?;
    let (rows, cols) = match shape.as_slice() {
        [rows, cols] => (*rows, *cols),
        other => {
            return Err(GlyphError::Npy(format!(
                "expected a 2-D array, got {} dimensions",
                other.len()
            )))
        }
    };

    let payload = &bytes[data_start..];
    if payload.len() != rows * cols {
        return Err(GlyphError::Npy(format!(
            "payload holds {} bytes, shape ({rows}, {cols}) needs {}",
            payload.len(),
            rows * cols
        )));
    }
    Ok((rows, cols, payload.to_vec()))
}

fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let needle = format!("'{key}':");
    let start = header
        .find(&needle)
        .ok_or_else(|| GlyphError::Npy(format!("header lacks '{key}'")))?
        + needle.len();
    let rest = header[start..].trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')').map(|i| i + 1)
    } else {
        rest.find([',', '}'])
    }
    .ok_or_else(|| GlyphError::Npy(format!("unterminated value for '{key}'")))?;
    Ok(rest[..end].trim())
}

fn parse_shape(text: &str) -> Result<Vec<usize>> {
    text.trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.trim_end_matches('L')
                .parse::<usize>()
                .map_err(|e| GlyphError::Npy(format!("bad shape entry '{s}': {e}")))
        })
        .collect()
}
