use serde::Serializer;

/// Hex dump of at most `max_len` bytes, 16 per row, offsets relative to the
/// start of `bytes`.
pub fn hex_dump(bytes: &[u8], max_len: usize) -> String {
    let shown = &bytes[..bytes.len().min(max_len)];
    let mut out = String::new();
    for (i, chunk) in shown.chunks(16).enumerate() {
        let hexs = chunk
            .iter()
            .map(|b| hex::encode([*b]))
            .collect::<Vec<_>>()
            .join(" ");
        let ascii: String = chunk
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect();
        out.push_str(&format!("{:08x}  {:<47}  |{}|\n", i * 16, hexs, ascii));
    }
    if shown.len() < bytes.len() {
        out.push_str(&format!("... {} more bytes\n", bytes.len() - shown.len()));
    }
    out
}

pub(crate) fn serialize_hex<S, T>(bytes: &T, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    s.serialize_str(&hex::encode(bytes.as_ref()))
}
