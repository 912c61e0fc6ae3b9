use bytes::BufMut;

/// JPEG 2000 signature box: size 12, type `jP  `, magic 0x0D0A870A
pub const JP2_SIGNATURE: [u8; 12] = [
    0x00, 0x00, 0x00, 0x0C, b'j', b'P', b' ', b' ', 0x0D, 0x0A, 0x87, 0x0A,
];

const FTYP_SIZE: u32 = 20;
const JP2_BRAND: &[u8; 4] = b"jp2 ";

/// True if the sample is already a JP2 file.
pub fn has_signature(data: &[u8]) -> bool {
    data.len() >= JP2_SIGNATURE.len() && data[..JP2_SIGNATURE.len()] == JP2_SIGNATURE
}

/// Size of the boxes `write_jp2_prefix` emits.
pub fn prefix_size(jp2h: Option<&[u8]>) -> usize {
    JP2_SIGNATURE.len() + FTYP_SIZE as usize + jp2h.map(|h| 8 + h.len()).unwrap_or(0)
}

/// Signature box, `ftyp` box and, when a decoder config is known, a `jp2h`
/// box wrapping it. The sample payload follows.
pub fn write_jp2_prefix(out: &mut Vec<u8>, jp2h: Option<&[u8]>) {
    out.put_slice(&JP2_SIGNATURE);

    out.put_u32(FTYP_SIZE);
    out.put_slice(b"ftyp");
    out.put_slice(JP2_BRAND);
    out.put_u32(0);
    out.put_slice(JP2_BRAND);

    if let Some(header) = jp2h {
        out.put_u32(8 + header.len() as u32);
        out.put_slice(b"jp2h");
        out.put_slice(header);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_prefix_without_header() {
        let mut out = Vec::new();
        write_jp2_prefix(&mut out, None);
        assert_eq!(out.len(), 32);
        assert!(has_signature(&out));
        assert_eq!(&out[12..16], &[0, 0, 0, 20]);
        assert_eq!(&out[16..24], b"ftypjp2 ");
        assert_eq!(&out[24..28], &[0, 0, 0, 0]);
        assert_eq!(&out[28..32], b"jp2 ");
    }

    #[test]
    fn test_prefix_with_header() {
        let ihdr = [0xAAu8; 22];
        let mut out = Vec::new();
        write_jp2_prefix(&mut out, Some(&ihdr));
        assert_eq!(out.len(), prefix_size(Some(&ihdr)));
        assert_eq!(&out[32..36], &30u32.to_be_bytes());
        assert_eq!(&out[36..40], b"jp2h");
        assert_eq!(&out[40..], &ihdr);
    }

    #[test]
    fn test_signature_detection() {
        assert!(!has_signature(&[0xFF, 0x4F, 0xFF, 0x51]));
        assert!(!has_signature(&JP2_SIGNATURE[..8]));
    }
}
