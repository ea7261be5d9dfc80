use bitstream::{BitReader, BitWriter};

#[test]
fn writer_roundtrip_mixed() {
    let mut writer = BitWriter::new();
    writer.write_bit(true);
    writer.write_bits(0b1010, 4).unwrap();
    writer.align_to_byte();
    writer.write_u32_aligned(0xBEEF).unwrap();
    writer.write_varu32(300).unwrap();
    writer.write_vars64(-1).unwrap();
    writer.write_varu64(5).unwrap();
    writer.write_bytes_aligned(b"highway").unwrap();
    let bytes = writer.finish();

    let mut reader = BitReader::new(&bytes);
    assert!(reader.read_bit().unwrap());
    assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
    reader.align_to_byte().unwrap();
    assert_eq!(reader.read_u32_aligned().unwrap(), 0xBEEF);
    assert_eq!(reader.read_varu32().unwrap(), 300);
    assert_eq!(reader.read_vars64().unwrap(), -1);
    let len = reader.read_varu64().unwrap();
    assert_eq!(len, 5);
    assert_eq!(reader.read_bytes_aligned(7).unwrap(), b"highway");
    assert!(reader.is_empty());
}

#[test]
fn truncated_prefixes_fail_cleanly() {
    let mut writer = BitWriter::new();
    writer.write_varu64(u64::MAX).unwrap();
    writer.write_u64_aligned(7).unwrap();
    let bytes = writer.finish();

    for len in 0..bytes.len() {
        let mut reader = BitReader::new(&bytes[..len]);
        let result = reader
            .read_varu64()
            .and_then(|_| reader.read_u64_aligned());
        assert!(result.is_err(), "prefix of {len} bytes should fail");
    }
}
