use bitstream::{BitReader, BitWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Bit(bool),
    Bits { bits: u8, value: u64 },
    Align,
    U8(u8),
    U32(u32),
    U64(u64),
    VarU32(u32),
    VarU64(u64),
    VarS64(i64),
    Bytes(Vec<u8>),
}

fn mask_value(bits: u8, value: u64) -> u64 {
    if bits >= 64 {
        value
    } else {
        let mask = (1u64 << bits) - 1;
        value & mask
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Bit),
        (1u8..=64, any::<u64>()).prop_map(|(bits, value)| Op::Bits {
            bits,
            value: mask_value(bits, value),
        }),
        Just(Op::Align),
        any::<u8>().prop_map(Op::U8),
        any::<u32>().prop_map(Op::U32),
        any::<u64>().prop_map(Op::U64),
        any::<u32>().prop_map(Op::VarU32),
        any::<u64>().prop_map(Op::VarU64),
        any::<i64>().prop_map(Op::VarS64),
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Op::Bytes),
    ]
}

const fn is_aligned_op(op: &Op) -> bool {
    !matches!(op, Op::Bit(_) | Op::Bits { .. } | Op::Align)
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut writer = BitWriter::new();

        for op in &ops {
            if is_aligned_op(op) {
                writer.align_to_byte();
            }
            match op {
                Op::Bit(b) => writer.write_bit(*b),
                Op::Bits { bits, value } => writer.write_bits(*value, *bits).unwrap(),
                Op::Align => writer.align_to_byte(),
                Op::U8(v) => writer.write_u8_aligned(*v).unwrap(),
                Op::U32(v) => writer.write_u32_aligned(*v).unwrap(),
                Op::U64(v) => writer.write_u64_aligned(*v).unwrap(),
                Op::VarU32(v) => writer.write_varu32(*v).unwrap(),
                Op::VarU64(v) => writer.write_varu64(*v).unwrap(),
                Op::VarS64(v) => writer.write_vars64(*v).unwrap(),
                Op::Bytes(v) => writer.write_bytes_aligned(v).unwrap(),
            }
        }

        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);

        for op in &ops {
            if is_aligned_op(op) {
                reader.align_to_byte().unwrap();
            }
            match op {
                Op::Bit(b) => {
                    prop_assert_eq!(reader.read_bit().unwrap(), *b);
                }
                Op::Bits { bits, value } => {
                    prop_assert_eq!(reader.read_bits(*bits).unwrap(), *value);
                }
                Op::Align => reader.align_to_byte().unwrap(),
                Op::U8(v) => {
                    prop_assert_eq!(reader.read_u8_aligned().unwrap(), *v);
                }
                Op::U32(v) => {
                    prop_assert_eq!(reader.read_u32_aligned().unwrap(), *v);
                }
                Op::U64(v) => {
                    prop_assert_eq!(reader.read_u64_aligned().unwrap(), *v);
                }
                Op::VarU32(v) => {
                    prop_assert_eq!(reader.read_varu32().unwrap(), *v);
                }
                Op::VarU64(v) => {
                    prop_assert_eq!(reader.read_varu64().unwrap(), *v);
                }
                Op::VarS64(v) => {
                    prop_assert_eq!(reader.read_vars64().unwrap(), *v);
                }
                Op::Bytes(v) => {
                    prop_assert_eq!(reader.read_bytes_aligned(v.len()).unwrap(), v.as_slice());
                }
            }
        }
    }
}
