#![no_main]

use codec::{decode_changeset, decode_relation, decode_way, CodecLimits};
use libfuzzer_sys::fuzz_target;
use wire::PayloadKind;

fuzz_target!(|data: &[u8]| {
    let limits = CodecLimits::for_testing();
    let wire_limits = wire::Limits::for_testing();

    // Raw input almost never passes the hash check, so also frame it.
    let _ = decode_changeset(data, &wire_limits, &limits);
    if let Ok(framed) = wire::encode_payload(PayloadKind::Changeset, data) {
        let _ = decode_changeset(&framed, &wire_limits, &limits);
    }

    // Fragments with minor histories, against a small fixed table.
    let strings = vec![String::new(), "highway".to_string(), "stop".to_string()];
    let _ = decode_way(data, &strings, None, &limits);
    let _ = decode_relation(data, &strings, None, &limits);
});
