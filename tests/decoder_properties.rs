// tests/decoder_properties.rs

use proptest::prelude::*;
use serde_json::json;

use org_node_e2e::log::{DecodeBuffer, LogRecord};

fn severity() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("DEBUG".to_string()),
        Just("INFO".to_string()),
        Just("WARN".to_string()),
        Just("ERROR".to_string()),
        "[A-Z]{3,8}",
    ]
}

// Messages include quotes, backslashes, unicode and braces so splits land
// inside escape sequences and multi-byte characters.
fn message() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 \"\\\\{}:>\u{e9}\u{1f980}-]{0,60}"
}

fn record_line() -> impl Strategy<Value = String> {
    (severity(), message(), any::<u32>()).prop_map(|(sev, msg, n)| {
        format!(
            "{}\n",
            json!({ "severity": sev, "message": msg, "seq": n, "nested": { "k": [n, "v"] } })
        )
    })
}

fn feed_split(data: &[u8], cuts: &[usize]) -> Vec<LogRecord> {
    let mut cuts: Vec<usize> = cuts.iter().map(|c| c % (data.len() + 1)).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut buf = DecodeBuffer::new();
    let mut out = Vec::new();
    let mut start = 0;
    for cut in cuts.into_iter().chain(std::iter::once(data.len())) {
        for r in buf.feed(&data[start..cut]) {
            out.push(r.expect("valid record"));
        }
        start = cut;
    }
    assert_eq!(buf.pending_len(), 0, "nothing may stay buffered");
    out
}

proptest! {
    #[test]
    fn one_record_split_anywhere_decodes_identically(
        line in record_line(),
        cuts in proptest::collection::vec(any::<usize>(), 0..8),
    ) {
        let whole = feed_split(line.as_bytes(), &[]);
        let split = feed_split(line.as_bytes(), &cuts);
        prop_assert_eq!(whole.len(), 1);
        prop_assert_eq!(split, whole);
    }

    #[test]
    fn many_records_keep_order_under_any_split(
        lines in proptest::collection::vec(record_line(), 1..12),
        cuts in proptest::collection::vec(any::<usize>(), 0..24),
    ) {
        let data: String = lines.concat();
        let expected: Vec<LogRecord> = lines
            .iter()
            .map(|l| serde_json::from_str(l.trim_end()).unwrap())
            .collect();

        let got = feed_split(data.as_bytes(), &cuts);
        prop_assert_eq!(got, expected);
    }
}
