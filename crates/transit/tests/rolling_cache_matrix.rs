use proptest::prelude::*;
use transit::cache::{is_cacheable, is_code, CAPACITY, FIRST_ORD, MIN_CACHEABLE_LEN};
use transit::{Reader, RollingCache, Transport, Value, Writer};

#[test]
fn cacheability_matrix() {
    let cases = [
        ("ab", true, false),
        ("abc", true, true),
        ("abc", false, false),
        ("~:a", false, true),
        ("~$a", false, true),
        ("~#a", false, true),
        ("~ia", false, false),
        ("^!", true, false),
        ("^ ", true, false),
    ];
    for (s, as_map_key, expected) in cases {
        assert_eq!(is_cacheable(s, as_map_key), expected, "{s:?} key={as_map_key}");
    }
    assert_eq!(MIN_CACHEABLE_LEN, 3);
    assert!(is_code("^!"));
    assert!(is_code("^~"));
    assert!(!is_code("^ "));
    assert!(!is_code("^!!"));
}

#[test]
fn codes_follow_slot_order() {
    let mut cache = RollingCache::new();
    let keys: Vec<String> = (0..CAPACITY).map(|i| format!("key{i:03}")).collect();
    for key in &keys {
        assert_eq!(cache.encode(key.clone(), true), *key);
    }
    for (slot, key) in keys.iter().enumerate() {
        let code = cache.encode(key.clone(), true);
        let expected = char::from_u32(FIRST_ORD + slot as u32).unwrap();
        assert_eq!(code, format!("^{expected}"), "slot {slot}");
    }
    assert_eq!(cache.size(), CAPACITY);
}

#[test]
fn full_cache_resets_on_next_insert() {
    let mut enc = RollingCache::new();
    let mut dec = RollingCache::new();
    for i in 0..CAPACITY {
        let key = format!("key{i:03}");
        let wire = enc.encode(key.clone(), true);
        assert_eq!(dec.decode(&wire, true), key);
    }
    assert_eq!(enc.size(), CAPACITY);

    assert_eq!(enc.encode("overflow".into(), true), "overflow");
    assert_eq!(dec.decode("overflow", true), "overflow");
    assert_eq!(enc.size(), 1);
    assert_eq!(dec.size(), 1);

    // evicted entries are written literally again
    assert_eq!(enc.encode("key000".into(), true), "key000");
    assert_eq!(enc.encode("overflow".into(), true), "^!");
    assert_eq!(dec.decode("key000", true), "key000");
    assert_eq!(dec.decode("^!", true), "overflow");
}

fn cache_input() -> impl Strategy<Value = (String, bool)> {
    ("(~[#:$i])?[a-c]{0,3}", any::<bool>())
}

proptest! {
    #[test]
    fn encoder_and_decoder_caches_stay_in_step(
        inputs in prop::collection::vec(cache_input(), 0..400)
    ) {
        let mut enc = RollingCache::new();
        let mut dec = RollingCache::new();
        for (s, as_map_key) in inputs {
            let wire = enc.encode(s.clone(), as_map_key);
            prop_assert!(wire.len() <= s.len().max(3));
            prop_assert_eq!(dec.decode(&wire, as_map_key), s);
            prop_assert_eq!(enc.size(), dec.size());
        }
    }
}

#[test]
fn every_top_level_value_starts_with_an_empty_cache() {
    let row = Value::from(vec![Value::keyword("repeat"), Value::keyword("repeat")]);
    let mut writer = Writer::new(Transport::Json, Vec::new());
    writer.write(&row).unwrap();
    writer.write(&row).unwrap();
    let text = String::from_utf8(writer.into_inner()).unwrap();
    assert_eq!(text, "[\"~:repeat\",\"^!\"]\n[\"~:repeat\",\"^!\"]\n");

    let values: Vec<Value> = Reader::new(Transport::Json, text.as_bytes())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(values, vec![row.clone(), row]);
}

#[test]
fn shared_cache_spans_values() {
    let encoder = transit::Encoder::new(Transport::MsgPack);
    let decoder = transit::Decoder::new();
    let mut enc_cache = RollingCache::new();
    let mut dec_cache = RollingCache::new();

    let first = encoder
        .encode_with_cache(&Value::keyword("shared"), &mut enc_cache)
        .unwrap();
    let second = encoder
        .encode_with_cache(&Value::keyword("shared"), &mut enc_cache)
        .unwrap();
    assert_eq!(first.as_str(), Some("~:shared"));
    assert_eq!(second.as_str(), Some("^!"));

    for node in [first, second] {
        assert_eq!(
            decoder.decode_with_cache(&node, &mut dec_cache).unwrap(),
            Value::keyword("shared")
        );
    }
}
