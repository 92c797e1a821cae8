//! Rolling key cache.
//!
//! Encoder and decoder each keep one [`RollingCache`] per top-level value.
//! The first time a cacheable string goes by it is written literally and
//! assigned the next slot; later occurrences are written as a two-character
//! code, `^` followed by `char(33 + slot)`. When every slot is taken the
//! table is cleared and numbering starts over. Both sides apply exactly the
//! same rules in the same order, so they always agree on what a code means.

use std::collections::HashMap;

use crate::{SUB, TAG};

/// A string is cacheable when it is at least this long.
pub const MIN_CACHEABLE_LEN: usize = 3;
/// Number of slots before the table resets.
pub const CAPACITY: usize = 96;
/// Code point of the character for slot 0 (`!`).
pub const FIRST_ORD: u32 = 33;

/// Whether `s` takes part in caching at this position.
///
/// Map keys of sufficient length are always cacheable. Elsewhere only tag
/// strings (`~#tag`), symbols (`~$`) and keywords (`~:`) are.
pub fn is_cacheable(s: &str, as_map_key: bool) -> bool {
    if s.len() < MIN_CACHEABLE_LEN || is_code(s) {
        return false;
    }
    as_map_key || s.starts_with(TAG) || s.starts_with("~$") || s.starts_with("~:")
}

/// Whether `s` has the shape of a cache code.
pub fn is_code(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(SUB), Some(c), None) if c as u32 >= FIRST_ORD
    )
}

fn code_for(slot: usize) -> String {
    debug_assert!(slot < CAPACITY, "slot {slot} out of range");
    let ch = char::from(FIRST_ORD as u8 + slot as u8);
    let mut code = String::with_capacity(1 + ch.len_utf8());
    code.push(SUB);
    code.push(ch);
    code
}

fn slot_of(code: &str) -> Option<usize> {
    let ch = code.chars().nth(1)?;
    (ch as u32).checked_sub(FIRST_ORD).map(|slot| slot as usize)
}

#[derive(Debug, Default, Clone)]
pub struct RollingCache {
    /// Slot → cached string.
    entries: Vec<String>,
    /// Cached string → slot.
    lookup: HashMap<String, usize>,
}

impl RollingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of occupied slots.
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.lookup.clear();
    }

    fn insert(&mut self, s: &str) {
        if self.entries.len() == CAPACITY {
            tracing::trace!(capacity = CAPACITY, "rolling cache full, resetting");
            self.clear();
        }
        self.lookup.insert(s.to_owned(), self.entries.len());
        self.entries.push(s.to_owned());
    }

    /// Encoder side: returns the code for an already-seen cacheable string,
    /// otherwise registers it (if cacheable) and returns it unchanged.
    pub fn encode(&mut self, s: String, as_map_key: bool) -> String {
        if !is_cacheable(&s, as_map_key) {
            return s;
        }
        if let Some(&slot) = self.lookup.get(&s) {
            return code_for(slot);
        }
        self.insert(&s);
        s
    }

    /// Decoder side: resolves a code to the string it stands for, or
    /// registers a literal cacheable string exactly as [`encode`] would.
    ///
    /// A code whose slot is empty is returned unchanged.
    ///
    /// [`encode`]: RollingCache::encode
    pub fn decode(&mut self, s: &str, as_map_key: bool) -> String {
        if is_code(s) {
            return match slot_of(s).and_then(|slot| self.entries.get(slot)) {
                Some(cached) => cached.clone(),
                None => s.to_owned(),
            };
        }
        if is_cacheable(s, as_map_key) && !self.lookup.contains_key(s) {
            self.insert(s);
        }
        s.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_use_is_literal_then_coded() {
        let mut cache = RollingCache::new();
        assert_eq!(cache.encode("~:foo".into(), false), "~:foo");
        assert_eq!(cache.encode("~:foo".into(), false), "^!");
        assert_eq!(cache.encode("name".into(), true), "name");
        assert_eq!(cache.encode("name".into(), true), "^\"");
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn short_and_non_key_strings_pass_through() {
        let mut cache = RollingCache::new();
        assert_eq!(cache.encode("ab".into(), true), "ab");
        assert_eq!(cache.encode("hello".into(), false), "hello");
        assert_eq!(cache.encode("hello".into(), false), "hello");
        assert_eq!(cache.encode("~#set".into(), false), "~#set");
        assert_eq!(cache.encode("~$sym".into(), false), "~$sym");
        assert_eq!(cache.size(), 2);
    }

    #[test]
    fn codes_are_recognized_but_never_cached() {
        assert!(is_code("^!"));
        assert!(is_code("^~"));
        assert!(!is_code("^ "));
        assert!(!is_code("^!!"));
        assert!(!is_code("~!"));
        assert!(!is_cacheable("^!", true));
    }

    #[test]
    fn decoder_mirrors_encoder() {
        let mut enc = RollingCache::new();
        let mut dec = RollingCache::new();
        for s in ["~:kw", "key", "~:kw", "key", "~#point", "~#point"] {
            let as_key = !s.starts_with('~');
            let wire = enc.encode(s.to_owned(), as_key);
            assert_eq!(dec.decode(&wire, as_key), s);
        }
        assert_eq!(enc.size(), dec.size());
    }

    #[test]
    fn unknown_code_passes_through() {
        let mut dec = RollingCache::new();
        assert_eq!(dec.decode("^!", false), "^!");
        assert!(dec.is_empty());
    }

    #[test]
    fn resets_after_capacity() {
        let mut cache = RollingCache::new();
        for i in 0..CAPACITY {
            cache.encode(format!("key{i}"), true);
        }
        assert_eq!(cache.size(), CAPACITY);
        assert_eq!(cache.encode("key0".into(), true), "^!");

        assert_eq!(cache.encode("overflow".into(), true), "overflow");
        assert_eq!(cache.size(), 1);
        assert_eq!(cache.encode("overflow".into(), true), "^!");
        assert_eq!(cache.encode("key0".into(), true), "key0");
    }

    #[test]
    fn codes_span_bang_to_u0080() {
        assert_eq!(code_for(0), "^!");
        assert_eq!(code_for(CAPACITY - 1), "^\u{80}");
        assert_eq!(slot_of(&code_for(CAPACITY - 1)), Some(CAPACITY - 1));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of range")]
    fn slot_past_capacity_is_a_bug() {
        let _ = code_for(CAPACITY);
    }
}
