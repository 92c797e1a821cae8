//! Per-transport encoding options.
//!
//! The engine itself is transport-agnostic; everything that differs between
//! JSON and MessagePack output is collected in a [`TransportProfile`].

/// Wire format of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// JSON with the rolling cache enabled.
    Json,
    /// JSON without caching, for human readers.
    JsonVerbose,
    MsgPack,
}

impl Transport {
    pub fn is_json(&self) -> bool {
        matches!(self, Transport::Json | Transport::JsonVerbose)
    }
}

/// How instants and UUIDs are represented when nothing else is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarForm {
    /// `~t2024-01-01T00:00:00.000Z`, `~u<hyphenated uuid>`
    Textual,
    /// `{"~#t": millis}`, `{"~#u": [msb, lsb]}`
    Structural,
}

/// Inclusive range of integers the transport carries as native numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub min: i128,
    pub max: i128,
}

impl IntRange {
    /// Integers a double represents exactly: ±2^53.
    pub const JSON: IntRange = IntRange {
        min: -(1i128 << 53),
        max: 1i128 << 53,
    };

    /// Signed and unsigned 64-bit MessagePack integers.
    pub const MSGPACK: IntRange = IntRange {
        min: i64::MIN as i128,
        max: u64::MAX as i128,
    };

    pub fn contains(&self, i: i128) -> bool {
        self.min <= i && i <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportProfile {
    pub transport: Transport,
    pub int_range: IntRange,
    /// Write one-character tags with non-string representations through
    /// their string representation, e.g. `~t...` instead of `{"~#t": ...}`.
    pub prefer_strings: bool,
    /// Wrap a top-level scalar as `{"~#'": scalar}`.
    pub quote_scalars: bool,
    pub cache_enabled: bool,
    /// Use a handler's verbose variant when it has one.
    pub verbose: bool,
    /// Write maps as `["^ ", k, v, ...]` and tagged values as
    /// `["~#tag", rep]` instead of JSON objects.
    pub map_as_array: bool,
    pub scalar_form: ScalarForm,
}

impl TransportProfile {
    pub fn new(transport: Transport) -> Self {
        match transport {
            Transport::Json => TransportProfile {
                transport,
                int_range: IntRange::JSON,
                prefer_strings: true,
                quote_scalars: true,
                cache_enabled: true,
                verbose: false,
                map_as_array: false,
                scalar_form: ScalarForm::Textual,
            },
            Transport::JsonVerbose => TransportProfile {
                transport,
                cache_enabled: false,
                verbose: true,
                ..TransportProfile::new(Transport::Json)
            },
            Transport::MsgPack => TransportProfile {
                transport,
                int_range: IntRange::MSGPACK,
                prefer_strings: false,
                quote_scalars: false,
                cache_enabled: true,
                verbose: false,
                map_as_array: false,
                scalar_form: ScalarForm::Structural,
            },
        }
    }

    pub fn with_int_range(mut self, int_range: IntRange) -> Self {
        self.int_range = int_range;
        self
    }

    pub fn with_prefer_strings(mut self, prefer_strings: bool) -> Self {
        self.prefer_strings = prefer_strings;
        self
    }

    pub fn with_quote_scalars(mut self, quote_scalars: bool) -> Self {
        self.quote_scalars = quote_scalars;
        self
    }

    pub fn with_cache(mut self, cache_enabled: bool) -> Self {
        self.cache_enabled = cache_enabled;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_map_as_array(mut self, map_as_array: bool) -> Self {
        self.map_as_array = map_as_array;
        self
    }

    pub fn with_scalar_form(mut self, scalar_form: ScalarForm) -> Self {
        self.scalar_form = scalar_form;
        self
    }
}

impl Default for TransportProfile {
    fn default() -> Self {
        TransportProfile::new(Transport::Json)
    }
}

impl From<Transport> for TransportProfile {
    fn from(transport: Transport) -> Self {
        TransportProfile::new(transport)
    }
}
