/// Maximum number of redirect hops followed when resolving a place title.
///
/// This is a fixed bound, not cycle detection: a longer chain resolves to
/// whatever title remains after the last hop.
pub const REDIRECT_MAX_HOPS: u32 = 3;

/// Progress update interval (tick every N pages)
pub const PROGRESS_INTERVAL: u64 = 100_000;

/// Word-index id lists longer than this are reported as suspicious.
pub const WORD_IDS_WARN_COUNT: usize = 400;

/// Rendered word-index id lists longer than this are dropped from the output.
pub const WORD_IDS_MAX_LEN: usize = 8192;

/// Rendered alternate-name lists longer than this are emptied in the output.
pub const ALT_NAMES_MAX_LEN: usize = 4096;

/// Bump when the layout of the cached place catalog changes.
pub const CACHE_VERSION: u32 = 1;

pub const PLACE_NAMESPACE: &str = "Place:";
pub const PERSON_NAMESPACE: &str = "Person:";
pub const FAMILY_NAMESPACE: &str = "Family:";
pub const MYSOURCE_NAMESPACE: &str = "MySource:";
