/// Number of hex characters of the SHA-256 digest prefixed to stored filenames.
pub const DIGEST_PREFIX_LEN: usize = 12;

/// Upper bound on a single path segment, in bytes.
pub const MAX_PATH_SEGMENT_LEN: usize = 200;
