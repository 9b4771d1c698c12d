//! chunk-size selection for the payload stream: keep the chunk count inside
//! `[payload_size/MAX_CHUNK_BYTES, MAX_SEND_CHUNKS]`.

/// default chunk size, in bytes, before the chunk-count cap kicks in.
pub const MAX_CHUNK_BYTES: u64 = 4096;
/// hard cap on the number of chunks a transfer emits.
pub const MAX_SEND_CHUNKS: u64 = 2000;

/// pick a chunk size for a payload of `payload_size` bytes.
///
/// if splitting at `MAX_CHUNK_BYTES` would emit more than `MAX_SEND_CHUNKS`
/// chunks, grow the chunk size so the count stays at `MAX_SEND_CHUNKS`.
/// otherwise use `MAX_CHUNK_BYTES` (or `payload_size / MAX_CHUNK_BYTES` if
/// that's somehow larger, matching the spec's formula verbatim).
pub fn chunk_size(payload_size: u64) -> u64 {
    if payload_size / MAX_CHUNK_BYTES > MAX_SEND_CHUNKS {
        payload_size / MAX_SEND_CHUNKS
    } else {
        std::cmp::max(MAX_CHUNK_BYTES, payload_size / MAX_CHUNK_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_payloads_use_the_default_chunk_size() {
        assert_eq!(chunk_size(1), MAX_CHUNK_BYTES);
        assert_eq!(chunk_size(MAX_CHUNK_BYTES), MAX_CHUNK_BYTES);
    }

    #[test]
    fn huge_payloads_clamp_to_the_chunk_count_cap() {
        let payload_size = MAX_CHUNK_BYTES * MAX_SEND_CHUNKS * 10;
        assert_eq!(chunk_size(payload_size), payload_size / MAX_SEND_CHUNKS);
        assert_eq!(chunk_size(payload_size), 40_960);
    }

    #[test]
    fn chunk_size_is_always_positive() {
        for n in [1, 2, 100, 4095, 4096, 4097, u64::from(u32::MAX)] {
            assert!(chunk_size(n) > 0);
        }
    }

    #[test]
    fn chunk_count_never_exceeds_the_cap_plus_one() {
        for payload_size in [1u64, 4096, 1_000_000, MAX_CHUNK_BYTES * MAX_SEND_CHUNKS * 50] {
            let size = chunk_size(payload_size);
            let full_chunks = payload_size / size;
            // +1 accounts for a final short chunk (EOF read).
            assert!(full_chunks + 1 <= MAX_SEND_CHUNKS + 1);
        }
    }
}
