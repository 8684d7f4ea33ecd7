use std::collections::HashMap;

/// Boyer-Moore-Horspool search over byte slices.
///
/// Both directions return `None` for an empty pattern or a haystack shorter
/// than the pattern.
pub trait FastSearch<S, P> {
    fn search(&self, pattern: &P) -> Option<usize>;
    fn rsearch(&self, pattern: &P) -> Option<usize>;
}

fn skip_table(pattern: &[u8], reverse: bool) -> HashMap<u8, usize> {
    let pat_len = pattern.len();
    let mut table = HashMap::with_capacity(pat_len);
    if reverse {
        // Shift is the distance from the first byte, excluding the first byte itself.
        for (idx, b) in pattern.iter().enumerate().skip(1).rev() {
            table.insert(*b, idx);
        }
    } else {
        for (idx, b) in pattern.iter().enumerate().take(pat_len - 1) {
            table.insert(*b, pat_len - idx - 1);
        }
    }
    table
}

impl<T, O> FastSearch<T, O> for T
where
    T: AsRef<[u8]>,
    O: AsRef<[u8]>,
{
    fn search(&self, pattern: &O) -> Option<usize> {
        let space = self.as_ref();
        let pattern = pattern.as_ref();
        let (pat_len, space_len) = (pattern.len(), space.len());

        if pat_len == 0 || space_len < pat_len {
            return None;
        }

        let table = skip_table(pattern, false);
        let last = pat_len - 1;
        let mut start = 0;

        while start + pat_len <= space_len {
            let window = &space[start..start + pat_len];
            if window == pattern {
                return Some(start);
            }
            start += table.get(&window[last]).copied().unwrap_or(pat_len);
        }
        None
    }

    fn rsearch(&self, pattern: &O) -> Option<usize> {
        let space = self.as_ref();
        let pattern = pattern.as_ref();
        let (pat_len, space_len) = (pattern.len(), space.len());

        if pat_len == 0 || space_len < pat_len {
            return None;
        }

        let table = skip_table(pattern, true);
        let mut start = space_len - pat_len;

        loop {
            let window = &space[start..start + pat_len];
            if window == pattern {
                return Some(start);
            }
            let shift = table.get(&window[0]).copied().unwrap_or(pat_len);
            start = start.checked_sub(shift)?;
        }
    }
}

#[test]
fn reverse_search() {
    let space = [0, 1, 2, 3, 4, 5, 6, 7, 6, 9, 5, 6, 7, 8];
    let pat = [5];

    assert_eq!(Some(10), space.rsearch(&pat))
}

#[test]
fn search() {
    let space = [0, 1, 2, 3, 4, 5, 6, 7, 6, 9, 5, 6, 7, 8];
    let pat = [5];

    assert_eq!(Some(5), space.search(&pat))
}

#[test]
fn reverse_search_finds_last_signature() {
    let eocd = 0x06054b50u32.to_le_bytes();
    let mut space = vec![0xAA; 7];
    space.extend_from_slice(&eocd);
    space.extend_from_slice(&[0x50, 0x4b, 0x05]);
    space.extend_from_slice(&eocd);
    space.extend_from_slice(&[0; 18]);

    assert_eq!(Some(14), space.rsearch(&eocd));
    assert_eq!(Some(7), space.search(&eocd));
}

#[test]
fn repeated_prefix_pattern() {
    let space = b"PKPKPK\x05\x06PK";
    let pat = b"PK\x05\x06";

    assert_eq!(Some(4), space.search(pat));
    assert_eq!(Some(4), space.rsearch(pat));
}

#[test]
fn short_haystack_never_panics() {
    let pat = [0x50, 0x4b, 0x05, 0x06];

    assert_eq!(None, [0x50u8, 0x4b].search(&pat));
    assert_eq!(None, [0x50u8, 0x4b].rsearch(&pat));
    assert_eq!(None, Vec::<u8>::new().rsearch(&pat));
    assert_eq!(None, [1u8, 2, 3].search(&[] as &[u8; 0]));
}

#[test]
fn exact_match_at_both_ends() {
    let pat = [9u8, 8, 7];

    assert_eq!(Some(0), [9u8, 8, 7].search(&pat));
    assert_eq!(Some(0), [9u8, 8, 7].rsearch(&pat));
    assert_eq!(Some(0), [9u8, 8, 7, 1, 2].rsearch(&pat));
    assert_eq!(Some(2), [1u8, 2, 9, 8, 7].search(&pat));
}
