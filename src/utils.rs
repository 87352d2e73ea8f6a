

#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}


pub fn contains_ignore_case(haystack_lower: &str, needle_lower: &str) -> bool {
    !needle_lower.is_empty() && haystack_lower.contains(needle_lower)
}
