/*!
 * Delimiter codec for packing subtitle lines into a single request.
 *
 * Most engines accept one string per call, so a window of lines is joined
 * with a reserved separator and the engine's answer is split on the same
 * separator. The separator is assumed never to occur in dialogue text.
 */

/// Separator placed between lines of a window
pub const SENTINEL: &str = "\n----\n";

/// The separator token on its own, as engines echo it back
pub const SENTINEL_TOKEN: &str = "----";

/// Join segments into a single request string
pub fn join<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(SENTINEL)
}

/// Split an engine response back into segments
///
/// Segments that consist only of the separator token are dropped, see
/// [`strip_leaked`].
pub fn split(text: &str) -> Vec<String> {
    strip_leaked(text.split(SENTINEL).map(str::to_string))
}

/// Drop segments that are nothing but the separator token
///
/// Some engines treat the separator as a phrase of its own and return it as a
/// translated line. Keeping it would shift every following line by one.
pub fn strip_leaked<I>(segments: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    segments
        .into_iter()
        .filter(|segment| !is_leaked_sentinel(segment))
        .collect()
}

/// Whether a segment is just the separator token
pub fn is_leaked_sentinel(segment: &str) -> bool {
    segment.trim() == SENTINEL_TOKEN
}
