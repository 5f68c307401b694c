// src/utils/url.rs

//! URL helpers for item identifiers.

/// Query keys that carry a board item identifier, most specific first.
const ID_KEYS: &[&str] = &[
    "idx",
    "wr_id",
    "articleno",
    "article_no",
    "board_seq",
    "notice_id",
    "seq",
    "no",
    "id",
];

/// Extract a numeric item identifier from an item URL.
///
/// # Examples
/// ```
/// use noticewatch::utils::url::extract_item_id;
///
/// assert_eq!(
///     extract_item_id("https://infocom.ssu.ac.kr/kor/notice/undergraduate.php?idx=2931&m=v"),
///     Some(2931)
/// );
/// ```
pub fn extract_item_id(url: &str) -> Option<u64> {
    let parsed = ::url::Url::parse(url).ok()?;
    let pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(k, v)| (k.to_lowercase(), v.into_owned()))
        .collect();

    for key in ID_KEYS {
        let found = pairs
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, v)| v.parse::<u64>().ok());
        if found.is_some() {
            return found;
        }
    }

    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|last| last.parse::<u64>().ok())
}

/// Interpret a command-line target: a bare identifier or an item URL.
pub fn parse_target(arg: &str) -> Option<u64> {
    let arg = arg.trim();
    arg.parse::<u64>().ok().or_else(|| extract_item_id(arg))
}
