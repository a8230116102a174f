/// Case- and whitespace-insensitive normalization, so "Fix  Title" and
/// "fix title" identify the same underlying problem.
fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable identity of "the same underlying problem" across repeated
/// detections: a blake3 hash over the normalized identifying fields.
pub fn proposal_fingerprint(
    website_id: &str,
    service_key: &str,
    kind: &str,
    target: &str,
) -> String {
    let identity = format!(
        "{}|{}|{}|{}",
        normalize(website_id),
        normalize(service_key),
        normalize(kind),
        normalize(target)
    );
    blake3::hash(identity.as_bytes()).to_hex().to_string()
}
