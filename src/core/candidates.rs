// src/core/candidates.rs

/// Builds the list of hostnames to test.
///
/// With suffixes, every wordlist entry is combined with every suffix as
/// `entry.suffix`, entry-major. Duplicates are kept. Without suffixes the
/// wordlist entries are already full hostnames and are returned unchanged.
pub fn permute_domains(wordlist: &[String], suffixes: &[String]) -> Vec<String> {
    if suffixes.is_empty() {
        return wordlist.to_vec();
    }

    let mut domains = Vec::with_capacity(wordlist.len() * suffixes.len());
    for guess in wordlist {
        for suffix in suffixes {
            domains.push(format!("{}.{}", guess, suffix));
        }
    }
    domains
}
