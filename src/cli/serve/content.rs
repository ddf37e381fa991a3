//! Client script injection into proxied HTML.

/// Inject the client script tag if the response is HTML.
pub fn maybe_inject_client(body: Vec<u8>, content_type: &str) -> Vec<u8> {
    if is_html(content_type) {
        inject_client_script(&body, crate::embed::serve::client_tag().as_bytes())
    } else {
        body
    }
}

pub fn is_html(content_type: &str) -> bool {
    content_type
        .trim_start()
        .get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("text/html"))
}

/// Inject `script` before the last `</body>` tag
fn inject_client_script(content: &[u8], script: &[u8]) -> Vec<u8> {
    // Byte pattern for </body> - most templates use lowercase
    const PATTERN: &[u8] = b"</body>";

    let mut result = Vec::with_capacity(content.len() + script.len());

    // Reverse search for </body> using byte windows
    if let Some(pos) = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
    {
        result.extend_from_slice(&content[..pos]);
        result.extend_from_slice(script);
        result.extend_from_slice(&content[pos..]);
        return result;
    }

    // No </body> found, append to end (browsers handle this gracefully)
    result.extend_from_slice(content);
    result.extend_from_slice(script);
    result
}
