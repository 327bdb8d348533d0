// src/serve/inject.rs

//! Live-reload client injection into proxied HTML.

/// Route serving the live-reload WebSocket.
pub const WS_ROUTE: &str = "/__stylesync/ws";

/// Route serving the embedded browser client.
pub const CLIENT_SCRIPT_ROUTE: &str = "/__stylesync/client.js";

/// Tag injected into proxied HTML pages.
pub const CLIENT_SCRIPT_TAG: &str = "<script src=\"/__stylesync/client.js\" async></script>";

const CLOSE_BODY: &[u8] = b"</body>";

/// Insert the client script tag before the final `</body>` (any case).
/// Documents without one get the tag appended, which browsers still execute.
pub fn inject_client_tag(html: &[u8]) -> Vec<u8> {
    let lower = html.to_ascii_lowercase();

    let mut out = Vec::with_capacity(html.len() + CLIENT_SCRIPT_TAG.len());
    match lower
        .windows(CLOSE_BODY.len())
        .rposition(|window| window == CLOSE_BODY)
    {
        Some(idx) => {
            out.extend_from_slice(&html[..idx]);
            out.extend_from_slice(CLIENT_SCRIPT_TAG.as_bytes());
            out.extend_from_slice(&html[idx..]);
        }
        None => {
            out.extend_from_slice(html);
            out.extend_from_slice(CLIENT_SCRIPT_TAG.as_bytes());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_lands_before_closing_body() {
        let html = b"<html><body><p>hi</p></body></html>";
        let out = String::from_utf8(inject_client_tag(html)).unwrap();
        assert_eq!(
            out,
            format!("<html><body><p>hi</p>{CLIENT_SCRIPT_TAG}</body></html>")
        );
    }

    #[test]
    fn closing_tag_match_is_case_insensitive() {
        let html = b"<BODY>x</BODY>";
        let out = String::from_utf8(inject_client_tag(html)).unwrap();
        assert!(out.ends_with(&format!("{CLIENT_SCRIPT_TAG}</BODY>")));
    }

    #[test]
    fn fragment_without_body_gets_tag_appended() {
        let html = b"<p>partial</p>";
        let out = String::from_utf8(inject_client_tag(html)).unwrap();
        assert_eq!(out, format!("<p>partial</p>{CLIENT_SCRIPT_TAG}"));
    }
}
