//! Parse HTTP response header lines into ResponseHead.

use super::ResponseHead;

/// Parse collected header lines (status line first) into ResponseHead.
pub(crate) fn parse_headers(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head = ResponseHead {
                status: parse_status_line(line),
                ..Default::default()
            };
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.parse::<u64>() {
                    head.content_length = Some(n);
                }
            }
            if name.eq_ignore_ascii_case("content-type") {
                let mime = value.split(';').next().unwrap_or("").trim();
                if !mime.is_empty() {
                    head.content_type = Some(mime.to_ascii_lowercase());
                }
            }
            if name.eq_ignore_ascii_case("content-disposition") {
                head.content_disposition = Some(value.to_string());
            }
        }
    }

    head
}

/// `HTTP/1.1 200 OK` → 200. Works for `HTTP/2 200` too.
fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
