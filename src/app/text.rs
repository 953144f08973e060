/// Strips ANSI escape sequences and stray control characters from provider
/// replies before they reach the viewport. Newlines and tabs survive;
/// carriage returns normalize to newlines.
pub(super) fn sanitize_reply_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_escape = false;
    let mut in_csi = false;
    let mut last_was_cr = false;

    for ch in text.chars() {
        if last_was_cr {
            last_was_cr = false;
            // CRLF already emitted its newline.
            if ch == '\n' {
                continue;
            }
        }
        if in_escape {
            if in_csi {
                // CSI sequence terminates at bytes in range 0x40..0x7E.
                if ('@'..='~').contains(&ch) {
                    in_escape = false;
                    in_csi = false;
                }
                continue;
            }
            if ch == '[' {
                in_csi = true;
                continue;
            }
            in_escape = false;
            continue;
        }

        if ch == '\u{1b}' {
            in_escape = true;
            continue;
        }

        if ch == '\r' {
            out.push('\n');
            last_was_cr = true;
            continue;
        }

        if ch.is_control() && ch != '\n' && ch != '\t' {
            continue;
        }

        out.push(ch);
    }

    out
}
