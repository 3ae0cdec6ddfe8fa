/// Decode a feed body and drop the C0 and C1 control characters
/// (`U+0000..=U+001F`, `U+007F..=U+009F`) that XML parsers refuse.
///
/// Invalid UTF-8 is replaced rather than rejected, so this never fails.
pub fn sanitize(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .chars()
        .filter(|c| !is_control(*c))
        .collect()
}

fn is_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{1f}' | '\u{7f}'..='\u{9f}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_ranges() {
        let raw = "a\u{0}b\u{1f}c\u{7f}d\u{85}e\u{9f}f\tg\r\nh".as_bytes();
        assert_eq!(sanitize(raw), "abcdefgh");
    }

    #[test]
    fn keeps_everything_else_in_order() {
        let raw = "<title>Caf\u{e9} \u{a0}\u{4e2d}\u{6587} \u{1f6b2}</title>";
        assert_eq!(sanitize(raw.as_bytes()), raw);
    }

    #[test]
    fn is_idempotent() {
        let inputs: [&[u8]; 4] = [
            b"",
            b"\x00\x01plain\x1f",
            "x\u{80}y\u{9f}z\u{a0}".as_bytes(),
            b"broken \xff utf8 \x0b",
        ];
        for raw in inputs {
            let once = sanitize(raw);
            assert_eq!(sanitize(once.as_bytes()), once);
            assert!(!once.chars().any(is_control));
        }
    }

    #[test]
    fn boundaries_are_exact() {
        for c in ['\u{20}', '\u{7e}', '\u{a0}'] {
            assert!(!is_control(c), "{c:?}");
        }
        for c in ['\u{00}', '\u{1f}', '\u{7f}', '\u{9f}'] {
            assert!(is_control(c), "{c:?}");
        }
    }
}
