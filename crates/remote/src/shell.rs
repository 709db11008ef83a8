//! POSIX 셸 인자 인용

/// 값을 작은따옴표로 감싸 셸이 그대로 한 인자로 읽도록 합니다.
///
/// 값 안의 `'`는 `'\''`로 바꿉니다.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_plain_value() {
        assert_eq!(quote("/var/log/app.log"), "'/var/log/app.log'");
    }

    #[test]
    fn empty_value() {
        assert_eq!(quote(""), "''");
    }

    #[test]
    fn escapes_single_quote() {
        assert_eq!(quote("it's"), "'it'\\''s'");
    }

    #[test]
    fn metacharacters_stay_inside_quotes() {
        assert_eq!(quote("$(rm -rf /); `x` *"), "'$(rm -rf /); `x` *'");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        /// 작은따옴표 밖에 나오는 문자는 이스케이프된 `'`뿐이어야 함
        fn unquote(quoted: &str) -> Option<String> {
            let mut out = String::new();
            let mut chars = quoted.chars().peekable();
            let mut inside = false;
            while let Some(c) = chars.next() {
                match (inside, c) {
                    (false, '\'') => inside = true,
                    (true, '\'') => inside = false,
                    (true, c) => out.push(c),
                    (false, '\\') => match chars.next() {
                        Some('\'') => out.push('\''),
                        _ => return None,
                    },
                    (false, _) => return None,
                }
            }
            (!inside).then_some(out)
        }

        proptest! {
            #[test]
            fn quote_round_trips(value in ".*") {
                prop_assert_eq!(unquote(&quote(&value)), Some(value));
            }
        }
    }
}
