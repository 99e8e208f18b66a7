pub fn check_control<G>(
    given: G,
    max_chars: Option<usize>
) -> bool
where
    G: AsRef<str>
{
    let mut char_count = 0;

    for ch in given.as_ref().chars() {
        if ch.is_control() {
            return false;
        }

        char_count += 1;

        if let Some(max_chars) = max_chars {
            if char_count > max_chars {
                return false;
            }
        }
    }

    true
}

pub fn check_control_leading_trailing<G>(
    given: G,
    max_chars: Option<usize>
) -> bool
where
    G: AsRef<str>
{
    let given_ref = given.as_ref();

    // check for leading/trailing whitespace
    if given_ref.starts_with(char::is_whitespace) || given_ref.ends_with(char::is_whitespace) {
        return false;
    }

    check_control(given_ref, max_chars)
}
