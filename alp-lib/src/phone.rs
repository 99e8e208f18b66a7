pub const MIN_PHONE_DIGITS: usize = 7;
pub const MAX_PHONE_DIGITS: usize = 15;

const SEPARATORS: [char; 5] = [' ', '-', '(', ')', '.'];

fn is_separator(ch: &char) -> bool {
    SEPARATORS.contains(ch)
}

/// structural check for an international phone number. the number must carry
/// a leading country code marker followed by 7 to 15 digits, ignoring common
/// separator characters.
pub fn phone_number_valid<G>(given: G) -> bool
where
    G: AsRef<str>
{
    let mut iter = given.as_ref()
        .chars()
        .filter(|ch| !is_separator(ch));

    match iter.next() {
        Some('+') => {},
        _ => {
            return false;
        }
    }

    let mut digit_count = 0;

    for ch in iter {
        if !ch.is_ascii_digit() {
            return false;
        }

        digit_count += 1;
    }

    (MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digit_count)
}

/// drops separator characters so the number is sent to the server in a
/// uniform shape.
pub fn strip_separators<G>(given: G) -> String
where
    G: AsRef<str>
{
    given.as_ref()
        .chars()
        .filter(|ch| !is_separator(ch))
        .collect()
}
