use crate::validation::{check_control, check_control_leading_trailing};

pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 64;

pub const MIN_PASSWORD_CHARS: usize = 2;
pub const MAX_PASSWORD_CHARS: usize = 64;

pub const MAX_COMPUTER_NAME_CHARS: usize = 64;

pub fn username_valid(given: &str) -> bool {
    let char_count = given.chars().count();

    char_count >= MIN_USERNAME_CHARS && check_control(given, Some(MAX_USERNAME_CHARS))
}

pub fn password_valid(given: &str) -> bool {
    let char_count = given.chars().count();

    (MIN_PASSWORD_CHARS..=MAX_PASSWORD_CHARS).contains(&char_count)
}

pub fn computer_name_valid(given: &str) -> bool {
    !given.is_empty() && check_control_leading_trailing(given, Some(MAX_COMPUTER_NAME_CHARS))
}

pub fn code_valid(given: &str) -> bool {
    !given.is_empty() && given.chars().all(|ch| ch.is_ascii_digit())
}
