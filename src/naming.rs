use std::collections::HashSet;

/// Alphanumeric runs at least this long are considered machine noise
/// (timestamps, hashes) and dropped from the name.
const MAX_TOKEN_RUN: usize = 10;
/// All-digit tokens at least this long are dates or serial numbers.
const MAX_DIGIT_TOKEN: usize = 6;
/// Name used when nothing readable survives normalization.
const FALLBACK_NAME: &str = "screen";

/// Derives a short, readable file name from a raw screenshot name.
///
/// Camera and screenshot tools produce names like
/// `Screenshot_20251215_Home.PNG`; the timestamp and serial junk is
/// stripped and the result is lowercased with a `.jpg` extension. When
/// nothing readable remains the name falls back to `screen.jpg`.
pub fn normalize(filename: &str) -> String {
    let stem = match filename.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => filename,
    };

    let tokens: Vec<&str> = stem
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .filter(|t| t.len() < MAX_TOKEN_RUN)
        .filter(|t| !(t.len() >= MAX_DIGIT_TOKEN && t.chars().all(|c| c.is_ascii_digit())))
        .collect();

    let joined = tokens.join("_");
    let trimmed = joined.trim_matches(|c: char| c.is_ascii_digit() || c == '_');

    let name = if trimmed.is_empty() {
        FALLBACK_NAME
    } else {
        trimmed
    };
    format!("{}.jpg", name.to_ascii_lowercase())
}

/// Makes `name` unique against the already taken names by appending a
/// numeric suffix before the extension.
pub fn dedup(name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(name) {
        return name.to_owned();
    }

    let (stem, ext) = name.rsplit_once('.').unwrap_or((name, "jpg"));
    for n in 2.. {
        let candidate = format!("{stem}_{n}.{ext}");
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
    unreachable!("some suffix is always free")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timestamps_are_stripped() {
        assert_eq!("home.jpg", normalize("Screenshot_20251215_Home.PNG"));
        assert_eq!("img_cart.jpg", normalize("IMG_20240101_123456_cart.jpg"));
    }

    #[test]
    fn plain_names_only_change_case_and_extension() {
        assert_eq!("settings.jpg", normalize("Settings.png"));
        assert_eq!("login_form.jpg", normalize("login-form.jpg"));
    }

    #[test]
    fn unreadable_names_fall_back() {
        assert_eq!("screen.jpg", normalize("12345.png"));
        assert_eq!("screen.jpg", normalize("20251215234501.jpg"));
        assert_eq!("screen.jpg", normalize("___.jpg"));
    }

    #[test]
    fn long_hash_runs_are_dropped() {
        assert_eq!("profile.jpg", normalize("profile_a3f8c2d9e1b4.png"));
    }

    #[test]
    fn dedup_appends_counting_suffix() {
        let mut taken = HashSet::new();
        assert_eq!("home.jpg", dedup("home.jpg", &taken));

        taken.insert("home.jpg".to_owned());
        assert_eq!("home_2.jpg", dedup("home.jpg", &taken));

        taken.insert("home_2.jpg".to_owned());
        assert_eq!("home_3.jpg", dedup("home.jpg", &taken));
    }
}
