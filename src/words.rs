//! Currency amounts as English words and as grouped numerals.
//!
//! Words follow the short scale (thousand, million, billion, ...) with no
//! "and": `105` reads "One Hundred Five".

const ONES: [&str; 10] = ["", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine"];
const TEENS: [&str; 10] = [
    "Ten", "Eleven", "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];
const TENS: [&str; 10] = ["", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety"];

// One entry per base-1000 chunk of a u64.
const SCALES: [&str; 7] = ["", " Thousand", " Million", " Billion", " Trillion", " Quadrillion", " Quintillion"];

/// Spell out `n` in English words, e.g. `5000` -> "Five Thousand".
///
/// Zero chunks are skipped entirely, so `1_000_005` is "One Million Five".
pub fn to_words(n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }

    let mut groups: Vec<String> = Vec::new();
    let mut rest = n;
    let mut scale = 0;
    while rest > 0 {
        let chunk = (rest % 1000) as u16;
        if chunk != 0 {
            groups.push(format!("{}{}", below_thousand(chunk), SCALES[scale]));
        }
        rest /= 1000;
        scale += 1;
    }
    groups.reverse();
    groups.join(" ")
}

fn below_thousand(n: u16) -> String {
    let n = usize::from(n);
    match n {
        0 => String::new(),
        1..=9 => ONES[n].to_string(),
        10..=19 => TEENS[n - 10].to_string(),
        20..=99 => {
            let unit = n % 10;
            if unit == 0 {
                TENS[n / 10].to_string()
            } else {
                format!("{} {}", TENS[n / 10], ONES[unit])
            }
        }
        _ => {
            let hundreds = format!("{} Hundred", ONES[n / 100]);
            match n % 100 {
                0 => hundreds,
                rem => format!("{} {}", hundreds, below_thousand(rem as u16)),
            }
        }
    }
}

/// Largest amount whose cents are exact in an `f64` (100 * 10^13 < 2^53).
pub const MAX_AMOUNT: f64 = 1e13;

/// Round a non-negative amount to whole cents.
///
/// Callers keep `amount` within `0..=MAX_AMOUNT`; outside it the cast
/// saturates.
pub fn to_cents(amount: f64) -> u64 {
    (amount * 100.0).round() as u64
}

/// Spell an amount the way the agreement shows it: words for the whole
/// part and numerals, both taken from the same rounded cents.
pub fn amount_parts(amount: f64) -> (String, String) {
    let cents = to_cents(amount);
    (to_words(cents / 100), format_cents(cents))
}

/// Format a non-negative amount with comma thousands separators.
///
/// The value is rounded to cents; the fraction is shown only when non-zero
/// and without trailing zeros (`1234567.5` -> "1,234,567.5").
pub fn format_amount(amount: f64) -> String {
    format_cents(to_cents(amount))
}

fn format_cents(cents: u64) -> String {
    let mut out = group_thousands(cents / 100);
    let frac = cents % 100;
    if frac != 0 {
        let digits = format!("{frac:02}");
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn spells_reference_amounts() {
        assert_eq!(to_words(0), "Zero");
        assert_eq!(to_words(5000), "Five Thousand");
        assert_eq!(to_words(105), "One Hundred Five");
        assert_eq!(to_words(1_000_000), "One Million");
    }

    #[test]
    fn spells_tens_and_teens() {
        assert_eq!(to_words(7), "Seven");
        assert_eq!(to_words(13), "Thirteen");
        assert_eq!(to_words(20), "Twenty");
        assert_eq!(to_words(21), "Twenty One");
        assert_eq!(to_words(99), "Ninety Nine");
        assert_eq!(to_words(110), "One Hundred Ten");
        assert_eq!(to_words(900), "Nine Hundred");
    }

    #[test]
    fn skips_zero_chunks() {
        assert_eq!(to_words(1_000_005), "One Million Five");
        assert_eq!(to_words(2_000_500), "Two Million Five Hundred");
        assert_eq!(to_words(3_000_000_000), "Three Billion");
        assert_eq!(
            to_words(1_250_999),
            "One Million Two Hundred Fifty Thousand Nine Hundred Ninety Nine"
        );
    }

    #[test]
    fn covers_the_whole_u64_range() {
        assert!(to_words(u64::MAX).starts_with("Eighteen Quintillion Four Hundred Forty Six Quadrillion"));
    }

    #[test]
    fn formats_amounts_with_separators() {
        assert_eq!(format_amount(0.0), "0");
        assert_eq!(format_amount(999.0), "999");
        assert_eq!(format_amount(5000.0), "5,000");
        assert_eq!(format_amount(1_234_567.5), "1,234,567.5");
        assert_eq!(format_amount(2_500_000.25), "2,500,000.25");
        assert_eq!(format_amount(10.999), "11");
    }

    #[test]
    fn words_and_numerals_share_the_rounding() {
        assert_eq!(amount_parts(10.999), ("Eleven".to_string(), "11".to_string()));
        assert_eq!(amount_parts(999.995), ("One Thousand".to_string(), "1,000".to_string()));
        assert_eq!(amount_parts(1500.75), ("One Thousand Five Hundred".to_string(), "1,500.75".to_string()));
    }

    #[test]
    fn max_amount_keeps_exact_cents() {
        assert_eq!(to_cents(MAX_AMOUNT), 1_000_000_000_000_000);
        assert_eq!(format_amount(MAX_AMOUNT), "10,000,000,000,000");
        assert_eq!(format_amount(MAX_AMOUNT - 0.01), "9,999,999,999,999.99");
    }

    proptest! {
        #[test]
        fn words_never_contain_digits(n in 0u64..1_000_000_000_000u64) {
            let words = to_words(n);
            prop_assert!(!words.is_empty());
            prop_assert!(!words.chars().any(|c| c.is_ascii_digit()));
            prop_assert!(!words.contains("  "));
            prop_assert_eq!(words.trim(), words.as_str());
        }
    }
}
