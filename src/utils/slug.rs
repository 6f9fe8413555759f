use rand::Rng;

const FALLBACK_SLUG: &str = "product";
/// Leaves room for the random suffix inside the 255-character column.
const MAX_BASE_LEN: usize = 200;
const SUFFIX_LEN: usize = 6;
const SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

fn fold_accent(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'ç' => "c",
        'è' | 'é' | 'ê' | 'ë' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'ù' | 'ú' | 'û' | 'ü' => "u",
        'ý' | 'ÿ' => "y",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}

/// Lowercase, accent-folded, `[a-z0-9]` runs joined by single dashes.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let piece = match fold_accent(c) {
            Some(folded) => folded,
            None if c.is_ascii_alphanumeric() => {
                push_piece(&mut slug, &mut pending_dash, c.encode_utf8(&mut [0; 4]));
                continue;
            }
            None => {
                pending_dash = true;
                continue;
            }
        };
        push_piece(&mut slug, &mut pending_dash, piece);
    }

    // Output is ASCII, so byte truncation cannot split a character.
    slug.truncate(MAX_BASE_LEN);
    let slug = slug.trim_end_matches('-').to_string();

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

fn push_piece(slug: &mut String, pending_dash: &mut bool, piece: &str) {
    if *pending_dash && !slug.is_empty() {
        slug.push('-');
    }
    *pending_dash = false;
    slug.push_str(piece);
}

/// `base` plus a short random suffix, used when `base` is already taken.
pub fn with_random_suffix(base: &str) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_CHARSET[rng.random_range(0..SUFFIX_CHARSET.len())] as char)
        .collect();
    format!("{}-{}", base, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_are_lowercase_and_dashed() {
        assert_eq!(slugify("Velvet Lip Tint"), "velvet-lip-tint");
        assert_eq!(slugify("  Rose -- Serum  50ml "), "rose-serum-50ml");
        assert_eq!(slugify("Eau de Parfum (Intense)"), "eau-de-parfum-intense");
    }

    #[test]
    fn accents_are_folded() {
        assert_eq!(slugify("Crème Hydratante Été"), "creme-hydratante-ete");
        assert_eq!(slugify("Œillet Doux"), "oeillet-doux");
    }

    #[test]
    fn empty_slug_falls_back() {
        assert_eq!(slugify("!!!"), "product");
        assert_eq!(slugify(""), "product");
    }

    #[test]
    fn folded_ligatures_stay_within_column() {
        let slug = slugify(&"æ".repeat(200));
        assert_eq!(slug.len(), MAX_BASE_LEN);
        assert!(with_random_suffix(&slug).len() <= 255);

        let slug = slugify(&format!("{} tail", "a".repeat(199)));
        assert_eq!(slug, "a".repeat(199));
    }

    #[test]
    fn suffix_keeps_slug_shape() {
        let slug = with_random_suffix("rose-serum");
        assert!(slug.starts_with("rose-serum-"));
        assert_eq!(slug.len(), "rose-serum-".len() + SUFFIX_LEN);
        assert_eq!(slugify(&slug), slug);
    }
}
