//! Phone number permutations for lead search.

/// Build the search query permutations for a phone number.
///
/// The CRM stores numbers in whatever format an operator typed, so the
/// search tries the digits plus common Brazilian renditions. For
/// 55-prefixed numbers the mobile `9` after the area code is tried both
/// present and absent. Duplicates are dropped, order is preserved.
pub fn phone_permutations(raw: &str) -> Vec<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return Vec::new();
    }

    let mut variants = vec![digits.clone()];
    if digits.starts_with("55") && digits.len() == 13 && digits.as_bytes()[4] == b'9' {
        // 55 + DDD + 9XXXXXXXX: also try without the mobile 9
        variants.push(format!("{}{}", &digits[..4], &digits[5..]));
    } else if digits.starts_with("55") && digits.len() == 12 {
        // 55 + DDD + XXXXXXXX: also try with the mobile 9
        variants.push(format!("{}9{}", &digits[..4], &digits[4..]));
    }

    let mut queries = Vec::new();
    for number in &variants {
        push_unique(&mut queries, number.clone());
        push_unique(&mut queries, format!("+{number}"));
        if number.len() > 2 {
            push_unique(
                &mut queries,
                format!("+{} {}", &number[..2], &number[2..]),
            );
        }

        if let Some(rest) = number.strip_prefix("55") {
            if rest.len() > 2 {
                let (ddd, local) = rest.split_at(2);
                push_unique(&mut queries, format!("({ddd}) {local}"));
                push_unique(&mut queries, format!("+55 ({ddd}) {local}"));
                push_unique(&mut queries, format!("+55{ddd}{local}"));

                match local.len() {
                    8 => push_unique(
                        &mut queries,
                        format!("({ddd}) {}-{}", &local[..4], &local[4..]),
                    ),
                    9 => push_unique(
                        &mut queries,
                        format!("({ddd}) {}-{}", &local[..5], &local[5..]),
                    ),
                    _ => {}
                }
            }
        }
    }

    queries
}

fn push_unique(queries: &mut Vec<String>, query: String) {
    if !queries.contains(&query) {
        queries.push(query);
    }
}
