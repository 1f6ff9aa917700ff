//! "Did you mean" suggestions

/// Names among `candidates` within edit distance 3 of `target`, closest
/// first, at most three
pub(crate) fn compute_suggestions<'a>(
    target: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut suggestions: Vec<(&str, usize)> = candidates
        .into_iter()
        .map(|candidate| (candidate, levenshtein_distance(target, candidate)))
        .filter(|(_, distance)| *distance <= 3)
        .collect();

    // Ties are broken by name so the output does not depend on hash order.
    suggestions.sort_by(|(left, left_distance), (right, right_distance)| {
        left_distance.cmp(right_distance).then_with(|| left.cmp(right))
    });
    suggestions
        .into_iter()
        .take(3)
        .map(|(name, _)| name.to_owned())
        .collect()
}

/// Compute Levenshtein distance between two strings
fn levenshtein_distance(source: &str, target: &str) -> usize {
    let source: Vec<char> = source.chars().collect();
    let target: Vec<char> = target.chars().collect();

    if source.is_empty() {
        return target.len();
    }
    if target.is_empty() {
        return source.len();
    }

    let mut matrix = vec![vec![0; target.len() + 1]; source.len() + 1];
    for (idx, row) in matrix.iter_mut().enumerate() {
        row[0] = idx;
    }
    for (jdx, cell) in matrix[0].iter_mut().enumerate() {
        *cell = jdx;
    }

    for (idx, source_char) in source.iter().enumerate() {
        for (jdx, target_char) in target.iter().enumerate() {
            let cost = usize::from(source_char != target_char);
            matrix[idx + 1][jdx + 1] = (matrix[idx][jdx + 1] + 1)
                .min(matrix[idx + 1][jdx] + 1)
                .min(matrix[idx][jdx] + cost);
        }
    }

    matrix[source.len()][target.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("abc", "abc"), 0);
        assert_eq!(levenshtein_distance("abc", "def"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("Vec3", "Vec4"), 1);
    }

    #[test]
    fn test_suggestions_are_closest_first() {
        let suggestions = compute_suggestions(
            "Pont",
            ["Point", "Pond", "Polygon", "Matrix", "Print", "Paint"],
        );
        assert_eq!(suggestions, ["Point", "Pond", "Paint"]);
        assert!(compute_suggestions("Q", ["Quaternion"]).is_empty());
    }
}
