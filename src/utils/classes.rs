use std::{collections::HashMap, hash::Hash};

/// Invert a map by swapping keys and values
pub fn invert_map<K, V, MK, MV>(original: MK) -> MV
where
    K: Ord + Hash + Eq,
    V: Ord + Hash + Eq + Clone,
    MK: IntoIterator<Item = (K, V)>,
    MV: FromIterator<(V, K)>,
{
    original
        .into_iter()
        .map(|(key, value)| (value, key))
        .collect()
}

/// Build an id-to-label map from an ordered list of labels
pub fn id2label(labels: &[String]) -> HashMap<usize, String> {
    labels
        .iter()
        .enumerate()
        .map(|(i, s)| (i, s.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_invert_map_swaps_labels() {
        let labels = vec!["Other".to_string(), " Cause-Effect(e1,e2) ".to_string()];
        let ids = id2label(&labels);
        let inverted: HashMap<String, usize> = invert_map(ids.clone());

        assert_eq!(ids[&1], "Cause-Effect(e1,e2)");
        assert_eq!(inverted["Other"], 0);
        assert_eq!(inverted.len(), 2);
    }
}
