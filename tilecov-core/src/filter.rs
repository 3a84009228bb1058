//! Filters that exclude records by their ids.

/// Id prefix reserved for overlay sprites.
pub const OVERLAY_PREFIX: &str = "_overlay";

/// Anything that carries an ordered list of ids.
pub trait Identifiable {
    /// Ids in declaration order; may be empty.
    fn ids(&self) -> &[String];
}

/// Exclusion rule over [`Identifiable`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Matches values without ids or with an empty id.
    NoEmptyId,
    /// Matches values whose first id names an overlay.
    NoOverlays,
}

impl Filter {
    /// Whether `item` should be excluded under this filter.
    pub fn matches<I: Identifiable + ?Sized>(self, item: &I) -> bool {
        let ids = item.ids();
        match self {
            Self::NoEmptyId => ids.is_empty() || ids.iter().any(String::is_empty),
            Self::NoOverlays => ids
                .first()
                .is_some_and(|id| id.starts_with(OVERLAY_PREFIX)),
        }
    }
}

/// Whether any of `filters` excludes `item`.
pub fn is_excluded<I: Identifiable + ?Sized>(filters: &[Filter], item: &I) -> bool {
    filters.iter().any(|filter| filter.matches(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ids(Vec<String>);

    impl Identifiable for Ids {
        fn ids(&self) -> &[String] {
            &self.0
        }
    }

    fn ids(values: &[&str]) -> Ids {
        Ids(values.iter().map(|value| value.to_string()).collect())
    }

    #[test]
    fn no_empty_id_rejects_missing_and_blank_ids() {
        assert!(Filter::NoEmptyId.matches(&ids(&[])));
        assert!(Filter::NoEmptyId.matches(&ids(&["rock", ""])));
        assert!(!Filter::NoEmptyId.matches(&ids(&["rock"])));
    }

    #[test]
    fn no_overlays_checks_the_first_id() {
        assert!(Filter::NoOverlays.matches(&ids(&["_overlay_wielded_glock"])));
        assert!(!Filter::NoOverlays.matches(&ids(&["glock", "_overlay_glock"])));
        assert!(!Filter::NoOverlays.matches(&ids(&[])));
    }

    #[test]
    fn any_matching_filter_excludes() {
        let filters = [Filter::NoEmptyId, Filter::NoOverlays];
        assert!(is_excluded(&filters, &ids(&["_overlay_x"])));
        assert!(is_excluded(&filters, &ids(&[""])));
        assert!(!is_excluded(&filters, &ids(&["x"])));
        assert!(!is_excluded(&[], &ids(&[])));
    }
}
