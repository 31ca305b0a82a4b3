//! Search filter fields and their canonical query-string form.
//!
//! Field values are kept exactly as typed. A field whose value is empty or
//! whitespace-only counts as absent and is never serialized.

use std::fmt;
use std::str::FromStr;

use url::form_urlencoded;

use super::UserId;

/// One of the four filter inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    /// Item name substring.
    Name,
    /// Category.
    Category,
    /// Lower price bound.
    MinPrice,
    /// Upper price bound.
    MaxPrice,
}

impl SearchField {
    /// Serialization order of the canonical query.
    pub const ALL: [Self; 4] = [Self::Name, Self::Category, Self::MinPrice, Self::MaxPrice];

    /// Query-string key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::MinPrice => "minPrice",
            Self::MaxPrice => "maxPrice",
        }
    }
}

/// Error returned when a field name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown search field `{0}`")]
pub struct UnknownSearchField(pub String);

impl FromStr for SearchField {
    type Err = UnknownSearchField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(wanted))
            .or_else(|| match wanted.to_ascii_lowercase().as_str() {
                "min" | "min-price" | "min_price" => Some(Self::MinPrice),
                "max" | "max-price" | "max_price" => Some(Self::MaxPrice),
                _ => None,
            })
            .ok_or_else(|| UnknownSearchField(wanted.to_owned()))
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Current contents of the filter inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    name: String,
    category: String,
    min_price: String,
    max_price: String,
}

impl SearchFilter {
    /// Hydrate every field from a location query string.
    ///
    /// Keys not present in `query` leave their field empty. A leading `?` is
    /// tolerated; unknown keys are ignored; the first occurrence of a key wins.
    ///
    /// # Examples
    /// ```
    /// use sweets_client::domain::{SearchField, SearchFilter};
    ///
    /// let filter = SearchFilter::from_query("?category=cake&minPrice=2");
    /// assert_eq!(filter.get(SearchField::Category), "cake");
    /// assert_eq!(filter.get(SearchField::Name), "");
    /// ```
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut filter = Self::default();
        let mut seen = [false; 4];
        let raw = query.strip_prefix('?').unwrap_or(query);
        for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
            let hit = SearchField::ALL
                .into_iter()
                .zip(seen.iter_mut())
                .find(|(field, _)| field.key() == key);
            if let Some((field, already)) = hit
                && !*already
            {
                *already = true;
                filter.set(field, value.into_owned());
            }
        }
        filter
    }

    /// Raw text of `field`.
    #[must_use]
    pub fn get(&self, field: SearchField) -> &str {
        match field {
            SearchField::Name => &self.name,
            SearchField::Category => &self.category,
            SearchField::MinPrice => &self.min_price,
            SearchField::MaxPrice => &self.max_price,
        }
    }

    /// Replace the raw text of `field`.
    pub fn set(&mut self, field: SearchField, value: impl Into<String>) {
        let slot = match field {
            SearchField::Name => &mut self.name,
            SearchField::Category => &mut self.category,
            SearchField::MinPrice => &mut self.min_price,
            SearchField::MaxPrice => &mut self.max_price,
        };
        *slot = value.into();
    }

    /// Fields that would be serialized, in canonical order.
    pub fn present(&self) -> impl Iterator<Item = (SearchField, &str)> {
        SearchField::ALL
            .into_iter()
            .map(|field| (field, self.get(field)))
            .filter(|(_, value)| !value.trim().is_empty())
    }

    /// Canonical query string for the current fields.
    #[must_use]
    pub fn canonical_query(&self) -> CanonicalQuery {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (field, value) in self.present() {
            serializer.append_pair(field.key(), value);
        }
        CanonicalQuery(serializer.finish())
    }
}

/// Deterministic query string derived from a [`SearchFilter`].
///
/// Two filters with the same present fields always produce the same string,
/// regardless of the order in which they were edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CanonicalQuery(String);

impl CanonicalQuery {
    /// Query string without a leading `?`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether no filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which collection a view displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionQuery {
    /// Storefront listing narrowed by the search filter.
    Storefront(CanonicalQuery),
    /// Items administered by one user.
    OwnedBy(UserId),
}

impl Default for CollectionQuery {
    fn default() -> Self {
        Self::Storefront(CanonicalQuery::default())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn filter(pairs: &[(SearchField, &str)]) -> SearchFilter {
        let mut built = SearchFilter::default();
        for (field, value) in pairs {
            built.set(*field, *value);
        }
        built
    }

    #[rstest]
    fn whitespace_fields_are_omitted() {
        let built = filter(&[(SearchField::Name, "  "), (SearchField::Category, "cake")]);
        assert_eq!(built.canonical_query().as_str(), "category=cake");
    }

    #[rstest]
    fn edit_order_does_not_change_the_query() {
        let forward = filter(&[
            (SearchField::Name, "fudge"),
            (SearchField::MaxPrice, "9"),
            (SearchField::Category, "candy"),
        ]);
        let backward = filter(&[
            (SearchField::Category, "candy"),
            (SearchField::MaxPrice, "9"),
            (SearchField::Name, "fudge"),
        ]);
        assert_eq!(forward.canonical_query(), backward.canonical_query());
        assert_eq!(
            forward.canonical_query().as_str(),
            "name=fudge&category=candy&maxPrice=9"
        );
    }

    #[rstest]
    fn values_are_kept_verbatim_and_encoded() {
        let built = filter(&[(SearchField::Name, " choc chip ")]);
        assert_eq!(built.canonical_query().as_str(), "name=+choc+chip+");
    }

    #[rstest]
    #[case("", SearchFilter::default())]
    #[case("?name=fudge", filter(&[(SearchField::Name, "fudge")]))]
    #[case(
        "minPrice=1&maxPrice=5&colour=red",
        filter(&[(SearchField::MinPrice, "1"), (SearchField::MaxPrice, "5")])
    )]
    #[case("name=a&name=b", filter(&[(SearchField::Name, "a")]))]
    fn hydrates_from_query(#[case] query: &str, #[case] expected: SearchFilter) {
        assert_eq!(SearchFilter::from_query(query), expected);
    }

    #[rstest]
    fn canonical_query_survives_rehydration() {
        let built = filter(&[(SearchField::Name, "a&b"), (SearchField::MinPrice, "2")]);
        let rehydrated = SearchFilter::from_query(built.canonical_query().as_str());
        assert_eq!(rehydrated, built);
    }

    #[rstest]
    #[case("name", SearchField::Name)]
    #[case("minPrice", SearchField::MinPrice)]
    #[case("max", SearchField::MaxPrice)]
    #[case("CATEGORY", SearchField::Category)]
    fn parses_field_names(#[case] raw: &str, #[case] expected: SearchField) {
        assert_eq!(raw.parse::<SearchField>().expect("known field"), expected);
    }
}
