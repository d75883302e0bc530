//! Listing query builder: turns the recognized query parameters of the
//! captures listing into a store query plus the state shown by the page.

use crate::capture_store::{
    Artist, Capture, CaptureOrderKey, CaptureOrdering, CaptureQuery, CaptureStore,
};
use anyhow::Result;
use serde::Serialize;
use thiserror::Error;

/// Rendered in `current_sorting` for a parameter that was not applied.
const UNSET_SORTING_PART: &str = "None";

/// Raw listing parameters as they appear in the query string.
#[derive(Debug, Clone, Default)]
pub struct ListingParams {
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub artist: Option<String>,
    pub q: Option<String>,
}

/// Built from decoded query pairs. A repeated key keeps its last value and
/// unrecognized keys are ignored.
impl FromIterator<(String, String)> for ListingParams {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        let mut params = ListingParams::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "sort" => &mut params.sort,
                "direction" => &mut params.direction,
                "artist" => &mut params.artist,
                "q" => &mut params.q,
                _ => continue,
            };
            *slot = Some(value);
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Artist,
    Field(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
    raw_key: String,
    raw_direction: Option<String>,
}

impl SortSpec {
    fn parse(raw_key: String, raw_direction: Option<String>) -> Self {
        let key = match raw_key.as_str() {
            "name" => SortKey::Name,
            "artist" => SortKey::Artist,
            other => SortKey::Field(other.to_string()),
        };
        let direction = match raw_direction.as_deref() {
            Some("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        SortSpec {
            key,
            direction,
            raw_key,
            raw_direction,
        }
    }

    fn to_ordering(&self) -> CaptureOrdering {
        CaptureOrdering {
            key: match &self.key {
                SortKey::Name => CaptureOrderKey::NameCaseInsensitive,
                SortKey::Artist => CaptureOrderKey::ArtistName,
                SortKey::Field(field) => CaptureOrderKey::Field(field.clone()),
            },
            descending: self.direction == SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("You didn't enter any search criteria!")]
    EmptySearch,
}

/// Validated listing parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingRequest {
    pub sort: Option<SortSpec>,
    pub artist_names: Option<Vec<String>>,
    pub search: Option<String>,
}

impl TryFrom<ListingParams> for ListingRequest {
    type Error = ListingError;

    fn try_from(params: ListingParams) -> Result<Self, Self::Error> {
        if matches!(params.q.as_deref(), Some("")) {
            return Err(ListingError::EmptySearch);
        }
        // `direction` is ignored unless a sort key is given.
        let sort = params
            .sort
            .map(|raw_key| SortSpec::parse(raw_key, params.direction));
        let artist_names = params
            .artist
            .map(|artists| artists.split(',').map(str::to_string).collect());
        Ok(ListingRequest {
            sort,
            artist_names,
            search: params.q,
        })
    }
}

impl ListingRequest {
    /// `{sort}_{direction}` with the literal parameter values, e.g. `name_desc`
    /// or `None_None` when nothing is sorted.
    pub fn current_sorting(&self) -> String {
        match &self.sort {
            Some(sort) => format!(
                "{}_{}",
                sort.raw_key,
                sort.raw_direction.as_deref().unwrap_or(UNSET_SORTING_PART)
            ),
            None => format!("{}_{}", UNSET_SORTING_PART, UNSET_SORTING_PART),
        }
    }

    fn to_query(&self) -> CaptureQuery {
        CaptureQuery {
            artist_names: self.artist_names.clone(),
            text: self.search.clone(),
            ordering: self.sort.as_ref().map(SortSpec::to_ordering),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub captures: Vec<Capture>,
    pub search_term: Option<String>,
    pub current_artists: Option<Vec<Artist>>,
    pub current_sorting: String,
}

pub fn build_listing(store: &dyn CaptureStore, request: ListingRequest) -> Result<Listing> {
    let captures = store.query_captures(&request.to_query())?;
    let current_artists = match &request.artist_names {
        Some(names) => Some(store.get_artists_by_names(names)?),
        None => None,
    };
    Ok(Listing {
        captures,
        current_sorting: request.current_sorting(),
        search_term: request.search,
        current_artists,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture_store::{CaptureForm, CaptureStoreError, SqliteCaptureStore};
    use tempfile::TempDir;

    fn params(
        sort: Option<&str>,
        direction: Option<&str>,
        artist: Option<&str>,
        q: Option<&str>,
    ) -> ListingParams {
        ListingParams {
            sort: sort.map(str::to_string),
            direction: direction.map(str::to_string),
            artist: artist.map(str::to_string),
            q: q.map(str::to_string),
        }
    }

    fn request(params: ListingParams) -> ListingRequest {
        ListingRequest::try_from(params).unwrap()
    }

    #[test]
    fn current_sorting_uses_literal_values() {
        let cases = [
            (params(None, None, None, None), "None_None"),
            (params(Some("name"), None, None, None), "name_None"),
            (params(Some("price"), Some("desc"), None, None), "price_desc"),
            (params(Some("artist"), Some("up"), None, None), "artist_up"),
            (params(None, Some("desc"), None, None), "None_None"),
        ];
        for (params, expected) in cases {
            assert_eq!(request(params).current_sorting(), expected);
        }
    }

    #[test]
    fn resolves_sort_keys_and_directions() {
        let sort = request(params(Some("name"), Some("desc"), None, None))
            .sort
            .unwrap();
        assert_eq!(sort.key, SortKey::Name);
        assert_eq!(sort.direction, SortDirection::Descending);

        let sort = request(params(Some("artist"), Some("DESC"), None, None))
            .sort
            .unwrap();
        assert_eq!(sort.key, SortKey::Artist);
        assert_eq!(sort.direction, SortDirection::Ascending);

        let sort = request(params(Some("sku"), None, None, None)).sort.unwrap();
        assert_eq!(sort.key, SortKey::Field("sku".to_string()));
    }

    fn pairs(pairs: &[(&str, &str)]) -> ListingParams {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn repeated_query_keys_keep_the_last_value() {
        let params = pairs(&[
            ("sort", "name"),
            ("q", "pond"),
            ("sort", "price"),
            ("direction", "asc"),
            ("direction", "desc"),
            ("page", "2"),
        ]);
        assert_eq!(params.sort.as_deref(), Some("price"));
        assert_eq!(params.direction.as_deref(), Some("desc"));
        assert_eq!(params.q.as_deref(), Some("pond"));
        assert_eq!(params.artist, None);
        assert_eq!(request(params).current_sorting(), "price_desc");

        // A later empty value still counts as the search.
        let params = pairs(&[("q", "pond"), ("q", "")]);
        assert_eq!(
            ListingRequest::try_from(params).unwrap_err(),
            ListingError::EmptySearch
        );
    }

    #[test]
    fn splits_artists_on_commas_verbatim() {
        let request = request(params(None, None, Some("monet, turner,"), None));
        assert_eq!(
            request.artist_names.unwrap(),
            vec!["monet".to_string(), " turner".to_string(), String::new()]
        );
    }

    #[test]
    fn empty_search_is_rejected() {
        let err = ListingRequest::try_from(params(Some("name"), None, Some("monet"), Some("")))
            .unwrap_err();
        assert_eq!(err, ListingError::EmptySearch);
        assert_eq!(err.to_string(), "You didn't enter any search criteria!");

        assert!(ListingRequest::try_from(params(None, None, None, Some(" "))).is_ok());
    }

    fn populated_store() -> (SqliteCaptureStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteCaptureStore::new(temp_dir.path().join("captures.db")).unwrap();
        let monet = store.create_artist("monet", None).unwrap();
        let turner = store.create_artist("turner", None).unwrap();
        for (name, description, artist_id) in [
            ("Haystacks", "End of summer", Some(monet.id)),
            ("rain, steam and speed", "Great Western Railway", Some(turner.id)),
            ("Bridge", "Japanese footbridge over the pond", Some(monet.id)),
        ] {
            store
                .create_capture(&CaptureForm {
                    name: name.to_string(),
                    description: description.to_string(),
                    artist_id,
                    price: Some(10.0),
                    ..Default::default()
                })
                .unwrap();
        }
        (store, temp_dir)
    }

    fn names(listing: &Listing) -> Vec<&str> {
        listing.captures.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn builds_unfiltered_listing() {
        let (store, _dir) = populated_store();
        let listing = build_listing(&store, ListingRequest::default()).unwrap();
        assert_eq!(
            names(&listing),
            vec!["Haystacks", "rain, steam and speed", "Bridge"]
        );
        assert_eq!(listing.current_sorting, "None_None");
        assert!(listing.search_term.is_none());
        assert!(listing.current_artists.is_none());
    }

    #[test]
    fn combines_sort_filter_and_search() {
        let (store, _dir) = populated_store();
        let listing = build_listing(
            &store,
            request(params(Some("name"), Some("desc"), Some("monet,nobody"), None)),
        )
        .unwrap();
        assert_eq!(names(&listing), vec!["Haystacks", "Bridge"]);
        let artists: Vec<_> = listing
            .current_artists
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(artists, vec!["monet".to_string()]);

        let listing = build_listing(
            &store,
            request(params(None, None, Some("monet"), Some("POND"))),
        )
        .unwrap();
        assert_eq!(names(&listing), vec!["Bridge"]);
        assert_eq!(listing.search_term.as_deref(), Some("POND"));
    }

    #[test]
    fn accented_names_search_and_sort_ignoring_case() {
        let (store, _dir) = populated_store();
        for name in ["Église de Cézanne", "zebra", "école"] {
            store
                .create_capture(&CaptureForm {
                    name: name.to_string(),
                    description: "Provence".to_string(),
                    price: Some(10.0),
                    ..Default::default()
                })
                .unwrap();
        }

        let listing =
            build_listing(&store, request(params(None, None, None, Some("église")))).unwrap();
        assert_eq!(names(&listing), vec!["Église de Cézanne"]);

        let listing =
            build_listing(&store, request(params(Some("name"), None, None, None))).unwrap();
        assert_eq!(
            names(&listing),
            vec![
                "Bridge",
                "Haystacks",
                "rain, steam and speed",
                "zebra",
                "école",
                "Église de Cézanne"
            ]
        );
    }

    #[test]
    fn unknown_artists_give_empty_results() {
        let (store, _dir) = populated_store();
        let listing = build_listing(&store, request(params(None, None, Some("nobody"), None)))
            .unwrap();
        assert!(listing.captures.is_empty());
        assert_eq!(listing.current_artists, Some(vec![]));
    }

    #[test]
    fn unknown_sort_field_is_a_store_error() {
        let (store, _dir) = populated_store();
        let err = build_listing(&store, request(params(Some("bogus"), None, None, None)))
            .unwrap_err();
        assert!(err.downcast_ref::<CaptureStoreError>().is_some());
    }
}
