use std::collections::BTreeMap;

use reqwest::Url;

use super::SearchError;
use crate::models::SearchCondition;

/// Builds the request target for one page of results.
///
/// Keys already present on `base` are kept unless a filter overwrites them.
/// Pairs are emitted in key order.
pub(crate) fn build_url(
    base: &Url,
    condition: &SearchCondition,
    page: i64,
    count: i64,
) -> Result<Url, SearchError> {
    let mut params: BTreeMap<String, String> = base.query_pairs().into_owned().collect();

    if let Some(event_id) = condition.event_id {
        set(&mut params, "event_id", event_id.to_string());
    }
    if let Some(keyword) = &condition.keyword {
        set(&mut params, "keyword", keyword.clone());
    }
    if let Some(keyword_or) = &condition.keyword_or {
        set(&mut params, "keyword_or", keyword_or.clone());
    }
    if let Some(ym) = condition.ym {
        set(&mut params, "ym", ym.to_string());
    }
    if let Some(ymd) = condition.ymd {
        set(&mut params, "ymd", ymd.to_string());
    }
    if let Some(nickname) = &condition.nickname {
        set(&mut params, "nickname", nickname.clone());
    }
    if let Some(owner_nickname) = &condition.owner_nickname {
        set(&mut params, "owner_nickname", owner_nickname.clone());
    }
    if let Some(series_id) = condition.series_id {
        set(&mut params, "series_id", series_id.to_string());
    }

    set(&mut params, "start", start_offset(page, count)?.to_string());
    set(&mut params, "count", count.to_string());

    let mut url = base.clone();
    url.set_query(None);
    url.query_pairs_mut().extend_pairs(params.iter());
    Ok(url)
}

/// 1-based index of the first result on `page`. Pages below 1 are passed through.
pub(crate) fn start_offset(page: i64, count: i64) -> Result<i64, SearchError> {
    page.checked_sub(1)
        .and_then(|skipped| skipped.checked_mul(count))
        .and_then(|offset| offset.checked_add(1))
        .ok_or_else(|| {
            SearchError::RequestBuild(format!(
                "start offset overflows for page {page} with count {count}"
            ))
        })
}

fn set(params: &mut BTreeMap<String, String>, key: &str, value: String) {
    params.insert(key.to_string(), value);
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const FILTER_KEYS: [&str; 8] = [
        "event_id",
        "keyword",
        "keyword_or",
        "ym",
        "ymd",
        "nickname",
        "owner_nickname",
        "series_id",
    ];

    fn base() -> Url {
        Url::parse("https://connpass.com/api/v1/event/").expect("base url")
    }

    fn pairs(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn empty_condition_sends_only_paging() {
        let url = build_url(&base(), &SearchCondition::default(), 1, 10).expect("build url");
        let params = pairs(&url);
        assert_eq!(params.len(), 2);
        assert_eq!(params["start"], "1");
        assert_eq!(params["count"], "10");
        for key in FILTER_KEYS {
            assert!(!params.contains_key(key), "unexpected key {key}");
        }
    }

    #[test]
    fn event_id_alone_adds_one_filter() {
        let condition = SearchCondition::new().event_id(123);
        let url = build_url(&base(), &condition, 1, 10).expect("build url");
        let params = pairs(&url);
        assert_eq!(params["event_id"], "123");
        let filters: Vec<_> = FILTER_KEYS
            .iter()
            .filter(|key| params.contains_key(**key))
            .collect();
        assert_eq!(filters, vec![&"event_id"]);
    }

    #[test]
    fn every_filter_uses_its_own_key() {
        let condition = SearchCondition::new()
            .event_id(42)
            .keyword("rust")
            .keyword_or("go")
            .ym(202401)
            .ymd(20240115)
            .nickname("alice")
            .owner_nickname("bob")
            .series_id(7);
        let url = build_url(&base(), &condition, 2, 5).expect("build url");
        let params = pairs(&url);

        assert_eq!(params.len(), 10);
        assert_eq!(params["event_id"], "42");
        assert_eq!(params["keyword"], "rust");
        assert_eq!(params["keyword_or"], "go");
        assert_eq!(params["ym"], "202401");
        assert_eq!(params["ymd"], "20240115");
        assert_eq!(params["nickname"], "alice");
        assert_eq!(params["owner_nickname"], "bob");
        assert_eq!(params["series_id"], "7");
        assert_eq!(params["start"], "6");
        assert_eq!(params["count"], "5");
    }

    #[test]
    fn start_follows_page_arithmetic() {
        assert_eq!(start_offset(1, 10).unwrap(), 1);
        assert_eq!(start_offset(3, 20).unwrap(), 41);
        assert_eq!(start_offset(2, 100).unwrap(), 101);

        let url = build_url(&base(), &SearchCondition::default(), 3, 20).expect("build url");
        assert_eq!(pairs(&url)["start"], "41");
    }

    #[test]
    fn non_positive_page_is_passed_through() {
        assert_eq!(start_offset(0, 10).unwrap(), -9);
        assert_eq!(start_offset(-1, 10).unwrap(), -19);
    }

    #[test]
    fn overflowing_offset_is_a_request_build_error() {
        let err = build_url(&base(), &SearchCondition::default(), i64::MAX, 10)
            .expect_err("offset overflows");
        assert!(matches!(err, SearchError::RequestBuild(_)));
    }

    #[test]
    fn values_are_form_encoded_in_key_order() {
        let condition = SearchCondition::new().keyword("rust 東京").nickname("a&b");
        let url = build_url(&base(), &condition, 1, 10).expect("build url");
        assert_eq!(
            url.query(),
            Some("count=10&keyword=rust+%E6%9D%B1%E4%BA%AC&nickname=a%26b&start=1")
        );
        assert_eq!(pairs(&url)["keyword"], "rust 東京");
    }

    #[test]
    fn base_query_is_kept_and_overridable() {
        let base = Url::parse("http://localhost/api?format=json&start=99").expect("base url");
        let url = build_url(&base, &SearchCondition::default(), 1, 10).expect("build url");
        let params = pairs(&url);
        assert_eq!(params["format"], "json");
        assert_eq!(params["start"], "1");
        assert_eq!(url.path(), "/api");
    }
}
