use crate::api::{Asset, SearchApi};
use crate::config::Config;
use crate::events::{EventSink, UiEvent};
use crate::query::Query;
use tracing::{debug, warn};

/// Page through all results for `query`.
///
/// Stops once `page * page_size` reaches the reported total, when a page comes
/// back empty, or after `max_pages`. A failed request ends the loop early and
/// the assets from earlier pages are returned as-is.
pub fn collect_assets(api: &dyn SearchApi, query: &Query, config: &Config, sink: &dyn EventSink) -> Vec<Asset> {
    let mut assets = Vec::new();

    for page in 1..=config.max_pages {
        sink.send(UiEvent::PageRequested { page });

        let result = match api.fetch_page(query, page) {
            Ok(result) => result,
            Err(e) => {
                warn!(target_value = query.target(), page, error = %e, "search aborted");
                sink.send(UiEvent::SearchAborted { reason: e.to_string() });
                break;
            }
        };

        let fetched = result.assets.len();
        sink.send(UiEvent::PageFetched { page, assets: fetched, total: result.total });
        assets.extend(result.assets);

        if u64::from(page) * u64::from(config.page_size) >= result.total || fetched == 0 {
            debug!(page, total = result.total, "last page reached");
            break;
        }
        if page < config.max_pages {
            pause(config);
        }
    }

    assets
}

fn pause(config: &Config) {
    if !config.delay.is_zero() {
        std::thread::sleep(config.delay);
    }
}


#[cfg(test)]
mod tests {
    use super::fake::{domain_asset, page, ScriptedApi};
    use super::*;
    use crate::api::SearchError;
    use crate::events::MemorySink;
    use std::time::{Duration, Instant};

    fn test_config(page_size: u32) -> Config {
        let mut config = Config::hunter_defaults("key");
        config.page_size = page_size;
        config.delay = Duration::ZERO;
        config
    }

    fn assets(n: usize, prefix: &str) -> Vec<Asset> {
        (0..n).map(|i| domain_asset(&format!("{}{}.cn", prefix, i), "1.1.1.1")).collect()
    }

    #[test]
    fn stops_when_cumulative_count_reaches_total() {
        let query = Query::IcpName("示例".into());
        let api = ScriptedApi::new().with(
            &query,
            vec![page(5, assets(2, "a")), page(5, assets(2, "b")), page(5, assets(1, "c")), page(5, assets(2, "d"))],
        );
        let found = collect_assets(&api, &query, &test_config(2), &MemorySink::new());
        assert_eq!(found.len(), 5);
        assert_eq!(api.request_count(), 3);
    }

    #[test]
    fn single_page_when_total_fits() {
        let query = Query::Domain("a.cn".into());
        let api = ScriptedApi::new().with(&query, vec![page(3, assets(3, "a"))]);
        let found = collect_assets(&api, &query, &test_config(100), &MemorySink::new());
        assert_eq!(found.len(), 3);
        assert_eq!(api.request_count(), 1);
    }

    #[test]
    fn never_exceeds_max_pages() {
        let query = Query::Domain("big.cn".into());
        let pages = (0..10).map(|i| page(1000, assets(2, &format!("p{}-", i)))).collect();
        let api = ScriptedApi::new().with(&query, pages);
        let mut config = test_config(2);
        config.max_pages = 5;
        let found = collect_assets(&api, &query, &config, &MemorySink::new());
        assert_eq!(api.request_count(), 5);
        assert_eq!(found.len(), 10);
    }

    #[test]
    fn pauses_between_pages_but_not_after_the_last() {
        let query = Query::Domain("slow.cn".into());
        let api = ScriptedApi::new().with(&query, vec![page(6, assets(2, "a")), page(6, assets(2, "b")), page(6, assets(2, "c"))]);
        let delay = Duration::from_millis(40);
        let mut config = test_config(2);
        config.delay = delay;

        let found = collect_assets(&api, &query, &config, &MemorySink::new());
        let returned = Instant::now();
        assert_eq!(found.len(), 6);

        let sent = api.sent_at.borrow();
        assert_eq!(sent.len(), 3);
        for pair in sent.windows(2) {
            assert!(pair[1] - pair[0] >= delay);
        }
        assert!(returned - sent[2] < delay);
    }

    #[test]
    fn empty_page_ends_pagination() {
        let query = Query::Ip("1.2.3.4".into());
        let api = ScriptedApi::new().with(&query, vec![page(50, assets(2, "a")), page(50, vec![])]);
        let found = collect_assets(&api, &query, &test_config(2), &MemorySink::new());
        assert_eq!(found.len(), 2);
        assert_eq!(api.request_count(), 2);
    }

    #[test]
    fn error_keeps_earlier_pages_and_reports() {
        let query = Query::IcpName("示例".into());
        let failure = Err(SearchError::Api { code: 429, message: "rate limited".into() });
        let api = ScriptedApi::new().with(&query, vec![page(10, assets(2, "a")), failure, page(10, assets(2, "c"))]);
        let sink = MemorySink::new();
        let found = collect_assets(&api, &query, &test_config(2), &sink);
        assert_eq!(found.len(), 2);
        assert_eq!(api.request_count(), 2);
        assert!(sink.events().iter().any(|e| matches!(e, UiEvent::SearchAborted { reason } if reason.contains("rate limited"))));
    }
}
