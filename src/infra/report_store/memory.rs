use std::collections::HashMap;
use std::sync::Mutex;

use super::{ReportStore, StoreError};
use crate::reports::{Report, ReportListItem};
use crate::shared::mutex_ext::MutexExt;

#[derive(Default)]
struct Inner {
    reports: Vec<Report>,
    index: HashMap<String, usize>,
}

/// Process-lifetime store: reports live in an append-only arena with an id index.
#[derive(Default)]
pub(crate) struct InMemoryReportStore {
    inner: Mutex<Inner>,
}

impl ReportStore for InMemoryReportStore {
    fn put(&self, report: Report) -> Result<(), StoreError> {
        let mut inner = self.inner.lock_or_recover();
        if inner.index.contains_key(&report.id) {
            return Err(StoreError::DuplicateId { id: report.id });
        }
        let slot = inner.reports.len();
        inner.index.insert(report.id.clone(), slot);
        inner.reports.push(report);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Report>, StoreError> {
        let inner = self.inner.lock_or_recover();
        Ok(inner
            .index
            .get(id)
            .and_then(|slot| inner.reports.get(*slot))
            .cloned())
    }

    fn list(&self) -> Result<Vec<ReportListItem>, StoreError> {
        let inner = self.inner.lock_or_recover();
        Ok(inner.reports.iter().map(Report::list_item).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report_store::test_support::report;
    use std::sync::Arc;

    #[test]
    fn put_get_and_list_in_insertion_order() {
        let store = InMemoryReportStore::default();
        store.put(report("b", "second-name", 20)).expect("put b");
        store.put(report("a", "first-name", 10)).expect("put a");

        let ids: Vec<String> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|item| item.id)
            .collect();
        assert_eq!(ids, vec!["b", "a"]);

        assert_eq!(store.get("a").expect("get").map(|r| r.name), Some("first-name".to_string()));
        assert!(store.get("zzz").expect("get").is_none());
    }

    #[test]
    fn put_refuses_duplicate_id() {
        let store = InMemoryReportStore::default();
        store.put(report("same", "one", 1)).expect("put");

        let err = store.put(report("same", "two", 2)).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { ref id } if id == "same"));
        assert_eq!(store.get("same").expect("get").map(|r| r.name), Some("one".to_string()));
    }

    #[test]
    fn concurrent_puts_all_land() {
        let store = Arc::new(InMemoryReportStore::default());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store
                            .put(report(&format!("{t}-{i}"), "r", i))
                            .expect("put");
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("join");
        }

        let listed = store.list().expect("list");
        assert_eq!(listed.len(), 200);
        for t in 0..8 {
            let own: Vec<i64> = listed
                .iter()
                .filter(|item| item.id.starts_with(&format!("{t}-")))
                .map(|item| item.created_at)
                .collect();
            assert_eq!(own, (0..25).collect::<Vec<i64>>());
        }
    }
}
