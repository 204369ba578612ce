use crate::error::{ErrorKind, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

type Outcome<T> = std::result::Result<Option<Arc<T>>, ErrorKind>;

/// A lazily computed, shared sub-resource.
///
/// The first caller computes the value and every later (or concurrent)
/// caller gets the same outcome, failures included: a malformed file is
/// parsed once and reported every time it's asked for. If the first caller
/// is cancelled mid-computation the cell stays empty and the next caller
/// starts over.
pub(crate) struct Memo<T> {
    cell: OnceCell<Outcome<T>>,
}

impl<T> Memo<T> {
    pub(crate) fn new() -> Self {
        Self { cell: OnceCell::new() }
    }

    fn record(what: &'static str, outcome: Result<Option<T>>) -> Outcome<T> {
        match outcome {
            Ok(value) => Ok(value.map(Arc::new)),
            Err(err) => {
                tracing::warn!(resource = what, error = ?err, "Unable to load resource");
                Err((*err).clone())
            },
        }
    }

    fn replay(outcome: &Outcome<T>) -> Result<Option<Arc<T>>> {
        match outcome {
            Ok(value) => Ok(value.clone()),
            Err(kind) => Err(exn::Exn::from(kind.clone())),
        }
    }

    pub(crate) async fn get_or_init<F, Fut>(&self, what: &'static str, init: F) -> Result<Option<Arc<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let outcome = self.cell.get_or_init(|| async move { Self::record(what, init().await) }).await;
        Self::replay(outcome)
    }

    /// The value, if it has been computed successfully and is present.
    pub(crate) fn peek(&self) -> Option<Arc<T>> {
        self.cell.get().and_then(|outcome| outcome.as_ref().ok().cloned().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_computes_once() {
        let memo = Memo::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(String::from("computed")))
        };
        let first = memo.get_or_init("value", compute).await.unwrap().unwrap();
        let second = memo.get_or_init("value", compute).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memo.peek().is_some());
    }

    #[tokio::test]
    async fn test_failure_is_remembered() {
        let memo: Memo<String> = Memo::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(exn::Exn::from(ErrorKind::MalformedManifest("unclosed tag".to_string())))
        };
        for _ in 0..3 {
            let err = memo.get_or_init("value", compute).await.unwrap_err();
            assert!(matches!(&*err, ErrorKind::MalformedManifest(_)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(memo.peek().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_callers_share_one_computation() {
        let memo = Memo::new();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let compute = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(Some(42_u32))
        };
        let (a, b) = tokio::join!(memo.get_or_init("value", compute), memo.get_or_init("value", compute));
        assert!(Arc::ptr_eq(&a.unwrap().unwrap(), &b.unwrap().unwrap()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_computation_is_retried() {
        let memo = Memo::new();
        let slow = memo.get_or_init("value", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some(1_u32))
        });
        assert!(tokio::time::timeout(Duration::from_millis(10), slow).await.is_err());
        let value = memo.get_or_init("value", || async { Ok(Some(2_u32)) }).await.unwrap();
        assert_eq!(value.as_deref(), Some(&2));
    }
}
