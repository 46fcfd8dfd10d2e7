//! Observable view state
//!
//! A thin wrapper over [`tokio::sync::watch`]: the holder mutates the value in
//! place, subscribers are notified only when it actually changed, and every
//! mutation runs under the channel's lock so check-and-set updates are atomic.

use tokio::sync::watch;

pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone + PartialEq> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Receiver that sees every published change from now on
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Applies `f` and notifies subscribers if the value changed.
    ///
    /// Returns whether a change was published.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        self.tx.send_if_modified(|value| {
            let before = value.clone();
            f(value);
            *value != before
        })
    }

    /// Applies `f` atomically; `f` reports whether it modified the value.
    pub fn update_if(&self, f: impl FnOnce(&mut T) -> bool) -> bool {
        self.tx.send_if_modified(f)
    }
}

impl<T: Clone + PartialEq + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publishes_only_on_change() {
        let observable = Observable::new(1);
        let mut rx = observable.subscribe();

        assert!(!observable.update(|v| *v = 1));
        assert!(!rx.has_changed().unwrap());

        assert!(observable.update(|v| *v = 2));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 2);
        assert_eq!(observable.get(), 2);
    }

    #[test]
    fn test_update_if_reports_modification() {
        let observable = Observable::new(String::new());

        assert!(observable.update_if(|s| {
            s.push('a');
            true
        }));
        assert!(!observable.update_if(|_| false));
        assert_eq!(observable.get(), "a");
    }
}
