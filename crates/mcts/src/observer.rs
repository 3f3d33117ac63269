//! Progress observation and cooperative control of a running search.
//!
//! A search reports one [`SearchEvent::Phase`] after each of the four
//! phases of every iteration, a [`SearchEvent::Progress`] after each
//! completed iteration and a final [`SearchEvent::Finished`]. Observers get
//! the tree by shared reference only.
//!
//! [`SearchControl`] is checked at the start of each iteration, never in
//! the middle of one.

use crate::node::NodeId;
use crate::tree::Tree;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

/// The four phases of an MCTS iteration, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Selection,
    Expansion,
    Simulation,
    Backpropagation,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Selection,
        Phase::Expansion,
        Phase::Simulation,
        Phase::Backpropagation,
    ];
}

/// Notification emitted by a running search.
#[derive(Debug)]
pub enum SearchEvent<'a, S, A> {
    /// A phase of iteration `iteration` (0-based) has completed.
    Phase {
        phase: Phase,
        iteration: usize,
        tree: &'a Tree<S, A>,
    },

    /// `iteration` iterations have completed.
    Progress { iteration: usize },

    /// The search loop has ended.
    Finished { iterations: usize, stopped: bool },
}

/// Passive consumer of search events.
pub trait SearchObserver<S, A> {
    fn on_event(&mut self, event: SearchEvent<'_, S, A>);
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopObserver;

impl<S, A> SearchObserver<S, A> for NoopObserver {
    fn on_event(&mut self, _event: SearchEvent<'_, S, A>) {}
}

/// Statistics of one node in a [`TreeSnapshot`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotNode<A> {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub action: Option<A>,
    pub visit_count: u32,
    pub mean_value: f64,
}

/// Owned copy of a tree's shape and statistics, without states.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TreeSnapshot<A> {
    pub nodes: Vec<SnapshotNode<A>>,
}

impl<A: Clone> TreeSnapshot<A> {
    pub fn capture<S>(tree: &Tree<S, A>) -> Self {
        let nodes = tree
            .iter()
            .map(|(id, node)| SnapshotNode {
                id,
                parent: node.parent(),
                action: node.action().cloned(),
                visit_count: node.visit_count(),
                mean_value: node.mean_value(),
            })
            .collect();
        Self { nodes }
    }
}

/// Owned form of [`SearchEvent`] sent across threads.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum SearchMessage<A> {
    Phase {
        phase: Phase,
        iteration: usize,
        snapshot: TreeSnapshot<A>,
    },
    Progress {
        iteration: usize,
    },
    Finished {
        iterations: usize,
        stopped: bool,
    },
}

/// Forwards events over an mpsc channel, e.g. to a UI thread.
///
/// Phase events carry a full [`TreeSnapshot`], which costs a pass over the
/// tree per phase. Use [`ChannelObserver::progress_only`] to send only
/// progress and completion. Once the receiver hangs up, events are dropped
/// and the search carries on.
#[derive(Debug)]
pub struct ChannelObserver<A> {
    sender: Sender<SearchMessage<A>>,
    snapshots: bool,
    connected: bool,
}

impl<A> ChannelObserver<A> {
    pub fn new(sender: Sender<SearchMessage<A>>) -> Self {
        Self {
            sender,
            snapshots: true,
            connected: true,
        }
    }

    pub fn progress_only(sender: Sender<SearchMessage<A>>) -> Self {
        Self {
            snapshots: false,
            ..Self::new(sender)
        }
    }

    fn send(&mut self, message: SearchMessage<A>) {
        if self.connected && self.sender.send(message).is_err() {
            self.connected = false;
        }
    }
}

impl<S, A: Clone> SearchObserver<S, A> for ChannelObserver<A> {
    fn on_event(&mut self, event: SearchEvent<'_, S, A>) {
        match event {
            SearchEvent::Phase {
                phase,
                iteration,
                tree,
            } => {
                if self.snapshots && self.connected {
                    let snapshot = TreeSnapshot::capture(tree);
                    self.send(SearchMessage::Phase {
                        phase,
                        iteration,
                        snapshot,
                    });
                }
            }
            SearchEvent::Progress { iteration } => self.send(SearchMessage::Progress { iteration }),
            SearchEvent::Finished { iterations, stopped } => {
                self.send(SearchMessage::Finished { iterations, stopped })
            }
        }
    }
}

#[derive(Debug, Default)]
struct ControlState {
    stopped: AtomicBool,
    paused: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable stop/pause handle shared between a search and its host.
#[derive(Clone, Debug, Default)]
pub struct SearchControl {
    inner: Arc<ControlState>,
}

impl SearchControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the search to stop before its next iteration.
    ///
    /// Also releases a paused search.
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        let _paused = self.lock();
        self.inner.wake.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Hold the search before its next iteration until [`Self::resume`].
    pub fn pause(&self) {
        *self.lock() = true;
    }

    pub fn resume(&self) {
        *self.lock() = false;
        self.inner.wake.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.lock()
    }

    /// Called between iterations: blocks while paused, then reports
    /// whether the search may continue.
    pub(crate) fn proceed(&self) -> bool {
        let mut paused = self.lock();
        while *paused && !self.is_stopped() {
            paused = self
                .inner
                .wake
                .wait(paused)
                .unwrap_or_else(PoisonError::into_inner);
        }
        !self.is_stopped()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_control_defaults_to_running() {
        let control = SearchControl::new();
        assert!(!control.is_stopped());
        assert!(!control.is_paused());
        assert!(control.proceed());
    }

    #[test]
    fn test_stop_is_shared_between_clones() {
        let control = SearchControl::new();
        let handle = control.clone();
        handle.stop();
        assert!(control.is_stopped());
        assert!(!control.proceed());
    }

    #[test]
    fn test_resume_releases_paused_search() {
        let control = SearchControl::new();
        control.pause();

        let handle = control.clone();
        let resumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.resume();
        });

        assert!(control.proceed());
        assert!(!control.is_paused());
        resumer.join().unwrap();
    }

    #[test]
    fn test_stop_releases_paused_search() {
        let control = SearchControl::new();
        control.pause();

        let handle = control.clone();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.stop();
        });

        assert!(!control.proceed());
        stopper.join().unwrap();
    }

    #[test]
    fn test_channel_observer_snapshots_tree() {
        let (tx, rx) = mpsc::channel();
        let mut observer = ChannelObserver::new(tx);
        let tree: Tree<i32, u8> = Tree::new(0);

        observer.on_event(SearchEvent::Phase {
            phase: Phase::Selection,
            iteration: 0,
            tree: &tree,
        });
        SearchObserver::<i32, u8>::on_event(&mut observer, SearchEvent::Progress { iteration: 1 });

        match rx.recv().unwrap() {
            SearchMessage::Phase { phase, snapshot, .. } => {
                assert_eq!(phase, Phase::Selection);
                assert_eq!(snapshot.nodes.len(), 1);
                assert_eq!(snapshot.nodes[0].parent, None);
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(rx.recv().unwrap(), SearchMessage::Progress { iteration: 1 });
    }

    #[test]
    fn test_channel_observer_survives_hangup() {
        let (tx, rx) = mpsc::channel::<SearchMessage<u8>>();
        let mut observer = ChannelObserver::progress_only(tx);
        drop(rx);

        SearchObserver::<i32, u8>::on_event(&mut observer, SearchEvent::Progress { iteration: 1 });
        assert!(!observer.connected);
    }
}
