//! Transient sessions: batched in-place edits that never disturb states
//! captured before the session.

use crate::{ChangeEvent, Trie};

#[test]
fn transient_insert_batch() {
    let mut trie = Trie::new();
    {
        let mut session = trie.transient();
        for i in 0_u64..100 {
            assert_eq!(session.insert(i, i * 2), ChangeEvent::Added);
        }
        assert_eq!(session.len(), 100);
        assert_eq!(session.get(&7), Some(&14));
    }
    assert_eq!(trie.len(), 100);
    for i in 0_u64..100 {
        assert_eq!(trie.get(&i), Some(&(i * 2)));
    }
}

#[test]
fn transient_extend_and_commit() {
    let mut trie = Trie::new();
    {
        let mut session = trie.transient();
        session.extend((0_u64..40).map(|i| (i, i * 3)));
        session.extend([(5, 999), (40, 120)]);
        assert_eq!(session.commit(), 41);
    }
    assert_eq!(trie.len(), 41);
    assert_eq!(trie.get(&5), Some(&999));
    assert_eq!(trie.get(&40), Some(&120));
}

#[test]
fn transient_remove() {
    let mut trie: Trie<u64, u64> = (0..50).map(|i| (i, i)).collect();
    {
        let mut session = trie.transient();
        for i in 0..25 {
            assert!(session.remove(&i).is_modified());
        }
    }
    assert_eq!(trie.len(), 25);
    assert_eq!(trie.get(&10), None);
    assert_eq!(trie.get(&30), Some(&30));
}

#[test]
fn transient_insert_with() {
    let mut trie = Trie::new();
    trie.insert("sum", 1);
    {
        let mut session = trie.transient();
        for i in 2..=10 {
            session.insert_with("sum", i, |old, new| old + new);
        }
    }
    assert_eq!(trie.get(&"sum"), Some(&55));
}

/// Ownership safety: a state captured before the session never observes
/// the session's in-place edits.
#[test]
fn session_does_not_disturb_prior_checkpoint() {
    let mut trie: Trie<u64, u64> = (0..100).map(|i| (i, i)).collect();
    let cp = trie.checkpoint();

    {
        let mut session = trie.transient();
        for i in 0..100 {
            session.insert(i, i + 1000);
        }
        for i in 0..50 {
            session.remove(&i);
        }
        session.insert(777, 777);
    }

    // The checkpoint still reads the pre-session contents.
    for i in 0..100 {
        assert_eq!(trie.get_at(&cp, &i), Some(&i), "checkpoint disturbed at {i}");
    }
    assert_eq!(trie.get_at(&cp, &777), None);

    // The live trie sees the session's edits.
    assert_eq!(trie.get(&10), None);
    assert_eq!(trie.get(&60), Some(&1060));
    assert_eq!(trie.get(&777), Some(&777));
}

/// Two sessions back to back get distinct owner stamps: the second must
/// not rewrite nodes the first created.
#[test]
fn sequential_sessions_are_isolated() {
    let mut trie = Trie::new();
    {
        let mut session = trie.transient();
        for i in 0_u64..50 {
            session.insert(i, i);
        }
    }
    let cp = trie.checkpoint();
    {
        let mut session = trie.transient();
        for i in 0_u64..50 {
            session.insert(i, i + 100);
        }
    }
    for i in 0_u64..50 {
        assert_eq!(trie.get_at(&cp, &i), Some(&i));
        assert_eq!(trie.get(&i), Some(&(i + 100)));
    }
}

/// The whole point of transients: editing the same region repeatedly
/// allocates far fewer nodes than persistent copy-on-write.
#[test]
fn transient_allocates_less() {
    let mut persistent = Trie::new();
    for i in 0_u64..100 {
        persistent.insert(i, i);
    }
    let (persistent_nodes, _, _) = persistent.arena_len();

    let mut transient = Trie::new();
    {
        let mut session = transient.transient();
        for i in 0_u64..100 {
            session.insert(i, i);
        }
    }
    let (transient_nodes, _, _) = transient.arena_len();

    assert_eq!(persistent, transient);
    assert!(
        transient_nodes < persistent_nodes,
        "expected fewer node allocations ({transient_nodes} vs {persistent_nodes})"
    );
}
