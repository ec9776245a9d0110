//! Victim Cache Tests.
//!
//! Verifies the fully-associative victim buffer on its own (slot LRU,
//! displacement) and through the cache: demotion of evicted lines tagged by
//! full block address, promotion on a primary miss, the swap between a
//! promoted block and the primary line it displaces, and the way-prediction
//! state a promotion must leave alone.

use cachesim_core::cache::CacheLine;
use cachesim_core::cache::prediction::WayPredictor;
use cachesim_core::cache::victim::VictimCache;

use crate::common::builder::ConfigBuilder;
use crate::common::harness::{H, M, TestContext};

const SET: usize = 5;

fn line(tag: u64) -> CacheLine {
    CacheLine {
        tag,
        valid: true,
        dirty: false,
    }
}

// ══════════════════════════════════════════════════════════
// 1. Buffer in Isolation
// ══════════════════════════════════════════════════════════

#[test]
fn insert_fills_slots_in_lru_order_then_displaces() {
    let mut victim = VictimCache::new(2);
    assert_eq!(victim.capacity(), 2);
    assert_eq!(victim.insert(line(10)), None);
    assert_eq!(victim.insert(line(11)), None);
    assert_eq!(victim.probe(10), Some(0));
    assert_eq!(victim.probe(11), Some(1));

    // Slot 0 is least recently used.
    assert_eq!(victim.insert(line(12)), Some(line(10)));
    assert_eq!(victim.probe(10), None);
    assert_eq!(victim.probe(12), Some(0));
}

#[test]
fn take_invalidates_slot() {
    let mut victim = VictimCache::new(1);
    let _ = victim.insert(line(7));
    assert_eq!(victim.take(0), line(7));
    assert!(!victim.entries()[0].valid);
    assert_eq!(victim.probe(7), None);
}

/// `store` refreshes the slot's recency so it is not the next to go.
#[test]
fn store_marks_slot_most_recent() {
    let mut victim = VictimCache::new(2);
    let _ = victim.insert(line(1));
    let _ = victim.insert(line(2));
    assert_eq!(victim.order(), &[1, 0]);

    let _ = victim.take(0);
    victim.store(0, line(3));
    assert_eq!(victim.order(), &[0, 1]);
    assert_eq!(victim.insert(line(4)), Some(line(2)));
}

/// Any slot count works; a victim cache is not indexed.
#[test]
fn non_power_of_two_capacity() {
    let mut victim = VictimCache::new(3);
    for tag in 0..3 {
        assert_eq!(victim.insert(line(tag)), None);
    }
    assert_eq!(victim.insert(line(3)), Some(line(0)));
}

// ══════════════════════════════════════════════════════════
// 2. Demotion and Promotion
// ══════════════════════════════════════════════════════════

/// Direct-mapped with a one-entry victim cache: A, B conflict in one set.
/// The second read of A is served by the victim cache.
#[test]
fn conflicting_pair_ping_pongs_through_victim_cache() {
    let mut ctx = TestContext::new(ConfigBuilder::new().victim(1).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);

    assert_eq!(ctx.replay_reads(&[a, b, a]), vec![M, M, H]);
    assert!(ctx.cache().contains(a));
    assert!(ctx.cache().victim_contains(b));
    assert!(!ctx.cache().contains(b));

    let stats = ctx.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.victim_hits, 1);

    assert_eq!(ctx.read(b), H);
    assert!(ctx.cache().contains(b));
    assert!(ctx.cache().victim_contains(a));
    assert_eq!(ctx.stats().victim_hits, 2);
    ctx.assert_invariants();
}

/// Demoted entries carry the full block address, not the primary tag.
#[test]
fn demoted_entries_use_block_address() {
    let mut ctx = TestContext::new(ConfigBuilder::new().victim(2).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);
    let _ = ctx.replay_reads(&[a, b]);

    let layout = ctx.cache().geometry().layout();
    let victim = ctx.cache().victim_cache().unwrap();
    let slot = victim.probe(layout.block_address(a)).unwrap();
    assert_eq!(victim.entries()[slot].tag, SET as u64);
}

/// Equal primary tags from different sets stay distinct in the victim cache.
#[test]
fn same_tag_different_sets_do_not_alias() {
    let mut ctx = TestContext::new(ConfigBuilder::new().victim(2).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);
    let c = ctx.addr(0, SET + 1);
    let d = ctx.addr(1, SET + 1);

    assert_eq!(ctx.replay_reads(&[a, b, c, d]), vec![M, M, M, M]);
    assert!(ctx.cache().victim_contains(a));
    assert!(ctx.cache().victim_contains(c));

    assert_eq!(ctx.replay_reads(&[a, c]), vec![H, H]);
    assert!(ctx.cache().victim_contains(b));
    assert!(ctx.cache().victim_contains(d));
    assert_eq!(ctx.stats().victim_hits, 2);
    ctx.assert_invariants();
}

/// Once the victim cache overflows the oldest demoted block is gone for good.
#[test]
fn overflow_drops_oldest_block() {
    let mut ctx = TestContext::new(ConfigBuilder::new().victim(1).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);
    let c = ctx.addr(2, SET);

    assert_eq!(ctx.replay_reads(&[a, b, c]), vec![M, M, M]);
    assert!(!ctx.cache().victim_contains(a));
    assert!(ctx.cache().victim_contains(b));
    assert_eq!(ctx.read(a), M);
    assert_eq!(ctx.stats().victim_hits, 0);
}

/// Evicting an invalid way demotes nothing.
#[test]
fn cold_fill_demotes_nothing() {
    let mut ctx = TestContext::new(ConfigBuilder::new().assoc(2).victim(2).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);
    let _ = ctx.replay_reads(&[a, b]);
    let victim = ctx.cache().victim_cache().unwrap();
    assert!(victim.entries().iter().all(|l| !l.valid));
}

// ══════════════════════════════════════════════════════════
// 3. Dirty State
// ══════════════════════════════════════════════════════════

/// A dirty line keeps its dirty bit while parked in the victim cache.
#[test]
fn demotion_preserves_dirty_bit() {
    let mut ctx = TestContext::new(ConfigBuilder::new().victim(1).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);

    assert_eq!(ctx.write(a), M);
    assert!(ctx.cache().line(a).unwrap().dirty);
    assert_eq!(ctx.read(b), M);

    let victim = ctx.cache().victim_cache().unwrap();
    assert!(victim.entries()[0].valid);
    assert!(victim.entries()[0].dirty);
}

/// A write that finds its block in the victim cache is a hit, and the
/// promoted line is marked dirty under writeback.
#[test]
fn write_hit_in_victim_cache() {
    let mut ctx = TestContext::new(ConfigBuilder::new().victim(1).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);
    let _ = ctx.replay_reads(&[a, b]);

    assert_eq!(ctx.write(a), H);
    assert!(ctx.cache().contains(a));
    assert!(ctx.cache().line(a).unwrap().dirty);

    let stats = ctx.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.victim_hits, 1);
    assert_eq!(stats.writes, 1);
    ctx.assert_invariants();
}

// ══════════════════════════════════════════════════════════
// 4. Way Prediction Across Promotion
// ══════════════════════════════════════════════════════════

/// Two-way set, one victim slot: after A, B, C the victim cache holds A and
/// C sits in way 0 as the MRU prediction. Promoting A into way 1 must not
/// move the prediction, so the next read of C is a first hit.
#[test]
fn promotion_keeps_mru_prediction() {
    let mut ctx = TestContext::new(ConfigBuilder::new().assoc(2).mru().victim(1).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);
    let c = ctx.addr(2, SET);

    assert_eq!(ctx.replay_reads(&[a, b, c]), vec![M, M, M]);
    assert_eq!(ctx.way_of(c), Some(0));

    assert_eq!(ctx.read(a), H);
    assert_eq!(ctx.way_of(a), Some(1));
    assert!(ctx.cache().victim_contains(b));
    let predicted = match ctx.cache().predictor() {
        WayPredictor::Mru(table) => table.predicted(SET),
        other => panic!("expected MRU predictor, got {:?}", other.kind()),
    };
    assert_eq!(predicted, 0);
    assert_eq!(ctx.stats().first_hits, 0);

    assert_eq!(ctx.read(c), H);
    let stats = ctx.stats();
    assert_eq!(stats.first_hits, 1);
    assert_eq!(stats.victim_hits, 1);
    ctx.assert_invariants();
}

/// Tags 0, 2 and 4 share major location 0 in a two-way set. The fills claim
/// both ways for column 0 and walk one bit for C. Promoting A leaves the
/// columns and the search length alone and installs A in way 1 without
/// relocating it. The following read of A is a non-first hit that walks the
/// column and moves A into way 0.
#[test]
fn promotion_keeps_multi_column_state() {
    let mut ctx =
        TestContext::new(ConfigBuilder::new().assoc(2).multi_column().victim(1).build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(2, SET);
    let c = ctx.addr(4, SET);
    let columns = |ctx: &TestContext| match ctx.cache().predictor() {
        WayPredictor::MultiColumn(table) => table.columns(SET).to_vec(),
        other => panic!("expected multi-column predictor, got {:?}", other.kind()),
    };

    assert_eq!(ctx.replay_reads(&[a, b, c]), vec![M, M, M]);
    assert_eq!(ctx.way_of(c), Some(0));
    assert_eq!(ctx.way_of(b), Some(1));
    assert_eq!(columns(&ctx), vec![0b11, 0]);
    assert_eq!(ctx.stats().search_length, 1);

    assert_eq!(ctx.read(a), H);
    assert_eq!(ctx.way_of(a), Some(1));
    assert!(ctx.cache().victim_contains(b));
    assert_eq!(columns(&ctx), vec![0b11, 0]);
    assert_eq!(ctx.stats().search_length, 1);
    assert_eq!(ctx.stats().first_hits, 0);
    ctx.assert_invariants();

    assert_eq!(ctx.read(a), H);
    assert_eq!(ctx.way_of(a), Some(0));
    let stats = ctx.stats();
    assert_eq!(stats.first_hits, 0);
    assert_eq!(stats.search_length, 2);
    assert_eq!(stats.victim_hits, 1);
    ctx.assert_invariants();
}

#[test]
fn capacity_matches_slot_count() {
    let victim = VictimCache::new(5);
    assert_eq!(victim.capacity(), 5);
    assert_eq!(victim.entries().len(), 5);
    assert_eq!(victim.order().len(), 5);
}
