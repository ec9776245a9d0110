//! Way Prediction Tests.
//!
//! Verifies MRU and multi-column prediction both in isolation (the predictor
//! tables) and through the cache, where multi-column relocations must move
//! lines and replacement state together.

use cachesim_core::cache::prediction::{MruTable, MultiColumnTable, Verdict, WayPredictor};
use cachesim_core::config::WayPrediction;

use crate::common::builder::ConfigBuilder;
use crate::common::harness::{H, M, TestContext};

const SET: usize = 5;

fn mru_prediction(ctx: &TestContext, set: usize) -> usize {
    match ctx.cache().predictor() {
        WayPredictor::Mru(table) => table.predicted(set),
        other => panic!("expected MRU predictor, got {:?}", other.kind()),
    }
}

fn columns(ctx: &TestContext, set: usize) -> Vec<u64> {
    match ctx.cache().predictor() {
        WayPredictor::MultiColumn(table) => table.columns(set).to_vec(),
        other => panic!("expected multi-column predictor, got {:?}", other.kind()),
    }
}

// ══════════════════════════════════════════════════════════
// 1. Predictor Selection
// ══════════════════════════════════════════════════════════

#[test]
fn predictor_kind_matches_config() {
    for kind in [WayPrediction::None, WayPrediction::Mru, WayPrediction::MultiColumn] {
        assert_eq!(WayPredictor::new(kind, 4, 4).kind(), kind);
    }
}

/// Without prediction every verdict is empty.
#[test]
fn disabled_predictor_never_scores() {
    let mut predictor = WayPredictor::new(WayPrediction::None, 1, 4);
    assert_eq!(predictor.on_hit(0, 0, 0), Verdict::default());
    assert_eq!(predictor.on_fill(0, 1, 0), Verdict::default());

    let mut ctx = TestContext::new(ConfigBuilder::new().assoc(4).build());
    let a = ctx.addr(0, SET);
    assert_eq!(ctx.replay_reads(&[a, a, a]), vec![M, H, H]);
    assert_eq!(ctx.stats().first_hits, 0);
}

// ══════════════════════════════════════════════════════════
// 2. MRU
// ══════════════════════════════════════════════════════════

#[test]
fn mru_table_records_hits_and_fills() {
    let mut table = MruTable::new(2);
    assert_eq!(table.predicted(1), 0);
    assert!(table.record_hit(1, 0));
    assert!(!table.record_hit(1, 3));
    assert_eq!(table.predicted(1), 3);
    table.record_fill(1, 2);
    assert_eq!(table.predicted(1), 2);
    assert_eq!(table.predicted(0), 0);
}

/// A fill moves the prediction, so alternating between two resident lines
/// never scores a first hit while repeating one line always does.
#[test]
fn mru_first_hit_accounting() {
    let mut ctx = TestContext::new(ConfigBuilder::new().assoc(4).mru().build());
    let a = ctx.addr(0, SET);
    let b = ctx.addr(1, SET);

    assert_eq!(ctx.read(a), M);
    assert_eq!(mru_prediction(&ctx, SET), 0);
    assert_eq!(ctx.read(b), M);
    assert_eq!(mru_prediction(&ctx, SET), 1);

    // Prediction is way 1 (B); A sits in way 0.
    assert_eq!(ctx.read(a), H);
    assert_eq!(ctx.stats().first_hits, 0);
    assert_eq!(mru_prediction(&ctx, SET), 0);

    assert_eq!(ctx.read(a), H);
    assert_eq!(ctx.stats().first_hits, 1);

    let stats = ctx.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.non_first_hits(), 1);
    assert_eq!(stats.search_length, 0);
}

/// MRU never relocates lines.
#[test]
fn mru_leaves_lines_in_place() {
    let mut ctx = TestContext::new(ConfigBuilder::new().assoc(4).mru().build());
    let tags: Vec<u64> = (0..4).map(|t| ctx.addr(t, SET)).collect();
    for &addr in &tags {
        let _ = ctx.read(addr);
    }
    for &addr in tags.iter().rev() {
        assert_eq!(ctx.read(addr), H);
    }
    for (way, &addr) in tags.iter().enumerate() {
        assert_eq!(ctx.way_of(addr), Some(way));
    }
}

// ══════════════════════════════════════════════════════════
// 3. Multi-Column Table
// ══════════════════════════════════════════════════════════

/// Hit search length counts only up to the hit way; miss search length
/// counts the whole column. Both skip the major location's own bit.
#[test]
fn multi_column_search_length_asymmetry() {
    let mut table = MultiColumnTable::new(1, 4);
    table.claim(0, 2, 0);
    table.claim(0, 2, 3);
    table.claim(0, 2, 1);
    assert_eq!(table.columns(0), &[0, 0, 0b1011, 0]);

    assert_eq!(table.hit_search_length(0, 2, 0), 1);
    assert_eq!(table.hit_search_length(0, 2, 1), 2);
    assert_eq!(table.hit_search_length(0, 2, 3), 3);
    assert_eq!(table.miss_search_length(0, 2), 3);

    table.claim(0, 2, 2);
    assert_eq!(table.hit_search_length(0, 2, 3), 3);
    assert_eq!(table.miss_search_length(0, 2), 3);
}

/// Claiming a way for one column removes it from every other column.
#[test]
fn multi_column_claim_moves_ownership() {
    let mut table = MultiColumnTable::new(1, 4);
    table.claim(0, 2, 0);
    table.claim(0, 2, 1);
    table.claim(0, 1, 0);
    assert_eq!(table.columns(0), &[0, 0b0001, 0b0010, 0]);
}

#[test]
fn multi_column_handles_widest_set() {
    let mut table = MultiColumnTable::new(1, 64);
    table.claim(0, 0, 63);
    table.claim(0, 0, 5);
    assert_eq!(table.hit_search_length(0, 0, 63), 2);
    assert_eq!(table.miss_search_length(0, 0), 2);
}

#[test]
fn multi_column_verdicts() {
    let mut predictor = WayPredictor::new(WayPrediction::MultiColumn, 1, 4);

    // Fill into way 0 on behalf of column 2: relocate into the major location.
    let fill = predictor.on_fill(0, 0, 2);
    assert_eq!(
        fill,
        Verdict {
            first_hit: false,
            search_length: 0,
            relocate_to: Some(2),
        }
    );

    // Hit on the major location: first hit, nothing to move.
    let hit = predictor.on_hit(0, 2, 2);
    assert!(hit.first_hit);
    assert_eq!(hit.relocate_to, None);

    // Fill directly into the major location: no relocation.
    assert_eq!(predictor.on_fill(0, 3, 3).relocate_to, None);
}

// ══════════════════════════════════════════════════════════
// 4. Multi-Column Through the Cache
// ══════════════════════════════════════════════════════════

/// Two tags sharing major location 2 in a 4-way set.
///
/// 1. A misses, fills way 0, relocates to way 2.
/// 2. A hits way 2: first hit.
/// 3. B misses, fills the LRU way 1, walks one claimed bit, relocates to way 2
///    (A moves to way 1).
/// 4. A hits way 1: non-first hit, walks two bits, swaps back into way 2.
#[test]
fn multi_column_relocation_sequence() {
    let mut ctx = TestContext::new(ConfigBuilder::new().assoc(4).multi_column().build());
    let a = ctx.addr(2, SET);
    let b = ctx.addr(6, SET);

    assert_eq!(ctx.read(a), M);
    assert_eq!(ctx.way_of(a), Some(2));
    assert_eq!(ctx.cache().recency(SET), &[2, 3, 0, 1]);
    assert_eq!(columns(&ctx, SET), vec![0, 0, 0b0001, 0]);

    assert_eq!(ctx.read(a), H);
    assert_eq!(ctx.stats().first_hits, 1);

    assert_eq!(ctx.read(b), M);
    assert_eq!(ctx.way_of(b), Some(2));
    assert_eq!(ctx.way_of(a), Some(1));
    assert_eq!(ctx.cache().recency(SET), &[2, 1, 3, 0]);
    assert_eq!(columns(&ctx, SET), vec![0, 0, 0b0011, 0]);
    assert_eq!(ctx.stats().search_length, 1);

    assert_eq!(ctx.read(a), H);
    assert_eq!(ctx.way_of(a), Some(2));
    assert_eq!(ctx.way_of(b), Some(1));
    assert_eq!(ctx.cache().recency(SET), &[2, 1, 3, 0]);

    let stats = ctx.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.first_hits, 1);
    assert_eq!(stats.search_length, 3);
    assert!((stats.mean_search_length() - 0.75).abs() < f64::EPSILON);
    ctx.assert_invariants();
}

/// A tag whose major location is where it was filled is not moved.
#[test]
fn multi_column_fill_into_major_location_stays() {
    let mut ctx = TestContext::new(ConfigBuilder::new().assoc(4).multi_column().build());
    let a = ctx.addr(4, SET); // major 0, and way 0 is the first victim
    assert_eq!(ctx.read(a), M);
    assert_eq!(ctx.way_of(a), Some(0));
    assert_eq!(ctx.cache().recency(SET), &[0, 3, 2, 1]);
    assert_eq!(ctx.read(a), H);
    assert_eq!(ctx.stats().first_hits, 1);
}

/// Direct-mapped caches have one column: every hit is a first hit.
#[test]
fn multi_column_direct_mapped_always_first_hit() {
    let mut ctx = TestContext::new(ConfigBuilder::new().multi_column().build());
    let a = ctx.addr(9, SET);
    assert_eq!(ctx.replay_reads(&[a, a, a]), vec![M, H, H]);
    assert_eq!(ctx.stats().first_hits, 2);
    assert_eq!(ctx.stats().search_length, 0);
}
