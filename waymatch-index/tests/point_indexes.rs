//! Cross-checks between the point indexes and simple reference models.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use waymatch_geometry::{Point, Region};
use waymatch_index::{BPlusTree, HybridPointIndex, KdTree, RegionQuadTree, SuccinctKdTree};

fn random_points(seed: u64, count: usize) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Point::new(rng.gen_range(0.0..200.0), rng.gen_range(0.0..200.0)))
        .collect()
}

fn brute_nearest(points: &[Point], target: &Point) -> Option<Point> {
    points.iter().copied().min_by(|a, b| {
        a.distance_sq(target)
            .total_cmp(&b.distance_sq(target))
            .then_with(|| a.lex_cmp(b))
    })
}

#[test]
fn pointer_and_succinct_trees_answer_alike() {
    let points = random_points(17, 400);
    let pointer = KdTree::from_points(2, 0.0, points.clone()).unwrap();
    let mut succinct = SuccinctKdTree::new(2, 0.0).unwrap();
    for p in &points {
        succinct.insert(*p).unwrap();
    }

    let mut rng = StdRng::seed_from_u64(18);
    for _ in 0..150 {
        let target = Point::new(rng.gen_range(-20.0..220.0), rng.gen_range(-20.0..220.0));
        let expected = brute_nearest(&points, &target);
        assert_eq!(pointer.nearest_neighbour(&target), expected);
        assert_eq!(succinct.nearest_neighbour(&target), expected);
    }
    for _ in 0..60 {
        let region = Region::new(
            rng.gen_range(0.0..150.0),
            rng.gen_range(0.0..150.0),
            rng.gen_range(5.0..50.0),
            rng.gen_range(5.0..50.0),
        );
        let mut a = pointer.range_query(&region);
        let mut b = succinct.range_query(&region);
        a.sort_by(|p, q| p.lex_cmp(q));
        b.sort_by(|p, q| p.lex_cmp(q));
        assert_eq!(a, b);
        let mut want: Vec<Point> = points
            .iter()
            .filter(|p| region.contains_point(p))
            .copied()
            .collect();
        want.sort_by(|p, q| p.lex_cmp(q));
        assert_eq!(a, want);
    }
}

#[test]
fn rebalanced_succinct_tree_keeps_its_answers() {
    let points = random_points(41, 250);
    let mut tree = SuccinctKdTree::new(2, 0.0).unwrap();
    for p in &points {
        tree.insert(*p).unwrap();
    }
    let probe = Point::new(77.0, 123.0);
    let before = tree.nearest_neighbour(&probe);
    tree.rebalance().unwrap();
    assert_eq!(tree.len(), points.len());
    assert_eq!(tree.nearest_neighbour(&probe), before);
    for p in points.iter().take(50) {
        assert!(tree.contains(p));
    }
}

#[test]
fn hybrid_index_finds_what_it_stored() {
    let outer = RegionQuadTree::new(Region::new(0.0, 0.0, 200.0, 200.0), 6).unwrap();
    let mut index = HybridPointIndex::new(outer, 25.0, 25.0, 1e-9).unwrap();
    let points = random_points(55, 300);
    for p in &points {
        index.insert(*p).unwrap();
    }
    assert_eq!(index.len(), 300);
    for p in &points {
        assert!(index.contains(p), "lost {p}");
        // the nearest stored point to a stored point is itself
        assert_eq!(index.nearest_neighbour(p), Some(*p));
    }
    let mut rng = StdRng::seed_from_u64(56);
    for _ in 0..40 {
        let region = Region::new(
            rng.gen_range(0.0..180.0),
            rng.gen_range(0.0..180.0),
            rng.gen_range(2.0..30.0),
            rng.gen_range(2.0..30.0),
        );
        let mut got = index.query(&region);
        got.sort_by(|p, q| p.lex_cmp(q));
        got.dedup();
        let mut want: Vec<Point> = points
            .iter()
            .filter(|p| region.contains_point(p))
            .copied()
            .collect();
        want.sort_by(|p, q| p.lex_cmp(q));
        want.dedup();
        assert_eq!(got, want);
    }
}

#[test]
fn bplustree_follows_an_ordered_map_model() {
    let mut tree: BPlusTree<i64, i64> = BPlusTree::new(4).unwrap();
    let mut model: BTreeMap<i64, Vec<i64>> = BTreeMap::new();
    let mut rng = StdRng::seed_from_u64(91);

    for step in 0..3000 {
        let key = rng.gen_range(0..200);
        match rng.gen_range(0..5) {
            // insert dominates so the tree grows
            0 | 1 | 2 => {
                let value = rng.gen_range(0..10);
                tree.insert(key, value);
                let set = model.entry(key).or_default();
                if !set.contains(&value) {
                    set.push(value);
                }
            }
            3 => {
                let value = rng.gen_range(0..10);
                let tree_removed = tree.remove_value(&key, &value);
                let mut model_removed = false;
                if let Some(set) = model.get_mut(&key) {
                    if let Some(at) = set.iter().position(|&v| v == value) {
                        set.remove(at);
                        model_removed = true;
                        if set.is_empty() {
                            model.remove(&key);
                        }
                    }
                }
                assert_eq!(tree_removed, model_removed, "step {step} key {key}");
            }
            _ => {
                assert_eq!(tree.remove(&key), model.remove(&key).is_some(), "step {step}");
            }
        }
        if step % 250 == 0 {
            let lo = rng.gen_range(0..150);
            let hi = lo + rng.gen_range(1..60);
            let got: Vec<i64> = tree.range_query(&lo, &hi).iter().map(|(k, _)| *k).collect();
            let want: Vec<i64> = model
                .range(lo..hi)
                .flat_map(|(k, set)| std::iter::repeat(*k).take(set.len()))
                .collect();
            assert_eq!(got, want, "range {lo}..{hi} at step {step}");
        }
    }

    for (key, set) in &model {
        let mut got = tree.query(key);
        let mut want = set.clone();
        got.sort_unstable();
        want.sort_unstable();
        assert_eq!(got, want, "key {key}");
    }
    let total: usize = model.values().map(|s| s.len()).sum();
    assert_eq!(tree.len(), total);
}
