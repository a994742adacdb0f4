use crate::avg::{AvgStateSerializer, GroupingAvgAggregator, GroupingAvgState};
use crate::block::{Block, Page};
use crate::value_generator::{IllConditionedGenerator, RandomGenerator};
use crate::{GroupingOperation, StateSerializer};

fn final_means(agg: &GroupingAvgAggregator) -> Vec<f64> {
    match agg.evaluate_final().unwrap() {
        Block::Double(means) => means,
        other => panic!("expected a Double block, got {:?}", other),
    }
}

fn aggregate(group_ids: &[i64], values: &[f64]) -> GroupingAvgAggregator {
    let mut agg = GroupingAvgAggregator::create(0).unwrap();
    agg.add_raw(group_ids, values).unwrap();
    agg
}

/// Merge the intermediate outputs of raw aggregators that all saw the same groups
fn merge(workers: &[GroupingAvgAggregator], groups: usize) -> GroupingAvgAggregator {
    let group_ids: Block = (0..groups as i64).collect::<Vec<_>>().into();
    let mut merged = GroupingAvgAggregator::create_intermediate();
    for worker in workers {
        let block = worker.evaluate_intermediate().unwrap();
        merged.add_intermediate_input(&group_ids, &block).unwrap();
    }
    merged
}

fn assert_close(a: f64, b: f64) {
    let tolerance = 1e-12 * a.abs().max(b.abs()).max(1.);
    assert!((a - b).abs() <= tolerance, "{} != {}", a, b);
}

#[test]
fn example_means() {
    let mut state = GroupingAvgState::new();
    state.add_single(2., 0);
    state.add_single(4., 0);
    state.add_single(3., 1);
    assert_eq!(state.means(), vec![3., 3.]);

    let agg = aggregate(&[0, 0, 1], &[2., 4., 3.]);
    assert_eq!(final_means(&agg), vec![3., 3.]);
}

#[test]
fn means_match_per_group_reference() {
    let groups = 17;
    let (group_ids, values) = RandomGenerator::new(groups, 10_000, 17).into_columns();

    let mut sums = vec![0f64; groups as usize];
    let mut counts = vec![0u64; groups as usize];
    for (&group_id, &value) in group_ids.iter().zip(&values) {
        sums[group_id as usize] += value;
        counts[group_id as usize] += 1;
    }

    let agg = aggregate(&group_ids, &values);
    let means = final_means(&agg);
    assert_eq!(means.len(), groups as usize);
    for (g, mean) in means.into_iter().enumerate() {
        assert_close(mean, sums[g] / counts[g] as f64);
    }
}

#[test]
fn compensated_sum_beats_naive_sum() {
    let values = IllConditionedGenerator::new(1e16, 1., 10_001);
    let exact = values.exact_sum();
    let values: Vec<f64> = values.collect();
    let naive: f64 = values.iter().sum();

    let agg = aggregate(&vec![3; values.len()], &values);
    let state = agg.state();
    assert!((state.values()[3] - exact).abs() <= 2.);
    assert!((naive - exact).abs() >= 10_000. - 2.);
    assert_eq!(state.counts()[3], 10_001);
}

#[test]
fn missing_groups_are_nan() {
    let agg = aggregate(&[2], &[5.]);
    let means = final_means(&agg);
    assert!(means[0].is_nan());
    assert!(means[1].is_nan());
    assert_eq!(means[2], 5.);
}

#[test]
fn infinity_is_sticky_and_still_counted() {
    // Finite values added after Inf are dropped from the sum, but counted
    let agg = aggregate(&[0, 0, 1], &[f64::INFINITY, 5., 1.]);
    assert_eq!(agg.state().counts(), &[2, 1]);
    assert_eq!(agg.state().values()[0], f64::INFINITY);
    assert_eq!(final_means(&agg), vec![f64::INFINITY, 1.]);
}

#[test]
fn nan_and_opposite_infinities() {
    let agg = aggregate(
        &[0, 0, 1, 1, 1],
        &[f64::NAN, 1., f64::INFINITY, 2., f64::NEG_INFINITY],
    );
    let means = final_means(&agg);
    assert!(means[0].is_nan());
    assert!(means[1].is_nan());
    assert_eq!(agg.state().counts(), &[2, 3]);
}

#[test]
fn infinity_survives_merge() {
    let left = aggregate(&[0, 1], &[f64::INFINITY, 2.]);
    let right = aggregate(&[0, 1], &[5., 4.]);
    let merged = merge(&[left, right], 2);
    assert_eq!(merged.state().counts(), &[2, 2]);
    assert_eq!(final_means(&merged), vec![f64::INFINITY, 3.]);
}

#[test]
fn split_and_merge_matches_direct() {
    let groups = 9;
    let (group_ids, values) = RandomGenerator::new(groups, 5_000, 3).into_columns();
    let direct = aggregate(&group_ids, &values);

    for &split in &[0, 1, 1_234, 4_999, 5_000] {
        let mut left = aggregate(&group_ids[..split], &values[..split]);
        let mut right = aggregate(&group_ids[split..], &values[split..]);
        // Align both partial states on the full set of groups
        let last = groups - 1;
        for worker in &mut [&mut left, &mut right] {
            worker.add_raw(&[last], &[0.]).unwrap();
        }

        let merged = merge(&[left, right], groups as usize);
        assert_eq!(merged.state().largest_group_id(), last as usize);
        let mut expected_counts = direct.state().counts().to_vec();
        expected_counts[last as usize] += 2;
        assert_eq!(merged.state().counts(), expected_counts.as_slice());
        for (&a, &b) in merged.state().values().iter().zip(direct.state().values()) {
            assert_close(a, b);
        }
    }
}

#[test]
fn merge_keeps_partial_corrections() {
    let values: Vec<f64> = IllConditionedGenerator::new(1e16, 1., 1_001).collect();
    let left = aggregate(&vec![0; values.len()], &values);
    let right = aggregate(&vec![0; 1_000], &vec![1.; 1_000]);
    let merged = merge(&[left, right], 1);
    let state = merged.state();
    assert_eq!(state.counts(), &[2_001]);
    assert!((state.values()[0] + state.deltas()[0] - (1e16 + 2_000.)).abs() <= 2.);
}

#[test]
fn merge_remaps_positions() {
    let worker = aggregate(&[0, 1, 1], &[1., 2., 4.]);
    let block = worker.evaluate_intermediate().unwrap();

    let mut merged = GroupingAvgAggregator::create_intermediate();
    merged
        .add_intermediate_input(&vec![5i64, 2].into(), &block)
        .unwrap();
    assert_eq!(merged.state().counts(), &[0, 0, 2, 0, 0, 1]);
    assert_eq!(merged.state().values()[2], 6.);
    assert_eq!(merged.state().values()[5], 1.);
}

#[test]
fn merged_state_can_be_forwarded() {
    let left = aggregate(&[0, 1], &[1., 2.]);
    let right = aggregate(&[0, 1], &[3., 4.]);
    let first_level = merge(&[left, right], 2);
    let other = aggregate(&[0, 1], &[5., 6.]);
    let second_level = merge(&[first_level, other], 2);
    assert_eq!(second_level.state().counts(), &[3, 3]);
    assert_eq!(final_means(&second_level), vec![3., 4.]);
}

#[test]
fn round_trip_through_blocks() {
    let (group_ids, values) = RandomGenerator::new(31, 2_000, 11).into_columns();
    let agg = aggregate(&group_ids, &values);
    let block = agg.evaluate_intermediate().unwrap();
    let data = match &block {
        Block::AggregatorState(state) => state.data(),
        other => panic!("expected a state block, got {:?}", other),
    };
    assert_eq!(data.len(), 8 + 24 * 31);

    let decoded = AvgStateSerializer.deserialize(data, 0).unwrap();
    let state = agg.state();
    assert_eq!(decoded.largest_group_id(), state.largest_group_id());
    assert_eq!(decoded.values(), state.values());
    assert_eq!(decoded.deltas(), state.deltas());
    assert_eq!(decoded.counts(), state.counts());
}

#[test]
fn wire_size_of_two_positions() {
    let agg = aggregate(&[1], &[1.]);
    assert_eq!(agg.state().largest_group_id(), 1);
    let mut buf = Vec::new();
    let written = AvgStateSerializer.serialize(agg.state(), &mut buf).unwrap();
    assert_eq!(written, 56);
    assert_eq!(buf.len(), 56);
}

#[test]
fn raw_input_through_pages() {
    let (group_ids, values) = RandomGenerator::new(4, 100, 5).into_columns();
    let expected = final_means(&aggregate(&group_ids, &values));

    let mut agg = GroupingAvgAggregator::create(2).unwrap();
    let group_ids: Block = group_ids.into();
    let page = Page::new(vec![vec![0i64; 100].into(), vec![9f64; 100].into(), values.into()]);
    agg.add_raw_input(&group_ids, &page).unwrap();
    assert_eq!(final_means(&agg), expected);
}

#[test]
fn growth_keeps_accumulated_groups() {
    let mut agg = GroupingAvgAggregator::create(0).unwrap();
    agg.add_raw(&[0, 1, 0], &[1e16, 2., 1.]).unwrap();
    let before = agg.state().clone();

    agg.add_raw(&[4_000], &[8.]).unwrap();
    let state = agg.state();
    assert_eq!(state.capacity(), 4_096);
    assert_eq!(&state.values()[..2], before.values());
    assert_eq!(&state.deltas()[..2], before.deltas());
    assert_eq!(&state.counts()[..2], before.counts());

    let means = final_means(&agg);
    assert_eq!(means.len(), 4_001);
    assert_eq!(means[1], 2.);
    assert_eq!(means[4_000], 8.);
}

#[test]
fn evaluation_is_repeatable() {
    let agg = aggregate(&[0, 1], &[1., 2.]);
    assert_eq!(agg.evaluate_final().unwrap(), agg.evaluate_final().unwrap());
    assert_eq!(
        agg.evaluate_intermediate().unwrap(),
        agg.evaluate_intermediate().unwrap()
    );
    assert_eq!(agg.state().counts(), &[1, 1]);
}
