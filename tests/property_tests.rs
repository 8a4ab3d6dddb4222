//! Property-based tests for etiss-sweep
//!
//! - Test expansion invariants (count, order, determinism)
//! - Test naming invariants (artifact names, variant prefix)
//! - Run with ProptestConfig::with_cases(100)

use std::collections::HashSet;

use etiss_sweep::compare::Direction;
use etiss_sweep::profile::{StoreKind, VARIANT_PREFIX};
use etiss_sweep::sweep::{Axis, AxisSet, Combination, JIT_BACKENDS};
use proptest::prelude::*;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

/// Distinct names, so normalization keeps every value. Names mix `_` and
/// `-` and never start with the variant prefix.
fn arb_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("[a-d][a-z0-9_-]{0,6}", 1..=max)
        .prop_map(|set| set.into_iter().collect())
}

fn arb_jits() -> impl Strategy<Value = Vec<String>> {
    proptest::sample::subsequence(JIT_BACKENDS.to_vec(), 1..=JIT_BACKENDS.len())
        .prop_map(|jits| jits.into_iter().map(String::from).collect())
}

fn arb_block_sizes() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set(1u32..10_000, 1..=3)
        .prop_map(|set| set.into_iter().map(|n| n.to_string()).collect())
}

prop_compose! {
    fn arb_axes()(
        programs in arb_names(3),
        profiles in arb_names(2),
        variants in arb_names(3),
        jits in arb_jits(),
        blocks in arb_block_sizes(),
    ) -> AxisSet {
        AxisSet::new()
            .with_axis(Axis::Variant, variants)
            .with_axis(Axis::Profile, profiles)
            .with_axis(Axis::Program, programs)
            .with_axis(Axis::Jit, jits)
            .with_axis(Axis::BlockSize, blocks)
    }
}

// ============================================================================
// Expansion Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: combination count is the product of axis cardinalities
    #[test]
    fn prop_count_is_product(axes in arb_axes()) {
        let expected: usize = axes.axes().iter().map(|(_, v)| v.len()).product();
        let combinations = axes.expand().unwrap();
        prop_assert_eq!(combinations.len(), expected);
        prop_assert_eq!(axes.total(), expected);
    }

    /// Property: expansion is deterministic
    #[test]
    fn prop_expansion_deterministic(axes in arb_axes()) {
        prop_assert_eq!(axes.expand().unwrap(), axes.expand().unwrap());
    }

    /// Property: first declared axis is the outermost loop, last the innermost
    #[test]
    fn prop_declaration_order_nesting(axes in arb_axes()) {
        let combinations = axes.expand().unwrap();
        let (outer, outer_values) = &axes.axes()[0];
        let (inner, inner_values) = axes.axes().last().unwrap();
        let stride = combinations.len() / outer_values.len();

        for (i, combination) in combinations.iter().enumerate() {
            prop_assert_eq!(combination.get(*outer), Some(outer_values[i / stride].as_str()));
            prop_assert_eq!(
                combination.get(*inner),
                Some(inner_values[i % inner_values.len()].as_str())
            );
        }
    }

    /// Property: every combination gets its own artifact name
    #[test]
    fn prop_artifact_names_unique(axes in arb_axes()) {
        let combinations = axes.expand().unwrap();
        let names: HashSet<String> = combinations.iter().map(Combination::artifact_name).collect();
        prop_assert_eq!(names.len(), combinations.len());
    }

    /// Property: program names differing only in `_`, `-` or `/` never share a file
    #[test]
    fn prop_separator_variants_distinct(stem in "[a-z]{1,4}", tail in "[a-z]{1,4}") {
        let names: HashSet<String> = ["_", "-", "/", "."]
            .iter()
            .map(|sep| {
                let program = format!("{stem}{sep}{tail}");
                Combination::from_pairs([(Axis::Program, program.as_str())]).artifact_name()
            })
            .collect();
        prop_assert_eq!(names.len(), 4);
    }

    /// Property: duplicated values collapse to the distinct set
    #[test]
    fn prop_duplicates_collapse(programs in arb_names(4)) {
        let doubled: Vec<String> = programs.iter().chain(programs.iter()).cloned().collect();
        let axes = AxisSet::new().with_axis(Axis::Program, doubled);
        prop_assert_eq!(axes.expand().unwrap().len(), programs.len());
    }
}

// ============================================================================
// Naming Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: variant prefix is optional and stripped exactly once
    #[test]
    fn prop_variant_prefix_insensitive(name in "[a-z][a-z0-9]{0,8}") {
        let prefixed = format!("{VARIANT_PREFIX}{name}");
        prop_assert_eq!(StoreKind::Variant.store_key(&prefixed), name.as_str());
        prop_assert_eq!(StoreKind::Variant.store_key(&name), name.as_str());
        prop_assert_eq!(StoreKind::Program.store_key(&prefixed), prefixed.as_str());

        let plain = Combination::from_pairs([(Axis::Variant, name.as_str())]);
        let with_prefix = Combination::from_pairs([(Axis::Variant, prefixed.as_str())]);
        prop_assert_eq!(plain.artifact_name(), with_prefix.artifact_name());
    }

    /// Property: artifact name does not depend on declaration order
    #[test]
    fn prop_artifact_name_order_independent(
        program in "[a-z]{1,6}",
        variant in "[a-z]{1,6}",
        block in 1u32..1000,
    ) {
        let block = block.to_string();
        let forward = Combination::from_pairs([
            (Axis::Program, program.as_str()),
            (Axis::Variant, variant.as_str()),
            (Axis::BlockSize, block.as_str()),
        ]);
        let reversed = Combination::from_pairs([
            (Axis::BlockSize, block.as_str()),
            (Axis::Variant, variant.as_str()),
            (Axis::Program, program.as_str()),
        ]);
        prop_assert_eq!(forward.artifact_name(), reversed.artifact_name());
    }
}

// ============================================================================
// Comparison Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: overhead sign follows a - b, and equal durations give zero
    #[test]
    fn prop_overhead_sign(a in 0.001f64..1000.0, b in 0.001f64..1000.0) {
        let p = Direction::Overhead.percent(a, b).unwrap();
        prop_assert_eq!(p > 0.0, a > b);
        prop_assert!(Direction::Overhead.percent(a, a).unwrap().abs() < 1e-9);
    }

    /// Property: improvement is bounded above by 100%
    #[test]
    fn prop_improvement_bounded(a in 0.001f64..1000.0, b in 0.0f64..1000.0) {
        let p = Direction::Improvement.percent(a, b).unwrap();
        prop_assert!(p <= 100.0 + 1e-9);
    }
}
